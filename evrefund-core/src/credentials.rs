use std::fmt;

/// Portal login material. Read once at startup and never written anywhere.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Portal origin without a trailing slash.
    pub base_url: String,
    pub account: String,
    pub password_hash: String,
    pub seller_number: Option<String>,
    /// Value of the `LIFF_STORE` session cookie.
    pub cookie: Option<String>,
}

impl Credentials {
    pub fn new(
        base_url: impl Into<String>,
        account: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            account: account.into(),
            password_hash: password_hash.into(),
            seller_number: None,
            cookie: None,
        }
    }

    pub fn with_seller_number(mut self, seller_number: impl Into<String>) -> Self {
        self.seller_number = Some(seller_number.into());
        self
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url)
            .field("account", &self.account)
            .field("password_hash", &"<redacted>")
            .field("seller_number", &self.seller_number)
            .field("cookie", &self.cookie.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
