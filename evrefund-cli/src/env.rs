//! Credentials from the process environment (optionally seeded from `.env`).

use anyhow::{Result, bail};
use evrefund_core::Credentials;

pub const BASE_URL: &str = "BASE_URL";
pub const USERNAME: &str = "USERNAME";
pub const PASSWORD_HASH: &str = "PASSWORD_HASH";
pub const SELLER_NUMBER: &str = "SELLER_NUMBER";
pub const COOKIE: &str = "COOKIE";

pub fn load_credentials() -> Result<Credentials> {
    credentials_from(|key| std::env::var(key).ok())
}

/// Build credentials from `lookup`. Blank values count as unset. Reports every missing
/// required variable at once.
pub fn credentials_from<F>(lookup: F) -> Result<Credentials>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| {
        lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let required = (get(BASE_URL), get(USERNAME), get(PASSWORD_HASH));
    let (base_url, account, password_hash) = match required {
        (Some(b), Some(a), Some(p)) => (b, a, p),
        (b, a, p) => {
            let missing: Vec<&str> = [
                (BASE_URL, b.is_none()),
                (USERNAME, a.is_none()),
                (PASSWORD_HASH, p.is_none()),
            ]
            .into_iter()
            .filter_map(|(k, absent)| absent.then_some(k))
            .collect();
            bail!(
                "missing required environment variables: {} (set them or add them to .env)",
                missing.join(", ")
            );
        }
    };

    let mut creds = Credentials::new(base_url, account, password_hash);
    if let Some(seller) = get(SELLER_NUMBER) {
        creds = creds.with_seller_number(seller);
    }
    if let Some(cookie) = get(COOKIE) {
        creds = creds.with_cookie(cookie);
    }
    Ok(creds)
}
