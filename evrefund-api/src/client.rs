use reqwest::cookie::Jar;
use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use evrefund_core::{BillPage, BillQuery, Credentials, LoginRequest, RefundRequest};

use crate::endpoints;
use crate::error::ApiError;
use crate::headers::{self, HeaderProfile};

/// Name of the portal's session cookie.
pub const SESSION_COOKIE: &str = "LIFF_STORE";

/// Longest response body kept in errors and audit lines.
pub const BODY_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Applied to every request.
    pub timeout: Duration,
    pub header_profile: HeaderProfile,
    pub accept_language: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            header_profile: HeaderProfile::Minimal,
            accept_language: "zh-TW".to_string(),
        }
    }
}

/// Authenticated session. Only obtainable with a non-empty token.
#[derive(Clone)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Result<Self, ApiError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ApiError::MissingToken);
        }
        Ok(Self { token })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// First 20 characters, safe to log.
    pub fn token_preview(&self) -> String {
        format!("{}...", clip(&self.token, 20))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token_preview())
            .finish()
    }
}

/// What the portal said to an accepted refund.
#[derive(Debug, Clone)]
pub struct RefundReceipt {
    pub status: StatusCode,
    pub body: String,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(default)]
    data: Option<Value>,
}

/// Thin client over the three portal endpoints. Holds the cookie jar, so cookies the
/// portal sets at login ride along on later calls.
pub struct PortalClient {
    http: reqwest::Client,
    base_url: String,
    options: ClientOptions,
}

impl PortalClient {
    pub fn new(creds: &Credentials, options: ClientOptions) -> Result<Self, ApiError> {
        let url = Url::parse(&creds.base_url)
            .map_err(|_| ApiError::InvalidBaseUrl(creds.base_url.clone()))?;

        let jar = Arc::new(Jar::default());
        if let Some(cookie) = creds.cookie.as_deref().filter(|c| !c.is_empty()) {
            jar.add_cookie_str(&format!("{SESSION_COOKIE}={cookie}"), &url);
        }

        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .cookie_provider(jar)
            .build()?;

        Ok(Self {
            http,
            base_url: creds.base_url.trim_end_matches('/').to_string(),
            options,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Log in and return the session token. Any failure here is fatal for the run.
    pub async fn login(&self, creds: &Credentials) -> Result<Session, ApiError> {
        let headers = headers::login_headers(
            &self.base_url,
            self.options.header_profile,
            &self.options.accept_language,
        )?;
        let body = LoginRequest::from_credentials(creds);

        let (_, text) = self.post(endpoints::LOGIN, headers, &body).await?;
        let resp: LoginResponse = serde_json::from_str(&text)
            .map_err(|e| ApiError::Decode(format!("login: {e}")))?;

        match resp.data {
            Some(Value::String(token)) => Session::new(token),
            _ => {
                tracing::debug!(body = %clip(&text, BODY_PREVIEW_CHARS), "login body without token");
                Err(ApiError::MissingToken)
            }
        }
    }

    pub async fn fetch_bills(
        &self,
        session: &Session,
        query: &BillQuery,
    ) -> Result<BillPage, ApiError> {
        let headers = self.api_headers(session)?;
        let (_, text) = self.post(endpoints::BILL_PAGE, headers, query).await?;
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(format!("bill page: {e}")))
    }

    /// Issue one refund. Success is decided by HTTP status alone.
    pub async fn refund_bill(
        &self,
        session: &Session,
        request: &RefundRequest,
    ) -> Result<RefundReceipt, ApiError> {
        let headers = self.api_headers(session)?;
        let (status, body) = self.post(endpoints::BILL_REFUND, headers, request).await?;
        Ok(RefundReceipt { status, body })
    }

    fn api_headers(&self, session: &Session) -> Result<HeaderMap, ApiError> {
        headers::api_headers(
            &self.base_url,
            session.token(),
            self.options.header_profile,
            &self.options.accept_language,
        )
    }

    /// POST a JSON body; non-2xx becomes `ApiError::Status` with a clipped body.
    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        headers: HeaderMap,
        body: &B,
    ) -> Result<(StatusCode, String), ApiError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "POST");

        let resp = self.http.post(&url).headers(headers).json(body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status,
                body: clip(&text, BODY_PREVIEW_CHARS).to_string(),
            });
        }
        Ok((status, text))
    }
}

/// Cut `s` to at most `max` characters without splitting a code point.
pub fn clip(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
