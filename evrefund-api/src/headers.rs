//! Header sets sent to the portal.
//!
//! `Minimal` is enough for the API itself. `Browser` replays what the portal's own web
//! front-end sends, for deployments sitting behind a WAF that checks fingerprints.

use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, ORIGIN, REFERER,
    USER_AGENT,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

const BROWSER_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/144.0.0.0 Safari/537.36";
const BROWSER_SEC_CH_UA: &str =
    r#""Not(A:Brand";v="8", "Chromium";v="144", "Google Chrome";v="144""#;

/// Referer the order-management page sends on bill queries and refunds.
const ORDER_PAGE: &str = "/Operation/ChargingOrder/OrderManagement";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeaderProfile {
    #[default]
    Minimal,
    Browser,
}

impl fmt::Display for HeaderProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderProfile::Minimal => f.write_str("minimal"),
            HeaderProfile::Browser => f.write_str("browser"),
        }
    }
}

impl FromStr for HeaderProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimal" => Ok(HeaderProfile::Minimal),
            "browser" => Ok(HeaderProfile::Browser),
            other => Err(format!(
                "unknown header profile '{other}' (expected 'minimal' or 'browser')"
            )),
        }
    }
}

fn value(name: &'static str, v: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(v).map_err(|_| ApiError::InvalidHeader { name })
}

fn base_headers(profile: HeaderProfile, accept_language: &str) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if profile == HeaderProfile::Browser {
        headers.insert(ACCEPT_LANGUAGE, value("accept-language", accept_language)?);
        headers.insert("priority", HeaderValue::from_static("u=1, i"));
        headers.insert("sec-ch-ua", HeaderValue::from_static(BROWSER_SEC_CH_UA));
        headers.insert("sec-ch-ua-mobile", HeaderValue::from_static("?0"));
        headers.insert("sec-ch-ua-platform", HeaderValue::from_static("\"macOS\""));
        headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
        headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
        headers.insert("sec-fetch-site", HeaderValue::from_static("same-origin"));
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));
    }
    Ok(headers)
}

/// Headers for the login call. Origin and referer are always sent.
pub fn login_headers(
    base_url: &str,
    profile: HeaderProfile,
    accept_language: &str,
) -> Result<HeaderMap, ApiError> {
    let mut headers = base_headers(profile, accept_language)?;
    headers.insert(ORIGIN, value("origin", base_url)?);
    headers.insert(REFERER, value("referer", &format!("{base_url}/login"))?);
    Ok(headers)
}

/// Headers for authenticated calls. The portal expects the raw token, no `Bearer` prefix.
pub fn api_headers(
    base_url: &str,
    token: &str,
    profile: HeaderProfile,
    accept_language: &str,
) -> Result<HeaderMap, ApiError> {
    let mut headers = base_headers(profile, accept_language)?;
    headers.insert(AUTHORIZATION, value("authorization", token)?);
    if profile == HeaderProfile::Browser {
        headers.insert(ORIGIN, value("origin", base_url)?);
        headers.insert(REFERER, value("referer", &format!("{base_url}{ORDER_PAGE}"))?);
    }
    Ok(headers)
}
