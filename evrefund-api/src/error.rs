use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("portal returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("login response carried no token")]
    MissingToken,

    #[error("invalid header value for {name}")]
    InvalidHeader { name: &'static str },

    #[error("invalid base url '{0}'")]
    InvalidBaseUrl(String),
}

impl ApiError {
    /// HTTP status, when the portal answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            _ => None,
        }
    }
}
