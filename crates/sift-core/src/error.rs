//! Error types for Sift

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Why a remote classification attempt failed
///
/// Every variant is recoverable: the router answers with the deterministic
/// classifier and reports the kind back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemoteErrorKind {
    /// No API key configured
    MissingCredential,
    /// Key rejected by the remote service (401/403)
    CredentialInvalid,
    /// Configured model unknown to the remote service (404 or absent from listing)
    ModelNotFound,
    /// Rate limited (429)
    QuotaExceeded,
    /// Request did not complete within its time bound
    Timeout,
    /// Connection-level failure
    Transport,
    /// Any other non-success HTTP status
    #[serde(rename = "http-error")]
    Http,
    /// Reply arrived but held no usable classification payload
    #[serde(rename = "parse-failure")]
    ResponseParse,
}

impl RemoteErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing-credential",
            Self::CredentialInvalid => "credential-invalid",
            Self::ModelNotFound => "model-not-found",
            Self::QuotaExceeded => "quota-exceeded",
            Self::Timeout => "timeout",
            Self::Transport => "transport",
            Self::Http => "http-error",
            Self::ResponseParse => "parse-failure",
        }
    }

    /// Map a non-success HTTP status to an error kind
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::CredentialInvalid,
            404 => Self::ModelNotFound,
            429 => Self::QuotaExceeded,
            _ => Self::Http,
        }
    }
}

impl std::fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a call against the remote model service
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}: {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
    /// HTTP status when the failure came from a response
    pub status: Option<u16>,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn missing_credential() -> Self {
        Self::new(RemoteErrorKind::MissingCredential, "Missing GEMINI_API_KEY")
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::ResponseParse, message)
    }

    /// Build from a non-success HTTP response
    pub fn from_status(status: u16, model: &str, body: &str) -> Self {
        let kind = RemoteErrorKind::from_status(status);
        let message = match kind {
            RemoteErrorKind::CredentialInvalid => format!("{}: Invalid API Key", status),
            RemoteErrorKind::ModelNotFound => format!("{}: Model {} Not Found", status, model),
            RemoteErrorKind::QuotaExceeded => format!("{}: Quota Exceeded", status),
            _ => format!("HTTP {}: {}", status, truncate(body, 200)),
        };
        Self {
            kind,
            message,
            status: Some(status),
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            RemoteErrorKind::Timeout
        } else if err.is_decode() {
            RemoteErrorKind::ResponseParse
        } else {
            RemoteErrorKind::Transport
        };
        // Drop the URL so nothing request-specific ends up in responses
        let message = err.without_url().to_string();
        Self {
            kind,
            message,
            status: None,
        }
    }
}

/// Truncate long text for error messages
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
