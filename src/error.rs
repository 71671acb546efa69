//! Error types for the proxy.

use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ProxyError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Vertex answered with a non-success status. Surfaced to the client
    /// with the same status code.
    #[error("Provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("Translation error: {message}")]
    Translation { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ProxyError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn provider(status: u16, msg: impl Into<String>) -> Self {
        Self::Provider {
            status,
            message: msg.into(),
        }
    }

    pub fn translation(msg: impl Into<String>) -> Self {
        Self::Translation {
            message: msg.into(),
        }
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: msg.into(),
        }
    }

    /// HTTP status the dispatch layer should answer with.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Provider { status, .. } => *status,
            Self::InvalidRequest { .. } | Self::Json(_) => 400,
            Self::Config { .. } | Self::Io(_) | Self::Toml(_) => 500,
            Self::Translation { .. } | Self::Http(_) => 502,
        }
    }

    /// OpenAI error `type` string matching [`Self::status_code`].
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self.status_code() {
            400 | 404 | 422 => "invalid_request_error",
            401 | 403 => "authentication_error",
            429 => "rate_limit_error",
            _ => "api_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
