use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Why a token refresh did not produce new credentials.
///
/// Cloneable so that one failure can be handed to every request queued
/// behind the same refresh.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    #[error("No refresh token stored")]
    MissingRefreshToken,

    #[error("Refresh rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Refresh transport error: {0}")]
    Transport(String),

    #[error("Refresh timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Refresh response malformed: {0}")]
    Malformed(String),

    #[error("Refresh abandoned before completion")]
    Abandoned,

    #[error("Credential store error: {0}")]
    Store(String),
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Credential file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Credential file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors surfaced by the authenticated API client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to build HTTP client: {0}")]
    ClientInit(String),

    #[error("Session expired: {0}")]
    SessionExpired(#[from] RefreshError),

    #[error("Unauthorized after token refresh")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server error (status {status}): {message}")]
    Server { status: u16, message: String },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Credential store error: {0}")]
    Credentials(#[from] CredentialError),

    #[error("Invalid callback URL: {0}")]
    InvalidCallback(String),
}

/// Coarse error category, preserved so callers can pick a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Credentials are gone; the user must sign in again.
    AuthInvalid,
    AccessDenied,
    NotFound,
    Server,
    Network,
    Client,
    Decode,
}

impl ApiError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ApiError::SessionExpired(_) | ApiError::Unauthorized => ErrorCategory::AuthInvalid,
            ApiError::Forbidden(_) => ErrorCategory::AccessDenied,
            ApiError::NotFound(_) => ErrorCategory::NotFound,
            ApiError::Server { .. } => ErrorCategory::Server,
            ApiError::Http(e) if e.is_decode() => ErrorCategory::Decode,
            ApiError::Http(_) => ErrorCategory::Network,
            ApiError::Parse(_) => ErrorCategory::Decode,
            ApiError::ClientInit(_)
            | ApiError::Api { .. }
            | ApiError::Credentials(_)
            | ApiError::InvalidCallback(_) => ErrorCategory::Client,
        }
    }

    /// Maps a non-success, non-401 status to its error variant.
    pub(crate) fn from_status(status: StatusCode, body: &str) -> Self {
        let message = error_message(body);
        match status {
            StatusCode::FORBIDDEN => ApiError::Forbidden(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            s if s.is_server_error() => ApiError::Server {
                status: s.as_u16(),
                message,
            },
            s => ApiError::Api {
                status: s.as_u16(),
                message,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Extracts `error.message` from the API's error envelope, falling back to the raw body.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}
