//! Client error types
//!
//! `ClientError` is the transport-level view of a failure and is what the
//! request pipeline works with. Domain calls never hand it to their callers:
//! they collapse it into an `ApiError`, which carries one human-readable
//! message suitable for showing next to a form.

use crate::normalize::extract_message;
use thiserror::Error;

/// Shown when the backend accepts the credentials but the account has the wrong role
pub const ACCESS_DENIED: &str = "Access denied. This portal is for lenders only.";

/// Transport-level client error
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request error; no response was received
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Create error from HTTP status code
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            400 => Self::BadRequest(message),
            401 => Self::AuthenticationFailed(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            _ => Self::ServerError {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// HTTP status, when a response was received
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest(_) => Some(400),
            Self::AuthenticationFailed(_) => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::ServerError { status, .. } => Some(*status),
            Self::Request(_) | Self::Serialization(_) | Self::Configuration(_) => None,
        }
    }

    /// Raw response body, when a response was received
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::BadRequest(body)
            | Self::AuthenticationFailed(body)
            | Self::Forbidden(body)
            | Self::NotFound(body)
            | Self::ServerError { message: body, .. } => Some(body),
            Self::Request(_) | Self::Serialization(_) | Self::Configuration(_) => None,
        }
    }

    /// 401 and 403 both mean the session is missing or no longer accepted
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthenticationFailed(_) | Self::Forbidden(_))
    }
}

/// Coarse classification of a normalized failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// No response received
    Network,
    /// 401 or 403
    Unauthorized,
    /// Any other non-success status, including field validation failures
    Rejected,
    /// The call succeeded but the account role is not allowed here
    AccessDenied,
    /// The response body did not have the expected shape
    Decode,
    Configuration,
}

/// Normalized error returned by every domain call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    kind: ApiErrorKind,
    message: String,
    status: Option<u16>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn access_denied() -> Self {
        Self::new(ApiErrorKind::AccessDenied, ACCESS_DENIED)
    }

    /// Collapse a transport error into a single message.
    ///
    /// The message comes from the response body when it carries one and
    /// falls back to `fallback` otherwise.
    pub fn from_client(error: ClientError, fallback: &str) -> Self {
        tracing::debug!(error = %error, "normalizing client error");

        let kind = match &error {
            ClientError::Request(_) => ApiErrorKind::Network,
            ClientError::AuthenticationFailed(_) | ClientError::Forbidden(_) => {
                ApiErrorKind::Unauthorized
            }
            ClientError::BadRequest(_)
            | ClientError::NotFound(_)
            | ClientError::ServerError { .. } => ApiErrorKind::Rejected,
            ClientError::Serialization(_) => ApiErrorKind::Decode,
            ClientError::Configuration(_) => ApiErrorKind::Configuration,
        };

        let message = error
            .body()
            .and_then(extract_message)
            .unwrap_or_else(|| fallback.to_string());

        Self {
            kind,
            message,
            status: error.status(),
        }
    }

    pub const fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn status(&self) -> Option<u16> {
        self.status
    }
}
