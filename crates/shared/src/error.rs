//! Error taxonomy for backend interactions.
//!
//! Every failure a remote call can produce is normalized into [`ApiError`]
//! before it reaches UI-facing state. The variants match how callers are
//! allowed to react: an authorization failure always forces logout, a
//! validation failure never left the client, and everything else carries a
//! message to surface next to the control that triggered it.

use serde::Deserialize;
use thiserror::Error;

/// Structured error payload from the backend, normalized.
///
/// The backend is inconsistent about its error key (`error` on content
/// routes, `msg` on auth routes) and sometimes attaches a raw snippet of the
/// upstream model output; all of that collapses into this one shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub message: String,
    pub details: Option<String>,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
        }
    }

    /// Normalize a non-success response body. Falls back to a status-level
    /// message when the body has no recognizable error field.
    pub fn from_body(status: u16, body: &str) -> Self {
        #[derive(Deserialize)]
        struct Wire {
            error: Option<String>,
            msg: Option<String>,
            raw_response_snippet: Option<String>,
        }

        if let Ok(wire) = serde_json::from_str::<Wire>(body) {
            if let Some(message) = wire.error.or(wire.msg) {
                return Self {
                    message,
                    details: wire.raw_response_snippet,
                };
            }
        }
        Self::new(format!("request failed: HTTP {status}"))
    }
}

/// What went wrong with a backend operation.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The presented credential is missing, invalid, or expired. The gateway
    /// has already cleared it and notified its observers by the time this
    /// propagates; callers must not try to recover locally.
    #[error("{message}")]
    Unauthorized { message: String },

    /// A precondition failed client-side; no request was sent.
    #[error("{0}")]
    Validation(String),

    /// The backend answered with a structured error body.
    #[error("{}", .0.message)]
    Remote(RemoteError),

    /// No usable response: connection refused, timeout, or an undecodable
    /// success body.
    #[error("{0}")]
    Transport(String),
}

impl ApiError {
    /// Human-readable text for the per-feature error slots.
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}

impl From<RemoteError> for ApiError {
    fn from(err: RemoteError) -> Self {
        ApiError::Remote(err)
    }
}
