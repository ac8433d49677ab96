//! Structured error body returned by the backend on non-2xx responses.

use serde::{Deserialize, Serialize};

/// Error body shape consumed by the client: `{detail, code?}`.
///
/// `detail` is a human-readable message surfaced verbatim to the user;
/// `code` is an optional machine-readable tag the client logs but does
/// not branch on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable failure description.
    pub detail: String,
    /// Optional machine-readable error code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorBody {
    /// Creates an error body with a detail message only.
    #[must_use]
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            code: None,
        }
    }

    /// Creates an error body with a detail message and a code.
    #[must_use]
    pub fn with_code(detail: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            code: Some(code.into()),
        }
    }
}
