//! Error types.

use thiserror::Error;

use crate::http::{HttpError, HttpResponse};

/// Errors that stop an operation before any per-repository work happens.
#[derive(Debug, Error)]
pub enum StatsError {
    /// The account input had no usable first path segment.
    #[error("Could not parse username from {0:?}")]
    InvalidAccount(String),

    #[error("Year {0} is outside the supported range 1..=9999")]
    InvalidYear(i32),

    #[error(transparent)]
    Http(#[from] HttpError),
}

/// Why a single query produced no value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    /// The remote answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    /// The body did not have the expected shape.
    #[error("Unexpected response body: {0}")]
    Decode(String),

    /// The endpoint was still computing when the poll budget ran out.
    #[error("Still computing after {attempts} attempts")]
    NotReady { attempts: usize },
}

impl FailureReason {
    pub fn from_response(response: &HttpResponse) -> Self {
        Self::Status {
            status: response.status,
            body: response.text(),
        }
    }

    /// Whether the reason is a `202 Accepted` that may still resolve.
    #[inline]
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady { .. })
    }
}

impl From<HttpError> for FailureReason {
    fn from(err: HttpError) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for FailureReason {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
