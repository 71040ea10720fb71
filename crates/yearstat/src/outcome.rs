//! Explicit success/failure result for per-repository queries.
//!
//! Queries never abort an aggregation. Instead of a sentinel `None` or zero,
//! each one returns an [`Outcome`], and the aggregator decides explicitly to
//! coalesce failures to zero while logging the reason.

use crate::error::FailureReason;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Success(T),
    Failed(FailureReason),
}

impl<T> Outcome<T> {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The value, discarding the failure reason.
    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match self {
            Self::Success(_) => None,
            Self::Failed(reason) => Some(reason),
        }
    }
}

impl<T: Default> Outcome<T> {
    /// Coalesce a failure to the zero value.
    pub fn or_zero(self) -> T {
        self.success().unwrap_or_default()
    }
}

impl<T> From<Result<T, FailureReason>> for Outcome<T> {
    fn from(result: Result<T, FailureReason>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(reason) => Self::Failed(reason),
        }
    }
}
