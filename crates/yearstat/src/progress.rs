//! Progress events emitted while aggregating an account.

/// Progress events emitted during aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StatsProgress {
    /// Starting to enumerate an account's repositories.
    ListingRepos { account: String },

    /// Enumeration finished.
    ReposListed { account: String, count: usize },

    /// Enumeration failed; the aggregation continues with no repositories.
    ListingFailed { account: String, error: String },

    /// One metric of one repository failed and was counted as zero.
    MetricFailed {
        repo: String,
        metric: &'static str,
        error: String,
    },

    /// Every query for a repository has finished.
    RepoCompleted {
        repo: String,
        completed: usize,
        total: usize,
    },

    /// The aggregation is done.
    AggregationComplete { repos: usize, failures: usize },
}

/// Callback for progress reporting.
pub type ProgressCallback = Box<dyn Fn(StatsProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
///
/// # Example
///
/// ```ignore
/// emit(on_progress, StatsProgress::ListingRepos { account: "octocat".into() });
/// ```
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: StatsProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
