use yearstat::StatsProgress;

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: StatsProgress) {
        match event {
            StatsProgress::ListingRepos { account } => {
                tracing::info!(account = %account, "Listing repositories");
            }

            StatsProgress::ReposListed { account, count } => {
                tracing::info!(account = %account, count, "Repositories listed");
            }

            StatsProgress::ListingFailed { account, error } => {
                tracing::warn!(account = %account, error = %error, "Could not list repositories");
            }

            StatsProgress::MetricFailed {
                repo,
                metric,
                error,
            } => {
                tracing::warn!(repo = %repo, metric, error = %error, "Counted as zero");
            }

            StatsProgress::RepoCompleted {
                repo,
                completed,
                total,
            } => {
                tracing::debug!(repo = %repo, completed, total, "Repository done");
            }

            StatsProgress::AggregationComplete { repos, failures } => {
                tracing::info!(repos, failures, "Aggregation complete");
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
