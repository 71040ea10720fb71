//! Yearstat - yearly activity statistics for GitHub accounts.
//!
//! This library enumerates an account's repositories and, for a chosen
//! calendar year, counts commits, opened pull requests, merged pull requests
//! and issues per repository, or sums weekly code-frequency deltas. Failed
//! queries are reported and counted as zero instead of aborting a run.
//!
//! Rate limiting (`403` with an exhausted quota) is handled by waiting until
//! the reset time and retrying once. Statistics endpoints that answer
//! `202 Accepted` are polled until ready.
//!
//! # Example
//!
//! ```ignore
//! use yearstat::{ClientConfig, StatsClient, render_stats_table};
//!
//! let client = StatsClient::new(ClientConfig::new(token))?;
//! let result = client.all_stats_for_year("octocat", 2024, None).await?;
//! print!("{}", render_stats_table(&result.per_repo));
//! ```

pub mod account;
pub mod aggregate;
pub mod client;
pub mod clock;
pub mod config;
pub mod contract;
pub mod error;
pub mod format;
pub mod http;
pub mod outcome;
pub mod pagination;
pub mod poll;
pub mod progress;
pub mod queries;
pub mod rate_limit;
pub mod year;

pub use account::parse_account;
pub use aggregate::{AggregateResult, FrequencyResult, MetricSet, RepoMetrics};
pub use client::StatsClient;
pub use clock::{Clock, SystemClock};
pub use config::ClientConfig;
pub use contract::{
    FrequencyResponse, LinkRequest, RepoListResponse, StatsRequest, StatsResponse,
};
pub use error::{FailureReason, StatsError};
pub use format::render_stats_table;
pub use http::{HttpError, HttpRequest, HttpResponse, HttpTransport};
pub use outcome::Outcome;
pub use progress::{ProgressCallback, StatsProgress};
pub use queries::{FrequencyPair, SearchKind};
pub use year::YearWindow;
