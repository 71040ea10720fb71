//! Account-wide aggregation.
//!
//! Enumerates an account's repositories, runs the per-repository queries for
//! each one and folds the results into a per-repository breakdown plus a
//! grand total. A failed query never aborts the aggregation: it is logged,
//! reported as a [`StatsProgress::MetricFailed`] event and counted as zero.

use std::collections::BTreeMap;
use std::future::Future;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::client::StatsClient;
use crate::error::{FailureReason, StatsError};
use crate::outcome::Outcome;
use crate::progress::{ProgressCallback, StatsProgress, emit};
use crate::queries::{FrequencyPair, SearchKind};
use crate::year::YearWindow;

/// The four yearly counts of one repository, or their sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSet {
    pub commits: u64,
    pub prs: u64,
    pub merges: u64,
    pub issues: u64,
}

impl AddAssign for MetricSet {
    fn add_assign(&mut self, rhs: Self) {
        self.commits += rhs.commits;
        self.prs += rhs.prs;
        self.merges += rhs.merges;
        self.issues += rhs.issues;
    }
}

impl Add for MetricSet {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl Sum for MetricSet {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Raw query outcomes for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoMetrics {
    pub commits: Outcome<u64>,
    pub prs: Outcome<u64>,
    pub merges: Outcome<u64>,
    pub issues: Outcome<u64>,
}

impl RepoMetrics {
    /// Counts with every failed query coalesced to zero.
    pub fn coalesced(&self) -> MetricSet {
        MetricSet {
            commits: self.commits.clone().or_zero(),
            prs: self.prs.clone().or_zero(),
            merges: self.merges.clone().or_zero(),
            issues: self.issues.clone().or_zero(),
        }
    }

    /// Failed queries as `(metric, reason)` pairs.
    pub fn failures(&self) -> impl Iterator<Item = (&'static str, &FailureReason)> {
        [
            ("commits", &self.commits),
            ("prs", &self.prs),
            ("merges", &self.merges),
            ("issues", &self.issues),
        ]
        .into_iter()
        .filter_map(|(metric, outcome)| outcome.failure().map(|reason| (metric, reason)))
    }
}

/// Per-repository breakdown plus grand total for one account and year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub per_repo: BTreeMap<String, MetricSet>,
    pub totals: MetricSet,
}

impl AggregateResult {
    /// Add one repository's counts to both the breakdown and the total.
    pub fn record(&mut self, repo: impl Into<String>, metrics: MetricSet) {
        *self.per_repo.entry(repo.into()).or_default() += metrics;
        self.totals += metrics;
    }
}

impl FromIterator<(String, MetricSet)> for AggregateResult {
    fn from_iter<I: IntoIterator<Item = (String, MetricSet)>>(iter: I) -> Self {
        let mut result = Self::default();
        for (repo, metrics) in iter {
            result.record(repo, metrics);
        }
        result
    }
}

/// Per-repository code frequency; failed repositories keep their reason.
pub type FrequencyResult = BTreeMap<String, Outcome<FrequencyPair>>;

impl StatsClient {
    /// The four count queries for one repository, run one after another.
    pub async fn repo_metrics(&self, owner: &str, repo: &str, window: &YearWindow) -> RepoMetrics {
        RepoMetrics {
            commits: self.commits_for_year(owner, repo, window).await,
            prs: self
                .search_count(SearchKind::PullRequests, owner, repo, window)
                .await,
            merges: self
                .search_count(SearchKind::MergedPullRequests, owner, repo, window)
                .await,
            issues: self
                .search_count(SearchKind::Issues, owner, repo, window)
                .await,
        }
    }

    /// Counts for every repository of `account` in `year`, plus their total.
    pub async fn all_stats_for_year(
        &self,
        account: &str,
        year: i32,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<AggregateResult, StatsError> {
        let window = YearWindow::new(year)?;
        let repos = self.enumerate_repos(account, on_progress).await;
        let total = repos.len();

        let owner = account.to_string();
        let rows = self
            .for_each_repo(
                repos,
                move |client, repo| {
                    let owner = owner.clone();
                    async move { client.repo_metrics(&owner, &repo, &window).await }
                },
                |repo, metrics: &RepoMetrics, completed| {
                    for (metric, reason) in metrics.failures() {
                        emit(
                            on_progress,
                            StatsProgress::MetricFailed {
                                repo: repo.to_string(),
                                metric,
                                error: reason.to_string(),
                            },
                        );
                    }
                    emit(
                        on_progress,
                        StatsProgress::RepoCompleted {
                            repo: repo.to_string(),
                            completed,
                            total,
                        },
                    );
                },
            )
            .await;

        let failures: usize = rows.iter().map(|(_, m)| m.failures().count()).sum();
        let result: AggregateResult = rows
            .into_iter()
            .map(|(repo, metrics)| (repo, metrics.coalesced()))
            .collect();

        tracing::info!(
            account,
            year,
            repos = total,
            failures,
            commits = result.totals.commits,
            "Aggregation complete"
        );
        emit(
            on_progress,
            StatsProgress::AggregationComplete {
                repos: total,
                failures,
            },
        );
        Ok(result)
    }

    /// Code frequency for every repository of `account` in `year`.
    pub async fn all_frequency_for_year(
        &self,
        account: &str,
        year: i32,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<FrequencyResult, StatsError> {
        let window = YearWindow::new(year)?;
        let repos = self.enumerate_repos(account, on_progress).await;
        let total = repos.len();

        let owner = account.to_string();
        let rows = self
            .for_each_repo(
                repos,
                move |client, repo| {
                    let owner = owner.clone();
                    async move { client.code_frequency_for_year(&owner, &repo, &window).await }
                },
                |repo, freq: &Outcome<FrequencyPair>, completed| {
                    if let Some(reason) = freq.failure() {
                        emit(
                            on_progress,
                            StatsProgress::MetricFailed {
                                repo: repo.to_string(),
                                metric: "code_frequency",
                                error: reason.to_string(),
                            },
                        );
                    }
                    emit(
                        on_progress,
                        StatsProgress::RepoCompleted {
                            repo: repo.to_string(),
                            completed,
                            total,
                        },
                    );
                },
            )
            .await;

        let failures = rows.iter().filter(|(_, f)| !f.is_success()).count();
        emit(
            on_progress,
            StatsProgress::AggregationComplete {
                repos: total,
                failures,
            },
        );
        Ok(rows.into_iter().collect())
    }

    /// Repository names for `account`; a failed listing counts as none.
    async fn enumerate_repos(
        &self,
        account: &str,
        on_progress: Option<&ProgressCallback>,
    ) -> Vec<String> {
        emit(
            on_progress,
            StatsProgress::ListingRepos {
                account: account.to_string(),
            },
        );

        match self.list_repo_names(account).await {
            Outcome::Success(repos) => {
                emit(
                    on_progress,
                    StatsProgress::ReposListed {
                        account: account.to_string(),
                        count: repos.len(),
                    },
                );
                repos
            }
            Outcome::Failed(reason) => {
                emit(
                    on_progress,
                    StatsProgress::ListingFailed {
                        account: account.to_string(),
                        error: reason.to_string(),
                    },
                );
                Vec::new()
            }
        }
    }

    /// Run `query` for every repository and collect `(repo, value)` pairs.
    ///
    /// With a concurrency of one the repositories are processed strictly in
    /// order. Otherwise at most `concurrency` run at once and pairs arrive in
    /// completion order; callers fold them into ordered maps.
    async fn for_each_repo<T, F, Fut>(
        &self,
        repos: Vec<String>,
        query: F,
        mut on_done: impl FnMut(&str, &T, usize),
    ) -> Vec<(String, T)>
    where
        T: Send + 'static,
        F: Fn(StatsClient, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let mut results = Vec::with_capacity(repos.len());

        if self.config().concurrency <= 1 {
            for repo in repos {
                let value = query(self.clone(), repo.clone()).await;
                on_done(&repo, &value, results.len() + 1);
                results.push((repo, value));
            }
            return results;
        }

        let query = Arc::new(query);
        let semaphore = Arc::new(Semaphore::new(self.config().concurrency));
        let mut tasks = JoinSet::new();

        for repo in repos {
            let client = self.clone();
            let query = Arc::clone(&query);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let value = query(client, repo.clone()).await;
                (repo, value)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((repo, value)) => {
                    on_done(&repo, &value, results.len() + 1);
                    results.push((repo, value));
                }
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => tracing::error!(error = %e, "Repository worker cancelled"),
            }
        }

        results
    }
}
