//! Per-repository metric queries.
//!
//! Each query reads one metric for one repository and year and returns an
//! [`Outcome`]. Failures are logged here with the remote status and body;
//! deciding what a failure counts as is left to the aggregator.

use serde::Deserialize;

use crate::client::StatsClient;
use crate::error::FailureReason;
use crate::outcome::Outcome;
use crate::pagination::PageCollection;
use crate::year::{YearWindow, week_in_year};

/// Which issue-search query to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchKind {
    PullRequests,
    MergedPullRequests,
    Issues,
}

impl SearchKind {
    fn qualifiers(self) -> &'static str {
        match self {
            SearchKind::PullRequests => "is:pr",
            SearchKind::MergedPullRequests => "is:pr is:merged",
            SearchKind::Issues => "is:issue",
        }
    }

    fn date_field(self) -> &'static str {
        match self {
            SearchKind::MergedPullRequests => "merged",
            SearchKind::PullRequests | SearchKind::Issues => "created",
        }
    }

    /// Metric name used in logs and progress events.
    pub fn metric(self) -> &'static str {
        match self {
            SearchKind::PullRequests => "prs",
            SearchKind::MergedPullRequests => "merges",
            SearchKind::Issues => "issues",
        }
    }

    /// Structured search query scoped to one repository and year.
    pub fn query(self, owner: &str, repo: &str, window: &YearWindow) -> String {
        format!(
            "repo:{owner}/{repo} {} {}:{}",
            self.qualifiers(),
            self.date_field(),
            window.date_range()
        )
    }
}

/// Aggregated additions and deletions for one year.
///
/// Deletions are stored as a magnitude even though the feed reports them as
/// negative numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrequencyPair {
    pub additions: u64,
    pub deletions: u64,
}

/// One `[week_start, additions, deletions]` row of the code-frequency feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WeeklyDelta(pub i64, pub i64, pub i64);

#[derive(Deserialize)]
struct RepoSummary {
    name: String,
}

#[derive(Deserialize)]
struct SearchCount {
    total_count: u64,
}

/// Sum the rows whose week starts in `year`.
///
/// Additions are taken as given (a negative value counts as zero); deletions
/// are taken as a magnitude. Both sums saturate instead of overflowing.
pub fn sum_weekly_deltas(weeks: &[WeeklyDelta], year: i32) -> FrequencyPair {
    weeks
        .iter()
        .filter(|WeeklyDelta(week, _, _)| week_in_year(*week, year))
        .fold(FrequencyPair::default(), |acc, WeeklyDelta(_, adds, dels)| FrequencyPair {
            additions: acc.additions.saturating_add(u64::try_from(*adds).unwrap_or(0)),
            deletions: acc.deletions.saturating_add(dels.unsigned_abs()),
        })
}

/// Turn a page walk into an outcome: nothing collected plus an interruption
/// is a failure, anything else counts what was collected.
fn collection_outcome<T, U>(
    collected: PageCollection<T>,
    what: &str,
    f: impl FnOnce(Vec<T>) -> U,
) -> Outcome<U> {
    match collected.interrupted {
        Some(reason) if collected.items.is_empty() => {
            tracing::warn!(what, error = %reason, "Listing failed");
            Outcome::Failed(reason)
        }
        Some(reason) => {
            tracing::warn!(
                what,
                collected = collected.items.len(),
                error = %reason,
                "Listing incomplete, keeping partial results"
            );
            Outcome::Success(f(collected.items))
        }
        None => Outcome::Success(f(collected.items)),
    }
}

impl StatsClient {
    /// Names of every repository owned by `account`.
    pub async fn list_repo_names(&self, account: &str) -> Outcome<Vec<String>> {
        let url = match self.config().endpoint(&["users", account, "repos"]) {
            Ok(url) => url,
            Err(e) => return Outcome::Failed(e.into()),
        };
        let collected: PageCollection<RepoSummary> = self.paginated_get(&url, &[]).await;
        collection_outcome(collected, account, |repos| {
            repos.into_iter().map(|r| r.name).collect()
        })
    }

    /// Commits on the default branch within the year.
    ///
    /// Pages through the full listing and counts it; the commits endpoint
    /// offers no lighter count.
    pub async fn commits_for_year(&self, owner: &str, repo: &str, window: &YearWindow) -> Outcome<u64> {
        let url = match self.config().endpoint(&["repos", owner, repo, "commits"]) {
            Ok(url) => url,
            Err(e) => return Outcome::Failed(e.into()),
        };
        let params = [("since", window.since()), ("until", window.until())];
        let collected: PageCollection<serde_json::Value> = self.paginated_get(&url, &params).await;
        collection_outcome(collected, &format!("{owner}/{repo} commits"), |commits| {
            commits.len() as u64
        })
    }

    /// Server-reported total of an issue search.
    pub async fn search_count(
        &self,
        kind: SearchKind,
        owner: &str,
        repo: &str,
        window: &YearWindow,
    ) -> Outcome<u64> {
        let url = match self.config().endpoint(&["search", "issues"]) {
            Ok(url) => url,
            Err(e) => return Outcome::Failed(e.into()),
        };
        let query = kind.query(owner, repo, window);

        let response = match self.rate_limited_get(&url, &[("q", query.as_str())]).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(repo = %format!("{owner}/{repo}"), metric = kind.metric(), error = %e, "Search failed");
                return Outcome::Failed(e.into());
            }
        };

        if !response.is_ok() {
            let reason = FailureReason::from_response(&response);
            tracing::warn!(
                repo = %format!("{owner}/{repo}"),
                metric = kind.metric(),
                status = response.status,
                body = %response.text(),
                "Search failed"
            );
            return Outcome::Failed(reason);
        }

        response
            .json::<SearchCount>()
            .map(|count| count.total_count)
            .map_err(FailureReason::from)
            .into()
    }

    pub async fn prs_for_year(&self, owner: &str, repo: &str, window: &YearWindow) -> Outcome<u64> {
        self.search_count(SearchKind::PullRequests, owner, repo, window)
            .await
    }

    pub async fn merges_for_year(&self, owner: &str, repo: &str, window: &YearWindow) -> Outcome<u64> {
        self.search_count(SearchKind::MergedPullRequests, owner, repo, window)
            .await
    }

    pub async fn issues_for_year(&self, owner: &str, repo: &str, window: &YearWindow) -> Outcome<u64> {
        self.search_count(SearchKind::Issues, owner, repo, window)
            .await
    }

    /// Yearly additions and deletions from the weekly code-frequency feed.
    ///
    /// Weeks are attributed by the UTC year of their start timestamp rather
    /// than by the window bounds used for the search queries.
    pub async fn code_frequency_for_year(
        &self,
        owner: &str,
        repo: &str,
        window: &YearWindow,
    ) -> Outcome<FrequencyPair> {
        let weeks = match self
            .config()
            .endpoint(&["repos", owner, repo, "stats", "code_frequency"])
        {
            Ok(url) => self.poll_until_ready(&url).await,
            Err(e) => Err(e.into()),
        };
        let weeks = weeks.and_then(|response| {
            response
                .json::<Vec<WeeklyDelta>>()
                .map_err(FailureReason::from)
        });

        match weeks {
            Ok(weeks) => Outcome::Success(sum_weekly_deltas(&weeks, window.year())),
            Err(reason) => {
                tracing::warn!(repo = %format!("{owner}/{repo}"), error = %reason, "Code frequency unavailable");
                Outcome::Failed(reason)
            }
        }
    }
}
