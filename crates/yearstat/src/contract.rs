//! JSON request and response shapes for a web front end.
//!
//! These types serialize to the exact payloads a browser client expects, so
//! any HTTP layer can hand them over unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::account::parse_account;
use crate::aggregate::{FrequencyResult, MetricSet};
use crate::client::StatsClient;
use crate::error::StatsError;
use crate::outcome::Outcome;
use crate::progress::ProgressCallback;

/// A profile link or bare account name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRequest {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoListResponse {
    pub username: String,
    pub repos: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsRequest {
    pub username: String,
    pub year: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub stats: BTreeMap<String, MetricSet>,
    pub totals: MetricSet,
}

/// `[additions, deletions]` per repository; `[null, null]` when unavailable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyResponse {
    pub freq: BTreeMap<String, [Option<u64>; 2]>,
}

impl From<&FrequencyResult> for FrequencyResponse {
    fn from(result: &FrequencyResult) -> Self {
        let freq = result
            .iter()
            .map(|(repo, outcome)| {
                let pair = match outcome {
                    Outcome::Success(p) => [Some(p.additions), Some(p.deletions)],
                    Outcome::Failed(_) => [None, None],
                };
                (repo.clone(), pair)
            })
            .collect();
        Self { freq }
    }
}

impl StatsClient {
    /// Resolve a link to an account and list its repositories.
    ///
    /// Malformed input is rejected before any request is made. A failed
    /// listing answers with an empty repository list.
    pub async fn list_account(&self, request: &LinkRequest) -> Result<RepoListResponse, StatsError> {
        let username = parse_account(&request.url)?;
        let repos = self.list_repo_names(&username).await.success().unwrap_or_default();
        Ok(RepoListResponse { username, repos })
    }

    pub async fn stats(
        &self,
        request: &StatsRequest,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<StatsResponse, StatsError> {
        let result = self
            .all_stats_for_year(&request.username, request.year, on_progress)
            .await?;
        Ok(StatsResponse {
            stats: result.per_repo,
            totals: result.totals,
        })
    }

    pub async fn frequency(
        &self,
        request: &StatsRequest,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<FrequencyResponse, StatsError> {
        let result = self
            .all_frequency_for_year(&request.username, request.year, on_progress)
            .await?;
        Ok(FrequencyResponse::from(&result))
    }
}
