//! The `repos`, `stats` and `freq` commands.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use tabled::settings::Style;
use yearstat::{FrequencyResult, LinkRequest, Outcome, StatsClient, StatsRequest, render_stats_table};

use super::OutputFormat;
use crate::config::Config;
use crate::progress::ProgressReporter;

/// Options shared by the per-year commands.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct YearOptions {
    /// Calendar year to report on (default: current UTC year)
    #[arg(short, long)]
    pub year: Option<i32>,

    /// Repositories processed at once (default from config or 1)
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

impl YearOptions {
    fn year(&self) -> i32 {
        self.year.unwrap_or_else(|| Utc::now().year())
    }
}

fn build_client(config: &Config, concurrency: Option<usize>) -> Result<StatsClient, Box<dyn std::error::Error>> {
    let client_config = config.client_config(concurrency);
    if client_config.token.is_none() {
        tracing::warn!(
            "No GitHub token configured (set YEARSTAT_GITHUB_TOKEN); unauthenticated requests are heavily rate limited"
        );
    }
    Ok(StatsClient::new(client_config)?)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One line of the `freq` table.
#[derive(Debug, Clone, PartialEq, Eq, tabled::Tabled)]
pub(crate) struct FrequencyRow {
    #[tabled(rename = "Repo")]
    pub repo: String,
    #[tabled(rename = "Additions")]
    pub additions: String,
    #[tabled(rename = "Deletions")]
    pub deletions: String,
}

impl FrequencyRow {
    /// Rows for every repository plus a trailing TOTAL.
    ///
    /// Repositories without statistics show `-` and are left out of the total.
    pub(crate) fn from_result(result: &FrequencyResult) -> Vec<Self> {
        let (mut additions, mut deletions) = (0u64, 0u64);
        let mut rows: Vec<Self> = result
            .iter()
            .map(|(repo, outcome)| match outcome {
                Outcome::Success(pair) => {
                    additions = additions.saturating_add(pair.additions);
                    deletions = deletions.saturating_add(pair.deletions);
                    Self::new(repo, pair.additions.to_string(), pair.deletions.to_string())
                }
                Outcome::Failed(_) => Self::new(repo, "-".to_string(), "-".to_string()),
            })
            .collect();
        rows.push(Self::new("TOTAL", additions.to_string(), deletions.to_string()));
        rows
    }

    fn new(repo: &str, additions: String, deletions: String) -> Self {
        Self {
            repo: repo.to_string(),
            additions,
            deletions,
        }
    }
}

pub(crate) async fn handle_repos(
    link: String,
    output: OutputFormat,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = build_client(config, None)?;
    let response = client.list_account(&LinkRequest { url: link }).await?;

    match output {
        OutputFormat::Table => {
            for repo in &response.repos {
                println!("{repo}");
            }
            eprintln!("{} repositories for {}", response.repos.len(), response.username);
        }
        OutputFormat::Json => print_json(&response)?,
    }
    Ok(())
}

pub(crate) async fn handle_stats(
    account: String,
    opts: YearOptions,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = build_client(config, opts.concurrency)?;
    let request = StatsRequest {
        username: account,
        year: opts.year(),
    };

    let reporter = Arc::new(ProgressReporter::new());
    let callback = reporter.as_callback();
    let response = client.stats(&request, Some(&callback)).await;
    reporter.finish();
    let response = response?;

    match opts.output {
        OutputFormat::Table => print!("{}", render_stats_table(&response.stats)),
        OutputFormat::Json => print_json(&response)?,
    }
    Ok(())
}

pub(crate) async fn handle_freq(
    account: String,
    opts: YearOptions,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = build_client(config, opts.concurrency)?;
    let year = opts.year();

    let reporter = Arc::new(ProgressReporter::new());
    let callback = reporter.as_callback();
    let result = client
        .all_frequency_for_year(&account, year, Some(&callback))
        .await;
    reporter.finish();
    let result = result?;

    match opts.output {
        OutputFormat::Table => {
            let mut table = tabled::Table::new(FrequencyRow::from_result(&result));
            table.with(Style::rounded());
            println!("{}", table);
        }
        OutputFormat::Json => print_json(&yearstat::FrequencyResponse::from(&result))?,
    }
    Ok(())
}
