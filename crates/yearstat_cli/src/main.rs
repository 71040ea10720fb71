//! Yearstat CLI - yearly GitHub activity from the command line.

mod commands;
mod config;
mod progress;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

use crate::commands::OutputFormat;
use crate::commands::stats::YearOptions;

#[derive(Parser)]
#[command(name = "yearstat")]
#[command(version)]
#[command(about = "Yearly activity statistics for GitHub accounts")]
#[command(
    long_about = "Yearstat lists every repository an account owns and reports, for one \
calendar year, how many commits, pull requests, merged pull requests and issues each \
repository saw, or how many lines were added and deleted."
)]
#[command(after_long_help = r#"EXAMPLES
    List an account's repositories from a profile link:
        $ yearstat repos https://github.com/octocat

    Per-repository counts for 2024:
        $ yearstat stats octocat --year 2024

    Lines added and deleted this year, as JSON:
        $ yearstat freq octocat --output json

CONFIGURATION
    Yearstat reads configuration from:
      1. ~/.config/yearstat/config.toml (or $XDG_CONFIG_HOME/yearstat/config.toml)
      2. ./yearstat.toml
      3. Environment variables (YEARSTAT_* prefix, e.g., YEARSTAT_GITHUB_TOKEN)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    YEARSTAT_GITHUB_TOKEN         GitHub personal access token (TOKEN is also read)
    YEARSTAT_GITHUB_URL           API base URL (default: https://api.github.com)
    YEARSTAT_CLIENT_CONCURRENCY   Repositories processed at once (default: 1)
    YEARSTAT_CLIENT_TIMEOUT       Per-request timeout in seconds (default: 30)
    YEARSTAT_POLL_ATTEMPTS        Polls of a still-computing statistic (default: 5)
    YEARSTAT_POLL_INTERVAL        Seconds between polls (default: 2)
    RUST_LOG                      Log filter (default: yearstat=info,yearstat_cli=info)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the repositories of an account
    Repos {
        /// Profile URL (https://github.com/octocat) or account name
        link: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Commits, pull requests, merges and issues per repository for a year
    Stats {
        /// Account name
        account: String,

        #[command(flatten)]
        opts: YearOptions,
    },
    /// Lines added and deleted per repository for a year
    Freq {
        /// Account name
        account: String,

        #[command(flatten)]
        opts: YearOptions,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Progress bars own the terminal; keep routine logs quiet there.
    let default_filter = if Term::stderr().is_term() {
        "yearstat=warn,yearstat_cli=warn"
    } else {
        "yearstat=info,yearstat_cli=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration (config file -> env vars -> defaults)
    let config = config::Config::load();

    match cli.command {
        Commands::Repos { link, output } => {
            commands::stats::handle_repos(link, output, &config).await?;
        }
        Commands::Stats { account, opts } => {
            commands::stats::handle_stats(account, opts, &config).await?;
        }
        Commands::Freq { account, opts } => {
            commands::stats::handle_freq(account, opts, &config).await?;
        }
    }

    Ok(())
}
