//! Configuration file support for yearstat.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `YEARSTAT_`, e.g., `YEARSTAT_GITHUB_TOKEN`)
//! 3. The legacy `TOKEN` environment variable (token only)
//! 4. Config file (./yearstat.toml or ~/.config/yearstat/config.toml)
//! 5. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [github]
//! token = "ghp_..."                  # or use YEARSTAT_GITHUB_TOKEN env var
//! url = "https://api.github.com"     # API base, e.g. for GitHub Enterprise
//!
//! [client]
//! concurrency = 1   # repositories processed at once
//! timeout = 30      # per-request timeout in seconds
//!
//! [poll]
//! attempts = 5      # requests made against a still-computing endpoint
//! interval = 2      # seconds between them
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;
use yearstat::ClientConfig;
use yearstat::config::{DEFAULT_API_BASE, DEFAULT_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT};

/// Token variable read by earlier deployments.
const LEGACY_TOKEN_VAR: &str = "TOKEN";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github: GitHubConfig,
    pub client: ClientSection,
    pub poll: PollConfig,
}

/// GitHub configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// API token.
    /// Can also be set via YEARSTAT_GITHUB_TOKEN or TOKEN.
    pub token: Option<String>,
    /// API base URL.
    /// Can also be set via YEARSTAT_GITHUB_URL.
    pub url: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            url: DEFAULT_API_BASE.to_string(),
        }
    }
}

/// Request behaviour.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ClientSection {
    /// Repositories processed at once.
    pub concurrency: usize,
    /// Per-request timeout in seconds.
    pub timeout: u64,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            concurrency: 1,
            timeout: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

/// Polling of statistics that are still being computed.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub attempts: usize,
    /// Seconds between attempts.
    pub interval: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_POLL_ATTEMPTS,
            interval: DEFAULT_POLL_INTERVAL.as_secs(),
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/yearstat/config.toml)
    /// 3. Local config file (./yearstat.toml)
    /// 4. Environment variables with YEARSTAT_ prefix
    ///
    /// The legacy `TOKEN` variable fills in the token when nothing else set it.
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from("yearstat.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./yearstat.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // e.g., YEARSTAT_GITHUB_TOKEN -> github.token
        builder = builder.add_source(
            Environment::with_prefix("YEARSTAT")
                .separator("_")
                .try_parsing(true),
        );

        let mut config = match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        };

        config.apply_legacy_token(std::env::var(LEGACY_TOKEN_VAR).ok());
        config
    }

    fn apply_legacy_token(&mut self, legacy: Option<String>) {
        if self.github_token().is_none() {
            self.github.token = legacy.filter(|t| !t.trim().is_empty());
        }
    }

    /// Get the GitHub token, ignoring blank values.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }

    /// Library client settings, with an optional concurrency override.
    pub fn client_config(&self, concurrency: Option<usize>) -> ClientConfig {
        let config = ClientConfig {
            token: self.github_token(),
            ..ClientConfig::default()
        };
        config
            .with_api_base(self.github.url.clone())
            .with_timeout(Duration::from_secs(self.client.timeout))
            .with_poll(self.poll.attempts, Duration::from_secs(self.poll.interval))
            .with_concurrency(concurrency.unwrap_or(self.client.concurrency))
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "yearstat").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
