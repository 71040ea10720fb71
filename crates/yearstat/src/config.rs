//! Client configuration.
//!
//! A [`ClientConfig`] is built once by the caller and handed to
//! [`StatsClient`](crate::StatsClient). It carries the credential and every
//! tunable the fetch primitives use, so tests can construct clients with fake
//! credentials side by side.

use std::time::Duration;

use url::Url;

use crate::http::{HttpError, HttpHeaders};

/// Public GitHub REST endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Pinned REST API media type.
pub const DEFAULT_ACCEPT: &str = "application/vnd.github.v3+json";

/// Items requested per page by the pager.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Attempts made against an endpoint that answers `202 Accepted`.
pub const DEFAULT_POLL_ATTEMPTS: usize = 5;

/// Delay between two polls of a still-computing endpoint.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to.
    pub api_base: String,
    /// Static credential sent on every request.
    pub token: Option<String>,
    pub accept: String,
    pub user_agent: String,
    /// Per-request transport timeout.
    pub timeout: Duration,
    pub page_size: u32,
    pub poll_attempts: usize,
    pub poll_interval: Duration,
    /// Repositories processed at once. `1` keeps aggregation strictly sequential.
    pub concurrency: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token: None,
            accept: DEFAULT_ACCEPT.to_string(),
            user_agent: concat!("yearstat/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: DEFAULT_TIMEOUT,
            page_size: DEFAULT_PAGE_SIZE,
            poll_attempts: DEFAULT_POLL_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            concurrency: 1,
        }
    }
}

impl ClientConfig {
    /// Default configuration authenticated with `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_poll(mut self, attempts: usize, interval: Duration) -> Self {
        self.poll_attempts = attempts;
        self.poll_interval = interval;
        self
    }

    /// Set the worker count (values below 1 are treated as 1).
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Absolute URL for an API path given as segments, e.g.
    /// `["users", "octocat", "repos"]`.
    ///
    /// Each segment is percent-encoded, so a `?`, `#` or `/` inside an account
    /// or repository name stays part of that segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<String, HttpError> {
        let invalid = |message: &str| HttpError::InvalidUrl {
            url: self.api_base.clone(),
            message: message.to_string(),
        };
        let mut url = Url::parse(&self.api_base).map_err(|e| invalid(&e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }

    /// Headers attached to every request.
    pub fn headers(&self) -> HttpHeaders {
        let mut headers = vec![
            ("Accept".to_string(), self.accept.clone()),
            ("User-Agent".to_string(), self.user_agent.clone()),
        ];
        if let Some(token) = &self.token {
            headers.push(("Authorization".to_string(), format!("token {token}")));
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::header_get;

    #[test]
    fn default_config_matches_documented_values() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base, "https://api.github.com");
        assert_eq!(config.accept, "application/vnd.github.v3+json");
        assert_eq!(config.page_size, 100);
        assert_eq!(config.poll_attempts, 5);
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.concurrency, 1);
        assert!(config.token.is_none());
    }

    #[test]
    fn headers_carry_token_and_pinned_accept() {
        let headers = ClientConfig::new("abc123").headers();
        assert_eq!(header_get(&headers, "authorization"), Some("token abc123"));
        assert_eq!(
            header_get(&headers, "accept"),
            Some("application/vnd.github.v3+json")
        );
        assert!(header_get(&headers, "user-agent").is_some());
    }

    #[test]
    fn anonymous_config_sends_no_authorization() {
        let headers = ClientConfig::default().headers();
        assert_eq!(header_get(&headers, "authorization"), None);
    }

    #[test]
    fn endpoint_joins_without_double_slashes() {
        let config = ClientConfig::default().with_api_base("https://ghe.example.com/api/v3/");
        assert_eq!(
            config.endpoint(&["users", "octocat", "repos"]).unwrap(),
            "https://ghe.example.com/api/v3/users/octocat/repos"
        );
        assert_eq!(
            ClientConfig::default().endpoint(&["search", "issues"]).unwrap(),
            "https://api.github.com/search/issues"
        );
    }

    #[test]
    fn endpoint_encodes_reserved_characters_in_segments() {
        let url = ClientConfig::default()
            .endpoint(&["users", "me?x=1#frag", "repos"])
            .unwrap();
        let parsed = Url::parse(&url).unwrap();
        assert_eq!(parsed.path(), "/users/me%3Fx=1%23frag/repos");
        assert_eq!(parsed.query(), None);
        assert_eq!(parsed.fragment(), None);

        let nested = ClientConfig::default().endpoint(&["users", "a/b", "repos"]).unwrap();
        assert_eq!(Url::parse(&nested).unwrap().path(), "/users/a%2Fb/repos");
    }

    #[test]
    fn endpoint_rejects_unparseable_base() {
        let err = ClientConfig::default()
            .with_api_base("not a url")
            .endpoint(&["users"])
            .unwrap_err();
        assert!(matches!(err, HttpError::InvalidUrl { .. }));
    }

    #[test]
    fn concurrency_is_at_least_one() {
        assert_eq!(ClientConfig::default().with_concurrency(0).concurrency, 1);
        assert_eq!(ClientConfig::default().with_concurrency(8).concurrency, 8);
    }
}
