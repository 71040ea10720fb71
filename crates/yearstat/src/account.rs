//! Account name extraction from user input.

use url::{ParseError, Url};

use crate::error::StatsError;

const PROFILE_HOSTS: &[&str] = &["github.com", "www.github.com"];

/// Extract an account name from a profile URL or a bare name.
///
/// Accepts `https://github.com/octocat`, `https://github.com/octocat/repo`,
/// `github.com/octocat` and `octocat`. The first non-empty path segment wins.
pub fn parse_account(input: &str) -> Result<String, StatsError> {
    let trimmed = input.trim();
    let invalid = || StatsError::InvalidAccount(input.to_string());

    let path = match Url::parse(trimmed) {
        Ok(url) => url.path().to_string(),
        Err(ParseError::RelativeUrlWithoutBase) => {
            let end = trimmed.find(['?', '#']).unwrap_or(trimmed.len());
            strip_profile_host(&trimmed[..end]).to_string()
        }
        Err(_) => return Err(invalid()),
    };

    path.split('/')
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
        .ok_or_else(invalid)
}

/// `github.com/octocat` parses as a relative path; drop the host part.
fn strip_profile_host(path: &str) -> &str {
    let path = path.trim_start_matches('/');
    match path.split_once('/') {
        Some((host, rest)) if PROFILE_HOSTS.contains(&host.to_ascii_lowercase().as_str()) => rest,
        _ => path,
    }
}
