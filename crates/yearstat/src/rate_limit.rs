//! Reactive rate-limit guard.
//!
//! On a `403` whose `X-RateLimit-Remaining` reads zero, the guard sleeps until
//! the advertised reset (at least one second) and retries exactly once. A
//! second consecutive rate-limited response is handed back to the caller as
//! is. No client-side quota accounting is kept.

use std::time::Duration;

use crate::client::StatsClient;
use crate::http::{HttpError, HttpResponse, STATUS_FORBIDDEN};

pub const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// Seconds to wait before retrying `response`, or `None` if it is not a
/// quota-exhausted response.
///
/// A missing or unreadable remaining-quota header counts as zero, and a
/// missing reset header counts as the epoch, which yields the one-second floor.
pub fn rate_limit_wait(response: &HttpResponse, now_epoch: i64) -> Option<Duration> {
    if response.status != STATUS_FORBIDDEN {
        return None;
    }

    let header_i64 = |name: &str| {
        response
            .header(name)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(0)
    };

    if header_i64(RATE_LIMIT_REMAINING) != 0 {
        return None;
    }

    let reset = header_i64(RATE_LIMIT_RESET);
    let wait = reset.saturating_sub(now_epoch).max(1);
    Some(Duration::from_secs(wait as u64))
}

impl StatsClient {
    /// Fetch through the rate-limit guard.
    ///
    /// The shared gate is held for the whole sleep-and-retry, so every clone
    /// of this client waits out the same reset window instead of spending
    /// requests against an empty quota.
    pub async fn rate_limited_get<K, V>(
        &self,
        url: &str,
        params: &[(K, V)],
    ) -> Result<HttpResponse, HttpError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        drop(self.rate_gate.lock().await);

        let response = self.fetch(url, params).await?;
        if rate_limit_wait(&response, self.clock().now().timestamp()).is_none() {
            return Ok(response);
        }

        // Another clone may have held the gate through most of the window.
        let _gate = self.rate_gate.lock().await;
        let wait = rate_limit_wait(&response, self.clock().now().timestamp())
            .unwrap_or(Duration::from_secs(1));
        tracing::warn!(
            url,
            wait_secs = wait.as_secs(),
            "Rate limited, waiting for quota reset"
        );
        self.clock().sleep(wait).await;

        self.fetch(url, params).await
    }
}
