//! Polling for endpoints backed by an asynchronous computation.
//!
//! Statistics endpoints answer `202 Accepted` while the server is still
//! computing. They are polled at a fixed interval until they answer `200`,
//! answer anything else (which aborts at once), or the attempt budget runs out.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use backon::{ConstantBuilder, Retryable};

use crate::client::{NO_PARAMS, StatsClient};
use crate::error::FailureReason;
use crate::http::{HttpResponse, STATUS_ACCEPTED};

impl StatsClient {
    /// Fetch `url`, polling while it answers `202 Accepted`.
    ///
    /// Makes at most `poll_attempts` requests with `poll_interval` between
    /// them. Exhausting the budget yields [`FailureReason::NotReady`].
    pub async fn poll_until_ready(&self, url: &str) -> Result<HttpResponse, FailureReason> {
        let attempts = self.config().poll_attempts.max(1);
        let backoff = ConstantBuilder::default()
            .with_delay(self.config().poll_interval)
            .with_max_times(attempts - 1);

        let attempt = Arc::new(AtomicUsize::new(0));
        let clock = Arc::clone(self.clock());
        let client = self.clone();
        let target = url.to_string();

        let poll_once = move || {
            let client = client.clone();
            let target = target.clone();
            let current = attempt.fetch_add(1, Ordering::SeqCst) + 1;
            async move { client.poll_attempt(&target, current).await }
        };

        let logged_url = url.to_string();
        let polling: Pin<Box<dyn Future<Output = Result<HttpResponse, FailureReason>> + Send>> =
            Box::pin(
                poll_once
                    .retry(backoff)
                    .sleep(move |delay| {
                        let clock = Arc::clone(&clock);
                        async move { clock.sleep(delay).await }
                    })
                    .when(FailureReason::is_not_ready)
                    .notify(move |err, delay| {
                        tracing::debug!(url = %logged_url, retry_in = ?delay, "{}", err);
                    }),
            );
        polling.await
    }

    async fn poll_attempt(&self, url: &str, attempt: usize) -> Result<HttpResponse, FailureReason> {
        let response = self.fetch(url, NO_PARAMS).await?;
        if response.is_ok() {
            Ok(response)
        } else if response.status == STATUS_ACCEPTED {
            Err(FailureReason::NotReady { attempts: attempt })
        } else {
            Err(FailureReason::from_response(&response))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::clock::MockClock;
    use crate::config::ClientConfig;
    use crate::http::{MockTransport, json_response};

    const URL: &str = "https://api.github.com/repos/me/a/stats/code_frequency";

    fn client(transport: &MockTransport, clock: &MockClock) -> StatsClient {
        StatsClient::with_transport(
            ClientConfig::new("t"),
            Arc::new(transport.clone()),
            Arc::new(clock.clone()),
        )
    }

    fn accepted() -> HttpResponse {
        json_response(STATUS_ACCEPTED, serde_json::json!({}))
    }

    #[tokio::test]
    async fn still_computing_then_success_yields_payload() {
        let transport = MockTransport::new();
        transport.push_response(URL, accepted());
        transport.push_json(URL, serde_json::json!([[1704067200, 10, -4]]));
        let clock = MockClock::at_epoch(0);

        let resp = client(&transport, &clock)
            .poll_until_ready(URL)
            .await
            .unwrap();

        assert_eq!(resp.text(), "[[1704067200,10,-4]]");
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(2)]);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn exhausting_the_budget_is_a_failure() {
        let transport = MockTransport::new();
        for _ in 0..5 {
            transport.push_response(URL, accepted());
        }
        // A sixth answer that is never requested.
        transport.push_response(URL, accepted());
        let clock = MockClock::at_epoch(0);

        let err = client(&transport, &clock)
            .poll_until_ready(URL)
            .await
            .unwrap_err();

        assert_eq!(err, FailureReason::NotReady { attempts: 5 });
        assert_eq!(transport.requests().len(), 5);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(2); 4]);
    }

    #[tokio::test]
    async fn other_error_aborts_without_spending_the_budget() {
        let transport = MockTransport::new();
        transport.push_response(URL, accepted());
        transport.push_response(
            URL,
            json_response(404, serde_json::json!({"message": "Not Found"})),
        );
        transport.push_json(URL, serde_json::json!([]));
        let clock = MockClock::at_epoch(0);

        let err = client(&transport, &clock)
            .poll_until_ready(URL)
            .await
            .unwrap_err();

        assert!(matches!(err, FailureReason::Status { status: 404, .. }));
        assert_eq!(transport.requests().len(), 2);
        assert_eq!(clock.sleeps().len(), 1);
    }

    #[test]
    fn polling_future_can_be_spawned() {
        fn assert_send<T: Send + 'static>(_: &T) {}

        let transport = MockTransport::new();
        let client = client(&transport, &MockClock::at_epoch(0));
        let fut = async move { client.poll_until_ready(URL).await };
        assert_send(&fut);
    }

    #[tokio::test]
    async fn immediate_success_does_not_sleep() {
        let transport = MockTransport::new();
        transport.push_json(URL, serde_json::json!([]));
        let clock = MockClock::at_epoch(0);

        client(&transport, &clock)
            .poll_until_ready(URL)
            .await
            .unwrap();
        assert!(clock.sleeps().is_empty());
    }
}
