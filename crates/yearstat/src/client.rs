//! The stats client and its bounded fetcher.
//!
//! [`StatsClient::fetch`] performs exactly one GET and returns the response
//! unmodified. The retry policies (rate-limit guard, pager, poller) live in
//! their own modules and all build on it.

use std::sync::Arc;

use tokio::sync::Mutex;
use url::Url;

use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpError, HttpRequest, HttpResponse, HttpTransport};

/// Client for the source-hosting API.
///
/// Cheap to clone: clones share the transport, the clock and the rate-limit
/// gate, so a backoff triggered by one clone pauses all of them.
#[derive(Clone)]
pub struct StatsClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    pub(crate) rate_gate: Arc<Mutex<()>>,
}

impl StatsClient {
    /// Create a client backed by reqwest and the system clock.
    pub fn new(config: ClientConfig) -> Result<Self, HttpError> {
        let transport = ReqwestTransport::with_timeout(config.timeout)?;
        Ok(Self::with_transport(
            config,
            Arc::new(transport),
            Arc::new(SystemClock),
        ))
    }

    /// Create a client over an arbitrary transport and clock.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            clock,
            rate_gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Issue one GET with the configured headers and `params` appended to the
    /// query string.
    pub async fn fetch<K, V>(&self, url: &str, params: &[(K, V)]) -> Result<HttpResponse, HttpError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let url = build_url(url, params)?;
        let request = HttpRequest {
            url,
            headers: self.config.headers(),
        };

        tracing::debug!(url = %request.url, "GET");
        let response = self.transport.send(request).await?;
        tracing::trace!(status = response.status, "response");
        Ok(response)
    }
}

/// Append `params` to `base`, percent-encoding them.
pub(crate) fn build_url<K, V>(base: &str, params: &[(K, V)]) -> Result<String, HttpError>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut url = Url::parse(base).map_err(|e| HttpError::InvalidUrl {
        url: base.to_string(),
        message: e.to_string(),
    })?;
    if !params.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| {
                (AsRef::<str>::as_ref(k), AsRef::<str>::as_ref(v))
            }));
    }
    Ok(url.into())
}

/// Empty parameter list for endpoints that take none.
pub(crate) const NO_PARAMS: &[(&str, &str)] = &[];
