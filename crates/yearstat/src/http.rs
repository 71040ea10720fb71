//! Transport boundary for all HTTP I/O.
//!
//! Every request the crate makes is a single GET described by an
//! [`HttpRequest`]. The [`HttpTransport`] trait is the only place bytes cross
//! the network, which lets tests swap in a scripted transport.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// `200 OK`.
pub const STATUS_OK: u16 = 200;
/// `202 Accepted`: the server is still computing the resource.
pub const STATUS_ACCEPTED: u16 = 202;
/// `403 Forbidden`: permission denied or quota exhausted.
pub const STATUS_FORBIDDEN: u16 = 403;

/// HTTP headers represented as key/value pairs.
///
/// Header names are treated case-insensitively by helper functions.
pub type HttpHeaders = Vec<(String, String)>;

/// A GET request with its final URL (query string included).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: HttpHeaders,
}

/// A raw response, returned unmodified by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

impl HttpResponse {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        header_get(&self.headers, name)
    }

    /// Whether the status is exactly `200 OK`.
    ///
    /// `202 Accepted` is deliberately not treated as success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// The body as text, with invalid UTF-8 replaced.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("http transport error: {0}")]
    Transport(String),

    #[error("invalid request url {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("no mock response registered for GET {url}")]
    NoMockResponse { url: String },
}

/// Transport boundary for all HTTP I/O.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

/// Get the first header value matching `name` (case-insensitive).
#[must_use]
pub fn header_get<'a>(headers: &'a HttpHeaders, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

pub mod reqwest_transport {
    use super::*;

    use std::time::Duration as StdDuration;

    /// A real HTTP transport backed by reqwest.
    #[derive(Clone)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        pub fn with_timeout(timeout: StdDuration) -> Result<Self, HttpError> {
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| HttpError::Transport(e.to_string()))?;
            Ok(Self { client })
        }
    }

    #[async_trait]
    impl HttpTransport for ReqwestTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
            let mut builder = self.client.get(&request.url);
            for (k, v) in request.headers {
                builder = builder.header(&k, &v);
            }

            let resp = builder
                .send()
                .await
                .map_err(|e| HttpError::Transport(e.to_string()))?;

            let status = resp.status().as_u16();
            let mut headers: HttpHeaders = Vec::new();
            for (name, value) in resp.headers().iter() {
                headers.push((
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                ));
            }

            let body = resp
                .bytes()
                .await
                .map_err(|e| HttpError::Transport(e.to_string()))?
                .to_vec();

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}

// ---------- Test-only mock transport ----------

#[cfg(test)]
use std::collections::VecDeque;
#[cfg(test)]
use std::sync::{Arc, Mutex};

/// In-memory mock transport.
///
/// Routes are matched on scheme, host and path; any query pairs in the
/// registered URL must also be present in the request. Responses registered
/// for the same route are returned in FIFO order.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[cfg(test)]
#[derive(Default)]
struct MockTransportInner {
    routes: Vec<(url::Url, VecDeque<HttpResponse>)>,
    requests: Vec<HttpRequest>,
}

#[cfg(test)]
impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a response for a URL.
    pub fn push_response(&self, url: &str, response: HttpResponse) {
        let route = url::Url::parse(url).expect("mock route should be a valid url");
        let mut inner = self
            .inner
            .lock()
            .expect("mock transport lock should not be poisoned");
        match inner.routes.iter_mut().find(|(u, _)| *u == route) {
            Some((_, queue)) => queue.push_back(response),
            None => inner.routes.push((route, VecDeque::from([response]))),
        }
    }

    /// Register a `200 OK` JSON response.
    pub fn push_json(&self, url: &str, body: serde_json::Value) {
        self.push_response(url, json_response(STATUS_OK, body));
    }

    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        let inner = self
            .inner
            .lock()
            .expect("mock transport lock should not be poisoned");
        inner.requests.clone()
    }
}

#[cfg(test)]
fn route_matches(route: &url::Url, request: &url::Url) -> bool {
    route.scheme() == request.scheme()
        && route.host_str() == request.host_str()
        && route.path() == request.path()
        && route
            .query_pairs()
            .all(|pair| request.query_pairs().any(|p| p == pair))
}

#[cfg(test)]
pub fn json_response(status: u16, body: serde_json::Value) -> HttpResponse {
    HttpResponse {
        status,
        headers: vec![("Content-Type".to_string(), "application/json".to_string())],
        body: body.to_string().into_bytes(),
    }
}

#[cfg(test)]
#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        tokio::task::yield_now().await;
        let mut inner = self
            .inner
            .lock()
            .expect("mock transport lock should not be poisoned");

        let url = request.url.clone();
        inner.requests.push(request);

        let Ok(parsed) = url::Url::parse(&url) else {
            return Err(HttpError::NoMockResponse { url });
        };

        inner
            .routes
            .iter_mut()
            .filter(|(route, queue)| !queue.is_empty() && route_matches(route, &parsed))
            .find_map(|(_, queue)| queue.pop_front())
            .ok_or(HttpError::NoMockResponse { url })
    }
}
