//! Integration tests for account-wide aggregation.
//!
//! These tests drive the public API end to end over a scripted transport and
//! a clock that never really sleeps. They make sure that:
//! - Totals equal the sum of the per-repository rows
//! - A rate-limited search waits until the reset time and then succeeds
//! - Code frequency polls through `202 Accepted` and keeps failures per repo
//! - Runs finish promptly instead of hanging on a wait

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use yearstat::{
    ClientConfig, Clock, FrequencyResponse, HttpError, HttpRequest, HttpResponse, HttpTransport,
    LinkRequest, MetricSet, ProgressCallback, SearchKind, StatsClient, StatsProgress,
    StatsRequest, YearWindow, render_stats_table,
};

/// If exceeded, a wait is likely hitting the real clock.
const RUN_TIMEOUT: Duration = Duration::from_secs(5);

const API: &str = "https://api.github.com";
const NOW: i64 = 1_700_000_000;

/// Transport answering by path plus decoded `q` parameter, FIFO per key.
#[derive(Default)]
struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<HttpResponse>>>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn key(url: &str) -> String {
        let parsed = url::Url::parse(url).unwrap();
        let q = parsed
            .query_pairs()
            .find(|(k, _)| k == "q")
            .map(|(_, v)| v.into_owned());
        match q {
            Some(q) => format!("{}?q={}", parsed.path(), q),
            None => parsed.path().to_string(),
        }
    }

    fn push(&self, key: impl Into<String>, status: u16, headers: &[(&str, String)], body: serde_json::Value) {
        self.routes
            .lock()
            .unwrap()
            .entry(key.into())
            .or_default()
            .push_back(HttpResponse {
                status,
                headers: headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
                body: body.to_string().into_bytes(),
            });
    }

    fn ok(&self, key: impl Into<String>, body: serde_json::Value) {
        self.push(key, 200, &[], body);
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let key = Self::key(&request.url);
        self.seen.lock().unwrap().push(key.clone());
        self.routes
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
            .ok_or(HttpError::NoMockResponse { url: request.url })
    }
}

/// Clock that advances instantly and remembers every sleep.
struct InstantClock {
    now: Mutex<DateTime<Utc>>,
    sleeps: Mutex<Vec<Duration>>,
}

impl InstantClock {
    fn new() -> Self {
        Self {
            now: Mutex::new(DateTime::from_timestamp(NOW, 0).unwrap()),
            sleeps: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Clock for InstantClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::from_std(duration).unwrap();
    }
}

fn search_key(repo: &str, kind: SearchKind) -> String {
    let window = YearWindow::new(2024).unwrap();
    format!("/search/issues?q={}", kind.query("me", repo, &window))
}

fn script_counts(transport: &ScriptedTransport, repo: &str, commits: usize, prs: u64, merges: u64, issues: u64) {
    let listing: Vec<_> = (0..commits).map(|i| serde_json::json!({"sha": i})).collect();
    transport.ok(format!("/repos/me/{repo}/commits"), serde_json::json!(listing));
    transport.ok(search_key(repo, SearchKind::PullRequests), serde_json::json!({"total_count": prs}));
    transport.ok(
        search_key(repo, SearchKind::MergedPullRequests),
        serde_json::json!({"total_count": merges}),
    );
    transport.ok(search_key(repo, SearchKind::Issues), serde_json::json!({"total_count": issues}));
}

fn client(transport: &Arc<ScriptedTransport>, clock: &Arc<InstantClock>) -> StatsClient {
    StatsClient::with_transport(
        ClientConfig::new("secret").with_api_base(API),
        Arc::clone(transport) as Arc<dyn HttpTransport>,
        Arc::clone(clock) as Arc<dyn Clock>,
    )
}

#[tokio::test]
async fn stats_for_two_repositories() {
    let transport = Arc::new(ScriptedTransport::default());
    let clock = Arc::new(InstantClock::new());
    transport.ok("/users/me/repos", serde_json::json!([{"name": "a"}, {"name": "b"}]));
    script_counts(&transport, "a", 3, 1, 0, 2);
    script_counts(&transport, "b", 5, 0, 0, 1);

    let response = tokio::time::timeout(
        RUN_TIMEOUT,
        client(&transport, &clock).stats(
            &StatsRequest {
                username: "me".into(),
                year: 2024,
            },
            None,
        ),
    )
    .await
    .expect("aggregation should not hang")
    .unwrap();

    let expected = MetricSet {
        commits: 8,
        prs: 1,
        merges: 0,
        issues: 3,
    };
    assert_eq!(response.totals, expected);
    assert_eq!(
        response.stats.values().copied().sum::<MetricSet>(),
        response.totals
    );

    let table = render_stats_table(&response.stats);
    assert!(table.lines().last().unwrap().starts_with("TOTAL"));
    assert!(clock.sleeps.lock().unwrap().is_empty());
}

#[tokio::test]
async fn rate_limited_search_waits_for_reset() {
    let transport = Arc::new(ScriptedTransport::default());
    let clock = Arc::new(InstantClock::new());
    transport.ok("/users/me/repos", serde_json::json!([{"name": "a"}]));
    transport.ok("/repos/me/a/commits", serde_json::json!([{"sha": "1"}]));
    transport.push(
        search_key("a", SearchKind::PullRequests),
        403,
        &[
            ("X-RateLimit-Remaining", "0".to_string()),
            ("X-RateLimit-Reset", (NOW + 45).to_string()),
        ],
        serde_json::json!({"message": "API rate limit exceeded"}),
    );
    transport.ok(search_key("a", SearchKind::PullRequests), serde_json::json!({"total_count": 7}));
    transport.ok(
        search_key("a", SearchKind::MergedPullRequests),
        serde_json::json!({"total_count": 4}),
    );
    transport.ok(search_key("a", SearchKind::Issues), serde_json::json!({"total_count": 0}));

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let callback: ProgressCallback = Box::new(move |event| sink.lock().unwrap().push(event));

    let result = tokio::time::timeout(
        RUN_TIMEOUT,
        client(&transport, &clock).all_stats_for_year("me", 2024, Some(&callback)),
    )
    .await
    .expect("rate-limit wait should use the injected clock")
    .unwrap();

    assert_eq!(result.per_repo["a"].prs, 7);
    assert_eq!(result.totals.merges, 4);
    assert_eq!(*clock.sleeps.lock().unwrap(), vec![Duration::from_secs(45)]);

    let pr_requests = transport
        .seen()
        .iter()
        .filter(|k| **k == search_key("a", SearchKind::PullRequests))
        .count();
    assert_eq!(pr_requests, 2);

    let events = events.lock().unwrap();
    assert!(!events
        .iter()
        .any(|e| matches!(e, StatsProgress::MetricFailed { .. })));
}

#[tokio::test]
async fn frequency_polls_and_renders_failures_as_nulls() {
    let transport = Arc::new(ScriptedTransport::default());
    let clock = Arc::new(InstantClock::new());
    transport.ok("/users/me/repos", serde_json::json!([{"name": "a"}, {"name": "b"}]));
    transport.push("/repos/me/a/stats/code_frequency", 202, &[], serde_json::json!({}));
    transport.ok(
        "/repos/me/a/stats/code_frequency",
        serde_json::json!([
            [1_703_980_800, 100, -100],
            [1_704_067_200, 10, -4],
            [1_704_672_000, 5, 0],
        ]),
    );
    for _ in 0..5 {
        transport.push("/repos/me/b/stats/code_frequency", 202, &[], serde_json::json!({}));
    }

    let response: FrequencyResponse = tokio::time::timeout(
        RUN_TIMEOUT,
        client(&transport, &clock).frequency(
            &StatsRequest {
                username: "me".into(),
                year: 2024,
            },
            None,
        ),
    )
    .await
    .expect("polling should use the injected clock")
    .unwrap();

    assert_eq!(response.freq["a"], [Some(15), Some(4)]);
    assert_eq!(response.freq["b"], [None, None]);
    // One wait for `a`, four for `b`.
    assert_eq!(clock.sleeps.lock().unwrap().len(), 5);
}

#[tokio::test]
async fn link_listing_follows_every_page() {
    let transport = Arc::new(ScriptedTransport::default());
    let clock = Arc::new(InstantClock::new());
    let next = format!("<{API}/users/octocat/repos?per_page=100&page=2>; rel=\"next\"");
    transport.push(
        "/users/octocat/repos",
        200,
        &[("Link", next)],
        serde_json::json!([{"name": "one"}]),
    );
    transport.ok("/users/octocat/repos", serde_json::json!([{"name": "two"}]));

    let response = client(&transport, &clock)
        .list_account(&LinkRequest {
            url: "https://github.com/octocat".into(),
        })
        .await
        .unwrap();

    assert_eq!(response.username, "octocat");
    assert_eq!(response.repos, vec!["one", "two"]);
    assert_eq!(transport.seen().len(), 2);
}
