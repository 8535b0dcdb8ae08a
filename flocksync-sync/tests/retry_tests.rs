use flocksync_sync::{JsonClient, JsonRequest, RetryPolicy, SyncError, with_retry};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_policy(retries: u32) -> RetryPolicy {
    RetryPolicy::new(retries, Duration::from_millis(10))
}

// ── Policy defaults ───────────────────────────────────────────────

#[test]
fn default_policy_is_three_retries_one_second() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.retries, 3);
    assert_eq!(policy.delay, Duration::from_secs(1));
    assert_eq!(policy.max_attempts(), 4);
}

#[test]
fn no_retry_makes_one_attempt() {
    assert_eq!(RetryPolicy::no_retry().max_attempts(), 1);
}

#[test]
fn policy_serde_uses_millis() {
    let policy: RetryPolicy = serde_json::from_str(r#"{"retries": 5, "delay_ms": 250}"#).unwrap();
    assert_eq!(policy, RetryPolicy::new(5, Duration::from_millis(250)));

    let partial: RetryPolicy = serde_json::from_str(r#"{"retries": 1}"#).unwrap();
    assert_eq!(partial.delay, Duration::from_secs(1));
}

// ── with_retry over plain operations ──────────────────────────────

#[tokio::test(start_paused = true)]
async fn fails_twice_then_succeeds_after_two_pauses() {
    let attempts = AtomicU32::new(0);
    let start = tokio::time::Instant::now();

    let result = with_retry(&RetryPolicy::default(), "flaky", || async {
        let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= 2 {
            Err(SyncError::Network(format!("attempt {n} failed")))
        } else {
            Ok(n)
        }
    })
    .await;

    assert_eq!(result.unwrap(), 3);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(2), "paused {elapsed:?}");
    assert!(elapsed < Duration::from_secs(3), "paused {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn always_failing_gives_up_after_four_attempts() {
    let attempts = AtomicU32::new(0);

    let result: Result<(), _> = with_retry(&RetryPolicy::default(), "down", || async {
        let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
        Err(SyncError::Network(format!("attempt {n} failed")))
    })
    .await;

    assert_eq!(attempts.load(Ordering::SeqCst), 4);
    match result {
        Err(SyncError::Network(msg)) => assert_eq!(msg, "attempt 4 failed"),
        other => panic!("expected last network error, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn success_on_first_attempt_does_not_pause() {
    let start = tokio::time::Instant::now();
    let value = with_retry(&RetryPolicy::default(), "ok", || async { Ok::<_, SyncError>(7) })
        .await
        .unwrap();
    assert_eq!(value, 7);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test]
async fn zero_budget_returns_first_error() {
    let attempts = AtomicU32::new(0);
    let result: Result<(), _> = with_retry(&RetryPolicy::no_retry(), "once", || async {
        attempts.fetch_add(1, Ordering::SeqCst);
        Err(SyncError::Decode("bad".into()))
    })
    .await;
    assert!(matches!(result, Err(SyncError::Decode(_))));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

// ── JsonClient over HTTP ──────────────────────────────────────────

#[tokio::test]
async fn client_retries_server_errors_then_decodes_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = JsonClient::new(fast_policy(3)).unwrap();
    let body = client
        .send(&JsonRequest::get(format!("{}/flaky", server.uri())))
        .await
        .unwrap();
    assert_eq!(body, serde_json::json!({"ok": true}));
}

#[tokio::test]
async fn client_makes_initial_plus_budget_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(4)
        .mount(&server)
        .await;

    let client = JsonClient::new(fast_policy(3)).unwrap();
    let err = client
        .send(&JsonRequest::get(format!("{}/down", server.uri())))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert!(err.to_string().contains("boom"));
}

#[tokio::test]
async fn empty_success_body_is_null() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/update"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = JsonClient::new(fast_policy(3)).unwrap();
    let body = client
        .send(&JsonRequest::post(
            format!("{}/update", server.uri()),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert!(body.is_null());
}

#[tokio::test]
async fn invalid_json_is_retried_then_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .expect(2)
        .mount(&server)
        .await;

    let client = JsonClient::new(fast_policy(1)).unwrap();
    let err = client
        .send(&JsonRequest::get(format!("{}/garbled", server.uri())))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Decode(_)));
}

#[tokio::test]
async fn unreachable_host_is_network_error() {
    // Bind then drop a server so the port is closed.
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };

    let client = JsonClient::new(fast_policy(1)).unwrap();
    let err = client.send(&JsonRequest::get(uri)).await.unwrap_err();
    assert!(matches!(err, SyncError::Network(_)));
}

#[tokio::test]
async fn closure_state_visible_across_attempts() {
    let seen = Arc::new(AtomicU32::new(0));
    let counter = seen.clone();
    let result = with_retry(&fast_policy(5), "count", move || {
        let counter = counter.clone();
        async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 4 {
                Err(SyncError::Network("not yet".into()))
            } else {
                Ok("done")
            }
        }
    })
    .await;
    assert_eq!(result.unwrap(), "done");
    assert_eq!(seen.load(Ordering::SeqCst), 5);
}
