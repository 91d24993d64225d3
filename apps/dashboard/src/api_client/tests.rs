use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{ApiClient, REFRESH_PATH};
use crate::auth::{AuthSession, MemoryCredentialStore, SessionStatus, TokenPair};
use crate::errors::{ApiError, ErrorCategory, RefreshError};

const PROBE: &str = "/resumes/probe";

async fn client_with(server: &MockServer, tokens: TokenPair) -> ApiClient {
    client_with_timeout(server, tokens, Duration::from_secs(5)).await
}

async fn client_with_timeout(
    server: &MockServer,
    tokens: TokenPair,
    refresh_timeout: Duration,
) -> ApiClient {
    let store = Arc::new(MemoryCredentialStore::with_tokens(tokens));
    let session = Arc::new(AuthSession::restore(store).await);
    ApiClient::new(server.uri(), session, Duration::from_secs(5), refresh_timeout).unwrap()
}

fn stale_tokens() -> TokenPair {
    TokenPair::new("stale-access", "refresh-1")
}

async fn mount_refresh_success(server: &MockServer, delay: Duration, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .and(body_json(json!({ "refresh_token": "refresh-1" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "access_token": "fresh-access",
                    "refresh_token": "refresh-2"
                }))
                .set_delay(delay),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Probe answers 200 for the fresh token and 401 for anything else.
async fn mount_probe(server: &MockServer, fresh_calls: u64, rejected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(PROBE))
        .and(header("Authorization", "Bearer fresh-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .with_priority(1)
        .expect(fresh_calls)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(PROBE))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .with_priority(10)
        .expect(rejected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_bearer_token_attached() {
    let server = MockServer::start().await;
    let client = client_with(&server, TokenPair::new("fresh-access", "refresh-1")).await;
    mount_probe(&server, 1, 0).await;
    mount_refresh_success(&server, Duration::ZERO, 0).await;

    let body: Value = client.get_json(PROBE).await.unwrap();
    assert_eq!(body, json!({ "ok": true }));
    server.verify().await;
}

#[tokio::test]
async fn test_single_401_refreshes_and_replays() {
    let server = MockServer::start().await;
    let client = client_with(&server, stale_tokens()).await;
    mount_probe(&server, 1, 1).await;
    mount_refresh_success(&server, Duration::ZERO, 1).await;

    let body: Value = client.get_json(PROBE).await.unwrap();
    assert_eq!(body, json!({ "ok": true }));

    let store = client.session().store();
    assert_eq!(store.access_token().await.as_deref(), Some("fresh-access"));
    assert_eq!(store.refresh_token().await.as_deref(), Some("refresh-2"));
    assert_eq!(client.session().status(), SessionStatus::Authenticated);
    server.verify().await;
}

async fn run_concurrent_burst(n: u64) {
    let server = MockServer::start().await;
    let client = client_with(&server, stale_tokens()).await;
    mount_probe(&server, n, n).await;
    // The delay keeps the refresh in flight while the rest of the burst arrives.
    mount_refresh_success(&server, Duration::from_millis(200), 1).await;

    let calls = (0..n).map(|_| {
        let client = client.clone();
        async move { client.get_json::<Value>(PROBE).await }
    });
    let results = join_all(calls).await;

    assert_eq!(results.len() as u64, n);
    for result in results {
        assert_eq!(result.unwrap(), json!({ "ok": true }));
    }
    assert!(!client.session().gate().is_refreshing());
    assert_eq!(client.session().gate().queue_depth(), 0);
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_burst_of_two_shares_one_refresh() {
    run_concurrent_burst(2).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_burst_of_five_shares_one_refresh() {
    run_concurrent_burst(5).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_burst_of_twenty_shares_one_refresh() {
    run_concurrent_burst(20).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_late_401_adopts_settled_refresh() {
    let server = MockServer::start().await;
    let client = client_with(&server, stale_tokens()).await;
    mount_probe(&server, 1, 1).await;
    mount_refresh_success(&server, Duration::ZERO, 1).await;

    // Dispatched with the stale token alongside the probe, but its 401 only
    // lands after the probe's refresh has already settled.
    const SLOW: &str = "/resumes/slow";
    Mock::given(method("GET"))
        .and(path(SLOW))
        .and(header("Authorization", "Bearer fresh-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "slow": true })))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SLOW))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(400)))
        .with_priority(10)
        .expect(1)
        .mount(&server)
        .await;

    let generation_before = client.session().gate().generation();
    let (fast, slow) = tokio::join!(
        client.get_json::<Value>(PROBE),
        client.get_json::<Value>(SLOW)
    );

    assert_eq!(fast.unwrap(), json!({ "ok": true }));
    assert_eq!(slow.unwrap(), json!({ "slow": true }));
    assert_eq!(client.session().gate().generation(), generation_before + 1);
    assert_eq!(client.session().status(), SessionStatus::Authenticated);
    server.verify().await;
}

#[tokio::test]
async fn test_second_401_is_not_retried_again() {
    let server = MockServer::start().await;
    let client = client_with(&server, stale_tokens()).await;
    mount_refresh_success(&server, Duration::ZERO, 1).await;

    Mock::given(method("GET"))
        .and(path(PROBE))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let err = client.get_json::<Value>(PROBE).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized), "got {err:?}");
    assert_eq!(err.category(), ErrorCategory::AuthInvalid);
    assert!(client.session().store().access_token().await.is_none());
    assert!(matches!(
        client.session().status(),
        SessionStatus::SignedOut { .. }
    ));
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_refresh_failure_fails_whole_burst() {
    let server = MockServer::start().await;
    let client = client_with(&server, stale_tokens()).await;
    let mut status = client.session().subscribe();

    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({
                    "error": { "code": "UNAUTHORIZED", "message": "refresh token revoked" }
                }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_probe(&server, 0, 5).await;

    let calls = (0..5).map(|_| {
        let client = client.clone();
        async move { client.get_json::<Value>(PROBE).await }
    });
    let results = join_all(calls).await;

    let expected = RefreshError::Rejected {
        status: 401,
        message: "refresh token revoked".to_string(),
    };
    for result in results {
        match result {
            Err(ApiError::SessionExpired(reason)) => assert_eq!(reason, expected),
            other => panic!("expected SessionExpired, got {other:?}"),
        }
    }

    let store = client.session().store();
    assert!(store.access_token().await.is_none());
    assert!(store.refresh_token().await.is_none());
    assert!(status.has_changed().unwrap());
    assert!(matches!(
        *status.borrow_and_update(),
        SessionStatus::SignedOut { reason: Some(_) }
    ));
    server.verify().await;
}

#[tokio::test]
async fn test_missing_refresh_token_signs_out_without_calling_refresh() {
    let server = MockServer::start().await;
    let client = client_with(
        &server,
        TokenPair {
            access_token: Some("stale-access".to_string()),
            refresh_token: None,
        },
    )
    .await;
    mount_probe(&server, 0, 1).await;
    mount_refresh_success(&server, Duration::ZERO, 0).await;

    let err = client.get_json::<Value>(PROBE).await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::SessionExpired(RefreshError::MissingRefreshToken)
    ));
    assert!(client.session().store().access_token().await.is_none());
    server.verify().await;
}

#[tokio::test]
async fn test_refresh_timeout_surfaces_as_failure() {
    let server = MockServer::start().await;
    let client = client_with_timeout(&server, stale_tokens(), Duration::from_millis(100)).await;
    mount_probe(&server, 0, 1).await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "fresh-access" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = client.get_json::<Value>(PROBE).await.unwrap_err();
    assert!(
        matches!(err, ApiError::SessionExpired(RefreshError::Timeout(_))),
        "got {err:?}"
    );
    assert!(!client.session().gate().is_refreshing());
}

#[tokio::test]
async fn test_other_failures_never_refresh() {
    let server = MockServer::start().await;
    let client = client_with(&server, stale_tokens()).await;
    mount_refresh_success(&server, Duration::ZERO, 0).await;

    for (route, status, category) in [
        ("/resumes/forbidden", 403, ErrorCategory::AccessDenied),
        ("/resumes/missing", 404, ErrorCategory::NotFound),
        ("/resumes/broken", 500, ErrorCategory::Server),
        ("/resumes/invalid", 422, ErrorCategory::Client),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": { "code": "X", "message": format!("status {status}") }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client.get_json::<Value>(route).await.unwrap_err();
        assert_eq!(err.category(), category, "route {route}");
        assert!(err.to_string().contains(&format!("status {status}")));
    }

    assert_eq!(
        client.session().store().access_token().await.as_deref(),
        Some("stale-access")
    );
    server.verify().await;
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let store = Arc::new(MemoryCredentialStore::with_tokens(stale_tokens()));
    let session = Arc::new(AuthSession::restore(store).await);
    // Port 9 (discard) is not listening in test environments.
    let client = ApiClient::new(
        "http://127.0.0.1:9",
        session,
        Duration::from_secs(2),
        Duration::from_secs(2),
    )
    .unwrap();

    let err = client.get_json::<Value>(PROBE).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Network);
}

#[tokio::test]
async fn test_refresh_keeps_old_refresh_token_when_not_rotated() {
    let server = MockServer::start().await;
    let client = client_with(&server, stale_tokens()).await;
    mount_probe(&server, 1, 1).await;

    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "access_token": "fresh-access" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    client.get_json::<Value>(PROBE).await.unwrap();
    assert_eq!(
        client.session().store().refresh_token().await.as_deref(),
        Some("refresh-1")
    );
}

#[tokio::test]
async fn test_malformed_refresh_response_signs_out() {
    let server = MockServer::start().await;
    let client = client_with(&server, stale_tokens()).await;
    mount_probe(&server, 0, 1).await;

    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.get_json::<Value>(PROBE).await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::SessionExpired(RefreshError::Malformed(_))
    ));
    assert!(client.session().store().refresh_token().await.is_none());
}
