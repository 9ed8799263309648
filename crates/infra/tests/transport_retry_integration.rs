//! Integration tests for the credential-aware transport
//!
//! **Coverage:**
//! - Server errors retried until success, no credential refresh
//! - 401/403 trigger one refresh per response and pick up rotated secrets
//! - Rate limiting retried silently
//! - Client errors and 501 returned without retry or error
//! - Exhausted retries surfaced as network errors

#[path = "support.rs"]
mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hubbridge_domain::{BridgeError, ServiceUser};
use hubbridge_infra::http::basic_auth;
use reqwest::{Method, StatusCode};
use support::{fast_client, store_with, ScriptedUsers};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Respond with `statuses` in order, repeating the last one.
fn sequence(statuses: Vec<u16>) -> impl Fn(&Request) -> ResponseTemplate {
    let counter = Arc::new(AtomicUsize::new(0));
    move |_req: &Request| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        let status = statuses.get(n).or(statuses.last()).copied().unwrap_or(200);
        ResponseTemplate::new(status).set_body_string(format!("response {n}"))
    }
}

fn decoded_auth(request: &Request) -> String {
    let value = request.headers.get("authorization").unwrap().to_str().unwrap();
    let encoded = value.strip_prefix("Basic ").unwrap();
    String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap()
}

#[tokio::test]
async fn two_unavailable_then_ok_retries_twice_without_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/inventory"))
        .respond_with(sequence(vec![503, 503, 200]))
        .expect(3)
        .mount(&server)
        .await;

    let users = ScriptedUsers::fixed(vec![ServiceUser::new("t1", "svc", "s1")]);
    let store = store_with(users.clone(), vec![ServiceUser::new("t1", "svc", "s1")]);
    let client = fast_client(Some(store));

    let response = client
        .send(
            client
                .request(Method::GET, format!("{}/inventory", server.uri()))
                .header("Authorization", basic_auth::encode("t1", "svc", "s1")),
        )
        .await
        .expect("final response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "response 2");
    assert_eq!(users.calls(), 0, "credential refresh must not run for 503");
}

#[tokio::test]
async fn two_unauthorized_then_ok_refreshes_twice() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(sequence(vec![401, 401, 200]))
        .expect(3)
        .mount(&server)
        .await;

    let users = ScriptedUsers::fixed(vec![ServiceUser::new("t1", "svc", "rotated")]);
    let store = store_with(users.clone(), vec![ServiceUser::new("t1", "svc", "stale")]);
    let client = fast_client(Some(store));

    let response = client
        .send(
            client
                .request(Method::GET, server.uri())
                .header("Authorization", basic_auth::encode("t1", "svc", "stale")),
        )
        .await
        .expect("final response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(users.calls(), 2);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(decoded_auth(&requests[0]), "t1/svc:stale");
    assert_eq!(decoded_auth(&requests[1]), "t1/svc:rotated");
    assert_eq!(decoded_auth(&requests[2]), "t1/svc:rotated");
}

#[tokio::test]
async fn forbidden_refresh_failure_does_not_abort_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(sequence(vec![403, 200]))
        .expect(2)
        .mount(&server)
        .await;

    let users = ScriptedUsers::failing();
    let store = store_with(users.clone(), vec![ServiceUser::new("t1", "svc", "s1")]);
    let client = fast_client(Some(store.clone()));

    let response = client
        .send(
            client
                .request(Method::GET, server.uri())
                .header("Authorization", basic_auth::encode("t1", "svc", "s1")),
        )
        .await
        .expect("final response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(users.calls(), 1);
    assert_eq!(store.lookup("t1", "svc").as_deref(), Some("s1"));
}

#[tokio::test]
async fn persistent_unauthorized_returns_last_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .expect(3)
        .mount(&server)
        .await;

    let users = ScriptedUsers::fixed(vec![]);
    let store = store_with(users.clone(), vec![]);
    let client = fast_client(Some(store));

    let response = client.send(client.request(Method::GET, server.uri())).await.expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(users.calls(), 3);
}

#[tokio::test]
async fn rate_limit_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(sequence(vec![429, 200]))
        .expect(2)
        .mount(&server)
        .await;

    let client = fast_client(None);
    let response = client.send(client.request(Method::GET, server.uri())).await.expect("response");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn not_found_and_not_implemented_are_not_retried() {
    for status in [404u16, 501] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&server)
            .await;

        let client = fast_client(None);
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("no error");

        assert_eq!(response.status().as_u16(), status);
    }
}

#[tokio::test]
async fn exhausted_server_errors_are_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let client = fast_client(None);
    let err = client
        .send(client.request(Method::POST, server.uri()).body("payload"))
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::Network(ref msg) if msg.contains("503")), "{err:?}");
}

#[tokio::test]
async fn unknown_users_keep_their_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", basic_auth::encode("t9", "other", "own").as_str()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let users = ScriptedUsers::fixed(vec![]);
    let store = store_with(users, vec![ServiceUser::new("t1", "svc", "s1")]);
    let client = fast_client(Some(store));

    let response = client
        .send(
            client
                .request(Method::GET, server.uri())
                .header("Authorization", basic_auth::encode("t9", "other", "own")),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
}
