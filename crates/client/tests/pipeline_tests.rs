//! Request pipeline behaviour: CSRF step, credentials, auth-failure redirects

mod common;

use common::{Backend, CSRF_PATH, bid_json, lead_json};
use portal_client::{ApiErrorKind, PortalClient, RecordingNavigator, RouteContext};
use portal_core::{GateDecision, LeadStatus, SessionGate};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, header_regex, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_mutating_call_fetches_token_first_and_attaches_it() {
    let backend = Backend::start().await;
    backend.csrf("tok-123").await;

    Mock::given(method("POST"))
        .and(path("/api/bids/"))
        .and(header("x-csrftoken", "tok-123"))
        .and(body_json(json!({ "loan_estimate_id": "est-1", "amount": 2500.0 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(bid_json()))
        .expect(1)
        .mount(&backend.server)
        .await;

    let route = RouteContext::new("/estimates/est-1");
    let bid = backend
        .client
        .place_bid(&route, "est-1".into(), 2500.0)
        .await
        .unwrap();

    assert_eq!(bid.id.as_str(), "9");
    assert_eq!(
        backend.calls().await,
        vec![format!("GET {CSRF_PATH}"), "POST /api/bids/".to_string()]
    );
}

#[tokio::test]
async fn test_token_failure_still_sends_request_without_header() {
    let backend = Backend::start().await;
    backend.csrf_broken().await;

    Mock::given(method("PATCH"))
        .and(path("/api/leads/lead-1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lead_json("contacted")))
        .expect(1)
        .mount(&backend.server)
        .await;

    let route = RouteContext::new("/leads");
    let lead = backend
        .client
        .update_lead(&route, &"lead-1".into(), LeadStatus::Contacted, None)
        .await
        .unwrap();
    assert_eq!(lead.status, LeadStatus::Contacted);

    let requests = backend.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].url.path(), CSRF_PATH);
    assert_eq!(requests[1].method.as_str(), "PATCH");
    assert!(requests[1].headers.get("x-csrftoken").is_none());
    assert!(backend.navigator.visits().is_empty());
}

#[tokio::test]
async fn test_read_calls_skip_token_fetch() {
    let backend = Backend::start().await;
    backend.csrf("unused").await;

    Mock::given(method("GET"))
        .and(path("/api/leads/my-leads/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([lead_json("new")])))
        .mount(&backend.server)
        .await;

    let leads = backend
        .client
        .my_leads(&RouteContext::new("/leads"))
        .await
        .unwrap();

    assert_eq!(leads.len(), 1);
    assert_eq!(backend.calls().await, vec!["GET /api/leads/my-leads/"]);
}

#[tokio::test]
async fn test_forbidden_redirects_and_still_fails() {
    let backend = Backend::start().await;

    Mock::given(method("GET"))
        .and(path("/api/leads/my-leads/"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(json!({ "detail": "You do not have permission." })),
        )
        .mount(&backend.server)
        .await;

    let error = backend
        .client
        .my_leads(&RouteContext::new("/leads"))
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ApiErrorKind::Unauthorized);
    assert_eq!(error.status(), Some(403));
    assert_eq!(error.message(), "You do not have permission.");
    assert_eq!(backend.navigator.visits(), vec!["/login"]);
}

#[tokio::test]
async fn test_unauthorized_on_auth_page_does_not_redirect() {
    let backend = Backend::start().await;
    backend.csrf("tok").await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({
                "error": "Access denied. This portal is for lenders only."
            })),
        )
        .mount(&backend.server)
        .await;

    let credentials = portal_core::LoginRequest {
        email: "bo@borrower.test".into(),
        password: "secret".into(),
    };
    let error = backend
        .client
        .login(&RouteContext::new("/login"), &credentials)
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ApiErrorKind::Unauthorized);
    assert_eq!(
        error.message(),
        "Access denied. This portal is for lenders only."
    );
    assert!(backend.navigator.visits().is_empty());
}

#[tokio::test]
async fn test_other_failures_do_not_redirect() {
    let backend = Backend::start().await;

    Mock::given(method("GET"))
        .and(path("/api/bids/my-bids/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&backend.server)
        .await;

    let error = backend
        .client
        .my_bids(&RouteContext::new("/bids"))
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ApiErrorKind::Rejected);
    assert_eq!(error.message(), "Failed to fetch bids");
    assert!(backend.navigator.visits().is_empty());
}

#[tokio::test]
async fn test_network_failure_is_normalized() {
    let navigator = RecordingNavigator::new();
    // Nothing listens on port 1
    let client = PortalClient::builder()
        .base_url("http://127.0.0.1:1")
        .navigator(Arc::new(navigator.clone()))
        .build()
        .unwrap();

    let error = client
        .loan_estimates(&RouteContext::new("/estimates"))
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ApiErrorKind::Network);
    assert_eq!(error.message(), "Failed to fetch loan estimates");
    assert_eq!(error.status(), None);
    assert!(navigator.visits().is_empty());
}

#[tokio::test]
async fn test_session_cookie_is_kept_and_sent() {
    let backend = Backend::start().await;
    backend.csrf("tok").await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "sessionid=abc123; Path=/; HttpOnly")
                .set_body_json(common::auth_json("LENDER")),
        )
        .mount(&backend.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/bids/my-bids/"))
        .and(header_regex("cookie", "sessionid=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&backend.server)
        .await;

    assert!(!backend.client.has_session());

    let credentials = portal_core::LoginRequest {
        email: "ann@lender.test".into(),
        password: "secret".into(),
    };
    backend
        .client
        .login(&RouteContext::new("/login"), &credentials)
        .await
        .unwrap();

    assert!(backend.client.has_session());
    let bids = backend
        .client
        .my_bids(&RouteContext::new("/bids"))
        .await
        .unwrap();
    assert!(bids.is_empty());
}

#[tokio::test]
async fn test_gate_redirects_before_any_fetch() {
    let backend = Backend::start().await;
    let gate = SessionGate::default();

    let decision = gate.decide("/leads", backend.client.has_session());

    assert_eq!(decision, GateDecision::Redirect("/login".into()));
    assert!(backend.calls().await.is_empty());
}

#[tokio::test]
async fn test_restored_session_passes_gate() {
    let backend = Backend::start().await;
    backend.client.restore_cookies("sessionid=persisted");

    let gate = SessionGate::default();
    assert!(gate.decide("/leads", backend.client.has_session()).is_allow());
    assert_eq!(
        gate.decide("/login", backend.client.has_session()),
        GateDecision::Redirect("/dashboard".into())
    );
}
