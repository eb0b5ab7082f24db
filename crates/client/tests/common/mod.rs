//! Shared fixtures for the client integration tests

#![allow(dead_code)]

use portal_client::{PortalClient, RecordingNavigator};
use serde_json::{Value, json};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CSRF_PATH: &str = "/api/auth/csrf/";

pub struct Backend {
    pub server: MockServer,
    pub navigator: RecordingNavigator,
    pub client: PortalClient,
}

impl Backend {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let navigator = RecordingNavigator::new();
        let client = PortalClient::builder()
            .base_url(server.uri())
            .navigator(Arc::new(navigator.clone()))
            .build()
            .expect("client builds against mock server");

        Self {
            server,
            navigator,
            client,
        }
    }

    /// Serve a CSRF token
    pub async fn csrf(&self, token: &str) {
        Mock::given(method("GET"))
            .and(path(CSRF_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "csrfToken": token })))
            .mount(&self.server)
            .await;
    }

    /// Make the CSRF endpoint fail
    pub async fn csrf_broken(&self) {
        Mock::given(method("GET"))
            .and(path(CSRF_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&self.server)
            .await;
    }

    /// `METHOD /path` of every request the backend saw, in order
    pub async fn calls(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| format!("{} {}", r.method.as_str(), r.url.path()))
            .collect()
    }
}

pub fn user_json(role: &str) -> Value {
    json!({
        "email": "ann@lender.test",
        "first_name": "Ann",
        "last_name": "Lee",
        "role": role,
        "company_name": "Lee Lending",
        "phone_number": "555-0100",
        "location": "Austin"
    })
}

pub fn auth_json(role: &str) -> Value {
    json!({ "message": "Login successful", "user": user_json(role) })
}

pub fn bid_json() -> Value {
    json!({
        "id": 9,
        "loan_estimate_id": "est-1",
        "amount": 2500.0,
        "status": "active",
        "created_at": "2024-05-01T10:00:00Z"
    })
}

pub fn lead_json(status: &str) -> Value {
    json!({
        "id": "lead-1",
        "status": status,
        "customer_name": "Bo Diaz",
        "email": "bo@example.test",
        "phone": "555-0199",
        "loan_amount": 320000.0,
        "loan_type": "conventional"
    })
}
