#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use council_api::app::{router, AppState};
use council_api::auth::TokenIssuer;
use council_api::config::AppConfig;
use council_api::database::{
    AuditEntry, AuditSink, GroupInput, Loan, LoanInput, MemoryStore, Person, PersonInput, Store,
};
use serde_json::Value;
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret";

/// Router over a fresh in-memory store, driven with `oneshot`.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub issuer: TokenIssuer,
}

impl TestApp {
    pub fn new() -> Self {
        let (state, store) = AppState::in_memory(SECRET);
        Self::build(state, store)
    }

    /// Resources in memory, audit entries sent to `sink`.
    pub fn with_audit_sink(sink: Arc<dyn AuditSink>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), sink, SECRET);
        Self::build(state, store)
    }

    fn build(state: AppState, store: Arc<MemoryStore>) -> Self {
        let security = AppConfig::development().security;
        Self {
            router: router(state, &security),
            store,
            issuer: TokenIssuer::new(SECRET, 1).expect("issuer"),
        }
    }

    pub fn token(&self, role: &str) -> String {
        self.issuer.issue(&format!("{}-user", role), role).expect("token")
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.expect("infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, body)
    }

    /// Request as `role` (or anonymously when `None`).
    pub async fn call(&self, method: Method, uri: &str, role: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let token = role.map(|r| self.token(r));
        self.call_with_header(method, uri, token.map(|t| format!("Bearer {}", t)), body)
            .await
    }

    pub async fn call_with_header(
        &self,
        method: Method,
        uri: &str,
        authorization: Option<String>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn audit_entries(&self) -> Vec<AuditEntry> {
        self.store.recent(10_000).await.expect("audit entries")
    }

    pub async fn seed_person(&self, name: &str, national_id: &str) -> Person {
        self.store
            .create_person(&PersonInput {
                full_name: name.to_string(),
                national_id: national_id.to_string(),
                ..Default::default()
            })
            .await
            .expect("seed person")
    }

    pub async fn seed_group(&self, name: &str, registration_number: &str) -> i64 {
        self.store
            .create_group(&GroupInput {
                name: name.to_string(),
                registration_number: registration_number.to_string(),
                ward: None,
            })
            .await
            .expect("seed group")
            .id
    }

    pub async fn seed_loan(&self, reference: &str, person_id: i64) -> Loan {
        let input: LoanInput = serde_json::from_value(serde_json::json!({
            "reference": reference,
            "amount": "5000.00",
            "person_id": person_id,
        }))
        .expect("loan input");
        self.store.create_loan(&input).await.expect("seed loan")
    }
}
