// Runs against a real database when DATABASE_URL is set; skipped otherwise.

mod common;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use council_api::app::{router, AppState};
use council_api::auth::TokenIssuer;
use council_api::config::AppConfig;
use council_api::database::{AuditEntry, AuditSink, PgStore, Store};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::SECRET;

struct PgApp {
    router: Router,
    store: Arc<PgStore>,
    issuer: TokenIssuer,
    /// Keeps natural keys unique across runs sharing one database.
    suffix: String,
}

impl PgApp {
    async fn connect() -> Result<Option<Self>> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping Postgres suite");
            return Ok(None);
        };

        let config = AppConfig::development();
        let store = Arc::new(PgStore::connect(&url, &config.database).await?);
        store.ensure_schema().await?;

        let state = AppState::new(store.clone(), store.clone(), SECRET);
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
        Ok(Some(Self {
            router: router(state, &config.security),
            store,
            issuer: TokenIssuer::new(SECRET, 1)?,
            suffix: nanos.to_string(),
        }))
    }

    fn key(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.suffix)
    }

    async fn call(&self, method: Method, uri: &str, role: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let token = self.issuer.issue(&format!("{}-user", role), role)?;
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token));
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, body))
    }

    /// Audit entries written by this run, newest first.
    async fn own_entries(&self) -> Result<Vec<AuditEntry>> {
        let entries = self.store.recent(500).await?;
        Ok(entries
            .into_iter()
            .filter(|e| e.details.contains(&self.suffix))
            .collect())
    }
}

fn id_of(body: &Value) -> i64 {
    body["data"]["id"].as_i64().expect("id in response")
}

// One test so the schema bootstrap never runs concurrently.
#[tokio::test]
async fn postgres_store_scenarios() -> Result<()> {
    let Some(app) = PgApp::connect().await? else {
        return Ok(());
    };
    access_and_audit(&app).await?;

    let Some(app) = PgApp::connect().await? else {
        return Ok(());
    };
    group_delete_detaches_members(&app).await
}

async fn access_and_audit(app: &PgApp) -> Result<()> {
    // Create a person as data-entry
    let national_id = app.key("NID");
    let (status, body) = app
        .call(
            Method::POST,
            "/api/persons",
            "data-entry",
            Some(json!({ "full_name": "Jane Wanjiru", "national_id": national_id })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let person_id = id_of(&body);

    let entries = app.own_entries().await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, "Added Person");

    // Unique natural key
    let (status, _) = app
        .call(
            Method::POST,
            "/api/persons",
            "manager",
            Some(json!({ "full_name": "Someone Else", "national_id": national_id })),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // Missing referent
    let (status, body) = app
        .call(
            Method::POST,
            "/api/loans",
            "manager",
            Some(json!({ "reference": app.key("LN-ORPHAN"), "amount": "10.00", "person_id": i64::MAX })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    // Loan for the person
    let reference = app.key("LN");
    let (status, body) = app
        .call(
            Method::POST,
            "/api/loans",
            "manager",
            Some(json!({ "reference": reference, "amount": "2500.50", "person_id": person_id })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["amount"], "2500.50");
    let loan_id = id_of(&body);

    // data-entry cannot delete it
    let (status, body) = app
        .call(Method::DELETE, &format!("/api/loans/{}", loan_id), "data-entry", None)
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["required_roles"], json!(["admin"]));
    assert!(app.store.get_loan(loan_id).await?.is_some());

    // The person is still referenced
    let (status, _) = app
        .call(Method::DELETE, &format!("/api/persons/{}", person_id), "manager", None)
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .call(Method::DELETE, &format!("/api/loans/{}", loan_id), "admin", None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(app.store.get_loan(loan_id).await?.is_none());

    let (status, _) = app
        .call(Method::PUT, &format!("/api/loans/{}", loan_id), "manager", Some(json!({
            "reference": reference, "amount": "1.00", "person_id": person_id
        })))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let actions: Vec<String> = app.own_entries().await?.into_iter().map(|e| e.action).collect();
    assert_eq!(actions, vec!["Deleted Loan", "Added Loan", "Added Person"]);

    let (status, body) = app
        .call(Method::GET, "/api/admin/audit-logs?limit=2", "auditor", None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

    let (status, body) = app.call(Method::GET, "/api/dashboard/summary", "auditor", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["persons"].as_i64().unwrap_or(0) >= 1);
    Ok(())
}

async fn group_delete_detaches_members(app: &PgApp) -> Result<()> {
    let (status, body) = app
        .call(
            Method::POST,
            "/api/groups",
            "manager",
            Some(json!({ "name": "Tumaini Women", "registration_number": app.key("SHG") })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let group_id = id_of(&body);

    let (status, body) = app
        .call(
            Method::POST,
            "/api/persons",
            "data-entry",
            Some(json!({ "full_name": "Amina", "national_id": app.key("MEMBER"), "group_id": group_id })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let person_id = id_of(&body);

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/groups/{}", group_id),
            "data-entry",
            Some(json!({ "name": "Tumaini Women Group", "registration_number": app.key("SHG") })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["name"], "Tumaini Women Group");

    let (status, _) = app
        .call(Method::DELETE, &format!("/api/groups/{}", group_id), "manager", None)
        .await?;
    assert_eq!(status, StatusCode::OK);

    let member = app.store.get_person(person_id).await?.expect("member survives");
    assert_eq!(member.group_id, None);

    let actions: Vec<String> = app.own_entries().await?.into_iter().map(|e| e.action).collect();
    assert_eq!(actions, vec!["Deleted Group", "Updated Group", "Added Person", "Added Group"]);
    Ok(())
}
