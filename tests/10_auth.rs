mod common;

use axum::http::{Method, StatusCode};
use chrono::Duration;
use council_api::auth::{Claims, TokenIssuer};
use council_api::database::Store;
use council_api::error::INVALID_TOKEN_MESSAGE;
use serde_json::json;

use common::{TestApp, SECRET};

fn person_body() -> serde_json::Value {
    json!({ "full_name": "Grace Achieng", "national_id": "30111222" })
}

#[tokio::test]
async fn missing_header_is_rejected_before_any_write() {
    let app = TestApp::new();

    let (status, body) = app.call(Method::POST, "/api/persons", None, Some(person_body())).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], INVALID_TOKEN_MESSAGE);
    assert!(app.store.list_persons().await.unwrap().is_empty());
    assert!(app.audit_entries().await.is_empty());
}

#[tokio::test]
async fn bad_tokens_get_the_same_response_as_no_token() {
    let app = TestApp::new();
    let (_, missing) = app.call(Method::GET, "/api/persons", None, None).await;

    let issuer = TokenIssuer::new(SECRET, 1).unwrap();
    let expired = issuer
        .sign(&Claims::new("clerk", "admin", Duration::seconds(-600)))
        .unwrap();
    let foreign = TokenIssuer::new("some-other-secret", 1)
        .unwrap()
        .issue("clerk", "admin")
        .unwrap();
    let tampered = {
        let genuine = issuer.issue("clerk", "auditor").unwrap();
        let forged = issuer.issue("clerk", "admin").unwrap();
        let mut parts: Vec<&str> = genuine.split('.').collect();
        parts[1] = forged.split('.').nth(1).unwrap();
        parts.join(".")
    };

    let headers = [
        format!("Bearer {}", expired),
        format!("Bearer {}", foreign),
        format!("Bearer {}", tampered),
        "Bearer not-a-jwt".to_string(),
        "Bearer ".to_string(),
        format!("Basic {}", issuer.issue("clerk", "admin").unwrap()),
    ];

    for header in headers {
        let (status, body) = app
            .call_with_header(Method::GET, "/api/persons", Some(header.clone()), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", header);
        assert_eq!(body, missing, "{}", header);
    }
}

#[tokio::test]
async fn expired_token_cannot_mutate() {
    let app = TestApp::new();
    let person = app.seed_person("Peter Otieno", "22334455").await;

    let expired = TokenIssuer::new(SECRET, 1)
        .unwrap()
        .sign(&Claims::new("clerk", "admin", Duration::seconds(-1)))
        .unwrap();

    let (status, _) = app
        .call_with_header(
            Method::DELETE,
            &format!("/api/persons/{}", person.id),
            Some(format!("Bearer {}", expired)),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(app.store.get_person(person.id).await.unwrap().is_some());
    assert!(app.audit_entries().await.is_empty());
}

#[tokio::test]
async fn public_routes_need_no_token() {
    let app = TestApp::new();

    let (status, body) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");

    let (status, body) = app.call(Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn valid_token_reaches_the_handler() {
    let app = TestApp::new();
    app.seed_person("Mary Njeri", "11112222").await;

    let (status, body) = app.call(Method::GET, "/api/persons", Some("auditor"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}
