//! HTTP contract tests against the in-memory store.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

use atendimentos_core::{ClientRecord, CreatePolicy, ResolverConfig};
use atendimentos_server::{build_router, AppState, StaticTokenAuthenticator};
use atendimentos_testing::fixtures::{create_body, record, with_id};
use atendimentos_testing::InMemoryClientStore;
use atendimentos_web::CORRELATION_ID_HEADER;
use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;

const TOKEN: &str = "test-token";

fn server_with(store: &InMemoryClientStore, config: ResolverConfig) -> TestServer {
    let authenticator =
        StaticTokenAuthenticator::new([(TOKEN.to_string(), "recepcao".to_string())]);
    let state = AppState::new(Arc::new(store.clone()), config, Arc::new(authenticator));
    TestServer::new(build_router(state)).unwrap()
}

fn server(store: &InMemoryClientStore) -> TestServer {
    server_with(store, ResolverConfig::default())
}

// ============ Health ============

#[tokio::test]
async fn test_health_check() {
    let server = server(&InMemoryClientStore::new());

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert!(response.headers().contains_key(CORRELATION_ID_HEADER));
}

#[tokio::test]
async fn test_ready_follows_store() {
    let store = InMemoryClientStore::new();
    let server = server(&store);

    server.get("/ready").await.assert_status_ok();

    store.set_unavailable(true);
    let response = server.get("/ready").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json::<Value>(), json!({ "ready": false, "store": false }));
}

// ============ Authentication ============

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let store = InMemoryClientStore::new();
    let server = server(&store);

    let response = server
        .post("/api/clients/upsert")
        .json(&create_body("Ana Souza", "12345678909"))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["ok"], json!(false));
    assert_eq!(body["error"]["code"], json!("UNAUTHORIZED"));
    assert_eq!(store.write_calls(), 0);
}

#[tokio::test]
async fn test_unknown_token_is_unauthorized() {
    let server = server(&InMemoryClientStore::new());

    server
        .post("/api/clients/lookup")
        .authorization_bearer("wrong")
        .json(&json!({ "cpf": "12345678909" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

// ============ Lookup ============

#[tokio::test]
async fn test_lookup_success_envelope() {
    let ana = record("Ana Souza", Some("12345678909"));
    let store = InMemoryClientStore::seeded([ana.clone()]);
    let server = server(&store);

    let response = server
        .post("/api/clients/lookup")
        .authorization_bearer(TOKEN)
        .json(&json!({ "cpf": "123.456.789-09" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["data"]["id"], json!(ana.id.to_string()));
    assert_eq!(body["data"]["cpf"], json!("12345678909"));
    assert_eq!(body["data"]["estadoUf"], json!("PE"));
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_lookup_failures_are_bad_requests() {
    let store = InMemoryClientStore::seeded([
        record("Ana Souza", None),
        record("ana souza", None),
    ]);
    let server = server(&store);

    let cases = [
        (json!({}), "INVALID_QUERY"),
        (json!({ "cpf": "123" }), "INVALID_QUERY"),
        (json!({ "nome": "Bia" }), "NOT_FOUND"),
        (json!({ "nome": "Ana Souza" }), "AMBIGUOUS"),
    ];

    for (query, code) in cases {
        let response = server
            .post("/api/clients/lookup")
            .authorization_bearer(TOKEN)
            .json(&query)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["ok"], json!(false), "query {query}");
        assert_eq!(body["error"]["code"], json!(code), "query {query}");
        assert!(body["error"]["message"].is_string());
        assert!(body.get("data").is_none());
    }
}

#[tokio::test]
async fn test_lookup_non_json_body_is_invalid_query() {
    let server = server(&InMemoryClientStore::new());

    let response = server
        .post("/api/clients/lookup")
        .authorization_bearer(TOKEN)
        .text("cpf=12345678909")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], json!("INVALID_QUERY"));
}

#[tokio::test]
async fn test_store_outage_is_unknown_server_error() {
    let store = InMemoryClientStore::new();
    store.set_unavailable(true);
    let server = server(&store);

    let response = server
        .post("/api/clients/lookup")
        .authorization_bearer(TOKEN)
        .json(&json!({ "email": "ana@example.com" }))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["ok"], json!(false));
    assert_eq!(body["error"]["code"], json!("UNKNOWN"));
}

// ============ Upsert ============

#[tokio::test]
async fn test_upsert_create_then_conflict() {
    let store = InMemoryClientStore::new();
    let server = server(&store);

    let response = server
        .post("/api/clients/upsert")
        .authorization_bearer(TOKEN)
        .json(&create_body("Ana Souza", "123.456.789-09"))
        .await;
    response.assert_status_ok();
    let created: Value = response.json();
    let record: ClientRecord = serde_json::from_value(created["data"].clone()).unwrap();
    assert_eq!(record.unidade.as_deref(), Some("Clínica Norte"));

    let response = server
        .post("/api/clients/upsert")
        .authorization_bearer(TOKEN)
        .json(&create_body("Outra Pessoa", "12345678909"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], json!("CONFLICT"));

    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_upsert_merge_policy_updates_existing() {
    let ana = record("Ana Souza", Some("12345678909"));
    let store = InMemoryClientStore::seeded([ana.clone()]);
    let server = server_with(
        &store,
        ResolverConfig {
            create_policy: CreatePolicy::MergeExisting,
        },
    );

    let response = server
        .post("/api/clients/upsert")
        .authorization_bearer(TOKEN)
        .json(&create_body("Ana Souza", "12345678909"))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["id"], json!(ana.id.to_string()));
    assert_eq!(body["data"]["areaAtuacao"], json!("Psicologia"));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_upsert_partial_update_by_id() {
    let ana = record("Ana Souza", Some("12345678909"));
    let store = InMemoryClientStore::seeded([ana.clone()]);
    let server = server(&store);

    let response = server
        .post("/api/clients/upsert")
        .authorization_bearer(TOKEN)
        .json(&json!({ "id": ana.id.to_string(), "cidade": "Olinda" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["cidade"], json!("Olinda"));
    assert_eq!(body["data"]["nome"], json!("Ana Souza"));
    assert_eq!(body["data"]["cpf"], json!("12345678909"));
}

#[tokio::test]
async fn test_upsert_unknown_id_is_not_found() {
    let store = InMemoryClientStore::new();
    let server = server(&store);

    let body = with_id(
        create_body("Ana Souza", "12345678909"),
        atendimentos_core::ClientId::new(),
    );
    let response = server
        .post("/api/clients/upsert")
        .authorization_bearer(TOKEN)
        .json(&body)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], json!("NOT_FOUND"));
    assert_eq!(store.write_calls(), 0);
}

#[tokio::test]
async fn test_upsert_missing_fields_is_invalid_input() {
    let store = InMemoryClientStore::new();
    let server = server(&store);

    let response = server
        .post("/api/clients/upsert")
        .authorization_bearer(TOKEN)
        .json(&json!({ "nome": "Ana Souza" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], json!("INVALID_INPUT"));
    assert_eq!(store.write_calls(), 0);
}

// ============ Ticket status ============

#[tokio::test]
async fn test_ticket_status() {
    let server = server(&InMemoryClientStore::new());

    let cases = [
        (json!([]), "SEM_ITENS"),
        (json!(["RESOLVIDO", "CANCELADO"]), "RESOLVIDO"),
        (json!(["resolvido", "aguardando"]), "AGUARDANDO"),
        (json!(["ABERTO", "EM_ANDAMENTO"]), "EM_ANDAMENTO"),
        (json!(["CANCELADO"]), "RESOLVIDO"),
        (json!(["CANCELADO", "PAUSADO"]), "ABERTO"),
    ];

    for (statuses, expected) in cases {
        let response = server
            .post("/api/tickets/status")
            .authorization_bearer(TOKEN)
            .json(&json!({ "statuses": statuses }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!({ "status": expected }), "{statuses}");
    }
}

#[tokio::test]
async fn test_ticket_status_rejects_malformed_body() {
    let server = server(&InMemoryClientStore::new());

    let response = server
        .post("/api/tickets/status")
        .authorization_bearer(TOKEN)
        .json(&json!({ "statuses": "RESOLVIDO" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], json!("INVALID_INPUT"));
}
