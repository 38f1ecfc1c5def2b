//! REST client tests against an in-process fake of the assistant service.
//!
//! The fake serves the IAM token endpoint and the few v1 endpoints the
//! client wraps, and records what it was sent.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};
use std::collections::HashMap;
use wksp_retrain::assistant::{Assistant, AssistantClient};
use wksp_retrain::config::Config;
use wksp_retrain::error::Error;
use wksp_retrain::sweep::{Sweep, SweepConfig};

#[derive(Default)]
struct Recorded {
    token_requests: usize,
    updates: Vec<(String, String, String, Value)>,
    missing_auth: usize,
}

type Shared = Arc<Mutex<Recorded>>;

const TOKEN: &str = "test-access-token";

type Response = (StatusCode, Json<Value>);

fn authorized(headers: &HeaderMap, state: &Shared) -> bool {
    let ok = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"));
    if !ok {
        state.lock().unwrap().missing_auth += 1;
    }
    ok
}

async fn token(State(state): State<Shared>, Form(form): Form<HashMap<String, String>>) -> Response {
    state.lock().unwrap().token_requests += 1;
    if form.get("apikey").map(String::as_str) != Some("good-key")
        || form.get("grant_type").map(String::as_str)
            != Some("urn:ibm:params:oauth:grant-type:apikey")
    {
        return (StatusCode::BAD_REQUEST, Json(json!({"errorMessage": "bad key"})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "access_token": TOKEN,
            "refresh_token": "unused",
            "token_type": "Bearer",
            "expires_in": 3600,
            "expiration": 1_700_000_000
        })),
    )
}

async fn workspaces(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers, &state) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "Unauthorized", "code": 401})));
    }
    if query.get("version").map(String::as_str) != Some("2021-06-14") {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "missing version", "code": 400})));
    }
    match query.get("cursor").map(String::as_str) {
        None => (
            StatusCode::OK,
            Json(json!({
                "workspaces": [
                    {"workspace_id": "ws-intent", "name": "Intents", "language": "en"},
                    {"workspace_id": "ws-entity", "name": "Entities", "language": "en"}
                ],
                "pagination": {"refresh_url": "/v1/workspaces", "next_cursor": "page2"}
            })),
        ),
        Some("page2") => (
            StatusCode::OK,
            Json(json!({
                "workspaces": [{"workspace_id": "ws-empty", "name": "Empty"}],
                "pagination": {"refresh_url": "/v1/workspaces"}
            })),
        ),
        Some(_) => (StatusCode::BAD_REQUEST, Json(json!({"error": "bad cursor"}))),
    }
}

async fn intents(State(state): State<Shared>, headers: HeaderMap, Path(ws): Path<String>) -> Response {
    if !authorized(&headers, &state) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "Unauthorized"})));
    }
    let intents = match ws.as_str() {
        "ws-intent" => json!([
            {"intent": "greeting", "description": "Say hello"},
            {"intent": "goodbye"}
        ]),
        "ws-missing" => {
            return (StatusCode::NOT_FOUND, Json(json!({"error": "Resource not found", "code": 404})));
        }
        _ => json!([]),
    };
    (StatusCode::OK, Json(json!({"intents": intents, "pagination": {}})))
}

async fn entities(State(state): State<Shared>, headers: HeaderMap, Path(ws): Path<String>) -> Response {
    if !authorized(&headers, &state) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "Unauthorized"})));
    }
    let entities = match ws.as_str() {
        "ws-entity" => json!([{"entity": "city", "description": "Cities"}]),
        _ => json!([]),
    };
    (StatusCode::OK, Json(json!({"entities": entities, "pagination": {}})))
}

fn record_update(state: &Shared, headers: &HeaderMap, update: (String, String, String, Value)) -> Response {
    if !authorized(headers, state) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "Unauthorized"})));
    }
    let body = update.3.clone();
    state.lock().unwrap().updates.push(update);
    (StatusCode::OK, Json(body))
}

async fn update_intent(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((ws, name)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    record_update(&state, &headers, (ws, "intents".to_string(), name, body))
}

async fn update_entity(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((ws, name)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    record_update(&state, &headers, (ws, "entities".to_string(), name, body))
}

async fn spawn_service() -> (String, Shared) {
    let state: Shared = Arc::default();
    let app = Router::new()
        .route("/identity/token", post(token))
        .route("/instances/abc/v1/workspaces", get(workspaces))
        .route("/instances/abc/v1/workspaces/{ws}/intents", get(intents))
        .route("/instances/abc/v1/workspaces/{ws}/entities", get(entities))
        .route("/instances/abc/v1/workspaces/{ws}/intents/{name}", post(update_intent))
        .route("/instances/abc/v1/workspaces/{ws}/entities/{name}", post(update_entity))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), state)
}

fn config(base: &str, api_key: &str) -> Config {
    Config {
        instance_url: format!("{base}/instances/abc"),
        api_key: SecretString::from(api_key.to_string()),
        auth_url: base.to_string(),
        api_version: "2021-06-14".to_string(),
        otel_endpoint: None,
        log_level: "info".to_string(),
    }
}

#[tokio::test]
async fn lists_all_workspace_pages() {
    let (base, state) = spawn_service().await;
    let client = AssistantClient::new(&config(&base, "good-key")).unwrap();

    let workspaces = client.list_workspaces().await.unwrap();

    let ids: Vec<_> = workspaces.iter().map(|w| w.workspace_id.as_str()).collect();
    assert_eq!(ids, ["ws-intent", "ws-entity", "ws-empty"]);
    assert_eq!(workspaces[0].name.as_deref(), Some("Intents"));

    let recorded = state.lock().unwrap();
    assert_eq!(recorded.token_requests, 1, "token is cached between calls");
    assert_eq!(recorded.missing_auth, 0);
}

#[tokio::test]
async fn lists_intents_in_service_order() {
    let (base, _) = spawn_service().await;
    let client = AssistantClient::new(&config(&base, "good-key")).unwrap();

    let intents = client.list_intents("ws-intent").await.unwrap();
    assert_eq!(intents.len(), 2);
    assert_eq!(intents[0].intent, "greeting");
    assert_eq!(intents[1].description, "");

    assert!(client.list_entities("ws-intent").await.unwrap().is_empty());
}

#[tokio::test]
async fn list_error_carries_service_message() {
    let (base, _) = spawn_service().await;
    let client = AssistantClient::new(&config(&base, "good-key")).unwrap();

    let err = client.list_intents("ws-missing").await.unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Resource not found");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn update_posts_description_body() {
    let (base, state) = spawn_service().await;
    let client = AssistantClient::new(&config(&base, "good-key")).unwrap();

    let resp = client
        .update_entity("ws-entity", "city", "Cities RETRAINED")
        .await
        .unwrap();

    assert_eq!(resp.status_code, 200);
    let recorded = state.lock().unwrap();
    assert_eq!(
        recorded.updates,
        vec![(
            "ws-entity".to_string(),
            "entities".to_string(),
            "city".to_string(),
            json!({"description": "Cities RETRAINED"})
        )]
    );
}

#[tokio::test]
async fn bad_api_key_is_an_auth_error() {
    let (base, _) = spawn_service().await;
    let client = AssistantClient::new(&config(&base, "wrong-key")).unwrap();

    let err = client.list_workspaces().await.unwrap_err();
    assert!(matches!(err, Error::Auth(_)), "got {err:?}");
}

#[tokio::test]
async fn sweep_end_to_end() {
    let (base, state) = spawn_service().await;
    let client = AssistantClient::new(&config(&base, "good-key")).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let retry_log = dir.path().join("retrain_manually.txt");

    let mut sweep = Sweep::new(SweepConfig {
        retry_log: retry_log.clone(),
        ..SweepConfig::default()
    });
    let report = sweep.run(&client).await.unwrap();

    assert_eq!(report.retrained, ["ws-intent", "ws-entity"]);
    assert_eq!(report.skipped, ["ws-empty"]);
    assert_eq!(report.counter, 2);
    assert!(!retry_log.exists());

    let recorded = state.lock().unwrap();
    let bodies: Vec<_> = recorded
        .updates
        .iter()
        .map(|(ws, collection, name, body)| {
            (ws.as_str(), collection.as_str(), name.as_str(), body["description"].clone())
        })
        .collect();
    assert_eq!(
        bodies,
        vec![
            ("ws-intent", "intents", "greeting", json!("Say hello RETRAINED")),
            ("ws-entity", "entities", "city", json!("Cities RETRAINED")),
        ]
    );
}
