//! Gateway behaviour against an in-process stub backend.

use advisor_core::AdvisorError;
use advisor_core::api::AdvisorApi;
use advisor_core::auth::{Credential, CredentialState, TokenStore};
use advisor_core::config::ClientConfig;
use advisor_core::session::MessageRole;
use advisor_interaction::{ApiGatewayClient, SEND_FAILED};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

/// What the stub saw: `(method path, Authorization header)` per request.
#[derive(Clone, Default)]
struct Recorder {
    requests: Arc<Mutex<Vec<(String, Option<String>)>>>,
    bodies: Arc<Mutex<Vec<Value>>>,
}

impl Recorder {
    fn record(&self, call: &str, headers: &HeaderMap) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.requests.lock().unwrap().push((call.to_string(), auth));
    }

    fn calls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(call, _)| call.clone())
            .collect()
    }

    fn auth_headers(&self) -> Vec<Option<String>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, auth)| auth.clone())
            .collect()
    }
}

fn is_valid(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "Bearer good")
}

async fn user(State(rec): State<Recorder>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    rec.record("GET /auth/user", &headers);
    if !is_valid(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid token"})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "id": 1,
            "email": "ada@example.com",
            "name": "Ada",
            "hasGoogleAuth": true,
            "hasHubSpotAuth": true,
            "ongoingInstructions": "Be brief"
        })),
    )
}

async fn message(
    State(rec): State<Recorder>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    rec.record("POST /api/chat/message", &headers);
    rec.bodies.lock().unwrap().push(body.clone());
    if body["message"] == "explode" {
        return (StatusCode::BAD_REQUEST, Json(json!({"message": "boom", "status": "error"})));
    }
    (
        StatusCode::OK,
        Json(json!({"message": "Hi there", "status": "success", "timestamp": 1714557600000i64})),
    )
}

async fn sessions(State(rec): State<Recorder>, headers: HeaderMap) -> Json<Value> {
    rec.record("GET /api/chat/sessions", &headers);
    Json(json!([
        {"sessionId": "s2", "preview": "latest", "lastMessageAt": "2024-05-02T09:00:00", "messageCount": 4},
        {"sessionId": "s1", "preview": "older", "lastMessageAt": "2024-05-01T09:00:00", "messageCount": 2}
    ]))
}

async fn history(
    State(rec): State<Recorder>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    rec.record(&format!("GET /api/chat/history/{}", id), &headers);
    if id == "broken" {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({})));
    }
    (
        StatusCode::OK,
        Json(json!([
            {"id": 10, "content": "Hello", "role": "USER", "timestamp": "2024-05-01T10:00:00"},
            {"id": 11, "content": "Hi there", "role": "ASSISTANT", "timestamp": "2024-05-01T10:00:02"}
        ])),
    )
}

async fn clear(
    State(rec): State<Recorder>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> StatusCode {
    rec.record(&format!("DELETE /api/chat/history/{}/clear", id), &headers);
    StatusCode::OK
}

async fn instructions(
    State(rec): State<Recorder>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    rec.record("POST /api/chat/instructions", &headers);
    if body["instructions"] == "" {
        return (StatusCode::BAD_REQUEST, "Error updating instructions".to_string());
    }
    (StatusCode::OK, "Instructions updated successfully".to_string())
}

async fn logout(State(rec): State<Recorder>, headers: HeaderMap) -> Json<Value> {
    rec.record("POST /api/auth/logout", &headers);
    Json(json!({"success": true}))
}

async fn hubspot_url(State(rec): State<Recorder>, headers: HeaderMap) -> Json<Value> {
    rec.record("GET /api/auth/hubspot", &headers);
    Json(json!({"authUrl": "https://app.hubspot.com/oauth/authorize?client_id=x"}))
}

async fn hubspot_callback(
    State(rec): State<Recorder>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    rec.record("POST /auth/hubspot/callback", &headers);
    if body["code"] == "good-code" {
        (StatusCode::OK, Json(json!({"success": true})))
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "error": "Invalid authorization code"})),
        )
    }
}

async fn health() -> Json<Value> {
    Json(json!({"status": "UP", "components": {"db": {"status": "UP"}}}))
}

async fn webhook(State(rec): State<Recorder>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    rec.record("POST /api/webhooks/test/email", &headers);
    Json(json!({"received": body["subject"]}))
}

async fn spawn_backend() -> (String, Recorder) {
    let recorder = Recorder::default();
    let app = Router::new()
        .route("/auth/user", get(user))
        .route("/api/chat/message", post(message))
        .route("/api/chat/sessions", get(sessions))
        .route("/api/chat/history/:id", get(history))
        .route("/api/chat/history/:id/clear", delete(clear))
        .route("/api/chat/instructions", post(instructions))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/hubspot", get(hubspot_url))
        .route("/auth/hubspot/callback", post(hubspot_callback))
        .route("/actuator/health", get(health))
        .route("/api/webhooks/test/email", post(webhook))
        .with_state(recorder.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), recorder)
}

fn gateway(base: &str, token: Option<&str>) -> (ApiGatewayClient, Arc<TokenStore>) {
    let tokens = Arc::new(TokenStore::in_memory());
    tokens.set(token.map(Credential::new));
    let config = ClientConfig::default().with_api_base_url(base);
    (
        ApiGatewayClient::new(&config, tokens.clone()).unwrap(),
        tokens,
    )
}

#[tokio::test]
async fn test_fetch_identity_attaches_bearer() {
    let (base, recorder) = spawn_backend().await;
    let (client, _) = gateway(&base, Some("good"));

    let identity = client.fetch_identity().await.unwrap();

    assert_eq!(identity.display_name, "Ada");
    assert_eq!(identity.ongoing_instructions, "Be brief");
    assert!(identity.integrations.hubspot_linked);
    assert_eq!(recorder.auth_headers(), vec![Some("Bearer good".to_string())]);
}

#[tokio::test]
async fn test_rejected_credential_is_cleared() {
    let (base, _) = spawn_backend().await;
    let (client, tokens) = gateway(&base, Some("stale"));
    let mut state = tokens.subscribe();

    let err = client.fetch_identity().await.unwrap_err();

    assert_eq!(err, AdvisorError::SessionExpired);
    assert!(tokens.get().is_none());
    assert_eq!(*state.borrow_and_update(), CredentialState::Expired);
}

#[tokio::test]
async fn test_send_message_success_and_failure() {
    let (base, recorder) = spawn_backend().await;
    let (client, _) = gateway(&base, Some("good"));

    let reply = client.send_chat_message("Hello", "s1").await.unwrap();
    assert_eq!(reply.message, "Hi there");
    assert_eq!(reply.status.as_deref(), Some("success"));
    assert_eq!(
        recorder.bodies.lock().unwrap()[0],
        json!({"message": "Hello", "sessionId": "s1"})
    );

    let err = client.send_chat_message("explode", "s1").await.unwrap_err();
    assert_eq!(err, AdvisorError::transport(SEND_FAILED));
}

#[tokio::test]
async fn test_sessions_and_history() {
    let (base, _) = spawn_backend().await;
    let (client, _) = gateway(&base, Some("good"));

    let sessions = client.list_chat_sessions().await;
    let ids: Vec<_> = sessions.iter().map(|s| s.session_id.as_str()).collect();
    assert_eq!(ids, vec!["s2", "s1"]);
    assert_eq!(sessions[0].message_count, 4);

    let history = client.fetch_chat_history("s1").await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, MessageRole::User);
    assert_eq!(history[1].content, "Hi there");
}

#[tokio::test]
async fn test_history_failure_degrades_to_empty() {
    let (base, _) = spawn_backend().await;
    let (client, tokens) = gateway(&base, Some("good"));

    assert!(client.fetch_chat_history("broken").await.is_empty());
    // A plain server error leaves the credential alone.
    assert!(tokens.has_credential());
}

#[tokio::test]
async fn test_instructions_surface_failures() {
    let (base, _) = spawn_backend().await;
    let (client, _) = gateway(&base, Some("good"));

    client.update_ongoing_instructions("Be brief").await.unwrap();
    let err = client.update_ongoing_instructions("").await.unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_logout_clears_credential_even_when_backend_down() {
    let (base, recorder) = spawn_backend().await;
    let (client, tokens) = gateway(&base, Some("good"));

    client.logout().await;
    assert!(tokens.get().is_none());
    assert_eq!(recorder.calls(), vec!["POST /api/auth/logout"]);

    // Unreachable backend: still cleared.
    let (offline, tokens) = gateway("http://127.0.0.1:9", Some("good"));
    offline.logout().await;
    assert!(tokens.get().is_none());
    assert_eq!(tokens.state(), CredentialState::Absent);
}

#[tokio::test]
async fn test_no_request_after_logout() {
    let (base, recorder) = spawn_backend().await;
    let (client, _) = gateway(&base, Some("good"));

    client.logout().await;
    let sessions = client.list_chat_sessions().await;
    let identity = client.fetch_identity().await;

    assert!(sessions.is_empty());
    assert_eq!(identity.unwrap_err(), AdvisorError::Unauthenticated);
    assert_eq!(recorder.calls(), vec!["POST /api/auth/logout"]);
}

#[tokio::test]
async fn test_hubspot_endpoints() {
    let (base, _) = spawn_backend().await;
    let (client, _) = gateway(&base, Some("good"));

    let url = client.hubspot_auth_url().await.unwrap();
    assert!(url.starts_with("https://app.hubspot.com/oauth/authorize"));

    client.submit_hubspot_code("good-code").await.unwrap();

    let err = client.submit_hubspot_code("bad-code").await.unwrap_err();
    assert_eq!(err, AdvisorError::link("HubSpot", "Invalid authorization code"));
}

#[tokio::test]
async fn test_health_check() {
    let (base, _) = spawn_backend().await;
    let (client, _) = gateway(&base, None);
    assert!(client.health_check().await.is_up());

    let (offline, _) = gateway("http://127.0.0.1:9", None);
    assert_eq!(offline.health_check().await.status, "DOWN");
}

#[tokio::test]
async fn test_clear_history_and_webhook() {
    let (base, recorder) = spawn_backend().await;
    let (client, _) = gateway(&base, Some("good"));

    client.clear_chat_history("s1").await.unwrap();
    let echoed = client
        .test_email_webhook(json!({"subject": "Quarterly review"}))
        .await
        .unwrap();

    assert_eq!(echoed, json!({"received": "Quarterly review"}));
    assert_eq!(
        recorder.calls(),
        vec!["DELETE /api/chat/history/s1/clear", "POST /api/webhooks/test/email"]
    );
}
