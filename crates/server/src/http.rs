use crate::router::{InteractionRouter, RouteOutcome};
use agentcord_discord::verify::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use agentcord_discord::{Interaction, SignatureVerifier};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

pub const INTERACTIONS_PATH: &str = "/api/discord";

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<dyn SignatureVerifier>,
    pub router: InteractionRouter,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub checked_at: String,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route(INTERACTIONS_PATH, post(interactions))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn serve(address: &str, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(address).await?;
    info!(bind_address = %address, "interaction endpoint listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }
    info!("shutdown signal received");
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "agentcord",
        checked_at: Utc::now().to_rfc3339(),
    })
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn interactions(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    let timestamp = headers.get(TIMESTAMP_HEADER).and_then(|v| v.to_str().ok());
    let (Some(signature), Some(timestamp)) = (signature, timestamp) else {
        return error_response(StatusCode::UNAUTHORIZED, "Missing signature headers");
    };

    if !state.verifier.verify(&body, signature, timestamp) {
        return error_response(StatusCode::UNAUTHORIZED, "Invalid signature");
    }

    let interaction: Interaction = match serde_json::from_slice(&body) {
        Ok(interaction) => interaction,
        Err(e) => {
            tracing::debug!("Rejecting unparseable interaction: {e}");
            return error_response(StatusCode::BAD_REQUEST, "Invalid request body");
        }
    };

    match state.router.route(&interaction).await {
        RouteOutcome::Reply(response) => Json(response).into_response(),
        RouteOutcome::Rejected(reason) => error_response(StatusCode::BAD_REQUEST, &reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::testing::{agent_json, FakeApi};
    use agentcord_agent::{CloudAgentClient, RetryPolicy};
    use agentcord_discord::Ed25519Verifier;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use ed25519_dalek::{Signer, SigningKey};
    use serde_json::Value;
    use std::time::Duration;
    use tower::ServiceExt;

    const TIMESTAMP: &str = "1700000000";

    fn signing_key() -> SigningKey {
        SigningKey::from_bytes(&[9u8; 32])
    }

    fn test_app(api: Arc<FakeApi>) -> Router {
        let verifier =
            Ed25519Verifier::from_hex(&hex::encode(signing_key().verifying_key().to_bytes()))
                .unwrap();
        let client = CloudAgentClient::with_transport(api, "https://api.example.test", "key_test")
            .unwrap()
            .with_retry_policy(RetryPolicy {
                max_retries: 0,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(1),
            });
        app(AppState {
            verifier: Arc::new(verifier),
            router: InteractionRouter::new(client),
        })
    }

    fn signed(body: &str) -> Request<Body> {
        let signature = signing_key().sign(format!("{TIMESTAMP}{body}").as_bytes());
        Request::builder()
            .method(Method::POST)
            .uri(INTERACTIONS_PATH)
            .header(SIGNATURE_HEADER, hex::encode(signature.to_bytes()))
            .header(TIMESTAMP_HEADER, TIMESTAMP)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn signed_ping_gets_pong() {
        let (status, body) = send(
            test_app(Arc::new(FakeApi::default())),
            signed(r#"{"type":1}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "type": 1 }));
    }

    #[tokio::test]
    async fn missing_headers_are_unauthorized() {
        let request = Request::builder()
            .method(Method::POST)
            .uri(INTERACTIONS_PATH)
            .header(TIMESTAMP_HEADER, TIMESTAMP)
            .body(Body::from(r#"{"type":1}"#))
            .unwrap();

        let (status, body) = send(test_app(Arc::new(FakeApi::default())), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Missing signature headers" }));
    }

    #[tokio::test]
    async fn tampered_body_is_unauthorized() {
        let mut request = signed(r#"{"type":1}"#);
        *request.body_mut() = Body::from(r#"{"type":2}"#);

        let (status, body) = send(test_app(Arc::new(FakeApi::default())), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Invalid signature" }));
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let (status, body) = send(
            test_app(Arc::new(FakeApi::default())),
            signed("not json"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid request body" }));
    }

    #[tokio::test]
    async fn router_rejections_are_bad_request() {
        let (status, body) = send(
            test_app(Arc::new(FakeApi::default())),
            signed(r#"{"type":2,"data":{"name":"unknown"}}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Unknown command" }));
    }

    #[tokio::test]
    async fn command_failures_still_return_ok_with_error_message() {
        let body = json!({
            "type": 2,
            "data": {
                "name": "agent",
                "options": [{
                    "name": "status",
                    "type": 1,
                    "options": [{ "name": "agent_id", "type": 3, "value": "bc_missing" }]
                }]
            }
        })
        .to_string();

        let (status, reply) = send(test_app(Arc::new(FakeApi::default())), signed(&body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply["type"], 4);
        assert!(reply["data"]["content"]
            .as_str()
            .unwrap()
            .starts_with("❌ **Error**"));
    }

    #[tokio::test]
    async fn status_command_round_trips_through_http() {
        let api = Arc::new(FakeApi::default().route(
            reqwest::Method::GET,
            "/v0/agents/bc_abc123",
            200,
            agent_json("bc_abc123"),
        ));
        let body = json!({
            "type": 2,
            "data": {
                "name": "agent",
                "options": [{
                    "name": "status",
                    "type": 1,
                    "options": [{ "name": "agent_id", "type": 3, "value": "bc_abc123" }]
                }]
            }
        })
        .to_string();

        let (status, reply) = send(test_app(api), signed(&body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply["data"]["embeds"][0]["footer"]["text"], "Agent ID: bc_abc123");
    }

    #[tokio::test]
    async fn health_reports_service() {
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(test_app(Arc::new(FakeApi::default())), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "agentcord");
        assert!(chrono::DateTime::parse_from_rfc3339(body["checked_at"].as_str().unwrap()).is_ok());
    }
}
