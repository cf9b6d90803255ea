//! Webhook HTTP surface.
//!
//! Four POST endpoints under `/webhooks/`, one per source, plus health
//! and root info endpoints. Handlers accept arbitrary JSON, hand the
//! payload to the [`RelayService`] on a blocking worker (the pipeline
//! does blocking store and sink I/O), and translate the outcome into a
//! short JSON acknowledgment.
//!
//! GitHub requests carry an `X-GitHub-Event` header (required) and an
//! optional `X-Hub-Signature-256` HMAC over the raw body, verified
//! against the configured shared secret. When no secret is configured,
//! verification is skipped with a warning rather than failing closed.
//! The other three sources are not authenticated at all; that gap exists
//! upstream at the providers and is preserved knowingly.
//!
//! Faults are isolated per request: normalization errors become 400/500
//! responses and never take the process down.

use crate::Error;
use crate::models::Source;
use crate::relay::{RelayOutcome, RelayService};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    /// The dispatch pipeline.
    pub relay: Arc<RelayService>,
    /// Shared secret for GitHub signature verification.
    pub github_secret: Option<SecretString>,
    /// Whether internal fault detail is hidden from responses.
    pub hardened: bool,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/webhooks/github", post(github_webhook))
        .route("/webhooks/docker", post(docker_webhook))
        .route("/webhooks/sentry", post(sentry_webhook))
        .route("/webhooks/firebase", post(firebase_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs the server until the listener fails.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the address cannot be bound or
/// the server exits with an error.
pub fn run(state: AppState, addr: std::net::SocketAddr) -> crate::Result<()> {
    let app = router(state);

    let rt = tokio::runtime::Runtime::new().map_err(|e| Error::OperationFailed {
        operation: "create_runtime".to_string(),
        cause: e.to_string(),
    })?;

    tracing::info!(%addr, "Starting webhook server");

    rt.block_on(async {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::OperationFailed {
                operation: "bind".to_string(),
                cause: e.to_string(),
            })?;

        axum::serve(listener, app)
            .await
            .map_err(|e| Error::OperationFailed {
                operation: "serve".to_string(),
                cause: e.to_string(),
            })
    })
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Vigil - DevOps Monitoring Tool for Zoho Cliq",
        "health": "/health",
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "vigil",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Computes the GitHub-style signature header value for a raw body.
#[must_use]
#[allow(clippy::expect_used)] // HMAC-SHA256 accepts any key size, cannot fail
pub fn compute_signature(secret: &str, body: &[u8]) -> String {
    type HmacSha256 = Hmac<Sha256>;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC-SHA256 accepts any key size");
    mac.update(body);

    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// Verifies a received signature against the shared secret using a
/// constant-time comparison.
#[must_use]
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let expected = compute_signature(secret, body);
    constant_time_eq(expected.as_bytes(), signature.as_bytes())
}

/// Constant-time comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "detail": message }))).into_response()
}

fn outcome_response(outcome: RelayOutcome) -> Response {
    match outcome {
        RelayOutcome::Received(ack) => {
            let mut body = serde_json::json!({
                "status": "received",
                "event_type": ack.event_type,
            });
            if let (Some(obj), Some((key, value))) = (body.as_object_mut(), ack.detail) {
                obj.insert(key.to_string(), serde_json::Value::String(value));
            }
            (StatusCode::OK, Json(body)).into_response()
        },
        RelayOutcome::Ignored {
            event_type,
            message,
        } => {
            let mut body = serde_json::json!({ "status": "ignored" });
            if let Some(obj) = body.as_object_mut() {
                if let Some(event_type) = event_type {
                    obj.insert("event_type".to_string(), serde_json::Value::String(event_type));
                }
                if let Some(message) = message {
                    obj.insert("message".to_string(), serde_json::Value::String(message));
                }
            }
            (StatusCode::OK, Json(body)).into_response()
        },
    }
}

fn error_response(error: &Error, hardened: bool) -> Response {
    match error {
        Error::Validation(message) => detail(
            StatusCode::BAD_REQUEST,
            &format!("Invalid payload: {message}"),
        ),
        Error::Unauthorized(message) => detail(StatusCode::UNAUTHORIZED, message),
        Error::Crypto { .. } | Error::OperationFailed { .. } => {
            tracing::error!(error = %error, "Webhook processing failed");
            if hardened {
                detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            } else {
                detail(StatusCode::INTERNAL_SERVER_ERROR, &error.to_string())
            }
        },
    }
}

fn parse_body(body: &[u8]) -> Result<serde_json::Value, Response> {
    serde_json::from_slice(body).map_err(|e| {
        detail(
            StatusCode::BAD_REQUEST,
            &format!("Invalid payload: {e}"),
        )
    })
}

/// Runs one relay call on the blocking pool and renders the outcome.
async fn dispatch_blocking<F>(hardened: bool, task: F) -> Response
where
    F: FnOnce() -> crate::Result<RelayOutcome> + Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(Ok(outcome)) => outcome_response(outcome),
        Ok(Err(error)) => error_response(&error, hardened),
        Err(join_error) => {
            tracing::error!(error = %join_error, "Relay task panicked or was cancelled");
            detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        },
    }
}

async fn github_webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    // Verify the signature over the raw body before any parsing.
    if let Some(signature) = headers
        .get("X-Hub-Signature-256")
        .and_then(|v| v.to_str().ok())
    {
        match state.github_secret.as_ref() {
            Some(secret) => {
                if !verify_signature(secret.expose_secret(), &body, signature) {
                    tracing::warn!("GitHub webhook signature mismatch");
                    return detail(StatusCode::UNAUTHORIZED, "Invalid signature");
                }
            },
            None => {
                tracing::warn!(
                    "GitHub webhook secret not configured; skipping signature verification"
                );
            },
        }
    }

    let Some(event_type) = headers
        .get("X-GitHub-Event")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
    else {
        return detail(StatusCode::BAD_REQUEST, "Missing X-GitHub-Event header");
    };

    let payload = match parse_body(&body) {
        Ok(payload) => payload,
        Err(response) => return response,
    };

    let relay = Arc::clone(&state.relay);
    dispatch_blocking(state.hardened, move || {
        relay.handle_github(&event_type, &payload)
    })
    .await
}

async fn sniffed_webhook(state: AppState, source: Source, body: Bytes) -> Response {
    let payload = match parse_body(&body) {
        Ok(payload) => payload,
        Err(response) => return response,
    };

    let relay = Arc::clone(&state.relay);
    dispatch_blocking(state.hardened, move || {
        relay.handle_sniffed(source, &payload)
    })
    .await
}

async fn docker_webhook(State(state): State<AppState>, body: Bytes) -> Response {
    sniffed_webhook(state, Source::Docker, body).await
}

async fn sentry_webhook(State(state): State<AppState>, body: Bytes) -> Response {
    sniffed_webhook(state, Source::Sentry, body).await
}

async fn firebase_webhook(State(state): State<AppState>, body: Bytes) -> Response {
    sniffed_webhook(state, Source::Firebase, body).await
}
