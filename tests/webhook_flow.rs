//! End-to-end webhook flow tests.
//!
//! Drives the full pipeline through the HTTP surface: router → signature
//! check → normalizer → config lookup → formatter → sink → audit log,
//! with a real SQLite store on disk and a recording sink in place of the
//! Cliq client.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use vigil::formatter::RenderedMessage;
use vigil::security::CredentialVault;
use vigil::server::{AppState, router};
use vigil::sink::{DeliveryResult, NotificationSink};
use vigil::store::{ConfigStore, NewIntegration, SqliteConfigStore};
use vigil::{RelayService, Source};

/// Sink that records every delivered message and returns a scripted
/// result.
struct RecordingSink {
    delivered: Mutex<Vec<RenderedMessage>>,
    fail: bool,
}

impl RecordingSink {
    fn new(fail: bool) -> Self {
        Self {
            delivered: Mutex::new(Vec::new()),
            fail,
        }
    }

    fn delivered(&self) -> Vec<RenderedMessage> {
        self.delivered.lock().expect("sink lock").clone()
    }
}

impl NotificationSink for RecordingSink {
    fn deliver(&self, message: &RenderedMessage) -> DeliveryResult {
        self.delivered.lock().expect("sink lock").push(message.clone());
        if self.fail {
            DeliveryResult::failure("request timeout".to_string())
        } else {
            DeliveryResult::success(200)
        }
    }
}

struct Harness {
    store: Arc<SqliteConfigStore>,
    sink: Arc<RecordingSink>,
    state: AppState,
    _db: tempfile::TempDir,
}

fn harness(integrations: &[NewIntegration], failing_sink: bool) -> Harness {
    let db_dir = tempfile::tempdir().expect("tempdir");
    let vault = Arc::new(CredentialVault::from_key([42u8; 32]));
    let store = Arc::new(
        SqliteConfigStore::open(&db_dir.path().join("vigil.db"), vault).expect("open store"),
    );
    for integration in integrations {
        store.upsert_integration(integration).expect("seed");
    }

    let sink = Arc::new(RecordingSink::new(failing_sink));
    let relay = Arc::new(RelayService::new(store.clone(), sink.clone()));

    Harness {
        store,
        sink,
        state: AppState {
            relay,
            github_secret: None,
            hardened: false,
        },
        _db: db_dir,
    }
}

fn enabled_github_integration() -> NewIntegration {
    NewIntegration {
        user_id: 1,
        source: Source::Github,
        lookup_key: "acme/widgets".to_string(),
        credential: "ghp_token".to_string(),
        enabled: true,
        alert_level: "all".to_string(),
    }
}

fn push_payload() -> serde_json::Value {
    let user = serde_json::json!({
        "login": "dev",
        "id": 7,
        "avatar_url": "https://avatars.github.com/u/7",
        "url": "https://api.github.com/users/dev"
    });
    let commit = |message: &str| {
        serde_json::json!({
            "id": "c1", "tree_id": "t1", "distinct": true, "message": message,
            "timestamp": "2024-01-15T10:30:00Z",
            "url": "https://github.com/acme/widgets/commit/c1",
            "author": user, "committer": user
        })
    };
    serde_json::json!({
        "ref": "refs/heads/main",
        "before": "1111111111",
        "after": "abc123def456",
        "repository": {
            "id": 1, "name": "widgets", "full_name": "acme/widgets",
            "private": false, "html_url": "https://github.com/acme/widgets",
            "url": "https://api.github.com/repos/acme/widgets"
        },
        "pusher": user,
        "sender": user,
        "commits": [commit("Fix login"), commit("Add tests"), commit("Bump deps")]
    })
}

async fn post(
    state: AppState,
    uri: &str,
    event_header: Option<&str>,
    payload: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(event) = event_header {
        builder = builder.header("X-GitHub-Event", event);
    }
    let request = builder
        .body(Body::from(payload.to_string()))
        .expect("request");

    let response = router(state).oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_push_end_to_end() {
    let h = harness(&[enabled_github_integration()], false);

    let (status, body) = post(
        h.state.clone(),
        "/webhooks/github",
        Some("push"),
        &push_payload(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "received");
    assert_eq!(body["event_type"], "push");

    let delivered = h.sink.delivered();
    assert_eq!(delivered.len(), 1);
    let message = &delivered[0];
    assert!(message.text.contains("📤 Push to acme/widgets/main"));
    assert!(message.text.contains("• Commits: 3"));
    assert!(message.text.contains("• Fix login"));
    assert_eq!(message.card.color, "#4A90E2");

    let logs = h.store.recent_logs(10).expect("logs");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].event_type, "push");
    assert_eq!(logs[0].source_id, "abc123def456");
    assert_eq!(logs[0].user_id, Some(1));
    assert_eq!(logs[0].alert_type, "github");
}

#[tokio::test]
async fn test_sentry_fatal_is_critical() {
    let h = harness(
        &[NewIntegration {
            user_id: 2,
            source: Source::Sentry,
            lookup_key: "api".to_string(),
            credential: String::new(),
            enabled: true,
            alert_level: "all".to_string(),
        }],
        false,
    );

    let payload = serde_json::json!({
        "id": "err-9",
        "title": "DatabaseUnavailable",
        "culprit": "api.db.connect",
        "level": "fatal",
        "url": "https://sentry.example.com/issues/err-9",
        "project": {"id": 1, "name": "API", "slug": "api"},
        "event": {},
        "timestamp": "2024-01-15T10:30:00Z"
    });

    let (status, body) = post(h.state.clone(), "/webhooks/sentry", None, &payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event_type"], "error_event");

    let delivered = h.sink.delivered();
    assert_eq!(delivered.len(), 1);
    // Fatal maps to critical: dark-red card, level emoji in the title.
    assert_eq!(delivered[0].card.color, "#8B0000");
    assert!(delivered[0].text.contains("🔴 FATAL: DatabaseUnavailable"));

    let logs = h.store.recent_logs(10).expect("logs");
    assert_eq!(logs[0].severity, "critical");
    assert_eq!(logs[0].event_type, "error");
    assert_eq!(logs[0].source_id, "err-9");
}

#[tokio::test]
async fn test_missing_config_no_delivery_no_audit() {
    let h = harness(&[], false);

    let (status, body) = post(
        h.state.clone(),
        "/webhooks/github",
        Some("push"),
        &push_payload(),
    )
    .await;

    // The webhook provider still sees success.
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "received");

    assert!(h.sink.delivered().is_empty());
    assert!(h.store.recent_logs(10).expect("logs").is_empty());
}

#[tokio::test]
async fn test_disabled_config_no_delivery_no_audit() {
    let h = harness(
        &[NewIntegration {
            enabled: false,
            ..enabled_github_integration()
        }],
        false,
    );

    let (status, _) = post(
        h.state.clone(),
        "/webhooks/github",
        Some("push"),
        &push_payload(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(h.sink.delivered().is_empty());
    assert!(h.store.recent_logs(10).expect("logs").is_empty());
}

#[tokio::test]
async fn test_delivery_failure_still_writes_one_audit_row() {
    let h = harness(&[enabled_github_integration()], true);

    let (status, body) = post(
        h.state.clone(),
        "/webhooks/github",
        Some("push"),
        &push_payload(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "received");
    assert_eq!(h.sink.delivered().len(), 1);

    let logs = h.store.recent_logs(10).expect("logs");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].event_type, "push");
}

#[tokio::test]
async fn test_firebase_alert_event_end_to_end() {
    let h = harness(
        &[NewIntegration {
            user_id: 3,
            source: Source::Firebase,
            lookup_key: "1:1234567890:ios:abc123".to_string(),
            credential: "fb-api-key".to_string(),
            enabled: true,
            alert_level: "all".to_string(),
        }],
        false,
    );

    let payload = serde_json::json!({
        "alert_type": "new_fatal_issue",
        "app": {"id": "1:1234567890:ios:abc123", "name": "Acme Shop", "platform": "ios"},
        "crash": {
            "id": "c1", "title": "Fatal Exception: NSRangeException",
            "exception_type": "NSRangeException", "reason": "index out of bounds",
            "affected_users_count": 12, "crashes_count": 48,
            "first_seen_at": "2024-01-14T08:00:00Z",
            "last_seen_at": "2024-01-15T10:30:00Z", "severity": "fatal"
        },
        "link": "https://console.firebase.google.com/alerts/a-1",
        "timestamp": "2024-01-15T10:30:00Z"
    });

    let (status, body) = post(h.state.clone(), "/webhooks/firebase", None, &payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event_type"], "alert_event");
    assert_eq!(body["alert_type"], "new_fatal_issue");

    let delivered = h.sink.delivered();
    assert_eq!(delivered.len(), 1);
    assert!(delivered[0].text.contains("🔴 New Fatal Issue: Acme Shop"));
    assert_eq!(delivered[0].card.color, "#8B0000");

    let logs = h.store.recent_logs(10).expect("logs");
    assert_eq!(logs[0].alert_type, "firebase");
    assert_eq!(logs[0].event_type, "alert");
    assert_eq!(logs[0].user_id, Some(3));
}

#[tokio::test]
async fn test_docker_health_check_alerts_without_config() {
    let h = harness(&[], false);

    let payload = serde_json::json!({
        "status": "running",
        "container_id": "0123456789abcdef0123",
        "container_name": "api",
        "image": "acme/api:latest",
        "timestamp": "2024-01-15T10:30:00Z",
        "health_status": "unhealthy"
    });

    let (status, body) = post(h.state.clone(), "/webhooks/docker", None, &payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event_type"], "health_check");

    // Delivered despite no Docker integration, but never audited.
    assert_eq!(h.sink.delivered().len(), 1);
    assert!(h.store.recent_logs(10).expect("logs").is_empty());
}
