//! Typed Firebase Crashlytics webhook payloads.
//!
//! Crashlytics payloads are sniffed structurally: `incident_id` +
//! `event_type` means a crash event, `alert_type` + `app` means an alert
//! event.

use serde::{Deserialize, Serialize};

/// Firebase app block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct App {
    /// App identifier; the integration lookup key.
    pub id: String,
    /// Human-readable app name.
    pub name: String,
    /// `ios` or `android`; upper-cased for display.
    pub platform: String,
    /// iOS bundle id, when applicable.
    #[serde(default)]
    pub bundle_id: Option<String>,
    /// Android package name, when applicable.
    #[serde(default)]
    pub package_name: Option<String>,
}

/// Crash group details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crash {
    /// Crash group id.
    pub id: String,
    /// Crash title (top frame summary).
    pub title: String,
    /// Exception class; used as the audit `source_id` for crash events.
    pub exception_type: String,
    /// Exception reason.
    pub reason: String,
    /// Stack trace, when included.
    #[serde(default)]
    pub stacktrace: Option<String>,
    /// Number of affected users.
    pub affected_users_count: i64,
    /// Total crash count.
    pub crashes_count: i64,
    /// First occurrence timestamp.
    pub first_seen_at: String,
    /// Most recent occurrence timestamp.
    pub last_seen_at: String,
    /// Crashlytics severity label.
    pub severity: String,
}

/// Crash event (`new_crash_group`, `regressed_crash_group`,
/// `velocity_alert`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrashEvent {
    /// Incident id.
    pub incident_id: String,
    /// Affected app.
    pub app: App,
    /// Crash group details.
    pub crash: Crash,
    /// Link to the Firebase console.
    pub link: String,
    /// Incident subtype.
    pub event_type: String,
    /// Event timestamp.
    pub timestamp: String,
}

/// Alert event (`new_fatal_issue`, `new_non_fatal_issue`, `regression`,
/// `velocity`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Alert subtype; used as the audit `source_id`.
    pub alert_type: String,
    /// Affected app.
    pub app: App,
    /// Crash group details.
    pub crash: Crash,
    /// Optional alert message.
    #[serde(default)]
    pub message: Option<String>,
    /// Link to the Firebase console.
    pub link: String,
    /// Event timestamp.
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crash_json() -> serde_json::Value {
        serde_json::json!({
            "id": "c1",
            "title": "Fatal Exception: NSRangeException",
            "exception_type": "NSRangeException",
            "reason": "index out of bounds",
            "affected_users_count": 12,
            "crashes_count": 48,
            "first_seen_at": "2024-01-14T08:00:00Z",
            "last_seen_at": "2024-01-15T10:30:00Z",
            "severity": "fatal"
        })
    }

    #[test]
    fn test_crash_event_parses() {
        let json = serde_json::json!({
            "incident_id": "inc-1",
            "app": {"id": "1:123:ios:abc", "name": "Acme", "platform": "ios"},
            "crash": crash_json(),
            "link": "https://console.firebase.google.com/incidents/inc-1",
            "event_type": "new_crash_group",
            "timestamp": "2024-01-15T10:30:00Z"
        });
        let event: CrashEvent = serde_json::from_value(json).expect("parse crash event");
        assert_eq!(event.crash.exception_type, "NSRangeException");
    }

    #[test]
    fn test_alert_event_requires_link() {
        let json = serde_json::json!({
            "alert_type": "velocity",
            "app": {"id": "1:123:ios:abc", "name": "Acme", "platform": "ios"},
            "crash": crash_json(),
            "timestamp": "2024-01-15T10:30:00Z"
        });
        assert!(serde_json::from_value::<AlertEvent>(json).is_err());
    }
}
