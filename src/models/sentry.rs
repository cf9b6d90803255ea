//! Typed Sentry webhook payloads.
//!
//! Sentry payloads are sniffed structurally: `issue` + `action` means an
//! issue alert, `id` + `title` + `level` means a raw error event.

use serde::{Deserialize, Serialize};

/// Project block common to both Sentry event kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Numeric project id.
    pub id: i64,
    /// Human-readable project name.
    pub name: String,
    /// Project slug; the integration lookup key.
    pub slug: String,
    /// Platform identifier.
    #[serde(default)]
    pub platform: Option<String>,
}

/// User context attached to an error event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User id; Sentry sends either a number or a string.
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Username; surfaced as the "Affected User" detail.
    #[serde(default)]
    pub username: Option<String>,
    /// Client IP.
    #[serde(default)]
    pub ip_address: Option<String>,
}

/// Raw error/exception event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEvent {
    /// Error id; used as the audit `source_id`.
    pub id: String,
    /// Error title.
    pub title: String,
    /// Code location that triggered the error.
    #[serde(default)]
    pub culprit: Option<String>,
    /// `fatal`, `error`, `warning`, `info`, or `debug`.
    pub level: String,
    /// Log message, when present.
    #[serde(default)]
    pub message: Option<String>,
    /// Web URL of the error.
    pub url: String,
    /// Owning project.
    pub project: Project,
    /// Full event body, passed through untyped.
    pub event: serde_json::Value,
    /// Event tags; the first three are surfaced in the alert details in
    /// payload order.
    #[serde(default)]
    pub tags: Option<serde_json::Map<String, serde_json::Value>>,
    /// Affected user, when present.
    #[serde(default)]
    pub user: Option<User>,
    /// Event timestamp.
    pub timestamp: String,
}

/// Issue lifecycle alert (created, resolved, assigned, ...).
///
/// The `issue` block is kept untyped: Sentry's shape varies by
/// integration version and the alert composition only reads a handful of
/// keys with defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueAlert {
    /// `created`, `resolved`, `ignored`, `assigned`, `regressed`, ...
    pub action: String,
    /// Untyped issue block.
    pub issue: serde_json::Map<String, serde_json::Value>,
    /// Owning project.
    pub project: Project,
    /// Web URL of the issue.
    pub url: String,
    /// Alert rule description, when present.
    #[serde(default)]
    pub description: Option<String>,
}
