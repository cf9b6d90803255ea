//! Typed Docker Hub webhook payloads.
//!
//! Docker Hub payloads carry no event-type discriminator; the subtype is
//! sniffed structurally (see [`crate::sources::docker`]): `build_data` +
//! `repository` means build, `push_data` + `repository` means push, and
//! `status` + `container_id` means a container health check.

use serde::{Deserialize, Serialize};

/// Repository block of push and build events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    /// Repository name; matched case-insensitively as a substring
    /// against the configured registry URL.
    pub name: String,
    /// Repository namespace.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Namespace-qualified name.
    #[serde(default)]
    pub repo_name: Option<String>,
    /// Web URL of the repository.
    #[serde(default)]
    pub repo_url: Option<String>,
    /// Repository description.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether this is an official image.
    #[serde(default)]
    pub is_official: Option<bool>,
    /// Whether the repository is private.
    #[serde(default)]
    pub is_private: Option<bool>,
}

/// Image push event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushEvent {
    /// Loosely-typed push block; `tag` and `pushed_by` are read with
    /// defaults (`latest` / `unknown`).
    pub push_data: serde_json::Value,
    /// Repository the image was pushed to.
    pub repository: Repository,
    /// Account that pushed, when present.
    #[serde(default)]
    pub sender: Option<serde_json::Value>,
}

/// Automated build event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildEvent {
    /// Loosely-typed build block; `status`, `build_id` and `tag` are read
    /// with defaults.
    pub build_data: serde_json::Value,
    /// Repository the build belongs to.
    pub repository: Repository,
    /// Push block, when the build also pushed.
    #[serde(default)]
    pub push_data: Option<serde_json::Value>,
}

/// Container health-check event.
///
/// Health events carry no repository identity, bypass integration config
/// entirely, and always alert when parsed successfully.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckEvent {
    /// Raw container status.
    pub status: String,
    /// Container id; truncated to 12 characters for display.
    pub container_id: String,
    /// Container name.
    pub container_name: String,
    /// Image the container runs.
    pub image: String,
    /// Event timestamp.
    pub timestamp: String,
    /// `healthy`, `unhealthy`, or `starting`.
    pub health_status: String,
}
