//! Docker Hub event normalizer.
//!
//! Docker Hub payloads carry no discriminator; the subtype is sniffed by
//! field presence, in priority order:
//!
//! 1. `build_data` + `repository` → build event
//! 2. `push_data` + `repository` → push event
//! 3. `status` + `container_id` → container health check
//!
//! Push and build events resolve config by case-insensitive substring
//! match of the repository name against the configured registry URL.
//! Health checks carry no repository identity: they bypass config, always
//! alert, and are not recorded in the audit log.

use super::{Ack, AlertDraft, Classified};
use crate::models::docker::{BuildEvent, HealthCheckEvent, PushEvent};
use crate::models::{NormalizedAlert, Severity};
use crate::store::LookupKey;
use crate::{Error, Result};

/// Normalizes a Docker Hub webhook. Returns `Ok(None)` when no sniffing
/// rule matches.
///
/// # Errors
///
/// Returns [`Error::Validation`] when a matched subtype fails to parse.
pub fn normalize(raw: &serde_json::Value) -> Result<Option<Classified>> {
    let Some(body) = raw.as_object() else {
        return Ok(None);
    };

    if body.contains_key("build_data") && body.contains_key("repository") {
        let event: BuildEvent = parse(raw)?;
        return Ok(Some(build_alert(&event)));
    }
    if body.contains_key("push_data") && body.contains_key("repository") {
        let event: PushEvent = parse(raw)?;
        return Ok(Some(push_alert(&event)));
    }
    if body.contains_key("status") && body.contains_key("container_id") {
        let event: HealthCheckEvent = parse(raw)?;
        return Ok(Some(health_alert(&event)));
    }

    Ok(None)
}

fn parse<T: serde::de::DeserializeOwned>(raw: &serde_json::Value) -> Result<T> {
    serde_json::from_value(raw.clone()).map_err(|e| Error::Validation(e.to_string()))
}

fn str_field<'a>(data: &'a serde_json::Value, key: &str, default: &'a str) -> &'a str {
    data.get(key).and_then(|v| v.as_str()).unwrap_or(default)
}

fn push_alert(event: &PushEvent) -> Classified {
    let repo = &event.repository.name;
    let tag = str_field(&event.push_data, "tag", "latest");
    let pusher = str_field(&event.push_data, "pushed_by", "unknown");

    let title = format!("🐳 Docker Image Pushed: {repo}:{tag}");
    let description = format!("New image pushed to Docker Hub\n\nPushed by: {pusher}");

    let alert = NormalizedAlert::new(&title, &description, Severity::Info)
        .with_meta("Repository", repo)
        .with_meta("Tag", tag)
        .with_meta("Pusher", pusher)
        .with_action(
            "View on Docker Hub",
            format!("https://hub.docker.com/r/{repo}/tags"),
        )
        .with_fallback(format!(
            "🐳 New Docker image: {repo}:{tag} pushed by {pusher}"
        ));

    Classified {
        ack: Ack::new("push"),
        draft: AlertDraft {
            alert,
            audit_event_type: "push",
            source_id: format!("{repo}:{tag}"),
        },
        lookup: Some(LookupKey::Contains(repo.clone())),
        audited: true,
    }
}

fn build_alert(event: &BuildEvent) -> Classified {
    let repo = &event.repository.name;
    let status = str_field(&event.build_data, "status", "unknown");
    let build_id = str_field(&event.build_data, "build_id", "N/A");
    let tag = str_field(&event.build_data, "tag", "latest");

    let emoji = match status {
        "Success" => "✅",
        "Failed" => "❌",
        "Building" => "🔨",
        "Pending" => "⏳",
        _ => "📦",
    };
    let severity = if status == "Success" {
        Severity::Info
    } else {
        Severity::Error
    };

    let title = format!("{emoji} Docker Build {status}: {repo}:{tag}");
    let description = format!(
        "Docker build {}\n\nBuild ID: {build_id}",
        status.to_lowercase()
    );

    let alert = NormalizedAlert::new(&title, &description, severity)
        .with_meta("Repository", repo)
        .with_meta("Tag", tag)
        .with_meta("Build Status", status)
        .with_meta("Build ID", build_id)
        .with_action(
            "View Build",
            format!("https://hub.docker.com/r/{repo}/builds"),
        )
        .with_fallback(format!("{emoji} Docker build {status}: {repo}:{tag}"));

    Classified {
        ack: Ack::new("build"),
        draft: AlertDraft {
            alert,
            audit_event_type: "build",
            source_id: build_id.to_string(),
        },
        lookup: Some(LookupKey::Contains(repo.clone())),
        audited: true,
    }
}

fn health_alert(event: &HealthCheckEvent) -> Classified {
    let name = &event.container_name;
    let short_id: String = event.container_id.chars().take(12).collect();
    let status = &event.health_status;

    let emoji = match status.as_str() {
        "healthy" => "✅",
        "unhealthy" => "❌",
        "starting" => "🔄",
        _ => "⚠️",
    };
    let severity = match status.as_str() {
        "unhealthy" => Severity::Error,
        "starting" => Severity::Warning,
        _ => Severity::Info,
    };

    let title = format!(
        "{emoji} Container Health: {name} is {}",
        status.to_uppercase()
    );
    let description = format!(
        "Health check status changed\n\nContainer: {name}\nImage: {}",
        event.image
    );

    let alert = NormalizedAlert::new(&title, &description, severity)
        .with_meta("Container", name)
        .with_meta("Container ID", &short_id)
        .with_meta("Health Status", status)
        .with_meta("Image", &event.image)
        .with_fallback(format!("{emoji} Container {name} is {status}"));

    Classified {
        ack: Ack::new("health_check"),
        draft: AlertDraft {
            alert,
            audit_event_type: "health_check",
            source_id: short_id,
        },
        lookup: None,
        audited: false,
    }
}
