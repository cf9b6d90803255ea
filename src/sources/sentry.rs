//! Sentry event normalizer.
//!
//! Sniffing rules, in priority order:
//!
//! 1. `issue` + `action` → issue lifecycle alert
//! 2. `id` + `title` + `level` → raw error event
//!
//! Config resolution uses the project slug as an exact-match key for
//! both subtypes.

use super::{Ack, AlertDraft, Classified, title_case};
use crate::models::sentry::{ErrorEvent, IssueAlert};
use crate::models::{NormalizedAlert, Severity};
use crate::store::LookupKey;
use crate::{Error, Result};

/// How many event tags are surfaced in the alert details.
const TAG_DISPLAY_LIMIT: usize = 3;

/// Normalizes a Sentry webhook. Returns `Ok(None)` when no sniffing rule
/// matches.
///
/// # Errors
///
/// Returns [`Error::Validation`] when a matched subtype fails to parse.
pub fn normalize(raw: &serde_json::Value) -> Result<Option<Classified>> {
    let Some(body) = raw.as_object() else {
        return Ok(None);
    };

    if body.contains_key("issue") && body.contains_key("action") {
        let event: IssueAlert = parse(raw)?;
        return Ok(Some(issue_alert(&event)));
    }
    if body.contains_key("id") && body.contains_key("title") && body.contains_key("level") {
        let event: ErrorEvent = parse(raw)?;
        return Ok(Some(error_alert(&event)));
    }

    Ok(None)
}

fn parse<T: serde::de::DeserializeOwned>(raw: &serde_json::Value) -> Result<T> {
    serde_json::from_value(raw.clone()).map_err(|e| Error::Validation(e.to_string()))
}

fn error_alert(event: &ErrorEvent) -> Classified {
    let level = &event.level;
    let culprit = event.culprit.as_deref().unwrap_or("unknown");
    let project = &event.project.name;

    let emoji = match level.as_str() {
        "fatal" => "🔴",
        "error" => "❌",
        "warning" => "⚠️",
        "info" => "ℹ️",
        "debug" => "🐛",
        _ => "⚠️",
    };
    let severity = match level.as_str() {
        "fatal" => Severity::Critical,
        "error" => Severity::Error,
        "info" | "debug" => Severity::Info,
        _ => Severity::Warning,
    };

    let title = format!("{emoji} {}: {}", level.to_uppercase(), event.title);
    let description =
        format!("New error detected in production\n\nCulprit: {culprit}\nProject: {project}");

    let mut alert = NormalizedAlert::new(&title, &description, severity)
        .with_meta("Error ID", &event.id)
        .with_meta("Level", level.to_uppercase())
        .with_meta("Project", project)
        .with_meta("Culprit", culprit);

    if let Some(username) = event.user.as_ref().and_then(|u| u.username.as_deref()) {
        alert = alert.with_meta("Affected User", username);
    }

    if let Some(tags) = event.tags.as_ref().filter(|t| !t.is_empty()) {
        let rendered: Vec<String> = tags
            .iter()
            .take(TAG_DISPLAY_LIMIT)
            .map(|(k, v)| format!("{k}: {}", render_tag_value(v)))
            .collect();
        alert = alert.with_meta("Tags", rendered.join(", "));
    }

    let alert = alert
        .with_action("View in Sentry", &event.url)
        .with_fallback(format!(
            "{emoji} {}: {} in {project}",
            level.to_uppercase(),
            event.title
        ));

    Classified {
        ack: Ack::new("error_event"),
        draft: AlertDraft {
            alert,
            audit_event_type: "error",
            source_id: event.id.clone(),
        },
        lookup: Some(LookupKey::Exact(event.project.slug.clone())),
        audited: true,
    }
}

fn issue_alert(event: &IssueAlert) -> Classified {
    let action = &event.action;
    let project = &event.project.name;
    let issue = &event.issue;

    let issue_id = issue
        .get("id")
        .map_or_else(|| "N/A".to_string(), render_tag_value);
    let issue_title = issue
        .get("title")
        .and_then(|v| v.as_str())
        .unwrap_or("Unknown issue");
    let issue_level = issue.get("level").and_then(|v| v.as_str()).unwrap_or("error");

    let emoji = match action.as_str() {
        "created" => "🆕",
        "resolved" => "✅",
        "ignored" => "🔇",
        "assigned" => "👤",
        "regressed" => "📈",
        "reopened" => "🔄",
        _ => "🔔",
    };
    let severity = match action.as_str() {
        "created" | "regressed" => Severity::Error,
        "resolved" | "assigned" => Severity::Info,
        _ => Severity::Warning,
    };

    let action_text = title_case(&action.replace('_', " "));
    let title = format!("{emoji} Issue {action_text}: {issue_title}");
    let description = format!("Issue {action} in {project}\n\nLevel: {issue_level}");

    let status = issue
        .get("status")
        .and_then(|v| v.as_str())
        .unwrap_or("unresolved");

    let mut alert = NormalizedAlert::new(&title, &description, severity)
        .with_meta("Issue ID", &issue_id)
        .with_meta("Action", &action_text)
        .with_meta("Project", project)
        .with_meta("Level", issue_level.to_uppercase())
        .with_meta("Status", status.to_uppercase());

    if let Some(assigned) = issue.get("assignedTo").filter(|v| !v.is_null()) {
        let assignee = assigned
            .get("name")
            .or_else(|| assigned.get("email"))
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown");
        alert = alert.with_meta("Assigned To", assignee);
    }

    if let Some(count) = issue.get("count").filter(|v| !v.is_null()) {
        alert = alert.with_meta("Event Count", render_tag_value(count));
    }

    let alert = alert
        .with_action("View Issue", &event.url)
        .with_fallback(format!("{emoji} Issue {action}: {issue_title}"));

    Classified {
        ack: Ack::with_detail("issue_alert", "action", action.clone()),
        draft: AlertDraft {
            alert,
            audit_event_type: "issue",
            source_id: issue_id,
        },
        lookup: Some(LookupKey::Exact(event.project.slug.clone())),
        audited: true,
    }
}

/// Renders a JSON scalar without surrounding quotes; Sentry sends ids and
/// counts as either numbers or strings.
fn render_tag_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
