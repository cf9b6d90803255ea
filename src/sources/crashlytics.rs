//! Firebase Crashlytics event normalizer.
//!
//! Sniffing rules, in priority order:
//!
//! 1. `incident_id` + `event_type` → crash event
//! 2. `alert_type` + `app` → alert event
//!
//! Config resolution uses the Firebase app identifier as an exact-match
//! key for both subtypes.

use super::{Ack, AlertDraft, Classified, title_case};
use crate::models::crashlytics::{AlertEvent, CrashEvent};
use crate::models::{NormalizedAlert, Severity};
use crate::store::LookupKey;
use crate::{Error, Result};

/// Normalizes a Firebase Crashlytics webhook. Returns `Ok(None)` when no
/// sniffing rule matches.
///
/// # Errors
///
/// Returns [`Error::Validation`] when a matched subtype fails to parse.
pub fn normalize(raw: &serde_json::Value) -> Result<Option<Classified>> {
    let Some(body) = raw.as_object() else {
        return Ok(None);
    };

    if body.contains_key("incident_id") && body.contains_key("event_type") {
        let event: CrashEvent = parse(raw)?;
        return Ok(Some(crash_alert(&event)));
    }
    if body.contains_key("alert_type") && body.contains_key("app") {
        let event: AlertEvent = parse(raw)?;
        return Ok(Some(alert_event_alert(&event)));
    }

    Ok(None)
}

fn parse<T: serde::de::DeserializeOwned>(raw: &serde_json::Value) -> Result<T> {
    serde_json::from_value(raw.clone()).map_err(|e| Error::Validation(e.to_string()))
}

fn crash_alert(event: &CrashEvent) -> Classified {
    let app_name = &event.app.name;
    let platform = event.app.platform.to_uppercase();
    let exception = &event.crash.exception_type;
    let event_type = &event.event_type;

    let emoji = match event_type.as_str() {
        "new_crash_group" => "🆕",
        "regressed_crash_group" => "📈",
        "velocity_alert" => "⚠️",
        _ => "🔥",
    };
    let severity = match event_type.as_str() {
        "velocity_alert" => Severity::Warning,
        _ => Severity::Error,
    };

    let event_text = title_case(&event_type.replace('_', " "));
    let title = format!("{emoji} {event_text}: {exception}");
    let description = format!(
        "Crash detected in {app_name} ({platform})\n\n{}",
        event.crash.title
    );

    let alert = NormalizedAlert::new(&title, &description, severity)
        .with_meta("App", app_name)
        .with_meta("Platform", &platform)
        .with_meta("Exception", exception)
        .with_meta("Event Type", &event_text)
        .with_meta("Affected Users", event.crash.affected_users_count.to_string())
        .with_meta("Total Crashes", event.crash.crashes_count.to_string())
        .with_action("View in Firebase Console", &event.link)
        .with_fallback(format!("{emoji} {event_text} in {app_name}: {exception}"));

    Classified {
        ack: Ack::with_detail("crashlytics_event", "incident_type", event_type.clone()),
        draft: AlertDraft {
            alert,
            audit_event_type: "crashlytics",
            source_id: exception.clone(),
        },
        lookup: Some(LookupKey::Exact(event.app.id.clone())),
        audited: true,
    }
}

fn alert_event_alert(event: &AlertEvent) -> Classified {
    let app_name = &event.app.name;
    let platform = event.app.platform.to_uppercase();
    let exception = &event.crash.exception_type;
    let alert_type = &event.alert_type;

    let emoji = match alert_type.as_str() {
        "new_fatal_issue" => "🔴",
        "new_non_fatal_issue" => "⚠️",
        "regression" => "📈",
        "velocity" => "🚨",
        _ => "🔥",
    };
    let severity = match alert_type.as_str() {
        "new_fatal_issue" => Severity::Critical,
        "new_non_fatal_issue" => Severity::Warning,
        _ => Severity::Error,
    };

    let alert_text = title_case(&alert_type.replace('_', " "));
    let title = format!("{emoji} {alert_text}: {app_name}");
    let description = format!("{}\n\nException: {exception}", event.crash.title);

    let alert = NormalizedAlert::new(&title, &description, severity)
        .with_meta("App", app_name)
        .with_meta("Platform", &platform)
        .with_meta("Alert Type", &alert_text)
        .with_meta("Exception Type", exception)
        .with_meta("Affected Users", event.crash.affected_users_count.to_string())
        .with_action("View in Firebase Console", &event.link)
        .with_fallback(format!("{emoji} {alert_text}: {exception} in {app_name}"));

    Classified {
        ack: Ack::with_detail("alert_event", "alert_type", alert_type.clone()),
        draft: AlertDraft {
            alert,
            audit_event_type: "alert",
            source_id: alert_type.clone(),
        },
        lookup: Some(LookupKey::Exact(event.app.id.clone())),
        audited: true,
    }
}
