//! Alert formatting for Zoho Cliq.
//!
//! Pure mapping from a [`NormalizedAlert`] to the rendered message the
//! sink delivers: a plain-text body (no markdown) plus a minimal card.
//! Cliq accepts only `title` and `color` in the card, so severity is
//! carried twice: as an emoji prefix in the text and as the card color.

use crate::models::{NormalizedAlert, Severity};
use serde::{Deserialize, Serialize};

/// Minimal Cliq card. The destination rejects any other field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Card title, mirroring the alert title.
    pub title: String,
    /// Hex color keyed by severity.
    pub color: String,
}

/// A message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedMessage {
    /// Plain-text body.
    pub text: String,
    /// Severity-colored card.
    pub card: Card,
}

const fn severity_emoji(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "ℹ️",
        Severity::Warning => "⚠️",
        Severity::Error => "❌",
        Severity::Critical => "🚨",
    }
}

const fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "#4A90E2",
        Severity::Warning => "#F5A623",
        Severity::Error => "#D0021B",
        Severity::Critical => "#8B0000",
    }
}

/// Renders a normalized alert into the Cliq message format.
///
/// Layout: `"{emoji} {title}\n\n{description}"`, then a `Details:` block
/// with one bullet per metadata entry in insertion order, then a
/// `Quick Links:` block with one bullet per action.
#[must_use]
pub fn format_alert(alert: &NormalizedAlert) -> RenderedMessage {
    let emoji = severity_emoji(alert.severity);
    let mut text = format!("{emoji} {}\n\n{}", alert.title, alert.description);

    if !alert.metadata.is_empty() {
        text.push_str("\n\nDetails:\n");
        for (key, value) in &alert.metadata {
            text.push_str(&format!("• {key}: {value}\n"));
        }
    }

    if !alert.actions.is_empty() {
        text.push_str("\n\nQuick Links:\n");
        for action in &alert.actions {
            text.push_str(&format!("• {}: {}\n", action.label, action.url));
        }
    }

    RenderedMessage {
        text,
        card: Card {
            title: alert.title.clone(),
            color: severity_color(alert.severity).to_string(),
        },
    }
}
