//! The normalized alert representation.
//!
//! Every source-specific event is converted into a [`NormalizedAlert`]
//! before formatting and delivery. The alert is transient: it exists for
//! the lifetime of one webhook invocation and is never persisted as a
//! unit (the audit log keeps a flattened record).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Alert severity.
///
/// Every mapping from a source-specific level, action, or status resolves
/// to exactly one of these four; unmapped values fall back to a
/// per-source default, never to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational (pushes, releases, resolved issues).
    Info,
    /// Needs attention soon (opened PRs, velocity alerts).
    Warning,
    /// Something is broken (failed builds, new errors).
    Error,
    /// Production is on fire (fatal errors, new fatal crash groups).
    Critical,
}

impl Severity {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            _ => Err(Error::Validation(format!("invalid severity: {s}"))),
        }
    }
}

/// A labeled link attached to an alert ("View PR", "View in Sentry"...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertAction {
    /// Link label.
    pub label: String,
    /// Link target.
    pub url: String,
}

impl AlertAction {
    /// Creates a new action link.
    #[must_use]
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// The common internal representation all source events normalize to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedAlert {
    /// Alert title, rendered into the message header and the card.
    pub title: String,
    /// Alert body; may contain embedded newline-separated detail lines.
    pub description: String,
    /// Severity, driving emoji and card color.
    pub severity: Severity,
    /// Key-value details rendered as a bulleted list, insertion order
    /// preserved.
    pub metadata: Vec<(String, String)>,
    /// Zero or more quick links.
    pub actions: Vec<AlertAction>,
    /// Plain-text fallback for clients that render neither card nor
    /// detail block.
    pub text_fallback: String,
}

impl NormalizedAlert {
    /// Creates an alert with empty metadata and actions.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity,
            metadata: Vec::new(),
            actions: Vec::new(),
            text_fallback: String::new(),
        }
    }

    /// Appends a metadata entry, preserving insertion order.
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }

    /// Appends an action link.
    #[must_use]
    pub fn with_action(mut self, label: impl Into<String>, url: impl Into<String>) -> Self {
        self.actions.push(AlertAction::new(label, url));
        self
    }

    /// Sets the plain-text fallback.
    #[must_use]
    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.text_fallback = text.into();
        self
    }
}
