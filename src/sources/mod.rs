//! Event normalizers, one per webhook source.
//!
//! Each normalizer takes a raw JSON payload, classifies its subtype,
//! parses it into a typed event, and produces a [`NormalizedAlert`]
//! together with the audit fields and config lookup key the relay needs.
//!
//! Only GitHub tags its payloads (via the `X-GitHub-Event` header). The
//! other three sources are classified by *sniffing*: an ordered list of
//! field-presence rules evaluated top to bottom, with an explicit
//! "unknown" outcome when nothing matches. Unknown subtypes are not
//! errors; the webhook caller gets an `ignored` acknowledgment.

pub mod crashlytics;
pub mod docker;
pub mod github;
pub mod sentry;

use crate::models::NormalizedAlert;
use crate::store::LookupKey;

/// Acknowledgment body returned to the webhook caller on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    /// Recognized subtype, echoed back to the caller.
    pub event_type: String,
    /// Source-specific extra field, e.g. Sentry echoes the issue action.
    pub detail: Option<(&'static str, String)>,
}

impl Ack {
    fn new(event_type: &str) -> Self {
        Self {
            event_type: event_type.to_string(),
            detail: None,
        }
    }

    fn with_detail(event_type: &str, key: &'static str, value: String) -> Self {
        Self {
            event_type: event_type.to_string(),
            detail: Some((key, value)),
        }
    }
}

/// A normalized alert plus the audit fields derived alongside it.
#[derive(Debug, Clone)]
pub struct AlertDraft {
    /// The alert to format and deliver.
    pub alert: NormalizedAlert,
    /// Audit subtype (`push`, `build`, `error`, ...); not always the same
    /// string as the acknowledgment subtype.
    pub audit_event_type: &'static str,
    /// Natural key of the triggering event (commit SHA, issue number,
    /// error id).
    pub source_id: String,
}

/// Output of a normalizer: everything the relay needs to dispatch one
/// event.
#[derive(Debug, Clone)]
pub struct Classified {
    /// Acknowledgment for the webhook caller.
    pub ack: Ack,
    /// The alert and its audit fields.
    pub draft: AlertDraft,
    /// Integration lookup key; `None` bypasses config resolution (Docker
    /// health checks always dispatch).
    pub lookup: Option<LookupKey>,
    /// Whether a dispatched alert is recorded in the audit log. Docker
    /// health checks are delivered but not logged.
    pub audited: bool,
}

/// Capitalizes the first letter of each word and lowercases the rest,
/// treating any non-alphabetic character as a word boundary.
///
/// Used to render action and event-type tokens for display:
/// `"new_fatal_issue"` becomes `"New Fatal Issue"` after underscores are
/// replaced with spaces.
pub(crate) fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut at_word_start = true;
    for ch in input.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
                at_word_start = false;
            } else {
                out.extend(ch.to_lowercase());
            }
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}
