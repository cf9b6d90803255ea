//! Alert relay: the dispatch pipeline behind the webhook endpoints.
//!
//! # Event Flow
//!
//! ```text
//! raw payload --> Normalizer --[classify/parse]--> Classified
//!                                   |
//!                                   v
//!                          Config Store lookup
//!                      (missing/disabled: stop, still 200)
//!                                   |
//!                                   v
//!                             Alert Formatter
//!                                   |
//!                                   v
//!                            Notification Sink
//!                                   |
//!                                   v
//!                        Audit log (written regardless
//!                         of the delivery outcome)
//! ```
//!
//! Delivery failures are logged and swallowed; the webhook caller always
//! sees success once the payload was understood. There is no retry or
//! dedup, and no cross-request ordering guarantee.

use crate::formatter::format_alert;
use crate::models::Source;
use crate::sink::NotificationSink;
use crate::sources::{self, Ack, Classified};
use crate::store::{AlertLogEntry, ConfigStore};
use crate::{Error, Result};
use std::sync::Arc;

/// Outcome of one webhook invocation, rendered into the HTTP response by
/// the server layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The event was recognized; an alert may or may not have been
    /// delivered depending on config.
    Received(Ack),
    /// No classification rule matched; not an error.
    Ignored {
        /// GitHub echoes the unrecognized header value back.
        event_type: Option<String>,
        /// The sniffed sources return a generic message instead.
        message: Option<String>,
    },
}

/// The dispatch pipeline, wired once at startup and shared across
/// request handlers.
pub struct RelayService {
    /// Integration config and audit log.
    store: Arc<dyn ConfigStore>,
    /// Alert delivery backend.
    sink: Arc<dyn NotificationSink>,
}

impl RelayService {
    /// Creates a relay over the given store and sink.
    pub fn new(store: Arc<dyn ConfigStore>, sink: Arc<dyn NotificationSink>) -> Self {
        Self { store, sink }
    }

    /// Handles a GitHub webhook, discriminated by the `X-GitHub-Event`
    /// header value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] on a malformed payload, or an
    /// internal error if the store fails.
    pub fn handle_github(&self, event_type: &str, raw: &serde_json::Value) -> Result<RelayOutcome> {
        match sources::github::normalize(event_type, raw)? {
            Some(classified) => self.dispatch(Source::Github, classified),
            None => Ok(RelayOutcome::Ignored {
                event_type: Some(event_type.to_string()),
                message: None,
            }),
        }
    }

    /// Handles a webhook from one of the sniffed sources (Docker, Sentry,
    /// Firebase).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] on a payload that matched a sniffing
    /// rule but failed to parse, or an internal error if the store fails.
    pub fn handle_sniffed(&self, source: Source, raw: &serde_json::Value) -> Result<RelayOutcome> {
        let normalized = match source {
            Source::Docker => sources::docker::normalize(raw)?,
            Source::Sentry => sources::sentry::normalize(raw)?,
            Source::Firebase => sources::crashlytics::normalize(raw)?,
            Source::Github => {
                return Err(Error::Validation(
                    "github events are classified by header, not sniffed".to_string(),
                ));
            },
        };

        match normalized {
            Some(classified) => self.dispatch(source, classified),
            None => Ok(RelayOutcome::Ignored {
                event_type: None,
                message: Some(format!("Unknown {} event type", display_name(source))),
            }),
        }
    }

    /// Runs the lookup → format → deliver → audit tail of the pipeline.
    fn dispatch(&self, source: Source, classified: Classified) -> Result<RelayOutcome> {
        let Classified {
            ack,
            draft,
            lookup,
            audited,
        } = classified;

        metrics::counter!(
            "vigil_events_received_total",
            "source" => source.as_str(),
            "event_type" => ack.event_type.clone()
        )
        .increment(1);

        // Health checks have no repository identity and always dispatch.
        let user_id = match &lookup {
            Some(key) => {
                let Some(config) = self.store.find_integration(source, key)? else {
                    tracing::info!(
                        source = %source,
                        event_type = %ack.event_type,
                        "No integration configured; dropping event"
                    );
                    return Ok(RelayOutcome::Received(ack));
                };
                if !config.enabled {
                    tracing::info!(
                        source = %source,
                        event_type = %ack.event_type,
                        user_id = config.user_id,
                        "Integration disabled; dropping event"
                    );
                    return Ok(RelayOutcome::Received(ack));
                }
                // alert_level is stored but deliberately not enforced:
                // every enabled integration alerts on every event.
                Some(config.user_id)
            },
            None => None,
        };

        let message = format_alert(&draft.alert);
        let started = std::time::Instant::now();
        let result = self.sink.deliver(&message);
        metrics::histogram!(
            "vigil_delivery_duration_seconds",
            "source" => source.as_str()
        )
        .record(started.elapsed().as_secs_f64());

        if result.success {
            metrics::counter!(
                "vigil_alerts_delivered_total",
                "source" => source.as_str()
            )
            .increment(1);
        } else {
            metrics::counter!(
                "vigil_alerts_failed_total",
                "source" => source.as_str()
            )
            .increment(1);
            tracing::warn!(
                source = %source,
                event_type = %ack.event_type,
                status = ?result.status_code,
                error = ?result.error,
                "Alert delivery failed; audit entry is still written"
            );
        }

        // The audit row records the attempt, not the outcome.
        if audited {
            let entry = AlertLogEntry::new(
                user_id,
                source,
                draft.audit_event_type,
                &draft.alert.title,
                draft.alert.severity,
                &draft.alert.description,
                &draft.source_id,
            );
            self.store.append_alert_log(&entry)?;
        }

        Ok(RelayOutcome::Received(ack))
    }
}

/// Display name used in `ignored` acknowledgments.
fn display_name(source: Source) -> &'static str {
    match source {
        Source::Github => "GitHub",
        Source::Docker => "Docker",
        Source::Sentry => "Sentry",
        Source::Firebase => "Firebase",
    }
}
