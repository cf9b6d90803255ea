//! Notification sink trait and the Zoho Cliq HTTP implementation.
//!
//! Alerts are delivered as the "Vigil" bot with one HTTP POST per alert.
//! There is no retry, dedup, or dead-letter queue; a failed delivery is
//! reported to the caller as a failed [`DeliveryResult`] and the caller
//! decides what to do with it (the relay logs it and still writes the
//! audit entry).

use crate::formatter::RenderedMessage;
use std::time::Duration;

/// Bot identity shown in the destination channel.
const BOT_NAME: &str = "Vigil";

/// Delivery timeout. The webhook caller is waiting on us, so a slow
/// destination must not stall the whole request.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of one delivery attempt.
#[derive(Debug, Clone)]
pub struct DeliveryResult {
    /// Whether the destination accepted the message.
    pub success: bool,
    /// HTTP status code, when a response was received.
    pub status_code: Option<u16>,
    /// Error message, when failed.
    pub error: Option<String>,
}

impl DeliveryResult {
    /// Creates a successful delivery result.
    #[must_use]
    pub const fn success(status_code: u16) -> Self {
        Self {
            success: true,
            status_code: Some(status_code),
            error: None,
        }
    }

    /// Creates a failed delivery result without a status code.
    #[must_use]
    pub const fn failure(error: String) -> Self {
        Self {
            success: false,
            status_code: None,
            error: Some(error),
        }
    }

    /// Creates a failed delivery result with a status code.
    #[must_use]
    pub const fn failure_with_status(status_code: u16, error: String) -> Self {
        Self {
            success: false,
            status_code: Some(status_code),
            error: Some(error),
        }
    }
}

/// Trait for notification delivery backends.
///
/// Allows swapping the HTTP client for a mock in tests. Implementations
/// are blocking; the server calls them off the async runtime.
pub trait NotificationSink: Send + Sync {
    /// Delivers one rendered message. Infallible at the type level:
    /// transport problems are a failed [`DeliveryResult`], not an error.
    fn deliver(&self, message: &RenderedMessage) -> DeliveryResult;
}

/// Zoho Cliq delivery backend using a pooled blocking `reqwest` client.
pub struct CliqSink {
    /// HTTP client with connection pooling.
    client: reqwest::blocking::Client,
    /// Channel webhook URL.
    webhook_url: String,
}

impl CliqSink {
    /// Creates a sink targeting the given channel webhook URL.
    #[must_use]
    pub fn new(webhook_url: String) -> Self {
        let client = reqwest::blocking::Client::builder()
            .user_agent(format!("Vigil/{}", env!("CARGO_PKG_VERSION")))
            .timeout(DELIVERY_TIMEOUT)
            .pool_max_idle_per_host(10)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());

        Self {
            client,
            webhook_url,
        }
    }
}

impl NotificationSink for CliqSink {
    fn deliver(&self, message: &RenderedMessage) -> DeliveryResult {
        let body = serde_json::json!({
            "text": message.text,
            "card": message.card,
            "bot": { "name": BOT_NAME },
        });

        let response = match self
            .client
            .post(&self.webhook_url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                tracing::warn!("Cliq delivery timed out");
                return DeliveryResult::failure("request timeout".to_string());
            },
            Err(e) => {
                tracing::warn!(error = %e, "Cliq delivery failed");
                return DeliveryResult::failure(e.to_string());
            },
        };

        let status = response.status().as_u16();
        // Cliq acknowledges with 200, 201, or 204 depending on channel type.
        if matches!(status, 200 | 201 | 204) {
            tracing::debug!(status, "Alert delivered to Cliq");
            return DeliveryResult::success(status);
        }

        let detail = response.text().unwrap_or_default();
        tracing::warn!(status, detail = %detail, "Cliq rejected alert");
        DeliveryResult::failure_with_status(status, detail)
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::{DeliveryResult, NotificationSink};
    use crate::formatter::RenderedMessage;
    use std::sync::Mutex;

    /// Recording sink for tests: captures delivered messages and returns
    /// a scripted result.
    pub struct MockSink {
        delivered: Mutex<Vec<RenderedMessage>>,
        result: DeliveryResult,
    }

    impl MockSink {
        pub fn succeeding() -> Self {
            Self {
                delivered: Mutex::new(Vec::new()),
                result: DeliveryResult::success(200),
            }
        }

        pub fn failing() -> Self {
            Self {
                delivered: Mutex::new(Vec::new()),
                result: DeliveryResult::failure("request timeout".to_string()),
            }
        }

        pub fn delivered(&self) -> Vec<RenderedMessage> {
            self.delivered.lock().expect("mock sink poisoned").clone()
        }
    }

    impl NotificationSink for MockSink {
        fn deliver(&self, message: &RenderedMessage) -> DeliveryResult {
            self.delivered
                .lock()
                .expect("mock sink poisoned")
                .push(message.clone());
            self.result.clone()
        }
    }
}
