//! # Vigil
//!
//! DevOps webhook-to-chat alert relay for Zoho Cliq.
//!
//! Vigil ingests webhook events from GitHub, Docker Hub, Sentry, and
//! Firebase Crashlytics, normalizes each event into a common alert
//! representation, enriches it with per-user integration configuration,
//! and relays it to a Zoho Cliq channel as the "Vigil" bot. Every alert
//! attempt is recorded in an append-only audit log.
//!
//! ## Pipeline
//!
//! ```text
//! raw request -> server (signature check) -> source normalizer
//!             -> config lookup -> formatter -> notification sink
//!             -> audit log
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod formatter;
pub mod models;
pub mod relay;
pub mod security;
pub mod server;
pub mod sink;
pub mod sources;
pub mod store;

// Re-exports for convenience
pub use config::VigilConfig;
pub use formatter::{Card, RenderedMessage, format_alert};
pub use models::{AlertAction, NormalizedAlert, Severity, Source};
pub use relay::{RelayOutcome, RelayService};
pub use security::CredentialVault;
pub use sink::{DeliveryResult, NotificationSink};
pub use store::{
    AlertLogEntry, ConfigStore, IntegrationConfig, LookupKey, NewIntegration, SqliteConfigStore,
};

/// Error type for vigil operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `Validation` | Webhook payload missing required fields, malformed JSON, missing event header |
/// | `Unauthorized` | GitHub signature present but does not match the configured secret |
/// | `Crypto` | Credential encryption/decryption fails (wrong key, corrupted ciphertext) |
/// | `OperationFailed` | `SQLite` errors, I/O errors, server bind/serve failures |
///
/// Delivery failures are deliberately *not* errors: the notification sink
/// returns a [`sink::DeliveryResult`] value and the relay swallows
/// failures after logging them, so a down chat channel never turns a
/// webhook acknowledgment into a 5xx.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Webhook payload failed validation.
    ///
    /// Raised when:
    /// - The request body is not valid JSON
    /// - A typed payload is missing required fields
    /// - The GitHub event-type header is absent
    #[error("invalid payload: {0}")]
    Validation(String),

    /// Signature verification failed.
    ///
    /// Raised when a `X-Hub-Signature-256` header is present but the
    /// HMAC-SHA256 digest over the raw body does not match.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A cryptographic operation failed.
    ///
    /// Raised when:
    /// - AES-256-GCM encryption or decryption fails
    /// - The configured key is not valid base64 or the wrong size
    /// - Stored ciphertext is truncated or tampered with
    ///
    /// Callers must not swallow this into silent data loss.
    #[error("crypto operation '{operation}' failed: {cause}")]
    Crypto {
        /// The operation that failed (`encrypt`, `decrypt`, `load_key`).
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// An internal operation failed.
    ///
    /// Raised when:
    /// - `SQLite` queries fail
    /// - The HTTP listener cannot bind or serve
    /// - A request-scoped worker task is cancelled
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for vigil operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Validation("missing field `repository`".to_string());
        assert_eq!(
            err.to_string(),
            "invalid payload: missing field `repository`"
        );

        let err = Error::Unauthorized("invalid signature".to_string());
        assert_eq!(err.to_string(), "unauthorized: invalid signature");

        let err = Error::Crypto {
            operation: "decrypt".to_string(),
            cause: "ciphertext too short".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "crypto operation 'decrypt' failed: ciphertext too short"
        );

        let err = Error::OperationFailed {
            operation: "bind".to_string(),
            cause: "address in use".to_string(),
        };
        assert_eq!(err.to_string(), "operation 'bind' failed: address in use");
    }
}
