//! Process configuration, loaded from the environment.
//!
//! All settings come from environment variables (a `.env` file is loaded
//! at startup when present):
//!
//! | Variable | Default | Purpose |
//! |----------|---------|---------|
//! | `ZOHO_CLIQ_WEBHOOK_URL` | required | Cliq channel webhook URL alerts are delivered to |
//! | `GITHUB_WEBHOOK_SECRET` | unset | HMAC secret for GitHub signature verification |
//! | `ENCRYPTION_KEY` | unset | base64 AES-256 key for credentials at rest |
//! | `DATABASE_PATH` | `vigil.db` | SQLite database file |
//! | `SERVER_HOST` | `0.0.0.0` | Listen address |
//! | `SERVER_PORT` | `8000` | Listen port |
//! | `ENVIRONMENT` | `development` | `production` hardens error responses |

use crate::{Error, Result};
use secrecy::SecretString;
use std::net::IpAddr;
use std::path::PathBuf;

/// Deployment environment, controlling error-response verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local development; error responses may carry detail.
    #[default]
    Development,
    /// Hardened deployment; internal faults render a generic message.
    Production,
}

/// Runtime configuration assembled from the environment.
#[derive(Debug, Clone)]
pub struct VigilConfig {
    /// Destination Cliq channel webhook URL.
    pub cliq_webhook_url: String,
    /// Shared secret for GitHub webhook signatures; verification is
    /// skipped with a warning when unset.
    pub github_webhook_secret: Option<SecretString>,
    /// base64-encoded AES-256 key; a random key is generated when unset.
    pub encryption_key: Option<SecretString>,
    /// SQLite database path.
    pub database_path: PathBuf,
    /// Listen address.
    pub host: IpAddr,
    /// Listen port.
    pub port: u16,
    /// Deployment environment.
    pub environment: Environment,
}

impl VigilConfig {
    /// Loads configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if `ZOHO_CLIQ_WEBHOOK_URL` is
    /// unset or a numeric variable fails to parse.
    pub fn from_env() -> Result<Self> {
        let cliq_webhook_url = require_var("ZOHO_CLIQ_WEBHOOK_URL")?;

        let port = match optional_var("SERVER_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| Error::OperationFailed {
                operation: "load_config".to_string(),
                cause: format!("invalid SERVER_PORT '{raw}': {e}"),
            })?,
            None => 8000,
        };

        let host = match optional_var("SERVER_HOST") {
            Some(raw) => raw.parse::<IpAddr>().map_err(|e| Error::OperationFailed {
                operation: "load_config".to_string(),
                cause: format!("invalid SERVER_HOST '{raw}': {e}"),
            })?,
            None => IpAddr::from([0, 0, 0, 0]),
        };

        let environment = match optional_var("ENVIRONMENT").as_deref() {
            Some("production") => Environment::Production,
            _ => Environment::Development,
        };

        Ok(Self {
            cliq_webhook_url,
            github_webhook_secret: optional_var("GITHUB_WEBHOOK_SECRET").map(SecretString::from),
            encryption_key: optional_var("ENCRYPTION_KEY").map(SecretString::from),
            database_path: optional_var("DATABASE_PATH")
                .map_or_else(|| PathBuf::from("vigil.db"), PathBuf::from),
            host,
            port,
            environment,
        })
    }

    /// Whether error responses should hide internal detail.
    #[must_use]
    pub const fn is_hardened(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }
}

fn require_var(name: &str) -> Result<String> {
    optional_var(name).ok_or_else(|| Error::OperationFailed {
        operation: "load_config".to_string(),
        cause: format!("required environment variable {name} is not set"),
    })
}

fn optional_var(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hardened_only_in_production() {
        let config = VigilConfig {
            cliq_webhook_url: "https://cliq.zoho.com/api/v2/channelsbyname/devops/message"
                .to_string(),
            github_webhook_secret: None,
            encryption_key: None,
            database_path: PathBuf::from("vigil.db"),
            host: IpAddr::from([0, 0, 0, 0]),
            port: 8000,
            environment: Environment::Development,
        };
        assert!(!config.is_hardened());

        let hardened = VigilConfig {
            environment: Environment::Production,
            ..config
        };
        assert!(hardened.is_hardened());
    }
}
