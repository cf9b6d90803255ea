//! Domain models.
//!
//! The normalized alert representation shared by all sources, plus the
//! typed webhook payload models for each external protocol.

mod alert;

pub mod crashlytics;
pub mod docker;
pub mod github;
pub mod sentry;

pub use alert::{AlertAction, NormalizedAlert, Severity};

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Webhook source an event arrived from.
///
/// The string form doubles as the `alert_type` column of the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// GitHub (push, pull request, issues, release events).
    Github,
    /// Docker Hub (push, build, container health-check events).
    Docker,
    /// Sentry (error events and issue alerts).
    Sentry,
    /// Firebase Crashlytics (crash and alert events).
    Firebase,
}

impl Source {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::Docker => "docker",
            Self::Sentry => "sentry",
            Self::Firebase => "firebase",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Source {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "github" => Ok(Self::Github),
            "docker" => Ok(Self::Docker),
            "sentry" => Ok(Self::Sentry),
            "firebase" => Ok(Self::Firebase),
            _ => Err(Error::Validation(format!("unknown source: {s}"))),
        }
    }
}
