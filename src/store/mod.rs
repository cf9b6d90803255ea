//! Configuration store: per-user integration settings and the alert
//! audit log.
//!
//! The core reads integration configuration on every matching webhook and
//! appends one audit row per dispatched alert. Writes to integration
//! rows happen only through the configuration surface (out of scope
//! here beyond `upsert`), never from the relay path.
//!
//! Credentials are encrypted at the store boundary: `upsert` encrypts
//! through the [`CredentialVault`] before the row is written, and lookups
//! decrypt before the config is handed to the caller. Nothing outside
//! this module ever sees ciphertext.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE integrations (
//!     id INTEGER PRIMARY KEY,
//!     user_id INTEGER NOT NULL,
//!     source TEXT NOT NULL,
//!     lookup_key TEXT NOT NULL,
//!     credential_encrypted TEXT NOT NULL DEFAULT '',
//!     enabled INTEGER NOT NULL DEFAULT 1,
//!     alert_level TEXT NOT NULL DEFAULT 'all',
//!     created_at INTEGER NOT NULL,
//!     updated_at INTEGER NOT NULL,
//!     UNIQUE (user_id, source, lookup_key)
//! );
//!
//! CREATE TABLE alert_logs (
//!     id TEXT PRIMARY KEY,
//!     user_id INTEGER,
//!     alert_type TEXT NOT NULL,
//!     event_type TEXT NOT NULL,
//!     title TEXT NOT NULL,
//!     severity TEXT NOT NULL,
//!     message TEXT,
//!     source_id TEXT,
//!     created_at INTEGER NOT NULL
//! );
//! ```

use crate::models::{Severity, Source};
use crate::security::CredentialVault;
use crate::{Error, Result};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// How an event's identifying attribute is matched against stored
/// integration rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupKey {
    /// Exact match on the lookup key (repository full name, project
    /// slug, app identifier).
    Exact(String),
    /// Case-insensitive substring match: the stored key (a registry URL)
    /// must contain the event's repository name.
    Contains(String),
}

/// Per-user, per-source integration configuration, read-only to the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationConfig {
    /// Owning user.
    pub user_id: i64,
    /// Source this row configures.
    pub source: Source,
    /// Identifying attribute the webhook is matched on.
    pub lookup_key: String,
    /// Decrypted credential (token, DSN, password, API key); empty when
    /// none was stored.
    pub credential: String,
    /// Whether alerts are relayed for this integration.
    pub enabled: bool,
    /// Configured alert level. Currently advisory only: stored and
    /// surfaced but never used to filter deliveries.
    pub alert_level: String,
}

/// Input for creating or updating an integration row.
#[derive(Debug, Clone)]
pub struct NewIntegration {
    /// Owning user.
    pub user_id: i64,
    /// Source this row configures.
    pub source: Source,
    /// Identifying attribute the webhook is matched on.
    pub lookup_key: String,
    /// Plaintext credential; encrypted before the row is written.
    pub credential: String,
    /// Whether alerts are relayed.
    pub enabled: bool,
    /// Advisory alert level.
    pub alert_level: String,
}

/// Append-only audit record of one dispatched alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertLogEntry {
    /// Unique record id.
    pub id: String,
    /// Owning user, when resolvable.
    pub user_id: Option<i64>,
    /// Source name (`github`, `docker`, `sentry`, `firebase`).
    pub alert_type: String,
    /// Event subtype (`push`, `build`, `error`, ...).
    pub event_type: String,
    /// Alert title as delivered.
    pub title: String,
    /// Alert severity as delivered.
    pub severity: String,
    /// Alert description as delivered.
    pub message: String,
    /// Natural key of the triggering event (commit SHA, issue number,
    /// error id).
    pub source_id: String,
    /// Unix timestamp of the write.
    pub created_at: i64,
}

impl AlertLogEntry {
    /// Creates a new entry with a fresh id and the current timestamp.
    #[must_use]
    pub fn new(
        user_id: Option<i64>,
        source: Source,
        event_type: &str,
        title: &str,
        severity: Severity,
        message: &str,
        source_id: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            alert_type: source.as_str().to_string(),
            event_type: event_type.to_string(),
            title: title.to_string(),
            severity: severity.as_str().to_string(),
            message: message.to_string(),
            source_id: source_id.to_string(),
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Trait for configuration store backends.
///
/// The relay only needs lookup and append; `upsert` exists for the
/// configuration surface and for seeding tests.
pub trait ConfigStore: Send + Sync {
    /// Finds the integration matching an event's identifying attribute.
    ///
    /// Returns `Ok(None)` when no row matches; a disabled row is still
    /// returned so the caller can distinguish "not configured" from
    /// "muted" in logs.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or credential decryption
    /// fails.
    fn find_integration(&self, source: Source, key: &LookupKey)
    -> Result<Option<IntegrationConfig>>;

    /// Creates or updates an integration row, encrypting the credential.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption or the write fails.
    fn upsert_integration(&self, integration: &NewIntegration) -> Result<()>;

    /// Appends an audit record.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn append_alert_log(&self, entry: &AlertLogEntry) -> Result<()>;

    /// Returns the most recent audit records, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn recent_logs(&self, limit: usize) -> Result<Vec<AlertLogEntry>>;
}

/// `SQLite`-backed configuration store.
pub struct SqliteConfigStore {
    /// `SQLite` connection.
    conn: Mutex<Connection>,
    /// Vault for credential columns.
    vault: Arc<CredentialVault>,
}

// Mutex guards are held for the duration of database operations.
#[allow(clippy::significant_drop_tightening)]
impl SqliteConfigStore {
    /// Opens (or creates) the store at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema
    /// cannot be created.
    pub fn open(db_path: &Path, vault: Arc<CredentialVault>) -> Result<Self> {
        let conn = Connection::open(db_path).map_err(|e| Error::OperationFailed {
            operation: "open_config_store".to_string(),
            cause: e.to_string(),
        })?;

        Self::from_connection(conn, vault)
    }

    /// Opens an in-memory store; useful for tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn open_in_memory(vault: Arc<CredentialVault>) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::OperationFailed {
            operation: "open_config_store".to_string(),
            cause: e.to_string(),
        })?;

        Self::from_connection(conn, vault)
    }

    fn from_connection(conn: Connection, vault: Arc<CredentialVault>) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS integrations (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                source TEXT NOT NULL,
                lookup_key TEXT NOT NULL,
                credential_encrypted TEXT NOT NULL DEFAULT '',
                enabled INTEGER NOT NULL DEFAULT 1,
                alert_level TEXT NOT NULL DEFAULT 'all',
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                UNIQUE (user_id, source, lookup_key)
            );
            CREATE INDEX IF NOT EXISTS idx_integrations_source_key
                ON integrations (source, lookup_key);
            CREATE TABLE IF NOT EXISTS alert_logs (
                id TEXT PRIMARY KEY,
                user_id INTEGER,
                alert_type TEXT NOT NULL,
                event_type TEXT NOT NULL,
                title TEXT NOT NULL,
                severity TEXT NOT NULL,
                message TEXT,
                source_id TEXT,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_alert_logs_created
                ON alert_logs (created_at DESC);",
        )
        .map_err(|e| Error::OperationFailed {
            operation: "create_schema".to_string(),
            cause: e.to_string(),
        })?;

        Ok(Self {
            conn: Mutex::new(conn),
            vault,
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| Error::OperationFailed {
            operation: "lock_config_store".to_string(),
            cause: e.to_string(),
        })
    }

    fn row_to_config(
        &self,
        source: Source,
        row: &rusqlite::Row<'_>,
    ) -> rusqlite::Result<(IntegrationConfig, String)> {
        let encrypted: String = row.get(4)?;
        Ok((
            IntegrationConfig {
                user_id: row.get(0)?,
                source,
                lookup_key: row.get(3)?,
                credential: String::new(),
                enabled: row.get(5)?,
                alert_level: row.get(6)?,
            },
            encrypted,
        ))
    }
}

#[allow(clippy::significant_drop_tightening)]
impl ConfigStore for SqliteConfigStore {
    fn find_integration(
        &self,
        source: Source,
        key: &LookupKey,
    ) -> Result<Option<IntegrationConfig>> {
        let conn = self.lock()?;

        let sql = match key {
            LookupKey::Exact(_) => {
                "SELECT user_id, source, id, lookup_key, credential_encrypted, enabled, alert_level
                 FROM integrations
                 WHERE source = ?1 AND lookup_key = ?2
                 ORDER BY id LIMIT 1"
            },
            LookupKey::Contains(_) => {
                "SELECT user_id, source, id, lookup_key, credential_encrypted, enabled, alert_level
                 FROM integrations
                 WHERE source = ?1 AND instr(lower(lookup_key), lower(?2)) > 0
                 ORDER BY id LIMIT 1"
            },
        };
        let needle = match key {
            LookupKey::Exact(k) | LookupKey::Contains(k) => k.as_str(),
        };

        let row = conn
            .query_row(sql, params![source.as_str(), needle], |row| {
                self.row_to_config(source, row)
            })
            .optional()
            .map_err(|e| Error::OperationFailed {
                operation: "find_integration".to_string(),
                cause: e.to_string(),
            })?;

        match row {
            Some((mut config, encrypted)) => {
                config.credential = self.vault.decrypt(&encrypted)?;
                Ok(Some(config))
            },
            None => Ok(None),
        }
    }

    fn upsert_integration(&self, integration: &NewIntegration) -> Result<()> {
        let encrypted = self.vault.encrypt(&integration.credential)?;
        let now = chrono::Utc::now().timestamp();

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO integrations
                 (user_id, source, lookup_key, credential_encrypted, enabled, alert_level,
                  created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
             ON CONFLICT (user_id, source, lookup_key) DO UPDATE SET
                 credential_encrypted = excluded.credential_encrypted,
                 enabled = excluded.enabled,
                 alert_level = excluded.alert_level,
                 updated_at = excluded.updated_at",
            params![
                integration.user_id,
                integration.source.as_str(),
                integration.lookup_key,
                encrypted,
                integration.enabled,
                integration.alert_level,
                now,
            ],
        )
        .map_err(|e| Error::OperationFailed {
            operation: "upsert_integration".to_string(),
            cause: e.to_string(),
        })?;

        Ok(())
    }

    fn append_alert_log(&self, entry: &AlertLogEntry) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO alert_logs
                 (id, user_id, alert_type, event_type, title, severity, message, source_id,
                  created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                entry.id,
                entry.user_id,
                entry.alert_type,
                entry.event_type,
                entry.title,
                entry.severity,
                entry.message,
                entry.source_id,
                entry.created_at,
            ],
        )
        .map_err(|e| Error::OperationFailed {
            operation: "append_alert_log".to_string(),
            cause: e.to_string(),
        })?;

        Ok(())
    }

    fn recent_logs(&self, limit: usize) -> Result<Vec<AlertLogEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, alert_type, event_type, title, severity, message, source_id,
                        created_at
                 FROM alert_logs
                 ORDER BY created_at DESC, id
                 LIMIT ?1",
            )
            .map_err(|e| Error::OperationFailed {
                operation: "recent_logs".to_string(),
                cause: e.to_string(),
            })?;

        let rows = stmt
            .query_map(params![limit], |row| {
                Ok(AlertLogEntry {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    alert_type: row.get(2)?,
                    event_type: row.get(3)?,
                    title: row.get(4)?,
                    severity: row.get(5)?,
                    message: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
                    source_id: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
                    created_at: row.get(8)?,
                })
            })
            .map_err(|e| Error::OperationFailed {
                operation: "recent_logs".to_string(),
                cause: e.to_string(),
            })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|e| Error::OperationFailed {
                operation: "recent_logs".to_string(),
                cause: e.to_string(),
            })?);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> SqliteConfigStore {
        let vault = Arc::new(CredentialVault::from_key([7u8; 32]));
        SqliteConfigStore::open_in_memory(vault).expect("open store")
    }

    fn github_integration(repo: &str, enabled: bool) -> NewIntegration {
        NewIntegration {
            user_id: 1,
            source: Source::Github,
            lookup_key: repo.to_string(),
            credential: "ghp_secret".to_string(),
            enabled,
            alert_level: "all".to_string(),
        }
    }

    #[test]
    fn test_exact_lookup_roundtrips_credential() {
        let store = test_store();
        store
            .upsert_integration(&github_integration("acme/widgets", true))
            .expect("upsert");

        let config = store
            .find_integration(Source::Github, &LookupKey::Exact("acme/widgets".to_string()))
            .expect("find")
            .expect("some");

        assert_eq!(config.user_id, 1);
        assert!(config.enabled);
        // Decrypted at the store boundary.
        assert_eq!(config.credential, "ghp_secret");
    }

    #[test]
    fn test_exact_lookup_misses_other_repo() {
        let store = test_store();
        store
            .upsert_integration(&github_integration("acme/widgets", true))
            .expect("upsert");

        let config = store
            .find_integration(Source::Github, &LookupKey::Exact("acme/gadgets".to_string()))
            .expect("find");
        assert!(config.is_none());
    }

    #[test]
    fn test_substring_lookup_is_case_insensitive() {
        let store = test_store();
        store
            .upsert_integration(&NewIntegration {
                user_id: 2,
                source: Source::Docker,
                lookup_key: "https://hub.example.com/r/ACME".to_string(),
                credential: String::new(),
                enabled: true,
                alert_level: "all".to_string(),
            })
            .expect("upsert");

        let config = store
            .find_integration(Source::Docker, &LookupKey::Contains("acme".to_string()))
            .expect("find")
            .expect("some");
        assert_eq!(config.user_id, 2);

        let miss = store
            .find_integration(Source::Docker, &LookupKey::Contains("umbrella".to_string()))
            .expect("find");
        assert!(miss.is_none());
    }

    #[test]
    fn test_upsert_updates_existing_row() {
        let store = test_store();
        store
            .upsert_integration(&github_integration("acme/widgets", true))
            .expect("insert");
        store
            .upsert_integration(&github_integration("acme/widgets", false))
            .expect("update");

        let config = store
            .find_integration(Source::Github, &LookupKey::Exact("acme/widgets".to_string()))
            .expect("find")
            .expect("some");
        assert!(!config.enabled);
    }

    #[test]
    fn test_disabled_row_is_still_returned() {
        let store = test_store();
        store
            .upsert_integration(&github_integration("acme/widgets", false))
            .expect("upsert");

        let config = store
            .find_integration(Source::Github, &LookupKey::Exact("acme/widgets".to_string()))
            .expect("find");
        assert!(matches!(config, Some(c) if !c.enabled));
    }

    #[test]
    fn test_alert_log_append_and_readback() {
        let store = test_store();
        let entry = AlertLogEntry::new(
            Some(1),
            Source::Github,
            "push",
            "📤 Push to acme/widgets/main",
            Severity::Info,
            "dev pushed 3 commit(s)",
            "abc123",
        );
        store.append_alert_log(&entry).expect("append");

        let logs = store.recent_logs(10).expect("read");
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].event_type, "push");
        assert_eq!(logs[0].source_id, "abc123");
        assert_eq!(logs[0].severity, "info");
    }

    #[test]
    fn test_orphaned_log_allowed() {
        let store = test_store();
        let entry = AlertLogEntry::new(
            None,
            Source::Docker,
            "health_check",
            "❌ Container Health: api is UNHEALTHY",
            Severity::Error,
            "Health check status changed",
            "0123456789ab",
        );
        store.append_alert_log(&entry).expect("append");

        let logs = store.recent_logs(10).expect("read");
        assert_eq!(logs[0].user_id, None);
    }
}
