// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed application state.

use berth_core::{AppRecord, AppStatus, Clock, InvalidTransition};
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Database filename under the config directory.
pub const STATE_DB_NAME: &str = "state.db";

/// ERROR records older than this are dropped by `cleanup`.
const ERROR_RETENTION_DAYS: i64 = 30;

#[derive(Debug, Error)]
pub enum StateStoreError {
    #[error("app '{0}' not found")]
    NotFound(String),

    #[error("app name must be a non-empty string")]
    InvalidInput,

    #[error(transparent)]
    Transition(#[from] InvalidTransition),

    #[error("tunnel url may only be set while running; app '{app_name}' is {status}")]
    TunnelOutsideRunning { app_name: String, status: AppStatus },

    #[error("state database error while {context}: {source}")]
    Db {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to create config directory {}: {source}", path.display())]
    ConfigDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Typed counterpart of the original free-form field map: only the five
/// updatable columns are representable, so unknown fields are rejected
/// by construction.
#[derive(Debug, Clone, Default)]
pub struct FieldPatch {
    pub environment_name: Option<String>,
    pub process_pid: Option<i32>,
    pub tunnel_url: Option<String>,
    pub config_blob: Option<String>,
    pub error_message: Option<String>,
}

impl FieldPatch {
    pub fn environment_name(mut self, name: impl Into<String>) -> Self {
        self.environment_name = Some(name.into());
        self
    }

    pub fn process_pid(mut self, pid: i32) -> Self {
        self.process_pid = Some(pid);
        self
    }

    pub fn tunnel_url(mut self, url: impl Into<String>) -> Self {
        self.tunnel_url = Some(url.into());
        self
    }

    pub fn config_blob(mut self, blob: impl Into<String>) -> Self {
        self.config_blob = Some(blob.into());
        self
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

/// The persistent state store.
///
/// All writes serialize on the connection mutex and run inside a
/// transaction; a crash mid-write leaves the last committed record.
pub struct StateStore<C: Clock> {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    clock: C,
}

impl<C: Clock> StateStore<C> {
    /// Open (creating if needed) `<config_dir>/state.db` and ensure the
    /// schema exists. Initialization is idempotent.
    pub fn open(config_dir: &Path, clock: C) -> Result<Self, StateStoreError> {
        std::fs::create_dir_all(config_dir).map_err(|source| StateStoreError::ConfigDir {
            path: config_dir.to_path_buf(),
            source,
        })?;
        let db_path = config_dir.join(STATE_DB_NAME);
        let conn = Connection::open(&db_path)
            .map_err(|source| db_err("opening state database", source))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS applications (
                app_name TEXT PRIMARY KEY NOT NULL,
                status TEXT NOT NULL DEFAULT 'UNKNOWN',
                install_path TEXT,
                environment_name TEXT,
                installed_at TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                process_pid INTEGER,
                tunnel_url TEXT,
                config_data TEXT,
                error_message TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_app_status ON applications(status);",
        )
        .map_err(|source| db_err("initializing schema", source))?;
        tracing::debug!(path = %db_path.display(), "state store ready");
        Ok(Self { conn: Mutex::new(conn), db_path, clock })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Upsert an app with status INSTALLING and fresh timestamps.
    ///
    /// A second install for the same name deliberately resets the row —
    /// prior pid/tunnel/error fields are cleared along with it.
    pub fn add(&self, app_name: &str, install_path: &Path) -> Result<(), StateStoreError> {
        if app_name.trim().is_empty() {
            return Err(StateStoreError::InvalidInput);
        }
        let now = self.timestamp();
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO applications
             (app_name, status, install_path, installed_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![
                app_name,
                AppStatus::Installing.to_string(),
                install_path.to_string_lossy().into_owned(),
                now,
            ],
        )
        .map_err(|source| db_err(&format!("adding app '{app_name}'"), source))?;
        tracing::info!(app = app_name, "app registered as INSTALLING");
        Ok(())
    }

    /// Delete the record. Returns whether it existed.
    pub fn remove(&self, app_name: &str) -> Result<bool, StateStoreError> {
        let conn = self.conn.lock();
        let rows = conn
            .execute("DELETE FROM applications WHERE app_name = ?1", params![app_name])
            .map_err(|source| db_err(&format!("removing app '{app_name}'"), source))?;
        Ok(rows > 0)
    }

    /// Transition the app's status, applying the field patch atomically.
    ///
    /// The write is rejected unless the state machine allows the move.
    /// The pid/url coupling invariants are enforced here: leaving the
    /// pid-holding states clears `process_pid`, and any state but
    /// RUNNING clears `tunnel_url`.
    pub fn set_status(
        &self,
        app_name: &str,
        status: AppStatus,
        patch: FieldPatch,
    ) -> Result<(), StateStoreError> {
        let now = self.timestamp();
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|source| db_err("starting transaction", source))?;

        let current: AppStatus = tx
            .query_row(
                "SELECT status FROM applications WHERE app_name = ?1",
                params![app_name],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|source| db_err(&format!("reading status of '{app_name}'"), source))?
            .map(|s| AppStatus::parse(&s).unwrap_or(AppStatus::Unknown))
            .ok_or_else(|| StateStoreError::NotFound(app_name.to_string()))?;

        if !current.can_transition(status) {
            return Err(InvalidTransition {
                app_name: app_name.to_string(),
                from: current,
                to: status,
            }
            .into());
        }

        let process_pid = if status.holds_pid() { patch.process_pid } else { None };
        let tunnel_url = if status.holds_tunnel() { patch.tunnel_url } else { None };
        let clears_pid = !status.holds_pid();
        let clears_tunnel = !status.holds_tunnel();

        let mut sets = vec!["status = ?2".to_string(), "updated_at = ?3".to_string()];
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = vec![
            Box::new(app_name.to_string()),
            Box::new(status.to_string()),
            Box::new(now),
        ];
        if let Some(env) = patch.environment_name {
            values.push(Box::new(env));
            sets.push(format!("environment_name = ?{}", values.len()));
        }
        if let Some(pid) = process_pid {
            values.push(Box::new(pid));
            sets.push(format!("process_pid = ?{}", values.len()));
        } else if clears_pid {
            sets.push("process_pid = NULL".to_string());
        }
        if let Some(url) = tunnel_url {
            values.push(Box::new(url));
            sets.push(format!("tunnel_url = ?{}", values.len()));
        } else if clears_tunnel {
            sets.push("tunnel_url = NULL".to_string());
        }
        if let Some(blob) = patch.config_blob {
            values.push(Box::new(blob));
            sets.push(format!("config_data = ?{}", values.len()));
        }
        if let Some(message) = patch.error_message {
            values.push(Box::new(message));
            sets.push(format!("error_message = ?{}", values.len()));
        }

        let sql = format!(
            "UPDATE applications SET {} WHERE app_name = ?1",
            sets.join(", ")
        );
        tx.execute(&sql, rusqlite::params_from_iter(values.iter().map(|v| v.as_ref())))
            .map_err(|source| db_err(&format!("updating '{app_name}'"), source))?;
        tx.commit()
            .map_err(|source| db_err("committing status update", source))?;

        tracing::info!(app = app_name, from = %current, to = %status, "status transition");
        Ok(())
    }

    /// Record the public tunnel URL for a running app.
    pub fn set_tunnel(&self, app_name: &str, url: &str) -> Result<(), StateStoreError> {
        let now = self.timestamp();
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|source| db_err("starting transaction", source))?;
        let status: AppStatus = tx
            .query_row(
                "SELECT status FROM applications WHERE app_name = ?1",
                params![app_name],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|source| db_err(&format!("reading status of '{app_name}'"), source))?
            .map(|s| AppStatus::parse(&s).unwrap_or(AppStatus::Unknown))
            .ok_or_else(|| StateStoreError::NotFound(app_name.to_string()))?;
        if !status.holds_tunnel() {
            return Err(StateStoreError::TunnelOutsideRunning {
                app_name: app_name.to_string(),
                status,
            });
        }
        tx.execute(
            "UPDATE applications SET tunnel_url = ?2, updated_at = ?3 WHERE app_name = ?1",
            params![app_name, url, now],
        )
        .map_err(|source| db_err(&format!("setting tunnel for '{app_name}'"), source))?;
        tx.commit()
            .map_err(|source| db_err("committing tunnel update", source))?;
        Ok(())
    }

    /// Mirror the app's config file contents into the record without a
    /// status transition.
    pub fn set_config_blob(&self, app_name: &str, blob: &str) -> Result<(), StateStoreError> {
        let now = self.timestamp();
        let conn = self.conn.lock();
        let rows = conn
            .execute(
                "UPDATE applications SET config_data = ?2, updated_at = ?3 WHERE app_name = ?1",
                params![app_name, blob, now],
            )
            .map_err(|source| db_err(&format!("mirroring config for '{app_name}'"), source))?;
        if rows == 0 {
            return Err(StateStoreError::NotFound(app_name.to_string()));
        }
        Ok(())
    }

    pub fn get_status(&self, app_name: &str) -> Result<Option<AppStatus>, StateStoreError> {
        let conn = self.conn.lock();
        let status = conn
            .query_row(
                "SELECT status FROM applications WHERE app_name = ?1",
                params![app_name],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|source| db_err(&format!("reading status of '{app_name}'"), source))?;
        Ok(status.map(|s| AppStatus::parse(&s).unwrap_or(AppStatus::Unknown)))
    }

    pub fn get(&self, app_name: &str) -> Result<Option<AppRecord>, StateStoreError> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT * FROM applications WHERE app_name = ?1",
            params![app_name],
            record_from_row,
        )
        .optional()
        .map_err(|source| db_err(&format!("reading record of '{app_name}'"), source))
    }

    pub fn all(&self) -> Result<Vec<AppRecord>, StateStoreError> {
        self.query_records("SELECT * FROM applications ORDER BY app_name", params![])
    }

    pub fn by_status(&self, status: AppStatus) -> Result<Vec<AppRecord>, StateStoreError> {
        self.query_records(
            "SELECT * FROM applications WHERE status = ?1 ORDER BY app_name",
            params![status.to_string()],
        )
    }

    /// Drop ERROR records older than the retention window, then compact
    /// the database file.
    pub fn cleanup(&self) -> Result<usize, StateStoreError> {
        let now = self.timestamp();
        let conn = self.conn.lock();
        let removed = conn
            .execute(
                "DELETE FROM applications
                 WHERE status = 'ERROR'
                 AND datetime(updated_at) < datetime(?1, ?2)",
                params![now, format!("-{ERROR_RETENTION_DAYS} days")],
            )
            .map_err(|source| db_err("deleting stale error records", source))?;
        conn.execute_batch("VACUUM")
            .map_err(|source| db_err("vacuuming database", source))?;
        if removed > 0 {
            tracing::info!(removed, "stale error records cleaned up");
        }
        Ok(removed)
    }

    fn query_records(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<AppRecord>, StateStoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(sql)
            .map_err(|source| db_err("preparing query", source))?;
        let rows = stmt
            .query_map(params, record_from_row)
            .map_err(|source| db_err("querying records", source))?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|source| db_err("decoding record", source))?);
        }
        Ok(records)
    }

    fn timestamp(&self) -> String {
        self.clock.utc().to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

fn db_err(context: &str, source: rusqlite::Error) -> StateStoreError {
    StateStoreError::Db { context: context.to_string(), source }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<AppRecord> {
    let status: String = row.get("status")?;
    let install_path: Option<String> = row.get("install_path")?;
    Ok(AppRecord {
        app_name: row.get("app_name")?,
        status: AppStatus::parse(&status).unwrap_or(AppStatus::Unknown),
        install_path: install_path.map(PathBuf::from),
        environment_name: row.get("environment_name")?,
        installed_at: parse_timestamp(row.get("installed_at")?),
        updated_at: parse_timestamp(row.get("updated_at")?),
        process_pid: row.get("process_pid")?,
        tunnel_url: row.get("tunnel_url")?,
        config_blob: row.get("config_data")?,
        error_message: row.get("error_message")?,
    })
}

fn parse_timestamp(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
