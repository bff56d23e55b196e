//! Local plugin-data store.
//!
//! Outside the Trello iframe there is no `t.get`/`t.set`; boards keep their
//! counters in this SQLite database instead, keyed by board, scope and key.

mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use serde_json::{Map, Value};

use crate::board::{HostError, PluginStorage, Scope};

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "sprint-tracker")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(dirs.data_dir().join("sprint-tracker.db"))
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let applied = schema::run_migrations(&conn)?;
        if applied > 0 {
            tracing::info!("Plugin-data database migrated ({} applied)", applied);
        }
        Ok(())
    }

    // ============================================================
    // Plugin data
    // ============================================================

    pub fn get_plugin_value(
        &self,
        workspace_id: &str,
        scope: Scope,
        key: &str,
    ) -> Result<Option<Value>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM plugin_data WHERE workspace_id = ? AND scope = ? AND key = ?",
                (workspace_id, scope.as_str(), key),
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Upsert every entry in a single transaction.
    pub fn set_plugin_values(
        &self,
        workspace_id: &str,
        scope: Scope,
        entries: &Map<String, Value>,
    ) -> Result<()> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();

        for (key, value) in entries {
            tx.execute(
                "INSERT INTO plugin_data (workspace_id, scope, key, value, updated_at)
                 VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT (workspace_id, scope, key)
                 DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                (
                    workspace_id,
                    scope.as_str(),
                    key.as_str(),
                    serde_json::to_string(value)?,
                    &now,
                ),
            )?;
        }

        tx.commit()?;
        Ok(())
    }
}

#[async_trait]
impl PluginStorage for Database {
    async fn get(
        &self,
        workspace_id: &str,
        scope: Scope,
        key: &str,
    ) -> Result<Option<Value>, HostError> {
        self.get_plugin_value(workspace_id, scope, key)
            .map_err(|e| HostError::Storage(e.to_string()))
    }

    async fn set(
        &self,
        workspace_id: &str,
        scope: Scope,
        entries: &Map<String, Value>,
    ) -> Result<(), HostError> {
        self.set_plugin_values(workspace_id, scope, entries)
            .map_err(|e| HostError::Storage(e.to_string()))
    }
}
