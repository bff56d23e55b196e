//! Versioned schema for the plugin-data database.
//!
//! Applied versions are recorded in `schema_migrations`. A migration and its
//! bookkeeping row commit together, so an interrupted run leaves the
//! database at the previous version.

use anyhow::{bail, Context, Result};
use rusqlite::Connection;

struct Migration {
    version: &'static str,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: "001",
    name: "plugin_data",
    sql: include_str!("migrations/001_plugin_data.sql"),
}];

/// Bring the database up to the latest version. Returns how many
/// migrations were applied.
pub fn run_migrations(conn: &Connection) -> Result<usize> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )
    .context("Failed to create schema_migrations table")?;

    let applied = applied_versions(conn)?;
    ensure_known(&applied)?;

    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|m| !applied.iter().any(|v| v == m.version))
        .collect();

    for migration in &pending {
        apply(conn, migration)?;
    }
    if pending.is_empty() {
        tracing::debug!("Plugin-data schema is up to date");
    }
    Ok(pending.len())
}

fn applied_versions(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT version FROM schema_migrations ORDER BY version")?;
    let versions = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(versions)
}

/// Refuse a database written by a newer build; its rows may not mean what
/// this build expects.
fn ensure_known(applied: &[String]) -> Result<()> {
    if let Some(unknown) = applied
        .iter()
        .find(|v| !MIGRATIONS.iter().any(|m| m.version == v.as_str()))
    {
        bail!(
            "Database has schema version {} which this build does not know; upgrade sprint-tracker",
            unknown
        );
    }
    Ok(())
}

fn apply(conn: &Connection, migration: &Migration) -> Result<()> {
    tracing::info!("Applying migration {}: {}", migration.version, migration.name);

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(migration.sql).with_context(|| {
        format!(
            "Failed to apply migration {}: {}",
            migration.version, migration.name
        )
    })?;
    tx.execute(
        "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?, ?, ?)",
        (
            migration.version,
            migration.name,
            chrono::Utc::now().to_rfc3339(),
        ),
    )?;
    tx.commit()?;
    Ok(())
}
