//! Database schema migration management and versioning.
//!
//! Migrations are registered in version order and applied inside a single
//! transaction. Every applied migration is recorded in the `migrations`
//! table, so re-running is a no-op.
//!
//! ## Usage
//!
//! ```rust
//! use todo_api::db::migrations::{get_db_version, init_with_migrations};
//! use rusqlite::Connection;
//!
//! let mut conn = Connection::open_in_memory().unwrap();
//! init_with_migrations(&mut conn).unwrap();
//! assert!(get_db_version(&conn).unwrap() > 0);
//! ```

use crate::libs::messages::Message;
use anyhow::Result;
use rusqlite::{params, Connection, Transaction};

/// Tracks which migrations have been applied.
const MIGRATIONS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS migrations (
    id INTEGER PRIMARY KEY,
    version INTEGER NOT NULL UNIQUE,
    name TEXT NOT NULL,
    applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

/// A single schema change.
#[derive(Debug, Clone)]
struct Migration {
    version: u32,
    name: &'static str,
    up: fn(&Transaction) -> Result<()>,
}

/// Ordered registry of every schema migration.
pub struct MigrationManager {
    migrations: Vec<Migration>,
}

impl MigrationManager {
    pub fn new() -> Self {
        let mut manager = Self { migrations: Vec::new() };
        manager.register_migrations();
        manager
    }

    fn register_migrations(&mut self) {
        // Version 1: the task table. `version` starts at 1 and is the
        // optimistic-locking token bumped by every update.
        self.add_migration(1, "create_task_list", |tx| {
            tx.execute(
                "CREATE TABLE IF NOT EXISTS task_list (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    title TEXT NOT NULL,
                    description TEXT NOT NULL,
                    completed BOOLEAN NOT NULL DEFAULT FALSE,
                    version INTEGER NOT NULL DEFAULT 1
                )",
                [],
            )?;
            tx.execute("CREATE INDEX IF NOT EXISTS idx_task_list_completed ON task_list(completed)", [])?;
            Ok(())
        });

        // Version 2: full-text index over title and description. The index
        // is an external-content table kept in sync by triggers.
        self.add_migration(2, "add_task_list_fts", |tx| {
            tx.execute_batch(
                "CREATE VIRTUAL TABLE IF NOT EXISTS task_list_fts USING fts5(
                    title,
                    description,
                    content='task_list',
                    content_rowid='id'
                );

                CREATE TRIGGER IF NOT EXISTS task_list_fts_insert AFTER INSERT ON task_list BEGIN
                    INSERT INTO task_list_fts(rowid, title, description)
                    VALUES (new.id, new.title, new.description);
                END;

                CREATE TRIGGER IF NOT EXISTS task_list_fts_delete AFTER DELETE ON task_list BEGIN
                    INSERT INTO task_list_fts(task_list_fts, rowid, title, description)
                    VALUES ('delete', old.id, old.title, old.description);
                END;

                CREATE TRIGGER IF NOT EXISTS task_list_fts_update AFTER UPDATE ON task_list BEGIN
                    INSERT INTO task_list_fts(task_list_fts, rowid, title, description)
                    VALUES ('delete', old.id, old.title, old.description);
                    INSERT INTO task_list_fts(rowid, title, description)
                    VALUES (new.id, new.title, new.description);
                END;

                INSERT INTO task_list_fts(task_list_fts) VALUES ('rebuild');",
            )?;
            Ok(())
        });
    }

    fn add_migration(&mut self, version: u32, name: &'static str, up: fn(&Transaction) -> Result<()>) {
        self.migrations.push(Migration { version, name, up });
    }

    /// Applies every migration newer than the database's current version.
    pub fn run_migrations(&self, conn: &mut Connection) -> Result<()> {
        conn.execute(MIGRATIONS_TABLE, [])?;

        let current_version = self.get_current_version(conn)?;
        let pending: Vec<&Migration> = self.migrations.iter().filter(|m| m.version > current_version).collect();

        if pending.is_empty() {
            tracing::debug!("{}", Message::DatabaseUpToDate);
            return Ok(());
        }

        tracing::info!("{}", Message::MigrationsFound(pending.len()));

        let tx = conn.transaction()?;

        for migration in pending {
            tracing::info!("{}", Message::RunningMigration(migration.version, migration.name.to_string()));

            match (migration.up)(&tx) {
                Ok(()) => {
                    tx.execute("INSERT INTO migrations (version, name) VALUES (?1, ?2)", params![migration.version, migration.name])?;
                    tracing::info!("{}", Message::MigrationCompleted(migration.version));
                }
                Err(e) => {
                    tracing::error!("{}", Message::MigrationFailed(migration.version, e.to_string()));
                    return Err(e);
                }
            }
        }

        tx.commit()?;
        tracing::info!("{}", Message::AllMigrationsCompleted);

        Ok(())
    }

    /// Highest applied version, or 0 for a fresh database.
    fn get_current_version(&self, conn: &Connection) -> Result<u32> {
        // A missing migrations table means nothing has been applied yet.
        let version: Option<u32> = conn.query_row("SELECT MAX(version) FROM migrations", [], |row| row.get(0)).unwrap_or(None);

        Ok(version.unwrap_or(0))
    }

    fn latest_version(&self) -> u32 {
        self.migrations.last().map(|m| m.version).unwrap_or(0)
    }

    pub fn is_migration_applied(&self, conn: &Connection, version: u32) -> Result<bool> {
        let count: i32 = conn.query_row("SELECT COUNT(*) FROM migrations WHERE version = ?1", params![version], |row| row.get(0))?;

        Ok(count > 0)
    }

    /// `(version, name, applied_at)` for every applied migration, oldest first.
    pub fn get_migration_history(&self, conn: &Connection) -> Result<Vec<(u32, String, String)>> {
        let mut stmt = conn.prepare("SELECT version, name, applied_at FROM migrations ORDER BY version")?;

        let history = stmt
            .query_map([], |row| Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(history)
    }
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Brings `conn` up to the latest schema.
pub fn init_with_migrations(conn: &mut Connection) -> Result<()> {
    MigrationManager::new().run_migrations(conn)
}

pub fn get_db_version(conn: &Connection) -> Result<u32> {
    MigrationManager::new().get_current_version(conn)
}

pub fn needs_migration(conn: &Connection) -> Result<bool> {
    let manager = MigrationManager::new();
    let current = manager.get_current_version(conn)?;
    Ok(current < manager.latest_version())
}
