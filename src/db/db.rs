use super::migrations::init_with_migrations;
use crate::libs::messages::Message;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::{Connection, ErrorCode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Upper bound on the wall-clock time of a single store operation.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(3);

pub const MEMORY_DSN: &str = ":memory:";

/// SQLite VM instructions between deadline checks.
const DEADLINE_CHECK_OPS: i32 = 1000;

/// Failure kinds reported by the store.
///
/// Callers branch on the variant: `RecordNotFound` and `EditConflict` are
/// expected outcomes that map to client responses, everything else is an
/// internal failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    RecordNotFound,
    #[error("edit conflict")]
    EditConflict,
    #[error("unsafe sort parameter: {0}")]
    UnsafeSort(String),
    #[error("database operation exceeded the {}s deadline", QUERY_TIMEOUT.as_secs())]
    Timeout,
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
    #[error("database worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Shared handle to the SQLite database.
///
/// Cloning is cheap; all clones use the same connection. Statements run on
/// tokio's blocking pool and are cut off after [`QUERY_TIMEOUT`].
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    /// Opens `dsn`, configures the connection and applies pending migrations.
    pub fn open(dsn: &str, busy_timeout: Duration) -> Result<Db> {
        let mut conn = Self::open_without_migrations(dsn)?;
        conn.busy_timeout(busy_timeout)?;
        if dsn != MEMORY_DSN {
            let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
            tracing::debug!(journal_mode = %mode, "journal mode set");
        }
        init_with_migrations(&mut conn).context("failed to migrate database")?;
        tracing::info!("{}", Message::DatabaseOpened(dsn.to_string()));

        Ok(Self::from_connection(conn))
    }

    /// Fresh in-memory database with the full schema.
    pub fn open_in_memory() -> Result<Db> {
        Self::open(MEMORY_DSN, QUERY_TIMEOUT)
    }

    /// Raw connection with no migrations applied.
    pub fn open_without_migrations(dsn: &str) -> Result<Connection> {
        Connection::open(dsn).with_context(|| format!("failed to open database {dsn}"))
    }

    pub fn from_connection(conn: Connection) -> Db {
        Db {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs `op` against the connection on the blocking pool.
    ///
    /// The deadline is fixed when `run` is called. Waiting for a blocking
    /// thread and for the connection both count against it, and `op` is
    /// never started once it has passed. While `op` runs, a progress handler
    /// aborts this call's statements at the deadline, leaving statements of
    /// other calls alone. A [`StoreError::Timeout`] therefore means nothing
    /// was written.
    pub async fn run<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let deadline = Instant::now() + QUERY_TIMEOUT;
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let guard = conn.try_lock_until(deadline).ok_or(StoreError::Timeout)?;
            if Instant::now() >= deadline {
                return Err(StoreError::Timeout);
            }

            guard.progress_handler(DEADLINE_CHECK_OPS, Some(move || Instant::now() >= deadline));
            let result = op(&guard);
            guard.progress_handler(0, None::<fn() -> bool>);

            result.map_err(|err| match err {
                StoreError::Database(e) if e.sqlite_error_code() == Some(ErrorCode::OperationInterrupted) => StoreError::Timeout,
                other => other,
            })
        })
        .await?
    }
}
