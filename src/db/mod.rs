//! Persistence layer.
//!
//! All state lives in a single SQLite database:
//!
//! - [`db`]: the shared connection handle, the per-call deadline and the
//!   store error kinds
//! - [`migrations`]: versioned schema changes applied at startup
//! - [`tasks`]: CRUD, optimistic-locking updates and filtered listing for
//!   the `task_list` table
//!
//! ## Usage
//!
//! ```rust,no_run
//! use todo_api::db::{db::Db, tasks::Tasks};
//! use todo_api::libs::task::Task;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let tasks = Tasks::new(Db::open_in_memory()?);
//! let mut task = Task::new("buy milk", "2%", false);
//! tasks.insert(&mut task).await?;
//! assert_eq!(task.version, 1);
//! # Ok(())
//! # }
//! ```

/// Connection handle and store error kinds.
pub mod db;

/// Database schema migration system.
pub mod migrations;

/// Task storage.
pub mod tasks;
