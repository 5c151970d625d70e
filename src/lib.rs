//! # todo-api
//!
//! A JSON HTTP service for a to-do list, backed by SQLite.
//!
//! ## Features
//!
//! - **CRUD**: create, read, update and delete tasks under `/v1/todo`
//! - **Optimistic locking**: every task carries a `version`; stale writes are
//!   rejected with 409 instead of overwriting
//! - **Listing**: full-text search on title and description, a completion
//!   filter, safelisted sorting and page metadata
//! - **Validation**: all field and query errors reported together as 422
//!
//! ## Usage
//!
//! ```rust,no_run
//! use todo_api::commands::Cli;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Cli::menu().await
//! }
//! ```

pub mod api;
pub mod commands;
pub mod db;
pub mod libs;
