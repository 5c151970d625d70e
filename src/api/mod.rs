//! HTTP surface of the service.
//!
//! | Method | Path                | Handler                                 |
//! |--------|---------------------|-----------------------------------------|
//! | GET    | `/v1/healthcheck`   | [`handlers::healthcheck_handler`]       |
//! | GET    | `/v1/todo`          | [`handlers::list_tasks_handler`]        |
//! | POST   | `/v1/todo`          | [`handlers::create_task_handler`]       |
//! | GET    | `/v1/todo/{id}`     | [`handlers::show_task_handler`]         |
//! | PUT    | `/v1/todo/{id}`     | [`handlers::update_task_handler`]       |
//! | DELETE | `/v1/todo/{id}`     | [`handlers::delete_task_handler`]       |
//!
//! Unknown paths answer 404 and known paths with an unsupported method
//! answer 405, both with the usual `{"error": ...}` body.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use todo_api::api::{routes, AppState};
//! use todo_api::db::{db::Db, tasks::Tasks};
//! use todo_api::libs::config::Config;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let state = AppState {
//!     tasks: Tasks::new(Db::open_in_memory()?),
//!     config: Arc::new(Config::default()),
//! };
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:4000").await?;
//! axum::serve(listener, routes(state)).await?;
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod handlers;
pub mod helpers;

pub use handlers::AppState;

use axum::routing::get;
use axum::Router;
use handlers::{
    create_task_handler, delete_task_handler, healthcheck_handler, list_tasks_handler, method_not_allowed_response, not_found_response, show_task_handler,
    update_task_handler,
};
use tower_http::trace::TraceLayer;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/healthcheck", get(healthcheck_handler))
        .route("/v1/todo", get(list_tasks_handler).post(create_task_handler))
        .route("/v1/todo/{id}", get(show_task_handler).put(update_task_handler).delete(delete_task_handler))
        .fallback(not_found_response)
        .method_not_allowed_fallback(method_not_allowed_response)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
