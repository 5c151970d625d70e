use super::errors::AppError;
use super::helpers::{null_as_default, read_bool, read_int, read_json, read_string, write_json, Envelope, QueryValues};
use crate::db::tasks::Tasks;
use crate::libs::config::Config;
use crate::libs::filters::{validate_filters, Filters, DEFAULT_PAGE, DEFAULT_PAGE_SIZE, SORT_SAFELIST};
use crate::libs::messages::Message;
use crate::libs::task::{validate_task, Task};
use crate::libs::validator::Validator;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::Response;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub tasks: Tasks,
    pub config: Arc<Config>,
}

type HandlerResult = Result<Response, AppError>;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CreateTaskInput {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub completed: bool,
}

/// Partial update. Absent fields keep their stored value; `version`, when
/// sent, must match the stored version.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpdateTaskInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub version: Option<i32>,
}

#[derive(Debug, Serialize)]
struct SystemInfo<'a> {
    environment: &'a str,
    version: &'static str,
}

/// Parses the `{id}` path segment. Anything that is not a positive integer
/// cannot name a task, so it is reported as not found.
pub fn read_id_param(raw: &str) -> Result<i64, AppError> {
    match raw.parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(AppError::NotFound),
    }
}

fn failed_validation(v: Validator) -> AppError {
    AppError::FailedValidation(v.into_errors())
}

pub async fn healthcheck_handler(State(app): State<AppState>) -> HandlerResult {
    let env = Envelope::new().with("status", Message::HealthAvailable.to_string())?.with(
        "system_info",
        SystemInfo {
            environment: &app.config.env,
            version: env!("CARGO_PKG_VERSION"),
        },
    )?;

    Ok(write_json(StatusCode::OK, &env, HeaderMap::new())?)
}

pub async fn create_task_handler(State(app): State<AppState>, body: Body) -> HandlerResult {
    let input: CreateTaskInput = read_json(body).await?;

    let mut task = Task::new(input.title, input.description, input.completed);

    let mut v = Validator::new();
    validate_task(&mut v, &task);
    if !v.valid() {
        return Err(failed_validation(v));
    }

    app.tasks.insert(&mut task).await?;

    let mut headers = HeaderMap::new();
    let location = HeaderValue::from_str(&format!("/v1/todo/{}", task.id)).map_err(anyhow::Error::from)?;
    headers.insert(LOCATION, location);

    Ok(write_json(StatusCode::CREATED, &Envelope::single("task", &task)?, headers)?)
}

pub async fn show_task_handler(State(app): State<AppState>, Path(id): Path<String>) -> HandlerResult {
    let id = read_id_param(&id)?;
    let task = app.tasks.get(id).await?;

    Ok(write_json(StatusCode::OK, &Envelope::single("task", &task)?, HeaderMap::new())?)
}

pub async fn update_task_handler(State(app): State<AppState>, Path(id): Path<String>, body: Body) -> HandlerResult {
    let id = read_id_param(&id)?;
    let mut task = app.tasks.get(id).await?;

    let input: UpdateTaskInput = read_json(body).await?;

    if input.version.is_some_and(|version| version != task.version) {
        return Err(AppError::EditConflict);
    }

    if let Some(title) = input.title {
        task.title = title;
    }
    if let Some(description) = input.description {
        task.description = description;
    }
    if let Some(completed) = input.completed {
        task.completed = completed;
    }

    let mut v = Validator::new();
    validate_task(&mut v, &task);
    if !v.valid() {
        return Err(failed_validation(v));
    }

    app.tasks.update(&mut task).await?;

    Ok(write_json(StatusCode::OK, &Envelope::single("task", &task)?, HeaderMap::new())?)
}

pub async fn delete_task_handler(State(app): State<AppState>, Path(id): Path<String>) -> HandlerResult {
    let id = read_id_param(&id)?;
    app.tasks.delete(id).await?;

    Ok(write_json(StatusCode::OK, &Envelope::single("message", Message::TaskDeleted.to_string())?, HeaderMap::new())?)
}

/// `GET /v1/todo?title=&description=&completed=&page=&page_size=&sort=`
///
/// Every bad parameter is reported in one 422 response.
pub async fn list_tasks_handler(State(app): State<AppState>, Query(qs): Query<QueryValues>) -> HandlerResult {
    let mut v = Validator::new();

    let title = read_string(&qs, "title", "");
    let description = read_string(&qs, "description", "");
    let completed = match qs.get("completed") {
        "" => None,
        _ => Some(read_bool(&qs, "completed", false, &mut v)),
    };

    let filters = Filters {
        page: read_int(&qs, "page", DEFAULT_PAGE, &mut v),
        page_size: read_int(&qs, "page_size", DEFAULT_PAGE_SIZE, &mut v),
        sort: read_string(&qs, "sort", "id"),
        sort_safelist: SORT_SAFELIST,
    };

    validate_filters(&mut v, &filters);
    if !v.valid() {
        return Err(failed_validation(v));
    }

    let (tasks, metadata) = app.tasks.get_all(&title, &description, completed, &filters).await?;

    let env = Envelope::new().with("tasks", tasks)?.with("metadata", metadata)?;
    Ok(write_json(StatusCode::OK, &env, HeaderMap::new())?)
}

pub async fn not_found_response() -> AppError {
    AppError::NotFound
}

pub async fn method_not_allowed_response(method: Method) -> AppError {
    AppError::MethodNotAllowed(method)
}
