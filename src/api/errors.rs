//! Mapping from failures to HTTP responses.
//!
//! Every handler returns `Result<Response, AppError>`. The error body is
//! always an envelope with a single `error` key holding either a message or,
//! for validation failures, an object of field messages.
//!
//! | Variant            | Status |
//! |--------------------|--------|
//! | `BadRequest`       | 400    |
//! | `NotFound`         | 404    |
//! | `MethodNotAllowed` | 405    |
//! | `EditConflict`     | 409    |
//! | `FailedValidation` | 422    |
//! | `ServerError`      | 500    |
//!
//! Server errors carry their cause for the log; the client only ever sees a
//! generic message.

use super::helpers::{write_json, Envelope, JsonError};
use crate::db::db::StoreError;
use crate::libs::messages::Message;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("failed validation: {0:?}")]
    FailedValidation(BTreeMap<String, String>),
    #[error("{}", Message::ResourceNotFound)]
    NotFound,
    #[error("{}", Message::MethodNotSupported(.0.to_string()))]
    MethodNotAllowed(Method),
    #[error("{}", Message::EditConflict)]
    EditConflict,
    #[error(transparent)]
    ServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::FailedValidation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::EditConflict => StatusCode::CONFLICT,
            AppError::ServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonError> for AppError {
    fn from(err: JsonError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RecordNotFound => AppError::NotFound,
            StoreError::EditConflict => AppError::EditConflict,
            other => AppError::ServerError(other.into()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ServerError(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::FailedValidation(errors) => Value::Object(errors.into_iter().map(|(field, message)| (field, Value::String(message))).collect()),
            AppError::ServerError(err) => {
                tracing::error!(error = ?err, "{}", Message::ServerError);
                Value::String(Message::ServerError.to_string())
            }
            other => Value::String(other.to_string()),
        };

        error_response(status, message)
    }
}

/// Writes `{"error": message}`, degrading to a bare 500 if that fails.
pub fn error_response(status: StatusCode, message: Value) -> Response {
    match Envelope::single("error", message).and_then(|env| write_json(status, &env, HeaderMap::new())) {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(error = %err, "failed to write error response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rstest::rstest;

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[rstest]
    #[case(AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST)]
    #[case(AppError::FailedValidation(BTreeMap::new()), StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(AppError::NotFound, StatusCode::NOT_FOUND)]
    #[case(AppError::MethodNotAllowed(Method::PATCH), StatusCode::METHOD_NOT_ALLOWED)]
    #[case(AppError::EditConflict, StatusCode::CONFLICT)]
    #[case(AppError::ServerError(anyhow::anyhow!("boom")), StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_status_codes(#[case] err: AppError, #[case] status: StatusCode) {
        assert_eq!(err.into_response().status(), status);
    }

    #[rstest]
    #[case(StoreError::RecordNotFound, StatusCode::NOT_FOUND)]
    #[case(StoreError::EditConflict, StatusCode::CONFLICT)]
    #[case(StoreError::Timeout, StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(StoreError::UnsafeSort("x".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_store_error_mapping(#[case] err: StoreError, #[case] status: StatusCode) {
        assert_eq!(AppError::from(err).status(), status);
    }

    #[tokio::test]
    async fn test_server_error_hides_cause() {
        let response = AppError::ServerError(anyhow::anyhow!("disk on fire")).into_response();
        let body = body_json(response).await;
        assert_eq!(body["error"], "the server encountered a problem and could not process the request");
    }

    #[tokio::test]
    async fn test_validation_errors_are_keyed_by_field() {
        let errors = BTreeMap::from([("title".to_string(), "must be provided".to_string())]);
        let body = body_json(AppError::FailedValidation(errors).into_response()).await;
        assert_eq!(body, serde_json::json!({"error": {"title": "must be provided"}}));
    }

    #[tokio::test]
    async fn test_method_not_allowed_message() {
        let body = body_json(AppError::MethodNotAllowed(Method::PATCH).into_response()).await;
        assert_eq!(body["error"], "the PATCH method is not supported for this resource");
    }
}
