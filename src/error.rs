//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Module metadata is missing something an operation needs, or is inconsistent.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("module '{0}' has no visible columns")]
    NoVisibleColumns(String),
    #[error("module '{0}' has no primary key column")]
    NoPrimaryKey(String),
    #[error("module '{0}' has more than one primary key column")]
    MultiplePrimaryKeys(String),
    #[error("module '{module}' of type '{kind}' has no select statement")]
    NoSelectStatement { module: String, kind: String },
    #[error("module '{0}' has no table name")]
    NoTableName(String),
    #[error("duplicate module id: {0}")]
    DuplicateModule(String),
    #[error("cyclic child-link graph: module '{module}' reached at depth {depth}")]
    CyclicChildLinks { module: String, depth: usize },
    #[error("config load: {0}")]
    Load(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("database error in module '{module}': {source}")]
    Execution {
        module: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Wraps a driver failure with the module it happened in.
    pub fn execution(module: &str, source: sqlx::Error) -> Self {
        AppError::Execution {
            module: module.to_string(),
            source,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::Execution { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
