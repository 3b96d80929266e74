//! Store error type and its mapping onto HTTP responses.
//!
//! Every store operation returns [`StoreError`]. Handlers propagate it with `?`
//! and axum renders it through the [`IntoResponse`] impl below:
//!
//! | Variant | Status |
//! |---------|--------|
//! | `NotFound` | 404 |
//! | `Validation` | 400 |
//! | `Database` | 500 |
//!
//! Extractor rejections (bad JSON, unparsable path ids, bad query strings) are
//! folded into `Validation` so malformed input always answers 400 with the same
//! `{"error": ...}` body.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The record, or an id one of its associations references, does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        StoreError::NotFound { entity, id }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::Validation(_) => StatusCode::BAD_REQUEST,
            StoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short outcome label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::NotFound { .. } => "not_found",
            StoreError::Validation(_) => "invalid",
            StoreError::Database(_) => "error",
        }
    }

    /// Turn a constraint violation on a catalog insert into a validation error.
    ///
    /// Unique and check violations are caused by the request body, so they are
    /// reported as 400. Anything else stays a database error.
    pub(crate) fn from_constraint(e: sqlx::Error, duplicate_message: impl Into<String>) -> Self {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return StoreError::Validation(duplicate_message.into());
            }
            if db_err.is_check_violation() {
                return StoreError::Validation(db_err.message().to_string());
            }
        }
        StoreError::Database(e)
    }
}

impl From<JsonRejection> for StoreError {
    fn from(rejection: JsonRejection) -> Self {
        StoreError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for StoreError {
    fn from(rejection: PathRejection) -> Self {
        StoreError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for StoreError {
    fn from(rejection: QueryRejection) -> Self {
        StoreError::Validation(rejection.body_text())
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "store operation failed");
        }
        (status, Json(serde_json::json!({"error": self.to_string()}))).into_response()
    }
}
