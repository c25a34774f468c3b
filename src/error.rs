//! Error types for the store and the shortening service
//!
//! `StoreError` is what the persistence layer reports. `ShortenerError` is the
//! only error that crosses the service boundary; a `StoreError::Conflict` is
//! consumed by the allocation retry loop and never converted into one.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors raised by [`crate::store::Store`]
#[derive(Debug, Error)]
pub enum StoreError {
    /// The short code is already taken by another mapping
    #[error("short code already exists: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] redb::Error),

    #[error("stored record is invalid: {0}")]
    Serialization(#[from] serde_json::Error),
}

// redb reports a distinct error type per operation; fold them into `Database`.
macro_rules! impl_from_redb {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for StoreError {
                fn from(err: $ty) -> Self {
                    StoreError::Database(err.into())
                }
            }
        )*
    };
}

impl_from_redb!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

/// Errors surfaced by [`crate::service::Shortener`] to its callers
#[derive(Debug, Error)]
pub enum ShortenerError {
    /// Missing or malformed long URL
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No mapping exists for the requested short code
    #[error("short code not found: {0}")]
    NotFound(String),

    /// Every candidate code collided with an existing mapping
    #[error("could not allocate a free short code after {attempts} attempts")]
    AllocationExhausted { attempts: u32 },

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    /// A blocking engine call panicked or was cancelled
    #[error("background task failed: {0}")]
    Task(String),
}

impl ShortenerError {
    /// Stable machine-readable code used in JSON error bodies
    pub fn code(&self) -> &'static str {
        match self {
            ShortenerError::InvalidInput(_) => "invalid_input",
            ShortenerError::NotFound(_) => "not_found",
            ShortenerError::AllocationExhausted { .. } => "allocation_exhausted",
            ShortenerError::Storage(_) => "storage",
            ShortenerError::Task(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ShortenerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ShortenerError::NotFound(_) => StatusCode::NOT_FOUND,
            ShortenerError::AllocationExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ShortenerError::Storage(_) | ShortenerError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ShortenerError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal details stay in the logs
        let message = match &self {
            ShortenerError::Storage(_) | ShortenerError::Task(_) => {
                tracing::error!(error = %self, "internal failure while serving request");
                "An unexpected error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": message,
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}
