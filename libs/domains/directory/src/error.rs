use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use std::time::Duration;
use thiserror::Error;

use crate::models::Partition;

/// Failure reported by a single partition store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("connection failure: {0}")]
    Connection(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("statement failed: {0}")]
    Query(String),

    #[error("partition call timed out after {0:?}")]
    Timeout(Duration),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("User {0} not found in either partition")]
    NotFound(i32),

    #[error("Partition {partition} failed: {source}")]
    StoreFailure {
        partition: Partition,
        #[source]
        source: StoreError,
    },

    #[error("Listing partition {partition} failed: {source}")]
    PartialListFailure {
        partition: Partition,
        #[source]
        source: StoreError,
    },
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Convert DirectoryError to AppError for standardized error responses.
///
/// Store causes are logged here and never reach the response body.
impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NotFound(id) => {
                AppError::NotFound(format!("User {} not found in either partition", id))
            }
            DirectoryError::StoreFailure { partition, source } => {
                tracing::error!(%partition, error = %source, "Partition store failure");
                AppError::InternalServerError(format!("Partition {} is unavailable", partition))
            }
            DirectoryError::PartialListFailure { partition, source } => {
                tracing::error!(%partition, error = %source, "Directory listing failed");
                AppError::InternalServerError(format!(
                    "Directory listing failed: partition {} is unavailable",
                    partition
                ))
            }
        }
    }
}

impl IntoResponse for DirectoryError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_codes() {
        let cases = [
            (DirectoryError::NotFound(9), StatusCode::NOT_FOUND),
            (
                DirectoryError::StoreFailure {
                    partition: Partition::A,
                    source: StoreError::Connection("refused".into()),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                DirectoryError::PartialListFailure {
                    partition: Partition::B,
                    source: StoreError::Timeout(Duration::from_secs(5)),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_store_failure_hides_driver_message() {
        let app_error: AppError = DirectoryError::StoreFailure {
            partition: Partition::B,
            source: StoreError::Query("relation \"users_server2\" does not exist".into()),
        }
        .into();

        let message = app_error.to_string();
        assert!(message.contains("Partition B"));
        assert!(!message.contains("users_server2"));
    }
}
