use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use core_types::CoreError;
use database::DbError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// A storage failure that is not the client's fault.
    #[error("Database error: {0}")]
    Database(DbError),
    #[error("{0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Content-Type must be application/json")]
    UnsupportedMediaType,
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Rejected rows and misuse of the repository are client errors; everything
/// else from the store is an internal one.
impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Validation(message) | DbError::Constraint(message) => {
                AppError::Validation(message)
            }
            DbError::NotFound => AppError::NotFound("Product not found".to_string()),
            other => AppError::Database(other),
        }
    }
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Database(db_err) => {
                tracing::error!(error = ?db_err, "Database error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::Validation(message) => {
                tracing::warn!(%message, "Rejected request.");
                (StatusCode::BAD_REQUEST, message)
            }
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            AppError::UnsupportedMediaType => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                AppError::UnsupportedMediaType.to_string(),
            ),
        };

        let body = Json(json!({
            "status": status.as_u16(),
            "error": status.canonical_reason().unwrap_or_default(),
            "message": message,
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_map_by_cause() {
        assert!(matches!(
            AppError::from(DbError::Constraint("numeric field overflow".into())),
            AppError::Validation(_)
        ));
        assert!(matches!(
            AppError::from(DbError::Validation("update called on entity with empty id".into())),
            AppError::Validation(_)
        ));
        assert!(matches!(AppError::from(DbError::NotFound), AppError::NotFound(_)));
        assert!(matches!(
            AppError::from(DbError::ConnectionConfigError("gone".into())),
            AppError::Database(_)
        ));
    }

    #[test]
    fn responses_carry_the_matching_status() {
        let cases = [
            (AppError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("nope".into()), StatusCode::NOT_FOUND),
            (AppError::UnsupportedMediaType, StatusCode::UNSUPPORTED_MEDIA_TYPE),
            (
                AppError::Database(DbError::ConnectionConfigError("gone".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
