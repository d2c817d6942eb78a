use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Too many requests: {0}")]
    TooManyRequests(String),
    #[error("Internal server error")]
    Internal,
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl AppError {
    /// True when the database rejected a write on a UNIQUE or PRIMARY KEY constraint.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            AppError::Database(e) => e.as_database_error().is_some_and(|db_err| {
                // 2067 / 1555 = SQLite unique / primary key
                // 23505 = PostgreSQL unique violation
                matches!(db_err.code().as_deref(), Some("2067") | Some("1555") | Some("23505"))
            }),
            _ => false,
        }
    }
}

pub fn error_body(status: StatusCode, code: &str, message: &str) -> serde_json::Value {
    json!({
        "statusCode": status.as_u16(),
        "message": message,
        "code": code,
    })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_unique_violation() {
            let status = StatusCode::CONFLICT;
            return (status, Json(error_body(status, "CONFLICT", "Resource already exists (duplicate entry)"))).into_response();
        }

        let (status, code, message) = match &self {
            AppError::Database(e) => {
                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR", "Internal server error".to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Unauthorized".to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION", msg.clone()),
            AppError::TooManyRequests(msg) => (StatusCode::TOO_MANY_REQUESTS, "TOO_MANY_REQUESTS", msg.clone()),
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", "Internal error".to_string()),
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", "Internal error".to_string())
            }
        };

        (status, Json(error_body(status, code, &message))).into_response()
    }
}
