use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use sqlx::Error as SqlxError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Password error: {0}")]
    Password(String),

    #[error("SQLx error: {0}")]
    Sqlx(#[from] SqlxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    fn client_message(&self) -> String {
        match self {
            AppError::Validation(_)
            | AppError::Conflict(_)
            | AppError::NotFound(_)
            | AppError::Unauthorized(_)
            | AppError::Forbidden(_) => self.to_string(),
            // Internal detail stays in the server log.
            AppError::Password(_) | AppError::Sqlx(_) | AppError::Io(_) => {
                "Server error".to_string()
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Password(_) | AppError::Sqlx(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("request failed: {}", self);
        }
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "message": self.client_message(),
        }))
    }
}

/// SQLite reports violated UNIQUE indexes as constraint errors; the handlers
/// translate those into field-naming conflicts instead of opaque 500s.
pub fn is_unique_violation(err: &SqlxError) -> bool {
    match err {
        SqlxError::Database(db) => {
            db.code().as_deref() == Some("2067")
                || db.code().as_deref() == Some("1555")
                || db.message().contains("UNIQUE constraint failed")
        }
        _ => false,
    }
}

/// Maps a sqlx error to a conflict with the given message when it is a
/// uniqueness violation, otherwise passes it through as a server error.
pub fn conflict_on_unique(err: SqlxError, message: &str) -> AppError {
    if is_unique_violation(&err) {
        AppError::Conflict(message.to_string())
    } else {
        AppError::Sqlx(err)
    }
}
