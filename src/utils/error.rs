use std::sync::OnceLock;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;

static EXPOSE_INTERNAL: OnceLock<bool> = OnceLock::new();

/// Active l'affichage des erreurs internes dans les réponses HTTP (dev uniquement)
pub fn expose_internal_errors(enabled: bool) {
    let _ = EXPOSE_INTERNAL.set(enabled);
}

fn internal_exposed() -> bool {
    EXPOSE_INTERNAL.get().copied().unwrap_or(false)
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Store(DbErr),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Store(_) => "STORE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => AppError::Conflict(format!(
                "Duplicate value violates a unique constraint ({detail})"
            )),
            _ => AppError::Store(err),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    error: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.body(internal_exposed()))
    }
}

impl AppError {
    fn body(&self, expose_internal: bool) -> ErrorBody {
        let error = match self {
            AppError::Store(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                if expose_internal {
                    self.to_string()
                } else {
                    "Internal server error".to_string()
                }
            }
            other => other.to_string(),
        };

        ErrorBody {
            code: self.code(),
            error,
        }
    }
}
