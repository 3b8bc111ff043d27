use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    /// A rejected payload together with every problem found in it.
    #[error("{message}")]
    Rejected {
        message: String,
        details: Option<String>,
        errors: Vec<String>,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Email error: {0}")]
    EmailError(String),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl AppError {
    pub fn rejected(message: impl Into<String>, errors: Vec<String>) -> Self {
        AppError::Rejected {
            message: message.into(),
            details: None,
            errors,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) | AppError::Rejected { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::InternalError(_)
            | AppError::DatabaseError(_)
            | AppError::EmailError(_)
            | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(anyhow::Error::new(err))
    }
}

/// Failure envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (message, details, errors) = match self {
            AppError::ValidationError(err) => (
                "Validation error".to_string(),
                Some(err.to_string()),
                Vec::new(),
            ),
            AppError::BadRequest(err) => (err.to_string(), None, Vec::new()),
            AppError::Rejected {
                message,
                details,
                errors,
            } => (message, details, errors),
            AppError::Unauthorized(err) => (err.to_string(), None, Vec::new()),
            AppError::InternalError(err) => {
                tracing::error!(error = ?err, "Request failed with internal error");
                (
                    "Internal server error".to_string(),
                    Some(format!("{:#}", err)),
                    Vec::new(),
                )
            }
            AppError::DatabaseError(err) => {
                tracing::error!(error = %err, "Request failed with database error");
                ("Database error".to_string(), Some(err.to_string()), Vec::new())
            }
            AppError::EmailError(msg) => (
                "An error occurred while sending mail.".to_string(),
                Some(msg),
                Vec::new(),
            ),
            AppError::ConfigError(err) => (
                "Configuration error".to_string(),
                Some(err.to_string()),
                Vec::new(),
            ),
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                message,
                details,
                errors,
            }),
        )
            .into_response()
    }
}
