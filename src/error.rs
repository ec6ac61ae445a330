use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use sea_orm::DbErr;
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;

/// Field name to the messages raised against it, rendered as-is in 400 bodies.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("{0}")]
    BadRequest(String),

    /// Toggle conflicts and self-subscription.
    #[error("{0}")]
    Conflict(String),

    #[error("Authentication credentials were not provided.")]
    Unauthenticated,

    #[error("You do not have permission to perform this action.")]
    Forbidden,

    #[error("Not found.")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("render error: {0}")]
    Render(#[from] crate::services::shopping_list::RenderError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        ApiError::Validation(errors)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) | ApiError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Render(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        match self {
            ApiError::Validation(errors) => builder.json(errors),
            ApiError::Conflict(reason) => builder.json(json!({ "errors": reason })),
            ApiError::Database(e) => {
                log::error!("Database error: {:?}", e);
                builder.json(json!({ "detail": "Internal server error." }))
            }
            ApiError::Render(e) => {
                log::error!("Failed to render document: {:?}", e);
                builder.json(json!({ "detail": "Internal server error." }))
            }
            ApiError::Internal(e) => {
                log::error!("Internal error: {:?}", e);
                builder.json(json!({ "detail": "Internal server error." }))
            }
            other => builder.json(json!({ "detail": other.to_string() })),
        }
    }
}
