use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

use crate::schemas::ValidationError;
use crate::store::StoreError;

// ============================================================================
// HTTP Error Mapping
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Validation(err) => json!({
                "error": "validation_error",
                "field": err.field,
                "reason": err.reason,
            }),
            ApiError::Store(err) => json!({
                "error": "store_unavailable",
                "detail": err.to_string(),
            }),
            ApiError::BadRequest(detail) => json!({
                "error": "bad_request",
                "detail": detail,
            }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
