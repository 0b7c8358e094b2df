use crate::domain::error::AuditError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

pub enum ApiError {
    Domain(AuditError),
    Unauthorized,
    Forbidden,
}

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        Self::Domain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "missing or invalid auth token".to_string(),
            ),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "forbidden",
                "collection is read-only".to_string(),
            ),
            Self::Domain(AuditError::Validation(msg)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                msg.clone(),
            ),
            Self::Domain(err @ AuditError::CollectionNotFound(_))
            | Self::Domain(err @ AuditError::RecordNotFound { .. }) => {
                (StatusCode::NOT_FOUND, "not_found", err.to_string())
            }
            Self::Domain(err) => {
                tracing::error!("internal error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error_code": error_code,
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}
