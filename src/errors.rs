use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Standard error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Input parse error: {0}")]
    InputParse(String),

    #[error("External service error: {0}")]
    ExternalService(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::InputParse(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::ExternalService(msg) => {
                tracing::error!("External service error: {}", msg);
                (StatusCode::BAD_GATEWAY, msg.clone())
            }
        };

        (status, axum::Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<crate::services::gazetteer::GazetteerError> for AppError {
    fn from(err: crate::services::gazetteer::GazetteerError) -> Self {
        AppError::InputParse(format!("Gazetteer CSV: {}", err))
    }
}

impl From<crate::services::congestion::CongestionError> for AppError {
    fn from(err: crate::services::congestion::CongestionError) -> Self {
        AppError::InputParse(format!("Congestion CSV: {}", err))
    }
}

impl From<crate::services::risk::IncidentError> for AppError {
    fn from(err: crate::services::risk::IncidentError) -> Self {
        AppError::InputParse(format!("Incident CSV: {}", err))
    }
}
