use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uniride_core::{CoreError, StoreError};
use uniride_domain::NegotiationError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    TransitionError(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::TransitionError(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::TripNotFound(_) | CoreError::ReservationNotFound(_) => {
                AppError::NotFoundError(err.to_string())
            }
            CoreError::Forbidden(msg) => AppError::AuthorizationError(msg.to_string()),
            CoreError::Negotiation(NegotiationError::InvalidCoordinate { .. }) => {
                AppError::ValidationError(err.to_string())
            }
            CoreError::Negotiation(NegotiationError::InvalidTransition { .. }) => {
                AppError::TransitionError(err.to_string())
            }
            CoreError::Store(StoreError::Conflict(_)) | CoreError::Store(StoreError::Duplicate { .. }) => {
                AppError::ConflictError(err.to_string())
            }
            CoreError::Store(StoreError::NotFound(_)) => AppError::NotFoundError(err.to_string()),
            CoreError::Store(StoreError::Backend(msg)) => AppError::InternalServerError(msg),
        }
    }
}

impl From<NegotiationError> for AppError {
    fn from(err: NegotiationError) -> Self {
        AppError::from(CoreError::Negotiation(err))
    }
}
