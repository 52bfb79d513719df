use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::application::usecases::subscriptions::SubscriptionError;
use crate::domain::value_objects::payments::ClassifiedError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_code: Option<String>,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{}", .error.user_message)]
    Gateway {
        status: StatusCode,
        error: ClassifiedError,
    },

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<SubscriptionError> for AppError {
    fn from(err: SubscriptionError) -> Self {
        let status = err.status_code();
        match err {
            SubscriptionError::Validation(message) => AppError::BadRequest(message),
            SubscriptionError::Gateway(error) => AppError::Gateway { status, error },
            SubscriptionError::Internal(error) => AppError::Internal(error),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, gateway_code) = match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string(), None),
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message, None),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message, None),
            AppError::Gateway { status, error } => (status, error.user_message, error.code),
            AppError::Internal(_) => {
                // Don't leak internal error detail to client
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            code: status.as_u16(),
            message,
            gateway_code,
        });

        (status, body).into_response()
    }
}
