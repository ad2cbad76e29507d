use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::error::Error;

/// Body of every failed response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

/// Failures at the HTTP boundary
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("Too many requests")]
    TooManyRequests { retry_after_secs: u64 },

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(&'static str),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(Error::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Core(Error::Persistence(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Core(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Client facing text; provider detail stays in the logs
    fn message(&self) -> String {
        match self {
            ApiError::Core(Error::InvalidInput(msg)) => msg.clone(),
            ApiError::Core(Error::Misconfigured(_)) => {
                "Recipe generation service is unavailable. Please try again later.".to_string()
            }
            ApiError::Core(Error::RateLimited { .. }) => {
                "Request limit reached. Please try again in a few minutes.".to_string()
            }
            ApiError::Core(Error::MalformedResponse(_)) => {
                "The AI service produced an invalid response. Please try again.".to_string()
            }
            ApiError::Core(Error::ProviderUnavailable(_)) => {
                "Could not reach the AI service. Please try again.".to_string()
            }
            ApiError::Core(Error::Persistence(_)) => {
                "Failed to process the request. Please try again.".to_string()
            }
            ApiError::BadRequest(_) => "Invalid request body".to_string(),
            ApiError::Unauthorized(msg) => msg.to_string(),
            ApiError::TooManyRequests { .. } => {
                "Too many requests. Please slow down.".to_string()
            }
            ApiError::ServiceUnavailable(msg) => msg.to_string(),
        }
    }

    fn retry_after(&self) -> Option<u64> {
        match self {
            ApiError::Core(Error::RateLimited { retry_after_secs }) => *retry_after_secs,
            ApiError::TooManyRequests { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let body = ErrorResponse {
            success: false,
            message: self.message(),
        };
        let mut response = (status, Json(body)).into_response();

        if let Some(secs) = self.retry_after() {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
