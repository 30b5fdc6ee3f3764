//! # API Errors
//!
//! Every failure an endpoint can answer with, and the JSON body it is
//! rendered as. Provider detail is logged where the error is raised and
//! never copied into the response, except for webhook verification failures.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::any::Any;
use thiserror::Error;
use tracing::error;

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    /// Client input error; the message is shown to the caller as-is
    #[error("{0}")]
    BadRequest(String),

    /// A required environment value is missing
    #[error("Missing {0} env")]
    MissingEnv(String),

    /// A required environment value is set but unusable
    #[error("Invalid {0} env")]
    InvalidEnv(String),

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Webhook misconfigured")]
    WebhookMisconfigured,

    #[error("Failed to create session")]
    SessionFailed,

    /// Webhook signature or payload rejected
    #[error("Webhook Error: {0}")]
    WebhookRejected(String),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::BadRequest(_) | ApiError::WebhookRejected(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::MissingEnv(_)
            | ApiError::InvalidEnv(_)
            | ApiError::WebhookMisconfigured
            | ApiError::SessionFailed
            | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Missing configuration, logged with the variable name
    pub fn missing_env(var: impl Into<String>) -> Self {
        let var = var.into();
        error!(var = %var, "Required configuration is missing");
        ApiError::MissingEnv(var)
    }

    /// Configuration present but rejected at startup
    pub fn invalid_env(var: impl Into<String>) -> Self {
        let var = var.into();
        error!(var = %var, "Required configuration is invalid");
        ApiError::InvalidEnv(var)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse::new(self.to_string(), status.as_u16()));

        match self {
            ApiError::MethodNotAllowed => (status, [(header::ALLOW, "POST")], body).into_response(),
            _ => (status, body).into_response(),
        }
    }
}

/// Response for a handler that panicked
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    error!(panic = %detail, "Request handler panicked");
    ApiError::Internal.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response() {
        let err = ErrorResponse::new("Test error", 400);
        assert_eq!(err.error, "Test error");
        assert_eq!(err.code, 400);
    }

    #[test]
    fn test_messages() {
        assert_eq!(ApiError::MissingEnv("BASE_URL".into()).to_string(), "Missing BASE_URL env");
        assert_eq!(
            ApiError::WebhookRejected("Timestamp outside the tolerance zone".into()).to_string(),
            "Webhook Error: Timestamp outside the tolerance zone"
        );
        assert_eq!(ApiError::SessionFailed.to_string(), "Failed to create session");
        assert_eq!(
            ApiError::InvalidEnv("STRIPE_SECRET_KEY".into()).to_string(),
            "Invalid STRIPE_SECRET_KEY env"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::MethodNotAllowed.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            ApiError::BadRequest("Missing priceId".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::WebhookRejected("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::WebhookMisconfigured.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::SessionFailed.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::PayloadTooLarge.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            ApiError::InvalidEnv("STRIPE_SECRET_KEY".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_method_not_allowed_sets_allow_header() {
        let response = ApiError::MethodNotAllowed.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(header::ALLOW).unwrap(), "POST");
    }

    #[test]
    fn test_panic_response() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
