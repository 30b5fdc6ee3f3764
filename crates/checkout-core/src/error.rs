//! # Checkout Error Types
//!
//! Typed error handling for provider-facing operations.
//! Everything that talks to the payment provider returns `Result<T, CheckoutError>`.

use thiserror::Error;

/// Core error type for provider operations
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid session parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Payment provider rejected the call
    #[error("Provider error [{provider}]: {message}")]
    ProviderError { provider: String, message: String },

    /// Network/HTTP error communicating with provider
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Webhook signature verification failed
    #[error("{0}")]
    WebhookVerificationFailed(String),

    /// Webhook payload could not be parsed
    #[error("{0}")]
    WebhookParseError(String),

    /// Failure inside a webhook event hook
    #[error("Webhook handler error: {0}")]
    WebhookHandler(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CheckoutError {
    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            CheckoutError::Configuration(_) => 500,
            CheckoutError::InvalidRequest(_) => 400,
            CheckoutError::ProviderError { .. } => 500,
            CheckoutError::NetworkError(_) => 500,
            CheckoutError::WebhookVerificationFailed(_) => 400,
            CheckoutError::WebhookParseError(_) => 400,
            CheckoutError::WebhookHandler(_) => 500,
            CheckoutError::Serialization(_) => 500,
        }
    }

    /// Webhook rejections are the sender's problem, not ours
    pub fn is_webhook_rejection(&self) -> bool {
        matches!(
            self,
            CheckoutError::WebhookVerificationFailed(_) | CheckoutError::WebhookParseError(_)
        )
    }
}

/// Result type alias for provider operations
pub type CheckoutResult<T> = Result<T, CheckoutError>;
