//! # checkout-stripe
//!
//! Stripe implementation of the checkout-edge provider traits.
//!
//! - **StripeCheckoutProvider** creates subscription Checkout Sessions
//!   (`POST /v1/checkout/sessions`).
//! - **StripeWebhookVerifier** checks `Stripe-Signature` headers against the
//!   raw request body and parses the event.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use checkout_stripe::StripeCheckoutProvider;
//! use checkout_core::{CheckoutProvider, SessionParams};
//!
//! let provider = StripeCheckoutProvider::from_env()?;
//! let session = provider
//!     .create_session(&SessionParams::subscription("price_123", 1, success, cancel))
//!     .await?;
//! ```
//!
//! ## Webhook Handling
//!
//! ```rust,ignore
//! use checkout_stripe::{dispatch_webhook_event, LoggingWebhookHandler, StripeWebhookVerifier};
//!
//! let verifier = StripeWebhookVerifier::from_env()?;
//! let event = verifier.verify_event(&raw_body, signature).await?;
//! dispatch_webhook_event(&LoggingWebhookHandler, &event)?;
//! ```

pub mod checkout;
pub mod config;
pub mod webhook;

// Re-exports
pub use checkout::StripeCheckoutProvider;
pub use config::{StripeConfig, WebhookConfig, DEFAULT_WEBHOOK_TOLERANCE_SECS};
pub use webhook::{
    dispatch_webhook_event, signature_header, LoggingWebhookHandler, StripeWebhookVerifier,
    WebhookHandler,
};
