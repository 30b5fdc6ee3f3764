//! # checkout-core
//!
//! Core types and traits for checkout-edge.
//!
//! This crate provides:
//! - `CheckoutProvider` and `WebhookVerifier` traits for the payment provider
//! - `SessionParams`, `CheckoutSession` and `CheckoutUrls` for session creation
//! - `WebhookEvent` and `WebhookEventKind` for verified webhook events
//! - `PriceAllowList` for brand-scoped price validation
//! - `CheckoutError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use checkout_core::{CheckoutUrls, SessionParams, CheckoutProvider};
//!
//! let urls = CheckoutUrls::new("https://quant.example.com");
//! let params = SessionParams::subscription("price_123", 1, urls.success_url(), urls.cancel_url());
//!
//! let session = provider.create_session(&params).await?;
//! // Redirect user to session.url
//! ```

pub mod brand;
pub mod error;
pub mod provider;
pub mod session;

// Re-exports for convenience
pub use brand::{brand_base_url_var, BrandPrices, PriceAllowList, DEFAULT_BRAND};
pub use error::{CheckoutError, CheckoutResult};
pub use provider::{BoxedCheckoutProvider, BoxedWebhookVerifier, CheckoutProvider, WebhookVerifier};
pub use session::{
    CheckoutSession, CheckoutUrls, SessionParams, WebhookEvent, WebhookEventKind,
};
