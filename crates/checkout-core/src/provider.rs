//! # Provider Traits
//!
//! The two narrow seams between the HTTP layer and the payment provider.
//!
//! ```text
//! ┌───────────────────────────┐   ┌───────────────────────────┐
//! │ CheckoutProvider (trait)  │   │ WebhookVerifier (trait)   │
//! │  └── create_session()     │   │  └── verify_event()       │
//! └─────────────▲─────────────┘   └─────────────▲─────────────┘
//!               │                               │
//!     ┌─────────┴──────────┐        ┌───────────┴───────────┐
//!     │ StripeCheckout     │        │ StripeWebhookVerifier │
//!     │ Provider           │        │                       │
//!     └────────────────────┘        └───────────────────────┘
//! ```
//!
//! Validation and dispatch live outside these traits, so tests swap in
//! mocks without any network.

use crate::error::CheckoutResult;
use crate::session::{CheckoutSession, SessionParams, WebhookEvent};
use async_trait::async_trait;
use std::sync::Arc;

/// Creates hosted checkout sessions.
#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    /// Create one checkout session. Exactly one remote call, no retries.
    async fn create_session(&self, params: &SessionParams) -> CheckoutResult<CheckoutSession>;

    /// Provider name (for logging)
    fn provider_name(&self) -> &'static str;
}

/// Verifies signed webhook payloads and parses them into events.
#[async_trait]
pub trait WebhookVerifier: Send + Sync {
    /// Verify `payload` (exact raw bytes as received) against `signature`
    /// and parse the event.
    async fn verify_event(&self, payload: &[u8], signature: &str) -> CheckoutResult<WebhookEvent>;

    /// Provider name (for logging)
    fn provider_name(&self) -> &'static str;
}

/// Shared checkout provider (dynamic dispatch)
pub type BoxedCheckoutProvider = Arc<dyn CheckoutProvider>;

/// Shared webhook verifier (dynamic dispatch)
pub type BoxedWebhookVerifier = Arc<dyn WebhookVerifier>;
