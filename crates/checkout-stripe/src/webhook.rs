//! # Stripe Webhook Handling
//!
//! Signature verification for `Stripe-Signature` headers and dispatch of
//! verified events to a [`WebhookHandler`].
//!
//! Stripe signs `"{timestamp}.{raw body}"` with HMAC-SHA256 and sends
//! `t=<timestamp>,v1=<hex signature>[,v1=...]`. The body must be the exact
//! bytes received; re-serialized JSON will not verify.

use crate::config::WebhookConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use checkout_core::{
    CheckoutError, CheckoutResult, WebhookEvent, WebhookEventKind, WebhookVerifier,
};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, info, instrument, warn};

type HmacSha256 = Hmac<Sha256>;

/// Verifies Stripe webhook signatures with a shared signing secret
pub struct StripeWebhookVerifier {
    config: WebhookConfig,
}

impl StripeWebhookVerifier {
    pub fn new(config: WebhookConfig) -> Self {
        Self { config }
    }

    /// Create from environment variables
    pub fn from_env() -> CheckoutResult<Self> {
        Ok(Self::new(WebhookConfig::from_env()?))
    }

    /// Verify against an explicit clock (seconds since epoch)
    fn verify_at(&self, payload: &[u8], signature: &str, now: i64) -> CheckoutResult<WebhookEvent> {
        let header = parse_signature_header(signature)?;

        let expected = compute_signature(&self.config.signing_secret, header.timestamp, payload)?;
        let matched = header
            .signatures
            .iter()
            .any(|sig| constant_time_compare(sig, &expected));

        if !matched {
            return Err(CheckoutError::WebhookVerificationFailed(
                "No signatures found matching the expected signature for payload".to_string(),
            ));
        }

        if now.abs_diff(header.timestamp) > self.config.tolerance_secs {
            return Err(CheckoutError::WebhookVerificationFailed(
                "Timestamp outside the tolerance zone".to_string(),
            ));
        }

        parse_event(payload)
    }
}

#[async_trait]
impl WebhookVerifier for StripeWebhookVerifier {
    #[instrument(skip(self, payload, signature), fields(bytes = payload.len()))]
    async fn verify_event(&self, payload: &[u8], signature: &str) -> CheckoutResult<WebhookEvent> {
        self.verify_at(payload, signature, Utc::now().timestamp())
    }

    fn provider_name(&self) -> &'static str {
        "stripe"
    }
}

/// Build a valid `Stripe-Signature` header value for `payload`.
///
/// Used by tests and local tooling to produce signed requests.
pub fn signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> CheckoutResult<String> {
    let signature = compute_signature(secret, timestamp, payload)?;
    Ok(format!("t={},v1={}", timestamp, signature))
}

// =============================================================================
// Event Dispatch
// =============================================================================

/// Webhook event handler trait
///
/// Every hook defaults to logging only. Override the ones that need to act.
pub trait WebhookHandler: Send + Sync {
    /// Called for `checkout.session.completed`
    fn on_checkout_session_completed(&self, event: &WebhookEvent) -> CheckoutResult<()> {
        info!(
            event_id = %event.event_id,
            session_id = ?event.object_id(),
            customer = ?event.object_str("customer"),
            subscription = ?event.object_str("subscription"),
            "Checkout session completed"
        );
        Ok(())
    }

    /// Called for `customer.subscription.created`
    fn on_subscription_created(&self, event: &WebhookEvent) -> CheckoutResult<()> {
        info!(
            event_id = %event.event_id,
            subscription_id = ?event.object_id(),
            status = ?event.object_str("status"),
            "Subscription created"
        );
        Ok(())
    }

    /// Called for `invoice.paid`
    fn on_invoice_paid(&self, event: &WebhookEvent) -> CheckoutResult<()> {
        info!(
            event_id = %event.event_id,
            invoice_id = ?event.object_id(),
            subscription = ?event.object_str("subscription"),
            "Invoice paid"
        );
        Ok(())
    }

    /// Called for every other event type
    fn on_unhandled(&self, event: &WebhookEvent) -> CheckoutResult<()> {
        warn!(
            event_id = %event.event_id,
            event_type = event.kind.as_str(),
            "Unhandled webhook event type"
        );
        Ok(())
    }
}

/// Default handler: logs and acknowledges everything
pub struct LoggingWebhookHandler;

impl WebhookHandler for LoggingWebhookHandler {}

/// Dispatch a verified event to the matching hook
pub fn dispatch_webhook_event(
    handler: &dyn WebhookHandler,
    event: &WebhookEvent,
) -> CheckoutResult<()> {
    match &event.kind {
        WebhookEventKind::CheckoutSessionCompleted => handler.on_checkout_session_completed(event),
        WebhookEventKind::SubscriptionCreated => handler.on_subscription_created(event),
        WebhookEventKind::InvoicePaid => handler.on_invoice_paid(event),
        WebhookEventKind::Unhandled(_) => handler.on_unhandled(event),
    }
}

// =============================================================================
// Signature Verification
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripeWebhookEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    created: i64,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Value,
}

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

fn parse_signature_header(header: &str) -> CheckoutResult<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse().ok(),
            "v1" => signatures.push(value.to_string()),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        CheckoutError::WebhookVerificationFailed(
            "Unable to extract timestamp and signatures from header".to_string(),
        )
    })?;

    if signatures.is_empty() {
        return Err(CheckoutError::WebhookVerificationFailed(
            "No signatures found with expected scheme".to_string(),
        ));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> CheckoutResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| CheckoutError::Configuration(format!("Invalid webhook secret: {}", e)))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}

fn parse_event(payload: &[u8]) -> CheckoutResult<WebhookEvent> {
    let event: StripeWebhookEvent = serde_json::from_slice(payload).map_err(|e| {
        CheckoutError::WebhookParseError(format!("Invalid event payload: {}", e))
    })?;

    debug!("Verified Stripe webhook: type={}", event.event_type);

    Ok(WebhookEvent {
        event_id: event.id,
        kind: WebhookEventKind::from_type_tag(&event.event_type),
        object: event.data.object,
        created: DateTime::from_timestamp(event.created, 0).unwrap_or_else(Utc::now),
    })
}
