//! # Session & Event Types
//!
//! Transient values exchanged with the payment provider: the parameters of a
//! subscription checkout session, the session it returns, and verified
//! webhook events. Nothing here outlives a single request.

use chrono::{DateTime, Utc};

/// Everything the provider needs to open one subscription checkout session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionParams {
    pub price_id: String,
    pub quantity: u32,
    pub customer_email: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
    pub allow_promotion_codes: bool,
    pub automatic_tax: bool,
}

impl SessionParams {
    /// Subscription session with promotion codes on and automatic tax off
    pub fn subscription(
        price_id: impl Into<String>,
        quantity: u32,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> Self {
        Self {
            price_id: price_id.into(),
            quantity,
            customer_email: None,
            success_url: success_url.into(),
            cancel_url: cancel_url.into(),
            allow_promotion_codes: true,
            automatic_tax: false,
        }
    }

    /// Builder: prefill the customer email
    pub fn with_customer_email(mut self, email: Option<String>) -> Self {
        self.customer_email = email;
        self
    }
}

/// A session created by the provider
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    /// Provider session ID (cs_...)
    pub session_id: String,
    /// Hosted checkout page, returned to the caller verbatim
    pub url: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Default redirect targets derived from a base URL
#[derive(Debug, Clone)]
pub struct CheckoutUrls {
    /// Base URL of the front end (e.g., "https://quant.example.com")
    pub base_url: String,
    pub success_path: String,
    pub cancel_path: String,
}

impl CheckoutUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            success_path: "/checkout/success".to_string(),
            cancel_path: "/pricing".to_string(),
        }
    }

    /// Success URL with the provider's session placeholder
    pub fn success_url(&self) -> String {
        format!(
            "{}{}?session_id={{CHECKOUT_SESSION_ID}}",
            self.base_url, self.success_path
        )
    }

    pub fn cancel_url(&self) -> String {
        format!("{}{}", self.base_url, self.cancel_path)
    }
}

/// Event types this service recognizes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventKind {
    CheckoutSessionCompleted,
    SubscriptionCreated,
    InvoicePaid,
    Unhandled(String),
}

impl WebhookEventKind {
    /// Map a provider type tag to a kind
    pub fn from_type_tag(tag: &str) -> Self {
        match tag {
            "checkout.session.completed" => WebhookEventKind::CheckoutSessionCompleted,
            "customer.subscription.created" => WebhookEventKind::SubscriptionCreated,
            "invoice.paid" => WebhookEventKind::InvoicePaid,
            other => WebhookEventKind::Unhandled(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            WebhookEventKind::CheckoutSessionCompleted => "checkout.session.completed",
            WebhookEventKind::SubscriptionCreated => "customer.subscription.created",
            WebhookEventKind::InvoicePaid => "invoice.paid",
            WebhookEventKind::Unhandled(tag) => tag,
        }
    }
}

/// A verified webhook event
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub event_id: String,
    pub kind: WebhookEventKind,
    /// `data.object` of the event, untouched
    pub object: serde_json::Value,
    pub created: DateTime<Utc>,
}

impl WebhookEvent {
    /// The `id` of the object the event is about
    pub fn object_id(&self) -> Option<&str> {
        self.object.get("id").and_then(|v| v.as_str())
    }

    /// String field of the event object
    pub fn object_str(&self, field: &str) -> Option<&str> {
        self.object.get(field).and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_checkout_urls() {
        let urls = CheckoutUrls::new("https://quant.example.com");

        assert_eq!(
            urls.success_url(),
            "https://quant.example.com/checkout/success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(urls.cancel_url(), "https://quant.example.com/pricing");
    }

    #[test]
    fn test_checkout_urls_trailing_slash() {
        let urls = CheckoutUrls::new("https://credit.example.com/");
        assert_eq!(urls.cancel_url(), "https://credit.example.com/pricing");
    }

    #[test]
    fn test_subscription_params() {
        let params = SessionParams::subscription("price_1", 2, "s", "c")
            .with_customer_email(Some("a@b.co".to_string()));

        assert!(params.allow_promotion_codes);
        assert!(!params.automatic_tax);
        assert_eq!(params.quantity, 2);
        assert_eq!(params.customer_email.as_deref(), Some("a@b.co"));
    }

    #[test]
    fn test_event_kind_tags() {
        for tag in [
            "checkout.session.completed",
            "customer.subscription.created",
            "invoice.paid",
            "charge.refunded",
        ] {
            assert_eq!(WebhookEventKind::from_type_tag(tag).as_str(), tag);
        }
        assert_eq!(
            WebhookEventKind::from_type_tag("charge.refunded"),
            WebhookEventKind::Unhandled("charge.refunded".to_string())
        );
    }

    #[test]
    fn test_object_accessors() {
        let event = WebhookEvent {
            event_id: "evt_1".to_string(),
            kind: WebhookEventKind::InvoicePaid,
            object: json!({ "id": "in_1", "customer": "cus_1" }),
            created: Utc::now(),
        };

        assert_eq!(event.object_id(), Some("in_1"));
        assert_eq!(event.object_str("customer"), Some("cus_1"));
        assert_eq!(event.object_str("subscription"), None);
    }
}
