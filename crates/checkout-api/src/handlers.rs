//! # Request Handlers
//!
//! Axum handlers for checkout session creation and the Stripe webhook.
//! The generic and brand-scoped session endpoints share one implementation,
//! parameterized by [`SessionScope`].

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use checkout_core::{brand_base_url_var, CheckoutUrls, SessionParams, DEFAULT_BRAND};
use checkout_stripe::dispatch_webhook_event;
use http_body_util::LengthLimitError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, instrument, warn};

/// Largest webhook body accepted (1 MiB)
pub const MAX_WEBHOOK_BODY_BYTES: usize = 1024 * 1024;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Create session request
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    /// Price to subscribe to (required)
    #[serde(default)]
    pub price_id: Option<String>,
    /// Brand tag, brand-scoped endpoint only (defaults to "quant")
    #[serde(default)]
    pub brand: Option<String>,
    /// Number or numeric string, defaults to 1
    #[serde(default)]
    pub quantity: Option<Value>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub success_url: Option<String>,
    #[serde(default)]
    pub cancel_url: Option<String>,
}

/// Create session response
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    /// Hosted checkout page (redirect user here)
    pub url: String,
}

/// Webhook acknowledgment
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// Which session endpoint is being served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionScope {
    /// Any price, redirects under `BASE_URL`
    Generic,
    /// Price must be on the brand's allow-list, redirects under the brand's base URL
    Branded,
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "checkout-edge",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Any method other than POST on a POST-only endpoint
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Create a subscription checkout session for any price
#[instrument(skip_all)]
pub async fn create_session(
    State(state): State<AppState>,
    payload: Result<Json<SessionRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    create_session_internal(&state, payload, SessionScope::Generic).await
}

/// Create a subscription checkout session for an allow-listed brand price
#[instrument(skip_all)]
pub async fn create_brand_session(
    State(state): State<AppState>,
    payload: Result<Json<SessionRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    create_session_internal(&state, payload, SessionScope::Branded).await
}

/// Shared session creation
async fn create_session_internal(
    state: &AppState,
    payload: Result<Json<SessionRequest>, JsonRejection>,
    scope: SessionScope,
) -> Result<Json<SessionResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| {
        warn!("Rejected session request body: {}", e);
        ApiError::BadRequest("Invalid request body".to_string())
    })?;

    let price_id = non_blank(request.price_id.as_deref())
        .ok_or_else(|| ApiError::BadRequest("Missing priceId".to_string()))?;
    let quantity = parse_quantity(request.quantity.as_ref())?;

    let base_url = match scope {
        SessionScope::Generic => state
            .config
            .base_url
            .as_deref()
            .ok_or_else(|| ApiError::missing_env("BASE_URL"))?,
        SessionScope::Branded => {
            let brand = non_blank(request.brand.as_deref()).unwrap_or(DEFAULT_BRAND);

            if !state.allow_list.is_allowed(brand, price_id) {
                warn!(brand, price_id, "Price not on brand allow-list");
                return Err(ApiError::BadRequest(format!(
                    "Invalid priceId for brand {}",
                    brand
                )));
            }

            state
                .config
                .base_url_for_brand(brand)
                .ok_or_else(|| ApiError::missing_env(brand_base_url_var(brand)))?
        }
    };

    let provider = state.provider.as_ref().ok_or_else(|| {
        if state.secret_key_invalid {
            ApiError::invalid_env("STRIPE_SECRET_KEY")
        } else {
            ApiError::missing_env("STRIPE_SECRET_KEY")
        }
    })?;

    let urls = CheckoutUrls::new(base_url);
    let success_url = non_blank(request.success_url.as_deref())
        .map(String::from)
        .unwrap_or_else(|| urls.success_url());
    let cancel_url = non_blank(request.cancel_url.as_deref())
        .map(String::from)
        .unwrap_or_else(|| urls.cancel_url());

    let params = SessionParams::subscription(price_id, quantity, success_url, cancel_url)
        .with_customer_email(non_blank(request.customer_email.as_deref()).map(String::from));

    info!(
        scope = ?scope,
        price_id,
        quantity,
        provider = provider.provider_name(),
        "Creating checkout session"
    );

    let session = provider.create_session(&params).await.map_err(|e| {
        error!("Failed to create checkout session: {}", e);
        ApiError::SessionFailed
    })?;

    info!(
        session_id = %session.session_id,
        expires_at = ?session.expires_at,
        "Created checkout session"
    );

    Ok(Json(SessionResponse { url: session.url }))
}

/// Handle a Stripe webhook.
///
/// The body is taken as a raw [`Body`] so nothing parses it before the
/// signature check, and it is not read at all when no secret is configured.
#[instrument(skip_all)]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<WebhookAck>, ApiError> {
    let verifier = state.webhook_verifier.as_ref().ok_or_else(|| {
        error!("STRIPE_WEBHOOK_SECRET is not configured");
        ApiError::WebhookMisconfigured
    })?;

    let payload = axum::body::to_bytes(body, MAX_WEBHOOK_BODY_BYTES)
        .await
        .map_err(|e| {
            let e = e.into_inner();
            if e.downcast_ref::<LengthLimitError>().is_some() {
                warn!(limit = MAX_WEBHOOK_BODY_BYTES, "Webhook body too large");
                ApiError::PayloadTooLarge
            } else {
                error!("Failed to read webhook body: {}", e);
                ApiError::Internal
            }
        })?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            warn!("Webhook without Stripe-Signature header");
            ApiError::WebhookRejected("No stripe-signature header value was provided".to_string())
        })?;

    let event = verifier
        .verify_event(&payload, signature)
        .await
        .map_err(|e| {
            if e.is_webhook_rejection() {
                warn!("Webhook verification failed: {}", e);
                ApiError::WebhookRejected(e.to_string())
            } else {
                error!("Webhook verification error: {}", e);
                ApiError::Internal
            }
        })?;

    info!(
        event_id = %event.event_id,
        event_type = event.kind.as_str(),
        created = %event.created,
        "Received webhook"
    );

    dispatch_webhook_event(state.webhook_handler.as_ref(), &event).map_err(|e| {
        error!(event_id = %event.event_id, "Webhook handler error: {}", e);
        ApiError::Internal
    })?;

    Ok(Json(WebhookAck { received: true }))
}

// =============================================================================
// Input Helpers
// =============================================================================

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Absent or null means 1; numbers and numeric strings must be positive integers
fn parse_quantity(value: Option<&Value>) -> Result<u32, ApiError> {
    let invalid = || ApiError::BadRequest("Invalid quantity".to_string());

    let quantity = match value {
        None | Some(Value::Null) => return Ok(1),
        Some(Value::Number(n)) => match (n.as_u64(), n.as_f64()) {
            (Some(q), _) => q,
            (None, Some(f)) if f.fract() == 0.0 && f >= 1.0 && f <= u32::MAX as f64 => f as u64,
            _ => return Err(invalid()),
        },
        Some(Value::String(s)) => s.trim().parse::<u64>().map_err(|_| invalid())?,
        Some(_) => return Err(invalid()),
    };

    match u32::try_from(quantity) {
        Ok(q) if q >= 1 => Ok(q),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_quantity_defaults() {
        assert_eq!(parse_quantity(None).unwrap(), 1);
        assert_eq!(parse_quantity(Some(&Value::Null)).unwrap(), 1);
    }

    #[test]
    fn test_parse_quantity_coerces() {
        assert_eq!(parse_quantity(Some(&json!(3))).unwrap(), 3);
        assert_eq!(parse_quantity(Some(&json!("4"))).unwrap(), 4);
        assert_eq!(parse_quantity(Some(&json!(" 5 "))).unwrap(), 5);
        assert_eq!(parse_quantity(Some(&json!(2.0))).unwrap(), 2);
    }

    #[test]
    fn test_parse_quantity_rejects() {
        for bad in [json!(0), json!(-1), json!(1.5), json!("abc"), json!(true), json!([1])] {
            assert!(parse_quantity(Some(&bad)).is_err(), "accepted {bad}");
        }
    }

    #[test]
    fn test_request_field_names() {
        let request: SessionRequest = serde_json::from_value(json!({
            "priceId": "price_1",
            "brand": "credit",
            "quantity": 2,
            "customerEmail": "a@b.co",
            "successUrl": "https://s",
            "cancelUrl": "https://c"
        }))
        .unwrap();

        assert_eq!(request.price_id.as_deref(), Some("price_1"));
        assert_eq!(request.brand.as_deref(), Some("credit"));
        assert_eq!(request.customer_email.as_deref(), Some("a@b.co"));
        assert_eq!(request.success_url.as_deref(), Some("https://s"));
        assert_eq!(request.cancel_url.as_deref(), Some("https://c"));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("x")), Some("x"));
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(None), None);
    }
}
