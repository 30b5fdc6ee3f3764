//! # Stripe Checkout Sessions
//!
//! Subscription checkout sessions over the Stripe REST API
//! (`POST /v1/checkout/sessions`, form-encoded).

use crate::config::StripeConfig;
use async_trait::async_trait;
use chrono::DateTime;
use checkout_core::{CheckoutError, CheckoutProvider, CheckoutResult, CheckoutSession, SessionParams};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

/// Stripe Checkout Session provider
///
/// Uses Stripe's hosted checkout page; card data never touches this service.
pub struct StripeCheckoutProvider {
    config: StripeConfig,
    client: Client,
}

impl StripeCheckoutProvider {
    /// Create a new provider with a 30s request timeout
    pub fn new(config: StripeConfig) -> CheckoutResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| {
                CheckoutError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> CheckoutResult<Self> {
        Self::new(StripeConfig::from_env()?)
    }

    /// Form fields for the session request
    fn form_params(params: &SessionParams) -> Vec<(String, String)> {
        let mut form = vec![
            ("mode".to_string(), "subscription".to_string()),
            ("line_items[0][price]".to_string(), params.price_id.clone()),
            (
                "line_items[0][quantity]".to_string(),
                params.quantity.to_string(),
            ),
            ("success_url".to_string(), params.success_url.clone()),
            ("cancel_url".to_string(), params.cancel_url.clone()),
            (
                "allow_promotion_codes".to_string(),
                params.allow_promotion_codes.to_string(),
            ),
            (
                "automatic_tax[enabled]".to_string(),
                params.automatic_tax.to_string(),
            ),
        ];

        if let Some(ref email) = params.customer_email {
            form.push(("customer_email".to_string(), email.clone()));
        }

        form
    }
}

#[async_trait]
impl CheckoutProvider for StripeCheckoutProvider {
    #[instrument(skip(self, params), fields(price_id = %params.price_id, quantity = params.quantity))]
    async fn create_session(&self, params: &SessionParams) -> CheckoutResult<CheckoutSession> {
        if params.price_id.is_empty() {
            return Err(CheckoutError::InvalidRequest("Missing price".to_string()));
        }

        let form = Self::form_params(params);
        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);

        debug!("Creating Stripe checkout session");

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .form(&form)
            .send()
            .await
            .map_err(|e| CheckoutError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CheckoutError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("Stripe API error: status={}, body={}", status, body);

            if let Ok(error_response) = serde_json::from_str::<StripeErrorResponse>(&body) {
                return Err(CheckoutError::ProviderError {
                    provider: "stripe".to_string(),
                    message: error_response.error.message,
                });
            }

            return Err(CheckoutError::ProviderError {
                provider: "stripe".to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let session: StripeCheckoutSessionResponse = serde_json::from_str(&body).map_err(|e| {
            CheckoutError::Serialization(format!("Failed to parse Stripe response: {}", e))
        })?;

        let url = session.url.ok_or_else(|| CheckoutError::ProviderError {
            provider: "stripe".to_string(),
            message: format!("Session {} has no url", session.id),
        })?;

        info!("Created Stripe checkout session: id={}", session.id);

        Ok(CheckoutSession {
            session_id: session.id,
            url,
            expires_at: session
                .expires_at
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
        })
    }

    fn provider_name(&self) -> &'static str {
        "stripe"
    }
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripeCheckoutSessionResponse {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn params() -> SessionParams {
        SessionParams::subscription(
            "price_quant_monthly",
            3,
            "https://quant.example.com/checkout/success?session_id={CHECKOUT_SESSION_ID}",
            "https://quant.example.com/pricing",
        )
    }

    fn provider(server: &MockServer) -> StripeCheckoutProvider {
        let config = StripeConfig::new("rk_test_abc").with_api_base_url(server.uri());
        StripeCheckoutProvider::new(config).unwrap()
    }

    #[test]
    fn test_form_params() {
        let form = StripeCheckoutProvider::form_params(
            &params().with_customer_email(Some("buyer@example.com".to_string())),
        );
        let get = |key: &str| {
            form.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("mode"), Some("subscription"));
        assert_eq!(get("line_items[0][price]"), Some("price_quant_monthly"));
        assert_eq!(get("line_items[0][quantity]"), Some("3"));
        assert_eq!(get("allow_promotion_codes"), Some("true"));
        assert_eq!(get("automatic_tax[enabled]"), Some("false"));
        assert_eq!(get("customer_email"), Some("buyer@example.com"));
        assert_eq!(get("cancel_url"), Some("https://quant.example.com/pricing"));
    }

    #[test]
    fn test_form_params_without_email() {
        let form = StripeCheckoutProvider::form_params(&params());
        assert!(form.iter().all(|(k, _)| k != "customer_email"));
    }

    #[tokio::test]
    async fn test_create_session_returns_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .and(header("authorization", "Bearer rk_test_abc"))
            .and(body_string_contains("mode=subscription"))
            .and(body_string_contains("price_quant_monthly"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cs_test_123",
                "url": "https://checkout.stripe.com/c/pay/cs_test_123",
                "expires_at": 1_900_000_000
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = provider(&server).create_session(&params()).await.unwrap();

        assert_eq!(session.session_id, "cs_test_123");
        assert_eq!(session.url, "https://checkout.stripe.com/c/pay/cs_test_123");
        assert!(session.expires_at.is_some());
    }

    #[tokio::test]
    async fn test_create_session_provider_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "message": "No such price: 'price_quant_monthly'", "type": "invalid_request_error" }
            })))
            .mount(&server)
            .await;

        let err = provider(&server).create_session(&params()).await.unwrap_err();

        match err {
            CheckoutError::ProviderError { provider, message } => {
                assert_eq!(provider, "stripe");
                assert!(message.contains("No such price"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_session_unparseable_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = provider(&server).create_session(&params()).await.unwrap_err();
        assert!(err.to_string().contains("bad gateway"));
    }

    #[tokio::test]
    async fn test_create_session_without_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "cs_test_9" })))
            .mount(&server)
            .await;

        let err = provider(&server).create_session(&params()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::ProviderError { .. }));
    }

    #[tokio::test]
    async fn test_create_session_network_error() {
        let config = StripeConfig::new("rk_test_abc").with_api_base_url("http://127.0.0.1:1");
        let provider = StripeCheckoutProvider::new(config).unwrap();

        let err = provider.create_session(&params()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::NetworkError(_)));
    }
}
