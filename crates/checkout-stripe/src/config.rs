//! # Stripe Configuration
//!
//! Configuration for the Stripe integration.
//! Secrets are read from environment variables once, at startup.

use checkout_core::CheckoutError;
use std::env;

/// Default tolerance for webhook signature timestamps (seconds)
pub const DEFAULT_WEBHOOK_TOLERANCE_SECS: u64 = 300;

const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";
const DEFAULT_API_VERSION: &str = "2024-12-18.acacia";

/// Stripe API configuration
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Restricted (rk_...) or secret (sk_...) API key
    pub secret_key: String,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// API version
    pub api_version: String,
}

impl StripeConfig {
    /// Load configuration from environment variables.
    ///
    /// Required: `STRIPE_SECRET_KEY`. Optional: `STRIPE_API_BASE_URL`.
    pub fn from_env() -> Result<Self, CheckoutError> {
        dotenvy::dotenv().ok();

        let secret_key = env::var("STRIPE_SECRET_KEY").map_err(|_| {
            CheckoutError::Configuration("STRIPE_SECRET_KEY not set".to_string())
        })?;
        validate_secret_key(&secret_key)?;

        let mut config = Self::new(secret_key);
        if let Ok(url) = env::var("STRIPE_API_BASE_URL") {
            config = config.with_api_base_url(url);
        }
        Ok(config)
    }

    /// Create config with an explicit key (for testing)
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.secret_key)
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Webhook signing configuration
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Signing secret (whsec_...)
    pub signing_secret: String,

    /// Accepted clock skew between the signature timestamp and now
    pub tolerance_secs: u64,
}

impl WebhookConfig {
    /// Load from `STRIPE_WEBHOOK_SECRET` and `STRIPE_WEBHOOK_TOLERANCE_SECS`
    pub fn from_env() -> Result<Self, CheckoutError> {
        dotenvy::dotenv().ok();

        let signing_secret = env::var("STRIPE_WEBHOOK_SECRET").map_err(|_| {
            CheckoutError::Configuration("STRIPE_WEBHOOK_SECRET not set".to_string())
        })?;

        if !signing_secret.starts_with("whsec_") {
            return Err(CheckoutError::Configuration(
                "STRIPE_WEBHOOK_SECRET must start with whsec_".to_string(),
            ));
        }

        let tolerance_secs = env::var("STRIPE_WEBHOOK_TOLERANCE_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_WEBHOOK_TOLERANCE_SECS);

        Ok(Self {
            signing_secret,
            tolerance_secs,
        })
    }

    pub fn new(signing_secret: impl Into<String>) -> Self {
        Self {
            signing_secret: signing_secret.into(),
            tolerance_secs: DEFAULT_WEBHOOK_TOLERANCE_SECS,
        }
    }

    /// Builder: set timestamp tolerance
    pub fn with_tolerance_secs(mut self, tolerance_secs: u64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }
}

fn validate_secret_key(key: &str) -> Result<(), CheckoutError> {
    const PREFIXES: [&str; 4] = ["rk_test_", "rk_live_", "sk_test_", "sk_live_"];

    if PREFIXES.iter().any(|p| key.starts_with(p)) {
        Ok(())
    } else {
        Err(CheckoutError::Configuration(
            "STRIPE_SECRET_KEY must start with rk_test_, rk_live_, sk_test_ or sk_live_"
                .to_string(),
        ))
    }
}
