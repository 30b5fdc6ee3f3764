//! # Application State
//!
//! Configuration read once at startup plus the provider handles every
//! request shares. Nothing in here changes after `AppState::new`.

use checkout_core::{
    brand_base_url_var, BoxedCheckoutProvider, BoxedWebhookVerifier, PriceAllowList,
    DEFAULT_BRAND,
};
use checkout_stripe::{LoggingWebhookHandler, StripeCheckoutProvider, StripeWebhookVerifier, WebhookHandler};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Where the price allow-list is looked for when `PRICE_ALLOWLIST_PATH` is unset
const DEFAULT_ALLOWLIST_PATHS: [&str; 3] = [
    "config/brands.toml",
    "../config/brands.toml",
    "../../config/brands.toml",
];

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Generic base URL for redirects (`BASE_URL`), also the brand fallback
    pub base_url: Option<String>,
    /// Per-brand base URLs (`{BRAND}_BASE_URL`)
    pub brand_base_urls: HashMap<String, String>,
    /// Candidate allow-list files, first existing one wins
    pub allowlist_paths: Vec<String>,
}

impl AppConfig {
    /// Load from environment variables.
    ///
    /// Missing values are not errors here; each endpoint reports the
    /// configuration it needs when it is called.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let allowlist_paths = match env_value("PRICE_ALLOWLIST_PATH") {
            Some(path) => vec![path],
            None => DEFAULT_ALLOWLIST_PATHS.iter().map(|p| p.to_string()).collect(),
        };

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            base_url: env_value("BASE_URL"),
            brand_base_urls: HashMap::new(),
            allowlist_paths,
        }
    }

    /// Read `{BRAND}_BASE_URL` for each brand
    pub fn load_brand_base_urls<'a>(&mut self, brands: impl IntoIterator<Item = &'a str>) {
        for brand in brands {
            if let Some(url) = env_value(&brand_base_url_var(brand)) {
                self.brand_base_urls.insert(brand.to_string(), url);
            }
        }
    }

    /// Builder: set the generic base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builder: set a brand base URL
    pub fn with_brand_base_url(mut self, brand: impl Into<String>, url: impl Into<String>) -> Self {
        self.brand_base_urls.insert(brand.into(), url.into());
        self
    }

    /// The brand's own base URL, else the generic fallback
    pub fn base_url_for_brand(&self, brand: &str) -> Option<&str> {
        self.brand_base_urls
            .get(brand)
            .map(String::as_str)
            .or(self.base_url.as_deref())
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            environment: "development".to_string(),
            base_url: None,
            brand_base_urls: HashMap::new(),
            allowlist_paths: Vec::new(),
        }
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: Arc<AppConfig>,
    /// Brand -> permitted prices
    pub allow_list: Arc<PriceAllowList>,
    /// Session creation; `None` when no usable API key is configured
    pub provider: Option<BoxedCheckoutProvider>,
    /// `STRIPE_SECRET_KEY` was set but rejected at startup
    pub secret_key_invalid: bool,
    /// Webhook verification; `None` when no signing secret is configured
    pub webhook_verifier: Option<BoxedWebhookVerifier>,
    /// Hooks invoked for verified events
    pub webhook_handler: Arc<dyn WebhookHandler>,
}

impl AppState {
    /// Build state from the environment and the allow-list file
    pub fn new() -> anyhow::Result<Self> {
        let mut config = AppConfig::from_env();

        let allow_list = PriceAllowList::load(config.allowlist_paths.as_slice())
            .map_err(|e| anyhow::anyhow!(e))?;

        let mut brands = allow_list.brand_ids();
        if !brands.contains(&DEFAULT_BRAND) {
            brands.push(DEFAULT_BRAND);
        }
        config.load_brand_base_urls(brands);

        let mut secret_key_invalid = false;
        let provider = match StripeCheckoutProvider::from_env() {
            Ok(provider) => Some(Arc::new(provider) as BoxedCheckoutProvider),
            Err(e) => {
                warn!("Stripe checkout unavailable: {}", e);
                secret_key_invalid = env_value("STRIPE_SECRET_KEY").is_some();
                None
            }
        };

        let webhook_verifier = match StripeWebhookVerifier::from_env() {
            Ok(verifier) => Some(Arc::new(verifier) as BoxedWebhookVerifier),
            Err(e) => {
                warn!("Stripe webhooks unavailable: {}", e);
                None
            }
        };

        info!(
            brands = ?allow_list.brand_ids(),
            checkout = provider.is_some(),
            webhooks = webhook_verifier.is_some(),
            "Application state ready"
        );

        let mut state = Self::with_parts(config, allow_list)
            .with_optional_provider(provider)
            .with_optional_verifier(webhook_verifier);
        state.secret_key_invalid = secret_key_invalid;
        Ok(state)
    }

    /// State with no provider handles; add them with the builders below
    pub fn with_parts(config: AppConfig, allow_list: PriceAllowList) -> Self {
        Self {
            config: Arc::new(config),
            allow_list: Arc::new(allow_list),
            provider: None,
            secret_key_invalid: false,
            webhook_verifier: None,
            webhook_handler: Arc::new(LoggingWebhookHandler),
        }
    }

    /// Builder: set the checkout provider
    pub fn with_provider(self, provider: BoxedCheckoutProvider) -> Self {
        self.with_optional_provider(Some(provider))
    }

    /// Builder: set the webhook verifier
    pub fn with_webhook_verifier(self, verifier: BoxedWebhookVerifier) -> Self {
        self.with_optional_verifier(Some(verifier))
    }

    /// Builder: replace the webhook hooks
    pub fn with_webhook_handler(mut self, handler: Arc<dyn WebhookHandler>) -> Self {
        self.webhook_handler = handler;
        self
    }

    fn with_optional_provider(mut self, provider: Option<BoxedCheckoutProvider>) -> Self {
        self.provider = provider;
        self
    }

    fn with_optional_verifier(mut self, verifier: Option<BoxedWebhookVerifier>) -> Self {
        self.webhook_verifier = verifier;
        self
    }
}
