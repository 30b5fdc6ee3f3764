//! # Brand Allow-List
//!
//! Per-brand price allow-lists for the brand-scoped checkout endpoint.
//! Loaded once at startup from `config/brands.toml` and never mutated afterwards.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, warn};

/// Brand used when a request does not name one
pub const DEFAULT_BRAND: &str = "quant";

/// Environment variable holding the base URL for a brand (`credit` -> `CREDIT_BASE_URL`)
pub fn brand_base_url_var(brand: &str) -> String {
    format!("{}_BASE_URL", brand.to_ascii_uppercase())
}

/// Permitted price identifiers for one brand
#[derive(Debug, Clone, Deserialize)]
pub struct BrandPrices {
    /// Brand tag (e.g., "quant", "credit")
    pub id: String,

    /// Price identifiers that may be sold under this brand
    #[serde(default)]
    pub price_ids: BTreeSet<String>,
}

impl BrandPrices {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            price_ids: BTreeSet::new(),
        }
    }

    /// Builder: permit a price
    pub fn with_price(mut self, price_id: impl Into<String>) -> Self {
        self.price_ids.insert(price_id.into());
        self
    }
}

/// Immutable mapping from brand tag to its set of permitted prices
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceAllowList {
    #[serde(default)]
    pub brands: Vec<BrandPrices>,
}

impl PriceAllowList {
    pub fn new() -> Self {
        Self { brands: Vec::new() }
    }

    /// Add a brand with builder pattern
    pub fn with_brand(mut self, brand: BrandPrices) -> Self {
        self.brands.push(brand);
        self
    }

    /// Parse an allow-list from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load the first allow-list file that exists among `paths`.
    ///
    /// A file that exists but does not parse is an error; no file at all
    /// yields an empty allow-list.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self, String> {
        for path in paths {
            let path = path.as_ref();
            if let Ok(content) = std::fs::read_to_string(path) {
                let list = Self::from_toml_str(&content)
                    .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;
                info!(
                    path = %path.display(),
                    brands = list.brands.len(),
                    "Loaded price allow-list"
                );
                return Ok(list);
            }
        }

        warn!("No price allow-list found, brand-scoped checkout will reject every price");
        Ok(Self::new())
    }

    /// Get the allow-list for a brand
    pub fn get(&self, brand: &str) -> Option<&BrandPrices> {
        self.brands.iter().find(|b| b.id == brand)
    }

    /// Check whether `price_id` may be sold under `brand`.
    /// Unknown brands permit nothing.
    pub fn is_allowed(&self, brand: &str, price_id: &str) -> bool {
        self.get(brand)
            .map(|b| b.price_ids.contains(price_id))
            .unwrap_or(false)
    }

    /// All brand tags
    pub fn brand_ids(&self) -> Vec<&str> {
        self.brands.iter().map(|b| b.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.brands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.brands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PriceAllowList {
        PriceAllowList::new()
            .with_brand(
                BrandPrices::new("quant")
                    .with_price("price_quant_monthly")
                    .with_price("price_quant_yearly"),
            )
            .with_brand(BrandPrices::new("credit").with_price("price_credit_pro"))
    }

    #[test]
    fn test_membership() {
        let list = sample();

        assert!(list.is_allowed("quant", "price_quant_monthly"));
        assert!(list.is_allowed("credit", "price_credit_pro"));
        assert!(!list.is_allowed("quant", "price_credit_pro"));
        assert!(!list.is_allowed("credit", "price_quant_yearly"));
        assert!(!list.is_allowed("unknown", "price_quant_monthly"));
    }

    #[test]
    fn test_parse_toml() {
        let content = r#"
            [[brands]]
            id = "quant"
            price_ids = ["price_a", "price_b"]

            [[brands]]
            id = "credit"
            price_ids = ["price_c"]
        "#;

        let list = PriceAllowList::from_toml_str(content).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.brand_ids(), vec!["quant", "credit"]);
        assert!(list.is_allowed("quant", "price_b"));
        assert!(list.is_allowed("credit", "price_c"));
    }

    #[test]
    fn test_brand_without_prices() {
        let list = PriceAllowList::from_toml_str("[[brands]]\nid = \"quant\"\n").unwrap();
        assert!(list.get("quant").is_some());
        assert!(!list.is_allowed("quant", "price_a"));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let list = PriceAllowList::load(&["does/not/exist.toml"][..]).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_brand_base_url_var() {
        assert_eq!(brand_base_url_var("credit"), "CREDIT_BASE_URL");
        assert_eq!(brand_base_url_var("quant"), "QUANT_BASE_URL");
    }
}
