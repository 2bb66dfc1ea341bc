//! Configuration: contract terms and instance settings.
//!
//! Terms are fixed at instantiation and immutable afterwards. Everything is
//! loadable from JSON.

use serde::{Deserialize, Serialize};

use crate::{Amount, AssetKind, Brand, MintswapError, Result, constants};

/// The seller's immutable trading terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terms {
    /// Minimum payment per trade, in the payment brand.
    pub trade_price: Amount,
    /// Cap on the total unit count requested in one proposal.
    #[serde(default = "default_max_items")]
    pub max_items: u64,
    /// Brand of the minted items.
    pub item_brand: Brand,
}

fn default_max_items() -> u64 {
    constants::DEFAULT_MAX_ITEMS
}

impl Terms {
    /// Terms with the default unit cap.
    #[must_use]
    pub fn new(trade_price: Amount, item_brand: Brand) -> Self {
        Self {
            trade_price,
            max_items: constants::DEFAULT_MAX_ITEMS,
            item_brand,
        }
    }

    #[must_use]
    pub fn with_max_items(mut self, max_items: u64) -> Self {
        self.max_items = max_items;
        self
    }

    /// Brand buyers pay in.
    #[must_use]
    pub fn payment_brand(&self) -> &Brand {
        &self.trade_price.brand
    }

    /// Check brand kinds and that the two brands are distinct.
    pub fn validate(&self) -> Result<()> {
        if self.trade_price.brand.kind != AssetKind::Fungible {
            return Err(MintswapError::Configuration(format!(
                "payment brand {} must be fungible",
                self.trade_price.brand
            )));
        }
        if self.trade_price.as_decimal().is_none_or(|v| v.is_sign_negative() && !v.is_zero()) {
            return Err(MintswapError::Configuration(format!(
                "trade price {} must be a non-negative fungible value",
                self.trade_price
            )));
        }
        if self.item_brand.kind != AssetKind::Bag {
            return Err(MintswapError::Configuration(format!(
                "item brand {} must be a bag brand",
                self.item_brand
            )));
        }
        if self.item_brand.name == self.trade_price.brand.name {
            return Err(MintswapError::Configuration(format!(
                "payment and item brands must differ (both {})",
                self.item_brand
            )));
        }
        Ok(())
    }
}

/// Logging setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// `tracing` filter directive; `RUST_LOG` overrides it.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_filter() -> String {
    constants::DEFAULT_LOG_FILTER.to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
        }
    }
}

/// Everything needed to start one contract instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceConfig {
    pub terms: Terms,
    /// Hex-encoded 32-byte ed25519 seed for receipt signing. A fresh key is
    /// generated when absent.
    #[serde(default)]
    pub signing_seed: Option<String>,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl InstanceConfig {
    #[must_use]
    pub fn new(terms: Terms) -> Self {
        Self {
            terms,
            signing_seed: None,
            telemetry: TelemetryConfig::default(),
        }
    }

    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| MintswapError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.terms.validate()?;
        self.seed_bytes()?;
        Ok(())
    }

    /// Decoded signing seed, if one is configured.
    pub fn seed_bytes(&self) -> Result<Option<[u8; 32]>> {
        let Some(seed) = &self.signing_seed else {
            return Ok(None);
        };
        let bytes = hex::decode(seed)
            .map_err(|e| MintswapError::Configuration(format!("signing_seed: {e}")))?;
        let seed: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            MintswapError::Configuration(format!("signing_seed: expected 32 bytes, got {}", b.len()))
        })?;
        Ok(Some(seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{credits, credits_brand, items_brand};

    const CONFIG: &str = r#"{
        "terms": {
            "trade_price": {
                "brand": { "name": "Credits", "kind": "fungible" },
                "value": { "fungible": "100" }
            },
            "item_brand": { "name": "Items", "kind": "bag" }
        }
    }"#;

    #[test]
    fn max_items_defaults_to_three() {
        let cfg = InstanceConfig::from_json(CONFIG).unwrap();
        assert_eq!(cfg.terms.max_items, 3);
        assert_eq!(cfg.terms.trade_price, credits(100));
        assert_eq!(cfg.terms.item_brand, items_brand());
        assert_eq!(cfg.telemetry, TelemetryConfig::default());
        assert!(cfg.signing_seed.is_none());
    }

    #[test]
    fn payment_brand_must_be_fungible() {
        let terms = Terms {
            trade_price: Amount::empty(&items_brand()),
            max_items: 3,
            item_brand: items_brand(),
        };
        assert!(matches!(
            terms.validate(),
            Err(MintswapError::Configuration(_))
        ));
    }

    #[test]
    fn item_brand_must_be_bag() {
        let terms = Terms::new(credits(100), Brand::fungible("Items"));
        assert!(terms.validate().is_err());
    }

    #[test]
    fn brands_must_differ() {
        let terms = Terms::new(credits(100), Brand::bag(credits_brand().name));
        assert!(terms.validate().is_err());
    }

    #[test]
    fn seed_must_be_32_bytes() {
        let mut cfg = InstanceConfig::new(Terms::new(credits(1), items_brand()));
        cfg.signing_seed = Some("abcd".into());
        assert!(cfg.validate().is_err());
        cfg.signing_seed = Some("zz".repeat(32));
        assert!(cfg.validate().is_err());
        cfg.signing_seed = Some("07".repeat(32));
        assert_eq!(cfg.seed_bytes().unwrap(), Some([7u8; 32]));
    }

    #[test]
    fn malformed_json_is_configuration_error() {
        let err = InstanceConfig::from_json("{").unwrap_err();
        assert!(matches!(err, MintswapError::Configuration(_)));
    }

    #[test]
    fn config_serde_roundtrip() {
        let cfg = InstanceConfig::new(Terms::new(credits(100), items_brand()).with_max_items(5));
        let json = serde_json::to_string(&cfg).unwrap();
        let back = InstanceConfig::from_json(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
