//! Catalog configuration.
//!
//! Loaded from TOML or JSON (chosen by file extension). Every section and
//! field has a default, so an empty file is a valid configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CatalogError;

/// Recommended quiet window for committing draft filters.
pub const RECOMMENDED_DEBOUNCE_MS: std::ops::RangeInclusive<u64> = 700..=900;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub facets: FacetConfig,

    #[serde(default)]
    pub variants: VariantConfig,

    #[serde(default)]
    pub filter_state: FilterStateConfig,
}

impl CatalogConfig {
    /// Load config from a `.toml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CatalogError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let config = if path.extension().map_or(false, |e| e == "json") {
            Self::from_json_str(&content)?
        } else {
            Self::from_toml_str(&content)?
        };
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let config: CatalogConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> Result<Self, CatalogError> {
        let config: CatalogConfig =
            serde_json::from_str(content).map_err(|e| CatalogError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no computation can work with.
    pub fn validate(&self) -> Result<(), CatalogError> {
        self.variants.validate()?;
        self.filter_state.validate()?;
        Ok(())
    }
}

/// Whether zero-count facet values are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ZeroCountPolicy {
    /// Drop values nothing matches (selected values are always kept).
    #[default]
    Omit,
    /// Keep declared values with a zero count so the UI can render them disabled.
    IncludeDisabled,
}

/// Facet aggregation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacetConfig {
    pub include_brand: bool,
    pub include_in_stock: bool,
    pub include_on_sale: bool,
    pub zero_counts: ZeroCountPolicy,
}

impl Default for FacetConfig {
    fn default() -> Self {
        Self {
            include_brand: true,
            include_in_stock: true,
            include_on_sale: true,
            zero_counts: ZeroCountPolicy::Omit,
        }
    }
}

/// Variant naming, SKU synthesis, and batch limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantConfig {
    /// Separator between SKU segments.
    pub sku_separator: String,
    /// Maximum characters per value token (0 = unlimited).
    pub max_sku_token_len: usize,
    /// Root used when the product has no SKU of its own.
    pub fallback_sku_root: String,
    /// Separator between values in generated names.
    pub name_separator: String,
    /// Largest Cartesian product a single request may produce.
    pub max_combinations: usize,
}

impl Default for VariantConfig {
    fn default() -> Self {
        Self {
            sku_separator: "-".to_string(),
            max_sku_token_len: 12,
            fallback_sku_root: "SKU".to_string(),
            name_separator: " / ".to_string(),
            max_combinations: 500,
        }
    }
}

impl VariantConfig {
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.sku_separator.is_empty()
            || self.sku_separator.chars().any(|c| c.is_ascii_alphanumeric())
        {
            return Err(CatalogError::Config(format!(
                "sku_separator must be non-empty and non-alphanumeric, got {:?}",
                self.sku_separator
            )));
        }
        if self.fallback_sku_root.trim().is_empty() {
            return Err(CatalogError::Config(
                "fallback_sku_root must not be blank".to_string(),
            ));
        }
        if self.max_combinations == 0 {
            return Err(CatalogError::Config(
                "max_combinations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Draft/applied filter state settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterStateConfig {
    /// Quiet period after the last draft edit before it is applied.
    pub debounce_ms: u64,
}

impl Default for FilterStateConfig {
    fn default() -> Self {
        Self { debounce_ms: 800 }
    }
}

impl FilterStateConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.debounce_ms == 0 {
            return Err(CatalogError::Config(
                "debounce_ms must be positive".to_string(),
            ));
        }
        if !RECOMMENDED_DEBOUNCE_MS.contains(&self.debounce_ms) {
            warn!(
                debounce_ms = self.debounce_ms,
                "debounce window outside the recommended 700-900ms range"
            );
        }
        Ok(())
    }
}
