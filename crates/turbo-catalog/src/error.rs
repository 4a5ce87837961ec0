//! Catalog error types.

use crate::ids::{AttributeValueId, VariantId};
use serde::Serialize;
use thiserror::Error;

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that can occur in catalog operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// A generation request named no attributes at all.
    #[error("No attributes selected for variant generation")]
    NothingSelected,

    /// An attribute contributed zero values to a generation request.
    #[error("Empty selection: attribute '{attribute}' has no values selected")]
    EmptySelection { attribute: String },

    /// A selection referenced an attribute the product does not have.
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    /// A selection referenced a value the attribute does not have.
    #[error("Unknown value {value_id} for attribute '{attribute}'")]
    UnknownValue {
        attribute: String,
        value_id: AttributeValueId,
    },

    /// An attribute definition is malformed.
    #[error("Invalid attribute: {0}")]
    InvalidAttribute(String),

    /// Two attributes in one set share a slug.
    #[error("Duplicate attribute slug: {0}")]
    DuplicateAttributeSlug(String),

    /// Two values in one attribute share a name.
    #[error("Duplicate value '{value}' in attribute '{attribute}'")]
    DuplicateAttributeValue { attribute: String, value: String },

    /// Price range with min above max.
    #[error("Invalid price range: min {min} is above max {max}")]
    InvalidPriceRange { min: i64, max: i64 },

    /// The Cartesian product exceeds the configured limit.
    #[error("Selection yields {count} combinations, limit is {limit}")]
    TooManyCombinations { count: usize, limit: usize },

    /// A SKU is already taken by another variant of the product.
    #[error("SKU {sku} already used by variant {existing_variant_id}")]
    SkuCollision {
        sku: String,
        existing_variant_id: VariantId,
    },

    /// The option tuple already exists as a variant.
    #[error("Combination already exists as variant {existing_variant_id}")]
    DuplicateCombination { existing_variant_id: VariantId },

    /// Product not found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Backing store failure.
    #[error("Store error: {0}")]
    Store(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CatalogError {
    /// Validation failures that abort a whole request before anything is written.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CatalogError::NothingSelected
                | CatalogError::EmptySelection { .. }
                | CatalogError::UnknownAttribute(_)
                | CatalogError::UnknownValue { .. }
                | CatalogError::InvalidAttribute(_)
                | CatalogError::DuplicateAttributeSlug(_)
                | CatalogError::DuplicateAttributeValue { .. }
                | CatalogError::InvalidPriceRange { .. }
                | CatalogError::TooManyCombinations { .. }
        )
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for CatalogError {
    fn from(e: toml::de::Error) -> Self {
        CatalogError::Config(e.to_string())
    }
}

/// Recovered problems found while computing facets.
///
/// These never fail a computation; they travel with the report so callers
/// can surface or log them.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FacetWarning {
    /// A filter referenced an attribute slug not present in scope.
    #[error("Ignoring filter on unknown attribute '{slug}'")]
    UnknownDimension { slug: String },

    /// The category slug did not resolve to a scope.
    #[error("Unknown category '{slug}', returning empty facets")]
    InvalidScope { slug: String },

    /// A built-in dimension was filtered but the scope has no matching attribute.
    #[error("Ignoring {dimension} filter, category has no such attribute")]
    UnsupportedDimension { dimension: String },
}
