//! Catalog filtering and variant generation for TurboCommerce storefronts.
//!
//! This crate provides the catalog-side logic behind category pages and
//! product editors:
//!
//! - **Attributes**: Classification, slugs, ordered value sets
//! - **Catalog**: Categories, catalog items, category scopes
//! - **Search**: Filter sets, facet aggregation, draft/applied filter state
//! - **Variants**: Combination preview, SKU synthesis, reconciled generation
//! - **Store**: Collaborator traits and an in-memory implementation
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use turbo_catalog::prelude::*;
//!
//! let store = Arc::new(CatalogFixture::load("catalog.json")?.into_store()?);
//!
//! // Facets for a category page with one size selected
//! let aggregator = FacetAggregator::new(store.clone());
//! let report = aggregator
//!     .compute_facets("shirts", &FilterSet::new().with_size("M"))
//!     .await?;
//!
//! // Generate the missing variants of a product
//! let generator = VariantGenerator::new(store.clone(), store);
//! let request = GenerationRequest::new(
//!     ProductId::new("tee"),
//!     Selections::new().select("size", ["S", "M"]).select("color", ["Red"]),
//!     BasePricing::new(Money::cents(2000)),
//! );
//! let outcome = generator.generate_variants(&request).await?;
//! println!("created {}, skipped {}", outcome.created.len(), outcome.skipped.len());
//! ```

pub mod attribute;
pub mod config;
pub mod error;
pub mod ids;
pub mod money;

pub mod catalog;
pub mod search;
pub mod store;
pub mod variant;

pub use config::CatalogConfig;
pub use error::{CatalogError, CatalogResult, FacetWarning};
pub use ids::*;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{CatalogConfig, FacetConfig, FilterStateConfig, VariantConfig, ZeroCountPolicy};
    pub use crate::error::{CatalogError, CatalogResult, FacetWarning};
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};

    // Attributes
    pub use crate::attribute::{
        classify, is_color_attribute, Attribute, AttributeDescriptor, AttributeSet,
        AttributeValue, PriorityClass, ValueKind,
    };

    // Catalog
    pub use crate::catalog::{CatalogItem, Category, CategoryScope};

    // Search
    pub use crate::search::{
        AppliedSnapshot, CommitPhase, Dimension, FacetAggregator, FacetReport, FacetResult,
        FacetType, FacetValue, FilterSet, FilterState, PriceBounds, PriceRange, ResponseGate,
        Tagged,
    };

    // Store
    pub use crate::store::{AttributeSource, CatalogFixture, CatalogSource, MemoryStore, VariantStore};

    // Variants
    pub use crate::variant::{
        preview_combinations, BasePricing, GenerationOutcome, GenerationRequest, NewVariant,
        PricingOverride, Selections, SingleVariantRequest, SkipReason, SkippedCombination,
        Variant, VariantCombination, VariantGenerator, VariantOption,
    };
}
