//! Collaborator traits the services read from and write to.
//!
//! Implementations may be backed by anything; [`MemoryStore`] is the
//! in-process one used by tests and the CLI.

mod fixture;
mod memory;

pub use fixture::CatalogFixture;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::attribute::Attribute;
use crate::catalog::{CatalogItem, CategoryScope};
use crate::error::CatalogResult;
use crate::ids::ProductId;
use crate::search::FilterSet;
use crate::variant::{NewVariant, Variant};

/// Read access to the product catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Resolve a category slug to its scope, `None` when unknown.
    async fn resolve_scope(&self, category_slug: &str) -> CatalogResult<Option<CategoryScope>>;

    /// Items within `scope` that satisfy `filters`.
    async fn find_items(
        &self,
        scope: &CategoryScope,
        filters: &FilterSet,
    ) -> CatalogResult<Vec<CatalogItem>>;
}

/// Attribute definitions.
#[async_trait]
pub trait AttributeSource: Send + Sync {
    /// Attributes assigned to a product, in declared order.
    async fn product_attributes(&self, product_id: &ProductId) -> CatalogResult<Vec<Attribute>>;

    /// Attributes published for a category.
    async fn category_attributes(&self, category_slug: &str) -> CatalogResult<Vec<Attribute>>;
}

/// Variant persistence.
#[async_trait]
pub trait VariantStore: Send + Sync {
    async fn list_variants(&self, product_id: &ProductId) -> CatalogResult<Vec<Variant>>;

    /// Insert a variant.
    ///
    /// Must reject a SKU or option tuple the product already has, so that
    /// repeated creation is idempotent.
    async fn create_variant(&self, variant: NewVariant) -> CatalogResult<Variant>;
}
