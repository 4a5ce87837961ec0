//! In-memory store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::attribute::{Attribute, AttributeSet};
use crate::catalog::{CatalogItem, Category, CategoryScope};
use crate::error::{CatalogError, CatalogResult};
use crate::ids::ProductId;
use crate::search::FilterSet;
use crate::store::{AttributeSource, CatalogSource, VariantStore};
use crate::variant::sku::sku_key;
use crate::variant::{NewVariant, Variant};

#[derive(Debug, Clone)]
struct CategoryEntry {
    category: Category,
    attributes: AttributeSet,
}

#[derive(Debug, Clone, Default)]
struct ProductEntry {
    attributes: AttributeSet,
    variants: Vec<Variant>,
}

/// Catalog, attribute and variant storage held in process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    categories: RwLock<Vec<CategoryEntry>>,
    items: RwLock<Vec<CatalogItem>>,
    products: RwLock<HashMap<ProductId, ProductEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a category with the attributes it publishes.
    pub fn with_category(mut self, category: Category, attributes: AttributeSet) -> Self {
        self.categories.get_mut().push(CategoryEntry {
            category,
            attributes,
        });
        self
    }

    pub fn with_items(mut self, items: impl IntoIterator<Item = CatalogItem>) -> Self {
        self.items.get_mut().extend(items);
        self
    }

    /// Register a product and its attributes.
    ///
    /// Taking an [`AttributeSet`] keeps slugs unique within the product.
    pub fn with_product(mut self, product_id: ProductId, attributes: AttributeSet) -> Self {
        self.products.get_mut().entry(product_id).or_default().attributes = attributes;
        self
    }

    /// Seed existing variants, bypassing duplicate checks.
    pub fn with_variants(mut self, variants: impl IntoIterator<Item = Variant>) -> Self {
        let products = self.products.get_mut();
        for variant in variants {
            products
                .entry(variant.product_id.clone())
                .or_default()
                .variants
                .push(variant);
        }
        self
    }

    pub async fn add_item(&self, item: CatalogItem) {
        self.items.write().await.push(item);
    }

    pub async fn categories(&self) -> Vec<Category> {
        self.categories
            .read()
            .await
            .iter()
            .map(|entry| entry.category.clone())
            .collect()
    }

    pub async fn product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = self.products.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl CatalogSource for MemoryStore {
    async fn resolve_scope(&self, category_slug: &str) -> CatalogResult<Option<CategoryScope>> {
        let categories = self.categories.read().await;
        let Some(entry) = categories.iter().find(|e| e.category.slug == category_slug) else {
            return Ok(None);
        };
        let all: Vec<Category> = categories.iter().map(|e| e.category.clone()).collect();
        Ok(Some(CategoryScope::new(
            entry.category.clone(),
            &all,
            entry.attributes.clone(),
        )))
    }

    async fn find_items(
        &self,
        scope: &CategoryScope,
        filters: &FilterSet,
    ) -> CatalogResult<Vec<CatalogItem>> {
        let items = self.items.read().await;
        let found: Vec<CatalogItem> = items
            .iter()
            .filter(|item| filters.matches(scope, item))
            .cloned()
            .collect();
        debug!(category = scope.slug(), matched = found.len(), "find_items");
        Ok(found)
    }
}

#[async_trait]
impl AttributeSource for MemoryStore {
    async fn product_attributes(&self, product_id: &ProductId) -> CatalogResult<Vec<Attribute>> {
        self.products
            .read()
            .await
            .get(product_id)
            .map(|p| p.attributes.iter().cloned().collect())
            .ok_or_else(|| CatalogError::ProductNotFound(product_id.to_string()))
    }

    async fn category_attributes(&self, category_slug: &str) -> CatalogResult<Vec<Attribute>> {
        Ok(self
            .categories
            .read()
            .await
            .iter()
            .find(|e| e.category.slug == category_slug)
            .map(|e| e.attributes.clone().into_vec())
            .unwrap_or_default())
    }
}

#[async_trait]
impl VariantStore for MemoryStore {
    async fn list_variants(&self, product_id: &ProductId) -> CatalogResult<Vec<Variant>> {
        let products = self.products.read().await;
        let product = products
            .get(product_id)
            .ok_or_else(|| CatalogError::ProductNotFound(product_id.to_string()))?;
        let mut variants = product.variants.clone();
        variants.sort_by_key(|v| v.position);
        Ok(variants)
    }

    async fn create_variant(&self, variant: NewVariant) -> CatalogResult<Variant> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(&variant.product_id)
            .ok_or_else(|| CatalogError::ProductNotFound(variant.product_id.to_string()))?;

        let key = variant.option_key();
        if let Some(existing) = product.variants.iter().find(|v| v.option_key() == key) {
            return Err(CatalogError::DuplicateCombination {
                existing_variant_id: existing.id.clone(),
            });
        }
        let sku = sku_key(&variant.sku);
        if let Some(existing) = product.variants.iter().find(|v| sku_key(&v.sku) == sku) {
            return Err(CatalogError::SkuCollision {
                sku: variant.sku,
                existing_variant_id: existing.id.clone(),
            });
        }

        let created = Variant::from_new(variant);
        product.variants.push(created.clone());
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::variant::VariantOption;

    fn new_variant(product: &ProductId, sku: &str, size: &str) -> NewVariant {
        NewVariant {
            product_id: product.clone(),
            name: size.to_string(),
            sku: sku.to_string(),
            price: Money::cents(1000),
            sale_price: None,
            cost_price: None,
            stock: 1,
            is_default: false,
            options: vec![VariantOption::new("size", size)],
            position: 0,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates() {
        let product = ProductId::new("p1");
        let store = MemoryStore::new().with_product(product.clone(), AttributeSet::default());

        let first = store.create_variant(new_variant(&product, "P1-S", "S")).await.unwrap();
        let dup_tuple = store
            .create_variant(new_variant(&product, "OTHER", "s"))
            .await
            .unwrap_err();
        assert_eq!(
            dup_tuple,
            CatalogError::DuplicateCombination {
                existing_variant_id: first.id.clone()
            }
        );
        let dup_sku = store
            .create_variant(new_variant(&product, "p1-s", "M"))
            .await
            .unwrap_err();
        assert!(matches!(dup_sku, CatalogError::SkuCollision { .. }));
        assert_eq!(store.list_variants(&product).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let store = MemoryStore::new();
        let missing = ProductId::new("nope");
        assert!(store.list_variants(&missing).await.is_err());
        assert!(store.create_variant(new_variant(&missing, "X", "S")).await.is_err());
    }

    #[tokio::test]
    async fn test_resolve_scope_includes_children() {
        let root = Category::new_root("Clothing");
        let child = Category::new_child(&root, "Shirts");
        let item = CatalogItem::new("Polo", Money::cents(100)).in_category(child.id.clone());
        let store = MemoryStore::new()
            .with_category(root, AttributeSet::default())
            .with_category(child, AttributeSet::default())
            .with_items(vec![item]);

        let scope = store.resolve_scope("clothing").await.unwrap().unwrap();
        let items = store.find_items(&scope, &FilterSet::new()).await.unwrap();
        assert_eq!(items.len(), 1);
        assert!(store.resolve_scope("shoes").await.unwrap().is_none());
    }
}
