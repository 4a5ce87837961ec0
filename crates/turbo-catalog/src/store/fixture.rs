//! JSON catalog fixtures.
//!
//! Categories reference their parent by slug and items reference categories
//! by slug, so fixtures can be written by hand.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::attribute::{Attribute, AttributeSet};
use crate::catalog::{CatalogItem, Category};
use crate::error::{CatalogError, CatalogResult};
use crate::ids::{CategoryId, ProductId};
use crate::money::{Currency, Money};
use crate::store::MemoryStore;
use crate::variant::{BasePricing, Variant};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureCategory {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    /// Parent category slug; must appear earlier in the list.
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureItem {
    #[serde(default)]
    pub id: Option<ProductId>,
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    /// Category slugs.
    #[serde(default)]
    pub categories: Vec<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub sale_price_cents: Option<i64>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub attributes: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureProduct {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub sale_price_cents: Option<i64>,
    #[serde(default)]
    pub cost_price_cents: Option<i64>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl FixtureProduct {
    pub fn pricing(&self, currency: Currency) -> BasePricing {
        let money = |cents| Money::new(cents, currency);
        BasePricing {
            price: money(self.price_cents),
            sale_price: self.sale_price_cents.map(money),
            cost_price: self.cost_price_cents.map(money),
            stock: self.stock,
        }
    }
}

/// A whole catalog in one JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogFixture {
    pub currency: Currency,
    pub categories: Vec<FixtureCategory>,
    pub items: Vec<FixtureItem>,
    pub products: Vec<FixtureProduct>,
}

impl CatalogFixture {
    pub fn from_json_str(content: &str) -> CatalogResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CatalogError::Store(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    pub fn product(&self, id: &ProductId) -> Option<&FixtureProduct> {
        self.products.iter().find(|p| &p.id == id)
    }

    /// Build an in-memory store holding the fixture's data.
    pub fn into_store(self) -> CatalogResult<MemoryStore> {
        let mut store = MemoryStore::new();
        let mut ids: HashMap<String, Category> = HashMap::new();

        for entry in self.categories {
            let category = match &entry.parent {
                None => Category::new_root(&entry.name),
                Some(parent) => {
                    let parent = ids.get(parent).ok_or_else(|| {
                        CatalogError::Store(format!(
                            "category '{}' references unknown parent '{}'",
                            entry.name, parent
                        ))
                    })?;
                    Category::new_child(parent, &entry.name)
                }
            };
            let category = match entry.slug {
                Some(slug) => category.with_slug(slug),
                None => category,
            };
            let attributes = AttributeSet::new(entry.attributes)?;
            ids.insert(category.slug.clone(), category.clone());
            store = store.with_category(category, attributes);
        }

        let currency = self.currency;
        let mut items = Vec::with_capacity(self.items.len());
        for raw in self.items {
            let category_ids = raw
                .categories
                .iter()
                .map(|slug| {
                    ids.get(slug).map(|c| c.id.clone()).ok_or_else(|| {
                        CatalogError::Store(format!(
                            "item '{}' references unknown category '{}'",
                            raw.name, slug
                        ))
                    })
                })
                .collect::<CatalogResult<Vec<CategoryId>>>()?;
            items.push(CatalogItem {
                product_id: raw.id.unwrap_or_else(ProductId::generate),
                name: raw.name,
                brand: raw.brand,
                category_ids,
                price: Money::new(raw.price_cents, currency),
                sale_price: raw.sale_price_cents.map(|c| Money::new(c, currency)),
                stock: raw.stock,
                attributes: raw.attributes,
            });
        }
        store = store.with_items(items);

        let (categories, products) = (ids.len(), self.products.len());
        for product in self.products {
            let attributes = AttributeSet::new(product.attributes)?;
            store = store
                .with_product(product.id, attributes)
                .with_variants(product.variants);
        }

        info!(categories, products, "loaded catalog fixture");
        Ok(store)
    }
}
