//! Catalog items as seen by the facet aggregator.

use crate::attribute::value_key;
use crate::ids::{CategoryId, ProductId};
use crate::money::Money;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A sellable product as returned by a catalog query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogItem {
    pub product_id: ProductId,
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    /// Categories the product is listed in.
    #[serde(default)]
    pub category_ids: Vec<CategoryId>,
    /// Regular price.
    pub price: Money,
    /// Discounted price, when on sale.
    #[serde(default)]
    pub sale_price: Option<Money>,
    #[serde(default)]
    pub stock: i64,
    /// Attribute values keyed by attribute slug.
    #[serde(default)]
    pub attributes: BTreeMap<String, Vec<String>>,
}

impl CatalogItem {
    pub fn new(name: impl Into<String>, price: Money) -> Self {
        Self {
            product_id: ProductId::generate(),
            name: name.into(),
            brand: None,
            category_ids: Vec::new(),
            price,
            sale_price: None,
            stock: 0,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<ProductId>) -> Self {
        self.product_id = id.into();
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_sale_price(mut self, sale_price: Money) -> Self {
        self.sale_price = Some(sale_price);
        self
    }

    pub fn with_stock(mut self, stock: i64) -> Self {
        self.stock = stock;
        self
    }

    pub fn in_category(mut self, category_id: CategoryId) -> Self {
        if !self.category_ids.contains(&category_id) {
            self.category_ids.push(category_id);
        }
        self
    }

    /// Add values for an attribute slug.
    pub fn with_attribute<I, S>(mut self, slug: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes
            .entry(slug.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// Price actually charged: the sale price when present, else the regular price.
    pub fn effective_price(&self) -> Money {
        self.sale_price.unwrap_or(self.price)
    }

    /// On sale when a sale price undercuts the regular price.
    pub fn is_on_sale(&self) -> bool {
        self.sale_price
            .map(|sale| sale.is_below(&self.price))
            .unwrap_or(false)
    }

    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }

    pub fn values_for(&self, slug: &str) -> &[String] {
        self.attributes
            .get(slug)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Case-insensitive membership test for one attribute value.
    pub fn has_value(&self, slug: &str, value: &str) -> bool {
        let key = value_key(value);
        self.values_for(slug).iter().any(|v| value_key(v) == key)
    }

    pub fn has_brand(&self, brand: &str) -> bool {
        self.brand
            .as_deref()
            .map(|b| value_key(b) == value_key(brand))
            .unwrap_or(false)
    }
}
