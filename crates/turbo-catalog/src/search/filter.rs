//! Filter sets and the dimensions they constrain.
//!
//! Multi-select within one dimension is OR, across dimensions AND. Empty
//! sets, `None` and `false` mean "no constraint on this dimension".

use crate::attribute::value_key;
use crate::catalog::{CatalogItem, CategoryScope};
use crate::error::{CatalogError, FacetWarning};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A facet dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Brand,
    Size,
    Color,
    /// A dynamic attribute, by slug.
    Attribute(String),
    Price,
    InStock,
    OnSale,
}

impl Dimension {
    /// Stable key, e.g. `brand` or `attribute:material`.
    pub fn key(&self) -> String {
        match self {
            Dimension::Brand => "brand".to_string(),
            Dimension::Size => "size".to_string(),
            Dimension::Color => "color".to_string(),
            Dimension::Attribute(slug) => format!("attribute:{}", slug),
            Dimension::Price => "price".to_string(),
            Dimension::InStock => "in_stock".to_string(),
            Dimension::OnSale => "on_sale".to_string(),
        }
    }

    /// Dimensions whose values are discrete strings.
    pub fn is_terms(&self) -> bool {
        matches!(
            self,
            Dimension::Brand | Dimension::Size | Dimension::Color | Dimension::Attribute(_)
        )
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Inclusive price range in minor units, always `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawPriceRange")]
pub struct PriceRange {
    pub min_cents: i64,
    pub max_cents: i64,
}

impl PriceRange {
    pub fn new(min_cents: i64, max_cents: i64) -> Result<Self, CatalogError> {
        if min_cents > max_cents {
            return Err(CatalogError::InvalidPriceRange {
                min: min_cents,
                max: max_cents,
            });
        }
        Ok(Self {
            min_cents,
            max_cents,
        })
    }

    pub fn contains(&self, cents: i64) -> bool {
        self.min_cents <= cents && cents <= self.max_cents
    }

    /// True when the range admits every price inside `bounds`.
    pub fn covers(&self, bounds: &PriceBounds) -> bool {
        self.min_cents <= bounds.min_cents && self.max_cents >= bounds.max_cents
    }
}

#[derive(Deserialize)]
struct RawPriceRange {
    min_cents: i64,
    max_cents: i64,
}

impl From<RawPriceRange> for PriceRange {
    fn from(raw: RawPriceRange) -> Self {
        Self {
            min_cents: raw.min_cents.min(raw.max_cents),
            max_cents: raw.min_cents.max(raw.max_cents),
        }
    }
}

/// Observed `[min, max]` of effective prices across a set of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceBounds {
    pub min_cents: i64,
    pub max_cents: i64,
}

impl PriceBounds {
    /// Bounds over the effective price of `items`; `None` when empty.
    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a CatalogItem>) -> Option<Self> {
        items
            .into_iter()
            .map(|item| item.effective_price().amount_cents)
            .fold(None, |acc, cents| match acc {
                None => Some(PriceBounds {
                    min_cents: cents,
                    max_cents: cents,
                }),
                Some(b) => Some(PriceBounds {
                    min_cents: b.min_cents.min(cents),
                    max_cents: b.max_cents.max(cents),
                }),
            })
    }
}

/// A draft or applied set of storefront filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSet {
    pub brands: BTreeSet<String>,
    pub sizes: BTreeSet<String>,
    pub colors: BTreeSet<String>,
    pub price_range: Option<PriceRange>,
    pub in_stock: bool,
    pub on_sale: bool,
    /// Dynamic attribute filters keyed by attribute slug.
    pub attributes: BTreeMap<String, BTreeSet<String>>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brands.insert(brand.into());
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.sizes.insert(size.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.colors.insert(color.into());
        self
    }

    pub fn with_attribute(mut self, slug: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .entry(slug.into())
            .or_default()
            .insert(value.into());
        self
    }

    pub fn with_price_range(mut self, range: PriceRange) -> Self {
        self.price_range = Some(range);
        self
    }

    pub fn in_stock_only(mut self) -> Self {
        self.in_stock = true;
        self
    }

    pub fn on_sale_only(mut self) -> Self {
        self.on_sale = true;
        self
    }

    /// True when nothing is constrained.
    pub fn is_empty(&self) -> bool {
        self.active_dimensions().is_empty()
    }

    /// Dimensions that currently carry a constraint.
    pub fn active_dimensions(&self) -> Vec<Dimension> {
        let mut dims = Vec::new();
        if !self.brands.is_empty() {
            dims.push(Dimension::Brand);
        }
        if !self.sizes.is_empty() {
            dims.push(Dimension::Size);
        }
        if !self.colors.is_empty() {
            dims.push(Dimension::Color);
        }
        for (slug, values) in &self.attributes {
            if !values.is_empty() {
                dims.push(Dimension::Attribute(slug.clone()));
            }
        }
        if self.price_range.is_some() {
            dims.push(Dimension::Price);
        }
        if self.in_stock {
            dims.push(Dimension::InStock);
        }
        if self.on_sale {
            dims.push(Dimension::OnSale);
        }
        dims
    }

    pub fn constrains(&self, dimension: &Dimension) -> bool {
        match dimension {
            Dimension::Price => self.price_range.is_some(),
            Dimension::InStock => self.in_stock,
            Dimension::OnSale => self.on_sale,
            _ => self
                .term_values(dimension)
                .map(|values| !values.is_empty())
                .unwrap_or(false),
        }
    }

    /// Selected values of a term dimension.
    pub fn term_values(&self, dimension: &Dimension) -> Option<&BTreeSet<String>> {
        match dimension {
            Dimension::Brand => Some(&self.brands),
            Dimension::Size => Some(&self.sizes),
            Dimension::Color => Some(&self.colors),
            Dimension::Attribute(slug) => self.attributes.get(slug),
            _ => None,
        }
    }

    fn term_values_mut(&mut self, dimension: &Dimension) -> Option<&mut BTreeSet<String>> {
        match dimension {
            Dimension::Brand => Some(&mut self.brands),
            Dimension::Size => Some(&mut self.sizes),
            Dimension::Color => Some(&mut self.colors),
            Dimension::Attribute(slug) => Some(self.attributes.entry(slug.clone()).or_default()),
            _ => None,
        }
    }

    /// Case-insensitive check whether `value` is selected in `dimension`.
    pub fn is_selected(&self, dimension: &Dimension, value: &str) -> bool {
        match dimension {
            Dimension::InStock => self.in_stock,
            Dimension::OnSale => self.on_sale,
            _ => {
                let key = value_key(value);
                self.term_values(dimension)
                    .map(|values| values.iter().any(|v| value_key(v) == key))
                    .unwrap_or(false)
            }
        }
    }

    /// Toggle a value in a term dimension, or flip a boolean dimension.
    pub fn toggle(&mut self, dimension: &Dimension, value: &str) {
        match dimension {
            Dimension::InStock => self.in_stock = !self.in_stock,
            Dimension::OnSale => self.on_sale = !self.on_sale,
            Dimension::Price => {}
            _ => {
                let key = value_key(value);
                if let Some(values) = self.term_values_mut(dimension) {
                    let before = values.len();
                    values.retain(|v| value_key(v) != key);
                    if values.len() == before {
                        values.insert(value.trim().to_string());
                    }
                }
                if let Dimension::Attribute(slug) = dimension {
                    if self.attributes.get(slug).map(|v| v.is_empty()).unwrap_or(false) {
                        self.attributes.remove(slug);
                    }
                }
            }
        }
    }

    /// Remove the constraint on one dimension.
    pub fn clear(&mut self, dimension: &Dimension) {
        match dimension {
            Dimension::Brand => self.brands.clear(),
            Dimension::Size => self.sizes.clear(),
            Dimension::Color => self.colors.clear(),
            Dimension::Attribute(slug) => {
                self.attributes.remove(slug);
            }
            Dimension::Price => self.price_range = None,
            Dimension::InStock => self.in_stock = false,
            Dimension::OnSale => self.on_sale = false,
        }
    }

    /// Copy of this filter set with one dimension's constraint lifted.
    pub fn without(&self, dimension: &Dimension) -> FilterSet {
        let mut reduced = self.clone();
        reduced.clear(dimension);
        reduced
    }

    /// Whether `item` is in scope and satisfies every constraint.
    ///
    /// Constraints on dimensions the scope does not define are ignored.
    pub fn matches(&self, scope: &CategoryScope, item: &CatalogItem) -> bool {
        if !scope.contains(item) {
            return false;
        }
        if !self.brands.is_empty() && !self.brands.iter().any(|b| item.has_brand(b)) {
            return false;
        }
        if let Some(size) = scope.size_attribute() {
            if !any_value(item, &size.slug, &self.sizes) {
                return false;
            }
        }
        if let Some(color) = scope.color_attribute() {
            if !any_value(item, &color.slug, &self.colors) {
                return false;
            }
        }
        for (slug, values) in &self.attributes {
            let known = scope
                .attributes
                .get(slug)
                .map(|a| a.filterable)
                .unwrap_or(false);
            if known && !any_value(item, slug, values) {
                return false;
            }
        }
        if let Some(range) = &self.price_range {
            if !range.contains(item.effective_price().amount_cents) {
                return false;
            }
        }
        if self.in_stock && !item.is_in_stock() {
            return false;
        }
        if self.on_sale && !item.is_on_sale() {
            return false;
        }
        true
    }

    /// Drop constraints the scope cannot interpret.
    ///
    /// Blank values are removed, attribute filters addressed by the size or
    /// color attribute's slug are folded into `sizes`/`colors`, and filters
    /// on unknown slugs are dropped with a warning.
    pub fn sanitize(&self, scope: &CategoryScope) -> (FilterSet, Vec<FacetWarning>) {
        let mut warnings = Vec::new();
        let mut clean = FilterSet {
            brands: clean_values(&self.brands),
            sizes: clean_values(&self.sizes),
            colors: clean_values(&self.colors),
            price_range: self.price_range,
            in_stock: self.in_stock,
            on_sale: self.on_sale,
            attributes: BTreeMap::new(),
        };

        for (slug, values) in &self.attributes {
            let values = clean_values(values);
            if values.is_empty() {
                continue;
            }
            match scope.dimension_for_slug(slug) {
                Some(Dimension::Size) => clean.sizes.extend(values),
                Some(Dimension::Color) => clean.colors.extend(values),
                Some(Dimension::Attribute(slug)) => {
                    clean.attributes.insert(slug, values);
                }
                Some(_) => {}
                None => warnings.push(FacetWarning::UnknownDimension { slug: slug.clone() }),
            }
        }

        if !clean.sizes.is_empty() && scope.size_attribute().is_none() {
            warnings.push(FacetWarning::UnsupportedDimension {
                dimension: Dimension::Size.key(),
            });
            clean.sizes.clear();
        }
        if !clean.colors.is_empty() && scope.color_attribute().is_none() {
            warnings.push(FacetWarning::UnsupportedDimension {
                dimension: Dimension::Color.key(),
            });
            clean.colors.clear();
        }

        (clean, warnings)
    }

    /// Treat a price range spanning the whole scope as no constraint.
    pub fn normalize_price(mut self, scope_bounds: Option<PriceBounds>) -> FilterSet {
        if let (Some(range), Some(bounds)) = (self.price_range, scope_bounds) {
            if range.covers(&bounds) {
                self.price_range = None;
            }
        }
        self
    }
}

fn any_value(item: &CatalogItem, slug: &str, wanted: &BTreeSet<String>) -> bool {
    wanted.is_empty() || wanted.iter().any(|v| item.has_value(slug, v))
}

fn clean_values(values: &BTreeSet<String>) -> BTreeSet<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}
