//! Facet aggregation.
//!
//! Each dimension is counted against the candidates of the applied filters
//! with that dimension's own constraint lifted, so selecting a value never
//! hides its siblings.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::attribute::{value_key, Attribute};
use crate::catalog::{CatalogItem, CategoryScope};
use crate::config::{FacetConfig, ZeroCountPolicy};
use crate::error::{CatalogResult, FacetWarning};
use crate::search::{Dimension, FilterSet, PriceBounds};
use crate::store::CatalogSource;

/// How a facet is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetType {
    /// Discrete values with counts.
    Terms,
    /// Min/max slider.
    Range,
    /// Single on/off flag.
    Toggle,
}

/// A single facet value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetValue {
    pub name: String,
    pub count: usize,
    pub selected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
}

impl FacetValue {
    /// Zero-count values are shown disabled.
    pub fn is_disabled(&self) -> bool {
        self.count == 0
    }
}

/// Counts for one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetResult {
    pub dimension: Dimension,
    pub label: String,
    pub facet_type: FacetType,
    pub values: Vec<FacetValue>,
    /// Effective price bounds of this facet's candidates.
    pub price_range: Option<PriceBounds>,
    /// Candidates after lifting this dimension's constraint.
    pub total_matching: usize,
}

impl FacetResult {
    pub fn value(&self, name: &str) -> Option<&FacetValue> {
        let key = value_key(name);
        self.values.iter().find(|v| value_key(&v.name) == key)
    }

    /// Count for a value, 0 when absent.
    pub fn count_of(&self, name: &str) -> usize {
        self.value(name).map(|v| v.count).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.price_range.is_none()
    }
}

/// Full facet response for a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetReport {
    pub category_slug: String,
    /// Items matching every applied filter.
    pub total_matching: usize,
    /// Price bounds of the whole scope, ignoring filters.
    pub price_bounds: Option<PriceBounds>,
    pub facets: Vec<FacetResult>,
    pub warnings: Vec<FacetWarning>,
}

impl FacetReport {
    fn empty(category_slug: &str, warnings: Vec<FacetWarning>) -> Self {
        Self {
            category_slug: category_slug.to_string(),
            total_matching: 0,
            price_bounds: None,
            facets: Vec::new(),
            warnings,
        }
    }

    pub fn facet(&self, dimension: &Dimension) -> Option<&FacetResult> {
        self.facets.iter().find(|f| &f.dimension == dimension)
    }

    pub fn dimensions(&self) -> Vec<&Dimension> {
        self.facets.iter().map(|f| &f.dimension).collect()
    }
}

/// Computes facet counts over a [`CatalogSource`].
pub struct FacetAggregator<C: CatalogSource> {
    source: Arc<C>,
    config: FacetConfig,
}

impl<C: CatalogSource> FacetAggregator<C> {
    pub fn new(source: Arc<C>) -> Self {
        Self {
            source,
            config: FacetConfig::default(),
        }
    }

    pub fn with_config(mut self, config: FacetConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &FacetConfig {
        &self.config
    }

    /// Dimensions reported for a scope, in display order.
    pub fn dimensions(&self, scope: &CategoryScope) -> Vec<Dimension> {
        let mut dims = Vec::new();
        if self.config.include_brand {
            dims.push(Dimension::Brand);
        }
        if scope.size_attribute().is_some() {
            dims.push(Dimension::Size);
        }
        if scope.color_attribute().is_some() {
            dims.push(Dimension::Color);
        }
        dims.extend(
            scope
                .dynamic_attributes()
                .into_iter()
                .map(|a| Dimension::Attribute(a.slug.clone())),
        );
        dims.push(Dimension::Price);
        if self.config.include_in_stock {
            dims.push(Dimension::InStock);
        }
        if self.config.include_on_sale {
            dims.push(Dimension::OnSale);
        }
        dims
    }

    /// Compute every facet of a category under the applied filters.
    ///
    /// Only a failing [`CatalogSource`] produces an error; unknown
    /// categories and filters come back as warnings on the report.
    #[instrument(skip_all, fields(category = %category_slug))]
    pub async fn compute_facets(
        &self,
        category_slug: &str,
        applied: &FilterSet,
    ) -> CatalogResult<FacetReport> {
        let Some(scope) = self.source.resolve_scope(category_slug).await? else {
            warn!("unknown category, returning empty facets");
            return Ok(FacetReport::empty(
                category_slug,
                vec![FacetWarning::InvalidScope {
                    slug: category_slug.to_string(),
                }],
            ));
        };

        let (filters, warnings) = applied.sanitize(&scope);
        for warning in &warnings {
            warn!(%warning, "ignoring filter");
        }

        // Query 0 is always the unfiltered scope; it supplies the price bounds.
        let mut queries = vec![FilterSet::default()];
        let scope_items = self.source.find_items(&scope, &queries[0]).await?;
        let price_bounds = PriceBounds::from_items(&scope_items);
        let filters = filters.normalize_price(price_bounds);

        let applied_idx = query_index(&mut queries, filters.clone());
        let plan: Vec<(Dimension, usize)> = self
            .dimensions(&scope)
            .into_iter()
            .map(|dim| {
                let idx = query_index(&mut queries, filters.without(&dim));
                (dim, idx)
            })
            .collect();

        let fetched = try_join_all(
            queries[1..]
                .iter()
                .map(|query| self.source.find_items(&scope, query)),
        )
        .await?;
        let mut results = Vec::with_capacity(queries.len());
        results.push(scope_items);
        results.extend(fetched);

        debug!(
            queries = queries.len(),
            dimensions = plan.len(),
            "fetched candidate sets"
        );

        let facets = plan
            .iter()
            .map(|(dim, idx)| self.build_facet(&scope, &filters, dim, &results[*idx]))
            .collect();

        Ok(FacetReport {
            category_slug: scope.slug().to_string(),
            total_matching: results[applied_idx].len(),
            price_bounds,
            facets,
            warnings,
        })
    }

    fn build_facet(
        &self,
        scope: &CategoryScope,
        filters: &FilterSet,
        dimension: &Dimension,
        candidates: &[CatalogItem],
    ) -> FacetResult {
        let (facet_type, values) = match dimension {
            Dimension::Price => (FacetType::Range, Vec::new()),
            Dimension::InStock => (
                FacetType::Toggle,
                self.toggle_values("in_stock", filters.in_stock, candidates, |i| {
                    i.is_in_stock()
                }),
            ),
            Dimension::OnSale => (
                FacetType::Toggle,
                self.toggle_values("on_sale", filters.on_sale, candidates, |i| i.is_on_sale()),
            ),
            _ => (
                FacetType::Terms,
                self.term_values(scope.attribute_for(dimension), filters, dimension, candidates),
            ),
        };

        FacetResult {
            dimension: dimension.clone(),
            label: label_for(scope, dimension),
            facet_type,
            values,
            price_range: PriceBounds::from_items(candidates),
            total_matching: candidates.len(),
        }
    }

    fn toggle_values(
        &self,
        name: &str,
        selected: bool,
        candidates: &[CatalogItem],
        flag: impl Fn(&CatalogItem) -> bool,
    ) -> Vec<FacetValue> {
        if candidates.is_empty() {
            return Vec::new();
        }
        let value = FacetValue {
            name: name.to_string(),
            count: candidates.iter().filter(|item| flag(item)).count(),
            selected,
            color_hex: None,
        };
        self.retain_visible(vec![value])
    }

    fn term_values(
        &self,
        attribute: Option<&Attribute>,
        filters: &FilterSet,
        dimension: &Dimension,
        candidates: &[CatalogItem],
    ) -> Vec<FacetValue> {
        if candidates.is_empty() {
            return Vec::new();
        }

        // normalized value -> (first display form, items carrying it)
        let mut counts: BTreeMap<String, (String, usize)> = BTreeMap::new();
        for item in candidates {
            let mut seen = HashSet::new();
            for raw in item_values(item, dimension, attribute) {
                let key = value_key(raw);
                if key.is_empty() || !seen.insert(key.clone()) {
                    continue;
                }
                counts
                    .entry(key)
                    .or_insert_with(|| (raw.trim().to_string(), 0))
                    .1 += 1;
            }
        }

        let mut values = Vec::with_capacity(counts.len());
        if let Some(attribute) = attribute {
            let swatches = attribute.is_color();
            for declared in &attribute.values {
                let count = counts
                    .remove(&value_key(&declared.value))
                    .map(|(_, count)| count)
                    .unwrap_or(0);
                values.push(FacetValue {
                    name: declared.value.clone(),
                    count,
                    selected: filters.is_selected(dimension, &declared.value),
                    color_hex: if swatches { declared.color_hex.clone() } else { None },
                });
            }
        }
        for (name, count) in counts.into_values() {
            values.push(FacetValue {
                selected: filters.is_selected(dimension, &name),
                name,
                count,
                color_hex: None,
            });
        }

        // Selections nothing carries still show up so they can be cleared.
        if let Some(selected) = filters.term_values(dimension) {
            for name in selected {
                let key = value_key(name);
                if !values.iter().any(|v| value_key(&v.name) == key) {
                    values.push(FacetValue {
                        name: name.clone(),
                        count: 0,
                        selected: true,
                        color_hex: None,
                    });
                }
            }
        }

        self.retain_visible(values)
    }

    fn retain_visible(&self, mut values: Vec<FacetValue>) -> Vec<FacetValue> {
        if self.config.zero_counts == ZeroCountPolicy::Omit {
            values.retain(|v| v.count > 0 || v.selected);
        }
        values
    }
}

fn query_index(queries: &mut Vec<FilterSet>, filters: FilterSet) -> usize {
    match queries.iter().position(|q| *q == filters) {
        Some(idx) => idx,
        None => {
            queries.push(filters);
            queries.len() - 1
        }
    }
}

fn item_values<'a>(
    item: &'a CatalogItem,
    dimension: &Dimension,
    attribute: Option<&Attribute>,
) -> Vec<&'a str> {
    match (dimension, attribute) {
        (Dimension::Brand, _) => item.brand.as_deref().into_iter().collect(),
        (_, Some(attribute)) => item
            .values_for(&attribute.slug)
            .iter()
            .map(String::as_str)
            .collect(),
        _ => Vec::new(),
    }
}

fn label_for(scope: &CategoryScope, dimension: &Dimension) -> String {
    match dimension {
        Dimension::Brand => "Brand".to_string(),
        Dimension::Price => "Price".to_string(),
        Dimension::InStock => "In stock".to_string(),
        Dimension::OnSale => "On sale".to_string(),
        _ => scope
            .attribute_for(dimension)
            .map(|a| a.name.clone())
            .unwrap_or_else(|| dimension.key()),
    }
}
