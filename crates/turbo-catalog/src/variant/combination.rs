//! Option selections and their Cartesian product.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attribute::Attribute;
use crate::config::VariantConfig;
use crate::error::{CatalogError, CatalogResult};
use crate::ids::AttributeValueId;
use crate::variant::sku::{attribute_tokens, compose_sku, sku_root};
use crate::variant::{OptionKey, VariantOption};

/// Values chosen for one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSelection {
    pub attribute_slug: String,
    pub value_ids: Vec<AttributeValueId>,
}

/// Chosen values per attribute, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selections(Vec<AttributeSelection>);

impl Selections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add values for an attribute, merging with an earlier selection of the same slug.
    pub fn select<I, V>(mut self, attribute_slug: impl Into<String>, value_ids: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<AttributeValueId>,
    {
        let attribute_slug = attribute_slug.into();
        let ids: Vec<AttributeValueId> = value_ids.into_iter().map(Into::into).collect();
        match self.0.iter_mut().find(|s| s.attribute_slug == attribute_slug) {
            Some(existing) => {
                for id in ids {
                    if !existing.value_ids.contains(&id) {
                        existing.value_ids.push(id);
                    }
                }
            }
            None => {
                let mut value_ids = Vec::with_capacity(ids.len());
                for id in ids {
                    if !value_ids.contains(&id) {
                        value_ids.push(id);
                    }
                }
                self.0.push(AttributeSelection {
                    attribute_slug,
                    value_ids,
                });
            }
        }
        self
    }

    pub fn get(&self, attribute_slug: &str) -> Option<&AttributeSelection> {
        self.0.iter().find(|s| s.attribute_slug == attribute_slug)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AttributeSelection> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One attribute value inside a combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinationPart {
    pub attribute_slug: String,
    pub attribute_name: String,
    pub value_id: AttributeValueId,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
}

/// A candidate variant: one value per selected attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantCombination {
    /// Parts in attribute priority order.
    pub parts: Vec<CombinationPart>,
    /// Display name, e.g. `M / Red`.
    pub name: String,
    pub sku: String,
}

impl VariantCombination {
    pub fn option_key(&self) -> OptionKey {
        OptionKey::from_pairs(
            self.parts
                .iter()
                .map(|p| (p.attribute_slug.as_str(), p.value.as_str())),
        )
    }

    /// Canonical `slug=value|slug=value` key, used for pricing overrides.
    pub fn key(&self) -> String {
        self.option_key().to_string()
    }

    pub fn options(&self) -> Vec<VariantOption> {
        self.parts
            .iter()
            .map(|p| VariantOption {
                attribute_slug: p.attribute_slug.clone(),
                value: p.value.clone(),
                color_hex: p.color_hex.clone(),
            })
            .collect()
    }

    pub fn value_of(&self, attribute_slug: &str) -> Option<&str> {
        self.parts
            .iter()
            .find(|p| p.attribute_slug == attribute_slug)
            .map(|p| p.value.as_str())
    }
}

/// A validated attribute with the declared positions of its chosen values.
struct Factor<'a> {
    attribute: &'a Attribute,
    positions: Vec<usize>,
    tokens: Vec<String>,
}

/// Expand selections into every combination, without persisting anything.
///
/// Attributes are ordered by priority class (ties keep selection order) and
/// values by their declared order; the first attribute varies slowest.
/// Value ids are matched first, then value names, case-insensitively.
pub fn preview_combinations(
    attributes: &[Attribute],
    selections: &Selections,
    product_sku: Option<&str>,
    config: &VariantConfig,
) -> CatalogResult<Vec<VariantCombination>> {
    if selections.is_empty() {
        return Err(CatalogError::NothingSelected);
    }

    let mut factors = Vec::with_capacity(selections.len());
    for selection in selections.iter() {
        let attribute = attributes
            .iter()
            .find(|a| a.slug == selection.attribute_slug)
            .ok_or_else(|| CatalogError::UnknownAttribute(selection.attribute_slug.clone()))?;
        if selection.value_ids.is_empty() {
            return Err(CatalogError::EmptySelection {
                attribute: attribute.slug.clone(),
            });
        }

        let mut positions = Vec::with_capacity(selection.value_ids.len());
        for id in &selection.value_ids {
            let position = resolve_value(attribute, id).ok_or_else(|| CatalogError::UnknownValue {
                attribute: attribute.slug.clone(),
                value_id: id.clone(),
            })?;
            if !positions.contains(&position) {
                positions.push(position);
            }
        }
        positions.sort_unstable();

        factors.push(Factor {
            attribute,
            positions,
            tokens: attribute_tokens(attribute, config),
        });
    }
    factors.sort_by_key(|f| f.attribute.priority_class.rank());

    let count = factors
        .iter()
        .try_fold(1usize, |acc, f| acc.checked_mul(f.positions.len()))
        .unwrap_or(usize::MAX);
    if count > config.max_combinations {
        return Err(CatalogError::TooManyCombinations {
            count,
            limit: config.max_combinations,
        });
    }

    let root = sku_root(product_sku, config);
    let mut tuples: Vec<Vec<(usize, usize)>> = vec![Vec::new()];
    for (factor_idx, factor) in factors.iter().enumerate() {
        tuples = tuples
            .into_iter()
            .flat_map(|prefix| {
                factor.positions.iter().map(move |&pos| {
                    let mut tuple = prefix.clone();
                    tuple.push((factor_idx, pos));
                    tuple
                })
            })
            .collect();
    }

    let combinations: Vec<VariantCombination> = tuples
        .into_iter()
        .map(|tuple| build_combination(&factors, &tuple, &root, config))
        .collect();
    debug!(count = combinations.len(), "expanded selections");
    Ok(combinations)
}

fn resolve_value(attribute: &Attribute, id: &AttributeValueId) -> Option<usize> {
    attribute
        .values
        .iter()
        .position(|v| &v.id == id)
        .or_else(|| attribute.position_of(id.as_str()))
}

fn build_combination(
    factors: &[Factor<'_>],
    tuple: &[(usize, usize)],
    root: &str,
    config: &VariantConfig,
) -> VariantCombination {
    let parts: Vec<CombinationPart> = tuple
        .iter()
        .map(|&(factor_idx, pos)| {
            let attribute = factors[factor_idx].attribute;
            let value = &attribute.values[pos];
            CombinationPart {
                attribute_slug: attribute.slug.clone(),
                attribute_name: attribute.name.clone(),
                value_id: value.id.clone(),
                value: value.value.clone(),
                color_hex: if attribute.is_color() {
                    value.color_hex.clone()
                } else {
                    None
                },
            }
        })
        .collect();

    let name = parts
        .iter()
        .map(|p| p.value.as_str())
        .collect::<Vec<_>>()
        .join(&config.name_separator);
    let sku = compose_sku(
        root,
        tuple
            .iter()
            .map(|&(factor_idx, pos)| factors[factor_idx].tokens[pos].as_str()),
        &config.sku_separator,
    );

    VariantCombination { parts, name, sku }
}
