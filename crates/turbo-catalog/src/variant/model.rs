//! Variant types.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attribute::value_key;
use crate::ids::{ProductId, VariantId};
use crate::money::Money;

/// One attribute value a variant is defined by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantOption {
    pub attribute_slug: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
}

impl VariantOption {
    pub fn new(attribute_slug: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute_slug: attribute_slug.into(),
            value: value.into(),
            color_hex: None,
        }
    }
}

/// Order-independent identity of an option tuple.
///
/// Slugs and values are compared trimmed and case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OptionKey(BTreeSet<(String, String)>);

impl OptionKey {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(slug, value)| (value_key(slug), value_key(value)))
                .collect(),
        )
    }

    pub fn from_options(options: &[VariantOption]) -> Self {
        Self::from_pairs(
            options
                .iter()
                .map(|o| (o.attribute_slug.as_str(), o.value.as_str())),
        )
    }

    /// Parse a `slug=value|slug=value` key. Segments without `=` are ignored.
    pub fn parse(key: &str) -> Self {
        Self::from_pairs(key.split('|').filter_map(|segment| segment.split_once('=')))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (slug, value) in &self.0 {
            if !first {
                f.write_str("|")?;
            }
            first = false;
            write!(f, "{}={}", slug, value)?;
        }
        Ok(())
    }
}

/// A stored product variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub name: String,
    pub sku: String,
    pub price: Money,
    #[serde(default)]
    pub sale_price: Option<Money>,
    #[serde(default)]
    pub cost_price: Option<Money>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub options: Vec<VariantOption>,
    #[serde(default)]
    pub position: u32,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Variant {
    /// Materialize a new variant with a fresh id.
    pub fn from_new(new: NewVariant) -> Self {
        Self {
            id: VariantId::generate(),
            product_id: new.product_id,
            name: new.name,
            sku: new.sku,
            price: new.price,
            sale_price: new.sale_price,
            cost_price: new.cost_price,
            stock: new.stock,
            is_default: new.is_default,
            options: new.options,
            position: new.position,
            created_at: Utc::now(),
        }
    }

    pub fn option_key(&self) -> OptionKey {
        OptionKey::from_options(&self.options)
    }

    /// Value of one option, by attribute slug.
    pub fn option(&self, attribute_slug: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.attribute_slug == attribute_slug)
            .map(|o| o.value.as_str())
    }

    pub fn effective_price(&self) -> Money {
        self.sale_price.unwrap_or(self.price)
    }
}

/// Insert payload for a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVariant {
    pub product_id: ProductId,
    pub name: String,
    pub sku: String,
    pub price: Money,
    pub sale_price: Option<Money>,
    pub cost_price: Option<Money>,
    pub stock: i64,
    pub is_default: bool,
    pub options: Vec<VariantOption>,
    pub position: u32,
}

impl NewVariant {
    pub fn option_key(&self) -> OptionKey {
        OptionKey::from_options(&self.options)
    }
}

/// Product-level pricing new variants inherit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasePricing {
    pub price: Money,
    #[serde(default)]
    pub sale_price: Option<Money>,
    #[serde(default)]
    pub cost_price: Option<Money>,
    #[serde(default)]
    pub stock: i64,
}

impl BasePricing {
    pub fn new(price: Money) -> Self {
        Self {
            price,
            sale_price: None,
            cost_price: None,
            stock: 0,
        }
    }

    pub fn with_stock(mut self, stock: i64) -> Self {
        self.stock = stock;
        self
    }

    pub fn with_sale_price(mut self, sale_price: Money) -> Self {
        self.sale_price = Some(sale_price);
        self
    }

    pub fn with_cost_price(mut self, cost_price: Money) -> Self {
        self.cost_price = Some(cost_price);
        self
    }

    /// Pricing with any overridden fields replaced.
    pub fn apply(&self, overrides: Option<&PricingOverride>) -> BasePricing {
        let Some(o) = overrides else {
            return *self;
        };
        BasePricing {
            price: o.price.unwrap_or(self.price),
            sale_price: o.sale_price.or(self.sale_price),
            cost_price: o.cost_price.or(self.cost_price),
            stock: o.stock.unwrap_or(self.stock),
        }
    }
}

/// Per-combination pricing adjustments. Unset fields inherit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingOverride {
    pub price: Option<Money>,
    pub sale_price: Option<Money>,
    pub cost_price: Option<Money>,
    pub stock: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_key_ignores_order_and_case() {
        let a = OptionKey::from_pairs([("size", "M"), ("color", "Red")]);
        let b = OptionKey::from_pairs([("color", " red "), ("Size", "m")]);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "color=red|size=m");
        assert_eq!(OptionKey::parse("Size=M | color=Red|junk"), a);
    }

    #[test]
    fn test_pricing_override_inherits_unset_fields() {
        let base = BasePricing::new(Money::cents(2000))
            .with_stock(5)
            .with_cost_price(Money::cents(800));
        let o = PricingOverride {
            price: Some(Money::cents(2500)),
            ..Default::default()
        };
        let priced = base.apply(Some(&o));
        assert_eq!(priced.price, Money::cents(2500));
        assert_eq!(priced.stock, 5);
        assert_eq!(priced.cost_price, Some(Money::cents(800)));
        assert_eq!(base.apply(None), base);
    }

    #[test]
    fn test_variant_from_new() {
        let new = NewVariant {
            product_id: ProductId::new("tee"),
            name: "M / Red".into(),
            sku: "TEE-M-RED".into(),
            price: Money::cents(2000),
            sale_price: None,
            cost_price: None,
            stock: 3,
            is_default: true,
            options: vec![VariantOption::new("size", "M"), VariantOption::new("color", "Red")],
            position: 0,
        };
        let key = new.option_key();
        let variant = Variant::from_new(new);
        assert_eq!(variant.option_key(), key);
        assert_eq!(variant.option("color"), Some("Red"));
        assert!(variant.is_default);
    }
}
