//! Attribute model shared by facet aggregation and variant generation.
//!
//! An attribute ("Size", "Color", "Material") owns an ordered list of
//! values. Its [`PriorityClass`] drives the word order of generated variant
//! names and SKU segments, and the order dynamic facets are listed in.
//! Classification is a pure function of the attribute's name so it never
//! shifts with whatever values happen to be selected.

use crate::error::CatalogError;
use crate::ids::{AttributeId, AttributeValueId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// Ordering class of an attribute. Lower ranks come first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum PriorityClass {
    Size = 1,
    Color = 2,
    Material = 3,
    Style = 4,
    #[default]
    Other = 5,
}

impl PriorityClass {
    pub fn rank(&self) -> u8 {
        *self as u8
    }

    pub fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            1 => Some(PriorityClass::Size),
            2 => Some(PriorityClass::Color),
            3 => Some(PriorityClass::Material),
            4 => Some(PriorityClass::Style),
            5 => Some(PriorityClass::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityClass::Size => "size",
            PriorityClass::Color => "color",
            PriorityClass::Material => "material",
            PriorityClass::Style => "style",
            PriorityClass::Other => "other",
        }
    }
}

/// How an attribute's values are rendered and what metadata they carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Plain text chips.
    #[default]
    Text,
    /// Swatches; values may carry a `color_hex`.
    Color,
}

const SIZE_KEYWORDS: &[&str] = &["size", "talla", "tamano", "taille", "groesse", "grosse", "dimension"];
const COLOR_KEYWORDS: &[&str] = &["color", "colour", "shade", "couleur", "farbe"];
const MATERIAL_KEYWORDS: &[&str] = &["material", "fabric", "composition", "tejido"];
const STYLE_KEYWORDS: &[&str] = &["style", "estilo", "pattern", "design", "diseno"];

/// Classify an attribute by name using keyword matching.
///
/// Unrecognized names fall back to [`PriorityClass::Other`], which sorts last.
pub fn classify(name: &str) -> PriorityClass {
    let normalized = fold_ascii(name).to_lowercase();
    let matches = |words: &[&str]| words.iter().any(|w| normalized.contains(w));

    if matches(SIZE_KEYWORDS) {
        PriorityClass::Size
    } else if matches(COLOR_KEYWORDS) {
        PriorityClass::Color
    } else if matches(MATERIAL_KEYWORDS) {
        PriorityClass::Material
    } else if matches(STYLE_KEYWORDS) {
        PriorityClass::Style
    } else {
        PriorityClass::Other
    }
}

/// Whether the attribute renders as color swatches.
///
/// Depends only on the declared kind and the name, never on the values.
pub fn is_color_attribute(attribute: &Attribute) -> bool {
    attribute.value_kind == ValueKind::Color || classify(&attribute.name) == PriorityClass::Color
}

/// Replace common Latin accented characters with their ASCII base letters.
pub fn fold_ascii(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => out.push('a'),
            'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => out.push('A'),
            'é' | 'è' | 'ê' | 'ë' => out.push('e'),
            'É' | 'È' | 'Ê' | 'Ë' => out.push('E'),
            'í' | 'ì' | 'î' | 'ï' => out.push('i'),
            'Í' | 'Ì' | 'Î' | 'Ï' => out.push('I'),
            'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'ø' => out.push('o'),
            'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' | 'Ø' => out.push('O'),
            'ú' | 'ù' | 'û' | 'ü' => out.push('u'),
            'Ú' | 'Ù' | 'Û' | 'Ü' => out.push('U'),
            'ñ' => out.push('n'),
            'Ñ' => out.push('N'),
            'ç' => out.push('c'),
            'Ç' => out.push('C'),
            'ß' => out.push_str("ss"),
            'æ' => out.push_str("ae"),
            'Æ' => out.push_str("AE"),
            'œ' => out.push_str("oe"),
            'Œ' => out.push_str("OE"),
            _ => out.push(c),
        }
    }
    out
}

/// URL-friendly slug: ASCII-folded, lowercased, non-alphanumerics collapsed to `-`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for c in fold_ascii(input).chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Comparison key for attribute values: trimmed and lowercased.
pub(crate) fn value_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// A single option of an attribute (e.g., "M", "Red").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttributeValue {
    #[serde(default = "AttributeValueId::generate")]
    pub id: AttributeValueId,
    pub value: String,
    /// Swatch color for color attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
}

impl AttributeValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            id: AttributeValueId::generate(),
            value: value.into(),
            color_hex: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<AttributeValueId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_color(mut self, hex: impl Into<String>) -> Self {
        self.color_hex = Some(hex.into());
        self
    }
}

/// Closed description of an attribute's typing, without its values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    pub slug: String,
    pub display_name: String,
    pub priority_class: PriorityClass,
    pub value_kind: ValueKind,
}

/// An attribute with its ordered values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "AttributeRecord")]
pub struct Attribute {
    pub id: AttributeId,
    /// Display name (e.g., "Size").
    pub name: String,
    /// Unique within an attribute set.
    pub slug: String,
    pub priority_class: PriorityClass,
    pub value_kind: ValueKind,
    /// Values in display order.
    pub values: Vec<AttributeValue>,
    /// Whether the attribute is offered as a storefront filter.
    pub filterable: bool,
}

impl Attribute {
    /// Create an attribute, deriving slug, priority and value kind from the name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let priority_class = classify(&name);
        Self {
            id: AttributeId::generate(),
            slug: slugify(&name),
            value_kind: default_kind(priority_class),
            priority_class,
            name,
            values: Vec::new(),
            filterable: true,
        }
    }

    pub fn with_id(mut self, id: impl Into<AttributeId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    pub fn with_priority(mut self, priority_class: PriorityClass) -> Self {
        self.priority_class = priority_class;
        self
    }

    pub fn with_kind(mut self, value_kind: ValueKind) -> Self {
        self.value_kind = value_kind;
        self
    }

    pub fn with_filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    /// Append a value. Duplicates are logged and skipped; use
    /// [`Attribute::add_value`] to handle them.
    pub fn with_value(mut self, value: AttributeValue) -> Self {
        if let Err(err) = self.add_value(value) {
            warn!(%err, "skipping attribute value");
        }
        self
    }

    /// Append plain text values, with ids derived from the attribute slug.
    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for value in values {
            let value = value.into();
            let id = format!("{}-{}", self.slug, slugify(&value));
            if let Err(err) = self.add_value(AttributeValue::new(value).with_id(id)) {
                warn!(%err, "skipping attribute value");
            }
        }
        self
    }

    /// Append a value, rejecting a name already present.
    pub fn add_value(&mut self, value: AttributeValue) -> Result<(), CatalogError> {
        if self.position_of(&value.value).is_some() {
            return Err(CatalogError::DuplicateAttributeValue {
                attribute: self.slug.clone(),
                value: value.value,
            });
        }
        self.values.push(value);
        Ok(())
    }

    pub fn descriptor(&self) -> AttributeDescriptor {
        AttributeDescriptor {
            slug: self.slug.clone(),
            display_name: self.name.clone(),
            priority_class: self.priority_class,
            value_kind: self.value_kind,
        }
    }

    pub fn is_color(&self) -> bool {
        is_color_attribute(self)
    }

    pub fn value_by_id(&self, id: &AttributeValueId) -> Option<&AttributeValue> {
        self.values.iter().find(|v| &v.id == id)
    }

    /// Look up a value by name, ignoring case and surrounding whitespace.
    pub fn value_named(&self, value: &str) -> Option<&AttributeValue> {
        self.position_of(value).map(|idx| &self.values[idx])
    }

    /// Declared position of a value, ignoring case.
    pub fn position_of(&self, value: &str) -> Option<usize> {
        let key = value_key(value);
        self.values.iter().position(|v| value_key(&v.value) == key)
    }

    /// Check structural invariants: non-empty slug, unique values.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.slug.trim().is_empty() {
            return Err(CatalogError::InvalidAttribute(format!(
                "attribute '{}' has an empty slug",
                self.name
            )));
        }
        let mut seen = HashSet::new();
        for value in &self.values {
            if value.value.trim().is_empty() {
                return Err(CatalogError::InvalidAttribute(format!(
                    "attribute '{}' has a blank value",
                    self.slug
                )));
            }
            if !seen.insert(value_key(&value.value)) {
                return Err(CatalogError::DuplicateAttributeValue {
                    attribute: self.slug.clone(),
                    value: value.value.clone(),
                });
            }
        }
        Ok(())
    }

    /// Like [`Attribute::validate`], plus a filterable attribute must have values.
    pub fn validate_filterable(&self) -> Result<(), CatalogError> {
        self.validate()?;
        if self.filterable && self.values.is_empty() {
            return Err(CatalogError::InvalidAttribute(format!(
                "filterable attribute '{}' has no values",
                self.slug
            )));
        }
        Ok(())
    }
}

fn default_kind(priority_class: PriorityClass) -> ValueKind {
    if priority_class == PriorityClass::Color {
        ValueKind::Color
    } else {
        ValueKind::Text
    }
}

/// Wire form of [`Attribute`] where everything derivable is optional.
#[derive(Deserialize)]
struct AttributeRecord {
    #[serde(default)]
    id: Option<AttributeId>,
    name: String,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    priority_class: Option<PriorityClass>,
    #[serde(default)]
    value_kind: Option<ValueKind>,
    #[serde(default)]
    values: Vec<AttributeValue>,
    #[serde(default = "default_filterable")]
    filterable: bool,
}

fn default_filterable() -> bool {
    true
}

impl From<AttributeRecord> for Attribute {
    fn from(record: AttributeRecord) -> Self {
        let priority_class = record
            .priority_class
            .unwrap_or_else(|| classify(&record.name));
        Self {
            id: record.id.unwrap_or_else(AttributeId::generate),
            slug: record
                .slug
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| slugify(&record.name)),
            value_kind: record.value_kind.unwrap_or(default_kind(priority_class)),
            priority_class,
            name: record.name,
            values: record.values,
            filterable: record.filterable,
        }
    }
}

/// Ordered collection of attributes with unique slugs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AttributeSet {
    attributes: Vec<Attribute>,
}

impl AttributeSet {
    /// Build a set, rejecting duplicate slugs and malformed attributes.
    pub fn new(attributes: Vec<Attribute>) -> Result<Self, CatalogError> {
        let mut slugs = HashSet::new();
        for attribute in &attributes {
            attribute.validate()?;
            if !slugs.insert(attribute.slug.clone()) {
                return Err(CatalogError::DuplicateAttributeSlug(attribute.slug.clone()));
            }
        }
        Ok(Self { attributes })
    }

    pub fn get(&self, slug: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.slug == slug)
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.get(slug).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.attributes.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// First filterable attribute of the given class, in declaration order.
    pub fn first_of_class(&self, class: PriorityClass) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.filterable && a.priority_class == class)
    }

    /// Attributes sorted by priority class; ties keep declaration order.
    pub fn sorted_by_priority(&self) -> Vec<&Attribute> {
        let mut sorted: Vec<&Attribute> = self.attributes.iter().collect();
        sorted.sort_by_key(|a| a.priority_class);
        sorted
    }

    pub fn into_vec(self) -> Vec<Attribute> {
        self.attributes
    }
}

impl<'a> IntoIterator for &'a AttributeSet {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.attributes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_vocabularies() {
        assert_eq!(classify("Size"), PriorityClass::Size);
        assert_eq!(classify("Shoe sizes"), PriorityClass::Size);
        assert_eq!(classify("Talla"), PriorityClass::Size);
        assert_eq!(classify("Größe"), PriorityClass::Size);
        assert_eq!(classify("Colour"), PriorityClass::Color);
        assert_eq!(classify("Fabric"), PriorityClass::Material);
        assert_eq!(classify("Print pattern"), PriorityClass::Style);
        assert_eq!(classify("Diseño"), PriorityClass::Style);
        assert_eq!(classify("Warranty"), PriorityClass::Other);
    }

    #[test]
    fn test_priority_ranks() {
        assert_eq!(PriorityClass::Size.rank(), 1);
        assert_eq!(PriorityClass::Other.rank(), 5);
        assert_eq!(PriorityClass::from_rank(3), Some(PriorityClass::Material));
        assert_eq!(PriorityClass::from_rank(9), None);
        assert!(PriorityClass::Size < PriorityClass::Color);
    }

    #[test]
    fn test_color_detection_ignores_values() {
        let color = Attribute::new("Color");
        assert!(is_color_attribute(&color));
        assert_eq!(color.value_kind, ValueKind::Color);

        let finish = Attribute::new("Finish").with_kind(ValueKind::Color);
        assert!(is_color_attribute(&finish));

        let size = Attribute::new("Size").with_value(AttributeValue::new("Red").with_color("#f00"));
        assert!(!is_color_attribute(&size));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Shoe Size"), "shoe-size");
        assert_eq!(slugify("  Diseño / Estilo "), "diseno-estilo");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn test_duplicate_value_rejected() {
        let mut size = Attribute::new("Size").with_values(["S", "M"]);
        let err = size.add_value(AttributeValue::new(" m ")).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateAttributeValue { .. }));
        assert_eq!(size.values.len(), 2);
    }

    #[test]
    fn test_builders_skip_duplicate_values() {
        let size = Attribute::new("Size")
            .with_values(["S", "s", "M"])
            .with_value(AttributeValue::new("M ").with_id("dup"));
        let names: Vec<&str> = size.values.iter().map(|v| v.value.as_str()).collect();
        assert_eq!(names, vec!["S", "M"]);
        assert!(size.value_by_id(&AttributeValueId::new("dup")).is_none());
    }

    #[test]
    fn test_value_lookup() {
        let size = Attribute::new("Size").with_values(["S", "M", "L"]);
        assert_eq!(size.position_of("l"), Some(2));
        assert_eq!(size.value_named("M").map(|v| v.id.as_str()), Some("size-m"));
        assert!(size.value_by_id(&AttributeValueId::new("size-s")).is_some());
    }

    #[test]
    fn test_validate_filterable_requires_values() {
        let empty = Attribute::new("Material");
        assert!(empty.validate().is_ok());
        assert!(empty.validate_filterable().is_err());
        assert!(empty.with_filterable(false).validate_filterable().is_ok());
    }

    #[test]
    fn test_attribute_set_rejects_duplicate_slugs() {
        let err = AttributeSet::new(vec![Attribute::new("Size"), Attribute::new("size")]).unwrap_err();
        assert_eq!(err, CatalogError::DuplicateAttributeSlug("size".into()));
    }

    #[test]
    fn test_sorted_by_priority_is_stable() {
        let set = AttributeSet::new(vec![
            Attribute::new("Warranty"),
            Attribute::new("Color"),
            Attribute::new("Size"),
            Attribute::new("Gift wrap"),
        ])
        .unwrap();
        let order: Vec<&str> = set.sorted_by_priority().iter().map(|a| a.slug.as_str()).collect();
        assert_eq!(order, vec!["size", "color", "warranty", "gift-wrap"]);
    }

    #[test]
    fn test_attribute_deserialize_derives_missing_fields() {
        let attr: Attribute = serde_json::from_str(
            r##"{"name": "Colour", "values": [{"value": "Red", "color_hex": "#ff0000"}]}"##,
        )
        .unwrap();
        assert_eq!(attr.slug, "colour");
        assert_eq!(attr.priority_class, PriorityClass::Color);
        assert_eq!(attr.value_kind, ValueKind::Color);
        assert!(attr.filterable);
        assert_eq!(attr.values[0].color_hex.as_deref(), Some("#ff0000"));
    }
}
