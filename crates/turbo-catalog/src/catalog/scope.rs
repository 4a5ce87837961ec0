//! Category scope: a category, its descendants, and its attribute set.

use crate::attribute::{Attribute, AttributeSet, PriorityClass};
use crate::catalog::{CatalogItem, Category};
use crate::ids::CategoryId;
use crate::search::Dimension;
use serde::Serialize;

/// The slice of the catalog a facet computation runs over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryScope {
    pub category: Category,
    /// The category itself plus every descendant.
    pub category_ids: Vec<CategoryId>,
    /// Attributes published for the category.
    pub attributes: AttributeSet,
}

impl CategoryScope {
    /// Build a scope from a category and any candidates for descendants.
    ///
    /// Entries of `all_categories` that are not within `category` are ignored.
    pub fn new(category: Category, all_categories: &[Category], attributes: AttributeSet) -> Self {
        let mut category_ids = vec![category.id.clone()];
        category_ids.extend(
            all_categories
                .iter()
                .filter(|c| c.is_descendant_of(&category))
                .map(|c| c.id.clone()),
        );
        Self {
            category,
            category_ids,
            attributes,
        }
    }

    pub fn slug(&self) -> &str {
        &self.category.slug
    }

    /// True when the item is listed in the category or a descendant.
    pub fn contains(&self, item: &CatalogItem) -> bool {
        item.category_ids
            .iter()
            .any(|id| self.category_ids.contains(id))
    }

    /// The attribute backing the size dimension.
    pub fn size_attribute(&self) -> Option<&Attribute> {
        self.attributes.first_of_class(PriorityClass::Size)
    }

    /// The attribute backing the color dimension.
    pub fn color_attribute(&self) -> Option<&Attribute> {
        self.attributes.first_of_class(PriorityClass::Color)
    }

    /// Attribute that backs a dimension, if the scope has one.
    pub fn attribute_for(&self, dimension: &Dimension) -> Option<&Attribute> {
        match dimension {
            Dimension::Size => self.size_attribute(),
            Dimension::Color => self.color_attribute(),
            Dimension::Attribute(slug) => self.attributes.get(slug).filter(|a| a.filterable),
            _ => None,
        }
    }

    /// Filterable attributes other than the size/color ones, by priority.
    pub fn dynamic_attributes(&self) -> Vec<&Attribute> {
        let size = self.size_attribute().map(|a| a.slug.as_str());
        let color = self.color_attribute().map(|a| a.slug.as_str());
        self.attributes
            .sorted_by_priority()
            .into_iter()
            .filter(|a| a.filterable)
            .filter(|a| Some(a.slug.as_str()) != size && Some(a.slug.as_str()) != color)
            .collect()
    }

    /// Map an attribute slug onto the dimension that owns it.
    pub fn dimension_for_slug(&self, slug: &str) -> Option<Dimension> {
        if self.size_attribute().map(|a| a.slug.as_str()) == Some(slug) {
            Some(Dimension::Size)
        } else if self.color_attribute().map(|a| a.slug.as_str()) == Some(slug) {
            Some(Dimension::Color)
        } else if self.attributes.get(slug).map(|a| a.filterable).unwrap_or(false) {
            Some(Dimension::Attribute(slug.to_string()))
        } else {
            None
        }
    }
}
