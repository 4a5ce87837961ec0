//! Category types for product organization.

use crate::attribute::slugify;
use crate::ids::CategoryId;
use serde::{Deserialize, Serialize};

/// A product category in the catalog hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    /// Parent category ID (None for root categories).
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    pub name: String,
    /// URL-friendly slug, unique across the catalog.
    pub slug: String,
    /// Depth in the hierarchy (0 = root).
    #[serde(default)]
    pub level: i32,
    /// Materialized path of ids from the root (e.g., "1/5/12").
    #[serde(default)]
    pub path: String,
}

impl Category {
    /// Create a new root category.
    pub fn new_root(name: impl Into<String>) -> Self {
        let name = name.into();
        let id = CategoryId::generate();
        Self {
            path: id.as_str().to_string(),
            id,
            parent_id: None,
            slug: slugify(&name),
            name,
            level: 0,
        }
    }

    /// Create a new child category under `parent`.
    pub fn new_child(parent: &Category, name: impl Into<String>) -> Self {
        let name = name.into();
        let id = CategoryId::generate();
        Self {
            path: format!("{}/{}", parent.path, id.as_str()),
            id,
            parent_id: Some(parent.id.clone()),
            slug: slugify(&name),
            name,
            level: parent.level + 1,
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// True when `self` sits strictly below `other` in the tree.
    pub fn is_descendant_of(&self, other: &Category) -> bool {
        self.id != other.id && self.path.starts_with(&format!("{}/", other.path))
    }

    /// True for `other` itself and anything below it.
    pub fn is_within(&self, other: &Category) -> bool {
        self.id == other.id || self.is_descendant_of(other)
    }

    /// Ancestor ids from the root down, excluding this category.
    pub fn ancestor_ids(&self) -> Vec<CategoryId> {
        self.path
            .split('/')
            .filter(|s| !s.is_empty() && *s != self.id.as_str())
            .map(CategoryId::new)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_category() {
        let cat = Category::new_root("Men's Clothing");
        assert!(cat.is_root());
        assert_eq!(cat.level, 0);
        assert_eq!(cat.slug, "men-s-clothing");
    }

    #[test]
    fn test_hierarchy() {
        let root = Category::new_root("Clothing");
        let child = Category::new_child(&root, "Shirts");
        let grandchild = Category::new_child(&child, "Polos");

        assert!(child.is_descendant_of(&root));
        assert!(grandchild.is_descendant_of(&root));
        assert!(grandchild.is_within(&child));
        assert!(root.is_within(&root));
        assert!(!root.is_descendant_of(&root));
        assert!(!root.is_descendant_of(&child));
        assert_eq!(grandchild.ancestor_ids(), vec![root.id.clone(), child.id.clone()]);
    }

    #[test]
    fn test_path_prefix_is_not_descent() {
        let mut a = Category::new_root("A");
        a.id = CategoryId::new("1");
        a.path = "1".into();
        let mut b = Category::new_root("B");
        b.id = CategoryId::new("12");
        b.path = "12".into();
        assert!(!b.is_descendant_of(&a));
    }
}
