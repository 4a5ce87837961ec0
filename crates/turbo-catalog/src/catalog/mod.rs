//! Product catalog module.
//!
//! Contains categories, catalog items, and the category scope facets are
//! computed over.

mod category;
mod item;
mod scope;

pub use category::Category;
pub use item::CatalogItem;
pub use scope::CategoryScope;
