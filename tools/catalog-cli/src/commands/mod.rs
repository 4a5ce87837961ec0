//! CLI command implementations.

pub mod config;
pub mod facets;
pub mod variants;

use clap::{Args, Subcommand};

/// Fixture file used when `--fixture` is not given.
pub const DEFAULT_FIXTURE: &str = "catalog.json";

/// Arguments for the facets command.
#[derive(Args)]
pub struct FacetsArgs {
    /// Category slug to compute facets for
    pub category: String,

    /// Catalog fixture (JSON)
    #[arg(short, long, default_value = DEFAULT_FIXTURE)]
    pub fixture: String,

    /// Select a brand (repeatable)
    #[arg(long = "brand")]
    pub brands: Vec<String>,

    /// Select a size (repeatable)
    #[arg(long = "size")]
    pub sizes: Vec<String>,

    /// Select a color (repeatable)
    #[arg(long = "color")]
    pub colors: Vec<String>,

    /// Select an attribute value as slug=value (repeatable)
    #[arg(long = "attr", value_name = "SLUG=VALUE")]
    pub attributes: Vec<String>,

    /// Minimum price in minor units
    #[arg(long)]
    pub min_price: Option<i64>,

    /// Maximum price in minor units
    #[arg(long)]
    pub max_price: Option<i64>,

    /// Only items with stock
    #[arg(long)]
    pub in_stock: bool,

    /// Only items on sale
    #[arg(long)]
    pub on_sale: bool,
}

/// Arguments for the variants command.
#[derive(Args)]
pub struct VariantsArgs {
    #[command(subcommand)]
    pub command: VariantsCommand,
}

/// Shared selection arguments for variant commands.
#[derive(Args)]
pub struct SelectionArgs {
    /// Product id in the fixture
    #[arg(short, long)]
    pub product: String,

    /// Attribute values as slug=v1,v2 (repeatable)
    #[arg(short, long = "select", value_name = "SLUG=VALUES", required = true)]
    pub selections: Vec<String>,

    /// SKU root (defaults to the product SKU)
    #[arg(long)]
    pub sku_root: Option<String>,

    /// Catalog fixture (JSON)
    #[arg(short, long, default_value = DEFAULT_FIXTURE)]
    pub fixture: String,
}

#[derive(Subcommand)]
pub enum VariantsCommand {
    /// List the combinations a selection yields
    Preview {
        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Create the missing variants for a product
    Generate {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Write created variants back to the fixture
        #[arg(long)]
        save: bool,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Validate the configuration
    Validate,

    /// Write a default catalog.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Split `slug=value` into its parts.
pub fn split_pair(raw: &str) -> anyhow::Result<(String, String)> {
    match raw.split_once('=') {
        Some((slug, value)) if !slug.trim().is_empty() && !value.trim().is_empty() => {
            Ok((slug.trim().to_lowercase(), value.trim().to_string()))
        }
        _ => anyhow::bail!("Expected slug=value, got '{}'", raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pair() {
        assert_eq!(
            split_pair(" Material = Cotton ").unwrap(),
            ("material".to_string(), "Cotton".to_string())
        );
        assert!(split_pair("material").is_err());
        assert!(split_pair("=cotton").is_err());
        assert!(split_pair("material=").is_err());
    }
}
