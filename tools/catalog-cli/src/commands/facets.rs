//! Facets command.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use turbo_catalog::search::{FacetAggregator, FilterSet, PriceRange};
use turbo_catalog::store::CatalogFixture;

use super::{split_pair, FacetsArgs};
use crate::context::Context;
use crate::output::format_cents;

/// Run the facets command.
pub async fn run(args: FacetsArgs, ctx: &Context) -> Result<()> {
    let output = &ctx.output;
    let fixture_path = ctx.resolve_path(&args.fixture);
    output.debug(&format!("Loading fixture: {}", fixture_path.display()));

    let fixture = CatalogFixture::load(&fixture_path)
        .with_context(|| format!("Failed to load fixture: {}", fixture_path.display()))?;
    let store = Arc::new(fixture.into_store()?);

    let filters = build_filters(&args)?;
    let aggregator = FacetAggregator::new(store).with_config(ctx.config.facets.clone());
    let report = aggregator.compute_facets(&args.category, &filters).await?;

    if output.is_json() {
        output.json(&report);
        return Ok(());
    }

    output.header(&format!("Facets for '{}'", report.category_slug));
    output.kv("Matching items", &report.total_matching.to_string());
    if let Some(bounds) = &report.price_bounds {
        output.kv(
            "Price range",
            &format!(
                "{} - {}",
                format_cents(bounds.min_cents),
                format_cents(bounds.max_cents)
            ),
        );
    }

    for warning in &report.warnings {
        output.warn(&warning.to_string());
    }

    for facet in &report.facets {
        output.facet(facet);
    }

    Ok(())
}

fn build_filters(args: &FacetsArgs) -> Result<FilterSet> {
    let mut filters = FilterSet::new();
    filters.brands.extend(args.brands.iter().cloned());
    filters.sizes.extend(args.sizes.iter().cloned());
    filters.colors.extend(args.colors.iter().cloned());
    for raw in &args.attributes {
        let (slug, value) = split_pair(raw)?;
        filters.attributes.entry(slug).or_default().insert(value);
    }

    filters.price_range = match (args.min_price, args.max_price) {
        (None, None) => None,
        (min, max) => Some(PriceRange::new(min.unwrap_or(0), max.unwrap_or(i64::MAX))?),
    };
    filters.in_stock = args.in_stock;
    filters.on_sale = args.on_sale;
    Ok(filters)
}
