//! Variants command.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use dialoguer::Confirm;
use turbo_catalog::store::{CatalogFixture, MemoryStore, VariantStore};
use turbo_catalog::variant::{GenerationRequest, Selections, SkipReason, VariantGenerator};
use turbo_catalog::ProductId;

use super::{split_pair, SelectionArgs, VariantsArgs, VariantsCommand};
use crate::context::Context;
use crate::output::{format_cents, skip_badge};

/// Run the variants command.
pub async fn run(args: VariantsArgs, ctx: &Context) -> Result<()> {
    match args.command {
        VariantsCommand::Preview { selection } => preview(selection, ctx).await,
        VariantsCommand::Generate {
            selection,
            save,
            yes,
        } => generate(selection, save, yes, ctx).await,
    }
}

struct Loaded {
    fixture: CatalogFixture,
    store: Arc<MemoryStore>,
    product_id: ProductId,
    selections: Selections,
    sku_root: Option<String>,
}

fn load(selection: &SelectionArgs, ctx: &Context) -> Result<Loaded> {
    let path = ctx.resolve_path(&selection.fixture);
    ctx.output.debug(&format!("Loading fixture: {}", path.display()));
    let fixture = CatalogFixture::load(&path)
        .with_context(|| format!("Failed to load fixture: {}", path.display()))?;

    let product_id = ProductId::new(&selection.product);
    let product = match fixture.product(&product_id) {
        Some(product) => product,
        None => bail!("Product '{}' not found in fixture", product_id),
    };
    let sku_root = selection.sku_root.clone().or_else(|| product.sku.clone());

    let selections = parse_selections(&selection.selections)?;
    let store = Arc::new(fixture.clone().into_store()?);

    Ok(Loaded {
        fixture,
        store,
        product_id,
        selections,
        sku_root,
    })
}

/// Parse `slug=v1,v2` arguments into selections.
fn parse_selections(raw: &[String]) -> Result<Selections> {
    let mut selections = Selections::new();
    for arg in raw {
        let (slug, values) = split_pair(arg)?;
        let values: Vec<String> = values
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect();
        selections = selections.select(slug, values);
    }
    Ok(selections)
}

fn generator(store: &Arc<MemoryStore>, ctx: &Context) -> VariantGenerator<MemoryStore, MemoryStore> {
    VariantGenerator::new(store.clone(), store.clone()).with_config(ctx.config.variants.clone())
}

async fn preview(selection: SelectionArgs, ctx: &Context) -> Result<()> {
    let output = &ctx.output;
    let loaded = load(&selection, ctx)?;
    let combinations = generator(&loaded.store, ctx)
        .preview(
            &loaded.product_id,
            &loaded.selections,
            loaded.sku_root.as_deref(),
        )
        .await?;

    if output.is_json() {
        output.json(&combinations);
        return Ok(());
    }

    output.header(&format!(
        "{} combinations for '{}'",
        combinations.len(),
        loaded.product_id
    ));
    let widths = [28, 28];
    output.table_row(&["NAME", "SKU"], &widths);
    output.table_row(&["----", "---"], &widths);
    for combination in &combinations {
        output.table_row(&[combination.name.as_str(), combination.sku.as_str()], &widths);
    }
    Ok(())
}

async fn generate(selection: SelectionArgs, save: bool, yes: bool, ctx: &Context) -> Result<()> {
    let output = &ctx.output;
    let loaded = load(&selection, ctx)?;
    let generator = generator(&loaded.store, ctx);

    let combinations = generator
        .preview(
            &loaded.product_id,
            &loaded.selections,
            loaded.sku_root.as_deref(),
        )
        .await?;

    if !yes && !output.is_json() {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Generate up to {} variants for '{}'?",
                combinations.len(),
                loaded.product_id
            ))
            .default(true)
            .interact()?;
        if !confirmed {
            output.info("Generation cancelled");
            return Ok(());
        }
    }

    let pricing = match loaded.fixture.product(&loaded.product_id) {
        Some(product) => product.pricing(loaded.fixture.currency),
        None => bail!("Product '{}' not found in fixture", loaded.product_id),
    };
    let mut request = GenerationRequest::new(
        loaded.product_id.clone(),
        loaded.selections.clone(),
        pricing,
    );
    if let Some(root) = &loaded.sku_root {
        request = request.with_sku_root(root.clone());
    }

    let spinner = output.spinner("Generating variants...");
    let outcome = generator.generate_variants(&request).await;
    spinner.finish_and_clear();
    let outcome = outcome?;

    if save && !outcome.is_noop() {
        let path = ctx.resolve_path(&selection.fixture);
        save_fixture(loaded.fixture, &loaded.store, &loaded.product_id, &path).await?;
        output.debug(&format!("Saved fixture: {}", path.display()));
    }

    if output.is_json() {
        output.json(&outcome);
        return Ok(());
    }

    output.header("Created");
    if outcome.created.is_empty() {
        output.info("Nothing to create, all combinations already exist");
    }
    let widths = [24, 24, 10, 7];
    for variant in &outcome.created {
        let marker = if variant.is_default { " (default)" } else { "" };
        let name = format!("{}{}", variant.name, marker);
        let price = format_cents(variant.price.amount_cents);
        let stock = variant.stock.to_string();
        output.table_row(
            &[&name, &variant.sku, &price, &stock].map(String::as_str),
            &widths,
        );
    }

    if !outcome.skipped.is_empty() {
        output.header("Skipped");
        for skipped in &outcome.skipped {
            let (kind, detail) = match &skipped.reason {
                SkipReason::AlreadyExists { variant_id } => ("already_exists", variant_id.to_string()),
                SkipReason::SkuCollision {
                    sku,
                    existing_variant_id,
                } => ("sku_collision", format!("{} used by {}", sku, existing_variant_id)),
                SkipReason::Rejected { message } => ("rejected", message.clone()),
            };
            let badge = skip_badge(kind);
            output.table_row(
                &[skipped.combination.name.as_str(), badge.as_str(), detail.as_str()],
                &[24, 16, 32],
            );
        }
    }

    output.success(&format!(
        "Created {} variants, skipped {}",
        outcome.created.len(),
        outcome.skipped.len()
    ));
    Ok(())
}

/// Replace the product's variants in the fixture with the store's view and write it.
async fn save_fixture(
    mut fixture: CatalogFixture,
    store: &MemoryStore,
    product_id: &ProductId,
    path: &Path,
) -> Result<()> {
    let variants = store.list_variants(product_id).await?;
    if let Some(product) = fixture.products.iter_mut().find(|p| &p.id == product_id) {
        product.variants = variants;
    }
    let content = serde_json::to_string_pretty(&fixture).context("Failed to serialize fixture")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write fixture: {}", path.display()))?;
    Ok(())
}
