//! Configuration management commands.

use std::fs;

use anyhow::{bail, Context as _, Result};
use turbo_catalog::config::{ZeroCountPolicy, RECOMMENDED_DEBOUNCE_MS};
use turbo_catalog::CatalogConfig;

use super::{ConfigArgs, ConfigCommand};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx).await,
        ConfigCommand::Init { force } => init_config(force, ctx).await,
        ConfigCommand::Validate => validate_config(ctx).await,
    }
}

async fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("source", &path.display().to_string()),
        None => ctx.output.kv("source", "built-in defaults"),
    }

    let facets = &ctx.config.facets;
    ctx.output.info("[facets]");
    ctx.output.kv("include_brand", &facets.include_brand.to_string());
    ctx.output.kv("include_in_stock", &facets.include_in_stock.to_string());
    ctx.output.kv("include_on_sale", &facets.include_on_sale.to_string());
    ctx.output.kv("zero_counts", zero_count_name(facets.zero_counts));

    let variants = &ctx.config.variants;
    ctx.output.info("[variants]");
    ctx.output.kv("sku_separator", &format!("{:?}", variants.sku_separator));
    ctx.output.kv("max_sku_token_len", &variants.max_sku_token_len.to_string());
    ctx.output.kv("fallback_sku_root", &variants.fallback_sku_root);
    ctx.output.kv("name_separator", &format!("{:?}", variants.name_separator));
    ctx.output.kv("max_combinations", &variants.max_combinations.to_string());

    ctx.output.info("[filter_state]");
    ctx.output.kv("debounce_ms", &ctx.config.filter_state.debounce_ms.to_string());

    Ok(())
}

fn zero_count_name(policy: ZeroCountPolicy) -> &'static str {
    match policy {
        ZeroCountPolicy::Omit => "omit",
        ZeroCountPolicy::IncludeDisabled => "include_disabled",
    }
}

async fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join("catalog.toml");

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let content = generate_default_config()?;
    fs::write(&config_path, content)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}

/// Render the default configuration as commented TOML.
pub fn generate_default_config() -> Result<String> {
    let body = toml::to_string_pretty(&CatalogConfig::default())
        .context("Failed to render default config")?;
    Ok(format!(
        "# Catalog configuration\n# zero_counts: \"omit\" or \"include_disabled\"\n\n{}",
        body
    ))
}

async fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    if let Err(e) = ctx.config.validate() {
        errors.push(e.to_string());
    }

    let debounce = ctx.config.filter_state.debounce_ms;
    if debounce > 0 && !RECOMMENDED_DEBOUNCE_MS.contains(&debounce) {
        warnings.push(format!(
            "filter_state.debounce_ms {} is outside the recommended {}-{} ms",
            debounce,
            RECOMMENDED_DEBOUNCE_MS.start(),
            RECOMMENDED_DEBOUNCE_MS.end()
        ));
    }

    if ctx.config.variants.max_combinations > 5_000 {
        warnings.push(format!(
            "variants.max_combinations {} allows very large batches",
            ctx.config.variants.max_combinations
        ));
    }

    if ctx.config_path.is_none() {
        warnings.push("No config file found, using defaults".to_string());
    }

    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips() {
        let content = generate_default_config().unwrap();
        let parsed = CatalogConfig::from_toml_str(&content).unwrap();
        assert_eq!(parsed, CatalogConfig::default());
        assert!(parsed.validate().is_ok());
    }
}
