//! Catalog CLI - explore facets and generate variants from a catalog fixture.
//!
//! Commands:
//! - `catalog facets` - Compute facet counts for a category
//! - `catalog variants preview` - List the combinations a selection yields
//! - `catalog variants generate` - Create missing variants for a product
//! - `catalog config` - Show, validate or initialize configuration

mod commands;
mod context;
mod logging;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{ConfigArgs, FacetsArgs, VariantsArgs};

/// Catalog CLI - Facets and variant generation for TurboCommerce catalogs
#[derive(Parser)]
#[command(name = "catalog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute facet counts for a category
    Facets(FacetsArgs),

    /// Preview or generate product variants
    Variants(VariantsArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose, cli.json);
    let output = output::Output::new(cli.verbose, cli.json);

    let config_path = cli.config.as_deref();
    let ctx = match context::Context::load(config_path, output.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Facets(args) => commands::facets::run(args, &ctx).await,
        Commands::Variants(args) => commands::variants::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
