//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use turbo_catalog::CatalogConfig;

use crate::output::Output;

/// Config file names searched for, in order, from the working directory up.
pub const CONFIG_NAMES: [&str; 3] = ["catalog.toml", ".catalog.toml", "catalog.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// Catalog configuration.
    pub config: CatalogConfig,
    /// Where the configuration came from, if a file was found.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context, reading the config file if one is given or found.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = match config_path {
            Some(path) => {
                let path = PathBuf::from(path);
                let config = CatalogConfig::load(&path)
                    .with_context(|| format!("Failed to load config: {}", path.display()))?;
                (config, Some(path))
            }
            None => match Self::find_config(&cwd) {
                Some(path) => {
                    let config = CatalogConfig::load(&path)
                        .with_context(|| format!("Failed to load config: {}", path.display()))?;
                    (config, Some(path))
                }
                None => (CatalogConfig::default(), None),
            },
        };

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Find a config file in the directory tree.
    fn find_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            for name in &CONFIG_NAMES {
                let candidate = current.join(name);
                if candidate.exists() {
                    return Some(candidate);
                }
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }
}
