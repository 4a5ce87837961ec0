//! Output formatting for the CLI.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use turbo_catalog::search::{FacetResult, FacetValue};

/// Output handler for CLI messages.
#[derive(Clone)]
pub struct Output {
    verbose: bool,
    json: bool,
}

impl Output {
    /// Create a new output handler.
    pub fn new(verbose: bool, json: bool) -> Self {
        Self { verbose, json }
    }

    /// Print an info message.
    pub fn info(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("ℹ").blue(), msg);
    }

    /// Print a success message.
    pub fn success(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("✓").green(), msg);
    }

    /// Print a warning message.
    pub fn warn(&self, msg: &str) {
        if self.json {
            return;
        }
        eprintln!("{} {}", style("⚠").yellow(), msg);
    }

    /// Print an error message.
    pub fn error(&self, msg: &str) {
        if self.json {
            let body = serde_json::json!({ "error": msg });
            eprintln!("{}", body);
            return;
        }
        eprintln!("{} {}", style("✗").red(), style(msg).red());
    }

    /// Print a debug message (only in verbose mode).
    pub fn debug(&self, msg: &str) {
        if !self.verbose || self.json {
            return;
        }
        eprintln!("{} {}", style("→").dim(), style(msg).dim());
    }

    /// Print a header/title.
    pub fn header(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print JSON output.
    pub fn json<T: serde::Serialize>(&self, value: &T) {
        if let Ok(json) = serde_json::to_string_pretty(value) {
            println!("{}", json);
        }
    }

    /// Print a key-value pair.
    pub fn kv(&self, key: &str, value: &str) {
        if self.json {
            return;
        }
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a table row.
    pub fn table_row(&self, cols: &[&str], widths: &[usize]) {
        if self.json {
            return;
        }
        let formatted: Vec<String> = cols
            .iter()
            .zip(widths.iter())
            .map(|(col, width)| format!("{:width$}", col, width = width))
            .collect();
        println!("  {}", formatted.join("  "));
    }

    /// Print one facet with its values.
    pub fn facet(&self, facet: &FacetResult) {
        if self.json {
            return;
        }
        println!(
            "\n{} {}",
            style(&facet.label).bold(),
            style(format!("({} candidates)", facet.total_matching)).dim()
        );
        if let Some(range) = &facet.price_range {
            if facet.values.is_empty() {
                println!(
                    "  {} - {}",
                    format_cents(range.min_cents),
                    format_cents(range.max_cents)
                );
                return;
            }
        }
        if facet.values.is_empty() {
            println!("  {}", style("(no values)").dim());
            return;
        }
        for value in &facet.values {
            println!("  {}", facet_value_line(value));
        }
    }

    /// Create a spinner for indeterminate progress.
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        if self.json {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }

    /// Check if JSON mode is enabled.
    pub fn is_json(&self) -> bool {
        self.json
    }
}

fn facet_value_line(value: &FacetValue) -> String {
    let marker = if value.selected {
        style("[x]").green().to_string()
    } else {
        style("[ ]").dim().to_string()
    };
    let name = match &value.color_hex {
        Some(hex) => format!("{} {}", value.name, style(hex).dim()),
        None => value.name.clone(),
    };
    let count = if value.is_disabled() {
        style(value.count.to_string()).dim().to_string()
    } else {
        value.count.to_string()
    };
    format!("{} {:<24} {}", marker, name, count)
}

/// Format minor units as a decimal amount.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, cents / 100, cents % 100)
}

/// Colored label for a skip reason kind.
pub fn skip_badge(kind: &str) -> String {
    match kind {
        "already_exists" => style(kind).dim().to_string(),
        "sku_collision" => style(kind).yellow().to_string(),
        "rejected" => style(kind).red().to_string(),
        _ => kind.to_string(),
    }
}
