//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects `debug` for the
/// catalog crates. Logs go to stderr so `--json` output stays parseable.
pub fn init(verbose: bool, json: bool) {
    let default = if verbose {
        "warn,turbo_catalog=debug,catalog=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // Repeated initialization is a no-op.
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
}
