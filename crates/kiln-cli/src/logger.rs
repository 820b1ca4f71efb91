//! Logging setup for the kiln CLI.
//!
//! The level is chosen in this order:
//! 1. `--verbose`: debug for kiln crates
//! 2. `--quiet`: errors only
//! 3. `RUST_LOG`
//! 4. `settings.log_level` from the config
//! 5. info for kiln crates

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const KILN_TARGETS: &[&str] = &[
    "kiln_cli",
    "kiln_config",
    "kiln_compiler",
    "kiln_bundler",
    "kiln_graph",
];

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool, configured: Option<&str>) {
    let filter = if verbose {
        EnvFilter::new(directives("debug"))
    } else if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(directives(configured.unwrap_or("info"))))
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// `level` for every kiln crate.
fn directives(level: &str) -> String {
    let level = level.to_ascii_lowercase();
    KILN_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}
