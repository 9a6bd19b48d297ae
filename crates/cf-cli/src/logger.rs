//! Log output for the binary.
//!
//! The library crates log through the `log` facade; records are bridged
//! into a `tracing_subscriber` fmt layer on stderr. `RUST_LOG` overrides
//! the level picked from `--verbose`.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const CRATES: &[&str] = &["cf_core", "cf_jinja", "cf_db", "cf_runner", "changeflow"];

/// Filter directives for our crates; everything else logs warnings only
pub(crate) fn default_directives(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    let mut directives = vec!["warn".to_string()];
    directives.extend(CRATES.iter().map(|krate| format!("{}={}", krate, level)));
    directives.join(",")
}

/// Install the subscriber. A second call keeps the first subscriber.
pub(crate) fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_target(verbose),
        )
        .try_init();
}
