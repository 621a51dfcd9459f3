//! Tracing setup for the command-line tools.
//!
//! Logs always go to stderr: several commands print reports (or JSON) on
//! stdout that are meant to be piped.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` takes precedence over
/// `config.level`. Returns `false` if a subscriber was already installed.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => filter_from_level(&config.level),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = if config.json {
        builder.json().with_current_span(false).try_init()
    } else {
        builder
            .compact()
            .without_time()
            .with_target(false)
            .try_init()
    };
    installed.is_ok()
}

/// Parse a level directive, falling back to `info` when it is malformed.
fn filter_from_level(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|e| {
        eprintln!("Ignoring invalid log level '{level}': {e}");
        EnvFilter::new("info")
    })
}
