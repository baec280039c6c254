//! Diagnostic logging.
//!
//! Events go to stderr through `tracing-subscriber`. The filter comes from
//! `MSPROJ_LOG` (EnvFilter syntax) when set, otherwise from the `-v` count.
//! Operator progress lines are printed directly and never pass through here.

use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding an EnvFilter directive.
pub const LOG_ENV: &str = "MSPROJ_LOG";

/// Default level for a `-v` count.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn build_env_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)))
}

/// Install the global subscriber. Calling it twice is harmless; the second
/// call leaves the first subscriber in place.
pub fn init_logging(verbosity: u8) {
    let filter = build_env_filter(verbosity);
    let _ = Registry::default()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init();
}
