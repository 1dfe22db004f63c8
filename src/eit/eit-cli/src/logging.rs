//! Log output for the CLI.

use console::style;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "EIT_LOG";

/// Install the global subscriber. `--debug` wins over `EIT_LOG`, which wins
/// over the `info` default.
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // A second init (tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

/// A completed step, highlighted for the user.
pub fn success(message: &str) {
    info!("{} {}", style("success").green().bold(), message);
}
