use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Overrides the configured level when set, e.g. `INVOICEDB_LOG=invoicedb=debug`.
pub const LOG_ENV: &str = "INVOICEDB_LOG";

fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Installs the global subscriber. Output goes to stderr so command output on
/// stdout stays clean.
pub fn init(config: &LoggingConfig) {
    let layer = if config.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    };

    let result = tracing_subscriber::registry()
        .with(env_filter(config))
        .with(layer)
        .try_init();
    if let Err(e) = result {
        eprintln!("Warning: Failed to initialise logging: {}", e);
    }
}
