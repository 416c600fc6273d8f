//! Logging setup via tracing-subscriber
//!
//! `RUST_LOG` takes precedence over the configured level. The format is
//! either `pretty` (human readable) or `json`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Install the global subscriber
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directive(&config.level)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);

    if is_json(&config.format) {
        registry
            .with(fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}

/// Scope a bare level to this crate and the HTTP tracing layer
fn filter_directive(level: &str) -> String {
    if log_level_valid(level) {
        format!("relay_hub={level},tower_http={level}")
    } else {
        level.to_string()
    }
}

fn is_json(format: &str) -> bool {
    format.eq_ignore_ascii_case("json")
}

/// Whether `level` is one of the plain tracing levels
pub fn log_level_valid(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}
