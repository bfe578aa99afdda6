// src/logging.rs
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,estate_advisor=debug,tower_http=debug";

/// `ESTATE_LOG` wins over `RUST_LOG`; both fall back to the default filter.
pub fn init_tracing() {
    let filter = std::env::var("ESTATE_LOG")
        .ok()
        .and_then(|value| EnvFilter::try_new(value).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .try_init();
}
