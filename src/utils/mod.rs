use tracing_subscriber::{fmt, EnvFilter};

/// Installs the fmt subscriber. An invalid `filter` falls back to `info`, and an
/// already installed global subscriber is left in place.
pub fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt().with_env_filter(filter).try_init();
}
