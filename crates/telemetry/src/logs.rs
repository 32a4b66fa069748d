use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the process-wide log subscriber: `RUST_LOG` when set, the
/// configured level otherwise, with a compact fmt layer.
///
/// A second call (tests, embedded use) leaves the existing subscriber in
/// place.
pub fn init_log_subscriber(log_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init()
        .ok();
}
