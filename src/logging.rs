use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Env var read by [`init_tracing_from_env`].
pub const LOG_LEVEL_ENV: &str = "FRETWISE_LOG";

/// Installs the global subscriber. Logs go to stderr so stdout stays free
/// for report output. Returns false when a subscriber is already set.
pub fn init_tracing(log_level: &str) -> bool {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init()
        .is_ok()
}

pub fn init_tracing_from_env() -> bool {
    let level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "info".to_string());
    init_tracing(&level)
}
