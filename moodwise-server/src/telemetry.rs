use tracing::Level;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` directives plus a default level taken from `service.log_level`.
/// An unparsable level falls back to INFO.
pub fn log_filter(log_level: &str) -> EnvFilter {
    let level = log_level.trim().parse::<Level>().unwrap_or(Level::INFO);
    EnvFilter::from_default_env().add_directive(level.into())
}
