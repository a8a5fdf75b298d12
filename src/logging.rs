use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber.
///
/// Raw refresh tokens must never reach a log line; callers log the sha256
/// fingerprint instead.
pub fn init_logging(log_level: &str, log_format: Option<&str>, quiet: bool) -> Result<()> {
    let level = if quiet { "error" } else { log_level };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match log_format {
        Some("json") => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        Some("pretty") | Some("dev") => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact())
                .init();
        }
    }

    Ok(())
}
