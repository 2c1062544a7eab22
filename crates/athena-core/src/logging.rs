use crate::config::{LogFormat, LoggingSettings};
use crate::error::{AthenaError, Result};
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, Registry};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `settings.level`. Returns `Ok(false)` when a
/// global subscriber was already installed.
pub fn init_tracing(settings: &LoggingSettings) -> Result<bool> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.level).map_err(|e| {
            AthenaError::Config(format!("invalid log level '{}': {}", settings.level, e))
        })?,
    };

    let installed = match settings.format {
        LogFormat::Pretty => {
            let subscriber = Registry::default()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_target(true));
            tracing::subscriber::set_global_default(subscriber).is_ok()
        }
        LogFormat::Json => {
            let subscriber = Registry::default().with(env_filter).with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_current_span(false),
            );
            tracing::subscriber::set_global_default(subscriber).is_ok()
        }
    };

    Ok(installed)
}
