//! Tracing subscriber setup for hosts that want log output.

use crate::config::{ConfigError, LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides `logging.level`.
pub const LOG_ENV_VAR: &str = "RANKLAB_LOG";

/// Install a global fmt subscriber.
///
/// `RANKLAB_LOG` takes precedence over the configured level. Calling this
/// more than once is harmless: later calls leave the first subscriber in
/// place.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ConfigError> {
    let directive = std::env::var(LOG_ENV_VAR).unwrap_or_else(|_| config.level.clone());
    let filter = EnvFilter::try_new(&directive)
        .map_err(|err| ConfigError::Invalid(format!("invalid log filter '{directive}': {err}")))?;

    let installed = match config.format {
        LogFormat::Full => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .try_init(),
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}
