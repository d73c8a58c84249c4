use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tvshelf_core::config::LoggingConfig;

use crate::RuntimeError;

pub const LOG_FILE_PREFIX: &str = "tvshelf.log";

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter, but the configured
/// filter must still parse. With `file` enabled, logs are also written to a
/// daily rolling file in `log_dir`; keep the returned guard alive or buffered
/// lines are lost on exit.
pub fn init(config: &LoggingConfig, log_dir: &Path) -> Result<Option<WorkerGuard>, RuntimeError> {
    let filter = build_filter(config)?;

    let (file_layer, guard) = if config.file {
        std::fs::create_dir_all(log_dir).map_err(|e| {
            RuntimeError::Config(format!(
                "cannot create log directory {}: {e}",
                log_dir.display()
            ))
        })?;
        let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer().with_writer(writer).with_ansi(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .map_err(|e| RuntimeError::Config(format!("logging already initialised: {e}")))?;

    tracing::info!(file = config.file, "logging initialised");
    Ok(guard)
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, RuntimeError> {
    let configured = EnvFilter::try_new(&config.filter).map_err(|e| {
        RuntimeError::Config(format!("invalid log filter `{}`: {e}", config.filter))
    })?;
    Ok(EnvFilter::try_from_default_env().unwrap_or(configured))
}
