//! Tracing subscriber set-up for hosts embedding the operation core.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use opbridge_config::{Config, LogFormat};
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Proof that the global subscriber has been installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors raised while installing the subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter expression did not parse.
    #[error("invalid log filter '{filter}': {message}")]
    Filter {
        /// Filter text as configured.
        filter: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Another subscriber already owns the global slot.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(#[from] SetGlobalDefaultError),
}

/// Installs the global subscriber described by `config` on first use.
///
/// Later calls return a fresh handle without touching the global state, so
/// hosts and tests may call this freely.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an unparsable filter and
/// [`TelemetryError::Subscriber`] when a foreign subscriber is already set.
///
/// # Examples
///
/// ```rust
/// use opbridge_config::Config;
/// use opbridge_core::telemetry;
///
/// # fn main() -> Result<(), opbridge_core::telemetry::TelemetryError> {
/// let config = Config::default();
/// let _first = telemetry::initialise(&config)?;
/// let _second = telemetry::initialise(&config)?;
/// # Ok(())
/// # }
/// ```
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config))
        .map(|()| TelemetryHandle)
}

/// Parses the configured filter expression.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when the expression is rejected.
pub fn filter_for(config: &Config) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(config.log_filter()).map_err(|error| TelemetryError::Filter {
        filter: config.log_filter().to_owned(),
        message: error.to_string(),
    })
}

fn install_subscriber(config: &Config) -> Result<(), TelemetryError> {
    let filter = filter_for(config)?;

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
