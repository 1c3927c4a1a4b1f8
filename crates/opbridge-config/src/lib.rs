//! Shared configuration for the opbridge operation core.
//!
//! Configuration is layered by [`ortho_config`]: built-in defaults, then an
//! optional configuration file, then `OPBRIDGE_*` environment variables, then
//! command-line flags. The resulting [`Config`] carries the logging setup and
//! the two protocol-facing knobs the operation core needs: the default-value
//! reporting mode attached to data replies and the datastore generic
//! operations must be dispatched against.

mod datastore;
mod defaults;
mod logging;
mod reporting;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use datastore::{Datastore, DatastoreParseError};
pub use defaults::{
    DEFAULT_LOG_FILTER, default_log_filter, default_log_filter_string, default_log_format,
    default_operation_datastore, default_with_defaults,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use reporting::{WithDefaultsMode, WithDefaultsModeParseError};

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "OPBRIDGE")]
pub struct Config {
    /// Tracing filter expression, in `EnvFilter` syntax.
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Output format of the tracing subscriber.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    /// Default-value reporting mode attached to data replies.
    #[serde(default = "default_with_defaults")]
    pub with_defaults: WithDefaultsMode,
    /// Datastore generic operations are dispatched against.
    #[serde(default = "default_operation_datastore")]
    pub operation_datastore: Datastore,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            with_defaults: default_with_defaults(),
            operation_datastore: default_operation_datastore(),
        }
    }
}

impl Config {
    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Tracing output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Default-value reporting mode attached to data replies.
    #[must_use]
    pub const fn with_defaults(&self) -> WithDefaultsMode {
        self.with_defaults
    }

    /// Datastore generic operations are dispatched against.
    #[must_use]
    pub const fn operation_datastore(&self) -> Datastore {
        self.operation_datastore
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_documented_defaults() {
        let config = Config::default();
        assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
        assert_eq!(config.log_format(), LogFormat::Json);
        assert_eq!(config.with_defaults(), WithDefaultsMode::Explicit);
        assert_eq!(config.operation_datastore(), Datastore::Running);
    }
}
