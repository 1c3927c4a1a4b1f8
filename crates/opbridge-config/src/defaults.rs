use crate::datastore::Datastore;
use crate::logging::LogFormat;
use crate::reporting::WithDefaultsMode;

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default-value reporting mode advertised when nothing else is configured.
#[must_use]
pub const fn default_with_defaults() -> WithDefaultsMode {
    WithDefaultsMode::Explicit
}

/// Datastore generic operations are dispatched against.
///
/// Operation subscribers listen on the running datastore, so this is the only
/// sensible default.
#[must_use]
pub const fn default_operation_datastore() -> Datastore {
    Datastore::Running
}
