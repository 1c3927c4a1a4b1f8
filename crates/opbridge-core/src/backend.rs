//! Contract with the datastore service that executes operations.

use opbridge_config::Datastore;
use strum::{Display, EnumString};
use thiserror::Error;

use crate::guard::{FlatValue, ValueBatch};

/// Which backend entry point an operation is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OperationKind {
    /// Operation invoked independently of any data instance.
    Rpc,
    /// Operation bound to a data instance.
    Action,
}

/// Failure codes reported by the datastore service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum StatusCode {
    /// An argument was rejected.
    InvalidArgument,
    /// The service ran out of memory.
    NoMemory,
    /// The addressed item does not exist.
    NotFound,
    /// The service hit an internal error.
    Internal,
    /// The request is not supported.
    Unsupported,
    /// Data failed validation.
    ValidationFailed,
    /// The operation itself failed.
    OperationFailed,
    /// The session may not perform the operation.
    Unauthorized,
    /// A required resource is locked.
    Locked,
    /// The operation did not finish in time.
    TimeOut,
    /// No loaded model defines the addressed node.
    UnknownModel,
    /// A subscriber callback failed.
    CallbackFailed,
}

impl StatusCode {
    /// Fixed description of the code, used when no diagnostic text is
    /// available.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::InvalidArgument => "Invalid argument",
            Self::NoMemory => "Out of memory",
            Self::NotFound => "Item not found",
            Self::Internal => "Internal error",
            Self::Unsupported => "Operation not supported",
            Self::ValidationFailed => "Validation failed",
            Self::OperationFailed => "Operation failed",
            Self::Unauthorized => "Operation not authorized",
            Self::Locked => "Requested resource is already locked",
            Self::TimeOut => "Timeout expired",
            Self::UnknownModel => "Unknown module or schema node",
            Self::CallbackFailed => "User callback failed",
        }
    }

    /// Whether the code means the backend does not know the operation.
    #[must_use]
    pub const fn is_unsupported(self) -> bool {
        matches!(self, Self::UnknownModel | Self::NotFound)
    }
}

/// One diagnostic reported alongside a backend failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    /// Diagnostic text.
    pub message: String,
    /// Path of the offending node, when the backend names one.
    pub path: Option<String>,
}

impl ErrorDetail {
    /// Creates a detail without a path.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
        }
    }

    /// Attaches the path of the offending node.
    #[must_use]
    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Failure reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .status.description())]
pub struct BackendError {
    status: StatusCode,
    details: Vec<ErrorDetail>,
}

impl BackendError {
    /// Creates an error with no diagnostics.
    #[must_use]
    pub const fn new(status: StatusCode) -> Self {
        Self {
            status,
            details: Vec::new(),
        }
    }

    /// Appends a diagnostic.
    #[must_use]
    pub fn with_detail(mut self, detail: ErrorDetail) -> Self {
        self.details.push(detail);
        self
    }

    /// Status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Diagnostics in the order reported.
    #[must_use]
    pub fn details(&self) -> &[ErrorDetail] {
        &self.details
    }

    /// Consumes the error, returning its diagnostics.
    #[must_use]
    pub fn into_details(self) -> Vec<ErrorDetail> {
        self.details
    }
}

/// Datastore service executing RPCs and actions on behalf of a session.
///
/// Calls block until the service reports a terminal status. Output values
/// are returned in a [`ValueBatch`] whose payload buffers belong to the
/// caller from then on.
pub trait Backend {
    /// Sends an RPC addressed by `path` with its explicit input values.
    ///
    /// # Errors
    ///
    /// Returns the service's failure status and diagnostics.
    fn send_rpc(&mut self, path: &str, input: &[FlatValue]) -> Result<ValueBatch, BackendError>;

    /// Sends an action addressed by `path` with its explicit input values.
    ///
    /// # Errors
    ///
    /// Returns the service's failure status and diagnostics.
    fn send_action(&mut self, path: &str, input: &[FlatValue])
    -> Result<ValueBatch, BackendError>;

    /// Most recent diagnostic text recorded by the service, if any.
    fn last_error_message(&self) -> Option<String>;

    /// Points the session at `datastore`.
    ///
    /// # Errors
    ///
    /// Returns the service's failure status when the switch is refused.
    fn switch_datastore(&mut self, datastore: Datastore) -> Result<(), BackendError>;
}

/// Dispatches `input` to the entry point matching `kind`.
///
/// # Errors
///
/// Propagates the backend's failure.
pub fn send<B: Backend + ?Sized>(
    backend: &mut B,
    kind: OperationKind,
    path: &str,
    input: &[FlatValue],
) -> Result<ValueBatch, BackendError> {
    match kind {
        OperationKind::Rpc => backend.send_rpc(path, input),
        OperationKind::Action => backend.send_action(path, input),
    }
}
