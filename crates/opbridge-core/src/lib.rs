//! Generic RPC and action execution for a schema-driven management server.
//!
//! The protocol layer hands [`execute_generic_operation`] a request document
//! holding one RPC or action together with the session's
//! [`SessionContext`]. The request is flattened into path/value records,
//! dispatched to the session's [`Backend`], and the backend's output is
//! assembled into a validated reply document whose default flags drive the
//! negotiated with-defaults reporting. Failures surface as protocol errors on
//! the returned [`Reply`].
//!
//! ## Resource accounting
//!
//! Opaque payloads handed to the backend are tracked by an [`AuxLedger`].
//! Every batch of values releases its buffers when dropped, so each exit
//! path of an operation, successful or not, leaves the ledger balanced.

pub mod backend;
pub mod defaults;
pub mod errors;
pub mod flatten;
pub mod guard;
pub mod operation;
pub mod render;
pub mod reply;
pub mod response;
pub mod session;
pub mod telemetry;
pub mod value;

pub use backend::{Backend, BackendError, ErrorDetail, OperationKind, StatusCode};
pub use defaults::{DefaultPropagator, Propagation};
pub use errors::OperationError;
pub use flatten::RequestFlattener;
pub use guard::{AuxBuffer, AuxLedger, FlatValue, ValueBatch};
pub use operation::execute_generic_operation;
pub use render::render_json;
pub use reply::ReplyBuilder;
pub use response::{ErrorTag, ErrorType, ProtocolError, Reply, ReplyMessage, ReplyWriter};
pub use session::SessionContext;
pub use value::Value;

/// Tracing target used by operation diagnostics.
pub const OPERATION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::operation");

#[cfg(test)]
mod tests;
