//! Conversion of request subtrees into flat path/value records.

use opbridge_tree::{Document, NodeId, SchemaKind};
use tracing::trace;

use crate::OPERATION_TARGET;
use crate::errors::OperationError;
use crate::guard::{AuxLedger, FlatValue, ValueBatch};
use crate::value::Value;

/// Flattens the explicit values below an operation node.
#[derive(Debug, Clone, Copy)]
pub struct RequestFlattener<'a> {
    ledger: &'a AuxLedger,
}

impl<'a> RequestFlattener<'a> {
    /// Creates a flattener taking payload buffers from `ledger`.
    #[must_use]
    pub const fn new(ledger: &'a AuxLedger) -> Self {
        Self { ledger }
    }

    /// Emits one [`FlatValue`] per value-bearing descendant of `op` that is
    /// not flagged default, in document order.
    ///
    /// Value-bearing nodes are leaves, leaf-list entries, anyxml or anydata
    /// nodes and presence containers, whose existence is data even when
    /// empty. Non-presence containers and list entries are implied by the
    /// paths of their descendants. On failure every value produced so far is
    /// released before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Allocation`] when the batch cannot be
    /// reserved, [`OperationError::Validation`] when a value does not convert
    /// and [`OperationError::Internal`] for stale handles.
    pub fn flatten(&self, document: &Document, op: NodeId) -> Result<ValueBatch, OperationError> {
        let explicit: Vec<NodeId> = document
            .descendants(op)
            .filter(|id| is_value_bearing(document, *id) && !document.is_default(*id))
            .collect();

        let mut batch = ValueBatch::with_capacity(explicit.len())?;
        for id in explicit {
            let path = document
                .path_of(id)
                .map_err(|error| OperationError::internal(error.to_string()))?;
            let value = Value::from_node(document, id, self.ledger)?;
            trace!(
                target: OPERATION_TARGET,
                path = %path,
                kind = value.type_name(),
                "flattened input value"
            );
            batch.push(FlatValue::new(path, value));
        }
        Ok(batch)
    }
}

fn is_value_bearing(document: &Document, id: NodeId) -> bool {
    document.kind(id).is_some_and(is_flattened_kind)
}

/// Whether nodes of `kind` are emitted by [`RequestFlattener::flatten`].
#[must_use]
pub const fn is_flattened_kind(kind: SchemaKind) -> bool {
    kind.holds_text()
        || kind.holds_payload()
        || matches!(kind, SchemaKind::Container { presence: true })
}
