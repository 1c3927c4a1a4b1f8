//! Assembly of reply documents from backend output.

use opbridge_tree::{Document, InsertOptions, NodeId};
use tracing::trace;

use crate::OPERATION_TARGET;
use crate::defaults::DefaultPropagator;
use crate::errors::OperationError;
use crate::guard::ValueBatch;

/// Builds a reply document by inserting output values into a skeleton.
///
/// The skeleton is owned by the builder; it is only handed out by
/// [`ReplyBuilder::build`] after validation succeeded and is dropped with the
/// builder on any failure.
#[derive(Debug)]
pub struct ReplyBuilder {
    document: Document,
    op: NodeId,
    propagator: DefaultPropagator,
}

impl ReplyBuilder {
    /// Starts an RPC reply from a childless copy of the RPC node.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Internal`] when `op` does not belong to
    /// `request`.
    pub fn for_rpc(request: &Document, op: NodeId) -> Result<Self, OperationError> {
        let document = request
            .duplicate_subtree(op, false)
            .map_err(|error| OperationError::internal(error.to_string()))?;
        let op = document.root();
        Ok(Self::from_skeleton(document, op))
    }

    /// Starts an action reply from the duplicated request, discarding the
    /// action's input children.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Internal`] when `action` does not belong to
    /// `copy`.
    pub fn for_action(mut copy: Document, action: NodeId) -> Result<Self, OperationError> {
        copy.remove_children(action)
            .map_err(|error| OperationError::internal(error.to_string()))?;
        Ok(Self::from_skeleton(copy, action))
    }

    const fn from_skeleton(document: Document, op: NodeId) -> Self {
        Self {
            document,
            op,
            propagator: DefaultPropagator,
        }
    }

    /// Inserts every output value in order, then validates the reply.
    ///
    /// The batch is consumed; its payload buffers are released as soon as
    /// their content has been copied into the document.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::ReplyBuild`] for the first insertion or
    /// validation failure.
    pub fn build(mut self, output: ValueBatch) -> Result<Document, OperationError> {
        for value in output {
            let inserted = self
                .document
                .insert_path(
                    value.path(),
                    value.value().to_content(),
                    InsertOptions::output_update(),
                )
                .map_err(OperationError::reply_build)?;
            let propagation = self
                .propagator
                .apply(&mut self.document, inserted, value.is_default())
                .map_err(OperationError::reply_build)?;
            trace!(
                target: OPERATION_TARGET,
                path = value.path(),
                is_default = value.is_default(),
                marked = propagation.marked,
                cleared = propagation.cleared,
                "inserted output value"
            );
        }
        self.document
            .validate_reply(self.op)
            .map_err(OperationError::reply_build)?;
        Ok(self.document)
    }
}
