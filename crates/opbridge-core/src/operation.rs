//! Generic RPC and action execution.

use opbridge_tree::{Document, NodeId, SchemaKind};
use tracing::{debug, error};

use crate::OPERATION_TARGET;
use crate::backend::{self, Backend, OperationKind};
use crate::errors::OperationError;
use crate::flatten::RequestFlattener;
use crate::reply::ReplyBuilder;
use crate::response::Reply;
use crate::session::SessionContext;

/// Executes the RPC or action held by `request` on the session's backend.
///
/// `request` is either rooted at an RPC node or holds exactly one action
/// somewhere below its root. The request is never modified: an action request
/// is duplicated first and the copy becomes the reply skeleton.
///
/// The operation is all-or-nothing. Any failure is translated into protocol
/// errors once, here, and no partial reply is returned.
pub fn execute_generic_operation<B: Backend>(
    request: &Document,
    session: &mut SessionContext<B>,
) -> Reply {
    match run(request, session) {
        Ok(reply) => reply,
        Err(failure) => {
            match &failure {
                OperationError::BackendUnsupported { kind, operation } => debug!(
                    target: OPERATION_TARGET,
                    %kind,
                    operation = %operation,
                    "backend does not support operation"
                ),
                other => error!(
                    target: OPERATION_TARGET,
                    status = other.status().map(|status| status.description()),
                    "generic operation failed: {other}"
                ),
            }
            Reply::Error(failure.into_protocol_errors())
        }
    }
}

/// Request resolved to the document and node holding the operation.
enum Target<'a> {
    Rpc { request: &'a Document, op: NodeId },
    Action { copy: Document, op: NodeId },
}

impl Target<'_> {
    fn resolve(request: &Document) -> Result<Target<'_>, OperationError> {
        let root = request.root();
        match request.kind(root) {
            Some(SchemaKind::Rpc) => Ok(Target::Rpc { request, op: root }),
            Some(_) => {
                let copy = request
                    .duplicate_subtree(root, true)
                    .map_err(|error| OperationError::internal(error.to_string()))?;
                let op = copy
                    .find_first(|node| node.kind() == SchemaKind::Action)
                    .ok_or_else(|| OperationError::internal("request holds no action node"))?;
                Ok(Target::Action { copy, op })
            }
            None => Err(OperationError::internal("request root is stale")),
        }
    }

    const fn kind(&self) -> OperationKind {
        match self {
            Self::Rpc { .. } => OperationKind::Rpc,
            Self::Action { .. } => OperationKind::Action,
        }
    }

    fn parts(&self) -> (&Document, NodeId) {
        match self {
            Self::Rpc { request, op } => (*request, *op),
            Self::Action { copy, op } => (copy, *op),
        }
    }

    fn into_builder(self) -> Result<ReplyBuilder, OperationError> {
        match self {
            Self::Rpc { request, op } => ReplyBuilder::for_rpc(request, op),
            Self::Action { copy, op } => ReplyBuilder::for_action(copy, op),
        }
    }
}

fn run<B: Backend>(
    request: &Document,
    session: &mut SessionContext<B>,
) -> Result<Reply, OperationError> {
    session.ensure_prepared()?;
    let target = Target::resolve(request)?;
    let kind = target.kind();
    let (document, op) = target.parts();
    let path = document
        .path_of(op)
        .map_err(|error| OperationError::internal(error.to_string()))?;

    let input = RequestFlattener::new(session.ledger()).flatten(document, op)?;
    debug!(
        target: OPERATION_TARGET,
        %kind,
        path = %path,
        inputs = input.len(),
        "dispatching generic operation"
    );
    let result = backend::send(session.backend_mut(), kind, &path, input.as_slice());
    drop(input);

    let output = match result {
        Ok(output) => output,
        Err(source) if source.status().is_unsupported() => {
            return Err(OperationError::unsupported(kind, path));
        }
        Err(source) => {
            let last_message = session.backend().last_error_message();
            return Err(OperationError::backend_failure(kind, path, source, last_message));
        }
    };
    debug!(
        target: OPERATION_TARGET,
        %kind,
        path = %path,
        outputs = output.len(),
        "backend completed generic operation"
    );

    if output.is_empty() {
        return Ok(Reply::Ok);
    }
    let document = target.into_builder()?.build(output)?;
    Ok(Reply::Data {
        document,
        with_defaults: session.with_defaults(),
    })
}
