//! Schema-aware data trees for operation requests and replies.
//!
//! A [`Schema`] describes the shape of the data: RPCs and actions with their
//! input and output halves, containers, lists, leaves and opaque payload
//! nodes. A [`Document`] instantiates a schema as an index-linked arena and
//! provides the primitives the operation bridge needs: traversal in
//! document order, identifying paths, subtree duplication, path-based
//! insertion and output-mode validation.

pub mod document;
pub mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod fixtures;
pub mod insert;
pub mod node;
pub mod path;
pub mod schema;
pub mod types;
mod validate;

pub use document::{Descendants, Document};
pub use error::TreeError;
pub use insert::{InsertOptions, Inserted};
pub use node::{DataNode, NodeContent, NodeId};
pub use path::{PathSegment, Predicate, parse_path};
pub use schema::{Direction, NodeSpec, Schema, SchemaKind, SchemaNode, SchemaNodeId};
pub use types::{LeafType, format_decimal64, parse_decimal64};

#[cfg(test)]
mod tests;
