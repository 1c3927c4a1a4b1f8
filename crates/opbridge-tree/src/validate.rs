//! Output-mode validation of operation replies.

use std::sync::Arc;

use crate::document::Document;
use crate::error::TreeError;
use crate::node::{NodeContent, NodeId};
use crate::schema::{Direction, Schema, SchemaKind, SchemaNodeId};

impl Document {
    /// Validates the output below the operation node `op` and completes it
    /// with schema defaults.
    ///
    /// Every leaf and leaf-list value must pass its type check, every keyed
    /// list entry must carry all of its keys and every mandatory child of the
    /// operation and of instantiated interior nodes must be present. A
    /// mandatory node below an absent non-presence container is missing too.
    /// Absent leaves of instantiated nodes that declare a default are added
    /// with the default flag set.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnexpectedKind`] when `op` is not an RPC or
    /// action or input nodes appear in the output, and the specific
    /// validation error for the first violation found.
    pub fn validate_reply(&mut self, op: NodeId) -> Result<(), TreeError> {
        let op_schema = self.schema_of(op)?;
        if !op_schema.kind().is_operation() {
            return Err(TreeError::unexpected_kind(op_schema.name(), "an rpc or action"));
        }

        let mut interior = vec![op];
        for id in self.descendants(op) {
            let schema = self.schema_of(id)?;
            if schema.direction() == Direction::Input {
                return Err(TreeError::unexpected_kind(
                    self.path_of(id)?,
                    "allowed in operation output",
                ));
            }
            match schema.kind() {
                SchemaKind::Leaf | SchemaKind::LeafList => self.check_value(id)?,
                SchemaKind::List { keyed: true } => {
                    self.check_keys(id)?;
                    interior.push(id);
                }
                SchemaKind::Container { .. } | SchemaKind::List { keyed: false } => {
                    interior.push(id);
                }
                SchemaKind::Rpc | SchemaKind::Action | SchemaKind::AnyXml | SchemaKind::AnyData => {}
            }
        }

        for id in interior {
            self.complete_children(id)?;
        }
        Ok(())
    }

    fn check_value(&self, id: NodeId) -> Result<(), TreeError> {
        let schema = self.schema_of(id)?;
        let Some(leaf_type) = schema.leaf_type() else {
            return Ok(());
        };
        let text = self.text(id).unwrap_or_default();
        leaf_type
            .check(text)
            .map_err(|message| match self.path_of(id) {
                Ok(path) => TreeError::invalid_value(path, text, message),
                Err(stale) => stale,
            })
    }

    fn check_keys(&self, entry: NodeId) -> Result<(), TreeError> {
        let schema = self.schema_of(entry)?;
        for key in schema.keys() {
            let present = self.children(entry).iter().any(|child| {
                self.schema_of(*child)
                    .is_ok_and(|child_schema| child_schema.name() == key)
            });
            if !present {
                return Err(TreeError::MissingKey {
                    path: self.path_of(entry)?,
                    key: key.clone(),
                });
            }
        }
        Ok(())
    }

    /// Reports absent mandatory children of `id` and adds absent defaulted
    /// leaves.
    fn complete_children(&mut self, id: NodeId) -> Result<(), TreeError> {
        let schema = Arc::clone(self.schema());
        let parent_schema = self.get(id)?.schema();
        let parent_is_operation = self.schema_of(id)?.kind().is_operation();
        let candidates: Vec<SchemaNodeId> = schema
            .get(parent_schema)?
            .children()
            .iter()
            .copied()
            .filter(|child| {
                !parent_is_operation
                    || schema
                        .node(*child)
                        .is_some_and(|node| node.direction() == Direction::Output)
            })
            .collect();

        for child_schema in candidates {
            let present = self
                .children(id)
                .iter()
                .any(|child| self.node(*child).is_some_and(|node| node.schema() == child_schema));
            if present {
                continue;
            }
            let child = schema.get(child_schema)?;
            if child.is_mandatory() {
                return Err(TreeError::MissingMandatory {
                    path: self.path_of(id)?,
                    name: child.name().to_owned(),
                });
            }
            if child.kind() == (SchemaKind::Container { presence: false })
                && let Some((below, name)) = mandatory_within(&schema, child_schema)
            {
                return Err(TreeError::MissingMandatory {
                    path: format!("{}/{below}", self.path_of(id)?),
                    name,
                });
            }
            if child.kind() == SchemaKind::Leaf
                && let Some(default) = child.default_value()
            {
                let content = NodeContent::text(default);
                let added = self.add_child(id, child_schema, content)?;
                self.set_default(added, true)?;
            }
        }
        Ok(())
    }
}

/// Finds a mandatory node reachable from `container` through non-presence
/// containers, returning the relative path of its parent and its name.
fn mandatory_within(schema: &Schema, container: SchemaNodeId) -> Option<(String, String)> {
    let node = schema.node(container)?;
    for child in node.children().iter().copied() {
        let Some(child_node) = schema.node(child) else {
            continue;
        };
        if child_node.is_mandatory() {
            return Some((node.name().to_owned(), child_node.name().to_owned()));
        }
        if child_node.kind() == (SchemaKind::Container { presence: false })
            && let Some((below, name)) = mandatory_within(schema, child)
        {
            return Some((format!("{}/{below}", node.name()), name));
        }
    }
    None
}
