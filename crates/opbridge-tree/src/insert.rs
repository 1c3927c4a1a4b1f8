//! Path-based node creation.

use crate::document::Document;
use crate::error::TreeError;
use crate::node::{NodeContent, NodeId};
use crate::path::{PathSegment, parse_path};
use crate::schema::{Direction, SchemaKind, SchemaNodeId};

/// Options controlling [`Document::insert_path`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertOptions {
    /// Update the value of an existing leaf instead of failing.
    pub update: bool,
    /// Which half of an operation path segments below RPCs and actions
    /// resolve against.
    pub direction: Direction,
}

impl InsertOptions {
    /// Options for building operation input.
    #[must_use]
    pub const fn input() -> Self {
        Self {
            update: false,
            direction: Direction::Input,
        }
    }

    /// Options for building operation output, updating existing nodes in
    /// place.
    #[must_use]
    pub const fn output_update() -> Self {
        Self {
            update: true,
            direction: Direction::Output,
        }
    }
}

/// Outcome of a successful [`Document::insert_path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inserted {
    /// Top-most node created by the insertion, or the target when nothing
    /// had to be created.
    pub top: NodeId,
    /// Node addressed by the last path segment.
    pub target: NodeId,
    /// Whether any node was created.
    pub created: bool,
}

impl Document {
    /// Creates or updates the node addressed by `path`.
    ///
    /// The path is absolute and must start at the document root. Missing
    /// intermediate containers and list entries are created on the way; a
    /// created keyed list entry receives its key leaves from the segment's
    /// predicates. The last segment receives `content`.
    ///
    /// # Errors
    ///
    /// Fails on path syntax errors, paths leaving the document, unknown
    /// schema nodes, missing list keys, content that does not suit the node
    /// kind or type, and existing value nodes when `options.update` is unset.
    pub fn insert_path(
        &mut self,
        path: &str,
        content: NodeContent,
        options: InsertOptions,
    ) -> Result<Inserted, TreeError> {
        let segments = parse_path(path)?;
        let Some((first, rest)) = segments.split_first() else {
            return Err(TreeError::path_syntax(path, "empty path"));
        };
        self.check_root_segment(path, first)?;

        let mut current = self.root();
        let mut top_created = None;
        let mut pending = Some(content);
        for (position, segment) in rest.iter().enumerate() {
            let is_last = position + 1 == rest.len();
            let schema_node = self.resolve_child_schema(current, segment, options.direction)?;
            let segment_content = if is_last {
                pending.take().unwrap_or_default()
            } else {
                NodeContent::None
            };

            if let Some(existing) = self.find_instance(current, schema_node, segment, &segment_content)? {
                if is_last {
                    self.update_existing(path, existing, segment_content, options)?;
                }
                current = existing;
                continue;
            }

            let created = self.create_instance(path, current, schema_node, segment, segment_content)?;
            top_created.get_or_insert(created);
            current = created;
        }

        if rest.is_empty()
            && let Some(root_content) = pending.take()
            && root_content != NodeContent::None
        {
            self.update_existing(path, current, root_content, options)?;
        }

        Ok(Inserted {
            top: top_created.unwrap_or(current),
            target: current,
            created: top_created.is_some(),
        })
    }

    fn check_root_segment(&self, path: &str, segment: &PathSegment) -> Result<(), TreeError> {
        let root_schema = self.schema_of(self.root())?;
        let same_name = root_schema.name() == segment.name;
        let same_module = segment
            .module
            .as_deref()
            .is_none_or(|module| module == root_schema.module());
        let same_keys = root_schema.keys().iter().all(|key| {
            segment.key_value(key).is_none_or(|value| {
                self.key_text(self.root(), key) == Some(value)
            })
        });
        if same_name && same_module && same_keys {
            Ok(())
        } else {
            Err(TreeError::OutsideDocument {
                path: path.to_owned(),
                root: root_schema.name().to_owned(),
            })
        }
    }

    fn resolve_child_schema(
        &self,
        parent: NodeId,
        segment: &PathSegment,
        direction: Direction,
    ) -> Result<SchemaNodeId, TreeError> {
        let parent_schema = self.get(parent)?.schema();
        self.schema()
            .child(parent_schema, segment.module.as_deref(), &segment.name, direction)
            .ok_or_else(|| {
                TreeError::unknown_schema_node(
                    self.schema().schema_path(parent_schema),
                    segment.name.clone(),
                )
            })
    }

    fn find_instance(
        &self,
        parent: NodeId,
        schema_node: SchemaNodeId,
        segment: &PathSegment,
        content: &NodeContent,
    ) -> Result<Option<NodeId>, TreeError> {
        let schema = self.schema().get(schema_node)?;
        let mut candidates = self
            .children(parent)
            .iter()
            .copied()
            .filter(|child| self.node(*child).is_some_and(|node| node.schema() == schema_node));
        let found = match schema.kind() {
            SchemaKind::List { keyed: true } => candidates.find(|entry| {
                schema.keys().iter().all(|key| {
                    segment
                        .key_value(key)
                        .is_some_and(|value| self.key_text(*entry, key) == Some(value))
                })
            }),
            // Every keyless list segment denotes a new entry.
            SchemaKind::List { keyed: false } => None,
            SchemaKind::LeafList => {
                let wanted = segment.self_value().or(match content {
                    NodeContent::Text(text) => Some(text.as_str()),
                    NodeContent::None | NodeContent::Payload(_) => None,
                });
                wanted.and_then(|value| candidates.find(|entry| self.text(*entry) == Some(value)))
            }
            _ => candidates.next(),
        };
        Ok(found)
    }

    fn key_text(&self, entry: NodeId, key: &str) -> Option<&str> {
        self.children(entry)
            .iter()
            .copied()
            .find(|child| {
                self.schema_of(*child)
                    .is_ok_and(|schema| schema.name() == key)
            })
            .and_then(|child| self.text(child))
    }

    fn update_existing(
        &mut self,
        path: &str,
        existing: NodeId,
        content: NodeContent,
        options: InsertOptions,
    ) -> Result<(), TreeError> {
        let kind = self.schema_of(existing)?.kind();
        if !kind.holds_text() && !kind.holds_payload() {
            // Interior nodes have nothing to update; reject stray content.
            return match content {
                NodeContent::None => Ok(()),
                other => Err(TreeError::ContentMismatch {
                    path: path.to_owned(),
                    kind: kind.as_str(),
                    content: other.describe(),
                }),
            };
        }
        if !options.update {
            return Err(TreeError::AlreadyExists {
                path: path.to_owned(),
            });
        }
        let is_key = self
            .parent(existing)
            .and_then(|parent| self.schema_of(parent).ok())
            .zip(self.schema_of(existing).ok())
            .is_some_and(|(parent, leaf)| parent.is_key(leaf.name()));
        if is_key && self.get(existing)?.content() != &content {
            return Err(TreeError::invalid_value(
                path,
                self.text(existing).unwrap_or_default(),
                "list keys cannot be changed",
            ));
        }
        self.replace_content(existing, content)?;
        Ok(())
    }

    fn create_instance(
        &mut self,
        path: &str,
        parent: NodeId,
        schema_node: SchemaNodeId,
        segment: &PathSegment,
        content: NodeContent,
    ) -> Result<NodeId, TreeError> {
        let schema = self.schema().get(schema_node)?.clone();
        let resolved = match (schema.kind(), segment.self_value(), content) {
            (SchemaKind::LeafList, Some(value), NodeContent::None) => NodeContent::text(value),
            (SchemaKind::LeafList, Some(value), NodeContent::Text(text)) if text != value => {
                return Err(TreeError::invalid_value(
                    path,
                    text,
                    format!("value disagrees with predicate '{value}'"),
                ));
            }
            (_, _, other) => other,
        };
        let checked = self.checked_content(parent, schema_node, resolved)?;

        // Every key is checked before the entry is linked so a failure leaves
        // no half-built entry behind.
        let mut keys = Vec::with_capacity(schema.keys().len());
        for key in schema.keys() {
            let value = segment.key_value(key).ok_or_else(|| TreeError::MissingKey {
                path: path.to_owned(),
                key: key.clone(),
            })?;
            let key_schema = self
                .schema()
                .child(schema_node, None, key, Direction::Data)
                .ok_or_else(|| TreeError::unknown_schema_node(segment.name.clone(), key.clone()))?;
            if let Some(leaf_type) = self.schema().get(key_schema)?.leaf_type() {
                leaf_type.check(value).map_err(|message| {
                    let entry = self
                        .path_of(parent)
                        .map_or_else(|_| segment.to_string(), |above| format!("{above}/{segment}"));
                    TreeError::invalid_value(format!("{entry}/{key}"), value, message)
                })?;
            }
            keys.push((key_schema, NodeContent::text(value)));
        }

        let created = self.push_child(parent, schema_node, checked);
        for (key_schema, key_value) in keys {
            self.push_child(created, key_schema, key_value);
        }
        Ok(created)
    }
}
