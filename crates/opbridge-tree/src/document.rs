//! Data tree arena with explicit parent and child indices.

use std::sync::Arc;

use crate::error::TreeError;
use crate::node::{DataNode, NodeContent, NodeId};
use crate::path::quote;
use crate::schema::{Schema, SchemaKind, SchemaNode, SchemaNodeId};

/// A data tree instantiating a [`Schema`].
///
/// Nodes live in a slot arena; removing a subtree empties its slots so that
/// stale handles are detected instead of silently aliasing new nodes.
#[derive(Debug, Clone)]
pub struct Document {
    schema: Arc<Schema>,
    nodes: Vec<Option<DataNode>>,
    root: NodeId,
}

impl Document {
    /// Creates a document holding a single root node.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnexpectedKind`] unless `root` is a top-level
    /// schema node without a value, and [`TreeError::StaleNode`] for unknown
    /// handles.
    pub fn new(schema: Arc<Schema>, root: SchemaNodeId) -> Result<Self, TreeError> {
        let root_node = schema.get(root)?;
        if root_node.parent().is_some() || root_node.kind().is_terminal() {
            return Err(TreeError::unexpected_kind(
                root_node.name(),
                "a top-level interior node",
            ));
        }
        Ok(Self {
            schema,
            nodes: vec![Some(DataNode::new(root, None, NodeContent::None))],
            root: NodeId(0),
        })
    }

    /// Shared schema.
    #[must_use]
    pub const fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Root node.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    /// Whether the document holds no live nodes; never true for a document
    /// built through [`Document::new`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the node behind `id`.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&DataNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    /// Returns the node behind `id`, or an error for a stale handle.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::StaleNode`] if the node was removed or never
    /// existed.
    pub fn get(&self, id: NodeId) -> Result<&DataNode, TreeError> {
        self.node(id).ok_or(TreeError::StaleNode { index: id.0 })
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Result<&mut DataNode, TreeError> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(TreeError::StaleNode { index: id.0 })
    }

    /// Schema node instantiated by `id`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::StaleNode`] for stale handles.
    pub fn schema_of(&self, id: NodeId) -> Result<&SchemaNode, TreeError> {
        let node = self.get(id)?;
        self.schema.get(node.schema)
    }

    /// Schema kind of `id`, `None` for stale handles.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> Option<SchemaKind> {
        self.schema_of(id).ok().map(SchemaNode::kind)
    }

    /// Parent of `id`.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(DataNode::parent)
    }

    /// Children of `id` in document order; empty for stale handles.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(DataNode::children).unwrap_or_default()
    }

    /// First child of `id`.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    /// Lexical value of a leaf or leaf-list entry.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.node(id).and_then(DataNode::text)
    }

    /// Whether `id` is flagged as a default node.
    #[must_use]
    pub fn is_default(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(DataNode::is_default)
    }

    /// Sets the default flag of `id`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::StaleNode`] for stale handles.
    pub fn set_default(&mut self, id: NodeId, is_default: bool) -> Result<(), TreeError> {
        self.get_mut(id)?.is_default = is_default;
        Ok(())
    }

    /// Whether `id` is a presence container or keyed list entry.
    #[must_use]
    pub fn is_boundary(&self, id: NodeId) -> bool {
        self.kind(id).is_some_and(SchemaKind::is_boundary)
    }

    /// Appends a child instantiating `schema_node` below `parent`.
    ///
    /// # Errors
    ///
    /// Fails when `schema_node` is not a schema child of the parent's schema
    /// node, or when the content does not suit the node kind.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        schema_node: SchemaNodeId,
        content: NodeContent,
    ) -> Result<NodeId, TreeError> {
        let parent_schema = self.get(parent)?.schema;
        let child_schema = self.schema.get(schema_node)?;
        if child_schema.parent() != Some(parent_schema) {
            return Err(TreeError::unknown_schema_node(
                self.schema.schema_path(parent_schema),
                child_schema.name(),
            ));
        }
        let content = self.checked_content(parent, schema_node, content)?;
        Ok(self.push_child(parent, schema_node, content))
    }

    pub(crate) fn push_child(
        &mut self,
        parent: NodeId,
        schema_node: SchemaNodeId,
        content: NodeContent,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes
            .push(Some(DataNode::new(schema_node, Some(parent), content)));
        if let Ok(parent_node) = self.get_mut(parent) {
            parent_node.children.push(id);
        }
        id
    }

    /// Validates `content` against the kind and type of `schema_node`.
    pub(crate) fn checked_content(
        &self,
        parent: NodeId,
        schema_node: SchemaNodeId,
        content: NodeContent,
    ) -> Result<NodeContent, TreeError> {
        let schema = self.schema.get(schema_node)?;
        let kind = schema.kind();
        let describe_path = || {
            self.path_of(parent)
                .map_or_else(|_| schema.name().to_owned(), |p| format!("{p}/{}", schema.name()))
        };
        match content {
            NodeContent::None if !kind.holds_text() && !kind.holds_payload() => {
                Ok(NodeContent::None)
            }
            // An empty leaf may be created without a value.
            NodeContent::None
                if kind == SchemaKind::Leaf
                    && matches!(schema.leaf_type(), Some(crate::LeafType::Empty)) =>
            {
                Ok(NodeContent::Text(String::new()))
            }
            NodeContent::Text(text) if kind.holds_text() => {
                if let Some(leaf_type) = schema.leaf_type() {
                    leaf_type
                        .check(&text)
                        .map_err(|message| TreeError::invalid_value(describe_path(), &text, message))?;
                }
                Ok(NodeContent::Text(text))
            }
            NodeContent::Payload(payload) | NodeContent::Text(payload) if kind.holds_payload() => {
                Ok(NodeContent::Payload(payload))
            }
            other => Err(TreeError::ContentMismatch {
                path: describe_path(),
                kind: kind.as_str(),
                content: other.describe(),
            }),
        }
    }

    /// Replaces the content of an existing node after checking it.
    pub(crate) fn replace_content(
        &mut self,
        id: NodeId,
        content: NodeContent,
    ) -> Result<bool, TreeError> {
        let node = self.get(id)?;
        let schema_node = node.schema;
        let parent = node.parent.unwrap_or(id);
        let checked = self.checked_content(parent, schema_node, content)?;
        let node = self.get_mut(id)?;
        if node.content == checked {
            return Ok(false);
        }
        node.content = checked;
        Ok(true)
    }

    /// Overwrites the content of `id` without any checks, for building
    /// malformed trees in tests.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::StaleNode`] for stale handles.
    #[cfg(any(test, feature = "test-support"))]
    pub fn set_content_unchecked(
        &mut self,
        id: NodeId,
        content: NodeContent,
    ) -> Result<(), TreeError> {
        self.get_mut(id)?.content = content;
        Ok(())
    }

    /// Descendants of `id` in document (pre-)order, excluding `id` itself.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack = self.children(id).to_vec();
        stack.reverse();
        Descendants {
            document: self,
            stack,
        }
    }

    /// First node in document order, starting at the root, whose schema node
    /// satisfies `predicate`.
    pub fn find_first<P>(&self, predicate: P) -> Option<NodeId>
    where
        P: Fn(&SchemaNode) -> bool,
    {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .find(|id| self.schema_of(*id).is_ok_and(&predicate))
    }

    /// Identifying path of `id`.
    ///
    /// The module prefix is written on the top node and wherever the module
    /// changes. Keyed list entries carry one predicate per key and leaf-list
    /// entries a `.` predicate.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::StaleNode`] for stale handles.
    pub fn path_of(&self, id: NodeId) -> Result<String, TreeError> {
        let mut segments = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            segments.push(self.segment_of(current)?);
            cursor = self.parent(current);
        }
        segments.reverse();
        Ok(segments.iter().fold(String::new(), |mut path, segment| {
            path.push('/');
            path.push_str(segment);
            path
        }))
    }

    fn segment_of(&self, id: NodeId) -> Result<String, TreeError> {
        let node = self.get(id)?;
        let schema = self.schema.get(node.schema)?;
        let parent_module = match node.parent {
            Some(parent) => Some(self.schema_of(parent)?.module()),
            None => None,
        };
        let mut segment = if parent_module == Some(schema.module()) {
            schema.name().to_owned()
        } else {
            format!("{}:{}", schema.module(), schema.name())
        };
        match schema.kind() {
            SchemaKind::List { keyed: true } => {
                for key in schema.keys() {
                    let value = node
                        .children
                        .iter()
                        .copied()
                        .find(|child| {
                            self.schema_of(*child)
                                .is_ok_and(|child_schema| child_schema.name() == key)
                        })
                        .and_then(|child| self.text(child))
                        .unwrap_or_default();
                    segment.push_str(&format!("[{key}={}]", quote(value)));
                }
            }
            SchemaKind::LeafList => {
                let value = node.text().unwrap_or_default();
                segment.push_str(&format!("[.={}]", quote(value)));
            }
            _ => {}
        }
        Ok(segment)
    }

    /// Copies `id` into a new document where it becomes the root.
    ///
    /// With `recursive` the whole subtree is copied, otherwise only the node
    /// itself. Default flags are preserved.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::StaleNode`] for stale handles.
    pub fn duplicate_subtree(&self, id: NodeId, recursive: bool) -> Result<Self, TreeError> {
        let source = self.get(id)?;
        let mut root = DataNode::new(source.schema, None, source.content.clone());
        root.is_default = source.is_default;
        let mut copy = Self {
            schema: Arc::clone(&self.schema),
            nodes: vec![Some(root)],
            root: NodeId(0),
        };
        if recursive {
            let mut pending: Vec<(NodeId, NodeId)> = source
                .children
                .iter()
                .rev()
                .map(|child| (*child, copy.root))
                .collect();
            while let Some((original, new_parent)) = pending.pop() {
                let node = self.get(original)?;
                let new_id = copy.push_child(new_parent, node.schema, node.content.clone());
                copy.set_default(new_id, node.is_default)?;
                pending.extend(node.children.iter().rev().map(|child| (*child, new_id)));
            }
        }
        Ok(copy)
    }

    /// Removes every child subtree of `id`, returning how many nodes were
    /// freed.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::StaleNode`] for stale handles.
    pub fn remove_children(&mut self, id: NodeId) -> Result<usize, TreeError> {
        let mut pending = std::mem::take(&mut self.get_mut(id)?.children);
        let mut freed = 0;
        while let Some(current) = pending.pop() {
            if let Some(node) = self.nodes.get_mut(current.0).and_then(Option::take) {
                pending.extend(node.children);
                freed += 1;
            }
        }
        Ok(freed)
    }
}

/// Pre-order iterator over the descendants of a node.
#[derive(Debug)]
pub struct Descendants<'a> {
    document: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack
            .extend(self.document.children(next).iter().rev().copied());
        Some(next)
    }
}
