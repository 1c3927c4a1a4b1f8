//! Data node representation.

use crate::schema::SchemaNodeId;

/// Handle to a node in a [`Document`](crate::Document).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Arena slot of this handle.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Value carried by a data node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NodeContent {
    /// Interior nodes carry nothing.
    #[default]
    None,
    /// Lexical value of a leaf or leaf-list entry.
    Text(String),
    /// Serialized anyxml or anydata content.
    Payload(String),
}

impl NodeContent {
    /// Creates text content.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Creates payload content.
    #[must_use]
    pub fn payload(value: impl Into<String>) -> Self {
        Self::Payload(value.into())
    }

    /// Short description used in diagnostics.
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::None => "no value",
            Self::Text(_) => "a lexical value",
            Self::Payload(_) => "a raw payload",
        }
    }
}

/// A node in a data tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataNode {
    pub(crate) schema: SchemaNodeId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) content: NodeContent,
    pub(crate) is_default: bool,
}

impl DataNode {
    pub(crate) const fn new(schema: SchemaNodeId, parent: Option<NodeId>, content: NodeContent) -> Self {
        Self {
            schema,
            parent,
            children: Vec::new(),
            content,
            is_default: false,
        }
    }

    /// Schema node this data node instantiates.
    #[must_use]
    pub const fn schema(&self) -> SchemaNodeId {
        self.schema
    }

    /// Parent node, `None` for the document root.
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in document order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Carried value.
    #[must_use]
    pub const fn content(&self) -> &NodeContent {
        &self.content
    }

    /// Lexical value of a leaf or leaf-list entry.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            NodeContent::Text(text) => Some(text),
            NodeContent::None | NodeContent::Payload(_) => None,
        }
    }

    /// Whether the node only exists because of a schema default.
    #[must_use]
    pub const fn is_default(&self) -> bool {
        self.is_default
    }
}
