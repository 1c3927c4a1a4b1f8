//! Schema arena describing the shape of data trees.
//!
//! Schema nodes are stored in a flat arena and addressed by
//! [`SchemaNodeId`]. Children of operation nodes (RPCs and actions) are
//! tagged with a [`Direction`] so that input parameters and output values
//! with the same name can coexist.

use crate::error::TreeError;
use crate::types::LeafType;

/// Handle to a node in a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaNodeId(usize);

impl SchemaNodeId {
    /// Arena slot of this handle.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Kind of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    /// Operation invoked independently of any data instance.
    Rpc,
    /// Operation bound to a data instance.
    Action,
    /// Container; a presence container carries meaning by existing.
    Container {
        /// Whether the container is a presence container.
        presence: bool,
    },
    /// List; entries of keyed lists are identified by their key leaves.
    List {
        /// Whether the list declares keys.
        keyed: bool,
    },
    /// Single-valued leaf.
    Leaf,
    /// Entry of a leaf-list.
    LeafList,
    /// Opaque XML payload.
    AnyXml,
    /// Opaque data payload.
    AnyData,
}

impl SchemaKind {
    /// Whether this is an RPC or an action.
    #[must_use]
    pub const fn is_operation(self) -> bool {
        matches!(self, Self::Rpc | Self::Action)
    }

    /// Whether nodes of this kind never have children.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Leaf | Self::LeafList | Self::AnyXml | Self::AnyData
        )
    }

    /// Whether a node's own existence is meaningful data: presence
    /// containers and keyed list entries.
    #[must_use]
    pub const fn is_boundary(self) -> bool {
        matches!(
            self,
            Self::Container { presence: true } | Self::List { keyed: true }
        )
    }

    /// Whether nodes of this kind carry a lexical value.
    #[must_use]
    pub const fn holds_text(self) -> bool {
        matches!(self, Self::Leaf | Self::LeafList)
    }

    /// Whether nodes of this kind carry a raw payload.
    #[must_use]
    pub const fn holds_payload(self) -> bool {
        matches!(self, Self::AnyXml | Self::AnyData)
    }

    /// Keyword used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rpc => "rpc",
            Self::Action => "action",
            Self::Container { presence: true } => "presence container",
            Self::Container { presence: false } => "container",
            Self::List { .. } => "list",
            Self::Leaf => "leaf",
            Self::LeafList => "leaf-list",
            Self::AnyXml => "anyxml",
            Self::AnyData => "anydata",
        }
    }
}

/// Which half of an operation a node belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    /// Ordinary data outside any operation.
    #[default]
    Data,
    /// Operation input parameters.
    Input,
    /// Operation output values.
    Output,
}

/// Declaration of a schema node, consumed by the [`Schema`] builder methods.
#[derive(Debug, Clone)]
pub struct NodeSpec {
    name: String,
    module: Option<String>,
    kind: SchemaKind,
    keys: Vec<String>,
    leaf_type: Option<LeafType>,
    mandatory: bool,
    default: Option<String>,
}

impl NodeSpec {
    fn new(name: impl Into<String>, kind: SchemaKind) -> Self {
        Self {
            name: name.into(),
            module: None,
            kind,
            keys: Vec::new(),
            leaf_type: None,
            mandatory: false,
            default: None,
        }
    }

    /// Declares an RPC.
    #[must_use]
    pub fn rpc(name: impl Into<String>) -> Self {
        Self::new(name, SchemaKind::Rpc)
    }

    /// Declares an action.
    #[must_use]
    pub fn action(name: impl Into<String>) -> Self {
        Self::new(name, SchemaKind::Action)
    }

    /// Declares a non-presence container.
    #[must_use]
    pub fn container(name: impl Into<String>) -> Self {
        Self::new(name, SchemaKind::Container { presence: false })
    }

    /// Declares a presence container.
    #[must_use]
    pub fn presence_container(name: impl Into<String>) -> Self {
        Self::new(name, SchemaKind::Container { presence: true })
    }

    /// Declares a list keyed by `keys`; an empty slice declares a keyless list.
    #[must_use]
    pub fn list(name: impl Into<String>, keys: &[&str]) -> Self {
        let mut spec = Self::new(
            name,
            SchemaKind::List {
                keyed: !keys.is_empty(),
            },
        );
        spec.keys = keys.iter().map(|key| (*key).to_owned()).collect();
        spec
    }

    /// Declares a leaf.
    #[must_use]
    pub fn leaf(name: impl Into<String>, leaf_type: LeafType) -> Self {
        let mut spec = Self::new(name, SchemaKind::Leaf);
        spec.leaf_type = Some(leaf_type);
        spec
    }

    /// Declares a leaf-list.
    #[must_use]
    pub fn leaf_list(name: impl Into<String>, leaf_type: LeafType) -> Self {
        let mut spec = Self::new(name, SchemaKind::LeafList);
        spec.leaf_type = Some(leaf_type);
        spec
    }

    /// Declares an anyxml node.
    #[must_use]
    pub fn anyxml(name: impl Into<String>) -> Self {
        Self::new(name, SchemaKind::AnyXml)
    }

    /// Declares an anydata node.
    #[must_use]
    pub fn anydata(name: impl Into<String>) -> Self {
        Self::new(name, SchemaKind::AnyData)
    }

    /// Places the node in `module` instead of its parent's module.
    #[must_use]
    pub fn in_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Marks the node mandatory.
    #[must_use]
    pub const fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    /// Sets the schema default of a leaf.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// A node in the schema arena.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    name: String,
    module: String,
    kind: SchemaKind,
    direction: Direction,
    keys: Vec<String>,
    leaf_type: Option<LeafType>,
    mandatory: bool,
    default: Option<String>,
    parent: Option<SchemaNodeId>,
    children: Vec<SchemaNodeId>,
}

impl SchemaNode {
    /// Node name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Module the node belongs to.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Node kind.
    #[must_use]
    pub const fn kind(&self) -> SchemaKind {
        self.kind
    }

    /// Operation half the node belongs to.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Key leaf names of a keyed list, in declaration order.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Whether `name` is one of this list's keys.
    #[must_use]
    pub fn is_key(&self, name: &str) -> bool {
        self.keys.iter().any(|key| key == name)
    }

    /// Type of a leaf or leaf-list.
    #[must_use]
    pub const fn leaf_type(&self) -> Option<&LeafType> {
        self.leaf_type.as_ref()
    }

    /// Whether the node is mandatory.
    #[must_use]
    pub const fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    /// Schema default of a leaf.
    #[must_use]
    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Parent schema node.
    #[must_use]
    pub const fn parent(&self) -> Option<SchemaNodeId> {
        self.parent
    }

    /// Child schema nodes in declaration order.
    #[must_use]
    pub fn children(&self) -> &[SchemaNodeId] {
        &self.children
    }
}

/// Arena of schema nodes.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    nodes: Vec<SchemaNode>,
    roots: Vec<SchemaNodeId>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a top-level node in `module`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::AlreadyExists`] when the module already defines a
    /// top-level node with the same name.
    pub fn add_root(
        &mut self,
        module: impl Into<String>,
        spec: NodeSpec,
    ) -> Result<SchemaNodeId, TreeError> {
        let module = module.into();
        if self.root(Some(&module), &spec.name).is_some() {
            return Err(TreeError::AlreadyExists {
                path: format!("/{module}:{}", spec.name),
            });
        }
        let id = self.push(spec, module, Direction::Data, None);
        self.roots.push(id);
        Ok(id)
    }

    /// Adds a child under `parent`, inheriting its module and direction.
    ///
    /// # Errors
    ///
    /// Fails when the parent is stale, terminal, or an operation (use
    /// [`Schema::add_input`] or [`Schema::add_output`] instead), or when the
    /// name is already taken.
    pub fn add_child(
        &mut self,
        parent: SchemaNodeId,
        spec: NodeSpec,
    ) -> Result<SchemaNodeId, TreeError> {
        let parent_node = self.get(parent)?;
        if parent_node.kind.is_operation() {
            return Err(TreeError::unexpected_kind(
                parent_node.name.clone(),
                "a data node (use add_input or add_output)",
            ));
        }
        let direction = parent_node.direction;
        self.attach(parent, spec, direction)
    }

    /// Adds an input parameter to an RPC or action.
    ///
    /// # Errors
    ///
    /// Fails when `operation` is not an RPC or action, or the name is taken.
    pub fn add_input(
        &mut self,
        operation: SchemaNodeId,
        spec: NodeSpec,
    ) -> Result<SchemaNodeId, TreeError> {
        self.attach_to_operation(operation, spec, Direction::Input)
    }

    /// Adds an output value to an RPC or action.
    ///
    /// # Errors
    ///
    /// Fails when `operation` is not an RPC or action, or the name is taken.
    pub fn add_output(
        &mut self,
        operation: SchemaNodeId,
        spec: NodeSpec,
    ) -> Result<SchemaNodeId, TreeError> {
        self.attach_to_operation(operation, spec, Direction::Output)
    }

    fn attach_to_operation(
        &mut self,
        operation: SchemaNodeId,
        spec: NodeSpec,
        direction: Direction,
    ) -> Result<SchemaNodeId, TreeError> {
        let node = self.get(operation)?;
        if !node.kind.is_operation() {
            return Err(TreeError::unexpected_kind(
                node.name.clone(),
                "an rpc or action",
            ));
        }
        self.attach(operation, spec, direction)
    }

    fn attach(
        &mut self,
        parent: SchemaNodeId,
        spec: NodeSpec,
        direction: Direction,
    ) -> Result<SchemaNodeId, TreeError> {
        let parent_node = self.get(parent)?;
        if parent_node.kind.is_terminal() {
            return Err(TreeError::unexpected_kind(
                parent_node.name.clone(),
                "a node that can have children",
            ));
        }
        if spec.kind == SchemaKind::Rpc {
            return Err(TreeError::unexpected_kind(spec.name, "allowed below the top level"));
        }
        let module = spec
            .module
            .clone()
            .unwrap_or_else(|| parent_node.module.clone());
        if self
            .child(parent, Some(&module), &spec.name, direction)
            .is_some()
        {
            return Err(TreeError::AlreadyExists {
                path: format!("{}/{}", self.schema_path(parent), spec.name),
            });
        }
        let id = self.push(spec, module, direction, Some(parent));
        if let Some(parent_node) = self.nodes.get_mut(parent.0) {
            parent_node.children.push(id);
        }
        Ok(id)
    }

    fn push(
        &mut self,
        spec: NodeSpec,
        module: String,
        direction: Direction,
        parent: Option<SchemaNodeId>,
    ) -> SchemaNodeId {
        let id = SchemaNodeId(self.nodes.len());
        self.nodes.push(SchemaNode {
            name: spec.name,
            module,
            kind: spec.kind,
            direction,
            keys: spec.keys,
            leaf_type: spec.leaf_type,
            mandatory: spec.mandatory,
            default: spec.default,
            parent,
            children: Vec::new(),
        });
        id
    }

    /// Returns the schema node behind `id`.
    #[must_use]
    pub fn node(&self, id: SchemaNodeId) -> Option<&SchemaNode> {
        self.nodes.get(id.0)
    }

    /// Returns the schema node behind `id`, or an error for a stale handle.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::StaleNode`] if the handle is not in this schema.
    pub fn get(&self, id: SchemaNodeId) -> Result<&SchemaNode, TreeError> {
        self.node(id)
            .ok_or(TreeError::StaleNode { index: id.0 })
    }

    /// Finds a top-level node by name, optionally restricted to a module.
    #[must_use]
    pub fn root(&self, module: Option<&str>, name: &str) -> Option<SchemaNodeId> {
        self.roots.iter().copied().find(|id| {
            self.node(*id)
                .is_some_and(|node| node.name == name && module.is_none_or(|m| m == node.module))
        })
    }

    /// Finds a child of `parent` by name.
    ///
    /// Below an operation only children of the requested `direction` match;
    /// below any other node the direction is inherited and ignored.
    #[must_use]
    pub fn child(
        &self,
        parent: SchemaNodeId,
        module: Option<&str>,
        name: &str,
        direction: Direction,
    ) -> Option<SchemaNodeId> {
        let parent_node = self.node(parent)?;
        let filter_direction = parent_node.kind.is_operation();
        parent_node.children.iter().copied().find(|id| {
            self.node(*id).is_some_and(|node| {
                node.name == name
                    && module.is_none_or(|m| m == node.module)
                    && (!filter_direction || node.direction == direction)
            })
        })
    }

    /// Slash separated schema path of `id`, used in diagnostics.
    #[must_use]
    pub fn schema_path(&self, id: SchemaNodeId) -> String {
        let mut names = Vec::new();
        let mut cursor = self.node(id);
        while let Some(node) = cursor {
            names.push(node.name.as_str());
            cursor = node.parent.and_then(|parent| self.node(parent));
        }
        names.reverse();
        format!("/{}", names.join("/"))
    }
}
