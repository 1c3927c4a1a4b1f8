//! Error types for schema and data tree operations.

use thiserror::Error;

/// Errors returned by schema construction, path handling, insertion and
/// validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A path string could not be parsed.
    #[error("invalid path '{path}': {message}")]
    PathSyntax {
        /// Offending path.
        path: String,
        /// What was wrong with it.
        message: String,
    },

    /// A path segment names a node the schema does not define.
    #[error("no schema node '{name}' under '{parent}'")]
    UnknownSchemaNode {
        /// Schema path of the parent that was searched.
        parent: String,
        /// Requested node name.
        name: String,
    },

    /// An absolute path does not start at the document root.
    #[error("path '{path}' is outside the document rooted at '{root}'")]
    OutsideDocument {
        /// Offending path.
        path: String,
        /// Name of the document root.
        root: String,
    },

    /// A node was given content its kind cannot hold.
    #[error("node '{path}' of kind {kind} cannot hold {content}")]
    ContentMismatch {
        /// Path of the node.
        path: String,
        /// Schema kind of the node.
        kind: &'static str,
        /// Description of the rejected content.
        content: &'static str,
    },

    /// A leaf value failed its type check.
    #[error("invalid value '{value}' for '{path}': {message}")]
    InvalidValue {
        /// Path of the leaf.
        path: String,
        /// Rejected lexical value.
        value: String,
        /// Type check failure.
        message: String,
    },

    /// A keyed list entry lacks one of its keys.
    #[error("list entry '{path}' is missing key '{key}'")]
    MissingKey {
        /// Path of the list entry.
        path: String,
        /// Name of the missing key.
        key: String,
    },

    /// A mandatory node is absent.
    #[error("mandatory node '{name}' is missing under '{path}'")]
    MissingMandatory {
        /// Path of the parent.
        path: String,
        /// Name of the missing node.
        name: String,
    },

    /// A value-bearing node already exists and updates were not allowed.
    #[error("node '{path}' already exists")]
    AlreadyExists {
        /// Path of the existing node.
        path: String,
    },

    /// A node of the wrong kind was supplied where a specific kind is needed.
    #[error("'{name}' is not {expected}")]
    UnexpectedKind {
        /// Name of the node.
        name: String,
        /// Expected kind description.
        expected: &'static str,
    },

    /// A node handle no longer refers to a live node.
    #[error("node handle {index} is stale")]
    StaleNode {
        /// Arena slot of the handle.
        index: usize,
    },
}

impl TreeError {
    /// Creates a `PathSyntax` error.
    #[must_use]
    pub fn path_syntax(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PathSyntax {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an `UnknownSchemaNode` error.
    #[must_use]
    pub fn unknown_schema_node(parent: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownSchemaNode {
            parent: parent.into(),
            name: name.into(),
        }
    }

    /// Creates an `InvalidValue` error.
    #[must_use]
    pub fn invalid_value(
        path: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            path: path.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    /// Creates an `UnexpectedKind` error.
    #[must_use]
    pub fn unexpected_kind(name: impl Into<String>, expected: &'static str) -> Self {
        Self::UnexpectedKind {
            name: name.into(),
            expected,
        }
    }
}
