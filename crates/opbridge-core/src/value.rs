//! Typed values exchanged with the backend.

use std::fmt;
use std::str::FromStr;

use opbridge_tree::{
    Document, LeafType, NodeContent, NodeId, SchemaKind, format_decimal64, parse_decimal64,
};

use crate::errors::OperationError;
use crate::guard::{AuxBuffer, AuxLedger};

/// Typed value of a flat path/value record.
#[derive(Debug, PartialEq)]
pub enum Value {
    /// Non-presence container.
    Container,
    /// Presence container.
    PresenceContainer,
    /// List entry.
    ListEntry,
    /// Boolean leaf.
    Bool(bool),
    /// Signed 8-bit leaf.
    Int8(i8),
    /// Signed 16-bit leaf.
    Int16(i16),
    /// Signed 32-bit leaf.
    Int32(i32),
    /// Signed 64-bit leaf.
    Int64(i64),
    /// Unsigned 8-bit leaf.
    Uint8(u8),
    /// Unsigned 16-bit leaf.
    Uint16(u16),
    /// Unsigned 32-bit leaf.
    Uint32(u32),
    /// Unsigned 64-bit leaf.
    Uint64(u64),
    /// Fixed-point decimal scaled by `10^fraction_digits`.
    Decimal64 {
        /// Scaled integer value.
        digits: i64,
        /// Digits after the decimal point.
        fraction_digits: u8,
    },
    /// String leaf.
    String(String),
    /// Enumeration leaf.
    Enum(String),
    /// Bits leaf.
    Bits(String),
    /// Identity reference leaf.
    IdentityRef(String),
    /// Instance identifier leaf.
    InstanceId(String),
    /// Base64 binary leaf.
    Binary(String),
    /// Empty leaf.
    Empty,
    /// Raw anyxml payload.
    AnyXml(AuxBuffer),
    /// Raw anydata payload.
    AnyData(AuxBuffer),
}

impl Value {
    /// Converts a value-bearing data node into a typed value.
    ///
    /// Payload nodes take a buffer from `ledger`; interior nodes map to the
    /// structural variants.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Validation`] when the node's text does not
    /// parse as its leaf type, and [`OperationError::Internal`] for stale
    /// handles.
    pub fn from_node(
        document: &Document,
        id: NodeId,
        ledger: &AuxLedger,
    ) -> Result<Self, OperationError> {
        let schema = document
            .schema_of(id)
            .map_err(|error| OperationError::internal(error.to_string()))?;
        let node = document
            .get(id)
            .map_err(|error| OperationError::internal(error.to_string()))?;
        let invalid = |message: String| {
            let path = document
                .path_of(id)
                .unwrap_or_else(|_| schema.name().to_owned());
            OperationError::validation(path, message)
        };

        match schema.kind() {
            SchemaKind::Container { presence: false } => Ok(Self::Container),
            SchemaKind::Container { presence: true } => Ok(Self::PresenceContainer),
            SchemaKind::List { .. } => Ok(Self::ListEntry),
            SchemaKind::Rpc | SchemaKind::Action => Err(OperationError::internal(format!(
                "operation node '{}' cannot be sent as a value",
                schema.name()
            ))),
            SchemaKind::AnyXml | SchemaKind::AnyData => {
                let payload = match node.content() {
                    NodeContent::Payload(payload) | NodeContent::Text(payload) => payload.as_str(),
                    NodeContent::None => "",
                };
                let buffer = ledger.acquire(payload);
                Ok(if schema.kind() == SchemaKind::AnyXml {
                    Self::AnyXml(buffer)
                } else {
                    Self::AnyData(buffer)
                })
            }
            SchemaKind::Leaf | SchemaKind::LeafList => {
                let text = node.text().unwrap_or_default();
                let leaf_type = schema
                    .leaf_type()
                    .ok_or_else(|| invalid(String::from("leaf has no type")))?;
                Self::parse_leaf(leaf_type, text).map_err(invalid)
            }
        }
    }

    fn parse_leaf(leaf_type: &LeafType, text: &str) -> Result<Self, String> {
        leaf_type.check(text)?;
        let value = match leaf_type {
            LeafType::Boolean => Self::Bool(text == "true"),
            LeafType::Int8 => Self::Int8(parse_number(text)?),
            LeafType::Int16 => Self::Int16(parse_number(text)?),
            LeafType::Int32 => Self::Int32(parse_number(text)?),
            LeafType::Int64 => Self::Int64(parse_number(text)?),
            LeafType::Uint8 => Self::Uint8(parse_number(text)?),
            LeafType::Uint16 => Self::Uint16(parse_number(text)?),
            LeafType::Uint32 => Self::Uint32(parse_number(text)?),
            LeafType::Uint64 => Self::Uint64(parse_number(text)?),
            LeafType::Decimal64 { fraction_digits } => Self::Decimal64 {
                digits: parse_decimal64(text, *fraction_digits)?,
                fraction_digits: *fraction_digits,
            },
            LeafType::String => Self::String(text.to_owned()),
            LeafType::Enumeration(_) => Self::Enum(text.to_owned()),
            LeafType::Bits => Self::Bits(text.to_owned()),
            LeafType::IdentityRef => Self::IdentityRef(text.to_owned()),
            LeafType::InstanceIdentifier => Self::InstanceId(text.to_owned()),
            LeafType::Binary => Self::Binary(text.to_owned()),
            LeafType::Empty => Self::Empty,
        };
        Ok(value)
    }

    /// Node content carrying this value in canonical form.
    #[must_use]
    pub fn to_content(&self) -> NodeContent {
        match self {
            Self::Container | Self::PresenceContainer | Self::ListEntry => NodeContent::None,
            Self::AnyXml(buffer) | Self::AnyData(buffer) => NodeContent::payload(buffer.as_str()),
            Self::Empty => NodeContent::text(""),
            scalar => NodeContent::text(scalar.to_string()),
        }
    }

    /// Auxiliary buffer owned by a payload value.
    #[must_use]
    pub const fn aux(&self) -> Option<&AuxBuffer> {
        match self {
            Self::AnyXml(buffer) | Self::AnyData(buffer) => Some(buffer),
            _ => None,
        }
    }

    /// Type keyword used in logs.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::PresenceContainer => "presence-container",
            Self::ListEntry => "list",
            Self::Bool(_) => "boolean",
            Self::Int8(_) => "int8",
            Self::Int16(_) => "int16",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Uint8(_) => "uint8",
            Self::Uint16(_) => "uint16",
            Self::Uint32(_) => "uint32",
            Self::Uint64(_) => "uint64",
            Self::Decimal64 { .. } => "decimal64",
            Self::String(_) => "string",
            Self::Enum(_) => "enumeration",
            Self::Bits(_) => "bits",
            Self::IdentityRef(_) => "identityref",
            Self::InstanceId(_) => "instance-identifier",
            Self::Binary(_) => "binary",
            Self::Empty => "empty",
            Self::AnyXml(_) => "anyxml",
            Self::AnyData(_) => "anydata",
        }
    }
}

/// Canonical lexical form; structural values render as nothing.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Container | Self::PresenceContainer | Self::ListEntry | Self::Empty => Ok(()),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int8(value) => write!(f, "{value}"),
            Self::Int16(value) => write!(f, "{value}"),
            Self::Int32(value) => write!(f, "{value}"),
            Self::Int64(value) => write!(f, "{value}"),
            Self::Uint8(value) => write!(f, "{value}"),
            Self::Uint16(value) => write!(f, "{value}"),
            Self::Uint32(value) => write!(f, "{value}"),
            Self::Uint64(value) => write!(f, "{value}"),
            Self::Decimal64 {
                digits,
                fraction_digits,
            } => f.write_str(&format_decimal64(*digits, *fraction_digits)),
            Self::String(text)
            | Self::Enum(text)
            | Self::Bits(text)
            | Self::IdentityRef(text)
            | Self::InstanceId(text)
            | Self::Binary(text) => f.write_str(text),
            Self::AnyXml(buffer) | Self::AnyData(buffer) => f.write_str(buffer.as_str()),
        }
    }
}

fn parse_number<T>(text: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    text.parse::<T>().map_err(|error| error.to_string())
}
