//! Ownership of flat values and their auxiliary buffers.
//!
//! Every flat value travels inside a [`ValueBatch`]. Raw anyxml and anydata
//! payloads live in [`AuxBuffer`]s, which report their release to the
//! [`AuxLedger`] that issued them when dropped. Releasing a batch therefore
//! releases every buffer it carries exactly once, whichever way an operation
//! exits.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::OperationError;
use crate::value::Value;

#[derive(Debug, Default)]
struct LedgerCounts {
    acquired: AtomicUsize,
    released: AtomicUsize,
}

/// Shared counter of auxiliary buffer acquisitions and releases.
#[derive(Debug, Clone, Default)]
pub struct AuxLedger {
    counts: Arc<LedgerCounts>,
}

impl AuxLedger {
    /// Creates a ledger with no recorded buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of `payload` in a new tracked buffer.
    #[must_use]
    pub fn acquire(&self, payload: impl Into<String>) -> AuxBuffer {
        self.counts.acquired.fetch_add(1, Ordering::SeqCst);
        AuxBuffer {
            payload: payload.into(),
            ledger: self.clone(),
        }
    }

    /// Number of buffers issued so far.
    #[must_use]
    pub fn acquired(&self) -> usize {
        self.counts.acquired.load(Ordering::SeqCst)
    }

    /// Number of buffers released so far.
    #[must_use]
    pub fn released(&self) -> usize {
        self.counts.released.load(Ordering::SeqCst)
    }

    /// Buffers issued but not yet released.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.acquired().saturating_sub(self.released())
    }

    /// Whether every issued buffer has been released.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.acquired() == self.released()
    }
}

/// Owned payload of an anyxml or anydata value.
///
/// The buffer is released when dropped; it cannot be cloned, so each
/// acquisition is matched by exactly one release.
#[derive(Debug)]
pub struct AuxBuffer {
    payload: String,
    ledger: AuxLedger,
}

impl AuxBuffer {
    /// Borrowed payload text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.payload
    }
}

impl PartialEq for AuxBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.payload == other.payload
    }
}

impl Drop for AuxBuffer {
    fn drop(&mut self) {
        self.ledger.counts.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// A typed value addressed by the identifying path of its node.
#[derive(Debug, PartialEq)]
pub struct FlatValue {
    path: String,
    value: Value,
    is_default: bool,
}

impl FlatValue {
    /// Creates an explicit value.
    #[must_use]
    pub fn new(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            value,
            is_default: false,
        }
    }

    /// Creates a value that only exists because of a schema default.
    #[must_use]
    pub fn default_value(path: impl Into<String>, value: Value) -> Self {
        Self {
            is_default: true,
            ..Self::new(path, value)
        }
    }

    /// Identifying path of the node.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Typed value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Whether the value is a schema default.
    #[must_use]
    pub const fn is_default(&self) -> bool {
        self.is_default
    }

    /// Auxiliary buffer owned by the value, if any.
    #[must_use]
    pub const fn aux(&self) -> Option<&AuxBuffer> {
        self.value.aux()
    }
}

/// Owning sequence of flat values.
///
/// Dropping the batch drops every value and with them every auxiliary
/// buffer.
#[derive(Debug, Default, PartialEq)]
pub struct ValueBatch {
    values: Vec<FlatValue>,
}

impl ValueBatch {
    /// Creates an empty batch able to hold `capacity` values without
    /// reallocating.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Allocation`] when the storage cannot be
    /// reserved.
    pub fn with_capacity(capacity: usize) -> Result<Self, OperationError> {
        let mut values = Vec::new();
        values.try_reserve_exact(capacity).map_err(|error| {
            OperationError::allocation(format!("{capacity} flat values: {error}"))
        })?;
        Ok(Self { values })
    }

    /// Appends a value.
    pub fn push(&mut self, value: FlatValue) {
        self.values.push(value);
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the batch holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrowed view of the values, in order.
    #[must_use]
    pub fn as_slice(&self) -> &[FlatValue] {
        &self.values
    }

    /// Iterates over the values in order.
    pub fn iter(&self) -> std::slice::Iter<'_, FlatValue> {
        self.values.iter()
    }
}

impl From<Vec<FlatValue>> for ValueBatch {
    fn from(values: Vec<FlatValue>) -> Self {
        Self { values }
    }
}

impl FromIterator<FlatValue> for ValueBatch {
    fn from_iter<I: IntoIterator<Item = FlatValue>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ValueBatch {
    type Item = FlatValue;
    type IntoIter = std::vec::IntoIter<FlatValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValueBatch {
    type Item = &'a FlatValue;
    type IntoIter = std::slice::Iter<'a, FlatValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
