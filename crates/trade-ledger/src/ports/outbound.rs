//! # Outbound Ports (Driven Ports)
//!
//! SPIs the trade ledger depends on. The hosting ledger supplies the state
//! store; the node supplies a clock and any extension collaborators.
//!
//! ## State Store Contract
//!
//! - `get_versioned` returns the bytes stored under a key together with a
//!   version token that changes on every write to that key.
//! - `commit` applies a batch of writes atomically. Each write carries a
//!   [`WriteGuard`]; if any guard does not hold, NOTHING is applied and the
//!   store answers [`StoreError::VersionConflict`].

use crate::ports::inbound::TradeLedgerApi;
use thiserror::Error;

/// Per-key version token. Absent keys have no version.
pub type Version = u64;

/// Bytes stored under a key plus the version they were read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedValue {
    pub value: Vec<u8>,
    pub version: Version,
}

/// Precondition attached to a single write in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteGuard {
    /// Write regardless of the current state of the key.
    Unconditional,
    /// Key must not exist yet.
    Absent,
    /// Key must still be at this version.
    AtVersion(Version),
}

impl WriteGuard {
    /// Guard that holds iff the key is still in the state it was observed in.
    pub fn observed(version: Option<Version>) -> Self {
        match version {
            Some(v) => Self::AtVersion(v),
            None => Self::Absent,
        }
    }

    /// Check the guard against the key's current version.
    pub fn holds(&self, current: Option<Version>) -> bool {
        match self {
            Self::Unconditional => true,
            Self::Absent => current.is_none(),
            Self::AtVersion(v) => current == Some(*v),
        }
    }
}

/// A single guarded write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOperation {
    pub key: String,
    pub value: Vec<u8>,
    pub guard: WriteGuard,
}

/// Ordered set of writes committed all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    operations: Vec<BatchOperation>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an unconditional write.
    pub fn put(self, key: impl Into<String>, value: Vec<u8>) -> Self {
        self.put_guarded(key, value, WriteGuard::Unconditional)
    }

    /// Add a write that only applies if `guard` holds at commit time.
    pub fn put_guarded(mut self, key: impl Into<String>, value: Vec<u8>, guard: WriteGuard) -> Self {
        self.operations.push(BatchOperation {
            key: key.into(),
            value,
            guard,
        });
        self
    }

    pub fn push(&mut self, op: BatchOperation) {
        self.operations.push(op);
    }

    pub fn operations(&self) -> &[BatchOperation] {
        &self.operations
    }

    pub fn into_operations(self) -> Vec<BatchOperation> {
        self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Whether any write in the batch targets `key`.
    pub fn touches(&self, key: &str) -> bool {
        self.operations.iter().any(|op| op.key == key)
    }
}

/// Abstract interface to the ledger's key/value state.
///
/// Visibility within one invocation is linearizable; serialization across
/// invocations is the hosting ledger's job. The guarded `commit` lets the
/// services detect interleaved read-modify-writes instead of silently losing
/// one of them.
pub trait StateStore: Send + Sync {
    /// Read the bytes and version stored under `key`.
    fn get_versioned(&self, key: &str) -> Result<Option<VersionedValue>, StoreError>;

    /// Atomically apply every write in `batch`, or none of them.
    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    /// Read the bytes stored under `key`.
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.get_versioned(key)?.map(|v| v.value))
    }

    /// Unconditionally overwrite `key`.
    fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.commit(WriteBatch::new().put(key, value))
    }
}

/// Abstract interface for wall-clock time (for testability).
pub trait TimeSource: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// Pluggable behavior behind the `submit_for_enrichment` and
/// `mark_revision_needed` invocations.
///
/// The ledger defines no semantics for these calls; a collaborator that
/// does registers itself with the invocation handler. It receives the
/// ledger API and the raw invocation arguments.
pub trait TradeExtension: Send + Sync {
    fn execute(
        &self,
        ledger: &dyn TradeLedgerApi,
        args: &[String],
    ) -> Result<Option<Vec<u8>>, String>;
}

/// State store failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("state store I/O error: {message}")]
    Io { message: String },

    #[error("state store corruption: {message}")]
    Corruption { message: String },

    #[error("write to {key} rejected: version changed since it was read")]
    VersionConflict { key: String },

    #[error("write to {key} rejected: {reason}")]
    Rejected { key: String, reason: String },
}
