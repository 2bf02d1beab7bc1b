use super::{apply_batch, StateMap};
use crate::ports::{StateStore, StoreError, VersionedValue, WriteBatch};
use parking_lot::RwLock;
use std::collections::HashSet;

/// In-memory implementation of [`StateStore`].
///
/// Used by tests and by the node when no state file is configured. Reads
/// and writes for chosen keys can be made to fail to exercise error paths.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    state: RwLock<StateMap>,
    failing_writes: RwLock<HashSet<String>>,
    failing_reads: RwLock<HashSet<String>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every batch that writes `key`.
    pub fn fail_writes_to(&self, key: impl Into<String>) {
        self.failing_writes.write().insert(key.into());
    }

    /// Fail every read of `key`.
    pub fn fail_reads_of(&self, key: impl Into<String>) {
        self.failing_reads.write().insert(key.into());
    }

    /// Stop injecting failures.
    pub fn heal(&self) {
        self.failing_writes.write().clear();
        self.failing_reads.write().clear();
    }

    pub fn len(&self) -> usize {
        self.state.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.state.read().contains_key(key)
    }
}

impl StateStore for InMemoryStateStore {
    fn get_versioned(&self, key: &str) -> Result<Option<VersionedValue>, StoreError> {
        if self.failing_reads.read().contains(key) {
            return Err(StoreError::Io {
                message: format!("injected read failure for {key}"),
            });
        }
        Ok(self.state.read().get(key).cloned())
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        {
            let failing = self.failing_writes.read();
            if let Some(op) = batch.operations().iter().find(|op| failing.contains(&op.key)) {
                return Err(StoreError::Io {
                    message: format!("injected write failure for {}", op.key),
                });
            }
        }
        apply_batch(&mut self.state.write(), batch)
    }
}
