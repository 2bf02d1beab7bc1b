//! State store adapters.
//!
//! Both stores keep a `key -> (bytes, version)` map and share the guarded
//! batch semantics implemented by [`apply_batch`].

mod file;
mod lock;
mod memory;

pub use file::FileStateStore;
pub use memory::InMemoryStateStore;

use crate::ports::{StoreError, VersionedValue, WriteBatch};
use std::collections::HashMap;

pub(crate) type StateMap = HashMap<String, VersionedValue>;

/// Apply `batch` to `state`, or leave `state` untouched if any guard fails.
///
/// Guards are checked against the state as it was before the batch. Each
/// written key's version is bumped by one per write (first write = 1).
pub(crate) fn apply_batch(state: &mut StateMap, batch: WriteBatch) -> Result<(), StoreError> {
    for op in batch.operations() {
        let current = state.get(&op.key).map(|v| v.version);
        if !op.guard.holds(current) {
            return Err(StoreError::VersionConflict {
                key: op.key.clone(),
            });
        }
    }

    for op in batch.into_operations() {
        let next = state.get(&op.key).map_or(1, |v| v.version + 1);
        state.insert(
            op.key,
            VersionedValue {
                value: op.value,
                version: next,
            },
        );
    }
    Ok(())
}
