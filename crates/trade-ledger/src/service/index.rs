use crate::domain::{decode_index, encode_index, LedgerConfig, LedgerError, TradeIndex};
use crate::ports::{BatchOperation, StateStore, Version, WriteBatch, WriteGuard};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::retry_on_conflict;

/// An index append that has been read and computed but not yet committed.
#[derive(Debug, Clone)]
pub struct StagedAppend {
    /// Guarded write of the extended index.
    pub operation: BatchOperation,
    /// Index length once the write is applied.
    pub len: usize,
}

/// Owner of the trade index value.
///
/// The index is a single JSON array stored under the configured index key.
/// It is read fresh for every operation.
pub struct IndexManager<S: StateStore> {
    store: Arc<S>,
    index_key: String,
    max_commit_attempts: u32,
}

impl<S: StateStore> IndexManager<S> {
    pub fn new(store: Arc<S>, config: &LedgerConfig) -> Self {
        Self {
            store,
            index_key: config.index_key.clone(),
            max_commit_attempts: config.max_commit_attempts,
        }
    }

    pub fn index_key(&self) -> &str {
        &self.index_key
    }

    /// Current index and the version it was read at.
    ///
    /// An absent index reads as empty. So does a malformed one: it is
    /// logged and will be replaced by the next write.
    fn read(&self) -> Result<(TradeIndex, Option<Version>), LedgerError> {
        let Some(stored) = self.store.get_versioned(&self.index_key)? else {
            return Ok((TradeIndex::new(), None));
        };
        let index = decode_index(&stored.value).unwrap_or_else(|err| {
            warn!(
                index_key = %self.index_key,
                error = %err,
                "Trade index is malformed, treating it as empty"
            );
            TradeIndex::new()
        });
        Ok((index, Some(stored.version)))
    }

    /// Unconditional write of an empty index.
    pub fn reset_operation(&self) -> Result<BatchOperation, LedgerError> {
        let empty = encode_index(&TradeIndex::new())
            .map_err(|e| LedgerError::codec(&self.index_key, e))?;
        Ok(BatchOperation {
            key: self.index_key.clone(),
            value: empty,
            guard: WriteGuard::Unconditional,
        })
    }

    /// Overwrite the index with an empty sequence.
    #[instrument(skip(self), fields(index_key = %self.index_key))]
    pub fn reset(&self) -> Result<(), LedgerError> {
        let mut batch = WriteBatch::new();
        batch.push(self.reset_operation()?);
        self.store.commit(batch)?;
        debug!("Trade index reset");
        Ok(())
    }

    /// Read the index and compute the guarded write that appends `key`.
    ///
    /// The write only applies if the index is unchanged when it is
    /// committed, so it can be batched with other writes.
    pub fn stage_append(&self, key: &str) -> Result<StagedAppend, LedgerError> {
        let (mut index, version) = self.read()?;
        index.push(key);
        let len = index.len();
        let value = encode_index(&index).map_err(|e| LedgerError::codec(&self.index_key, e))?;
        Ok(StagedAppend {
            operation: BatchOperation {
                key: self.index_key.clone(),
                value,
                guard: WriteGuard::observed(version),
            },
            len,
        })
    }

    /// Append `key` at the end of the index, returning the new length.
    #[instrument(skip(self), fields(index_key = %self.index_key))]
    pub fn append(&self, key: &str) -> Result<usize, LedgerError> {
        retry_on_conflict(&self.index_key, self.max_commit_attempts, |_| {
            let staged = self.stage_append(key)?;
            let mut batch = WriteBatch::new();
            batch.push(staged.operation);
            self.store.commit(batch)?;
            Ok(staged.len)
        })
    }

    /// Index entries in insertion order.
    pub fn list(&self) -> Result<Vec<String>, LedgerError> {
        Ok(self.read()?.0.into_entries())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryStateStore;
    use crate::ports::StoreError;

    fn manager() -> (Arc<InMemoryStateStore>, IndexManager<InMemoryStateStore>) {
        let store = Arc::new(InMemoryStateStore::new());
        let index = IndexManager::new(store.clone(), &LedgerConfig::default());
        (store, index)
    }

    #[test]
    fn test_absent_index_lists_empty() {
        let (_, index) = manager();
        assert!(index.list().unwrap().is_empty());
    }

    #[test]
    fn test_append_preserves_order() {
        let (_, index) = manager();
        assert_eq!(index.append("t1").unwrap(), 1);
        assert_eq!(index.append("t2").unwrap(), 2);
        assert_eq!(index.append("t1").unwrap(), 3);
        assert_eq!(index.list().unwrap(), vec!["t1", "t2", "t1"]);
    }

    #[test]
    fn test_reset_clears_index() {
        let (store, index) = manager();
        index.append("t1").unwrap();
        index.reset().unwrap();
        assert!(index.list().unwrap().is_empty());
        assert_eq!(store.get_state("_tradeindex").unwrap(), Some(b"[]".to_vec()));
    }

    #[test]
    fn test_malformed_index_reads_as_empty() {
        let (store, index) = manager();
        store.put_state("_tradeindex", b"{not an array".to_vec()).unwrap();
        assert!(index.list().unwrap().is_empty());
        assert_eq!(index.append("t1").unwrap(), 1);
        assert_eq!(index.list().unwrap(), vec!["t1"]);
    }

    #[test]
    fn test_stale_staged_append_conflicts() {
        let (store, index) = manager();
        let staged = index.stage_append("t1").unwrap();
        index.append("t0").unwrap();

        let mut batch = WriteBatch::new();
        batch.push(staged.operation);
        assert!(matches!(
            store.commit(batch),
            Err(StoreError::VersionConflict { .. })
        ));
        assert_eq!(index.list().unwrap(), vec!["t0"]);
    }

    #[test]
    fn test_store_failure_surfaces() {
        let (store, index) = manager();
        store.fail_writes_to("_tradeindex");
        assert!(matches!(
            index.append("t1"),
            Err(LedgerError::Store(StoreError::Io { .. }))
        ));
    }
}
