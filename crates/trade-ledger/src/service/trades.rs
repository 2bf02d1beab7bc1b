use crate::domain::{
    decode_record, encode_record, normalize_text, validate_init_args, validate_trade_args,
    IndexAudit, IndexedTrade, LedgerConfig, LedgerError, TradeReceipt, TradeRecord,
    ValidationError,
};
use crate::ports::{StateStore, TimeSource, WriteBatch, WriteGuard};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::index::IndexManager;
use super::retry_on_conflict;

/// Trade creation, permission updates, reset and enumeration.
pub struct TradeService<S: StateStore, C: TimeSource> {
    store: Arc<S>,
    clock: Arc<C>,
    index: IndexManager<S>,
    config: LedgerConfig,
}

impl<S: StateStore, C: TimeSource> TradeService<S, C> {
    pub fn new(store: Arc<S>, clock: Arc<C>, config: LedgerConfig) -> Self {
        let index = IndexManager::new(store.clone(), &config);
        Self {
            store,
            clock,
            index,
            config,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn index(&self) -> &IndexManager<S> {
        &self.index
    }

    fn is_reserved(&self, key: &str) -> bool {
        key == self.config.index_key || key == self.config.probe_key
    }

    /// Write the probe value and empty the index in one batch.
    #[instrument(skip(self, args))]
    pub fn reset(&self, args: &[String]) -> Result<(), LedgerError> {
        let holding = validate_init_args(args)?;

        let mut batch = WriteBatch::new().put(&self.config.probe_key, holding.to_string().into_bytes());
        batch.push(self.index.reset_operation()?);
        self.store.commit(batch)?;

        info!(probe_key = %self.config.probe_key, holding, "Ledger state reset");
        Ok(())
    }

    /// Validate, build and store a trade, appending to the index in the
    /// same atomic commit.
    #[instrument(skip(self, args), fields(storage_key = tracing::field::Empty))]
    pub fn create_trade(&self, args: &[String]) -> Result<TradeReceipt, LedgerError> {
        let request = validate_trade_args(args).inspect_err(|err| {
            debug!(error = %err, "Rejected trade arguments");
        })?;
        tracing::Span::current().record("storage_key", request.storage_key.as_str());

        if self.is_reserved(&request.storage_key) {
            return Err(ValidationError::ReservedKey {
                ordinal: 1,
                key: request.storage_key,
            }
            .into());
        }

        let record = TradeRecord::from_request(&request, self.clock.now_millis());
        let encoded =
            encode_record(&record).map_err(|e| LedgerError::codec(&request.storage_key, e))?;
        let entry = request.index_entry(self.config.indexed_field).to_string();

        let index_len = retry_on_conflict(&request.storage_key, self.config.max_commit_attempts, |_| {
            let existing = self.store.get_versioned(&request.storage_key)?;
            if let Some(previous) = &existing {
                warn!(version = previous.version, "Overwriting an existing trade record");
            }
            let staged = self.index.stage_append(&entry)?;

            let mut batch = WriteBatch::new().put_guarded(
                &request.storage_key,
                encoded.clone(),
                WriteGuard::observed(existing.map(|v| v.version)),
            );
            batch.push(staged.operation);
            self.store.commit(batch)?;
            Ok(staged.len)
        })?;

        info!(index_entry = %entry, index_len, "Trade stored");
        Ok(TradeReceipt {
            storage_key: request.storage_key,
            index_entry: entry,
            index_len,
            record,
        })
    }

    /// Rewrite the `user` of the trade stored at `key`.
    #[instrument(skip(self))]
    pub fn set_user(&self, key: &str, user: &str) -> Result<TradeRecord, LedgerError> {
        if key.is_empty() {
            return Err(ValidationError::EmptyField { ordinal: 1 }.into());
        }
        if user.is_empty() {
            return Err(ValidationError::EmptyField { ordinal: 2 }.into());
        }
        if self.is_reserved(key) {
            return Err(ValidationError::ReservedKey {
                ordinal: 1,
                key: key.to_string(),
            }
            .into());
        }

        let record = retry_on_conflict(key, self.config.max_commit_attempts, |_| {
            let stored = self
                .store
                .get_versioned(key)?
                .ok_or_else(|| LedgerError::NotFound {
                    key: key.to_string(),
                })?;
            let mut record = decode_record(&stored.value).map_err(|e| LedgerError::codec(key, e))?;
            record.user = normalize_text(user);

            let encoded = encode_record(&record).map_err(|e| LedgerError::codec(key, e))?;
            self.store.commit(WriteBatch::new().put_guarded(
                key,
                encoded,
                WriteGuard::AtVersion(stored.version),
            ))?;
            Ok(record)
        })?;

        info!(user = %record.user, "Trade user updated");
        Ok(record)
    }

    /// Read and decode the trade stored at `key`.
    pub fn get_trade(&self, key: &str) -> Result<TradeRecord, LedgerError> {
        let bytes = self
            .store
            .get_state(key)?
            .ok_or_else(|| LedgerError::NotFound {
                key: key.to_string(),
            })?;
        decode_record(&bytes).map_err(|e| LedgerError::codec(key, e))
    }

    pub fn trade_index(&self) -> Result<Vec<String>, LedgerError> {
        self.index.list()
    }

    /// Resolve every index entry, in index order. Entries with no record
    /// or an undecodable one resolve to `None`.
    pub fn list_trades(&self) -> Result<Vec<IndexedTrade>, LedgerError> {
        self.index
            .list()?
            .into_iter()
            .map(|key| {
                let record = match self.get_trade(&key) {
                    Ok(record) => Some(record),
                    Err(LedgerError::NotFound { .. }) => None,
                    Err(LedgerError::Codec { source, .. }) => {
                        warn!(key = %key, error = %source, "Indexed trade does not decode");
                        None
                    }
                    Err(other) => return Err(other),
                };
                Ok(IndexedTrade { key, record })
            })
            .collect()
    }

    /// Count index entries that resolve and list those that do not.
    pub fn audit_index(&self) -> Result<IndexAudit, LedgerError> {
        let trades = self.list_trades()?;
        let mut audit = IndexAudit {
            entries: trades.len(),
            ..IndexAudit::default()
        };
        for trade in trades {
            match trade.record {
                Some(_) => audit.resolved += 1,
                None => audit.dangling.push(trade.key),
            }
        }
        if !audit.is_consistent() {
            warn!(dangling = audit.dangling.len(), "Trade index has unresolved entries");
        }
        Ok(audit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{FixedClock, InMemoryStateStore};
    use crate::domain::IndexedField;
    use crate::ports::StoreError;

    const NOW: i64 = 1_609_459_200_000;

    fn args(trade_date: &str, user: &str, correlation: &str) -> Vec<String> {
        [
            trade_date,
            "2021-01-02",
            "buy",
            "100",
            "sec1",
            "99.5",
            "cpty1",
            user,
            correlation,
            "0",
            "0",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn service_with(
        config: LedgerConfig,
    ) -> (
        Arc<InMemoryStateStore>,
        TradeService<InMemoryStateStore, FixedClock>,
    ) {
        let store = Arc::new(InMemoryStateStore::new());
        let service = TradeService::new(store.clone(), Arc::new(FixedClock::new(NOW)), config);
        (store, service)
    }

    fn service() -> (
        Arc<InMemoryStateStore>,
        TradeService<InMemoryStateStore, FixedClock>,
    ) {
        service_with(LedgerConfig::default())
    }

    #[test]
    fn test_create_stores_record_and_index() {
        let (_, service) = service();
        let receipt = service
            .create_trade(&args("2021-01-01", "Alice", "corr1"))
            .unwrap();

        assert_eq!(receipt.storage_key, "2021-01-01");
        assert_eq!(receipt.index_entry, "2021-01-01");
        assert_eq!(receipt.index_len, 1);

        let record = service.get_trade("2021-01-01").unwrap();
        assert_eq!(record.user, "alice");
        assert_eq!(record.quantity, 100);
        assert_eq!(record.timestamp, NOW);
        assert_eq!(service.trade_index().unwrap(), vec!["2021-01-01"]);
    }

    #[test]
    fn test_validation_failure_writes_nothing() {
        let (store, service) = service();
        let mut bad = args("2021-01-01", "alice", "corr1");
        bad[3] = "lots".into();
        assert!(matches!(
            service.create_trade(&bad),
            Err(LedgerError::Validation(ValidationError::NotNumeric { ordinal: 4 }))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_failed_index_write_leaves_no_orphan() {
        let (store, service) = service();
        store.fail_writes_to("_tradeindex");
        assert!(matches!(
            service.create_trade(&args("2021-01-01", "alice", "corr1")),
            Err(LedgerError::Store(StoreError::Io { .. }))
        ));
        assert!(!store.contains_key("2021-01-01"));
    }

    #[test]
    fn test_reserved_storage_key_rejected() {
        let (store, service) = service();
        let err = service
            .create_trade(&args("_tradeindex", "alice", "corr1"))
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Validation(ValidationError::ReservedKey { ordinal: 1, .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_correlation_indexing_mode() {
        let config = LedgerConfig {
            indexed_field: IndexedField::CorrelationValue,
            ..LedgerConfig::default()
        };
        let (_, service) = service_with(config);
        service
            .create_trade(&args("2021-01-01", "alice", "corr1"))
            .unwrap();

        assert_eq!(service.trade_index().unwrap(), vec!["corr1"]);
        let audit = service.audit_index().unwrap();
        assert_eq!(audit.entries, 1);
        assert_eq!(audit.resolved, 0);
        assert_eq!(audit.dangling, vec!["corr1"]);
    }

    #[test]
    fn test_set_user_preserves_other_fields() {
        let (_, service) = service();
        let receipt = service
            .create_trade(&args("2021-01-01", "alice", "corr1"))
            .unwrap();

        let updated = service.set_user("2021-01-01", "Bob").unwrap();
        assert_eq!(updated.user, "bob");
        assert_eq!(
            TradeRecord {
                user: "alice".into(),
                ..updated.clone()
            },
            receipt.record
        );
        assert_eq!(service.get_trade("2021-01-01").unwrap(), updated);
    }

    #[test]
    fn test_set_user_on_missing_trade() {
        let (_, service) = service();
        assert!(matches!(
            service.set_user("nope", "bob"),
            Err(LedgerError::NotFound { .. })
        ));
        assert!(matches!(
            service.set_user("nope", ""),
            Err(LedgerError::Validation(ValidationError::EmptyField { ordinal: 2 }))
        ));
    }

    #[test]
    fn test_set_user_rejects_reserved_keys() {
        let (store, service) = service();
        service.reset(&["0".to_string()]).unwrap();

        for key in ["_tradeindex", "abc"] {
            assert!(matches!(
                service.set_user(key, "bob"),
                Err(LedgerError::Validation(ValidationError::ReservedKey { ordinal: 1, .. }))
            ));
        }
        assert_eq!(store.get_state("_tradeindex").unwrap(), Some(b"[]".to_vec()));
        assert_eq!(store.get_state("abc").unwrap(), Some(b"0".to_vec()));
    }

    #[test]
    fn test_reset_writes_probe_and_empties_index() {
        let (store, service) = service();
        service
            .create_trade(&args("2021-01-01", "alice", "corr1"))
            .unwrap();
        service.reset(&["42".to_string()]).unwrap();

        assert_eq!(store.get_state("abc").unwrap(), Some(b"42".to_vec()));
        assert!(service.trade_index().unwrap().is_empty());
        // Records survive a reset; only the index is cleared.
        assert!(service.get_trade("2021-01-01").is_ok());
    }

    #[test]
    fn test_reset_rejects_bad_arguments() {
        let (store, service) = service();
        assert!(service.reset(&[]).is_err());
        assert!(service.reset(&["forty".to_string()]).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_list_trades_resolves_in_order() {
        let (store, service) = service();
        service.create_trade(&args("t1", "alice", "c1")).unwrap();
        service.create_trade(&args("t2", "bob", "c2")).unwrap();
        store.put_state("t2", b"garbage".to_vec()).unwrap();
        service.index().append("ghost").unwrap();

        let trades = service.list_trades().unwrap();
        let keys: Vec<_> = trades.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, ["t1", "t2", "ghost"]);
        assert!(trades[0].record.is_some());
        assert!(trades[1].record.is_none());
        assert!(trades[2].record.is_none());

        let audit = service.audit_index().unwrap();
        assert_eq!(audit.resolved, 1);
        assert_eq!(audit.dangling, vec!["t2", "ghost"]);
    }
}
