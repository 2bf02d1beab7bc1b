use crate::domain::{
    ConfigError, IndexAudit, IndexedTrade, LedgerConfig, LedgerError, QueryError, TradeReceipt,
    TradeRecord,
};
use crate::ports::{StateStore, TimeSource, TradeLedgerApi};
use std::sync::Arc;

use super::query::QueryService;
use super::trades::TradeService;

/// The trade ledger: trade and query services over one shared store.
pub struct TradeLedger<S: StateStore, C: TimeSource> {
    trades: TradeService<S, C>,
    queries: QueryService<S>,
}

impl<S: StateStore, C: TimeSource> TradeLedger<S, C> {
    /// Create a ledger over `store`, rejecting an unusable configuration.
    pub fn new(store: Arc<S>, clock: Arc<C>, config: LedgerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            queries: QueryService::new(store.clone()),
            trades: TradeService::new(store, clock, config),
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        self.trades.config()
    }

    pub fn trades(&self) -> &TradeService<S, C> {
        &self.trades
    }
}

impl<S: StateStore, C: TimeSource> TradeLedgerApi for TradeLedger<S, C> {
    fn reset(&self, args: &[String]) -> Result<(), LedgerError> {
        self.trades.reset(args)
    }

    fn create_trade(&self, args: &[String]) -> Result<TradeReceipt, LedgerError> {
        self.trades.create_trade(args)
    }

    fn set_user(&self, key: &str, user: &str) -> Result<TradeRecord, LedgerError> {
        self.trades.set_user(key, user)
    }

    fn get_trade(&self, key: &str) -> Result<TradeRecord, LedgerError> {
        self.trades.get_trade(key)
    }

    fn query(&self, key: &str) -> Result<Vec<u8>, QueryError> {
        self.queries.query(key)
    }

    fn trade_index(&self) -> Result<Vec<String>, LedgerError> {
        self.trades.trade_index()
    }

    fn list_trades(&self) -> Result<Vec<IndexedTrade>, LedgerError> {
        self.trades.list_trades()
    }

    fn audit_index(&self) -> Result<IndexAudit, LedgerError> {
        self.trades.audit_index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{FixedClock, InMemoryStateStore};
    use crate::domain::decode_record;

    #[test]
    fn test_rejects_colliding_keys() {
        let config = LedgerConfig {
            probe_key: "_tradeindex".into(),
            ..LedgerConfig::default()
        };
        let result = TradeLedger::new(
            Arc::new(InMemoryStateStore::new()),
            Arc::new(FixedClock::new(0)),
            config,
        );
        assert!(matches!(result, Err(ConfigError::KeyCollision { .. })));
    }

    #[test]
    fn test_query_after_create_decodes_to_record() {
        let ledger = TradeLedger::new(
            Arc::new(InMemoryStateStore::new()),
            Arc::new(FixedClock::new(5)),
            LedgerConfig::default(),
        )
        .unwrap();
        let args: Vec<String> = ["k", "v", "sell", "7", "s", "1", "c", "U", "x", "1", "0"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let receipt = ledger.create_trade(&args).unwrap();

        let bytes = ledger.query("k").unwrap();
        assert_eq!(decode_record(&bytes).unwrap(), receipt.record);
        assert!(receipt.record.is_settled());
        assert_eq!(ledger.get_trade("k").unwrap().user, "u");
    }
}
