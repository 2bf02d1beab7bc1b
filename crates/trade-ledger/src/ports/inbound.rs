//! # Inbound Ports (Driving Ports)
//!
//! Public API exposed by the trade ledger.

use crate::domain::{IndexAudit, IndexedTrade, LedgerError, QueryError, TradeReceipt, TradeRecord};

/// Primary API for the trade ledger.
///
/// Every call is one invocation: it re-reads the state it needs from the
/// store and either commits all of its writes or none of them.
pub trait TradeLedgerApi: Send + Sync {
    /// Write the probe value and reset the trade index to empty.
    ///
    /// Expects exactly one integer argument. Destroys the index on every call.
    fn reset(&self, args: &[String]) -> Result<(), LedgerError>;

    /// Validate eleven positional arguments, store the trade under the
    /// first one and append the configured entry to the trade index.
    ///
    /// ## Returns
    ///
    /// - `Ok(TradeReceipt)`: record and index entry committed together
    /// - `Err(Validation)`: nothing written
    /// - `Err(Store)`: nothing written
    fn create_trade(&self, args: &[String]) -> Result<TradeReceipt, LedgerError>;

    /// Rewrite the `user` field of the trade at `key`, leaving every other
    /// field as stored.
    fn set_user(&self, key: &str, user: &str) -> Result<TradeRecord, LedgerError>;

    /// Read and decode the trade at `key`.
    fn get_trade(&self, key: &str) -> Result<TradeRecord, LedgerError>;

    /// Raw stored bytes for `key`, exactly as written.
    fn query(&self, key: &str) -> Result<Vec<u8>, QueryError>;

    /// Current trade index, in insertion order.
    fn trade_index(&self) -> Result<Vec<String>, LedgerError>;

    /// Resolve every index entry to its record, in index order.
    fn list_trades(&self) -> Result<Vec<IndexedTrade>, LedgerError>;

    /// Report index entries that do not resolve to a trade record.
    fn audit_index(&self) -> Result<IndexAudit, LedgerError>;
}
