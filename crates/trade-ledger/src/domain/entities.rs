//! # Domain Entities
//!
//! The trade record, the validated creation request it is built from, and
//! the trade index. All of them are rebuilt from store bytes on every
//! invocation; none is cached.

use serde::{Deserialize, Serialize};

use super::value_objects::IndexedField;

/// Lowercase normalization applied to every text field of a trade.
pub fn normalize_text(value: &str) -> String {
    value.to_lowercase()
}

/// A creation request whose positional arguments passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeRequest {
    /// First argument, verbatim. The record is stored under this key.
    pub storage_key: String,
    pub trade_date: String,
    pub value_date: String,
    pub operation: String,
    pub quantity: i64,
    pub security: String,
    pub price: String,
    pub counterparty: String,
    pub user: String,
    /// Ninth argument, validated but not part of the record.
    pub correlation: String,
    pub settled: i64,
    pub needs_revision: i64,
}

impl TradeRequest {
    /// The value appended to the trade index for this request.
    pub fn index_entry(&self, field: IndexedField) -> &str {
        match field {
            IndexedField::StorageKey => &self.storage_key,
            IndexedField::CorrelationValue => &self.correlation,
        }
    }
}

/// One trade as stored in the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub trade_date: String,
    pub value_date: String,
    pub operation: String,
    pub quantity: i64,
    pub security: String,
    pub price: String,
    pub counterparty: String,
    pub user: String,
    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub settled: i64,
    pub needs_revision: i64,
}

impl TradeRecord {
    /// Build a normalized record from a validated request, stamped with the
    /// creation time.
    pub fn from_request(request: &TradeRequest, timestamp: i64) -> Self {
        Self {
            trade_date: request.trade_date.clone(),
            value_date: request.value_date.clone(),
            operation: request.operation.clone(),
            quantity: request.quantity,
            security: request.security.clone(),
            price: request.price.clone(),
            counterparty: request.counterparty.clone(),
            user: request.user.clone(),
            timestamp,
            settled: request.settled,
            needs_revision: request.needs_revision,
        }
        .normalized()
    }

    /// Copy of this record with all text fields lowercased.
    pub fn normalized(mut self) -> Self {
        for field in [
            &mut self.trade_date,
            &mut self.value_date,
            &mut self.operation,
            &mut self.security,
            &mut self.price,
            &mut self.counterparty,
            &mut self.user,
        ] {
            *field = normalize_text(field);
        }
        self
    }

    pub fn is_settled(&self) -> bool {
        self.settled != 0
    }

    pub fn needs_revision(&self) -> bool {
        self.needs_revision != 0
    }
}

/// Ordered, append-only list of trade keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeIndex {
    entries: Vec<String>,
}

impl TradeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>) {
        self.entries.push(key.into());
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<String> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<String>> for TradeIndex {
    fn from(entries: Vec<String>) -> Self {
        Self { entries }
    }
}

/// Outcome of a successful creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeReceipt {
    pub storage_key: String,
    pub index_entry: String,
    /// Length of the index after the append.
    pub index_len: usize,
    pub record: TradeRecord,
}

/// An index entry together with the record it resolves to, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedTrade {
    pub key: String,
    pub record: Option<TradeRecord>,
}

/// Reconciliation report over the trade index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexAudit {
    /// Number of index entries.
    pub entries: usize,
    /// Entries that resolve to a decodable trade record.
    pub resolved: usize,
    /// Entries with no record (or an undecodable one) behind them, in index order.
    pub dangling: Vec<String>,
}

impl IndexAudit {
    pub fn is_consistent(&self) -> bool {
        self.dangling.is_empty()
    }
}
