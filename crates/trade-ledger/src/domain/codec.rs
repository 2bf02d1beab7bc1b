//! # Record Codec
//!
//! Structured encoding of trade records and the trade index.
//!
//! ## Trade Document (schema 1)
//!
//! ```text
//! {"schema":1,"tradedate":"2021-01-01","valuedate":"2021-01-02","operation":"buy",
//!  "quantity":100,"security":"sec1","price":"99.5","counterparty":"cpty1",
//!  "user":"alice","timestamp":1609459200000,"settled":0,"needsrevision":0}
//! ```
//!
//! Decoding is lenient: every field may be absent (empty / zero), integer
//! fields may arrive as numeric strings, and a missing `schema` marks a
//! legacy document. Encoding always writes the current schema with text
//! fields lowercased, so decode followed by encode is stable.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};

use super::entities::{TradeIndex, TradeRecord};
use super::errors::CodecError;

/// Schema version written into every encoded trade.
pub const SCHEMA_VERSION: u16 = 1;

/// Wire form of a trade record.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct TradeDocument {
    schema: u16,
    tradedate: String,
    valuedate: String,
    operation: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    quantity: i64,
    security: String,
    price: String,
    counterparty: String,
    user: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    timestamp: i64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    settled: i64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    needsrevision: i64,
}

impl From<&TradeRecord> for TradeDocument {
    fn from(record: &TradeRecord) -> Self {
        let record = record.clone().normalized();
        Self {
            schema: SCHEMA_VERSION,
            tradedate: record.trade_date,
            valuedate: record.value_date,
            operation: record.operation,
            quantity: record.quantity,
            security: record.security,
            price: record.price,
            counterparty: record.counterparty,
            user: record.user,
            timestamp: record.timestamp,
            settled: record.settled,
            needsrevision: record.needs_revision,
        }
    }
}

impl From<TradeDocument> for TradeRecord {
    fn from(doc: TradeDocument) -> Self {
        Self {
            trade_date: doc.tradedate,
            value_date: doc.valuedate,
            operation: doc.operation,
            quantity: doc.quantity,
            security: doc.security,
            price: doc.price,
            counterparty: doc.counterparty,
            user: doc.user,
            timestamp: doc.timestamp,
            settled: doc.settled,
            needs_revision: doc.needsrevision,
        }
    }
}

/// Encode a trade record into its stored form.
pub fn encode_record(record: &TradeRecord) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(&TradeDocument::from(record))?)
}

/// Decode a stored trade record. Only a JSON object is a trade document.
pub fn decode_record(bytes: &[u8]) -> Result<TradeRecord, CodecError> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    if !value.is_object() {
        return Err(CodecError::Malformed {
            message: "trade document must be a JSON object".to_string(),
        });
    }
    let doc: TradeDocument = serde_json::from_value(value)?;
    if doc.schema > SCHEMA_VERSION {
        return Err(CodecError::UnsupportedSchema {
            found: doc.schema,
            supported: SCHEMA_VERSION,
        });
    }
    Ok(doc.into())
}

/// Encode the trade index as a JSON array of keys.
pub fn encode_index(index: &TradeIndex) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(index)?)
}

/// Decode the trade index. `null` decodes as an empty index.
pub fn decode_index(bytes: &[u8]) -> Result<TradeIndex, CodecError> {
    let entries: Option<Vec<String>> = serde_json::from_slice(bytes)?;
    Ok(entries.map(TradeIndex::from).unwrap_or_default())
}
