//! # Trade Ledger - Trade Records on a Key/Value Ledger
//!
//! ## Purpose
//!
//! Validates caller-supplied positional trade fields, builds a normalized
//! trade record, persists it under its trade key and maintains a secondary
//! index so every trade can later be enumerated.
//!
//! ## Architecture
//!
//! | Layer | Location | Contents |
//! |-------|----------|----------|
//! | Domain | `domain/` | Records, validation, codec, errors, configuration |
//! | Ports | `ports/` | `TradeLedgerApi` (inbound); `StateStore`, `TimeSource`, `TradeExtension` (outbound) |
//! | Service | `service/` | `TradeService`, `IndexManager`, `QueryService`, `TradeLedger` |
//! | Adapters | `adapters/` | In-memory and file state stores, clocks |
//! | Invocation | `ipc/` | Function-name dispatch |
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | A record is stored under its first creation argument | `service/trades.rs` - `create_trade()` |
//! | Record and index entry are committed together or not at all | `service/trades.rs` - `create_trade()` |
//! | Index is append-only, in creation order | `service/index.rs` - `stage_append()` |
//! | Read-modify-writes never silently lose an update | `service/mod.rs` - `retry_on_conflict()` |
//! | Text fields are stored lowercase | `domain/codec.rs` - `encode_record()` |
//! | Timestamps come from the clock, never the caller | `domain/entities.rs` - `TradeRecord::from_request()` |
//!
//! ## Usage Example
//!
//! ```ignore
//! use trade_ledger::prelude::*;
//!
//! let store = Arc::new(InMemoryStateStore::new());
//! let ledger = TradeLedger::new(store, Arc::new(SystemClock), LedgerConfig::default())?;
//! let handler = InvocationHandler::new(Arc::new(ledger));
//!
//! handler.invoke("init", &["0".into()])?;
//! handler.invoke("init_trade", &args)?;
//! let bytes = handler.query("query", &["2021-01-01".into()])?;
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod domain;
pub mod ipc;
pub mod ports;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use std::sync::Arc;

    // Domain
    pub use crate::domain::{
        decode_index, decode_record, encode_index, encode_record, CodecError, ConfigError,
        IndexAudit, IndexedField, IndexedTrade, LedgerConfig, LedgerError, QueryError,
        TradeIndex, TradeReceipt, TradeRecord, ValidationError,
    };

    // Ports
    pub use crate::ports::{
        StateStore, StoreError, TimeSource, TradeExtension, TradeLedgerApi, WriteBatch,
        WriteGuard,
    };

    // Adapters
    pub use crate::adapters::{FileStateStore, FixedClock, InMemoryStateStore, SystemClock};

    // Service
    pub use crate::service::{IndexManager, QueryService, TradeLedger, TradeService};

    // Invocation
    pub use crate::ipc::{ExtensionPoint, Invocation, InvocationHandler};
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
