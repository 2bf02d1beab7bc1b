//! # Invocation Layer
//!
//! Function-name dispatch for ledger invocations and the payloads that
//! carry them.
//!
//! ## Surface
//!
//! | Function                | Route                                   |
//! |-------------------------|-----------------------------------------|
//! | `init`                  | [`TradeLedgerApi::reset`]               |
//! | `init_trade`            | [`TradeLedgerApi::create_trade`]        |
//! | `submit_for_enrichment` | registered [`TradeExtension`]           |
//! | `mark_revision_needed`  | registered [`TradeExtension`]           |
//! | `query` (read path)     | [`TradeLedgerApi::query`]               |
//!
//! [`TradeLedgerApi::reset`]: crate::ports::TradeLedgerApi::reset
//! [`TradeLedgerApi::create_trade`]: crate::ports::TradeLedgerApi::create_trade
//! [`TradeLedgerApi::query`]: crate::ports::TradeLedgerApi::query
//! [`TradeExtension`]: crate::ports::TradeExtension

pub mod handler;
pub mod payloads;

pub use handler::*;
pub use payloads::*;
