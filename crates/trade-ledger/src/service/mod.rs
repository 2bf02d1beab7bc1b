//! # Service Layer
//!
//! Orchestration over the state store: trade creation and updates, the
//! trade index, and the raw query path. [`TradeLedger`] bundles them behind
//! the inbound [`TradeLedgerApi`](crate::ports::TradeLedgerApi).
//!
//! ## Read-Modify-Write
//!
//! Every write that depends on a prior read is committed with a guard on
//! the version that was read. A conflicting commit re-runs the whole
//! read-modify-write, up to `max_commit_attempts` times in total.

mod index;
mod ledger;
mod query;
mod trades;

pub use index::{IndexManager, StagedAppend};
pub use ledger::TradeLedger;
pub use query::QueryService;
pub use trades::TradeService;

use crate::domain::LedgerError;
use tracing::warn;

/// Run `attempt` until it succeeds, fails with a non-conflict error, or
/// has conflicted `max_attempts` times.
pub(crate) fn retry_on_conflict<T>(
    key: &str,
    max_attempts: u32,
    mut attempt: impl FnMut(u32) -> Result<T, LedgerError>,
) -> Result<T, LedgerError> {
    for n in 1..=max_attempts {
        match attempt(n) {
            Err(err) if err.is_conflict() => {
                warn!(key = %key, attempt = n, max_attempts, "Commit conflicted, re-reading state");
            }
            other => return other,
        }
    }
    Err(LedgerError::ConcurrentModification {
        key: key.to_string(),
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::StoreError;

    fn conflict() -> LedgerError {
        StoreError::VersionConflict { key: "k".into() }.into()
    }

    #[test]
    fn test_retry_succeeds_after_conflicts() {
        let result = retry_on_conflict("k", 3, |n| if n < 3 { Err(conflict()) } else { Ok(n) });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_retry_gives_up() {
        let mut calls = 0;
        let result: Result<(), _> = retry_on_conflict("k", 2, |_| {
            calls += 1;
            Err(conflict())
        });
        assert!(matches!(
            result,
            Err(LedgerError::ConcurrentModification { attempts: 2, .. })
        ));
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_other_errors_not_retried() {
        let mut calls = 0;
        let result: Result<(), _> = retry_on_conflict("k", 5, |_| {
            calls += 1;
            Err(LedgerError::NotFound { key: "k".into() })
        });
        assert!(matches!(result, Err(LedgerError::NotFound { .. })));
        assert_eq!(calls, 1);
    }
}
