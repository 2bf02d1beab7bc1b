//! # Domain Errors
//!
//! Error types for the trade ledger, one enum per concern. `LedgerError`
//! is what every service operation returns; the narrower enums convert
//! into it with `?`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ports::StoreError;

/// Renders a 1-based position as an English ordinal ("1st", "2nd", "11th").
pub fn english_ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// Rejections produced while checking positional invocation arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Incorrect number of arguments. Expecting {expected}")]
    ArgumentCount { expected: usize, actual: usize },

    #[error("{} argument must be a non-empty string", english_ordinal(*.ordinal))]
    EmptyField { ordinal: usize },

    #[error("{} argument must be a numeric string", english_ordinal(*.ordinal))]
    NotNumeric { ordinal: usize },

    #[error("Expecting integer value for asset holding")]
    InvalidHoldingValue { value: String },

    #[error("{} argument {key:?} collides with a reserved ledger key", english_ordinal(*.ordinal))]
    ReservedKey { ordinal: usize, key: String },
}

impl ValidationError {
    /// 1-based position of the offending field, if the error names one.
    pub fn ordinal(&self) -> Option<usize> {
        match self {
            Self::EmptyField { ordinal }
            | Self::NotNumeric { ordinal }
            | Self::ReservedKey { ordinal, .. } => Some(*ordinal),
            Self::ArgumentCount { .. } | Self::InvalidHoldingValue { .. } => None,
        }
    }
}

/// Failures turning stored bytes into domain values and back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("malformed document: {message}")]
    Malformed { message: String },

    #[error("unsupported schema version {found} (newest known: {supported})")]
    UnsupportedSchema { found: u16, supported: u16 },
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed {
            message: err.to_string(),
        }
    }
}

/// Every failure a ledger operation can surface to its caller.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no trade stored under key {key}")]
    NotFound { key: String },

    #[error("codec error for key {key}: {source}")]
    Codec {
        key: String,
        #[source]
        source: CodecError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("gave up on key {key} after {attempts} conflicting commits")]
    ConcurrentModification { key: String, attempts: u32 },

    #[error("Received unknown function invocation: {function}")]
    UnknownFunction { function: String },

    #[error("Invalid query function name. Expecting \"query\"")]
    InvalidQueryFunction { function: String },

    #[error("no extension registered for {function}")]
    ExtensionNotRegistered { function: String },

    #[error("extension {function} failed: {message}")]
    Extension { function: String, message: String },
}

impl LedgerError {
    pub(crate) fn codec(key: impl Into<String>, source: CodecError) -> Self {
        Self::Codec {
            key: key.into(),
            source,
        }
    }

    /// True when the failure is an optimistic-concurrency conflict that a
    /// fresh read-modify-write may resolve.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Store(StoreError::VersionConflict { .. }))
    }
}

/// Structured read failure returned by the query path.
///
/// Serializes as `{"Error": "<message>"}`, the payload shape ledger clients
/// already parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct QueryError {
    #[serde(rename = "Error")]
    pub message: String,
}

impl QueryError {
    pub fn not_found(key: &str) -> Self {
        Self {
            message: format!("No state found for key {key}"),
        }
    }

    pub fn read_failed(key: &str) -> Self {
        Self {
            message: format!("Failed to get state for key {key}"),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// JSON payload form handed back to ledger clients.
    pub fn to_payload(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }
}

impl From<LedgerError> for QueryError {
    fn from(err: LedgerError) -> Self {
        Self::bad_request(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal_suffixes() {
        assert_eq!(english_ordinal(1), "1st");
        assert_eq!(english_ordinal(2), "2nd");
        assert_eq!(english_ordinal(3), "3rd");
        assert_eq!(english_ordinal(4), "4th");
        assert_eq!(english_ordinal(10), "10th");
        assert_eq!(english_ordinal(11), "11th");
        assert_eq!(english_ordinal(12), "12th");
        assert_eq!(english_ordinal(21), "21st");
    }

    #[test]
    fn test_validation_error_messages_name_ordinal() {
        let err = ValidationError::EmptyField { ordinal: 2 };
        assert_eq!(err.to_string(), "2nd argument must be a non-empty string");
        assert_eq!(err.ordinal(), Some(2));

        let err = ValidationError::NotNumeric { ordinal: 11 };
        assert_eq!(err.to_string(), "11th argument must be a numeric string");

        let err = ValidationError::ArgumentCount {
            expected: 11,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "Incorrect number of arguments. Expecting 11"
        );
        assert_eq!(err.ordinal(), None);
    }

    #[test]
    fn test_query_error_payload_shape() {
        let err = QueryError::not_found("2021-01-01");
        let payload: serde_json::Value = serde_json::from_slice(&err.to_payload()).unwrap();
        assert_eq!(
            payload,
            serde_json::json!({ "Error": "No state found for key 2021-01-01" })
        );
    }

    #[test]
    fn test_conflict_detection() {
        let err = LedgerError::from(StoreError::VersionConflict {
            key: "_tradeindex".into(),
        });
        assert!(err.is_conflict());
        assert!(!LedgerError::NotFound { key: "x".into() }.is_conflict());
    }
}
