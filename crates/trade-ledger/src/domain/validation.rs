//! # Field Validation
//!
//! Positional argument checks for `init_trade` and `init`. Checks run in a
//! fixed order (arity, emptiness of every field, then the numeric fields by
//! position) and stop at the first failure, so the error always names the
//! lowest offending ordinal within its class.

use super::entities::TradeRequest;
use super::errors::ValidationError;
use super::value_objects::{positions, TRADE_FIELD_COUNT};

/// Fields parsed as integers, in the order they are checked.
const NUMERIC_FIELDS: [usize; 3] = [
    positions::QUANTITY,
    positions::SETTLED,
    positions::NEEDS_REVISION,
];

fn require_arity(args: &[String], expected: usize) -> Result<(), ValidationError> {
    if args.len() != expected {
        return Err(ValidationError::ArgumentCount {
            expected,
            actual: args.len(),
        });
    }
    Ok(())
}

fn parse_integer(args: &[String], position: usize) -> Result<i64, ValidationError> {
    args[position]
        .parse::<i64>()
        .map_err(|_| ValidationError::NotNumeric {
            ordinal: position + 1,
        })
}

/// Validate the eleven `init_trade` arguments and parse the numeric ones.
///
/// Text fields are returned as given; normalization happens when the
/// record is built.
pub fn validate_trade_args(args: &[String]) -> Result<TradeRequest, ValidationError> {
    require_arity(args, TRADE_FIELD_COUNT)?;

    if let Some(position) = args.iter().position(|arg| arg.is_empty()) {
        return Err(ValidationError::EmptyField {
            ordinal: position + 1,
        });
    }

    let mut parsed = [0i64; 3];
    for (slot, position) in parsed.iter_mut().zip(NUMERIC_FIELDS) {
        *slot = parse_integer(args, position)?;
    }
    let [quantity, settled, needs_revision] = parsed;

    Ok(TradeRequest {
        storage_key: args[positions::TRADE_DATE].clone(),
        trade_date: args[positions::TRADE_DATE].clone(),
        value_date: args[positions::VALUE_DATE].clone(),
        operation: args[positions::OPERATION].clone(),
        quantity,
        security: args[positions::SECURITY].clone(),
        price: args[positions::PRICE].clone(),
        counterparty: args[positions::COUNTERPARTY].clone(),
        user: args[positions::USER].clone(),
        correlation: args[positions::CORRELATION].clone(),
        settled,
        needs_revision,
    })
}

/// Validate the single `init` argument, returning the holding value.
pub fn validate_init_args(args: &[String]) -> Result<i64, ValidationError> {
    require_arity(args, 1)?;
    args[0]
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidHoldingValue {
            value: args[0].clone(),
        })
}
