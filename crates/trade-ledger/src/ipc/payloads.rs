//! # Invocation Payloads
//!
//! Wire forms of invocations as the hosting ledger hands them over.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of the read-only query function.
pub const QUERY_FUNCTION: &str = "query";

/// One call into the ledger: a function name and positional arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub function: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(function: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            function: function.into(),
            args,
        }
    }
}

/// Functions routed to collaborators outside the ledger core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionPoint {
    SubmitForEnrichment,
    MarkRevisionNeeded,
}

impl ExtensionPoint {
    pub const ALL: [ExtensionPoint; 2] = [Self::SubmitForEnrichment, Self::MarkRevisionNeeded];

    pub fn function_name(&self) -> &'static str {
        match self {
            Self::SubmitForEnrichment => "submit_for_enrichment",
            Self::MarkRevisionNeeded => "mark_revision_needed",
        }
    }
}

impl fmt::Display for ExtensionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.function_name())
    }
}

impl FromStr for ExtensionPoint {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|point| point.function_name() == s)
            .ok_or(())
    }
}

/// Every function name the invoke path understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeFunction {
    Init,
    InitTrade,
    Extension(ExtensionPoint),
}

impl FromStr for InvokeFunction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "init" => Ok(Self::Init),
            "init_trade" => Ok(Self::InitTrade),
            other => other.parse().map(Self::Extension),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_names() {
        assert_eq!("init".parse(), Ok(InvokeFunction::Init));
        assert_eq!("init_trade".parse(), Ok(InvokeFunction::InitTrade));
        assert_eq!(
            "mark_revision_needed".parse(),
            Ok(InvokeFunction::Extension(ExtensionPoint::MarkRevisionNeeded))
        );
        assert_eq!("Init".parse::<InvokeFunction>(), Err(()));
        assert_eq!("query".parse::<InvokeFunction>(), Err(()));
    }

    #[test]
    fn test_invocation_args_default_to_empty() {
        let invocation: Invocation = serde_json::from_str(r#"{"function":"init"}"#).unwrap();
        assert_eq!(invocation, Invocation::new("init", vec![]));
    }
}
