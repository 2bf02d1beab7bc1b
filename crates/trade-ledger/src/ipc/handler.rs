//! # Invocation Handler
//!
//! Routes `(function, args)` invocations to the ledger API. Each
//! invocation runs in its own tracing span tagged with a fresh
//! `invocation_id`.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info_span, warn};
use uuid::Uuid;

use crate::domain::{LedgerError, QueryError, ValidationError};
use crate::ipc::payloads::{ExtensionPoint, Invocation, InvokeFunction, QUERY_FUNCTION};
use crate::ports::{TradeExtension, TradeLedgerApi};

/// Dispatcher over a [`TradeLedgerApi`] with optional extensions.
pub struct InvocationHandler<L: TradeLedgerApi> {
    ledger: Arc<L>,
    extensions: HashMap<ExtensionPoint, Arc<dyn TradeExtension>>,
}

impl<L: TradeLedgerApi> InvocationHandler<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self {
            ledger,
            extensions: HashMap::new(),
        }
    }

    /// Register the collaborator that serves `point`, replacing any
    /// previous one.
    pub fn with_extension(mut self, point: ExtensionPoint, extension: Arc<dyn TradeExtension>) -> Self {
        self.extensions.insert(point, extension);
        self
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    /// Handle a state-changing invocation.
    ///
    /// `init` and `init_trade` return no payload. Extension points return
    /// whatever their collaborator produces.
    pub fn invoke(&self, function: &str, args: &[String]) -> Result<Option<Vec<u8>>, LedgerError> {
        let span = info_span!("invoke", invocation_id = %Uuid::new_v4(), function = %function);
        let _entered = span.enter();

        let route: InvokeFunction = function.parse().map_err(|_| {
            warn!("Unknown function invoked");
            LedgerError::UnknownFunction {
                function: function.to_string(),
            }
        })?;
        debug!(?route, arg_count = args.len(), "Dispatching invocation");

        match route {
            InvokeFunction::Init => self.ledger.reset(args).map(|_| None),
            InvokeFunction::InitTrade => self.ledger.create_trade(args).map(|_| None),
            InvokeFunction::Extension(point) => self.call_extension(point, args),
        }
    }

    /// [`invoke`](Self::invoke) taking a decoded payload.
    pub fn handle(&self, invocation: &Invocation) -> Result<Option<Vec<u8>>, LedgerError> {
        self.invoke(&invocation.function, &invocation.args)
    }

    /// Handle a read-only invocation. Only `query` with one key is accepted.
    pub fn query(&self, function: &str, args: &[String]) -> Result<Vec<u8>, QueryError> {
        let span = info_span!("query", invocation_id = %Uuid::new_v4(), function = %function);
        let _entered = span.enter();

        if function != QUERY_FUNCTION {
            return Err(LedgerError::InvalidQueryFunction {
                function: function.to_string(),
            }
            .into());
        }
        let [key] = args else {
            return Err(LedgerError::from(ValidationError::ArgumentCount {
                expected: 1,
                actual: args.len(),
            })
            .into());
        };
        self.ledger.query(key)
    }

    fn call_extension(&self, point: ExtensionPoint, args: &[String]) -> Result<Option<Vec<u8>>, LedgerError> {
        let function = point.function_name().to_string();
        let extension = self
            .extensions
            .get(&point)
            .ok_or_else(|| LedgerError::ExtensionNotRegistered {
                function: function.clone(),
            })?;
        extension
            .execute(self.ledger.as_ref(), args)
            .map_err(|message| LedgerError::Extension { function, message })
    }
}
