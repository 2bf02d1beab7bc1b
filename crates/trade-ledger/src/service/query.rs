use crate::domain::QueryError;
use crate::ports::StateStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Raw read path. Returns stored bytes exactly as written.
pub struct QueryService<S: StateStore> {
    store: Arc<S>,
}

impl<S: StateStore> QueryService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn query(&self, key: &str) -> Result<Vec<u8>, QueryError> {
        match self.store.get_state(key) {
            Ok(Some(bytes)) => {
                debug!(key = %key, len = bytes.len(), "Query hit");
                Ok(bytes)
            }
            Ok(None) => Err(QueryError::not_found(key)),
            Err(err) => {
                warn!(key = %key, error = %err, "Query read failed");
                Err(QueryError::read_failed(key))
            }
        }
    }
}
