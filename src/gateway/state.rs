use std::sync::Arc;
use std::time::Duration;

use crate::ledger::{Ledger, LedgerStore};

/// Shared gateway state.
pub struct AppState {
    pub ledger: Arc<Ledger>,
    /// Caller-visible bound on one transfer request, retries included.
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(ledger: Arc<Ledger>, request_timeout: Duration) -> Self {
        Self {
            ledger,
            request_timeout,
        }
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        self.ledger.store()
    }
}
