//! Exactly-once funds transfers over optimistic concurrency control.
//!
//! The orchestrator ([`Ledger`]) composes three collaborators:
//!
//! - a transaction log keyed by a caller-supplied unique key (idempotency),
//! - a versioned account store mutated only through compare-and-swap deltas,
//! - a bounded retry policy that re-runs an attempt after a lost CAS race.
//!
//! No locks are taken anywhere in this module tree; all coordination lives
//! in the storage layer (row versions plus a uniqueness constraint).

pub mod memory;
pub mod models;
pub mod orchestrator;
pub mod pg;
pub mod retry;
pub mod store;


pub use memory::MemoryLedgerStore;
pub use models::{Account, AccountId, BalanceDelta, NewTransaction, Transaction};
pub use orchestrator::{Ledger, TransferError, TransferOutcome};
pub use pg::PgLedgerStore;
pub use retry::{Attempt, RetryOutcome, RetryPolicy};
pub use store::{
    AccountStore, CommitOutcome, DeltaOutcome, InsertOutcome, LedgerStore, StoreError,
    TransactionLog,
};
