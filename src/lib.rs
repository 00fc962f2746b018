//! ledgerd - exactly-once funds transfers over optimistic concurrency control
//!
//! A transfer request is idempotent on a caller-supplied key and commits as
//! one atomic storage unit: a transaction-log insert plus two versioned
//! balance deltas. Conflicting writers never block each other; losers of the
//! version race retry from fresh reads up to a fixed bound.
//!
//! # Modules
//!
//! - [`ledger`] - the transfer orchestrator, retry policy and storage backends
//! - [`gateway`] - axum HTTP transport
//! - [`config`] - YAML application configuration
//! - [`logging`] - tracing subscriber setup

pub mod config;
pub mod gateway;
pub mod ledger;
pub mod logging;

// Convenient re-exports at crate root
pub use ledger::{
    Account, AccountId, AccountStore, BalanceDelta, CommitOutcome, DeltaOutcome, InsertOutcome,
    Ledger, LedgerStore, MemoryLedgerStore, NewTransaction, PgLedgerStore, RetryPolicy,
    StoreError, Transaction, TransactionLog, TransferError, TransferOutcome,
};
