//! Storage contract consumed by the transfer orchestrator.
//!
//! Concurrency control is the store's job: balances only change through
//! single-row compare-and-swap deltas, the transaction log enforces key
//! uniqueness, and the three mutations of a transfer commit as one unit.
//! Conflict outcomes are plain data, so the retry decision upstream is a
//! `match`, never error-type inspection.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use super::models::{Account, AccountId, BalanceDelta, NewTransaction, Transaction};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Outcome of a single-row compare-and-swap balance update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaOutcome {
    Applied,
    /// The stored version no longer matches the expected one. The row was
    /// left untouched.
    VersionConflict,
}

/// Outcome of a standalone transaction-log insert.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted(Transaction),
    /// A committed row with the same unique key already exists.
    DuplicateKey,
}

/// Outcome of the atomic transfer unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// Another transfer with the same unique key committed first. No state
    /// was touched.
    DuplicateKey,
    /// At least one balance row moved since it was read. No state was
    /// touched.
    VersionConflict,
}

/// Versioned read and CAS access to account balances.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Point-in-time read of balance and version.
    async fn get(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    /// `balance += delta; version += 1`, only if the stored version equals
    /// `expected_version`. Atomic with respect to every other concurrent
    /// update of the same row.
    async fn apply_delta(
        &self,
        id: AccountId,
        expected_version: i64,
        delta: Decimal,
    ) -> Result<DeltaOutcome, StoreError>;

    /// Provision a new account row with a store-assigned id.
    async fn create(&self, opening_balance: Decimal) -> Result<Account, StoreError>;
}

/// Idempotency ledger keyed by the caller-supplied unique key.
#[async_trait]
pub trait TransactionLog: Send + Sync {
    async fn find_by_key(&self, key: &str) -> Result<Option<Transaction>, StoreError>;

    /// Durable insert. Uniqueness of `unique_key` is storage-enforced, not
    /// pre-checked; a duplicate is reported by kind, never by error text.
    async fn insert(&self, new: NewTransaction) -> Result<InsertOutcome, StoreError>;
}

/// The full storage surface behind the ledger: accounts, the transaction
/// log, and the atomic unit combining them.
#[async_trait]
pub trait LedgerStore: AccountStore + TransactionLog {
    /// Insert the transaction row and apply both balance deltas inside one
    /// storage transaction. All three mutations commit together or none do;
    /// `DuplicateKey` and `VersionConflict` leave no partial state behind.
    async fn commit_transfer(
        &self,
        new: NewTransaction,
        debit: BalanceDelta,
        credit: BalanceDelta,
    ) -> Result<CommitOutcome, StoreError>;
}
