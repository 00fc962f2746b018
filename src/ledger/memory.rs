//! In-memory storage backend.
//!
//! Backs the `memory` storage config and the test suite. The single mutex
//! plays the role of the database's internal row latching: callers still go
//! through the versioned CAS contract, and a lost race comes back as a
//! conflict outcome, never as blocking.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use super::models::{Account, AccountId, BalanceDelta, NewTransaction, Transaction};
use super::store::{
    AccountStore, CommitOutcome, DeltaOutcome, InsertOutcome, LedgerStore, StoreError,
    TransactionLog,
};

#[derive(Default)]
struct Inner {
    accounts: HashMap<AccountId, Account>,
    /// Committed transactions, keyed by unique key.
    transactions: HashMap<String, Transaction>,
    last_account_id: i64,
    last_transaction_id: i64,
}

impl Inner {
    fn apply(&mut self, delta: &BalanceDelta) -> DeltaOutcome {
        match self.accounts.get_mut(&delta.account_id) {
            Some(account) if account.version == delta.expected_version => {
                account.balance += delta.delta;
                account.version += 1;
                DeltaOutcome::Applied
            }
            // A missing row reads the same as a moved version: zero rows
            // matched the conditional update.
            _ => DeltaOutcome::VersionConflict,
        }
    }

    /// Reverses an uncommitted leg. Only called under the lock, before the
    /// unit is visible to anyone.
    fn undo(&mut self, delta: &BalanceDelta) {
        if let Some(account) = self.accounts.get_mut(&delta.account_id) {
            account.balance -= delta.delta;
            account.version -= 1;
        }
    }

    fn record(&mut self, new: NewTransaction) -> Transaction {
        self.last_transaction_id += 1;
        let transaction = Transaction {
            id: self.last_transaction_id,
            from_account_id: new.from_account_id,
            to_account_id: new.to_account_id,
            amount: new.amount,
            unique_key: new.unique_key,
            created_at: Utc::now(),
        };
        self.transactions
            .insert(transaction.unique_key.clone(), transaction.clone());
        transaction
    }
}

#[derive(Default)]
pub struct MemoryLedgerStore {
    inner: Mutex<Inner>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryLedgerStore {
    async fn get(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.inner.lock().unwrap().accounts.get(&id).cloned())
    }

    async fn apply_delta(
        &self,
        id: AccountId,
        expected_version: i64,
        delta: Decimal,
    ) -> Result<DeltaOutcome, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner.apply(&BalanceDelta {
            account_id: id,
            expected_version,
            delta,
        }))
    }

    async fn create(&self, opening_balance: Decimal) -> Result<Account, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.last_account_id += 1;
        let account = Account {
            id: AccountId(inner.last_account_id),
            balance: opening_balance,
            version: 0,
        };
        inner.accounts.insert(account.id, account.clone());
        Ok(account)
    }
}

#[async_trait]
impl TransactionLog for MemoryLedgerStore {
    async fn find_by_key(&self, key: &str) -> Result<Option<Transaction>, StoreError> {
        Ok(self.inner.lock().unwrap().transactions.get(key).cloned())
    }

    async fn insert(&self, new: NewTransaction) -> Result<InsertOutcome, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.transactions.contains_key(&new.unique_key) {
            return Ok(InsertOutcome::DuplicateKey);
        }
        Ok(InsertOutcome::Inserted(inner.record(new)))
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn commit_transfer(
        &self,
        new: NewTransaction,
        debit: BalanceDelta,
        credit: BalanceDelta,
    ) -> Result<CommitOutcome, StoreError> {
        let mut inner = self.inner.lock().unwrap();

        if inner.transactions.contains_key(&new.unique_key) {
            return Ok(CommitOutcome::DuplicateKey);
        }
        if inner.apply(&debit) == DeltaOutcome::VersionConflict {
            return Ok(CommitOutcome::VersionConflict);
        }
        if inner.apply(&credit) == DeltaOutcome::VersionConflict {
            inner.undo(&debit);
            return Ok(CommitOutcome::VersionConflict);
        }
        inner.record(new);
        Ok(CommitOutcome::Committed)
    }
}
