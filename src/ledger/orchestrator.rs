//! Transfer orchestrator.
//!
//! One transfer is a short state machine: check the transaction log for the
//! key, read both accounts, validate the resulting balances, then commit one
//! atomic unit (log insert plus two CAS deltas). A lost version race
//! discards the attempt and re-runs it from fresh reads, up to the retry
//! bound. A duplicate-key loss is not an error at all: the economically
//! equivalent transfer already committed, so the request is replayed as a
//! success.

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::models::{AccountId, BalanceDelta, NewTransaction};
use super::retry::{Attempt, RetryOutcome, RetryPolicy};
use super::store::{AccountStore, CommitOutcome, LedgerStore, StoreError, TransactionLog};

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Insufficient funds on account {0}")]
    InsufficientFunds(AccountId),

    #[error("Transfer dropped after {attempts} conflicting attempts")]
    RetryExhausted { attempts: u32 },

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// How a successful transfer concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// This request moved the funds.
    Applied,
    /// The effect already existed: a resubmitted key, or a concurrent
    /// request with the same key won the commit race.
    Replayed,
}

pub struct Ledger {
    store: Arc<dyn LedgerStore>,
    retry: RetryPolicy,
}

impl Ledger {
    pub fn new(store: Arc<dyn LedgerStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Move `amount` from `from_id` to `to_id`, exactly once per `key`.
    ///
    /// The idempotency pre-check runs once; conflict retries restart at the
    /// account reads, and the log's uniqueness constraint covers whatever
    /// the pre-check missed.
    pub async fn transfer(
        &self,
        key: &str,
        from_id: AccountId,
        to_id: AccountId,
        amount: Decimal,
    ) -> Result<TransferOutcome, TransferError> {
        if self.store.find_by_key(key).await?.is_some() {
            warn!(key = %key, "resubmitted transfer key, effect already applied");
            return Ok(TransferOutcome::Replayed);
        }

        let outcome = self
            .retry
            .run(|attempt| Box::pin(self.attempt(key, from_id, to_id, amount, attempt)))
            .await?;

        match outcome {
            RetryOutcome::Done(done) => Ok(done),
            RetryOutcome::Exhausted { attempts } => {
                warn!(key = %key, attempts, "transfer dropped, contention limit reached");
                Err(TransferError::RetryExhausted { attempts })
            }
        }
    }

    /// One fetch-validate-apply cycle. Only a lost CAS race surfaces as
    /// [`Attempt::Conflict`]; every other outcome is final for this request.
    async fn attempt(
        &self,
        key: &str,
        from_id: AccountId,
        to_id: AccountId,
        amount: Decimal,
        attempt: u32,
    ) -> Result<Attempt<TransferOutcome>, TransferError> {
        if attempt > 1 {
            debug!(key = %key, attempt, "re-running transfer from fresh reads");
        }

        // The two reads are independent; issue them concurrently.
        let (from, to) = tokio::join!(self.store.get(from_id), self.store.get(to_id));
        let from = from?.ok_or(TransferError::AccountNotFound(from_id))?;
        let to = to?.ok_or(TransferError::AccountNotFound(to_id))?;

        if from.balance - amount < Decimal::ZERO {
            return self.reject_insufficient(key, from_id).await;
        }
        // Symmetric guard: always satisfied for a non-negative amount, but it
        // stops a negative amount from draining the receiver instead.
        if to.balance + amount < Decimal::ZERO {
            return self.reject_insufficient(key, to_id).await;
        }

        let new = NewTransaction {
            from_account_id: from_id,
            to_account_id: to_id,
            amount,
            unique_key: key.to_string(),
        };
        let debit = BalanceDelta::new(&from, -amount);
        let credit = BalanceDelta::new(&to, amount);

        match self.store.commit_transfer(new, debit, credit).await? {
            CommitOutcome::Committed => {
                info!(
                    key = %key,
                    from = %from_id,
                    to = %to_id,
                    amount = %amount,
                    "transfer committed"
                );
                Ok(Attempt::Done(TransferOutcome::Applied))
            }
            CommitOutcome::DuplicateKey => {
                warn!(key = %key, "duplicate key committed concurrently, replaying");
                Ok(Attempt::Done(TransferOutcome::Replayed))
            }
            CommitOutcome::VersionConflict => Ok(Attempt::Conflict),
        }
    }

    /// A failed balance validation can mean this request lost a same-key
    /// race: the winning commit both moved the funds and recorded the key.
    /// Consult the log once more so a resubmission never surfaces a false
    /// rejection.
    async fn reject_insufficient(
        &self,
        key: &str,
        account: AccountId,
    ) -> Result<Attempt<TransferOutcome>, TransferError> {
        if self.store.find_by_key(key).await?.is_some() {
            warn!(key = %key, "validation raced a committed duplicate, replaying");
            return Ok(Attempt::Done(TransferOutcome::Replayed));
        }
        Err(TransferError::InsufficientFunds(account))
    }

    /// Storage surface behind this ledger.
    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }
}
