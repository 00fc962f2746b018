//! Ledger domain types.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Account row identifier, assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub i64);

impl AccountId {
    #[inline]
    pub fn inner(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for AccountId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A versioned balance row.
///
/// `version` is the sole concurrency-control token: it moves forward by
/// exactly 1 on every committed balance mutation and is never reused.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub id: AccountId,
    pub balance: Decimal,
    pub version: i64,
}

/// A committed transfer. Immutable and permanent once written: the durable
/// witness that the funds moved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub amount: Decimal,
    pub unique_key: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a transaction row. Id and timestamp are store-assigned.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub amount: Decimal,
    pub unique_key: String,
}

/// One compare-and-swap leg of the atomic transfer unit.
#[derive(Debug, Clone, Copy)]
pub struct BalanceDelta {
    pub account_id: AccountId,
    pub expected_version: i64,
    pub delta: Decimal,
}

impl BalanceDelta {
    /// Delta pinned to the version the account was read at.
    pub fn new(account: &Account, delta: Decimal) -> Self {
        Self {
            account_id: account.id,
            expected_version: account.version,
            delta,
        }
    }
}
