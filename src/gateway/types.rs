//! Gateway request/response types and error mapping.

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::ledger::{Account, Transaction, TransferError, TransferOutcome};

// ============================================================================
// API Request/Response Types
// ============================================================================

/// Body of `PUT /api/ledger/transfer`.
#[derive(Debug, Deserialize, Validate)]
pub struct TransferApiRequest {
    /// Caller-supplied idempotency key; resubmitting it is always safe.
    #[validate(length(min = 1, max = 128))]
    pub transaction_key: String,
    pub from_account_id: i64,
    pub to_account_id: i64,
    /// Decimal as a JSON string or number, never a binary float.
    #[validate(custom(function = validate_amount))]
    pub amount: Decimal,
}

fn validate_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount < Decimal::ZERO {
        return Err(ValidationError::new("amount_negative"));
    }
    Ok(())
}

/// Body of `POST /api/ledger/accounts`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    #[validate(custom(function = validate_amount))]
    pub opening_balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct TransferApiResponse {
    pub transaction_key: String,
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: Decimal,
    /// "applied" for a fresh commit, "replayed" for an absorbed duplicate.
    pub status: &'static str,
}

impl TransferApiResponse {
    pub fn new(req: &TransferApiRequest, outcome: TransferOutcome) -> Self {
        Self {
            transaction_key: req.transaction_key.clone(),
            from_account_id: req.from_account_id,
            to_account_id: req.to_account_id,
            amount: req.amount,
            status: match outcome {
                TransferOutcome::Applied => "applied",
                TransferOutcome::Replayed => "replayed",
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AccountView {
    pub account_id: i64,
    pub balance: Decimal,
    pub version: i64,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        Self {
            account_id: account.id.inner(),
            balance: account.balance,
            version: account.version,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionView {
    pub transaction_id: i64,
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: Decimal,
    pub unique_key: String,
    pub timestamp: i64,
}

impl From<Transaction> for TransactionView {
    fn from(transaction: Transaction) -> Self {
        Self {
            transaction_id: transaction.id,
            from_account_id: transaction.from_account_id.inner(),
            to_account_id: transaction.to_account_id.inner(),
            amount: transaction.amount,
            unique_key: transaction.unique_key,
            timestamp: transaction.created_at.timestamp_millis(),
        }
    }
}

/// API wrapper for the standard response format.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            data: Some(data),
            msg: None,
        }
    }

    pub fn error(code: i32, msg: impl ToString) -> Self {
        Self {
            code,
            data: None,
            msg: Some(msg.to_string()),
        }
    }
}

// ============================================================================
// Error Codes
// ============================================================================

pub mod error_codes {
    pub const INVALID_PARAMETER: i32 = -1001;
    pub const SAME_ACCOUNT: i32 = -1002;
    pub const ACCOUNT_NOT_FOUND: i32 = -2001;
    pub const INSUFFICIENT_FUNDS: i32 = -2002;
    pub const CONTENTION_LIMIT: i32 = -3001;
    pub const REQUEST_TIMEOUT: i32 = -3002;
    pub const TRANSACTION_NOT_FOUND: i32 = -4001;
    pub const STORAGE: i32 = -5001;
}

/// 509 "bandwidth limit exceeded" marks contention, distinct from every
/// business rejection. No StatusCode constant exists for it.
pub fn contention_status() -> StatusCode {
    StatusCode::from_u16(509).unwrap_or(StatusCode::SERVICE_UNAVAILABLE)
}

/// Map a transfer failure to (HTTP status, numeric error code).
pub fn map_transfer_error(e: &TransferError) -> (StatusCode, i32) {
    match e {
        TransferError::AccountNotFound(_) => {
            (StatusCode::BAD_REQUEST, error_codes::ACCOUNT_NOT_FOUND)
        }
        TransferError::InsufficientFunds(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            error_codes::INSUFFICIENT_FUNDS,
        ),
        TransferError::RetryExhausted { .. } => (contention_status(), error_codes::CONTENTION_LIMIT),
        TransferError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, error_codes::STORAGE),
    }
}
