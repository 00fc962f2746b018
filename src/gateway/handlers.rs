use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::error;
use validator::Validate;

use crate::ledger::{AccountId, AccountStore, TransactionLog, TransferError};

use super::state::AppState;
use super::types::{
    AccountView, ApiResponse, CreateAccountRequest, TransactionView, TransferApiRequest,
    TransferApiResponse, error_codes, map_transfer_error,
};

type Rejection = (StatusCode, Json<ApiResponse<()>>);

fn reject(status: StatusCode, code: i32, msg: impl ToString) -> Rejection {
    (status, Json(ApiResponse::error(code, msg)))
}

/// PUT /api/ledger/transfer
pub async fn transfer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TransferApiRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TransferApiResponse>>), Rejection> {
    // 1. DTO validation; a negative amount never reaches the core
    req.validate().map_err(|e| {
        reject(
            StatusCode::BAD_REQUEST,
            error_codes::INVALID_PARAMETER,
            e.to_string(),
        )
    })?;

    // 2. A self-transfer can never commit (the second CAS leg always sees
    //    the version the first one bumped); reject it up front
    if req.from_account_id == req.to_account_id {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            error_codes::SAME_ACCOUNT,
            "from_account_id and to_account_id are the same",
        ));
    }

    // 3. Run under the caller-visible deadline. A timeout aborts the retry
    //    loop only; an already-committed unit stays committed.
    let call = state.ledger.transfer(
        &req.transaction_key,
        AccountId(req.from_account_id),
        AccountId(req.to_account_id),
        req.amount,
    );
    let result = match tokio::time::timeout(state.request_timeout, call).await {
        Ok(result) => result,
        Err(_) => {
            return Err(reject(
                StatusCode::GATEWAY_TIMEOUT,
                error_codes::REQUEST_TIMEOUT,
                "transfer timed out; resubmit with the same transaction_key",
            ));
        }
    };

    match result {
        Ok(outcome) => Ok((
            StatusCode::OK,
            Json(ApiResponse::success(TransferApiResponse::new(
                &req, outcome,
            ))),
        )),
        Err(e) => {
            if let TransferError::Store(inner) = &e {
                error!(key = %req.transaction_key, error = %inner, "storage failure during transfer");
            }
            let (status, code) = map_transfer_error(&e);
            Err(reject(status, code, e))
        }
    }
}

/// POST /api/ledger/accounts
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AccountView>>), Rejection> {
    req.validate().map_err(|e| {
        reject(
            StatusCode::BAD_REQUEST,
            error_codes::INVALID_PARAMETER,
            e.to_string(),
        )
    })?;

    let account = state
        .store()
        .create(req.opening_balance)
        .await
        .map_err(|e| {
            error!(error = %e, "account provisioning failed");
            reject(StatusCode::INTERNAL_SERVER_ERROR, error_codes::STORAGE, e)
        })?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(account.into())),
    ))
}

/// GET /api/ledger/accounts/{id}
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<AccountView>>, Rejection> {
    let account = state.store().get(AccountId(id)).await.map_err(|e| {
        error!(account_id = id, error = %e, "account lookup failed");
        reject(StatusCode::INTERNAL_SERVER_ERROR, error_codes::STORAGE, e)
    })?;

    match account {
        Some(account) => Ok(Json(ApiResponse::success(account.into()))),
        None => Err(reject(
            StatusCode::NOT_FOUND,
            error_codes::ACCOUNT_NOT_FOUND,
            format!("Account not found: {}", id),
        )),
    }
}

/// GET /api/ledger/transactions/{key}
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<TransactionView>>, Rejection> {
    let transaction = state.store().find_by_key(&key).await.map_err(|e| {
        error!(key = %key, error = %e, "transaction lookup failed");
        reject(StatusCode::INTERNAL_SERVER_ERROR, error_codes::STORAGE, e)
    })?;

    match transaction {
        Some(transaction) => Ok(Json(ApiResponse::success(transaction.into()))),
        None => Err(reject(
            StatusCode::NOT_FOUND,
            error_codes::TRANSACTION_NOT_FOUND,
            format!("No transaction with key: {}", key),
        )),
    }
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
