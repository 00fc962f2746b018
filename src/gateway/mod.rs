//! HTTP gateway.
//!
//! Thin transport over the transfer orchestrator: routing, DTO validation,
//! status mapping and request-scoped trace ids. No business rule lives here.

pub mod handlers;
pub mod state;
pub mod types;

use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Request},
    middleware::{Next, from_fn},
    response::Response,
    routing::{get, post, put},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::Instrument;
use uuid::Uuid;

use state::AppState;

const TRACE_ID_HEADER: &str = "x-trace-id";

/// Attach a trace id to every request: honor the caller's header or mint
/// one, carry it in the request span, echo it on the response. The id lives
/// in the span, not in any global context.
async fn trace_id_middleware(request: Request<Body>, next: Next) -> Response {
    let trace_id = request
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = tracing::info_span!(
        "request",
        trace_id = %trace_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    async move {
        let mut response = next.run(request).await;
        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert(TRACE_ID_HEADER, value);
        }
        response
    }
    .instrument(span)
    .await
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/ledger/transfer", put(handlers::transfer))
        .route("/api/ledger/accounts", post(handlers::create_account))
        .route("/api/ledger/accounts/{id}", get(handlers::get_account))
        .route(
            "/api/ledger/transactions/{key}",
            get(handlers::get_transaction),
        )
        .layer(from_fn(trace_id_middleware))
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>, host: &str, port: u16) -> std::io::Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Gateway listening on {}", addr);
    axum::serve(listener, build_router(state)).await
}
