//! Route definitions for the loan API

use axum::{routing::get, routing::post, routing::put, Router};

use crate::handlers;
use crate::state::AppState;

pub fn loan_routes() -> Router<AppState> {
    Router::new()
        .route("/api/loans", get(handlers::list_loans))
        .route("/api/loans", post(handlers::create_loan))
        .route("/api/loans/:id", get(handlers::get_loan))
        .route(
            "/api/loans/:id/contract_state",
            put(handlers::put_contract_state),
        )
        .route("/api/loans/:id/loan_state", put(handlers::put_loan_state))
}
