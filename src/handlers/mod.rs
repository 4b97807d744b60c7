//! API handlers for the loan administration backend
//!
//! Thin HTTP adapters over the loan service. Bodies are the raw attribute
//! hashes the core normalizes itself; which change is legal is entirely
//! the core's decision, the handlers only translate the outcome into a
//! status code.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::loan::service::StoredLoan;
use crate::state::AppState;

/// Create a new loan
///
/// `POST /api/loans`
pub async fn create_loan(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(attributes): Json<Map<String, Value>>,
) -> ApiResult<Json<StoredLoan>> {
    let loan = state.loan_service.create(attributes, &user).await?;
    Ok(Json(loan))
}

/// List all loans
///
/// `GET /api/loans`
pub async fn list_loans(State(state): State<AppState>) -> ApiResult<Json<Vec<StoredLoan>>> {
    let loans = state.loan_service.list().await?;
    Ok(Json(loans))
}

/// Get a loan by id
///
/// `GET /api/loans/:id`
pub async fn get_loan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<StoredLoan>> {
    let loan = state.loan_service.get(id).await?;
    Ok(Json(loan))
}

/// Advance the contract paperwork state
///
/// `PUT /api/loans/:id/contract_state`
pub async fn put_contract_state(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
    Json(changes): Json<Map<String, Value>>,
) -> ApiResult<Json<StoredLoan>> {
    let loan = state.loan_service.update(id, changes, &user).await?;
    Ok(Json(loan))
}

/// Advance the loan disbursement state
///
/// `PUT /api/loans/:id/loan_state`
pub async fn put_loan_state(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
    Json(changes): Json<Map<String, Value>>,
) -> ApiResult<Json<StoredLoan>> {
    let loan = state.loan_service.update(id, changes, &user).await?;
    Ok(Json(loan))
}

/// Service health probe
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
