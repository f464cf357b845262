//! Loan ledger endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppResult,
    models::loan::{Loan, LoanKind, LoanStatus, UpdateLoan},
};

/// Borrow request
#[derive(Deserialize, ToSchema)]
pub struct BorrowRequest {
    pub borrower_id: i64,
    pub item_id: i64,
}

/// Return request
#[derive(Deserialize, ToSchema)]
pub struct ReturnRequest {
    pub borrower_id: i64,
    pub item_id: i64,
}

/// Due date extension request
#[derive(Deserialize, ToSchema)]
pub struct ExtendRequest {
    pub due_date: DateTime<Utc>,
}

/// Created-at range query
#[derive(Deserialize, IntoParams, ToSchema)]
pub struct DateRangeQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Overdue sweep response
#[derive(Serialize, ToSchema)]
pub struct SweepResponse {
    /// Number of loans relabelled as overdue
    pub marked: u64,
}

/// Ledger listing filters
#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ListLoansQuery {
    pub status: Option<LoanStatus>,
    pub kind: Option<LoanKind>,
}

/// Open-loan pair lookup query
#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PairQuery {
    pub borrower_id: i64,
    pub item_id: i64,
}

/// Borrow an item
#[utoipa::path(
    post,
    path = "/loans/borrow",
    tag = "loans",
    request_body = BorrowRequest,
    responses(
        (status = 201, description = "Loan created", body = Loan),
        (status = 404, description = "Borrower or item not found"),
        (status = 409, description = "Item unavailable or already borrowed by this borrower"),
        (status = 422, description = "Borrow limit reached")
    )
)]
pub async fn borrow(
    State(state): State<crate::AppState>,
    Json(request): Json<BorrowRequest>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    let loan = state
        .services
        .lending
        .borrow(request.borrower_id, request.item_id)
        .await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// Return a borrowed item
#[utoipa::path(
    post,
    path = "/loans/return",
    tag = "loans",
    request_body = ReturnRequest,
    responses(
        (status = 200, description = "Loan returned", body = Loan),
        (status = 404, description = "Borrower or item not found"),
        (status = 422, description = "No active loan for the pair")
    )
)]
pub async fn return_item(
    State(state): State<crate::AppState>,
    Json(request): Json<ReturnRequest>,
) -> AppResult<Json<Loan>> {
    let loan = state
        .services
        .lending
        .return_item(request.borrower_id, request.item_id)
        .await?;
    Ok(Json(loan))
}

/// List the ledger, optionally filtered by status or kind
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    params(ListLoansQuery),
    responses(
        (status = 200, description = "Matching ledger rows, newest first", body = Vec<Loan>)
    )
)]
pub async fn list_loans(
    State(state): State<crate::AppState>,
    Query(query): Query<ListLoansQuery>,
) -> AppResult<Json<Vec<Loan>>> {
    let loans = match (query.status, query.kind) {
        (Some(status), _) => state.services.lending.loans_by_status(status).await?,
        (None, Some(kind)) => state.services.lending.loans_by_kind(kind).await?,
        (None, None) => state.services.lending.list_loans().await?,
    };
    Ok(Json(loans))
}

/// Look up the open loan for a (borrower, item) pair
#[utoipa::path(
    get,
    path = "/loans/active-pair",
    tag = "loans",
    params(PairQuery),
    responses(
        (status = 200, description = "Open loan for the pair", body = Loan),
        (status = 422, description = "No open loan for the pair")
    )
)]
pub async fn open_loan_for_pair(
    State(state): State<crate::AppState>,
    Query(query): Query<PairQuery>,
) -> AppResult<Json<Loan>> {
    let loan = state
        .services
        .lending
        .open_loan_for_pair(query.borrower_id, query.item_id)
        .await?;
    Ok(Json(loan))
}

/// Loans overdue right now (computed predicate)
#[utoipa::path(
    get,
    path = "/loans/overdue",
    tag = "loans",
    responses(
        (status = 200, description = "Overdue loans", body = Vec<Loan>)
    )
)]
pub async fn overdue_loans(State(state): State<crate::AppState>) -> AppResult<Json<Vec<Loan>>> {
    let loans = state.services.lending.overdue_loans().await?;
    Ok(Json(loans))
}

/// Ledger rows created within a time range
#[utoipa::path(
    get,
    path = "/loans/date-range",
    tag = "loans",
    params(DateRangeQuery),
    responses(
        (status = 200, description = "Loans in range", body = Vec<Loan>)
    )
)]
pub async fn loans_in_range(
    State(state): State<crate::AppState>,
    Query(query): Query<DateRangeQuery>,
) -> AppResult<Json<Vec<Loan>>> {
    let loans = state
        .services
        .lending
        .loans_in_range(query.start, query.end)
        .await?;
    Ok(Json(loans))
}

/// Get a loan by ID
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    params(("id" = i64, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan", body = Loan),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.lending.get_loan(id).await?;
    Ok(Json(loan))
}

/// Administrative loan override
#[utoipa::path(
    put,
    path = "/loans/{id}",
    tag = "loans",
    params(("id" = i64, Path, description = "Loan ID")),
    request_body = UpdateLoan,
    responses(
        (status = 200, description = "Loan updated", body = Loan),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn update_loan(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateLoan>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.lending.update(id, request).await?;
    Ok(Json(loan))
}

/// Cancel an open loan
#[utoipa::path(
    put,
    path = "/loans/{id}/cancel",
    tag = "loans",
    params(("id" = i64, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan cancelled", body = Loan),
        (status = 404, description = "Loan not found"),
        (status = 422, description = "Loan is not open")
    )
)]
pub async fn cancel_loan(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.lending.cancel(id).await?;
    Ok(Json(loan))
}

/// Extend an active loan's due date
#[utoipa::path(
    put,
    path = "/loans/{id}/extend",
    tag = "loans",
    params(("id" = i64, Path, description = "Loan ID")),
    request_body = ExtendRequest,
    responses(
        (status = 200, description = "Due date extended", body = Loan),
        (status = 400, description = "Due date not in the future"),
        (status = 404, description = "Loan not found"),
        (status = 422, description = "Loan is not active")
    )
)]
pub async fn extend_loan(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
    Json(request): Json<ExtendRequest>,
) -> AppResult<Json<Loan>> {
    let loan = state
        .services
        .lending
        .extend_due_date(id, request.due_date)
        .await?;
    Ok(Json(loan))
}

/// Mark a loan overdue (informational re-label)
#[utoipa::path(
    put,
    path = "/loans/{id}/mark-overdue",
    tag = "loans",
    params(("id" = i64, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan state after marking", body = Loan),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn mark_overdue(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.lending.mark_overdue(id).await?;
    Ok(Json(loan))
}

/// Run the overdue-marking pass over the whole ledger
#[utoipa::path(
    post,
    path = "/loans/mark-overdue",
    tag = "loans",
    responses(
        (status = 200, description = "Sweep result", body = SweepResponse)
    )
)]
pub async fn mark_overdue_sweep(
    State(state): State<crate::AppState>,
) -> AppResult<Json<SweepResponse>> {
    let marked = state.services.lending.mark_overdue_sweep().await?;
    Ok(Json(SweepResponse { marked }))
}

/// Loan history for an item
#[utoipa::path(
    get,
    path = "/items/{id}/loans",
    tag = "loans",
    params(("id" = i64, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Loan history, newest first", body = Vec<Loan>),
        (status = 404, description = "Item not found")
    )
)]
pub async fn item_loans(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Loan>>> {
    let loans = state.services.lending.item_history(id).await?;
    Ok(Json(loans))
}
