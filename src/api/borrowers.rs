//! Borrower endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        borrower::{Borrower, CreateBorrower},
        loan::Loan,
    },
};

/// List borrowers
#[utoipa::path(
    get,
    path = "/borrowers",
    tag = "borrowers",
    responses(
        (status = 200, description = "All borrowers", body = Vec<Borrower>)
    )
)]
pub async fn list_borrowers(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<Borrower>>> {
    let borrowers = state.services.borrowers.list().await?;
    Ok(Json(borrowers))
}

/// Create a borrower
#[utoipa::path(
    post,
    path = "/borrowers",
    tag = "borrowers",
    request_body = CreateBorrower,
    responses(
        (status = 201, description = "Borrower created", body = Borrower),
        (status = 409, description = "Username already exists")
    )
)]
pub async fn create_borrower(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateBorrower>,
) -> AppResult<(StatusCode, Json<Borrower>)> {
    let borrower = state.services.borrowers.register(request).await?;
    Ok((StatusCode::CREATED, Json(borrower)))
}

/// Get a borrower by ID
#[utoipa::path(
    get,
    path = "/borrowers/{id}",
    tag = "borrowers",
    params(("id" = i64, Path, description = "Borrower ID")),
    responses(
        (status = 200, description = "Borrower", body = Borrower),
        (status = 404, description = "Borrower not found")
    )
)]
pub async fn get_borrower(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Borrower>> {
    let borrower = state.services.borrowers.get(id).await?;
    Ok(Json(borrower))
}

/// Full loan history for a borrower
#[utoipa::path(
    get,
    path = "/borrowers/{id}/loans",
    tag = "borrowers",
    params(("id" = i64, Path, description = "Borrower ID")),
    responses(
        (status = 200, description = "Loan history, newest first", body = Vec<Loan>),
        (status = 404, description = "Borrower not found")
    )
)]
pub async fn borrower_loans(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Loan>>> {
    let loans = state.services.lending.borrower_history(id).await?;
    Ok(Json(loans))
}

/// Open loans for a borrower
#[utoipa::path(
    get,
    path = "/borrowers/{id}/loans/active",
    tag = "borrowers",
    params(("id" = i64, Path, description = "Borrower ID")),
    responses(
        (status = 200, description = "Open loans", body = Vec<Loan>),
        (status = 404, description = "Borrower not found")
    )
)]
pub async fn borrower_active_loans(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Loan>>> {
    let loans = state.services.lending.borrower_open_loans(id).await?;
    Ok(Json(loans))
}
