//! Loan ledger repository.
//!
//! Read/query surface over the append-mostly loans table. The write paths
//! that pair a status transition with an item counter change live in the
//! lending service so both land in one transaction.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::loan::{Loan, LoanKind, LoanStatus},
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Full ledger, newest first
    pub async fn list(&self) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>("SELECT * FROM loans ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(loans)
    }

    /// Loan history for a borrower, newest first
    pub async fn by_borrower(&self, borrower_id: i64) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE borrower_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(borrower_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    /// Open (active or overdue) loans for a borrower
    pub async fn open_by_borrower(&self, borrower_id: i64) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            r#"
            SELECT * FROM loans
            WHERE borrower_id = $1 AND status IN ('active', 'overdue')
            ORDER BY due_date, id
            "#,
        )
        .bind(borrower_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    /// Loan history for an item, newest first
    pub async fn by_item(&self, item_id: i64) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE item_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    pub async fn by_status(&self, status: LoanStatus) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE status = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    pub async fn by_kind(&self, kind: LoanKind) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE kind = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    /// The open loan for a (borrower, item) pair, if any. The partial unique
    /// index guarantees at most one.
    pub async fn open_for_pair(&self, borrower_id: i64, item_id: i64) -> AppResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            SELECT * FROM loans
            WHERE borrower_id = $1 AND item_id = $2 AND status IN ('active', 'overdue')
            "#,
        )
        .bind(borrower_id)
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(loan)
    }

    /// Loans overdue as of `t` under the computed predicate
    pub async fn overdue_as_of(&self, t: DateTime<Utc>) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE status = 'active' AND due_date < $1 ORDER BY due_date, id",
        )
        .bind(t)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    /// Ledger rows created within [start, end]
    pub async fn created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE created_at BETWEEN $1 AND $2 ORDER BY created_at, id",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    /// Persist mutated loan fields (administrative update path)
    pub async fn save(&self, loan: &Loan) -> AppResult<Loan> {
        let saved = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET status = $2, notes = $3, due_date = $4, returned_at = $5, updated_at = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(loan.id)
        .bind(loan.status)
        .bind(&loan.notes)
        .bind(loan.due_date)
        .bind(loan.returned_at)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan.id)))?;

        Ok(saved)
    }
}
