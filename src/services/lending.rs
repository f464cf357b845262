//! Lending policy engine.
//!
//! Every state-changing operation runs as one transaction against the item
//! store and the loan ledger: the item row is locked with `FOR UPDATE` for
//! the whole read-check-write span, so concurrent borrows of the last copy
//! serialize and exactly one wins. The loan insert/update and the counter
//! change commit together or not at all.
//!
//! Lock order is loan row before item row wherever both are taken, so the
//! return and cancel paths cannot deadlock each other.

use chrono::{DateTime, Duration, Utc};

use crate::{
    config::LendingConfig,
    error::{AppError, AppResult},
    models::{
        item::{Item, ItemStatus},
        loan::{Loan, LoanKind, LoanStatus, UpdateLoan},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LendingService {
    repository: Repository,
    config: LendingConfig,
}

impl LendingService {
    pub fn new(repository: Repository, config: LendingConfig) -> Self {
        Self { repository, config }
    }

    /// Borrow an item: checks availability, pair uniqueness and the borrow
    /// limit, then creates the active loan and decrements the counter.
    pub async fn borrow(&self, borrower_id: i64, item_id: i64) -> AppResult<Loan> {
        let borrower = self.repository.borrowers.get_by_id(borrower_id).await?;

        let mut tx = self.repository.pool.begin().await?;

        let item = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1 FOR UPDATE")
            .bind(item_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", item_id)))?;

        if item.status == ItemStatus::Unavailable || item.available_copies == 0 {
            return Err(AppError::ItemUnavailable(format!(
                "\"{}\" has no copies available for borrowing",
                item.title
            )));
        }

        let already_borrowed: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM loans
                WHERE borrower_id = $1 AND item_id = $2 AND status IN ('active', 'overdue')
            )
            "#,
        )
        .bind(borrower_id)
        .bind(item_id)
        .fetch_one(&mut *tx)
        .await?;

        if already_borrowed {
            return Err(AppError::DuplicateActiveLoan(format!(
                "Borrower {} already has an open loan on \"{}\"",
                borrower.username, item.title
            )));
        }

        let open_loans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE borrower_id = $1 AND status IN ('active', 'overdue')",
        )
        .bind(borrower_id)
        .fetch_one(&mut *tx)
        .await?;

        if open_loans >= self.config.max_active_loans {
            return Err(AppError::BorrowLimitExceeded(format!(
                "Borrower {} has reached the loan limit ({}/{})",
                borrower.username, open_loans, self.config.max_active_loans
            )));
        }

        let now = Utc::now();
        let due_date = now + Duration::days(self.config.loan_period_days);

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (borrower_id, item_id, kind, status, borrowed_at, due_date)
            VALUES ($1, $2, 'borrow', 'active', $3, $4)
            RETURNING *
            "#,
        )
        .bind(borrower_id)
        .bind(item_id)
        .bind(now)
        .bind(due_date)
        .fetch_one(&mut *tx)
        .await?;

        let updated = sqlx::query(
            r#"
            UPDATE items
            SET available_copies = available_copies - 1, updated_at = $2
            WHERE id = $1 AND available_copies > 0
            "#,
        )
        .bind(item_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            // Unreachable under the row lock; the guard keeps the counter
            // from ever going negative regardless.
            return Err(AppError::ItemUnavailable(format!(
                "\"{}\" has no copies available for borrowing",
                item.title
            )));
        }

        tx.commit().await?;

        tracing::info!(
            loan_id = loan.id,
            borrower_id,
            item_id,
            due_date = %due_date,
            "loan created"
        );

        Ok(loan)
    }

    /// Return the open loan for a (borrower, item) pair. An overdue-marked
    /// loan is still returnable.
    pub async fn return_item(&self, borrower_id: i64, item_id: i64) -> AppResult<Loan> {
        self.repository.borrowers.get_by_id(borrower_id).await?;
        self.repository.items.get_by_id(item_id).await?;

        let mut tx = self.repository.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            SELECT * FROM loans
            WHERE borrower_id = $1 AND item_id = $2 AND status IN ('active', 'overdue')
            FOR UPDATE
            "#,
        )
        .bind(borrower_id)
        .bind(item_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::NoActiveLoan(format!(
                "No active loan for borrower {} on item {}",
                borrower_id, item_id
            ))
        })?;

        let now = Utc::now();

        let returned = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET status = 'returned', returned_at = $2, updated_at = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(loan.id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        // Capped increment: an administrative reset may already have the
        // counter at total, the release must not push it past.
        sqlx::query(
            r#"
            UPDATE items
            SET available_copies = LEAST(available_copies + 1, total_copies), updated_at = $2
            WHERE id = $1
            "#,
        )
        .bind(item_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(loan_id = returned.id, borrower_id, item_id, "loan returned");

        Ok(returned)
    }

    /// Cancel an open loan. A cancelled borrow never fulfilled, so its copy
    /// is released back to inventory.
    pub async fn cancel(&self, loan_id: i64) -> AppResult<Loan> {
        let mut tx = self.repository.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;

        if !loan.status.is_open() {
            return Err(AppError::InvalidStateTransition(format!(
                "Only active loans can be cancelled (loan {} is {})",
                loan_id,
                loan.status.as_str()
            )));
        }

        let now = Utc::now();

        let cancelled = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET status = 'cancelled', updated_at = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(loan_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        if loan.kind == LoanKind::Borrow {
            sqlx::query(
                r#"
                UPDATE items
                SET available_copies = LEAST(available_copies + 1, total_copies), updated_at = $2
                WHERE id = $1
                "#,
            )
            .bind(loan.item_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(loan_id, item_id = loan.item_id, "loan cancelled");

        Ok(cancelled)
    }

    /// Move the due date of an active loan. The new date must lie in the
    /// future.
    pub async fn extend_due_date(
        &self,
        loan_id: i64,
        new_due_date: DateTime<Utc>,
    ) -> AppResult<Loan> {
        if new_due_date <= Utc::now() {
            return Err(AppError::Validation(format!(
                "New due date {} must be in the future",
                new_due_date
            )));
        }

        let mut tx = self.repository.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;

        if loan.status != LoanStatus::Active {
            return Err(AppError::InvalidStateTransition(format!(
                "Only active loans can have their due date extended (loan {} is {})",
                loan_id,
                loan.status.as_str()
            )));
        }

        let extended = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET due_date = $2, updated_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(loan_id)
        .bind(new_due_date)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(loan_id, due_date = %new_due_date, "loan due date extended");

        Ok(extended)
    }

    /// Re-label an active loan as overdue. Idempotent, informational only;
    /// the computed predicate stays the analytics source of truth.
    pub async fn mark_overdue(&self, loan_id: i64) -> AppResult<Loan> {
        let loan = self.repository.loans.get_by_id(loan_id).await?;
        if loan.status != LoanStatus::Active {
            return Ok(loan);
        }

        let marked = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET status = 'overdue', updated_at = $2
            WHERE id = $1 AND status = 'active'
            RETURNING *
            "#,
        )
        .bind(loan_id)
        .bind(Utc::now())
        .fetch_optional(&self.repository.pool)
        .await?;

        match marked {
            Some(loan) => Ok(loan),
            // Lost a race with another transition; report current state
            None => self.repository.loans.get_by_id(loan_id).await,
        }
    }

    /// Scheduled overdue-marking pass: flip every loan matching the computed
    /// predicate. Returns the number of loans marked.
    pub async fn mark_overdue_sweep(&self) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE loans
            SET status = 'overdue', updated_at = $1
            WHERE status = 'active' AND due_date < $1
            "#,
        )
        .bind(Utc::now())
        .execute(&self.repository.pool)
        .await?;

        let marked = result.rows_affected();
        if marked > 0 {
            tracing::info!(marked, "overdue sweep relabelled loans");
        }
        Ok(marked)
    }

    /// Administrative override: applies the given fields with no invariant
    /// checks beyond existence. Access control is the caller's concern.
    pub async fn update(&self, loan_id: i64, update: UpdateLoan) -> AppResult<Loan> {
        let mut loan = self.repository.loans.get_by_id(loan_id).await?;

        if let Some(status) = update.status {
            loan.status = status;
        }
        if let Some(notes) = update.notes {
            loan.notes = Some(notes);
        }
        if let Some(due_date) = update.due_date {
            loan.due_date = due_date;
        }

        self.repository.loans.save(&loan).await
    }

    // --- Query passthroughs -------------------------------------------------

    pub async fn get_loan(&self, loan_id: i64) -> AppResult<Loan> {
        self.repository.loans.get_by_id(loan_id).await
    }

    pub async fn list_loans(&self) -> AppResult<Vec<Loan>> {
        self.repository.loans.list().await
    }

    pub async fn loans_by_status(&self, status: LoanStatus) -> AppResult<Vec<Loan>> {
        self.repository.loans.by_status(status).await
    }

    pub async fn loans_by_kind(&self, kind: LoanKind) -> AppResult<Vec<Loan>> {
        self.repository.loans.by_kind(kind).await
    }

    /// The open loan for a (borrower, item) pair
    pub async fn open_loan_for_pair(&self, borrower_id: i64, item_id: i64) -> AppResult<Loan> {
        self.repository
            .loans
            .open_for_pair(borrower_id, item_id)
            .await?
            .ok_or_else(|| {
                AppError::NoActiveLoan(format!(
                    "No active loan for borrower {} on item {}",
                    borrower_id, item_id
                ))
            })
    }

    /// Loan history for a borrower (verifies the borrower exists)
    pub async fn borrower_history(&self, borrower_id: i64) -> AppResult<Vec<Loan>> {
        self.repository.borrowers.get_by_id(borrower_id).await?;
        self.repository.loans.by_borrower(borrower_id).await
    }

    /// Open loans for a borrower (verifies the borrower exists)
    pub async fn borrower_open_loans(&self, borrower_id: i64) -> AppResult<Vec<Loan>> {
        self.repository.borrowers.get_by_id(borrower_id).await?;
        self.repository.loans.open_by_borrower(borrower_id).await
    }

    /// Loan history for an item (verifies the item exists)
    pub async fn item_history(&self, item_id: i64) -> AppResult<Vec<Loan>> {
        self.repository.items.get_by_id(item_id).await?;
        self.repository.loans.by_item(item_id).await
    }

    /// Loans overdue right now under the computed predicate
    pub async fn overdue_loans(&self) -> AppResult<Vec<Loan>> {
        self.repository.loans.overdue_as_of(Utc::now()).await
    }

    pub async fn loans_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Loan>> {
        self.repository.loans.created_between(start, end).await
    }
}
