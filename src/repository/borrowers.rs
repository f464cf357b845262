//! Borrowers repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::borrower::{Borrower, CreateBorrower},
};

#[derive(Clone)]
pub struct BorrowersRepository {
    pool: Pool<Postgres>,
}

impl BorrowersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get borrower by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Borrower> {
        sqlx::query_as::<_, Borrower>("SELECT * FROM borrowers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrower with id {} not found", id)))
    }

    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<Borrower>> {
        let borrower = sqlx::query_as::<_, Borrower>("SELECT * FROM borrowers WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(borrower)
    }

    pub async fn list(&self) -> AppResult<Vec<Borrower>> {
        let borrowers = sqlx::query_as::<_, Borrower>("SELECT * FROM borrowers ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(borrowers)
    }

    /// Create a new borrower; username and email must be unique
    pub async fn create(&self, borrower: &CreateBorrower) -> AppResult<Borrower> {
        if self.find_by_username(&borrower.username).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Borrower with username {} already exists",
                borrower.username
            )));
        }

        let created = sqlx::query_as::<_, Borrower>(
            r#"
            INSERT INTO borrowers (username, email, full_name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&borrower.username)
        .bind(&borrower.email)
        .bind(&borrower.full_name)
        .bind(borrower.role.unwrap_or_default())
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }
}
