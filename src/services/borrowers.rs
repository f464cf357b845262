//! Borrower registry service

use crate::{
    error::AppResult,
    models::borrower::{Borrower, CreateBorrower},
    repository::Repository,
};

#[derive(Clone)]
pub struct BorrowersService {
    repository: Repository,
}

impl BorrowersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get(&self, id: i64) -> AppResult<Borrower> {
        self.repository.borrowers.get_by_id(id).await
    }

    pub async fn list(&self) -> AppResult<Vec<Borrower>> {
        self.repository.borrowers.list().await
    }

    pub async fn register(&self, borrower: CreateBorrower) -> AppResult<Borrower> {
        let created = self.repository.borrowers.create(&borrower).await?;
        tracing::info!(borrower_id = created.id, username = %created.username, "borrower registered");
        Ok(created)
    }
}
