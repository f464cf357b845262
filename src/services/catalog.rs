//! Catalog item management service

use crate::{
    error::{AppError, AppResult},
    models::item::{CreateItem, Item, ItemQuery, UpdateItem},
    repository::Repository,
};

/// Default low-stock threshold for the catalog report
pub const LOW_STOCK_THRESHOLD: i32 = 2;

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get_item(&self, id: i64) -> AppResult<Item> {
        self.repository.items.get_by_id(id).await
    }

    pub async fn find_by_isbn(&self, isbn: &str) -> AppResult<Item> {
        self.repository.items.find_by_isbn(isbn).await
    }

    pub async fn list_items(&self, query: &ItemQuery) -> AppResult<Vec<Item>> {
        self.repository.items.list(query).await
    }

    pub async fn categories(&self) -> AppResult<Vec<String>> {
        self.repository.items.categories().await
    }

    pub async fn low_stock(&self, threshold: Option<i32>) -> AppResult<Vec<Item>> {
        self.repository
            .items
            .low_stock(threshold.unwrap_or(LOW_STOCK_THRESHOLD))
            .await
    }

    pub async fn out_of_stock(&self) -> AppResult<Vec<Item>> {
        self.repository.items.out_of_stock().await
    }

    /// Create a catalog entry; duplicate ISBNs are rejected up front
    pub async fn create_item(&self, item: CreateItem) -> AppResult<Item> {
        if self
            .repository
            .items
            .find_by_isbn_opt(&item.isbn)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "Item with ISBN {} already exists",
                item.isbn
            )));
        }

        let created = self.repository.items.create(&item).await?;
        tracing::info!(item_id = created.id, isbn = %created.isbn, "catalog item created");
        Ok(created)
    }

    pub async fn update_item(&self, id: i64, update: UpdateItem) -> AppResult<Item> {
        self.repository.items.update(id, &update).await
    }

    /// Administrative counter reset (inventory correction)
    pub async fn set_counts(&self, id: i64, total: i32, available: i32) -> AppResult<Item> {
        let item = self.repository.items.set_counts(id, total, available).await?;
        tracing::info!(
            item_id = id,
            total_copies = total,
            available_copies = available,
            "inventory counters reset"
        );
        Ok(item)
    }

    /// Apply a signed delta to `available_copies`
    pub async fn adjust_availability(&self, id: i64, delta: i32) -> AppResult<Item> {
        self.repository.items.adjust_availability(id, delta).await
    }

    /// Delete an item; refused while open loans reference it
    pub async fn delete_item(&self, id: i64) -> AppResult<()> {
        self.repository.items.delete(id).await?;
        tracing::info!(item_id = id, "catalog item deleted");
        Ok(())
    }
}
