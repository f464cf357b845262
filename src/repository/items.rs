//! Items repository for database operations.
//!
//! Counter mutations here are single guarded statements; the multi-step
//! borrow/return paths run in the lending service under a row lock.

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::item::{validate_counts, CreateItem, Item, ItemQuery, UpdateItem},
};

#[derive(Clone)]
pub struct ItemsRepository {
    pool: Pool<Postgres>,
}

impl ItemsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get item by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Item> {
        sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", id)))
    }

    /// Get item by catalog key (ISBN)
    pub async fn find_by_isbn(&self, isbn: &str) -> AppResult<Item> {
        self.find_by_isbn_opt(isbn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item with ISBN {} not found", isbn)))
    }

    pub async fn find_by_isbn_opt(&self, isbn: &str) -> AppResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE isbn = $1")
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    /// List items with optional search/category/author/availability filters
    pub async fn list(&self, query: &ItemQuery) -> AppResult<Vec<Item>> {
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(ref search) = query.search {
            params.push(format!("%{}%", search));
            let i = params.len();
            conditions.push(format!(
                "(title ILIKE ${i} OR author ILIKE ${i} OR isbn ILIKE ${i})"
            ));
        }
        if let Some(ref category) = query.category {
            params.push(category.clone());
            conditions.push(format!("category = ${}", params.len()));
        }
        if let Some(ref author) = query.author {
            params.push(author.clone());
            conditions.push(format!("author = ${}", params.len()));
        }
        if query.available_only.unwrap_or(false) {
            conditions.push("available_copies > 0".to_string());
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!("SELECT * FROM items {} ORDER BY id", where_clause);
        let mut q = sqlx::query_as::<_, Item>(&sql);
        for p in &params {
            q = q.bind(p);
        }

        Ok(q.fetch_all(&self.pool).await?)
    }

    /// Distinct categories, alphabetically
    pub async fn categories(&self) -> AppResult<Vec<String>> {
        let rows: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT category FROM items ORDER BY category")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    /// Items with fewer available copies than the threshold
    pub async fn low_stock(&self, threshold: i32) -> AppResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            "SELECT * FROM items WHERE available_copies < $1 ORDER BY available_copies, id",
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// Items with no available copies at all
    pub async fn out_of_stock(&self) -> AppResult<Vec<Item>> {
        let items =
            sqlx::query_as::<_, Item>("SELECT * FROM items WHERE available_copies = 0 ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(items)
    }

    /// Create a new item. Available copies default to the total.
    pub async fn create(&self, item: &CreateItem) -> AppResult<Item> {
        let available = item.available_copies.unwrap_or(item.total_copies);
        validate_counts(item.total_copies, available)?;

        let created = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (isbn, title, author, category, publisher, publication_year,
                               price, language, pages, description,
                               total_copies, available_copies, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(&item.isbn)
        .bind(&item.title)
        .bind(&item.author)
        .bind(&item.category)
        .bind(&item.publisher)
        .bind(item.publication_year)
        .bind(item.price)
        .bind(&item.language)
        .bind(item.pages)
        .bind(&item.description)
        .bind(item.total_copies)
        .bind(available)
        .bind(item.status.unwrap_or_default())
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Update item metadata (counters are left alone)
    pub async fn update(&self, id: i64, update: &UpdateItem) -> AppResult<Item> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items
            SET title = COALESCE($2, title),
                author = COALESCE($3, author),
                category = COALESCE($4, category),
                publisher = COALESCE($5, publisher),
                publication_year = COALESCE($6, publication_year),
                price = COALESCE($7, price),
                language = COALESCE($8, language),
                pages = COALESCE($9, pages),
                description = COALESCE($10, description),
                status = COALESCE($11, status),
                updated_at = $12
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.author)
        .bind(&update.category)
        .bind(&update.publisher)
        .bind(update.publication_year)
        .bind(update.price)
        .bind(&update.language)
        .bind(update.pages)
        .bind(&update.description)
        .bind(update.status)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", id)))?;

        Ok(item)
    }

    /// Atomically apply `delta` to `available_copies`, rejecting a result
    /// outside 0..=total_copies.
    pub async fn adjust_availability(&self, id: i64, delta: i32) -> AppResult<Item> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items
            SET available_copies = available_copies + $2, updated_at = $3
            WHERE id = $1
              AND available_copies + $2 >= 0
              AND available_copies + $2 <= total_copies
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        match item {
            Some(item) => Ok(item),
            // Distinguish a missing row from a rejected adjustment
            None => {
                let current = self.get_by_id(id).await?;
                current.checked_adjust(delta)?;
                Err(AppError::InvalidInventoryState(format!(
                    "concurrent update rejected availability adjustment on item {}",
                    id
                )))
            }
        }
    }

    /// Administrative counter reset; validates 0 <= available <= total
    pub async fn set_counts(&self, id: i64, total: i32, available: i32) -> AppResult<Item> {
        validate_counts(total, available)?;

        sqlx::query_as::<_, Item>(
            r#"
            UPDATE items
            SET total_copies = $2, available_copies = $3, updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(total)
        .bind(available)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", id)))
    }

    /// Delete an item; rejected while open loans still reference it
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let open_loans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE item_id = $1 AND status IN ('active', 'overdue')",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if open_loans > 0 {
            return Err(AppError::Conflict(format!(
                "Item {} has {} open loans and cannot be deleted",
                id, open_loans
            )));
        }

        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Item with id {} not found", id)));
        }

        Ok(())
    }
}
