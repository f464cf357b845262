//! Catalog item model and inventory counter guards.
//!
//! The counter pair (`total_copies`, `available_copies`) is the one hot
//! resource in the system; every mutation of it goes through the lending
//! service inside a row-locking transaction. The checked arithmetic lives
//! here so the invariant is testable without a database.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

/// Item display status. A listing hint; the copy counters stay authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "item_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Available,
    Unavailable,
}

impl Default for ItemStatus {
    fn default() -> Self {
        ItemStatus::Available
    }
}

/// Catalog item from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Item {
    pub id: i64,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub category: String,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    pub language: Option<String>,
    pub pages: Option<i32>,
    pub description: Option<String>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Whether a borrow may be granted against this item
    pub fn is_borrowable(&self) -> bool {
        self.status == ItemStatus::Available && self.available_copies > 0
    }

    /// Fraction of copies currently checked out (0.0 when the item has none)
    pub fn utilization(&self) -> f64 {
        if self.total_copies == 0 {
            return 0.0;
        }
        f64::from(self.total_copies - self.available_copies) / f64::from(self.total_copies)
    }

    /// Checked counter arithmetic. Returns the new `available_copies` or
    /// fails when the result would leave the 0..=total_copies range.
    pub fn checked_adjust(&self, delta: i32) -> AppResult<i32> {
        let next = self.available_copies + delta;
        if next < 0 || next > self.total_copies {
            return Err(AppError::InvalidInventoryState(format!(
                "adjusting item {} by {} would leave {} of {} copies",
                self.id, delta, next, self.total_copies
            )));
        }
        Ok(next)
    }
}

/// Validate an administrative counter reset before it is applied
pub fn validate_counts(total: i32, available: i32) -> AppResult<()> {
    if total < 0 || available < 0 || available > total {
        return Err(AppError::InvalidInventoryState(format!(
            "counts must satisfy 0 <= available <= total, got {}/{}",
            available, total
        )));
    }
    Ok(())
}

/// Create item request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateItem {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub category: String,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    pub language: Option<String>,
    pub pages: Option<i32>,
    pub description: Option<String>,
    pub total_copies: i32,
    /// Defaults to `total_copies` when absent
    pub available_copies: Option<i32>,
    pub status: Option<ItemStatus>,
}

/// Update item request (metadata only; counters go through the inventory endpoints)
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateItem {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    pub language: Option<String>,
    pub pages: Option<i32>,
    pub description: Option<String>,
    pub status: Option<ItemStatus>,
}

/// Catalog listing filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ItemQuery {
    /// Substring match against title, author or ISBN
    pub search: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
    /// Only items with at least one available copy
    pub available_only: Option<bool>,
}
