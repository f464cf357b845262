//! Borrower model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Borrower roles, used by analytics grouping only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "borrower_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BorrowerRole {
    Admin,
    Librarian,
    Member,
}

impl BorrowerRole {
    /// All roles, in the order analytics reports them
    pub const ALL: [BorrowerRole; 3] = [
        BorrowerRole::Admin,
        BorrowerRole::Librarian,
        BorrowerRole::Member,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowerRole::Admin => "admin",
            BorrowerRole::Librarian => "librarian",
            BorrowerRole::Member => "member",
        }
    }
}

impl Default for BorrowerRole {
    fn default() -> Self {
        BorrowerRole::Member
    }
}

/// Borrower model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrower {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: BorrowerRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create borrower request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBorrower {
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    /// Defaults to `member`
    pub role: Option<BorrowerRole>,
}
