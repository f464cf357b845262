//! Circulon Lending Ledger & Inventory Server
//!
//! Tracks the physical inventory of a catalog of lendable items and the
//! ledger of borrow/return events against it, keeping per-item copy counts
//! consistent under concurrent lending operations and deriving dashboard
//! analytics from consistent snapshots of the two stores.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
