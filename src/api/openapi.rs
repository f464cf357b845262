//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{analytics, borrowers, health, items, loans};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Circulon API",
        version = "0.3.0",
        description = "Lending Ledger & Inventory Consistency REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Items
        items::list_items,
        items::get_item,
        items::create_item,
        items::update_item,
        items::delete_item,
        items::set_inventory,
        items::adjust_availability,
        items::categories,
        items::low_stock,
        items::out_of_stock,
        // Borrowers
        borrowers::list_borrowers,
        borrowers::create_borrower,
        borrowers::get_borrower,
        borrowers::borrower_loans,
        borrowers::borrower_active_loans,
        // Loans
        loans::borrow,
        loans::return_item,
        loans::list_loans,
        loans::open_loan_for_pair,
        loans::overdue_loans,
        loans::loans_in_range,
        loans::get_loan,
        loans::update_loan,
        loans::cancel_loan,
        loans::extend_loan,
        loans::mark_overdue,
        loans::mark_overdue_sweep,
        loans::item_loans,
        // Analytics
        analytics::dashboard,
    ),
    components(
        schemas(
            // Items
            crate::models::item::Item,
            crate::models::item::ItemStatus,
            crate::models::item::CreateItem,
            crate::models::item::UpdateItem,
            items::SetInventoryRequest,
            items::AdjustAvailabilityRequest,
            // Borrowers
            crate::models::borrower::Borrower,
            crate::models::borrower::BorrowerRole,
            crate::models::borrower::CreateBorrower,
            // Loans
            crate::models::loan::Loan,
            crate::models::loan::LoanKind,
            crate::models::loan::LoanStatus,
            crate::models::loan::UpdateLoan,
            loans::BorrowRequest,
            loans::ReturnRequest,
            loans::ExtendRequest,
            loans::SweepResponse,
            loans::ListLoansQuery,
            loans::PairQuery,
            // Analytics
            crate::services::analytics::Dashboard,
            crate::services::analytics::BorrowerAnalytics,
            crate::services::analytics::BorrowerActivity,
            crate::services::analytics::ItemAnalytics,
            crate::services::analytics::PopularItem,
            crate::services::analytics::LoanAnalytics,
            crate::services::analytics::DailyActivity,
            crate::services::analytics::InventoryAnalytics,
            crate::services::analytics::SystemHealth,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "items", description = "Catalog item management"),
        (name = "borrowers", description = "Borrower registry"),
        (name = "loans", description = "Loan ledger and lending operations"),
        (name = "analytics", description = "Dashboard analytics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
