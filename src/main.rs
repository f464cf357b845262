//! Circulon Server - Lending Ledger & Inventory Consistency Core
//!
//! REST API server over the catalog item store, the loan ledger, the
//! lending policy engine and the analytics aggregator.

use axum::{
    routing::{get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use circulon_server::{api, config::AppConfig, repository::Repository, services::Services, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("circulon_server={},tower_http=debug", config.logging.level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Circulon Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(repository, config.lending.clone());

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Items (catalog)
        .route("/items", get(api::items::list_items))
        .route("/items", post(api::items::create_item))
        .route("/items/categories", get(api::items::categories))
        .route("/items/low-stock", get(api::items::low_stock))
        .route("/items/out-of-stock", get(api::items::out_of_stock))
        .route("/items/:id", get(api::items::get_item))
        .route("/items/:id", put(api::items::update_item))
        .route("/items/:id", axum::routing::delete(api::items::delete_item))
        .route("/items/:id/inventory", put(api::items::set_inventory))
        .route("/items/:id/availability", put(api::items::adjust_availability))
        .route("/items/:id/loans", get(api::loans::item_loans))
        // Borrowers
        .route("/borrowers", get(api::borrowers::list_borrowers))
        .route("/borrowers", post(api::borrowers::create_borrower))
        .route("/borrowers/:id", get(api::borrowers::get_borrower))
        .route("/borrowers/:id/loans", get(api::borrowers::borrower_loans))
        .route(
            "/borrowers/:id/loans/active",
            get(api::borrowers::borrower_active_loans),
        )
        // Loans
        .route("/loans", get(api::loans::list_loans))
        .route("/loans/borrow", post(api::loans::borrow))
        .route("/loans/return", post(api::loans::return_item))
        .route("/loans/overdue", get(api::loans::overdue_loans))
        .route("/loans/active-pair", get(api::loans::open_loan_for_pair))
        .route("/loans/date-range", get(api::loans::loans_in_range))
        .route("/loans/mark-overdue", post(api::loans::mark_overdue_sweep))
        .route("/loans/:id", get(api::loans::get_loan))
        .route("/loans/:id", put(api::loans::update_loan))
        .route("/loans/:id/cancel", put(api::loans::cancel_loan))
        .route("/loans/:id/extend", put(api::loans::extend_loan))
        .route("/loans/:id/mark-overdue", put(api::loans::mark_overdue))
        // Analytics
        .route("/analytics/dashboard", get(api::analytics::dashboard))
        .with_state(state.clone());

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
