//! Analytics endpoints

use axum::{extract::State, Json};

use crate::{error::AppResult, services::analytics::Dashboard};

/// Generate the five-section analytics dashboard
#[utoipa::path(
    get,
    path = "/analytics/dashboard",
    tag = "analytics",
    responses(
        (status = 200, description = "Point-in-time dashboard snapshot", body = Dashboard)
    )
)]
pub async fn dashboard(State(state): State<crate::AppState>) -> AppResult<Json<Dashboard>> {
    let dashboard = state.services.analytics.generate_dashboard().await?;
    Ok(Json(dashboard))
}
