use axum::{extract::State, routing::get, Extension, Json, Router};

use voyago_core::repository::DashboardSummary;

use crate::middleware::auth::AdminClaims;
use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/admin/dashboard", get(dashboard))
}

/// Booking counts by status plus revenue totals for the admin console.
async fn dashboard(
    State(state): State<AppState>,
    Extension(_claims): Extension<AdminClaims>,
) -> Result<Json<DashboardSummary>, AppError> {
    let summary = state.bookings.dashboard_summary().await?;
    Ok(Json(summary))
}
