use axum::extract::State;

use crate::app::AppState;
use crate::auth::{allowed_roles, authorize, Action, Principal, Resource};
use crate::database::DashboardSummary;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/dashboard/summary - headline counts for the landing page
pub async fn summary(State(state): State<AppState>, principal: Principal) -> ApiResult<DashboardSummary> {
    authorize(&principal, allowed_roles(Resource::Dashboard, Action::Read))?;

    let summary = state.store.dashboard_summary().await?;
    Ok(ApiResponse::success(summary))
}
