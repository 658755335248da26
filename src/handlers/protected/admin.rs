use axum::extract::{Query, State};
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::{allowed_roles, authorize, Action, Principal, Resource};
use crate::database::AuditEntry;
use crate::middleware::{ApiResponse, ApiResult};

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    pub limit: Option<i64>,
}

fn effective_limit(requested: Option<i64>) -> i64 {
    requested.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// GET /api/admin/audit-logs?limit=N - newest entries first
pub async fn audit_logs(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<AuditLogQuery>,
) -> ApiResult<Vec<AuditEntry>> {
    authorize(&principal, allowed_roles(Resource::AuditLog, Action::Read))?;

    let entries = state.audit.recent(effective_limit(query.limit)).await?;
    Ok(ApiResponse::success(entries))
}
