use axum::extract::State;

use crate::app::AppState;
use crate::audit::{AuditEvent, Change};
use crate::auth::{allowed_roles, authorize, Action, Principal, Resource};
use crate::database::{Group, GroupInput};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, ClientOrigin};

fn not_found(id: i64) -> ApiError {
    ApiError::not_found(format!("Group {} not found", id))
}

/// GET /api/groups
pub async fn list(State(state): State<AppState>, principal: Principal) -> ApiResult<Vec<Group>> {
    authorize(&principal, allowed_roles(Resource::Groups, Action::Read))?;

    let groups = state.store.list_groups().await?;
    Ok(ApiResponse::success(groups))
}

/// GET /api/groups/:id
pub async fn show(
    State(state): State<AppState>,
    principal: Principal,
    id: Result<ApiPath<i64>, ApiError>,
) -> ApiResult<Group> {
    authorize(&principal, allowed_roles(Resource::Groups, Action::Read))?;
    let ApiPath(id) = id?;

    let group = state.store.get_group(id).await?.ok_or_else(|| not_found(id))?;
    Ok(ApiResponse::success(group))
}

/// POST /api/groups
pub async fn create(
    State(state): State<AppState>,
    principal: Principal,
    origin: ClientOrigin,
    body: Result<ApiJson<GroupInput>, ApiError>,
) -> ApiResult<Group> {
    authorize(&principal, allowed_roles(Resource::Groups, Action::Create))?;

    let ApiJson(input) = body?;
    let input = input.normalize();
    input.validate()?;

    let group = state.store.create_group(&input).await?;
    tracing::info!("{} added group {} ({})", principal.subject, group.id, group.registration_number);

    state
        .audit
        .record(AuditEvent::group(Change::Added, &group), origin.as_str())
        .await;
    Ok(ApiResponse::created(group))
}

/// PUT /api/groups/:id
pub async fn update(
    State(state): State<AppState>,
    principal: Principal,
    origin: ClientOrigin,
    id: Result<ApiPath<i64>, ApiError>,
    body: Result<ApiJson<GroupInput>, ApiError>,
) -> ApiResult<Group> {
    authorize(&principal, allowed_roles(Resource::Groups, Action::Update))?;
    let ApiPath(id) = id?;

    let ApiJson(input) = body?;
    let input = input.normalize();
    input.validate()?;

    let group = state
        .store
        .update_group(id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!("{} updated group {}", principal.subject, group.id);

    state
        .audit
        .record(AuditEvent::group(Change::Updated, &group), origin.as_str())
        .await;
    Ok(ApiResponse::success(group))
}

/// DELETE /api/groups/:id
pub async fn delete(
    State(state): State<AppState>,
    principal: Principal,
    origin: ClientOrigin,
    id: Result<ApiPath<i64>, ApiError>,
) -> ApiResult<Group> {
    authorize(&principal, allowed_roles(Resource::Groups, Action::Delete))?;
    let ApiPath(id) = id?;

    let group = state.store.delete_group(id).await?.ok_or_else(|| not_found(id))?;
    tracing::info!("{} deleted group {}", principal.subject, group.id);

    state
        .audit
        .record(AuditEvent::group(Change::Deleted, &group), origin.as_str())
        .await;
    Ok(ApiResponse::success(group))
}
