use axum::extract::State;

use crate::app::AppState;
use crate::audit::{AuditEvent, Change};
use crate::auth::{allowed_roles, authorize, Action, Principal, Resource};
use crate::database::{Person, PersonInput};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, ClientOrigin};

fn not_found(id: i64) -> ApiError {
    ApiError::not_found(format!("Person {} not found", id))
}

/// GET /api/persons
pub async fn list(State(state): State<AppState>, principal: Principal) -> ApiResult<Vec<Person>> {
    authorize(&principal, allowed_roles(Resource::Persons, Action::Read))?;

    let persons = state.store.list_persons().await?;
    Ok(ApiResponse::success(persons))
}

/// GET /api/persons/:id
pub async fn show(
    State(state): State<AppState>,
    principal: Principal,
    id: Result<ApiPath<i64>, ApiError>,
) -> ApiResult<Person> {
    authorize(&principal, allowed_roles(Resource::Persons, Action::Read))?;
    let ApiPath(id) = id?;

    let person = state.store.get_person(id).await?.ok_or_else(|| not_found(id))?;
    Ok(ApiResponse::success(person))
}

/// POST /api/persons
pub async fn create(
    State(state): State<AppState>,
    principal: Principal,
    origin: ClientOrigin,
    body: Result<ApiJson<PersonInput>, ApiError>,
) -> ApiResult<Person> {
    authorize(&principal, allowed_roles(Resource::Persons, Action::Create))?;

    let ApiJson(input) = body?;
    let input = input.normalize();
    input.validate()?;

    let person = state.store.create_person(&input).await?;
    tracing::info!("{} added person {} ({})", principal.subject, person.id, person.national_id);

    state
        .audit
        .record(AuditEvent::person(Change::Added, &person), origin.as_str())
        .await;
    Ok(ApiResponse::created(person))
}

/// PUT /api/persons/:id
pub async fn update(
    State(state): State<AppState>,
    principal: Principal,
    origin: ClientOrigin,
    id: Result<ApiPath<i64>, ApiError>,
    body: Result<ApiJson<PersonInput>, ApiError>,
) -> ApiResult<Person> {
    authorize(&principal, allowed_roles(Resource::Persons, Action::Update))?;
    let ApiPath(id) = id?;

    let ApiJson(input) = body?;
    let input = input.normalize();
    input.validate()?;

    let person = state
        .store
        .update_person(id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!("{} updated person {}", principal.subject, person.id);

    state
        .audit
        .record(AuditEvent::person(Change::Updated, &person), origin.as_str())
        .await;
    Ok(ApiResponse::success(person))
}

/// DELETE /api/persons/:id
pub async fn delete(
    State(state): State<AppState>,
    principal: Principal,
    origin: ClientOrigin,
    id: Result<ApiPath<i64>, ApiError>,
) -> ApiResult<Person> {
    authorize(&principal, allowed_roles(Resource::Persons, Action::Delete))?;
    let ApiPath(id) = id?;

    let person = state.store.delete_person(id).await?.ok_or_else(|| not_found(id))?;
    tracing::info!("{} deleted person {}", principal.subject, person.id);

    state
        .audit
        .record(AuditEvent::person(Change::Deleted, &person), origin.as_str())
        .await;
    Ok(ApiResponse::success(person))
}
