use axum::extract::State;

use crate::app::AppState;
use crate::audit::{AuditEvent, Change};
use crate::auth::{allowed_roles, authorize, Action, Principal, Resource};
use crate::database::{Loan, LoanInput};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, ClientOrigin};

fn not_found(id: i64) -> ApiError {
    ApiError::not_found(format!("Loan {} not found", id))
}

/// GET /api/loans
pub async fn list(State(state): State<AppState>, principal: Principal) -> ApiResult<Vec<Loan>> {
    authorize(&principal, allowed_roles(Resource::Loans, Action::Read))?;

    let loans = state.store.list_loans().await?;
    Ok(ApiResponse::success(loans))
}

/// GET /api/loans/:id
pub async fn show(
    State(state): State<AppState>,
    principal: Principal,
    id: Result<ApiPath<i64>, ApiError>,
) -> ApiResult<Loan> {
    authorize(&principal, allowed_roles(Resource::Loans, Action::Read))?;
    let ApiPath(id) = id?;

    let loan = state.store.get_loan(id).await?.ok_or_else(|| not_found(id))?;
    Ok(ApiResponse::success(loan))
}

/// POST /api/loans
pub async fn create(
    State(state): State<AppState>,
    principal: Principal,
    origin: ClientOrigin,
    body: Result<ApiJson<LoanInput>, ApiError>,
) -> ApiResult<Loan> {
    authorize(&principal, allowed_roles(Resource::Loans, Action::Create))?;

    let ApiJson(input) = body?;
    let input = input.normalize();
    input.validate()?;

    let loan = state.store.create_loan(&input).await?;
    tracing::info!(
        "{} added {} {} ({} for {})",
        principal.subject,
        loan.kind,
        loan.id,
        loan.reference,
        loan.amount
    );

    state
        .audit
        .record(AuditEvent::loan(Change::Added, &loan), origin.as_str())
        .await;
    Ok(ApiResponse::created(loan))
}

/// PUT /api/loans/:id
pub async fn update(
    State(state): State<AppState>,
    principal: Principal,
    origin: ClientOrigin,
    id: Result<ApiPath<i64>, ApiError>,
    body: Result<ApiJson<LoanInput>, ApiError>,
) -> ApiResult<Loan> {
    authorize(&principal, allowed_roles(Resource::Loans, Action::Update))?;
    let ApiPath(id) = id?;

    let ApiJson(input) = body?;
    let input = input.normalize();
    input.validate()?;

    let loan = state
        .store
        .update_loan(id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!("{} updated loan {}", principal.subject, loan.id);

    state
        .audit
        .record(AuditEvent::loan(Change::Updated, &loan), origin.as_str())
        .await;
    Ok(ApiResponse::success(loan))
}

/// DELETE /api/loans/:id
pub async fn delete(
    State(state): State<AppState>,
    principal: Principal,
    origin: ClientOrigin,
    id: Result<ApiPath<i64>, ApiError>,
) -> ApiResult<Loan> {
    authorize(&principal, allowed_roles(Resource::Loans, Action::Delete))?;
    let ApiPath(id) = id?;

    let loan = state.store.delete_loan(id).await?.ok_or_else(|| not_found(id))?;
    tracing::info!("{} deleted loan {}", principal.subject, loan.id);

    state
        .audit
        .record(AuditEvent::loan(Change::Deleted, &loan), origin.as_str())
        .await;
    Ok(ApiResponse::success(loan))
}
