//! Tenant management endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use platform_tenant::{TenantError, TenantStatus};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::{models::*, ApiState};

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", get(list_tenants).post(create_tenant))
        .route("/:id", get(get_tenant).patch(update_tenant).delete(delete_tenant))
        .route("/:id/activate", post(activate_tenant))
        .route("/:id/suspend", post(suspend_tenant))
        .route("/:id/reactivate", post(reactivate_tenant))
        .route("/:id/archive", post(archive_tenant))
        .route("/:id/tier", put(update_tier))
        .route("/:id/features/:feature", put(add_feature).delete(remove_feature))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    page: Option<u32>,
    per_page: Option<u32>,
    status: Option<String>,
}

/// List tenants
#[utoipa::path(
    get,
    path = "/v1/tenants",
    params(
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Items per page (max 100)"),
        ("status" = Option<String>, Query, description = "Filter by status")
    ),
    responses(
        (status = 200, description = "Page of tenants", body = [TenantResponse]),
        (status = 400, description = "Unknown status filter", body = ErrorResponse)
    ),
    tag = "tenants"
)]
pub async fn list_tenants(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<ListParams>,
) -> ApiResult<PaginatedResponse<TenantResponse>> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<TenantStatus>)
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let tenants: Vec<TenantResponse> = state
        .tenants
        .list()
        .into_iter()
        .filter(|t| status.map_or(true, |s| t.status == s))
        .map(TenantResponse::from)
        .collect();

    Ok(Json(ApiResponse::success(PaginatedResponse::paginate(
        tenants,
        params.page.unwrap_or(1),
        params.per_page.unwrap_or(DEFAULT_PER_PAGE),
    ))))
}

/// Create a tenant
#[utoipa::path(
    post,
    path = "/v1/tenants",
    request_body = TenantCreate,
    responses(
        (status = 201, description = "Tenant created", body = TenantResponse),
        (status = 409, description = "Slug taken or tenant limit reached", body = ErrorResponse),
        (status = 422, description = "Invalid input", body = ErrorResponse)
    ),
    tag = "tenants"
)]
pub async fn create_tenant(
    State(state): State<Arc<ApiState>>,
    Json(input): Json<TenantCreate>,
) -> Result<(StatusCode, Json<ApiResponse<TenantResponse>>), ApiError> {
    if input.name.trim().is_empty() {
        return Err(ApiError::Validation("name must not be blank".into()));
    }
    if !is_plausible_email(&input.primary_contact_email) {
        return Err(ApiError::Validation("primary_contact_email is not a valid email".into()));
    }

    let tenant = state.tenants.create(input.into())?;
    tracing::info!(tenant_id = %tenant.id, slug = %tenant.slug, "tenant created");

    Ok((StatusCode::CREATED, Json(ApiResponse::success(tenant.into()))))
}

/// Get tenant by ID
#[utoipa::path(
    get,
    path = "/v1/tenants/{id}",
    params(("id" = Uuid, Path, description = "Tenant ID")),
    responses(
        (status = 200, description = "Tenant details", body = TenantResponse),
        (status = 404, description = "Tenant not found", body = ErrorResponse)
    ),
    tag = "tenants"
)]
pub async fn get_tenant(State(state): State<Arc<ApiState>>, Path(id): Path<Uuid>) -> ApiResult<TenantResponse> {
    let tenant = state
        .tenants
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(format!("tenant not found: {id}")))?;
    Ok(Json(ApiResponse::success(tenant.into())))
}

/// Update tenant profile
#[utoipa::path(
    patch,
    path = "/v1/tenants/{id}",
    params(("id" = Uuid, Path, description = "Tenant ID")),
    request_body = TenantPatch,
    responses(
        (status = 200, description = "Tenant updated", body = TenantResponse),
        (status = 409, description = "Tenant is archived", body = ErrorResponse)
    ),
    tag = "tenants"
)]
pub async fn update_tenant(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Json(patch): Json<TenantPatch>,
) -> ApiResult<TenantResponse> {
    if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::Validation("name must not be blank".into()));
    }
    if patch
        .primary_contact_email
        .as_deref()
        .is_some_and(|e| !is_plausible_email(e))
    {
        return Err(ApiError::Validation("primary_contact_email is not a valid email".into()));
    }

    let tenant = state
        .tenants
        .apply(&id, |lifecycle, tenant| lifecycle.update_profile(tenant, patch.into()))?;
    Ok(Json(ApiResponse::success(tenant.into())))
}

/// Archive a tenant (soft delete)
#[utoipa::path(
    delete,
    path = "/v1/tenants/{id}",
    params(("id" = Uuid, Path, description = "Tenant ID")),
    responses(
        (status = 204, description = "Tenant archived"),
        (status = 409, description = "Tenant already archived", body = ErrorResponse)
    ),
    tag = "tenants"
)]
pub async fn delete_tenant(State(state): State<Arc<ApiState>>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    state.tenants.apply(&id, |lifecycle, tenant| lifecycle.archive(tenant))?;
    tracing::info!(tenant_id = %id, "tenant archived");
    Ok(StatusCode::NO_CONTENT)
}

/// Activate a pending tenant
#[utoipa::path(
    post,
    path = "/v1/tenants/{id}/activate",
    params(("id" = Uuid, Path, description = "Tenant ID")),
    responses(
        (status = 200, description = "Tenant activated", body = TenantResponse),
        (status = 409, description = "Tenant is not pending", body = ErrorResponse)
    ),
    tag = "tenants"
)]
pub async fn activate_tenant(State(state): State<Arc<ApiState>>, Path(id): Path<Uuid>) -> ApiResult<TenantResponse> {
    let tenant = state.tenants.apply(&id, |lifecycle, tenant| lifecycle.activate(tenant))?;
    tracing::info!(tenant_id = %id, "tenant activated");
    Ok(Json(ApiResponse::success(tenant.into())))
}

/// Suspend an active tenant
#[utoipa::path(
    post,
    path = "/v1/tenants/{id}/suspend",
    params(("id" = Uuid, Path, description = "Tenant ID")),
    request_body = SuspendRequest,
    responses(
        (status = 200, description = "Tenant suspended", body = TenantResponse),
        (status = 409, description = "Tenant is not active", body = ErrorResponse)
    ),
    tag = "tenants"
)]
pub async fn suspend_tenant(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    body: Option<Json<SuspendRequest>>,
) -> ApiResult<TenantResponse> {
    let reason = body.and_then(|Json(req)| req.reason);
    let tenant = state
        .tenants
        .apply(&id, |lifecycle, tenant| lifecycle.suspend(tenant, reason))?;
    tracing::warn!(tenant_id = %id, reason = ?tenant.suspension_reason, "tenant suspended");
    Ok(Json(ApiResponse::success(tenant.into())))
}

/// Reactivate a suspended tenant
#[utoipa::path(
    post,
    path = "/v1/tenants/{id}/reactivate",
    params(("id" = Uuid, Path, description = "Tenant ID")),
    responses(
        (status = 200, description = "Tenant reactivated", body = TenantResponse),
        (status = 409, description = "Tenant is not suspended", body = ErrorResponse)
    ),
    tag = "tenants"
)]
pub async fn reactivate_tenant(State(state): State<Arc<ApiState>>, Path(id): Path<Uuid>) -> ApiResult<TenantResponse> {
    let tenant = state.tenants.apply(&id, |lifecycle, tenant| lifecycle.reactivate(tenant))?;
    tracing::info!(tenant_id = %id, "tenant reactivated");
    Ok(Json(ApiResponse::success(tenant.into())))
}

/// Archive a tenant
#[utoipa::path(
    post,
    path = "/v1/tenants/{id}/archive",
    params(("id" = Uuid, Path, description = "Tenant ID")),
    responses(
        (status = 200, description = "Tenant archived", body = TenantResponse),
        (status = 409, description = "Tenant already archived", body = ErrorResponse)
    ),
    tag = "tenants"
)]
pub async fn archive_tenant(State(state): State<Arc<ApiState>>, Path(id): Path<Uuid>) -> ApiResult<TenantResponse> {
    let tenant = state.tenants.apply(&id, |lifecycle, tenant| lifecycle.archive(tenant))?;
    tracing::info!(tenant_id = %id, "tenant archived");
    Ok(Json(ApiResponse::success(tenant.into())))
}

/// Change subscription tier
#[utoipa::path(
    put,
    path = "/v1/tenants/{id}/tier",
    params(("id" = Uuid, Path, description = "Tenant ID")),
    request_body = TierUpdate,
    responses(
        (status = 200, description = "Tier changed", body = TenantResponse),
        (status = 409, description = "Tenant is not active", body = ErrorResponse)
    ),
    tag = "tenants"
)]
pub async fn update_tier(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Json(input): Json<TierUpdate>,
) -> ApiResult<TenantResponse> {
    let tenant = state
        .tenants
        .apply(&id, |lifecycle, tenant| lifecycle.update_tier(tenant, input.tier))?;
    tracing::info!(tenant_id = %id, tier = %tenant.tier, "tenant tier changed");
    Ok(Json(ApiResponse::success(tenant.into())))
}

/// Enable a feature flag
#[utoipa::path(
    put,
    path = "/v1/tenants/{id}/features/{feature}",
    params(
        ("id" = Uuid, Path, description = "Tenant ID"),
        ("feature" = String, Path, description = "Feature flag")
    ),
    responses((status = 200, description = "Feature enabled", body = TenantResponse)),
    tag = "tenants"
)]
pub async fn add_feature(
    State(state): State<Arc<ApiState>>,
    Path((id, feature)): Path<(Uuid, String)>,
) -> ApiResult<TenantResponse> {
    let tenant = state
        .tenants
        .apply(&id, |lifecycle, tenant| Ok::<_, TenantError>(lifecycle.add_feature(tenant, &feature)))?;
    Ok(Json(ApiResponse::success(tenant.into())))
}

/// Disable a feature flag
#[utoipa::path(
    delete,
    path = "/v1/tenants/{id}/features/{feature}",
    params(
        ("id" = Uuid, Path, description = "Tenant ID"),
        ("feature" = String, Path, description = "Feature flag")
    ),
    responses((status = 200, description = "Feature disabled", body = TenantResponse)),
    tag = "tenants"
)]
pub async fn remove_feature(
    State(state): State<Arc<ApiState>>,
    Path((id, feature)): Path<(Uuid, String)>,
) -> ApiResult<TenantResponse> {
    let tenant = state
        .tenants
        .apply(&id, |lifecycle, tenant| Ok::<_, TenantError>(lifecycle.remove_feature(tenant, &feature)))?;
    Ok(Json(ApiResponse::success(tenant.into())))
}

/// Minimal shape check: `local@domain` with a dot in the domain
pub(crate) fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shape() {
        assert!(is_plausible_email("ops@acme.io"));
        assert!(!is_plausible_email("ops@acme"));
        assert!(!is_plausible_email("@acme.io"));
        assert!(!is_plausible_email("acme.io"));
        assert!(!is_plausible_email("ops@acme.io."));
    }
}
