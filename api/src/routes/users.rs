//! User management endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use platform_tenant::QuotaKind;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::tenants::is_plausible_email;
use crate::error::{ApiError, ApiResult};
use crate::middleware::TenantContext;
use crate::services::password::{hash_password_async, PasswordPolicy};
use crate::services::users::NewUser;
use crate::{models::*, ApiState};

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).patch(update_user).delete(delete_user))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    page: Option<u32>,
    per_page: Option<u32>,
    role: Option<UserRole>,
}

/// List users of the calling tenant
#[utoipa::path(
    get,
    path = "/v1/users",
    params(
        ("X-Tenant-Id" = String, Header, description = "Tenant ID or slug"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Items per page"),
        ("role" = Option<String>, Query, description = "Filter by role")
    ),
    responses(
        (status = 200, description = "Page of users", body = [UserResponse])
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<Arc<ApiState>>,
    TenantContext(tenant): TenantContext,
    Query(params): Query<ListParams>,
) -> ApiResult<PaginatedResponse<UserResponse>> {
    let users: Vec<UserResponse> = state
        .users
        .list(&tenant.id)
        .into_iter()
        .filter(|u| params.role.map_or(true, |r| u.role == r))
        .map(UserResponse::from)
        .collect();

    Ok(Json(ApiResponse::success(PaginatedResponse::paginate(
        users,
        params.page.unwrap_or(1),
        params.per_page.unwrap_or(DEFAULT_PER_PAGE),
    ))))
}

/// Create a user
#[utoipa::path(
    post,
    path = "/v1/users",
    params(("X-Tenant-Id" = String, Header, description = "Tenant ID or slug")),
    request_body = UserCreate,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 403, description = "User quota exceeded", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 422, description = "Invalid input", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<Arc<ApiState>>,
    TenantContext(tenant): TenantContext,
    Json(input): Json<UserCreate>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    if !is_plausible_email(&input.email) {
        return Err(ApiError::Validation("email is not a valid email".into()));
    }
    if input.name.trim().is_empty() {
        return Err(ApiError::Validation("name must not be blank".into()));
    }
    PasswordPolicy::from(&state.settings.auth)
        .check(&input.password)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let password_hash = hash_password_async(input.password)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let lifecycle = state.tenants.lifecycle();
    let user = state.users.create(
        tenant.id,
        NewUser {
            email: input.email,
            name: input.name,
            role: input.role,
            password_hash,
        },
        QuotaKind::Users.limit(&tenant),
        |count| lifecycle.is_quota_exceeded(&tenant, QuotaKind::Users.as_str(), count),
    )?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(user.into()))))
}

/// Get user by ID
#[utoipa::path(
    get,
    path = "/v1/users/{id}",
    params(
        ("X-Tenant-Id" = String, Header, description = "Tenant ID or slug"),
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<Arc<ApiState>>,
    TenantContext(tenant): TenantContext,
    Path(id): Path<Uuid>,
) -> ApiResult<UserResponse> {
    let user = state.users.get(&tenant.id, &id)?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// Update user
#[utoipa::path(
    patch,
    path = "/v1/users/{id}",
    params(
        ("X-Tenant-Id" = String, Header, description = "Tenant ID or slug"),
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UserPatch,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<Arc<ApiState>>,
    TenantContext(tenant): TenantContext,
    Path(id): Path<Uuid>,
    Json(patch): Json<UserPatch>,
) -> ApiResult<UserResponse> {
    if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::Validation("name must not be blank".into()));
    }
    let user = state.users.update(&tenant.id, &id, patch)?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// Delete user
#[utoipa::path(
    delete,
    path = "/v1/users/{id}",
    params(
        ("X-Tenant-Id" = String, Header, description = "Tenant ID or slug"),
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<Arc<ApiState>>,
    TenantContext(tenant): TenantContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.users.delete(&tenant.id, &id)?;
    tracing::info!(tenant_id = %tenant.id, user_id = %id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
