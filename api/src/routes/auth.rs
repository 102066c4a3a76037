//! Authentication endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use platform_tenant::TenantStatus;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};
use crate::middleware::{AuthClaims, TenantContext};
use crate::models::{ApiResponse, ErrorResponse};
use crate::services::password::{dummy_hash, verify_password_async};
use crate::services::TokenPair;
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh", post(refresh))
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: pair.token_type,
            expires_in: pair.expires_in,
        }
    }
}

const BAD_CREDENTIALS: &str = "invalid email or password";

/// Exchange credentials for a token pair
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    params(("X-Tenant-Id" = String, Header, description = "Tenant ID or slug")),
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Tokens issued", body = TokenResponse),
        (status = 401, description = "Bad credentials", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<ApiState>>,
    TenantContext(tenant): TenantContext,
    Json(input): Json<LoginRequest>,
) -> ApiResult<TokenResponse> {
    let user = state.users.find_by_email(&tenant.id, &input.email);

    // Unknown emails still pay for a verification
    let hash = user
        .as_ref()
        .map_or_else(|| dummy_hash().to_string(), |u| u.password_hash.clone());
    let verified = verify_password_async(input.password, hash).await;

    let user = match user {
        Some(user) if verified => user,
        Some(user) => {
            tracing::warn!(tenant_id = %tenant.id, user_id = %user.id, "login failed");
            return Err(ApiError::Unauthorized(BAD_CREDENTIALS.into()));
        }
        None => return Err(ApiError::Unauthorized(BAD_CREDENTIALS.into())),
    };
    if !user.is_active {
        return Err(ApiError::Unauthorized("user is inactive".into()));
    }

    let user = state.users.record_login(&tenant.id, &user.id)?;
    let pair = state.tokens.issue_pair(&user)?;
    tracing::info!(tenant_id = %tenant.id, user_id = %user.id, "user logged in");
    Ok(Json(ApiResponse::success(pair.into())))
}

/// Revoke the caller's access token
#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Token revoked"),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn logout(State(state): State<Arc<ApiState>>, AuthClaims(claims): AuthClaims) -> Result<StatusCode, ApiError> {
    state.tokens.revoke(&claims)?;
    tracing::info!(user_id = %claims.sub, "user logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// Rotate a refresh token into a new pair
#[utoipa::path(
    post,
    path = "/v1/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Tokens rotated", body = TokenResponse),
        (status = 401, description = "Invalid, revoked or non-refresh token", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn refresh(State(state): State<Arc<ApiState>>, Json(input): Json<RefreshRequest>) -> ApiResult<TokenResponse> {
    let claims = state.tokens.rotate(&input.refresh_token)?;

    let tenant_active = state
        .tenants
        .get(&claims.tenant_id)
        .is_some_and(|t| t.status == TenantStatus::Active);
    if !tenant_active {
        return Err(ApiError::Unauthorized("tenant is not active".into()));
    }

    let user = state
        .users
        .get(&claims.tenant_id, &claims.sub)
        .map_err(|_| ApiError::Unauthorized("user no longer exists".into()))?;
    if !user.is_active {
        return Err(ApiError::Unauthorized("user is inactive".into()));
    }

    let pair = state.tokens.issue_pair(&user)?;
    Ok(Json(ApiResponse::success(pair.into())))
}
