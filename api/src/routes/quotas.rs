//! Quota endpoints

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use platform_tenant::{QuotaKind, Tenant, UnknownVariant, UNLIMITED};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::middleware::TenantContext;
use crate::{models::*, ApiState};

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", get(get_quotas).put(update_quotas))
        .route("/usage", get(get_usage))
        .route("/check", post(check_quota))
}

/// Get tenant quotas and usage against them
#[utoipa::path(
    get,
    path = "/v1/quotas",
    params(("X-Tenant-Id" = String, Header, description = "Tenant ID or slug")),
    responses((status = 200, description = "Quota report", body = QuotaReport)),
    tag = "quotas"
)]
pub async fn get_quotas(State(state): State<Arc<ApiState>>, TenantContext(tenant): TenantContext) -> ApiResult<QuotaReport> {
    Ok(Json(ApiResponse::success(quota_report(&state, &tenant))))
}

/// Change tier, which replaces all quotas
#[utoipa::path(
    put,
    path = "/v1/quotas",
    params(("X-Tenant-Id" = String, Header, description = "Tenant ID or slug")),
    request_body = TierUpdate,
    responses((status = 200, description = "Updated quota report", body = QuotaReport)),
    tag = "quotas"
)]
pub async fn update_quotas(
    State(state): State<Arc<ApiState>>,
    TenantContext(tenant): TenantContext,
    Json(input): Json<TierUpdate>,
) -> ApiResult<QuotaReport> {
    let tenant = state
        .tenants
        .apply(&tenant.id, |lifecycle, tenant| lifecycle.update_tier(tenant, input.tier))?;
    tracing::info!(tenant_id = %tenant.id, tier = %tenant.tier, "quotas updated through tier change");
    Ok(Json(ApiResponse::success(quota_report(&state, &tenant))))
}

/// Current usage
#[utoipa::path(
    get,
    path = "/v1/quotas/usage",
    params(("X-Tenant-Id" = String, Header, description = "Tenant ID or slug")),
    responses((status = 200, description = "Usage this month", body = UsageReport)),
    tag = "quotas"
)]
pub async fn get_usage(State(state): State<Arc<ApiState>>, TenantContext(tenant): TenantContext) -> ApiResult<UsageReport> {
    let usage = QuotaKind::ALL
        .into_iter()
        .map(|kind| (kind.as_str().to_string(), current_usage(&state, &tenant, kind)))
        .collect();

    Ok(Json(ApiResponse::success(UsageReport {
        usage,
        period: "current_month".into(),
    })))
}

/// Check a usage figure against one quota
#[utoipa::path(
    post,
    path = "/v1/quotas/check",
    params(("X-Tenant-Id" = String, Header, description = "Tenant ID or slug")),
    request_body = QuotaCheck,
    responses(
        (status = 200, description = "Check result", body = QuotaCheckResult),
        (status = 400, description = "Unknown quota type", body = ErrorResponse)
    ),
    tag = "quotas"
)]
pub async fn check_quota(
    State(state): State<Arc<ApiState>>,
    TenantContext(tenant): TenantContext,
    Json(input): Json<QuotaCheck>,
) -> ApiResult<QuotaCheckResult> {
    let kind: QuotaKind = input
        .quota_type
        .parse()
        .map_err(|e: UnknownVariant| ApiError::BadRequest(e.to_string()))?;

    let exceeded = state
        .tenants
        .lifecycle()
        .is_quota_exceeded(&tenant, kind.as_str(), input.current_usage);

    Ok(Json(ApiResponse::success(QuotaCheckResult {
        quota_type: kind.as_str().to_string(),
        current_usage: input.current_usage,
        limit: kind.limit(&tenant),
        exceeded,
    })))
}

fn current_usage(state: &ApiState, tenant: &Tenant, kind: QuotaKind) -> i64 {
    match kind {
        QuotaKind::Users => state.users.count(&tenant.id) as i64,
        QuotaKind::Requests => state.usage.current_requests(tenant.id),
        QuotaKind::Storage => 0,
    }
}

fn quota_report(state: &ApiState, tenant: &Tenant) -> QuotaReport {
    let lifecycle = state.tenants.lifecycle();
    let quotas: HashMap<String, QuotaStatus> = QuotaKind::ALL
        .into_iter()
        .map(|kind| {
            let used = current_usage(state, tenant, kind);
            let limit = kind.limit(tenant);
            let status = QuotaStatus {
                used,
                limit,
                unlimited: limit == UNLIMITED,
                exceeded: lifecycle.is_kind_exceeded(tenant, kind, used),
            };
            (kind.as_str().to_string(), status)
        })
        .collect();

    QuotaReport {
        tenant_id: tenant.id,
        tier: tenant.tier,
        quotas,
    }
}
