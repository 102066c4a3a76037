//! LLM provider configuration endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};
use crate::middleware::TenantContext;
use crate::models::{ApiResponse, ErrorResponse};
use crate::services::providers::{LlmProvider, ProviderCheck, ProviderConfig, UnknownProvider};
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", get(list_providers))
        .route("/:provider", put(configure_provider).delete(remove_provider))
        .route("/:provider/test", post(test_provider))
}

/// Provider as seen by API clients. The key itself is never returned.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProviderSummary {
    pub name: String,
    pub enabled: bool,
    pub configured: bool,
    pub api_key_hint: Option<String>,
    pub default_model: Option<String>,
    pub base_url: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProviderSummary {
    fn new(provider: LlmProvider, config: Option<ProviderConfig>) -> Self {
        match config {
            Some(config) => Self {
                name: provider.to_string(),
                enabled: config.enabled,
                configured: true,
                api_key_hint: Some(config.masked_key()),
                default_model: config.default_model,
                base_url: config.base_url,
                updated_at: Some(config.updated_at),
            },
            None => Self {
                name: provider.to_string(),
                enabled: false,
                configured: false,
                api_key_hint: None,
                default_model: None,
                base_url: None,
                updated_at: None,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProviderList {
    pub providers: Vec<ProviderSummary>,
}

/// Provider configuration request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProviderConfigure {
    pub api_key: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub default_model: Option<String>,
    pub base_url: Option<String>,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProviderTestResult {
    pub provider: String,
    #[schema(value_type = String, example = "ok")]
    pub status: ProviderCheck,
    pub message: String,
}

fn parse_provider(name: &str) -> Result<LlmProvider, ApiError> {
    name.parse().map_err(|e: UnknownProvider| ApiError::NotFound(e.to_string()))
}

/// List known providers and their configuration state
#[utoipa::path(
    get,
    path = "/v1/providers",
    params(("X-Tenant-Id" = String, Header, description = "Tenant ID or slug")),
    responses((status = 200, description = "Providers", body = ProviderList)),
    tag = "providers"
)]
pub async fn list_providers(State(state): State<Arc<ApiState>>, TenantContext(tenant): TenantContext) -> ApiResult<ProviderList> {
    let providers = LlmProvider::ALL
        .into_iter()
        .map(|p| ProviderSummary::new(p, state.providers.get(tenant.id, p)))
        .collect();
    Ok(Json(ApiResponse::success(ProviderList { providers })))
}

/// Configure a provider
#[utoipa::path(
    put,
    path = "/v1/providers/{provider}",
    params(
        ("X-Tenant-Id" = String, Header, description = "Tenant ID or slug"),
        ("provider" = String, Path, description = "openai, anthropic, google or groq")
    ),
    request_body = ProviderConfigure,
    responses(
        (status = 200, description = "Provider configured", body = ProviderSummary),
        (status = 404, description = "Unknown provider", body = ErrorResponse),
        (status = 422, description = "Invalid input", body = ErrorResponse)
    ),
    tag = "providers"
)]
pub async fn configure_provider(
    State(state): State<Arc<ApiState>>,
    TenantContext(tenant): TenantContext,
    Path(provider): Path<String>,
    Json(input): Json<ProviderConfigure>,
) -> ApiResult<ProviderSummary> {
    let provider = parse_provider(&provider)?;
    if input.api_key.trim().is_empty() {
        return Err(ApiError::Validation("api_key must not be blank".into()));
    }

    let config = state.providers.upsert(
        tenant.id,
        ProviderConfig {
            provider,
            api_key: input.api_key,
            enabled: input.enabled,
            default_model: input.default_model,
            base_url: input.base_url,
            updated_at: Utc::now(),
        },
    );
    Ok(Json(ApiResponse::success(ProviderSummary::new(provider, Some(config)))))
}

/// Remove a provider configuration
#[utoipa::path(
    delete,
    path = "/v1/providers/{provider}",
    params(
        ("X-Tenant-Id" = String, Header, description = "Tenant ID or slug"),
        ("provider" = String, Path, description = "Provider name")
    ),
    responses(
        (status = 204, description = "Configuration removed"),
        (status = 404, description = "Unknown or unconfigured provider", body = ErrorResponse)
    ),
    tag = "providers"
)]
pub async fn remove_provider(
    State(state): State<Arc<ApiState>>,
    TenantContext(tenant): TenantContext,
    Path(provider): Path<String>,
) -> Result<StatusCode, ApiError> {
    let provider = parse_provider(&provider)?;
    if !state.providers.remove(tenant.id, provider) {
        return Err(ApiError::NotFound(format!("{provider} is not configured")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Validate the stored configuration
#[utoipa::path(
    post,
    path = "/v1/providers/{provider}/test",
    params(
        ("X-Tenant-Id" = String, Header, description = "Tenant ID or slug"),
        ("provider" = String, Path, description = "Provider name")
    ),
    responses(
        (status = 200, description = "Check result", body = ProviderTestResult),
        (status = 404, description = "Unknown provider", body = ErrorResponse)
    ),
    tag = "providers"
)]
pub async fn test_provider(
    State(state): State<Arc<ApiState>>,
    TenantContext(tenant): TenantContext,
    Path(provider): Path<String>,
) -> ApiResult<ProviderTestResult> {
    let provider = parse_provider(&provider)?;
    let status = state.providers.check(tenant.id, provider);
    let message = match status {
        ProviderCheck::Ok => format!("{provider} configuration is complete"),
        ProviderCheck::NotConfigured => format!("{provider} has no api key configured"),
        ProviderCheck::Disabled => format!("{provider} is configured but disabled"),
    };

    Ok(Json(ApiResponse::success(ProviderTestResult {
        provider: provider.to_string(),
        status,
        message,
    })))
}
