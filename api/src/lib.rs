//! Platform API
//!
//! Multi-tenant HTTP service: tenant lifecycle, users, authentication,
//! quotas and LLM provider configuration.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            PLATFORM API                                 │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                        MIDDLEWARE                                │   │
//! │  │  CORS | Gzip | Request Logging | Tracing | Tenant | Metrics      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────┐  │
//! │  │  Health  │  │ Tenants  │  │  Users   │  │  Quotas  │  │Providers │  │
//! │  └──────────┘  └────┬─────┘  └────┬─────┘  └────┬─────┘  └────┬─────┘  │
//! │                     │  /v1 (rate limited, X-Tenant-Id scoped) │        │
//! │  ┌──────────────────▼─────────────▼─────────────▼─────────────▼─────┐  │
//! │  │  Tenant Registry | User Store | Token Service | Usage Meter      │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod settings;

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use platform_tenant::{TenantLifecycle, TenantRegistry};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::rate_limit::{RateLimitConfig, RateLimiter};
use crate::services::{ProviderStore, TokenService, UsageMeter, UserStore};
use crate::settings::{CorsSettings, Settings};

pub use error::{ApiError, ApiResult};
pub use models::*;

/// API state
pub struct ApiState {
    pub settings: Settings,
    pub tenants: TenantRegistry,
    pub users: UserStore,
    pub providers: ProviderStore,
    pub usage: UsageMeter,
    pub tokens: TokenService,
    pub rate_limiter: RateLimiter,
    /// Renders `/metrics` when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl ApiState {
    pub fn new(settings: Settings) -> Self {
        Self::with_lifecycle(settings, TenantLifecycle::new())
    }

    /// State whose tenant timestamps come from `lifecycle`
    pub fn with_lifecycle(settings: Settings, lifecycle: TenantLifecycle) -> Self {
        Self {
            tenants: TenantRegistry::new(lifecycle, settings.tenancy.max_tenants),
            users: UserStore::new(),
            providers: ProviderStore::new(),
            usage: UsageMeter::new(),
            tokens: TokenService::new(&settings.auth),
            rate_limiter: RateLimiter::new(RateLimitConfig::from(&settings.rate_limit)),
            metrics: None,
            settings,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Platform API",
        description = "Multi-tenant platform API - tenants, users, auth, quotas and LLM providers",
        license(name = "Apache-2.0")
    ),
    paths(
        routes::health::health_check,
        routes::health::readiness,
        routes::health::liveness,
        routes::tenants::list_tenants,
        routes::tenants::create_tenant,
        routes::tenants::get_tenant,
        routes::tenants::update_tenant,
        routes::tenants::delete_tenant,
        routes::tenants::activate_tenant,
        routes::tenants::suspend_tenant,
        routes::tenants::reactivate_tenant,
        routes::tenants::archive_tenant,
        routes::tenants::update_tier,
        routes::tenants::add_feature,
        routes::tenants::remove_feature,
        routes::users::list_users,
        routes::users::create_user,
        routes::users::get_user,
        routes::users::update_user,
        routes::users::delete_user,
        routes::auth::login,
        routes::auth::logout,
        routes::auth::refresh,
        routes::quotas::get_quotas,
        routes::quotas::update_quotas,
        routes::quotas::get_usage,
        routes::quotas::check_quota,
        routes::providers::list_providers,
        routes::providers::configure_provider,
        routes::providers::remove_provider,
        routes::providers::test_provider,
    ),
    components(
        schemas(
            ErrorResponse,
            TenantResponse, TierChangeResponse, TenantCreate, TenantPatch, TierUpdate, SuspendRequest,
            UserResponse, UserCreate, UserPatch, UserRole,
            QuotaStatus, QuotaReport, UsageReport, QuotaCheck, QuotaCheckResult,
            routes::health::HealthResponse, routes::health::ProbeResponse,
            routes::auth::LoginRequest, routes::auth::RefreshRequest, routes::auth::TokenResponse,
            routes::providers::ProviderSummary, routes::providers::ProviderList,
            routes::providers::ProviderConfigure, routes::providers::ProviderTestResult
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "tenants", description = "Tenant lifecycle management"),
        (name = "users", description = "User management"),
        (name = "auth", description = "Authentication"),
        (name = "quotas", description = "Quotas and usage"),
        (name = "providers", description = "LLM provider configuration")
    )
)]
pub struct ApiDoc;

/// Build the API router
pub fn build_router(state: ApiState) -> Router {
    let state = Arc::new(state);

    let mut v1 = Router::new()
        .nest("/auth", routes::auth::router())
        .nest("/tenants", routes::tenants::router())
        .nest("/users", routes::users::router())
        .nest("/quotas", routes::quotas::router())
        .nest("/providers", routes::providers::router());
    if state.settings.rate_limit.enabled {
        v1 = v1.route_layer(from_fn_with_state(state.clone(), middleware::rate_limit::rate_limit));
    }

    let mut app = Router::new()
        .route("/metrics", get(render_metrics))
        .nest("/health", routes::health::router())
        .nest("/v1", v1)
        .route_layer(from_fn(middleware::metrics::track_metrics));

    if state.settings.service.debug {
        app = app.merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()));
    }

    app.layer(
        ServiceBuilder::new()
            .layer(cors_layer(&state.settings.cors))
            .layer(CompressionLayer::new())
            .layer(from_fn(middleware::logging::log_requests))
            .layer(TraceLayer::new_for_http())
            .layer(from_fn_with_state(state.clone(), middleware::tenant::extract_tenant)),
    )
    .with_state(state)
}

async fn render_metrics(State(state): State<Arc<ApiState>>) -> Result<String, StatusCode> {
    state
        .metrics
        .as_ref()
        .map(PrometheusHandle::render)
        .ok_or(StatusCode::NOT_FOUND)
}

fn cors_layer(cors: &CorsSettings) -> CorsLayer {
    // Credentialed CORS cannot use wildcards, so "*" mirrors the caller's origin.
    let origin = if cors.origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = cors
            .origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}
