mod common;

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use common::tenant_header;
use platform_api::{build_router, ApiState};
use platform_tenant::{NewTenant, Tenant};
use serde_json::Value;

#[tokio::test]
async fn tenant_header_is_echoed() {
    let server = common::server();
    let (name, value) = tenant_header("anything");
    let response = server.get("/health").add_header(name, value).await;
    assert_eq!(response.headers()["x-tenant-id"], "anything");

    let response = server.get("/health").await;
    assert!(!response.headers().contains_key("x-tenant-id"));
}

#[tokio::test]
async fn tenant_resolved_from_subdomain() {
    let server = common::server();
    common::active_tenant(&server, "Subdomain").await;

    let response = server
        .get("/v1/quotas")
        .add_header(header::HOST, HeaderValue::from_static("subdomain.platform.test"))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.headers()["x-tenant-id"], "subdomain");
}

#[tokio::test]
async fn requests_are_metered_per_tenant() {
    let server = common::server();
    let tenant = common::active_tenant(&server, "Metered").await;

    for _ in 0..3 {
        let (name, value) = tenant_header(&tenant);
        server.get("/health").add_header(name, value).await;
    }
    let (name, value) = tenant_header(&tenant);
    let usage = server.get("/v1/quotas/usage").add_header(name, value).await.json::<Value>();
    assert_eq!(usage["data"]["usage"]["requests"], 4);
}

fn limited_state(burst: u32) -> ApiState {
    let mut settings = common::test_settings();
    settings.rate_limit.enabled = true;
    settings.rate_limit.per_minute = 1;
    settings.rate_limit.burst = burst;
    ApiState::new(settings)
}

fn seed_active(state: &ApiState, name: &str) -> Tenant {
    let mut params = NewTenant::named(name);
    params.primary_contact_email = "owner@example.com".into();
    let tenant = state.tenants.create(params).unwrap();
    state.tenants.apply(&tenant.id, |l, t| l.activate(t)).unwrap()
}

#[tokio::test]
async fn rate_limit_per_tenant() {
    let state = limited_state(2);
    let limited = seed_active(&state, "Limited");
    let other = seed_active(&state, "Other");
    let server = TestServer::new(build_router(state)).unwrap();
    let limited_id = limited.id.to_string();

    for _ in 0..2 {
        let (name, value) = tenant_header(&limited_id);
        let response = server.get("/v1/users").add_header(name, value).await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    let (name, value) = tenant_header(&limited_id);
    let response = server.get("/v1/users").add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers()[header::RETRY_AFTER].to_str().unwrap().parse::<u64>().unwrap() >= 1);
    assert_eq!(response.json::<Value>()["error"]["code"], "rate_limited");

    // Other tenants and health checks have their own budget
    let (name, value) = tenant_header(&other.slug);
    let response = server.get("/v1/users").add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let (name, value) = tenant_header(&limited_id);
    let health = server.get("/health").add_header(name, value).await;
    assert_eq!(health.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn rate_limit_shared_across_tenant_references() {
    let state = limited_state(1);
    let acme = seed_active(&state, "Acme");
    let server = TestServer::new(build_router(state)).unwrap();

    let (name, value) = tenant_header(&acme.id.to_string());
    let by_id = server.get("/v1/quotas").add_header(name, value).await;
    assert_eq!(by_id.status_code(), StatusCode::OK);

    let (name, value) = tenant_header(&acme.slug);
    let by_slug = server.get("/v1/quotas").add_header(name, value).await;
    assert_eq!(by_slug.status_code(), StatusCode::TOO_MANY_REQUESTS);

    let by_host = server
        .get("/v1/quotas")
        .add_header(header::HOST, HeaderValue::from_static("acme.platform.test"))
        .await;
    assert_eq!(by_host.status_code(), StatusCode::TOO_MANY_REQUESTS);

    let (name, value) = tenant_header(&acme.id.to_string().to_uppercase());
    let upper = server.get("/v1/quotas").add_header(name, value).await;
    assert_eq!(upper.status_code(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn unregistered_references_share_the_anonymous_budget() {
    let server = TestServer::new(build_router(limited_state(2))).unwrap();

    let mut statuses = Vec::new();
    for i in 0..4 {
        let (name, value) = tenant_header(&format!("junk-{i}"));
        statuses.push(server.get("/v1/tenants").add_header(name, value).await.status_code());
    }
    assert_eq!(statuses[..2], [StatusCode::OK, StatusCode::OK]);
    assert_eq!(statuses[2..], [StatusCode::TOO_MANY_REQUESTS, StatusCode::TOO_MANY_REQUESTS]);
}

#[tokio::test]
async fn cors_allows_configured_origin() {
    let server = common::server();
    let response = server
        .get("/health")
        .add_header(header::ORIGIN, HeaderValue::from_static("http://localhost:3000"))
        .await;
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");

    let response = server
        .get("/health")
        .add_header(header::ORIGIN, HeaderValue::from_static("https://evil.test"))
        .await;
    assert!(!response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let server = common::server();
    let response = server
        .get("/v1/nothing-here")
        .add_header(HeaderName::from_static("x-request-id"), HeaderValue::from_static("r-1"))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()["x-request-id"], "r-1");
}
