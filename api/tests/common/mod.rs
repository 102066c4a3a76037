#![allow(dead_code)]

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use platform_api::{build_router, settings::Settings, ApiState};
use serde_json::{json, Value};

pub const STRONG_PASSWORD: &str = "Sup3r-secret!";

pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.rate_limit.enabled = false;
    settings
}

pub fn server() -> TestServer {
    server_with(test_settings())
}

pub fn server_with(settings: Settings) -> TestServer {
    TestServer::new(build_router(ApiState::new(settings))).unwrap()
}

pub fn tenant_header(reference: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-tenant-id"),
        HeaderValue::from_str(reference).unwrap(),
    )
}

pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("authorization"),
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    )
}

/// Create a pending tenant and return its JSON
pub async fn create_tenant(server: &TestServer, name: &str) -> Value {
    let response = server
        .post("/v1/tenants")
        .json(&json!({
            "name": name,
            "primary_contact_email": "owner@example.com",
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()["data"].clone()
}

/// Create and activate a tenant, returning its id
pub async fn active_tenant(server: &TestServer, name: &str) -> String {
    let tenant = create_tenant(server, name).await;
    let id = tenant["id"].as_str().unwrap().to_string();
    let response = server.post(&format!("/v1/tenants/{id}/activate")).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    id
}

/// Create a user in `tenant_id`, returning its JSON
pub async fn create_user(server: &TestServer, tenant_id: &str, email: &str) -> Value {
    let (name, value) = tenant_header(tenant_id);
    let response = server
        .post("/v1/users")
        .add_header(name, value)
        .json(&json!({
            "email": email,
            "name": "Test User",
            "password": STRONG_PASSWORD,
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()["data"].clone()
}
