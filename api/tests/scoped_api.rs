mod common;

use axum::http::StatusCode;
use common::{bearer, tenant_header, STRONG_PASSWORD};
use serde_json::{json, Value};

#[tokio::test]
async fn scoped_routes_require_an_active_tenant() {
    let server = common::server();

    let missing = server.get("/v1/users").await;
    assert_eq!(missing.status_code(), StatusCode::BAD_REQUEST);

    let (name, value) = tenant_header(&uuid::Uuid::new_v4().to_string());
    let unknown = server.get("/v1/users").add_header(name, value).await;
    assert_eq!(unknown.status_code(), StatusCode::NOT_FOUND);

    let pending = common::create_tenant(&server, "Pending Co").await;
    let (name, value) = tenant_header(pending["id"].as_str().unwrap());
    let response = server.get("/v1/quotas").add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["error"]["code"], "forbidden");
}

#[tokio::test]
async fn tenant_can_be_referenced_by_slug() {
    let server = common::server();
    common::active_tenant(&server, "Slug Ref").await;

    let (name, value) = tenant_header("slug-ref");
    let response = server.get("/v1/providers").add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn user_crud() {
    let server = common::server();
    let tenant = common::active_tenant(&server, "Users Inc").await;
    let user = common::create_user(&server, &tenant, "Ada@Example.com").await;
    let user_id = user["id"].as_str().unwrap();

    assert_eq!(user["email"], "ada@example.com");
    assert_eq!(user["role"], "member");
    assert!(user.get("password_hash").is_none());

    let (name, value) = tenant_header(&tenant);
    let duplicate = server
        .post("/v1/users")
        .add_header(name, value)
        .json(&json!({"email": "ada@example.com", "name": "Ada", "password": STRONG_PASSWORD}))
        .await;
    assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);

    let (name, value) = tenant_header(&tenant);
    let patched = server
        .patch(&format!("/v1/users/{user_id}"))
        .add_header(name, value)
        .json(&json!({"role": "admin"}))
        .await
        .json::<Value>();
    assert_eq!(patched["data"]["role"], "admin");

    let (name, value) = tenant_header(&tenant);
    let listed = server.get("/v1/users?role=admin").add_header(name, value).await.json::<Value>();
    assert_eq!(listed["data"]["total"], 1);

    let (name, value) = tenant_header(&tenant);
    let deleted = server.delete(&format!("/v1/users/{user_id}")).add_header(name, value).await;
    assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);

    let (name, value) = tenant_header(&tenant);
    let gone = server.get(&format!("/v1/users/{user_id}")).add_header(name, value).await;
    assert_eq!(gone.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn users_are_isolated_per_tenant() {
    let server = common::server();
    let first = common::active_tenant(&server, "First Tenant").await;
    let second = common::active_tenant(&server, "Second Tenant").await;
    let user = common::create_user(&server, &first, "shared@example.com").await;

    let (name, value) = tenant_header(&second);
    let response = server
        .get(&format!("/v1/users/{}", user["id"].as_str().unwrap()))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    common::create_user(&server, &second, "shared@example.com").await;
}

#[tokio::test]
async fn weak_password_rejected() {
    let server = common::server();
    let tenant = common::active_tenant(&server, "Weak Pw").await;

    let (name, value) = tenant_header(&tenant);
    let response = server
        .post("/v1/users")
        .add_header(name, value)
        .json(&json!({"email": "bob@example.com", "name": "Bob", "password": "password"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["error"]["code"], "validation_error");
}

#[tokio::test]
async fn quotas_follow_tier() {
    let server = common::server();
    let tenant = common::active_tenant(&server, "Quota Co").await;
    common::create_user(&server, &tenant, "q@example.com").await;

    let (name, value) = tenant_header(&tenant);
    let report = server.get("/v1/quotas").add_header(name, value).await.json::<Value>();
    let users = &report["data"]["quotas"]["users"];
    assert_eq!(users["used"], 1);
    assert_eq!(users["limit"], 10);
    assert_eq!(users["exceeded"], false);
    assert_eq!(report["data"]["quotas"]["storage"]["used"], 0);
    assert!(report["data"]["quotas"]["requests"]["used"].as_i64().unwrap() >= 1);

    let (name, value) = tenant_header(&tenant);
    let upgraded = server
        .put("/v1/quotas")
        .add_header(name, value)
        .json(&json!({"tier": "enterprise"}))
        .await
        .json::<Value>();
    let users = &upgraded["data"]["quotas"]["users"];
    assert_eq!(upgraded["data"]["tier"], "enterprise");
    assert_eq!(users["limit"], -1);
    assert_eq!(users["unlimited"], true);
}

#[tokio::test]
async fn usage_and_checks() {
    let server = common::server();
    let tenant = common::active_tenant(&server, "Usage Co").await;

    let (name, value) = tenant_header(&tenant);
    let usage = server.get("/v1/quotas/usage").add_header(name, value).await.json::<Value>();
    assert_eq!(usage["data"]["period"], "current_month");
    assert_eq!(usage["data"]["usage"]["users"], 0);
    assert!(usage["data"]["usage"]["requests"].as_i64().unwrap() >= 1);

    let (name, value) = tenant_header(&tenant);
    let at_limit = server
        .post("/v1/quotas/check")
        .add_header(name, value)
        .json(&json!({"quota_type": "users", "current_usage": 10}))
        .await
        .json::<Value>();
    assert_eq!(at_limit["data"]["exceeded"], true);
    assert_eq!(at_limit["data"]["limit"], 10);

    let (name, value) = tenant_header(&tenant);
    let under = server
        .post("/v1/quotas/check")
        .add_header(name, value)
        .json(&json!({"quota_type": "storage", "current_usage": 9}))
        .await
        .json::<Value>();
    assert_eq!(under["data"]["exceeded"], false);

    let (name, value) = tenant_header(&tenant);
    let unknown = server
        .post("/v1/quotas/check")
        .add_header(name, value)
        .json(&json!({"quota_type": "bandwidth", "current_usage": 0}))
        .await;
    assert_eq!(unknown.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn provider_configuration() {
    let server = common::server();
    let tenant = common::active_tenant(&server, "Provider Co").await;

    let (name, value) = tenant_header(&tenant);
    let listed = server.get("/v1/providers").add_header(name, value).await.json::<Value>();
    let providers = listed["data"]["providers"].as_array().unwrap();
    let names: Vec<&str> = providers.iter().map(|p| p["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["openai", "anthropic", "google", "groq"]);
    assert!(providers.iter().all(|p| p["configured"] == false));

    let (name, value) = tenant_header(&tenant);
    let configured = server
        .put("/v1/providers/openai")
        .add_header(name, value)
        .json(&json!({"api_key": "sk-live-abcdef1234", "default_model": "gpt-4o"}))
        .await
        .json::<Value>();
    let summary = &configured["data"];
    assert_eq!(summary["configured"], true);
    assert_eq!(summary["enabled"], true);
    assert_eq!(summary["api_key_hint"], "**************1234");
    assert!(summary.get("api_key").is_none());

    let (name, value) = tenant_header(&tenant);
    let test = server.post("/v1/providers/openai/test").add_header(name, value).await.json::<Value>();
    assert_eq!(test["data"]["status"], "ok");

    let (name, value) = tenant_header(&tenant);
    let untested = server.post("/v1/providers/groq/test").add_header(name, value).await.json::<Value>();
    assert_eq!(untested["data"]["status"], "not_configured");

    let (name, value) = tenant_header(&tenant);
    server
        .put("/v1/providers/openai")
        .add_header(name, value)
        .json(&json!({"api_key": "sk-live-abcdef1234", "enabled": false}))
        .await;
    let (name, value) = tenant_header(&tenant);
    let disabled = server.post("/v1/providers/openai/test").add_header(name, value).await.json::<Value>();
    assert_eq!(disabled["data"]["status"], "disabled");

    let (name, value) = tenant_header(&tenant);
    let removed = server.delete("/v1/providers/openai").add_header(name, value).await;
    assert_eq!(removed.status_code(), StatusCode::NO_CONTENT);

    let (name, value) = tenant_header(&tenant);
    let again = server.delete("/v1/providers/openai").add_header(name, value).await;
    assert_eq!(again.status_code(), StatusCode::NOT_FOUND);

    let (name, value) = tenant_header(&tenant);
    let unknown = server.post("/v1/providers/mistral/test").add_header(name, value).await;
    assert_eq!(unknown.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn login_logout_refresh() {
    let server = common::server();
    let tenant = common::active_tenant(&server, "Auth Co").await;
    common::create_user(&server, &tenant, "login@example.com").await;

    let (name, value) = tenant_header(&tenant);
    let wrong = server
        .post("/v1/auth/login")
        .add_header(name, value)
        .json(&json!({"email": "login@example.com", "password": "Wrong-pass-1"}))
        .await;
    assert_eq!(wrong.status_code(), StatusCode::UNAUTHORIZED);

    let (name, value) = tenant_header(&tenant);
    let login = server
        .post("/v1/auth/login")
        .add_header(name, value)
        .json(&json!({"email": "login@example.com", "password": STRONG_PASSWORD}))
        .await;
    assert_eq!(login.status_code(), StatusCode::OK);
    let tokens = login.json::<Value>()["data"].clone();
    assert_eq!(tokens["token_type"], "bearer");
    assert_eq!(tokens["expires_in"], 1800);
    let access = tokens["access_token"].as_str().unwrap();
    let refresh = tokens["refresh_token"].as_str().unwrap();

    // An access token cannot be used to refresh
    let misuse = server.post("/v1/auth/refresh").json(&json!({"refresh_token": access})).await;
    assert_eq!(misuse.status_code(), StatusCode::UNAUTHORIZED);

    let rotated = server.post("/v1/auth/refresh").json(&json!({"refresh_token": refresh})).await;
    assert_eq!(rotated.status_code(), StatusCode::OK);
    let rotated = rotated.json::<Value>();
    assert!(rotated["data"]["refresh_token"].is_string());

    let replay = server.post("/v1/auth/refresh").json(&json!({"refresh_token": refresh})).await;
    assert_eq!(replay.status_code(), StatusCode::UNAUTHORIZED);

    let (name, value) = bearer(access);
    let logout = server.post("/v1/auth/logout").add_header(name, value).await;
    assert_eq!(logout.status_code(), StatusCode::NO_CONTENT);

    let (name, value) = bearer(access);
    let again = server.post("/v1/auth/logout").add_header(name, value).await;
    assert_eq!(again.status_code(), StatusCode::UNAUTHORIZED);

    let anonymous = server.post("/v1/auth/logout").await;
    assert_eq!(anonymous.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_email_and_wrong_password_look_alike() {
    let server = common::server();
    let tenant = common::active_tenant(&server, "Lookalike Co").await;
    common::create_user(&server, &tenant, "known@example.com").await;

    let mut bodies = Vec::new();
    for email in ["known@example.com", "nobody@example.com"] {
        let (name, value) = tenant_header(&tenant);
        let response = server
            .post("/v1/auth/login")
            .add_header(name, value)
            .json(&json!({"email": email, "password": "Wrong-pass-1"}))
            .await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        bodies.push(response.json::<Value>());
    }
    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(bodies[1]["error"]["message"], "invalid email or password");
}

#[tokio::test]
async fn inactive_user_cannot_login() {
    let server = common::server();
    let tenant = common::active_tenant(&server, "Inactive Co").await;
    let user = common::create_user(&server, &tenant, "off@example.com").await;

    let (name, value) = tenant_header(&tenant);
    server
        .patch(&format!("/v1/users/{}", user["id"].as_str().unwrap()))
        .add_header(name, value)
        .json(&json!({"is_active": false}))
        .await;

    let (name, value) = tenant_header(&tenant);
    let login = server
        .post("/v1/auth/login")
        .add_header(name, value)
        .json(&json!({"email": "off@example.com", "password": STRONG_PASSWORD}))
        .await;
    assert_eq!(login.status_code(), StatusCode::UNAUTHORIZED);
}
