//! Tenant resolution
//!
//! The middleware records which tenant a request names; the
//! [`TenantContext`] extractor turns that into an active tenant for
//! tenant-scoped handlers.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use platform_tenant::{Tenant, TenantId, TenantStatus};
use std::net::IpAddr;
use std::sync::Arc;

use super::TENANT_ID_HEADER;
use crate::error::ApiError;
use crate::ApiState;

/// Tenant reference carried by the request, as sent by the client
#[derive(Debug, Clone, Default)]
pub struct RequestTenant(pub Option<String>);

/// Registered tenant the request reference resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTenant(pub TenantId);

/// Tenant named by `X-Tenant-Id`, falling back to the `Host` subdomain
pub fn tenant_reference(headers: &HeaderMap) -> Option<String> {
    let explicit = headers
        .get(TENANT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(reference) = explicit {
        return Some(reference.to_string());
    }

    let host = headers.get(header::HOST)?.to_str().ok()?;
    let hostname = host.rsplit_once(':').map_or(host, |(name, _)| name);
    if hostname.parse::<IpAddr>().is_ok() {
        return None;
    }
    let (subdomain, _) = hostname.split_once('.')?;
    (!subdomain.is_empty()).then(|| subdomain.to_string())
}

/// Resolve the tenant reference, count the request and echo the reference
pub async fn extract_tenant(State(state): State<Arc<ApiState>>, mut request: Request, next: Next) -> Response {
    let reference = tenant_reference(request.headers());

    if let Some(tenant) = reference.as_deref().and_then(|r| state.tenants.resolve(r)) {
        state.usage.record_request(tenant.id, Utc::now());
        request.extensions_mut().insert(ResolvedTenant(tenant.id));
    }
    request.extensions_mut().insert(RequestTenant(reference.clone()));

    let mut response = next.run(request).await;
    if let Some(value) = reference.and_then(|r| HeaderValue::from_str(&r).ok()) {
        response.headers_mut().insert(TENANT_ID_HEADER, value);
    }
    response
}

/// Active tenant the request is scoped to
#[derive(Debug, Clone)]
pub struct TenantContext(pub Tenant);

#[async_trait]
impl FromRequestParts<Arc<ApiState>> for TenantContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<ApiState>) -> Result<Self, Self::Rejection> {
        let reference = match parts.extensions.get::<RequestTenant>() {
            Some(RequestTenant(reference)) => reference.clone(),
            None => tenant_reference(&parts.headers),
        }
        .ok_or_else(|| ApiError::BadRequest("tenant id required in X-Tenant-Id header".into()))?;

        let tenant = state
            .tenants
            .resolve(&reference)
            .ok_or_else(|| ApiError::NotFound(format!("tenant not found: {reference}")))?;

        if tenant.status != TenantStatus::Active {
            return Err(ApiError::Forbidden(format!("tenant is {}", tenant.status)));
        }
        Ok(Self(tenant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, HeaderValue::from_static(*value));
        }
        headers
    }

    #[test]
    fn test_header_wins_over_host() {
        let h = headers(&[("x-tenant-id", " acme "), ("host", "other.platform.io")]);
        assert_eq!(tenant_reference(&h).as_deref(), Some("acme"));
    }

    #[test]
    fn test_subdomain_fallback() {
        let h = headers(&[("host", "globex.platform.io:8082")]);
        assert_eq!(tenant_reference(&h).as_deref(), Some("globex"));

        assert_eq!(tenant_reference(&headers(&[("host", "localhost:8082")])), None);
        assert_eq!(tenant_reference(&headers(&[("host", "127.0.0.1:8082")])), None);
        assert_eq!(tenant_reference(&headers(&[("x-tenant-id", "")])), None);
    }
}
