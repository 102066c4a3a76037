//! Request middleware

pub mod auth;
pub mod logging;
pub mod metrics;
pub mod rate_limit;
pub mod tenant;

pub use auth::AuthClaims;
pub use tenant::{RequestTenant, ResolvedTenant, TenantContext};

/// Request id header
pub const REQUEST_ID_HEADER: &str = "x-request-id";
/// Handling time header, in seconds
pub const PROCESS_TIME_HEADER: &str = "x-process-time";
/// Tenant reference header
pub const TENANT_ID_HEADER: &str = "x-tenant-id";
