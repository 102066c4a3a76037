//! API Models

use chrono::{DateTime, Utc};
use platform_tenant::{NewTenant, Tenant, TenantProfileUpdate, TenantStatus, TenantTier, TierChange};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

/// Standard API response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorResponse>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn error(code: &str, message: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorResponse {
                code: code.to_string(),
                message: message.to_string(),
            }),
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// Paginated response
#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    /// Slice one page out of `all`. Pages start at 1.
    pub fn paginate(all: Vec<T>, page: u32, per_page: u32) -> Self {
        let page = page.max(1);
        let per_page = per_page.clamp(1, MAX_PER_PAGE);
        let total = all.len() as u64;
        let total_pages = total.div_ceil(per_page as u64) as u32;
        let skip = (page as usize - 1).saturating_mul(per_page as usize);
        let items = all.into_iter().skip(skip).take(per_page as usize).collect();

        Self { items, total, page, per_page, total_pages }
    }
}

/// Page size cap
pub const MAX_PER_PAGE: u32 = 100;

/// Default page size
pub const DEFAULT_PER_PAGE: u32 = 20;

// ============ Tenants ============

/// Tenant
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TenantResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    #[schema(value_type = String, example = "active")]
    pub status: TenantStatus,
    #[schema(value_type = String, example = "pro")]
    pub tier: TenantTier,
    pub organization_name: String,
    pub organization_domain: Option<String>,
    pub organization_size: Option<String>,
    pub primary_contact_email: String,
    pub primary_contact_name: Option<String>,
    pub billing_email: Option<String>,
    pub suspension_reason: Option<String>,
    pub tier_history: Vec<TierChangeResponse>,
    pub features: Vec<String>,
    pub max_users: i64,
    pub max_requests_per_month: i64,
    pub max_storage_gb: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub activated_at: Option<DateTime<Utc>>,
    pub suspended_at: Option<DateTime<Utc>>,
}

impl From<Tenant> for TenantResponse {
    fn from(tenant: Tenant) -> Self {
        Self {
            id: tenant.id,
            name: tenant.name,
            slug: tenant.slug,
            status: tenant.status,
            tier: tenant.tier,
            organization_name: tenant.organization_name,
            organization_domain: tenant.organization_domain,
            organization_size: tenant.organization_size,
            primary_contact_email: tenant.primary_contact_email,
            primary_contact_name: tenant.primary_contact_name,
            billing_email: tenant.billing_email,
            suspension_reason: tenant.suspension_reason,
            tier_history: tenant.tier_history.into_iter().map(Into::into).collect(),
            features: tenant.features.into_iter().collect(),
            max_users: tenant.max_users,
            max_requests_per_month: tenant.max_requests_per_month,
            max_storage_gb: tenant.max_storage_gb,
            created_at: tenant.created_at,
            updated_at: tenant.updated_at,
            activated_at: tenant.activated_at,
            suspended_at: tenant.suspended_at,
        }
    }
}

/// Tier change record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TierChangeResponse {
    #[schema(value_type = String, example = "free")]
    pub from: TenantTier,
    #[schema(value_type = String, example = "pro")]
    pub to: TenantTier,
    pub changed_at: DateTime<Utc>,
}

impl From<TierChange> for TierChangeResponse {
    fn from(change: TierChange) -> Self {
        Self {
            from: change.from,
            to: change.to,
            changed_at: change.changed_at,
        }
    }
}

/// Tenant creation request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TenantCreate {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub organization_domain: Option<String>,
    #[serde(default)]
    pub organization_size: Option<String>,
    pub primary_contact_email: String,
    #[serde(default)]
    pub primary_contact_name: Option<String>,
    #[serde(default)]
    pub billing_email: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

impl From<TenantCreate> for NewTenant {
    fn from(input: TenantCreate) -> Self {
        let organization_name = input.organization_name.unwrap_or_else(|| input.name.clone());
        NewTenant {
            name: input.name,
            slug: input.slug,
            organization_name,
            organization_domain: input.organization_domain,
            organization_size: input.organization_size,
            primary_contact_email: input.primary_contact_email,
            primary_contact_name: input.primary_contact_name,
            billing_email: input.billing_email,
            features: input.features,
        }
    }
}

/// Tenant profile update
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TenantPatch {
    pub name: Option<String>,
    pub organization_name: Option<String>,
    pub organization_domain: Option<String>,
    pub organization_size: Option<String>,
    pub primary_contact_email: Option<String>,
    pub primary_contact_name: Option<String>,
    pub billing_email: Option<String>,
}

impl From<TenantPatch> for TenantProfileUpdate {
    fn from(patch: TenantPatch) -> Self {
        TenantProfileUpdate {
            name: patch.name,
            organization_name: patch.organization_name,
            organization_domain: patch.organization_domain,
            organization_size: patch.organization_size,
            primary_contact_email: patch.primary_contact_email,
            primary_contact_name: patch.primary_contact_name,
            billing_email: patch.billing_email,
        }
    }
}

/// Tier change request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TierUpdate {
    #[schema(value_type = String, example = "enterprise")]
    pub tier: TenantTier,
}

/// Suspension request
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SuspendRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

// ============ Users ============

/// User
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// User creation request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserCreate {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub role: UserRole,
    pub password: String,
}

/// User update request
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UserPatch {
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

/// User role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Owner,
    Admin,
    #[default]
    Member,
    Viewer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
            Self::Viewer => "viewer",
        }
    }
}

// ============ Quotas ============

/// Usage against one quota
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuotaStatus {
    pub used: i64,
    pub limit: i64,
    pub unlimited: bool,
    pub exceeded: bool,
}

/// Quotas of the calling tenant
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuotaReport {
    pub tenant_id: Uuid,
    #[schema(value_type = String, example = "free")]
    pub tier: TenantTier,
    pub quotas: HashMap<String, QuotaStatus>,
}

/// Current usage
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UsageReport {
    pub usage: HashMap<String, i64>,
    pub period: String,
}

/// Ad-hoc quota check
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuotaCheck {
    pub quota_type: String,
    pub current_usage: i64,
}

/// Quota check result
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuotaCheckResult {
    pub quota_type: String,
    pub current_usage: i64,
    pub limit: i64,
    pub exceeded: bool,
}
