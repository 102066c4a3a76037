//! Tenant Lifecycle Management

use crate::error::{TenantError, UnknownVariant};
use crate::model::{NewTenant, Tenant, TenantProfileUpdate, TenantStatus, TenantTier, TierChange, UNLIMITED};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Time source for lifecycle timestamps
pub trait Clock: Send + Sync {
    /// Current time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Lifecycle operation, reported in transition errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantOperation {
    /// Pending to Active
    Activate,
    /// Active to Suspended
    Suspend,
    /// Suspended to Active
    Reactivate,
    /// Any status to Archived
    Archive,
    /// Tier change
    UpdateTier,
    /// Profile edit
    UpdateProfile,
}

impl fmt::Display for TenantOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Activate => write!(f, "activate"),
            Self::Suspend => write!(f, "suspend"),
            Self::Reactivate => write!(f, "reactivate"),
            Self::Archive => write!(f, "archive"),
            Self::UpdateTier => write!(f, "update tier for"),
            Self::UpdateProfile => write!(f, "update profile of"),
        }
    }
}

/// Quota dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaKind {
    /// Registered users
    Users,
    /// Requests per calendar month
    Requests,
    /// Storage in GB
    Storage,
}

impl QuotaKind {
    /// All quota dimensions
    pub const ALL: [QuotaKind; 3] = [Self::Users, Self::Requests, Self::Storage];

    /// Configured maximum for this dimension on `tenant`
    pub fn limit(&self, tenant: &Tenant) -> i64 {
        match self {
            Self::Users => tenant.max_users,
            Self::Requests => tenant.max_requests_per_month,
            Self::Storage => tenant.max_storage_gb,
        }
    }

    /// Wire tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Requests => "requests",
            Self::Storage => "storage",
        }
    }
}

impl FromStr for QuotaKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "users" => Ok(Self::Users),
            "requests" => Ok(Self::Requests),
            "storage" => Ok(Self::Storage),
            _ => Err(UnknownVariant::new("quota type", s)),
        }
    }
}

/// Stateless lifecycle manager
///
/// Every mutating operation checks legality before writing any field, so a
/// failed call leaves the tenant exactly as it was.
#[derive(Clone)]
pub struct TenantLifecycle {
    clock: Arc<dyn Clock>,
}

impl TenantLifecycle {
    /// Manager on the wall clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Manager stamping times from `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Current time according to the manager's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Create a pending, free-tier tenant
    pub fn create(&self, params: NewTenant) -> Tenant {
        Tenant::new(params, self.now())
    }

    /// Pending -> Active
    pub fn activate(&self, tenant: &mut Tenant) -> Result<(), TenantError> {
        require(tenant, TenantStatus::Pending, TenantOperation::Activate)?;

        let now = self.now();
        tenant.status = TenantStatus::Active;
        tenant.activated_at = Some(now);
        tenant.updated_at = now;
        Ok(())
    }

    /// Active -> Suspended, optionally recording why
    pub fn suspend(&self, tenant: &mut Tenant, reason: Option<String>) -> Result<(), TenantError> {
        require(tenant, TenantStatus::Active, TenantOperation::Suspend)?;

        let now = self.now();
        tenant.status = TenantStatus::Suspended;
        tenant.suspended_at = Some(now);
        tenant.updated_at = now;
        if let Some(reason) = reason.filter(|r| !r.is_empty()) {
            tenant.suspension_reason = Some(reason);
        }
        Ok(())
    }

    /// Suspended -> Active
    pub fn reactivate(&self, tenant: &mut Tenant) -> Result<(), TenantError> {
        require(tenant, TenantStatus::Suspended, TenantOperation::Reactivate)?;

        tenant.status = TenantStatus::Active;
        tenant.suspended_at = None;
        tenant.suspension_reason = None;
        tenant.updated_at = self.now();
        Ok(())
    }

    /// Any non-archived status -> Archived (soft delete)
    pub fn archive(&self, tenant: &mut Tenant) -> Result<(), TenantError> {
        if tenant.status == TenantStatus::Archived {
            return Err(TenantError::AlreadyArchived);
        }

        tenant.status = TenantStatus::Archived;
        tenant.updated_at = self.now();
        Ok(())
    }

    /// Move an active tenant to `new_tier`, replacing all quotas
    pub fn update_tier(&self, tenant: &mut Tenant, new_tier: TenantTier) -> Result<(), TenantError> {
        require(tenant, TenantStatus::Active, TenantOperation::UpdateTier)?;

        let now = self.now();
        tenant.tier_history.push(TierChange {
            from: tenant.tier,
            to: new_tier,
            changed_at: now,
        });
        tenant.tier = new_tier;
        tenant.apply_limits(new_tier.limits());
        tenant.updated_at = now;
        Ok(())
    }

    /// Apply profile edits. Archived tenants are read-only.
    pub fn update_profile(&self, tenant: &mut Tenant, update: TenantProfileUpdate) -> Result<(), TenantError> {
        if tenant.status == TenantStatus::Archived {
            return Err(TenantError::InvalidStateTransition {
                current: tenant.status,
                operation: TenantOperation::UpdateProfile,
            });
        }
        if update.is_empty() {
            return Ok(());
        }

        if let Some(name) = update.name {
            tenant.name = name;
        }
        if let Some(organization_name) = update.organization_name {
            tenant.organization_name = organization_name;
        }
        if let Some(domain) = update.organization_domain {
            tenant.organization_domain = Some(domain);
        }
        if let Some(size) = update.organization_size {
            tenant.organization_size = Some(size);
        }
        if let Some(email) = update.primary_contact_email {
            tenant.primary_contact_email = email;
        }
        if let Some(contact) = update.primary_contact_name {
            tenant.primary_contact_name = Some(contact);
        }
        if let Some(billing) = update.billing_email {
            tenant.billing_email = Some(billing);
        }
        tenant.updated_at = self.now();
        Ok(())
    }

    /// Enable a feature flag. Returns whether membership changed.
    pub fn add_feature(&self, tenant: &mut Tenant, feature: &str) -> bool {
        if tenant.features.contains(feature) {
            return false;
        }
        tenant.features.insert(feature.to_string());
        tenant.updated_at = self.now();
        true
    }

    /// Disable a feature flag. Returns whether membership changed.
    pub fn remove_feature(&self, tenant: &mut Tenant, feature: &str) -> bool {
        if !tenant.features.remove(feature) {
            return false;
        }
        tenant.updated_at = self.now();
        true
    }

    /// Whether the feature flag is enabled
    pub fn has_feature(&self, tenant: &Tenant, feature: &str) -> bool {
        tenant.features.contains(feature)
    }

    /// Check a quota by its wire name
    ///
    /// Unrecognised quota types have a maximum of 0, so any non-negative
    /// usage counts as exceeded.
    pub fn is_quota_exceeded(&self, tenant: &Tenant, quota_type: &str, current_usage: i64) -> bool {
        let max_allowed = quota_type
            .parse::<QuotaKind>()
            .map(|kind| kind.limit(tenant))
            .unwrap_or(0);
        exceeds(max_allowed, current_usage)
    }

    /// Check a typed quota dimension
    pub fn is_kind_exceeded(&self, tenant: &Tenant, kind: QuotaKind, current_usage: i64) -> bool {
        exceeds(kind.limit(tenant), current_usage)
    }
}

impl Default for TenantLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TenantLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantLifecycle").finish_non_exhaustive()
    }
}

fn require(tenant: &Tenant, expected: TenantStatus, operation: TenantOperation) -> Result<(), TenantError> {
    if tenant.status == expected {
        Ok(())
    } else {
        Err(TenantError::InvalidStateTransition {
            current: tenant.status,
            operation,
        })
    }
}

fn exceeds(max_allowed: i64, current_usage: i64) -> bool {
    if max_allowed == UNLIMITED {
        return false;
    }
    current_usage >= max_allowed
}
