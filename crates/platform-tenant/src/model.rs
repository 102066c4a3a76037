//! Tenant Data Model

use crate::error::UnknownVariant;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use uuid::Uuid;

/// Tenant ID
pub type TenantId = Uuid;

/// Quota value meaning "no limit"
pub const UNLIMITED: i64 = -1;

/// Tenant definition
///
/// Plain data record. All state changes go through
/// [`TenantLifecycle`](crate::lifecycle::TenantLifecycle).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    /// Unique tenant ID
    pub id: TenantId,
    /// Display name
    pub name: String,
    /// URL-safe identifier
    pub slug: String,
    /// Lifecycle status
    pub status: TenantStatus,
    /// Subscription tier
    pub tier: TenantTier,

    /// Organization name
    pub organization_name: String,
    /// Organization domain
    pub organization_domain: Option<String>,
    /// Organization size bracket
    pub organization_size: Option<String>,

    /// Primary contact email
    pub primary_contact_email: String,
    /// Primary contact name
    pub primary_contact_name: Option<String>,
    /// Billing email
    pub billing_email: Option<String>,

    /// Reason recorded by the last suspension
    pub suspension_reason: Option<String>,
    /// Tier changes, oldest first
    pub tier_history: Vec<TierChange>,
    /// Enabled feature flags
    pub features: BTreeSet<String>,

    /// Maximum users (-1 = unlimited)
    pub max_users: i64,
    /// Maximum API requests per calendar month (-1 = unlimited)
    pub max_requests_per_month: i64,
    /// Storage quota in GB (-1 = unlimited)
    pub max_storage_gb: i64,

    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
    /// First activation time
    pub activated_at: Option<DateTime<Utc>>,
    /// Time of the current suspension
    pub suspended_at: Option<DateTime<Utc>>,
}

impl Tenant {
    /// Create a pending, free-tier tenant
    pub fn new(params: NewTenant, now: DateTime<Utc>) -> Self {
        let slug = match params.slug {
            Some(slug) if !slug.is_empty() => slug,
            _ => slugify(&params.name),
        };
        let billing_email = match params.billing_email {
            Some(email) if !email.is_empty() => Some(email),
            _ => Some(params.primary_contact_email.clone()),
        };
        let limits = QuotaLimits::for_tier(TenantTier::Free);

        Self {
            id: Uuid::new_v4(),
            name: params.name,
            slug,
            status: TenantStatus::Pending,
            tier: TenantTier::Free,
            organization_name: params.organization_name,
            organization_domain: params.organization_domain,
            organization_size: params.organization_size,
            primary_contact_email: params.primary_contact_email,
            primary_contact_name: params.primary_contact_name,
            billing_email,
            suspension_reason: None,
            tier_history: Vec::new(),
            features: params.features.into_iter().collect(),
            max_users: limits.max_users,
            max_requests_per_month: limits.max_requests_per_month,
            max_storage_gb: limits.max_storage_gb,
            created_at: now,
            updated_at: now,
            activated_at: None,
            suspended_at: None,
        }
    }

    /// Current quota triple
    pub fn limits(&self) -> QuotaLimits {
        QuotaLimits {
            max_users: self.max_users,
            max_requests_per_month: self.max_requests_per_month,
            max_storage_gb: self.max_storage_gb,
        }
    }

    pub(crate) fn apply_limits(&mut self, limits: QuotaLimits) {
        self.max_users = limits.max_users;
        self.max_requests_per_month = limits.max_requests_per_month;
        self.max_storage_gb = limits.max_storage_gb;
    }
}

/// Tenant creation parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTenant {
    /// Display name
    pub name: String,
    /// Explicit slug; derived from `name` when absent or empty
    pub slug: Option<String>,
    /// Organization name
    pub organization_name: String,
    /// Organization domain
    pub organization_domain: Option<String>,
    /// Organization size bracket
    pub organization_size: Option<String>,
    /// Primary contact email
    pub primary_contact_email: String,
    /// Primary contact name
    pub primary_contact_name: Option<String>,
    /// Billing email; defaults to the primary contact email
    pub billing_email: Option<String>,
    /// Initial feature flags
    pub features: Vec<String>,
}

impl NewTenant {
    /// Parameters with just a display name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Editable profile fields. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantProfileUpdate {
    /// New display name
    pub name: Option<String>,
    /// New organization name
    pub organization_name: Option<String>,
    /// New organization domain
    pub organization_domain: Option<String>,
    /// New organization size bracket
    pub organization_size: Option<String>,
    /// New primary contact email
    pub primary_contact_email: Option<String>,
    /// New primary contact name
    pub primary_contact_name: Option<String>,
    /// New billing email
    pub billing_email: Option<String>,
}

impl TenantProfileUpdate {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.organization_name.is_none()
            && self.organization_domain.is_none()
            && self.organization_size.is_none()
            && self.primary_contact_email.is_none()
            && self.primary_contact_name.is_none()
            && self.billing_email.is_none()
    }
}

/// Tenant status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    /// Created, not yet activated
    Pending,
    /// In service
    Active,
    /// Temporarily disabled
    Suspended,
    /// Soft-deleted, terminal
    Archived,
}

impl TenantStatus {
    /// Wire tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for TenantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TenantStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            "archived" => Ok(Self::Archived),
            _ => Err(UnknownVariant::new("tenant status", s)),
        }
    }
}

/// Subscription tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantTier {
    /// Default tier for new tenants
    Free,
    /// Paid tier
    Pro,
    /// Unlimited users and requests
    Enterprise,
}

impl TenantTier {
    /// Wire tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        }
    }

    /// Quotas implied by this tier
    pub fn limits(&self) -> QuotaLimits {
        QuotaLimits::for_tier(*self)
    }
}

impl fmt::Display for TenantTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TenantTier {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "pro" => Ok(Self::Pro),
            "enterprise" => Ok(Self::Enterprise),
            _ => Err(UnknownVariant::new("tenant tier", s)),
        }
    }
}

/// Quota triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaLimits {
    /// Max users
    pub max_users: i64,
    /// Max requests per month
    pub max_requests_per_month: i64,
    /// Storage quota (GB)
    pub max_storage_gb: i64,
}

impl QuotaLimits {
    /// Get limits for tier
    pub fn for_tier(tier: TenantTier) -> Self {
        match tier {
            TenantTier::Free => Self {
                max_users: 10,
                max_requests_per_month: 10_000,
                max_storage_gb: 10,
            },
            TenantTier::Pro => Self {
                max_users: 50,
                max_requests_per_month: 100_000,
                max_storage_gb: 100,
            },
            TenantTier::Enterprise => Self {
                max_users: UNLIMITED,
                max_requests_per_month: UNLIMITED,
                max_storage_gb: 1000,
            },
        }
    }
}

/// One entry of a tenant's tier history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierChange {
    /// Tier before the change
    pub from: TenantTier,
    /// Tier after the change
    pub to: TenantTier,
    /// When the change was applied
    pub changed_at: DateTime<Utc>,
}

/// Derive a URL-safe slug from a display name
///
/// Lowercases, strips anything that is not a word character, whitespace or
/// hyphen, collapses whitespace/hyphen runs into one hyphen and trims hyphens
/// from both ends.
pub fn slugify(name: &str) -> String {
    static STRIP: OnceLock<Regex> = OnceLock::new();
    static COLLAPSE: OnceLock<Regex> = OnceLock::new();

    let strip = STRIP.get_or_init(|| Regex::new(r"[^\w\s-]").expect("valid strip pattern"));
    let collapse = COLLAPSE.get_or_init(|| Regex::new(r"[-\s]+").expect("valid collapse pattern"));

    let lowered = name.to_lowercase();
    let stripped = strip.replace_all(&lowered, "");
    let collapsed = collapse.replace_all(&stripped, "-");
    collapsed.trim_matches('-').to_string()
}
