//! Tenant Lifecycle Framework
//!
//! Status/tier state machine and quota evaluation for platform tenants.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      TENANT LIFECYCLE FRAMEWORK                         │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                       TENANT REGISTRY                            │  │
//! │  │   one mutation in flight per tenant id | unique slugs | capacity │  │
//! │  └───────────────────────────────┬──────────────────────────────────┘  │
//! │                                  │                                      │
//! │  ┌───────────────────────────────▼──────────────────────────────────┐  │
//! │  │                      LIFECYCLE MANAGER                           │  │
//! │  │                                                                  │  │
//! │  │   Pending ──activate──▶ Active ──suspend────▶ Suspended          │  │
//! │  │      │                   │    ◀──reactivate──    │               │  │
//! │  │      │                   ▼                       │               │  │
//! │  │      └───archive───▶ Archived ◀──────archive─────┘               │  │
//! │  │                                                                  │  │
//! │  │   Tier changes (Active only) | Feature flags | Quota checks      │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod lifecycle;
pub mod model;
pub mod registry;

pub use error::{TenantError, UnknownVariant};
pub use lifecycle::{Clock, QuotaKind, SystemClock, TenantLifecycle, TenantOperation};
pub use model::{
    slugify, NewTenant, QuotaLimits, Tenant, TenantId, TenantProfileUpdate, TenantStatus,
    TenantTier, TierChange, UNLIMITED,
};
pub use registry::{RegistryError, TenantRegistry};
