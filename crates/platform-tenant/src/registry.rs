//! In-memory tenant registry

use crate::error::TenantError;
use crate::lifecycle::TenantLifecycle;
use crate::model::{slugify, NewTenant, Tenant, TenantId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;

/// Tenant registry
///
/// Mutations run while the registry holds the tenant's entry lock, so at most
/// one mutation per tenant is in flight.
pub struct TenantRegistry {
    /// All tenants
    tenants: DashMap<TenantId, Tenant>,
    /// Slug index
    slugs: DashMap<String, TenantId>,
    /// Serializes creation so the capacity check holds
    create_lock: Mutex<()>,
    lifecycle: TenantLifecycle,
    max_tenants: usize,
}

impl TenantRegistry {
    /// Empty registry holding at most `max_tenants` tenants
    pub fn new(lifecycle: TenantLifecycle, max_tenants: usize) -> Self {
        Self {
            tenants: DashMap::new(),
            slugs: DashMap::new(),
            create_lock: Mutex::new(()),
            lifecycle,
            max_tenants,
        }
    }

    /// Lifecycle manager used for every mutation
    pub fn lifecycle(&self) -> &TenantLifecycle {
        &self.lifecycle
    }

    /// Create new tenant
    pub fn create(&self, mut params: NewTenant) -> Result<Tenant, RegistryError> {
        let slug = match params.slug.take().filter(|s| !s.is_empty()) {
            Some(explicit) => slugify(&explicit),
            None => slugify(&params.name),
        };
        // Slugs that parse as ids would be shadowed in `resolve`
        if slug.is_empty() || slug.parse::<TenantId>().is_ok() {
            return Err(RegistryError::InvalidSlug);
        }
        params.slug = Some(slug.clone());

        let _guard = self.create_lock.lock();
        if self.tenants.len() >= self.max_tenants {
            return Err(RegistryError::CapacityReached(self.max_tenants));
        }

        match self.slugs.entry(slug) {
            Entry::Occupied(entry) => Err(RegistryError::SlugTaken(entry.key().clone())),
            Entry::Vacant(entry) => {
                let tenant = self.lifecycle.create(params);
                entry.insert(tenant.id);
                self.tenants.insert(tenant.id, tenant.clone());
                Ok(tenant)
            }
        }
    }

    /// Get tenant
    pub fn get(&self, tenant_id: &TenantId) -> Option<Tenant> {
        self.tenants.get(tenant_id).map(|t| t.clone())
    }

    /// Look a tenant up by slug
    pub fn find_by_slug(&self, slug: &str) -> Option<Tenant> {
        let id = *self.slugs.get(slug)?;
        self.get(&id)
    }

    /// Resolve a tenant reference that is either a UUID or a slug
    pub fn resolve(&self, reference: &str) -> Option<Tenant> {
        match reference.parse::<TenantId>() {
            Ok(id) => self.get(&id),
            Err(_) => self.find_by_slug(reference),
        }
    }

    /// List all tenants, oldest first
    pub fn list(&self) -> Vec<Tenant> {
        let mut tenants: Vec<Tenant> = self.tenants.iter().map(|t| t.value().clone()).collect();
        tenants.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.slug.cmp(&b.slug)));
        tenants
    }

    /// Run a lifecycle operation against one tenant and return its new state
    pub fn apply<T, F>(&self, tenant_id: &TenantId, op: F) -> Result<Tenant, RegistryError>
    where
        F: FnOnce(&TenantLifecycle, &mut Tenant) -> Result<T, TenantError>,
    {
        let mut entry = self
            .tenants
            .get_mut(tenant_id)
            .ok_or(RegistryError::NotFound(*tenant_id))?;
        op(&self.lifecycle, entry.value_mut())?;
        Ok(entry.value().clone())
    }

    /// Get tenant count
    pub fn count(&self) -> usize {
        self.tenants.len()
    }
}

/// Registry error
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No tenant with this id
    #[error("tenant not found: {0}")]
    NotFound(TenantId),
    /// Another tenant owns the slug
    #[error("slug already in use: {0}")]
    SlugTaken(String),
    /// Slug is empty after normalization or reads as a tenant id
    #[error("slug must contain a word character and must not be a tenant id")]
    InvalidSlug,
    /// Registry is full
    #[error("tenant limit of {0} reached")]
    CapacityReached(usize),
    /// Lifecycle rule rejected the operation
    #[error(transparent)]
    Tenant(#[from] TenantError),
}
