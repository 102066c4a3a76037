//! Tenant-scoped user store

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{UserPatch, UserResponse, UserRole};

/// Stored user
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            tenant_id: user.tenant_id,
            email: user.email,
            name: user.name,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
            last_login_at: user.last_login_at,
        }
    }
}

/// Fields of a user being created. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub password_hash: String,
}

#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("email already registered: {0}")]
    EmailTaken(String),
    #[error("user quota of {limit} reached")]
    QuotaExceeded { limit: i64 },
    #[error("user not found: {0}")]
    NotFound(Uuid),
}

/// Users of every tenant, keyed by tenant
#[derive(Default)]
pub struct UserStore {
    users: RwLock<HashMap<Uuid, Vec<User>>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user. `is_exceeded` sees the tenant's current user count
    /// under the write lock, so concurrent creates cannot overshoot the quota.
    pub fn create<F>(&self, tenant_id: Uuid, new_user: NewUser, limit: i64, is_exceeded: F) -> Result<User, UserStoreError>
    where
        F: FnOnce(i64) -> bool,
    {
        let email = new_user.email.trim().to_lowercase();
        let mut users = self.users.write();
        let tenant_users = users.entry(tenant_id).or_default();

        if is_exceeded(tenant_users.len() as i64) {
            return Err(UserStoreError::QuotaExceeded { limit });
        }
        if tenant_users.iter().any(|u| u.email == email) {
            return Err(UserStoreError::EmailTaken(email));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            tenant_id,
            email,
            name: new_user.name,
            role: new_user.role,
            password_hash: new_user.password_hash,
            is_active: true,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };
        tenant_users.push(user.clone());
        tracing::info!(tenant_id = %tenant_id, user_id = %user.id, "user created");
        Ok(user)
    }

    pub fn list(&self, tenant_id: &Uuid) -> Vec<User> {
        self.users.read().get(tenant_id).cloned().unwrap_or_default()
    }

    pub fn count(&self, tenant_id: &Uuid) -> usize {
        self.users.read().get(tenant_id).map_or(0, Vec::len)
    }

    pub fn get(&self, tenant_id: &Uuid, user_id: &Uuid) -> Result<User, UserStoreError> {
        self.users
            .read()
            .get(tenant_id)
            .and_then(|users| users.iter().find(|u| u.id == *user_id).cloned())
            .ok_or(UserStoreError::NotFound(*user_id))
    }

    pub fn find_by_email(&self, tenant_id: &Uuid, email: &str) -> Option<User> {
        let email = email.trim().to_lowercase();
        self.users
            .read()
            .get(tenant_id)
            .and_then(|users| users.iter().find(|u| u.email == email).cloned())
    }

    pub fn update(&self, tenant_id: &Uuid, user_id: &Uuid, patch: UserPatch) -> Result<User, UserStoreError> {
        self.modify(tenant_id, user_id, |user| {
            if let Some(name) = patch.name {
                user.name = name;
            }
            if let Some(role) = patch.role {
                user.role = role;
            }
            if let Some(is_active) = patch.is_active {
                user.is_active = is_active;
            }
            user.updated_at = Utc::now();
        })
    }

    /// Stamp a successful login
    pub fn record_login(&self, tenant_id: &Uuid, user_id: &Uuid) -> Result<User, UserStoreError> {
        self.modify(tenant_id, user_id, |user| user.last_login_at = Some(Utc::now()))
    }

    pub fn delete(&self, tenant_id: &Uuid, user_id: &Uuid) -> Result<(), UserStoreError> {
        let mut users = self.users.write();
        let tenant_users = users.get_mut(tenant_id).ok_or(UserStoreError::NotFound(*user_id))?;
        let before = tenant_users.len();
        tenant_users.retain(|u| u.id != *user_id);
        if tenant_users.len() == before {
            return Err(UserStoreError::NotFound(*user_id));
        }
        Ok(())
    }

    fn modify<F>(&self, tenant_id: &Uuid, user_id: &Uuid, f: F) -> Result<User, UserStoreError>
    where
        F: FnOnce(&mut User),
    {
        let mut users = self.users.write();
        let user = users
            .get_mut(tenant_id)
            .and_then(|users| users.iter_mut().find(|u| u.id == *user_id))
            .ok_or(UserStoreError::NotFound(*user_id))?;
        f(user);
        Ok(user.clone())
    }
}
