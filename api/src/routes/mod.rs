//! API Routes

pub mod auth;
pub mod health;
pub mod providers;
pub mod quotas;
pub mod tenants;
pub mod users;
