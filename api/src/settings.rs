//! Service settings
//!
//! Layered with the `config` crate: built-in defaults, then optional
//! `config/default` and `config/local` files, then `PLATFORM__*`
//! environment variables (`PLATFORM__SERVER__PORT=9000`).

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

const MIN_SECRET_LEN: usize = 32;

/// Settings root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub service: ServiceSettings,
    pub server: ServerSettings,
    pub cors: CorsSettings,
    pub auth: AuthSettings,
    pub tenancy: TenancySettings,
    pub rate_limit: RateLimitSettings,
    pub metrics: MetricsSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
    pub name: String,
    pub version: String,
    /// development, staging or production
    pub environment: String,
    /// Serves the OpenAPI UI when set
    pub debug: bool,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins. Accepts a list or a comma-separated string.
    #[serde(deserialize_with = "origin_list")]
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_days: i64,
    pub password_min_length: usize,
    pub password_require_uppercase: bool,
    pub password_require_lowercase: bool,
    pub password_require_numbers: bool,
    pub password_require_special: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenancySettings {
    pub max_tenants: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub enabled: bool,
    pub per_minute: u32,
    pub burst: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
}

/// Settings error
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl Settings {
    /// Load and validate settings
    pub fn load() -> Result<Self, SettingsError> {
        let defaults = Self::default();
        let config = config::Config::builder()
            .set_default("service.name", defaults.service.name)?
            .set_default("service.version", defaults.service.version)?
            .set_default("service.environment", defaults.service.environment)?
            .set_default("service.debug", defaults.service.debug)?
            .set_default("service.log_level", defaults.service.log_level)?
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("cors.origins", defaults.cors.origins)?
            .set_default("auth.jwt_secret", defaults.auth.jwt_secret)?
            .set_default("auth.jwt_issuer", defaults.auth.jwt_issuer)?
            .set_default("auth.access_token_expire_minutes", defaults.auth.access_token_expire_minutes)?
            .set_default("auth.refresh_token_expire_days", defaults.auth.refresh_token_expire_days)?
            .set_default("auth.password_min_length", defaults.auth.password_min_length as i64)?
            .set_default("auth.password_require_uppercase", defaults.auth.password_require_uppercase)?
            .set_default("auth.password_require_lowercase", defaults.auth.password_require_lowercase)?
            .set_default("auth.password_require_numbers", defaults.auth.password_require_numbers)?
            .set_default("auth.password_require_special", defaults.auth.password_require_special)?
            .set_default("tenancy.max_tenants", defaults.tenancy.max_tenants as i64)?
            .set_default("rate_limit.enabled", defaults.rate_limit.enabled)?
            .set_default("rate_limit.per_minute", i64::from(defaults.rate_limit.per_minute))?
            .set_default("rate_limit.burst", i64::from(defaults.rate_limit.burst))?
            .set_default("metrics.enabled", defaults.metrics.enabled)?
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("PLATFORM")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.server.port == 0 {
            return Err(invalid("server.port", "must be non-zero"));
        }
        if self.tenancy.max_tenants == 0 {
            return Err(invalid("tenancy.max_tenants", "must be at least 1"));
        }
        if self.auth.jwt_secret.is_empty() {
            return Err(invalid("auth.jwt_secret", "must not be empty"));
        }
        if !self.is_development() && self.auth.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(invalid(
                "auth.jwt_secret",
                format!("must be at least {MIN_SECRET_LEN} bytes outside development"),
            ));
        }
        if self.auth.access_token_expire_minutes <= 0 || self.auth.refresh_token_expire_days <= 0 {
            return Err(invalid("auth", "token lifetimes must be positive"));
        }
        if self.rate_limit.enabled && (self.rate_limit.per_minute == 0 || self.rate_limit.burst == 0) {
            return Err(invalid("rate_limit", "per_minute and burst must be positive when enabled"));
        }
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.service.environment == "development"
    }

    /// `host:port` to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service: ServiceSettings {
                name: "platform-api".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                environment: "development".into(),
                debug: false,
                log_level: "info".into(),
            },
            server: ServerSettings {
                host: "0.0.0.0".into(),
                port: 8082,
            },
            cors: CorsSettings {
                origins: vec![
                    "http://localhost:3000".into(),
                    "http://localhost:3001".into(),
                    "http://localhost:3002".into(),
                ],
            },
            auth: AuthSettings {
                jwt_secret: "change-this-secret-in-production".into(),
                jwt_issuer: "platform-api".into(),
                access_token_expire_minutes: 30,
                refresh_token_expire_days: 7,
                password_min_length: 8,
                password_require_uppercase: true,
                password_require_lowercase: true,
                password_require_numbers: true,
                password_require_special: true,
            },
            tenancy: TenancySettings { max_tenants: 1000 },
            rate_limit: RateLimitSettings {
                enabled: true,
                per_minute: 60,
                burst: 60,
            },
            metrics: MetricsSettings { enabled: true },
        }
    }
}

fn invalid(key: &'static str, reason: impl Into<String>) -> SettingsError {
    SettingsError::Invalid {
        key,
        reason: reason.into(),
    }
}

fn origin_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Origins {
        Joined(String),
        List(Vec<String>),
    }

    let origins = match Origins::deserialize(deserializer)? {
        Origins::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        Origins::List(list) => list,
    };
    Ok(origins
        .into_iter()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect())
}
