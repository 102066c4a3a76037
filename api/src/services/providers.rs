//! LLM provider configuration per tenant

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAi,
    Anthropic,
    Google,
    Groq,
}

impl LlmProvider {
    pub const ALL: [LlmProvider; 4] = [Self::OpenAi, Self::Anthropic, Self::Google, Self::Groq];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
            Self::Groq => "groq",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider name outside [`LlmProvider::ALL`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for LlmProvider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownProvider(s.to_string()))
    }
}

/// Stored provider configuration
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider: LlmProvider,
    pub api_key: String,
    pub enabled: bool,
    pub default_model: Option<String>,
    pub base_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ProviderConfig {
    /// Last four characters of the key, rest hidden
    pub fn masked_key(&self) -> String {
        mask_key(&self.api_key)
    }
}

/// Result of a local configuration check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderCheck {
    Ok,
    NotConfigured,
    Disabled,
}

/// Provider configurations keyed by (tenant, provider)
#[derive(Default)]
pub struct ProviderStore {
    configs: DashMap<(Uuid, LlmProvider), ProviderConfig>,
}

impl ProviderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tenant_id: Uuid, provider: LlmProvider) -> Option<ProviderConfig> {
        self.configs.get(&(tenant_id, provider)).map(|c| c.clone())
    }

    pub fn upsert(&self, tenant_id: Uuid, config: ProviderConfig) -> ProviderConfig {
        tracing::info!(tenant_id = %tenant_id, provider = %config.provider, "provider configured");
        self.configs.insert((tenant_id, config.provider), config.clone());
        config
    }

    /// Returns whether a configuration existed
    pub fn remove(&self, tenant_id: Uuid, provider: LlmProvider) -> bool {
        self.configs.remove(&(tenant_id, provider)).is_some()
    }

    pub fn check(&self, tenant_id: Uuid, provider: LlmProvider) -> ProviderCheck {
        match self.get(tenant_id, provider) {
            None => ProviderCheck::NotConfigured,
            Some(config) if config.api_key.trim().is_empty() => ProviderCheck::NotConfigured,
            Some(config) if !config.enabled => ProviderCheck::Disabled,
            Some(_) => ProviderCheck::Ok,
        }
    }
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: LlmProvider, enabled: bool) -> ProviderConfig {
        ProviderConfig {
            provider,
            api_key: "sk-test-123456".into(),
            enabled,
            default_model: None,
            base_url: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_parse_provider() {
        assert_eq!("openai".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAi);
        assert_eq!("Groq".parse::<LlmProvider>().unwrap(), LlmProvider::Groq);
        let err = "mistral".parse::<LlmProvider>().unwrap_err();
        assert_eq!(err, UnknownProvider("mistral".into()));
        assert_eq!(err.to_string(), "unknown provider: mistral");
    }

    #[test]
    fn test_masking() {
        assert_eq!(mask_key("sk-test-123456"), "**********3456");
        assert_eq!(mask_key("abc"), "***");
    }

    #[test]
    fn test_check_states() {
        let store = ProviderStore::new();
        let tenant = Uuid::new_v4();
        assert_eq!(store.check(tenant, LlmProvider::Anthropic), ProviderCheck::NotConfigured);

        store.upsert(tenant, config(LlmProvider::Anthropic, false));
        assert_eq!(store.check(tenant, LlmProvider::Anthropic), ProviderCheck::Disabled);

        store.upsert(tenant, config(LlmProvider::Anthropic, true));
        assert_eq!(store.check(tenant, LlmProvider::Anthropic), ProviderCheck::Ok);
        assert_eq!(store.check(Uuid::new_v4(), LlmProvider::Anthropic), ProviderCheck::NotConfigured);

        assert!(store.remove(tenant, LlmProvider::Anthropic));
        assert!(!store.remove(tenant, LlmProvider::Anthropic));
    }
}
