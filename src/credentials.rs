//! API key lookup for each supported provider.
//!
//! Keys are resolved from an explicit configuration parameter first (the
//! provider's own key, then the generic `api_token`), then from an ordered
//! list of environment variables. Lookups are read-only.

use crate::config::ProviderConfig;
use crate::translate::API_TOKEN_KEY;

/// Where the key for one provider may come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialSource {
    pub provider: &'static str,
    /// Probed in order; earlier entries win.
    pub env_vars: &'static [&'static str],
    /// Configuration key holding an explicit override.
    pub param_key: &'static str,
}

pub const CREDENTIAL_SOURCES: &[CredentialSource] = &[
    CredentialSource {
        provider: "openai",
        env_vars: &["OPENAI_API_KEY", "GPT_API_KEY"],
        param_key: "openai_api_key",
    },
    CredentialSource {
        provider: "anthropic",
        env_vars: &["ANTHROPIC_API_KEY"],
        param_key: "anthropic_api_key",
    },
    CredentialSource {
        provider: "gemini",
        env_vars: &["GEMINI_API_KEY"],
        param_key: "gemini_api_key",
    },
    CredentialSource {
        provider: "deepl",
        env_vars: &["DEEPL_API_KEY"],
        param_key: "deepl_api_key",
    },
];

type EnvLookup = dyn Fn(&str) -> Option<String> + Send + Sync;

pub struct CredentialResolver {
    env: Box<EnvLookup>,
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialResolver").finish_non_exhaustive()
    }
}

impl CredentialResolver {
    /// Resolver backed by the process environment.
    pub fn new() -> Self {
        Self::with_env(|name| std::env::var(name).ok())
    }

    /// Resolver backed by a custom environment lookup.
    pub fn with_env<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            env: Box::new(lookup),
        }
    }

    /// Find the best available key for `provider`, trimmed.
    pub fn resolve(&self, provider: &str, config: &ProviderConfig) -> Option<String> {
        let source = find_source(provider)?;

        if let Some(key) = config
            .get(source.param_key)
            .or_else(|| config.get(API_TOKEN_KEY))
        {
            return Some(key.to_string());
        }

        source
            .env_vars
            .iter()
            .filter_map(|var| (self.env)(var))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
    }

    pub fn credentials_exist(&self, provider: &str, config: &ProviderConfig) -> bool {
        self.resolve(provider, config).is_some()
    }

    /// Every known provider that currently has a usable key.
    pub fn available_providers(&self, config: &ProviderConfig) -> Vec<&'static str> {
        CREDENTIAL_SOURCES
            .iter()
            .filter(|source| self.credentials_exist(source.provider, config))
            .map(|source| source.provider)
            .collect()
    }
}

fn find_source(provider: &str) -> Option<&'static CredentialSource> {
    let provider = provider.trim().to_lowercase();
    CREDENTIAL_SOURCES.iter().find(|s| s.provider == provider)
}

/// Remediation text naming every variable and the parameter key to set.
pub fn credential_help(provider: &str) -> String {
    match find_source(provider) {
        Some(source) => {
            let vars = source.env_vars.join(" or ");
            format!(
                "Set {} environment variable, or pass the '{}' (or '{}') parameter.",
                vars, source.param_key, API_TOKEN_KEY
            )
        }
        None => format!("Unknown provider: {}", provider),
    }
}

pub fn all_providers() -> Vec<&'static str> {
    CREDENTIAL_SOURCES.iter().map(|s| s.provider).collect()
}
