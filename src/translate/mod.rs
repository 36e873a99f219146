pub mod anthropic;
pub mod deepl;
pub mod factory;
pub mod gemini;
pub mod openai;
pub mod prompt;

pub use anthropic::AnthropicTranslator;
pub use deepl::DeepLTranslator;
pub use factory::{ProviderFactory, ProviderInfo};
pub use gemini::GeminiTranslator;
pub use openai::OpenAiTranslator;
pub use prompt::{apply_android_limitations, build_prompt, PromptOptions, ANDROID_CHAR_LIMIT};

use crate::config::ProviderConfig;
use crate::error::{RelnotesError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{error, warn};

/// Configuration key the factory stores a resolved API key under.
pub const API_TOKEN_KEY: &str = "api_token";

/// An optional tuning parameter accepted by a provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub default: Option<&'static str>,
    pub description: &'static str,
    /// Consulted when the configuration does not carry the parameter.
    pub env_var: Option<&'static str>,
}

/// Static identity of a provider backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProviderDescriptor {
    pub name: &'static str,
    pub display_name: &'static str,
    pub required_credentials: &'static [&'static str],
    pub optional_params: &'static [ParamSpec],
}

impl ProviderDescriptor {
    pub fn param(&self, name: &str) -> Option<&'static ParamSpec> {
        self.optional_params.iter().find(|p| p.name == name)
    }

    /// Look up an optional parameter: configuration, then its env var, then its default.
    pub fn option(&self, config: &ProviderConfig, name: &str) -> Option<String> {
        if let Some(value) = config.get(name) {
            return Some(value.to_string());
        }

        let param = self.param(name)?;
        param
            .env_var
            .and_then(non_empty_env)
            .or_else(|| param.default.map(str::to_string))
    }

    /// Typed variant of [`ProviderDescriptor::option`]; unparseable values fall back to the default.
    pub fn parsed_option<T: std::str::FromStr>(&self, config: &ProviderConfig, name: &str) -> Option<T> {
        let value = self.option(config, name)?;
        match value.parse() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                warn!(
                    "{}: invalid value '{}' for {}, using default",
                    self.display_name, value, name
                );
                self.param(name)?.default?.parse().ok()
            }
        }
    }

    /// Credential lookup: `TRANSLATE_<PROVIDER>_<KEY>` first, then the configuration.
    pub fn credential(&self, config: &ProviderConfig, key: &str) -> Option<String> {
        let env_name = format!("TRANSLATE_{}_{}", self.name, key).to_uppercase();
        non_empty_env(&env_name).or_else(|| config.get(key).map(str::to_string))
    }

    /// One error message per required credential that is missing or blank.
    pub fn validate(&self, config: &ProviderConfig) -> Vec<String> {
        self.required_credentials
            .iter()
            .filter(|key| self.credential(config, key).is_none())
            .map(|key| {
                format!(
                    "{} requires '{}' (or TRANSLATE_{}_{})",
                    self.display_name,
                    key,
                    self.name.to_uppercase(),
                    key.to_uppercase()
                )
            })
            .collect()
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[async_trait]
pub trait Translator: Send + Sync {
    fn descriptor(&self) -> &'static ProviderDescriptor;

    /// Human-readable provider name used in logs.
    fn name(&self) -> &'static str {
        self.descriptor().display_name
    }

    /// Problems found while validating the configuration at construction.
    fn config_errors(&self) -> &[String];

    fn is_valid(&self) -> bool {
        self.config_errors().is_empty()
    }

    fn ensure_valid(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(RelnotesError::InvalidProvider {
                provider: self.name().to_string(),
                errors: self.config_errors().to_vec(),
            })
        }
    }

    /// Make one translation attempt. Failures are logged and reported as `None`.
    async fn translate(&self, text: &str, source_locale: &str, target_locale: &str)
        -> Option<String>;
}

/// Collapse a backend call into the `Option` the trait promises, logging why
/// nothing came back. Text is passed through as the backend produced it.
pub(crate) fn settle(provider: &str, outcome: Result<Option<String>>) -> Option<String> {
    match outcome {
        Ok(Some(text)) => Some(text),
        Ok(None) => {
            warn!("{} returned no translation", provider);
            None
        }
        Err(e) => {
            error!("{} translation error: {}", provider, e);
            None
        }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Pull a vendor error message out of a JSON body, if there is one.
pub(crate) fn api_error_message(body: &str) -> Option<String> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    envelope
        .error
        .and_then(|e| e.message)
        .or(envelope.message)
}

/// Turn a non-success HTTP response into an error, preferring the vendor's message.
pub(crate) fn status_error(status: reqwest::StatusCode, body: &str) -> RelnotesError {
    match api_error_message(body) {
        Some(message) => RelnotesError::Api(format!("{} ({})", message, status)),
        None => RelnotesError::Api(format!("HTTP {}: {}", status, body)),
    }
}
