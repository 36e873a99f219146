use crate::config::ProviderConfig;
use crate::credentials::{credential_help, CredentialResolver};
use crate::error::{RelnotesError, Result};
use crate::translate::{
    anthropic, deepl, gemini, openai, AnthropicTranslator, DeepLTranslator, GeminiTranslator,
    OpenAiTranslator, ParamSpec, ProviderDescriptor, Translator, API_TOKEN_KEY,
};
use tracing::debug;

pub const DEFAULT_PROVIDER: &str = "openai";

type Constructor = fn(&ProviderConfig) -> Box<dyn Translator>;

struct ProviderEntry {
    descriptor: &'static ProviderDescriptor,
    construct: Constructor,
}

const PROVIDERS: &[ProviderEntry] = &[
    ProviderEntry {
        descriptor: &openai::DESCRIPTOR,
        construct: build_openai,
    },
    ProviderEntry {
        descriptor: &anthropic::DESCRIPTOR,
        construct: build_anthropic,
    },
    ProviderEntry {
        descriptor: &gemini::DESCRIPTOR,
        construct: build_gemini,
    },
    ProviderEntry {
        descriptor: &deepl::DESCRIPTOR,
        construct: build_deepl,
    },
];

fn build_openai(config: &ProviderConfig) -> Box<dyn Translator> {
    Box::new(OpenAiTranslator::new(config))
}

fn build_anthropic(config: &ProviderConfig) -> Box<dyn Translator> {
    Box::new(AnthropicTranslator::new(config))
}

fn build_gemini(config: &ProviderConfig) -> Box<dyn Translator> {
    Box::new(GeminiTranslator::new(config))
}

fn build_deepl(config: &ProviderConfig) -> Box<dyn Translator> {
    Box::new(DeepLTranslator::new(config))
}

/// Everything a caller may want to show about a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderInfo {
    pub name: &'static str,
    pub display_name: &'static str,
    pub required_credentials: &'static [&'static str],
    pub optional_params: &'static [ParamSpec],
    pub credential_help: String,
}

/// Builds provider instances with credentials resolved from config or environment.
#[derive(Debug, Default)]
pub struct ProviderFactory {
    resolver: CredentialResolver,
}

impl ProviderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolver(resolver: CredentialResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &CredentialResolver {
        &self.resolver
    }

    /// Create a provider, resolving its API key. `None` or a blank name selects OpenAI.
    pub fn create(&self, provider: Option<&str>, config: &ProviderConfig) -> Result<Box<dyn Translator>> {
        let entry = lookup_entry(provider)?;
        let name = entry.descriptor.name;

        let api_key = self.resolver.resolve(name, config).ok_or_else(|| {
            RelnotesError::MissingCredential {
                provider: entry.descriptor.display_name.to_string(),
                help: credential_help(name),
            }
        })?;

        debug!("Creating {} provider", entry.descriptor.display_name);
        Ok(construct(entry, config, &api_key))
    }

    /// Create a provider with an explicit key, bypassing resolution. A blank key
    /// yields an invalid instance rather than an error.
    pub fn create_with_key(
        &self,
        provider: Option<&str>,
        api_key: &str,
        config: &ProviderConfig,
    ) -> Result<Box<dyn Translator>> {
        let entry = lookup_entry(provider)?;
        Ok(construct(entry, config, api_key))
    }

    pub fn is_valid_provider(name: &str) -> bool {
        find_entry(name).is_some()
    }

    pub fn provider_info(name: &str) -> Option<ProviderInfo> {
        find_entry(name).map(|entry| {
            let d = entry.descriptor;
            ProviderInfo {
                name: d.name,
                display_name: d.display_name,
                required_credentials: d.required_credentials,
                optional_params: d.optional_params,
                credential_help: credential_help(d.name),
            }
        })
    }

    pub fn available_provider_names() -> Vec<&'static str> {
        PROVIDERS.iter().map(|e| e.descriptor.name).collect()
    }

    /// `(name, display name)` pairs in table order.
    pub fn provider_display_names() -> Vec<(&'static str, &'static str)> {
        PROVIDERS
            .iter()
            .map(|e| (e.descriptor.name, e.descriptor.display_name))
            .collect()
    }
}

fn find_entry(name: &str) -> Option<&'static ProviderEntry> {
    let name = name.trim().to_lowercase();
    PROVIDERS.iter().find(|e| e.descriptor.name == name)
}

fn lookup_entry(provider: Option<&str>) -> Result<&'static ProviderEntry> {
    let name = provider
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PROVIDER);

    find_entry(name).ok_or_else(|| RelnotesError::UnknownProvider {
        name: name.to_string(),
        available: ProviderFactory::available_provider_names().join(", "),
    })
}

fn construct(entry: &ProviderEntry, config: &ProviderConfig, api_key: &str) -> Box<dyn Translator> {
    let mut config = config.clone();
    config.set(API_TOKEN_KEY, api_key);
    (entry.construct)(&config)
}
