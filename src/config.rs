use crate::error::{RelnotesError, Result};
use crate::translate::ProviderFactory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Target store platform. Only Android carries a character ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Ios,
    Android,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Ios => write!(f, "ios"),
            Platform::Android => write!(f, "android"),
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ios" => Ok(Platform::Ios),
            "android" => Ok(Platform::Android),
            _ => Err(format!("Unknown platform: {}. Use 'ios' or 'android'", s)),
        }
    }
}

/// Flat key/value settings handed to a provider at construction.
///
/// Keys the provider does not recognise are ignored. Blank values are treated
/// as absent by every getter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderConfig {
    values: BTreeMap<String, String>,
}

impl ProviderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Raw value, including blank ones.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Trimmed value, `None` when missing or blank.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.raw(key).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn get_f32(&self, key: &str) -> Option<f32> {
        self.parse(key)
    }

    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.parse(key)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.parse(key)
    }

    fn parse<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match value.parse() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                warn!("Ignoring unparseable value for '{}': {}", key, value);
                None
            }
        }
    }

    /// The configured platform. Anything other than "android" counts as iOS.
    pub fn platform(&self) -> Platform {
        self.get("platform")
            .and_then(|p| p.parse().ok())
            .unwrap_or_default()
    }

    pub fn context(&self) -> Option<&str> {
        self.get("context")
    }

    /// Copy every entry of `other` over this one.
    pub fn merge(&mut self, other: &ProviderConfig) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Build from a TOML table, stringifying scalar values.
    pub fn from_toml_table(table: &toml::Table) -> Self {
        let mut config = Self::new();
        for (key, value) in table {
            let text = match value {
                toml::Value::String(s) => s.clone(),
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                other => {
                    warn!("Ignoring non-scalar option '{}' ({})", key, other.type_str());
                    continue;
                }
            };
            config.set(key.clone(), text);
        }
        config
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ProviderConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut config = Self::new();
        for (key, value) in iter {
            config.set(key, value);
        }
        config
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: Option<String>,
    pub platform: Platform,
    pub master_locale: String,
    pub metadata_path: Option<PathBuf>,
    pub delay_ms: u64,
    /// Forwarded verbatim into the provider configuration.
    pub options: toml::Table,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: None,
            platform: Platform::default(),
            master_locale: "en-US".to_string(),
            metadata_path: None,
            delay_ms: 500,
            options: toml::Table::new(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_file_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };

        config.apply_env_overrides(|name| std::env::var(name).ok());

        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Override fields from `RELNOTES_*` variables supplied by `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(provider) = lookup("RELNOTES_PROVIDER") {
            self.provider = Some(provider.trim().to_string());
        }
        if let Some(platform) = lookup("RELNOTES_PLATFORM") {
            match platform.parse() {
                Ok(p) => self.platform = p,
                Err(e) => warn!("{}", e),
            }
        }
        if let Some(locale) = lookup("RELNOTES_MASTER_LOCALE") {
            self.master_locale = locale.trim().to_string();
        }
        if let Some(delay) = lookup("RELNOTES_DELAY_MS") {
            match delay.trim().parse() {
                Ok(d) => self.delay_ms = d,
                Err(_) => warn!("Ignoring invalid RELNOTES_DELAY_MS: {}", delay),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(ref provider) = self.provider {
            if !ProviderFactory::is_valid_provider(provider) {
                return Err(RelnotesError::Config(format!(
                    "Unknown provider '{}'. Use one of: {}",
                    provider,
                    ProviderFactory::available_provider_names().join(", ")
                )));
            }
        }

        if self.master_locale.trim().is_empty() {
            return Err(RelnotesError::Config(
                "master_locale must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Provider settings derived from this config: the `[options]` table plus
    /// `platform` and `master_locale`.
    pub fn provider_config(&self) -> ProviderConfig {
        let mut provider_config = ProviderConfig::from_toml_table(&self.options);
        provider_config.set("platform", self.platform.to_string());
        provider_config.set("master_locale", self.master_locale.clone());
        provider_config
    }

    pub fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("relnotes").join("config.toml"))
    }
}
