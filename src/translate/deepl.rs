//! DeepL translation backend.
//!
//! Unlike the language-model backends, DeepL takes explicit source and target
//! languages and returns plain text, so the Android changelog ceiling is
//! enforced here by truncation rather than requested in a prompt.

use crate::config::{Platform, ProviderConfig};
use crate::error::{RelnotesError, Result};
use crate::translate::prompt::ANDROID_CHAR_LIMIT;
use crate::translate::{
    settle, status_error, ParamSpec, ProviderDescriptor, Translator, API_TOKEN_KEY,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEEPL_FREE_URL: &str = "https://api-free.deepl.com";
pub const DEEPL_PRO_URL: &str = "https://api.deepl.com";

/// Keys for the free plan carry this suffix.
const FREE_KEY_SUFFIX: &str = ":fx";

const PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "formality",
        default: Some("default"),
        description: "Register of the output: default, more or less",
        env_var: Some("DEEPL_FORMALITY"),
    },
    ParamSpec {
        name: "context",
        default: None,
        description: "Extra context that influences the translation",
        env_var: None,
    },
    ParamSpec {
        name: "request_timeout",
        default: Some("30"),
        description: "Seconds before the request is abandoned",
        env_var: None,
    },
];

pub const DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    name: "deepl",
    display_name: "DeepL",
    required_credentials: &[API_TOKEN_KEY],
    optional_params: PARAMS,
};

pub struct DeepLTranslator {
    client: Client,
    base_url: String,
    api_key: String,
    formality: Option<String>,
    context: Option<String>,
    platform: Platform,
    timeout: Duration,
    errors: Vec<String>,
}

impl DeepLTranslator {
    pub fn new(config: &ProviderConfig) -> Self {
        let api_key = DESCRIPTOR
            .credential(config, API_TOKEN_KEY)
            .unwrap_or_default();

        Self {
            client: Client::new(),
            base_url: endpoint_for_key(&api_key).to_string(),
            api_key,
            formality: DESCRIPTOR
                .option(config, "formality")
                .filter(|f| !f.eq_ignore_ascii_case("default")),
            context: config.context().map(str::to_string),
            platform: config.platform(),
            timeout: Duration::from_secs(
                DESCRIPTOR.parsed_option(config, "request_timeout").unwrap_or(30),
            ),
            errors: DESCRIPTOR.validate(config),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn formality(&self) -> Option<&str> {
        self.formality.as_deref()
    }

    async fn request(&self, text: &str, source: &str, target: &str) -> Result<Option<String>> {
        let url = format!("{}/v2/translate", self.base_url.trim_end_matches('/'));
        let request = TranslateRequest {
            text: vec![text],
            source_lang: source,
            target_lang: target,
            formality: self.formality.as_deref(),
            context: self.context.as_deref(),
        };

        debug!("DeepL request: {} -> {}", source, target);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        let parsed: TranslateResponse = serde_json::from_str(&body)?;
        if let Some(message) = parsed.message {
            return Err(RelnotesError::Api(message));
        }

        Ok(parsed
            .translations
            .into_iter()
            .next()
            .map(|t| apply_platform_limit(t.text.trim().to_string(), self.platform)))
    }
}

/// Free-plan keys go to the free host; everything else to the paid one.
pub fn endpoint_for_key(api_key: &str) -> &'static str {
    if api_key.ends_with(FREE_KEY_SUFFIX) {
        DEEPL_FREE_URL
    } else {
        DEEPL_PRO_URL
    }
}

/// DeepL language code for a locale: the part before the first hyphen, uppercased.
pub fn normalize_locale(locale: &str) -> String {
    locale
        .trim()
        .split('-')
        .next()
        .unwrap_or_default()
        .to_uppercase()
}

/// Hard-truncate to the Android ceiling. Other platforms pass through.
pub fn apply_platform_limit(text: String, platform: Platform) -> String {
    if platform != Platform::Android {
        return text;
    }

    let length = text.chars().count();
    if length <= ANDROID_CHAR_LIMIT {
        return text;
    }

    warn!(
        "DeepL translation is {} characters; truncating to the {}-character Android limit",
        length, ANDROID_CHAR_LIMIT
    );
    text.chars().take(ANDROID_CHAR_LIMIT).collect()
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    text: Vec<&'a str>,
    source_lang: &'a str,
    target_lang: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    formality: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a str>,
}

#[derive(Deserialize, Debug)]
struct TranslateResponse {
    #[serde(default)]
    translations: Vec<Translation>,
    message: Option<String>,
}

#[derive(Deserialize, Debug)]
struct Translation {
    text: String,
}

#[async_trait]
impl Translator for DeepLTranslator {
    fn descriptor(&self) -> &'static ProviderDescriptor {
        &DESCRIPTOR
    }

    fn config_errors(&self) -> &[String] {
        &self.errors
    }

    async fn translate(&self, text: &str, source_locale: &str, target_locale: &str) -> Option<String> {
        let source = normalize_locale(source_locale);
        let target = normalize_locale(target_locale);
        settle(self.name(), self.request(text, &source, &target).await)
    }
}
