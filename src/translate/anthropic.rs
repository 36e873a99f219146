//! Anthropic text-completions backend.

use crate::config::ProviderConfig;
use crate::error::{RelnotesError, Result};
use crate::translate::prompt::{build_prompt, PromptOptions};
use crate::translate::{
    settle, status_error, ParamSpec, ProviderDescriptor, Translator, API_TOKEN_KEY,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

const PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "model_name",
        default: Some("claude-2.1"),
        description: "Completion model used for translation",
        env_var: Some("ANTHROPIC_MODEL_NAME"),
    },
    ParamSpec {
        name: "temperature",
        default: Some("0.5"),
        description: "Sampling temperature (0.0 - 1.0)",
        env_var: None,
    },
    ParamSpec {
        name: "max_tokens",
        default: Some("1024"),
        description: "Upper bound on generated tokens",
        env_var: None,
    },
    ParamSpec {
        name: "request_timeout",
        default: Some("60"),
        description: "Seconds before the request is abandoned",
        env_var: None,
    },
    ParamSpec {
        name: "context",
        default: None,
        description: "Domain hint appended to the prompt",
        env_var: None,
    },
];

pub const DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    name: "anthropic",
    display_name: "Anthropic Claude",
    required_credentials: &[API_TOKEN_KEY],
    optional_params: PARAMS,
};

pub struct AnthropicTranslator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
    prompt_options: PromptOptions,
    errors: Vec<String>,
}

impl AnthropicTranslator {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: ANTHROPIC_BASE_URL.to_string(),
            api_key: DESCRIPTOR
                .credential(config, API_TOKEN_KEY)
                .unwrap_or_default(),
            model: DESCRIPTOR
                .option(config, "model_name")
                .unwrap_or_else(|| "claude-2.1".to_string()),
            temperature: DESCRIPTOR.parsed_option(config, "temperature").unwrap_or(0.5),
            max_tokens: DESCRIPTOR.parsed_option(config, "max_tokens").unwrap_or(1024),
            timeout: Duration::from_secs(
                DESCRIPTOR.parsed_option(config, "request_timeout").unwrap_or(60),
            ),
            prompt_options: PromptOptions::from_config(config),
            errors: DESCRIPTOR.validate(config),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn build_prompt(&self, text: &str, source: &str, target: &str) -> String {
        build_prompt(text, source, target, &self.prompt_options)
    }

    async fn request(&self, prompt: &str) -> Result<Option<String>> {
        let url = format!("{}/v1/complete", self.base_url.trim_end_matches('/'));
        let request = CompletionRequest {
            model: &self.model,
            prompt: wrap_turn(prompt),
            max_tokens_to_sample: self.max_tokens,
            temperature: self.temperature,
        };

        debug!("Anthropic request: model={} max_tokens={}", self.model, self.max_tokens);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        let parsed: CompletionResponse = serde_json::from_str(&body)?;
        if let Some(error) = parsed.error {
            return Err(RelnotesError::Api(error.message));
        }

        Ok(parsed.completion.map(|t| t.trim().to_string()))
    }
}

/// Single human turn in the legacy completion format.
fn wrap_turn(prompt: &str) -> String {
    format!("\n\nHuman: {prompt}\n\nAssistant:")
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: String,
    max_tokens_to_sample: u32,
    temperature: f32,
}

#[derive(Deserialize, Debug)]
struct CompletionResponse {
    completion: Option<String>,
    error: Option<ApiError>,
}

#[derive(Deserialize, Debug)]
struct ApiError {
    message: String,
}

#[async_trait]
impl Translator for AnthropicTranslator {
    fn descriptor(&self) -> &'static ProviderDescriptor {
        &DESCRIPTOR
    }

    fn config_errors(&self) -> &[String] {
        &self.errors
    }

    async fn translate(&self, text: &str, source_locale: &str, target_locale: &str) -> Option<String> {
        let prompt = self.build_prompt(text, source_locale, target_locale);
        settle(self.name(), self.request(&prompt).await)
    }
}
