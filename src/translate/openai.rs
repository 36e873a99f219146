//! OpenAI chat-completions backend.

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
use tracing::{debug, info};

const OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Flex processing queues requests; anything shorter than this times out.
pub const FLEX_MIN_TIMEOUT_SECS: u64 = 900;

const PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "model_name",
        default: Some("gpt-4o-mini"),
        description: "Chat model used for translation",
        env_var: Some("OPENAI_MODEL_NAME"),
    },
    ParamSpec {
        name: "temperature",
        default: Some("0.5"),
        description: "Sampling temperature (0.0 - 2.0)",
        env_var: None,
    },
    ParamSpec {
        name: "service_tier",
        default: None,
        description: "Processing tier: auto, default, flex or priority",
        env_var: Some("OPENAI_SERVICE_TIER"),
    },
    ParamSpec {
        name: "request_timeout",
        default: Some("30"),
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
    name: "openai",
    display_name: "OpenAI",
    required_credentials: &[API_TOKEN_KEY],
    optional_params: PARAMS,
};

pub struct OpenAiTranslator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    service_tier: Option<String>,
    timeout: Duration,
    prompt_options: PromptOptions,
    errors: Vec<String>,
}

impl OpenAiTranslator {
    pub fn new(config: &ProviderConfig) -> Self {
        let errors = DESCRIPTOR.validate(config);
        let service_tier = DESCRIPTOR.option(config, "service_tier");
        let requested = DESCRIPTOR
            .parsed_option(config, "request_timeout")
            .unwrap_or(30);

        Self {
            client: Client::new(),
            base_url: OPENAI_BASE_URL.to_string(),
            api_key: DESCRIPTOR
                .credential(config, API_TOKEN_KEY)
                .unwrap_or_default(),
            model: DESCRIPTOR
                .option(config, "model_name")
                .unwrap_or_else(|| "gpt-4o-mini".to_string()),
            temperature: DESCRIPTOR.parsed_option(config, "temperature").unwrap_or(0.5),
            timeout: Duration::from_secs(effective_timeout(service_tier.as_deref(), requested)),
            service_tier,
            prompt_options: PromptOptions::from_config(config),
            errors,
        }
    }

    /// Point requests at a different host, e.g. a proxy or a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn build_prompt(&self, text: &str, source: &str, target: &str) -> String {
        build_prompt(text, source, target, &self.prompt_options)
    }

    async fn request(&self, prompt: String) -> Result<Option<String>> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let request = ChatRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            service_tier: self.service_tier.as_deref(),
        };

        debug!("OpenAI request: model={} timeout={:?}", self.model, self.timeout);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)?;
        if let Some(error) = parsed.error {
            return Err(RelnotesError::Api(error.message));
        }

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|t| t.trim().to_string()))
    }
}

/// Flex tier needs at least [`FLEX_MIN_TIMEOUT_SECS`]; other tiers keep what was asked.
fn effective_timeout(service_tier: Option<&str>, requested: u64) -> u64 {
    let is_flex = service_tier.is_some_and(|t| t.eq_ignore_ascii_case("flex"));
    if is_flex && requested < FLEX_MIN_TIMEOUT_SECS {
        info!(
            "Flex service tier selected; raising request timeout from {}s to {}s",
            requested, FLEX_MIN_TIMEOUT_SECS
        );
        FLEX_MIN_TIMEOUT_SECS
    } else {
        requested
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    service_tier: Option<&'a str>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ApiError>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiError {
    message: String,
}

#[async_trait]
impl Translator for OpenAiTranslator {
    fn descriptor(&self) -> &'static ProviderDescriptor {
        &DESCRIPTOR
    }

    fn config_errors(&self) -> &[String] {
        &self.errors
    }

    async fn translate(&self, text: &str, source_locale: &str, target_locale: &str) -> Option<String> {
        let prompt = self.build_prompt(text, source_locale, target_locale);
        settle(self.name(), self.request(prompt).await)
    }
}
