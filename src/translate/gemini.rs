//! Gemini-based translation using the Generative Language API.

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

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "model_name",
        default: Some("gemini-2.0-flash"),
        description: "Gemini model used for translation",
        env_var: Some("GEMINI_MODEL_NAME"),
    },
    ParamSpec {
        name: "temperature",
        default: Some("0.5"),
        description: "Sampling temperature (0.0 - 2.0)",
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
    name: "gemini",
    display_name: "Google Gemini",
    required_credentials: &[API_TOKEN_KEY],
    optional_params: PARAMS,
};

/// Translator using Google Gemini API.
pub struct GeminiTranslator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    timeout: Duration,
    prompt_options: PromptOptions,
    errors: Vec<String>,
}

impl GeminiTranslator {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: GEMINI_BASE_URL.to_string(),
            api_key: DESCRIPTOR
                .credential(config, API_TOKEN_KEY)
                .unwrap_or_default(),
            model: DESCRIPTOR
                .option(config, "model_name")
                .unwrap_or_else(|| "gemini-2.0-flash".to_string()),
            temperature: DESCRIPTOR.parsed_option(config, "temperature").unwrap_or(0.5),
            timeout: Duration::from_secs(
                DESCRIPTOR.parsed_option(config, "request_timeout").unwrap_or(60),
            ),
            prompt_options: PromptOptions::from_config(config),
            errors: DESCRIPTOR.validate(config),
        }
    }

    /// Set a different model (e.g., "gemini-1.5-pro").
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn build_prompt(&self, text: &str, source: &str, target: &str) -> String {
        build_prompt(text, source, target, &self.prompt_options)
    }

    async fn request(&self, prompt: String) -> Result<Option<String>> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        debug!("Gemini request: model={}", self.model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        parse_response(&body)
    }
}

/// Extract the first candidate's text. Any missing layer is a normal empty result.
pub fn parse_response(body: &str) -> Result<Option<String>> {
    let gemini_response: GeminiResponse = serde_json::from_str(body)?;

    if let Some(error) = gemini_response.error {
        return Err(RelnotesError::Api(format!("Gemini error: {}", error.message)));
    }

    Ok(gemini_response
        .candidates
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.content)
        .and_then(|c| c.parts)
        .and_then(|p| p.into_iter().next())
        .and_then(|p| p.text)
        .map(|t| t.trim().to_string()))
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize, Debug)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiError>,
}

#[derive(Deserialize, Debug)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Deserialize, Debug)]
struct GeminiResponseContent {
    parts: Option<Vec<GeminiResponsePart>>,
}

#[derive(Deserialize, Debug)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
struct GeminiError {
    message: String,
}

#[async_trait]
impl Translator for GeminiTranslator {
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
