//! Mock API tests for translation providers
//!
//! Each backend is pointed at a local wiremock server so request shape and
//! response handling can be checked without real endpoints.

use relnotes::config::ProviderConfig;
use relnotes::translate::{
    AnthropicTranslator, DeepLTranslator, GeminiTranslator, OpenAiTranslator, Translator,
    ANDROID_CHAR_LIMIT, API_TOKEN_KEY,
};
use serde_json::json;
use std::net::TcpListener;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_with_key(key: &str) -> ProviderConfig {
    ProviderConfig::new().with(API_TOKEN_KEY, key)
}

// ============================================================================
// OpenAI API Mock Tests
// ============================================================================

mod openai_tests {
    use super::*;

    #[tokio::test]
    async fn test_openai_translates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "messages": [{ "role": "user" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "  Fehlerbehebungen \n" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let translator = OpenAiTranslator::new(&config_with_key("sk-test")).with_base_url(server.uri());
        let result = translator.translate("Bug fixes", "en-US", "de-DE").await;

        assert_eq!(result.as_deref(), Some("Fehlerbehebungen"));
    }

    #[tokio::test]
    async fn test_openai_sends_service_tier() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({ "service_tier": "flex", "model": "gpt-4o" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "Corrections" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = config_with_key("sk-test")
            .with("service_tier", "flex")
            .with("model_name", "gpt-4o");
        let translator = OpenAiTranslator::new(&config).with_base_url(server.uri());

        assert_eq!(translator.timeout().as_secs(), 900);
        assert_eq!(
            translator.translate("Fixes", "en-US", "fr-FR").await.as_deref(),
            Some("Corrections")
        );
    }

    #[tokio::test]
    async fn test_openai_error_payload_yields_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": { "message": "Rate limit reached" }
            })))
            .mount(&server)
            .await;

        let translator = OpenAiTranslator::new(&config_with_key("sk-test")).with_base_url(server.uri());
        assert_eq!(translator.translate("Fixes", "en-US", "it").await, None);
    }

    #[tokio::test]
    async fn test_openai_http_error_yields_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "message": "Incorrect API key provided" }
            })))
            .mount(&server)
            .await;

        let translator = OpenAiTranslator::new(&config_with_key("bad")).with_base_url(server.uri());
        assert_eq!(translator.translate("Fixes", "en-US", "it").await, None);
    }
}

// ============================================================================
// Anthropic API Mock Tests
// ============================================================================

mod anthropic_tests {
    use super::*;

    #[tokio::test]
    async fn test_anthropic_translates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/complete"))
            .and(header("x-api-key", "ak-test"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({
                "model": "claude-2.1",
                "max_tokens_to_sample": 1024
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "completion": " Correcciones de errores",
                "stop_reason": "stop_sequence"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let translator =
            AnthropicTranslator::new(&config_with_key("ak-test")).with_base_url(server.uri());
        let result = translator.translate("Bug fixes", "en-US", "es-ES").await;

        assert_eq!(result.as_deref(), Some("Correcciones de errores"));
    }

    #[tokio::test]
    async fn test_anthropic_error_payload_yields_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": { "type": "overloaded_error", "message": "Overloaded" }
            })))
            .mount(&server)
            .await;

        let translator =
            AnthropicTranslator::new(&config_with_key("ak-test")).with_base_url(server.uri());
        assert_eq!(translator.translate("Fixes", "en-US", "pl").await, None);
    }

    #[tokio::test]
    async fn test_anthropic_server_error_yields_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let translator =
            AnthropicTranslator::new(&config_with_key("ak-test")).with_base_url(server.uri());
        assert_eq!(translator.translate("Fixes", "en-US", "pl").await, None);
    }
}

// ============================================================================
// Gemini API Mock Tests
// ============================================================================

mod gemini_tests {
    use super::*;

    #[tokio::test]
    async fn test_gemini_translates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .and(query_param("key", "g-test"))
            .and(body_partial_json(json!({
                "contents": [{ "role": "user" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "バグ修正\n" }], "role": "model" }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let translator = GeminiTranslator::new(&config_with_key("g-test")).with_base_url(server.uri());
        let result = translator.translate("Bug fixes", "en-US", "ja").await;

        assert_eq!(result.as_deref(), Some("バグ修正"));
    }

    #[tokio::test]
    async fn test_gemini_custom_model_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-pro:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "Oprava chyb" }] } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let translator = GeminiTranslator::new(&config_with_key("g-test"))
            .with_model("gemini-1.5-pro")
            .with_base_url(server.uri());
        assert_eq!(
            translator.translate("Fix", "en-US", "cs").await.as_deref(),
            Some("Oprava chyb")
        );
    }

    #[tokio::test]
    async fn test_gemini_empty_candidates_yield_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let translator = GeminiTranslator::new(&config_with_key("g-test")).with_base_url(server.uri());
        assert_eq!(translator.translate("Fix", "en-US", "cs").await, None);
    }

    #[tokio::test]
    async fn test_gemini_server_error_yields_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": { "code": 500, "message": "Internal error" }
            })))
            .mount(&server)
            .await;

        let translator = GeminiTranslator::new(&config_with_key("g-test")).with_base_url(server.uri());
        assert_eq!(translator.translate("Fix", "en-US", "cs").await, None);
    }
}

// ============================================================================
// DeepL API Mock Tests
// ============================================================================

mod deepl_tests {
    use super::*;

    #[tokio::test]
    async fn test_deepl_translates_with_normalized_locales() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/translate"))
            .and(header("authorization", "DeepL-Auth-Key dl-test:fx"))
            .and(body_partial_json(json!({
                "text": ["Bug fixes"],
                "source_lang": "EN",
                "target_lang": "PT"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "translations": [{ "detected_source_language": "EN", "text": "Correções de bugs" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let translator = DeepLTranslator::new(&config_with_key("dl-test:fx")).with_base_url(server.uri());
        let result = translator.translate("Bug fixes", "en-US", "pt-BR").await;

        assert_eq!(result.as_deref(), Some("Correções de bugs"));
    }

    #[tokio::test]
    async fn test_deepl_sends_formality_and_context() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/translate"))
            .and(body_partial_json(json!({
                "formality": "less",
                "context": "Casual fitness app"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "translations": [{ "text": "Fehler behoben" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = config_with_key("dl-test")
            .with("formality", "less")
            .with("context", "Casual fitness app");
        let translator = DeepLTranslator::new(&config).with_base_url(server.uri());

        assert_eq!(
            translator.translate("Fixed bugs", "en-US", "de-DE").await.as_deref(),
            Some("Fehler behoben")
        );
    }

    #[tokio::test]
    async fn test_deepl_truncates_on_android() {
        let long_text = "x".repeat(ANDROID_CHAR_LIMIT + 100);
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "translations": [{ "text": long_text }]
            })))
            .mount(&server)
            .await;

        let android = config_with_key("dl-test").with("platform", "android");
        let translator = DeepLTranslator::new(&android).with_base_url(server.uri());
        let result = translator.translate("Notes", "en-US", "fr-FR").await.unwrap();
        assert_eq!(result.chars().count(), ANDROID_CHAR_LIMIT);

        let ios = DeepLTranslator::new(&config_with_key("dl-test")).with_base_url(server.uri());
        let result = ios.translate("Notes", "en-US", "fr-FR").await.unwrap();
        assert_eq!(result.chars().count(), ANDROID_CHAR_LIMIT + 100);
    }

    #[tokio::test]
    async fn test_deepl_android_result_is_exactly_the_limit() {
        let text = format!("{} {}", "a".repeat(ANDROID_CHAR_LIMIT - 1), "b".repeat(100));
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "translations": [{ "text": text }]
            })))
            .mount(&server)
            .await;

        let android = config_with_key("dl-test").with("platform", "android");
        let translator = DeepLTranslator::new(&android).with_base_url(server.uri());
        let result = translator.translate("Notes", "en-US", "fr-FR").await.unwrap();

        assert_eq!(result.chars().count(), ANDROID_CHAR_LIMIT);
        assert!(result.ends_with(' '));
    }

    #[tokio::test]
    async fn test_deepl_quota_error_yields_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(456).set_body_json(json!({
                "message": "Quota exceeded"
            })))
            .mount(&server)
            .await;

        let translator = DeepLTranslator::new(&config_with_key("dl-test")).with_base_url(server.uri());
        assert_eq!(translator.translate("Fix", "en-US", "nl").await, None);
    }
}

// ============================================================================
// Transport Failure Tests
// ============================================================================

mod transport_tests {
    use super::*;

    /// Base URL of a local port that nothing listens on.
    fn closed_port_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{port}")
    }

    fn short_timeout_config() -> ProviderConfig {
        config_with_key("key").with("request_timeout", "2")
    }

    #[tokio::test]
    async fn test_connection_refused_yields_none_for_every_backend() {
        let url = closed_port_url();
        let config = short_timeout_config();

        let backends: Vec<Box<dyn Translator>> = vec![
            Box::new(OpenAiTranslator::new(&config).with_base_url(&url)),
            Box::new(AnthropicTranslator::new(&config).with_base_url(&url)),
            Box::new(GeminiTranslator::new(&config).with_base_url(&url)),
            Box::new(DeepLTranslator::new(&config).with_base_url(&url)),
        ];

        for backend in backends {
            assert_eq!(
                backend.translate("Fixes", "en-US", "de-DE").await,
                None,
                "{} should report no translation",
                backend.name()
            );
        }
    }
}
