//! Instruction text sent to the language-model backends.

use crate::config::{Platform, ProviderConfig};

/// Google Play caps "What's new" text at this many characters.
pub const ANDROID_CHAR_LIMIT: usize = 500;

/// Prompt settings captured from the provider configuration at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptOptions {
    pub context: Option<String>,
    pub platform: Platform,
}

impl PromptOptions {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            context: config.context().map(str::to_string),
            platform: config.platform(),
        }
    }
}

/// Build the translation instruction for `text`.
pub fn build_prompt(text: &str, source: &str, target: &str, options: &PromptOptions) -> String {
    let mut prompt = format!(
        "Translate the following release notes from {source} to {target}. \
         Return only the translated text, preserving line breaks and list markers.\n\n\"{text}\""
    );

    if let Some(context) = options.context.as_deref().filter(|c| !c.trim().is_empty()) {
        prompt.push_str(&format!("\n\nContext: {}", context.trim()));
    }

    if options.platform == Platform::Android {
        prompt = apply_android_limitations(&prompt);
    }

    prompt
}

/// Append the Google Play length instruction.
pub fn apply_android_limitations(prompt: &str) -> String {
    format!(
        "{prompt}\n\nIMPORTANT: The translation must not exceed {ANDROID_CHAR_LIMIT} characters, \
         which is the Google Play Store limit for Android changelogs. \
         Keep the translation concise."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt_plain() {
        let prompt = build_prompt("Bug fixes", "en-US", "de-DE", &PromptOptions::default());
        assert!(prompt.contains("from en-US to de-DE"));
        assert!(prompt.contains("\"Bug fixes\""));
        assert!(!prompt.contains("Context:"));
        assert!(!prompt.contains("500 characters"));
    }

    #[test]
    fn test_build_prompt_with_context() {
        let options = PromptOptions {
            context: Some("A meditation app".to_string()),
            platform: Platform::Ios,
        };
        let prompt = build_prompt("New sounds", "en", "fr", &options);
        assert!(prompt.contains("\n\nContext: A meditation app"));
    }

    #[test]
    fn test_blank_context_is_skipped() {
        let options = PromptOptions {
            context: Some("  ".to_string()),
            platform: Platform::Ios,
        };
        assert!(!build_prompt("x", "en", "fr", &options).contains("Context:"));
    }

    #[test]
    fn test_android_clause_comes_last() {
        let options = PromptOptions {
            context: Some("Banking".to_string()),
            platform: Platform::Android,
        };
        let prompt = build_prompt("Faster login", "en", "es", &options);
        let context_at = prompt.find("Context:").unwrap();
        let limit_at = prompt.find("500 characters").unwrap();
        assert!(context_at < limit_at);
        assert!(prompt.ends_with("Keep the translation concise."));
    }

    #[test]
    fn test_build_prompt_is_deterministic() {
        let options = PromptOptions {
            context: Some("Games".to_string()),
            platform: Platform::Android,
        };
        assert_eq!(
            build_prompt("Level 10", "en", "ja", &options),
            build_prompt("Level 10", "en", "ja", &options)
        );
    }

    #[test]
    fn test_options_from_config() {
        let config = ProviderConfig::new()
            .with("platform", "android")
            .with("context", "Travel");
        let options = PromptOptions::from_config(&config);
        assert_eq!(options.platform, Platform::Android);
        assert_eq!(options.context.as_deref(), Some("Travel"));
    }
}
