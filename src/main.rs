use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use relnotes::config::{Config, Platform, ProviderConfig};
use relnotes::interactive;
use relnotes::metadata::MetadataLayout;
use relnotes::pipeline::{print_summary, translate_release_notes, BatchOptions, RunOutcome};
use relnotes::translate::{ProviderFactory, API_TOKEN_KEY};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "relnotes")]
#[command(version, about = "Translate app store release notes across locales")]
#[command(
    long_about = "Translate the master locale's release notes into every other locale of a fastlane metadata directory using OpenAI, Anthropic, Gemini or DeepL."
)]
struct Cli {
    /// Translation provider: openai, anthropic, gemini, deepl
    #[arg(short, long)]
    provider: Option<String>,

    /// API key for the selected provider (overrides environment variables)
    #[arg(long)]
    api_token: Option<String>,

    /// Provider model name
    #[arg(short, long)]
    model_name: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Maximum response tokens (Anthropic)
    #[arg(long)]
    max_tokens: Option<u32>,

    /// OpenAI service tier: auto, default, flex, priority
    #[arg(long)]
    service_tier: Option<String>,

    /// DeepL formality: default, more, less
    #[arg(long)]
    formality: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    request_timeout: Option<u64>,

    /// Free-text context about the app, passed to the provider
    #[arg(long)]
    context: Option<String>,

    /// Target platform: ios, android
    #[arg(long)]
    platform: Option<String>,

    /// Source locale whose notes are translated
    #[arg(long)]
    master_locale: Option<String>,

    /// Metadata directory (defaults to fastlane/metadata or fastlane/metadata/android)
    #[arg(long)]
    metadata_path: Option<PathBuf>,

    /// Android version code naming the changelog file
    #[arg(long)]
    version_code: Option<String>,

    /// Pause between provider calls in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Translate even if the master notes did not change since the last run
    #[arg(short, long)]
    force: bool,

    /// List supported providers and exit
    #[arg(long)]
    list_providers: bool,

    /// Pick the provider and confirm overwrites interactively
    #[arg(short, long)]
    interactive: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn print_providers() {
    println!("{}", style("Supported providers:").bold());
    for name in ProviderFactory::available_provider_names() {
        let Some(info) = ProviderFactory::provider_info(name) else {
            continue;
        };
        println!("\n  {} ({})", style(info.display_name).cyan(), info.name);
        println!("    {}", info.credential_help);
        for param in info.optional_params {
            let default = param
                .default
                .map(|d| format!(" [default: {d}]"))
                .unwrap_or_default();
            println!("    {:<16} {}{}", param.name, param.description, default);
        }
    }
}

/// CLI flags layered over the config file's provider options.
fn provider_config(cli: &Cli, config: &Config) -> ProviderConfig {
    let mut provider_config = config.provider_config();

    let overrides = [
        ("model_name", cli.model_name.clone()),
        ("temperature", cli.temperature.map(|t| t.to_string())),
        ("max_tokens", cli.max_tokens.map(|t| t.to_string())),
        ("service_tier", cli.service_tier.clone()),
        ("formality", cli.formality.clone()),
        ("request_timeout", cli.request_timeout.map(|t| t.to_string())),
        ("context", cli.context.clone()),
    ];
    for (key, value) in overrides {
        if let Some(value) = value {
            provider_config.set(key, value);
        }
    }

    if let Some(ref token) = cli.api_token {
        provider_config.set(API_TOKEN_KEY, token.clone());
    }

    provider_config
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if cli.list_providers {
        print_providers();
        return Ok(());
    }

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(ref provider) = cli.provider {
        config.provider = Some(provider.clone());
    }
    if let Some(ref platform) = cli.platform {
        config.platform = platform
            .parse::<Platform>()
            .map_err(|e: String| anyhow::anyhow!(e))?;
    }
    if let Some(ref locale) = cli.master_locale {
        config.master_locale = locale.clone();
    }
    if let Some(delay) = cli.delay_ms {
        config.delay_ms = delay;
    }
    config
        .validate()
        .context("Configuration validation failed")?;

    let factory = ProviderFactory::new();

    if cli.interactive {
        interactive::print_header();
    }

    let provider_config = provider_config(&cli, &config);

    let provider_name = match config.provider.clone() {
        Some(name) => name,
        None if cli.interactive => {
            interactive::select_provider(factory.resolver(), &provider_config)?.to_string()
        }
        None => relnotes::translate::factory::DEFAULT_PROVIDER.to_string(),
    };

    let translator = factory.create(Some(&provider_name), &provider_config)?;

    let root = cli
        .metadata_path
        .clone()
        .or_else(|| config.metadata_path.clone())
        .unwrap_or_else(|| MetadataLayout::default_root(config.platform));

    let layout = MetadataLayout::resolve(
        root,
        config.platform,
        cli.version_code.as_deref(),
        &config.master_locale,
    )
    .context("Failed to resolve metadata layout")?;

    info!("Provider: {}", translator.name());
    info!("Platform: {}", config.platform);
    info!("Master:   {}", config.master_locale);
    info!("Notes:    {}", layout.notes_path(&config.master_locale).display());

    if cli.interactive {
        let existing = interactive::existing_targets(&layout, &config.master_locale)?;
        if !interactive::confirm_overwrite(&existing)? {
            anyhow::bail!("Cancelled by user");
        }
    }

    let options = BatchOptions {
        delay: Duration::from_millis(config.delay_ms),
        show_progress: !cli.verbose,
    };

    let outcome = translate_release_notes(
        translator.as_ref(),
        &layout,
        &config.master_locale,
        cli.force,
        &options,
    )
    .await?;

    match outcome {
        RunOutcome::Unchanged => {
            println!(
                "{} Release notes unchanged since last run (use --force to translate anyway)",
                style("✓").green()
            );
        }
        RunOutcome::Translated { result, written } => {
            print_summary(&result);
            info!("Wrote {} file(s)", written.len());
            if !result.all_succeeded() {
                anyhow::bail!(
                    "Translation failed for: {}",
                    result.failed_locales().join(", ")
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use relnotes::credentials::CredentialResolver;

    #[test]
    fn test_cli_flags_override_file_options() {
        let cli = Cli::parse_from([
            "relnotes",
            "--model-name",
            "gpt-4o",
            "--request-timeout",
            "45",
            "--api-token",
            "sk-cli",
        ]);
        let mut config = Config::default();
        config
            .options
            .insert("model_name".to_string(), toml::Value::from("gpt-3.5-turbo"));

        let provider_config = provider_config(&cli, &config);
        assert_eq!(provider_config.get("model_name"), Some("gpt-4o"));
        assert_eq!(provider_config.get_u64("request_timeout"), Some(45));
        assert_eq!(provider_config.get(API_TOKEN_KEY), Some("sk-cli"));
        assert_eq!(provider_config.get("master_locale"), Some("en-US"));
    }

    #[test]
    fn test_cli_token_makes_providers_selectable() {
        let cli = Cli::parse_from(["relnotes", "--interactive", "--api-token", "dl-key:fx"]);
        let provider_config = provider_config(&cli, &Config::default());

        let resolver = CredentialResolver::with_env(|_| None);
        assert!(resolver.credentials_exist("deepl", &provider_config));
        assert_eq!(
            resolver.available_providers(&provider_config),
            ProviderFactory::available_provider_names()
        );

        let cli = Cli::parse_from(["relnotes", "--interactive"]);
        let without_token = super::provider_config(&cli, &Config::default());
        assert!(resolver.available_providers(&without_token).is_empty());
    }
}
