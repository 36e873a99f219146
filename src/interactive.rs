use crate::config::ProviderConfig;
use crate::credentials::{credential_help, CredentialResolver};
use crate::metadata::MetadataLayout;
use crate::translate::ProviderFactory;
use console::style;
use dialoguer::{Confirm, Select};
use std::path::PathBuf;

pub fn print_header() {
    println!();
    println!(
        "{}",
        style("╔═══════════════════════════════════════════════════╗").cyan()
    );
    println!(
        "{}",
        style("║        relnotes - Release Notes Translator        ║").cyan()
    );
    println!(
        "{}",
        style("╚═══════════════════════════════════════════════════╝").cyan()
    );
    println!();
}

/// Let the user pick among providers that have a usable API key.
pub fn select_provider(
    resolver: &CredentialResolver,
    config: &ProviderConfig,
) -> anyhow::Result<&'static str> {
    let available = resolver.available_providers(config);

    if available.is_empty() {
        println!("{} No provider API keys found", style("!").yellow());
        for name in ProviderFactory::available_provider_names() {
            println!("  {}: {}", style(name).bold(), credential_help(name));
        }
        anyhow::bail!("No provider credentials configured");
    }

    let labels: Vec<String> = ProviderFactory::provider_display_names()
        .into_iter()
        .filter(|(name, _)| available.contains(name))
        .map(|(name, display)| format!("{display} ({name})"))
        .collect();

    let selection = Select::new()
        .with_prompt("Select translation provider")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(available[selection])
}

/// Notes files that a run would overwrite.
pub fn existing_targets(layout: &MetadataLayout, master_locale: &str) -> anyhow::Result<Vec<PathBuf>> {
    Ok(layout
        .discover_locales()?
        .into_iter()
        .filter(|locale| !locale.eq_ignore_ascii_case(master_locale))
        .map(|locale| layout.notes_path(&locale))
        .filter(|path| path.exists())
        .collect())
}

pub fn confirm_overwrite(existing: &[PathBuf]) -> anyhow::Result<bool> {
    if existing.is_empty() {
        return Ok(true);
    }

    println!(
        "\n{} {} existing translation(s) will be overwritten:",
        style("!").yellow(),
        existing.len()
    );
    for path in existing.iter().take(10) {
        println!("  {}", style(path.display()).dim());
    }
    if existing.len() > 10 {
        println!("  … and {} more", existing.len() - 10);
    }

    Ok(Confirm::new()
        .with_prompt("Proceed?")
        .default(true)
        .interact()?)
}
