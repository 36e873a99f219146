use crate::error::{RelnotesError, Result};
use crate::metadata::MetadataLayout;
use crate::translate::Translator;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, info, warn};

/// Settings for one translation batch.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Pause between consecutive vendor calls.
    pub delay: Duration,
    /// Show a progress bar.
    pub show_progress: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(500),
            show_progress: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchStats {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed: Duration,
    pub provider: String,
}

/// Translations keyed by locale; `None` marks a locale that failed.
#[derive(Debug)]
pub struct BatchResult {
    pub translations: BTreeMap<String, Option<String>>,
    pub stats: BatchStats,
}

impl BatchResult {
    pub fn all_succeeded(&self) -> bool {
        self.stats.failed == 0
    }

    pub fn failed_locales(&self) -> Vec<&str> {
        self.translations
            .iter()
            .filter(|(_, text)| text.is_none())
            .map(|(locale, _)| locale.as_str())
            .collect()
    }
}

/// Translate `text` into every target locale, one call at a time.
///
/// The source locale is skipped if it appears among the targets. Individual
/// failures are recorded as `None`; only an invalid provider or empty input
/// aborts the batch.
pub async fn translate_locales(
    translator: &dyn Translator,
    text: &str,
    source_locale: &str,
    targets: &[String],
    options: &BatchOptions,
) -> Result<BatchResult> {
    translator.ensure_valid()?;

    if text.trim().is_empty() {
        return Err(RelnotesError::Config(format!(
            "Release notes for {} are empty",
            source_locale
        )));
    }

    let targets: Vec<&String> = targets
        .iter()
        .filter(|t| !t.eq_ignore_ascii_case(source_locale))
        .collect();

    let start_time = Instant::now();
    info!(
        "Translating {} locales from {} using {}",
        targets.len(),
        source_locale,
        translator.name()
    );

    let progress_bar = if options.show_progress {
        let pb = ProgressBar::new(targets.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut translations = BTreeMap::new();
    let mut succeeded = 0;

    for (i, target) in targets.iter().enumerate() {
        if i > 0 && !options.delay.is_zero() {
            tokio::time::sleep(options.delay).await;
        }

        if let Some(ref pb) = progress_bar {
            pb.set_message(target.to_string());
        }

        debug!("Translating {} -> {}", source_locale, target);
        let result = translator.translate(text, source_locale, target).await;

        match result {
            Some(_) => succeeded += 1,
            None => warn!("No translation for {}", target),
        }
        translations.insert(target.to_string(), result);

        if let Some(ref pb) = progress_bar {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress_bar {
        pb.finish_with_message("done");
    }

    let stats = BatchStats {
        total: targets.len(),
        succeeded,
        failed: targets.len() - succeeded,
        elapsed: start_time.elapsed(),
        provider: translator.name().to_string(),
    };

    info!(
        "Translated {}/{} locales in {:.2}s",
        stats.succeeded,
        stats.total,
        stats.elapsed.as_secs_f64()
    );

    Ok(BatchResult {
        translations,
        stats,
    })
}

/// Outcome of a full release-notes run.
#[derive(Debug)]
pub enum RunOutcome {
    /// Master notes unchanged since the last successful run.
    Unchanged,
    Translated {
        result: BatchResult,
        written: Vec<PathBuf>,
    },
}

/// Read the master notes, translate them into every other locale in the
/// layout and write the successful results back.
///
/// The last-run timestamp is only updated when every locale succeeded.
pub async fn translate_release_notes(
    translator: &dyn Translator,
    layout: &MetadataLayout,
    master_locale: &str,
    force: bool,
    options: &BatchOptions,
) -> Result<RunOutcome> {
    translator.ensure_valid()?;

    let text = layout.read_notes(master_locale)?;

    if !force && !layout.needs_translation(master_locale)? {
        info!("Release notes for {} unchanged since last run; skipping", master_locale);
        return Ok(RunOutcome::Unchanged);
    }

    let locales = layout.discover_locales()?;
    let result = translate_locales(translator, &text, master_locale, &locales, options).await?;

    let mut written = Vec::new();
    for (locale, translation) in &result.translations {
        if let Some(text) = translation {
            written.push(layout.write_notes(locale, text)?);
        }
    }

    if result.all_succeeded() {
        layout.record_run(SystemTime::now())?;
    } else {
        warn!(
            "Not recording this run: {} locale(s) failed",
            result.stats.failed
        );
    }

    Ok(RunOutcome::Translated { result, written })
}

/// Print a summary of the batch results.
pub fn print_summary(result: &BatchResult) {
    println!();
    println!("{}", style("═══ Translation Summary ═══").bold());
    println!("  Provider:   {}", style(&result.stats.provider).cyan());
    println!(
        "  Locales:    {} translated, {} failed",
        style(result.stats.succeeded).green(),
        if result.stats.failed > 0 {
            style(result.stats.failed).red()
        } else {
            style(result.stats.failed).dim()
        }
    );
    println!("  Time:       {:.2}s", result.stats.elapsed.as_secs_f64());

    for (locale, translation) in &result.translations {
        match translation {
            Some(text) => println!(
                "  {} {:<8} {} chars",
                style("✓").green(),
                locale,
                text.chars().count()
            ),
            None => println!("  {} {:<8} failed", style("✗").red(), locale),
        }
    }
    println!();
}
