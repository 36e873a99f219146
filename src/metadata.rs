//! Fastlane-style metadata directories: where release notes live per locale,
//! and when they were last translated.

use crate::config::Platform;
use crate::error::{RelnotesError, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

pub const IOS_NOTES_FILE: &str = "release_notes.txt";
pub const DEFAULT_CHANGELOG_FILE: &str = "default.txt";
pub const LAST_RUN_FILE: &str = ".relnotes_last_run";

const LOCALE_PATTERN: &str = r"(?i)^[a-z]{2,3}(-[a-z0-9]{2,8})*$";
const CHANGELOG_PATTERN: &str = r"^(\d+)\.txt$";

#[derive(Debug, Clone)]
pub struct MetadataLayout {
    root: PathBuf,
    platform: Platform,
    /// File name inside each locale's notes directory.
    notes_file: String,
}

impl MetadataLayout {
    /// Resolve the layout for `platform` under `root`.
    ///
    /// On Android the changelog name is `<version_code>.txt` when given,
    /// otherwise the highest-numbered changelog of the master locale, otherwise
    /// `default.txt`.
    pub fn resolve(
        root: impl Into<PathBuf>,
        platform: Platform,
        version_code: Option<&str>,
        master_locale: &str,
    ) -> Result<Self> {
        let root = root.into();
        let notes_file = match platform {
            Platform::Ios => IOS_NOTES_FILE.to_string(),
            Platform::Android => match version_code.map(str::trim).filter(|v| !v.is_empty()) {
                Some(code) => format!("{code}.txt"),
                None => latest_changelog(&root.join(master_locale).join("changelogs"))?
                    .unwrap_or_else(|| DEFAULT_CHANGELOG_FILE.to_string()),
            },
        };

        debug!("Metadata layout: {:?} ({}), notes file {}", root, platform, notes_file);

        Ok(Self {
            root,
            platform,
            notes_file,
        })
    }

    pub fn default_root(platform: Platform) -> PathBuf {
        match platform {
            Platform::Ios => PathBuf::from("fastlane/metadata"),
            Platform::Android => PathBuf::from("fastlane/metadata/android"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn notes_file(&self) -> &str {
        &self.notes_file
    }

    pub fn notes_path(&self, locale: &str) -> PathBuf {
        let locale_dir = self.root.join(locale);
        match self.platform {
            Platform::Ios => locale_dir.join(&self.notes_file),
            Platform::Android => locale_dir.join("changelogs").join(&self.notes_file),
        }
    }

    /// Locale-shaped subdirectories of the root, sorted.
    pub fn discover_locales(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Err(RelnotesError::FileNotFound(self.root.display().to_string()));
        }

        let pattern = Regex::new(LOCALE_PATTERN).map_err(|e| RelnotesError::Config(e.to_string()))?;

        let mut locales: Vec<String> = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|name| pattern.is_match(name))
            .collect();
        locales.sort();

        debug!("Discovered {} locales in {:?}", locales.len(), self.root);
        Ok(locales)
    }

    pub fn read_notes(&self, locale: &str) -> Result<String> {
        let path = self.notes_path(locale);
        if !path.exists() {
            return Err(RelnotesError::FileNotFound(path.display().to_string()));
        }
        Ok(fs::read_to_string(path)?)
    }

    pub fn write_notes(&self, locale: &str, text: &str) -> Result<PathBuf> {
        let path = self.notes_path(locale);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, text)?;
        Ok(path)
    }

    pub fn last_run_path(&self) -> PathBuf {
        self.root.join(LAST_RUN_FILE)
    }

    /// Time of the last fully successful run, if one was recorded.
    pub fn last_run(&self) -> Result<Option<SystemTime>> {
        let path = self.last_run_path();
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)?;
        match contents.trim().parse::<u64>() {
            Ok(secs) => Ok(Some(UNIX_EPOCH + Duration::from_secs(secs))),
            Err(_) => {
                warn!("Ignoring unreadable timestamp in {:?}", path);
                Ok(None)
            }
        }
    }

    pub fn record_run(&self, at: SystemTime) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.last_run_path(), unix_secs(at).to_string())?;
        Ok(())
    }

    /// Whether the master notes changed since the last recorded run.
    pub fn needs_translation(&self, master_locale: &str) -> Result<bool> {
        let Some(last_run) = self.last_run()? else {
            return Ok(true);
        };

        let path = self.notes_path(master_locale);
        let modified = fs::metadata(&path)
            .map_err(|_| RelnotesError::FileNotFound(path.display().to_string()))?
            .modified()?;

        // The timestamp file only keeps whole seconds.
        Ok(unix_secs(modified) > unix_secs(last_run))
    }
}

fn unix_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn latest_changelog(dir: &Path) -> Result<Option<String>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let pattern = Regex::new(CHANGELOG_PATTERN).map_err(|e| RelnotesError::Config(e.to_string()))?;

    let latest = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter_map(|name| {
            let code = pattern.captures(&name)?.get(1)?.as_str().parse::<u64>().ok()?;
            Some((code, name))
        })
        .max_by_key(|(code, _)| *code)
        .map(|(_, name)| name);

    Ok(latest)
}
