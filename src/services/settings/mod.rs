//! Settings persistence.
//!
//! Settings live in `config.toml` under the platform config directory.
//! A missing file means defaults.

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::settings::Settings;

const CONFIG_FILE: &str = "config.toml";
const DATABASE_FILE: &str = "schedule.db";

pub struct SettingsService {
    path: PathBuf,
}

impl SettingsService {
    /// Settings stored at an explicit path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Settings stored in the platform config directory.
    pub fn from_default_location() -> Result<Self> {
        let dirs = project_dirs()?;
        Ok(Self::new(dirs.config_dir().join(CONFIG_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and validate settings, falling back to defaults when the file
    /// does not exist.
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            log::info!("No settings at {:?}, using defaults", self.path);
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings file {:?}", self.path))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {:?}", self.path))?;
        settings
            .validate()
            .map_err(|e| anyhow!("Invalid settings: {}", e))?;

        Ok(settings)
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        settings
            .validate()
            .map_err(|e| anyhow!("Invalid settings: {}", e))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }
        let content = toml::to_string_pretty(settings).context("Failed to serialize settings")?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write settings file {:?}", self.path))?;

        log::info!("Saved settings to {:?}", self.path);
        Ok(())
    }
}

/// Where the database goes when the settings don't say.
pub fn default_database_path() -> Result<PathBuf> {
    let dirs = project_dirs()?;
    let data_dir = dirs.data_dir();
    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;
    Ok(data_dir.join(DATABASE_FILE))
}

/// The configured database path, or the platform default.
pub fn resolve_database_path(settings: &Settings) -> Result<PathBuf> {
    match &settings.database_path {
        Some(path) => Ok(path.clone()),
        None => default_database_path(),
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "KenBoyle", "RustSchedule")
        .ok_or_else(|| anyhow!("Could not determine the home directory"))
}
