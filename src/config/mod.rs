use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::models::WeightUnit;

/// Overrides the database directory
pub const DB_PATH_ENV: &str = "BLUEPRINT_DB_PATH";
/// Overrides the config file location
pub const CONFIG_PATH_ENV: &str = "BLUEPRINT_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,

    #[serde(default)]
    pub units: UnitsConfig,

    #[serde(default)]
    pub profile: ProfileConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Database directory; defaults to ~/.blueprint-fitness/db
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Thresholds used by the progress calculations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Relative change per week above which a trend counts as moving
    #[serde(default = "default_trend_threshold")]
    pub trend_threshold: f64,

    #[serde(default = "default_min_points_for_trend")]
    pub min_points_for_trend: usize,

    #[serde(default = "default_plateau_window")]
    pub plateau_window: usize,

    /// Coefficient of variation below which a window is flat
    #[serde(default = "default_plateau_cv_threshold")]
    pub plateau_cv_threshold: f64,

    /// Relative jump between consecutive points that counts as a breakthrough
    #[serde(default = "default_breakthrough_threshold")]
    pub breakthrough_threshold: f64,

    #[serde(default = "default_projection_confidence")]
    pub projection_confidence: f64,

    #[serde(default = "default_projection_horizon_days")]
    pub projection_horizon_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitsConfig {
    #[serde(default)]
    pub weight_unit: WeightUnit,

    #[serde(default = "default_date_format")]
    pub date_format: String,
}

/// Client-side state that survives between invocations
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProfileConfig {
    #[serde(default)]
    pub active_profile_id: Option<Uuid>,
}

// Default value functions
fn default_trend_threshold() -> f64 {
    0.01
}

fn default_min_points_for_trend() -> usize {
    2
}

fn default_plateau_window() -> usize {
    4
}

fn default_plateau_cv_threshold() -> f64 {
    0.02
}

fn default_breakthrough_threshold() -> f64 {
    0.05
}

fn default_projection_confidence() -> f64 {
    0.95
}

fn default_projection_horizon_days() -> u32 {
    28
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            trend_threshold: default_trend_threshold(),
            min_points_for_trend: default_min_points_for_trend(),
            plateau_window: default_plateau_window(),
            plateau_cv_threshold: default_plateau_cv_threshold(),
            breakthrough_threshold: default_breakthrough_threshold(),
            projection_confidence: default_projection_confidence(),
            projection_horizon_days: default_projection_horizon_days(),
        }
    }
}

impl Default for UnitsConfig {
    fn default() -> Self {
        Self {
            weight_unit: WeightUnit::default(),
            date_format: default_date_format(),
        }
    }
}

impl Config {
    /// Get config directory path (~/.blueprint-fitness/)
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".blueprint-fitness"))
    }

    /// Get config file path, honouring BLUEPRINT_CONFIG
    pub fn config_file() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Resolve the database directory: env override, then config, then default
    pub fn db_path(&self) -> Result<PathBuf> {
        if let Ok(path) = std::env::var(DB_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }
        match &self.storage.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("db")),
        }
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    pub fn set_active_profile(&mut self, profile_id: Option<Uuid>) {
        self.profile.active_profile_id = profile_id;
    }
}
