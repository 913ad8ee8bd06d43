//! Configuration for caravan formation.
//!
//! Settings are read from `caravan.toml` in the project directory. Every key
//! is optional.
//!
//! # Configuration File Format
//!
//! ```toml
//! [formation]
//! fast_animal_collection = false
//! check_interval = 100
//! gather_radius = 10.0
//! require_follower_confirmation = true
//! reach_danger = "deadly"
//! graft = "replace"
//! insert_before = "Rest"
//! ```
//!
//! Layering is file, then environment (`CARAVAN_FAST_ANIMALS`), then CLI.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::host::Danger;
use crate::phase::DEFAULT_CHECK_INTERVAL;
use crate::tracker::{DEFAULT_GATHER_RADIUS, GatherCriteria};

pub const CONFIG_FILE: &str = "caravan.toml";

/// Environment switch for `fast_animal_collection`.
pub const FAST_ANIMALS_ENV: &str = "CARAVAN_FAST_ANIMALS";

/// How the gather phases enter the host graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraftMode {
    /// Swap the host's own gather phases for sticky ones (default)
    #[default]
    Replace,
    /// Insert the gather chain in front of `insert_before`
    Insert,
}

impl std::fmt::Display for GraftMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraftMode::Replace => write!(f, "replace"),
            GraftMode::Insert => write!(f, "insert"),
        }
    }
}

impl std::str::FromStr for GraftMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "replace" => Ok(GraftMode::Replace),
            "insert" => Ok(GraftMode::Insert),
            _ => anyhow::bail!("Invalid graft mode '{}'. Valid values: replace, insert", s),
        }
    }
}

/// The `[formation]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationSettings {
    /// Animal gathering completes on its first check
    #[serde(default)]
    pub fast_animal_collection: bool,
    /// Ticks between completion checks
    #[serde(default = "default_check_interval")]
    pub check_interval: u64,
    /// Proximity tolerance around the meeting point
    #[serde(default = "default_gather_radius")]
    pub gather_radius: f32,
    /// Only count members that are following or being escorted
    #[serde(default = "default_require_follower_confirmation")]
    pub require_follower_confirmation: bool,
    /// Worst danger a path to the meeting point may cross
    #[serde(default)]
    pub reach_danger: Danger,
    #[serde(default)]
    pub graft: GraftMode,
    /// Host phase the gather chain leads into in insert mode
    #[serde(default = "default_insert_before")]
    pub insert_before: String,
}

fn default_check_interval() -> u64 {
    DEFAULT_CHECK_INTERVAL
}

fn default_gather_radius() -> f32 {
    DEFAULT_GATHER_RADIUS
}

fn default_require_follower_confirmation() -> bool {
    true
}

fn default_insert_before() -> String {
    "Rest".to_string()
}

impl Default for FormationSettings {
    fn default() -> Self {
        Self {
            fast_animal_collection: false,
            check_interval: default_check_interval(),
            gather_radius: default_gather_radius(),
            require_follower_confirmation: default_require_follower_confirmation(),
            reach_danger: Danger::default(),
            graft: GraftMode::default(),
            insert_before: default_insert_before(),
        }
    }
}

impl FormationSettings {
    /// Apply `CARAVAN_FAST_ANIMALS` on top of the file setting.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var(FAST_ANIMALS_ENV) {
            match parse_flag(&value) {
                Some(flag) => self.fast_animal_collection = flag,
                None => warn!(
                    variable = FAST_ANIMALS_ENV,
                    value = %value,
                    "ignoring unrecognised boolean"
                ),
            }
        }
        self
    }

    /// Presence criteria for the sticky gather phases.
    pub fn criteria(&self) -> GatherCriteria {
        GatherCriteria {
            radius: self.gather_radius,
            max_danger: self.reach_danger,
            require_following: self.require_follower_confirmation,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// The complete caravan.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaravanToml {
    #[serde(default)]
    pub formation: FormationSettings,
}

impl CaravanToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse caravan.toml")
    }

    /// Load `caravan.toml` from `dir`, or defaults if there is none.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize caravan.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let formation = &self.formation;

        if formation.check_interval == 0 {
            warnings.push(
                "check_interval is 0: completion will be checked on every tick".to_string(),
            );
        }
        if formation.gather_radius.is_nan() || formation.gather_radius <= 0.0 {
            warnings.push(format!(
                "Invalid gather_radius '{}': should be a positive distance",
                formation.gather_radius
            ));
        }
        if formation.graft == GraftMode::Insert && formation.insert_before.trim().is_empty() {
            warnings.push("insert_before is empty but graft mode is 'insert'".to_string());
        }

        warnings
    }
}

/// Runtime configuration: file settings merged with env and CLI overrides.
#[derive(Debug, Clone)]
pub struct CaravanConfig {
    pub project_dir: PathBuf,
    pub toml: CaravanToml,
}

impl CaravanConfig {
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let toml = CaravanToml::load_or_default(&project_dir)?;
        Ok(Self { project_dir, toml })
    }

    pub fn config_path(&self) -> PathBuf {
        self.project_dir.join(CONFIG_FILE)
    }

    /// Effective formation settings (file, then env).
    pub fn formation(&self) -> FormationSettings {
        self.toml.formation.clone().with_env_overrides()
    }

    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}
