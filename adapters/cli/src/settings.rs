use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use reflex_rush_catalog::LevelCatalog;
use reflex_rush_core::{seconds, LevelDescriptor, LevelNumber};
use reflex_rush_engine::{Config as EngineConfig, DEFAULT_MAX_FRAME_STEP};
use reflex_rush_system_scheduling::{Placement, DEFAULT_REJECTION_ATTEMPTS};
use serde::Deserialize;

/// Contents of an optional TOML configuration file.
///
/// ```toml
/// [engine]
/// seed = 7
/// max_frame_step = 0.25
/// placement = { kind = "rejection", max_attempts = 500 }
///
/// [[levels]]
/// level = 1
/// required_progress = 40
/// time_limit = 10
/// red_strategy = { kind = "cyclic_predictable" }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    #[serde(default)]
    pub(crate) engine: EngineSection,
    #[serde(default)]
    pub(crate) levels: Option<Vec<LevelDescriptor>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct EngineSection {
    #[serde(default)]
    pub(crate) start_level: Option<LevelNumber>,
    #[serde(default = "default_max_frame_step", with = "seconds")]
    pub(crate) max_frame_step: Duration,
    #[serde(default)]
    pub(crate) placement: PlacementSetting,
    #[serde(default)]
    pub(crate) seed: Option<u64>,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            start_level: None,
            max_frame_step: DEFAULT_MAX_FRAME_STEP,
            placement: PlacementSetting::default(),
            seed: None,
        }
    }
}

fn default_max_frame_step() -> Duration {
    DEFAULT_MAX_FRAME_STEP
}

fn default_rejection_attempts() -> u32 {
    DEFAULT_REJECTION_ATTEMPTS
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum PlacementSetting {
    #[default]
    Slots,
    Rejection {
        #[serde(default = "default_rejection_attempts")]
        max_attempts: u32,
    },
}

impl From<PlacementSetting> for Placement {
    fn from(setting: PlacementSetting) -> Self {
        match setting {
            PlacementSetting::Slots => Self::Slots,
            PlacementSetting::Rejection { max_attempts } => Self::Rejection { max_attempts },
        }
    }
}

/// Overrides collected from command-line flags. Flags win over the file.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Overrides {
    pub(crate) seed: Option<u64>,
    pub(crate) start_level: Option<u32>,
}

impl FileConfig {
    /// Reads and parses the configuration at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        if config.engine.max_frame_step.is_zero() {
            bail!("engine.max_frame_step must be greater than zero");
        }
        Ok(config)
    }

    /// Level catalog described by the file, or the standard progression.
    pub(crate) fn catalog(&self) -> Result<LevelCatalog> {
        match &self.levels {
            Some(levels) => {
                LevelCatalog::new(levels.clone()).context("invalid [[levels]] in config file")
            }
            None => Ok(LevelCatalog::standard()),
        }
    }

    /// Engine configuration with command-line overrides applied.
    pub(crate) fn engine_config(&self, overrides: Overrides) -> EngineConfig {
        let start_level = overrides
            .start_level
            .map(LevelNumber::new)
            .or(self.engine.start_level);
        EngineConfig::new()
            .with_start_level(start_level)
            .with_max_frame_step(self.engine.max_frame_step)
            .with_placement(self.engine.placement.into())
            .with_seed(overrides.seed.or(self.engine.seed))
    }
}

/// Fixes the engine seed, drawing one from entropy when none was configured,
/// and returns it so the autopilot can share it.
pub(crate) fn with_session_seed(config: EngineConfig) -> (EngineConfig, u64) {
    let seed = config.seed().unwrap_or_else(rand::random);
    (config.with_seed(Some(seed)), seed)
}
