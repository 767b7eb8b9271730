//! Engine configuration — all operator-tunable values as TOML.
//!
//! Configuration is an explicit immutable struct handed to the components
//! that need it; there is no global. Every struct implements `Default` with
//! the operational constants, so behavior without a config file matches the
//! documented design values exactly.
//!
//! ## Loading Order
//!
//! 1. Explicit `--config` path (errors are fatal — a named file must load)
//! 2. `SIGAP_CONFIG` environment variable
//! 3. `./sigap.toml` in the current working directory
//! 4. Built-in defaults

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::detector::{Aggregation, ClassifierThresholds};
use crate::grid::BoundingBox;
use crate::types::DetectionError;

// ============================================================================
// Sections
// ============================================================================

/// Region the engine watches. Default covers the East Java monitoring domain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegionConfig {
    /// Display name used in narration, logs, and the event log.
    pub name: String,
    /// Inclusive bounding box the grid is subset to before detection.
    pub bbox: BoundingBox,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            name: "Jawa Timur".to_string(),
            bbox: BoundingBox {
                lat_min: -8.5,
                lat_max: -7.0,
                lon_min: 112.0,
                lon_max: 113.5,
            },
        }
    }
}

/// Detection pipeline tuning: classification thresholds, temporal
/// persistence, and the spatial reduction method.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectionConfig {
    /// Per-cell classification thresholds.
    pub thresholds: ClassifierThresholds,
    /// Consecutive timesteps a flag must hold before it is reported.
    pub min_duration: usize,
    /// Spatial reduction over the region (`"max"` or `"mean"`).
    pub aggregation: Aggregation,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            thresholds: ClassifierThresholds::default(),
            min_duration: 2,
            aggregation: Aggregation::default(),
        }
    }
}

impl DetectionConfig {
    pub fn validate(&self) -> Result<(), DetectionError> {
        self.thresholds.validate()?;
        if self.min_duration == 0 {
            return Err(DetectionError::InvalidConfig(
                "temporal min_duration must be at least 1 timestep".to_string(),
            ));
        }
        Ok(())
    }
}

/// Operational loop settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Minutes between detection cycles.
    pub interval_minutes: u64,
    /// Directory for `latest_status.json` and the event log.
    pub output_dir: PathBuf,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 10,
            output_dir: PathBuf::from("output"),
        }
    }
}

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a SIGAP deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SigapConfig {
    pub region: RegionConfig,
    pub detection: DetectionConfig,
    pub runtime: RuntimeConfig,
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config file {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] DetectionError),
}

impl SigapConfig {
    /// Load using the standard search order, falling back to defaults.
    ///
    /// An explicit `path` must load successfully; the env-var and local-file
    /// candidates fall through to the next source on failure, with a warning.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            let config = Self::load_from_file(path)?;
            info!(path = %path.display(), region = %config.region.name, "Loaded config");
            return Ok(config);
        }

        if let Ok(env_path) = std::env::var("SIGAP_CONFIG") {
            let p = PathBuf::from(&env_path);
            match Self::load_from_file(&p) {
                Ok(config) => {
                    info!(path = %p.display(), region = %config.region.name, "Loaded config from SIGAP_CONFIG");
                    return Ok(config);
                }
                Err(e) => {
                    warn!(path = %p.display(), error = %e, "Failed to load config from SIGAP_CONFIG, falling back");
                }
            }
        }

        let local = PathBuf::from("sigap.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(region = %config.region.name, "Loaded config from ./sigap.toml");
                    return Ok(config);
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./sigap.toml, using defaults");
                }
            }
        }

        info!("No config file found, using built-in defaults");
        Ok(Self::default())
    }

    /// Load and validate a specific TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.detection.validate()?;
        Ok(config)
    }
}

// ============================================================================
// Tests
// ============================================================================
