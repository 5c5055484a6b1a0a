//! Bootstrap configuration loading and config file resolution
//!
//! Configuration is read once at startup; the fusion service must restart to
//! pick up changes. Every field has a built-in default, so a missing file is
//! not an error.
//!
//! # Config File Priority
//!
//! 1. Command-line argument (`--config`)
//! 2. Environment variable (`SEAMTOUCH_CONFIG`)
//! 3. Platform config directory (`<config_dir>/seamtouch/config.toml`)
//! 4. Built-in defaults

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::sensor::{MountingOrientation, SensorPosition};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "SEAMTOUCH_CONFIG";

/// Fusion service configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct FusionConfig {
    /// Edge the sensors are mounted along
    #[serde(default)]
    pub orientation: MountingOrientation,

    /// Unified surface width in device units (1/10 mm)
    #[serde(default = "default_surface_extent")]
    pub surface_width: u32,

    /// Unified surface height in device units (1/10 mm)
    #[serde(default = "default_surface_extent")]
    pub surface_height: u32,

    /// Positions that must be registered before fusion starts
    #[serde(default = "default_sensors")]
    pub sensors: Vec<SensorPosition>,

    /// Persisted hardware-id to position assignments (optional)
    #[serde(default)]
    pub positions_file: Option<PathBuf>,

    /// Capacity of each inter-thread queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Receive poll interval when no release deadline is armed
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub tuning: TuningConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Filter and lifecycle tuning
#[derive(Debug, Clone, Deserialize)]
pub struct TuningConfig {
    /// Window in which an Up/Down flip is treated as crosstalk
    #[serde(default = "default_debounce_interval_ms")]
    pub debounce_interval_ms: u64,

    /// Silence after an Up before the release is forced
    #[serde(default = "default_release_timeout_ms")]
    pub release_timeout_ms: u64,

    /// Apparent speed (mm/ms) above which a jump is a ghost
    #[serde(default = "default_ghost_speed_limit")]
    pub ghost_speed_limit: f32,

    /// Samples in the rolling average, current sample included
    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,

    /// Weight of the opposite sensor's sample in the seam blend (out of weight + 1)
    #[serde(default = "default_seam_weight")]
    pub seam_weight: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log rejected samples (debounce, deghost, protocol errors)
    #[serde(default)]
    pub verbose: bool,
}

fn default_surface_extent() -> u32 {
    3000
}

fn default_sensors() -> Vec<SensorPosition> {
    vec![SensorPosition::TopLeft, SensorPosition::BottomLeft]
}

fn default_queue_capacity() -> usize {
    256
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_debounce_interval_ms() -> u64 {
    100
}

fn default_release_timeout_ms() -> u64 {
    100
}

fn default_ghost_speed_limit() -> f32 {
    5.0
}

fn default_smoothing_window() -> usize {
    8
}

fn default_seam_weight() -> u32 {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            debounce_interval_ms: default_debounce_interval_ms(),
            release_timeout_ms: default_release_timeout_ms(),
            ghost_speed_limit: default_ghost_speed_limit(),
            smoothing_window: default_smoothing_window(),
            seam_weight: default_seam_weight(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            verbose: false,
        }
    }
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            orientation: MountingOrientation::default(),
            surface_width: default_surface_extent(),
            surface_height: default_surface_extent(),
            sensors: default_sensors(),
            positions_file: None,
            queue_capacity: default_queue_capacity(),
            poll_interval_ms: default_poll_interval_ms(),
            tuning: TuningConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TuningConfig {
    pub fn release_timeout(&self) -> Duration {
        Duration::from_millis(self.release_timeout_ms)
    }
}

impl FusionConfig {
    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: FusionConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from the resolved config file, or fall back to built-in defaults
    ///
    /// A file that was explicitly named but cannot be read is an error; the
    /// absence of any config file is not.
    pub fn load_or_default(cli_arg: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_arg) {
            Some(path) => Self::load(&path),
            None => {
                warn!("No configuration file found, using built-in defaults");
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.sensors.is_empty() {
            return Err(Error::Config("at least one sensor position must be expected".to_string()));
        }

        let mut seen = HashSet::new();
        for position in &self.sensors {
            if !seen.insert(*position) {
                return Err(Error::Config(format!(
                    "sensor position {} listed more than once",
                    position.as_str()
                )));
            }
        }

        // Every sensor needs its seam partner to compute the overlap
        for position in &self.sensors {
            let opposite = position.opposite(self.orientation);
            if !seen.contains(&opposite) {
                return Err(Error::Config(format!(
                    "sensor position {} has no opposite {} under {} mounting",
                    position.as_str(),
                    opposite.as_str(),
                    self.orientation
                )));
            }
        }

        if self.surface_width == 0 || self.surface_height == 0 {
            return Err(Error::Config("surface extents must be non-zero".to_string()));
        }

        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be non-zero".to_string()));
        }

        if self.queue_capacity == 0 {
            return Err(Error::Config("queue_capacity must be non-zero".to_string()));
        }

        if self.tuning.smoothing_window == 0 {
            return Err(Error::Config("tuning.smoothing_window must be at least 1".to_string()));
        }

        if !(self.tuning.ghost_speed_limit > 0.0) {
            return Err(Error::Config("tuning.ghost_speed_limit must be positive".to_string()));
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Default tracing filter directive derived from the logging section
    pub fn log_directive(&self) -> String {
        if self.logging.verbose {
            "debug".to_string()
        } else {
            self.logging.level.clone()
        }
    }
}

/// Resolve the config file location following the documented priority
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    let candidate = dirs::config_dir().map(|d| d.join("seamtouch").join("config.toml"))?;
    if candidate.exists() {
        debug!("Using platform config file {}", candidate.display());
        Some(candidate)
    } else {
        None
    }
}
