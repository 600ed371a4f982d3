//! Configuration for the Drishti IO layer
//!
//! Loads configuration from a TOML file: the servo link, the sweep
//! bounds, the mapping parameters, and logging.

use crate::error::Result;
use crate::sweep::SweepParams;
use drishti_map::MapConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub servo: ServoConfig,
    pub sweep: SweepParams,
    pub map: MapConfig,
    pub logging: LoggingConfig,
}

/// Servo link configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServoConfig {
    /// Pan mount serial port
    pub port: String,
    /// Baud rate of the mount's link
    pub baud: u32,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud: crate::servo::SERVO_BAUD,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// Numeric bounds are validated on load; invalid values are rejected,
    /// never clamped.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.sweep.validate()?;
        self.map
            .validate()
            .map_err(|e| crate::Error::InvalidParameter(e.to_string()))?;
        Ok(())
    }

    /// Save configuration to a TOML file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}
