//! Runner configuration, loaded from YAML.
//!
//! Every section is optional; anything missing takes its default.
//!
//! ```yaml
//! serial:
//!   port: /dev/ttyACM0
//!   baud_rate: 9600
//! tick:
//!   rate_hz: 60
//! led_pulse_ms: 500
//! garden:
//!   seed: 42
//!   seed_starter_plants: true
//! ```

use crate::error::ConfigError;
use crate::transport::{SerialPortOpener, DEFAULT_BAUD_RATE};
use garden_sim::joystick::DEFAULT_RADIUS;
use garden_sim::GardenConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Serial port settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Port path. Without one the garden runs on the joystick only.
    pub port: Option<String>,
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: 100,
        }
    }
}

/// Tick loop settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    pub rate_hz: f64,
    /// Lateness that triggers a warning and a schedule reset.
    pub max_lag_ms: u64,
    /// Interval for periodic summaries. `None` disables them.
    pub summary_interval_secs: Option<u64>,
}

impl Default for TickConfig {
    fn default() -> Self {
        TickConfig {
            rate_hz: 60.0,
            max_lag_ms: 100,
            summary_interval_secs: Some(10),
        }
    }
}

/// Everything the runner needs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub serial: SerialConfig,
    pub tick: TickConfig,
    /// How long the LED stays on after a planting.
    pub led_pulse_ms: u64,
    pub garden: GardenConfig,
    /// Pointer distance that maps to a full-scale joystick reading.
    pub joystick_radius: f64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            serial: SerialConfig::default(),
            tick: TickConfig::default(),
            led_pulse_ms: 500,
            garden: GardenConfig::default(),
            joystick_radius: DEFAULT_RADIUS,
        }
    }
}

impl RunnerConfig {
    /// Load and validate a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as null
        let config: RunnerConfig = if content.trim().is_empty() {
            RunnerConfig::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check values the types alone cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick.rate_hz > 0.0 && self.tick.rate_hz.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "tick.rate_hz must be positive, got {}",
                self.tick.rate_hz
            )));
        }
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::Invalid("serial.baud_rate must be non-zero".into()));
        }
        if !(self.joystick_radius > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "joystick_radius must be positive, got {}",
                self.joystick_radius
            )));
        }
        self.garden.validate()?;
        Ok(())
    }

    /// LED pulse length.
    pub fn led_pulse(&self) -> Duration {
        Duration::from_millis(self.led_pulse_ms)
    }

    /// Opener for the configured port, if any.
    pub fn serial_opener(&self) -> Option<SerialPortOpener> {
        self.serial.port.as_ref().map(|path| SerialPortOpener {
            path: path.clone(),
            baud_rate: self.serial.baud_rate,
            read_timeout: Duration::from_millis(self.serial.read_timeout_ms),
        })
    }
}
