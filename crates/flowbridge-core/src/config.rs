//! Engine configuration.
//!
//! Reads `flowbridge.toml`-style files:
//!
//! ```toml
//! [layout]
//! origin_x = 250
//! baseline_y = 300
//! spacing = 250
//!
//! [schedule]
//! interval = 15
//! unit = "minutes"
//! ```
//!
//! Every key is optional; missing keys take the defaults shown above.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{BridgeError, Result};
use crate::sequence::{ScheduleUnit, Scheduling};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Canvas placement used when a step carries no position of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// X coordinate of the first step.
    pub origin_x: f64,
    /// Y coordinate every synthesized step sits on.
    pub baseline_y: f64,
    /// Horizontal distance between neighbouring steps.
    pub spacing: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            origin_x: 250.0,
            baseline_y: 300.0,
            spacing: 250.0,
        }
    }
}

/// Recurring schedule attached when a sequential process is activated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub interval: u32,
    pub unit: ScheduleUnit,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval: 15,
            unit: ScheduleUnit::Minutes,
        }
    }
}

impl ScheduleConfig {
    pub fn scheduling(&self) -> Scheduling {
        Scheduling::recurring(self.interval, self.unit)
    }
}

/// Top-level configuration shared by every engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub layout: LayoutConfig,
    pub schedule: ScheduleConfig,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl BridgeConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`.
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged.  An unreadable or malformed file is.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!(
            path = %path.display(),
            spacing = config.layout.spacing,
            interval = config.schedule.interval,
            "loaded bridge config"
        );
        Ok(config)
    }

    /// Reject values no engine can work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.layout.spacing.is_finite() && self.layout.spacing > 0.0) {
            return Err(BridgeError::InvalidConfig {
                reason: format!("layout.spacing must be positive, got {}", self.layout.spacing),
            });
        }
        if self.schedule.interval == 0 {
            return Err(BridgeError::InvalidConfig {
                reason: "schedule.interval must be at least 1".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.layout.origin_x, 250.0);
        assert_eq!(config.layout.baseline_y, 300.0);
        assert_eq!(config.layout.spacing, 250.0);
        assert_eq!(config.schedule.interval, 15);
        assert_eq!(config.schedule.unit, ScheduleUnit::Minutes);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = BridgeConfig::from_toml_str(
            r#"
            [layout]
            spacing = 300

            [schedule]
            unit = "hours"
            "#,
        )
        .unwrap();
        assert_eq!(config.layout.spacing, 300.0);
        assert_eq!(config.layout.origin_x, 250.0);
        assert_eq!(config.schedule.unit, ScheduleUnit::Hours);
        assert_eq!(config.schedule.interval, 15);
    }

    #[test]
    fn rejects_bad_values() {
        let err = BridgeConfig::from_toml_str("[layout]\nspacing = 0").unwrap_err();
        assert!(matches!(err, BridgeError::InvalidConfig { .. }));

        let err = BridgeConfig::from_toml_str("[schedule]\ninterval = 0").unwrap_err();
        assert!(matches!(err, BridgeError::InvalidConfig { .. }));

        let err = BridgeConfig::from_toml_str("[layout\n").unwrap_err();
        assert!(matches!(err, BridgeError::Toml(_)));
    }

    #[test]
    fn load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BridgeConfig::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[schedule]\ninterval = 5\nunit = \"days\"").unwrap();
        let config = BridgeConfig::load(file.path()).unwrap();
        assert_eq!(config.schedule.scheduling(), Scheduling::recurring(5, ScheduleUnit::Days));
    }
}
