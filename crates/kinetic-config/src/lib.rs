//! Kinetic configuration system
//!
//! Loads runtime settings from `kinetic.toml`, with environment variable
//! overrides for quick experiments.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Default configuration file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "kinetic.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KineticConfig {
    /// Named responsive conditions
    pub breakpoints: BreakpointConfig,
    /// Smooth-scroll engine options
    pub smooth_scroll: SmoothScrollConfig,
    /// Lifecycle timing
    pub lifecycle: LifecycleConfig,
    /// Pointer-follow effect settings
    pub magnetic: MagneticConfig,
    /// Scramble text settings
    pub scramble: ScrambleConfig,
}

/// Media queries for the breakpoint conditions, evaluated in this order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakpointConfig {
    pub mobile: String,
    pub mobile_landscape: String,
    pub tablet: String,
    pub desktop: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothScrollConfig {
    /// Seconds to ease toward a new scroll target
    pub duration: f64,
    pub smooth_wheel: bool,
    pub wheel_multiplier: f64,
    pub touch_multiplier: f64,
    pub infinite: bool,
    /// `vertical` or `horizontal`
    pub orientation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Delay before scroll-linked builders re-scan after a lifecycle signal
    pub settle_delay_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagneticConfig {
    /// Smallest viewport width at which the effect is wired
    pub min_viewport_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScrambleConfig {
    /// Seed for scramble noise; identical seeds give identical frames
    pub seed: u64,
}

impl Default for BreakpointConfig {
    fn default() -> Self {
        Self {
            mobile: "(max-width:479px)".to_string(),
            mobile_landscape: "(max-width:767px)".to_string(),
            tablet: "(max-width:991px)".to_string(),
            desktop: "(min-width:992px)".to_string(),
        }
    }
}

impl BreakpointConfig {
    /// `(condition name, media query)` pairs in evaluation order.
    pub fn named(&self) -> [(&'static str, &str); 4] {
        [
            ("mobile", self.mobile.as_str()),
            ("mobileLandscape", self.mobile_landscape.as_str()),
            ("tablet", self.tablet.as_str()),
            ("desktop", self.desktop.as_str()),
        ]
    }
}

impl Default for SmoothScrollConfig {
    fn default() -> Self {
        Self {
            duration: 1.2,
            smooth_wheel: true,
            wheel_multiplier: 1.0,
            touch_multiplier: 2.0,
            infinite: false,
            orientation: "vertical".to_string(),
        }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 100.0,
        }
    }
}

impl Default for MagneticConfig {
    fn default() -> Self {
        Self {
            min_viewport_width: 992.0,
        }
    }
}

impl KineticConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `kinetic.toml` from the current directory, or defaults if it is
    /// missing or invalid
    pub fn load_or_default() -> Self {
        match Self::load_from_file(DEFAULT_CONFIG_FILE) {
            Ok(config) => config,
            Err(ConfigError::Read { .. }) => Self::default(),
            Err(err) => {
                warn!(error = %err, "ignoring invalid configuration");
                Self::default()
            }
        }
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    pub fn merge_with_env(&mut self) {
        if let Ok(val) = std::env::var("KINETIC_SETTLE_DELAY_MS") {
            if let Ok(delay) = val.parse::<f64>() {
                self.lifecycle.settle_delay_ms = delay;
            }
        }
        if let Ok(val) = std::env::var("KINETIC_SMOOTH_DURATION") {
            if let Ok(duration) = val.parse::<f64>() {
                self.smooth_scroll.duration = duration;
            }
        }
        if let Ok(val) = std::env::var("KINETIC_SMOOTH_WHEEL") {
            self.smooth_scroll.smooth_wheel = val == "1" || val.eq_ignore_ascii_case("true");
        }
        if let Ok(val) = std::env::var("KINETIC_SCRAMBLE_SEED") {
            if let Ok(seed) = val.parse::<u64>() {
                self.scramble.seed = seed;
            }
        }
    }

    /// Load configuration with environment variable overrides
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = KineticConfig::default();
        assert_eq!(config.breakpoints.mobile, "(max-width:479px)");
        assert_eq!(config.smooth_scroll.duration, 1.2);
        assert_eq!(config.smooth_scroll.touch_multiplier, 2.0);
        assert_eq!(config.lifecycle.settle_delay_ms, 100.0);
        assert_eq!(config.magnetic.min_viewport_width, 992.0);
    }

    #[test]
    fn test_toml_serialization() {
        let config = KineticConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: KineticConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[lifecycle]\nsettle_delay_ms = 250\n\n[scramble]\nseed = 9").unwrap();

        let config = KineticConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.lifecycle.settle_delay_ms, 250.0);
        assert_eq!(config.scramble.seed, 9);
        assert_eq!(config.breakpoints, BreakpointConfig::default());
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[lifecycle\nsettle_delay_ms = ").unwrap();
        let err = KineticConfig::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = KineticConfig::load_from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_breakpoint_order() {
        let names: Vec<&str> = KineticConfig::default()
            .breakpoints
            .named()
            .iter()
            .map(|(name, _)| *name)
            .collect();
        assert_eq!(names, vec!["mobile", "mobileLandscape", "tablet", "desktop"]);
    }

    #[test]
    fn test_merge_with_env() {
        unsafe {
            std::env::set_var("KINETIC_SETTLE_DELAY_MS", "40");
            std::env::set_var("KINETIC_SMOOTH_WHEEL", "false");
        }

        let mut config = KineticConfig::default();
        config.merge_with_env();

        assert_eq!(config.lifecycle.settle_delay_ms, 40.0);
        assert!(!config.smooth_scroll.smooth_wheel);

        unsafe {
            std::env::remove_var("KINETIC_SETTLE_DELAY_MS");
            std::env::remove_var("KINETIC_SMOOTH_WHEEL");
        }
    }
}
