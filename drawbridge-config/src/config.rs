//! Application configuration management.
//!
//! This module provides configuration loading, saving, and default values
//! for the drawbridge workspace window, the diagram embed, and the chat
//! backend.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::layout::{PANEL_MAX_WIDTH, PANEL_MIN_WIDTH};

/// Log verbosity, configurable from the config file and overridable from the
/// CLI (`--log-level`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// Application configuration, persisted as YAML in the user config dir.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Window title.
    #[serde(default = "crate::defaults::window_title")]
    pub window_title: String,

    /// Initial window width in logical pixels.
    #[serde(default = "crate::defaults::window_width")]
    pub window_width: u32,

    /// Initial window height in logical pixels.
    #[serde(default = "crate::defaults::window_height")]
    pub window_height: u32,

    /// Base URL of the embedded diagram editor. The
    /// `DRAWBRIDGE_DIAGRAMS_URL` environment variable overrides this at
    /// startup.
    #[serde(default = "crate::defaults::diagrams_base_url")]
    pub diagrams_base_url: String,

    /// Chat-completions endpoint the assistant panel talks to.
    #[serde(default = "crate::defaults::chat_endpoint")]
    pub chat_endpoint: String,

    /// Model identifier sent with every completion request.
    #[serde(default = "crate::defaults::chat_model")]
    pub chat_model: String,

    /// Request timeout in seconds for chat calls. Zero disables the
    /// timeout entirely.
    #[serde(default = "crate::defaults::chat_timeout_secs")]
    pub chat_timeout_secs: u64,

    /// Chat panel width in pixels. Clamped on load to the same range the
    /// panel enforces while drag-resizing.
    #[serde(default = "crate::defaults::panel_width")]
    pub panel_width: f32,

    /// Whether the chat panel starts expanded.
    #[serde(default = "crate::defaults::bool_true")]
    pub panel_open_on_startup: bool,

    /// Log verbosity (CLI flag takes precedence).
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_title: crate::defaults::window_title(),
            window_width: crate::defaults::window_width(),
            window_height: crate::defaults::window_height(),
            diagrams_base_url: crate::defaults::diagrams_base_url(),
            chat_endpoint: crate::defaults::chat_endpoint(),
            chat_model: crate::defaults::chat_model(),
            chat_timeout_secs: crate::defaults::chat_timeout_secs(),
            panel_width: crate::defaults::panel_width(),
            panel_open_on_startup: crate::defaults::bool_true(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from file or create default.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        log::info!("Config path: {:?}", config_path);

        if config_path.exists() {
            log::info!("Loading existing config from {:?}", config_path);
            let contents = fs::read_to_string(&config_path)?;
            let mut config: Config = serde_yaml_ng::from_str(&contents)?;
            config.validate();
            Ok(config)
        } else {
            log::info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            if let Err(e) = config.save() {
                log::error!("Failed to save default config: {}", e);
                return Err(e);
            }
            Ok(config)
        }
    }

    /// Save configuration to file.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        // Create parent directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml_ng::to_string(self)?;
        fs::write(&config_path, yaml)?;

        Ok(())
    }

    /// Clamp out-of-range values from a hand-edited config file back into
    /// the supported range rather than failing the load.
    pub fn validate(&mut self) {
        let clamped = self.panel_width.clamp(PANEL_MIN_WIDTH, PANEL_MAX_WIDTH);
        if clamped != self.panel_width {
            log::warn!(
                "panel_width {} out of range [{PANEL_MIN_WIDTH}, {PANEL_MAX_WIDTH}], clamping",
                self.panel_width
            );
            self.panel_width = clamped;
        }
        if self.window_width == 0 || self.window_height == 0 {
            log::warn!("zero window dimensions in config, restoring defaults");
            self.window_width = crate::defaults::window_width();
            self.window_height = crate::defaults::window_height();
        }
    }

    /// Get the configuration file path (using XDG convention).
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    /// Get the configuration directory.
    pub fn config_dir() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            if let Some(config_dir) = dirs::config_dir() {
                config_dir.join("drawbridge")
            } else {
                PathBuf::from(".")
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            // Use XDG convention on all platforms: ~/.config/drawbridge
            if let Some(home_dir) = dirs::home_dir() {
                home_dir.join(".config").join("drawbridge")
            } else {
                PathBuf::from(".")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_round_trip_preserves_fields() {
        let mut config = Config::default();
        config.panel_width = 420.0;
        config.chat_model = "deepseek-reasoner".to_string();
        let yaml = serde_yaml_ng::to_string(&config).unwrap();
        let back: Config = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(back.panel_width, 420.0);
        assert_eq!(back.chat_model, "deepseek-reasoner");
        assert_eq!(back.window_title, "drawbridge");
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config: Config = serde_yaml_ng::from_str("window_title: custom\n").unwrap();
        assert_eq!(config.window_title, "custom");
        assert_eq!(config.chat_model, "deepseek-chat");
        assert_eq!(config.panel_width, crate::defaults::panel_width());
        assert!(config.panel_open_on_startup);
    }

    #[test]
    fn validate_clamps_panel_width() {
        let mut config = Config::default();
        config.panel_width = 10_000.0;
        config.validate();
        assert_eq!(config.panel_width, PANEL_MAX_WIDTH);

        config.panel_width = 1.0;
        config.validate();
        assert_eq!(config.panel_width, PANEL_MIN_WIDTH);
    }

    #[test]
    fn log_level_parses_case_insensitively() {
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
    }
}
