//! Configuration file support.
//!
//! This module provides serialization and deserialization of application
//! settings: drawing defaults, history behavior and log verbosity.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::history::HistoryConfig;
use crate::model::Color;
use crate::render::DrawStyle;
use crate::session::SessionOptions;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration that can be exported and imported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Drawing defaults
    #[serde(default)]
    pub drawing: DrawingConfig,

    /// Undo/redo behavior
    #[serde(default)]
    pub history: HistorySettings,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Drawing section of the config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawingConfig {
    /// Outline color for boxes
    #[serde(default = "default_box_color")]
    pub box_color: [u8; 3],

    /// Line color for freehand strokes
    #[serde(default = "default_stroke_color")]
    pub stroke_color: [u8; 3],

    /// Label text color
    #[serde(default = "default_label_color")]
    pub label_color: [u8; 3],

    /// Outline and stroke width in pixels
    #[serde(default = "default_line_width")]
    pub line_width: u32,

    /// Label text height in pixels
    #[serde(default = "default_font_size")]
    pub font_size: f32,

    /// Font used for burned-in labels
    #[serde(default)]
    pub font_path: Option<PathBuf>,

    /// Factor applied by zoom in (zoom out uses its inverse)
    #[serde(default = "default_zoom_step")]
    pub zoom_step: f32,
}

fn default_box_color() -> [u8; 3] {
    DrawStyle::default().box_color.0
}

fn default_stroke_color() -> [u8; 3] {
    DrawStyle::default().stroke_color.0
}

fn default_label_color() -> [u8; 3] {
    DrawStyle::default().label_color.0
}

fn default_line_width() -> u32 {
    DrawStyle::default().line_width
}

fn default_font_size() -> f32 {
    DrawStyle::default().font_size
}

fn default_zoom_step() -> f32 {
    1.1
}

impl Default for DrawingConfig {
    fn default() -> Self {
        Self {
            box_color: default_box_color(),
            stroke_color: default_stroke_color(),
            label_color: default_label_color(),
            line_width: default_line_width(),
            font_size: default_font_size(),
            font_path: None,
            zoom_step: default_zoom_step(),
        }
    }
}

/// History section of the config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySettings {
    /// Maximum undo steps kept (0 keeps everything)
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// One undo step per press-drag-release gesture
    #[serde(default = "default_true")]
    pub coalesce_gestures: bool,

    /// Undoing a freshly labeled annotation removes it together with its label
    #[serde(default = "default_true")]
    pub fold_labels: bool,
}

fn default_max_history() -> usize {
    HistoryConfig::default().max_history
}

fn default_true() -> bool {
    true
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
            coalesce_gestures: true,
            fold_labels: true,
        }
    }
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            drawing: DrawingConfig::default(),
            history: HistorySettings::default(),
            log_level: LogLevel::default(),
        }
    }

    /// Session options derived from this configuration.
    pub fn session_options(&self) -> SessionOptions {
        let zoom_step = if self.drawing.zoom_step.is_finite() && self.drawing.zoom_step > 1.0 {
            self.drawing.zoom_step
        } else {
            log::warn!(
                "Ignoring zoom step {}, it must be greater than 1",
                self.drawing.zoom_step
            );
            default_zoom_step()
        };
        SessionOptions {
            style: DrawStyle {
                box_color: Color(self.drawing.box_color),
                stroke_color: Color(self.drawing.stroke_color),
                label_color: Color(self.drawing.label_color),
                line_width: self.drawing.line_width,
                font_size: self.drawing.font_size,
            },
            history: HistoryConfig {
                max_history: self.history.max_history,
            },
            coalesce_gestures: self.history.coalesce_gestures,
            fold_labels: self.history.fold_labels,
            zoom_step,
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "annomark-config.json"
    }

    /// Get the default config file path for auto-load/save.
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("annomark").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("annomark")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load configuration from a file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load_from(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to a file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Save configuration to the default path.
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;
        self.save_to(&path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
