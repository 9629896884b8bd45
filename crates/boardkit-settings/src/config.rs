//! Configuration and settings management for BoardKit
//!
//! Provides configuration file handling, validation and conversion into the
//! engine's [`BoardOptions`]. Supports JSON and TOML file formats stored in
//! platform-specific directories.
//!
//! Configuration is organized into logical sections:
//! - Undo history depth
//! - Spatial index tuning
//! - Extended-object behavior
//! - Logging

use std::fmt;
use std::path::{Path, PathBuf};

use boardkit_core::{Coord, FloaterBboxPolicy};
use boardkit_designer::BoardOptions;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};

/// Undo history settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UndoSettings {
    /// History depth in undo steps
    pub max_serials: usize,
}

impl Default for UndoSettings {
    fn default() -> Self {
        Self { max_serials: 100 }
    }
}

/// Spatial index settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialSettings {
    /// Grid cell edge in nanometres
    pub cell_size: Coord,
}

impl Default for SpatialSettings {
    fn default() -> Self {
        Self {
            cell_size: 1_000_000,
        }
    }
}

/// Extended-object settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtObjSettings {
    /// Whether floaters count towards a composite's full bounding box
    pub floater_bbox: FloaterBboxPolicy,
    /// Run the extended-object hooks when floaters are edited
    pub regenerate_on_edit: bool,
}

impl Default for ExtObjSettings {
    fn default() -> Self {
        Self {
            floater_bbox: FloaterBboxPolicy::Exclude,
            regenerate_on_edit: true,
        }
    }
}

/// Log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// The directive understood by `tracing` filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default level; `RUST_LOG` takes precedence when set
    pub level: LogLevel,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

/// Complete editor configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Undo history
    pub undo: UndoSettings,
    /// Spatial index
    pub spatial: SpatialSettings,
    /// Extended objects
    pub extobj: ExtObjSettings,
    /// Logging
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform location of the config file, e.g.
    /// `~/.config/boardkit/config.toml` on Linux.
    pub fn default_path() -> SettingsResult<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::NoConfigDir(std::env::consts::OS.to_string()))?;
        Ok(dir.join("boardkit").join("config.toml"))
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = Format::of(path)?;
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Loads `path`, falling back to defaults if the file does not exist.
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }

    /// Save config to file (JSON or TOML), creating parent directories
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;
        let format = Format::of(path)?;

        let content = match format {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| SettingsError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, content).map_err(|source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.undo.max_serials == 0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "undo.max_serials".to_string(),
                value: self.undo.max_serials.to_string(),
            });
        }

        if self.spatial.cell_size <= 0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "spatial.cell_size".to_string(),
                value: self.spatial.cell_size.to_string(),
            });
        }

        Ok(())
    }

    /// The engine options this configuration describes.
    pub fn board_options(&self) -> BoardOptions {
        BoardOptions {
            max_serials: self.undo.max_serials,
            cell_size: self.spatial.cell_size,
            floater_bbox: self.extobj.floater_bbox,
            regenerate_on_edit: self.extobj.regenerate_on_edit,
        }
    }
}
