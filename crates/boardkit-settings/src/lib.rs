//! BoardKit Settings Crate
//!
//! Handles editor configuration: loading, validation and persistence of the
//! engine options (undo depth, spatial index, extended objects) and the
//! logging setup.

pub mod config;
pub mod error;

pub use config::{Config, ExtObjSettings, LogLevel, LoggingSettings, SpatialSettings, UndoSettings};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
