//! Editor Configuration
//!
//! Loaded from JSON. Every field has a default, so a partial file is valid.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Background, Canvas, ModelError, MIN_PLACEMENT_SIZE};
use crate::scene::DEFAULT_HANDLE_SIZE;

/// Fixed output file name; repeated exports overwrite it.
pub const DEFAULT_EXPORT_FILE_NAME: &str = "Collage.png";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid canvas config: {0}")]
    Canvas(#[from] ModelError),

    #[error("Unknown export resolution: {0} (expected logical or view)")]
    UnknownResolution(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default = "default_min_size")]
    pub min_placement_size: f64,
    #[serde(default = "default_placement_size")]
    pub default_placement_size: f64,
    #[serde(default = "default_handle_size")]
    pub handle_size: f64,
    #[serde(default)]
    pub snap_grid: Option<f64>,
    #[serde(default)]
    pub export: ExportConfig,
}

fn default_title() -> String { "New Collage".to_string() }
fn default_min_size() -> f64 { MIN_PLACEMENT_SIZE }
fn default_placement_size() -> f64 { 300.0 }
fn default_handle_size() -> f64 { DEFAULT_HANDLE_SIZE }

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            canvas: CanvasConfig::default(),
            min_placement_size: default_min_size(),
            default_placement_size: default_placement_size(),
            handle_size: default_handle_size(),
            snap_grid: None,
            export: ExportConfig::default(),
        }
    }
}

impl EditorConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.canvas.build()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasConfig {
    #[serde(default = "default_canvas_width")]
    pub width: u32,
    #[serde(default = "default_canvas_height")]
    pub height: u32,
    #[serde(default)]
    pub background: Background,
}

fn default_canvas_width() -> u32 { 800 }
fn default_canvas_height() -> u32 { 600 }

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: default_canvas_width(),
            height: default_canvas_height(),
            background: Background::default(),
        }
    }
}

impl CanvasConfig {
    pub fn build(&self) -> Result<Canvas, ModelError> {
        Canvas::new(self.width, self.height, self.background.clone())
    }
}

/// Resolution an export is rendered at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportResolution {
    /// Canvas width x height, independent of display scale.
    #[default]
    Logical,
    /// Canvas size multiplied by the current view scale.
    View,
}

impl FromStr for ExportResolution {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "logical" => Ok(Self::Logical),
            "view" => Ok(Self::View),
            _ => Err(ConfigError::UnknownResolution(s.to_string())),
        }
    }
}

impl fmt::Display for ExportResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Logical => f.write_str("logical"),
            Self::View => f.write_str("view"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportConfig {
    /// Output directory; the user's picture directory when unset.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default = "default_file_name")]
    pub file_name: String,
    #[serde(default)]
    pub resolution: ExportResolution,
}

fn default_file_name() -> String { DEFAULT_EXPORT_FILE_NAME.to_string() }

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: None,
            file_name: default_file_name(),
            resolution: ExportResolution::default(),
        }
    }
}

impl ExportConfig {
    /// Where an export lands: `<directory>/<file_name>`.
    pub fn output_path(&self) -> PathBuf {
        let dir = self
            .directory
            .clone()
            .or_else(dirs::picture_dir)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        dir.join(&self.file_name)
    }
}
