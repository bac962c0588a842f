//! Configuration file management for waveplay.
//!
//! This module handles loading and saving application configuration from TOML files.
//! Configuration is stored in the user's config directory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::playback::DEFAULT_NOTIFICATIONS_PER_SECOND;
use crate::surface::{Color, Paint, SurfaceCapabilities, TextPaint};
use crate::waveform::WaveformStyle;

/// Errors raised while loading or saving the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not find home directory")]
    NoHomeDir,

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// A color that is not `#RRGGBB` or `#AARRGGBB`.
#[derive(Error, Debug)]
#[error("invalid color '{0}', expected #RRGGBB or #AARRGGBB")]
pub struct InvalidColor(String);

/// A color stored as a hex string in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(pub Color);

impl TryFrom<String> for HexColor {
    type Error = InvalidColor;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value).map(HexColor).ok_or(InvalidColor(value))
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0.to_hex()
    }
}

/// How the playback waveform is cached between frames.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheKind {
    /// Whatever the drawing surface prefers
    #[default]
    Auto,
    /// Rasterize once, blit every frame
    Bitmap,
    /// Record draw operations once, replay every frame
    Recording,
}

impl std::fmt::Display for CacheKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Bitmap => write!(f, "bitmap"),
            Self::Recording => write!(f, "recording"),
        }
    }
}

/// Audio device and streaming configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Audio device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `waveplay list-devices`
    /// - device name from `waveplay list-devices`
    #[serde(default = "default_device")]
    pub device: String,
    /// Samples per write to the output; defaults to the sink's minimum buffer size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
    /// Playback progress updates per second
    #[serde(default = "default_notifications_per_second")]
    pub notifications_per_second: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            chunk_size: None,
            notifications_per_second: default_notifications_per_second(),
        }
    }
}

fn default_device() -> String {
    "default".to_string()
}

fn default_notifications_per_second() -> u32 {
    DEFAULT_NOTIFICATIONS_PER_SECOND
}

/// Waveform appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveformConfig {
    /// Outline thickness in pixels
    #[serde(default = "default_stroke_thickness")]
    pub stroke_thickness: f32,
    #[serde(default = "default_stroke_color")]
    pub stroke_color: HexColor,
    #[serde(default = "default_fill_color")]
    pub fill_color: HexColor,
    #[serde(default = "default_marker_color")]
    pub marker_color: HexColor,
    #[serde(default = "default_timecode_color")]
    pub timecode_color: HexColor,
    /// Timecode glyph height in pixels
    #[serde(default = "default_text_size")]
    pub text_size: f32,
    /// Draw time labels along the top of the waveform
    #[serde(default = "default_true")]
    pub show_text_axis: bool,
    #[serde(default)]
    pub cache: CacheKind,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            stroke_thickness: default_stroke_thickness(),
            stroke_color: default_stroke_color(),
            fill_color: default_fill_color(),
            marker_color: default_marker_color(),
            timecode_color: default_timecode_color(),
            text_size: default_text_size(),
            show_text_axis: true,
            cache: CacheKind::default(),
        }
    }
}

fn default_stroke_thickness() -> f32 {
    1.0
}

fn default_stroke_color() -> HexColor {
    HexColor(Color::rgb(0xCE, 0xE0, 0xDC))
}

fn default_fill_color() -> HexColor {
    HexColor(Color::argb(0x80, 0xB9, 0xCF, 0xD4))
}

fn default_marker_color() -> HexColor {
    HexColor(Color::rgb(0xE0, 0x40, 0x40))
}

fn default_timecode_color() -> HexColor {
    HexColor(Color::rgb(0xB9, 0xCF, 0xD4))
}

fn default_text_size() -> f32 {
    5.0
}

fn default_true() -> bool {
    true
}

impl WaveformConfig {
    /// Paints for the waveform view.
    pub fn style(&self) -> WaveformStyle {
        WaveformStyle {
            stroke: Paint::new(self.stroke_color.0).with_stroke_width(self.stroke_thickness),
            fill: Paint::new(self.fill_color.0),
            marker: Paint::new(self.marker_color.0),
            timecode: TextPaint {
                color: self.timecode_color.0,
                size: self.text_size,
            },
        }
    }

    /// Surface capabilities to build the cache with, given what the host
    /// surface reports.
    pub fn capabilities(&self, host: SurfaceCapabilities) -> SurfaceCapabilities {
        match self.cache {
            CacheKind::Auto => host,
            CacheKind::Bitmap => SurfaceCapabilities { recording: false },
            CacheKind::Recording => SurfaceCapabilities { recording: true },
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaveplayConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub waveform: WaveformConfig,
}

impl WaveplayConfig {
    /// Loads configuration from the user's config directory, writing the
    /// defaults there first if no file exists yet.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If the config file cannot be read or written
    /// - If the TOML is malformed
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = config_path()?;
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(&config_path)?;
            tracing::info!("Default configuration written to {}", config_path.display());
            return Ok(config);
        }
        Self::load_from(&config_path)
    }

    /// Loads configuration from `path`.
    ///
    /// # Errors
    /// - If the file cannot be read
    /// - If the TOML is malformed
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content)?;
        tracing::debug!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Saves configuration to `path`, creating its directory if needed.
    ///
    /// # Errors
    /// - If the directory cannot be created
    /// - If the file cannot be written
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(io_error)?;
        Ok(())
    }
}

/// Retrieves the path to the config file.
///
/// # Errors
/// - If the home directory cannot be determined
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(".config").join("waveplay").join("waveplay.toml"))
}
