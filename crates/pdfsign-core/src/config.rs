//! Editor configuration
//!
//! Tunables for placement sizing, keyboard nudging, the drawing pad and
//! export naming. Loaded from TOML; every field has a default so an empty
//! document is a valid configuration.

use crate::error::SignPdfError;
use crate::placement::SizeLimits;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Largest pad side, in pixels
pub const MAX_PAD_DIMENSION: u32 = 4096;

/// Main configuration structure loaded from TOML files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Width of a freshly saved signature, in screen pixels
    #[serde(default = "default_width")]
    pub default_width: f64,
    /// Height of a freshly saved signature when `keep_image_aspect` is off
    #[serde(default = "default_height")]
    pub default_height: f64,
    /// Derive the initial height from the image's own aspect ratio
    #[serde(default = "default_true")]
    pub keep_image_aspect: bool,
    /// Smallest width a placement can be resized to
    #[serde(default = "default_min_size")]
    pub min_size: f64,
    /// Lower bound applied to a single resize factor
    #[serde(default = "default_min_scale_factor")]
    pub min_scale_factor: f64,
    /// Distance moved by one nudge, in screen pixels
    #[serde(default = "default_nudge_step")]
    pub nudge_step: f64,
    #[serde(default = "default_zoom_in_factor")]
    pub zoom_in_factor: f64,
    #[serde(default = "default_zoom_out_factor")]
    pub zoom_out_factor: f64,
    /// Label prefix for new signatures ("sign 1", "sign 2", ...)
    #[serde(default = "default_label_prefix")]
    pub label_prefix: String,
    /// chrono format string appended to exported file names
    #[serde(default = "default_file_timestamp_format")]
    pub file_timestamp_format: String,
    #[serde(default = "default_size_presets")]
    pub size_presets: Vec<SizePreset>,
    #[serde(default)]
    pub pad: PadConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_width: default_width(),
            default_height: default_height(),
            keep_image_aspect: true,
            min_size: default_min_size(),
            min_scale_factor: default_min_scale_factor(),
            nudge_step: default_nudge_step(),
            zoom_in_factor: default_zoom_in_factor(),
            zoom_out_factor: default_zoom_out_factor(),
            label_prefix: default_label_prefix(),
            file_timestamp_format: default_file_timestamp_format(),
            size_presets: default_size_presets(),
            pad: PadConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is malformed,
    /// or a value fails [`EditorConfig::validate`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SignPdfError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(s: &str) -> Result<Self, SignPdfError> {
        let config: Self = toml::from_str(s)
            .map_err(|e| SignPdfError::ConfigError(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject sizes and factors that would break placement invariants
    pub fn validate(&self) -> Result<(), SignPdfError> {
        let positive = [
            ("default_width", self.default_width),
            ("default_height", self.default_height),
            ("min_size", self.min_size),
            ("min_scale_factor", self.min_scale_factor),
            ("zoom_in_factor", self.zoom_in_factor),
            ("zoom_out_factor", self.zoom_out_factor),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SignPdfError::ConfigError(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        if !(self.nudge_step.is_finite() && self.nudge_step >= 0.0) {
            return Err(SignPdfError::ConfigError(format!(
                "nudge_step must not be negative, got {}",
                self.nudge_step
            )));
        }

        self.pad.validate()?;

        for preset in &self.size_presets {
            if !(preset.width.is_finite() && preset.width > 0.0) {
                return Err(SignPdfError::ConfigError(format!(
                    "size preset {} has invalid width {}",
                    preset.name, preset.width
                )));
            }
        }

        Ok(())
    }

    pub fn size_limits(&self) -> SizeLimits {
        SizeLimits {
            min_size: self.min_size,
            min_scale_factor: self.min_scale_factor,
        }
    }

    pub fn preset(&self, name: &str) -> Option<&SizePreset> {
        self.size_presets
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

/// Named placement width ("sm", "md", ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizePreset {
    pub name: String,
    pub width: f64,
}

/// Drawing surface settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PadConfig {
    #[serde(default = "default_pad_width")]
    pub width: u32,
    #[serde(default = "default_pad_height")]
    pub height: u32,
    #[serde(default = "default_pen_width")]
    pub pen_width: f64,
    /// Hex colour, e.g. "#000000"
    #[serde(default = "default_pen_color")]
    pub pen_color: String,
}

impl PadConfig {
    pub fn validate(&self) -> Result<(), SignPdfError> {
        if !(self.pen_width.is_finite() && self.pen_width > 0.0) {
            return Err(SignPdfError::ConfigError(format!(
                "pad.pen_width must be a positive number, got {}",
                self.pen_width
            )));
        }
        let in_range = |side: u32| (1..=MAX_PAD_DIMENSION).contains(&side);
        if !(in_range(self.width) && in_range(self.height)) {
            return Err(SignPdfError::ConfigError(format!(
                "pad dimensions must be between 1 and {}, got {}x{}",
                MAX_PAD_DIMENSION, self.width, self.height
            )));
        }
        Ok(())
    }
}

impl Default for PadConfig {
    fn default() -> Self {
        Self {
            width: default_pad_width(),
            height: default_pad_height(),
            pen_width: default_pen_width(),
            pen_color: default_pen_color(),
        }
    }
}

fn default_width() -> f64 {
    100.0
}

fn default_height() -> f64 {
    50.0
}

fn default_true() -> bool {
    true
}

fn default_min_size() -> f64 {
    20.0
}

fn default_min_scale_factor() -> f64 {
    0.2
}

fn default_nudge_step() -> f64 {
    5.0
}

fn default_zoom_in_factor() -> f64 {
    1.1
}

fn default_zoom_out_factor() -> f64 {
    0.9
}

fn default_label_prefix() -> String {
    "sign".to_string()
}

fn default_file_timestamp_format() -> String {
    "%Y%m%d%H%M%S".to_string()
}

fn default_size_presets() -> Vec<SizePreset> {
    [("sm", 50.0), ("md", 100.0), ("lg", 200.0), ("xl", 400.0)]
        .into_iter()
        .map(|(name, width)| SizePreset {
            name: name.to_string(),
            width,
        })
        .collect()
}

fn default_pad_width() -> u32 {
    500
}

fn default_pad_height() -> u32 {
    200
}

fn default_pen_width() -> f64 {
    2.5
}

fn default_pen_color() -> String {
    "#000000".to_string()
}
