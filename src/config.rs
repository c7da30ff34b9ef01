//! Intake configuration.
//!
//! Handles loading, validating, and merging `listing-images.toml`. The file is
//! optional: stock defaults are serialized to a TOML table and the user's file
//! is overlaid on top of it key by key, so a config only needs the values it
//! wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [downscale]
//! max_dimension = 2000          # Longer edge bound before cropping
//! quality = 90                  # JPEG quality of the downscaled copy (1-100)
//! max_source_pixels = 100000000 # Refuse sources larger than this
//!
//! [crop]
//! aspect_ratio = [1, 1]         # width:height of the crop selection
//! output_size = [1000, 1000]    # Pixel size of every committed crop
//! quality = 90                  # JPEG quality of committed crops (1-100)
//! fill_color = "#ffffff"        # Background behind transparent pixels
//!
//! [gallery]
//! max_images = 4                # main image + image_2..image_4
//!
//! [processing]
//! max_processes = 4             # Max parallel decode workers (omit for auto)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::decode::DecodeLimits;
use crate::imaging::{CropConfig, DownscaleConfig, FillColor, Quality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "listing-images.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Intake configuration loaded from `listing-images.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntakeConfig {
    pub downscale: DownscaleSection,
    pub crop: CropSection,
    pub gallery: GallerySection,
    pub processing: ProcessingConfig,
}

impl IntakeConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_quality("downscale.quality", self.downscale.quality)?;
        check_quality("crop.quality", self.crop.quality)?;
        if self.downscale.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "downscale.max_dimension must be non-zero".into(),
            ));
        }
        if self.downscale.max_source_pixels == 0 {
            return Err(ConfigError::Validation(
                "downscale.max_source_pixels must be non-zero".into(),
            ));
        }

        let [aw, ah] = self.crop.aspect_ratio;
        if aw == 0 || ah == 0 {
            return Err(ConfigError::Validation(
                "crop.aspect_ratio values must be non-zero".into(),
            ));
        }
        let [ow, oh] = self.crop.output_size;
        if ow == 0 || oh == 0 {
            return Err(ConfigError::Validation(
                "crop.output_size values must be non-zero".into(),
            ));
        }
        if u64::from(ow) * u64::from(ah) != u64::from(oh) * u64::from(aw) {
            return Err(ConfigError::Validation(format!(
                "crop.output_size {}x{} does not match aspect_ratio {}:{}",
                ow, oh, aw, ah
            )));
        }
        self.crop
            .fill_color
            .parse::<FillColor>()
            .map_err(|e| ConfigError::Validation(format!("crop.fill_color: {}", e)))?;

        if self.gallery.max_images == 0 {
            return Err(ConfigError::Validation(
                "gallery.max_images must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Limits for the background decode job.
    pub fn decode_limits(&self) -> DecodeLimits {
        DecodeLimits {
            downscale: DownscaleConfig {
                max_dimension: self.downscale.max_dimension,
                quality: Quality::new(self.downscale.quality),
                fill: self.fill(),
            },
            max_source_pixels: self.downscale.max_source_pixels,
        }
    }

    /// Settings for the crop tool and committed output.
    pub fn crop_config(&self) -> CropConfig {
        let [aw, ah] = self.crop.aspect_ratio;
        let [ow, oh] = self.crop.output_size;
        CropConfig {
            aspect: (aw, ah),
            output_size: (ow, oh),
            quality: Quality::new(self.crop.quality),
            fill: self.fill(),
        }
    }

    fn fill(&self) -> FillColor {
        self.crop.fill_color.parse().unwrap_or_default()
    }
}

fn check_quality(key: &str, value: u32) -> Result<(), ConfigError> {
    if (1..=100).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!("{} must be 1-100", key)))
    }
}

/// Downscale-before-crop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownscaleSection {
    /// Longer edge bound, in pixels.
    pub max_dimension: u32,
    pub quality: u32,
    /// Sources whose header claims more pixels are refused before decoding.
    pub max_source_pixels: u64,
}

impl Default for DownscaleSection {
    fn default() -> Self {
        Self {
            max_dimension: 2000,
            quality: 90,
            max_source_pixels: 100_000_000,
        }
    }
}

/// Crop tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CropSection {
    /// Aspect ratio as `[width, height]`, e.g. `[1, 1]` for square crops.
    pub aspect_ratio: [u32; 2],
    /// Exact pixel size of every committed crop.
    pub output_size: [u32; 2],
    pub quality: u32,
    /// `#rrggbb` colour placed behind transparent pixels.
    pub fill_color: String,
}

impl Default for CropSection {
    fn default() -> Self {
        Self {
            aspect_ratio: [1, 1],
            output_size: [1000, 1000],
            quality: 90,
            fill_color: "#ffffff".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GallerySection {
    pub max_images: usize,
}

impl Default for GallerySection {
    fn default() -> Self {
        Self { max_images: 4 }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel decode workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, but never zero
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(IntakeConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<IntakeConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: IntakeConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when it is missing.
pub fn load_config(path: &Path) -> Result<IntakeConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    if overlay.is_some() {
        log::debug!("loaded config overrides from {}", path.display());
    }
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Listing Images Configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Downscale before cropping
# ---------------------------------------------------------------------------
[downscale]
# Images whose longer edge exceeds this are scaled down proportionally
# before the crop tool opens. Smaller images are used as-is.
max_dimension = 2000

# JPEG quality of the downscaled copy (1 = worst, 100 = best).
quality = 90

# Sources whose header claims more pixels than this are refused.
max_source_pixels = 100000000

# ---------------------------------------------------------------------------
# Crop tool and committed output
# ---------------------------------------------------------------------------
[crop]
# Aspect ratio of the selection as [width, height].
aspect_ratio = [1, 1]

# Every committed crop is resized to exactly this many pixels.
# Must have the same proportions as aspect_ratio.
output_size = [1000, 1000]

# JPEG quality of committed crops (1 = worst, 100 = best).
quality = 90

# Colour placed behind transparent pixels (JPEG has no alpha).
fill_color = "#ffffff"

# ---------------------------------------------------------------------------
# Gallery
# ---------------------------------------------------------------------------
[gallery]
# Maximum number of images per listing. The first one is the preview.
max_images = 4

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel decode workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
