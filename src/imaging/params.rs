//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides whether to downscale and what to crop) and the
//! [`backend`](super::backend) (which does the actual pixel work). Swapping the
//! backend for a mock in tests does not change any operation logic.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 90). Clamped on construction.
//! - [`FillColor`]: Opaque RGB colour painted under transparent pixels.
//! - [`CropRegion`]: A rectangle in source pixel coordinates.
//! - [`DownscaleParams`]: Source bytes plus the bounded target dimensions.
//! - [`CropParams`]: Source bytes, crop region, exact output size, fill, quality.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Quality setting for lossy JPEG encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// The same value in the `u8` form JPEG encoders take.
    pub fn as_u8(self) -> u8 {
        self.0.clamp(1, 100) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Background colour for flattening transparency before JPEG encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl FillColor {
    pub const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
    };

    pub fn rgb(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl Default for FillColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for FillColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for FillColor {
    type Err = String;

    /// Parse a `#rrggbb` hex colour.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| format!("expected #rrggbb, got {s:?}"))?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("expected #rrggbb, got {s:?}"));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| format!("{s:?}: {e}"))
        };
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }
}

/// A rectangle in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl fmt::Display for CropRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Parameters for a bounded downscale + JPEG re-encode.
#[derive(Debug, Clone, PartialEq)]
pub struct DownscaleParams {
    pub source: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
    /// JPEG has no alpha channel; transparent pixels land on this colour.
    pub fill: FillColor,
    pub quality: Quality,
}

/// Parameters for rendering a crop region to an exact output raster.
#[derive(Debug, Clone, PartialEq)]
pub struct CropParams {
    pub source: Arc<[u8]>,
    pub region: CropRegion,
    /// Final raster dimensions; the region is scaled to exactly this size.
    pub output_width: u32,
    pub output_height: u32,
    pub fill: FillColor,
    pub quality: Quality,
}
