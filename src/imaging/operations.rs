//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, Dimensions, EncodedImage, ImageBackend};
use super::calculations::calculate_downscale_dimensions;
use super::params::{CropParams, CropRegion, DownscaleParams, FillColor, Quality};
use std::sync::Arc;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, bytes: &[u8]) -> Result<Dimensions> {
    backend.identify(bytes)
}

/// Configuration for the pre-crop downscale step.
#[derive(Debug, Clone)]
pub struct DownscaleConfig {
    /// Longest allowed edge before cropping.
    pub max_dimension: u32,
    pub quality: Quality,
    pub fill: FillColor,
}

impl Default for DownscaleConfig {
    fn default() -> Self {
        Self {
            max_dimension: 2000,
            quality: Quality::default(),
            fill: FillColor::WHITE,
        }
    }
}

/// Outcome of [`downscale_image`].
#[derive(Debug, Clone, PartialEq)]
pub struct Downscaled {
    pub image: EncodedImage,
    /// `false` when the source already fit and kept its dimensions.
    pub resized: bool,
}

/// Plan a downscale without executing it.
///
/// Sources within the limit are planned at their own size, so they are still
/// decoded and re-encoded.
pub fn plan_downscale(
    source: &Arc<[u8]>,
    dimensions: Dimensions,
    config: &DownscaleConfig,
) -> DownscaleParams {
    let (width, height) = calculate_downscale_dimensions(dimensions.as_tuple(), config.max_dimension)
        .unwrap_or(dimensions.as_tuple());
    DownscaleParams {
        source: Arc::clone(source),
        width,
        height,
        fill: config.fill,
        quality: config.quality,
    }
}

/// Bound an image's longest edge before it reaches the crop tool.
///
/// The result is always a freshly encoded JPEG. A full decode happens on
/// every path, so a corrupt body fails here and not at commit time.
pub fn downscale_image(
    backend: &impl ImageBackend,
    source: Arc<[u8]>,
    dimensions: Dimensions,
    config: &DownscaleConfig,
) -> Result<Downscaled> {
    let params = plan_downscale(&source, dimensions, config);
    let resized = (params.width, params.height) != dimensions.as_tuple();
    Ok(Downscaled {
        image: backend.downscale(&params)?,
        resized,
    })
}

/// Configuration for committing a crop.
#[derive(Debug, Clone)]
pub struct CropConfig {
    /// Locked aspect ratio as (width, height).
    pub aspect: (u32, u32),
    /// Exact output raster as (width, height).
    pub output_size: (u32, u32),
    pub quality: Quality,
    pub fill: FillColor,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            aspect: (1, 1),
            output_size: (1000, 1000),
            quality: Quality::default(),
            fill: FillColor::WHITE,
        }
    }
}

/// Plan a crop render without executing it.
pub fn plan_crop(source: &Arc<[u8]>, region: CropRegion, config: &CropConfig) -> CropParams {
    CropParams {
        source: Arc::clone(source),
        region,
        output_width: config.output_size.0,
        output_height: config.output_size.1,
        fill: config.fill,
        quality: config.quality,
    }
}

/// Render a crop region to the configured output raster.
pub fn render_crop(
    backend: &impl ImageBackend,
    source: &Arc<[u8]>,
    region: CropRegion,
    config: &CropConfig,
) -> Result<EncodedImage> {
    backend.crop(&plan_crop(source, region, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp, fake_png};

    #[test]
    fn get_dimensions_calls_backend() {
        let backend = MockBackend::new();
        let dims = get_dimensions(&backend, &fake_png(1920, 1080)).unwrap();
        assert_eq!(dims, Dimensions::new(1920, 1080));
    }

    #[test]
    fn plan_downscale_keeps_size_when_small() {
        let source: Arc<[u8]> = fake_png(800, 600).into();
        let params = plan_downscale(&source, Dimensions::new(800, 600), &DownscaleConfig::default());
        assert_eq!((params.width, params.height), (800, 600));
    }

    #[test]
    fn plan_downscale_clamps_longer_edge() {
        let source: Arc<[u8]> = fake_png(4000, 3000).into();
        let params = plan_downscale(&source, Dimensions::new(4000, 3000), &DownscaleConfig::default());
        assert_eq!((params.width, params.height), (2000, 1500));
        assert_eq!(params.quality.value(), 90);
    }

    #[test]
    fn downscale_image_reencodes_when_small() {
        let backend = MockBackend::new();
        let source: Arc<[u8]> = fake_png(800, 600).into();
        let out = downscale_image(
            &backend,
            Arc::clone(&source),
            Dimensions::new(800, 600),
            &DownscaleConfig::default(),
        )
        .unwrap();

        assert!(!out.resized);
        assert_eq!(out.image.dimensions, Dimensions::new(800, 600));
        assert!(!Arc::ptr_eq(&out.image.bytes, &source));
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Downscale {
                width: 800,
                height: 600,
                quality: 90
            }]
        );
    }

    #[test]
    fn downscale_image_uses_backend_when_large() {
        let backend = MockBackend::new();
        let out = downscale_image(
            &backend,
            fake_png(3000, 4500).into(),
            Dimensions::new(3000, 4500),
            &DownscaleConfig::default(),
        )
        .unwrap();

        assert!(out.resized);
        assert_eq!(out.image.dimensions, Dimensions::new(1333, 2000));
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Downscale {
                width: 1333,
                height: 2000,
                quality: 90
            }]
        );
    }

    #[test]
    fn downscale_respects_custom_limit() {
        let backend = MockBackend::new();
        let config = DownscaleConfig {
            max_dimension: 500,
            quality: Quality::new(80),
            ..DownscaleConfig::default()
        };
        let out = downscale_image(
            &backend,
            fake_png(1000, 250).into(),
            Dimensions::new(1000, 250),
            &config,
        )
        .unwrap();
        assert_eq!(out.image.dimensions, Dimensions::new(500, 125));
    }

    #[test]
    fn plan_crop_uses_output_size() {
        let source: Arc<[u8]> = fake_png(2000, 1500).into();
        let params = plan_crop(&source, CropRegion::new(250, 0, 1500, 1500), &CropConfig::default());
        assert_eq!((params.output_width, params.output_height), (1000, 1000));
        assert_eq!(params.fill, FillColor::WHITE);
        assert_eq!(params.quality.value(), 90);
    }

    #[test]
    fn render_crop_uses_backend() {
        let backend = MockBackend::new();
        let source: Arc<[u8]> = fake_png(600, 800).into();
        let out = render_crop(
            &backend,
            &source,
            CropRegion::new(0, 100, 600, 600),
            &CropConfig::default(),
        )
        .unwrap();

        assert_eq!(out.dimensions, Dimensions::new(1000, 1000));
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Crop {
                region: CropRegion { x: 0, y: 100, width: 600, height: 600 },
                output_width: 1000,
                output_height: 1000,
                ..
            }
        ));
    }
}
