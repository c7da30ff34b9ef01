//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image::load_from_memory` |
//! | Identify | `ImageReader::into_dimensions` (header only, no pixel decode) |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Crop | `DynamicImage::crop_imm` |
//! | Flatten alpha | per-pixel blend onto the fill colour |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder::new_with_quality` |

use super::backend::{BackendError, Dimensions, EncodedImage, ImageBackend};
use super::params::{CropParams, DownscaleParams, FillColor, Quality};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, Rgb, RgbImage};
use std::io::Cursor;
use std::path::Path;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
    ("gif", ImageFormat::Gif),
    ("bmp", ImageFormat::Bmp),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether a path carries one of the [`supported_input_extensions`].
pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(e))
        })
}

/// Pure Rust backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode an image held in memory.
fn load_image(bytes: &[u8]) -> Result<DynamicImage, BackendError> {
    image::load_from_memory(bytes)
        .map_err(|e| BackendError::ProcessingFailed(format!("Failed to decode image: {}", e)))
}

/// Composite onto an opaque background, dropping the alpha channel.
fn flatten(img: &DynamicImage, fill: FillColor) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    let [fr, fg, fb] = fill.rgb();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let a = a as u32;
        let blend = |c: u8, f: u8| ((c as u32 * a + f as u32 * (255 - a) + 127) / 255) as u8;
        Rgb([blend(r, fr), blend(g, fg), blend(b, fb)])
    })
}

/// Encode an RGB raster as baseline JPEG.
fn encode_jpeg(img: &RgbImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.as_u8());
    img.write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))?;
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(BackendError::Io)?
            .into_dimensions()
            .map_err(|e| {
                BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
            })?;
        Ok(Dimensions { width, height })
    }

    fn downscale(&self, params: &DownscaleParams) -> Result<EncodedImage, BackendError> {
        let img = load_image(&params.source)?;
        let rgb = if (img.width(), img.height()) == (params.width, params.height) {
            flatten(&img, params.fill)
        } else {
            let resized = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
            flatten(&resized, params.fill)
        };
        let bytes = encode_jpeg(&rgb, params.quality)?;
        Ok(EncodedImage {
            bytes: bytes.into(),
            dimensions: Dimensions::new(rgb.width(), rgb.height()),
        })
    }

    fn crop(&self, params: &CropParams) -> Result<EncodedImage, BackendError> {
        let img = load_image(&params.source)?;
        let region = params.region;

        let fits_x = region.x.checked_add(region.width).is_some_and(|r| r <= img.width());
        let fits_y = region.y.checked_add(region.height).is_some_and(|b| b <= img.height());
        if region.width == 0 || region.height == 0 || !fits_x || !fits_y {
            return Err(BackendError::ProcessingFailed(format!(
                "Crop region {} outside {}x{} image",
                region,
                img.width(),
                img.height()
            )));
        }

        let cropped = img.crop_imm(region.x, region.y, region.width, region.height);
        let scaled = cropped.resize_exact(
            params.output_width,
            params.output_height,
            FilterType::Lanczos3,
        );
        let rgb = flatten(&scaled, params.fill);
        let bytes = encode_jpeg(&rgb, params.quality)?;
        Ok(EncodedImage {
            bytes: bytes.into(),
            dimensions: Dimensions::new(rgb.width(), rgb.height()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::CropRegion;
    use crate::test_helpers::{png_bytes, transparent_png_bytes};

    #[test]
    fn supported_extensions_match_decodable_formats() {
        let exts = super::supported_input_extensions();
        for expected in &["jpg", "jpeg", "png", "tif", "tiff", "webp"] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(has_supported_extension(Path::new("shoe.JPG")));
        assert!(has_supported_extension(Path::new("dir/shoe.png")));
        assert!(!has_supported_extension(Path::new("notes.txt")));
        assert!(!has_supported_extension(Path::new("no-extension")));
    }

    #[test]
    fn identify_synthetic_png() {
        let backend = RustBackend::new();
        let dims = backend.identify(&png_bytes(200, 150)).unwrap();
        assert_eq!(dims, Dimensions::new(200, 150));
    }

    #[test]
    fn identify_garbage_errors() {
        let backend = RustBackend::new();
        assert!(backend.identify(b"not an image at all").is_err());
    }

    #[test]
    fn downscale_synthetic_to_jpeg() {
        let backend = RustBackend::new();
        let out = backend
            .downscale(&DownscaleParams {
                source: png_bytes(400, 300).into(),
                width: 200,
                height: 150,
                fill: FillColor::WHITE,
                quality: Quality::new(90),
            })
            .unwrap();

        assert_eq!(out.dimensions, Dimensions::new(200, 150));
        assert_eq!(
            image::guess_format(&out.bytes).unwrap(),
            ImageFormat::Jpeg
        );
        assert_eq!(backend.identify(&out.bytes).unwrap(), out.dimensions);
    }

    #[test]
    fn downscale_at_source_size_reencodes_png_as_jpeg() {
        let backend = RustBackend::new();
        let out = backend
            .downscale(&DownscaleParams {
                source: png_bytes(120, 90).into(),
                width: 120,
                height: 90,
                fill: FillColor::WHITE,
                quality: Quality::default(),
            })
            .unwrap();

        assert_eq!(out.dimensions, Dimensions::new(120, 90));
        assert_eq!(
            image::guess_format(&out.bytes).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn downscale_truncated_body_errors() {
        let backend = RustBackend::new();
        let mut bytes = png_bytes(300, 200);
        bytes.truncate(bytes.len() / 2);
        assert_eq!(backend.identify(&bytes).unwrap(), Dimensions::new(300, 200));

        let result = backend.downscale(&DownscaleParams {
            source: bytes.into(),
            width: 300,
            height: 200,
            fill: FillColor::WHITE,
            quality: Quality::default(),
        });
        assert!(result.is_err());
    }

    #[test]
    fn crop_produces_exact_output_size() {
        let backend = RustBackend::new();
        let out = backend
            .crop(&CropParams {
                source: png_bytes(300, 200).into(),
                region: CropRegion::new(50, 0, 200, 200),
                output_width: 1000,
                output_height: 1000,
                fill: FillColor::WHITE,
                quality: Quality::default(),
            })
            .unwrap();

        assert_eq!(out.dimensions, Dimensions::new(1000, 1000));
        let decoded = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1000, 1000));
    }

    #[test]
    fn crop_flattens_transparency_onto_fill() {
        let backend = RustBackend::new();
        let out = backend
            .crop(&CropParams {
                source: transparent_png_bytes(40, 40).into(),
                region: CropRegion::new(0, 0, 40, 40),
                output_width: 64,
                output_height: 64,
                fill: FillColor::WHITE,
                quality: Quality::new(95),
            })
            .unwrap();

        let decoded = image::load_from_memory(&out.bytes).unwrap().to_rgb8();
        let Rgb([r, g, b]) = *decoded.get_pixel(32, 32);
        assert!(r > 245 && g > 245 && b > 245, "got {r},{g},{b}");
    }

    #[test]
    fn crop_region_outside_image_errors() {
        let backend = RustBackend::new();
        let result = backend.crop(&CropParams {
            source: png_bytes(100, 100).into(),
            region: CropRegion::new(50, 50, 100, 100),
            output_width: 1000,
            output_height: 1000,
            fill: FillColor::WHITE,
            quality: Quality::default(),
        });
        assert!(result.is_err());
    }

    #[test]
    fn flatten_blends_half_alpha() {
        let img = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            1,
            1,
            image::Rgba([0, 0, 0, 128]),
        ));
        let rgb = flatten(&img, FillColor::WHITE);
        let Rgb([r, _, _]) = *rgb.get_pixel(0, 0);
        // 255 * 127 / 255 ≈ 127
        assert!((126..=128).contains(&r), "got {r}");
    }
}
