//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageReader::into_dimensions` |
//! | **Downscale → JPEG** | Lanczos3 + `JpegEncoder` |
//! | **Crop → JPEG** | `crop_imm` + `resize_exact` + alpha flatten |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and crop-region math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
pub mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, EncodedImage, ImageBackend};
pub use calculations::{
    calculate_downscale_dimensions, calculate_initial_crop, normalize_crop_region,
};
pub use operations::{
    CropConfig, DownscaleConfig, Downscaled, downscale_image, get_dimensions, render_crop,
};
pub use params::{CropRegion, FillColor, Quality};
pub use rust_backend::{RustBackend, has_supported_extension, supported_input_extensions};
