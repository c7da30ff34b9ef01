//! Pure calculation functions for image dimensions and crop geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::CropRegion;

/// Calculate the bounded dimensions for a downscale step.
///
/// Returns `None` when both edges already fit within `max_dimension` (the
/// image passes through untouched). Otherwise the longer edge becomes exactly
/// `max_dimension` and the shorter edge is scaled proportionally. Square
/// images clamp both edges.
///
/// # Examples
/// ```
/// # use listing_images::imaging::calculate_downscale_dimensions;
/// assert_eq!(calculate_downscale_dimensions((4000, 3000), 2000), Some((2000, 1500)));
/// assert_eq!(calculate_downscale_dimensions((800, 600), 2000), None);
/// ```
pub fn calculate_downscale_dimensions(source: (u32, u32), max_dimension: u32) -> Option<(u32, u32)> {
    let (src_w, src_h) = source;
    if src_w <= max_dimension && src_h <= max_dimension {
        return None;
    }

    if src_w > src_h {
        // Landscape: width is the longer edge
        let ratio = max_dimension as f64 / src_w as f64;
        let h = ((src_h as f64 * ratio).round() as u32).max(1);
        Some((max_dimension, h))
    } else {
        // Portrait or square: height is the longer edge
        let ratio = max_dimension as f64 / src_h as f64;
        let w = ((src_w as f64 * ratio).round() as u32).max(1);
        Some((w, max_dimension))
    }
}

/// Largest region of the given aspect ratio that fits the image, centred.
///
/// This is the crop tool's starting selection: with a 1:1 aspect it is the
/// biggest centred square.
pub fn calculate_initial_crop(image: (u32, u32), aspect: (u32, u32)) -> CropRegion {
    let (img_w, img_h) = image;
    let (w, h) = fit_aspect((img_w, img_h), aspect);
    CropRegion {
        x: img_w.saturating_sub(w) / 2,
        y: img_h.saturating_sub(h) / 2,
        width: w,
        height: h,
    }
}

/// Force a requested region onto the aspect ratio and inside the image.
///
/// The requested size is first clamped to the image, then shrunk along
/// whichever edge is too long for the aspect ratio. The origin is moved so the
/// region never leaves the image.
pub fn normalize_crop_region(
    requested: CropRegion,
    image: (u32, u32),
    aspect: (u32, u32),
) -> CropRegion {
    let (img_w, img_h) = image;
    let req_w = requested.width.clamp(1, img_w.max(1));
    let req_h = requested.height.clamp(1, img_h.max(1));
    let (w, h) = fit_aspect((req_w, req_h), aspect);

    CropRegion {
        x: requested.x.min(img_w.saturating_sub(w)),
        y: requested.y.min(img_h.saturating_sub(h)),
        width: w,
        height: h,
    }
}

/// Largest `(w, h)` with the given aspect that fits inside `bounds`.
fn fit_aspect(bounds: (u32, u32), aspect: (u32, u32)) -> (u32, u32) {
    let (bw, bh) = (bounds.0.max(1) as u64, bounds.1.max(1) as u64);
    let (aw, ah) = (aspect.0.max(1) as u64, aspect.1.max(1) as u64);

    if bw * ah > bh * aw {
        // Bounds are wider than the aspect: height is the constraint
        let w = ((bh * aw) as f64 / ah as f64).round() as u64;
        (w.clamp(1, bw) as u32, bh as u32)
    } else {
        // Bounds are taller (or exact): width is the constraint
        let h = ((bw * ah) as f64 / aw as f64).round() as u64;
        (bw as u32, h.clamp(1, bh) as u32)
    }
}
