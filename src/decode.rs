//! Turning a selected file into an image the crop tool can work on.
//!
//! Every accepted file is fully decoded and re-encoded as JPEG here, so a
//! file with a readable header but a broken body is refused at selection.
//!
//! Decoding is the slow part of intake (a phone photo can be 50 MP), so it
//! runs as a background job. Each job carries a [`CancelToken`]; a newer
//! selection trips the token of the one it replaces and the job bails out at
//! the next stage boundary instead of finishing work nobody will look at.

use crate::imaging::{
    Dimensions, DownscaleConfig, ImageBackend, calculate_downscale_dimensions, downscale_image,
    get_dimensions,
};
use crate::intake::IntakeError;
use crate::media::{self, SelectedFile};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag for one decode job.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn check(&self) -> Result<(), IntakeError> {
        if self.is_cancelled() {
            Err(IntakeError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Limits applied while decoding.
#[derive(Debug, Clone)]
pub struct DecodeLimits {
    pub downscale: DownscaleConfig,
    /// Reject sources whose header claims more pixels than this.
    pub max_source_pixels: u64,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            downscale: DownscaleConfig::default(),
            max_source_pixels: 100_000_000,
        }
    }
}

/// The decoded (and possibly downscaled) image handed to the crop tool.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedImage {
    pub name: String,
    pub bytes: Arc<[u8]>,
    pub mime: &'static str,
    pub dimensions: Dimensions,
    /// Size of the file as selected, before downscaling.
    pub original_dimensions: Dimensions,
}

impl SelectedImage {
    pub fn downscaled(&self) -> bool {
        self.dimensions != self.original_dimensions
    }

    pub fn to_data_uri(&self) -> String {
        media::data_uri(self.mime, &self.bytes)
    }
}

/// Run one decode job: identify, check limits, decode and re-encode.
///
/// Cancellation is checked before each stage; a cancelled job returns
/// [`IntakeError::Cancelled`] without touching the backend again.
pub fn decode_selection(
    backend: &impl ImageBackend,
    file: &SelectedFile,
    limits: &DecodeLimits,
    token: &CancelToken,
) -> Result<SelectedImage, IntakeError> {
    token.check()?;
    let mime = file
        .sniff()
        .image_mime()
        .ok_or_else(|| IntakeError::unsupported(file))?;

    let original = get_dimensions(backend, &file.bytes)
        .map_err(|e| IntakeError::DecodeFailure(format!("{}: {}", file.name, e)))?;
    if original.width == 0 || original.height == 0 {
        return Err(IntakeError::DecodeFailure(format!(
            "{}: image has no pixels",
            file.name
        )));
    }
    if original.pixels() > limits.max_source_pixels {
        return Err(IntakeError::ResourceLimit(format!(
            "{}: {} exceeds {} pixels",
            file.name, original, limits.max_source_pixels
        )));
    }

    token.check()?;
    let downscaled = downscale_image(
        backend,
        Arc::clone(&file.bytes),
        original,
        &limits.downscale,
    )
    .map_err(|e| IntakeError::DecodeFailure(format!("{}: {}", file.name, e)))?;
    token.check()?;

    log::debug!(
        "decoded {} ({}): {} -> {}",
        file.name,
        mime,
        original,
        downscaled.image.dimensions
    );

    Ok(SelectedImage {
        name: file.name.clone(),
        bytes: downscaled.image.bytes,
        mime: "image/jpeg",
        dimensions: downscaled.image.dimensions,
        original_dimensions: original,
    })
}

/// What a decode would do with a file, without doing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Inspection {
    pub name: String,
    pub mime: &'static str,
    pub dimensions: Dimensions,
    /// Size after downscaling, or `None` if the image passes through.
    pub downscaled_to: Option<Dimensions>,
}

/// Validate a file the way [`decode_selection`] would, reading only its header.
pub fn inspect_selection(
    backend: &impl ImageBackend,
    file: &SelectedFile,
    limits: &DecodeLimits,
) -> Result<Inspection, IntakeError> {
    let mime = file
        .sniff()
        .image_mime()
        .ok_or_else(|| IntakeError::unsupported(file))?;
    let dimensions = get_dimensions(backend, &file.bytes)
        .map_err(|e| IntakeError::DecodeFailure(format!("{}: {}", file.name, e)))?;
    if dimensions.pixels() > limits.max_source_pixels {
        return Err(IntakeError::ResourceLimit(format!(
            "{}: {} exceeds {} pixels",
            file.name, dimensions, limits.max_source_pixels
        )));
    }
    let downscaled_to = calculate_downscale_dimensions(
        dimensions.as_tuple(),
        limits.downscale.max_dimension,
    )
    .map(|(w, h)| Dimensions::new(w, h));

    Ok(Inspection {
        name: file.name.clone(),
        mime,
        dimensions,
        downscaled_to,
    })
}
