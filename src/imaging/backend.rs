//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations every backend must
//! support: identify, downscale, and crop.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust on top of the
//! `image` crate. Backends work on in-memory encoded bytes, never on paths:
//! a selected file is read once and then travels through the pipeline as a
//! shared buffer.

use super::params::{CropParams, DownscaleParams};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An encoded image produced by a backend operation.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub bytes: Arc<[u8]>,
    pub dimensions: Dimensions,
}

/// Trait for image processing backends.
///
/// `Send + Sync` because decode jobs run on the rayon pool while the intake
/// controller keeps its own handle to the same backend.
pub trait ImageBackend: Send + Sync {
    /// Read pixel dimensions from encoded bytes.
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError>;

    /// Resize to the exact target dimensions and re-encode as JPEG.
    fn downscale(&self, params: &DownscaleParams) -> Result<EncodedImage, BackendError>;

    /// Cut the region out, scale it to the output size, flatten onto the fill
    /// colour, and encode as JPEG.
    fn crop(&self, params: &CropParams) -> Result<EncodedImage, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::params::{CropRegion, FillColor, Quality};
    use std::sync::Mutex;

    /// Build a fake PNG: a valid signature and IHDR chunk header, no pixels.
    ///
    /// Enough for MIME sniffing and for [`MockBackend::identify`], which reads
    /// the dimensions back out of the IHDR fields.
    pub fn fake_png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&[8, 2, 0, 0, 0]);
        bytes
    }

    /// Mock backend that records operations without touching pixels.
    /// Uses Mutex (not RefCell) so it is Sync and can be shared with decode jobs.
    #[derive(Default)]
    pub struct MockBackend {
        pub operations: Mutex<Vec<RecordedOp>>,
        pub fail_crop: bool,
        pub fail_downscale: bool,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify {
            width: u32,
            height: u32,
        },
        Downscale {
            width: u32,
            height: u32,
            quality: u32,
        },
        Crop {
            region: CropRegion,
            output_width: u32,
            output_height: u32,
            fill: FillColor,
            quality: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_crop() -> Self {
            Self {
                fail_crop: true,
                ..Self::default()
            }
        }

        /// Identifies fine but cannot decode the pixels, like a file with a
        /// valid header and a truncated body.
        pub fn failing_downscale() -> Self {
            Self {
                fail_downscale: true,
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
            if bytes.len() < 24 || &bytes[12..16] != b"IHDR" {
                return Err(BackendError::ProcessingFailed(
                    "mock can only identify fake_png bytes".to_string(),
                ));
            }
            let width = u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
            let height = u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify { width, height });
            Ok(Dimensions { width, height })
        }

        fn downscale(&self, params: &DownscaleParams) -> Result<EncodedImage, BackendError> {
            if self.fail_downscale {
                return Err(BackendError::ProcessingFailed(
                    "Failed to decode image: unexpected end of file".into(),
                ));
            }
            self.operations.lock().unwrap().push(RecordedOp::Downscale {
                width: params.width,
                height: params.height,
                quality: params.quality.value(),
            });
            Ok(EncodedImage {
                bytes: fake_png(params.width, params.height).into(),
                dimensions: Dimensions::new(params.width, params.height),
            })
        }

        fn crop(&self, params: &CropParams) -> Result<EncodedImage, BackendError> {
            if self.fail_crop {
                return Err(BackendError::ProcessingFailed("mock crop failure".into()));
            }
            self.operations.lock().unwrap().push(RecordedOp::Crop {
                region: params.region,
                output_width: params.output_width,
                output_height: params.output_height,
                fill: params.fill,
                quality: params.quality.value(),
            });
            // JPEG SOI marker followed by the region so distinct crops differ
            let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
            bytes.extend_from_slice(params.region.to_string().as_bytes());
            Ok(EncodedImage {
                bytes: bytes.into(),
                dimensions: Dimensions::new(params.output_width, params.output_height),
            })
        }
    }

    #[test]
    fn mock_identifies_fake_png() {
        let backend = MockBackend::new();
        let dims = backend.identify(&fake_png(800, 600)).unwrap();
        assert_eq!(dims, Dimensions::new(800, 600));

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Identify {
                width: 800,
                height: 600
            }
        ));
    }

    #[test]
    fn mock_rejects_unknown_bytes() {
        let backend = MockBackend::new();
        assert!(backend.identify(b"definitely not a png").is_err());
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn mock_records_downscale() {
        let backend = MockBackend::new();
        let out = backend
            .downscale(&DownscaleParams {
                source: fake_png(4000, 3000).into(),
                width: 2000,
                height: 1500,
                fill: FillColor::WHITE,
                quality: Quality::new(90),
            })
            .unwrap();

        assert_eq!(out.dimensions, Dimensions::new(2000, 1500));
        assert_eq!(backend.identify(&out.bytes).unwrap(), out.dimensions);
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Downscale {
                width: 2000,
                height: 1500,
                quality: 90
            }
        ));
    }

    #[test]
    fn mock_records_crop() {
        let backend = MockBackend::new();
        let out = backend
            .crop(&CropParams {
                source: fake_png(2000, 1500).into(),
                region: CropRegion::new(250, 0, 1500, 1500),
                output_width: 1000,
                output_height: 1000,
                fill: FillColor::WHITE,
                quality: Quality::default(),
            })
            .unwrap();

        assert_eq!(out.dimensions, Dimensions::new(1000, 1000));
        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Crop {
                output_width: 1000,
                output_height: 1000,
                ..
            }
        ));
    }

    #[test]
    fn dimensions_helpers() {
        let d = Dimensions::new(4000, 3000);
        assert_eq!(d.pixels(), 12_000_000);
        assert_eq!(d.as_tuple(), (4000, 3000));
        assert_eq!(d.to_string(), "4000x3000");
    }
}
