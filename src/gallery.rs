//! The ordered gallery of committed crops.
//!
//! Insertion order is display order and index 0 is the listing's preview
//! image. Entries are only ever appended or removed by index; removal shifts
//! everything after it down, so indices stay dense.

use crate::imaging::Dimensions;
use crate::media;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GalleryError {
    #[error("gallery is full ({max} images)")]
    Full { max: usize },
    #[error("index {index} out of range for gallery of {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Opaque identifier for a committed crop. Unique per [`ImageIntake`](crate::intake::ImageIntake).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageHandle(pub u64);

impl fmt::Display for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image-{:04}", self.0)
    }
}

/// A finalized, encoded crop.
#[derive(Debug, Clone, PartialEq)]
pub struct CroppedImage {
    pub handle: ImageHandle,
    /// JPEG bytes.
    pub jpeg: Arc<[u8]>,
    pub dimensions: Dimensions,
}

impl CroppedImage {
    pub fn to_data_uri(&self) -> String {
        media::data_uri("image/jpeg", &self.jpeg)
    }
}

/// Ordered, bounded list of [`CroppedImage`]s.
#[derive(Debug, Clone)]
pub struct Gallery {
    images: Vec<CroppedImage>,
    max_images: usize,
}

impl Gallery {
    pub fn new(max_images: usize) -> Self {
        Self {
            images: Vec::new(),
            max_images,
        }
    }

    pub fn max_images(&self) -> usize {
        self.max_images
    }

    pub fn is_full(&self) -> bool {
        self.images.len() >= self.max_images
    }

    /// Append an entry at the end.
    pub fn push(&mut self, image: CroppedImage) -> Result<(), GalleryError> {
        if self.is_full() {
            return Err(GalleryError::Full {
                max: self.max_images,
            });
        }
        self.images.push(image);
        Ok(())
    }

    /// Remove the entry at `index`, shifting later entries down.
    pub fn remove(&mut self, index: usize) -> Result<CroppedImage, GalleryError> {
        if index >= self.images.len() {
            return Err(GalleryError::IndexOutOfRange {
                index,
                len: self.images.len(),
            });
        }
        Ok(self.images.remove(index))
    }

    /// The preview image: always the first entry.
    pub fn preview(&self) -> Option<&CroppedImage> {
        self.images.first()
    }

    pub fn images(&self) -> &[CroppedImage] {
        &self.images
    }

    pub fn handles(&self) -> Vec<ImageHandle> {
        self.images.iter().map(|i| i.handle).collect()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }
}

impl Default for Gallery {
    fn default() -> Self {
        Self::new(4)
    }
}

/// Consumer of gallery changes.
///
/// Both methods are called after every mutation, thumbnails first.
pub trait GalleryView {
    fn render_thumbnails(&mut self, gallery: &[CroppedImage]);

    /// Show `gallery[0]`, or a placeholder when empty.
    fn update_preview(&mut self, gallery: &[CroppedImage]);
}
