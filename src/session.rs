//! The interactive crop session.
//!
//! A [`CropSession`] owns the image being cropped and the current selection.
//! It also holds a [`SessionLease`] from the intake's [`SessionTracker`]:
//! the lease is the crop tool's "resource", and it is released exactly when
//! the session is dropped. Cancel, commit, a new selection, and opening
//! another session all drop the old session before anything new is built.

use crate::decode::SelectedImage;
use crate::imaging::{CropRegion, Dimensions, calculate_initial_crop, normalize_crop_region};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counts live crop sessions and hands out session ids.
#[derive(Debug, Clone, Default)]
pub struct SessionTracker {
    live: Arc<AtomicUsize>,
    next_id: Arc<AtomicU64>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions whose lease has not been dropped yet.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    fn acquire(&self) -> SessionLease {
        self.live.fetch_add(1, Ordering::AcqRel);
        SessionLease {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            live: Arc::clone(&self.live),
        }
    }
}

/// Proof that a session is live; decrements the tracker on drop.
#[derive(Debug)]
pub struct SessionLease {
    id: u64,
    live: Arc<AtomicUsize>,
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::AcqRel);
        log::debug!("crop session {} released", self.id);
    }
}

/// An open crop tool over one image.
#[derive(Debug)]
pub struct CropSession {
    image: SelectedImage,
    aspect: (u32, u32),
    output_size: (u32, u32),
    region: CropRegion,
    lease: SessionLease,
}

impl CropSession {
    /// Open a session with the largest centred region of `aspect`.
    pub fn open(
        tracker: &SessionTracker,
        image: SelectedImage,
        aspect: (u32, u32),
        output_size: (u32, u32),
    ) -> Self {
        let region = calculate_initial_crop(image.dimensions.as_tuple(), aspect);
        let lease = tracker.acquire();
        log::debug!(
            "crop session {} opened on {} ({}), initial region {}",
            lease.id,
            image.name,
            image.dimensions,
            region
        );
        Self {
            image,
            aspect,
            output_size,
            region,
            lease,
        }
    }

    pub fn id(&self) -> u64 {
        self.lease.id
    }

    pub fn image(&self) -> &SelectedImage {
        &self.image
    }

    pub fn dimensions(&self) -> Dimensions {
        self.image.dimensions
    }

    pub fn aspect(&self) -> (u32, u32) {
        self.aspect
    }

    pub fn output_size(&self) -> (u32, u32) {
        self.output_size
    }

    pub fn region(&self) -> CropRegion {
        self.region
    }

    /// Move or resize the selection. Returns the region actually applied.
    pub fn set_region(&mut self, requested: CropRegion) -> CropRegion {
        self.region = normalize_crop_region(requested, self.dimensions().as_tuple(), self.aspect);
        self.region
    }

    /// Go back to the initial full-size selection.
    pub fn reset_region(&mut self) -> CropRegion {
        self.region = calculate_initial_crop(self.dimensions().as_tuple(), self.aspect);
        self.region
    }
}
