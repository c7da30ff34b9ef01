//! Shared test utilities for the listing-images test suite.
//!
//! Two kinds of image fixtures live here:
//!
//! - **Real images** ([`png_bytes`], [`transparent_png_bytes`]) encoded with the
//!   `image` crate, for tests that go through [`RustBackend`](crate::imaging::RustBackend).
//! - **Fake images** ([`png_file`], [`selected_image`]) built on
//!   [`fake_png`], for tests that run against the mock backend and only need
//!   a sniffable header.
//!
//! [`RecordingView`] captures every [`GalleryView`] call so tests can assert on
//! the exact sequence of re-renders.

use crate::decode::SelectedImage;
use crate::gallery::{CroppedImage, GalleryView, ImageHandle};
use crate::imaging::Dimensions;
use crate::imaging::backend::tests::fake_png;
use crate::media::SelectedFile;
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::{Arc, Mutex};

// =========================================================================
// Real image fixtures
// =========================================================================

/// Encode a gradient RGB PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// Encode a fully transparent RGBA PNG.
pub fn transparent_png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

// =========================================================================
// Mock-backend fixtures
// =========================================================================

/// A selectable file whose header says `width`×`height`.
pub fn png_file(width: u32, height: u32) -> SelectedFile {
    SelectedFile::new(format!("{width}x{height}.png"), fake_png(width, height))
}

/// An already-decoded image, as if it had come back from a decode job.
pub fn selected_image(width: u32, height: u32) -> SelectedImage {
    let dimensions = Dimensions::new(width, height);
    SelectedImage {
        name: format!("{width}x{height}.png"),
        bytes: fake_png(width, height).into(),
        mime: "image/jpeg",
        dimensions,
        original_dimensions: dimensions,
    }
}

// =========================================================================
// View recording
// =========================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Thumbnails(Vec<ImageHandle>),
    Preview(Option<ImageHandle>),
}

/// A [`GalleryView`] that remembers what it was asked to render.
///
/// Clones share the same log, so a test can hand one clone to the intake
/// and keep the other for assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingView {
    events: Arc<Mutex<Vec<ViewEvent>>>,
}

impl RecordingView {
    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl GalleryView for RecordingView {
    fn render_thumbnails(&mut self, gallery: &[CroppedImage]) {
        let handles = gallery.iter().map(|i| i.handle).collect();
        self.events
            .lock()
            .unwrap()
            .push(ViewEvent::Thumbnails(handles));
    }

    fn update_preview(&mut self, gallery: &[CroppedImage]) {
        let preview = gallery.first().map(|i| i.handle);
        self.events.lock().unwrap().push(ViewEvent::Preview(preview));
    }
}
