//! CLI output formatting.
//!
//! Every command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.
//!
//! ## Add
//!
//! ```text
//! 001 image-0001 ← sneaker.jpg
//!     4000x3000 → 2000x1500 → 1000x1000
//! Skipped notes.txt: notes.txt: unsupported media type (unknown)
//!
//! Gallery (1 of 4)
//!     001 image-0001 1000x1000 (preview)
//! ```
//!
//! ## Check
//!
//! ```text
//! sneaker.jpg: image/jpeg 4000x3000, downscale to 2000x1500
//! notes.txt: notes.txt: unsupported media type (unknown)
//! ```
//!
//! ## Export
//!
//! ```text
//! Exported 1 image to out/
//!     main → main.jpg (1000x1000) sha256:9f86d081884c
//! ```

use crate::decode::Inspection;
use crate::export::ExportManifest;
use crate::gallery::{CroppedImage, Gallery, GalleryView, ImageHandle};
use crate::imaging::Dimensions;
use std::path::Path;

/// Placeholder shown where the preview would be.
pub const NO_IMAGE_SELECTED: &str = "No image selected";

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

// ============================================================================
// Gallery
// ============================================================================

/// Format the whole gallery, one line per entry, preview marked.
pub fn format_gallery(gallery: &Gallery) -> Vec<String> {
    let mut lines = vec![format!(
        "Gallery ({} of {})",
        gallery.len(),
        gallery.max_images()
    )];
    if gallery.is_empty() {
        lines.push(format!("{}{}", indent(1), NO_IMAGE_SELECTED));
    }
    for (i, image) in gallery.images().iter().enumerate() {
        let marker = if i == 0 { " (preview)" } else { "" };
        lines.push(format!(
            "{}{} {} {}{}",
            indent(1),
            format_index(i + 1),
            image.handle,
            image.dimensions,
            marker
        ));
    }
    lines
}

pub fn print_gallery(gallery: &Gallery) {
    for line in format_gallery(gallery) {
        println!("{}", line);
    }
}

/// One-line thumbnail strip: `Thumbnails: [image-0001] [image-0002]`.
pub fn format_thumbnails(images: &[CroppedImage]) -> String {
    if images.is_empty() {
        return "Thumbnails: (none)".to_string();
    }
    let strip: Vec<String> = images.iter().map(|i| format!("[{}]", i.handle)).collect();
    format!("Thumbnails: {}", strip.join(" "))
}

/// `Preview: image-0001`, or the placeholder when the gallery is empty.
pub fn format_preview(images: &[CroppedImage]) -> String {
    match images.first() {
        Some(image) => format!("Preview: {}", image.handle),
        None => format!("Preview: {}", NO_IMAGE_SELECTED),
    }
}

/// Text rendering of the gallery for the terminal.
///
/// Silent unless `verbose`, since `add` prints a summary at the end anyway.
#[derive(Debug, Default)]
pub struct TextGalleryView {
    pub verbose: bool,
}

impl GalleryView for TextGalleryView {
    fn render_thumbnails(&mut self, gallery: &[CroppedImage]) {
        if self.verbose {
            println!("{}{}", indent(1), format_thumbnails(gallery));
        }
    }

    fn update_preview(&mut self, gallery: &[CroppedImage]) {
        if self.verbose {
            println!("{}{}", indent(1), format_preview(gallery));
        }
    }
}

// ============================================================================
// Add
// ============================================================================

/// Something that happened while running `add`.
#[derive(Debug, Clone)]
pub enum AddEvent {
    Committed {
        index: usize,
        handle: ImageHandle,
        source: String,
        original: Dimensions,
        selected: Dimensions,
        output: Dimensions,
    },
    Skipped {
        source: String,
        reason: String,
    },
    Removed {
        index: usize,
        handle: ImageHandle,
    },
}

pub fn format_add_event(event: &AddEvent) -> Vec<String> {
    match event {
        AddEvent::Committed {
            index,
            handle,
            source,
            original,
            selected,
            output,
        } => {
            let sizes = if original == selected {
                format!("{} → {}", original, output)
            } else {
                format!("{} → {} → {}", original, selected, output)
            };
            vec![
                format!("{} {} ← {}", format_index(*index), handle, source),
                format!("{}{}", indent(1), sizes),
            ]
        }
        AddEvent::Skipped { source, reason } => vec![format!("Skipped {}: {}", source, reason)],
        AddEvent::Removed { index, handle } => {
            vec![format!("Removed {} {}", format_index(*index), handle)]
        }
    }
}

pub fn print_add_event(event: &AddEvent) {
    for line in format_add_event(event) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_result(source: &str, result: &Result<Inspection, String>) -> String {
    match result {
        Ok(inspection) => match inspection.downscaled_to {
            Some(target) => format!(
                "{}: {} {}, downscale to {}",
                source, inspection.mime, inspection.dimensions, target
            ),
            None => format!("{}: {} {}", source, inspection.mime, inspection.dimensions),
        },
        Err(reason) => format!("{}: {}", source, reason),
    }
}

/// Summary line after checking: `3 valid, 1 rejected`.
pub fn format_check_summary(valid: usize, rejected: usize) -> String {
    format!("{} valid, {} rejected", valid, rejected)
}

// ============================================================================
// Export
// ============================================================================

pub fn format_export(manifest: &ExportManifest, dir: &Path) -> Vec<String> {
    let mut lines = vec![format!(
        "Exported {} to {}/",
        plural(manifest.images.len(), "image"),
        dir.display()
    )];
    for image in &manifest.images {
        let short_hash: String = image.sha256.chars().take(12).collect();
        lines.push(format!(
            "{}{} → {} ({}x{}) sha256:{}",
            indent(1),
            image.slot,
            image.file,
            image.width,
            image.height,
            short_hash
        ));
    }
    lines
}

pub fn print_export(manifest: &ExportManifest, dir: &Path) {
    for line in format_export(manifest, dir) {
        println!("{}", line);
    }
}
