//! Writing a finished gallery to disk.
//!
//! Each entry becomes one JPEG named after the product-record slot it fills:
//! index 0 is `main.jpg`, then `image_2.jpg`, `image_3.jpg`, … A
//! `gallery.json` manifest next to them records the slot order, dimensions,
//! and a SHA-256 of every file so a consumer can verify what it uploads.
//!
//! ```text
//! out/
//! ├── main.jpg
//! ├── image_2.jpg
//! └── gallery.json
//! ```
//!
//! Re-exporting a smaller gallery into the same directory removes slot files
//! that no longer have an entry.

use crate::gallery::Gallery;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the manifest file within the export directory.
pub const MANIFEST_FILENAME: &str = "gallery.json";

const MANIFEST_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportManifest {
    pub version: u32,
    pub images: Vec<ExportedImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedImage {
    pub slot: String,
    pub file: String,
    pub handle: String,
    pub width: u32,
    pub height: u32,
    pub sha256: String,
}

/// Product-record field for a gallery index: `main`, `image_2`, `image_3`, …
pub fn slot_name(index: usize) -> String {
    match index {
        0 => "main".to_string(),
        n => format!("image_{}", n + 1),
    }
}

/// SHA-256 of a buffer as lowercase hex.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Write every gallery entry plus `gallery.json` into `dir`.
pub fn export_gallery(gallery: &Gallery, dir: &Path) -> Result<ExportManifest, ExportError> {
    fs::create_dir_all(dir)?;

    let mut images = Vec::with_capacity(gallery.len());
    for (index, image) in gallery.images().iter().enumerate() {
        let slot = slot_name(index);
        let file = format!("{}.jpg", slot);
        fs::write(dir.join(&file), &image.jpeg)?;
        images.push(ExportedImage {
            slot,
            file,
            handle: image.handle.to_string(),
            width: image.dimensions.width,
            height: image.dimensions.height,
            sha256: hash_bytes(&image.jpeg),
        });
    }

    for index in gallery.len()..gallery.max_images() {
        let stale = dir.join(format!("{}.jpg", slot_name(index)));
        if stale.exists() {
            fs::remove_file(&stale)?;
            log::debug!("removed stale {}", stale.display());
        }
    }

    let manifest = ExportManifest {
        version: MANIFEST_VERSION,
        images,
    };
    let json = serde_json::to_string_pretty(&manifest)?;
    fs::write(dir.join(MANIFEST_FILENAME), json)?;
    log::info!(
        "exported {} image(s) to {}",
        manifest.images.len(),
        dir.display()
    );
    Ok(manifest)
}
