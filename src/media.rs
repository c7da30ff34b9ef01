//! Input files and media-type sniffing.
//!
//! A [`SelectedFile`] is whatever the file picker handed over: a name and the
//! raw bytes. Before any decode is attempted the bytes are sniffed by magic
//! number (via `infer`), so a PDF renamed to `.jpg` is rejected up front
//! instead of failing somewhere inside the decoder.

use crate::imaging::has_supported_extension;
use base64::{Engine as _, engine::general_purpose};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// A file chosen for intake.
#[derive(Clone)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Arc<[u8]>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, keeping its file name as the display name.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn sniff(&self) -> Sniffed {
        sniff(&self.bytes)
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// What the magic bytes say a buffer is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sniffed {
    /// An image type, with its MIME string.
    Image(&'static str),
    /// Recognised, but not an image.
    Other(&'static str),
    /// No known signature.
    Unknown,
}

impl Sniffed {
    pub fn image_mime(self) -> Option<&'static str> {
        match self {
            Sniffed::Image(mime) => Some(mime),
            _ => None,
        }
    }
}

/// Identify a buffer by its file signature.
pub fn sniff(bytes: &[u8]) -> Sniffed {
    match infer::get(bytes) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => {
            Sniffed::Image(kind.mime_type())
        }
        Some(kind) => Sniffed::Other(kind.mime_type()),
        None => Sniffed::Unknown,
    }
}

/// Render bytes as a `data:` URI.
pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(bytes))
}

/// Expand command-line inputs into the files to select, in order.
///
/// Files are kept as given, whatever their extension, so that unsupported
/// inputs get reported rather than silently dropped. Directories are walked
/// recursively in file-name order and contribute only files with a supported
/// image extension.
pub fn collect_inputs(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        files.extend(
            WalkDir::new(path)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && has_supported_extension(e.path()))
                .map(|e| e.into_path()),
        );
    }
    files
}
