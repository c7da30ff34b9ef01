//! # Listing Images
//!
//! Product photo intake for marketplace listings. A seller picks photos one
//! at a time; each one is downscaled, cropped to a square, and re-encoded as
//! a fixed-size JPEG. The results form a small ordered gallery whose first
//! entry is the listing's preview image.
//!
//! # Pipeline
//!
//! ```text
//! SelectedFile ──sniff──▶ decode job ──▶ CropSession ──commit──▶ Gallery ──▶ export
//!   (bytes)     (infer)   (rayon pool:    (1:1 region,          (index 0 =   (main.jpg,
//!                          identify,       RAII lease)           preview)     image_2.jpg, …)
//!                          downscale)
//! ```
//!
//! [`intake::ImageIntake`] drives the whole thing as an explicit state
//! machine (`Idle → Decoding → Cropping → Idle`). Every transition is a
//! method call returning a typed [`intake::IntakeError`] on invalid input,
//! instead of proceeding into undefined image operations.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`intake`] | The controller: selection, decode completion, crop session, gallery mutations |
//! | [`decode`] | Background decode job with cancellation; header-only inspection |
//! | [`session`] | Crop session and the lease that guarantees one live session |
//! | [`gallery`] | Ordered bounded gallery and the `GalleryView` rendering trait |
//! | [`media`] | Selected files, magic-byte sniffing, data URIs, input collection |
//! | [`imaging`] | Pure-Rust image operations: identify, downscale, crop, JPEG encode |
//! | [`export`] | Writes a gallery to disk with a checksummed manifest |
//! | [`config`] | `listing-images.toml` loading, merging, and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Downscale Before Crop
//!
//! Phone photos are routinely 12–50 MP. The crop tool only needs enough
//! resolution to produce a 1000×1000 result, so anything with a longer edge
//! above `downscale.max_dimension` (2000 px) is scaled down first. Smaller
//! images keep their size. Both are fully decoded and re-encoded as JPEG, so
//! a file that only has a valid header is refused at selection.
//!
//! ## Last Selection Wins
//!
//! Decoding runs off the caller's thread. Each selection gets a new id and a
//! cancel token; starting another selection trips the old token, and any
//! result that still arrives for an old id is dropped. The crop tool can
//! never end up showing a stale image.
//!
//! ## One Session at a Time
//!
//! A [`session::CropSession`] owns a lease from the intake's
//! [`session::SessionTracker`]. Releasing the session is dropping it, so
//! commit, cancel, re-selection, and reset all release it on every path.

pub mod config;
pub mod decode;
pub mod export;
pub mod gallery;
pub mod imaging;
pub mod intake;
pub mod media;
pub mod output;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;
