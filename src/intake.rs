//! The image intake controller.
//!
//! [`ImageIntake`] owns everything the "add product images" flow needs: the
//! in-flight decode, the open crop session, and the gallery. It is a small
//! state machine:
//!
//! ```text
//!            select_file                decode ok
//!   Idle ───────────────▶ Decoding ───────────────▶ Cropping
//!    ▲                      │  │                       │
//!    │      decode error    │  │ select_file           │ commit_crop / cancel_crop
//!    ├──────────────────────┘  └──▶ (cancel, respawn)  │
//!    └─────────────────────────────────────────────────┘
//! ```
//!
//! All state lives on the caller's thread. Only the decode job runs on the
//! rayon pool; it reports back through a channel that the caller drains with
//! [`ImageIntake::wait_for_decode`] or [`ImageIntake::poll_decodes`].
//!
//! ## Re-selection
//!
//! Selecting a new file while an older one is still decoding cancels the
//! older job and bumps the selection id. If the older job finishes anyway, its
//! result carries a stale id and is dropped. The crop tool therefore always
//! shows the *latest* selection, regardless of which decode finishes first.

use crate::config::IntakeConfig;
use crate::decode::{CancelToken, SelectedImage, decode_selection};
use crate::gallery::{CroppedImage, Gallery, GalleryError, GalleryView, ImageHandle};
use crate::imaging::{BackendError, CropConfig, CropRegion, ImageBackend, RustBackend, render_crop};
use crate::media::{SelectedFile, Sniffed};
use crate::session::{CropSession, SessionTracker};
use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("{name}: unsupported media type ({detected})")]
    UnsupportedMediaType { name: String, detected: String },
    #[error("Decode failed: {0}")]
    DecodeFailure(String),
    #[error("No active crop session")]
    NoActiveSession,
    #[error("Index {index} out of range for gallery of {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Gallery is full ({max} images)")]
    GalleryFull { max: usize },
    #[error("Resource limit: {0}")]
    ResourceLimit(String),
    #[error("Selection was superseded")]
    Cancelled,
    #[error("Image processing failed: {0}")]
    Backend(#[from] BackendError),
}

impl IntakeError {
    pub(crate) fn unsupported(file: &SelectedFile) -> Self {
        let detected = match file.sniff() {
            Sniffed::Image(mime) | Sniffed::Other(mime) => mime.to_string(),
            Sniffed::Unknown => "unknown".to_string(),
        };
        IntakeError::UnsupportedMediaType {
            name: file.name.clone(),
            detected,
        }
    }
}

impl From<GalleryError> for IntakeError {
    fn from(e: GalleryError) -> Self {
        match e {
            GalleryError::Full { max } => IntakeError::GalleryFull { max },
            GalleryError::IndexOutOfRange { index, len } => {
                IntakeError::IndexOutOfRange { index, len }
            }
        }
    }
}

/// Identifies one call to [`ImageIntake::select_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectionId(pub u64);

impl fmt::Display for SelectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "selection #{}", self.0)
    }
}

/// Where the intake is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Decoding,
    Cropping,
}

struct PendingDecode {
    id: SelectionId,
    name: String,
    token: CancelToken,
}

enum State {
    Idle,
    Decoding(PendingDecode),
    Cropping(CropSession),
}

impl State {
    /// Cancel the decode or release the session, whichever is in flight.
    fn abandon(&mut self) {
        match std::mem::replace(self, State::Idle) {
            State::Idle => {}
            State::Decoding(pending) => {
                pending.token.cancel();
                log::debug!("cancelled decode of {} ({})", pending.name, pending.id);
            }
            // Dropping the session releases its lease
            State::Cropping(session) => drop(session),
        }
    }
}

struct DecodeOutcome {
    id: SelectionId,
    result: Result<SelectedImage, IntakeError>,
}

/// Controller for one product's image intake.
pub struct ImageIntake<B = RustBackend> {
    backend: Arc<B>,
    config: IntakeConfig,
    state: State,
    gallery: Gallery,
    sessions: SessionTracker,
    next_selection: u64,
    next_handle: u64,
    view: Option<Box<dyn GalleryView>>,
    tx: Sender<DecodeOutcome>,
    rx: Receiver<DecodeOutcome>,
}

impl ImageIntake<RustBackend> {
    pub fn new(config: IntakeConfig) -> Self {
        Self::with_backend(RustBackend::new(), config)
    }
}

impl<B: ImageBackend + 'static> ImageIntake<B> {
    pub fn with_backend(backend: B, config: IntakeConfig) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            backend: Arc::new(backend),
            gallery: Gallery::new(config.gallery.max_images),
            config,
            state: State::Idle,
            sessions: SessionTracker::new(),
            next_selection: 0,
            next_handle: 0,
            view: None,
            tx,
            rx,
        }
    }

    /// Attach the consumer that renders thumbnails and the preview.
    pub fn with_view(mut self, view: impl GalleryView + 'static) -> Self {
        self.view = Some(Box::new(view));
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            State::Idle => Phase::Idle,
            State::Decoding(_) => Phase::Decoding,
            State::Cropping(_) => Phase::Cropping,
        }
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    pub fn preview(&self) -> Option<&CroppedImage> {
        self.gallery.preview()
    }

    pub fn session(&self) -> Option<&CropSession> {
        match &self.state {
            State::Cropping(session) => Some(session),
            _ => None,
        }
    }

    /// Number of crop sessions currently holding their resources.
    pub fn live_sessions(&self) -> usize {
        self.sessions.live()
    }

    /// Start intake of a newly selected file.
    ///
    /// `None` or an empty file is a no-op. Files that do not sniff as an
    /// image are rejected before any state changes. Otherwise any in-flight
    /// decode is cancelled, any open session is released, and a decode job
    /// is spawned.
    pub fn select_file(
        &mut self,
        file: Option<SelectedFile>,
    ) -> Result<Option<SelectionId>, IntakeError> {
        let Some(file) = file.filter(|f| !f.is_empty()) else {
            log::debug!("empty selection ignored");
            return Ok(None);
        };
        if file.sniff().image_mime().is_none() {
            return Err(IntakeError::unsupported(&file));
        }

        self.state.abandon();
        self.next_selection += 1;
        let id = SelectionId(self.next_selection);
        let token = CancelToken::new();
        self.state = State::Decoding(PendingDecode {
            id,
            name: file.name.clone(),
            token: token.clone(),
        });
        log::debug!("decoding {} ({})", file.name, id);

        let backend = Arc::clone(&self.backend);
        let limits = self.config.decode_limits();
        let tx = self.tx.clone();
        rayon::spawn(move || {
            let result = decode_selection(&*backend, &file, &limits, &token);
            // The receiver only goes away with the intake itself
            let _ = tx.send(DecodeOutcome { id, result });
        });

        Ok(Some(id))
    }

    /// Block until the current selection's decode completes.
    ///
    /// Stale completions from superseded selections are discarded. On success
    /// the crop session is open; on failure the intake is back to idle and
    /// the error is returned. Returns immediately when nothing is decoding.
    pub fn wait_for_decode(&mut self) -> Result<Phase, IntakeError> {
        while matches!(self.state, State::Decoding(_)) {
            let outcome = self
                .rx
                .recv()
                .map_err(|_| IntakeError::DecodeFailure("decode worker disconnected".into()))?;
            self.apply_outcome(outcome)?;
        }
        Ok(self.phase())
    }

    /// Apply any decode completions that have already arrived, without blocking.
    ///
    /// Returns `true` if the current selection finished decoding.
    pub fn poll_decodes(&mut self) -> Result<bool, IntakeError> {
        while let Ok(outcome) = self.rx.try_recv() {
            if self.apply_outcome(outcome)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// [`select_file`](Self::select_file) followed by [`wait_for_decode`](Self::wait_for_decode).
    pub fn select_and_decode(&mut self, file: Option<SelectedFile>) -> Result<Phase, IntakeError> {
        self.select_file(file)?;
        self.wait_for_decode()
    }

    fn apply_outcome(&mut self, outcome: DecodeOutcome) -> Result<bool, IntakeError> {
        let current = matches!(&self.state, State::Decoding(p) if p.id == outcome.id);
        if !current {
            log::debug!("discarding stale decode result for {}", outcome.id);
            return Ok(false);
        }

        self.state = State::Idle;
        let image = outcome.result?;
        self.open_crop_session(image);
        Ok(true)
    }

    /// Open the crop tool on an image, releasing any previous session first.
    ///
    /// Also supersedes an in-flight decode. Returns the new session's id.
    pub fn open_crop_session(&mut self, image: SelectedImage) -> u64 {
        self.state.abandon();
        let crop = self.config.crop_config();
        let session = CropSession::open(&self.sessions, image, crop.aspect, crop.output_size);
        let id = session.id();
        self.state = State::Cropping(session);
        id
    }

    /// Move or resize the crop selection. The applied region is returned.
    pub fn set_crop_region(&mut self, region: CropRegion) -> Result<CropRegion, IntakeError> {
        match &mut self.state {
            State::Cropping(session) => Ok(session.set_region(region)),
            _ => Err(IntakeError::NoActiveSession),
        }
    }

    /// Put the selection back to the largest centred region.
    pub fn reset_crop_region(&mut self) -> Result<CropRegion, IntakeError> {
        match &mut self.state {
            State::Cropping(session) => Ok(session.reset_region()),
            _ => Err(IntakeError::NoActiveSession),
        }
    }

    /// Render the current selection and append it to the gallery.
    ///
    /// Without an open session this is a no-op returning `Ok(None)`. A full
    /// gallery or a render failure leaves the session open.
    pub fn commit_crop(&mut self) -> Result<Option<ImageHandle>, IntakeError> {
        let State::Cropping(session) = &self.state else {
            log::debug!("commit ignored: no crop session");
            return Ok(None);
        };
        if self.gallery.is_full() {
            return Err(IntakeError::GalleryFull {
                max: self.gallery.max_images(),
            });
        }

        let target = CropConfig {
            aspect: session.aspect(),
            output_size: session.output_size(),
            ..self.config.crop_config()
        };
        let encoded = render_crop(
            &*self.backend,
            &session.image().bytes,
            session.region(),
            &target,
        )?;
        self.next_handle += 1;
        let handle = ImageHandle(self.next_handle);
        log::info!(
            "committed {} from {} region {} ({} bytes)",
            handle,
            session.image().name,
            session.region(),
            encoded.bytes.len()
        );

        self.gallery.push(CroppedImage {
            handle,
            jpeg: encoded.bytes,
            dimensions: encoded.dimensions,
        })?;
        self.notify_view();
        self.state = State::Idle;
        Ok(Some(handle))
    }

    /// Close the crop tool without touching the gallery.
    ///
    /// Cancels a decode that is still running as well. No-op when idle.
    pub fn cancel_crop(&mut self) {
        self.state.abandon();
    }

    /// Remove the gallery entry at `index`.
    pub fn remove_image(&mut self, index: usize) -> Result<CroppedImage, IntakeError> {
        let removed = self.gallery.remove(index)?;
        log::info!("removed {} at index {}", removed.handle, index);
        self.notify_view();
        Ok(removed)
    }

    /// Drop everything: in-flight decode, open session, and gallery.
    pub fn reset(&mut self) {
        self.state.abandon();
        self.gallery.clear();
        self.notify_view();
    }

    fn notify_view(&mut self) {
        if let Some(view) = self.view.as_mut() {
            view.render_thumbnails(self.gallery.images());
            view.update_preview(self.gallery.images());
        }
    }
}

impl<B> Drop for ImageIntake<B> {
    fn drop(&mut self) {
        self.state.abandon();
    }
}
