//! Conversion configuration.
//!
//! [`ConvertOptions`] is a builder that carries the sampling, queueing, and
//! page layout settings of a [`ConvertSession`](crate::ConvertSession)
//! without polluting every function signature.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use framebind::ConvertOptions;
//!
//! let options = ConvertOptions::new()
//!     .with_sampling_interval(Duration::from_secs(5))
//!     .with_max_files(8)
//!     .with_jpeg_quality(80);
//! # let _ = options;
//! ```

use std::time::Duration;

use crate::compose::PageGeometry;
use crate::sampler::{DEFAULT_FRAME_PAUSE, DEFAULT_JPEG_QUALITY, DEFAULT_SAMPLING_INTERVAL};

/// Default maximum number of files a session will queue.
pub const DEFAULT_MAX_FILES: usize = 20;

/// Default file extension accepted by [`ConvertSession::add_files`](crate::ConvertSession::add_files).
pub const DEFAULT_ACCEPTED_EXTENSION: &str = "mp4";

/// Settings for a conversion session.
///
/// Construct with [`ConvertOptions::new`] and customise with the `with_*`
/// builder methods. The defaults sample one frame every ten seconds, queue at
/// most twenty MP4 files, and lay frames out on A4 pages.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub(crate) sampling_interval: Duration,
    pub(crate) frame_pause: Duration,
    pub(crate) max_files: usize,
    pub(crate) accepted_extension: String,
    pub(crate) jpeg_quality: u8,
    pub(crate) page: PageGeometry,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            sampling_interval: DEFAULT_SAMPLING_INTERVAL,
            frame_pause: DEFAULT_FRAME_PAUSE,
            max_files: DEFAULT_MAX_FILES,
            accepted_extension: DEFAULT_ACCEPTED_EXTENSION.to_string(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            page: PageGeometry::default(),
        }
    }
}

impl ConvertOptions {
    /// Creates options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the interval between sampled frames.
    ///
    /// A zero interval is rejected with
    /// [`FramebindError::InvalidInterval`](crate::FramebindError::InvalidInterval)
    /// when the run reaches the first file.
    #[must_use]
    pub fn with_sampling_interval(mut self, interval: Duration) -> Self {
        self.sampling_interval = interval;
        self
    }

    /// Sets the pause inserted after each frame capture.
    ///
    /// The pause keeps sustained decoding from monopolising the machine.
    /// Pass [`Duration::ZERO`] to capture back to back.
    #[must_use]
    pub fn with_frame_pause(mut self, pause: Duration) -> Self {
        self.frame_pause = pause;
        self
    }

    /// Sets the maximum number of files the session will queue.
    ///
    /// Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_max_files(mut self, limit: usize) -> Self {
        self.max_files = limit.max(1);
        self
    }

    /// Sets the file extension accepted when adding files (compared
    /// case-insensitively, without the leading dot).
    #[must_use]
    pub fn with_accepted_extension<S: Into<String>>(mut self, extension: S) -> Self {
        self.accepted_extension = extension.into();
        self
    }

    /// Sets the JPEG quality used when encoding captured frames.
    ///
    /// Values are clamped to the 1 to 100 range.
    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Sets the page geometry used when composing the output document.
    #[must_use]
    pub fn with_page_geometry(mut self, page: PageGeometry) -> Self {
        self.page = page;
        self
    }
}
