//! Source abstractions for frame capture.
//!
//! A [`ConvertSession`](crate::ConvertSession) does not open media files
//! itself. It asks a [`SourceOpener`] for a [`FrameSource`] per queued file,
//! which keeps the session logic independent of FFmpeg and lets tests drive
//! a whole run with scripted in-memory sources. The production implementation
//! is [`VideoOpener`](crate::VideoOpener), which opens
//! [`VideoClip`](crate::VideoClip)s.

use std::path::PathBuf;
use std::time::Duration;

use image::DynamicImage;

use crate::error::FramebindError;

/// A file queued for conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Session-unique identifier, assigned when the file is added.
    pub id: u64,
    /// Path the file will be opened from.
    pub path: PathBuf,
    /// Name shown to the user, also used for ordering. Defaults to the
    /// final path component.
    pub display_name: String,
}

/// A decodable media source that frames can be captured from.
///
/// Implementations report their playable duration and rasterize single
/// frames at requested timestamps. Any resource held by the source (for
/// example a demuxer) is released when the value is dropped; the run drops
/// each source as soon as its file finishes, whether it succeeded or failed.
pub trait FrameSource {
    /// The playable duration of the source, or `None` if it is unknown.
    ///
    /// Sources whose container reports a non-positive duration must return
    /// `None` rather than a zero duration.
    fn duration(&self) -> Option<Duration>;

    /// Decodes and rasterizes the frame at `timestamp`.
    ///
    /// Returns the first displayable frame at or after the requested time.
    ///
    /// # Errors
    ///
    /// Returns a media error if the frame cannot be decoded.
    fn capture_at(&mut self, timestamp: Duration) -> Result<DynamicImage, FramebindError>;
}

/// Opens [`FrameSource`]s for queued files.
///
/// The opener is invoked once per file, in processing order, each time a run
/// reaches that file. Failures are media errors scoped to the one file: the
/// run marks the file as failed and continues.
pub trait SourceOpener {
    /// Opens a frame source for `file`.
    ///
    /// # Errors
    ///
    /// Returns [`FramebindError::FileOpen`] or another media error when the
    /// file cannot be opened as video.
    fn open(&mut self, file: &SourceFile) -> Result<Box<dyn FrameSource>, FramebindError>;
}
