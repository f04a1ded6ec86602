//! Error types for the `framebind` crate.
//!
//! This module defines [`FramebindError`], the unified error type returned by
//! all fallible operations in the crate. Failures fall into three families.
//! Media faults (unreadable files, missing video streams, invalid durations,
//! decode failures) are scoped to a single source file; a conversion run
//! records them and moves on to the next file. Composition faults concern the
//! output document and end the run. Cancellation is not a fault: it unwinds
//! the run internally and is reported through item and run state rather than
//! as a user-visible error message.

use std::{io::Error as IoError, path::PathBuf, time::Duration};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `framebind` operations.
///
/// Every public method that can fail returns `Result<T, FramebindError>`.
/// Variants carry enough context to diagnose the problem without needing
/// additional logging at the call site.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FramebindError {
    /// The media file could not be opened.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::VideoClip::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// The reported duration of a source is unusable for sampling.
    #[error("Invalid duration for {name}: {reason}")]
    InvalidDuration {
        /// Display name of the offending source.
        name: String,
        /// What was wrong with the duration.
        reason: String,
    },

    /// A captured frame had zero width or height.
    ///
    /// A degenerate frame fails the whole file rather than being skipped,
    /// since it indicates the source cannot be rasterized reliably.
    #[error("Frame at {timestamp:?} in {name} has zero dimensions")]
    ZeroDimensionFrame {
        /// Display name of the offending source.
        name: String,
        /// Sampling timestamp of the degenerate frame.
        timestamp: Duration,
    },

    /// A video frame could not be decoded.
    #[error("Video decode error: {0}")]
    VideoDecodeError(String),

    /// The sampling interval is zero.
    #[error("Sampling interval must be greater than zero")]
    InvalidInterval,

    /// A run was requested but no file is pending or retriable.
    #[error("No files are pending processing")]
    NoEligibleFiles,

    /// The session is busy with an active run.
    #[error("A conversion run is already active")]
    RunActive,

    /// Document composition was invoked without any frames.
    #[error("No frames provided to compose a document")]
    EmptyComposition,

    /// The output document could not be assembled or finalized.
    #[error("Composition error: {0}")]
    CompositionError(String),

    /// An error reported by the underlying FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An image encoding or decoding error occurred.
    #[error("Image error: {0}")]
    ImageError(#[from] ImageError),

    /// The operation was cancelled via a [`crate::CancellationToken`].
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<FfmpegError> for FramebindError {
    fn from(error: FfmpegError) -> Self {
        FramebindError::FfmpegError(error.to_string())
    }
}

impl FramebindError {
    /// Returns `true` if this error is scoped to a single media file.
    ///
    /// Media errors do not abort a conversion run: the offending file is
    /// marked as failed and processing continues with the next file.
    pub fn is_media_error(&self) -> bool {
        matches!(
            self,
            FramebindError::FileOpen { .. }
                | FramebindError::NoVideoStream
                | FramebindError::InvalidDuration { .. }
                | FramebindError::ZeroDimensionFrame { .. }
                | FramebindError::VideoDecodeError(_)
                | FramebindError::FfmpegError(_)
                | FramebindError::ImageError(_)
        )
    }

    /// Returns `true` if this error concerns the output document.
    pub fn is_composition_error(&self) -> bool {
        matches!(
            self,
            FramebindError::EmptyComposition | FramebindError::CompositionError(_)
        )
    }

    /// Returns `true` if this error represents a cancelled operation.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, FramebindError::Cancelled)
    }
}
