//! # framebind
//!
//! Bind frames sampled from MP4 videos into a single PDF, one frame per page.
//!
//! `framebind` takes a batch of video files, decodes a frame at regular
//! intervals from each (via FFmpeg through the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate), and lays the
//! captured frames out into one PDF document. Files are processed in the
//! order their numeric name prefixes dictate (`1-intro.mp4`, `2-body.mp4`,
//! `2.1-detail.mp4`, ...), so a folder of numbered clips becomes a document
//! whose pages follow the numbering.
//!
//! ## Quick Start
//!
//! ```no_run
//! use framebind::{ConvertOptions, ConvertSession, RunContext, RunOutcome, VideoOpener};
//!
//! let mut session = ConvertSession::new(ConvertOptions::new());
//! session.add_files(["1-intro.mp4", "2-body.mp4"])?;
//!
//! match session.run(&mut VideoOpener, &RunContext::new())? {
//!     RunOutcome::Completed(document) => document.save("frames.pdf")?,
//!     RunOutcome::NoFrames => eprintln!("no frames captured"),
//!     RunOutcome::Cancelled => eprintln!("conversion cancelled"),
//! }
//! # Ok::<(), framebind::FramebindError>(())
//! ```
//!
//! ## Features
//!
//! - **Ordered batch conversion** — files are sequenced by dotted numeric
//!   name prefixes (`2.9` before `2.10`), unnumbered files last
//! - **Interval sampling** — one frame at t = 0 and every N seconds after,
//!   strictly inside the clip's duration
//! - **Single-document output** — every frame becomes one PDF page, sized
//!   A4 and oriented per frame (landscape when wider than tall)
//! - **Fault isolation** — a broken file is marked and skipped, the batch
//!   carries on; a frame that fails to render becomes a placeholder page
//! - **Progress & cancellation** — snapshot-based [`ProgressListener`]
//!   callbacks and a [`CancellationToken`] honoured between frames
//! - **Retry semantics** — errored files stay eligible, completed files are
//!   not reprocessed by later runs of the same session
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system. See the
//! README for platform-specific instructions.

pub mod compose;
pub mod config;
mod conversion;
pub mod error;
pub mod ffmpeg;
pub mod progress;
pub mod sampler;
pub mod sequence;
pub mod session;
pub mod source;
pub mod video;

pub use compose::{
    A4_HEIGHT_PT, A4_WIDTH_PT, ComposedDocument, PAGE_MARGIN_PT, PageGeometry, PageOrientation,
    PagePlacement, compose_document, default_output_name, orientation_for, place_frame,
};
pub use config::{ConvertOptions, DEFAULT_ACCEPTED_EXTENSION, DEFAULT_MAX_FILES};
pub use error::FramebindError;
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use progress::{
    CancellationToken, ItemProgress, ItemStatus, ProgressListener, RunSnapshot, RunState,
};
pub use sampler::{
    DEFAULT_FRAME_PAUSE, DEFAULT_JPEG_QUALITY, DEFAULT_SAMPLING_INTERVAL, Frame, capture_frames,
    sampling_schedule,
};
pub use sequence::{compare_display_names, numeric_prefix};
pub use session::{
    AddReport, ConvertSession, NO_FRAMES_CAPTURED_MESSAGE, RunContext, RunOutcome,
};
pub use source::{FrameSource, SourceFile, SourceOpener};
pub use video::{VideoClip, VideoOpener};
