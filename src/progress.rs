//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressListener`] for observing a conversion run,
//! [`CancellationToken`] for cooperative cancellation, and [`RunSnapshot`] /
//! [`ItemProgress`] for point-in-time views of the run state.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framebind::{
//!     ConvertOptions, ConvertSession, FramebindError, ProgressListener,
//!     RunContext, RunSnapshot, VideoOpener,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressListener for PrintProgress {
//!     fn on_update(&self, snapshot: &RunSnapshot) {
//!         println!("[{}%] {}", snapshot.percent, snapshot.message);
//!     }
//! }
//!
//! let mut session = ConvertSession::new(ConvertOptions::new());
//! session.add_files(["1-intro.mp4", "2-lesson.mp4"])?;
//!
//! let context = RunContext::new().with_listener(Arc::new(PrintProgress));
//! let outcome = session.run(&mut VideoOpener, &context)?;
//! # let _ = outcome;
//! # Ok::<(), FramebindError>(())
//! ```

use std::fmt;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// A token for cooperatively cancelling a conversion run.
///
/// Clone the token and share it across threads; calling [`cancel`] from any
/// clone is observed by all of them. The run checks the token before opening
/// each file and before each individual frame capture, so cancellation takes
/// effect at the next capture boundary rather than mid-decode.
///
/// [`cancel`]: CancellationToken::cancel
///
/// # Example
///
/// ```
/// use framebind::CancellationToken;
///
/// let token = CancellationToken::new();
/// let for_ui_thread = token.clone();
///
/// assert!(!token.is_cancelled());
/// for_ui_thread.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a new token in the non-cancelled state.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Requests cancellation.
    ///
    /// All clones of this token observe the request. Cancellation is
    /// cooperative: in-flight decode work finishes before the run stops.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns `true` if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle state of a single queued file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    /// Queued and not yet processed.
    Pending,
    /// Frames are currently being captured from this file.
    Processing,
    /// All scheduled frames were captured.
    Completed,
    /// The file failed with a media error and will be retried on the next run.
    Error,
    /// Processing was cancelled before the file finished.
    Cancelled,
}

impl ItemStatus {
    /// Returns `true` if the status is final for the current run.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ItemStatus::Completed | ItemStatus::Error | ItemStatus::Cancelled
        )
    }

    /// Stable lowercase name, suitable for machine-readable output.
    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Processing => "processing",
            ItemStatus::Completed => "completed",
            ItemStatus::Error => "error",
            ItemStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a conversion run.
///
/// A session starts `Idle`, moves to `Running` when a run begins, and ends in
/// either `Completed` or `Cancelled`. A finished session can start another
/// run, which processes the files that are still pending or errored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No run has started yet.
    Idle,
    /// A run is currently processing files.
    Running,
    /// The last run finished on its own.
    Completed,
    /// The last run was cancelled.
    Cancelled,
}

impl RunState {
    /// Stable lowercase name, suitable for machine-readable output.
    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point-in-time view of one queued file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemProgress {
    /// Session-unique identifier of the file.
    pub id: u64,
    /// Name shown to the user, also used for ordering.
    pub display_name: String,
    /// Current lifecycle status.
    pub status: ItemStatus,
    /// Number of frames captured so far.
    pub frames_captured: u64,
    /// Total frames the sampling schedule will produce, once known.
    pub total_expected: Option<u64>,
    /// Message of the media error that failed this file, if any.
    ///
    /// Cancelled items carry no error message.
    pub error: Option<String>,
}

/// A point-in-time view of a whole conversion run.
///
/// Snapshots are cheap clones of the session state taken after every
/// mutation, so listeners never observe a half-updated run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSnapshot {
    /// Current run state.
    pub state: RunState,
    /// Percentage of files that reached a terminal status, 0 to 100.
    pub percent: u8,
    /// Human-readable description of what the run is doing right now.
    pub message: String,
    /// Per-file progress, in the order the files were added.
    pub items: Vec<ItemProgress>,
}

/// Receives progress updates during a conversion run.
///
/// Implementations must be thread-safe (`Send + Sync`) since tokens and
/// listeners may be shared with other threads for cancellation and display.
/// Callbacks are infallible: they observe progress but cannot halt the run.
/// Use a [`CancellationToken`] to stop a run.
pub trait ProgressListener: Send + Sync {
    /// Called after every state mutation with a fresh snapshot.
    fn on_update(&self, snapshot: &RunSnapshot);
}

/// A listener that discards all updates. Used when no listener is attached.
pub(crate) struct NoOpProgress;

impl ProgressListener for NoOpProgress {
    fn on_update(&self, _snapshot: &RunSnapshot) {}
}
