//! Batch conversion sessions.
//!
//! A [`ConvertSession`] owns a queue of video files and drives the whole
//! pipeline: it orders eligible files by their numeric name prefixes, samples
//! frames from each file in turn, accumulates every captured frame, and
//! composes them into a single PDF once the last file finishes.
//!
//! Files are processed strictly one at a time. A file that fails with a
//! media error is marked and skipped, and stays eligible for the next run;
//! files that completed are not reprocessed. At most one run is active per
//! session, and all item state is mutated exclusively by the running driver,
//! so listeners only ever observe consistent snapshots.
//!
//! # Example
//!
//! ```no_run
//! use framebind::{ConvertOptions, ConvertSession, RunContext, RunOutcome, VideoOpener};
//!
//! let mut session = ConvertSession::new(ConvertOptions::new());
//! session.add_files(["2-details.mp4", "1-intro.mp4", "appendix.mp4"])?;
//!
//! // Processes 1-intro, then 2-details, then appendix.
//! match session.run(&mut VideoOpener, &RunContext::new())? {
//!     RunOutcome::Completed(document) => document.save("frames.pdf")?,
//!     RunOutcome::NoFrames => eprintln!("nothing captured"),
//!     RunOutcome::Cancelled => eprintln!("cancelled"),
//! }
//! # Ok::<(), framebind::FramebindError>(())
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::compose::{self, ComposedDocument};
use crate::config::ConvertOptions;
use crate::error::FramebindError;
use crate::progress::{
    CancellationToken, ItemProgress, ItemStatus, NoOpProgress, ProgressListener, RunSnapshot,
    RunState,
};
use crate::sampler::{self, Frame};
use crate::sequence;
use crate::source::{SourceFile, SourceOpener};

/// Message shown when a run finishes without capturing a single frame.
pub const NO_FRAMES_CAPTURED_MESSAGE: &str =
    "No screenshots captured. Ensure videos are valid and have >0s duration.";

/// Per-run companions: the cancellation token and the progress listener.
///
/// A context is created for each run and owns that run's
/// [`CancellationToken`]; reusing a context whose token was cancelled makes
/// the next run stop immediately, so create a fresh context per run.
#[derive(Clone)]
pub struct RunContext {
    pub(crate) token: CancellationToken,
    pub(crate) listener: Arc<dyn ProgressListener>,
}

impl RunContext {
    /// Creates a context with a fresh token and no listener.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            listener: Arc::new(NoOpProgress),
        }
    }

    /// Attaches a progress listener to the run.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn ProgressListener>) -> Self {
        self.listener = listener;
        self
    }

    /// Returns a clone of the run's cancellation token.
    ///
    /// Hand the clone to whatever can stop the run, typically a UI action or
    /// a signal handler on another thread.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("cancelled", &self.token.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// How a conversion run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every eligible file was processed and the document was composed.
    Completed(ComposedDocument),
    /// Every eligible file was processed but no frame was captured, so there
    /// is no document. The run message is [`NO_FRAMES_CAPTURED_MESSAGE`].
    NoFrames,
    /// The run was cancelled before finishing.
    Cancelled,
}

/// What happened to the paths passed to [`ConvertSession::add_files`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddReport {
    /// Paths queued for processing.
    pub added: usize,
    /// Paths skipped because their extension is not accepted.
    pub skipped_unsupported: usize,
    /// Paths skipped because the session file limit was reached.
    pub skipped_over_limit: usize,
}

/// One queued file and its run bookkeeping.
#[derive(Debug, Clone)]
struct ProcessableItem {
    source: SourceFile,
    status: ItemStatus,
    frames_captured: u64,
    total_expected: Option<u64>,
    error: Option<String>,
}

impl ProcessableItem {
    fn new(source: SourceFile) -> Self {
        Self {
            source,
            status: ItemStatus::Pending,
            frames_captured: 0,
            total_expected: None,
            error: None,
        }
    }

    /// Pending files have never run; errored files are retried next run.
    fn is_eligible(&self) -> bool {
        matches!(self.status, ItemStatus::Pending | ItemStatus::Error)
    }

    fn progress(&self) -> ItemProgress {
        ItemProgress {
            id: self.source.id,
            display_name: self.source.display_name.clone(),
            status: self.status,
            frames_captured: self.frames_captured,
            total_expected: self.total_expected,
            error: self.error.clone(),
        }
    }
}

/// A queue of video files and the driver that converts them into one PDF.
///
/// Build one with [`ConvertSession::new`], fill it with
/// [`add_files`](ConvertSession::add_files), and call
/// [`run`](ConvertSession::run). The session survives across runs: files that
/// failed stay queued and are retried by the next run, while completed files
/// are left alone.
pub struct ConvertSession {
    items: Vec<ProcessableItem>,
    options: ConvertOptions,
    state: RunState,
    message: String,
    percent: u8,
    next_id: u64,
}

impl ConvertSession {
    /// Creates an empty session with the given options.
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            items: Vec::new(),
            options,
            state: RunState::Idle,
            message: String::new(),
            percent: 0,
            next_id: 0,
        }
    }

    /// Queues files for conversion.
    ///
    /// Paths whose extension does not match the accepted one (MP4 by
    /// default, compared case-insensitively) are skipped, as are paths beyond
    /// the session file limit. The returned [`AddReport`] says how many
    /// landed in each bucket.
    ///
    /// # Errors
    ///
    /// Returns [`FramebindError::RunActive`] while a run is in progress.
    pub fn add_files<I, P>(&mut self, paths: I) -> Result<AddReport, FramebindError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.ensure_not_running()?;

        let mut report = AddReport::default();
        for path in paths {
            let path: PathBuf = path.into();
            if !has_accepted_extension(&path, &self.options.accepted_extension) {
                log::debug!("Skipping {}: extension not accepted", path.display());
                report.skipped_unsupported += 1;
                continue;
            }
            if self.items.len() >= self.options.max_files {
                report.skipped_over_limit += 1;
                continue;
            }

            let display_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            let id = self.next_id;
            self.next_id += 1;

            log::debug!("Queued {display_name} (id={id})");
            self.items
                .push(ProcessableItem::new(SourceFile { id, path, display_name }));
            report.added += 1;
        }

        Ok(report)
    }

    /// Removes a queued file by id. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`FramebindError::RunActive`] while a run is in progress.
    pub fn remove_file(&mut self, id: u64) -> Result<(), FramebindError> {
        self.ensure_not_running()?;
        self.items.retain(|item| item.source.id != id);
        Ok(())
    }

    /// Removes every queued file and resets the session to idle.
    ///
    /// # Errors
    ///
    /// Returns [`FramebindError::RunActive`] while a run is in progress.
    pub fn clear(&mut self) -> Result<(), FramebindError> {
        self.ensure_not_running()?;
        self.items.clear();
        self.state = RunState::Idle;
        self.message.clear();
        self.percent = 0;
        Ok(())
    }

    /// Current run state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Number of files a run would process right now.
    pub fn eligible_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_eligible()).count()
    }

    /// Snapshots of all queued files, in insertion order.
    pub fn items(&self) -> Vec<ItemProgress> {
        self.items.iter().map(ProcessableItem::progress).collect()
    }

    /// A consistent snapshot of the whole session.
    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            state: self.state,
            percent: self.percent,
            message: self.message.clone(),
            items: self.items.iter().map(ProcessableItem::progress).collect(),
        }
    }

    /// Runs the conversion: samples every eligible file in order, then
    /// composes all captured frames into a single document.
    ///
    /// Eligible files (pending or errored) are sorted by their numeric name
    /// prefixes and processed one at a time. A file that fails with a media
    /// error is marked [`ItemStatus::Error`] and the run continues with the
    /// next file. The context's cancellation token is checked before each
    /// file and each frame; once observed, the in-flight and remaining
    /// eligible files are marked [`ItemStatus::Cancelled`], files already in
    /// a terminal state keep it, and no document is produced.
    ///
    /// # Errors
    ///
    /// Returns [`FramebindError::RunActive`] if a run is already active,
    /// [`FramebindError::NoEligibleFiles`] if nothing is queued for
    /// processing, and any composition error. Per-file media errors do not
    /// abort the run and are reported on the items instead.
    pub fn run(
        &mut self,
        opener: &mut dyn SourceOpener,
        context: &RunContext,
    ) -> Result<RunOutcome, FramebindError> {
        self.ensure_not_running()?;

        let mut order: Vec<usize> = (0..self.items.len())
            .filter(|&index| self.items[index].is_eligible())
            .collect();
        if order.is_empty() {
            return Err(FramebindError::NoEligibleFiles);
        }
        // Stable sort: unnumbered names compare equal and keep their
        // insertion order after all numbered ones.
        order.sort_by(|&a, &b| {
            sequence::compare_display_names(
                &self.items[a].source.display_name,
                &self.items[b].source.display_name,
            )
        });

        self.state = RunState::Running;
        self.percent = 0;
        self.message = "Starting conversion...".to_string();
        self.emit(context);
        log::info!("Starting conversion run over {} file(s)", order.len());

        let total_items = order.len();
        let mut frames: Vec<Frame> = Vec::new();
        let mut processed = 0usize;
        let mut cancelled = false;

        for &index in &order {
            if context.token.is_cancelled() {
                cancelled = true;
                break;
            }

            {
                let item = &mut self.items[index];
                item.status = ItemStatus::Processing;
                item.frames_captured = 0;
                item.total_expected = None;
                item.error = None;
            }
            self.message = format!("Processing {}...", self.items[index].source.display_name);
            self.emit(context);

            let first_index = frames.len() as u64;
            match self.process_item(index, opener, context, first_index) {
                Ok(mut captured) => {
                    let count = captured.len() as u64;
                    frames.append(&mut captured);
                    let item = &mut self.items[index];
                    item.status = ItemStatus::Completed;
                    item.frames_captured = count;
                    log::debug!(
                        "Completed {} with {count} frame(s)",
                        item.source.display_name,
                    );
                }
                Err(error) if error.is_cancellation() => {
                    self.items[index].status = ItemStatus::Cancelled;
                    cancelled = true;
                    break;
                }
                Err(error) => {
                    log::warn!(
                        "Skipping {}: {error}",
                        self.items[index].source.display_name,
                    );
                    let item = &mut self.items[index];
                    item.status = ItemStatus::Error;
                    item.error = Some(error.to_string());
                }
            }

            processed += 1;
            self.percent = completion_percent(processed, total_items);
            self.emit(context);
        }

        if cancelled {
            for &index in &order {
                let item = &mut self.items[index];
                if !item.status.is_terminal() {
                    item.status = ItemStatus::Cancelled;
                }
            }
            self.state = RunState::Cancelled;
            self.percent = 0;
            self.message = "Conversion cancelled.".to_string();
            self.emit(context);
            log::info!("Conversion run cancelled");
            return Ok(RunOutcome::Cancelled);
        }

        if frames.is_empty() {
            self.state = RunState::Completed;
            self.message = NO_FRAMES_CAPTURED_MESSAGE.to_string();
            self.emit(context);
            log::info!("Conversion run finished without capturing any frames");
            return Ok(RunOutcome::NoFrames);
        }

        self.message = "Generating PDF...".to_string();
        self.emit(context);
        log::info!("Composing document from {} frame(s)", frames.len());

        match compose::compose_document(&frames, &self.options.page) {
            Ok(document) => {
                self.state = RunState::Completed;
                self.message = "PDF generated successfully!".to_string();
                self.emit(context);
                Ok(RunOutcome::Completed(document))
            }
            Err(error) => {
                self.state = RunState::Completed;
                self.message = format!("PDF generation failed: {error}");
                self.emit(context);
                Err(error)
            }
        }
    }

    /// Opens and samples one file. The source is dropped before this returns,
    /// releasing its decoder whether sampling succeeded or not.
    fn process_item(
        &mut self,
        index: usize,
        opener: &mut dyn SourceOpener,
        context: &RunContext,
        first_index: u64,
    ) -> Result<Vec<Frame>, FramebindError> {
        let source_file = self.items[index].source.clone();
        let options = self.options.clone();
        let mut source = opener.open(&source_file)?;

        sampler::capture_frames(
            source.as_mut(),
            &source_file.display_name,
            &options,
            &context.token,
            first_index,
            &mut |captured, expected| {
                let item = &mut self.items[index];
                item.frames_captured = captured;
                item.total_expected = Some(expected);
                context.listener.on_update(&self.snapshot());
            },
        )
    }

    fn ensure_not_running(&self) -> Result<(), FramebindError> {
        if self.state == RunState::Running {
            return Err(FramebindError::RunActive);
        }
        Ok(())
    }

    fn emit(&self, context: &RunContext) {
        context.listener.on_update(&self.snapshot());
    }
}

impl std::fmt::Debug for ConvertSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConvertSession")
            .field("items", &self.items.len())
            .field("state", &self.state)
            .field("percent", &self.percent)
            .finish_non_exhaustive()
    }
}

fn completion_percent(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((processed as f64 / total as f64) * 100.0).round() as u8
}

fn has_accepted_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(std::ffi::OsStr::to_str)
        .is_some_and(|value| value.eq_ignore_ascii_case(extension))
}
