//! Conversion session integration tests.
//!
//! A scripted opener drives whole runs in memory, so no fixture files or
//! FFmpeg installation are needed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use framebind::{
    CancellationToken, ConvertOptions, ConvertSession, FrameSource, FramebindError, ItemProgress,
    ItemStatus, NO_FRAMES_CAPTURED_MESSAGE, ProgressListener, RunContext, RunOutcome, RunSnapshot,
    RunState, SourceFile, SourceOpener,
};
use image::{DynamicImage, Rgb, RgbImage};

// ── Scripted sources ───────────────────────────────────────────────

#[derive(Clone, Copy)]
enum Behavior {
    /// Open succeeds; captures solid frames of the given size.
    Frames { duration: Duration, size: (u32, u32) },
    /// Open fails with a media error.
    OpenError,
    /// Open succeeds but the source cannot report a duration.
    UnknownDuration,
}

fn three_frames() -> Behavior {
    // 25s at the default 10s interval yields frames at 0s, 10s, and 20s.
    Behavior::Frames {
        duration: Duration::from_secs(25),
        size: (64, 48),
    }
}

struct ScriptedOpener {
    behaviors: HashMap<String, Behavior>,
    opened: Vec<String>,
}

impl ScriptedOpener {
    fn new() -> Self {
        Self {
            behaviors: HashMap::new(),
            opened: Vec::new(),
        }
    }

    fn file(mut self, name: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(name.to_string(), behavior);
        self
    }
}

impl SourceOpener for ScriptedOpener {
    fn open(&mut self, file: &SourceFile) -> Result<Box<dyn FrameSource>, FramebindError> {
        self.opened.push(file.display_name.clone());
        match self.behaviors.get(&file.display_name).copied() {
            Some(Behavior::Frames { duration, size }) => Ok(Box::new(ScriptedSource {
                duration: Some(duration),
                size,
            })),
            Some(Behavior::OpenError) => Err(FramebindError::FileOpen {
                path: file.path.clone(),
                reason: "scripted open failure".to_string(),
            }),
            Some(Behavior::UnknownDuration) => Ok(Box::new(ScriptedSource {
                duration: None,
                size: (64, 48),
            })),
            None => Ok(Box::new(ScriptedSource {
                duration: Some(Duration::from_secs(25)),
                size: (64, 48),
            })),
        }
    }
}

struct ScriptedSource {
    duration: Option<Duration>,
    size: (u32, u32),
}

impl FrameSource for ScriptedSource {
    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn capture_at(&mut self, _timestamp: Duration) -> Result<DynamicImage, FramebindError> {
        let (width, height) = self.size;
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            Rgb([10, 20, 30]),
        )))
    }
}

// ── Listeners ──────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingListener {
    snapshots: Mutex<Vec<RunSnapshot>>,
}

impl ProgressListener for RecordingListener {
    fn on_update(&self, snapshot: &RunSnapshot) {
        self.snapshots.lock().unwrap().push(snapshot.clone());
    }
}

/// Cancels its token the first time a snapshot message contains the needle.
struct CancelOnMessage {
    token: CancellationToken,
    needle: &'static str,
}

impl ProgressListener for CancelOnMessage {
    fn on_update(&self, snapshot: &RunSnapshot) {
        if snapshot.message.contains(self.needle) {
            self.token.cancel();
        }
    }
}

// ── Helpers ────────────────────────────────────────────────────────

fn fast_options() -> ConvertOptions {
    ConvertOptions::new().with_frame_pause(Duration::ZERO)
}

fn item_named<'a>(items: &'a [ItemProgress], name: &str) -> &'a ItemProgress {
    items
        .iter()
        .find(|item| item.display_name == name)
        .unwrap_or_else(|| panic!("no item named {name}"))
}

// ── Queue management ───────────────────────────────────────────────

#[test]
fn add_files_filters_by_extension() {
    let mut session = ConvertSession::new(fast_options());
    let report = session
        .add_files(["a.mp4", "b.mov", "c.MP4", "d.txt"])
        .expect("add_files should succeed");

    assert_eq!(report.added, 2);
    assert_eq!(report.skipped_unsupported, 2);
    assert_eq!(report.skipped_over_limit, 0);

    let names: Vec<String> = session
        .items()
        .into_iter()
        .map(|item| item.display_name)
        .collect();
    assert_eq!(names, vec!["a.mp4", "c.MP4"]);
}

#[test]
fn add_files_enforces_queue_limit() {
    let mut session = ConvertSession::new(fast_options().with_max_files(3));
    let report = session
        .add_files(["1.mp4", "2.mp4", "3.mp4", "4.mp4", "5.mp4"])
        .expect("add_files should succeed");

    assert_eq!(report.added, 3);
    assert_eq!(report.skipped_over_limit, 2);
    assert_eq!(session.items().len(), 3);
    assert_eq!(session.eligible_count(), 3);
}

#[test]
fn remove_file_and_clear_manage_the_queue() {
    let mut session = ConvertSession::new(fast_options());
    session
        .add_files(["1-a.mp4", "2-b.mp4"])
        .expect("add_files should succeed");

    let first_id = session.items()[0].id;
    session.remove_file(first_id).expect("remove should succeed");
    assert_eq!(session.items().len(), 1);
    assert_eq!(session.items()[0].display_name, "2-b.mp4");

    // Unknown ids are ignored.
    session.remove_file(9999).expect("remove should succeed");
    assert_eq!(session.items().len(), 1);

    session.clear().expect("clear should succeed");
    assert!(session.items().is_empty());
    assert_eq!(session.state(), RunState::Idle);
}

#[test]
fn queued_items_start_pending() {
    let mut session = ConvertSession::new(fast_options());
    session.add_files(["1-a.mp4"]).expect("add_files should succeed");

    let items = session.items();
    assert_eq!(items[0].status, ItemStatus::Pending);
    assert_eq!(items[0].frames_captured, 0);
    assert_eq!(items[0].total_expected, None);
    assert_eq!(items[0].error, None);
}

// ── Running ────────────────────────────────────────────────────────

#[test]
fn processes_files_in_prefix_order() {
    let mut session = ConvertSession::new(fast_options());
    session
        .add_files(["2-b.mp4", "1-a.mp4", "notes.mp4"])
        .expect("add_files should succeed");

    let mut opener = ScriptedOpener::new();
    let outcome = session
        .run(&mut opener, &RunContext::new())
        .expect("run should succeed");

    assert_eq!(opener.opened, vec!["1-a.mp4", "2-b.mp4", "notes.mp4"]);
    match outcome {
        RunOutcome::Completed(document) => assert_eq!(document.page_count(), 9),
        other => panic!("Expected Completed, got: {other:?}"),
    }
    assert_eq!(session.state(), RunState::Completed);
}

#[test]
fn counters_match_schedule_after_completed_run() {
    let mut session = ConvertSession::new(fast_options());
    session.add_files(["1-a.mp4"]).expect("add_files should succeed");

    // 30s is an exact multiple of the 10s interval: 3 frames, not 4.
    let mut opener = ScriptedOpener::new().file(
        "1-a.mp4",
        Behavior::Frames {
            duration: Duration::from_secs(30),
            size: (64, 48),
        },
    );
    let outcome = session
        .run(&mut opener, &RunContext::new())
        .expect("run should succeed");

    let items = session.items();
    assert_eq!(items[0].status, ItemStatus::Completed);
    assert_eq!(items[0].frames_captured, 3);
    assert_eq!(items[0].total_expected, Some(3));
    match outcome {
        RunOutcome::Completed(document) => assert_eq!(document.page_count(), 3),
        other => panic!("Expected Completed, got: {other:?}"),
    }
}

#[test]
fn failed_file_does_not_abort_the_run() {
    let mut session = ConvertSession::new(fast_options());
    session
        .add_files(["1-bad.mp4", "2-good.mp4"])
        .expect("add_files should succeed");

    let mut opener = ScriptedOpener::new()
        .file("1-bad.mp4", Behavior::OpenError)
        .file("2-good.mp4", three_frames());
    let outcome = session
        .run(&mut opener, &RunContext::new())
        .expect("run should succeed despite the failing file");

    let items = session.items();
    let bad = item_named(&items, "1-bad.mp4");
    assert_eq!(bad.status, ItemStatus::Error);
    let reason = bad.error.as_deref().expect("errored item carries a message");
    assert!(reason.contains("scripted open failure"), "got: {reason}");

    let good = item_named(&items, "2-good.mp4");
    assert_eq!(good.status, ItemStatus::Completed);
    assert_eq!(good.frames_captured, 3);

    match outcome {
        RunOutcome::Completed(document) => assert_eq!(document.page_count(), 3),
        other => panic!("Expected Completed, got: {other:?}"),
    }
}

#[test]
fn unknown_duration_marks_the_file_errored() {
    let mut session = ConvertSession::new(fast_options());
    session
        .add_files(["1-bad.mp4", "2-good.mp4"])
        .expect("add_files should succeed");

    let mut opener = ScriptedOpener::new()
        .file("1-bad.mp4", Behavior::UnknownDuration)
        .file("2-good.mp4", three_frames());
    session
        .run(&mut opener, &RunContext::new())
        .expect("run should succeed despite the failing file");

    let items = session.items();
    let bad = item_named(&items, "1-bad.mp4");
    assert_eq!(bad.status, ItemStatus::Error);
    let reason = bad.error.as_deref().expect("errored item carries a message");
    assert!(reason.contains("duration"), "got: {reason}");
}

#[test]
fn run_with_all_files_failing_reports_no_frames() {
    let mut session = ConvertSession::new(fast_options());
    session
        .add_files(["1-bad.mp4", "2-worse.mp4"])
        .expect("add_files should succeed");

    let mut opener = ScriptedOpener::new()
        .file("1-bad.mp4", Behavior::OpenError)
        .file("2-worse.mp4", Behavior::OpenError);
    let outcome = session
        .run(&mut opener, &RunContext::new())
        .expect("a frameless run is not an error");

    assert!(matches!(outcome, RunOutcome::NoFrames));
    assert_eq!(session.state(), RunState::Completed);
    assert_eq!(session.snapshot().message, NO_FRAMES_CAPTURED_MESSAGE);
    for item in session.items() {
        assert_eq!(item.status, ItemStatus::Error);
    }
}

#[test]
fn errored_files_are_retried_on_the_next_run() {
    let mut session = ConvertSession::new(fast_options());
    session
        .add_files(["1-flaky.mp4", "2-good.mp4"])
        .expect("add_files should succeed");

    let mut failing = ScriptedOpener::new()
        .file("1-flaky.mp4", Behavior::OpenError)
        .file("2-good.mp4", three_frames());
    session
        .run(&mut failing, &RunContext::new())
        .expect("first run should succeed");
    assert_eq!(session.eligible_count(), 1);

    // The file recovers; only it is reprocessed.
    let mut recovered = ScriptedOpener::new().file("1-flaky.mp4", three_frames());
    let outcome = session
        .run(&mut recovered, &RunContext::new())
        .expect("second run should succeed");

    assert_eq!(recovered.opened, vec!["1-flaky.mp4"]);
    match outcome {
        RunOutcome::Completed(document) => assert_eq!(document.page_count(), 3),
        other => panic!("Expected Completed, got: {other:?}"),
    }
    for item in session.items() {
        assert_eq!(item.status, ItemStatus::Completed);
    }
    assert_eq!(session.eligible_count(), 0);
}

#[test]
fn run_without_eligible_files_is_an_error() {
    let mut session = ConvertSession::new(fast_options());
    let error = session
        .run(&mut ScriptedOpener::new(), &RunContext::new())
        .expect_err("an empty queue must not start a run");
    match error {
        FramebindError::NoEligibleFiles => {}
        other => panic!("Expected NoEligibleFiles, got: {other}"),
    }

    // A fully completed queue is equally ineligible.
    session.add_files(["1-a.mp4"]).expect("add_files should succeed");
    session
        .run(&mut ScriptedOpener::new(), &RunContext::new())
        .expect("run should succeed");
    let error = session
        .run(&mut ScriptedOpener::new(), &RunContext::new())
        .expect_err("nothing left to process");
    assert!(matches!(error, FramebindError::NoEligibleFiles));
}

// ── Progress reporting ─────────────────────────────────────────────

#[test]
fn listener_observes_progress_to_completion() {
    let mut session = ConvertSession::new(fast_options());
    session
        .add_files(["1-a.mp4", "2-b.mp4"])
        .expect("add_files should succeed");

    let recorder = Arc::new(RecordingListener::default());
    let context = RunContext::new().with_listener(recorder.clone());
    session
        .run(&mut ScriptedOpener::new(), &context)
        .expect("run should succeed");

    let snapshots = recorder.snapshots.lock().unwrap();
    assert!(!snapshots.is_empty(), "Expected progress callbacks");

    // Every snapshot carries the full queue.
    for snapshot in snapshots.iter() {
        assert_eq!(snapshot.items.len(), 2);
    }

    // Percent never regresses on a clean run and ends at 100.
    for window in snapshots.windows(2) {
        assert!(window[1].percent >= window[0].percent);
    }

    let last = snapshots.last().unwrap();
    assert_eq!(last.percent, 100);
    assert_eq!(last.state, RunState::Completed);
    assert_eq!(last.message, "PDF generated successfully!");

    assert!(
        snapshots
            .iter()
            .any(|snapshot| snapshot.message.contains("Processing 1-a.mp4")),
        "Expected a per-file processing message",
    );
}

// ── Cancellation ───────────────────────────────────────────────────

#[test]
fn cancellation_sweeps_remaining_files() {
    let mut session = ConvertSession::new(fast_options());
    session
        .add_files(["1-a.mp4", "2-b.mp4", "3-c.mp4"])
        .expect("add_files should succeed");

    let context = RunContext::new();
    let listener = CancelOnMessage {
        token: context.cancellation_token(),
        needle: "Processing 2-b",
    };
    let context = context.with_listener(Arc::new(listener));

    let mut opener = ScriptedOpener::new();
    let outcome = session
        .run(&mut opener, &context)
        .expect("cancellation is not an error");

    assert!(matches!(outcome, RunOutcome::Cancelled));
    assert_eq!(session.state(), RunState::Cancelled);

    let snapshot = session.snapshot();
    assert_eq!(snapshot.percent, 0);
    assert_eq!(snapshot.message, "Conversion cancelled.");

    // The finished file keeps its result; the in-flight and queued files are
    // swept to cancelled without an error message.
    let items = session.items();
    let done = item_named(&items, "1-a.mp4");
    assert_eq!(done.status, ItemStatus::Completed);
    assert_eq!(done.frames_captured, 3);

    for name in ["2-b.mp4", "3-c.mp4"] {
        let item = item_named(&items, name);
        assert_eq!(item.status, ItemStatus::Cancelled);
        assert_eq!(item.error, None);
    }

    // The third file was never reached.
    assert_eq!(opener.opened, vec!["1-a.mp4", "2-b.mp4"]);
}

#[test]
fn pre_cancelled_context_stops_before_any_file() {
    let mut session = ConvertSession::new(fast_options());
    session
        .add_files(["1-a.mp4", "2-b.mp4"])
        .expect("add_files should succeed");

    let context = RunContext::new();
    context.cancellation_token().cancel();

    let mut opener = ScriptedOpener::new();
    let outcome = session
        .run(&mut opener, &context)
        .expect("cancellation is not an error");

    assert!(matches!(outcome, RunOutcome::Cancelled));
    assert!(opener.opened.is_empty());
    for item in session.items() {
        assert_eq!(item.status, ItemStatus::Cancelled);
        assert_eq!(item.error, None);
    }
}
