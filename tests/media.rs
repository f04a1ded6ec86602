//! Media-backed capture tests.
//!
//! These tests exercise [`VideoClip`] against real files. Tests that need a
//! media fixture check for `tests/fixtures/sample_video.mp4` and return early
//! when it is absent, so the suite passes on machines without fixtures.

use std::{path::Path, time::Duration};

use framebind::{
    ConvertOptions, ConvertSession, FrameSource, RunContext, RunOutcome, SourceFile, SourceOpener,
    VideoClip, VideoOpener, sampling_schedule,
};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

// ── Open failures (no fixture needed) ───────────────────────────────────────

#[test]
fn open_nonexistent_file() {
    let result = VideoClip::open("this_file_does_not_exist.mp4");
    let error = result.expect_err("Expected an error for a nonexistent file");
    assert!(error.is_media_error());

    let error_message = error.to_string();
    assert!(
        error_message.contains("Failed to open media file"),
        "Error message should mention file open failure: {error_message}",
    );
}

#[test]
fn open_invalid_file() {
    // Create a temporary file with garbage content.
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid_file_path, b"this is not a media file")
        .expect("Failed to write invalid file");

    let result = VideoClip::open(&invalid_file_path);
    assert!(result.is_err(), "Expected error for invalid media file");
}

#[test]
fn opener_reports_open_failures() {
    let file = SourceFile {
        id: 1,
        path: "missing/clip.mp4".into(),
        display_name: "clip.mp4".to_string(),
    };

    let result = VideoOpener.open(&file);
    assert!(result.is_err(), "Expected error for a missing queued file");
}

// ── Fixture-backed capture (skipped when the fixture is absent) ─────────────

#[test]
fn capture_first_frame_from_fixture() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let mut clip = VideoClip::open(SAMPLE_VIDEO).expect("Failed to open test video");
    let duration = clip.duration().expect("Fixture should report a duration");
    assert!(duration > Duration::ZERO);

    let frame = clip
        .capture_at(Duration::ZERO)
        .expect("Failed to capture the first frame");
    assert!(frame.width() > 0);
    assert!(frame.height() > 0);
}

#[test]
fn captures_resolve_near_the_end_of_the_stream() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let mut clip = VideoClip::open(SAMPLE_VIDEO).expect("Failed to open test video");
    let duration = clip.duration().expect("Fixture should report a duration");

    // Container durations often overstate the video stream slightly; a
    // timestamp just below the reported duration must still yield a frame.
    let near_end = duration.saturating_sub(Duration::from_millis(100));
    let frame = clip
        .capture_at(near_end)
        .expect("Failed to capture near the end of the stream");
    assert!(frame.width() > 0);
}

#[test]
fn end_to_end_pdf_from_fixture() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let clip = VideoClip::open(SAMPLE_VIDEO).expect("Failed to open test video");
    let duration = clip.duration().expect("Fixture should report a duration");
    drop(clip);

    let interval = Duration::from_secs(2);
    let expected_pages = sampling_schedule(duration, interval).len();

    let options = ConvertOptions::new()
        .with_sampling_interval(interval)
        .with_frame_pause(Duration::ZERO);
    let mut session = ConvertSession::new(options);
    let report = session
        .add_files([SAMPLE_VIDEO])
        .expect("Failed to queue the fixture");
    assert_eq!(report.added, 1);

    let outcome = session
        .run(&mut VideoOpener, &RunContext::new())
        .expect("Conversion run failed");

    match outcome {
        RunOutcome::Completed(document) => {
            assert_eq!(document.page_count(), expected_pages);
            assert!(document.bytes().starts_with(b"%PDF"));
        }
        other => panic!("Expected a completed run, got: {other:?}"),
    }
}
