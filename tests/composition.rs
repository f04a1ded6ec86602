//! Document composition integration tests.
//!
//! Frames are synthesized in memory with the `image` crate, so no fixture
//! files are needed.

use std::io::Cursor;

use framebind::{
    A4_HEIGHT_PT, A4_WIDTH_PT, Frame, FramebindError, PAGE_MARGIN_PT, PageGeometry,
    PageOrientation, compose_document, default_output_name, orientation_for, place_frame,
};
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage, codecs::jpeg::JpegEncoder};

fn jpeg_frame(width: u32, height: u32, index: u64) -> Frame {
    let raster = RgbImage::from_pixel(width, height, Rgb([90, 120, 30]));
    let mut data = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut data), 90);
    encoder
        .write_image(raster.as_raw(), width, height, ExtendedColorType::Rgb8)
        .expect("Failed to encode test frame");
    Frame { data, index }
}

fn garbage_frame(index: u64) -> Frame {
    Frame {
        data: b"this is not image data".to_vec(),
        index,
    }
}

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 0.01,
        "expected {expected}, got {actual}",
    );
}

// ── Orientation ────────────────────────────────────────────────────

#[test]
fn orientation_follows_frame_shape() {
    assert_eq!(orientation_for(800, 600), PageOrientation::Landscape);
    assert_eq!(orientation_for(600, 800), PageOrientation::Portrait);
}

#[test]
fn square_frames_get_portrait_pages() {
    assert_eq!(orientation_for(500, 500), PageOrientation::Portrait);
}

#[test]
fn oriented_size_swaps_dimensions_for_landscape() {
    let geometry = PageGeometry::a4();
    assert_eq!(
        geometry.oriented_size(PageOrientation::Portrait),
        (A4_WIDTH_PT, A4_HEIGHT_PT),
    );
    assert_eq!(
        geometry.oriented_size(PageOrientation::Landscape),
        (A4_HEIGHT_PT, A4_WIDTH_PT),
    );
}

// ── Placement ──────────────────────────────────────────────────────

#[test]
fn oversized_frame_is_scaled_to_fit_margins() {
    let geometry = PageGeometry::a4();
    let placement = place_frame(600, 800, &geometry, orientation_for(600, 800));

    let available_width = A4_WIDTH_PT - 2.0 * PAGE_MARGIN_PT;
    let available_height = A4_HEIGHT_PT - 2.0 * PAGE_MARGIN_PT;
    let expected_scale = (available_width / 600.0).min(available_height / 800.0);

    assert_eq!(placement.orientation, PageOrientation::Portrait);
    assert_close(placement.scale, expected_scale);
    // Width is the binding constraint, so the frame spans the full available
    // width and is centered vertically.
    assert_close(placement.x_pt, PAGE_MARGIN_PT);
    assert_close(placement.width_pt, available_width);
    assert_close(
        placement.y_pt,
        PAGE_MARGIN_PT + (available_height - 800.0 * expected_scale) / 2.0,
    );
}

#[test]
fn small_frame_is_never_enlarged() {
    let geometry = PageGeometry::a4();
    let placement = place_frame(100, 50, &geometry, orientation_for(100, 50));

    assert_eq!(placement.orientation, PageOrientation::Landscape);
    assert_eq!(placement.scale, 1.0);
    assert_close(placement.width_pt, 100.0);
    assert_close(placement.height_pt, 50.0);

    // Centered in the landscape page's available area.
    let available_width = A4_HEIGHT_PT - 2.0 * PAGE_MARGIN_PT;
    let available_height = A4_WIDTH_PT - 2.0 * PAGE_MARGIN_PT;
    assert_close(placement.x_pt, PAGE_MARGIN_PT + (available_width - 100.0) / 2.0);
    assert_close(placement.y_pt, PAGE_MARGIN_PT + (available_height - 50.0) / 2.0);
}

#[test]
fn landscape_frame_is_fitted_to_swapped_page() {
    let geometry = PageGeometry::a4();
    let placement = place_frame(1920, 1080, &geometry, orientation_for(1920, 1080));

    assert_eq!(placement.orientation, PageOrientation::Landscape);
    assert!(placement.scale < 1.0);
    assert!(placement.width_pt <= A4_HEIGHT_PT - 2.0 * PAGE_MARGIN_PT + 0.01);
    assert!(placement.height_pt <= A4_WIDTH_PT - 2.0 * PAGE_MARGIN_PT + 0.01);
}

// ── Composition ────────────────────────────────────────────────────

#[test]
fn composes_one_page_per_frame() {
    let frames = vec![jpeg_frame(600, 800, 0), jpeg_frame(800, 600, 1)];
    let document =
        compose_document(&frames, &PageGeometry::a4()).expect("composition should succeed");

    assert_eq!(document.page_count(), 2);
    assert_eq!(&document.bytes()[..4], b"%PDF");
}

#[test]
fn empty_input_is_a_composition_error() {
    let error = compose_document(&[], &PageGeometry::a4())
        .expect_err("empty input must not produce a document");

    assert!(error.is_composition_error());
    match error {
        FramebindError::EmptyComposition => {}
        other => panic!("Expected EmptyComposition, got: {other}"),
    }
}

#[test]
fn undecodable_frame_becomes_placeholder_page() {
    let frames = vec![
        jpeg_frame(640, 480, 0),
        garbage_frame(1),
        jpeg_frame(640, 480, 2),
    ];
    let document =
        compose_document(&frames, &PageGeometry::a4()).expect("placeholders must not fail");

    assert_eq!(document.page_count(), 3);
}

#[test]
fn document_survives_undecodable_first_frame() {
    // With no decodable first frame the document falls back to portrait.
    let frames = vec![garbage_frame(0)];
    let document =
        compose_document(&frames, &PageGeometry::a4()).expect("placeholders must not fail");

    assert_eq!(document.page_count(), 1);
    assert_eq!(&document.bytes()[..4], b"%PDF");
}

#[test]
fn save_writes_pdf_to_disk() {
    let frames = vec![jpeg_frame(320, 240, 0)];
    let document =
        compose_document(&frames, &PageGeometry::a4()).expect("composition should succeed");

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("out.pdf");
    document.save(&path).expect("save should succeed");

    let written = std::fs::read(&path).expect("Failed to read written file");
    assert_eq!(&written[..4], b"%PDF");
    assert_eq!(written.len(), document.bytes().len());
}

#[test]
fn default_output_name_is_dated() {
    let name = default_output_name();
    assert!(name.starts_with("mp4_frames_compilation_"));
    assert!(name.ends_with(".pdf"));

    let year = chrono::Local::now().format("%Y").to_string();
    assert!(name.contains(&year), "expected {year} in {name}");
}
