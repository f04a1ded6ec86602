//! Page composition of captured frames into a single PDF document.
//!
//! Every frame becomes exactly one page. Page orientation follows the frame:
//! a frame wider than tall gets a landscape page, otherwise portrait. The
//! frame is scaled down (never up) to fit within the page margins and
//! centered in the remaining area, with one image pixel mapping to one PDF
//! point at scale 1.
//!
//! A frame that cannot be decoded at composition time does not abort the
//! document: it becomes a placeholder page with a short textual notice, in
//! the same orientation as the page before it. Only an empty frame list or a
//! failure to assemble the document itself is an error.

use std::fmt;
use std::path::Path;

use chrono::Local;
use image::DynamicImage;
use printpdf::{
    BuiltinFont, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, IndirectFontRef,
    Mm, PdfDocument, PdfDocumentReference, PdfLayerReference, Pt, Px,
};

use crate::error::FramebindError;
use crate::sampler::Frame;

/// A4 page width in PDF points, portrait orientation.
pub const A4_WIDTH_PT: f32 = 595.28;

/// A4 page height in PDF points, portrait orientation.
pub const A4_HEIGHT_PT: f32 = 841.89;

/// Default margin in PDF points applied on all four page sides.
pub const PAGE_MARGIN_PT: f32 = 30.0;

const DOCUMENT_TITLE: &str = "MP4 Frame Compilation";
const NOTE_FONT_SIZE: f32 = 12.0;

/// Orientation of a single page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOrientation {
    /// Taller than wide. Square frames also get portrait pages.
    Portrait,
    /// Wider than tall.
    Landscape,
}

/// Picks the page orientation for a frame of the given pixel dimensions.
pub fn orientation_for(width: u32, height: u32) -> PageOrientation {
    if width > height {
        PageOrientation::Landscape
    } else {
        PageOrientation::Portrait
    }
}

/// Page dimensions and margin used for composition.
///
/// `width_pt` and `height_pt` describe the page in portrait orientation;
/// landscape pages swap them. Defaults to A4 with a 30 point margin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Page width in PDF points, portrait orientation.
    pub width_pt: f32,
    /// Page height in PDF points, portrait orientation.
    pub height_pt: f32,
    /// Margin in PDF points applied on all four sides.
    pub margin_pt: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

impl PageGeometry {
    /// A4 geometry with the default margin.
    pub fn a4() -> Self {
        Self {
            width_pt: A4_WIDTH_PT,
            height_pt: A4_HEIGHT_PT,
            margin_pt: PAGE_MARGIN_PT,
        }
    }

    /// Page size in points for the given orientation, as `(width, height)`.
    pub fn oriented_size(&self, orientation: PageOrientation) -> (f32, f32) {
        match orientation {
            PageOrientation::Portrait => (self.width_pt, self.height_pt),
            PageOrientation::Landscape => (self.height_pt, self.width_pt),
        }
    }
}

/// Where and how large a frame lands on its page.
///
/// Coordinates are in PDF points from the bottom-left page corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagePlacement {
    /// Orientation of the page the frame is placed on.
    pub orientation: PageOrientation,
    /// Uniform scale factor applied to the frame, at most 1.
    pub scale: f32,
    /// Left edge of the placed frame.
    pub x_pt: f32,
    /// Bottom edge of the placed frame.
    pub y_pt: f32,
    /// Width of the placed frame.
    pub width_pt: f32,
    /// Height of the placed frame.
    pub height_pt: f32,
}

/// Computes the placement of a `width` by `height` pixel frame on a page.
///
/// One pixel maps to one point before scaling. The frame is scaled by
/// `min(available_width / width, available_height / height, 1)`, so frames
/// that already fit within the margins are never enlarged, and the scaled
/// frame is centered in the area inside the margins.
///
/// # Example
///
/// ```
/// use framebind::{PageGeometry, orientation_for, place_frame};
///
/// let geometry = PageGeometry::a4();
/// let placement = place_frame(100, 50, &geometry, orientation_for(100, 50));
/// assert_eq!(placement.scale, 1.0);
/// ```
pub fn place_frame(
    width: u32,
    height: u32,
    geometry: &PageGeometry,
    orientation: PageOrientation,
) -> PagePlacement {
    let (page_width, page_height) = geometry.oriented_size(orientation);
    let available_width = (page_width - 2.0 * geometry.margin_pt).max(1.0);
    let available_height = (page_height - 2.0 * geometry.margin_pt).max(1.0);

    let scale = (available_width / width as f32)
        .min(available_height / height as f32)
        .min(1.0);
    let scaled_width = width as f32 * scale;
    let scaled_height = height as f32 * scale;

    PagePlacement {
        orientation,
        scale,
        x_pt: geometry.margin_pt + (available_width - scaled_width) / 2.0,
        y_pt: geometry.margin_pt + (available_height - scaled_height) / 2.0,
        width_pt: scaled_width,
        height_pt: scaled_height,
    }
}

/// A finished PDF document held in memory.
pub struct ComposedDocument {
    bytes: Vec<u8>,
    page_count: usize,
}

impl ComposedDocument {
    /// The serialized PDF bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the document, returning the serialized PDF bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Number of pages, one per input frame.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Writes the document to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FramebindError::IoError`] when the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), FramebindError> {
        std::fs::write(&path, &self.bytes)?;
        log::info!("Saved document to {}", path.as_ref().display());
        Ok(())
    }
}

impl fmt::Debug for ComposedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposedDocument")
            .field("page_count", &self.page_count)
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

/// Default output file name, stamped with today's date.
///
/// For example `mp4_frames_compilation_2026-08-21.pdf`.
pub fn default_output_name() -> String {
    format!(
        "mp4_frames_compilation_{}.pdf",
        Local::now().format("%Y-%m-%d"),
    )
}

/// Composes `frames` into a single PDF document, one frame per page.
///
/// The document's first page takes its orientation from the first frame;
/// when the first frame cannot be decoded the document starts in portrait.
/// Undecodable or zero-dimension frames become placeholder pages with a
/// textual notice, reusing the orientation of the page before them.
///
/// # Errors
///
/// Returns [`FramebindError::EmptyComposition`] when `frames` is empty and
/// [`FramebindError::CompositionError`] when the document itself cannot be
/// assembled or finalized. Per-frame decode failures are recovered with
/// placeholder pages and do not error.
pub fn compose_document(
    frames: &[Frame],
    geometry: &PageGeometry,
) -> Result<ComposedDocument, FramebindError> {
    if frames.is_empty() {
        return Err(FramebindError::EmptyComposition);
    }

    // The first frame decides the orientation the document opens with, so it
    // is decoded ahead of the page loop and handed back in via the option.
    let first_raster = image::load_from_memory(&frames[0].data).map(DynamicImage::into_rgb8);
    let initial_orientation = match &first_raster {
        Ok(raster) => orientation_for(raster.width(), raster.height()),
        Err(error) => {
            log::warn!("Could not read the first frame's dimensions, starting in portrait: {error}");
            PageOrientation::Portrait
        }
    };
    let mut pending_first = Some(first_raster);

    let (initial_width, initial_height) = geometry.oriented_size(initial_orientation);
    let (document, first_page, first_layer) = PdfDocument::new(
        DOCUMENT_TITLE,
        Mm::from(Pt(initial_width)),
        Mm::from(Pt(initial_height)),
        "Layer 1",
    );
    let font = document
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|error| FramebindError::CompositionError(error.to_string()))?;

    let mut first_page_layer = Some(document.get_page(first_page).get_layer(first_layer));
    let mut take_layer = |orientation: PageOrientation| -> PdfLayerReference {
        match first_page_layer.take() {
            Some(layer) => layer,
            None => add_oriented_page(&document, geometry, orientation),
        }
    };
    let mut last_orientation = initial_orientation;

    for (position, frame) in frames.iter().enumerate() {
        let decoded = match pending_first.take() {
            Some(first) => first,
            None => image::load_from_memory(&frame.data).map(DynamicImage::into_rgb8),
        };

        match decoded {
            Ok(raster) if raster.width() > 0 && raster.height() > 0 => {
                let orientation = orientation_for(raster.width(), raster.height());
                // The first page was sized before the loop and keeps that
                // size even in the unlikely case it disagrees with the frame.
                let page_orientation = if position == 0 {
                    initial_orientation
                } else {
                    orientation
                };
                let layer = take_layer(page_orientation);
                let placement =
                    place_frame(raster.width(), raster.height(), geometry, page_orientation);

                let xobject = ImageXObject {
                    width: Px(raster.width() as usize),
                    height: Px(raster.height() as usize),
                    color_space: ColorSpace::Rgb,
                    bits_per_component: ColorBits::Bit8,
                    interpolate: false,
                    image_data: raster.into_raw(),
                    image_filter: None,
                    smask: None,
                    clipping_bbox: None,
                };
                Image::from(xobject).add_to_layer(
                    layer,
                    ImageTransform {
                        translate_x: Some(Mm::from(Pt(placement.x_pt))),
                        translate_y: Some(Mm::from(Pt(placement.y_pt))),
                        rotate: None,
                        scale_x: Some(placement.scale),
                        scale_y: Some(placement.scale),
                        // At 72 dpi one pixel is exactly one point.
                        dpi: Some(72.0),
                    },
                );
                last_orientation = page_orientation;
            }
            Ok(_) => {
                log::warn!(
                    "Frame {} has zero dimensions, adding a placeholder page",
                    position + 1,
                );
                let layer = take_layer(last_orientation);
                note_text(
                    &layer,
                    &font,
                    geometry,
                    last_orientation,
                    &format!("Skipped: frame {} (zero dimensions)", position + 1),
                );
            }
            Err(error) => {
                log::warn!(
                    "Frame {} could not be decoded for layout: {error}",
                    position + 1,
                );
                let layer = take_layer(last_orientation);
                note_text(
                    &layer,
                    &font,
                    geometry,
                    last_orientation,
                    &format!("Frame {} could not be rendered.", position + 1),
                );
            }
        }
    }

    let bytes = document.save_to_bytes().map_err(|error| {
        FramebindError::CompositionError(format!("Failed to finalize the document: {error}"))
    })?;
    log::info!(
        "Composed {} page(s) into a {} byte document",
        frames.len(),
        bytes.len(),
    );

    Ok(ComposedDocument {
        bytes,
        page_count: frames.len(),
    })
}

fn add_oriented_page(
    document: &PdfDocumentReference,
    geometry: &PageGeometry,
    orientation: PageOrientation,
) -> PdfLayerReference {
    let (width, height) = geometry.oriented_size(orientation);
    let (page, layer) = document.add_page(Mm::from(Pt(width)), Mm::from(Pt(height)), "Layer 1");
    document.get_page(page).get_layer(layer)
}

/// Writes a one-line notice near the top-left corner of a placeholder page.
fn note_text(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    geometry: &PageGeometry,
    orientation: PageOrientation,
    text: &str,
) {
    let (_, page_height) = geometry.oriented_size(orientation);
    layer.use_text(
        text,
        NOTE_FONT_SIZE,
        Mm::from(Pt(geometry.margin_pt)),
        Mm::from(Pt(page_height - geometry.margin_pt)),
        font,
    );
}
