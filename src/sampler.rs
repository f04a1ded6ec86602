//! Fixed-interval frame sampling.
//!
//! The sampler walks a single [`FrameSource`] and captures one frame at time
//! zero plus one at every multiple of the sampling interval strictly below
//! the source duration. Each captured frame is validated, encoded to JPEG,
//! and handed back with a capture index; a short pause between captures keeps
//! sustained decoding from monopolising the machine.
//!
//! Sampling is all or nothing per file: an invalid duration, a decode
//! failure, or a zero-dimension frame fails the whole file with a media
//! error, and the caller decides whether to continue with other files.

use std::io::Cursor;
use std::thread;
use std::time::Duration;

use image::{ExtendedColorType, ImageEncoder, RgbImage, codecs::jpeg::JpegEncoder};

use crate::config::ConvertOptions;
use crate::error::FramebindError;
use crate::progress::CancellationToken;
use crate::source::FrameSource;

/// Default interval between sampled frames.
pub const DEFAULT_SAMPLING_INTERVAL: Duration = Duration::from_secs(10);

/// Default pause inserted after each frame capture.
pub const DEFAULT_FRAME_PAUSE: Duration = Duration::from_millis(50);

/// Default JPEG quality for encoded frames.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// A single captured frame, encoded and ready for composition.
#[derive(Clone)]
pub struct Frame {
    /// JPEG-encoded image data.
    pub data: Vec<u8>,
    /// Capture index, monotonically increasing across a whole run.
    pub index: u64,
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("index", &self.index)
            .field("size_bytes", &self.data.len())
            .finish()
    }
}

/// Computes the timestamps to sample from a source of the given duration.
///
/// The schedule is `0, interval, 2 * interval, ...` for every multiple
/// strictly below `duration`. A source exactly `n` intervals long therefore
/// yields `n` frames, not `n + 1`, since the final timestamp would sit at the
/// very end of the stream where no frame is guaranteed to exist. Returns an
/// empty schedule when either argument is zero.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use framebind::sampling_schedule;
///
/// let schedule = sampling_schedule(Duration::from_secs(25), Duration::from_secs(10));
/// assert_eq!(
///     schedule,
///     vec![
///         Duration::ZERO,
///         Duration::from_secs(10),
///         Duration::from_secs(20),
///     ],
/// );
/// ```
pub fn sampling_schedule(duration: Duration, interval: Duration) -> Vec<Duration> {
    if duration.is_zero() || interval.is_zero() {
        return Vec::new();
    }

    let mut schedule = vec![Duration::ZERO];
    let mut timestamp = interval;
    while timestamp < duration {
        schedule.push(timestamp);
        timestamp += interval;
    }
    schedule
}

/// Captures every scheduled frame from `source`.
///
/// Validates the source duration, computes the sampling schedule, and then
/// captures, validates, and JPEG-encodes one frame per scheduled timestamp.
/// Frames are numbered from `first_index` so that a run accumulating frames
/// from several files keeps a single monotonic capture index.
///
/// `on_frame` is invoked with `(captured, expected)` once the schedule is
/// known (with `captured == 0`) and again after every successful capture.
///
/// The cancellation token is checked before each capture; a pending request
/// stops the file with [`FramebindError::Cancelled`] and discards the frames
/// captured so far.
///
/// # Errors
///
/// Returns [`FramebindError::InvalidInterval`] for a zero sampling interval,
/// [`FramebindError::InvalidDuration`] for an unknown or zero duration,
/// [`FramebindError::ZeroDimensionFrame`] when a capture rasterizes to zero
/// pixels, and any media error propagated from the source. All of these fail
/// the whole file.
pub fn capture_frames<F>(
    source: &mut dyn FrameSource,
    display_name: &str,
    options: &ConvertOptions,
    token: &CancellationToken,
    first_index: u64,
    on_frame: &mut F,
) -> Result<Vec<Frame>, FramebindError>
where
    F: FnMut(u64, u64),
{
    if options.sampling_interval.is_zero() {
        return Err(FramebindError::InvalidInterval);
    }

    let duration = source
        .duration()
        .ok_or_else(|| FramebindError::InvalidDuration {
            name: display_name.to_string(),
            reason: "duration is unknown or not positive".to_string(),
        })?;
    if duration.is_zero() {
        return Err(FramebindError::InvalidDuration {
            name: display_name.to_string(),
            reason: "duration is zero".to_string(),
        });
    }

    let schedule = sampling_schedule(duration, options.sampling_interval);
    let expected = schedule.len() as u64;
    on_frame(0, expected);
    log::debug!(
        "Sampling {display_name}: {expected} frame(s) over {:.2}s",
        duration.as_secs_f64(),
    );

    let mut frames = Vec::with_capacity(schedule.len());
    for (position, &target) in schedule.iter().enumerate() {
        if token.is_cancelled() {
            return Err(FramebindError::Cancelled);
        }

        let image = source.capture_at(target)?;
        let raster = image.into_rgb8();
        if raster.width() == 0 || raster.height() == 0 {
            return Err(FramebindError::ZeroDimensionFrame {
                name: display_name.to_string(),
                timestamp: target,
            });
        }

        let data = encode_frame(&raster, options.jpeg_quality)?;
        frames.push(Frame {
            data,
            index: first_index + position as u64,
        });
        on_frame(frames.len() as u64, expected);
        log::debug!(
            "Captured frame {}/{expected} from {display_name} at {:.2}s",
            position + 1,
            target.as_secs_f64(),
        );

        if !options.frame_pause.is_zero() {
            thread::sleep(options.frame_pause);
        }
    }

    Ok(frames)
}

fn encode_frame(raster: &RgbImage, quality: u8) -> Result<Vec<u8>, FramebindError> {
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut bytes), quality);
    encoder.write_image(
        raster.as_raw(),
        raster.width(),
        raster.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(bytes)
}
