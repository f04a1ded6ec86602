//! Internal utility functions.
//!
//! Helpers for pixel-data copying and timestamp conversion shared by the
//! video decoding path.

use std::time::Duration;

use ffmpeg_next::{Rational, frame::Video as VideoFrame};
use ffmpeg_sys_next::AV_TIME_BASE;

/// Copy RGB24 pixel data from an FFmpeg video frame into a tightly-packed
/// buffer, dropping any per-row padding the decoder added.
pub(crate) fn frame_to_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    const BYTES_PER_PIXEL: usize = 3;

    let stride = video_frame.stride(0);
    let expected_stride = (width as usize) * BYTES_PER_PIXEL;
    let data = video_frame.data(0);

    if stride == expected_stride {
        data[..expected_stride * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
        buffer
    }
}

/// Convert a [`Duration`] to a timestamp in the stream's time base.
///
/// Suitable for comparing against decoded frame PTS values.
pub(crate) fn duration_to_stream_timestamp(duration: Duration, time_base: Rational) -> i64 {
    let seconds = duration.as_secs_f64();
    let numerator = time_base.numerator() as f64;
    let denominator = time_base.denominator() as f64;
    (seconds * denominator / numerator) as i64
}

/// Convert a [`Duration`] to a seek timestamp in [`AV_TIME_BASE`] units.
///
/// `input_context.seek()` (via `avformat_seek_file` with `stream_index = -1`)
/// expects timestamps in AV_TIME_BASE, not the stream time base.
pub(crate) fn duration_to_seek_timestamp(duration: Duration) -> i64 {
    (duration.as_secs_f64() * AV_TIME_BASE as f64) as i64
}
