//! FFmpeg-backed frame sources.
//!
//! This module provides [`VideoClip`], the production [`FrameSource`] that
//! decodes frames from a video file, and [`VideoOpener`], the matching
//! [`SourceOpener`] a [`ConvertSession`](crate::ConvertSession) uses to open
//! queued files. Captured frames are returned as [`image::DynamicImage`]
//! values in RGB8 format.

use std::path::Path;
use std::time::Duration;

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    format,
    format::Pixel,
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage};

use crate::conversion;
use crate::error::FramebindError;
use crate::source::{FrameSource, SourceFile, SourceOpener};

/// A video file opened for frame capture.
///
/// Each capture seeks to the nearest keyframe before the target timestamp,
/// creates a fresh decoder, and decodes forward until the requested time is
/// reached. The demuxer is released when the clip is dropped.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
///
/// use framebind::{FrameSource, VideoClip};
///
/// let mut clip = VideoClip::open("lesson.mp4")?;
/// if let Some(duration) = clip.duration() {
///     println!("{:.1}s of video", duration.as_secs_f64());
/// }
/// let frame = clip.capture_at(Duration::from_secs(10))?;
/// frame.save("frame.png").ok();
/// # Ok::<(), framebind::FramebindError>(())
/// ```
pub struct VideoClip {
    input_context: format::context::Input,
    video_stream_index: usize,
    time_base: Rational,
    duration: Option<Duration>,
}

impl VideoClip {
    /// Opens a video file for frame capture.
    ///
    /// # Errors
    ///
    /// Returns [`FramebindError::FileOpen`] if the file cannot be opened or
    /// recognised as a media file, and [`FramebindError::NoVideoStream`] if
    /// it contains no video stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FramebindError> {
        let path = path.as_ref();

        ffmpeg_next::init().map_err(|error| FramebindError::FileOpen {
            path: path.to_path_buf(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context = format::input(&path).map_err(|error| FramebindError::FileOpen {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(FramebindError::NoVideoStream)?;
        let video_stream_index = stream.index();
        let time_base = stream.time_base();

        let duration_micros = input_context.duration();
        let duration = (duration_micros > 0).then(|| Duration::from_micros(duration_micros as u64));

        log::info!(
            "Opened video file: {} (format={}, video_stream={}, duration={:.2}s)",
            path.display(),
            input_context.format().name(),
            video_stream_index,
            duration.unwrap_or_default().as_secs_f64(),
        );

        Ok(Self {
            input_context,
            video_stream_index,
            time_base,
            duration,
        })
    }

    /// Seeks to `timestamp` and decodes the first displayable frame at or
    /// after it.
    ///
    /// When the container's duration overstates the video stream and no
    /// frame exists at the target, the last decodable frame is returned
    /// instead, so timestamps just below the reported duration still resolve.
    fn decode_frame_at(&mut self, timestamp: Duration) -> Result<DynamicImage, FramebindError> {
        let seek_target = conversion::duration_to_seek_timestamp(timestamp);
        self.input_context.seek(seek_target, ..seek_target)?;

        let stream = self
            .input_context
            .stream(self.video_stream_index)
            .ok_or(FramebindError::NoVideoStream)?;
        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let mut decoder = decoder_context.decoder().video()?;

        let mut scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ScalingFlags::BILINEAR,
        )?;

        let target_pts = conversion::duration_to_stream_timestamp(timestamp, self.time_base);
        let mut decoded_frame = VideoFrame::empty();
        let mut saw_frame = false;

        for (stream, packet) in self.input_context.packets() {
            if stream.index() != self.video_stream_index {
                continue;
            }
            decoder.send_packet(&packet)?;
            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                saw_frame = true;
                if decoded_frame.pts().unwrap_or(0) >= target_pts {
                    return convert_frame_to_image(&decoded_frame, &mut scaler);
                }
            }
        }

        // Flush any frames the decoder is still holding.
        decoder.send_eof()?;
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            saw_frame = true;
            if decoded_frame.pts().unwrap_or(0) >= target_pts {
                return convert_frame_to_image(&decoded_frame, &mut scaler);
            }
        }

        if saw_frame {
            // The stream ended short of the target; fall back to the last
            // frame it produced.
            return convert_frame_to_image(&decoded_frame, &mut scaler);
        }

        Err(FramebindError::VideoDecodeError(format!(
            "No frame could be decoded at {:.2}s",
            timestamp.as_secs_f64(),
        )))
    }
}

impl FrameSource for VideoClip {
    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn capture_at(&mut self, timestamp: Duration) -> Result<DynamicImage, FramebindError> {
        self.decode_frame_at(timestamp)
    }
}

impl std::fmt::Debug for VideoClip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoClip")
            .field("video_stream_index", &self.video_stream_index)
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}

/// The production [`SourceOpener`]: opens queued files as [`VideoClip`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct VideoOpener;

impl SourceOpener for VideoOpener {
    fn open(&mut self, file: &SourceFile) -> Result<Box<dyn FrameSource>, FramebindError> {
        Ok(Box::new(VideoClip::open(&file.path)?))
    }
}

fn convert_frame_to_image(
    frame: &VideoFrame,
    scaler: &mut ScalingContext,
) -> Result<DynamicImage, FramebindError> {
    let mut rgb_frame = VideoFrame::empty();
    scaler.run(frame, &mut rgb_frame)?;

    let width = rgb_frame.width();
    let height = rgb_frame.height();
    let buffer = conversion::frame_to_rgb_buffer(&rgb_frame, width, height);

    let image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        FramebindError::VideoDecodeError(
            "Failed to construct RGB image from decoded frame data".to_string(),
        )
    })?;
    Ok(DynamicImage::ImageRgb8(image))
}
