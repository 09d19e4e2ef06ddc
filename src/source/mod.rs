mod ffmpeg;

pub use ffmpeg::{FfmpegBackend, FfmpegSource};

use anyhow::Result;
use image::RgbImage;
use std::path::Path;

/// Frame rate assumed when the container does not report one
pub const DEFAULT_FPS: f64 = 30.0;

/// Best-effort stream metadata
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoMetadata {
    /// Duration in seconds, 0.0 when unknown
    pub duration: f64,
    /// Nominal frame rate
    pub fps: f64,
    /// Total frame count. May be an estimate, 0 when unknown
    pub frame_count: u64,
    pub width: u32,
    pub height: u32,
}

impl VideoMetadata {
    pub fn has_duration(&self) -> bool {
        self.duration.is_finite() && self.duration > 0.0
    }

    /// Duration, falling back to `frame_count / fps` when the container has none
    pub fn effective_duration(&self) -> Option<f64> {
        if self.has_duration() {
            Some(self.duration)
        } else if self.frame_count > 0 && self.fps > 0.0 {
            Some(self.frame_count as f64 / self.fps)
        } else {
            None
        }
    }

    /// Frame number closest to `timestamp`
    pub fn frame_number_at(&self, timestamp: f64) -> u64 {
        (timestamp * self.fps).round().max(0.0) as u64
    }
}

/// A decoded frame at a specific position in the stream
#[derive(Debug, Clone)]
pub struct Frame {
    /// Position in seconds
    pub timestamp: f64,
    pub image: RgbImage,
}

impl Frame {
    pub fn new(timestamp: f64, image: RgbImage) -> Self {
        Self { timestamp, image }
    }
}

/// Trait for opened video streams
///
/// A source is forward-only: once a frame at `t` has been served, requests for
/// earlier positions are served from `t` onwards. Dropping the source releases
/// every decoder resource it holds.
pub trait FrameSource {
    /// Stream metadata as reported by the container
    fn metadata(&self) -> VideoMetadata;

    /// Decode the first frame at or after `timestamp`
    ///
    /// # Returns
    /// * `Ok(Some(frame))` - the decoded frame
    /// * `Ok(None)` - end of stream
    /// * `Err(_)` - the decoder failed at this position
    fn frame_at(&mut self, timestamp: f64) -> Result<Option<Frame>>;
}

/// Trait for decoding backends
/// Allows swapping the ffmpeg subprocess decoder for in-process or synthetic decoders
pub trait VideoBackend {
    type Source: FrameSource;

    /// Open a video for decoding
    fn open(&self, path: &Path) -> Result<Self::Source>;
}

impl<B: VideoBackend + ?Sized> VideoBackend for &B {
    type Source = B::Source;

    fn open(&self, path: &Path) -> Result<Self::Source> {
        (**self).open(path)
    }
}
