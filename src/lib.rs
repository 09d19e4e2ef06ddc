//! Keyframe extraction for lecture and talk videos.
//!
//! A [`KeyframeSelector`] calibrates a difference threshold on probe frames,
//! then walks the video at a fixed interval and keeps frames that differ
//! enough from the last kept one. Decoding is delegated to a [`VideoBackend`]
//! (the `ffmpeg` binaries by default) and encoding to a [`FrameSink`].

pub mod config;
pub mod error;
pub mod output;
pub mod selection;
pub mod source;

pub use config::{CalibrationConfig, ExtractorConfig, ProgressConfig};
pub use error::{ExtractError, ExtractResult};
pub use output::{write_manifest, FrameSink, JpegDirSink};
pub use selection::{ExtractionResult, Keyframe, KeyframeSelector, ProgressFn};
pub use source::{FfmpegBackend, Frame, FrameSource, VideoBackend, VideoMetadata};
