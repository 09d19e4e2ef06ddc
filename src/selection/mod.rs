//! Keyframe selection: threshold calibration followed by a sampling pass.

mod calibration;
mod preprocess;
mod progress;
mod sampler;
pub mod types;

pub use calibration::{calibrate, consecutive_scores, probe_points, probe_scores};
pub use preprocess::{Preprocessor, Thumbnail};
pub use progress::{ProgressFn, ProgressReporter};
pub use sampler::{sample, SamplingPlan};
pub use types::{ExtractionResult, Keyframe};

use crate::config::ExtractorConfig;
use crate::error::{ExtractError, ExtractResult};
use crate::output::{FrameSink, JpegDirSink};
use crate::source::{FrameSource, VideoBackend};
use std::path::Path;

/// Selects keyframes from videos opened through a [`VideoBackend`]
///
/// The configuration is fixed at construction. Each call opens its own
/// sources, so one selector can serve several threads as long as the backend
/// is shareable.
pub struct KeyframeSelector<B> {
    backend: B,
    config: ExtractorConfig,
    preprocessor: Preprocessor,
}

impl<B: VideoBackend> KeyframeSelector<B> {
    pub fn new(backend: B, config: ExtractorConfig) -> Self {
        let preprocessor = Preprocessor::new(config.thumbnail_size);
        Self {
            backend,
            config,
            preprocessor,
        }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract keyframes into `output_dir` as JPEG files
    pub fn extract_to_dir(
        &self,
        video_path: &Path,
        output_dir: &Path,
        capture_interval: f64,
        max_frames: usize,
        progress: Option<&mut ProgressFn<'_>>,
    ) -> ExtractResult<ExtractionResult> {
        let mut sink = JpegDirSink::new(output_dir, self.config.jpeg_quality);
        self.extract(video_path, &mut sink, capture_interval, max_frames, progress)
    }

    /// Extract keyframes, handing every kept frame to `sink`
    ///
    /// # Arguments
    /// * `capture_interval` - Seconds between sampled positions, must be > 0
    /// * `max_frames` - Upper bound on kept frames, must be >= 1
    /// * `progress` - Receives percent complete; its failures never abort extraction
    pub fn extract<K: FrameSink>(
        &self,
        video_path: &Path,
        sink: &mut K,
        capture_interval: f64,
        max_frames: usize,
        progress: Option<&mut ProgressFn<'_>>,
    ) -> ExtractResult<ExtractionResult> {
        if !capture_interval.is_finite() || capture_interval <= 0.0 {
            return Err(ExtractError::InvalidParameter(format!(
                "capture interval must be a positive number of seconds, got {capture_interval}"
            )));
        }
        if max_frames == 0 {
            return Err(ExtractError::InvalidParameter(
                "max frames must be at least 1".to_string(),
            ));
        }

        tracing::info!(
            "Extracting keyframes from {} every {:.2}s (max {})",
            video_path.display(),
            capture_interval,
            max_frames
        );

        let threshold = match self.config.threshold {
            Some(threshold) => {
                let threshold = self.config.calibration.clamp(threshold);
                tracing::info!("Using fixed threshold {:.4}", threshold);
                threshold
            }
            None => {
                let threshold = self.calibrate_video(video_path, capture_interval)?;
                tracing::info!("Calibrated threshold {:.4}", threshold);
                threshold
            }
        };

        let mut source = self.open(video_path)?;
        let metadata = source.metadata();
        tracing::info!(
            "Video: {}x{}, {:.2}s at {:.2} fps (~{} frames)",
            metadata.width,
            metadata.height,
            metadata.duration,
            metadata.fps,
            metadata.frame_count
        );

        let plan = SamplingPlan {
            capture_interval,
            max_frames,
            force_interval: self.config.force_interval.filter(|f| f.is_finite() && *f > 0.0),
            verbose: self.config.debug,
        };
        let mut reporter = ProgressReporter::new(progress, self.config.progress.clone());

        let result = sample(
            video_path,
            &mut source,
            sink,
            threshold,
            &plan,
            &self.preprocessor,
            &mut reporter,
        )?;

        tracing::info!(
            "Kept {} keyframes from {}",
            result.len(),
            video_path.display()
        );
        Ok(result)
    }

    /// Derive a difference threshold from probe frames spread over the video
    ///
    /// Uses a source of its own, released before sampling starts.
    pub fn calibrate_video(&self, video_path: &Path, capture_interval: f64) -> ExtractResult<f32> {
        let mut source = self.open(video_path)?;
        let metadata = source.metadata();

        let points = match metadata.effective_duration() {
            Some(duration) if duration >= capture_interval => {
                probe_points(duration, self.config.calibration.probe_count)
            }
            _ => Vec::new(),
        };

        let scores = probe_scores(&mut source, &points, &self.preprocessor);
        Ok(calibrate(&scores, &self.config.calibration))
    }

    fn open(&self, video_path: &Path) -> ExtractResult<B::Source> {
        self.backend
            .open(video_path)
            .map_err(|e| ExtractError::unreadable(video_path, &e))
    }
}
