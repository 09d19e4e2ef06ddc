use std::time::Duration;

/// Threshold calibration settings
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationConfig {
    /// Number of probe frames decoded across the timeline
    pub probe_count: usize,
    /// Multiplier applied to the median probe difference
    pub sensitivity: f32,
    pub min_threshold: f32,
    pub max_threshold: f32,
    /// Used when fewer than two probe comparisons are available
    pub default_threshold: f32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            probe_count: 11,
            sensitivity: 0.5,
            min_threshold: 0.05,
            max_threshold: 0.30,
            default_threshold: 0.10,
        }
    }
}

impl CalibrationConfig {
    pub fn clamp(&self, threshold: f32) -> f32 {
        if threshold.is_nan() {
            return self.default_threshold.clamp(self.min_threshold, self.max_threshold);
        }
        threshold.clamp(self.min_threshold, self.max_threshold)
    }
}

/// Progress callback cadence
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressConfig {
    /// Minimum wall-clock time between two reports
    pub min_interval: Duration,
    /// Minimum advance in percent between two reports
    pub min_step: f32,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(500),
            min_step: 1.0,
        }
    }
}

/// Read-only settings for a [`KeyframeSelector`](crate::KeyframeSelector)
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorConfig {
    /// Side length of the grayscale thumbnail used for difference scoring
    pub thumbnail_size: u32,
    pub calibration: CalibrationConfig,
    /// Skip calibration and use this threshold (clamped into the calibration band)
    pub threshold: Option<f32>,
    /// Keep a frame whenever this many seconds passed since the last kept one
    pub force_interval: Option<f64>,
    pub jpeg_quality: u8,
    pub progress: ProgressConfig,
    /// Log every scoring decision at info level
    pub debug: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            thumbnail_size: 64,
            calibration: CalibrationConfig::default(),
            threshold: None,
            force_interval: None,
            jpeg_quality: 95,
            progress: ProgressConfig::default(),
            debug: false,
        }
    }
}
