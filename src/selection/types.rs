use crate::output::format_timestamp;
use crate::source::VideoMetadata;
use std::path::PathBuf;

/// A kept frame as recorded in the extraction result
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    /// Position in seconds
    pub timestamp: f64,
    pub path: PathBuf,
    /// Frame number estimated from the nominal frame rate
    pub frame_number: u64,
    /// Difference to the previously kept frame, 0.0 for the first one
    pub difference: f32,
}

impl Keyframe {
    pub fn timestamp_formatted(&self) -> String {
        format_timestamp(self.timestamp)
    }
}

/// Outcome of one extraction call, keyframes in increasing timestamp order
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub keyframes: Vec<Keyframe>,
    /// Threshold the sampling pass compared against
    pub threshold: f32,
    pub metadata: VideoMetadata,
}

impl ExtractionResult {
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn timestamps(&self) -> Vec<f64> {
        self.keyframes.iter().map(|k| k.timestamp).collect()
    }
}
