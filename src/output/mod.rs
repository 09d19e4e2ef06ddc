mod jpeg;
mod manifest;

pub use jpeg::JpegDirSink;
pub use manifest::write_manifest;

use crate::source::Frame;
use anyhow::Result;
use std::path::PathBuf;

/// Trait for keyframe destinations
pub trait FrameSink {
    /// Encode and store a kept frame
    ///
    /// `index` is the position the frame will take in the extraction result.
    /// Returns the location the frame was written to.
    fn write_keyframe(&mut self, index: usize, frame: &Frame) -> Result<PathBuf>;
}

impl<S: FrameSink + ?Sized> FrameSink for &mut S {
    fn write_keyframe(&mut self, index: usize, frame: &Frame) -> Result<PathBuf> {
        (**self).write_keyframe(index, frame)
    }
}

/// File name for a kept frame: `keyframe_HH-MM-SS-mmm_NNNN.jpg`
pub fn keyframe_filename(timestamp: f64, index: usize) -> String {
    format!("keyframe_{}_{:04}.jpg", format_timestamp_compact(timestamp), index)
}

/// `HH:MM:SS.mmm`
pub fn format_timestamp(seconds: f64) -> String {
    let (h, m, s, ms) = split_timestamp(seconds);
    format!("{h:02}:{m:02}:{s:02}.{ms:03}")
}

/// `HH-MM-SS-mmm`, safe for file names
pub fn format_timestamp_compact(seconds: f64) -> String {
    let (h, m, s, ms) = split_timestamp(seconds);
    format!("{h:02}-{m:02}-{s:02}-{ms:03}")
}

/// `HH:MM:SS`
pub fn format_duration(seconds: f64) -> String {
    let (h, m, s, _) = split_timestamp(seconds);
    format!("{h:02}:{m:02}:{s:02}")
}

fn split_timestamp(seconds: f64) -> (u64, u64, u64, u64) {
    let total_ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).floor() as u64
    } else {
        0
    };
    let ms = total_ms % 1000;
    let total_s = total_ms / 1000;
    (total_s / 3600, (total_s / 60) % 60, total_s % 60, ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00:00.000");
        assert_eq!(format_timestamp(3723.25), "01:02:03.250");
        assert_eq!(format_timestamp(-4.0), "00:00:00.000");
        // Truncated, never rounded up into the next second
        assert_eq!(format_timestamp(59.9996), "00:00:59.999");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(59.9), "00:00:59");
        assert_eq!(format_duration(59.9996), "00:00:59");
        assert_eq!(format_duration(7322.0), "02:02:02");
    }

    #[test]
    fn test_keyframe_filename_sorts_by_time() {
        assert_eq!(keyframe_filename(2.5, 3), "keyframe_00-00-02-500_0003.jpg");

        let names: Vec<String> = [(0.0, 0), (9.5, 1), (61.0, 2), (3600.0, 3)]
            .iter()
            .map(|&(t, i)| keyframe_filename(t, i))
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
