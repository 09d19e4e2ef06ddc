use super::preprocess::{Preprocessor, Thumbnail};
use crate::config::CalibrationConfig;
use crate::source::FrameSource;

/// Evenly spaced probe positions `i * duration / count` for `i in 0..count`
pub fn probe_points(duration: f64, count: usize) -> Vec<f64> {
    if count == 0 || !duration.is_finite() || duration <= 0.0 {
        return Vec::new();
    }
    let spacing = duration / count as f64;
    (0..count).map(|i| i as f64 * spacing).collect()
}

/// Decode the probe frames and score each against the previous one
///
/// Probing stops at the first position that yields no frame.
pub fn probe_scores<S: FrameSource>(
    source: &mut S,
    points: &[f64],
    preprocessor: &Preprocessor,
) -> Vec<f32> {
    let mut thumbnails = Vec::with_capacity(points.len());

    for &point in points {
        match source.frame_at(point) {
            Ok(Some(frame)) => thumbnails.push(preprocessor.thumbnail(&frame.image)),
            Ok(None) => {
                tracing::debug!("Calibration probe at {:.3}s hit end of stream", point);
                break;
            }
            Err(e) => {
                tracing::debug!("Calibration probe at {:.3}s failed: {:#}", point, e);
                break;
            }
        }
    }

    consecutive_scores(&thumbnails)
}

/// Difference scores between neighbouring thumbnails
pub fn consecutive_scores(thumbnails: &[Thumbnail]) -> Vec<f32> {
    thumbnails
        .windows(2)
        .map(|pair| pair[0].difference(&pair[1]))
        .collect()
}

/// Derive a difference threshold from probe scores
///
/// The threshold is the median score scaled by the configured sensitivity,
/// clamped into `[min_threshold, max_threshold]`. With fewer than two usable
/// scores the default threshold is returned.
pub fn calibrate(scores: &[f32], config: &CalibrationConfig) -> f32 {
    let mut valid: Vec<f32> = scores.iter().copied().filter(|s| s.is_finite()).collect();

    if valid.len() < 2 {
        tracing::debug!(
            "Calibration has {} probe comparisons, using default threshold {:.4}",
            valid.len(),
            config.default_threshold
        );
        return config.clamp(config.default_threshold);
    }

    valid.sort_by(f32::total_cmp);
    let median = median_of_sorted(&valid);
    let threshold = config.clamp(median * config.sensitivity);

    tracing::debug!(
        "Calibrated threshold {:.4} (median {:.4} over {} comparisons, sensitivity {:.2})",
        threshold,
        median,
        valid.len(),
        config.sensitivity
    );

    threshold
}

fn median_of_sorted(sorted: &[f32]) -> f32 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
