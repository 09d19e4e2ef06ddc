use super::preprocess::{Preprocessor, Thumbnail};
use super::progress::ProgressReporter;
use super::types::{ExtractionResult, Keyframe};
use crate::error::{ExtractError, ExtractResult};
use crate::output::FrameSink;
use crate::source::FrameSource;
use std::path::Path;

/// Parameters of the sampling pass
#[derive(Debug, Clone)]
pub struct SamplingPlan {
    /// Seconds between two sampled positions
    pub capture_interval: f64,
    pub max_frames: usize,
    /// Keep a frame whenever this many seconds passed since the last kept one
    pub force_interval: Option<f64>,
    /// Log every decision at info level
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    First,
    Changed,
    Forced,
    Skipped,
}

/// Walk the timeline at a fixed interval and keep frames that differ from the last kept one
///
/// Stops at end of stream, at the first decode failure after the first frame,
/// or as soon as `max_frames` keyframes were recorded. `video` is only used to
/// label errors.
pub fn sample<S: FrameSource, K: FrameSink>(
    video: &Path,
    source: &mut S,
    sink: &mut K,
    threshold: f32,
    plan: &SamplingPlan,
    preprocessor: &Preprocessor,
    progress: &mut ProgressReporter<'_, '_>,
) -> ExtractResult<ExtractionResult> {
    let metadata = source.metadata();
    let estimated_steps = metadata
        .effective_duration()
        .map(|d| (d / plan.capture_interval).ceil().max(1.0));

    let mut keyframes: Vec<Keyframe> = Vec::new();
    let mut last_kept: Option<(f64, Thumbnail)> = None;
    let mut last_sampled: Option<f64> = None;
    let mut attempted_writes = 0usize;
    let mut last_write_error: Option<anyhow::Error> = None;
    let mut step: u64 = 0;

    loop {
        if keyframes.len() >= plan.max_frames {
            tracing::debug!("Reached {} keyframes, stopping", plan.max_frames);
            break;
        }

        let position = step as f64 * plan.capture_interval;
        if metadata.has_duration() && position >= metadata.duration {
            break;
        }

        let frame = match source.frame_at(position) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::debug!("End of stream at {:.3}s", position);
                break;
            }
            Err(e) if step == 0 => {
                return Err(ExtractError::unreadable(
                    video,
                    &e.context("first frame could not be decoded"),
                ));
            }
            Err(e) => {
                tracing::debug!("Decoding interrupted at {:.3}s, stopping: {:#}", position, e);
                break;
            }
        };

        let percent = if metadata.has_duration() {
            (position / metadata.duration * 100.0) as f32
        } else if let Some(steps) = estimated_steps {
            (step as f64 / steps * 100.0) as f32
        } else {
            0.0
        };

        step += 1;

        if last_sampled.is_some_and(|t| frame.timestamp <= t) {
            tracing::debug!(
                "Source returned {:.3}s again for {:.3}s, skipping",
                frame.timestamp,
                position
            );
            progress.report(percent);
            continue;
        }
        last_sampled = Some(frame.timestamp);

        let thumbnail = preprocessor.thumbnail(&frame.image);
        let (decision, score) = match &last_kept {
            None => (Decision::First, 0.0),
            Some((kept_at, kept)) => {
                let score = thumbnail.difference(kept);
                let decision = if score > threshold {
                    Decision::Changed
                } else if plan
                    .force_interval
                    .is_some_and(|every| frame.timestamp - kept_at >= every)
                {
                    Decision::Forced
                } else {
                    Decision::Skipped
                };
                (decision, score)
            }
        };

        if plan.verbose {
            tracing::info!(
                "{:.3}s: difference {:.4} (threshold {:.4}) -> {:?}",
                frame.timestamp,
                score,
                threshold,
                decision
            );
        } else {
            tracing::trace!("{:.3}s: difference {:.4} -> {:?}", frame.timestamp, score, decision);
        }

        if decision != Decision::Skipped {
            attempted_writes += 1;
            match sink.write_keyframe(keyframes.len(), &frame) {
                Ok(path) => {
                    tracing::debug!("Kept {:.3}s as {}", frame.timestamp, path.display());
                    keyframes.push(Keyframe {
                        timestamp: frame.timestamp,
                        path,
                        frame_number: metadata.frame_number_at(frame.timestamp),
                        difference: score,
                    });
                }
                Err(e) => {
                    tracing::warn!("Skipping keyframe at {:.3}s: {:#}", frame.timestamp, e);
                    last_write_error = Some(e);
                }
            }
            last_kept = Some((frame.timestamp, thumbnail));
        }

        progress.report(percent);
    }

    progress.finish();

    if keyframes.is_empty() {
        if let Some(e) = last_write_error {
            return Err(ExtractError::AllWritesFailed {
                attempted: attempted_writes,
                last_error: format!("{e:#}"),
            });
        }
    }

    Ok(ExtractionResult {
        keyframes,
        threshold,
        metadata,
    })
}
