use anyhow::{Context, Result};
use clap::Parser;
use keyframe_extractor::output::format_duration;
use keyframe_extractor::{write_manifest, ExtractorConfig, FfmpegBackend, KeyframeSelector};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Extract keyframes from a video at moments of visual change", long_about = None)]
struct Args {
    /// Video file to extract keyframes from
    video: PathBuf,

    /// Directory the keyframe JPEGs are written to
    #[arg(short, long, default_value = "keyframes")]
    output_dir: PathBuf,

    /// Seconds between sampled frames
    #[arg(short, long, default_value_t = 1.0)]
    interval: f64,

    /// Maximum number of keyframes to keep
    #[arg(short, long, default_value_t = 50)]
    max_frames: usize,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Fixed difference threshold (0.0-1.0) instead of calibrating one
    #[arg(short, long)]
    threshold: Option<f32>,

    /// Also keep a frame whenever this many seconds passed without one
    #[arg(long)]
    force_interval: Option<f64>,

    /// Write a JSON manifest of the kept frames to this path
    #[arg(long)]
    manifest: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let config = ExtractorConfig {
        threshold: args.threshold,
        force_interval: args.force_interval,
        debug: args.debug,
        ..ExtractorConfig::default()
    };

    let backend = FfmpegBackend::new().context("Failed to initialize video decoder")?;
    let selector = KeyframeSelector::new(backend, config);

    let mut report_progress = |percent: f32| -> Result<()> {
        tracing::info!("Progress: {:.1}%", percent);
        Ok(())
    };

    let result = selector
        .extract_to_dir(
            &args.video,
            &args.output_dir,
            args.interval,
            args.max_frames,
            Some(&mut report_progress),
        )
        .with_context(|| format!("Failed to extract keyframes from {}", args.video.display()))?;

    if let Some(manifest) = &args.manifest {
        write_manifest(&result, &args.video, manifest)?;
    }

    println!(
        "Extracted {} keyframes from {} ({}) into {}",
        result.len(),
        args.video.display(),
        format_duration(result.metadata.duration),
        args.output_dir.display()
    );

    Ok(())
}
