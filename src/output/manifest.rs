use super::format_duration;
use crate::error::{ExtractError, ExtractResult};
use crate::selection::ExtractionResult;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Serialize)]
struct Manifest<'a> {
    video: &'a Path,
    video_duration: f64,
    video_duration_formatted: String,
    threshold: f32,
    keyframes: Vec<ManifestEntry<'a>>,
}

#[derive(Serialize)]
struct ManifestEntry<'a> {
    path: &'a Path,
    timestamp: f64,
    timestamp_formatted: String,
    frame_number: u64,
    difference: f32,
}

/// Write the extraction result as JSON for downstream transcription and slide tools
pub fn write_manifest(result: &ExtractionResult, video: &Path, path: &Path) -> ExtractResult<()> {
    write_json(result, video, path).map_err(|e| ExtractError::Manifest {
        path: path.to_path_buf(),
        reason: format!("{e:#}"),
    })?;
    tracing::info!("Manifest written to {}", path.display());
    Ok(())
}

fn write_json(result: &ExtractionResult, video: &Path, path: &Path) -> Result<()> {
    let manifest = Manifest {
        video,
        video_duration: result.metadata.duration,
        video_duration_formatted: format_duration(result.metadata.duration),
        threshold: result.threshold,
        keyframes: result
            .keyframes
            .iter()
            .map(|k| ManifestEntry {
                path: &k.path,
                timestamp: k.timestamp,
                timestamp_formatted: k.timestamp_formatted(),
                frame_number: k.frame_number,
                difference: k.difference,
            })
            .collect(),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &manifest).context("Failed to serialize manifest")?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::Keyframe;
    use crate::source::VideoMetadata;
    use std::path::PathBuf;

    fn two_keyframes() -> ExtractionResult {
        ExtractionResult {
            keyframes: vec![
                Keyframe {
                    timestamp: 0.0,
                    path: PathBuf::from("out/keyframe_00-00-00-000_0000.jpg"),
                    frame_number: 0,
                    difference: 0.0,
                },
                Keyframe {
                    timestamp: 62.5,
                    path: PathBuf::from("out/keyframe_00-01-02-500_0001.jpg"),
                    frame_number: 1875,
                    difference: 0.5,
                },
            ],
            threshold: 0.1,
            metadata: VideoMetadata {
                duration: 90.0,
                fps: 30.0,
                frame_count: 2700,
                width: 1280,
                height: 720,
            },
        }
    }

    #[test]
    fn test_manifest_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let result = two_keyframes();

        let path = tmp.path().join("meta").join("manifest.json");
        write_manifest(&result, Path::new("talk.mp4"), &path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["video"], "talk.mp4");
        assert_eq!(json["video_duration_formatted"], "00:01:30");
        assert_eq!(json["keyframes"].as_array().unwrap().len(), 2);
        assert_eq!(json["keyframes"][1]["timestamp_formatted"], "00:01:02.500");
        assert_eq!(json["keyframes"][1]["frame_number"], 1875);
    }

    #[test]
    fn test_unwritable_manifest_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("taken");
        fs::write(&blocker, b"not a directory").unwrap();
        let path = blocker.join("manifest.json");

        match write_manifest(&two_keyframes(), Path::new("talk.mp4"), &path).unwrap_err() {
            ExtractError::Manifest { path: reported, reason } => {
                assert_eq!(reported, path);
                assert!(reason.contains("Failed to create"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
