use super::{Frame, FrameSource, VideoBackend, VideoMetadata, DEFAULT_FPS};
use anyhow::{anyhow, bail, Context, Result};
use image::RgbImage;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Decoding backend that drives the `ffprobe` and `ffmpeg` binaries
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegBackend {
    /// Locate `ffmpeg` and `ffprobe` on `PATH`
    pub fn new() -> Result<Self> {
        let ffmpeg = which::which("ffmpeg").context("ffmpeg not found in PATH")?;
        let ffprobe = which::which("ffprobe").context("ffprobe not found in PATH")?;
        tracing::debug!("Using {} and {}", ffmpeg.display(), ffprobe.display());
        Ok(Self { ffmpeg, ffprobe })
    }

    fn probe(&self, path: &Path) -> Result<VideoMetadata> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .context("Failed to run ffprobe")?;

        if !output.status.success() {
            bail!(
                "ffprobe failed ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let probe: FfprobeOutput =
            serde_json::from_slice(&output.stdout).context("Failed to parse ffprobe output")?;
        metadata_from_probe(&probe)
    }
}

impl VideoBackend for FfmpegBackend {
    type Source = FfmpegSource;

    fn open(&self, path: &Path) -> Result<FfmpegSource> {
        if !path.is_file() {
            bail!("File not found: {}", path.display());
        }

        let metadata = self
            .probe(path)
            .with_context(|| format!("Failed to probe {}", path.display()))?;

        tracing::debug!(
            "Opened {}: {}x{}, {:.2}s, {:.2} fps, ~{} frames",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.duration,
            metadata.fps,
            metadata.frame_count
        );

        Ok(FfmpegSource {
            ffmpeg: self.ffmpeg.clone(),
            path: path.to_path_buf(),
            metadata,
            position: 0.0,
        })
    }
}

/// An opened video decoded one frame per `ffmpeg` invocation
///
/// Each decode runs in its own child process, which has exited and been
/// reaped by the time `frame_at` returns.
#[derive(Debug)]
pub struct FfmpegSource {
    ffmpeg: PathBuf,
    path: PathBuf,
    metadata: VideoMetadata,
    position: f64,
}

impl FfmpegSource {
    fn frame_len(&self) -> usize {
        self.metadata.width as usize * self.metadata.height as usize * 3
    }

    fn decode_command(&self, timestamp: f64) -> Command {
        let mut command = Command::new(&self.ffmpeg);
        command
            .args(["-v", "error", "-nostdin", "-ss"])
            .arg(format!("{timestamp:.3}"))
            .arg("-i")
            .arg(&self.path)
            .args(["-map", "0:v:0", "-frames:v", "1", "-vf"])
            // Pin the output size so rotated or anamorphic streams still fill the buffer exactly
            .arg(format!(
                "scale={}:{}",
                self.metadata.width, self.metadata.height
            ))
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }
}

impl FrameSource for FfmpegSource {
    fn metadata(&self) -> VideoMetadata {
        self.metadata
    }

    fn frame_at(&mut self, timestamp: f64) -> Result<Option<Frame>> {
        let timestamp = timestamp.max(self.position);

        if self.metadata.has_duration() && timestamp >= self.metadata.duration {
            return Ok(None);
        }

        // Drains stdout and stderr together
        let output = self
            .decode_command(timestamp)
            .output()
            .context("Failed to run ffmpeg")?;

        let frame_len = self.frame_len();
        let mut buffer = output.stdout;
        if buffer.len() >= frame_len {
            buffer.truncate(frame_len);
            self.position = timestamp;
            let image = RgbImage::from_raw(self.metadata.width, self.metadata.height, buffer)
                .ok_or_else(|| anyhow!("Decoded buffer does not match frame size"))?;
            return Ok(Some(Frame::new(timestamp, image)));
        }

        if buffer.is_empty() && output.status.success() {
            return Ok(None);
        }

        bail!(
            "ffmpeg failed at {:.3}s ({}, {} of {} bytes): {}",
            timestamp,
            output.status,
            buffer.len(),
            frame_len,
            stderr_tail(&output.stderr)
        )
    }
}

/// Last line of decoder output, enough to name the failure
fn stderr_tail(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("no decoder output")
        .to_string()
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

fn metadata_from_probe(probe: &FfprobeOutput) -> Result<VideoMetadata> {
    let stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| anyhow!("No video stream found"))?;

    let width = stream.width.unwrap_or(0);
    let height = stream.height.unwrap_or(0);
    if width == 0 || height == 0 {
        bail!("Video stream has no frame size");
    }

    let duration = probe
        .format
        .as_ref()
        .and_then(|f| parse_seconds(f.duration.as_deref()))
        .or_else(|| parse_seconds(stream.duration.as_deref()))
        .unwrap_or(0.0);

    let fps = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_frame_rate))
        .unwrap_or(DEFAULT_FPS);

    let frame_count = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse::<u64>().ok())
        .filter(|&n| n > 0)
        .unwrap_or_else(|| (duration * fps).round() as u64);

    Ok(VideoMetadata {
        duration,
        fps,
        frame_count,
        width,
        height,
    })
}

fn parse_seconds(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
}

/// Parse frame rate string (e.g., "30/1" or "29.97"); zero and "0/0" count as missing
fn parse_frame_rate(s: &str) -> Option<f64> {
    let rate = if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den <= 0.0 {
            return None;
        }
        num / den
    } else {
        s.parse().ok()?
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}
