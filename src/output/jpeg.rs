use super::{keyframe_filename, FrameSink};
use crate::source::Frame;
use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes keyframes as JPEG files into a directory
///
/// The directory is created on the first write, so an extraction that keeps
/// nothing leaves the filesystem untouched.
pub struct JpegDirSink {
    dir: PathBuf,
    quality: u8,
    dir_ready: bool,
}

impl JpegDirSink {
    pub fn new<P: AsRef<Path>>(dir: P, quality: u8) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            quality: quality.clamp(1, 100),
            dir_ready: false,
        }
    }

    fn ensure_dir(&mut self) -> Result<()> {
        if !self.dir_ready {
            fs::create_dir_all(&self.dir).with_context(|| {
                format!("Failed to create output directory {}", self.dir.display())
            })?;
            tracing::debug!("Output directory ready at {}", self.dir.display());
            self.dir_ready = true;
        }
        Ok(())
    }
}

impl FrameSink for JpegDirSink {
    fn write_keyframe(&mut self, index: usize, frame: &Frame) -> Result<PathBuf> {
        self.ensure_dir()?;

        let path = self.dir.join(keyframe_filename(frame.timestamp, index));
        let file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);

        frame
            .image
            .write_with_encoder(JpegEncoder::new_with_quality(&mut writer, self.quality))
            .with_context(|| format!("Failed to encode {}", path.display()))?;
        writer
            .flush()
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(path)
    }
}
