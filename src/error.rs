use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by a keyframe extraction call
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The video could not be opened, or its first frame could not be decoded
    #[error("unreadable video {}: {reason}", path.display())]
    UnreadableVideo { path: PathBuf, reason: String },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Every kept frame failed to encode or write
    #[error("failed to write all {attempted} keyframes: {last_error}")]
    AllWritesFailed { attempted: usize, last_error: String },

    #[error("failed to write manifest {}: {reason}", path.display())]
    Manifest { path: PathBuf, reason: String },
}

impl ExtractError {
    pub(crate) fn unreadable(path: impl Into<PathBuf>, err: &anyhow::Error) -> Self {
        Self::UnreadableVideo {
            path: path.into(),
            reason: format!("{err:#}"),
        }
    }
}

pub type ExtractResult<T> = std::result::Result<T, ExtractError>;
