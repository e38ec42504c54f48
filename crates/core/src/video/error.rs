//! Error types for video conversion.

use std::path::PathBuf;
use thiserror::Error;

use crate::catalog::VideoFormat;

/// Errors that can occur while converting a video.
#[derive(Debug, Error)]
pub enum VideoError {
    /// Track metadata could not be loaded.
    #[error("Failed to load tracks of {}: {reason}", .path.display())]
    TrackLoadFailed { path: PathBuf, reason: String },

    /// The source has no video track.
    #[error("No video track in {}", .path.display())]
    NoVideoTrack { path: PathBuf },

    /// The export session cannot write the requested container.
    #[error("Export to {format} is not supported (supported: {})", .supported.join(", "))]
    UnsupportedOutputType {
        format: VideoFormat,
        supported: Vec<String>,
    },

    /// The export itself failed.
    #[error("Export failed: {reason}")]
    ExportFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// Export finished but the destination is missing or empty.
    #[error("Export finished, but output file was missing or empty: {}", .path.display())]
    OutputMissing { path: PathBuf },

    /// The exporter wrote a different container than requested.
    #[error("Expected a .{expected} file but export wrote {}", .path.display())]
    ExtensionMismatch { expected: String, path: PathBuf },
}

impl VideoError {
    /// Creates an export failed error with optional stderr output.
    pub fn export_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ExportFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates a track load failed error.
    pub fn track_load_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::TrackLoadFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Short message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::TrackLoadFailed { .. } => "The video could not be read.".to_string(),
            Self::NoVideoTrack { .. } => "The file does not contain a video track.".to_string(),
            Self::UnsupportedOutputType { format, .. } => {
                format!("This video cannot be converted to {}.", format.label())
            }
            Self::ExportFailed { .. } => "The video conversion failed.".to_string(),
            Self::OutputMissing { .. } => {
                "Conversion finished, but output file was missing or empty.".to_string()
            }
            Self::ExtensionMismatch { expected, .. } => {
                format!("The converted file is not a .{expected} file.")
            }
        }
    }

    /// Detail for logging.
    pub fn diagnostics(&self) -> String {
        match self {
            Self::UnsupportedOutputType { supported, .. } => {
                format!("{self}\nsupported file types: [{}]", supported.join(", "))
            }
            Self::ExportFailed {
                stderr: Some(stderr),
                ..
            } => format!("{self}\n{stderr}"),
            _ => self.to_string(),
        }
    }
}
