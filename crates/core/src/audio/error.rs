//! Error types for audio conversion.

use std::path::PathBuf;
use thiserror::Error;

use crate::catalog::AudioFormat;

/// Errors that can occur while converting one audio file.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The source could not be opened or has no audio stream.
    #[error("Failed to open source {}: {reason}", .path.display())]
    SourceOpenFailed { path: PathBuf, reason: String },

    /// The target format cannot be written.
    #[error("Unsupported output format: {format}")]
    UnsupportedOutput { format: AudioFormat },

    /// The resolved output configuration is not constructible.
    #[error("Invalid output settings: {reason}")]
    InvalidOutputSettings { reason: String },

    /// The destination could not be opened for writing.
    #[error("Failed to open destination {}: {reason}", .path.display())]
    SinkOpenFailed { path: PathBuf, reason: String },

    /// No converter exists between the source and destination formats.
    #[error("Failed to create sample converter: {reason}")]
    ConverterUnavailable { reason: String },

    /// A sample buffer could not be allocated.
    #[error("Failed to allocate a buffer of {frames} frames")]
    BufferAllocation { frames: usize },

    /// Reading decoded samples from the source failed.
    #[error("Failed to read from {}: {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing samples to the destination failed.
    #[error("Failed to write {}: {reason}", .path.display())]
    WriteFailed { path: PathBuf, reason: String },

    /// The converter failed.
    #[error("Conversion failed: {reason}")]
    ConversionFailed { reason: String },

    /// The converter returned a status the loop does not know.
    #[error("Converter returned unexpected status {status}")]
    UnexpectedStatus { status: i32 },

    /// Conversion ended but the destination is missing or empty.
    #[error("Conversion finished, but output file was missing or empty: {}", .path.display())]
    OutputMissing { path: PathBuf },
}

impl AudioError {
    /// Creates a conversion failed error.
    pub fn conversion_failed(reason: impl Into<String>) -> Self {
        Self::ConversionFailed {
            reason: reason.into(),
        }
    }

    /// Creates an invalid output settings error.
    pub fn invalid_settings(reason: impl Into<String>) -> Self {
        Self::InvalidOutputSettings {
            reason: reason.into(),
        }
    }

    /// Creates a converter unavailable error.
    pub fn converter_unavailable(reason: impl Into<String>) -> Self {
        Self::ConverterUnavailable {
            reason: reason.into(),
        }
    }

    /// Stable code identifying the failure kind in logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SourceOpenFailed { .. } => "source_open_failed",
            Self::UnsupportedOutput { .. } => "unsupported_output",
            Self::InvalidOutputSettings { .. } => "invalid_output_settings",
            Self::SinkOpenFailed { .. } => "sink_open_failed",
            Self::ConverterUnavailable { .. } => "converter_unavailable",
            Self::BufferAllocation { .. } => "buffer_allocation",
            Self::ReadFailed { .. } => "read_failed",
            Self::WriteFailed { .. } => "write_failed",
            Self::ConversionFailed { .. } => "conversion_failed",
            Self::UnexpectedStatus { .. } => "unexpected_status",
            Self::OutputMissing { .. } => "output_missing",
        }
    }

    /// Short message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::SourceOpenFailed { .. } => "The file could not be read as audio.".to_string(),
            Self::UnsupportedOutput { format } => {
                format!("Converting to {} is not supported.", format.label())
            }
            Self::InvalidOutputSettings { .. } | Self::ConverterUnavailable { .. } => {
                "The audio cannot be converted to the chosen format.".to_string()
            }
            Self::BufferAllocation { .. } => "Not enough memory to convert the file.".to_string(),
            Self::ReadFailed { .. } => "Reading the audio failed.".to_string(),
            Self::SinkOpenFailed { .. } | Self::WriteFailed { .. } => {
                "Writing the converted file failed.".to_string()
            }
            Self::ConversionFailed { .. } | Self::UnexpectedStatus { .. } => {
                "The audio conversion failed.".to_string()
            }
            Self::OutputMissing { .. } => {
                "Conversion finished, but output file was missing or empty.".to_string()
            }
        }
    }
}

/// A failed task within an audio job.
#[derive(Debug, Error)]
#[error("Task {index} ({}) failed: {error}", .source_path.display())]
pub struct TaskFailure {
    /// Position of the task in the job.
    pub index: usize,
    pub source_path: PathBuf,
    #[source]
    pub error: AudioError,
}

impl TaskFailure {
    /// Short message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        let name = self
            .source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source_path.display().to_string());
        format!("Converting \"{name}\" failed. {}", self.error.user_message())
    }

    /// Detail for logging.
    pub fn diagnostics(&self) -> String {
        format!("[{}] {}", self.error.code(), self)
    }
}
