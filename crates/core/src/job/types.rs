//! Job records. Built once, consumed by exactly one execution.

use std::ffi::OsString;
use std::path::PathBuf;

use crate::catalog::{ArchiveFormat, AudioFormat, VideoFormat};
use crate::selection::Selection;

/// Compress a selection into one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveJob {
    pub selection: Selection,
    pub format: ArchiveFormat,
    /// Common parent of every selected item; the tool runs here.
    pub working_directory: PathBuf,
    /// Item names relative to `working_directory`, in selection order.
    pub relative_item_names: Vec<OsString>,
    pub output_path: PathBuf,
}

impl ArchiveJob {
    /// Output file name relative to the working directory.
    pub fn output_file_name(&self) -> OsString {
        self.output_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| self.output_path.clone().into_os_string())
    }

    /// Argument vector for the format's tool.
    pub fn tool_arguments(&self) -> Vec<OsString> {
        self.format
            .arguments(&self.output_file_name(), &self.relative_item_names)
    }
}

/// Convert one audio file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertTask {
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    pub output_format: AudioFormat,
}

/// Convert every selected audio file to one output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertJob {
    pub selection: Selection,
    pub output_format: AudioFormat,
    /// One task per selected item, in selection order.
    pub tasks: Vec<ConvertTask>,
}

/// Convert a single video to another container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoConvertJob {
    pub source_path: PathBuf,
    pub source_format: VideoFormat,
    pub output_format: VideoFormat,
    pub output_path: PathBuf,
}

/// Any job the engine can run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    Archive(ArchiveJob),
    Audio(ConvertJob),
    Video(VideoConvertJob),
}

impl Job {
    /// Paths the job intends to write.
    pub fn planned_outputs(&self) -> Vec<PathBuf> {
        match self {
            Self::Archive(job) => vec![job.output_path.clone()],
            Self::Audio(job) => job.tasks.iter().map(|t| t.output_path.clone()).collect(),
            Self::Video(job) => vec![job.output_path.clone()],
        }
    }
}
