//! Asset export capability used by the video executor.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::VideoError;
use crate::catalog::VideoFormat;

/// Kind of a track inside a media asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Video,
    Audio,
    Subtitle,
    Other,
}

/// How an export treats the encoded media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportPreset {
    /// Re-wrap the existing streams without re-encoding.
    Passthrough,
    /// Re-encode at the best quality the exporter offers.
    HighestQuality,
}

impl ExportPreset {
    /// Passthrough when both formats share a container family.
    pub fn for_conversion(source: VideoFormat, target: VideoFormat) -> Self {
        if source.family() == target.family() {
            Self::Passthrough
        } else {
            Self::HighestQuality
        }
    }

    /// Whether this preset can produce `target` from a `source` container.
    ///
    /// Passthrough only stays inside the source's family; an unknown source
    /// cannot be passed through at all.
    pub fn offers(&self, source: Option<VideoFormat>, target: VideoFormat) -> bool {
        match self {
            Self::Passthrough => source.is_some_and(|s| s.family() == target.family()),
            Self::HighestQuality => true,
        }
    }
}

/// One export to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub source: PathBuf,
    pub output_path: PathBuf,
    /// Container type identifier, see [`VideoFormat::container_type`].
    pub file_type: String,
    pub preset: ExportPreset,
    /// Relocate the index to the front of the file for progressive download.
    pub optimize_for_network: bool,
}

/// What an export produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    pub output_path: PathBuf,
    pub file_type: String,
}

/// A media framework that can inspect and re-export assets.
#[async_trait]
pub trait AssetExporter: Send + Sync {
    /// Returns the name of this exporter implementation.
    fn name(&self) -> &str;

    /// Loads the kinds of every track in the asset.
    async fn load_tracks(&self, path: &Path) -> Result<Vec<TrackKind>, VideoError>;

    /// Container types an export of `source` with `preset` can write.
    async fn supported_file_types(
        &self,
        source: &Path,
        preset: ExportPreset,
    ) -> Result<Vec<String>, VideoError>;

    /// Runs the export to completion.
    async fn export(&self, request: ExportRequest) -> Result<ExportOutcome, VideoError>;
}
