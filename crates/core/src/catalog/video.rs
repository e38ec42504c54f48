//! Video container formats.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::UnknownFormat;

/// Group of containers that can carry each other's streams unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerFamily {
    /// MPEG-4 Part 14 and its iTunes variant
    Mp4,
    /// QuickTime
    QuickTime,
}

/// Video formats; every readable format is also writable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoFormat {
    Mp4,
    Mov,
    M4v,
}

impl VideoFormat {
    /// Every video format, in the order they are offered.
    pub const ALL: [VideoFormat; 3] = [Self::Mp4, Self::Mov, Self::M4v];

    /// Canonical file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mov => "mov",
            Self::M4v => "m4v",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mp4 => "MP4",
            Self::Mov => "QuickTime (MOV)",
            Self::M4v => "M4V",
        }
    }

    pub fn family(&self) -> ContainerFamily {
        match self {
            Self::Mp4 | Self::M4v => ContainerFamily::Mp4,
            Self::Mov => ContainerFamily::QuickTime,
        }
    }

    /// Native container type identifier (the muxer that writes it).
    pub fn container_type(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mov => "mov",
            Self::M4v => "ipod",
        }
    }

    /// Looks up a format by extension, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        Self::ALL.into_iter().find(|f| f.extension() == ext)
    }

    /// Looks up the format of a path by its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Looks up a format by its container type identifier.
    pub fn from_container_type(container_type: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.container_type() == container_type)
    }

    /// Filters `supported` down to the outputs worth offering for a source in
    /// this format: the source's own container is never offered.
    pub fn alternative_outputs(&self, supported: &[VideoFormat]) -> Vec<VideoFormat> {
        supported.iter().copied().filter(|f| f != self).collect()
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for VideoFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s.trim_start_matches('.')).ok_or_else(|| UnknownFormat::new("video", s))
    }
}
