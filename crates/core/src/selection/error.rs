//! Error types for selection validation.

use std::path::PathBuf;
use thiserror::Error;

/// Reasons a selection cannot be used for the requested action.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectionError {
    /// Nothing was selected.
    #[error("Selection is empty")]
    Empty,

    /// A path was not absolute.
    #[error("Selected path is not absolute: {}", .path.display())]
    NotAbsolute { path: PathBuf },

    /// A path does not exist or cannot be accessed.
    #[error("Selected item not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// The selection already contains an archive.
    #[error("Selection contains an archive: {}", .path.display())]
    AlreadyArchived { path: PathBuf },

    /// Not every item is a supported audio file.
    #[error("Selection contains files that are not supported audio")]
    UnsupportedAudio,

    /// The selection is not exactly one supported video.
    #[error("Selection is not a single supported video")]
    NotSingleVideo,

    /// Nothing the engine can convert.
    #[error("Selection cannot be converted")]
    UnsupportedSelection,
}

impl SelectionError {
    /// Short message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Empty => "Nothing was selected.".to_string(),
            Self::NotAbsolute { path } | Self::NotFound { path } => {
                format!("\"{}\" could not be found.", display_name(path))
            }
            Self::AlreadyArchived { path } => format!(
                "\"{}\" is already an archive and cannot be archived again.",
                display_name(path)
            ),
            Self::UnsupportedAudio => {
                "Only MP3, M4A, WAV, AIFF and FLAC files can be converted.".to_string()
            }
            Self::NotSingleVideo => {
                "Select a single MP4, MOV or M4V video to convert.".to_string()
            }
            Self::UnsupportedSelection => {
                "The selected items cannot be converted.".to_string()
            }
        }
    }
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
