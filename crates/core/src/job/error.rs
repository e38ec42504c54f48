//! Error types for job construction.

use thiserror::Error;

use crate::naming::NamingError;
use crate::selection::SelectionError;

/// Errors raised while turning a selection into a job.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JobError {
    /// The selection is not valid for the requested action.
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// No output path could be derived.
    #[error(transparent)]
    Naming(#[from] NamingError),

    /// The requested output format is not offered for this selection.
    #[error("Output format {format} is not available for this selection")]
    UnsupportedTarget { format: String },

    /// A video whose only supported output is its own container.
    #[error("No alternative output format is available for this video")]
    NoAlternativeOutputs,
}

impl JobError {
    /// Creates an unsupported target error.
    pub fn unsupported_target(format: impl ToString) -> Self {
        Self::UnsupportedTarget {
            format: format.to_string(),
        }
    }

    /// Short message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Selection(e) => e.user_message(),
            Self::Naming(NamingError::EmptySelection) => "Nothing was selected.".to_string(),
            Self::Naming(NamingError::MixedParentDirectories { .. }) => {
                "All selected items must be in the same folder.".to_string()
            }
            Self::Naming(NamingError::Unnameable { path }) => {
                format!("Cannot create an output next to \"{}\".", path.display())
            }
            Self::UnsupportedTarget { format } => {
                format!("The selection cannot be converted to {format}.")
            }
            Self::NoAlternativeOutputs => {
                "This video cannot be converted to any other format.".to_string()
            }
        }
    }
}
