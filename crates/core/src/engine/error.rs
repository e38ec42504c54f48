//! Errors crossing the engine boundary.

use thiserror::Error;

use crate::archive::ArchiveError;
use crate::audio::TaskFailure;
use crate::job::JobError;
use crate::selection::SelectionError;
use crate::video::VideoError;

/// Anything that can stop a request. Converted into a failed
/// [`RunResult`](crate::result::RunResult) at the job boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Another job holds the slot.
    #[error("Another operation is in progress")]
    Busy,

    /// Jobs can only be submitted from within a Tokio runtime.
    #[error("No async runtime available to run the job")]
    NoRuntime,

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Audio(#[from] TaskFailure),

    #[error(transparent)]
    Video(#[from] VideoError),

    /// The worker thread panicked.
    #[error("Job worker stopped unexpectedly: {reason}")]
    WorkerPanicked { reason: String },
}

impl EngineError {
    /// Short message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Busy => {
                "Another operation is in progress. Try again when it has finished.".to_string()
            }
            Self::NoRuntime | Self::WorkerPanicked { .. } => {
                "The operation stopped unexpectedly.".to_string()
            }
            Self::Selection(e) => e.user_message(),
            Self::Job(e) => e.user_message(),
            Self::Archive(e) => e.user_message(),
            Self::Audio(e) => e.user_message(),
            Self::Video(e) => e.user_message(),
        }
    }

    /// Detail for logging.
    pub fn diagnostics(&self) -> String {
        match self {
            Self::Archive(e) => e.diagnostics(),
            Self::Audio(e) => e.diagnostics(),
            Self::Video(e) => e.diagnostics(),
            other => other.to_string(),
        }
    }
}
