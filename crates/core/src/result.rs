//! The value every job produces.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of one job, reported back to the caller.
///
/// Diagnostics are meant for logs; only `message` is shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunResult {
    /// The job produced one or more files.
    Success { outputs: Vec<PathBuf> },
    /// The job failed.
    Failure { message: String, diagnostics: String },
}

impl RunResult {
    /// Success with a single output path.
    pub fn single(output: PathBuf) -> Self {
        Self::Success {
            outputs: vec![output],
        }
    }

    /// Failure with the given message and diagnostics.
    pub fn failure(message: impl Into<String>, diagnostics: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
            diagnostics: diagnostics.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Produced paths; empty on failure.
    pub fn outputs(&self) -> &[PathBuf] {
        match self {
            Self::Success { outputs } => outputs,
            Self::Failure { .. } => &[],
        }
    }
}
