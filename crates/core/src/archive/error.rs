//! Error types for the archive executor.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running the archive tool.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The tool could not be started.
    #[error("Failed to launch {}: {source}", .tool.display())]
    LaunchFailed {
        tool: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tool exited unsuccessfully.
    #[error("Archive tool exited with {}", describe_code(.code))]
    ToolFailed {
        code: Option<i32>,
        snippet: String,
        output: String,
    },

    /// The tool reported success but left no usable archive.
    #[error("Archive tool finished, but output file was missing or empty: {}", .path.display())]
    OutputMissing {
        path: PathBuf,
        snippet: String,
        output: String,
    },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl ArchiveError {
    /// Short message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::LaunchFailed { tool, source } => {
                format!("Could not launch {}: {source}", tool.display())
            }
            Self::ToolFailed { code, snippet, .. } => with_snippet(
                format!("Archive tool exited with {}.", describe_code(code)),
                snippet,
            ),
            Self::OutputMissing { snippet, .. } => with_snippet(
                "Archive tool finished, but output file was missing or empty.".to_string(),
                snippet,
            ),
        }
    }

    /// Full captured tool output for logging. Empty when the tool never ran.
    pub fn diagnostics(&self) -> String {
        match self {
            Self::LaunchFailed { .. } => String::new(),
            Self::ToolFailed { output, .. } | Self::OutputMissing { output, .. } => output.clone(),
        }
    }
}

fn with_snippet(message: String, snippet: &str) -> String {
    if snippet.is_empty() {
        message
    } else {
        format!("{message}\n\n{snippet}")
    }
}
