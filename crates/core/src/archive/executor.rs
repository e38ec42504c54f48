//! Subprocess-driven archive creation.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, info};

use super::error::ArchiveError;
use crate::config::ToolsConfig;
use crate::fs::{has_content, size_of};
use crate::job::ArchiveJob;

/// Lines of tool output embedded in a user-facing failure message.
pub const SNIPPET_LINES: usize = 20;

/// Runs archive jobs through the configured external tools.
#[derive(Debug, Clone)]
pub struct ArchiveExecutor {
    tools: ToolsConfig,
}

impl ArchiveExecutor {
    pub fn new(tools: ToolsConfig) -> Self {
        Self { tools }
    }

    /// Runs the job's tool and waits for it to exit.
    ///
    /// Succeeds only when the tool exits with status zero and the output
    /// path holds a non-empty file.
    pub fn execute(&self, job: &ArchiveJob) -> Result<PathBuf, ArchiveError> {
        let tool = self.tools.archive_tool(job.format.tool()).clone();
        let args = job.tool_arguments();

        info!(
            tool = %tool.display(),
            cwd = %job.working_directory.display(),
            items = job.relative_item_names.len(),
            "Running archive tool"
        );
        debug!(?args, "Archive tool arguments");

        let output = Command::new(&tool)
            .args(&args)
            .current_dir(&job.working_directory)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| ArchiveError::LaunchFailed {
                tool: tool.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let snippet = diagnostic_snippet(&stdout, &stderr, SNIPPET_LINES);
        let combined = combine_output(&stdout, &stderr);

        if !output.status.success() {
            return Err(ArchiveError::ToolFailed {
                code: output.status.code(),
                snippet,
                output: combined,
            });
        }

        if !has_content(&job.output_path) {
            return Err(ArchiveError::OutputMissing {
                path: job.output_path.clone(),
                snippet,
                output: combined,
            });
        }

        info!(
            output = %job.output_path.display(),
            bytes = size_of(&job.output_path),
            "Archive created"
        );
        Ok(job.output_path.clone())
    }
}

/// First `max_lines` lines of tool output, preferring stderr over stdout.
pub fn diagnostic_snippet(stdout: &str, stderr: &str, max_lines: usize) -> String {
    let source = if stderr.trim().is_empty() {
        stdout
    } else {
        stderr
    };

    source
        .trim()
        .lines()
        .take(max_lines)
        .collect::<Vec<_>>()
        .join("\n")
}

fn combine_output(stdout: &str, stderr: &str) -> String {
    format!("stdout:\n{}\nstderr:\n{}", stdout.trim_end(), stderr.trim_end())
}
