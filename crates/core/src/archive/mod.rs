//! Archive executor.
//!
//! Runs the external compression tool for an [`ArchiveJob`](crate::job::ArchiveJob)
//! inside the job's working directory, captures both output streams in full
//! and checks that a non-empty archive was written. One attempt, no retries.

mod error;
mod executor;

pub use error::ArchiveError;
pub use executor::{diagnostic_snippet, ArchiveExecutor, SNIPPET_LINES};
