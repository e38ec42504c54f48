//! Immutable job records and the builder that validates and assembles them.

mod builder;
mod error;
mod types;

pub use builder::JobBuilder;
pub use error::JobError;
pub use types::{ArchiveJob, ConvertJob, ConvertTask, Job, VideoConvertJob};
