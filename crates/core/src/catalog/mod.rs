//! Format catalog.
//!
//! Closed enumerations of every archive, audio and video format the engine
//! knows about, with the extensions, tool identifiers and codec layouts that
//! the rest of the crate derives its behaviour from. Adding a format means
//! adding a variant here and letting exhaustive matches point at every place
//! that needs a decision.

mod archive;
mod audio;
mod video;

pub use archive::{ArchiveFormat, ArchiveTool};
pub use audio::{AudioEncoding, AudioFormat, Endianness};
pub use video::{ContainerFamily, VideoFormat};

/// Error returned when a format name does not match any catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind} format: {name}")]
pub struct UnknownFormat {
    /// Which catalog was consulted ("archive", "audio", "video").
    pub kind: &'static str,
    /// The name that failed to parse.
    pub name: String,
}

impl UnknownFormat {
    pub(crate) fn new(kind: &'static str, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
        }
    }
}
