//! Video container conversion.
//!
//! The [`VideoExecutor`] validates the source, picks an [`ExportPreset`] and
//! drives an [`AssetExporter`] from a blocking worker thread.

mod error;
mod executor;
mod ffmpeg;
mod traits;

pub use error::VideoError;
pub use executor::VideoExecutor;
pub use ffmpeg::FfmpegExporter;
pub use traits::{AssetExporter, ExportOutcome, ExportPreset, ExportRequest, TrackKind};
