//! Audio conversion.
//!
//! Files are decoded by an [`AudioSource`], converted in-process by a
//! [`SampleConverter`] that pulls input lazily, and encoded by an
//! [`AudioSink`]. The [`AudioExecutor`] drives that loop for every task of a
//! convert job; [`FfmpegAudioBackend`] provides sources and sinks backed by
//! the `ffmpeg` executable.

mod buffer;
mod converter;
mod error;
mod executor;
mod ffmpeg;
mod settings;
mod traits;

pub use buffer::{FrameBuffer, ProcessingFormat, SampleRepr};
pub use converter::LinearConverter;
pub use error::{AudioError, TaskFailure};
pub use executor::{output_capacity, AudioExecutor};
pub use ffmpeg::FfmpegAudioBackend;
pub use settings::{AudioOutputSettings, AAC_SAMPLE_RATES};
pub use traits::{AudioBackend, AudioSink, AudioSource, ConvertStatus, InputStatus, SampleConverter};
