//! Capability traits the audio executor is written against.

use std::path::Path;

use super::buffer::{FrameBuffer, ProcessingFormat};
use super::converter::LinearConverter;
use super::error::AudioError;
use super::settings::AudioOutputSettings;

/// Answer from the input callback a converter consults when it needs samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputStatus {
    /// The input buffer was filled.
    HaveData,
    /// No input right now; the converter should return what it has.
    NoDataNow,
    /// The source is exhausted.
    EndOfStream,
}

/// Result of one converter invocation.
#[derive(Debug)]
pub enum ConvertStatus {
    /// Output frames were produced.
    HaveData,
    /// Nothing produced; more input is needed.
    InputRanDry,
    /// All input consumed and all output produced.
    EndOfStream,
    /// The converter failed, with the underlying error if it has one.
    Error(Option<AudioError>),
    /// A raw status the binding did not map to a known variant.
    Unknown(i32),
}

/// Decoded audio being read.
pub trait AudioSource {
    fn processing_format(&self) -> ProcessingFormat;

    /// Fills `buffer` with the next frames. A frame length of zero means end
    /// of file.
    fn read(&mut self, buffer: &mut FrameBuffer) -> std::io::Result<()>;
}

/// Encoded audio being written.
pub trait AudioSink {
    fn processing_format(&self) -> ProcessingFormat;

    /// Writes the buffer's valid frames.
    fn write(&mut self, buffer: &FrameBuffer) -> Result<(), AudioError>;

    /// Flushes and closes the destination.
    fn finish(&mut self) -> Result<(), AudioError>;
}

/// Buffered converter that pulls input lazily through a callback.
pub trait SampleConverter {
    /// Fills `output` as far as possible.
    ///
    /// `pull` is handed `input` and asked to fill it; the converter consumes
    /// whatever the callback reports as [`InputStatus::HaveData`].
    fn convert(
        &mut self,
        output: &mut FrameBuffer,
        input: &mut FrameBuffer,
        pull: &mut dyn FnMut(&mut FrameBuffer) -> InputStatus,
    ) -> ConvertStatus;
}

/// The media framework the executor reads, converts and writes through.
pub trait AudioBackend: Send + Sync {
    /// Returns the name of this backend.
    fn name(&self) -> &str;

    fn open_source(&self, path: &Path) -> Result<Box<dyn AudioSource>, AudioError>;

    fn open_sink(
        &self,
        path: &Path,
        settings: &AudioOutputSettings,
    ) -> Result<Box<dyn AudioSink>, AudioError>;

    /// Creates a converter between two processing formats.
    fn make_converter(
        &self,
        from: &ProcessingFormat,
        to: &ProcessingFormat,
    ) -> Result<Box<dyn SampleConverter>, AudioError> {
        let converter = LinearConverter::new(*from, *to)?;
        Ok(Box::new(converter))
    }
}
