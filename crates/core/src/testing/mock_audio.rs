//! Mock audio backend for testing.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::audio::{
    AudioBackend, AudioError, AudioOutputSettings, AudioSink, AudioSource, ConvertStatus,
    FrameBuffer, InputStatus, LinearConverter, ProcessingFormat, SampleConverter,
};

/// How converters created by [`MockAudioBackend`] behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConverterScript {
    /// Plain [`LinearConverter`].
    #[default]
    Normal,
    /// Report an error without detail on the first call.
    FailImmediately,
    /// Convert normally for this many calls, then report a terminal error.
    ErrorAfterCalls(usize),
    /// Return a raw status the loop does not know.
    UnknownStatus(i32),
}

#[derive(Debug, Clone)]
struct SourceSpec {
    format: ProcessingFormat,
    frames: usize,
    fail_after_reads: Option<usize>,
}

#[derive(Debug, Clone)]
struct SinkRecord {
    settings: AudioOutputSettings,
    frames: usize,
    finished: bool,
}

#[derive(Debug, Default)]
struct State {
    sources: HashMap<PathBuf, SourceSpec>,
    sinks: HashMap<PathBuf, SinkRecord>,
    script: ConverterScript,
    sink_writes: bool,
}

/// Mock implementation of the AudioBackend trait.
///
/// Provides controllable behavior for testing:
/// - Register sources with a format and a frame count (a ramp is generated)
/// - Sinks write the encoded bytes to the real destination path
/// - Inject read failures and scripted converter statuses
///
/// # Example
///
/// ```rust,ignore
/// use packdrop_core::testing::MockAudioBackend;
///
/// let backend = MockAudioBackend::new();
/// backend.add_source("/music/a.wav", format, 44_100);
///
/// let executor = AudioExecutor::new(Arc::new(backend.clone()), AudioConfig::default());
/// executor.execute(&job)?;
///
/// assert_eq!(backend.frames_written("/music/a.aiff"), 44_100);
/// ```
#[derive(Debug, Clone)]
pub struct MockAudioBackend {
    state: Arc<Mutex<State>>,
}

impl Default for MockAudioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAudioBackend {
    /// Create a new mock backend whose sinks write to disk.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                sink_writes: true,
                ..State::default()
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a readable source.
    pub fn add_source(&self, path: impl AsRef<Path>, format: ProcessingFormat, frames: usize) {
        self.state().sources.insert(
            path.as_ref().to_path_buf(),
            SourceSpec {
                format,
                frames,
                fail_after_reads: None,
            },
        );
    }

    /// Make reads from `path` fail after `reads` successful reads.
    pub fn fail_read_after(&self, path: impl AsRef<Path>, reads: usize) {
        if let Some(spec) = self.state().sources.get_mut(path.as_ref()) {
            spec.fail_after_reads = Some(reads);
        }
    }

    /// Set the behavior of converters created from now on.
    pub fn set_converter_script(&self, script: ConverterScript) {
        self.state().script = script;
    }

    /// When false, sinks create an empty destination and only count frames.
    pub fn set_sink_writes(&self, enabled: bool) {
        self.state().sink_writes = enabled;
    }

    /// Frames written to the sink at `path`.
    pub fn frames_written(&self, path: impl AsRef<Path>) -> usize {
        self.state()
            .sinks
            .get(path.as_ref())
            .map(|s| s.frames)
            .unwrap_or(0)
    }

    /// Whether the sink at `path` was finished.
    pub fn sink_finished(&self, path: impl AsRef<Path>) -> bool {
        self.state()
            .sinks
            .get(path.as_ref())
            .is_some_and(|s| s.finished)
    }

    /// Settings the sink at `path` was opened with.
    pub fn sink_settings(&self, path: impl AsRef<Path>) -> Option<AudioOutputSettings> {
        self.state()
            .sinks
            .get(path.as_ref())
            .map(|s| s.settings.clone())
    }
}

impl AudioBackend for MockAudioBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn open_source(&self, path: &Path) -> Result<Box<dyn AudioSource>, AudioError> {
        let spec = self
            .state()
            .sources
            .get(path)
            .cloned()
            .ok_or_else(|| AudioError::SourceOpenFailed {
                path: path.to_path_buf(),
                reason: "not a registered mock source".to_string(),
            })?;

        Ok(Box::new(MockSource {
            spec,
            position: 0,
            reads: 0,
        }))
    }

    fn open_sink(
        &self,
        path: &Path,
        settings: &AudioOutputSettings,
    ) -> Result<Box<dyn AudioSink>, AudioError> {
        let file = File::create(path).map_err(|e| AudioError::SinkOpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let writes = {
            let mut state = self.state();
            state.sinks.insert(
                path.to_path_buf(),
                SinkRecord {
                    settings: settings.clone(),
                    frames: 0,
                    finished: false,
                },
            );
            state.sink_writes
        };

        Ok(Box::new(MockSink {
            path: path.to_path_buf(),
            format: settings.processing_format(),
            file: writes.then_some(file),
            state: Arc::clone(&self.state),
        }))
    }

    fn make_converter(
        &self,
        from: &ProcessingFormat,
        to: &ProcessingFormat,
    ) -> Result<Box<dyn SampleConverter>, AudioError> {
        let inner = LinearConverter::new(*from, *to)?;
        let script = self.state().script;
        Ok(Box::new(ScriptedConverter {
            inner,
            script,
            calls: 0,
        }))
    }
}

struct MockSource {
    spec: SourceSpec,
    position: usize,
    reads: usize,
}

impl AudioSource for MockSource {
    fn processing_format(&self) -> ProcessingFormat {
        self.spec.format
    }

    fn read(&mut self, buffer: &mut FrameBuffer) -> io::Result<()> {
        if self.spec.fail_after_reads.is_some_and(|n| self.reads >= n) {
            return Err(io::Error::other("mock read failure"));
        }
        self.reads += 1;

        buffer.reset();
        let channels = self.spec.format.channels as usize;
        let mut frame = vec![0.0f32; channels];
        while self.position < self.spec.frames && !buffer.is_full() {
            let value = ((self.position % 200) as f32 / 100.0) - 1.0;
            frame.iter_mut().for_each(|s| *s = value * 0.5);
            buffer.push_frame(&frame);
            self.position += 1;
        }
        Ok(())
    }
}

struct MockSink {
    path: PathBuf,
    format: ProcessingFormat,
    file: Option<File>,
    state: Arc<Mutex<State>>,
}

impl MockSink {
    fn record(&self, update: impl FnOnce(&mut SinkRecord)) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(record) = state.sinks.get_mut(&self.path) {
            update(record);
        }
    }

    fn write_failed(&self, e: io::Error) -> AudioError {
        AudioError::WriteFailed {
            path: self.path.clone(),
            reason: e.to_string(),
        }
    }
}

impl AudioSink for MockSink {
    fn processing_format(&self) -> ProcessingFormat {
        self.format
    }

    fn write(&mut self, buffer: &FrameBuffer) -> Result<(), AudioError> {
        if let Some(file) = self.file.as_mut() {
            let result = file.write_all(&buffer.to_le_bytes());
            result.map_err(|e| self.write_failed(e))?;
        }
        let frames = buffer.frame_length();
        self.record(|r| r.frames += frames);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), AudioError> {
        if let Some(file) = self.file.as_mut() {
            let result = file.flush();
            result.map_err(|e| self.write_failed(e))?;
        }
        self.record(|r| r.finished = true);
        Ok(())
    }
}

struct ScriptedConverter {
    inner: LinearConverter,
    script: ConverterScript,
    calls: usize,
}

impl SampleConverter for ScriptedConverter {
    fn convert(
        &mut self,
        output: &mut FrameBuffer,
        input: &mut FrameBuffer,
        pull: &mut dyn FnMut(&mut FrameBuffer) -> InputStatus,
    ) -> ConvertStatus {
        self.calls += 1;
        match self.script {
            ConverterScript::Normal => self.inner.convert(output, input, pull),
            ConverterScript::FailImmediately => ConvertStatus::Error(None),
            ConverterScript::UnknownStatus(code) => ConvertStatus::Unknown(code),
            ConverterScript::ErrorAfterCalls(n) if self.calls > n => ConvertStatus::Error(Some(
                AudioError::conversion_failed("scripted terminal error"),
            )),
            ConverterScript::ErrorAfterCalls(_) => self.inner.convert(output, input, pull),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SampleRepr;
    use crate::catalog::AudioFormat;
    use tempfile::TempDir;

    #[test]
    fn test_source_reads_in_chunks() {
        let backend = MockAudioBackend::new();
        let format = ProcessingFormat::new(8_000, 1, SampleRepr::F32);
        backend.add_source("/a.wav", format, 10);

        let mut source = backend.open_source(Path::new("/a.wav")).unwrap();
        let mut buffer = FrameBuffer::new(format, 4).unwrap();
        let mut lengths = Vec::new();
        loop {
            source.read(&mut buffer).unwrap();
            lengths.push(buffer.frame_length());
            if buffer.is_empty() {
                break;
            }
        }
        assert_eq!(lengths, vec![4, 4, 2, 0]);
    }

    #[test]
    fn test_unregistered_source_fails() {
        let backend = MockAudioBackend::new();
        assert!(backend.open_source(Path::new("/missing.wav")).is_err());
    }

    #[test]
    fn test_sink_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.wav");
        let backend = MockAudioBackend::new();
        let source = ProcessingFormat::new(8_000, 1, SampleRepr::F32);
        let settings = AudioOutputSettings::resolve(AudioFormat::Wav, &source, 256).unwrap();

        let mut sink = backend.open_sink(&path, &settings).unwrap();
        let mut buffer = FrameBuffer::new(sink.processing_format(), 3).unwrap();
        buffer.push_frame(&[0.25]);
        sink.write(&buffer).unwrap();
        sink.finish().unwrap();

        assert_eq!(std::fs::metadata(&path).unwrap().len(), 2);
        assert_eq!(backend.frames_written(&path), 1);
        assert!(backend.sink_finished(&path));
    }
}
