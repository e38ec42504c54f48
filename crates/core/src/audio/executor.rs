//! Runs audio convert jobs through the streaming pull loop.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::buffer::FrameBuffer;
use super::error::{AudioError, TaskFailure};
use super::settings::AudioOutputSettings;
use super::traits::{AudioBackend, AudioSource, ConvertStatus, InputStatus};
use crate::config::AudioConfig;
use crate::fs::has_content;
use crate::job::{ConvertJob, ConvertTask};

/// Executes audio convert jobs one task at a time.
pub struct AudioExecutor {
    backend: Arc<dyn AudioBackend>,
    config: AudioConfig,
}

impl AudioExecutor {
    pub fn new(backend: Arc<dyn AudioBackend>, config: AudioConfig) -> Self {
        Self { backend, config }
    }

    /// Runs every task in order. The first failure aborts the rest; outputs
    /// of tasks that already finished stay on disk.
    pub fn execute(&self, job: &ConvertJob) -> Result<Vec<PathBuf>, TaskFailure> {
        info!(
            backend = self.backend.name(),
            tasks = job.tasks.len(),
            format = %job.output_format,
            "Starting audio conversion"
        );

        let mut outputs = Vec::with_capacity(job.tasks.len());
        for (index, task) in job.tasks.iter().enumerate() {
            outputs.push(self.run_task(index, task)?);
        }
        Ok(outputs)
    }

    /// Converts one file.
    ///
    /// Any failure is double-checked against the filesystem: a destination
    /// that exists and is non-empty counts as success even if the conversion
    /// reported an error after writing it.
    pub fn run_task(&self, index: usize, task: &ConvertTask) -> Result<PathBuf, TaskFailure> {
        debug!(
            index,
            source = %task.source_path.display(),
            output = %task.output_path.display(),
            "Converting audio task"
        );

        match self.convert(task) {
            Ok(()) => Ok(task.output_path.clone()),
            Err(error) if has_content(&task.output_path) => {
                warn!(
                    index,
                    output = %task.output_path.display(),
                    code = error.code(),
                    error = %error,
                    "Conversion reported an error but produced output; keeping it"
                );
                Ok(task.output_path.clone())
            }
            Err(error) => {
                let failure = TaskFailure {
                    index,
                    source_path: task.source_path.clone(),
                    error,
                };
                warn!(diagnostics = %failure.diagnostics(), "Audio task failed");
                Err(failure)
            }
        }
    }

    fn convert(&self, task: &ConvertTask) -> Result<(), AudioError> {
        let mut source = self.backend.open_source(&task.source_path)?;
        let source_format = source.processing_format();

        let settings = AudioOutputSettings::resolve(
            task.output_format,
            &source_format,
            self.config.aac_bitrate_kbps,
        )?;
        settings.validate()?;

        let mut sink = self.backend.open_sink(&task.output_path, &settings)?;
        let sink_format = sink.processing_format();
        let mut converter = self.backend.make_converter(&source_format, &sink_format)?;

        let input_frames = self.config.input_frames;
        let output_frames = output_capacity(
            input_frames,
            source_format.sample_rate,
            sink_format.sample_rate,
            self.config.headroom_frames,
        );
        let mut input = FrameBuffer::new(source_format, input_frames)?;
        let mut output = FrameBuffer::new(sink_format, output_frames)?;

        let mut reader = PullReader::new(source.as_mut());
        loop {
            output.reset();
            reader.begin_call();
            let status = converter.convert(&mut output, &mut input, &mut |buffer| {
                reader.supply(buffer)
            });

            if let Some(source) = reader.take_error() {
                return Err(AudioError::ReadFailed {
                    path: task.source_path.clone(),
                    source,
                });
            }

            if !output.is_empty() {
                sink.write(&output)?;
            }

            match PullState::from(status) {
                PullState::HaveOutput | PullState::AwaitingInput => continue,
                PullState::EndOfStream => break,
                PullState::Errored(error) => return Err(error),
            }
        }

        sink.finish()?;
        drop(sink);

        if has_content(&task.output_path) {
            Ok(())
        } else {
            Err(AudioError::OutputMissing {
                path: task.output_path.clone(),
            })
        }
    }
}

/// Output buffer capacity for a rate change, with headroom.
///
/// Scales the input capacity by `output_rate / input_rate`, never by less
/// than 1.0.
pub fn output_capacity(
    input_frames: usize,
    input_rate: u32,
    output_rate: u32,
    headroom_frames: usize,
) -> usize {
    let ratio = if input_rate == 0 {
        1.0
    } else {
        (output_rate as f64 / input_rate as f64).max(1.0)
    };
    (input_frames as f64 * ratio).ceil() as usize + headroom_frames
}

/// What the loop does after one converter call.
#[derive(Debug)]
enum PullState {
    AwaitingInput,
    HaveOutput,
    EndOfStream,
    Errored(AudioError),
}

impl From<ConvertStatus> for PullState {
    fn from(status: ConvertStatus) -> Self {
        match status {
            ConvertStatus::HaveData => Self::HaveOutput,
            ConvertStatus::InputRanDry => Self::AwaitingInput,
            ConvertStatus::EndOfStream => Self::EndOfStream,
            ConvertStatus::Error(Some(error)) => Self::Errored(error),
            ConvertStatus::Error(None) => {
                Self::Errored(AudioError::conversion_failed("converter reported an error"))
            }
            ConvertStatus::Unknown(status) => Self::Errored(AudioError::UnexpectedStatus { status }),
        }
    }
}

/// Input callback state for one conversion.
///
/// Read errors are deferred: the callback answers "no data now" and the loop
/// surfaces the error once the converter returns.
struct PullReader<'a> {
    source: &'a mut dyn AudioSource,
    pending_error: Option<io::Error>,
    end_of_stream: bool,
    supplied: bool,
}

impl<'a> PullReader<'a> {
    fn new(source: &'a mut dyn AudioSource) -> Self {
        Self {
            source,
            pending_error: None,
            end_of_stream: false,
            supplied: false,
        }
    }

    /// At most one input buffer is handed over per converter call.
    fn begin_call(&mut self) {
        self.supplied = false;
    }

    fn supply(&mut self, buffer: &mut FrameBuffer) -> InputStatus {
        if self.pending_error.is_some() {
            return InputStatus::NoDataNow;
        }
        if self.end_of_stream {
            return InputStatus::EndOfStream;
        }
        if self.supplied {
            return InputStatus::NoDataNow;
        }

        match self.source.read(buffer) {
            Err(e) => {
                self.pending_error = Some(e);
                InputStatus::NoDataNow
            }
            Ok(()) if buffer.is_empty() => {
                self.end_of_stream = true;
                InputStatus::EndOfStream
            }
            Ok(()) => {
                self.supplied = true;
                InputStatus::HaveData
            }
        }
    }

    fn take_error(&mut self) -> Option<io::Error> {
        self.pending_error.take()
    }
}
