//! Request dispatch and the single job slot.
//!
//! The [`Engine`] answers "which formats can this selection become" and runs
//! at most one job at a time on a blocking worker thread. A request arriving
//! while a job is active is rejected with [`EngineError::Busy`]; nothing is
//! queued.

mod error;
mod worker;

pub use error::EngineError;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::audio::{AudioBackend, FfmpegAudioBackend};
use crate::catalog::{ArchiveFormat, AudioFormat, UnknownFormat, VideoFormat};
use crate::config::Config;
use crate::result::RunResult;
use crate::selection::{self, Selection, SelectionError};
use crate::video::{AssetExporter, FfmpegExporter, VideoExecutor};
use worker::Worker;

/// What the user asked to do with a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Archive,
    Convert,
}

/// A concrete output the user picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "format", rename_all = "snake_case")]
pub enum OutputFormat {
    Archive(ArchiveFormat),
    Audio(AudioFormat),
    Video(VideoFormat),
}

impl OutputFormat {
    /// Resolves a conversion target name, audio formats first.
    pub fn conversion_target(name: &str) -> Result<Self, UnknownFormat> {
        if let Ok(format) = name.parse::<AudioFormat>() {
            return Ok(Self::Audio(format));
        }
        name.parse::<VideoFormat>().map(Self::Video)
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Archive(f) => f.label(),
            Self::Audio(f) => f.label(),
            Self::Video(f) => f.label(),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Archive(format) => fmt::Display::fmt(format, f),
            Self::Audio(format) => fmt::Display::fmt(format, f),
            Self::Video(format) => fmt::Display::fmt(format, f),
        }
    }
}

/// The job currently holding the slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveJob {
    pub id: Uuid,
    pub format: OutputFormat,
    pub started_at: DateTime<Utc>,
}

type Slot = Arc<Mutex<Option<ActiveJob>>>;

fn lock(slot: &Slot) -> MutexGuard<'_, Option<ActiveJob>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Empties the slot when dropped, also while unwinding.
struct SlotRelease {
    slot: Slot,
}

impl Drop for SlotRelease {
    fn drop(&mut self) {
        lock(&self.slot).take();
    }
}

/// A submitted job.
#[derive(Debug)]
pub struct JobHandle {
    id: Uuid,
    task: JoinHandle<Result<Vec<PathBuf>, EngineError>>,
}

impl JobHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Waits for the job and converts its outcome into a [`RunResult`].
    pub async fn wait(self) -> RunResult {
        let outcome = match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => Err(EngineError::WorkerPanicked {
                reason: e.to_string(),
            }),
        };

        match outcome {
            Ok(outputs) => RunResult::Success { outputs },
            Err(e) => {
                let diagnostics = e.diagnostics();
                warn!(job_id = %self.id, error = %e, diagnostics = %diagnostics, "Job failed");
                RunResult::failure(e.user_message(), diagnostics)
            }
        }
    }
}

/// Entry point for collaborators.
pub struct Engine {
    config: Config,
    audio: Arc<dyn AudioBackend>,
    exporter: Arc<dyn AssetExporter>,
    slot: Slot,
}

impl Engine {
    /// Engine driving the configured ffmpeg executables.
    pub fn new(config: Config) -> Self {
        let audio = Arc::new(FfmpegAudioBackend::new(&config.tools));
        let exporter = Arc::new(FfmpegExporter::new(&config.tools, config.video.clone()));
        Self::with_backends(config, audio, exporter)
    }

    /// Engine with custom codec capabilities.
    pub fn with_backends(
        config: Config,
        audio: Arc<dyn AudioBackend>,
        exporter: Arc<dyn AssetExporter>,
    ) -> Self {
        Self {
            config,
            audio,
            exporter,
            slot: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether a job currently holds the slot.
    pub fn is_busy(&self) -> bool {
        lock(&self.slot).is_some()
    }

    /// The job currently holding the slot, if any.
    pub fn active_job(&self) -> Option<ActiveJob> {
        lock(&self.slot).clone()
    }

    /// Output formats to offer for `action` on `selection`.
    ///
    /// Archiving is refused for selections containing an archive. Converting
    /// offers audio outputs for an all-audio selection and alternative
    /// containers for a single video; anything else is refused.
    pub async fn offered_formats(
        &self,
        selection: &Selection,
        action: Action,
    ) -> Result<Vec<OutputFormat>, EngineError> {
        let items = selection.items();
        match action {
            Action::Archive => {
                if let Some(path) = items.iter().find(|p| selection::is_archived_path(p)) {
                    return Err(SelectionError::AlreadyArchived { path: path.clone() }.into());
                }
                Ok(ArchiveFormat::ALL
                    .into_iter()
                    .map(OutputFormat::Archive)
                    .collect())
            }
            Action::Convert => {
                if let Some(inputs) = selection::input_formats(items) {
                    return Ok(AudioFormat::offered_outputs(&inputs)
                        .into_iter()
                        .map(OutputFormat::Audio)
                        .collect());
                }
                match selection.single() {
                    Some(source) if selection::is_single_supported_video(items) => {
                        let executor =
                            VideoExecutor::new(Arc::clone(&self.exporter), Handle::current());
                        Ok(executor
                            .available_outputs(source)
                            .await
                            .into_iter()
                            .map(OutputFormat::Video)
                            .collect())
                    }
                    _ => Err(SelectionError::UnsupportedSelection.into()),
                }
            }
        }
    }

    /// Claims the slot and starts the job on a blocking worker.
    ///
    /// Fails immediately with [`EngineError::Busy`] while another job runs.
    /// Must be called from within a Tokio runtime.
    pub fn submit(
        &self,
        selection: Selection,
        format: OutputFormat,
    ) -> Result<JobHandle, EngineError> {
        let runtime = Handle::try_current().map_err(|_| EngineError::NoRuntime)?;

        let id = Uuid::new_v4();
        {
            let mut slot = lock(&self.slot);
            if slot.is_some() {
                return Err(EngineError::Busy);
            }
            *slot = Some(ActiveJob {
                id,
                format,
                started_at: Utc::now(),
            });
        }
        let release = SlotRelease {
            slot: Arc::clone(&self.slot),
        };

        let worker = Worker {
            config: self.config.clone(),
            audio: Arc::clone(&self.audio),
            exporter: Arc::clone(&self.exporter),
            runtime: runtime.clone(),
        };
        let span = info_span!("job", job_id = %id, format = %format);

        info!(job_id = %id, format = %format, items = selection.len(), "Job submitted");

        let task = runtime.spawn_blocking(move || {
            let _release = release;
            let _entered = span.enter();
            worker.run(&selection, format)
        });

        Ok(JobHandle { id, task })
    }

    /// Submits and waits; every error becomes a failed result.
    pub async fn run(&self, selection: Selection, format: OutputFormat) -> RunResult {
        match self.submit(selection, format) {
            Ok(handle) => handle.wait().await,
            Err(e) => {
                warn!(error = %e, "Job rejected");
                RunResult::failure(e.user_message(), e.diagnostics())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{ProcessingFormat, SampleRepr};
    use crate::testing::{MockAudioBackend, MockExporter};
    use tempfile::TempDir;

    fn engine(audio: &MockAudioBackend, exporter: &MockExporter) -> Engine {
        Engine::with_backends(
            Config::default(),
            Arc::new(audio.clone()),
            Arc::new(exporter.clone()),
        )
    }

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"data").unwrap();
        path
    }

    #[test]
    fn test_conversion_target() {
        assert_eq!(
            OutputFormat::conversion_target("AIFF").unwrap(),
            OutputFormat::Audio(AudioFormat::Aiff)
        );
        assert_eq!(
            OutputFormat::conversion_target("m4v").unwrap(),
            OutputFormat::Video(VideoFormat::M4v)
        );
        assert!(OutputFormat::conversion_target("zip").is_err());
    }

    #[tokio::test]
    async fn test_offered_archive_formats() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&MockAudioBackend::new(), &MockExporter::new());

        let selection = Selection::new([touch(&dir, "a.txt")]).unwrap();
        let formats = engine
            .offered_formats(&selection, Action::Archive)
            .await
            .unwrap();
        assert_eq!(formats.len(), 3);

        let selection = Selection::new([touch(&dir, "b.tar.gz")]).unwrap();
        let err = engine
            .offered_formats(&selection, Action::Archive)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Selection(SelectionError::AlreadyArchived { .. })
        ));
    }

    #[tokio::test]
    async fn test_offered_audio_formats() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&MockAudioBackend::new(), &MockExporter::new());
        let selection = Selection::new([touch(&dir, "a.mp3"), touch(&dir, "b.flac")]).unwrap();

        let formats = engine
            .offered_formats(&selection, Action::Convert)
            .await
            .unwrap();
        assert_eq!(
            formats,
            vec![
                OutputFormat::Audio(AudioFormat::M4a),
                OutputFormat::Audio(AudioFormat::Wav)
            ]
        );
    }

    #[tokio::test]
    async fn test_offered_video_formats() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&MockAudioBackend::new(), &MockExporter::new());
        let selection = Selection::new([touch(&dir, "clip.mov")]).unwrap();

        let formats = engine
            .offered_formats(&selection, Action::Convert)
            .await
            .unwrap();
        assert_eq!(
            formats,
            vec![
                OutputFormat::Video(VideoFormat::Mp4),
                OutputFormat::Video(VideoFormat::M4v)
            ]
        );
    }

    #[tokio::test]
    async fn test_mixed_selection_cannot_convert() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&MockAudioBackend::new(), &MockExporter::new());
        let selection = Selection::new([touch(&dir, "a.wav"), touch(&dir, "b.txt")]).unwrap();

        let err = engine
            .offered_formats(&selection, Action::Convert)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Selection(SelectionError::UnsupportedSelection)
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_audio_job_through_engine() {
        let dir = TempDir::new().unwrap();
        let audio = MockAudioBackend::new();
        let source = touch(&dir, "song.wav");
        audio.add_source(&source, ProcessingFormat::new(44_100, 2, SampleRepr::F32), 1_000);
        let engine = engine(&audio, &MockExporter::new());

        let result = engine
            .run(
                Selection::new([source]).unwrap(),
                OutputFormat::Audio(AudioFormat::Aiff),
            )
            .await;

        assert_eq!(result.outputs(), &[dir.path().join("song.aiff")]);
        assert!(!engine.is_busy());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_selection_errors_become_failures() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&MockAudioBackend::new(), &MockExporter::new());
        let selection = Selection::new([touch(&dir, "a.zip")]).unwrap();

        let result = engine
            .run(selection, OutputFormat::Archive(ArchiveFormat::Zip))
            .await;

        match result {
            RunResult::Failure { message, .. } => {
                assert!(message.contains("already an archive"), "{message}")
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(!engine.is_busy());
    }

    #[test]
    fn test_submit_outside_runtime() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&MockAudioBackend::new(), &MockExporter::new());
        let selection = Selection::new([touch(&dir, "a.txt")]).unwrap();

        let err = engine
            .submit(selection, OutputFormat::Archive(ArchiveFormat::Zip))
            .unwrap_err();
        assert!(matches!(err, EngineError::NoRuntime));
        assert!(!engine.is_busy());
    }
}
