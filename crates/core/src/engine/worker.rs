//! Blocking job execution on the worker thread.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::info;

use super::error::EngineError;
use super::OutputFormat;
use crate::archive::ArchiveExecutor;
use crate::audio::{AudioBackend, AudioExecutor};
use crate::config::Config;
use crate::job::JobBuilder;
use crate::selection::{Selection, SelectionError};
use crate::video::{AssetExporter, VideoExecutor};

/// Everything one job needs, moved onto the blocking worker.
pub(crate) struct Worker {
    pub(crate) config: Config,
    pub(crate) audio: Arc<dyn AudioBackend>,
    pub(crate) exporter: Arc<dyn AssetExporter>,
    pub(crate) runtime: Handle,
}

impl Worker {
    /// Builds the job for `format` and executes it.
    pub(crate) fn run(
        &self,
        selection: &Selection,
        format: OutputFormat,
    ) -> Result<Vec<PathBuf>, EngineError> {
        let builder = JobBuilder::new();

        let outputs = match format {
            OutputFormat::Archive(format) => {
                let job = builder.archive(selection, format)?;
                let executor = ArchiveExecutor::new(self.config.tools.clone());
                vec![executor.execute(&job)?]
            }
            OutputFormat::Audio(format) => {
                let job = builder.audio(selection, format)?;
                let executor = AudioExecutor::new(Arc::clone(&self.audio), self.config.audio.clone());
                executor.execute(&job)?
            }
            OutputFormat::Video(format) => {
                let executor = VideoExecutor::new(Arc::clone(&self.exporter), self.runtime.clone());
                let source = selection.single().ok_or(SelectionError::NotSingleVideo)?;
                let alternatives = self.runtime.block_on(executor.available_outputs(source));
                let job = builder.video(selection, format, &alternatives)?;
                vec![executor.execute(&job)?]
            }
        };

        info!(outputs = outputs.len(), "Job finished");
        Ok(outputs)
    }
}
