//! Runs video convert jobs and discovers alternative containers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use super::error::VideoError;
use super::traits::{AssetExporter, ExportPreset, ExportRequest, TrackKind};
use crate::catalog::VideoFormat;
use crate::fs::has_content;
use crate::job::VideoConvertJob;

/// Executes video convert jobs on a blocking worker thread.
///
/// The exporter is asynchronous; every call is bridged with
/// [`Handle::block_on`], so [`VideoExecutor::execute`] must not be called
/// from inside the runtime's async context.
pub struct VideoExecutor {
    exporter: Arc<dyn AssetExporter>,
    runtime: Handle,
}

impl VideoExecutor {
    pub fn new(exporter: Arc<dyn AssetExporter>, runtime: Handle) -> Self {
        Self { exporter, runtime }
    }

    /// Converts the job's source to its output container.
    pub fn execute(&self, job: &VideoConvertJob) -> Result<PathBuf, VideoError> {
        let tracks = self
            .runtime
            .block_on(self.exporter.load_tracks(&job.source_path))?;
        if !tracks.contains(&TrackKind::Video) {
            return Err(VideoError::NoVideoTrack {
                path: job.source_path.clone(),
            });
        }

        let preset = ExportPreset::for_conversion(job.source_format, job.output_format);
        let file_type = job.output_format.container_type();
        let supported = self
            .runtime
            .block_on(self.exporter.supported_file_types(&job.source_path, preset))?;
        if !supported.iter().any(|t| t == file_type) {
            return Err(VideoError::UnsupportedOutputType {
                format: job.output_format,
                supported,
            });
        }

        info!(
            exporter = self.exporter.name(),
            source = %job.source_path.display(),
            output = %job.output_path.display(),
            preset = ?preset,
            "Starting video export"
        );

        let request = ExportRequest {
            source: job.source_path.clone(),
            output_path: job.output_path.clone(),
            file_type: file_type.to_string(),
            preset,
            optimize_for_network: false,
        };
        let outcome = self.runtime.block_on(self.exporter.export(request))?;
        debug!(file_type = %outcome.file_type, "Export finished");

        if !has_content(&outcome.output_path) {
            return Err(VideoError::OutputMissing {
                path: outcome.output_path,
            });
        }

        let expected = job.output_format.extension();
        let actual = outcome
            .output_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        if actual != expected {
            return Err(VideoError::ExtensionMismatch {
                expected: expected.to_string(),
                path: outcome.output_path,
            });
        }

        Ok(outcome.output_path)
    }

    /// Formats `source` can be converted to, excluding its own.
    ///
    /// Every catalog format is checked against what the exporter supports for
    /// the preset that conversion would use. Exporter failures count as
    /// "nothing supported".
    pub async fn available_outputs(&self, source: &Path) -> Vec<VideoFormat> {
        let Some(source_format) = VideoFormat::from_path(source) else {
            return Vec::new();
        };

        let mut by_preset: HashMap<ExportPreset, Vec<String>> = HashMap::new();
        let mut supported = Vec::new();
        for target in VideoFormat::ALL {
            let preset = ExportPreset::for_conversion(source_format, target);
            if !by_preset.contains_key(&preset) {
                let types = match self.exporter.supported_file_types(source, preset).await {
                    Ok(types) => types,
                    Err(e) => {
                        warn!(source = %source.display(), preset = ?preset, error = %e, "Could not query supported file types");
                        Vec::new()
                    }
                };
                by_preset.insert(preset, types);
            }
            let offered = by_preset
                .get(&preset)
                .is_some_and(|types| types.iter().any(|t| t == target.container_type()));
            if offered {
                supported.push(target);
            }
        }

        source_format.alternative_outputs(&supported)
    }
}
