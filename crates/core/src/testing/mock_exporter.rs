//! Mock asset exporter for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::catalog::VideoFormat;
use crate::video::{
    AssetExporter, ExportOutcome, ExportPreset, ExportRequest, TrackKind, VideoError,
};

#[derive(Debug)]
struct State {
    tracks: Vec<TrackKind>,
    supported_types: Option<Vec<String>>,
    written_extension: Option<String>,
    write_output: bool,
    next_error: Option<String>,
    requests: Vec<ExportRequest>,
}

/// Mock implementation of the AssetExporter trait.
///
/// By default the asset has a video and an audio track, the supported types
/// follow the preset rules for the catalog formats, and exports write a small
/// file at the requested path.
#[derive(Debug, Clone)]
pub struct MockExporter {
    state: Arc<Mutex<State>>,
}

impl Default for MockExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExporter {
    /// Create a new mock exporter.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                tracks: vec![TrackKind::Video, TrackKind::Audio],
                supported_types: None,
                written_extension: None,
                write_output: true,
                next_error: None,
                requests: Vec::new(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the tracks every asset reports.
    pub fn set_tracks(&self, tracks: Vec<TrackKind>) {
        self.state().tracks = tracks;
    }

    /// Override the supported file types for every preset.
    pub fn set_supported_types(&self, types: Option<Vec<String>>) {
        self.state().supported_types = types;
    }

    /// Write the output with this extension instead of the requested one.
    pub fn set_written_extension(&self, extension: Option<String>) {
        self.state().written_extension = extension;
    }

    /// When false, exports succeed without creating a file.
    pub fn set_write_output(&self, enabled: bool) {
        self.state().write_output = enabled;
    }

    /// Make the next export fail with this reason.
    pub fn set_next_error(&self, reason: impl Into<String>) {
        self.state().next_error = Some(reason.into());
    }

    /// Get all export requests received.
    pub fn recorded_requests(&self) -> Vec<ExportRequest> {
        self.state().requests.clone()
    }
}

#[async_trait]
impl AssetExporter for MockExporter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn load_tracks(&self, _path: &Path) -> Result<Vec<TrackKind>, VideoError> {
        Ok(self.state().tracks.clone())
    }

    async fn supported_file_types(
        &self,
        source: &Path,
        preset: ExportPreset,
    ) -> Result<Vec<String>, VideoError> {
        let override_types = self.state().supported_types.clone();
        if let Some(types) = override_types {
            return Ok(types);
        }
        let source_format = VideoFormat::from_path(source);
        Ok(VideoFormat::ALL
            .into_iter()
            .filter(|f| preset.offers(source_format, *f))
            .map(|f| f.container_type().to_string())
            .collect())
    }

    async fn export(&self, request: ExportRequest) -> Result<ExportOutcome, VideoError> {
        let (written_extension, write_output, next_error) = {
            let mut state = self.state();
            state.requests.push(request.clone());
            (
                state.written_extension.clone(),
                state.write_output,
                state.next_error.take(),
            )
        };

        if let Some(reason) = next_error {
            return Err(VideoError::export_failed(reason, None));
        }

        let output_path = match written_extension {
            Some(ext) => request.output_path.with_extension(ext),
            None => request.output_path.clone(),
        };
        if write_output {
            tokio::fs::write(&output_path, b"mock video")
                .await
                .map_err(|e| VideoError::export_failed(e.to_string(), None))?;
        }

        Ok(ExportOutcome {
            output_path,
            file_type: request.file_type,
        })
    }
}
