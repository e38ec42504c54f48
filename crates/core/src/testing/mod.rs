//! Testing utilities and mock codec capabilities.
//!
//! The mocks stand in for the ffmpeg-backed audio backend and asset exporter
//! so executors and the engine can be tested without external binaries.
//!
//! # Example
//!
//! ```rust,ignore
//! use packdrop_core::testing::{MockAudioBackend, MockExporter};
//!
//! let audio = MockAudioBackend::new();
//! audio.add_source("/music/a.wav", format, 44_100);
//!
//! let engine = Engine::with_backends(config, Arc::new(audio), Arc::new(MockExporter::new()));
//! ```

mod mock_audio;
mod mock_exporter;

pub use mock_audio::{ConverterScript, MockAudioBackend};
pub use mock_exporter::MockExporter;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    /// Writes a small file named `name` into `dir` and returns its path.
    ///
    /// Panics if the file cannot be written.
    pub fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"fixture data").expect("failed to write fixture file");
        path
    }

    /// Whether an executable can be launched from `PATH`.
    pub fn tool_available(name: &str) -> bool {
        std::process::Command::new(name)
            .arg("--version")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .is_ok()
    }
}
