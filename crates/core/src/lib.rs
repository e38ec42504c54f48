pub mod archive;
pub mod audio;
pub mod catalog;
pub mod config;
pub mod engine;
mod fs;
pub mod job;
pub mod naming;
pub mod result;
pub mod selection;
pub mod testing;
pub mod video;

pub use archive::{ArchiveError, ArchiveExecutor};
pub use audio::{AudioBackend, AudioError, AudioExecutor, FfmpegAudioBackend, TaskFailure};
pub use catalog::{ArchiveFormat, AudioFormat, VideoFormat};
pub use config::{
    load_config, load_config_from_str, load_default_config, validate_config, Config, ConfigError,
};
pub use engine::{Action, ActiveJob, Engine, EngineError, JobHandle, OutputFormat};
pub use job::{Job, JobBuilder, JobError};
pub use result::RunResult;
pub use selection::{Selection, SelectionError};
pub use video::{AssetExporter, FfmpegExporter, VideoError, VideoExecutor};
