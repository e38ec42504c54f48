use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::catalog::ArchiveTool;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub video: VideoConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Paths of the external executables the engine drives.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default = "default_zip")]
    pub zip: PathBuf,
    #[serde(default = "default_tar")]
    pub tar: PathBuf,
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: PathBuf,
    #[serde(default = "default_ffprobe")]
    pub ffprobe: PathBuf,
}

impl ToolsConfig {
    /// Executable for an archive tool.
    pub fn archive_tool(&self, tool: ArchiveTool) -> &PathBuf {
        match tool {
            ArchiveTool::Zip => &self.zip,
            ArchiveTool::Tar => &self.tar,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            zip: default_zip(),
            tar: default_tar(),
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
        }
    }
}

fn default_zip() -> PathBuf {
    PathBuf::from("zip")
}

fn default_tar() -> PathBuf {
    PathBuf::from("tar")
}

fn default_ffmpeg() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe() -> PathBuf {
    PathBuf::from("ffprobe")
}

/// Audio conversion settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AudioConfig {
    /// Encoder bit rate for M4A (AAC) output.
    #[serde(default = "default_aac_bitrate")]
    pub aac_bitrate_kbps: u32,
    /// Frames pulled from the source per read.
    #[serde(default = "default_input_frames")]
    pub input_frames: usize,
    /// Extra output frames on top of the rate-scaled input capacity.
    #[serde(default = "default_headroom_frames")]
    pub headroom_frames: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            aac_bitrate_kbps: default_aac_bitrate(),
            input_frames: default_input_frames(),
            headroom_frames: default_headroom_frames(),
        }
    }
}

fn default_aac_bitrate() -> u32 {
    256
}

fn default_input_frames() -> usize {
    4096
}

fn default_headroom_frames() -> usize {
    1024
}

/// Video re-encode settings (pass-through ignores them)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VideoConfig {
    #[serde(default = "default_crf")]
    pub reencode_crf: u8,
    #[serde(default = "default_video_audio_bitrate")]
    pub reencode_audio_bitrate_kbps: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            reencode_crf: default_crf(),
            reencode_audio_bitrate_kbps: default_video_audio_bitrate(),
        }
    }
}

fn default_crf() -> u8 {
    18
}

fn default_video_audio_bitrate() -> u32 {
    256
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
