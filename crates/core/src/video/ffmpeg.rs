//! FFmpeg-based asset exporter.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::error::VideoError;
use super::traits::{AssetExporter, ExportOutcome, ExportPreset, ExportRequest, TrackKind};
use crate::catalog::VideoFormat;
use crate::config::{ToolsConfig, VideoConfig};

/// Exporter driving the `ffmpeg` and `ffprobe` executables.
#[derive(Debug, Clone)]
pub struct FfmpegExporter {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    config: VideoConfig,
}

impl FfmpegExporter {
    pub fn new(tools: &ToolsConfig, config: VideoConfig) -> Self {
        Self {
            ffmpeg: tools.ffmpeg.clone(),
            ffprobe: tools.ffprobe.clone(),
            config,
        }
    }

    /// Muxers this ffmpeg build can write.
    async fn muxers(&self) -> Result<Vec<String>, VideoError> {
        let output = Command::new(&self.ffmpeg)
            .args(["-hide_banner", "-muxers"])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| VideoError::export_failed(format!("could not run ffmpeg: {e}"), None))?;

        if !output.status.success() {
            return Err(VideoError::export_failed(
                "ffmpeg -muxers failed",
                Some(String::from_utf8_lossy(&output.stderr).into_owned()),
            ));
        }

        Ok(parse_muxers(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Builds ffmpeg arguments for an export.
    fn build_export_args(&self, request: &ExportRequest) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-nostdin".to_string(),
            // Never overwrite; the output path is already collision-free
            "-n".to_string(),
            "-i".to_string(),
            request.source.to_string_lossy().to_string(),
            "-map".to_string(),
            "0:v".to_string(),
            "-map".to_string(),
            "0:a?".to_string(),
        ];

        match request.preset {
            ExportPreset::Passthrough => {
                args.extend(["-c".to_string(), "copy".to_string()]);
            }
            ExportPreset::HighestQuality => {
                args.extend([
                    "-c:v".to_string(),
                    "libx264".to_string(),
                    "-preset".to_string(),
                    "slow".to_string(),
                    "-crf".to_string(),
                    self.config.reencode_crf.to_string(),
                    "-c:a".to_string(),
                    "aac".to_string(),
                    "-b:a".to_string(),
                    format!("{}k", self.config.reencode_audio_bitrate_kbps),
                ]);
            }
        }

        if request.optimize_for_network {
            args.extend(["-movflags".to_string(), "+faststart".to_string()]);
        }

        args.extend([
            "-f".to_string(),
            request.file_type.clone(),
            request.output_path.to_string_lossy().to_string(),
        ]);
        args
    }
}

#[async_trait]
impl AssetExporter for FfmpegExporter {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn load_tracks(&self, path: &Path) -> Result<Vec<TrackKind>, VideoError> {
        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-show_entries", "stream=codec_type", "-of", "json"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| VideoError::track_load_failed(path, format!("could not run ffprobe: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VideoError::track_load_failed(path, stderr.trim()));
        }

        parse_tracks(path, &String::from_utf8_lossy(&output.stdout))
    }

    async fn supported_file_types(
        &self,
        source: &Path,
        preset: ExportPreset,
    ) -> Result<Vec<String>, VideoError> {
        let muxers = self.muxers().await?;
        let source_format = VideoFormat::from_path(source);

        Ok(VideoFormat::ALL
            .into_iter()
            .filter(|f| preset.offers(source_format, *f))
            .map(|f| f.container_type())
            .filter(|t| muxers.iter().any(|m| m == t))
            .map(str::to_string)
            .collect())
    }

    async fn export(&self, request: ExportRequest) -> Result<ExportOutcome, VideoError> {
        let args = self.build_export_args(&request);
        debug!(args = ?args, "Running ffmpeg export");

        let output = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| VideoError::export_failed(format!("could not run ffmpeg: {e}"), None))?;

        if !output.status.success() {
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            return Err(VideoError::export_failed(
                format!("ffmpeg exited with {code}"),
                Some(String::from_utf8_lossy(&output.stderr).into_owned()),
            ));
        }

        Ok(ExportOutcome {
            output_path: request.output_path,
            file_type: request.file_type,
        })
    }
}

/// Parses `ffprobe -show_entries stream=codec_type -of json` output.
fn parse_tracks(path: &Path, output: &str) -> Result<Vec<TrackKind>, VideoError> {
    #[derive(Deserialize)]
    struct ProbeOutput {
        #[serde(default)]
        streams: Vec<ProbeStream>,
    }

    #[derive(Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
    }

    let probe: ProbeOutput = serde_json::from_str(output).map_err(|e| {
        VideoError::track_load_failed(path, format!("unreadable ffprobe output: {e}"))
    })?;

    Ok(probe
        .streams
        .into_iter()
        .map(|s| match s.codec_type.as_deref() {
            Some("video") => TrackKind::Video,
            Some("audio") => TrackKind::Audio,
            Some("subtitle") => TrackKind::Subtitle,
            _ => TrackKind::Other,
        })
        .collect())
}

/// Parses `ffmpeg -muxers` output into muxer names.
fn parse_muxers(output: &str) -> Vec<String> {
    output
        .lines()
        .skip_while(|line| line.trim() != "--")
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let flags = parts.next()?;
            let names = parts.next()?;
            flags.contains('E').then_some(names)
        })
        .flat_map(|names| names.split(','))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MUXERS: &str = "File formats:
 D. = Demuxing supported
 .E = Muxing supported
 --
  E 3g2             3GP2 (3GPP2 file format)
  E ipod            iPod H.264 MP4 (MPEG-4 Part 14)
  E mov             QuickTime / MOV
  E mp4             MP4 (MPEG-4 Part 14)
 D  mpegts          MPEG-TS (MPEG-2 Transport Stream)
";

    fn exporter() -> FfmpegExporter {
        FfmpegExporter::new(&ToolsConfig::default(), VideoConfig::default())
    }

    #[test]
    fn test_parse_muxers() {
        let muxers = parse_muxers(MUXERS);
        assert_eq!(muxers, vec!["3g2", "ipod", "mov", "mp4"]);
    }

    #[test]
    fn test_parse_tracks() {
        let json = r#"{"streams": [{"codec_type": "video"}, {"codec_type": "audio"}, {"codec_type": "data"}]}"#;
        let tracks = parse_tracks(Path::new("/v.mp4"), json).unwrap();
        assert_eq!(tracks, vec![TrackKind::Video, TrackKind::Audio, TrackKind::Other]);
    }

    #[test]
    fn test_parse_tracks_garbage() {
        let err = parse_tracks(Path::new("/v.mp4"), "nope").unwrap_err();
        assert!(matches!(err, VideoError::TrackLoadFailed { .. }));
    }

    #[test]
    fn test_passthrough_args_copy_streams() {
        let request = ExportRequest {
            source: PathBuf::from("/v/clip.mp4"),
            output_path: PathBuf::from("/v/clip.m4v"),
            file_type: "ipod".to_string(),
            preset: ExportPreset::Passthrough,
            optimize_for_network: false,
        };
        let args = exporter().build_export_args(&request).join(" ");
        assert!(args.contains("-n -i /v/clip.mp4"));
        assert!(args.contains("-c copy"));
        assert!(!args.contains("faststart"));
        assert!(args.ends_with("-f ipod /v/clip.m4v"));
    }

    #[test]
    fn test_reencode_args_use_config() {
        let request = ExportRequest {
            source: PathBuf::from("/v/clip.mov"),
            output_path: PathBuf::from("/v/clip.mp4"),
            file_type: "mp4".to_string(),
            preset: ExportPreset::HighestQuality,
            optimize_for_network: true,
        };
        let args = exporter().build_export_args(&request).join(" ");
        assert!(args.contains("-c:v libx264"));
        assert!(args.contains("-crf 18"));
        assert!(args.contains("-b:a 256k"));
        assert!(args.contains("-movflags +faststart"));
    }
}
