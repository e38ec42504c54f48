//! FFmpeg-backed audio source and sink.
//!
//! Sources decode to raw little-endian f32 on a pipe; sinks take raw
//! little-endian samples on stdin and encode to the target container. All
//! sample-level work in between happens in-process.

use serde::Deserialize;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use tracing::{debug, warn};

use super::buffer::{FrameBuffer, ProcessingFormat, SampleRepr};
use super::error::AudioError;
use super::settings::AudioOutputSettings;
use super::traits::{AudioBackend, AudioSink, AudioSource};
use crate::catalog::{AudioEncoding, AudioFormat, Endianness};
use crate::config::ToolsConfig;

/// Audio backend driving the `ffmpeg` and `ffprobe` executables.
#[derive(Debug, Clone)]
pub struct FfmpegAudioBackend {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegAudioBackend {
    pub fn new(tools: &ToolsConfig) -> Self {
        Self {
            ffmpeg: tools.ffmpeg.clone(),
            ffprobe: tools.ffprobe.clone(),
        }
    }

    fn probe(&self, path: &Path) -> Result<ProcessingFormat, AudioError> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "a:0",
                "-show_entries",
                "stream=sample_rate,channels",
                "-of",
                "json",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| source_open_failed(path, format!("could not run ffprobe: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(source_open_failed(path, stderr.trim()));
        }

        parse_probe_output(path, &String::from_utf8_lossy(&output.stdout))
    }
}

impl AudioBackend for FfmpegAudioBackend {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn open_source(&self, path: &Path) -> Result<Box<dyn AudioSource>, AudioError> {
        let format = self.probe(path)?;
        let source = FfmpegSource::spawn(&self.ffmpeg, path, format)?;
        Ok(Box::new(source))
    }

    fn open_sink(
        &self,
        path: &Path,
        settings: &AudioOutputSettings,
    ) -> Result<Box<dyn AudioSink>, AudioError> {
        let sink = FfmpegSink::spawn(&self.ffmpeg, path, settings)?;
        Ok(Box::new(sink))
    }
}

/// Parses `ffprobe -of json` output for the first audio stream.
fn parse_probe_output(path: &Path, output: &str) -> Result<ProcessingFormat, AudioError> {
    #[derive(Deserialize)]
    struct ProbeOutput {
        #[serde(default)]
        streams: Vec<ProbeStream>,
    }

    #[derive(Deserialize)]
    struct ProbeStream {
        sample_rate: Option<String>,
        channels: Option<u16>,
    }

    let probe: ProbeOutput = serde_json::from_str(output)
        .map_err(|e| source_open_failed(path, format!("unreadable ffprobe output: {e}")))?;

    let stream = probe
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| source_open_failed(path, "no audio stream"))?;

    let sample_rate = stream
        .sample_rate
        .as_deref()
        .and_then(|rate| rate.parse::<u32>().ok())
        .filter(|rate| *rate > 0)
        .ok_or_else(|| source_open_failed(path, "missing sample rate"))?;
    let channels = stream
        .channels
        .filter(|channels| *channels > 0)
        .ok_or_else(|| source_open_failed(path, "missing channel count"))?;

    Ok(ProcessingFormat::new(sample_rate, channels, SampleRepr::F32))
}

fn source_open_failed(path: &Path, reason: impl Into<String>) -> AudioError {
    AudioError::SourceOpenFailed {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Collects a child's stderr on a helper thread so the pipe never fills.
fn drain_stderr(child: &mut Child) -> Option<JoinHandle<String>> {
    let mut stderr = child.stderr.take()?;
    Some(std::thread::spawn(move || {
        let mut text = String::new();
        let _ = stderr.read_to_string(&mut text);
        text
    }))
}

fn join_stderr(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

fn describe_exit(status: ExitStatus, stderr: &str) -> String {
    let code = status
        .code()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string());
    if stderr.is_empty() {
        format!("ffmpeg exited with {code}")
    } else {
        format!("ffmpeg exited with {code}: {stderr}")
    }
}

/// Decoding ffmpeg process read as interleaved f32 frames.
struct FfmpegSource {
    path: PathBuf,
    format: ProcessingFormat,
    child: Child,
    stdout: ChildStdout,
    stderr: Option<JoinHandle<String>>,
    bytes: Vec<u8>,
    finished: bool,
}

impl FfmpegSource {
    fn spawn(ffmpeg: &Path, path: &Path, format: ProcessingFormat) -> Result<Self, AudioError> {
        let mut child = Command::new(ffmpeg)
            .args(["-hide_banner", "-loglevel", "error", "-nostdin", "-i"])
            .arg(path)
            .args(["-vn", "-f", "f32le", "-acodec", "pcm_f32le"])
            .args(["-ac", &format.channels.to_string()])
            .args(["-ar", &format.sample_rate.to_string()])
            .arg("pipe:1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| source_open_failed(path, format!("could not run ffmpeg: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| source_open_failed(path, "decoder stdout unavailable"))?;
        let stderr = drain_stderr(&mut child);

        debug!(path = %path.display(), rate = format.sample_rate, channels = format.channels, "Opened audio source");

        Ok(Self {
            path: path.to_path_buf(),
            format,
            child,
            stdout,
            stderr,
            bytes: Vec::new(),
            finished: false,
        })
    }

    fn wait_decoder(&mut self) -> io::Result<()> {
        let status = self.child.wait()?;
        let stderr = join_stderr(self.stderr.take());
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!(
                "decoding {} failed: {}",
                self.path.display(),
                describe_exit(status, &stderr)
            )))
        }
    }
}

impl AudioSource for FfmpegSource {
    fn processing_format(&self) -> ProcessingFormat {
        self.format
    }

    fn read(&mut self, buffer: &mut FrameBuffer) -> io::Result<()> {
        buffer.reset();
        if self.finished {
            return Ok(());
        }

        let wanted = buffer.capacity() * self.format.frame_bytes();
        self.bytes.resize(wanted, 0);

        let mut filled = 0;
        while filled < wanted {
            match self.stdout.read(&mut self.bytes[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }

        let frames = buffer.load_le_bytes(&self.bytes[..filled]);
        if frames == 0 {
            self.finished = true;
            self.wait_decoder()?;
        }
        Ok(())
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Encoding ffmpeg process fed raw samples on stdin.
struct FfmpegSink {
    path: PathBuf,
    format: ProcessingFormat,
    child: Child,
    stdin: Option<ChildStdin>,
    stderr: Option<JoinHandle<String>>,
    finished: bool,
}

impl FfmpegSink {
    fn spawn(
        ffmpeg: &Path,
        path: &Path,
        settings: &AudioOutputSettings,
    ) -> Result<Self, AudioError> {
        let format = settings.processing_format();
        let args = sink_arguments(settings).ok_or(AudioError::UnsupportedOutput {
            format: settings.format,
        })?;

        let mut child = Command::new(ffmpeg)
            .args(&args)
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AudioError::SinkOpenFailed {
                path: path.to_path_buf(),
                reason: format!("could not run ffmpeg: {e}"),
            })?;

        let stdin = child.stdin.take();
        let stderr = drain_stderr(&mut child);

        debug!(path = %path.display(), format = %settings.format, "Opened audio sink");

        Ok(Self {
            path: path.to_path_buf(),
            format,
            child,
            stdin,
            stderr,
            finished: false,
        })
    }

    fn write_failed(&self, reason: impl Into<String>) -> AudioError {
        AudioError::WriteFailed {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }
}

/// ffmpeg arguments up to (not including) the output path.
fn sink_arguments(settings: &AudioOutputSettings) -> Option<Vec<String>> {
    let format = settings.processing_format();
    let raw_input = match format.sample {
        SampleRepr::F32 => "f32le",
        SampleRepr::I16 => "s16le",
    };

    let mut args: Vec<String> = [
        "-hide_banner",
        "-loglevel",
        "error",
        "-f",
        raw_input,
        "-ar",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.push(settings.sample_rate.to_string());
    args.push("-ac".to_string());
    args.push(settings.channels.to_string());
    args.extend(["-i".to_string(), "pipe:0".to_string()]);

    let (codec, muxer) = match (settings.format, settings.encoding) {
        (AudioFormat::M4a, AudioEncoding::Aac) => ("aac", "ipod"),
        (AudioFormat::Wav, AudioEncoding::LinearPcm { endianness, .. }) => {
            (pcm_codec(endianness), "wav")
        }
        (AudioFormat::Aiff, AudioEncoding::LinearPcm { endianness, .. }) => {
            (pcm_codec(endianness), "aiff")
        }
        _ => return None,
    };

    args.extend(["-c:a".to_string(), codec.to_string()]);
    if let Some(kbps) = settings.bitrate_kbps {
        args.extend(["-b:a".to_string(), format!("{kbps}k")]);
    }
    args.extend(["-f".to_string(), muxer.to_string(), "-n".to_string()]);
    Some(args)
}

fn pcm_codec(endianness: Endianness) -> &'static str {
    match endianness {
        Endianness::Little => "pcm_s16le",
        Endianness::Big => "pcm_s16be",
    }
}

impl AudioSink for FfmpegSink {
    fn processing_format(&self) -> ProcessingFormat {
        self.format
    }

    fn write(&mut self, buffer: &FrameBuffer) -> Result<(), AudioError> {
        if buffer.format() != &self.format {
            return Err(self.write_failed("buffer format does not match sink"));
        }
        let bytes = buffer.to_le_bytes();
        let result = match self.stdin.as_mut() {
            Some(stdin) => stdin.write_all(&bytes),
            None => return Err(self.write_failed("sink already closed")),
        };
        result.map_err(|e| self.write_failed(e.to_string()))
    }

    fn finish(&mut self) -> Result<(), AudioError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        drop(self.stdin.take());

        let status = self
            .child
            .wait()
            .map_err(|e| self.write_failed(e.to_string()))?;
        let stderr = join_stderr(self.stderr.take());
        if status.success() {
            Ok(())
        } else {
            Err(self.write_failed(describe_exit(status, &stderr)))
        }
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if !self.finished {
            drop(self.stdin.take());
            if let Err(e) = self.child.wait() {
                warn!(path = %self.path.display(), error = %e, "Encoder did not exit cleanly");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AudioFormat;

    #[test]
    fn test_parse_probe_output() {
        let json = r#"{"programs": [], "streams": [{"sample_rate": "44100", "channels": 2}]}"#;
        let format = parse_probe_output(Path::new("/a.wav"), json).unwrap();
        assert_eq!(format, ProcessingFormat::new(44_100, 2, SampleRepr::F32));
    }

    #[test]
    fn test_parse_probe_output_without_audio() {
        let err = parse_probe_output(Path::new("/a.txt"), r#"{"streams": []}"#).unwrap_err();
        assert!(matches!(err, AudioError::SourceOpenFailed { .. }));
        assert!(err.to_string().contains("no audio stream"));
    }

    #[test]
    fn test_parse_probe_output_garbage() {
        let err = parse_probe_output(Path::new("/a.wav"), "not json").unwrap_err();
        assert_eq!(err.code(), "source_open_failed");
    }

    #[test]
    fn test_sink_arguments_aiff_is_big_endian() {
        let source = ProcessingFormat::new(44_100, 2, SampleRepr::F32);
        let settings = AudioOutputSettings::resolve(AudioFormat::Aiff, &source, 256).unwrap();
        let args = sink_arguments(&settings).unwrap();
        let joined = args.join(" ");
        assert!(joined.contains("-f s16le -ar 44100 -ac 2 -i pipe:0"));
        assert!(joined.contains("-c:a pcm_s16be -f aiff -n"));
        assert!(!joined.contains("-b:a"));
    }

    #[test]
    fn test_sink_arguments_m4a_uses_bitrate() {
        let source = ProcessingFormat::new(44_100, 1, SampleRepr::F32);
        let settings = AudioOutputSettings::resolve(AudioFormat::M4a, &source, 192).unwrap();
        let args = sink_arguments(&settings).unwrap().join(" ");
        assert!(args.contains("-f f32le"));
        assert!(args.contains("-c:a aac -b:a 192k -f ipod"));
    }
}
