//! Audio conversion end-to-end tests.
//!
//! Mock-backed tests cover job fan-out and naming; the ffmpeg-backed test
//! converts a real WAV file and skips itself when ffmpeg is not installed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use packdrop_core::{
    audio::{ProcessingFormat, SampleRepr},
    testing::{fixtures::tool_available, fixtures::touch, ConverterScript, MockAudioBackend, MockExporter},
    AudioFormat, Config, Engine, OutputFormat, RunResult, Selection,
};

fn mock_engine(audio: &MockAudioBackend) -> Engine {
    Engine::with_backends(
        Config::default(),
        Arc::new(audio.clone()),
        Arc::new(MockExporter::new()),
    )
}

fn stereo() -> ProcessingFormat {
    ProcessingFormat::new(44_100, 2, SampleRepr::F32)
}

/// Writes a 16-bit mono PCM WAV file with a short sawtooth.
fn write_wav(path: &Path, sample_rate: u32, frames: u32) {
    let data_len = frames * 2;
    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    for i in 0..frames {
        let sample = ((i % 100) as i16 - 50) * 300;
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(path, bytes).unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_wav_to_aiff_with_ffmpeg() {
    if !tool_available("ffmpeg") || !tool_available("ffprobe") {
        eprintln!("ffmpeg not installed, skipping");
        return;
    }
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("tone.wav");
    write_wav(&source, 8_000, 8_000);
    let engine = Engine::new(Config::default());

    let first = engine
        .run(
            Selection::new([source.clone()]).unwrap(),
            OutputFormat::Audio(AudioFormat::Aiff),
        )
        .await;
    let expected = dir.path().join("tone.aiff");
    assert_eq!(first, RunResult::single(expected.clone()));
    assert!(std::fs::metadata(&expected).unwrap().len() > 0);

    let second = engine
        .run(
            Selection::new([source]).unwrap(),
            OutputFormat::Audio(AudioFormat::Aiff),
        )
        .await;
    let suffixed = dir.path().join("tone 2.aiff");
    assert_eq!(second, RunResult::single(suffixed.clone()));
    assert!(std::fs::metadata(&suffixed).unwrap().len() > 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_existing_destination_gets_suffix() {
    let dir = TempDir::new().unwrap();
    let audio = MockAudioBackend::new();
    let source = touch(dir.path(), "song.wav");
    touch(dir.path(), "song.aiff");
    audio.add_source(&source, stereo(), 2_000);

    let result = mock_engine(&audio)
        .run(
            Selection::new([source]).unwrap(),
            OutputFormat::Audio(AudioFormat::Aiff),
        )
        .await;

    let expected = dir.path().join("song 2.aiff");
    assert_eq!(result.outputs(), &[expected.clone()]);
    assert_eq!(audio.frames_written(&expected), 2_000);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shared_stems_get_distinct_outputs() {
    let dir = TempDir::new().unwrap();
    let audio = MockAudioBackend::new();
    let wav = touch(dir.path(), "take.wav");
    let aiff = touch(dir.path(), "take.aiff");
    audio.add_source(&wav, stereo(), 500);
    audio.add_source(&aiff, stereo(), 500);

    let result = mock_engine(&audio)
        .run(
            Selection::new([wav, aiff]).unwrap(),
            OutputFormat::Audio(AudioFormat::M4a),
        )
        .await;

    assert_eq!(
        result.outputs(),
        &[dir.path().join("take.m4a"), dir.path().join("take 2.m4a")]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_first_failure_fails_job_but_keeps_earlier_outputs() {
    let dir = TempDir::new().unwrap();
    let audio = MockAudioBackend::new();
    let good = touch(dir.path(), "a.wav");
    let bad = touch(dir.path(), "b.wav");
    audio.add_source(&good, stereo(), 500);
    audio.add_source(&bad, stereo(), 50_000);
    audio.fail_read_after(&bad, 0);

    let result = mock_engine(&audio)
        .run(
            Selection::new([good, bad]).unwrap(),
            OutputFormat::Audio(AudioFormat::Aiff),
        )
        .await;

    match result {
        RunResult::Failure {
            message,
            diagnostics,
        } => {
            assert!(message.contains("\"b.wav\""), "{message}");
            assert!(diagnostics.starts_with("[read_failed]"), "{diagnostics}");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    let kept: PathBuf = dir.path().join("a.aiff");
    assert!(std::fs::metadata(&kept).unwrap().len() > 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_terminal_error_after_output_is_success() {
    let dir = TempDir::new().unwrap();
    let audio = MockAudioBackend::new();
    let source = touch(dir.path(), "long.flac");
    audio.add_source(&source, stereo(), 50_000);
    audio.set_converter_script(ConverterScript::ErrorAfterCalls(3));

    let result = mock_engine(&audio)
        .run(
            Selection::new([source]).unwrap(),
            OutputFormat::Audio(AudioFormat::Wav),
        )
        .await;

    assert_eq!(result.outputs(), &[dir.path().join("long.wav")]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unsupported_target_is_rejected() {
    let dir = TempDir::new().unwrap();
    let audio = MockAudioBackend::new();
    let source = touch(dir.path(), "a.flac");

    let result = mock_engine(&audio)
        .run(
            Selection::new([source]).unwrap(),
            OutputFormat::Audio(AudioFormat::Aiff),
        )
        .await;

    assert!(!result.is_success());
    assert!(audio.sink_settings(dir.path().join("a.aiff")).is_none());
}
