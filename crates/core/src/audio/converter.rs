//! In-process sample converter.
//!
//! Handles sample representation, channel count and sample rate. Rate changes
//! use linear interpolation, which is adequate for the format shifts this
//! engine performs (mostly none, occasionally a snap to an encoder rate).

use super::buffer::{FrameBuffer, ProcessingFormat};
use super::error::AudioError;
use super::traits::{ConvertStatus, InputStatus, SampleConverter};

/// Linear-interpolating converter with an internal pending queue.
#[derive(Debug)]
pub struct LinearConverter {
    from: ProcessingFormat,
    to: ProcessingFormat,
    /// Input frames advanced per output frame.
    step: f64,
    /// Queued input, already mapped to the output channel layout.
    pending: Vec<f32>,
    /// Fractional read position into `pending`, in frames.
    position: f64,
    end_of_stream: bool,
    scratch: Vec<f32>,
}

impl LinearConverter {
    pub fn new(from: ProcessingFormat, to: ProcessingFormat) -> Result<Self, AudioError> {
        if from.sample_rate == 0 || to.sample_rate == 0 {
            return Err(AudioError::converter_unavailable("sample rate of 0 Hz"));
        }
        if from.channels == 0 || to.channels == 0 {
            return Err(AudioError::converter_unavailable("zero channels"));
        }

        Ok(Self {
            from,
            to,
            step: from.sample_rate as f64 / to.sample_rate as f64,
            pending: Vec::new(),
            position: 0.0,
            end_of_stream: false,
            scratch: vec![0.0; to.channels as usize],
        })
    }

    /// Number of queued input frames not yet consumed.
    pub fn pending_frames(&self) -> usize {
        self.pending.len() / self.to.channels as usize
    }

    fn ingest(&mut self, input: &FrameBuffer) {
        let in_channels = self.from.channels as usize;
        let out_channels = self.to.channels as usize;
        self.pending.reserve(input.frame_length() * out_channels);

        for frame in 0..input.frame_length() {
            if in_channels == out_channels {
                self.pending
                    .extend((0..in_channels).map(|ch| input.sample(frame, ch)));
            } else if in_channels == 1 {
                let value = input.sample(frame, 0);
                self.pending.extend(std::iter::repeat(value).take(out_channels));
            } else if out_channels == 1 {
                let sum: f32 = (0..in_channels).map(|ch| input.sample(frame, ch)).sum();
                self.pending.push(sum / in_channels as f32);
            } else {
                self.pending.extend((0..out_channels).map(|ch| {
                    if ch < in_channels {
                        input.sample(frame, ch)
                    } else {
                        0.0
                    }
                }));
            }
        }
    }

    fn render(&mut self, output: &mut FrameBuffer) {
        let channels = self.to.channels as usize;
        let available = self.pending_frames();

        while !output.is_full() {
            let index = self.position.floor() as usize;
            let fraction = self.position - index as f64;
            let next = if fraction > 0.0 { index + 1 } else { index };

            if index >= available || (next >= available && !self.end_of_stream) {
                break;
            }

            for ch in 0..channels {
                let a = self.pending[index * channels + ch];
                let b = if next < available {
                    self.pending[next * channels + ch]
                } else {
                    a
                };
                self.scratch[ch] = a + (b - a) * fraction as f32;
            }
            output.push_frame(&self.scratch);
            self.position += self.step;
        }

        let consumed = (self.position.floor() as usize).min(available);
        if consumed > 0 {
            self.pending.drain(..consumed * channels);
            self.position -= consumed as f64;
        }
    }
}

impl SampleConverter for LinearConverter {
    fn convert(
        &mut self,
        output: &mut FrameBuffer,
        input: &mut FrameBuffer,
        pull: &mut dyn FnMut(&mut FrameBuffer) -> InputStatus,
    ) -> ConvertStatus {
        if *input.format() != self.from || *output.format() != self.to {
            return ConvertStatus::Error(Some(AudioError::conversion_failed(
                "buffer format does not match converter",
            )));
        }

        loop {
            self.render(output);
            if output.is_full() {
                return ConvertStatus::HaveData;
            }

            if self.end_of_stream {
                self.pending.clear();
                self.position = 0.0;
                return if output.is_empty() {
                    ConvertStatus::EndOfStream
                } else {
                    ConvertStatus::HaveData
                };
            }

            match pull(input) {
                InputStatus::HaveData => self.ingest(input),
                InputStatus::NoDataNow => {
                    return if output.is_empty() {
                        ConvertStatus::InputRanDry
                    } else {
                        ConvertStatus::HaveData
                    };
                }
                InputStatus::EndOfStream => self.end_of_stream = true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::buffer::SampleRepr;

    fn format(rate: u32, channels: u16, sample: SampleRepr) -> ProcessingFormat {
        ProcessingFormat::new(rate, channels, sample)
    }

    /// Feeds `chunks` one per pull, then end of stream.
    fn feeder(chunks: Vec<Vec<f32>>) -> impl FnMut(&mut FrameBuffer) -> InputStatus {
        let mut chunks = chunks.into_iter();
        move |buffer: &mut FrameBuffer| match chunks.next() {
            Some(chunk) => {
                buffer.reset();
                let channels = buffer.format().channels as usize;
                for frame in chunk.chunks(channels) {
                    buffer.push_frame(frame);
                }
                InputStatus::HaveData
            }
            None => InputStatus::EndOfStream,
        }
    }

    fn drain(
        converter: &mut LinearConverter,
        input: &mut FrameBuffer,
        output: &mut FrameBuffer,
        pull: &mut dyn FnMut(&mut FrameBuffer) -> InputStatus,
    ) -> Vec<f32> {
        let mut collected = Vec::new();
        for _ in 0..100 {
            output.reset();
            let status = converter.convert(output, input, pull);
            for frame in 0..output.frame_length() {
                for ch in 0..output.format().channels as usize {
                    collected.push(output.sample(frame, ch));
                }
            }
            if matches!(status, ConvertStatus::EndOfStream) {
                return collected;
            }
        }
        panic!("converter never reached end of stream");
    }

    #[test]
    fn test_new_rejects_zero_rate() {
        let err = LinearConverter::new(
            format(0, 2, SampleRepr::F32),
            format(44_100, 2, SampleRepr::I16),
        )
        .unwrap_err();
        assert_eq!(err.code(), "converter_unavailable");
    }

    #[test]
    fn test_identity_passes_samples_through() {
        let f = format(8_000, 1, SampleRepr::F32);
        let mut converter = LinearConverter::new(f, f).unwrap();
        let mut input = FrameBuffer::new(f, 4).unwrap();
        let mut output = FrameBuffer::new(f, 8).unwrap();
        let mut pull = feeder(vec![vec![0.1, 0.2, 0.3], vec![0.4]]);

        let samples = drain(&mut converter, &mut input, &mut output, &mut pull);
        assert_eq!(samples, vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_mono_to_stereo_int() {
        let from = format(8_000, 1, SampleRepr::F32);
        let to = format(8_000, 2, SampleRepr::I16);
        let mut converter = LinearConverter::new(from, to).unwrap();
        let mut input = FrameBuffer::new(from, 4).unwrap();
        let mut output = FrameBuffer::new(to, 8).unwrap();
        let mut pull = feeder(vec![vec![0.5, -0.5]]);

        let samples = drain(&mut converter, &mut input, &mut output, &mut pull);
        assert_eq!(samples.len(), 4);
        assert!((samples[0] - 0.5).abs() < 1e-3);
        assert!((samples[1] - 0.5).abs() < 1e-3);
        assert!((samples[2] + 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_stereo_to_mono_averages() {
        let from = format(8_000, 2, SampleRepr::F32);
        let to = format(8_000, 1, SampleRepr::F32);
        let mut converter = LinearConverter::new(from, to).unwrap();
        let mut input = FrameBuffer::new(from, 4).unwrap();
        let mut output = FrameBuffer::new(to, 4).unwrap();
        let mut pull = feeder(vec![vec![1.0, 0.0, 0.2, 0.4]]);

        let samples = drain(&mut converter, &mut input, &mut output, &mut pull);
        assert_eq!(samples.len(), 2);
        assert!((samples[0] - 0.5).abs() < 1e-6);
        assert!((samples[1] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_upsample_doubles_frame_count() {
        let from = format(8_000, 1, SampleRepr::F32);
        let to = format(16_000, 1, SampleRepr::F32);
        let mut converter = LinearConverter::new(from, to).unwrap();
        let mut input = FrameBuffer::new(from, 4).unwrap();
        let mut output = FrameBuffer::new(to, 16).unwrap();
        let mut pull = feeder(vec![vec![0.0, 1.0, 0.0, 1.0]]);

        let samples = drain(&mut converter, &mut input, &mut output, &mut pull);
        assert_eq!(samples.len(), 8);
        assert!((samples[1] - 0.5).abs() < 1e-6);
        assert!((samples[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_downsample_halves_frame_count() {
        let from = format(16_000, 1, SampleRepr::F32);
        let to = format(8_000, 1, SampleRepr::F32);
        let mut converter = LinearConverter::new(from, to).unwrap();
        let mut input = FrameBuffer::new(from, 8).unwrap();
        let mut output = FrameBuffer::new(to, 8).unwrap();
        let mut pull = feeder(vec![vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7]]);

        let samples = drain(&mut converter, &mut input, &mut output, &mut pull);
        assert_eq!(samples.len(), 4);
        assert!((samples[3] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_no_data_now_reports_input_ran_dry() {
        let f = format(8_000, 1, SampleRepr::F32);
        let mut converter = LinearConverter::new(f, f).unwrap();
        let mut input = FrameBuffer::new(f, 4).unwrap();
        let mut output = FrameBuffer::new(f, 4).unwrap();

        let status = converter.convert(&mut output, &mut input, &mut |_| InputStatus::NoDataNow);
        assert!(matches!(status, ConvertStatus::InputRanDry));
        assert!(output.is_empty());
    }

    #[test]
    fn test_full_output_returns_before_pulling() {
        let f = format(8_000, 1, SampleRepr::F32);
        let mut converter = LinearConverter::new(f, f).unwrap();
        let mut input = FrameBuffer::new(f, 4).unwrap();
        let mut output = FrameBuffer::new(f, 2).unwrap();
        let mut pulls = 0;
        let mut pull = |buffer: &mut FrameBuffer| {
            pulls += 1;
            buffer.reset();
            for v in [0.1, 0.2, 0.3, 0.4] {
                buffer.push_frame(&[v]);
            }
            InputStatus::HaveData
        };

        let status = converter.convert(&mut output, &mut input, &mut pull);
        assert!(matches!(status, ConvertStatus::HaveData));
        assert!(output.is_full());
        assert_eq!(converter.pending_frames(), 2);

        output.reset();
        let status = converter.convert(&mut output, &mut input, &mut |_| InputStatus::NoDataNow);
        assert!(matches!(status, ConvertStatus::HaveData));
        assert_eq!(output.frame_length(), 2);
        assert_eq!(pulls, 1);
    }

    #[test]
    fn test_format_mismatch_is_error() {
        let f = format(8_000, 1, SampleRepr::F32);
        let other = format(8_000, 2, SampleRepr::F32);
        let mut converter = LinearConverter::new(f, f).unwrap();
        let mut input = FrameBuffer::new(other, 4).unwrap();
        let mut output = FrameBuffer::new(f, 4).unwrap();

        let status = converter.convert(&mut output, &mut input, &mut |_| InputStatus::EndOfStream);
        assert!(matches!(status, ConvertStatus::Error(Some(_))));
    }
}
