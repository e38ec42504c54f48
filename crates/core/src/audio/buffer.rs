//! Processing formats and fixed-capacity frame buffers.

use serde::{Deserialize, Serialize};

use super::error::AudioError;

/// In-memory sample representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleRepr {
    /// 32-bit float, nominal range -1.0..=1.0
    F32,
    /// 16-bit signed integer
    I16,
}

impl SampleRepr {
    /// Bytes per sample.
    pub fn bytes(&self) -> usize {
        match self {
            Self::F32 => 4,
            Self::I16 => 2,
        }
    }
}

/// Layout of interleaved samples exchanged with a source, sink or converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessingFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub sample: SampleRepr,
}

impl ProcessingFormat {
    pub fn new(sample_rate: u32, channels: u16, sample: SampleRepr) -> Self {
        Self {
            sample_rate,
            channels,
            sample,
        }
    }

    /// Bytes per interleaved frame.
    pub fn frame_bytes(&self) -> usize {
        self.sample.bytes() * self.channels as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Samples {
    F32(Vec<f32>),
    I16(Vec<i16>),
}

/// Interleaved sample buffer with a fixed frame capacity and a logical length.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    format: ProcessingFormat,
    capacity: usize,
    frame_length: usize,
    samples: Samples,
}

impl FrameBuffer {
    /// Allocates a zeroed buffer holding `capacity` frames.
    pub fn new(format: ProcessingFormat, capacity: usize) -> Result<Self, AudioError> {
        let len = capacity
            .checked_mul(format.channels as usize)
            .filter(|len| *len > 0)
            .ok_or(AudioError::BufferAllocation { frames: capacity })?;

        let samples = match format.sample {
            SampleRepr::F32 => Samples::F32(zeroed(len, capacity)?),
            SampleRepr::I16 => Samples::I16(zeroed(len, capacity)?),
        };

        Ok(Self {
            format,
            capacity,
            frame_length: 0,
            samples,
        })
    }

    pub fn format(&self) -> &ProcessingFormat {
        &self.format
    }

    /// Maximum number of frames.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of valid frames.
    pub fn frame_length(&self) -> usize {
        self.frame_length
    }

    pub fn is_empty(&self) -> bool {
        self.frame_length == 0
    }

    pub fn is_full(&self) -> bool {
        self.frame_length == self.capacity
    }

    /// Marks the buffer empty without touching its storage.
    pub fn reset(&mut self) {
        self.frame_length = 0;
    }

    /// Sample at `frame`/`channel` as normalized f32.
    pub fn sample(&self, frame: usize, channel: usize) -> f32 {
        let index = frame * self.format.channels as usize + channel;
        match &self.samples {
            Samples::F32(data) => data[index],
            Samples::I16(data) => data[index] as f32 / 32768.0,
        }
    }

    /// Appends one frame given as normalized f32 samples. Returns false when full.
    pub fn push_frame(&mut self, frame: &[f32]) -> bool {
        if self.is_full() {
            return false;
        }
        let channels = self.format.channels as usize;
        let start = self.frame_length * channels;
        match &mut self.samples {
            Samples::F32(data) => {
                for (slot, value) in data[start..start + channels].iter_mut().zip(frame) {
                    *slot = *value;
                }
            }
            Samples::I16(data) => {
                for (slot, value) in data[start..start + channels].iter_mut().zip(frame) {
                    *slot = f32_to_i16(*value);
                }
            }
        }
        self.frame_length += 1;
        true
    }

    /// Replaces the contents with little-endian encoded samples.
    ///
    /// Trailing bytes that do not form a whole frame, and frames beyond the
    /// capacity, are ignored. Returns the number of frames loaded.
    pub fn load_le_bytes(&mut self, bytes: &[u8]) -> usize {
        let frame_bytes = self.format.frame_bytes();
        let frames = (bytes.len() / frame_bytes).min(self.capacity);
        let used = &bytes[..frames * frame_bytes];

        match &mut self.samples {
            Samples::F32(data) => {
                for (slot, chunk) in data.iter_mut().zip(used.chunks_exact(4)) {
                    *slot = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                }
            }
            Samples::I16(data) => {
                for (slot, chunk) in data.iter_mut().zip(used.chunks_exact(2)) {
                    *slot = i16::from_le_bytes([chunk[0], chunk[1]]);
                }
            }
        }
        self.frame_length = frames;
        frames
    }

    /// Valid frames encoded as little-endian bytes.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let count = self.frame_length * self.format.channels as usize;
        match &self.samples {
            Samples::F32(data) => data[..count].iter().flat_map(|s| s.to_le_bytes()).collect(),
            Samples::I16(data) => data[..count].iter().flat_map(|s| s.to_le_bytes()).collect(),
        }
    }
}

fn zeroed<T: Default + Clone>(len: usize, frames: usize) -> Result<Vec<T>, AudioError> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| AudioError::BufferAllocation { frames })?;
    data.resize(len, T::default());
    Ok(data)
}

fn f32_to_i16(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}
