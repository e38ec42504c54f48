//! Output codec/container configuration for a conversion target.

use serde::Serialize;

use super::buffer::{ProcessingFormat, SampleRepr};
use super::error::AudioError;
use crate::catalog::{AudioEncoding, AudioFormat};

/// Sample rates the AAC encoder accepts.
pub const AAC_SAMPLE_RATES: [u32; 12] = [
    8_000, 11_025, 12_000, 16_000, 22_050, 24_000, 32_000, 44_100, 48_000, 64_000, 88_200, 96_000,
];

const MAX_CHANNELS: u16 = 8;
const PCM_RATE_RANGE: std::ops::RangeInclusive<u32> = 1_000..=384_000;
const AAC_BITRATE_RANGE: std::ops::RangeInclusive<u32> = 32..=320;

/// Everything a sink needs to write one output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioOutputSettings {
    pub format: AudioFormat,
    pub encoding: AudioEncoding,
    pub sample_rate: u32,
    pub channels: u16,
    /// Encoder bit rate, compressed encodings only.
    pub bitrate_kbps: Option<u32>,
    pub interleaved: bool,
}

impl AudioOutputSettings {
    /// Resolves the output configuration for `target` given the source layout.
    ///
    /// PCM keeps the source rate and channel count; AAC keeps the source rate
    /// when the encoder supports it and otherwise falls back to 48 kHz (for
    /// faster sources) or 44.1 kHz.
    pub fn resolve(
        target: AudioFormat,
        source: &ProcessingFormat,
        aac_bitrate_kbps: u32,
    ) -> Result<Self, AudioError> {
        let encoding = target
            .output_encoding()
            .ok_or(AudioError::UnsupportedOutput { format: target })?;

        let (sample_rate, bitrate_kbps) = match encoding {
            AudioEncoding::Aac => (aac_sample_rate(source.sample_rate), Some(aac_bitrate_kbps)),
            AudioEncoding::LinearPcm { .. } => (source.sample_rate, None),
        };

        Ok(Self {
            format: target,
            encoding,
            sample_rate,
            channels: source.channels,
            bitrate_kbps,
            interleaved: true,
        })
    }

    /// Checks the configuration can actually be constructed.
    pub fn validate(&self) -> Result<(), AudioError> {
        if self.channels == 0 || self.channels > MAX_CHANNELS {
            return Err(AudioError::invalid_settings(format!(
                "{} channels (supported: 1-{MAX_CHANNELS})",
                self.channels
            )));
        }
        if !self.interleaved {
            return Err(AudioError::invalid_settings("non-interleaved output"));
        }

        match self.encoding {
            AudioEncoding::Aac => {
                if !AAC_SAMPLE_RATES.contains(&self.sample_rate) {
                    return Err(AudioError::invalid_settings(format!(
                        "AAC does not support {} Hz",
                        self.sample_rate
                    )));
                }
                match self.bitrate_kbps {
                    Some(kbps) if AAC_BITRATE_RANGE.contains(&kbps) => {}
                    other => {
                        return Err(AudioError::invalid_settings(format!(
                            "AAC bit rate {other:?} kbps outside 32-320"
                        )))
                    }
                }
            }
            AudioEncoding::LinearPcm {
                bits_per_sample, ..
            } => {
                if bits_per_sample != 16 {
                    return Err(AudioError::invalid_settings(format!(
                        "{bits_per_sample}-bit PCM"
                    )));
                }
                if !PCM_RATE_RANGE.contains(&self.sample_rate) {
                    return Err(AudioError::invalid_settings(format!(
                        "PCM sample rate {} Hz",
                        self.sample_rate
                    )));
                }
            }
        }

        Ok(())
    }

    /// Layout the sink accepts samples in.
    pub fn processing_format(&self) -> ProcessingFormat {
        let sample = match self.encoding {
            AudioEncoding::Aac => SampleRepr::F32,
            AudioEncoding::LinearPcm { .. } => SampleRepr::I16,
        };
        ProcessingFormat::new(self.sample_rate, self.channels, sample)
    }
}

fn aac_sample_rate(source_rate: u32) -> u32 {
    if AAC_SAMPLE_RATES.contains(&source_rate) {
        source_rate
    } else if source_rate > 48_000 {
        48_000
    } else {
        44_100
    }
}
