//! Audio formats, their conversion matrix and output encodings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::UnknownFormat;

/// Byte order of linear PCM samples in a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endianness {
    Little,
    Big,
}

/// Codec layout written for an output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AudioEncoding {
    /// AAC in an MPEG-4 audio container; bitrate comes from configuration.
    Aac,
    /// Uncompressed interleaved integer PCM.
    LinearPcm {
        bits_per_sample: u16,
        endianness: Endianness,
    },
}

/// Audio formats the engine reads. A subset can also be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    /// MPEG Audio Layer III (input only)
    Mp3,
    /// AAC in an MPEG-4 container
    M4a,
    /// RIFF WAVE
    Wav,
    /// Audio Interchange File Format
    Aiff,
    /// Free Lossless Audio Codec (input only)
    Flac,
}

impl AudioFormat {
    /// Every readable audio format.
    pub const ALL: [AudioFormat; 5] = [Self::Mp3, Self::M4a, Self::Wav, Self::Aiff, Self::Flac];

    /// Canonical file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::M4a => "m4a",
            Self::Wav => "wav",
            Self::Aiff => "aiff",
            Self::Flac => "flac",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mp3 => "MP3",
            Self::M4a => "M4A (AAC)",
            Self::Wav => "WAV",
            Self::Aiff => "AIFF",
            Self::Flac => "FLAC",
        }
    }

    /// Looks up a format by extension, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        Self::ALL.into_iter().find(|f| f.extension() == ext)
    }

    /// Looks up the format of a path by its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Formats a source of this format may be converted to.
    ///
    /// This is the raw matrix. It still lists MP3 where the matrix allows it;
    /// [`AudioFormat::offered_outputs`] strips it before anything is offered.
    pub fn conversion_targets(&self) -> &'static [AudioFormat] {
        match self {
            Self::Mp3 => &[Self::M4a, Self::Wav, Self::Aiff],
            Self::M4a => &[Self::Mp3, Self::Wav, Self::Aiff],
            Self::Wav => &[Self::M4a, Self::Mp3, Self::Aiff],
            Self::Aiff => &[Self::M4a, Self::Mp3, Self::Wav],
            Self::Flac => &[Self::M4a, Self::Mp3, Self::Wav],
        }
    }

    /// Output encoding, or `None` when the engine cannot write this format.
    pub fn output_encoding(&self) -> Option<AudioEncoding> {
        match self {
            Self::M4a => Some(AudioEncoding::Aac),
            Self::Wav => Some(AudioEncoding::LinearPcm {
                bits_per_sample: 16,
                endianness: Endianness::Little,
            }),
            Self::Aiff => Some(AudioEncoding::LinearPcm {
                bits_per_sample: 16,
                endianness: Endianness::Big,
            }),
            Self::Mp3 | Self::Flac => None,
        }
    }

    /// Whether the engine can write this format.
    pub fn is_output_supported(&self) -> bool {
        self.output_encoding().is_some()
    }

    /// Outputs offered for a set of input formats.
    ///
    /// Intersects the conversion targets of every input and drops formats the
    /// engine cannot write. The result keeps catalog order.
    pub fn offered_outputs(inputs: &[AudioFormat]) -> Vec<AudioFormat> {
        if inputs.is_empty() {
            return Vec::new();
        }

        Self::ALL
            .into_iter()
            .filter(|candidate| {
                inputs
                    .iter()
                    .all(|input| input.conversion_targets().contains(candidate))
            })
            .filter(AudioFormat::is_output_supported)
            .collect()
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for AudioFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s.trim_start_matches('.')).ok_or_else(|| UnknownFormat::new("audio", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AudioFormat::*;

    #[test]
    fn test_from_extension_case_insensitive() {
        assert_eq!(AudioFormat::from_extension("WAV"), Some(Wav));
        assert_eq!(AudioFormat::from_extension("Flac"), Some(Flac));
        assert_eq!(AudioFormat::from_extension("ogg"), None);
        assert_eq!(AudioFormat::from_path(Path::new("/a/b/Song.AIFF")), Some(Aiff));
        assert_eq!(AudioFormat::from_path(Path::new("/a/b/noext")), None);
    }

    #[test]
    fn test_conversion_matrix() {
        assert_eq!(Mp3.conversion_targets(), &[M4a, Wav, Aiff]);
        assert_eq!(M4a.conversion_targets(), &[Mp3, Wav, Aiff]);
        assert_eq!(Wav.conversion_targets(), &[M4a, Mp3, Aiff]);
        assert_eq!(Aiff.conversion_targets(), &[M4a, Mp3, Wav]);
        assert_eq!(Flac.conversion_targets(), &[M4a, Mp3, Wav]);
    }

    #[test]
    fn test_offered_outputs_single_input_drops_mp3() {
        assert_eq!(AudioFormat::offered_outputs(&[M4a]), vec![Wav, Aiff]);
        assert_eq!(AudioFormat::offered_outputs(&[Wav]), vec![M4a, Aiff]);
        assert_eq!(AudioFormat::offered_outputs(&[Flac]), vec![M4a, Wav]);
        assert_eq!(AudioFormat::offered_outputs(&[Mp3]), vec![M4a, Wav, Aiff]);
    }

    #[test]
    fn test_offered_outputs_intersection() {
        assert_eq!(AudioFormat::offered_outputs(&[Mp3, Flac]), vec![M4a, Wav]);
        assert_eq!(AudioFormat::offered_outputs(&[Wav, Aiff]), vec![M4a]);
        assert_eq!(AudioFormat::offered_outputs(&[M4a, Wav, Aiff]), Vec::<AudioFormat>::new());
        assert!(AudioFormat::offered_outputs(&[]).is_empty());
    }

    #[test]
    fn test_output_encodings() {
        assert_eq!(M4a.output_encoding(), Some(AudioEncoding::Aac));
        assert_eq!(
            Aiff.output_encoding(),
            Some(AudioEncoding::LinearPcm {
                bits_per_sample: 16,
                endianness: Endianness::Big
            })
        );
        assert!(!Mp3.is_output_supported());
        assert!(!Flac.is_output_supported());
    }
}
