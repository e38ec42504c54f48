use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Tool paths are not empty
/// - Audio buffer sizes are positive
/// - AAC bitrate is within 32..=320 kbps
/// - Re-encode CRF is at most 51
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let tools = [
        ("tools.zip", &config.tools.zip),
        ("tools.tar", &config.tools.tar),
        ("tools.ffmpeg", &config.tools.ffmpeg),
        ("tools.ffprobe", &config.tools.ffprobe),
    ];
    for (key, path) in tools {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(format!("{key} cannot be empty")));
        }
    }

    if config.audio.input_frames == 0 {
        return Err(ConfigError::ValidationError(
            "audio.input_frames cannot be 0".to_string(),
        ));
    }
    if config.audio.headroom_frames == 0 {
        return Err(ConfigError::ValidationError(
            "audio.headroom_frames cannot be 0".to_string(),
        ));
    }
    if !(32..=320).contains(&config.audio.aac_bitrate_kbps) {
        return Err(ConfigError::ValidationError(format!(
            "audio.aac_bitrate_kbps must be between 32 and 320, got {}",
            config.audio.aac_bitrate_kbps
        )));
    }

    if config.video.reencode_crf > 51 {
        return Err(ConfigError::ValidationError(format!(
            "video.reencode_crf must be at most 51, got {}",
            config.video.reencode_crf
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_zero_input_frames_fails() {
        let mut config = Config::default();
        config.audio.input_frames = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_bitrate_out_of_range_fails() {
        let mut config = Config::default();
        config.audio.aac_bitrate_kbps = 1000;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_tool_fails() {
        let mut config = Config::default();
        config.tools.tar = PathBuf::new();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("tools.tar"));
    }

    #[test]
    fn test_validate_crf_too_high_fails() {
        let mut config = Config::default();
        config.video.reencode_crf = 60;
        assert!(validate_config(&config).is_err());
    }
}
