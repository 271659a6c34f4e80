//! Error types for the audio engine

use std::path::PathBuf;

use thiserror::Error;

/// Failure to open the host audio output.
///
/// Never fatal: the engine logs it once and keeps running without a device.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("No audio output device available")]
    NoDevice,
    #[error("Audio output disabled by configuration")]
    Disabled,
    #[error("Failed to build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),
    #[error("Failed to play audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
    #[error("Failed to pause audio stream: {0}")]
    PauseStream(#[from] cpal::PauseStreamError),
}

/// Failure to load a sample clip. Only affects the load call that returned it.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("Sample '{}' has no supported extension (expected .wav), unsure how to load", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("Failed to decode WAV '{}': {source}", .path.display())]
    Wav {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
    #[error("Unsupported bit depth: {0}")]
    UnsupportedBitDepth(u16),
    #[error("Unsupported channel count: {0}")]
    UnsupportedChannels(u16),
}

/// Invalid synth voice configuration or note request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SynthError {
    #[error("Frequency must be positive and finite, got {0}")]
    InvalidFrequency(f32),
    #[error("Frequency {0} Hz is too high: cycle would be shorter than one sample")]
    FrequencyTooHigh(f32),
    #[error("{0} duration must be at least one sample")]
    ZeroDuration(&'static str),
    #[error("{0} must be finite")]
    NonFinite(&'static str),
}

/// Invalid or unreadable engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Block size {0} must be a power of two and at least 8 frames")]
    InvalidBlockSize(usize),
    #[error("Master volume {0} must be finite and non-negative")]
    InvalidMasterVolume(f32),
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            SynthError::InvalidFrequency(-1.0).to_string(),
            "Frequency must be positive and finite, got -1"
        );
        assert_eq!(
            SynthError::ZeroDuration("attack").to_string(),
            "attack duration must be at least one sample"
        );
        assert_eq!(
            ConfigError::InvalidBlockSize(1000).to_string(),
            "Block size 1000 must be a power of two and at least 8 frames"
        );
        assert_eq!(
            SampleError::UnsupportedFormat(PathBuf::from("drums.opus")).to_string(),
            "Sample 'drums.opus' has no supported extension (expected .wav), unsure how to load"
        );
    }
}
