//! Sound layer errors.

use std::fmt;

/// Errors raised while setting up audio or playing a bell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundError {
    /// No output device, or the output stream could not be built or started
    AudioSessionSetupFailed(String),
    /// The bundled clip for the selected bell is missing
    AssetNotFound(String),
    /// The clip exists but could not be decoded into a playable instance
    PlayerCreationFailed(String),
    /// The audio output rejected the new instance
    PlaybackFailed,
}

impl fmt::Display for SoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoundError::AudioSessionSetupFailed(reason) => {
                write!(f, "Failed to set up audio session: {}", reason)
            }
            SoundError::AssetNotFound(path) => write!(f, "Sound file not found: {}", path),
            SoundError::PlayerCreationFailed(reason) => {
                write!(f, "Failed to create audio player: {}", reason)
            }
            SoundError::PlaybackFailed => f.write_str("Failed to play sound"),
        }
    }
}

impl std::error::Error for SoundError {}
