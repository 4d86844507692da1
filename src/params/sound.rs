//! Playback configuration.

use std::path::PathBuf;

/// How long the bell indicator stays in the ringing state after a trigger (milliseconds)
pub const RING_HOLD_MS: u64 = 1000;

/// Sound player configuration
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Directory holding the bundled bell clips
    pub assets_dir: PathBuf,

    /// Intensity-to-volume gain (volume = clamp(intensity * gain, 0, 1))
    pub volume_gain: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("assets"),
            volume_gain: 2.0,
        }
    }
}
