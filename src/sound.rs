//! Bell playback: asset lookup, overlapping voices and audio output.

mod bell;
mod clip;
mod error;
mod output;
mod player;
mod voice;

// Re-export public types
pub use bell::BellType;
pub use clip::{Clip, ClipLibrary};
pub use error::SoundError;
pub use output::{AudioOutput, CpalOutput, SilentOutput};
pub use player::SoundPlayer;
pub use voice::{Mixer, PlaybackHandle, Voice};
