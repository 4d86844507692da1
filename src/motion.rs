//! Accelerometer sampling and shake magnitude extraction.
//!
//! Sources deliver raw readings on their own threads; the sampler gates them
//! on the main sequence and exposes a single debounced magnitude.

#[cfg(target_os = "macos")]
mod apple_spu;
mod error;
mod gate;
mod idle;
mod sample;
mod sampler;
mod source;

// Re-export public types
#[cfg(target_os = "macos")]
pub use apple_spu::AppleSpuSource;
pub use error::MotionError;
pub use gate::DebounceGate;
pub use idle::{CommandInhibitor, IdleSleepGuard, SleepInhibitor};
pub use sample::{MotionSample, SensorReading};
pub use sampler::{MotionSampler, SamplerUpdate};
pub use source::{parse_replay, AccelerometerSource, ReplaySource, UnavailableSource};
