//! Bikebell library - shake-triggered bicycle bell
//!
//! Accelerometer readings are debounced into shake magnitudes, a threshold
//! policy decides when to ring, and every ring plays a new overlapping voice.

pub mod app;
pub mod cli;
pub mod events;
pub mod indicator;
pub mod motion;
pub mod params;
pub mod settings;
pub mod shell;
pub mod sound;
pub mod tone;
pub mod trigger;

#[cfg(test)]
mod test_support;
