//! Parameter definitions with physical units and documented semantics.
//!
//! All tuning constants are extracted here with:
//! - Physical units (g, milliseconds, Hz, etc.)
//! - Documented ranges and meanings
//! - Type safety where possible

mod motion;
mod sound;
mod tone;
mod trigger;

// Re-export all types
pub use motion::SamplerConfig;
pub use sound::{PlayerConfig, RING_HOLD_MS};
pub use tone::ToneConfig;
pub use trigger::{PercentRange, SENSITIVITY_RANGE, THRESHOLD_RANGE};
