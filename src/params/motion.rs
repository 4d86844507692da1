//! Motion sampling configuration.

use std::time::Duration;

/// Accelerometer sampling and debounce parameters
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Accelerometer update interval (milliseconds)
    /// 15ms ≈ 67 Hz delivery rate
    pub update_interval_ms: u64,

    /// Minimum spacing between significant shakes (milliseconds)
    /// Samples arriving sooner than this after the last significant one are skipped
    pub min_shake_interval_ms: u64,

    /// Offset subtracted from the raw vector norm (g)
    /// Rough gravity compensation; a device at rest reads ~0.2g after removal
    pub gravity_offset_g: f64,

    /// Noise floor (g, after gravity removal)
    /// Samples at or below this emit nothing
    pub noise_floor_g: f64,

    /// Significant-motion threshold (g, after gravity removal)
    /// Samples above this reset the debounce timer
    pub significant_g: f64,

    /// Gain applied to the emitted magnitude (dimensionless)
    pub output_gain: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: 15,
            min_shake_interval_ms: 80,
            gravity_offset_g: 0.8,
            noise_floor_g: 0.006,
            significant_g: 0.015,
            output_gain: 1.5,
        }
    }
}

impl SamplerConfig {
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    pub fn min_shake_interval(&self) -> Duration {
        Duration::from_millis(self.min_shake_interval_ms)
    }

    /// Nominal delivery rate in Hz
    pub fn rate_hz(&self) -> f64 {
        1000.0 / self.update_interval_ms as f64
    }

    /// Validate configuration (non-zero interval, ordered thresholds)
    pub fn validate(&self) -> Result<(), String> {
        if self.update_interval_ms == 0 {
            return Err("Update interval must be > 0".to_string());
        }
        if self.noise_floor_g > self.significant_g {
            return Err(format!(
                "Noise floor ({}) must not exceed significant threshold ({})",
                self.noise_floor_g, self.significant_g
            ));
        }
        Ok(())
    }
}
