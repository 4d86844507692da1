//! Debounce gate turning raw readings into a shake magnitude signal.

use std::time::{Duration, Instant};

use super::sample::MotionSample;
use crate::params::SamplerConfig;

/// Minimum-interval filter over significant motion.
///
/// A reading is only considered once `min_interval` has passed since the last
/// reading that crossed the significant threshold. Considered readings above
/// the noise floor emit a scaled magnitude.
#[derive(Debug, Clone)]
pub struct DebounceGate {
    min_interval: Duration,
    gravity_offset: f64,
    noise_floor: f64,
    significant: f64,
    gain: f64,
    last_shake: Instant,
}

impl DebounceGate {
    /// Create a gate whose debounce window starts at `now`
    pub fn new(config: &SamplerConfig, now: Instant) -> Self {
        Self {
            min_interval: config.min_shake_interval(),
            gravity_offset: config.gravity_offset_g,
            noise_floor: config.noise_floor_g,
            significant: config.significant_g,
            gain: config.output_gain,
            last_shake: now,
        }
    }

    /// Time of the last significant reading
    pub fn last_shake(&self) -> Instant {
        self.last_shake
    }

    /// Gravity-compensated magnitude of a reading, before gain
    pub fn raw_magnitude(&self, sample: &MotionSample) -> f64 {
        sample.norm() - self.gravity_offset
    }

    /// Process one reading in arrival order.
    ///
    /// Returns the emitted (scaled) magnitude, or `None` if the reading was
    /// inside the debounce window or below the noise floor.
    pub fn process(&mut self, sample: &MotionSample) -> Option<f64> {
        let elapsed = sample.timestamp.saturating_duration_since(self.last_shake);
        if elapsed < self.min_interval {
            return None;
        }

        let magnitude = self.raw_magnitude(sample);
        if magnitude <= self.noise_floor {
            return None;
        }

        if magnitude > self.significant {
            self.last_shake = sample.timestamp;
        }

        Some(magnitude * self.gain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate_at(t0: Instant) -> DebounceGate {
        DebounceGate::new(&SamplerConfig::default(), t0)
    }

    /// A reading straight along z with the given gravity-compensated magnitude
    fn reading(t0: Instant, ms: u64, magnitude: f64) -> MotionSample {
        MotionSample::new(0.0, 0.0, magnitude + 0.8, t0 + Duration::from_millis(ms))
    }

    #[test]
    fn test_readings_inside_initial_window_are_skipped() {
        let t0 = Instant::now();
        let mut gate = gate_at(t0);
        assert_eq!(gate.process(&reading(t0, 10, 0.5)), None);
        assert!(gate.process(&reading(t0, 80, 0.5)).is_some());
    }

    #[test]
    fn test_noise_floor_emits_nothing() {
        let t0 = Instant::now();
        let mut gate = gate_at(t0);
        assert_eq!(gate.process(&reading(t0, 100, 0.005)), None);
        assert_eq!(gate.process(&reading(t0, 120, 0.0)), None);
        assert_eq!(gate.last_shake(), t0);
    }

    #[test]
    fn test_gain_is_applied() {
        let t0 = Instant::now();
        let mut gate = gate_at(t0);
        let emitted = gate.process(&reading(t0, 100, 0.2)).unwrap();
        assert!((emitted - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_close_significant_readings_update_once() {
        let t0 = Instant::now();
        let mut gate = gate_at(t0);

        let first = reading(t0, 100, 0.5);
        let second = reading(t0, 150, 0.5);
        assert!(gate.process(&first).is_some());
        assert_eq!(gate.process(&second), None);
        assert_eq!(gate.last_shake(), first.timestamp);

        // Window reopens 80ms after the first
        let third = reading(t0, 180, 0.5);
        assert!(gate.process(&third).is_some());
        assert_eq!(gate.last_shake(), third.timestamp);
    }

    #[test]
    fn test_small_motion_does_not_extend_window() {
        let t0 = Instant::now();
        let mut gate = gate_at(t0);

        // Above noise floor, below significant: emitted, timer untouched
        assert!(gate.process(&reading(t0, 100, 0.01)).is_some());
        assert!(gate.process(&reading(t0, 110, 0.01)).is_some());
        assert_eq!(gate.last_shake(), t0);
    }
}
