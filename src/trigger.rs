//! Shake trigger policy: magnitude + user percentages -> optional intensity.

use serde::{Deserialize, Serialize};

use crate::params::{SENSITIVITY_RANGE, THRESHOLD_RANGE};

/// User-adjustable trigger percentages, both within [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerConfig {
    pub threshold: f64,
    pub sensitivity: f64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            threshold: 11.0,
            sensitivity: 100.0,
        }
    }
}

impl TriggerConfig {
    /// Create a config, clamping both percentages into [0, 100]
    pub fn new(threshold: f64, sensitivity: f64) -> Self {
        Self {
            threshold: clamp_percent(threshold),
            sensitivity: clamp_percent(sensitivity),
        }
    }

    /// Threshold mapped into [0.1, 2.0]
    pub fn effective_threshold(&self) -> f64 {
        THRESHOLD_RANGE.map(self.threshold)
    }

    /// Sensitivity mapped into [0.1, 1.5]
    pub fn effective_sensitivity(&self) -> f64 {
        SENSITIVITY_RANGE.map(self.sensitivity)
    }

    /// Decide whether `magnitude` fires the bell.
    ///
    /// Returns the intensity `(magnitude - threshold) * sensitivity` when the
    /// magnitude strictly exceeds the effective threshold. The intensity is
    /// not bounded above; the player clamps the resulting volume.
    pub fn evaluate(&self, magnitude: f64) -> Option<f64> {
        let threshold = self.effective_threshold();
        if magnitude > threshold {
            Some((magnitude - threshold) * self.effective_sensitivity())
        } else {
            None
        }
    }
}

/// Clamp a percentage into [0, 100]; NaN becomes 0
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_threshold_mapping_bounds() {
        assert!(approx(TriggerConfig::new(0.0, 50.0).effective_threshold(), 0.1));
        assert!(approx(TriggerConfig::new(100.0, 50.0).effective_threshold(), 2.0));
        assert!(approx(TriggerConfig::default().effective_threshold(), 0.309));
    }

    #[test]
    fn test_sensitivity_mapping_bounds() {
        assert!(approx(TriggerConfig::new(50.0, 0.0).effective_sensitivity(), 0.1));
        assert!(approx(TriggerConfig::new(50.0, 100.0).effective_sensitivity(), 1.5));
    }

    #[test]
    fn test_mappings_are_monotonic() {
        let mut last_threshold = f64::MIN;
        let mut last_sensitivity = f64::MIN;
        for percent in 0..=100 {
            let config = TriggerConfig::new(percent as f64, percent as f64);
            assert!(config.effective_threshold() > last_threshold);
            assert!(config.effective_sensitivity() > last_sensitivity);
            last_threshold = config.effective_threshold();
            last_sensitivity = config.effective_sensitivity();
        }
    }

    #[test]
    fn test_at_or_below_threshold_never_fires() {
        let config = TriggerConfig::default();
        let threshold = config.effective_threshold();
        assert_eq!(config.evaluate(threshold), None);
        assert_eq!(config.evaluate(0.0), None);
        assert_eq!(config.evaluate(-1.0), None);
        for m in [0.05, 0.20, 0.05] {
            assert_eq!(config.evaluate(m), None);
        }
    }

    #[test]
    fn test_above_threshold_intensity() {
        let config = TriggerConfig::default();
        let intensity = config.evaluate(1.0).unwrap();
        assert!(approx(intensity, (1.0 - 0.309) * 1.5));
        assert!(intensity > 1.03 && intensity < 1.04);

        // Just above the threshold is still strictly positive
        let tiny = config.evaluate(config.effective_threshold() + 1e-6).unwrap();
        assert!(tiny > 0.0);
    }

    #[test]
    fn test_consecutive_samples_fire_independently() {
        let config = TriggerConfig::default();
        let fired = [1.0, 1.2, 0.9].iter().filter_map(|m| config.evaluate(*m)).count();
        assert_eq!(fired, 3);
    }

    #[test]
    fn test_percentages_are_clamped() {
        let config = TriggerConfig::new(-20.0, 250.0);
        assert_eq!(config.threshold, 0.0);
        assert_eq!(config.sensitivity, 100.0);
        assert_eq!(clamp_percent(f64::NAN), 0.0);
    }
}
