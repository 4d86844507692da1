//! Percentage-to-operational range mappings for the trigger policy.

/// Linear mapping from a user percentage [0, 100] onto `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentRange {
    pub min: f64,
    pub max: f64,
}

impl PercentRange {
    /// Map a percentage onto this range
    pub fn map(&self, percent: f64) -> f64 {
        self.min + (percent / 100.0) * (self.max - self.min)
    }
}

/// Magnitude threshold range (g after gain)
/// 0% -> 0.1, 100% -> 2.0
pub const THRESHOLD_RANGE: PercentRange = PercentRange { min: 0.1, max: 2.0 };

/// Sensitivity multiplier range (dimensionless)
/// 0% -> 0.1, 100% -> 1.5
pub const SENSITIVITY_RANGE: PercentRange = PercentRange { min: 0.1, max: 1.5 };
