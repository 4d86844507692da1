//! Colour-coded bell indicator state.

use std::time::{Duration, Instant};

use crate::params::RING_HOLD_MS;

/// What the bell icon shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BellIndicator {
    /// Sensing off (red)
    Inactive,
    /// Sensing on, quiet (green)
    Active,
    /// Sensing on, rang within the hold period (orange)
    Ringing,
}

impl BellIndicator {
    pub fn color_name(&self) -> &'static str {
        match self {
            BellIndicator::Inactive => "red",
            BellIndicator::Active => "green",
            BellIndicator::Ringing => "orange",
        }
    }
}

/// Tracks activation and the ring hold period
#[derive(Debug, Clone)]
pub struct IndicatorState {
    active: bool,
    ringing_until: Option<Instant>,
    ring_scale: f64,
    hold: Duration,
}

impl Default for IndicatorState {
    fn default() -> Self {
        Self::new(Duration::from_millis(RING_HOLD_MS))
    }
}

impl IndicatorState {
    pub fn new(hold: Duration) -> Self {
        Self {
            active: false,
            ringing_until: None,
            ring_scale: 0.0,
            hold,
        }
    }

    pub fn indicator(&self) -> BellIndicator {
        if !self.active {
            BellIndicator::Inactive
        } else if self.ringing_until.is_some() {
            BellIndicator::Ringing
        } else {
            BellIndicator::Active
        }
    }

    /// Ring animation scale in [0, 1] (0 when not ringing)
    pub fn ring_scale(&self) -> f64 {
        self.ring_scale
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Start (or extend) ringing at `now`
    pub fn ring(&mut self, now: Instant, scale: f64) {
        self.ringing_until = Some(now + self.hold);
        self.ring_scale = scale.clamp(0.0, 1.0);
    }

    /// End ringing once the hold period has passed. Returns true if it ended.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.ringing_until {
            Some(until) if now >= until => {
                self.ringing_until = None;
                self.ring_scale = 0.0;
                true
            }
            _ => false,
        }
    }
}
