//! Raw accelerometer readings.

use std::time::Instant;

/// One 3-axis accelerometer reading in units of g
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,

    /// Arrival time of the reading
    pub timestamp: Instant,
}

impl MotionSample {
    pub fn new(x: f64, y: f64, z: f64, timestamp: Instant) -> Self {
        Self { x, y, z, timestamp }
    }

    /// Euclidean norm of the acceleration vector (g)
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// What a source delivers to the sampler
#[derive(Debug, Clone)]
pub enum SensorReading {
    Sample(MotionSample),
    /// Asynchronous sensor failure, delivered in-band
    Error(String),
}
