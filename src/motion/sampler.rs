//! Motion sampler: source lifecycle, debounce gate and exposed magnitude.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Instant;

use super::error::MotionError;
use super::gate::DebounceGate;
use super::idle::{IdleSleepGuard, SleepInhibitor};
use super::sample::SensorReading;
use super::source::AccelerometerSource;
use crate::params::SamplerConfig;

/// What a poll of the sampler produced, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum SamplerUpdate {
    /// New exposed magnitude
    Magnitude(f64),
    /// Asynchronous sensor error
    Error(String),
    /// The source stopped delivering (e.g. end of a replay)
    Ended,
}

/// Turns a stream of raw readings into a debounced shake magnitude.
///
/// Owned by the main sequence. Sources deliver readings on their own thread
/// into a channel; `poll` drains it and applies the gate.
pub struct MotionSampler {
    config: SamplerConfig,
    source: Box<dyn AccelerometerSource>,
    inhibitor: Arc<dyn SleepInhibitor>,
    gate: DebounceGate,

    /// Channel from the running source (None while inactive)
    readings: Option<Receiver<SensorReading>>,

    /// Held while active
    idle_guard: Option<IdleSleepGuard>,

    magnitude: f64,
    active: bool,
}

impl MotionSampler {
    pub fn new(
        config: SamplerConfig,
        source: Box<dyn AccelerometerSource>,
        inhibitor: Arc<dyn SleepInhibitor>,
    ) -> Self {
        let gate = DebounceGate::new(&config, Instant::now());
        Self {
            config,
            source,
            inhibitor,
            gate,
            readings: None,
            idle_guard: None,
            magnitude: 0.0,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Latest emitted magnitude (0 while inactive)
    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Start sensing. Does nothing if already active.
    pub fn start(&mut self) -> Result<(), MotionError> {
        if self.active {
            return Ok(());
        }
        if !self.source.is_available() {
            return Err(MotionError::SensorUnavailable);
        }

        // Released again on any early return below
        let guard = IdleSleepGuard::acquire(Arc::clone(&self.inhibitor));

        let (tx, rx) = mpsc::channel();
        self.source.start(self.config.update_interval(), tx)?;

        log::info!(
            "Motion sensing started ({} @ {:.0}Hz)",
            self.source.name(),
            self.config.rate_hz()
        );
        self.readings = Some(rx);
        self.idle_guard = Some(guard);
        self.active = true;
        Ok(())
    }

    /// Stop sensing and zero the magnitude. Idempotent.
    ///
    /// The sampler always ends up inactive; a source stop failure is still
    /// reported.
    pub fn stop(&mut self) -> Result<(), MotionError> {
        if !self.active {
            return Ok(());
        }

        let result = self.source.stop();
        self.readings = None;
        self.idle_guard = None;
        self.active = false;
        self.magnitude = 0.0;
        log::info!("Motion sensing stopped");
        result
    }

    /// Drain pending readings through the gate
    pub fn poll(&mut self) -> Vec<SamplerUpdate> {
        let mut updates = Vec::new();
        if !self.active {
            return updates;
        }
        let Some(readings) = &self.readings else {
            return updates;
        };

        let mut ended = false;
        loop {
            match readings.try_recv() {
                Ok(SensorReading::Sample(sample)) => {
                    if let Some(magnitude) = self.gate.process(&sample) {
                        self.magnitude = magnitude;
                        updates.push(SamplerUpdate::Magnitude(magnitude));
                    }
                }
                Ok(SensorReading::Error(e)) => {
                    updates.push(SamplerUpdate::Error(format!("Motion detection error: {}", e)));
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    updates.push(SamplerUpdate::Ended);
                    ended = true;
                    break;
                }
            }
        }
        if ended {
            self.readings = None;
        }
        updates
    }
}

impl Drop for MotionSampler {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("{}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CountingInhibitor, ManualSource};
    use std::time::Duration;

    fn sampler(source: ManualSource, inhibitor: &Arc<CountingInhibitor>) -> MotionSampler {
        MotionSampler::new(
            SamplerConfig::default(),
            Box::new(source),
            Arc::clone(inhibitor) as Arc<dyn SleepInhibitor>,
        )
    }

    fn later(ms: u64) -> Instant {
        Instant::now() + Duration::from_millis(ms)
    }

    #[test]
    fn test_start_unavailable() {
        let inhibitor = Arc::new(CountingInhibitor::default());
        let mut s = sampler(ManualSource::unavailable(), &inhibitor);
        assert_eq!(s.start(), Err(MotionError::SensorUnavailable));
        assert!(!s.is_active());
        assert_eq!(inhibitor.inhibits(), 0);
    }

    #[test]
    fn test_failed_start_releases_idle_guard() {
        let inhibitor = Arc::new(CountingInhibitor::default());
        let mut s = sampler(ManualSource::refusing(), &inhibitor);
        assert!(matches!(s.start(), Err(MotionError::SensorStartFailed(_))));
        assert!(!s.is_active());
        assert!(!inhibitor.is_inhibited());
    }

    #[test]
    fn test_start_poll_stop() {
        let inhibitor = Arc::new(CountingInhibitor::default());
        let source = ManualSource::new();
        let feed = source.feed();
        let mut s = sampler(source, &inhibitor);

        s.start().unwrap();
        assert!(s.is_active());
        assert!(inhibitor.is_inhibited());

        feed.push(0.0, 0.0, 1.0, later(200)); // 0.2g after offset
        feed.push(0.0, 0.0, 0.801, later(400)); // below noise floor
        feed.error("gyro hiccup");

        let updates = s.poll();
        assert_eq!(updates.len(), 2);
        match updates[0] {
            SamplerUpdate::Magnitude(m) => assert!((m - 0.3).abs() < 1e-9),
            ref other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            updates[1],
            SamplerUpdate::Error("Motion detection error: gyro hiccup".into())
        );
        assert!((s.magnitude() - 0.3).abs() < 1e-9);

        s.stop().unwrap();
        assert!(!s.is_active());
        assert_eq!(s.magnitude(), 0.0);
        assert!(!inhibitor.is_inhibited());

        // Second stop has no further effect
        s.stop().unwrap();
        assert_eq!(inhibitor.releases(), 1);
    }

    #[test]
    fn test_stop_failure_still_deactivates() {
        let inhibitor = Arc::new(CountingInhibitor::default());
        let source = ManualSource::failing_stop();
        let feed = source.feed();
        let mut s = sampler(source, &inhibitor);

        s.start().unwrap();
        feed.push(0.0, 0.0, 1.0, later(200));
        s.poll();
        assert!(s.magnitude() > 0.0);

        assert!(matches!(s.stop(), Err(MotionError::SensorStopFailed(_))));
        assert!(!s.is_active());
        assert_eq!(s.magnitude(), 0.0);
        assert!(!inhibitor.is_inhibited());
        assert_eq!(inhibitor.releases(), 1);

        // Already inactive: nothing left to fail
        assert_eq!(s.stop(), Ok(()));
    }

    #[test]
    fn test_readings_after_stop_are_ignored() {
        let inhibitor = Arc::new(CountingInhibitor::default());
        let source = ManualSource::new();
        let feed = source.feed();
        let mut s = sampler(source, &inhibitor);

        s.start().unwrap();
        s.stop().unwrap();
        feed.push(0.0, 0.0, 3.0, later(200));
        assert!(s.poll().is_empty());
        assert_eq!(s.magnitude(), 0.0);
    }

    #[test]
    fn test_source_end_is_reported() {
        let inhibitor = Arc::new(CountingInhibitor::default());
        let source = ManualSource::new();
        let feed = source.feed();
        let mut s = sampler(source, &inhibitor);

        s.start().unwrap();
        feed.close();
        assert_eq!(s.poll(), vec![SamplerUpdate::Ended]);
        assert!(s.poll().is_empty());
    }

    #[test]
    fn test_drop_releases_idle_guard() {
        let inhibitor = Arc::new(CountingInhibitor::default());
        {
            let mut s = sampler(ManualSource::new(), &inhibitor);
            s.start().unwrap();
            assert!(inhibitor.is_inhibited());
        }
        assert!(!inhibitor.is_inhibited());
    }
}
