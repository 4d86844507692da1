//! Fakes shared by the unit tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::motion::{AccelerometerSource, MotionError, MotionSample, SensorReading, SleepInhibitor};
use crate::sound::{AudioOutput, PlaybackHandle, SoundError};

/// Scratch directory removed on drop
pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    pub fn new(label: &str) -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let path = std::env::temp_dir().join(format!(
            "bikebell-{}-{}-{}",
            label,
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// Inhibitor that only counts calls
#[derive(Default)]
pub struct CountingInhibitor {
    fail: bool,
    inhibited: AtomicBool,
    inhibits: AtomicUsize,
    releases: AtomicUsize,
}

impl CountingInhibitor {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn is_inhibited(&self) -> bool {
        self.inhibited.load(Ordering::SeqCst)
    }

    pub fn inhibits(&self) -> usize {
        self.inhibits.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl SleepInhibitor for CountingInhibitor {
    fn inhibit(&self) -> Result<(), String> {
        self.inhibits.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err("no inhibitor".into());
        }
        self.inhibited.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.inhibited.store(false, Ordering::SeqCst);
    }
}

type SharedSender = Arc<Mutex<Option<Sender<SensorReading>>>>;

/// Source driven by hand from the test through a `ManualFeed`
pub struct ManualSource {
    available: bool,
    refuse: bool,
    fail_stop: bool,
    sender: SharedSender,
}

impl ManualSource {
    pub fn new() -> Self {
        Self {
            available: true,
            refuse: false,
            fail_stop: false,
            sender: Arc::new(Mutex::new(None)),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::new()
        }
    }

    /// Starts normally but reports an error when stopped
    pub fn failing_stop() -> Self {
        Self {
            fail_stop: true,
            ..Self::new()
        }
    }

    pub fn feed(&self) -> ManualFeed {
        ManualFeed {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl AccelerometerSource for ManualSource {
    fn name(&self) -> &str {
        "manual"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn start(&mut self, _interval: Duration, tx: Sender<SensorReading>) -> Result<(), MotionError> {
        if self.refuse {
            return Err(MotionError::SensorStartFailed("refused".into()));
        }
        *self.sender.lock().unwrap() = Some(tx);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), MotionError> {
        *self.sender.lock().unwrap() = None;
        if self.fail_stop {
            return Err(MotionError::SensorStopFailed("stuck".into()));
        }
        Ok(())
    }
}

/// Test-side handle pushing readings into a `ManualSource`
pub struct ManualFeed {
    sender: SharedSender,
}

impl ManualFeed {
    pub fn push(&self, x: f64, y: f64, z: f64, at: Instant) {
        if let Some(tx) = self.sender.lock().unwrap().as_ref() {
            let _ = tx.send(SensorReading::Sample(MotionSample::new(x, y, z, at)));
        }
    }

    pub fn error(&self, message: &str) {
        if let Some(tx) = self.sender.lock().unwrap().as_ref() {
            let _ = tx.send(SensorReading::Error(message.to_string()));
        }
    }

    /// Drop the source's sender, ending delivery
    pub fn close(&self) {
        *self.sender.lock().unwrap() = None;
    }
}

/// Output that records submitted voices without rendering them
#[derive(Clone, Default)]
pub struct RecordingOutput {
    reject: bool,
    submitted: Arc<Mutex<Vec<PlaybackHandle>>>,
}

impl RecordingOutput {
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    pub fn submitted(&self) -> Vec<PlaybackHandle> {
        self.submitted.lock().unwrap().clone()
    }
}

impl AudioOutput for RecordingOutput {
    fn submit(&self, voice: PlaybackHandle) -> Result<(), SoundError> {
        if self.reject {
            return Err(SoundError::PlaybackFailed);
        }
        self.submitted.lock().unwrap().push(voice);
        Ok(())
    }
}
