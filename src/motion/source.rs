//! Accelerometer sources feeding the sampler.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::error::MotionError;
use super::sample::{MotionSample, SensorReading};

/// A device (or recording) that delivers accelerometer readings.
///
/// Sources deliver on their own thread; the sampler consumes the channel on
/// the main sequence.
pub trait AccelerometerSource {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Whether an accelerometer is present behind this source
    fn is_available(&self) -> bool;

    /// Begin delivering readings to `tx` roughly every `interval`
    fn start(&mut self, interval: Duration, tx: Sender<SensorReading>) -> Result<(), MotionError>;

    /// Halt delivery. Called only after a successful `start`.
    fn stop(&mut self) -> Result<(), MotionError>;
}

/// Source for hosts without an accelerometer
#[derive(Debug, Default)]
pub struct UnavailableSource;

impl AccelerometerSource for UnavailableSource {
    fn name(&self) -> &str {
        "none"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn start(&mut self, _interval: Duration, _tx: Sender<SensorReading>) -> Result<(), MotionError> {
        Err(MotionError::SensorUnavailable)
    }

    fn stop(&mut self) -> Result<(), MotionError> {
        Ok(())
    }
}

/// Replays recorded `x,y,z` readings (in g) from a text file at the sampling rate
pub struct ReplaySource {
    path: PathBuf,
    looping: bool,
    stop_flag: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl ReplaySource {
    pub fn new(path: impl Into<PathBuf>, looping: bool) -> Self {
        Self {
            path: path.into(),
            looping,
            stop_flag: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }
}

impl AccelerometerSource for ReplaySource {
    fn name(&self) -> &str {
        "replay"
    }

    fn is_available(&self) -> bool {
        self.path.is_file()
    }

    fn start(&mut self, interval: Duration, tx: Sender<SensorReading>) -> Result<(), MotionError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            MotionError::SensorStartFailed(format!("{}: {}", self.path.display(), e))
        })?;
        let vectors = parse_replay(&text).map_err(MotionError::SensorStartFailed)?;
        if vectors.is_empty() {
            return Err(MotionError::SensorStartFailed(format!(
                "{} contains no readings",
                self.path.display()
            )));
        }

        log::info!(
            "Replaying {} readings from {}",
            vectors.len(),
            self.path.display()
        );

        self.stop_flag = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&self.stop_flag);
        let looping = self.looping;

        let worker = thread::Builder::new()
            .name("bikebell-replay".into())
            .spawn(move || {
                let mut next_due = Instant::now();
                'replay: loop {
                    for [x, y, z] in &vectors {
                        if stop_flag.load(Ordering::Acquire) {
                            break 'replay;
                        }
                        let sample = MotionSample::new(*x, *y, *z, Instant::now());
                        if tx.send(SensorReading::Sample(sample)).is_err() {
                            break 'replay;
                        }
                        next_due += interval;
                        thread::sleep(next_due.saturating_duration_since(Instant::now()));
                    }
                    if !looping {
                        break;
                    }
                }
            })
            .map_err(|e| MotionError::SensorStartFailed(e.to_string()))?;

        self.worker = Some(worker);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), MotionError> {
        self.stop_flag.store(true, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            worker
                .join()
                .map_err(|_| MotionError::SensorStopFailed("replay thread panicked".into()))?;
        }
        Ok(())
    }
}

impl Drop for ReplaySource {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Parse replay text: one `x,y,z` reading per line (commas or whitespace).
///
/// Blank lines and `#` comments are skipped. A non-numeric first line is
/// treated as a header.
pub fn parse_replay(text: &str) -> Result<Vec<[f64; 3]>, String> {
    let mut vectors = Vec::new();
    let mut seen_content = false;

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty())
            .collect();

        let parsed: Result<Vec<f64>, _> = fields.iter().map(|f| f.parse::<f64>()).collect();
        match parsed {
            Ok(values) if values.len() == 3 => vectors.push([values[0], values[1], values[2]]),
            Ok(values) => {
                return Err(format!(
                    "line {}: expected 3 values, found {}",
                    index + 1,
                    values.len()
                ))
            }
            Err(_) if !seen_content => {} // header
            Err(e) => return Err(format!("line {}: {}", index + 1, e)),
        }
        seen_content = true;
    }

    Ok(vectors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TempDir;
    use std::sync::mpsc;

    #[test]
    fn test_parse_replay_formats() {
        let text = "x,y,z\n# at rest\n0.0, 0.0, 1.0\n\n0.1 0.2 0.3\n";
        let vectors = parse_replay(text).unwrap();
        assert_eq!(vectors, vec![[0.0, 0.0, 1.0], [0.1, 0.2, 0.3]]);
    }

    #[test]
    fn test_parse_replay_errors() {
        assert!(parse_replay("0.0,1.0\n").unwrap_err().contains("line 1"));
        assert!(parse_replay("0,0,1\nbad,0,1\n")
            .unwrap_err()
            .contains("line 2"));
    }

    #[test]
    fn test_unavailable_source() {
        let mut source = UnavailableSource;
        let (tx, _rx) = mpsc::channel();
        assert!(!source.is_available());
        assert_eq!(
            source.start(Duration::from_millis(15), tx),
            Err(MotionError::SensorUnavailable)
        );
    }

    #[test]
    fn test_replay_delivers_in_order_then_ends() {
        let dir = TempDir::new("replay");
        let path = dir.path().join("ride.csv");
        std::fs::write(&path, "0,0,1\n0,0,2\n0,0,3\n").unwrap();

        let mut source = ReplaySource::new(&path, false);
        assert!(source.is_available());

        let (tx, rx) = mpsc::channel();
        source.start(Duration::from_millis(1), tx).unwrap();

        let zs: Vec<f64> = rx
            .iter()
            .map(|reading| match reading {
                SensorReading::Sample(s) => s.z,
                SensorReading::Error(e) => panic!("unexpected error {}", e),
            })
            .collect();
        assert_eq!(zs, vec![1.0, 2.0, 3.0]);
        source.stop().unwrap();
    }

    #[test]
    fn test_replay_empty_file_fails_to_start() {
        let dir = TempDir::new("replay-empty");
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "# nothing\n").unwrap();

        let mut source = ReplaySource::new(&path, false);
        let (tx, _rx) = mpsc::channel();
        assert!(matches!(
            source.start(Duration::from_millis(1), tx),
            Err(MotionError::SensorStartFailed(_))
        ));
    }
}
