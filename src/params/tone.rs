//! Synthesized bell tone configuration.

/// Sine tone written by the WAV generator
#[derive(Debug, Clone)]
pub struct ToneConfig {
    /// Output sample rate (Hz)
    pub sample_rate_hz: u32,

    /// Tone length (seconds)
    pub duration_s: f64,

    /// Tone frequency (Hz)
    /// 1760 Hz = A6
    pub frequency_hz: f64,

    /// Peak amplitude as a fraction of i16 full scale
    pub amplitude: f64,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44100,
            duration_s: 0.2,
            frequency_hz: 1760.0,
            amplitude: 0.8,
        }
    }
}

impl ToneConfig {
    /// Total number of samples in the tone
    pub fn num_samples(&self) -> usize {
        (self.duration_s * self.sample_rate_hz as f64) as usize
    }

    /// Validate configuration (positive rate and duration, amplitude in range)
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate_hz == 0 {
            return Err("Sample rate must be > 0".to_string());
        }
        if !(self.duration_s > 0.0) {
            return Err(format!("Duration must be > 0, got {}", self.duration_s));
        }
        if !(0.0..=1.0).contains(&self.amplitude) {
            return Err(format!(
                "Amplitude must be within [0, 1], got {}",
                self.amplitude
            ));
        }
        Ok(())
    }
}
