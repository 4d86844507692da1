//! Synthesized bell tone written as a 16-bit mono PCM WAV file.

use std::f64::consts::PI;
use std::io::{Seek, Write};
use std::path::Path;

use crate::params::ToneConfig;

/// WAV format the generator writes
pub fn wav_spec(config: &ToneConfig) -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate: config.sample_rate_hz,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

/// Sine tone samples: `trunc(peak * sin(2π f t))` with `peak = trunc(i16::MAX * amplitude)`
pub fn tone_samples(config: &ToneConfig) -> Vec<i16> {
    let peak = (i16::MAX as f64 * config.amplitude) as i16 as f64;
    let rate = config.sample_rate_hz as f64;

    (0..config.num_samples())
        .map(|i| {
            let t = i as f64 / rate;
            (peak * (2.0 * PI * config.frequency_hz * t).sin()) as i16
        })
        .collect()
}

/// Write the tone to any seekable writer
pub fn write_tone<W: Write + Seek>(writer: W, config: &ToneConfig) -> Result<(), String> {
    config.validate()?;

    let mut wav = hound::WavWriter::new(writer, wav_spec(config))
        .map_err(|e| format!("Failed to start WAV stream: {}", e))?;
    for sample in tone_samples(config) {
        wav.write_sample(sample)
            .map_err(|e| format!("Failed to write sample: {}", e))?;
    }
    wav.finalize()
        .map_err(|e| format!("Failed to finalize WAV: {}", e))
}

/// Write the tone to `path`, creating parent directories as needed
pub fn write_tone_file(path: &Path, config: &ToneConfig) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
    }
    let file = std::fs::File::create(path)
        .map_err(|e| format!("Failed to create {}: {}", path.display(), e))?;
    write_tone(std::io::BufWriter::new(file), config)?;

    log::info!(
        "Bell tone ({:.0}Hz, {:.2}s) written to {}",
        config.frequency_hz,
        config.duration_s,
        path.display()
    );
    Ok(())
}
