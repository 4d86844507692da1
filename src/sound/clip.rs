//! Bell clip decoding and caching.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::bell::BellType;
use super::error::SoundError;

/// Decoded mono clip
#[derive(Debug)]
pub struct Clip {
    /// Mono samples in [-1, 1]
    pub samples: Vec<f32>,

    /// Native sample rate of the clip (Hz)
    pub sample_rate: u32,
}

impl Clip {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Decode a WAV file, downmixing to mono
    pub fn load(path: &Path) -> Result<Self, SoundError> {
        if !path.is_file() {
            return Err(SoundError::AssetNotFound(path.display().to_string()));
        }

        let reader = hound::WavReader::open(path)
            .map_err(|e| SoundError::PlayerCreationFailed(format!("{}: {}", path.display(), e)))?;
        let spec = reader.spec();
        if spec.sample_rate == 0 {
            return Err(SoundError::PlayerCreationFailed(format!(
                "{}: sample rate is 0",
                path.display()
            )));
        }

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(|e| SoundError::PlayerCreationFailed(e.to_string()))?,
            hound::SampleFormat::Int => {
                let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()
                    .map_err(|e| SoundError::PlayerCreationFailed(e.to_string()))?
            }
        };

        let channels = spec.channels.max(1) as usize;
        let samples = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect();

        Ok(Self::new(samples, spec.sample_rate))
    }
}

/// Lazily loaded clips, one per bell type
pub struct ClipLibrary {
    assets_dir: PathBuf,
    clips: HashMap<BellType, Arc<Clip>>,
}

impl ClipLibrary {
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
            clips: HashMap::new(),
        }
    }

    /// Bell types whose clip file does not exist
    pub fn missing(&self) -> Vec<BellType> {
        BellType::ALL
            .into_iter()
            .filter(|bell| !bell.asset_path(&self.assets_dir).is_file())
            .collect()
    }

    /// Get the clip for `bell`, decoding it on first use
    pub fn get(&mut self, bell: BellType) -> Result<Arc<Clip>, SoundError> {
        if let Some(clip) = self.clips.get(&bell) {
            return Ok(Arc::clone(clip));
        }

        let path = bell.asset_path(&self.assets_dir);
        let clip = Arc::new(Clip::load(&path)?);
        log::debug!(
            "Loaded {} ({} samples @ {}Hz)",
            path.display(),
            clip.samples.len(),
            clip.sample_rate
        );
        self.clips.insert(bell, Arc::clone(&clip));
        Ok(clip)
    }

    /// Insert an already decoded clip (used for preloaded or synthesized bells)
    pub fn insert(&mut self, bell: BellType, clip: Clip) {
        self.clips.insert(bell, Arc::new(clip));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TempDir;

    fn write_wav(path: &Path, channels: u16, frames: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for s in frames {
            writer.write_sample(*s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_missing_clip_is_asset_not_found() {
        let dir = TempDir::new("clip-missing");
        let mut library = ClipLibrary::new(dir.path());
        assert_eq!(library.missing(), BellType::ALL.to_vec());
        assert!(matches!(
            library.get(BellType::Regular),
            Err(SoundError::AssetNotFound(_))
        ));
    }

    #[test]
    fn test_undecodable_clip_is_creation_failure() {
        let dir = TempDir::new("clip-garbage");
        std::fs::write(BellType::Cow.asset_path(dir.path()), b"not a wav").unwrap();
        let mut library = ClipLibrary::new(dir.path());
        assert!(matches!(
            library.get(BellType::Cow),
            Err(SoundError::PlayerCreationFailed(_))
        ));
    }

    #[test]
    fn test_zero_sample_rate_is_creation_failure() {
        let dir = TempDir::new("clip-zero-rate");
        let path = BellType::Regular.asset_path(dir.path());

        // Canonical 16-bit mono header with a sample rate of 0, two samples
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&40u32.to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
        bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
        bytes.extend_from_slice(&0u32.to_le_bytes()); // sample rate
        bytes.extend_from_slice(&0u32.to_le_bytes()); // byte rate
        bytes.extend_from_slice(&2u16.to_le_bytes()); // block align
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(&16i16.to_le_bytes());
        bytes.extend_from_slice(&16i16.to_le_bytes());
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(
            Clip::load(&path),
            Err(SoundError::PlayerCreationFailed(_))
        ));
        let mut library = ClipLibrary::new(dir.path());
        assert!(library.get(BellType::Regular).is_err());
    }

    #[test]
    fn test_stereo_clip_is_downmixed_and_cached() {
        let dir = TempDir::new("clip-stereo");
        write_wav(
            &BellType::Regular.asset_path(dir.path()),
            2,
            &[16384, 0, -16384, -16384],
        );

        let mut library = ClipLibrary::new(dir.path());
        assert_eq!(library.missing(), vec![BellType::Cow]);

        let clip = library.get(BellType::Regular).unwrap();
        assert_eq!(clip.sample_rate, 22050);
        assert_eq!(clip.samples.len(), 2);
        assert!((clip.samples[0] - 0.25).abs() < 1e-6);
        assert!((clip.samples[1] + 0.5).abs() < 1e-6);

        let again = library.get(BellType::Regular).unwrap();
        assert!(Arc::ptr_eq(&clip, &again));
    }
}
