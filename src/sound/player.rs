//! Bell player with overlapping playback.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use super::bell::BellType;
use super::clip::ClipLibrary;
use super::error::SoundError;
use super::output::AudioOutput;
use super::voice::{PlaybackHandle, Voice};
use crate::params::PlayerConfig;

/// Plays the selected bell, one independent voice per trigger.
///
/// Rapid triggers layer on top of each other rather than cutting the
/// previous ring short. Finished voices are pruned from the registry, but the
/// number of simultaneous voices is not capped.
pub struct SoundPlayer {
    config: PlayerConfig,
    bell_type: BellType,
    library: ClipLibrary,
    output: Box<dyn AudioOutput>,

    /// Live voices, in creation order
    active: Vec<PlaybackHandle>,
    next_id: u64,

    /// Completion notices from finished voices
    done_tx: Sender<u64>,
    done_rx: Receiver<u64>,
}

impl SoundPlayer {
    pub fn new(config: PlayerConfig, bell_type: BellType, output: Box<dyn AudioOutput>) -> Self {
        let library = ClipLibrary::new(config.assets_dir.clone());
        Self::with_library(config, bell_type, library, output)
    }

    pub fn with_library(
        config: PlayerConfig,
        bell_type: BellType,
        library: ClipLibrary,
        output: Box<dyn AudioOutput>,
    ) -> Self {
        let (done_tx, done_rx) = mpsc::channel();
        Self {
            config,
            bell_type,
            library,
            output,
            active: Vec::new(),
            next_id: 0,
            done_tx,
            done_rx,
        }
    }

    pub fn bell_type(&self) -> BellType {
        self.bell_type
    }

    pub fn set_bell_type(&mut self, bell_type: BellType) {
        self.bell_type = bell_type;
    }

    /// Bell types whose bundled clip is missing
    pub fn missing_assets(&self) -> Vec<BellType> {
        self.library.missing()
    }

    /// Volume for a trigger intensity: `clamp(intensity * gain, 0, 1)`
    pub fn volume_for(&self, intensity: f64) -> f32 {
        let volume = intensity as f32 * self.config.volume_gain;
        if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        }
    }

    /// Play the current bell at a volume derived from `intensity`
    pub fn play(&mut self, intensity: f64) -> Result<PlaybackHandle, SoundError> {
        let clip = self.library.get(self.bell_type)?;

        let voice = Arc::new(Voice::new(
            self.next_id,
            clip,
            self.volume_for(intensity),
            Some(self.done_tx.clone()),
        ));
        self.next_id += 1;

        // Clean up finished voices before adding the new one
        self.prune_finished();
        self.active.push(Arc::clone(&voice));

        if let Err(e) = self.output.submit(Arc::clone(&voice)) {
            voice.finish();
            self.prune_finished();
            return Err(e);
        }

        log::debug!(
            "{} voice {} at volume {:.2} ({} live)",
            self.bell_type,
            voice.id(),
            voice.volume(),
            self.active.len()
        );
        Ok(voice)
    }

    /// Drain completion notices; prunes the registry if any voice finished.
    ///
    /// Returns the number of completions seen.
    pub fn handle_completions(&mut self) -> usize {
        let completed = self.done_rx.try_iter().count();
        if completed > 0 {
            self.prune_finished();
        }
        completed
    }

    /// Drop every voice that is no longer playing
    pub fn prune_finished(&mut self) {
        self.active.retain(|voice| voice.is_playing());
    }

    /// Number of voices in the registry (may include finished, not yet pruned ones)
    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}
