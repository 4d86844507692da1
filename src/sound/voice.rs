//! Playback instances and the software mixer that renders them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use super::clip::Clip;

/// One in-flight bell playback
#[derive(Debug)]
pub struct Voice {
    id: u64,
    clip: Arc<Clip>,
    volume: f32,
    finished: AtomicBool,
    on_finish: Option<Sender<u64>>,
}

/// Shared handle to a playing voice
pub type PlaybackHandle = Arc<Voice>;

impl Voice {
    pub fn new(id: u64, clip: Arc<Clip>, volume: f32, on_finish: Option<Sender<u64>>) -> Self {
        Self {
            id,
            clip,
            volume,
            finished: AtomicBool::new(false),
            on_finish,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn clip(&self) -> &Arc<Clip> {
        &self.clip
    }

    pub fn is_playing(&self) -> bool {
        !self.finished.load(Ordering::Acquire)
    }

    /// Mark the voice finished; the completion notice is sent at most once
    pub fn finish(&self) {
        if !self.finished.swap(true, Ordering::AcqRel) {
            if let Some(tx) = &self.on_finish {
                let _ = tx.send(self.id);
            }
        }
    }
}

/// A voice plus its read position in clip samples
struct MixerVoice {
    voice: PlaybackHandle,
    position: f64,
}

/// Sums every live voice into an interleaved output buffer
#[derive(Default)]
pub struct Mixer {
    voices: Vec<MixerVoice>,
}

impl Mixer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, voice: PlaybackHandle) {
        self.voices.push(MixerVoice {
            voice,
            position: 0.0,
        });
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Render interleaved frames into `out`, overwriting it.
    ///
    /// Clips are stepped at `clip_rate / output_rate` samples per frame
    /// (nearest-index resampling). Voices that run off the end of their clip
    /// are finished and dropped.
    pub fn render(&mut self, out: &mut [f32], channels: usize, output_rate: u32) {
        let channels = channels.max(1);
        out.iter_mut().for_each(|s| *s = 0.0);

        for mv in &mut self.voices {
            let clip = mv.voice.clip();
            if clip.sample_rate == 0 {
                // Cannot advance; end it now
                mv.position = clip.samples.len() as f64;
                continue;
            }
            let step = clip.sample_rate as f64 / output_rate.max(1) as f64;
            let volume = mv.voice.volume();

            for frame in out.chunks_mut(channels) {
                let index = mv.position as usize;
                let Some(sample) = clip.samples.get(index) else {
                    break;
                };
                for slot in frame.iter_mut() {
                    *slot += sample * volume;
                }
                mv.position += step;
            }
        }

        // Hard clip the summed signal
        out.iter_mut().for_each(|s| *s = s.clamp(-1.0, 1.0));

        self.voices.retain(|mv| {
            let done = mv.position as usize >= mv.voice.clip().samples.len();
            if done {
                mv.voice.finish();
            }
            !done
        });
    }
}
