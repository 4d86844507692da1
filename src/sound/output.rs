//! Audio output backends.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::error::SoundError;
use super::voice::{Mixer, PlaybackHandle};

/// Destination for playback instances
pub trait AudioOutput {
    /// Start playing `voice` alongside whatever is already playing
    fn submit(&self, voice: PlaybackHandle) -> Result<(), SoundError>;
}

/// Default output device via cpal, mixing all live voices in the stream callback
pub struct CpalOutput {
    /// Voices shared with the audio callback
    mixer: Arc<Mutex<Mixer>>,

    /// Set by the stream error callback
    failed: Arc<AtomicBool>,

    /// Audio output stream (kept alive)
    _stream: cpal::Stream,
}

impl CpalOutput {
    /// Open the default output device and start an idle stream
    pub fn new() -> Result<Self, SoundError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| SoundError::AudioSessionSetupFailed("No audio output device found".into()))?;

        let config = device.default_output_config().map_err(|e| {
            SoundError::AudioSessionSetupFailed(format!("Failed to get audio config: {}", e))
        })?;

        log::info!(
            "Audio: {} @ {}Hz, {} channel(s)",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            config.sample_rate().0,
            config.channels()
        );

        let stream_config: cpal::StreamConfig = config.into();
        let channels = stream_config.channels as usize;
        let sample_rate = stream_config.sample_rate.0;

        let mixer = Arc::new(Mutex::new(Mixer::new()));
        let mixer_cb = Arc::clone(&mixer);
        let failed = Arc::new(AtomicBool::new(false));
        let failed_cb = Arc::clone(&failed);

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| match mixer_cb.lock() {
                    Ok(mut mixer) => mixer.render(data, channels, sample_rate),
                    Err(_) => data.iter_mut().for_each(|s| *s = 0.0),
                },
                move |err| {
                    log::error!("Audio stream error: {}", err);
                    failed_cb.store(true, Ordering::Release);
                },
                None,
            )
            .map_err(|e| {
                SoundError::AudioSessionSetupFailed(format!("Failed to build audio stream: {}", e))
            })?;

        stream.play().map_err(|e| {
            SoundError::AudioSessionSetupFailed(format!("Failed to start audio stream: {}", e))
        })?;

        Ok(Self {
            mixer,
            failed,
            _stream: stream,
        })
    }
}

impl AudioOutput for CpalOutput {
    fn submit(&self, voice: PlaybackHandle) -> Result<(), SoundError> {
        if self.failed.load(Ordering::Acquire) {
            return Err(SoundError::PlaybackFailed);
        }
        let mut mixer = self.mixer.lock().map_err(|_| SoundError::PlaybackFailed)?;
        mixer.add(voice);
        Ok(())
    }
}

/// Output that plays nothing; every voice completes as soon as it is submitted
#[derive(Debug, Default)]
pub struct SilentOutput;

impl AudioOutput for SilentOutput {
    fn submit(&self, voice: PlaybackHandle) -> Result<(), SoundError> {
        log::debug!(
            "(muted) voice {} at volume {:.2}",
            voice.id(),
            voice.volume()
        );
        voice.finish();
        Ok(())
    }
}
