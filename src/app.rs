//! The bell controller wiring sampler, trigger policy and player together.

use std::time::Instant;

use crate::events::{BellEvent, EventBus, Subscriber};
use crate::indicator::{BellIndicator, IndicatorState};
use crate::motion::{MotionSampler, SamplerUpdate};
use crate::settings::{PreferenceStore, Settings};
use crate::sound::{BellType, SoundPlayer};

/// Shake-triggered bell.
///
/// All state lives here and is only touched from the thread that owns the
/// controller. Sensor threads hand readings over through the sampler's
/// channel; `tick` drains them. Every failure is published as
/// `BellEvent::Error` and leaves the controller usable.
pub struct BikeBell {
    sampler: MotionSampler,
    player: SoundPlayer,
    settings: Settings,
    store: Option<PreferenceStore>,
    indicator: IndicatorState,
    events: EventBus,
}

impl BikeBell {
    pub fn new(
        sampler: MotionSampler,
        mut player: SoundPlayer,
        settings: Settings,
        store: Option<PreferenceStore>,
    ) -> Self {
        player.set_bell_type(settings.bell_type);
        Self {
            sampler,
            player,
            settings,
            store,
            indicator: IndicatorState::default(),
            events: EventBus::new(),
        }
    }

    pub fn subscribe(&mut self, subscriber: Subscriber) {
        self.events.subscribe(subscriber);
    }

    pub fn is_active(&self) -> bool {
        self.sampler.is_active()
    }

    pub fn magnitude(&self) -> f64 {
        self.sampler.magnitude()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn indicator(&self) -> BellIndicator {
        self.indicator.indicator()
    }

    /// Ring animation scale in [0, 1]: magnitude over threshold at the last ring
    pub fn ring_scale(&self) -> f64 {
        self.indicator.ring_scale()
    }

    pub fn live_voices(&self) -> usize {
        self.player.active_count()
    }

    pub fn source_name(&self) -> &str {
        self.sampler.source_name()
    }

    /// Publish a failure raised outside the controller (e.g. audio setup)
    pub fn report_error(&mut self, message: impl Into<String>) {
        self.events.publish(BellEvent::Error(message.into()));
    }

    /// Report every bell whose clip is missing
    pub fn check_assets(&mut self) {
        for bell in self.player.missing_assets() {
            self.events
                .publish(BellEvent::Error(format!("Could not find sound file for {}", bell)));
        }
    }

    /// Flip sensing on or off; returns the new activation state
    pub fn toggle(&mut self) -> bool {
        if self.sampler.is_active() {
            self.stop_sensing();
        } else {
            self.start_sensing();
        }
        self.sampler.is_active()
    }

    pub fn start_sensing(&mut self) {
        if self.sampler.is_active() {
            return;
        }
        match self.sampler.start() {
            Ok(()) => self.set_active(true),
            Err(e) => self.events.publish(BellEvent::Error(format!(
                "Failed to start motion detection: {}",
                e
            ))),
        }
    }

    pub fn stop_sensing(&mut self) {
        if !self.sampler.is_active() {
            return;
        }
        if let Err(e) = self.sampler.stop() {
            self.events.publish(BellEvent::Error(e.to_string()));
        }
        self.set_active(false);
    }

    fn set_active(&mut self, active: bool) {
        let before = self.indicator.indicator();
        self.indicator.set_active(active);
        self.events.publish(BellEvent::ActivationChanged(active));
        self.publish_indicator_if_changed(before);
    }

    /// Run one pass of the main sequence at `now`
    pub fn tick(&mut self, now: Instant) {
        for update in self.sampler.poll() {
            match update {
                SamplerUpdate::Magnitude(magnitude) => {
                    self.events.publish(BellEvent::Magnitude(magnitude));
                    self.on_magnitude(magnitude, now);
                }
                SamplerUpdate::Error(message) => self.events.publish(BellEvent::Error(message)),
                SamplerUpdate::Ended => {
                    log::info!("Motion source ended");
                    self.stop_sensing();
                }
            }
        }

        self.player.handle_completions();

        let before = self.indicator.indicator();
        if self.indicator.expire(now) {
            self.publish_indicator_if_changed(before);
        }
    }

    /// Feed a magnitude as if the sampler had produced it
    pub fn simulate_shake(&mut self, magnitude: f64, now: Instant) {
        self.events.publish(BellEvent::Magnitude(magnitude));
        self.on_magnitude(magnitude, now);
    }

    fn on_magnitude(&mut self, magnitude: f64, now: Instant) {
        let trigger = self.settings.trigger();
        let Some(intensity) = trigger.evaluate(magnitude) else {
            return;
        };

        match self.player.play(intensity) {
            Ok(voice) => {
                let before = self.indicator.indicator();
                self.indicator
                    .ring(now, magnitude / trigger.effective_threshold());
                self.events.publish(BellEvent::Rang {
                    intensity,
                    volume: voice.volume(),
                    bell: self.player.bell_type(),
                    live_voices: self.player.active_count(),
                });
                self.publish_indicator_if_changed(before);
            }
            Err(e) => self
                .events
                .publish(BellEvent::Error(format!("Failed to play bell sound: {}", e))),
        }
    }

    fn publish_indicator_if_changed(&mut self, before: BellIndicator) {
        let after = self.indicator.indicator();
        if after != before {
            self.events.publish(BellEvent::IndicatorChanged(after));
        }
    }

    pub fn set_threshold(&mut self, percent: f64) {
        self.settings.set_threshold(percent);
        self.settings_changed();
    }

    pub fn set_sensitivity(&mut self, percent: f64) {
        self.settings.set_sensitivity(percent);
        self.settings_changed();
    }

    pub fn set_bell_type(&mut self, bell: BellType) {
        self.settings.bell_type = bell;
        self.player.set_bell_type(bell);
        self.settings_changed();
    }

    /// Restore the default threshold and sensitivity
    pub fn reset_settings(&mut self) {
        self.settings.reset();
        self.settings_changed();
    }

    fn settings_changed(&mut self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(&self.settings) {
                self.events
                    .publish(BellEvent::Error(format!("Failed to save settings: {}", e)));
            }
        }
        self.events.publish(BellEvent::SettingsChanged(self.settings));
    }
}
