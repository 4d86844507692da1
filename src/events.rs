//! State-change events published by the controller.

use crate::indicator::BellIndicator;
use crate::settings::Settings;
use crate::sound::BellType;

/// Something observable changed
#[derive(Debug, Clone, PartialEq)]
pub enum BellEvent {
    /// Sensing switched on or off
    ActivationChanged(bool),

    /// New shake magnitude from the sampler
    Magnitude(f64),

    /// A bell was triggered
    Rang {
        intensity: f64,
        volume: f32,
        bell: BellType,
        /// Voices in the registry after this one was added
        live_voices: usize,
    },

    /// The bell indicator changed colour
    IndicatorChanged(BellIndicator),

    /// Preferences were changed (and persisted if a store is attached)
    SettingsChanged(Settings),

    /// User-visible failure message
    Error(String),
}

/// Event subscriber callback
pub type Subscriber = Box<dyn FnMut(&BellEvent)>;

/// Fan-out of events to registered subscribers, in registration order
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Subscriber>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: Subscriber) {
        self.subscribers.push(subscriber);
    }

    pub fn publish(&mut self, event: BellEvent) {
        if let BellEvent::Error(message) = &event {
            log::warn!("{}", message);
        }
        for subscriber in &mut self.subscribers {
            subscriber(&event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
