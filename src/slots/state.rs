use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Lifecycle of one feed section's embedded content.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SlotState {
    /// Lightweight facade only; no frame instantiated.
    Placeholder,
    /// Frame mounted, load outcome not yet reported.
    Loading,
    /// Frame mounted and loaded.
    Ready,
    /// Load failed; a static notice is showing instead of the frame.
    Error,
}

impl Default for SlotState {
    fn default() -> Self {
        SlotState::Placeholder
    }
}

/// Per-item slot, created once at startup and cycled through states as the
/// user scrolls. `activation` increments on every promotion so deferred
/// work scheduled against an earlier activation can be recognized as stale.
#[derive(Debug, Clone)]
pub struct Slot {
    pub index: usize,
    pub state: SlotState,
    pub last_activated_at: Option<Instant>,
    pub view_entered_at: Option<Instant>,
    pub load_started_at: Option<Instant>,
    pub activation: u64,
    pub played: bool,
}

impl Slot {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            state: SlotState::Placeholder,
            last_activated_at: None,
            view_entered_at: None,
            load_started_at: None,
            activation: 0,
            played: false,
        }
    }

    /// A live slot holds a mounted frame (loaded or not).
    pub fn is_live(&self) -> bool {
        matches!(self.state, SlotState::Loading | SlotState::Ready)
    }

    pub fn begin_load(&mut self, now: Instant) {
        self.state = SlotState::Loading;
        self.last_activated_at = Some(now);
        self.load_started_at = Some(now);
        self.activation += 1;
        self.played = false;
    }

    /// Returns the load duration for the analytics payload.
    pub fn finish_load(&mut self, now: Instant) -> Duration {
        self.state = SlotState::Ready;
        let started = self.load_started_at.unwrap_or(now);
        now.duration_since(started)
    }

    pub fn fail_load(&mut self, now: Instant) -> Duration {
        self.state = SlotState::Error;
        let started = self.load_started_at.unwrap_or(now);
        now.duration_since(started)
    }

    pub fn reset(&mut self) {
        self.state = SlotState::Placeholder;
        self.load_started_at = None;
        self.view_entered_at = None;
        self.played = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_counter_advances_on_each_load() {
        let base = Instant::now();
        let mut slot = Slot::new(3);
        assert_eq!(slot.activation, 0);

        slot.begin_load(base);
        assert_eq!(slot.activation, 1);
        assert_eq!(slot.state, SlotState::Loading);

        slot.finish_load(base + Duration::from_millis(120));
        slot.reset();
        slot.begin_load(base + Duration::from_secs(5));
        assert_eq!(slot.activation, 2);
    }

    #[test]
    fn load_duration_is_measured_from_begin_load() {
        let base = Instant::now();
        let mut slot = Slot::new(0);
        slot.begin_load(base);
        let duration = slot.finish_load(base + Duration::from_millis(250));
        assert_eq!(duration, Duration::from_millis(250));
        assert_eq!(slot.state, SlotState::Ready);
    }

    #[test]
    fn reset_clears_per_activation_flags() {
        let base = Instant::now();
        let mut slot = Slot::new(1);
        slot.begin_load(base);
        slot.finish_load(base);
        slot.played = true;
        slot.view_entered_at = Some(base);

        slot.reset();
        assert_eq!(slot.state, SlotState::Placeholder);
        assert!(!slot.played);
        assert!(slot.view_entered_at.is_none());
    }
}
