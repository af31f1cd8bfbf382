use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

/// How a facade turns into a live frame when its slot becomes dominant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ActivationPolicy {
    /// Promote as soon as the slot owns the viewport.
    Auto,
    /// Wait for an explicit tap on the facade; neighbors still preload.
    Tap,
}

impl Default for ActivationPolicy {
    fn default() -> Self {
        ActivationPolicy::Auto
    }
}

/// Numeric behavior of the activation/eviction engine.
///
/// The defaults are load-bearing: downstream dashboards assume the 10s
/// dwell threshold and the 7-slot retention window, so ship them unchanged
/// unless the analytics side moves too.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedTuning {
    /// Slots kept live on each side of the dominant one.
    pub window_radius: usize,
    /// Delay before the next-forward neighbor preloads.
    pub forward_cascade_ms: u64,
    /// Delay before the previous neighbor preloads. Longer than forward:
    /// users mostly keep scrolling down.
    pub backward_cascade_ms: u64,
    /// Grace period before an out-of-window slot is torn down.
    pub demote_grace_ms: u64,
    /// Quiet interval after the last scroll motion before the position
    /// estimator re-derives the dominant index.
    pub quiet_debounce_ms: u64,
    /// Dwell needed for a view to count as played.
    pub dwell_threshold_ms: u64,
    pub activation: ActivationPolicy,
}

impl Default for FeedTuning {
    fn default() -> Self {
        Self {
            window_radius: 3,
            forward_cascade_ms: 500,
            backward_cascade_ms: 1000,
            demote_grace_ms: 2000,
            quiet_debounce_ms: 200,
            dwell_threshold_ms: 10_000,
            activation: ActivationPolicy::Auto,
        }
    }
}

impl FeedTuning {
    /// Reads overrides from a JSON file, falling back to defaults when the
    /// file is missing or malformed.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Total number of slots retained around the dominant one.
    pub fn window_size(&self) -> usize {
        self.window_radius * 2 + 1
    }

    pub fn forward_cascade(&self) -> Duration {
        Duration::from_millis(self.forward_cascade_ms)
    }

    pub fn backward_cascade(&self) -> Duration {
        Duration::from_millis(self.backward_cascade_ms)
    }

    pub fn demote_grace(&self) -> Duration {
        Duration::from_millis(self.demote_grace_ms)
    }

    pub fn quiet_debounce(&self) -> Duration {
        Duration::from_millis(self.quiet_debounce_ms)
    }

    pub fn dwell_threshold(&self) -> Duration {
        Duration::from_millis(self.dwell_threshold_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_shipped_behavior() {
        let tuning = FeedTuning::default();
        assert_eq!(tuning.window_radius, 3);
        assert_eq!(tuning.window_size(), 7);
        assert_eq!(tuning.forward_cascade_ms, 500);
        assert_eq!(tuning.backward_cascade_ms, 1000);
        assert_eq!(tuning.demote_grace_ms, 2000);
        assert_eq!(tuning.quiet_debounce_ms, 200);
        assert_eq!(tuning.dwell_threshold_ms, 10_000);
        assert_eq!(tuning.activation, ActivationPolicy::Auto);
    }

    #[test]
    fn partial_json_overrides_keep_remaining_defaults() {
        let tuning: FeedTuning =
            serde_json::from_str(r#"{"windowRadius": 2, "activation": "tap"}"#).unwrap();
        assert_eq!(tuning.window_radius, 2);
        assert_eq!(tuning.activation, ActivationPolicy::Tap);
        assert_eq!(tuning.dwell_threshold_ms, 10_000);
    }

    #[test]
    fn missing_override_file_yields_defaults() {
        let tuning = FeedTuning::load_or_default("/nonexistent/feed-tuning.json");
        assert_eq!(tuning, FeedTuning::default());
    }
}
