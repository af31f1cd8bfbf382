use std::time::{Duration, Instant};

// Set to false to silence the scroll-frequency logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_trace};

/// Visibility ratios the observation mechanism is asked to report at.
pub const VISIBILITY_THRESHOLDS: [f32; 3] = [0.0, 0.5, 1.0];

/// A slot owns the viewport once more than half of it is visible.
const DOMINANCE_RATIO: f32 = 0.5;

/// One visibility-ratio report for one slot, as delivered by the
/// observation mechanism. Reports arrive in batches; order within a batch
/// is the order the crossings were observed.
#[derive(Debug, Clone, Copy)]
pub struct Crossing {
    pub index: usize,
    pub ratio: f32,
}

/// Emitted when the viewport-dominant slot actually changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DominantChange {
    pub previous: Option<usize>,
    pub index: usize,
}

/// Tracks which slot owns the viewport.
///
/// Primary signal: visibility-ratio crossings. Secondary signal: a
/// position estimator from raw scroll offsets, consulted after the scroll
/// has been quiet for the debounce interval, or on every motion event when
/// the observation mechanism is unavailable.
pub struct ViewportTracker {
    len: usize,
    viewport_height: f64,
    scroll_offset: f64,
    dominant: Option<usize>,
    observer_available: bool,
    last_motion_at: Option<Instant>,
    quiet_deadline: Option<Instant>,
    quiet_debounce: Duration,
}

impl ViewportTracker {
    pub fn new(
        len: usize,
        viewport_height: f64,
        quiet_debounce: Duration,
        observer_available: bool,
    ) -> Self {
        if !observer_available {
            log::warn!("viewport observation unavailable, degrading to position estimator");
        }

        Self {
            len,
            viewport_height,
            scroll_offset: 0.0,
            dominant: None,
            observer_available,
            last_motion_at: None,
            quiet_deadline: None,
            quiet_debounce,
        }
    }

    pub fn dominant(&self) -> Option<usize> {
        self.dominant
    }

    pub fn observer_available(&self) -> bool {
        self.observer_available
    }

    /// Force the dominant index, bypassing dwell-based detection. Used by
    /// explicit navigation, which knows where the viewport is headed.
    pub fn set_dominant(&mut self, index: usize) {
        if index < self.len {
            self.dominant = Some(index);
        }
    }

    /// The user is mid-scroll until the debounce interval has elapsed
    /// since the last motion event.
    pub fn is_scrolling(&self, now: Instant) -> bool {
        self.last_motion_at
            .map(|at| now.duration_since(at) < self.quiet_debounce)
            .unwrap_or(false)
    }

    /// Processes one observation batch. The last slot seen crossing above
    /// the dominance ratio wins; the previous dominant is cleared before
    /// the new one is set, so at most one slot is dominant afterwards.
    /// Re-reports of the current dominant index are suppressed.
    pub fn process_batch(&mut self, crossings: &[Crossing]) -> Option<DominantChange> {
        if crossings.is_empty() {
            return None;
        }

        let mut candidate: Option<usize> = None;
        let mut dominant_left = false;

        for crossing in crossings {
            if crossing.index >= self.len {
                continue;
            }
            if crossing.ratio > DOMINANCE_RATIO {
                candidate = Some(crossing.index);
            } else if Some(crossing.index) == self.dominant {
                dominant_left = true;
            }
        }

        match candidate {
            Some(index) if Some(index) != self.dominant => {
                let previous = self.dominant.take();
                self.dominant = Some(index);
                log_info!("dominant changed {:?} -> {}", previous, index);
                Some(DominantChange { previous, index })
            }
            Some(_) => None,
            None => {
                if dominant_left {
                    // Mid-transition: nobody owns the viewport right now.
                    log_trace!("dominant {:?} left the viewport", self.dominant);
                    self.dominant = None;
                }
                None
            }
        }
    }

    /// Records a raw scroll motion event, re-arming the quiet debounce
    /// (debounce, not throttle: every motion pushes the deadline out).
    ///
    /// When the observation mechanism is unavailable this is the primary
    /// signal, and a dominant change may be derived immediately.
    pub fn note_scroll(&mut self, offset_px: f64, now: Instant) -> Option<DominantChange> {
        self.scroll_offset = offset_px;
        self.last_motion_at = Some(now);
        self.quiet_deadline = Some(now + self.quiet_debounce);

        if self.observer_available {
            return None;
        }

        let estimated = self.estimated_index();
        if Some(estimated) != self.dominant {
            let previous = self.dominant.take();
            self.dominant = Some(estimated);
            log_info!("estimated dominant {:?} -> {}", previous, estimated);
            return Some(DominantChange {
                previous,
                index: estimated,
            });
        }
        None
    }

    /// Fires once per quiet period: after the debounce interval passes
    /// with no motion, re-derive the dominant index from the scroll
    /// position and correct any drift the observer missed during
    /// high-velocity scrolling.
    pub fn poll_quiet(&mut self, now: Instant) -> Option<DominantChange> {
        let deadline = self.quiet_deadline?;
        if now < deadline {
            return None;
        }
        self.quiet_deadline = None;

        let estimated = self.estimated_index();
        if Some(estimated) != self.dominant {
            let previous = self.dominant.take();
            self.dominant = Some(estimated);
            log_info!(
                "quiet correction {:?} -> {} (offset {:.0}px)",
                previous,
                estimated,
                self.scroll_offset
            );
            return Some(DominantChange {
                previous,
                index: estimated,
            });
        }
        None
    }

    /// Position-based estimate of the dominant index, clamped to range.
    pub fn estimated_index(&self) -> usize {
        if self.len == 0 || self.viewport_height <= 0.0 {
            return 0;
        }
        let raw = (self.scroll_offset / self.viewport_height).round();
        let max = (self.len - 1) as f64;
        raw.clamp(0.0, max) as usize
    }

    pub fn viewport_resized(&mut self, height: f64) {
        if height > 0.0 {
            self.viewport_height = height;
        }
    }

    pub fn viewport_height(&self) -> f64 {
        self.viewport_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(len: usize) -> ViewportTracker {
        ViewportTracker::new(len, 800.0, Duration::from_millis(200), true)
    }

    #[test]
    fn last_crossing_in_batch_wins() {
        let mut tracker = tracker(5);
        let change = tracker.process_batch(&[
            Crossing { index: 1, ratio: 0.8 },
            Crossing { index: 2, ratio: 0.6 },
        ]);
        assert_eq!(
            change,
            Some(DominantChange {
                previous: None,
                index: 2
            })
        );
        assert_eq!(tracker.dominant(), Some(2));
    }

    #[test]
    fn repeated_reports_for_same_index_are_suppressed() {
        let mut tracker = tracker(5);
        tracker.process_batch(&[Crossing { index: 1, ratio: 0.9 }]);
        let change = tracker.process_batch(&[Crossing { index: 1, ratio: 1.0 }]);
        assert!(change.is_none());
        assert_eq!(tracker.dominant(), Some(1));
    }

    #[test]
    fn dominant_clears_when_it_crosses_below_half() {
        let mut tracker = tracker(5);
        tracker.process_batch(&[Crossing { index: 3, ratio: 0.7 }]);
        let change = tracker.process_batch(&[Crossing { index: 3, ratio: 0.4 }]);
        assert!(change.is_none());
        assert_eq!(tracker.dominant(), None);
    }

    #[test]
    fn out_of_range_crossings_are_ignored() {
        let mut tracker = tracker(2);
        let change = tracker.process_batch(&[Crossing { index: 9, ratio: 0.9 }]);
        assert!(change.is_none());
        assert_eq!(tracker.dominant(), None);
    }

    #[test]
    fn estimator_rounds_and_clamps() {
        let mut tracker = tracker(5);
        let base = Instant::now();
        tracker.note_scroll(1650.0, base);
        assert_eq!(tracker.estimated_index(), 2);
        tracker.note_scroll(99_999.0, base);
        assert_eq!(tracker.estimated_index(), 4);
        tracker.note_scroll(-50.0, base);
        assert_eq!(tracker.estimated_index(), 0);
    }

    #[test]
    fn quiet_period_rederives_dominant_from_position() {
        let mut tracker = tracker(5);
        let base = Instant::now();

        tracker.process_batch(&[Crossing { index: 0, ratio: 1.0 }]);
        tracker.note_scroll(2400.0, base);

        // Still inside the debounce window: nothing fires, still scrolling.
        assert!(tracker.poll_quiet(base + Duration::from_millis(100)).is_none());
        assert!(tracker.is_scrolling(base + Duration::from_millis(100)));

        let change = tracker.poll_quiet(base + Duration::from_millis(250));
        assert_eq!(
            change,
            Some(DominantChange {
                previous: Some(0),
                index: 3
            })
        );
        assert!(!tracker.is_scrolling(base + Duration::from_millis(250)));

        // The quiet deadline is consumed; no duplicate event.
        assert!(tracker.poll_quiet(base + Duration::from_millis(300)).is_none());
    }

    #[test]
    fn motion_rearms_the_quiet_debounce() {
        let mut tracker = tracker(5);
        let base = Instant::now();

        tracker.note_scroll(800.0, base);
        tracker.note_scroll(1000.0, base + Duration::from_millis(150));

        // 250ms after the first motion but only 100ms after the second.
        assert!(tracker.poll_quiet(base + Duration::from_millis(250)).is_none());
        let change = tracker.poll_quiet(base + Duration::from_millis(360));
        assert!(change.is_some());
    }

    #[test]
    fn unavailable_observer_degrades_to_estimator_on_scroll() {
        let mut tracker = ViewportTracker::new(5, 800.0, Duration::from_millis(200), false);
        let base = Instant::now();

        let change = tracker.note_scroll(1600.0, base);
        assert_eq!(
            change,
            Some(DominantChange {
                previous: None,
                index: 2
            })
        );
        // Same position again: no duplicate event.
        assert!(tracker.note_scroll(1610.0, base + Duration::from_millis(16)).is_none());
    }

    #[test]
    fn manual_set_dominant_bypasses_detection() {
        let mut tracker = tracker(5);
        tracker.set_dominant(4);
        assert_eq!(tracker.dominant(), Some(4));
        tracker.set_dominant(17);
        assert_eq!(tracker.dominant(), Some(4));
    }
}
