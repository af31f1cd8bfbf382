mod tasks;
mod tuning;

pub use tasks::{DeferredTask, TaskKind, TaskQueue};
pub use tuning::{ActivationPolicy, FeedTuning};

use std::sync::Arc;
use std::time::Instant;

use crate::analytics::{names, triggers, AnalyticsSink, AttrValue, SessionMetrics, SessionSummary};
use crate::catalog::Catalog;
use crate::host::{FrameHost, FramePolicy};
use crate::nav;
use crate::slots::{SlotRegistry, SlotState};
use crate::tracker::{Crossing, DominantChange, ViewportTracker};

// Set to false to silence per-transition logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_trace};

/// The activation/eviction state machine.
///
/// Owns all mutable feed state (slots, viewport tracking, deferred
/// intents, session aggregates) and is driven entirely by explicit
/// inbound edges plus `run_pending` ticks. All waiting is expressed as
/// due-timestamped tasks; a task that fires revalidates the world before
/// acting, because anything may have changed since it was scheduled.
pub struct FeedEngine {
    catalog: Arc<Catalog>,
    registry: SlotRegistry,
    tracker: ViewportTracker,
    queue: TaskQueue,
    metrics: SessionMetrics,
    tuning: FeedTuning,
    host: Arc<dyn FrameHost>,
    sink: Arc<dyn AnalyticsSink>,
    foreground: bool,
    /// Anchor for window math: the last index that held dominance. Unlike
    /// the tracker's dominant slot this never goes back to `None`, so the
    /// window stays put while the viewport is mid-transition.
    window_center: usize,
    /// Slot whose view time is currently accruing.
    current_view: Option<usize>,
}

impl FeedEngine {
    pub fn new(
        catalog: Arc<Catalog>,
        host: Arc<dyn FrameHost>,
        sink: Arc<dyn AnalyticsSink>,
        tuning: FeedTuning,
        viewport_height: f64,
        observer_available: bool,
        now: Instant,
    ) -> Self {
        let registry = SlotRegistry::create_all(
            catalog.clone(),
            host.clone(),
            sink.clone(),
            FramePolicy::default(),
        );
        let tracker = ViewportTracker::new(
            catalog.len(),
            viewport_height,
            tuning.quiet_debounce(),
            observer_available,
        );

        Self {
            catalog,
            registry,
            tracker,
            queue: TaskQueue::new(),
            metrics: SessionMetrics::new(now),
            tuning,
            host,
            sink,
            foreground: true,
            window_center: 0,
            current_view: None,
        }
    }

    pub fn dominant(&self) -> Option<usize> {
        self.tracker.dominant()
    }

    pub fn slot_state(&self, index: usize) -> Option<SlotState> {
        self.registry.state(index)
    }

    pub fn live_count(&self) -> usize {
        self.registry.live_count()
    }

    pub fn live_indices(&self) -> Vec<usize> {
        self.registry.live_indices()
    }

    pub fn pending_task_count(&self) -> usize {
        self.queue.len()
    }

    pub fn session_id(&self) -> &str {
        self.metrics.session_id()
    }

    pub fn tuning(&self) -> &FeedTuning {
        &self.tuning
    }

    /// Opens the session: announces it to the sink and lands the viewport
    /// on the first item, which kicks off the usual promote+cascade path.
    pub fn begin(&mut self, now: Instant) {
        self.sink.record(
            names::SESSION_STARTED,
            &vec![
                ("session_id", self.metrics.session_id().into()),
                ("total_items", self.registry.len().into()),
                ("viewport_height", self.tracker.viewport_height().into()),
            ],
        );
        self.tracker.set_dominant(0);
        self.apply_dominant_change(
            DominantChange {
                previous: None,
                index: 0,
            },
            triggers::LANDING,
            now,
        );
    }

    /// Closes the session and flushes the aggregates.
    pub fn finish(&mut self, now: Instant) -> SessionSummary {
        if let Some(prev) = self.current_view.take() {
            self.note_view_left(prev, now);
        }
        let summary = self.metrics.summary(now);
        self.sink.record(
            names::SESSION_COMPLETE,
            &vec![
                ("session_id", summary.session_id.as_str().into()),
                ("viewed_count", summary.viewed_count.into()),
                ("played_count", summary.played_count.into()),
                ("session_seconds", summary.session_seconds.into()),
                ("reached_last", summary.reached_last.into()),
            ],
        );
        summary
    }

    /// Primary viewport signal: a batch of visibility-ratio crossings.
    pub fn handle_observation(&mut self, crossings: &[Crossing], now: Instant) {
        if let Some(change) = self.tracker.process_batch(crossings) {
            self.apply_dominant_change(change, triggers::OBSERVED, now);
        }
    }

    /// Raw scroll motion. Re-arms the quiet debounce; when the observer is
    /// unavailable this is also where dominance gets derived.
    pub fn handle_scroll(&mut self, offset_px: f64, now: Instant) {
        if let Some(change) = self.tracker.note_scroll(offset_px, now) {
            self.apply_dominant_change(change, triggers::ESTIMATED, now);
        }
    }

    /// Async load outcome reported by the host for a mounted frame.
    pub fn on_load_result(&mut self, index: usize, outcome: Result<(), &str>, now: Instant) {
        let succeeded = outcome.is_ok();
        self.registry.complete_load(index, outcome, now);
        if succeeded {
            self.arm_engagement(index, now);
            self.enforce_window(now);
        }
    }

    /// Explicit jump, bypassing dwell-based detection. Out-of-range
    /// targets are silent no-ops.
    pub fn navigate_to(&mut self, target: usize, smooth: bool, now: Instant) {
        if target >= self.registry.len() {
            return;
        }
        self.host.scroll_to(
            nav::scroll_offset_for(target, self.tracker.viewport_height()),
            smooth,
        );
        let previous = self.tracker.dominant();
        self.tracker.set_dominant(target);
        if previous != Some(target) {
            self.apply_dominant_change(
                DominantChange {
                    previous,
                    index: target,
                },
                triggers::MANUAL,
                now,
            );
        }
    }

    /// Directional navigation wraps at the catalog boundaries.
    pub fn go_next(&mut self, now: Instant) {
        let current = self.tracker.dominant().unwrap_or(self.window_center);
        let target = nav::next_index(current, self.registry.len());
        self.navigate_to(target, true, now);
    }

    pub fn go_previous(&mut self, now: Instant) {
        let current = self.tracker.dominant().unwrap_or(self.window_center);
        let target = nav::previous_index(current, self.registry.len());
        self.navigate_to(target, true, now);
    }

    /// Explicit facade tap. The only way a dominant slot activates under
    /// `ActivationPolicy::Tap`; harmless (idempotent) under `Auto`.
    pub fn tap_activate(&mut self, index: usize, now: Instant) {
        self.registry.promote(index, triggers::TAP, now);
    }

    /// Host page moved between foreground and background. Engagement
    /// timers only run foregrounded; regaining focus restarts the dwell.
    pub fn set_foreground(&mut self, foreground: bool, now: Instant) {
        if self.foreground == foreground {
            return;
        }
        self.foreground = foreground;
        let index = self
            .tracker
            .dominant()
            .map(|i| i as i64)
            .unwrap_or(-1);
        self.sink.record(
            names::FOREGROUND_CHANGED,
            &vec![
                ("foreground", foreground.into()),
                ("index", AttrValue::Int(index)),
            ],
        );
        if foreground {
            if let Some(index) = self.tracker.dominant() {
                self.arm_engagement(index, now);
            }
        }
    }

    /// Viewport geometry changed (resize/orientation); re-snap to the
    /// current section so the estimator arithmetic stays aligned.
    pub fn viewport_resized(&mut self, height: f64) {
        self.tracker.viewport_resized(height);
        let offset = nav::scroll_offset_for(self.window_center, self.tracker.viewport_height());
        self.host.scroll_to(offset, false);
    }

    /// Driver tick: applies any quiet-period correction, then executes
    /// every deferred task that has come due.
    pub fn run_pending(&mut self, now: Instant) {
        if let Some(change) = self.tracker.poll_quiet(now) {
            self.apply_dominant_change(change, triggers::ESTIMATED, now);
        }
        for task in self.queue.take_due(now) {
            self.execute(task, now);
        }
    }

    fn apply_dominant_change(&mut self, change: DominantChange, trigger: &'static str, now: Instant) {
        let index = change.index;
        if index >= self.registry.len() || self.current_view == Some(index) {
            return;
        }

        if let Some(prev) = self.current_view.take() {
            self.note_view_left(prev, now);
        }

        self.current_view = Some(index);
        self.window_center = index;
        if let Some(slot) = self.registry.slot_mut(index) {
            slot.view_entered_at = Some(now);
        }
        self.metrics.note_viewed(index, self.catalog.last_index());

        if let Some(item) = self.catalog.get(index) {
            self.host.set_overlay(index, item);
            self.sink.record(
                names::VIEW_ENTERED,
                &vec![
                    ("title", item.title.as_str().into()),
                    ("index", index.into()),
                    ("trigger", trigger.into()),
                ],
            );
        }

        let promote_dominant = match self.tuning.activation {
            ActivationPolicy::Auto => true,
            ActivationPolicy::Tap => trigger == triggers::MANUAL || trigger == triggers::TAP,
        };
        if promote_dominant {
            self.registry.promote(index, trigger, now);
        }

        // Cascade preloads favor forward momentum; out-of-range neighbors
        // are skipped here, out-of-window ones at fire time.
        if index + 1 < self.registry.len() {
            self.queue.schedule(
                TaskKind::CascadeForward,
                index + 1,
                now + self.tuning.forward_cascade(),
                0,
            );
        }
        if let Some(prev_index) = index.checked_sub(1) {
            self.queue.schedule(
                TaskKind::CascadeBackward,
                prev_index,
                now + self.tuning.backward_cascade(),
                0,
            );
        }

        self.enforce_window(now);
        self.arm_engagement(index, now);
    }

    /// Schedules grace-delayed demotion for every live slot outside the
    /// window, and withdraws demotion from slots that scrolled back in.
    fn enforce_window(&mut self, now: Instant) {
        let center = self.window_center;
        let radius = self.tuning.window_radius;

        for index in self.registry.live_indices() {
            if index.abs_diff(center) > radius {
                if !self.queue.has(TaskKind::Demote, index) {
                    let activation = self
                        .registry
                        .slot(index)
                        .map(|slot| slot.activation)
                        .unwrap_or(0);
                    log_trace!("scheduling demotion of {} (center {})", index, center);
                    self.queue.schedule(
                        TaskKind::Demote,
                        index,
                        now + self.tuning.demote_grace(),
                        activation,
                    );
                }
            } else {
                self.queue.cancel(TaskKind::Demote, index);
            }
        }
    }

    fn execute(&mut self, task: DeferredTask, now: Instant) {
        match task.kind {
            TaskKind::CascadeForward | TaskKind::CascadeBackward => {
                if task.index.abs_diff(self.window_center) <= self.tuning.window_radius {
                    self.registry.promote(task.index, triggers::CASCADE, now);
                } else {
                    log_trace!("cascade for {} skipped, outside window", task.index);
                }
            }
            TaskKind::Demote => self.execute_demote(task, now),
            TaskKind::Engagement => self.execute_engagement(task),
        }
    }

    fn execute_demote(&mut self, task: DeferredTask, now: Instant) {
        let index = task.index;
        // The dominant slot is never demoted, no matter how stale the
        // schedule entry that points at it.
        if self.tracker.dominant() == Some(index) || index == self.window_center {
            return;
        }
        if index.abs_diff(self.window_center) <= self.tuning.window_radius {
            return;
        }
        let live = self
            .registry
            .slot(index)
            .map(|slot| slot.is_live())
            .unwrap_or(false);
        if !live {
            return;
        }
        if self.tracker.is_scrolling(now) {
            // Mid-scroll: reschedule instead of tearing down under the
            // user's finger.
            log_trace!("demotion of {} deferred, still scrolling", index);
            self.queue.schedule(
                TaskKind::Demote,
                index,
                now + self.tuning.demote_grace(),
                task.activation,
            );
            return;
        }

        self.queue.cancel(TaskKind::Engagement, index);
        self.registry.demote(index, triggers::WINDOW_EVICT);
    }

    fn execute_engagement(&mut self, task: DeferredTask) {
        let index = task.index;
        if self.tracker.dominant() != Some(index) || !self.foreground {
            return;
        }
        {
            let Some(slot) = self.registry.slot(index) else {
                return;
            };
            if slot.state != SlotState::Ready
                || slot.activation != task.activation
                || slot.played
            {
                return;
            }
        }

        let dwell_seconds = self.tuning.dwell_threshold().as_secs();
        if let Some(item) = self.catalog.get(index) {
            log_info!("played {} ({}) after {}s dwell", index, item.title, dwell_seconds);
            self.sink.record(
                names::PLAYED,
                &vec![
                    ("title", item.title.as_str().into()),
                    ("index", index.into()),
                    ("dwell_seconds", dwell_seconds.into()),
                ],
            );
        }
        if let Some(slot) = self.registry.slot_mut(index) {
            slot.played = true;
        }
        self.metrics.note_played(index);
    }

    /// Starts (or restarts) the dwell timer for a slot that is Ready,
    /// dominant, foregrounded, and not yet played this activation.
    fn arm_engagement(&mut self, index: usize, now: Instant) {
        if !self.foreground || self.tracker.dominant() != Some(index) {
            return;
        }
        let Some(slot) = self.registry.slot(index) else {
            return;
        };
        if slot.state != SlotState::Ready || slot.played {
            return;
        }
        self.queue.schedule(
            TaskKind::Engagement,
            index,
            now + self.tuning.dwell_threshold(),
            slot.activation,
        );
    }

    fn note_view_left(&mut self, index: usize, now: Instant) {
        self.queue.cancel(TaskKind::Engagement, index);
        let dwell = self
            .registry
            .slot_mut(index)
            .and_then(|slot| slot.view_entered_at.take())
            .map(|entered| now.duration_since(entered));
        if let (Some(dwell), Some(item)) = (dwell, self.catalog.get(index)) {
            self.sink.record(
                names::TIME_SPENT,
                &vec![
                    ("title", item.title.as_str().into()),
                    ("index", index.into()),
                    ("duration_ms", (dwell.as_millis() as u64).into()),
                    ("duration_seconds", dwell.as_secs().into()),
                ],
            );
        }
    }
}
