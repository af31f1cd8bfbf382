use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{bail, Result};
use log::info;
use serde::Serialize;
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    analytics::{AnalyticsSink, SessionSummary},
    catalog::Catalog,
    engine::{FeedEngine, FeedTuning},
    host::FrameHost,
    nav::NavKey,
    tracker::Crossing,
};

/// How often the driver executes due deferred tasks. Well under the
/// shortest engine delay (200ms quiet debounce) so nothing fires late
/// enough to notice.
const DRIVE_INTERVAL: Duration = Duration::from_millis(50);

/// Current instant from the runtime clock (pausable under test harnesses),
/// so due-task arithmetic stays consistent with the driver interval.
fn now() -> Instant {
    time::Instant::now().into_std()
}

/// Point-in-time view of the feed for UIs and diagnostics.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    pub session_id: String,
    pub dominant: Option<usize>,
    pub live_indices: Vec<usize>,
    pub pending_tasks: usize,
}

/// Cloneable handle around the engine: owns the driver ticker and exposes
/// every inbound edge (observations, scroll motion, load reports,
/// keyboard, visibility) as a cheap async call.
///
/// All engine work happens under one lock on the caller's task or the
/// ticker, so state transitions interleave but never race.
#[derive(Clone)]
pub struct FeedController {
    engine: Arc<Mutex<Option<FeedEngine>>>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    cancel: Arc<Mutex<Option<CancellationToken>>>,
    catalog: Arc<Catalog>,
    host: Arc<dyn FrameHost>,
    sink: Arc<dyn AnalyticsSink>,
    tuning: FeedTuning,
}

impl FeedController {
    pub fn new(
        catalog: Arc<Catalog>,
        host: Arc<dyn FrameHost>,
        sink: Arc<dyn AnalyticsSink>,
        tuning: FeedTuning,
    ) -> Self {
        Self {
            engine: Arc::new(Mutex::new(None)),
            ticker: Arc::new(Mutex::new(None)),
            cancel: Arc::new(Mutex::new(None)),
            catalog,
            host,
            sink,
            tuning,
        }
    }

    /// Opens a session: allocates the slots, lands on the first item, and
    /// spawns the driver ticker.
    pub async fn start(&self, viewport_height: f64, observer_available: bool) -> Result<()> {
        {
            let mut guard = self.engine.lock().await;
            if guard.is_some() {
                bail!("feed session already active");
            }

            let now = now();
            let mut engine = FeedEngine::new(
                self.catalog.clone(),
                self.host.clone(),
                self.sink.clone(),
                self.tuning.clone(),
                viewport_height,
                observer_available,
                now,
            );
            engine.begin(now);
            *guard = Some(engine);
        }

        self.spawn_ticker().await;
        Ok(())
    }

    /// Ends the session, stops the driver, and flushes the aggregates.
    pub async fn end_session(&self) -> Result<SessionSummary> {
        let summary = {
            let mut guard = self.engine.lock().await;
            let Some(mut engine) = guard.take() else {
                bail!("no active feed session");
            };
            engine.finish(now())
        };

        self.cancel_ticker().await;
        info!(
            "session {} complete: {} viewed, {} played",
            summary.session_id, summary.viewed_count, summary.played_count
        );
        Ok(summary)
    }

    pub async fn snapshot(&self) -> Option<FeedSnapshot> {
        let guard = self.engine.lock().await;
        guard.as_ref().map(|engine| FeedSnapshot {
            session_id: engine.session_id().to_string(),
            dominant: engine.dominant(),
            live_indices: engine.live_indices(),
            pending_tasks: engine.pending_task_count(),
        })
    }

    /// Visibility-ratio crossings from the observation mechanism.
    pub async fn observe(&self, crossings: &[Crossing]) {
        if let Some(engine) = self.engine.lock().await.as_mut() {
            engine.handle_observation(crossings, now());
        }
    }

    /// Raw scroll offset in pixels.
    pub async fn note_scroll(&self, offset_px: f64) {
        if let Some(engine) = self.engine.lock().await.as_mut() {
            engine.handle_scroll(offset_px, now());
        }
    }

    /// The host finished loading the frame mounted at `index`.
    pub async fn frame_loaded(&self, index: usize) {
        if let Some(engine) = self.engine.lock().await.as_mut() {
            engine.on_load_result(index, Ok(()), now());
        }
    }

    /// The host failed to load the frame mounted at `index`.
    pub async fn frame_failed(&self, index: usize, reason: &str) {
        if let Some(engine) = self.engine.lock().await.as_mut() {
            engine.on_load_result(index, Err(reason), now());
        }
    }

    pub async fn key_down(&self, key: NavKey) {
        if let Some(engine) = self.engine.lock().await.as_mut() {
            let now = now();
            match key {
                NavKey::ArrowDown => engine.go_next(now),
                NavKey::ArrowUp => engine.go_previous(now),
            }
        }
    }

    pub async fn go_to_index(&self, target: usize, smooth: bool) {
        if let Some(engine) = self.engine.lock().await.as_mut() {
            engine.navigate_to(target, smooth, now());
        }
    }

    pub async fn tap_activate(&self, index: usize) {
        if let Some(engine) = self.engine.lock().await.as_mut() {
            engine.tap_activate(index, now());
        }
    }

    pub async fn set_foreground(&self, foreground: bool) {
        if let Some(engine) = self.engine.lock().await.as_mut() {
            engine.set_foreground(foreground, now());
        }
    }

    pub async fn viewport_resized(&self, height: f64) {
        if let Some(engine) = self.engine.lock().await.as_mut() {
            engine.viewport_resized(height);
        }
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();
        let engine = self.engine.clone();

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(DRIVE_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let mut guard = engine.lock().await;
                        let Some(engine) = guard.as_mut() else {
                            break;
                        };
                        engine.run_pending(now());
                    }
                    _ = token.cancelled() => {
                        break;
                    }
                }
            }
        });

        *ticker_guard = Some(handle);
        *self.cancel.lock().await = Some(cancel_token);
    }

    async fn cancel_ticker(&self) {
        if let Some(token) = self.cancel.lock().await.take() {
            token.cancel();
        }
        if let Some(handle) = self.ticker.lock().await.take() {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::NullSink;
    use crate::catalog::ContentItem;
    use crate::host::{FramePolicy, LogHost};
    use crate::slots::SlotState;

    struct SilentHost;

    impl FrameHost for SilentHost {
        fn render_facade(&self, _index: usize, _item: &ContentItem) {}
        fn mount_frame(&self, _index: usize, _item: &ContentItem, _policy: &FramePolicy) {}
        fn unmount_frame(&self, _index: usize, _item: &ContentItem) {}
        fn render_error(&self, _index: usize, _item: &ContentItem) {}
        fn set_overlay(&self, _index: usize, _item: &ContentItem) {}
        fn scroll_to(&self, _offset_px: f64, _smooth: bool) {}
    }

    fn catalog(n: usize) -> Arc<Catalog> {
        let items = (0..n)
            .map(|i| ContentItem {
                title: format!("item-{i}"),
                url: format!("https://item-{i}.example.app"),
                description: format!("description {i}"),
            })
            .collect();
        Catalog::new(items).unwrap().into_shared()
    }

    fn controller(n: usize) -> FeedController {
        FeedController::new(
            catalog(n),
            Arc::new(SilentHost),
            Arc::new(NullSink),
            FeedTuning::default(),
        )
    }

    async fn slot_state(controller: &FeedController, index: usize) -> Option<SlotState> {
        let guard = controller.engine.lock().await;
        guard.as_ref().and_then(|engine| engine.slot_state(index))
    }

    #[tokio::test(start_paused = true)]
    async fn driver_executes_cascade_preloads() {
        let controller = controller(5);
        controller.start(800.0, true).await.unwrap();

        assert_eq!(slot_state(&controller, 0).await, Some(SlotState::Loading));
        assert_eq!(
            slot_state(&controller, 1).await,
            Some(SlotState::Placeholder)
        );

        time::sleep(Duration::from_millis(700)).await;
        assert_eq!(slot_state(&controller, 1).await, Some(SlotState::Loading));

        controller.end_session().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn double_start_is_rejected() {
        let controller = controller(3);
        controller.start(800.0, true).await.unwrap();
        assert!(controller.start(800.0, true).await.is_err());
        controller.end_session().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn end_session_reports_summary_once() {
        let controller = controller(3);
        controller.start(800.0, true).await.unwrap();

        controller.frame_loaded(0).await;
        let summary = controller.end_session().await.unwrap();
        assert_eq!(summary.viewed_count, 1);
        assert!(controller.end_session().await.is_err());
        assert!(controller.snapshot().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn arrow_keys_wrap_around_the_catalog() {
        let controller = controller(5);
        controller.start(800.0, true).await.unwrap();

        controller.go_to_index(4, false).await;
        controller.key_down(NavKey::ArrowDown).await;
        let snapshot = controller.snapshot().await.unwrap();
        assert_eq!(snapshot.dominant, Some(0));

        controller.key_down(NavKey::ArrowUp).await;
        let snapshot = controller.snapshot().await.unwrap();
        assert_eq!(snapshot.dominant, Some(4));

        controller.end_session().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn far_slots_are_evicted_after_the_grace_period() {
        let controller = controller(8);
        controller.start(800.0, true).await.unwrap();
        controller.frame_loaded(0).await;

        controller
            .observe(&[Crossing {
                index: 7,
                ratio: 0.9,
            }])
            .await;
        time::sleep(Duration::from_millis(2500)).await;

        assert_eq!(
            slot_state(&controller, 0).await,
            Some(SlotState::Placeholder)
        );
        let snapshot = controller.snapshot().await.unwrap();
        assert_eq!(snapshot.dominant, Some(7));

        controller.end_session().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn controller_accepts_a_logging_host() {
        let controller = FeedController::new(
            catalog(2),
            Arc::new(LogHost),
            Arc::new(NullSink),
            FeedTuning::default(),
        );
        controller.start(800.0, true).await.unwrap();
        controller.end_session().await.unwrap();
    }
}
