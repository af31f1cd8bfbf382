use std::sync::Arc;
use std::time::Instant;

use log::{info, warn};

use crate::analytics::{names, AnalyticsSink, AttrValue};
use crate::catalog::Catalog;
use crate::host::{FrameHost, FramePolicy};

use super::{Slot, SlotState};

/// One slot per catalog item, plus the side effects of moving a slot
/// through its lifecycle: facade/frame rendering through the host port and
/// activation analytics through the sink.
///
/// Every operation addressed by index is a silent no-op when the index is
/// out of range; indices arrive from scroll arithmetic and are not trusted.
pub struct SlotRegistry {
    slots: Vec<Slot>,
    catalog: Arc<Catalog>,
    host: Arc<dyn FrameHost>,
    sink: Arc<dyn AnalyticsSink>,
    policy: FramePolicy,
}

impl SlotRegistry {
    /// Allocates a Placeholder slot per item, in catalog order, and renders
    /// each facade. No network activity happens here.
    pub fn create_all(
        catalog: Arc<Catalog>,
        host: Arc<dyn FrameHost>,
        sink: Arc<dyn AnalyticsSink>,
        policy: FramePolicy,
    ) -> Self {
        let slots: Vec<Slot> = (0..catalog.len()).map(Slot::new).collect();
        for slot in &slots {
            if let Some(item) = catalog.get(slot.index) {
                host.render_facade(slot.index, item);
            }
        }

        Self {
            slots,
            catalog,
            host,
            sink,
            policy,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn slot_mut(&mut self, index: usize) -> Option<&mut Slot> {
        self.slots.get_mut(index)
    }

    pub fn state(&self, index: usize) -> Option<SlotState> {
        self.slots.get(index).map(|slot| slot.state)
    }

    /// Count of slots currently holding a mounted frame.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_live()).count()
    }

    pub fn live_indices(&self) -> Vec<usize> {
        self.slots
            .iter()
            .filter(|slot| slot.is_live())
            .map(|slot| slot.index)
            .collect()
    }

    /// Mounts the embedded frame for `index`. No-op when the index is out
    /// of range or the slot already holds a frame; a failed slot may be
    /// retried through this same path.
    ///
    /// Returns true when a mount actually happened.
    pub fn promote(&mut self, index: usize, trigger: &'static str, now: Instant) -> bool {
        let Some(item) = self.catalog.get(index) else {
            return false;
        };
        let Some(slot) = self.slots.get_mut(index) else {
            return false;
        };
        if slot.is_live() {
            return false;
        }

        slot.begin_load(now);
        self.host.mount_frame(index, item, &self.policy);
        info!("activated {} ({}) trigger={}", index, item.title, trigger);
        self.sink.record(
            names::ACTIVATED,
            &vec![
                ("title", AttrValue::from(item.title.as_str())),
                ("index", AttrValue::from(index)),
                ("trigger", AttrValue::from(trigger)),
            ],
        );
        true
    }

    /// Records the async load outcome for a mounted frame. Only meaningful
    /// while the slot is `Loading`; any other state means the report is
    /// stale (the frame was torn down or replaced in the meantime).
    pub fn complete_load(&mut self, index: usize, outcome: Result<(), &str>, now: Instant) {
        let Some(item) = self.catalog.get(index) else {
            return;
        };
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        if slot.state != SlotState::Loading {
            return;
        }

        match outcome {
            Ok(()) => {
                let duration = slot.finish_load(now);
                info!(
                    "load complete {} ({}) in {}ms",
                    index,
                    item.title,
                    duration.as_millis()
                );
                self.sink.record(
                    names::LOAD_COMPLETE,
                    &vec![
                        ("title", AttrValue::from(item.title.as_str())),
                        ("index", AttrValue::from(index)),
                        ("duration_ms", AttrValue::from(duration.as_millis() as u64)),
                    ],
                );
            }
            Err(reason) => {
                let duration = slot.fail_load(now);
                warn!(
                    "load error {} ({}) after {}ms: {}",
                    index,
                    item.title,
                    duration.as_millis(),
                    reason
                );
                self.host.render_error(index, item);
                self.sink.record(
                    names::LOAD_ERROR,
                    &vec![
                        ("title", AttrValue::from(item.title.as_str())),
                        ("index", AttrValue::from(index)),
                        ("duration_ms", AttrValue::from(duration.as_millis() as u64)),
                        ("reason", AttrValue::from(reason)),
                    ],
                );
            }
        }
    }

    /// Tears down the frame (or failure notice) and restores the facade,
    /// re-arming the tap affordance. Idempotent: demoting a Placeholder
    /// slot does nothing and emits nothing.
    ///
    /// Callers are responsible for never demoting the dominant slot.
    pub fn demote(&mut self, index: usize, trigger: &'static str) -> bool {
        let Some(item) = self.catalog.get(index) else {
            return false;
        };
        let Some(slot) = self.slots.get_mut(index) else {
            return false;
        };
        if slot.state == SlotState::Placeholder {
            return false;
        }

        let was_live = slot.is_live();
        slot.reset();

        if was_live {
            self.host.unmount_frame(index, item);
        }
        self.host.render_facade(index, item);
        info!("deactivated {} ({}) trigger={}", index, item.title, trigger);
        self.sink.record(
            names::DEACTIVATED,
            &vec![
                ("title", AttrValue::from(item.title.as_str())),
                ("index", AttrValue::from(index)),
                ("trigger", AttrValue::from(trigger)),
            ],
        );
        true
    }
}
