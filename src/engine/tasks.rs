use std::time::Instant;

/// Kinds of deferred work the engine schedules against a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Speculative preload of the slot ahead of the dominant one.
    CascadeForward,
    /// Speculative preload of the slot behind the dominant one.
    CascadeBackward,
    /// Grace-delayed teardown of an out-of-window slot.
    Demote,
    /// Dwell-threshold check for the played signal.
    Engagement,
}

/// A cancellable intent, keyed by `(kind, index)` and revalidated when it
/// fires: scheduling records what looked right at the time, execution
/// decides whether it still is.
#[derive(Debug, Clone)]
pub struct DeferredTask {
    pub kind: TaskKind,
    pub index: usize,
    pub due_at: Instant,
    /// Slot activation counter at schedule time; lets the engagement check
    /// recognize that the slot was torn down and remounted in between.
    pub activation: u64,
}

/// Flat queue of deferred tasks. Sized by the activation window (a handful
/// of entries), so linear scans beat any cleverer structure.
#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: Vec<DeferredTask>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Schedules `kind` for `index`, superseding any earlier entry with the
    /// same key.
    pub fn schedule(&mut self, kind: TaskKind, index: usize, due_at: Instant, activation: u64) {
        self.tasks
            .retain(|task| !(task.kind == kind && task.index == index));
        self.tasks.push(DeferredTask {
            kind,
            index,
            due_at,
            activation,
        });
    }

    pub fn cancel(&mut self, kind: TaskKind, index: usize) {
        self.tasks
            .retain(|task| !(task.kind == kind && task.index == index));
    }

    /// Drops every pending intent for a slot. Used on demotion, which
    /// invalidates anything scheduled against the old activation.
    pub fn cancel_slot(&mut self, index: usize) {
        self.tasks.retain(|task| task.index != index);
    }

    pub fn has(&self, kind: TaskKind, index: usize) -> bool {
        self.tasks
            .iter()
            .any(|task| task.kind == kind && task.index == index)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Removes and returns every task due at `now`, in due order.
    pub fn take_due(&mut self, now: Instant) -> Vec<DeferredTask> {
        let mut due: Vec<DeferredTask> = Vec::new();
        self.tasks.retain(|task| {
            if task.due_at <= now {
                due.push(task.clone());
                false
            } else {
                true
            }
        });
        due.sort_by_key(|task| task.due_at);
        due
    }
}
