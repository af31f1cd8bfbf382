//! Event vocabulary emitted by the feed engine.

/// Canonical event names, shared by the engine and by sink implementations
/// that want to filter or fan out per event.
pub mod names {
    /// Session began; carries catalog size and viewport geometry.
    pub const SESSION_STARTED: &str = "session_started";
    /// A slot became viewport-dominant.
    pub const VIEW_ENTERED: &str = "view_entered";
    /// A slot's embedded frame was instantiated.
    pub const ACTIVATED: &str = "activated";
    /// A slot's embedded frame was torn down.
    pub const DEACTIVATED: &str = "deactivated";
    /// Frame finished loading; carries duration_ms.
    pub const LOAD_COMPLETE: &str = "load_complete";
    /// Frame failed to load; the slot shows a failure notice.
    pub const LOAD_ERROR: &str = "load_error";
    /// Dwell threshold reached while dominant and foregrounded.
    pub const PLAYED: &str = "played";
    /// Emitted for the slot being left when dominance moves on.
    pub const TIME_SPENT: &str = "time_spent";
    /// Host page moved between foreground and background.
    pub const FOREGROUND_CHANGED: &str = "foreground_changed";
    /// Session ended; carries the aggregate counts.
    pub const SESSION_COMPLETE: &str = "session_complete";
}

/// Trigger labels attached to activation/deactivation events so the
/// analytics side can tell why a transition happened.
pub mod triggers {
    pub const LANDING: &str = "landing";
    pub const OBSERVED: &str = "observed";
    pub const ESTIMATED: &str = "estimated";
    pub const MANUAL: &str = "manual";
    pub const CASCADE: &str = "cascade";
    pub const TAP: &str = "tap";
    pub const WINDOW_EVICT: &str = "window_evict";
}
