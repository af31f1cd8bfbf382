//! Engine for a vertically-scrolling feed of embedded web games: one
//! full-screen item per section, a bounded window of live frames around
//! the current one, and timer-driven preload/evict transitions as the
//! user scrolls.
//!
//! Rendering and analytics are ports ([`host::FrameHost`],
//! [`analytics::AnalyticsSink`]); the crate owns only the state machine
//! behind them, so everything here is testable without a real surface.

pub mod analytics;
pub mod catalog;
pub mod controller;
pub mod engine;
pub mod host;
pub mod nav;
pub mod slots;
pub mod tracker;
pub mod utils;

pub use analytics::{
    AnalyticsSink, AttrValue, Attributes, LogSink, NullSink, SessionMetrics, SessionSummary,
};
pub use catalog::{Catalog, ContentItem};
pub use controller::{FeedController, FeedSnapshot};
pub use engine::{ActivationPolicy, FeedEngine, FeedTuning};
pub use host::{FrameHost, FramePolicy, LogHost};
pub use nav::NavKey;
pub use slots::{Slot, SlotState};
pub use tracker::{Crossing, DominantChange, ViewportTracker, VISIBILITY_THRESHOLDS};
