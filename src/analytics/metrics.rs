use std::collections::HashSet;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Per-session aggregates, kept in memory and flushed to the analytics
/// sink when the session ends.
#[derive(Debug, Clone)]
pub struct SessionMetrics {
    session_id: String,
    started_at: DateTime<Utc>,
    started_instant: Instant,
    viewed: HashSet<usize>,
    played: HashSet<usize>,
    reached_last: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub viewed_count: usize,
    pub played_count: usize,
    pub session_seconds: u64,
    pub reached_last: bool,
}

impl SessionMetrics {
    pub fn new(now: Instant) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            started_instant: now,
            viewed: HashSet::new(),
            played: HashSet::new(),
            reached_last: false,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn note_viewed(&mut self, index: usize, last_index: usize) {
        self.viewed.insert(index);
        if index == last_index {
            self.reached_last = true;
        }
    }

    pub fn note_played(&mut self, index: usize) {
        self.played.insert(index);
    }

    pub fn viewed_count(&self) -> usize {
        self.viewed.len()
    }

    pub fn played_count(&self) -> usize {
        self.played.len()
    }

    pub fn summary(&self, now: Instant) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id.clone(),
            started_at: self.started_at,
            viewed_count: self.viewed.len(),
            played_count: self.played.len(),
            session_seconds: now.duration_since(self.started_instant).as_secs(),
            reached_last: self.reached_last,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn counts_are_distinct_per_index() {
        let base = Instant::now();
        let mut metrics = SessionMetrics::new(base);

        metrics.note_viewed(0, 4);
        metrics.note_viewed(1, 4);
        metrics.note_viewed(0, 4);
        metrics.note_played(1);
        metrics.note_played(1);

        let summary = metrics.summary(base + Duration::from_secs(90));
        assert_eq!(summary.viewed_count, 2);
        assert_eq!(summary.played_count, 1);
        assert_eq!(summary.session_seconds, 90);
        assert!(!summary.reached_last);
    }

    #[test]
    fn reaching_the_last_index_is_sticky() {
        let base = Instant::now();
        let mut metrics = SessionMetrics::new(base);

        metrics.note_viewed(4, 4);
        metrics.note_viewed(2, 4);

        assert!(metrics.summary(base).reached_last);
    }
}
