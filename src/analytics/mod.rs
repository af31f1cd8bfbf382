mod events;
mod metrics;

pub use events::{names, triggers};
pub use metrics::{SessionMetrics, SessionSummary};

use std::fmt;

use log::info;

/// Primitive attribute value accepted by analytics sinks.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(value) => write!(f, "{value}"),
            AttrValue::Int(value) => write!(f, "{value}"),
            AttrValue::Float(value) => write!(f, "{value}"),
            AttrValue::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<usize> for AttrValue {
    fn from(value: usize) -> Self {
        AttrValue::Int(value as i64)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<u64> for AttrValue {
    fn from(value: u64) -> Self {
        AttrValue::Int(value as i64)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

/// Attribute mapping attached to a single event.
pub type Attributes = Vec<(&'static str, AttrValue)>;

/// Destination for engagement and lifecycle events.
///
/// Transport, batching, and retries are the sink's problem; the engine
/// treats every `record` call as infallible fire-and-forget.
pub trait AnalyticsSink: Send + Sync {
    fn record(&self, event: &str, attributes: &Attributes);
}

/// Sink that writes every event to the log.
#[derive(Debug, Default, Clone)]
pub struct LogSink;

impl AnalyticsSink for LogSink {
    fn record(&self, event: &str, attributes: &Attributes) {
        let rendered: Vec<String> = attributes
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        info!("[analytics] {} {}", event, rendered.join(" "));
    }
}

/// Sink that drops everything. Useful when a caller has no backend.
#[derive(Debug, Default, Clone)]
pub struct NullSink;

impl AnalyticsSink for NullSink {
    fn record(&self, _event: &str, _attributes: &Attributes) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attr_values_convert_from_primitives() {
        assert_eq!(AttrValue::from("snake"), AttrValue::Str("snake".into()));
        assert_eq!(AttrValue::from(3usize), AttrValue::Int(3));
        assert_eq!(AttrValue::from(true), AttrValue::Bool(true));
        assert_eq!(AttrValue::from(1.5), AttrValue::Float(1.5));
    }

    #[test]
    fn attr_values_render_for_transport() {
        assert_eq!(AttrValue::from("a").to_string(), "a");
        assert_eq!(AttrValue::from(7u64).to_string(), "7");
        assert_eq!(AttrValue::from(false).to_string(), "false");
    }
}
