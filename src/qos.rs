//! QoS shape normalization
//!
//! Protocol version 5 brokers hand subscribe QoS as a structured value whose
//! first element is the effective level; earlier versions hand a plain
//! number. The shape is normalized here, at the hook boundary, so the
//! matching logic never branches on protocol version.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// QoS as received from the broker hook, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QosSpec {
    /// Plain QoS level (protocol versions 3 and 4).
    Level(u8),
    /// Structured form (protocol version 5): `[qos, opts...]`.
    Structured(Vec<Value>),
}

impl QosSpec {
    /// Canonical QoS level.
    ///
    /// A structured value with a missing or non-numeric first element
    /// normalizes to 0 with a warning; QoS does not influence the match
    /// decision, so this cannot flip an authorization result.
    pub fn effective(&self) -> u8 {
        match self {
            QosSpec::Level(level) => *level,
            QosSpec::Structured(parts) => match parts.first().and_then(Value::as_u64) {
                Some(level) if level <= 2 => level as u8,
                _ => {
                    warn!(shape = ?parts, "Unrecognized QoS shape, normalizing to 0");
                    0
                }
            },
        }
    }
}

impl From<u8> for QosSpec {
    fn from(level: u8) -> Self {
        QosSpec::Level(level)
    }
}

/// One `(topic filter, qos)` pair from a subscribe request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub topic_filter: String,
    pub qos: QosSpec,
}

impl Subscription {
    pub fn new(topic_filter: impl Into<String>, qos: impl Into<QosSpec>) -> Self {
        Self {
            topic_filter: topic_filter.into(),
            qos: qos.into(),
        }
    }
}
