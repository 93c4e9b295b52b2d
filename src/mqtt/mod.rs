//! MQTT topic handling module
//!
//! Provides wildcard topic matching and per-identity pattern substitution.

mod topic;

pub use topic::{substitute, TopicMatcher};
