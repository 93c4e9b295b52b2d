//! Configuration and identity types for the authorization engine
//!
//! The engine takes an explicit `EngineConfig` at construction time; there is
//! no global state. The broker integration builds one config, one fetcher,
//! and one engine, and routes hook invocations to it.

use serde::{Deserialize, Serialize};

/// Authorization engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct EngineConfig {
    /// Keep a per-client slot of the last compiled rule set.
    ///
    /// The slot is refreshed on every check, so it never serves stale rules;
    /// disabling it switches to a fetch-compile-evaluate-discard path with
    /// identical observable behavior and no cache writes.
    pub cache_rulesets: bool,

    /// Log every decision at debug level (permits included).
    pub log_decisions: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_rulesets: true,
            log_decisions: false,
        }
    }
}

/// Identity of a connected MQTT client, as supplied by the broker hooks.
///
/// `(mountpoint, client_id)` keys the rule-set cache; `username` keys the
/// ACL record in the external store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    /// Broker-level namespace prefix ("" for the default mountpoint).
    pub mountpoint: String,
    /// Client identifier from CONNECT.
    pub client_id: String,
    /// Username from CONNECT, if one was supplied.
    pub username: Option<String>,
}

impl Identity {
    pub fn new(
        mountpoint: impl Into<String>,
        client_id: impl Into<String>,
        username: Option<String>,
    ) -> Self {
        Self {
            mountpoint: mountpoint.into(),
            client_id: client_id.into(),
            username,
        }
    }

    /// Username, with an empty string treated the same as no username.
    pub fn username(&self) -> Option<&str> {
        match self.username.as_deref() {
            Some("") | None => None,
            some => some,
        }
    }
}
