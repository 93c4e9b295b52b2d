//! Broker hook surface
//!
//! The broker's hook chain calls one entry point per protocol lifecycle
//! event and enforces the boolean it gets back. Registration is always
//! permitted here: credential verification happens upstream, this layer only
//! terminates the chain. Subscribe and publish route through the
//! authorization engine. The protocol-version-5 aliases behave identically
//! to their base hooks; the only v5 difference, the structured QoS shape, is
//! normalized before evaluation.
//!
//! Lifecycle hooks with no authorization semantics (unsubscribe, client
//! gone/offline, session expired) are forwarded unchanged.

use std::sync::Arc;

use tracing::debug;

use crate::config::Identity;
use crate::engine::AuthorizationEngine;
use crate::qos::Subscription;

/// What a hook contributes to the broker's chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    /// Returns an enforced permit/deny decision.
    Decision,
    /// Forwarded with no decision attached.
    Passthrough,
}

/// One named hook entry.
#[derive(Debug, Clone, Copy)]
pub struct HookEntry {
    pub name: &'static str,
    pub kind: HookKind,
}

/// Explicit table of the hooks this crate serves, built at startup.
///
/// Advertisement-only: the broker integration uses it to register hook
/// names and to tell decision hooks from passthroughs, then dispatches each
/// invocation to the matching [`BrokerHooks`] method. Entries carry no
/// callable because the hook signatures differ (identity-only, subscription
/// list, full publish tuple); a uniform callback table would erase exactly
/// the typing the methods provide.
#[derive(Debug, Clone)]
pub struct HookRegistry {
    entries: Vec<HookEntry>,
}

impl HookRegistry {
    pub fn entries(&self) -> &[HookEntry] {
        &self.entries
    }

    pub fn kind_of(&self, name: &str) -> Option<HookKind> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.kind)
    }
}

/// Hook entry points, backed by one shared engine.
pub struct BrokerHooks {
    engine: Arc<AuthorizationEngine>,
}

impl BrokerHooks {
    pub fn new(engine: Arc<AuthorizationEngine>) -> Self {
        Self { engine }
    }

    /// The hook table to register with the broker.
    pub fn registry(&self) -> HookRegistry {
        const DECISION: &[&str] = &[
            "auth_on_register",
            "auth_on_subscribe",
            "auth_on_publish",
            "auth_on_register_m5",
            "auth_on_subscribe_m5",
            "auth_on_publish_m5",
        ];
        const PASSTHROUGH: &[&str] = &[
            "on_unsubscribe",
            "on_client_gone",
            "on_client_offline",
            "on_session_expired",
        ];

        let entries = DECISION
            .iter()
            .copied()
            .map(|name| HookEntry {
                name,
                kind: HookKind::Decision,
            })
            .chain(PASSTHROUGH.iter().copied().map(|name| HookEntry {
                name,
                kind: HookKind::Passthrough,
            }))
            .collect();

        HookRegistry { entries }
    }

    /// Registration hook. Authentication is performed upstream by the
    /// broker; this terminal answer always permits.
    pub async fn on_register(&self, identity: &Identity) -> bool {
        debug!(
            client_id = %identity.client_id,
            mountpoint = %identity.mountpoint,
            "Register hook, permitting (authn is upstream)"
        );
        true
    }

    /// Subscribe hook: all pairs must be permitted or the request is denied.
    pub async fn on_subscribe(&self, identity: &Identity, subscriptions: &[Subscription]) -> bool {
        self.engine
            .authorize_subscribe(identity, subscriptions)
            .await
            .allowed()
    }

    /// Publish hook: the topic must match a publish rule.
    pub async fn on_publish(
        &self,
        identity: &Identity,
        topic: &str,
        qos: u8,
        payload: &[u8],
        retain: bool,
    ) -> bool {
        self.engine
            .authorize_publish(identity, topic, qos, payload, retain)
            .await
            .allowed()
    }

    /// Protocol-version-5 alias for [`Self::on_register`].
    pub async fn on_register_m5(&self, identity: &Identity) -> bool {
        self.on_register(identity).await
    }

    /// Protocol-version-5 alias for [`Self::on_subscribe`].
    pub async fn on_subscribe_m5(
        &self,
        identity: &Identity,
        subscriptions: &[Subscription],
    ) -> bool {
        self.on_subscribe(identity, subscriptions).await
    }

    /// Protocol-version-5 alias for [`Self::on_publish`].
    pub async fn on_publish_m5(
        &self,
        identity: &Identity,
        topic: &str,
        qos: u8,
        payload: &[u8],
        retain: bool,
    ) -> bool {
        self.on_publish(identity, topic, qos, payload, retain).await
    }

    /// Passthrough: no authorization semantics.
    pub fn on_unsubscribe(&self, identity: &Identity, topics: &[String]) -> bool {
        debug!(client_id = %identity.client_id, topics = ?topics, "Unsubscribe passthrough");
        true
    }

    /// Passthrough: connection teardown bookkeeping stays with the broker.
    pub fn on_client_gone(&self, identity: &Identity) {
        debug!(client_id = %identity.client_id, "Client gone passthrough");
    }

    /// Passthrough.
    pub fn on_client_offline(&self, identity: &Identity) {
        debug!(client_id = %identity.client_id, "Client offline passthrough");
    }

    /// Passthrough.
    pub fn on_session_expired(&self, identity: &Identity) {
        debug!(client_id = %identity.client_id, "Session expired passthrough");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MemoryAclFetcher;
    use serde_json::json;

    fn make_hooks() -> (Arc<MemoryAclFetcher>, BrokerHooks) {
        let fetcher = Arc::new(MemoryAclFetcher::new());
        let engine = Arc::new(AuthorizationEngine::new(
            Arc::clone(&fetcher) as Arc<dyn crate::fetch::AclFetcher>
        ));
        (fetcher, BrokerHooks::new(engine))
    }

    fn make_identity(username: Option<&str>) -> Identity {
        Identity::new("", "client-1", username.map(|s| s.to_string()))
    }

    #[tokio::test]
    async fn test_register_always_permits() {
        let (_fetcher, hooks) = make_hooks();

        // even with no username or ACL record
        assert!(hooks.on_register(&make_identity(None)).await);
        assert!(hooks.on_register_m5(&make_identity(Some("alice"))).await);
    }

    #[tokio::test]
    async fn test_m5_aliases_match_base_hooks() {
        let (fetcher, hooks) = make_hooks();
        fetcher.put(
            "",
            "alice",
            json!({
                "passhash": "x",
                "publish_acl": [{"pattern": "chat/#"}],
                "subscribe_acl": [{"pattern": "chat/#"}]
            }),
        );
        let identity = make_identity(Some("alice"));
        let subs = vec![Subscription::new("chat/a", 0u8)];

        assert_eq!(
            hooks.on_publish(&identity, "chat/x", 0, b"", false).await,
            hooks.on_publish_m5(&identity, "chat/x", 0, b"", false).await,
        );
        assert_eq!(
            hooks.on_subscribe(&identity, &subs).await,
            hooks.on_subscribe_m5(&identity, &subs).await,
        );
        assert_eq!(
            hooks.on_publish(&identity, "other/x", 0, b"", false).await,
            hooks.on_publish_m5(&identity, "other/x", 0, b"", false).await,
        );
    }

    #[tokio::test]
    async fn test_passthrough_hooks() {
        let (_fetcher, hooks) = make_hooks();
        let identity = make_identity(Some("alice"));

        assert!(hooks.on_unsubscribe(&identity, &["a/b".to_string()]));
        hooks.on_client_gone(&identity);
        hooks.on_client_offline(&identity);
        hooks.on_session_expired(&identity);
    }

    #[test]
    fn test_registry_names_and_kinds() {
        let fetcher = Arc::new(MemoryAclFetcher::new());
        let engine = Arc::new(AuthorizationEngine::new(fetcher as Arc<dyn crate::fetch::AclFetcher>));
        let registry = BrokerHooks::new(engine).registry();

        assert_eq!(registry.entries().len(), 10);
        assert_eq!(registry.kind_of("auth_on_publish"), Some(HookKind::Decision));
        assert_eq!(
            registry.kind_of("auth_on_subscribe_m5"),
            Some(HookKind::Decision)
        );
        assert_eq!(
            registry.kind_of("on_session_expired"),
            Some(HookKind::Passthrough)
        );
        assert_eq!(registry.kind_of("not_a_hook"), None);
    }
}
