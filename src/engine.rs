//! Authorization engine
//!
//! One state machine per check: fetch the ACL record for the identity,
//! refresh the client's cache slot (evict then insert, atomically per key),
//! evaluate the requested operation against the fresh snapshot, and return a
//! boolean decision. Every failure branch is a deny; nothing is retried and
//! no check affects another.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::acl::{ClientAclCache, RuleSet};
use crate::config::{EngineConfig, Identity};
use crate::error::{AccessDecision, DenyReason};
use crate::fetch::{AclFetcher, FetchError};
use crate::mqtt::TopicMatcher;
use crate::qos::Subscription;

/// Authorization decision engine, invoked by the broker hooks on every
/// SUBSCRIBE and PUBLISH.
pub struct AuthorizationEngine {
    config: EngineConfig,
    fetcher: Arc<dyn AclFetcher>,
    cache: ClientAclCache,
    topic_matcher: TopicMatcher,
}

impl AuthorizationEngine {
    /// Create an engine with default configuration.
    pub fn new(fetcher: Arc<dyn AclFetcher>) -> Self {
        Self::with_config(EngineConfig::default(), fetcher)
    }

    /// Create an engine with the given configuration.
    pub fn with_config(config: EngineConfig, fetcher: Arc<dyn AclFetcher>) -> Self {
        Self {
            config,
            fetcher,
            cache: ClientAclCache::new(),
            topic_matcher: TopicMatcher::new(),
        }
    }

    /// The shared rule-set cache.
    pub fn cache(&self) -> &ClientAclCache {
        &self.cache
    }

    /// Authorize a PUBLISH to a single topic.
    ///
    /// QoS, payload, and retain flag are accepted and logged; the decision
    /// is governed solely by topic-pattern membership in the publish rules.
    pub async fn authorize_publish(
        &self,
        identity: &Identity,
        topic: &str,
        qos: u8,
        payload: &[u8],
        retain: bool,
    ) -> AccessDecision {
        if self.config.log_decisions {
            debug!(
                client_id = %identity.client_id,
                topic = %topic,
                qos = qos,
                retain = retain,
                size = payload.len(),
                "MQTT PUBLISH check"
            );
        }

        let rule_set = match self.refresh(identity).await {
            Ok(rule_set) => rule_set,
            Err(reason) => return self.denied(identity, "publish", topic, reason),
        };

        if !self.topic_matcher.is_valid_topic(topic) {
            warn!(client_id = %identity.client_id, topic = %topic, "Invalid publish topic");
            return self.denied(identity, "publish", topic, DenyReason::NoRuleMatch);
        }

        if !rule_set.allows_publish(topic, identity) {
            return self.denied(identity, "publish", topic, DenyReason::NoRuleMatch);
        }

        if self.config.log_decisions {
            debug!(client_id = %identity.client_id, topic = %topic, "PUBLISH allowed");
        }
        AccessDecision::permit()
    }

    /// Authorize a SUBSCRIBE request.
    ///
    /// Every `(topic filter, qos)` pair must be permitted by at least one
    /// subscribe rule; a single denied pair denies the whole request. There
    /// is no partial grant.
    pub async fn authorize_subscribe(
        &self,
        identity: &Identity,
        subscriptions: &[Subscription],
    ) -> AccessDecision {
        if self.config.log_decisions {
            debug!(
                client_id = %identity.client_id,
                topics = ?subscriptions.iter().map(|s| &s.topic_filter).collect::<Vec<_>>(),
                "MQTT SUBSCRIBE check"
            );
        }

        let rule_set = match self.refresh(identity).await {
            Ok(rule_set) => rule_set,
            Err(reason) => return self.denied(identity, "subscribe", "*", reason),
        };

        for sub in subscriptions {
            // normalize the v5 structured shape before evaluation
            let qos = sub.qos.effective();

            if !self.topic_matcher.is_valid_filter(&sub.topic_filter) {
                warn!(
                    client_id = %identity.client_id,
                    filter = %sub.topic_filter,
                    "Invalid subscribe filter"
                );
                return self.denied(identity, "subscribe", &sub.topic_filter, DenyReason::NoRuleMatch);
            }

            if !rule_set.allows_subscribe(&sub.topic_filter, identity) {
                return self.denied(identity, "subscribe", &sub.topic_filter, DenyReason::NoRuleMatch);
            }

            if self.config.log_decisions {
                debug!(
                    client_id = %identity.client_id,
                    filter = %sub.topic_filter,
                    qos = qos,
                    "Subscription pair allowed"
                );
            }
        }

        AccessDecision::permit()
    }

    /// Fetch, evict, and reinsert the rule set for this identity.
    ///
    /// The fetch-evict-insert sequence runs under the per-key lock so a
    /// concurrent check for the same client never observes the slot between
    /// eviction and reinsertion; checks for distinct clients proceed in
    /// parallel. Once the lock is released it is reaped if uncontended, so
    /// ephemeral client ids do not accumulate lock entries.
    async fn refresh(&self, identity: &Identity) -> Result<Arc<RuleSet>, DenyReason> {
        let Some(username) = identity.username() else {
            return Err(DenyReason::IdentityMissing);
        };

        let result = self.refresh_locked(identity, username).await;
        self.cache
            .reap_key_lock(&identity.mountpoint, &identity.client_id);
        result
    }

    async fn refresh_locked(
        &self,
        identity: &Identity,
        username: &str,
    ) -> Result<Arc<RuleSet>, DenyReason> {
        let key_lock = self
            .cache
            .key_lock(&identity.mountpoint, &identity.client_id);
        let _guard = key_lock.lock().await;

        let document = match self.fetcher.fetch(&identity.mountpoint, username).await {
            Ok(document) => document,
            Err(FetchError::NotFound) => return Err(DenyReason::RecordNotFound),
            Err(FetchError::Unavailable(detail)) => {
                warn!(
                    client_id = %identity.client_id,
                    detail = %detail,
                    "ACL fetch failed, failing closed"
                );
                return Err(DenyReason::FetchUnavailable);
            }
        };

        if !self.config.cache_rulesets {
            // direct fetch-compile-evaluate-discard path, no cache writes
            return RuleSet::compile(&document).map(Arc::new).map_err(|e| {
                warn!(client_id = %identity.client_id, error = %e, "Rejecting ACL document");
                DenyReason::MalformedDocument
            });
        }

        self.cache
            .evict(&identity.mountpoint, &identity.client_id);
        self.cache
            .insert(
                &identity.mountpoint,
                &identity.client_id,
                username,
                &document,
            )
            .map_err(|e| {
                warn!(client_id = %identity.client_id, error = %e, "Rejecting ACL document");
                DenyReason::MalformedDocument
            })
    }

    fn denied(
        &self,
        identity: &Identity,
        operation: &str,
        topic: &str,
        reason: DenyReason,
    ) -> AccessDecision {
        info!(
            client_id = %identity.client_id,
            mountpoint = %identity.mountpoint,
            operation = %operation,
            topic = %topic,
            reason = %reason,
            "Authorization denied"
        );
        AccessDecision::deny(reason)
    }
}
