//! Compiled rule sets
//!
//! A `RuleSet` is an immutable snapshot of the publish and subscribe rules
//! from exactly one fetched document, scoped to one `(mountpoint, client_id)`
//! entry. Rule sets are never merged across fetches; a refresh replaces the
//! whole snapshot. Variable substitution happens lazily at match time, since
//! the identity is known then and the set is already identity-scoped.

use serde_json::Value;
use tracing::debug;

use crate::config::Identity;
use crate::mqtt::TopicMatcher;

use super::document::{AclDocument, AclRule, MalformedDocument};

/// Immutable compiled ACL snapshot for one client.
#[derive(Debug, Clone)]
pub struct RuleSet {
    publish_rules: Vec<AclRule>,
    subscribe_rules: Vec<AclRule>,
    matcher: TopicMatcher,
}

impl RuleSet {
    /// Validate a fetched JSON document and compile it into a rule set.
    pub fn compile(value: &Value) -> Result<Self, MalformedDocument> {
        let doc = AclDocument::from_value(value)?;
        Ok(Self::from_document(doc))
    }

    /// Compile an already-validated document.
    pub fn from_document(doc: AclDocument) -> Self {
        Self {
            publish_rules: doc.publish_acl,
            subscribe_rules: doc.subscribe_acl,
            matcher: TopicMatcher::new(),
        }
    }

    /// True if any publish rule matches the topic for this identity.
    pub fn allows_publish(&self, topic: &str, identity: &Identity) -> bool {
        self.any_match(&self.publish_rules, topic, identity)
    }

    /// True if any subscribe rule matches the topic filter for this identity.
    pub fn allows_subscribe(&self, topic_filter: &str, identity: &Identity) -> bool {
        self.any_match(&self.subscribe_rules, topic_filter, identity)
    }

    // First match is sufficient; there are no deny rules and no priorities.
    fn any_match(&self, rules: &[AclRule], topic: &str, identity: &Identity) -> bool {
        let matched = rules
            .iter()
            .find(|rule| self.matcher.matches_for(&rule.pattern, topic, identity));

        if let Some(rule) = matched {
            debug!(pattern = %rule.pattern, topic = %topic, "ACL rule matched");
            return true;
        }
        false
    }

    pub fn publish_rule_count(&self) -> usize {
        self.publish_rules.len()
    }

    pub fn subscribe_rule_count(&self) -> usize {
        self.subscribe_rules.len()
    }
}
