//! Per-client rule-set cache
//!
//! One slot per `(mountpoint, client_id)`, holding the rule set compiled
//! from the most recent successful fetch plus the username it was built for.
//! The engine evicts and reinserts the slot on every check, so an entry
//! never outlives one fetch cycle; there is no time-based expiry.
//!
//! Each key also has an async mutex. The engine holds it across its
//! evict-insert-evaluate sequence so a concurrent check for the same client
//! never observes the transient evicted state, while distinct clients
//! proceed fully in parallel.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::Mutex;

use super::document::MalformedDocument;
use super::ruleset::RuleSet;

/// Cache key: one slot per client per mountpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    mountpoint: String,
    client_id: String,
}

impl ClientKey {
    fn new(mountpoint: &str, client_id: &str) -> Self {
        Self {
            mountpoint: mountpoint.to_string(),
            client_id: client_id.to_string(),
        }
    }
}

/// Cached rule set plus the username it was compiled for.
///
/// The username matters: a reconnect under the same client id with a
/// different username must not reuse this entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub username: String,
    pub rule_set: Arc<RuleSet>,
}

/// Shared rule-set cache keyed by `(mountpoint, client_id)`.
#[derive(Debug, Default)]
pub struct ClientAclCache {
    entries: DashMap<ClientKey, CacheEntry>,
    key_locks: DashMap<ClientKey, Arc<Mutex<()>>>,
}

impl ClientAclCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove the entry for a key. Idempotent; absent key is a no-op.
    pub fn evict(&self, mountpoint: &str, client_id: &str) {
        self.entries.remove(&ClientKey::new(mountpoint, client_id));
    }

    /// Compile a fetched document and store it, replacing any prior entry.
    ///
    /// Returns the compiled rule set so the caller can evaluate against the
    /// exact snapshot it just stored.
    pub fn insert(
        &self,
        mountpoint: &str,
        client_id: &str,
        username: &str,
        document: &Value,
    ) -> Result<Arc<RuleSet>, MalformedDocument> {
        let rule_set = Arc::new(RuleSet::compile(document)?);
        self.entries.insert(
            ClientKey::new(mountpoint, client_id),
            CacheEntry {
                username: username.to_string(),
                rule_set: Arc::clone(&rule_set),
            },
        );
        Ok(rule_set)
    }

    /// Current entry for a key, if present.
    pub fn lookup(&self, mountpoint: &str, client_id: &str) -> Option<CacheEntry> {
        self.entries
            .get(&ClientKey::new(mountpoint, client_id))
            .map(|entry| entry.clone())
    }

    /// Mutex guarding the evict-insert-evaluate sequence for one key.
    pub fn key_lock(&self, mountpoint: &str, client_id: &str) -> Arc<Mutex<()>> {
        self.key_locks
            .entry(ClientKey::new(mountpoint, client_id))
            .or_default()
            .clone()
    }

    /// Drop the lock for a key if no check currently holds or awaits it.
    ///
    /// Clients often connect with ephemeral client ids; without reaping, the
    /// lock map would retain one entry per client id ever seen. The shard
    /// lock inside `remove_if` serializes against a concurrent `key_lock`,
    /// so a lock is only removed while the map holds the sole reference.
    pub fn reap_key_lock(&self, mountpoint: &str, client_id: &str) {
        self.key_locks
            .remove_if(&ClientKey::new(mountpoint, client_id), |_, lock| {
                Arc::strong_count(lock) == 1
            });
    }

    /// Number of live per-key locks.
    pub fn key_lock_count(&self) -> usize {
        self.key_locks.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(publish_pattern: &str) -> Value {
        json!({
            "passhash": "x",
            "publish_acl": [{"pattern": publish_pattern}],
            "subscribe_acl": []
        })
    }

    #[test]
    fn test_insert_then_lookup() {
        let cache = ClientAclCache::new();
        cache.insert("", "client-1", "alice", &document("a/#")).unwrap();

        let entry = cache.lookup("", "client-1").expect("entry should exist");
        assert_eq!(entry.username, "alice");
        assert_eq!(entry.rule_set.publish_rule_count(), 1);
    }

    #[test]
    fn test_evict_is_idempotent() {
        let cache = ClientAclCache::new();

        // absent key: no-op, twice
        cache.evict("", "client-1");
        cache.evict("", "client-1");
        assert!(cache.lookup("", "client-1").is_none());

        cache.insert("", "client-1", "alice", &document("a/#")).unwrap();
        cache.evict("", "client-1");
        cache.evict("", "client-1");
        assert!(cache.lookup("", "client-1").is_none());
    }

    #[test]
    fn test_insert_replaces_wholesale() {
        let cache = ClientAclCache::new();
        cache.insert("", "client-1", "alice", &document("old/#")).unwrap();
        cache.insert("", "client-1", "alice", &document("new/#")).unwrap();

        let entry = cache.lookup("", "client-1").unwrap();
        let id = crate::config::Identity::new("", "client-1", Some("alice".to_string()));
        assert!(entry.rule_set.allows_publish("new/data", &id));
        assert!(!entry.rule_set.allows_publish("old/data", &id));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_keys_are_scoped_by_mountpoint() {
        let cache = ClientAclCache::new();
        cache.insert("tenant-a", "client-1", "alice", &document("a/#")).unwrap();

        assert!(cache.lookup("tenant-a", "client-1").is_some());
        assert!(cache.lookup("tenant-b", "client-1").is_none());
        assert!(cache.lookup("", "client-1").is_none());
    }

    #[test]
    fn test_malformed_document_does_not_insert() {
        let cache = ClientAclCache::new();
        let bad = json!({"passhash": "x"});

        assert!(cache.insert("", "client-1", "alice", &bad).is_err());
        assert!(cache.lookup("", "client-1").is_none());
    }

    #[test]
    fn test_key_lock_is_stable_per_key() {
        let cache = ClientAclCache::new();
        let a1 = cache.key_lock("", "client-1");
        let a2 = cache.key_lock("", "client-1");
        let b = cache.key_lock("", "client-2");

        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &b));
    }

    #[tokio::test]
    async fn test_ephemeral_keys_do_not_accumulate_locks() {
        let cache = ClientAclCache::new();

        // one-shot clients with random ids: lock, refresh, evict, release
        for i in 0..1000 {
            let client_id = format!("ephemeral-{i}");
            let lock = cache.key_lock("", &client_id);
            {
                let _guard = lock.lock().await;
                cache.insert("", &client_id, "alice", &document("a/#")).unwrap();
                cache.evict("", &client_id);
            }
            drop(lock);
            cache.reap_key_lock("", &client_id);
        }

        assert!(cache.is_empty());
        assert_eq!(cache.key_lock_count(), 0);
    }

    #[test]
    fn test_reap_keeps_contended_lock() {
        let cache = ClientAclCache::new();
        let held = cache.key_lock("", "client-1");

        // another task still holds a reference, so the lock must survive
        cache.reap_key_lock("", "client-1");
        assert_eq!(cache.key_lock_count(), 1);
        assert!(Arc::ptr_eq(&held, &cache.key_lock("", "client-1")));

        drop(held);
        cache.reap_key_lock("", "client-1");
        assert_eq!(cache.key_lock_count(), 0);
    }

    #[test]
    fn test_reap_absent_key_is_noop() {
        let cache = ClientAclCache::new();
        cache.reap_key_lock("", "never-seen");
        assert_eq!(cache.key_lock_count(), 0);
    }
}
