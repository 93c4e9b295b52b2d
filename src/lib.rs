//! Authorization decision engine for MQTT broker hooks
//!
//! The broker invokes this crate on every SUBSCRIBE and PUBLISH: given the
//! connecting identity (mountpoint, client id, username), decide whether the
//! topic operation is permitted.
//!
//! - **Pattern matching**: MQTT wildcards (`+`, `#`) plus per-connection
//!   variable tokens (`%m` mountpoint, `%c` client id, `%u` username)
//! - **Rule sets**: immutable compiled snapshots of publish/subscribe rules,
//!   one per identity, built from a JSON ACL document
//! - **Per-client cache**: a single slot per `(mountpoint, client_id)`,
//!   evicted and repopulated on every check so externally-changed rules are
//!   honored promptly
//! - **Fail-closed**: missing username, fetch miss, store failure, and
//!   malformed documents are all deny decisions
//!
//! # Architecture
//!
//! The broker integration implements [`fetch::AclFetcher`] against its ACL
//! store, builds one [`AuthorizationEngine`], and routes hook invocations
//! through [`BrokerHooks`]:
//!
//! ```
//! use std::sync::Arc;
//! use mqtt_acl_hooks::{AuthorizationEngine, BrokerHooks};
//! use mqtt_acl_hooks::fetch::{AclFetcher, MemoryAclFetcher};
//! use mqtt_acl_hooks::config::Identity;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let fetcher = Arc::new(MemoryAclFetcher::new());
//! fetcher.put("", "alice", serde_json::json!({
//!     "passhash": "$2a$12$...",
//!     "publish_acl": [{ "pattern": "chat/%u/#" }],
//!     "subscribe_acl": [{ "pattern": "chat/+/0" }]
//! }));
//!
//! let engine = Arc::new(AuthorizationEngine::new(fetcher as Arc<dyn AclFetcher>));
//! let hooks = BrokerHooks::new(engine);
//!
//! let alice = Identity::new("", "dev-1", Some("alice".to_string()));
//! assert!(hooks.on_publish(&alice, "chat/alice/msgs/1", 0, b"hi", false).await);
//! assert!(!hooks.on_publish(&alice, "chat/bob/msgs/1", 0, b"hi", false).await);
//! # });
//! ```

pub mod acl;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod hooks;
pub mod mqtt;
pub mod qos;

// Re-export main types
pub use config::{EngineConfig, Identity};
pub use engine::AuthorizationEngine;
pub use error::{AccessDecision, DenyReason};
pub use hooks::BrokerHooks;
pub use qos::{QosSpec, Subscription};
