//! Access Control List (ACL) module
//!
//! Raw document parsing, compiled rule sets, and the per-client cache.

mod cache;
mod document;
mod ruleset;

pub use cache::{CacheEntry, ClientAclCache};
pub use document::{AclDocument, AclRule, MalformedDocument};
pub use ruleset::RuleSet;
