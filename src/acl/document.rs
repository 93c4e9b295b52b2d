//! Raw ACL document shape, as fetched from the external store
//!
//! A record is keyed by `(mountpoint, "*", username)` in the store and looks
//! like:
//!
//! ```json
//! {
//!   "passhash": "$2a$12$...",
//!   "publish_acl": [{ "pattern": "chat/%u/#" }],
//!   "subscribe_acl": [{ "pattern": "chat/+/0" }]
//! }
//! ```
//!
//! The document lives only for the duration of one authorization check.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Schema violation in a fetched ACL document.
#[derive(Debug, Clone, Error)]
#[error("malformed ACL document: {detail}")]
pub struct MalformedDocument {
    detail: String,
}

impl MalformedDocument {
    pub(crate) fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// One ACL rule: a topic pattern with wildcards and variable tokens.
///
/// Store records may carry extra per-rule keys; anything beyond `pattern`
/// is ignored here.
#[derive(Debug, Clone, Deserialize)]
pub struct AclRule {
    pub pattern: String,
}

/// Raw fetched ACL record.
#[derive(Debug, Clone, Deserialize)]
pub struct AclDocument {
    /// Password hash, verified upstream by the broker. Unused here.
    pub passhash: String,
    pub publish_acl: Vec<AclRule>,
    pub subscribe_acl: Vec<AclRule>,
}

impl AclDocument {
    /// Validate and deserialize a fetched JSON value.
    ///
    /// Fails if the value is not an object with the three required keys, or
    /// if either rule array contains an entry without a string `pattern`.
    pub fn from_value(value: &Value) -> Result<Self, MalformedDocument> {
        if !value.is_object() {
            return Err(MalformedDocument::new("document is not an object"));
        }
        serde_json::from_value(value.clone()).map_err(|e| MalformedDocument::new(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_well_formed_document() {
        let value = json!({
            "passhash": "$2a$12$abc",
            "publish_acl": [{"pattern": "chat/%u/#"}],
            "subscribe_acl": [{"pattern": "chat/+/0"}, {"pattern": "news/#"}]
        });

        let doc = AclDocument::from_value(&value).unwrap();
        assert_eq!(doc.publish_acl.len(), 1);
        assert_eq!(doc.subscribe_acl.len(), 2);
        assert_eq!(doc.publish_acl[0].pattern, "chat/%u/#");
    }

    #[test]
    fn test_extra_rule_keys_ignored() {
        let value = json!({
            "passhash": "x",
            "publish_acl": [{"pattern": "a/b", "max_qos": 1}],
            "subscribe_acl": []
        });

        let doc = AclDocument::from_value(&value).unwrap();
        assert_eq!(doc.publish_acl[0].pattern, "a/b");
    }

    #[test]
    fn test_missing_key_is_malformed() {
        let value = json!({
            "passhash": "x",
            "publish_acl": []
        });

        assert!(AclDocument::from_value(&value).is_err());
    }

    #[test]
    fn test_non_string_pattern_is_malformed() {
        let value = json!({
            "passhash": "x",
            "publish_acl": [{"pattern": 42}],
            "subscribe_acl": []
        });

        assert!(AclDocument::from_value(&value).is_err());
    }

    #[test]
    fn test_non_object_is_malformed() {
        assert!(AclDocument::from_value(&json!("nope")).is_err());
        assert!(AclDocument::from_value(&json!(["a", "b"])).is_err());
        assert!(AclDocument::from_value(&Value::Null).is_err());
    }
}
