//! Deny taxonomy and decision types
//!
//! Every failure mode collapses to a deny at the hook boundary; the broker
//! only ever sees a boolean. The distinguishing kind is kept on the decision
//! so the engine can log it.

use thiserror::Error;

/// Why an authorization check denied the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DenyReason {
    /// The connection carries no username; there is no identity to authorize.
    #[error("no username on connection")]
    IdentityMissing,

    /// The ACL store has no record for `(mountpoint, username)`.
    #[error("no ACL record found")]
    RecordNotFound,

    /// The fetched ACL document violates the expected schema.
    #[error("malformed ACL document")]
    MalformedDocument,

    /// The ACL store could not be reached (network error, timeout).
    #[error("ACL store unavailable")]
    FetchUnavailable,

    /// The document was well-formed but no rule matched the request.
    #[error("no matching ACL rule")]
    NoRuleMatch,
}

/// Outcome of one authorization check.
///
/// Permit carries no extra data; deny carries the reason for logs and
/// telemetry. `allowed()` is the only thing the hook boundary exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDecision {
    allowed: bool,
    reason: Option<DenyReason>,
}

impl AccessDecision {
    pub fn permit() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn deny(reason: DenyReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }

    pub fn allowed(&self) -> bool {
        self.allowed
    }

    /// Deny reason, if this decision is a deny.
    pub fn reason(&self) -> Option<DenyReason> {
        self.reason
    }
}

impl From<DenyReason> for AccessDecision {
    fn from(reason: DenyReason) -> Self {
        Self::deny(reason)
    }
}
