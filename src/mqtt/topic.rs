//! MQTT topic matching with wildcards and identity substitution
//!
//! Implements MQTT topic filter matching per the MQTT 3.1.1 and 5.0
//! specifications, extended with the broker variable tokens used by ACL
//! patterns: `%m` (mountpoint), `%c` (client id), `%u` (username). Variables
//! are substituted per identity before wildcard matching.

use crate::config::Identity;

/// Topic matcher for MQTT topic filters and ACL patterns
#[derive(Debug, Clone, Default)]
pub struct TopicMatcher;

impl TopicMatcher {
    /// Create a new topic matcher
    pub fn new() -> Self {
        Self
    }

    /// Check if a topic matches an ACL pattern for a given identity.
    ///
    /// Variable tokens in the pattern are replaced with the identity's
    /// values first (single pass, literal, case-sensitive), then the result
    /// is matched as an MQTT topic filter. An empty pattern after
    /// substitution, or an empty topic, never matches.
    ///
    /// # Examples
    /// ```
    /// use mqtt_acl_hooks::config::Identity;
    /// use mqtt_acl_hooks::mqtt::TopicMatcher;
    ///
    /// let matcher = TopicMatcher::new();
    /// let id = Identity::new("", "dev-1", Some("alice".to_string()));
    /// assert!(matcher.matches_for("chat/%u/#", "chat/alice/msgs/1", &id));
    /// assert!(!matcher.matches_for("chat/%u/#", "chat/bob/msgs/1", &id));
    /// ```
    pub fn matches_for(&self, pattern: &str, topic: &str, identity: &Identity) -> bool {
        let substituted = substitute(pattern, identity);
        if substituted.is_empty() || topic.is_empty() {
            return false;
        }
        self.matches(topic, &substituted)
    }

    /// Check if a topic matches a topic filter (no variable substitution)
    ///
    /// # MQTT Wildcard Rules
    /// * `+` matches exactly one topic level
    /// * `#` matches zero or more topic levels (must be the last level)
    pub fn matches(&self, topic: &str, filter: &str) -> bool {
        let topic_levels: Vec<&str> = topic.split('/').collect();
        let filter_levels: Vec<&str> = filter.split('/').collect();

        self.match_levels(&topic_levels, &filter_levels)
    }

    fn match_levels(&self, topic: &[&str], filter: &[&str]) -> bool {
        let mut t_idx = 0;
        let mut f_idx = 0;

        while f_idx < filter.len() {
            match filter[f_idx] {
                "#" => {
                    // matches the remainder, but only as the final level
                    return f_idx == filter.len() - 1;
                }
                "+" => {
                    // exactly one level, any content
                    if t_idx >= topic.len() {
                        return false;
                    }
                    t_idx += 1;
                    f_idx += 1;
                }
                literal => {
                    if t_idx >= topic.len() || topic[t_idx] != literal {
                        return false;
                    }
                    t_idx += 1;
                    f_idx += 1;
                }
            }
        }

        // Pattern exhausted; topic must be too
        t_idx == topic.len()
    }

    /// Check if a topic filter is valid
    ///
    /// `#` must be alone in the final level, `+` must be alone in its level,
    /// and empty levels (`//`) are not allowed.
    pub fn is_valid_filter(&self, filter: &str) -> bool {
        if filter.is_empty() {
            return false;
        }

        let levels: Vec<&str> = filter.split('/').collect();

        for (i, level) in levels.iter().enumerate() {
            if level.is_empty() {
                return false;
            }

            if level.contains('#') && (*level != "#" || i != levels.len() - 1) {
                return false;
            }

            if level.contains('+') && *level != "+" {
                return false;
            }
        }

        true
    }

    /// Check if a topic name is valid (no wildcards, no empty levels)
    pub fn is_valid_topic(&self, topic: &str) -> bool {
        if topic.is_empty() {
            return false;
        }

        if topic.contains('+') || topic.contains('#') {
            return false;
        }

        !topic.split('/').any(|level| level.is_empty())
    }
}

/// Replace `%m`, `%c`, `%u` in a pattern with the identity's mountpoint,
/// client id, and username.
///
/// Single left-to-right pass: tokens introduced by substituted values are
/// not themselves substituted. A missing username substitutes as empty.
pub fn substitute(pattern: &str, identity: &Identity) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('m') => {
                out.push_str(&identity.mountpoint);
                chars.next();
            }
            Some('c') => {
                out.push_str(&identity.client_id);
                chars.next();
            }
            Some('u') => {
                out.push_str(identity.username().unwrap_or(""));
                chars.next();
            }
            _ => out.push('%'),
        }
    }

    out
}
