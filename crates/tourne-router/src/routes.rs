//! Static routing table
//!
//! Built once from the config file at startup, then read-only. Exact rules
//! and prefix rules coexist; exact always wins, prefix rules are tried in
//! declared order, and anything unmatched falls back to a broadcast.

use tourne_core::config::RouteRule;

/// Error type for routing table construction
#[derive(Debug, thiserror::Error)]
pub enum RoutesError {
    #[error("rule {0} must set exactly one of `topic` or `prefix`")]
    AmbiguousRule(usize),

    #[error("prefix {0:?} must end with '/'")]
    BadPrefix(String),

    #[error("rule for {0:?} has an empty destination list")]
    EmptyDestinations(String),
}

/// Outcome of resolving a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// An exact rule matched
    Exact(&'a [String]),
    /// A prefix rule matched
    Prefix(&'a [String]),
    /// No rule matched: deliver to every configured destination
    Broadcast,
}

/// Ordered routing rules: exact topics plus prefix rules.
///
/// Prefix order is the declared config order; it is the explicit tie-break
/// when several prefixes could match one topic.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    exact: Vec<(String, Vec<String>)>,
    prefixes: Vec<(String, Vec<String>)>,
}

impl RoutingTable {
    /// Build from declared rules, validating shape.
    pub fn from_rules(rules: &[RouteRule]) -> Result<Self, RoutesError> {
        let mut exact = Vec::new();
        let mut prefixes = Vec::new();

        for (i, rule) in rules.iter().enumerate() {
            let destinations = rule.to.clone();
            match (&rule.topic, &rule.prefix) {
                (Some(topic), None) => {
                    if destinations.is_empty() {
                        return Err(RoutesError::EmptyDestinations(topic.clone()));
                    }
                    exact.push((topic.clone(), destinations));
                }
                (None, Some(prefix)) => {
                    if !prefix.ends_with('/') {
                        return Err(RoutesError::BadPrefix(prefix.clone()));
                    }
                    if destinations.is_empty() {
                        return Err(RoutesError::EmptyDestinations(prefix.clone()));
                    }
                    prefixes.push((prefix.clone(), destinations));
                }
                _ => return Err(RoutesError::AmbiguousRule(i)),
            }
        }

        Ok(Self { exact, prefixes })
    }

    /// Resolve a topic to a destination set.
    pub fn resolve(&self, topic: &str) -> Resolution<'_> {
        if let Some((_, names)) = self.exact.iter().find(|(t, _)| t == topic) {
            return Resolution::Exact(names);
        }

        // First declared prefix wins. Strict prefix only: the bare prefix
        // topic itself (without a trailing segment) does not match.
        for (prefix, names) in &self.prefixes {
            if topic.len() > prefix.len() && topic.starts_with(prefix.as_str()) {
                return Resolution::Prefix(names);
            }
        }

        Resolution::Broadcast
    }

    pub fn rule_count(&self) -> usize {
        self.exact.len() + self.prefixes.len()
    }
}
