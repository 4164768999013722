//! Configuration types for graph actors and the client facade.

use std::time::Duration;

use serde::Deserialize;

/// Top-level graph configuration.
///
/// Loaded from JSON at runtime or built with [`GraphConfig::default`], which
/// leaves every call unbounded and walks the real tree depth.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Upper bound on a blocking call (milliseconds). `None` blocks until the
    /// target replies or stops.
    pub call_timeout_ms: Option<u64>,

    /// Upper bound on the number of parent hops the ancestor check will take.
    /// `None` walks until a root is reached.
    pub max_ancestor_depth: Option<usize>,
}

impl GraphConfig {
    /// Parse a configuration from a JSON document.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Call timeout as a [`Duration`], if one is configured.
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }

    /// Set the call timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Set the ancestor walk bound.
    pub fn with_max_ancestor_depth(mut self, depth: usize) -> Self {
        self.max_ancestor_depth = Some(depth);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unbounded() {
        let config = GraphConfig::default();
        assert!(config.call_timeout().is_none());
        assert!(config.max_ancestor_depth.is_none());
    }

    #[test]
    fn test_huge_timeout_saturates() {
        let config = GraphConfig::default().with_call_timeout(Duration::MAX);
        assert_eq!(config.call_timeout_ms, Some(u64::MAX));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = GraphConfig::from_json(r#"{ "call_timeout_ms": 250 }"#).unwrap();
        assert_eq!(config.call_timeout(), Some(Duration::from_millis(250)));
        assert!(config.max_ancestor_depth.is_none());
    }
}
