//! Run configuration.
//!
//! Serde-backed so front ends can load it from JSON; analyzers take the
//! piece they need at construction time.

use serde::{Deserialize, Serialize};

use crate::errors::{AnalysisError, Result};

/// What to do with a fact whose heap-rooted path escapes into a call with
/// no resolvable body.
///
/// The two options trade soundness against precision: keeping the fact
/// assumes the unknown callee leaves the location alone (sound for the
/// analyses shipped here, imprecise when the callee would have killed it);
/// dropping it assumes the callee rewrites everything reachable from its
/// arguments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedCallPolicy {
    /// Keep facts on escaping paths (the default).
    #[default]
    PropagateEscaping,
    /// Kill facts on escaping paths.
    DropEscaping,
}

/// Configuration for the taint analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaintConfig {
    /// Methods whose results are taint sources.
    pub source_methods: Vec<String>,

    /// Methods whose arguments are taint sinks.
    pub sink_methods: Vec<String>,

    /// Methods that clear taint from their arguments.
    pub sanitizer_methods: Vec<String>,

    pub unresolved_call_policy: UnresolvedCallPolicy,
}

impl Default for TaintConfig {
    fn default() -> Self {
        Self {
            source_methods: default_source_methods(),
            sink_methods: default_sink_methods(),
            sanitizer_methods: default_sanitizer_methods(),
            unresolved_call_policy: UnresolvedCallPolicy::default(),
        }
    }
}

impl TaintConfig {
    pub fn validate(&self) -> Result<()> {
        if self.source_methods.is_empty() {
            return Err(AnalysisError::config("no taint source methods configured"));
        }
        if self.sink_methods.is_empty() {
            return Err(AnalysisError::config("no taint sink methods configured"));
        }
        Ok(())
    }
}

pub fn default_source_methods() -> Vec<String> {
    ["getParameter", "readLine", "nextLine", "getHeader"]
        .map(String::from)
        .to_vec()
}

pub fn default_sink_methods() -> Vec<String> {
    ["executeQuery", "exec", "eval", "write"]
        .map(String::from)
        .to_vec()
}

pub fn default_sanitizer_methods() -> Vec<String> {
    ["escapeHtml", "sanitize"].map(String::from).to_vec()
}

/// Top-level run configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Solve independent entry methods on separate workers.
    pub parallel_entry_points: bool,

    pub taint: TaintConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.taint.validate().is_ok());
        assert_eq!(
            config.taint.unresolved_call_policy,
            UnresolvedCallPolicy::PropagateEscaping
        );
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let mut config = AnalysisConfig::default();
        config.taint.unresolved_call_policy = UnresolvedCallPolicy::DropEscaping;
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("drop_escaping"));
        let back: AnalysisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_empty_sinks_rejected() {
        let config = TaintConfig {
            sink_methods: Vec::new(),
            ..TaintConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
