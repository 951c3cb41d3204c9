//! Findings: the shape downstream reporting layers serialize.

use super::fact::SpaceId;
use serde::{Deserialize, Serialize};

/// One reported instance of whatever an analyzer looks for.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Finding {
    /// Rule identifier: the producing analyzer's `SpaceId` value.
    pub rule: String,

    /// All implicated program locations, stringified statement references.
    pub locations: Vec<String>,

    /// The location a report should point at first.
    pub primary_location: String,

    /// Supporting locations (e.g. the taint source for a sink finding).
    pub related_locations: Vec<String>,
}

impl Finding {
    pub fn new(rule: SpaceId, primary_location: impl Into<String>) -> Self {
        let primary = primary_location.into();
        Self {
            rule: rule.value().to_string(),
            locations: vec![primary.clone()],
            primary_location: primary,
            related_locations: Vec::new(),
        }
    }

    pub fn with_related(mut self, related: impl Into<String>) -> Self {
        let related = related.into();
        self.locations.push(related.clone());
        self.related_locations.push(related);
        self
    }
}

/// The full output of one analyzer run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub findings: Vec<Finding>,
}

impl AnalysisReport {
    pub fn new(findings: Vec<Finding>) -> Self {
        Self { findings }
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Merge another report in, dropping duplicates and keeping findings in
    /// a stable order.
    pub fn merge(&mut self, other: AnalysisReport) {
        self.findings.extend(other.findings);
        self.findings.sort();
        self.findings.dedup();
    }
}
