//! Core dataflow domain: access paths, fact identity, findings.

mod access_path;
mod fact;
mod finding;

pub use access_path::{AccessPath, PathBase};
pub use fact::{DomainFact, SpaceId, ZERO_SPACE};
pub use finding::{AnalysisReport, Finding};
