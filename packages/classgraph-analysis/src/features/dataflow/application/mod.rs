//! Use cases: the analyzer contract and run orchestration.

mod analyzer;
mod runner;

pub use analyzer::Analyzer;
pub use runner::{run_analyzer, run_analyzer_parallel};
