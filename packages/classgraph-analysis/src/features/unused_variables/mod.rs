// Unused-variable analysis: reports assignments whose target is never read.

mod analyzer;

pub use analyzer::{UnusedVariableAnalyzer, UnusedVariableFact, UNUSED_VARIABLE_SPACE};
