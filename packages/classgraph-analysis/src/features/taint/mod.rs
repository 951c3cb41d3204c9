//! Forward taint analysis over configured source, sink and sanitizer
//! method lists.

mod analyzer;

pub use analyzer::{TaintAnalyzer, TaintFact, TAINT_SPACE};
