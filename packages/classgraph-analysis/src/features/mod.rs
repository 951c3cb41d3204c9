//! Feature modules, one vertical slice each.
//!
//! `dataflow` is the engine: domain facts, the supergraph ports, the
//! tabulation solver and the runner. The other features are analyses built
//! on top of it.

pub mod dataflow;
pub mod taint;
pub mod unused_variables;
