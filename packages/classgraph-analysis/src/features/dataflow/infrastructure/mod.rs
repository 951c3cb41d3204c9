//! Engine infrastructure: flow-function contracts, the tabulation solver,
//! and the in-memory program-graph adapter.

mod flow;
mod program_graph;
mod tabulation;

pub use flow::{FlowFunctionInstance, FlowFunctionsSpace};
pub use program_graph::{InMemoryClasspath, ProgramGraph, ProgramGraphBuilder};
pub use tabulation::{IfdsResult, IfdsStats, PathEdge, TabulationSolver};
