// Interprocedural dataflow engine
//
// Hexagonal architecture:
// - domain: access paths, fact identity, findings
// - ports: application graph and classpath contracts (consumed)
// - infrastructure: flow functions, tabulation solver, in-memory graph
// - application: analyzer contract and run orchestration

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{run_analyzer, run_analyzer_parallel, Analyzer};
pub use domain::{AccessPath, AnalysisReport, DomainFact, Finding, PathBase, SpaceId, ZERO_SPACE};
pub use infrastructure::{
    FlowFunctionInstance, FlowFunctionsSpace, IfdsResult, IfdsStats, PathEdge, ProgramGraph,
    ProgramGraphBuilder, TabulationSolver,
};
pub use ports::{ApplicationGraph, Classpath, ReversedGraph, TypeRef};
