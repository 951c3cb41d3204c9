/*
 * Classgraph Analysis - IFDS Dataflow Engine
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Common value model (methods, statements, values)
 * - features/    : Vertical slices (dataflow engine, unused_variables, taint)
 * - config/      : Run configuration
 *
 * The engine implements the IFDS tabulation algorithm: analyses describe
 * themselves as flow-function spaces over domain facts, the solver computes
 * same-level realizable path edges to a fixpoint, and analyzers extract
 * findings from the reachable-fact table.
 */

#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::module_inception)] // Module naming intentional

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports - Feature-First Architecture
// ═══════════════════════════════════════════════════════════════════════════

/// Shared models and utilities
pub mod shared;

/// Feature modules
pub mod features;

/// Configuration system
pub mod config;

/// Unified error handling
pub mod errors;

// Convenience re-exports for embedding front ends.
pub use config::{AnalysisConfig, TaintConfig, UnresolvedCallPolicy};
pub use errors::{AnalysisError, Result};
pub use features::dataflow::application::{run_analyzer, run_analyzer_parallel, Analyzer};
pub use features::dataflow::domain::{
    AccessPath, AnalysisReport, DomainFact, Finding, PathBase, SpaceId, ZERO_SPACE,
};
pub use features::dataflow::infrastructure::{
    FlowFunctionInstance, FlowFunctionsSpace, IfdsResult, IfdsStats, InMemoryClasspath,
    ProgramGraph, ProgramGraphBuilder, TabulationSolver,
};
pub use features::dataflow::ports::{ApplicationGraph, Classpath, ReversedGraph, TypeRef};
pub use features::taint::{TaintAnalyzer, TaintFact, TAINT_SPACE};
pub use features::unused_variables::{
    UnusedVariableAnalyzer, UnusedVariableFact, UNUSED_VARIABLE_SPACE,
};
