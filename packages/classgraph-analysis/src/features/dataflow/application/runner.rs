//! Analysis runner: binds an analyzer to an application graph, drives the
//! solver, extracts findings.

use rayon::prelude::*;
use std::sync::Arc;
use tracing::info;

use crate::errors::Result;
use crate::features::dataflow::domain::{AnalysisReport, DomainFact};
use crate::features::dataflow::infrastructure::TabulationSolver;
use crate::features::dataflow::ports::ApplicationGraph;
use crate::shared::models::MethodId;

use super::analyzer::Analyzer;

/// Solve one analyzer over the given entry methods and extract findings.
pub fn run_analyzer<F: DomainFact>(
    graph: Arc<dyn ApplicationGraph>,
    analyzer: &dyn Analyzer<F>,
    entry_methods: &[MethodId],
) -> Result<AnalysisReport> {
    let solver = TabulationSolver::new(graph, analyzer.flow_functions());
    let result = solver.solve(entry_methods)?;
    let report = analyzer.calculate_sources(&result);
    info!(
        rule = analyzer.space_id().value(),
        findings = report.findings.len(),
        path_edges = result.stats().path_edges,
        "analysis run complete"
    );
    Ok(report)
}

/// Solve independent entry methods on separate rayon workers.
///
/// Each worker owns a private solver; no path-edge or summary state is
/// shared across runs. Reports are merged and deduplicated, so a callee
/// reachable from two entry points is reported once.
pub fn run_analyzer_parallel<F: DomainFact>(
    graph: Arc<dyn ApplicationGraph>,
    analyzer: &(dyn Analyzer<F>),
    entry_methods: &[MethodId],
) -> Result<AnalysisReport> {
    let reports: Vec<AnalysisReport> = entry_methods
        .par_iter()
        .map(|&entry| run_analyzer(graph.clone(), analyzer, &[entry]))
        .collect::<Result<Vec<_>>>()?;

    let mut merged = AnalysisReport::default();
    for report in reports {
        merged.merge(report);
    }
    Ok(merged)
}
