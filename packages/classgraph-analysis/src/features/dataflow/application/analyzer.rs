//! The analyzer contract.

use std::sync::Arc;

use crate::errors::{AnalysisError, Result};
use crate::features::dataflow::domain::{AnalysisReport, DomainFact, SpaceId};
use crate::features::dataflow::infrastructure::{FlowFunctionsSpace, IfdsResult};

/// One registered analysis: a flow-function space plus result extraction.
///
/// The solver has no compiled-in knowledge of specific analyses; anything
/// implementing this trait can be handed to the runner.
pub trait Analyzer<F: DomainFact>: Send + Sync {
    /// Identity of the findings this analyzer produces.
    fn space_id(&self) -> SpaceId;

    fn flow_functions(&self) -> Arc<dyn FlowFunctionsSpace<F>>;

    /// The dual analyzer for runs over the time-reversed supergraph. A
    /// forward-only analysis declines with an unsupported-operation error;
    /// the failure is scoped to this call, not to other analyzer instances.
    fn backward(&self) -> Result<Arc<dyn Analyzer<F>>> {
        Err(AnalysisError::unsupported(format!(
            "no backward analyzer for `{}`",
            self.space_id().value()
        )))
    }

    /// Reduce a completed fixpoint result into findings.
    ///
    /// Must be a pure function of the result: deterministic, no further
    /// graph traversal side effects. Findings come out in statement order
    /// and duplicates for the same statement are not re-emitted.
    fn calculate_sources(&self, result: &IfdsResult<F>) -> AnalysisReport;
}
