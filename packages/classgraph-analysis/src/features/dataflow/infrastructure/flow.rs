//! Flow-function contracts.
//!
//! A flow function is a pure mapping from one incoming fact to the set of
//! facts it produces across one supergraph edge. Analysis semantics live
//! entirely in a `FlowFunctionsSpace`; the tabulation solver only applies
//! what the space hands it.

use crate::errors::{AnalysisError, Result};
use crate::features::dataflow::domain::{DomainFact, SpaceId};
use crate::shared::models::{MethodId, StmtId};

/// A flow function scoped to one supergraph edge.
///
/// Stateless beyond the edge it was built for. `in_ids` declares which fact
/// domains it accepts; facts from any other domain map to the empty set
/// rather than being interpreted.
pub struct FlowFunctionInstance<F: DomainFact> {
    in_ids: Vec<SpaceId>,
    func: Box<dyn Fn(&F) -> Vec<F> + Send + Sync>,
}

impl<F: DomainFact> FlowFunctionInstance<F> {
    pub fn new(
        in_ids: Vec<SpaceId>,
        func: impl Fn(&F) -> Vec<F> + Send + Sync + 'static,
    ) -> Self {
        Self {
            in_ids,
            func: Box::new(func),
        }
    }

    /// `f(d) = {d}` for every accepted domain.
    pub fn identity(in_ids: Vec<SpaceId>) -> Self {
        Self::new(in_ids, |fact: &F| vec![fact.clone()])
    }

    /// `f(d) = {d} if d = zero else {}` — only reachability survives.
    pub fn zero_only(in_ids: Vec<SpaceId>) -> Self {
        Self::new(in_ids, |fact: &F| {
            if fact.is_zero() {
                vec![fact.clone()]
            } else {
                Vec::new()
            }
        })
    }

    pub fn in_ids(&self) -> &[SpaceId] {
        &self.in_ids
    }

    /// Apply to one fact, enforcing domain isolation first.
    pub fn apply(&self, fact: &F) -> Vec<F> {
        if !self.in_ids.contains(&fact.space_id()) {
            return Vec::new();
        }
        (self.func)(fact)
    }
}

/// Per-analysis factory of flow functions for the four supergraph edge
/// kinds. Implementations capture whatever context they need (application
/// graph, classpath) at construction time.
pub trait FlowFunctionsSpace<F: DomainFact>: Send + Sync {
    /// Domains whose facts this space consumes, the zero space included.
    fn in_ids(&self) -> &[SpaceId];

    /// Facts seeded at an analysis start statement. The zero fact is always
    /// seeded by the solver; anything returned here is added on top.
    fn obtain_start_facts(&self, start: StmtId) -> Result<Vec<F>>;

    /// Statement → next statement, no call involved.
    fn obtain_sequent_flow_function(
        &self,
        current: StmtId,
        next: StmtId,
    ) -> Result<FlowFunctionInstance<F>>;

    /// Call statement → callee entry: actual-to-formal substitution.
    fn obtain_call_to_start_flow_function(
        &self,
        call_statement: StmtId,
        callee: MethodId,
    ) -> Result<FlowFunctionInstance<F>>;

    /// Call statement → return site, bypassing the callee body.
    fn obtain_call_to_return_flow_function(
        &self,
        call_statement: StmtId,
        return_site: StmtId,
    ) -> Result<FlowFunctionInstance<F>>;

    /// Callee exit → caller's return site.
    fn obtain_exit_to_return_site_flow_function(
        &self,
        call_statement: StmtId,
        return_site: StmtId,
        exit_statement: StmtId,
    ) -> Result<FlowFunctionInstance<F>>;

    /// The dual space for backward analyses. Absence is a declared optional
    /// capability, not a panic.
    fn backward(&self) -> Result<&dyn FlowFunctionsSpace<F>> {
        Err(AnalysisError::unsupported(
            "no backward flow-function space for this analysis",
        ))
    }
}
