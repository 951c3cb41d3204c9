//! Tabulation solver for IFDS problems.
//!
//! Worklist-based fixpoint over path edges (Reps, Horwitz, Sagiv 1995),
//! adapted to the application-graph port: the exploded supergraph is never
//! materialized, its edges are derived lazily by asking the flow-function
//! space for the edge kind at hand.
//!
//! All per-run state (path-edge set, worklist, incoming table, summary
//! table) is owned by the solver instance; aborting a run is discarding the
//! instance. The summary table is append-only for the duration of a run and
//! keyed by (callee, entry fact).

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::errors::Result;
use crate::features::dataflow::domain::DomainFact;
use crate::features::dataflow::ports::ApplicationGraph;
use crate::shared::models::{MethodId, StmtId};

use super::flow::FlowFunctionsSpace;

/// Path edge (d1, n, d2): if `entry_fact` holds at the entry of n's method,
/// then `fact` can hold at n.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathEdge<F: DomainFact> {
    pub entry_fact: F,
    pub statement: StmtId,
    pub fact: F,
}

impl<F: DomainFact> PathEdge<F> {
    pub fn new(entry_fact: F, statement: StmtId, fact: F) -> Self {
        Self {
            entry_fact,
            statement,
            fact,
        }
    }
}

/// Run counters, including the instrumentation hooks the tests observe.
#[derive(Debug, Clone, Default)]
pub struct IfdsStats {
    /// Distinct path edges discovered.
    pub path_edges: usize,

    /// Distinct (callee, entry fact) → (exit, exit fact) summary entries.
    pub summary_edges: usize,

    /// Times a memoized summary satisfied a call without re-traversal.
    pub summary_reuses: usize,

    /// Times a callee body was seeded with a fresh entry fact.
    pub callee_traversals: usize,

    /// Worklist pops.
    pub iterations: usize,

    /// Wall time of the fixpoint loop.
    pub solve_time_ms: u64,
}

/// Immutable fixpoint result: statement → set of facts holding there.
///
/// Built once per (space, graph, entry set) run and owned by the caller.
pub struct IfdsResult<F: DomainFact> {
    result_facts: FxHashMap<StmtId, FxHashSet<F>>,
    stats: IfdsStats,
}

impl<F: DomainFact> IfdsResult<F> {
    pub fn facts_at(&self, stmt: StmtId) -> Option<&FxHashSet<F>> {
        self.result_facts.get(&stmt)
    }

    pub fn has_fact(&self, stmt: StmtId, fact: &F) -> bool {
        self.result_facts
            .get(&stmt)
            .is_some_and(|facts| facts.contains(fact))
    }

    /// Statements in this result, in statement order. Extraction iterates
    /// this so findings come out deterministically.
    pub fn statements_sorted(&self) -> Vec<StmtId> {
        let mut stmts: Vec<StmtId> = self.result_facts.keys().copied().collect();
        stmts.sort();
        stmts
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StmtId, &FxHashSet<F>)> {
        self.result_facts.iter()
    }

    pub fn stats(&self) -> &IfdsStats {
        &self.stats
    }
}

type SummaryKey<F> = (MethodId, F);

/// The IFDS engine. One instance per run; `solve` consumes it.
pub struct TabulationSolver<F: DomainFact> {
    graph: Arc<dyn ApplicationGraph>,
    space: Arc<dyn FlowFunctionsSpace<F>>,

    path_edges: FxHashSet<PathEdge<F>>,
    worklist: VecDeque<PathEdge<F>>,
    result_facts: FxHashMap<StmtId, FxHashSet<F>>,

    /// (callee, entry fact) → call sites (with their caller entry facts)
    /// waiting on that callee's summaries.
    incoming: FxHashMap<SummaryKey<F>, FxHashSet<(StmtId, F)>>,

    /// (callee, entry fact) → facts observed at callee exits. Append-only;
    /// valid only for the exact entry fact they were computed against.
    summaries: FxHashMap<SummaryKey<F>, FxHashSet<(StmtId, F)>>,

    stats: IfdsStats,
}

impl<F: DomainFact> TabulationSolver<F> {
    pub fn new(graph: Arc<dyn ApplicationGraph>, space: Arc<dyn FlowFunctionsSpace<F>>) -> Self {
        Self {
            graph,
            space,
            path_edges: FxHashSet::default(),
            worklist: VecDeque::new(),
            result_facts: FxHashMap::default(),
            incoming: FxHashMap::default(),
            summaries: FxHashMap::default(),
            stats: IfdsStats::default(),
        }
    }

    /// Run the fixpoint from the entry statements of the given methods.
    ///
    /// Any flow-function construction failure aborts the whole run: a
    /// partial fact set cannot be distinguished from a complete one by
    /// downstream extraction.
    pub fn solve(mut self, entry_methods: &[MethodId]) -> Result<IfdsResult<F>> {
        let started = Instant::now();

        for &method in entry_methods {
            for start in self.graph.entry_points(method) {
                self.propagate(PathEdge::new(F::zero(), start, F::zero()));
                for fact in self.space.obtain_start_facts(start)? {
                    self.propagate(PathEdge::new(F::zero(), start, fact));
                }
            }
        }

        while let Some(edge) = self.worklist.pop_front() {
            self.stats.iterations += 1;
            let stmt = edge.statement;
            let method = self.graph.method_of(stmt);

            let is_call = self
                .graph
                .instruction(stmt)
                .is_some_and(|inst| inst.call_expr().is_some());

            if is_call {
                self.process_call(&edge)?;
            } else {
                self.process_sequent(&edge)?;
                if self.graph.exit_points(method).contains(&stmt) {
                    self.process_exit(&edge)?;
                }
            }
        }

        self.stats.path_edges = self.path_edges.len();
        self.stats.summary_edges = self.summaries.values().map(|s| s.len()).sum();
        self.stats.solve_time_ms = started.elapsed().as_millis() as u64;

        debug!(
            path_edges = self.stats.path_edges,
            summary_edges = self.stats.summary_edges,
            summary_reuses = self.stats.summary_reuses,
            iterations = self.stats.iterations,
            "tabulation fixpoint reached"
        );

        Ok(IfdsResult {
            result_facts: self.result_facts,
            stats: self.stats,
        })
    }

    /// Insert a path edge; enqueue it when new. Re-insertion is idempotent,
    /// which is what bounds recursion: an in-progress callee never re-seeds.
    fn propagate(&mut self, edge: PathEdge<F>) -> bool {
        if !self.path_edges.insert(edge.clone()) {
            return false;
        }
        self.result_facts
            .entry(edge.statement)
            .or_default()
            .insert(edge.fact.clone());
        self.worklist.push_back(edge);
        true
    }

    /// Intraprocedural step: sequent flow function toward each successor.
    fn process_sequent(&mut self, edge: &PathEdge<F>) -> Result<()> {
        for next in self.graph.successors(edge.statement) {
            let ff = self
                .space
                .obtain_sequent_flow_function(edge.statement, next)?;
            for fact in ff.apply(&edge.fact) {
                self.propagate(PathEdge::new(edge.entry_fact.clone(), next, fact));
            }
        }
        Ok(())
    }

    /// Call step: call-to-return toward each return site, call-to-start into
    /// each resolvable callee, and summary application where one is already
    /// memoized for the produced entry fact.
    fn process_call(&mut self, edge: &PathEdge<F>) -> Result<()> {
        let call = edge.statement;
        let return_sites = self.graph.successors(call);

        for &ret in &return_sites {
            let ff = self.space.obtain_call_to_return_flow_function(call, ret)?;
            for fact in ff.apply(&edge.fact) {
                self.propagate(PathEdge::new(edge.entry_fact.clone(), ret, fact));
            }
        }

        for callee in self.graph.callees(call) {
            let ff = self
                .space
                .obtain_call_to_start_flow_function(call, callee)?;
            for entry_fact in ff.apply(&edge.fact) {
                let key = (callee, entry_fact.clone());
                self.incoming
                    .entry(key.clone())
                    .or_default()
                    .insert((call, edge.entry_fact.clone()));

                if let Some(summaries) = self.summaries.get(&key).cloned() {
                    if !summaries.is_empty() {
                        self.stats.summary_reuses += 1;
                    }
                    for (exit, exit_fact) in summaries {
                        self.apply_exit_fact(
                            call,
                            &return_sites,
                            exit,
                            &exit_fact,
                            &edge.entry_fact,
                        )?;
                    }
                }

                for entry in self.graph.entry_points(callee) {
                    let seeded =
                        self.propagate(PathEdge::new(entry_fact.clone(), entry, entry_fact.clone()));
                    if seeded {
                        self.stats.callee_traversals += 1;
                    }
                }
            }
        }
        Ok(())
    }

    /// Exit step: record the summary edge and flow the exit fact back to
    /// every caller registered for this (callee, entry fact).
    fn process_exit(&mut self, edge: &PathEdge<F>) -> Result<()> {
        let exit = edge.statement;
        let callee = self.graph.method_of(exit);
        let key = (callee, edge.entry_fact.clone());

        let is_new = self
            .summaries
            .entry(key.clone())
            .or_default()
            .insert((exit, edge.fact.clone()));
        if !is_new {
            return Ok(());
        }

        let callers: Vec<(StmtId, F)> = self
            .incoming
            .get(&key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();

        for (call, caller_entry_fact) in callers {
            let return_sites = self.graph.successors(call);
            self.apply_exit_fact(call, &return_sites, exit, &edge.fact, &caller_entry_fact)?;
        }
        Ok(())
    }

    /// Map one callee-exit fact through exit-to-return into the caller.
    fn apply_exit_fact(
        &mut self,
        call: StmtId,
        return_sites: &[StmtId],
        exit: StmtId,
        exit_fact: &F,
        caller_entry_fact: &F,
    ) -> Result<()> {
        for &ret in return_sites {
            let ff = self
                .space
                .obtain_exit_to_return_site_flow_function(call, ret, exit)?;
            for fact in ff.apply(exit_fact) {
                self.propagate(PathEdge::new(caller_entry_fact.clone(), ret, fact));
            }
        }
        Ok(())
    }
}
