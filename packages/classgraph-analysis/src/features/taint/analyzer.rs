//! Forward source-to-sink taint analysis.
//!
//! A fact `Tainted { variable, source }` means "the value reachable through
//! this access path was produced by the source call at `source`". Taint is
//! generated at configured source-method results, carried across non-heap
//! copies and call boundaries, killed at overwrites and sanitizer calls, and
//! reported whenever a tainted path flows into a configured sink argument.

use std::sync::Arc;

use crate::config::{TaintConfig, UnresolvedCallPolicy};
use crate::errors::{AnalysisError, Result};
use crate::features::dataflow::application::Analyzer;
use crate::features::dataflow::domain::{
    AccessPath, AnalysisReport, DomainFact, Finding, PathBase, SpaceId, ZERO_SPACE,
};
use crate::features::dataflow::infrastructure::{
    FlowFunctionInstance, FlowFunctionsSpace, IfdsResult,
};
use crate::features::dataflow::ports::{ApplicationGraph, Classpath};
use crate::shared::models::{CallExpr, Instruction, MethodId, StmtId};

pub const TAINT_SPACE: SpaceId = SpaceId::new("taint analysis");

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaintFact {
    Zero,
    Tainted {
        variable: AccessPath,
        source: StmtId,
    },
}

impl DomainFact for TaintFact {
    fn zero() -> Self {
        TaintFact::Zero
    }

    fn is_zero(&self) -> bool {
        matches!(self, TaintFact::Zero)
    }

    fn space_id(&self) -> SpaceId {
        match self {
            TaintFact::Zero => ZERO_SPACE,
            TaintFact::Tainted { .. } => TAINT_SPACE,
        }
    }
}

pub struct TaintAnalyzer {
    graph: Arc<dyn ApplicationGraph>,
    config: TaintConfig,
    space: Arc<TaintFlowFunctions>,
}

impl std::fmt::Debug for TaintAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaintAnalyzer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TaintAnalyzer {
    pub fn new(
        graph: Arc<dyn ApplicationGraph>,
        classpath: Arc<dyn Classpath>,
        config: TaintConfig,
    ) -> Result<Self> {
        config.validate()?;
        let space = Arc::new(TaintFlowFunctions {
            graph: graph.clone(),
            classpath,
            config: config.clone(),
            in_ids: vec![TAINT_SPACE, ZERO_SPACE],
        });
        Ok(Self {
            graph,
            config,
            space,
        })
    }
}

impl Analyzer<TaintFact> for TaintAnalyzer {
    fn space_id(&self) -> SpaceId {
        TAINT_SPACE
    }

    fn flow_functions(&self) -> Arc<dyn FlowFunctionsSpace<TaintFact>> {
        self.space.clone()
    }

    fn calculate_sources(&self, result: &IfdsResult<TaintFact>) -> AnalysisReport {
        let mut findings = Vec::new();

        for stmt in result.statements_sorted() {
            let Some(expr) = self.graph.instruction(stmt).and_then(Instruction::call_expr)
            else {
                continue;
            };
            if !self.config.sink_methods.contains(&expr.callee_name) {
                continue;
            }
            let sink_paths = argument_paths(expr);
            let Some(facts) = result.facts_at(stmt) else {
                continue;
            };
            for fact in facts {
                let TaintFact::Tainted { variable, source } = fact else {
                    continue;
                };
                if sink_paths.iter().any(|a| variable.has_prefix(a)) {
                    findings.push(
                        Finding::new(TAINT_SPACE, self.graph.statement_text(stmt))
                            .with_related(self.graph.statement_text(*source)),
                    );
                }
            }
        }

        findings.sort();
        findings.dedup();
        AnalysisReport::new(findings)
    }
}

/// Access paths of everything a call hands to its callee: the receiver and
/// every addressable argument.
fn argument_paths(expr: &CallExpr) -> Vec<AccessPath> {
    expr.receiver
        .iter()
        .chain(expr.args.iter())
        .filter_map(AccessPath::from_value)
        .collect()
}

struct TaintFlowFunctions {
    graph: Arc<dyn ApplicationGraph>,
    classpath: Arc<dyn Classpath>,
    config: TaintConfig,
    in_ids: Vec<SpaceId>,
}

impl TaintFlowFunctions {
    fn call_expr_at(&self, call_statement: StmtId) -> Result<CallExpr> {
        self.graph
            .instruction(call_statement)
            .and_then(Instruction::call_expr)
            .cloned()
            .ok_or_else(|| {
                AnalysisError::malformed_call_site(
                    self.graph.statement_text(call_statement),
                    "call expression expected",
                )
            })
    }

    /// Formal-parameter paths of a callee, with every declared parameter
    /// type resolved up front.
    fn formal_paths(&self, callee: MethodId) -> Result<Vec<AccessPath>> {
        let mut out = Vec::new();
        for param in self.graph.method_parameters(callee) {
            self.classpath.find_type(&param.type_name).map_err(|_| {
                AnalysisError::unresolved(
                    param.type_name.clone(),
                    format!(
                        "parameter `{}` of `{}`",
                        param.name,
                        self.graph.method_name(callee)
                    ),
                )
            })?;
            out.push(AccessPath::from_parameter(&param));
        }
        Ok(out)
    }
}

impl FlowFunctionsSpace<TaintFact> for TaintFlowFunctions {
    fn in_ids(&self) -> &[SpaceId] {
        &self.in_ids
    }

    fn obtain_start_facts(&self, _start: StmtId) -> Result<Vec<TaintFact>> {
        Ok(Vec::new())
    }

    fn obtain_sequent_flow_function(
        &self,
        current: StmtId,
        _next: StmtId,
    ) -> Result<FlowFunctionInstance<TaintFact>> {
        let assign = match self.graph.instruction(current) {
            Some(Instruction::Assign { lhs, rhs }) => Some((lhs.clone(), rhs.clone())),
            _ => None,
        };
        Ok(FlowFunctionInstance::new(self.in_ids.clone(), move |fact: &TaintFact| {
            let Some((lhs, rhs)) = &assign else {
                return vec![fact.clone()];
            };
            let TaintFact::Tainted { variable, source } = fact else {
                return vec![fact.clone()];
            };

            let to_path = AccessPath::from_value(lhs);
            // A write to the tracked path itself kills the fact, but only
            // for non-heap paths: heap writes are weak updates.
            let mut out = match &to_path {
                Some(to) if to == variable && !to.is_on_heap() => Vec::new(),
                _ => vec![fact.clone()],
            };

            let (Some(from_path), Some(to_path)) = (AccessPath::from_value(rhs), to_path)
            else {
                return out;
            };
            if from_path.is_on_heap() || to_path.is_on_heap() {
                return out;
            }
            if &from_path == variable {
                out.push(TaintFact::Tainted {
                    variable: to_path,
                    source: *source,
                });
            }
            out
        }))
    }

    fn obtain_call_to_start_flow_function(
        &self,
        call_statement: StmtId,
        callee: MethodId,
    ) -> Result<FlowFunctionInstance<TaintFact>> {
        let expr = self.call_expr_at(call_statement)?;
        let formal_paths = self.formal_paths(callee)?;
        let actual_paths: Vec<Option<AccessPath>> =
            expr.args.iter().map(AccessPath::from_value).collect();
        let receiver_path = expr.receiver.as_ref().and_then(AccessPath::from_value);
        let this_path = AccessPath::from_base(PathBase::This);

        Ok(FlowFunctionInstance::new(self.in_ids.clone(), move |fact| {
            let TaintFact::Tainted { variable, source } = fact else {
                return vec![fact.clone()];
            };

            let mut out = Vec::new();
            for (formal, actual) in formal_paths.iter().zip(&actual_paths) {
                let Some(actual) = actual else { continue };
                if let Some(rebased) = variable.rebase(actual, formal) {
                    out.push(TaintFact::Tainted {
                        variable: rebased,
                        source: *source,
                    });
                }
            }
            if let Some(receiver) = &receiver_path {
                if let Some(rebased) = variable.rebase(receiver, &this_path) {
                    out.push(TaintFact::Tainted {
                        variable: rebased,
                        source: *source,
                    });
                }
            }
            out
        }))
    }

    fn obtain_call_to_return_flow_function(
        &self,
        call_statement: StmtId,
        _return_site: StmtId,
    ) -> Result<FlowFunctionInstance<TaintFact>> {
        let expr = self.call_expr_at(call_statement)?;
        let result_path = match self.graph.instruction(call_statement) {
            Some(Instruction::Call {
                result: Some(result),
                ..
            }) => AccessPath::from_value(result),
            _ => None,
        };

        let is_source = self.config.source_methods.contains(&expr.callee_name);
        let is_sanitizer = self.config.sanitizer_methods.contains(&expr.callee_name);
        let unresolved = self.graph.callees(call_statement).is_empty();
        let policy = self.config.unresolved_call_policy;
        let escape_paths = argument_paths(&expr);

        Ok(FlowFunctionInstance::new(self.in_ids.clone(), move |fact| {
            match fact {
                TaintFact::Zero => {
                    let mut out = vec![TaintFact::Zero];
                    if is_source {
                        if let Some(result) = &result_path {
                            out.push(TaintFact::Tainted {
                                variable: result.clone(),
                                source: call_statement,
                            });
                        }
                    }
                    out
                }
                TaintFact::Tainted { variable, .. } => {
                    // The call result overwrites whatever the path held.
                    if result_path.as_ref() == Some(variable) {
                        return Vec::new();
                    }
                    if is_sanitizer && escape_paths.iter().any(|a| variable.has_prefix(a)) {
                        return Vec::new();
                    }
                    if unresolved
                        && policy == UnresolvedCallPolicy::DropEscaping
                        && variable.is_on_heap()
                        && escape_paths.iter().any(|a| variable.has_prefix(a))
                    {
                        return Vec::new();
                    }
                    vec![fact.clone()]
                }
            }
        }))
    }

    fn obtain_exit_to_return_site_flow_function(
        &self,
        call_statement: StmtId,
        _return_site: StmtId,
        exit_statement: StmtId,
    ) -> Result<FlowFunctionInstance<TaintFact>> {
        let expr = self.call_expr_at(call_statement)?;
        let callee = self.graph.method_of(exit_statement);
        let formal_paths = self.formal_paths(callee)?;
        let actual_paths: Vec<Option<AccessPath>> =
            expr.args.iter().map(AccessPath::from_value).collect();
        let receiver_path = expr.receiver.as_ref().and_then(AccessPath::from_value);
        let this_path = AccessPath::from_base(PathBase::This);

        let returned_path = match self.graph.instruction(exit_statement) {
            Some(Instruction::Return { value: Some(v) }) => AccessPath::from_value(v),
            _ => None,
        };
        let result_path = match self.graph.instruction(call_statement) {
            Some(Instruction::Call {
                result: Some(result),
                ..
            }) => AccessPath::from_value(result),
            _ => None,
        };

        Ok(FlowFunctionInstance::new(self.in_ids.clone(), move |fact| {
            match fact {
                TaintFact::Zero => vec![TaintFact::Zero],
                TaintFact::Tainted { variable, source } => {
                    let mut out = Vec::new();
                    if returned_path.as_ref() == Some(variable) {
                        if let Some(result) = &result_path {
                            out.push(TaintFact::Tainted {
                                variable: result.clone(),
                                source: *source,
                            });
                        }
                    }
                    // By-reference flow: heap state rooted in a formal is
                    // visible to the caller through the matching actual.
                    if variable.is_on_heap() {
                        for (formal, actual) in formal_paths.iter().zip(&actual_paths) {
                            let Some(actual) = actual else { continue };
                            if let Some(rebased) = variable.rebase(formal, actual) {
                                out.push(TaintFact::Tainted {
                                    variable: rebased,
                                    source: *source,
                                });
                            }
                        }
                        if let Some(receiver) = &receiver_path {
                            if let Some(rebased) = variable.rebase(&this_path, receiver) {
                                out.push(TaintFact::Tainted {
                                    variable: rebased,
                                    source: *source,
                                });
                            }
                        }
                    }
                    out
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::dataflow::application::run_analyzer;
    use crate::features::dataflow::infrastructure::ProgramGraph;
    use crate::shared::models::{CallKind, Value};
    use pretty_assertions::assert_eq;

    fn assign(lhs: Value, rhs: Value) -> Instruction {
        Instruction::Assign { lhs, rhs }
    }

    fn call(result: Option<Value>, name: &str, args: Vec<Value>) -> Instruction {
        Instruction::Call {
            result,
            expr: CallExpr {
                kind: CallKind::Static,
                callee_name: name.to_string(),
                receiver: None,
                args,
            },
        }
    }

    fn run(graph: ProgramGraph, entry: MethodId, config: TaintConfig) -> AnalysisReport {
        let graph = Arc::new(graph);
        let classpath = graph.classpath();
        let analyzer = TaintAnalyzer::new(graph.clone(), classpath, config).unwrap();
        run_analyzer(graph, &analyzer, &[entry]).unwrap()
    }

    #[test]
    fn test_source_to_sink_direct() {
        // v = getParameter(); executeQuery(v); return
        let mut b = ProgramGraph::builder();
        let main = b.add_method("main");
        b.set_body(
            main,
            vec![
                call(Some(Value::local(0, "v")), "getParameter", vec![]),
                call(None, "executeQuery", vec![Value::local(0, "v")]),
                Instruction::Return { value: None },
            ],
        );
        let report = run(b.build(), main, TaintConfig::default());

        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].rule, "taint analysis");
        assert!(report.findings[0].primary_location.starts_with("main#1"));
        assert_eq!(report.findings[0].related_locations.len(), 1);
        assert!(report.findings[0].related_locations[0].starts_with("main#0"));
    }

    #[test]
    fn test_sanitizer_clears_argument() {
        // v = getParameter(); sanitize(v); executeQuery(v)
        let mut b = ProgramGraph::builder();
        let main = b.add_method("main");
        b.set_body(
            main,
            vec![
                call(Some(Value::local(0, "v")), "getParameter", vec![]),
                call(None, "sanitize", vec![Value::local(0, "v")]),
                call(None, "executeQuery", vec![Value::local(0, "v")]),
                Instruction::Return { value: None },
            ],
        );
        let report = run(b.build(), main, TaintConfig::default());
        assert_eq!(report.findings, vec![]);
    }

    #[test]
    fn test_overwrite_kills_fact() {
        // v = getParameter(); v = 5; executeQuery(v)
        let mut b = ProgramGraph::builder();
        let main = b.add_method("main");
        b.set_body(
            main,
            vec![
                call(Some(Value::local(0, "v")), "getParameter", vec![]),
                assign(Value::local(0, "v"), Value::int(5)),
                call(None, "executeQuery", vec![Value::local(0, "v")]),
                Instruction::Return { value: None },
            ],
        );
        let report = run(b.build(), main, TaintConfig::default());
        assert_eq!(report.findings, vec![]);
    }

    #[test]
    fn test_alias_copy_carries_taint() {
        // v = getParameter(); w = v; executeQuery(w)
        let mut b = ProgramGraph::builder();
        let main = b.add_method("main");
        b.set_body(
            main,
            vec![
                call(Some(Value::local(0, "v")), "getParameter", vec![]),
                assign(Value::local(1, "w"), Value::local(0, "v")),
                call(None, "executeQuery", vec![Value::local(1, "w")]),
                Instruction::Return { value: None },
            ],
        );
        let report = run(b.build(), main, TaintConfig::default());
        assert_eq!(report.findings.len(), 1);
        assert!(report.findings[0].related_locations[0].starts_with("main#0"));
    }

    #[test]
    fn test_taint_survives_identity_callee() {
        // main: a = getParameter(); r = id(a); executeQuery(r)
        // id(p): return p
        let mut b = ProgramGraph::builder();
        let main = b.add_method("main");
        let id = b.add_method_with_params("id", vec![("p", "int")]);
        b.set_body(
            main,
            vec![
                call(Some(Value::local(0, "a")), "getParameter", vec![]),
                call(Some(Value::local(1, "r")), "id", vec![Value::local(0, "a")]),
                call(None, "executeQuery", vec![Value::local(1, "r")]),
                Instruction::Return { value: None },
            ],
        );
        b.set_body(
            id,
            vec![Instruction::Return {
                value: Some(Value::argument(0, "p")),
            }],
        );
        let report = run(b.build(), main, TaintConfig::default());

        assert_eq!(report.findings.len(), 1);
        assert!(report.findings[0].primary_location.starts_with("main#2"));
        assert!(report.findings[0].related_locations[0].starts_with("main#0"));
    }

    #[test]
    fn test_heap_taint_flows_back_through_argument() {
        // main: fill(o); executeQuery(o.f)
        // fill(p): p.f = getParameter(); return
        let mut b = ProgramGraph::builder();
        let main = b.add_method("main");
        let fill = b.add_method_with_params("fill", vec![("p", "Obj")]);
        b.set_body(
            main,
            vec![
                call(None, "fill", vec![Value::local(0, "o")]),
                call(
                    None,
                    "executeQuery",
                    vec![Value::field(Value::local(0, "o"), "f")],
                ),
                Instruction::Return { value: None },
            ],
        );
        b.set_body(
            fill,
            vec![
                call(
                    Some(Value::field(Value::argument(0, "p"), "f")),
                    "getParameter",
                    vec![],
                ),
                Instruction::Return { value: None },
            ],
        );
        let report = run(b.build(), main, TaintConfig::default());

        assert_eq!(report.findings.len(), 1);
        assert!(report.findings[0].primary_location.starts_with("main#1"));
    }

    #[test]
    fn test_unresolved_call_propagates_escaping_by_default() {
        // o.f = getParameter(); unknown(o); executeQuery(o.f)
        let (graph, main) = escaping_graph();
        let report = run(graph, main, TaintConfig::default());
        assert_eq!(report.findings.len(), 1);
    }

    #[test]
    fn test_unresolved_call_drops_escaping_when_configured() {
        let config = TaintConfig {
            unresolved_call_policy: UnresolvedCallPolicy::DropEscaping,
            ..TaintConfig::default()
        };
        let (graph, main) = escaping_graph();
        let report = run(graph, main, config);
        assert_eq!(report.findings, vec![]);
    }

    fn escaping_graph() -> (ProgramGraph, MethodId) {
        let mut b = ProgramGraph::builder();
        let main = b.add_method("main");
        b.set_body(
            main,
            vec![
                call(
                    Some(Value::field(Value::local(0, "o"), "f")),
                    "getParameter",
                    vec![],
                ),
                call(None, "unknown", vec![Value::local(0, "o")]),
                call(
                    None,
                    "executeQuery",
                    vec![Value::field(Value::local(0, "o"), "f")],
                ),
                Instruction::Return { value: None },
            ],
        );
        (b.build(), main)
    }

    #[test]
    fn test_unrelated_sink_argument_not_reported() {
        // v = getParameter(); executeQuery(w)
        let mut b = ProgramGraph::builder();
        let main = b.add_method("main");
        b.set_body(
            main,
            vec![
                call(Some(Value::local(0, "v")), "getParameter", vec![]),
                call(None, "executeQuery", vec![Value::local(1, "w")]),
                Instruction::Return { value: None },
            ],
        );
        let report = run(b.build(), main, TaintConfig::default());
        assert_eq!(report.findings, vec![]);
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let mut b = ProgramGraph::builder();
        let main = b.add_method("main");
        b.set_body(main, vec![Instruction::Return { value: None }]);
        let graph = Arc::new(b.build());
        let config = TaintConfig {
            source_methods: Vec::new(),
            ..TaintConfig::default()
        };
        let err = TaintAnalyzer::new(graph.clone(), graph.classpath(), config).unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)));
    }
}
