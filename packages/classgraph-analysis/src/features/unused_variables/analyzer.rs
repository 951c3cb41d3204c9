//! Forward unused-variable analysis.
//!
//! A fact `Assigned { variable, init_statement }` means "this access path
//! was last written at `init_statement` and has not been read since". The
//! fact follows alias chains across non-heap copies; extraction reports
//! every init statement whose facts were never observed at a use.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::errors::{AnalysisError, Result};
use crate::features::dataflow::application::Analyzer;
use crate::features::dataflow::domain::{
    AccessPath, AnalysisReport, DomainFact, Finding, SpaceId, ZERO_SPACE,
};
use crate::features::dataflow::infrastructure::{
    FlowFunctionInstance, FlowFunctionsSpace, IfdsResult,
};
use crate::features::dataflow::ports::{ApplicationGraph, Classpath};
use crate::shared::models::{CallExpr, Instruction, MethodId, StmtId, Value};

pub const UNUSED_VARIABLE_SPACE: SpaceId = SpaceId::new("unused variable analysis");

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UnusedVariableFact {
    Zero,
    Assigned {
        variable: AccessPath,
        init_statement: StmtId,
    },
}

impl DomainFact for UnusedVariableFact {
    fn zero() -> Self {
        UnusedVariableFact::Zero
    }

    fn is_zero(&self) -> bool {
        matches!(self, UnusedVariableFact::Zero)
    }

    fn space_id(&self) -> SpaceId {
        match self {
            UnusedVariableFact::Zero => ZERO_SPACE,
            UnusedVariableFact::Assigned { .. } => UNUSED_VARIABLE_SPACE,
        }
    }
}

pub struct UnusedVariableAnalyzer {
    graph: Arc<dyn ApplicationGraph>,
    space: Arc<UnusedVariableFlowFunctions>,
}

impl UnusedVariableAnalyzer {
    pub fn new(graph: Arc<dyn ApplicationGraph>, classpath: Arc<dyn Classpath>) -> Self {
        let space = Arc::new(UnusedVariableFlowFunctions {
            graph: graph.clone(),
            classpath,
            in_ids: vec![UNUSED_VARIABLE_SPACE, ZERO_SPACE],
        });
        Self { graph, space }
    }

    fn path_of(value: &Value) -> Option<AccessPath> {
        AccessPath::from_value(value)
    }

    fn is_used_in_call(&self, path: &AccessPath, expr: &CallExpr) -> bool {
        expr.values()
            .iter()
            .any(|v| Self::path_of(v).as_ref() == Some(path))
    }

    /// Does this statement read the path? Reads inside resolvable callees
    /// are observed there, on the substituted formal-parameter path, so a
    /// resolvable call is not itself a use (except of its receiver).
    fn is_used_at(&self, path: &AccessPath, stmt: StmtId) -> bool {
        let Some(inst) = self.graph.instruction(stmt) else {
            return false;
        };

        if let Some(expr) = inst.call_expr() {
            if self.graph.callees(stmt).is_empty() {
                return self.is_used_in_call(path, expr);
            }
            if let Some(receiver) = &expr.receiver {
                return Self::path_of(receiver).as_ref() == Some(path);
            }
            return false;
        }

        match inst {
            Instruction::Assign { lhs, rhs } => {
                let read = rhs
                    .flatten()
                    .iter()
                    .any(|v| Self::path_of(v).as_ref() == Some(path));
                // A plain variable-to-variable copy is tracked as an alias,
                // not counted as a read.
                let plain_copy = is_plain_variable(lhs) && is_plain_variable(rhs);
                read && !plain_copy
            }
            Instruction::Return { value: Some(v) } => Self::path_of(v).as_ref() == Some(path),
            _ => false,
        }
    }
}

fn is_plain_variable(value: &Value) -> bool {
    matches!(
        value,
        Value::Local { .. } | Value::Argument { .. } | Value::This
    )
}

impl Analyzer<UnusedVariableFact> for UnusedVariableAnalyzer {
    fn space_id(&self) -> SpaceId {
        UNUSED_VARIABLE_SPACE
    }

    fn flow_functions(&self) -> Arc<dyn FlowFunctionsSpace<UnusedVariableFact>> {
        self.space.clone()
    }

    fn calculate_sources(&self, result: &IfdsResult<UnusedVariableFact>) -> AnalysisReport {
        let mut used: BTreeMap<StmtId, bool> = BTreeMap::new();

        for stmt in result.statements_sorted() {
            let Some(facts) = result.facts_at(stmt) else {
                continue;
            };
            for fact in facts {
                if let UnusedVariableFact::Assigned {
                    variable,
                    init_statement,
                } = fact
                {
                    let entry = used.entry(*init_statement).or_insert(false);
                    if self.is_used_at(variable, stmt) {
                        *entry = true;
                    }
                }
            }
        }

        let findings = used
            .into_iter()
            .filter(|(_, was_used)| !*was_used)
            .map(|(stmt, _)| {
                Finding::new(UNUSED_VARIABLE_SPACE, self.graph.statement_text(stmt))
            })
            .collect();
        AnalysisReport::new(findings)
    }
}

struct UnusedVariableFlowFunctions {
    graph: Arc<dyn ApplicationGraph>,
    classpath: Arc<dyn Classpath>,
    in_ids: Vec<SpaceId>,
}

impl FlowFunctionsSpace<UnusedVariableFact> for UnusedVariableFlowFunctions {
    fn in_ids(&self) -> &[SpaceId] {
        &self.in_ids
    }

    fn obtain_start_facts(&self, _start: StmtId) -> Result<Vec<UnusedVariableFact>> {
        Ok(Vec::new())
    }

    fn obtain_sequent_flow_function(
        &self,
        current: StmtId,
        _next: StmtId,
    ) -> Result<FlowFunctionInstance<UnusedVariableFact>> {
        let inst = self.graph.instruction(current).cloned();
        Ok(FlowFunctionInstance::new(self.in_ids.clone(), move |fact| {
            sequent_compute(inst.as_ref(), current, fact)
        }))
    }

    fn obtain_call_to_start_flow_function(
        &self,
        call_statement: StmtId,
        callee: MethodId,
    ) -> Result<FlowFunctionInstance<UnusedVariableFact>> {
        let expr = self
            .graph
            .instruction(call_statement)
            .and_then(Instruction::call_expr)
            .ok_or_else(|| {
                AnalysisError::malformed_call_site(
                    self.graph.statement_text(call_statement),
                    "call expression expected",
                )
            })?
            .clone();

        // Formal-parameter paths are synthesized eagerly: an unresolvable
        // parameter type aborts the run instead of dropping facts.
        let mut formal_paths = Vec::new();
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
            formal_paths.push(AccessPath::from_parameter(&param));
        }

        let statically_bound = expr.kind.is_statically_bound();
        let arg_paths: Vec<Option<AccessPath>> =
            expr.args.iter().map(AccessPath::from_value).collect();

        Ok(FlowFunctionInstance::new(self.in_ids.clone(), move |fact| {
            match fact {
                UnusedVariableFact::Zero => {
                    // Unused parameters are not reported for virtual calls:
                    // other dispatch targets may use them.
                    if !statically_bound {
                        return vec![UnusedVariableFact::Zero];
                    }
                    let mut out: Vec<UnusedVariableFact> = formal_paths
                        .iter()
                        .map(|p| UnusedVariableFact::Assigned {
                            variable: p.clone(),
                            init_statement: call_statement,
                        })
                        .collect();
                    out.push(UnusedVariableFact::Zero);
                    out
                }
                UnusedVariableFact::Assigned {
                    variable,
                    init_statement,
                } => formal_paths
                    .iter()
                    .zip(&arg_paths)
                    .filter(|(_, actual)| actual.as_ref() == Some(variable))
                    .map(|(formal, _)| UnusedVariableFact::Assigned {
                        variable: formal.clone(),
                        init_statement: *init_statement,
                    })
                    .collect(),
            }
        }))
    }

    fn obtain_call_to_return_flow_function(
        &self,
        call_statement: StmtId,
        return_site: StmtId,
    ) -> Result<FlowFunctionInstance<UnusedVariableFact>> {
        self.obtain_sequent_flow_function(call_statement, return_site)
    }

    fn obtain_exit_to_return_site_flow_function(
        &self,
        _call_statement: StmtId,
        _return_site: StmtId,
        _exit_statement: StmtId,
    ) -> Result<FlowFunctionInstance<UnusedVariableFact>> {
        // Callee-local facts stay in the callee; only reachability returns.
        Ok(FlowFunctionInstance::zero_only(self.in_ids.clone()))
    }
}

/// Kill/gen for one statement's effect.
///
/// An assignment kills facts about the overwritten path, generates a fresh
/// fact for the written path (from the zero fact), and extends alias chains
/// when the right-hand side carries an existing fact and neither side
/// touches the heap.
fn sequent_compute(
    inst: Option<&Instruction>,
    current: StmtId,
    fact: &UnusedVariableFact,
) -> Vec<UnusedVariableFact> {
    let (lhs, rhs) = match inst {
        Some(Instruction::Assign { lhs, rhs }) => (Some(lhs), Some(rhs)),
        Some(Instruction::Call {
            result: Some(result),
            ..
        }) => (Some(result), None),
        _ => return vec![fact.clone()],
    };
    let Some(lhs) = lhs else {
        return vec![fact.clone()];
    };

    match fact {
        UnusedVariableFact::Zero => match AccessPath::from_value(lhs) {
            // Heap writes are not tracked: reads through aliases would be
            // invisible to this engine.
            Some(to_path) if !to_path.is_on_heap() => vec![
                UnusedVariableFact::Zero,
                UnusedVariableFact::Assigned {
                    variable: to_path,
                    init_statement: current,
                },
            ],
            _ => vec![UnusedVariableFact::Zero],
        },
        UnusedVariableFact::Assigned {
            variable,
            init_statement,
        } => {
            let to_path = AccessPath::from_value(lhs);
            let mut out = if to_path.as_ref() == Some(variable) {
                Vec::new()
            } else {
                vec![fact.clone()]
            };

            let (Some(from_path), Some(to_path)) =
                (rhs.and_then(AccessPath::from_value), to_path)
            else {
                return out;
            };
            if from_path.is_on_heap() || to_path.is_on_heap() {
                return out;
            }
            if &from_path == variable {
                out.push(UnusedVariableFact::Assigned {
                    variable: to_path,
                    init_statement: *init_statement,
                });
            }
            out
        }
    }
}
