//! In-memory implementation of the application-graph and classpath ports.
//!
//! Builder-based: bodies are vectors of instructions with fall-through
//! successor edges, explicit branch edges on top. Statically bound calls
//! resolve by callee name; virtual calls resolve only to explicitly
//! registered targets, so an unregistered virtual call is the unresolved
//! case the engine must handle via call-to-return.

use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

use crate::errors::{AnalysisError, Result};
use crate::features::dataflow::ports::{ApplicationGraph, Classpath, TypeRef};
use crate::shared::models::{Instruction, MethodId, Parameter, StmtId};

/// Classpath backed by a set of known type names.
#[derive(Debug, Default)]
pub struct InMemoryClasspath {
    types: FxHashSet<String>,
}

impl InMemoryClasspath {
    pub fn new(types: impl IntoIterator<Item = String>) -> Self {
        Self {
            types: types.into_iter().collect(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>) {
        self.types.insert(name.into());
    }
}

impl Classpath for InMemoryClasspath {
    fn find_type(&self, name: &str) -> Result<TypeRef> {
        if self.types.contains(name) {
            Ok(TypeRef::new(name))
        } else {
            Err(AnalysisError::unresolved(name, "classpath lookup"))
        }
    }
}

struct MethodData {
    name: String,
    params: Vec<Parameter>,
    body: Vec<Instruction>,
}

/// Builder for [`ProgramGraph`].
pub struct ProgramGraphBuilder {
    methods: Vec<MethodData>,
    extra_edges: Vec<(MethodId, u32, u32)>,
    virtual_targets: FxHashMap<String, Vec<MethodId>>,
    types: FxHashSet<String>,
}

impl ProgramGraphBuilder {
    pub fn new() -> Self {
        Self {
            methods: Vec::new(),
            extra_edges: Vec::new(),
            virtual_targets: FxHashMap::default(),
            types: FxHashSet::default(),
        }
    }

    pub fn add_method(&mut self, name: impl Into<String>) -> MethodId {
        self.add_method_with_params(name, Vec::new())
    }

    /// Declare a method with formal parameters `(name, type name)`.
    /// Parameter types are registered on the classpath as they are declared.
    pub fn add_method_with_params(
        &mut self,
        name: impl Into<String>,
        params: Vec<(&str, &str)>,
    ) -> MethodId {
        let id = MethodId(self.methods.len() as u32);
        let params = params
            .into_iter()
            .enumerate()
            .map(|(index, (pname, tname))| {
                self.types.insert(tname.to_string());
                Parameter {
                    index: index as u32,
                    name: pname.to_string(),
                    type_name: tname.to_string(),
                }
            })
            .collect();
        self.methods.push(MethodData {
            name: name.into(),
            params,
            body: Vec::new(),
        });
        id
    }

    pub fn set_body(&mut self, method: MethodId, body: Vec<Instruction>) -> &mut Self {
        self.methods[method.0 as usize].body = body;
        self
    }

    /// Add a branch edge on top of the fall-through edges.
    pub fn add_edge(&mut self, method: MethodId, from: u32, to: u32) -> &mut Self {
        self.extra_edges.push((method, from, to));
        self
    }

    /// Make a virtual call site with this callee name resolvable.
    pub fn register_virtual_target(&mut self, callee_name: impl Into<String>, target: MethodId) {
        self.virtual_targets
            .entry(callee_name.into())
            .or_default()
            .push(target);
    }

    pub fn register_type(&mut self, name: impl Into<String>) {
        self.types.insert(name.into());
    }

    pub fn build(self) -> ProgramGraph {
        let by_name: FxHashMap<String, MethodId> = self
            .methods
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.clone(), MethodId(i as u32)))
            .collect();

        let mut successors: FxHashMap<StmtId, Vec<StmtId>> = FxHashMap::default();
        let mut predecessors: FxHashMap<StmtId, Vec<StmtId>> = FxHashMap::default();
        let mut add_edge = |succ: &mut FxHashMap<StmtId, Vec<StmtId>>,
                            pred: &mut FxHashMap<StmtId, Vec<StmtId>>,
                            from: StmtId,
                            to: StmtId| {
            let outs = succ.entry(from).or_default();
            if !outs.contains(&to) {
                outs.push(to);
                pred.entry(to).or_default().push(from);
            }
        };

        for (i, m) in self.methods.iter().enumerate() {
            let method = MethodId(i as u32);
            for (idx, inst) in m.body.iter().enumerate() {
                let idx = idx as u32;
                let falls_through = !matches!(inst, Instruction::Return { .. });
                if falls_through && (idx + 1) < m.body.len() as u32 {
                    add_edge(
                        &mut successors,
                        &mut predecessors,
                        StmtId::new(method, idx),
                        StmtId::new(method, idx + 1),
                    );
                }
            }
        }
        for (method, from, to) in &self.extra_edges {
            add_edge(
                &mut successors,
                &mut predecessors,
                StmtId::new(*method, *from),
                StmtId::new(*method, *to),
            );
        }

        let mut callees: FxHashMap<StmtId, Vec<MethodId>> = FxHashMap::default();
        let mut callers: FxHashMap<MethodId, Vec<StmtId>> = FxHashMap::default();
        for (i, m) in self.methods.iter().enumerate() {
            let method = MethodId(i as u32);
            for (idx, inst) in m.body.iter().enumerate() {
                let Some(expr) = inst.call_expr() else {
                    continue;
                };
                let stmt = StmtId::new(method, idx as u32);
                let targets: Vec<MethodId> = if expr.kind.is_statically_bound() {
                    by_name.get(&expr.callee_name).copied().into_iter().collect()
                } else {
                    self.virtual_targets
                        .get(&expr.callee_name)
                        .cloned()
                        .unwrap_or_default()
                };
                for target in &targets {
                    callers.entry(*target).or_default().push(stmt);
                }
                callees.insert(stmt, targets);
            }
        }

        ProgramGraph {
            methods: self.methods,
            successors,
            predecessors,
            callees,
            callers,
            classpath: Arc::new(InMemoryClasspath::new(self.types)),
        }
    }
}

impl Default for ProgramGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable whole-program graph over the shared instruction model.
pub struct ProgramGraph {
    methods: Vec<MethodData>,
    successors: FxHashMap<StmtId, Vec<StmtId>>,
    predecessors: FxHashMap<StmtId, Vec<StmtId>>,
    callees: FxHashMap<StmtId, Vec<MethodId>>,
    callers: FxHashMap<MethodId, Vec<StmtId>>,
    classpath: Arc<InMemoryClasspath>,
}

impl ProgramGraph {
    pub fn builder() -> ProgramGraphBuilder {
        ProgramGraphBuilder::new()
    }

    pub fn classpath(&self) -> Arc<dyn Classpath> {
        self.classpath.clone()
    }

    fn method(&self, id: MethodId) -> &MethodData {
        &self.methods[id.0 as usize]
    }
}

impl ApplicationGraph for ProgramGraph {
    fn successors(&self, stmt: StmtId) -> Vec<StmtId> {
        self.successors.get(&stmt).cloned().unwrap_or_default()
    }

    fn predecessors(&self, stmt: StmtId) -> Vec<StmtId> {
        self.predecessors.get(&stmt).cloned().unwrap_or_default()
    }

    fn callees(&self, call: StmtId) -> Vec<MethodId> {
        self.callees.get(&call).cloned().unwrap_or_default()
    }

    fn callers(&self, method: MethodId) -> Vec<StmtId> {
        self.callers.get(&method).cloned().unwrap_or_default()
    }

    fn entry_points(&self, method: MethodId) -> Vec<StmtId> {
        if self.method(method).body.is_empty() {
            Vec::new()
        } else {
            vec![StmtId::new(method, 0)]
        }
    }

    fn exit_points(&self, method: MethodId) -> Vec<StmtId> {
        let body_len = self.method(method).body.len() as u32;
        (0..body_len)
            .map(|idx| StmtId::new(method, idx))
            .filter(|stmt| {
                self.successors
                    .get(stmt)
                    .map_or(true, |succs| succs.is_empty())
            })
            .collect()
    }

    fn method_of(&self, stmt: StmtId) -> MethodId {
        stmt.method
    }

    fn instruction(&self, stmt: StmtId) -> Option<&Instruction> {
        self.method(stmt.method).body.get(stmt.index as usize)
    }

    fn method_name(&self, method: MethodId) -> &str {
        &self.method(method).name
    }

    fn method_parameters(&self, method: MethodId) -> Vec<Parameter> {
        self.method(method).params.clone()
    }

    fn statements_of(&self, method: MethodId) -> Vec<StmtId> {
        (0..self.method(method).body.len() as u32)
            .map(|idx| StmtId::new(method, idx))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::dataflow::ports::ReversedGraph;
    use crate::shared::models::{CallExpr, CallKind, Value};

    fn call(kind: CallKind, name: &str, args: Vec<Value>) -> Instruction {
        Instruction::Call {
            result: None,
            expr: CallExpr {
                kind,
                callee_name: name.to_string(),
                receiver: None,
                args,
            },
        }
    }

    #[test]
    fn test_fall_through_and_return_edges() {
        let mut b = ProgramGraph::builder();
        let m = b.add_method("main");
        b.set_body(
            m,
            vec![
                Instruction::Nop,
                Instruction::Nop,
                Instruction::Return { value: None },
            ],
        );
        let g = b.build();

        assert_eq!(g.successors(StmtId::new(m, 0)), vec![StmtId::new(m, 1)]);
        assert_eq!(g.successors(StmtId::new(m, 2)), Vec::<StmtId>::new());
        assert_eq!(g.entry_points(m), vec![StmtId::new(m, 0)]);
        assert_eq!(g.exit_points(m), vec![StmtId::new(m, 2)]);
    }

    #[test]
    fn test_static_call_resolves_by_name() {
        let mut b = ProgramGraph::builder();
        let main = b.add_method("main");
        let helper = b.add_method("helper");
        b.set_body(main, vec![call(CallKind::Static, "helper", vec![])]);
        b.set_body(helper, vec![Instruction::Return { value: None }]);
        let g = b.build();

        let site = StmtId::new(main, 0);
        assert_eq!(g.callees(site), vec![helper]);
        assert_eq!(g.callers(helper), vec![site]);
    }

    #[test]
    fn test_virtual_call_unresolved_without_registration() {
        let mut b = ProgramGraph::builder();
        let main = b.add_method("main");
        b.add_method("toString");
        b.set_body(main, vec![call(CallKind::Virtual, "toString", vec![])]);
        let g = b.build();

        assert!(g.callees(StmtId::new(main, 0)).is_empty());
    }

    #[test]
    fn test_bodyless_method_contributes_nothing() {
        let mut b = ProgramGraph::builder();
        let m = b.add_method("native");
        let g = b.build();
        assert!(g.entry_points(m).is_empty());
        assert!(g.statements_of(m).is_empty());
    }

    #[test]
    fn test_classpath_resolution() {
        let mut b = ProgramGraph::builder();
        b.add_method_with_params("f", vec![("p", "java.lang.String")]);
        let g = b.build();
        assert!(g.classpath().find_type("java.lang.String").is_ok());
        assert!(g.classpath().find_type("com.example.Missing").is_err());
    }

    #[test]
    fn test_reversed_graph_swaps_directions() {
        let mut b = ProgramGraph::builder();
        let m = b.add_method("main");
        b.set_body(
            m,
            vec![Instruction::Nop, Instruction::Return { value: None }],
        );
        let g = b.build();
        let rev = ReversedGraph::new(&g);

        assert_eq!(rev.successors(StmtId::new(m, 1)), vec![StmtId::new(m, 0)]);
        assert_eq!(rev.entry_points(m), g.exit_points(m));
        assert_eq!(rev.exit_points(m), g.entry_points(m));
    }
}
