//! The application-graph port.
//!
//! The supergraph is derived lazily over this interface; the engine never
//! sees how bodies were loaded or stored. Implementations may perform slow
//! work (lazy class loading) and must be safe to query from multiple solver
//! workers.

use crate::shared::models::{Instruction, MethodId, Parameter, StmtId};

/// Whole-program view: intraprocedural control edges plus call edges.
pub trait ApplicationGraph: Send + Sync {
    /// Intraprocedural successors of a statement.
    fn successors(&self, stmt: StmtId) -> Vec<StmtId>;

    /// Intraprocedural predecessors of a statement.
    fn predecessors(&self, stmt: StmtId) -> Vec<StmtId>;

    /// Resolvable callees of a call statement. An empty set means an
    /// unresolved (virtual) call, handled via the call-to-return fallback;
    /// it is a legitimate graph shape, not an error.
    fn callees(&self, call: StmtId) -> Vec<MethodId>;

    /// Call statements that can reach this method.
    fn callers(&self, method: MethodId) -> Vec<StmtId>;

    /// Entry statements of a method. Empty for a method with no body; such
    /// a method contributes nothing to the supergraph.
    fn entry_points(&self, method: MethodId) -> Vec<StmtId>;

    /// Exit statements of a method.
    fn exit_points(&self, method: MethodId) -> Vec<StmtId>;

    fn method_of(&self, stmt: StmtId) -> MethodId;

    /// The instruction behind a statement handle.
    fn instruction(&self, stmt: StmtId) -> Option<&Instruction>;

    fn method_name(&self, method: MethodId) -> &str;

    /// Declared formal parameters of a method.
    fn method_parameters(&self, method: MethodId) -> Vec<Parameter>;

    /// All statements of a method, in body order.
    fn statements_of(&self, method: MethodId) -> Vec<StmtId>;

    /// Human-readable reference for one statement, used in findings.
    fn statement_text(&self, stmt: StmtId) -> String {
        match self.instruction(stmt) {
            Some(inst) => format!("{}#{}: {}", self.method_name(stmt.method), stmt.index, inst),
            None => format!("{}#{}", self.method_name(stmt.method), stmt.index),
        }
    }
}

/// Time-reversed view of an application graph, for analyzers that declare a
/// backward dual: successors and predecessors swap, as do entry and exit
/// points. Call edges keep their direction.
pub struct ReversedGraph<'a, G: ApplicationGraph + ?Sized> {
    inner: &'a G,
}

impl<'a, G: ApplicationGraph + ?Sized> ReversedGraph<'a, G> {
    pub fn new(inner: &'a G) -> Self {
        Self { inner }
    }
}

impl<'a, G: ApplicationGraph + ?Sized> ApplicationGraph for ReversedGraph<'a, G> {
    fn successors(&self, stmt: StmtId) -> Vec<StmtId> {
        self.inner.predecessors(stmt)
    }

    fn predecessors(&self, stmt: StmtId) -> Vec<StmtId> {
        self.inner.successors(stmt)
    }

    fn callees(&self, call: StmtId) -> Vec<MethodId> {
        self.inner.callees(call)
    }

    fn callers(&self, method: MethodId) -> Vec<StmtId> {
        self.inner.callers(method)
    }

    fn entry_points(&self, method: MethodId) -> Vec<StmtId> {
        self.inner.exit_points(method)
    }

    fn exit_points(&self, method: MethodId) -> Vec<StmtId> {
        self.inner.entry_points(method)
    }

    fn method_of(&self, stmt: StmtId) -> MethodId {
        self.inner.method_of(stmt)
    }

    fn instruction(&self, stmt: StmtId) -> Option<&Instruction> {
        self.inner.instruction(stmt)
    }

    fn method_name(&self, method: MethodId) -> &str {
        self.inner.method_name(method)
    }

    fn method_parameters(&self, method: MethodId) -> Vec<Parameter> {
        self.inner.method_parameters(method)
    }

    fn statements_of(&self, method: MethodId) -> Vec<StmtId> {
        self.inner.statements_of(method)
    }
}
