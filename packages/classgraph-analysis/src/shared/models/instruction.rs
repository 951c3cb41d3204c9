//! Three-address instruction model.
//!
//! This is the shape a bytecode loader would hand us: one instruction per
//! statement, values restricted to locals, arguments, `this`, constants and
//! field chains. Loading itself is out of scope; the in-memory program graph
//! serves instances of this model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one method in the analyzed universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodId(pub u32);

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// Opaque handle to one instruction in one method's control-flow graph.
///
/// Equality and ordering are positional; the supergraph is built over these
/// handles, never over instruction payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StmtId {
    pub method: MethodId,
    pub index: u32,
}

impl StmtId {
    pub fn new(method: MethodId, index: u32) -> Self {
        Self { method, index }
    }
}

impl fmt::Display for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.method, self.index)
    }
}

/// A formal parameter as declared by a method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    pub index: u32,
    pub name: String,
    pub type_name: String,
}

/// Constant operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constant {
    Int(i64),
    Str(String),
    Null,
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(v) => write!(f, "{v}"),
            Constant::Str(s) => write!(f, "{s:?}"),
            Constant::Null => write!(f, "null"),
        }
    }
}

/// An addressable or constant program value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Local { index: u32, name: String },
    Argument { index: u32, name: String },
    This,
    Const(Constant),
    FieldAccess { base: Box<Value>, field: String },
    StaticField { class_name: String, field: String },
}

impl Value {
    pub fn local(index: u32, name: impl Into<String>) -> Self {
        Value::Local {
            index,
            name: name.into(),
        }
    }

    pub fn argument(index: u32, name: impl Into<String>) -> Self {
        Value::Argument {
            index,
            name: name.into(),
        }
    }

    pub fn int(value: i64) -> Self {
        Value::Const(Constant::Int(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Value::Const(Constant::Str(value.into()))
    }

    pub fn field(base: Value, field: impl Into<String>) -> Self {
        Value::FieldAccess {
            base: Box::new(base),
            field: field.into(),
        }
    }

    pub fn static_field(class_name: impl Into<String>, field: impl Into<String>) -> Self {
        Value::StaticField {
            class_name: class_name.into(),
            field: field.into(),
        }
    }

    /// This value plus every nested base value, outermost first.
    pub fn flatten(&self) -> Vec<&Value> {
        let mut out = vec![self];
        let mut cur = self;
        while let Value::FieldAccess { base, .. } = cur {
            out.push(base);
            cur = base;
        }
        out
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Local { name, .. } => write!(f, "{name}"),
            Value::Argument { name, .. } => write!(f, "{name}"),
            Value::This => write!(f, "this"),
            Value::Const(c) => write!(f, "{c}"),
            Value::FieldAccess { base, field } => write!(f, "{base}.{field}"),
            Value::StaticField { class_name, field } => write!(f, "{class_name}.{field}"),
        }
    }
}

/// How a call site dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallKind {
    /// Statically bound (e.g. `invokestatic`).
    Static,
    /// Constructor / private / super call (`invokespecial`).
    Special,
    /// Virtually dispatched; targets are not enumerable in general.
    Virtual,
}

impl CallKind {
    /// True for call sites whose single target is known from the bytecode.
    pub fn is_statically_bound(&self) -> bool {
        matches!(self, CallKind::Static | CallKind::Special)
    }
}

/// A call expression inside a call instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallExpr {
    pub kind: CallKind,
    pub callee_name: String,
    pub receiver: Option<Value>,
    pub args: Vec<Value>,
}

impl CallExpr {
    /// All operand values of the call, receivers and arguments, with nested
    /// bases included.
    pub fn values(&self) -> Vec<&Value> {
        let mut out = Vec::new();
        if let Some(recv) = &self.receiver {
            out.extend(recv.flatten());
        }
        for arg in &self.args {
            out.extend(arg.flatten());
        }
        out
    }
}

impl fmt::Display for CallExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(recv) = &self.receiver {
            write!(f, "{recv}.")?;
        }
        write!(f, "{}(", self.callee_name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{arg}")?;
        }
        write!(f, ")")
    }
}

/// One instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instruction {
    /// `lhs = rhs`
    Assign { lhs: Value, rhs: Value },
    /// `result = expr(...)` or a bare call when `result` is `None`
    Call {
        result: Option<Value>,
        expr: CallExpr,
    },
    /// `return value`
    Return { value: Option<Value> },
    Nop,
}

impl Instruction {
    /// The call expression of this instruction, if it is a call site.
    pub fn call_expr(&self) -> Option<&CallExpr> {
        match self {
            Instruction::Call { expr, .. } => Some(expr),
            _ => None,
        }
    }

    /// The value written by this instruction, if any.
    pub fn def(&self) -> Option<&Value> {
        match self {
            Instruction::Assign { lhs, .. } => Some(lhs),
            Instruction::Call { result, .. } => result.as_ref(),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Assign { lhs, rhs } => write!(f, "{lhs} = {rhs}"),
            Instruction::Call {
                result: Some(r),
                expr,
            } => write!(f, "{r} = {expr}"),
            Instruction::Call { result: None, expr } => write!(f, "{expr}"),
            Instruction::Return { value: Some(v) } => write!(f, "return {v}"),
            Instruction::Return { value: None } => write!(f, "return"),
            Instruction::Nop => write!(f, "nop"),
        }
    }
}
