//! Core value model shared across features.
//!
//! Statements are opaque `StmtId` handles; the instruction payload behind a
//! handle is only reachable through the application graph port.

mod instruction;

pub use instruction::{
    CallExpr, CallKind, Constant, Instruction, MethodId, Parameter, StmtId, Value,
};
