//! Access paths: the unit of fact tracking.
//!
//! An access path is a base variable plus an ordered field-accessor chain.
//! Equality is structural; two paths are equal iff they share the base and
//! the exact accessor sequence.

use crate::shared::models::{Parameter, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Root of an access path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PathBase {
    This,
    Local { index: u32, name: String },
    Argument { index: u32, name: String },
    Static { class_name: String },
}

/// A syntactic address: base variable plus field-accessor chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccessPath {
    base: PathBase,
    accessors: Vec<String>,
}

impl AccessPath {
    pub fn new(base: PathBase, accessors: Vec<String>) -> Self {
        Self { base, accessors }
    }

    pub fn from_base(base: PathBase) -> Self {
        Self {
            base,
            accessors: Vec::new(),
        }
    }

    /// Access path of a callee's formal parameter.
    pub fn from_parameter(param: &Parameter) -> Self {
        Self::from_base(PathBase::Argument {
            index: param.index,
            name: param.name.clone(),
        })
    }

    /// Convert a program value to an access path, or `None` for values with
    /// no stable syntactic address (constants, call results).
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Local { index, name } => Some(Self::from_base(PathBase::Local {
                index: *index,
                name: name.clone(),
            })),
            Value::Argument { index, name } => Some(Self::from_base(PathBase::Argument {
                index: *index,
                name: name.clone(),
            })),
            Value::This => Some(Self::from_base(PathBase::This)),
            Value::Const(_) => None,
            Value::FieldAccess { base, field } => {
                let mut path = Self::from_value(base)?;
                path.accessors.push(field.clone());
                Some(path)
            }
            Value::StaticField { class_name, field } => Some(Self::new(
                PathBase::Static {
                    class_name: class_name.clone(),
                },
                vec![field.clone()],
            )),
        }
    }

    pub fn base(&self) -> &PathBase {
        &self.base
    }

    pub fn accessors(&self) -> &[String] {
        &self.accessors
    }

    /// True iff the path traverses at least one field accessor or is rooted
    /// in heap-reachable state. Analyses stop propagating across heap paths:
    /// heap aliasing is not tracked by this engine.
    pub fn is_on_heap(&self) -> bool {
        !self.accessors.is_empty() || matches!(self.base, PathBase::Static { .. })
    }

    /// Index of the argument this path is rooted in, if any.
    pub fn argument_index(&self) -> Option<u32> {
        match self.base {
            PathBase::Argument { index, .. } => Some(index),
            _ => None,
        }
    }

    /// True iff `prefix` is this path or one of its ancestors.
    pub fn has_prefix(&self, prefix: &AccessPath) -> bool {
        self.base == prefix.base && self.accessors.starts_with(&prefix.accessors)
    }

    /// Replace the `from` prefix of this path with `onto`, or `None` when
    /// `from` is not a prefix. Used to carry a fact across a call boundary
    /// between an actual argument and its formal parameter.
    pub fn rebase(&self, from: &AccessPath, onto: &AccessPath) -> Option<AccessPath> {
        if !self.has_prefix(from) {
            return None;
        }
        let mut accessors = onto.accessors.clone();
        accessors.extend(self.accessors[from.accessors.len()..].iter().cloned());
        Some(AccessPath::new(onto.base.clone(), accessors))
    }
}

impl fmt::Display for AccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.base {
            PathBase::This => write!(f, "this")?,
            PathBase::Local { name, .. } => write!(f, "{name}")?,
            PathBase::Argument { name, .. } => write!(f, "{name}")?,
            PathBase::Static { class_name } => write!(f, "{class_name}")?,
        }
        for acc in &self.accessors {
            write!(f, ".{acc}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_structural_equality() {
        let a = AccessPath::from_value(&Value::field(Value::local(0, "o"), "f")).unwrap();
        let b = AccessPath::from_value(&Value::field(Value::local(0, "o"), "f")).unwrap();
        let c = AccessPath::from_value(&Value::field(Value::local(0, "o"), "g")).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_no_path_for_constants() {
        assert!(AccessPath::from_value(&Value::int(5)).is_none());
        assert!(
            AccessPath::from_value(&Value::field(Value::int(1), "f")).is_none(),
            "field of a constant has no stable address"
        );
    }

    #[test]
    fn test_heap_classification() {
        let local = AccessPath::from_value(&Value::local(0, "x")).unwrap();
        let field = AccessPath::from_value(&Value::field(Value::local(0, "o"), "f")).unwrap();
        let stat = AccessPath::from_value(&Value::static_field("C", "F")).unwrap();
        assert!(!local.is_on_heap());
        assert!(field.is_on_heap());
        assert!(stat.is_on_heap());
    }

    #[test]
    fn test_rebase_keeps_accessor_order() {
        let formal_root = AccessPath::from_value(&Value::argument(0, "p")).unwrap();
        let tracked = AccessPath::from_value(&Value::field(Value::argument(0, "p"), "f")).unwrap();
        let actual = AccessPath::from_value(&Value::field(Value::local(2, "o"), "box")).unwrap();
        let rebased = tracked.rebase(&formal_root, &actual).unwrap();
        assert_eq!(rebased.accessors(), &["box".to_string(), "f".to_string()]);
        assert_eq!(rebased.to_string(), "o.box.f");

        let unrelated = AccessPath::from_value(&Value::local(5, "z")).unwrap();
        assert!(tracked.rebase(&unrelated, &actual).is_none());
    }

    proptest! {
        /// Heap classification is a pure function of the path's structure.
        #[test]
        fn prop_heap_stable_under_clone(
            idx in 0u32..8,
            fields in proptest::collection::vec("[a-z]{1,6}", 0..4),
        ) {
            let mut value = Value::local(idx, format!("v{idx}"));
            for f in &fields {
                value = Value::field(value, f.clone());
            }
            let path = AccessPath::from_value(&value).unwrap();
            prop_assert_eq!(path.is_on_heap(), !fields.is_empty());
            prop_assert_eq!(path.clone(), path);
        }
    }
}
