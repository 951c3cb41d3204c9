//! The classpath port: type-name resolution.

use crate::errors::Result;

/// A resolved type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub name: String,
}

impl TypeRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Resolves a type name to a concrete type or fails with
/// `AnalysisError::UnresolvedReference`. Used when synthesizing
/// formal-parameter access paths during call-to-start construction.
pub trait Classpath: Send + Sync {
    fn find_type(&self, name: &str) -> Result<TypeRef>;
}
