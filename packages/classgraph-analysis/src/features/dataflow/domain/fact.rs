//! Fact-domain identity and the domain-fact contract.
//!
//! Every fact is owned by one `SpaceId`. A flow-function space declares the
//! set of spaces it consumes; the engine silently maps foreign facts to the
//! empty set, which is what keeps simultaneously running analyses from
//! cross-talking on a shared supergraph.

use serde::Serialize;
use std::fmt::Debug;
use std::hash::Hash;

/// Identity of one analysis domain.
///
/// Allocated once per analysis as a `const`; no process-wide registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SpaceId(&'static str);

impl SpaceId {
    pub const fn new(value: &'static str) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &'static str {
        self.0
    }
}

/// Space owning the universal zero fact.
pub const ZERO_SPACE: SpaceId = SpaceId::new("zero fact");

/// A dataflow fact.
///
/// Concrete analyses define their own fact shapes and must include the zero
/// variant: "this path through the program is reachable", carrying no
/// analysis payload. Facts are immutable value objects; the solver
/// deduplicates them in path-edge sets, so equality and hashing must be
/// structural.
pub trait DomainFact: Clone + Eq + Hash + Debug + Send + Sync + 'static {
    /// The distinguished reachability fact.
    fn zero() -> Self;

    fn is_zero(&self) -> bool;

    /// The domain that produced this fact; `ZERO_SPACE` for the zero fact.
    fn space_id(&self) -> SpaceId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    enum Fact {
        Zero,
        Mark(u32),
    }

    const MARK_SPACE: SpaceId = SpaceId::new("mark");

    impl DomainFact for Fact {
        fn zero() -> Self {
            Fact::Zero
        }

        fn is_zero(&self) -> bool {
            matches!(self, Fact::Zero)
        }

        fn space_id(&self) -> SpaceId {
            match self {
                Fact::Zero => ZERO_SPACE,
                Fact::Mark(_) => MARK_SPACE,
            }
        }
    }

    #[test]
    fn test_zero_fact_identity() {
        assert!(Fact::zero().is_zero());
        assert_eq!(Fact::zero().space_id(), ZERO_SPACE);
        assert_eq!(Fact::Mark(1).space_id(), MARK_SPACE);
        assert_ne!(ZERO_SPACE, MARK_SPACE);
    }
}
