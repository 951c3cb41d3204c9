//! Ports: the contracts this engine consumes from excluded subsystems
//! (bytecode loader, storage, type resolution).

mod application_graph;
mod classpath;

pub use application_graph::{ApplicationGraph, ReversedGraph};
pub use classpath::{Classpath, TypeRef};
