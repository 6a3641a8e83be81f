//! Path-query compiler.
//!
//! This crate turns path queries (regular expressions over per-hop packet
//! predicates) and a forwarding policy into one tagged flow-table program:
//! - `overlap` - set relation between two predicates
//! - `chargen` - disjoint alphabet of symbols covering registered predicates
//! - `path` - atoms and path expressions
//! - `automaton` - Thompson NFA and subset construction
//! - `compile` - tagging and capture fragments, composition
//! - `session` / `service` - owned compilation state and result publishing

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod automaton;
pub mod chargen;
pub mod compile;
mod config;
pub mod dump;
mod invariants;
pub mod overlap;
pub mod path;
mod service;
mod session;

#[cfg(test)]
mod test_utils;

#[cfg(test)]
mod chargen_tests;
#[cfg(test)]
mod overlap_tests;
#[cfg(test)]
mod path_tests;
#[cfg(test)]
mod service_tests;

use pathq_core::{Field, PredError};

pub use chargen::{AtomId, CharGen, ClassId, Symbol, Token};
pub use compile::{CompileStats, CompiledPolicy, PathCompiler, PathQuery};
pub use config::CompilerConfig;
pub use overlap::Overlap;
pub use path::{Atom, AtomKind, Leaf, Path, Regex};
pub use service::PathQueryService;
pub use session::Session;

/// Errors that abort a compilation pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// A predicate without set semantics reached the overlap classifier.
    #[error("invalid operand: {0}")]
    InvalidOperand(#[from] PredError),

    #[error("hook atom {0} has no bucket bound")]
    UnboundHook(AtomId),

    #[error("atom {0} was registered before the character generator was cleared")]
    StaleAtom(AtomId),

    #[error("partition invariant violated: {0}")]
    PartitionInvariant(String),

    #[error("{states} automaton states do not fit in a {bits}-bit tag")]
    TagSpaceExhausted { states: usize, bits: u8 },

    #[error("forwarding policy uses reserved field `{0}`")]
    ReservedField(Field),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for compiler operations.
pub type Result<T> = std::result::Result<T, CompileError>;
