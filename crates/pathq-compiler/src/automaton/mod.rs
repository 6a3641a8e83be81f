//! Automaton construction over the generator's alphabet.
//!
//! `nfa` builds a Thompson NFA from the registered queries in continuation
//! style; `dfa` determinizes it by subset construction.

mod dfa;
mod nfa;

#[cfg(test)]
mod nfa_tests;

pub use dfa::{AcceptRef, Dfa, StateId, Transition};
pub use nfa::{Label, LeafRef, Nfa, NfaNode, QueryId};
