//! Invariant checks excluded from coverage reports.

#![cfg_attr(coverage_nightly, coverage(off))]

use crate::automaton::Label;
use crate::chargen::{ClassId, Symbol};

pub(crate) fn ensure_class<T>(found: Option<T>, class: ClassId) -> T {
    found.unwrap_or_else(|| {
        panic!("CharGen: class {class} not found (class handles come from this generator)")
    })
}

pub(crate) fn ensure_symbol<T>(found: Option<T>, sym: Symbol) -> T {
    found.unwrap_or_else(|| {
        panic!("CharGen: symbol {sym} not found (symbols are never removed before clear)")
    })
}

pub(crate) fn ensure_label<T>(found: Option<T>, label: Label) -> T {
    found.unwrap_or_else(|| panic!("Nfa: label {label} has no node (every label is emitted)"))
}

pub(crate) fn unreachable_dead_target() -> ! {
    panic!("Dfa: transition into the dead state without a dead state")
}
