//! Subset construction.
//!
//! States are numbered in breadth-first discovery order over the sorted
//! alphabet, with the start state first. The empty subset becomes the dead
//! state and is numbered after every live state. The dead state has no
//! outgoing transitions.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use indexmap::IndexSet;

use super::nfa::{Label, Nfa, NfaNode, QueryId};
use crate::chargen::{AtomId, Symbol};
use crate::invariants;
use crate::path::AtomKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub u32);

impl StateId {
    pub const START: StateId = StateId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A leaf whose query accepts right after it consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AcceptRef {
    pub query: QueryId,
    pub atom: AtomId,
    pub kind: AtomKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub symbol: Symbol,
    pub target: StateId,
    pub accepts: Vec<AcceptRef>,
}

#[derive(Clone, Debug)]
pub struct Dfa {
    /// Outgoing transitions of each live state, in alphabet order.
    transitions: Vec<Vec<Transition>>,
    dead: Option<StateId>,
    /// States entered through each hook leaf.
    hook_states: BTreeMap<AtomId, BTreeSet<StateId>>,
}

type Subset = BTreeSet<Label>;

impl Dfa {
    pub fn build(nfa: &Nfa, alphabet: &[Symbol]) -> Dfa {
        let mut subsets: IndexSet<Subset> = IndexSet::new();
        let start = significant(nfa, nfa.closure([nfa.start()]));
        subsets.insert(start);

        // Targets are subset indices; `None` is the dead state.
        let mut raw: Vec<Vec<(Symbol, Option<usize>, Vec<AcceptRef>)>> = Vec::new();
        let mut idx = 0;
        while idx < subsets.len() {
            let current = subsets[idx].clone();
            let mut row = Vec::new();
            if !current.is_empty() {
                for &symbol in alphabet {
                    let (next, accepts) = step(nfa, &current, symbol);
                    let target = if next.is_empty() {
                        None
                    } else {
                        Some(subsets.insert_full(next).0)
                    };
                    row.push((symbol, target, accepts));
                }
            }
            raw.push(row);
            idx += 1;
        }

        let live = subsets.len();
        let needs_dead = raw.iter().flatten().any(|(_, target, _)| target.is_none());
        let dead = needs_dead.then_some(StateId(live as u32));

        let transitions = raw
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|(symbol, target, accepts)| Transition {
                        symbol,
                        target: match target {
                            Some(i) => StateId(i as u32),
                            None => dead.unwrap_or_else(|| invariants::unreachable_dead_target()),
                        },
                        accepts,
                    })
                    .collect()
            })
            .collect();

        let mut hook_states: BTreeMap<AtomId, BTreeSet<StateId>> = BTreeMap::new();
        for (i, subset) in subsets.iter().enumerate() {
            for &label in subset {
                if let Some(atom) = nfa.hook_at(label) {
                    hook_states.entry(atom).or_default().insert(StateId(i as u32));
                }
            }
        }

        tracing::debug!(
            nfa_nodes = nfa.len(),
            live_states = live,
            dead = dead.is_some(),
            "determinized"
        );

        Dfa {
            transitions,
            dead,
            hook_states,
        }
    }

    /// Live states, start first.
    pub fn states(&self) -> impl Iterator<Item = StateId> + '_ {
        (0..self.transitions.len() as u32).map(StateId)
    }

    pub fn live_len(&self) -> usize {
        self.transitions.len()
    }

    /// Live states plus the dead state, if any.
    pub fn len(&self) -> usize {
        self.transitions.len() + usize::from(self.dead.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dead(&self) -> Option<StateId> {
        self.dead
    }

    pub fn transitions(&self, state: StateId) -> &[Transition] {
        self.transitions
            .get(state.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Target of `state` on `symbol`.
    pub fn next(&self, state: StateId, symbol: Symbol) -> Option<StateId> {
        self.transitions(state)
            .iter()
            .find(|t| t.symbol == symbol)
            .map(|t| t.target)
    }

    pub fn hook_states(&self) -> &BTreeMap<AtomId, BTreeSet<StateId>> {
        &self.hook_states
    }
}

fn significant(nfa: &Nfa, closure: Subset) -> Subset {
    closure
        .into_iter()
        .filter(|&label| nfa.is_significant(label))
        .collect()
}

/// Subset reached from `current` on `symbol`, and the leaves whose query
/// accepts on the way.
fn step(nfa: &Nfa, current: &Subset, symbol: Symbol) -> (Subset, Vec<AcceptRef>) {
    let mut targets = Vec::new();
    let mut accepts = BTreeSet::new();
    for &label in current {
        let NfaNode::Consume {
            leaf,
            symbols,
            next,
        } = nfa.node(label)
        else {
            continue;
        };
        if !symbols.contains(&symbol) {
            continue;
        }
        targets.push(*next);
        let reached = nfa.closure([*next]);
        if nfa
            .accept_of(leaf.query)
            .is_some_and(|accept| reached.contains(&accept))
        {
            accepts.insert(AcceptRef {
                query: leaf.query,
                atom: leaf.atom,
                kind: leaf.kind,
            });
        }
    }
    (
        significant(nfa, nfa.closure(targets)),
        accepts.into_iter().collect(),
    )
}
