//! Fragment emission.
//!
//! The start state is carried as an unset `path_tag`; every other state `n`
//! is the tag value `n`. The dead state is numbered after all live states.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use pathq_core::{BucketId, Capture, Field, Policy, Pred, Value};

use super::registry::PathCompiler;
use crate::automaton::{Dfa, QueryId, StateId};
use crate::chargen::{CharGen, Symbol};
use crate::path::AtomKind;
use crate::{CompileError, CompilerConfig, Result};

pub fn tag_value(state: StateId) -> Value {
    if state == StateId::START {
        Value::Unset
    } else {
        Value::Int(u64::from(state.0))
    }
}

/// Packets currently in `state`.
pub fn tag_pred(state: StateId) -> Pred {
    Pred::test(Field::PathTag, tag_value(state))
}

pub(crate) fn check_tag_space(dfa: &Dfa, config: &CompilerConfig) -> Result<()> {
    let max_tag = dfa.len().saturating_sub(1) as u64;
    if max_tag > config.max_tag() {
        return Err(CompileError::TagSpaceExhausted {
            states: dfa.len(),
            bits: config.tag_bits,
        });
    }
    Ok(())
}

/// Everything one pass emits before composition.
#[derive(Clone, Debug)]
pub(crate) struct Fragments {
    pub tagging: Policy,
    pub counting: Policy,
    pub end_path: Policy,
    pub dropping: Policy,
    pub hooks: Policy,
    /// Packets whose forwarding a dropping transition suppresses.
    pub drop_guard: Pred,
}

impl Fragments {
    pub fn empty() -> Self {
        Self {
            tagging: Policy::Identity,
            counting: Policy::Drop,
            end_path: Policy::Drop,
            dropping: Policy::Drop,
            hooks: Policy::Drop,
            drop_guard: Pred::False,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Sink {
    Count,
    EndPath,
    Drop,
}

impl Sink {
    /// Hooks have no sink; the tag-keyed taps in [`hooks`] serve their accepts.
    fn of(kind: AtomKind) -> Option<Sink> {
        match kind {
            AtomKind::Atom => Some(Sink::Count),
            AtomKind::EndPath => Some(Sink::EndPath),
            AtomKind::Drop => Some(Sink::Drop),
            AtomKind::Hook => None,
        }
    }
}

fn symbols_pred(chargen: &CharGen, symbols: &[Symbol]) -> Pred {
    Pred::any(symbols.iter().map(|&sym| chargen.region_pred(sym)))
}

pub(crate) fn emit(dfa: &Dfa, chargen: &CharGen, registry: &PathCompiler) -> Result<Fragments> {
    let mut fragments = Fragments::empty();
    if dfa.states().all(|state| dfa.transitions(state).is_empty()) {
        return Ok(fragments);
    }

    fragments.tagging = tagging(dfa, chargen);

    let mut sinks: BTreeMap<Sink, IndexMap<BucketId, Pred>> = BTreeMap::new();
    for state in dfa.states() {
        for transition in dfa.transitions(state) {
            if transition.accepts.is_empty() {
                continue;
            }
            // One capture per query; the strongest kind wins.
            let mut per_query: BTreeMap<QueryId, Sink> = BTreeMap::new();
            for accept in &transition.accepts {
                let Some(sink) = Sink::of(accept.kind) else {
                    continue;
                };
                let slot = per_query.entry(accept.query).or_insert(sink);
                *slot = (*slot).max(sink);
            }
            let pred = tag_pred(state).and(chargen.region_pred(transition.symbol));
            for (query, sink) in per_query {
                let bucket = registry.queries()[query.0 as usize].bucket;
                let slot = sinks
                    .entry(sink)
                    .or_default()
                    .entry(bucket)
                    .or_insert(Pred::False);
                *slot = slot.or(&pred);
                if sink == Sink::Drop {
                    fragments.drop_guard = fragments.drop_guard.or(&pred);
                }
            }
        }
    }

    for (sink, buckets) in sinks {
        let policy = Policy::par_all(
            buckets
                .into_iter()
                .map(|(bucket, pred)| Policy::filter(pred) >> Policy::capture(bucket)),
        );
        match sink {
            Sink::Count => fragments.counting = policy,
            Sink::EndPath => fragments.end_path = policy,
            Sink::Drop => fragments.dropping = policy,
        }
    }

    fragments.hooks = hooks(dfa, registry)?;
    tracing::debug!(
        states = dfa.len(),
        hooks = dfa.hook_states().len(),
        "emitted fragments"
    );
    Ok(fragments)
}

fn tagging(dfa: &Dfa, chargen: &CharGen) -> Policy {
    let mut rules = Vec::new();
    if let Some(dead) = dfa.dead() {
        rules.push(Policy::filter(tag_pred(dead)));
    }
    for state in dfa.states() {
        let mut by_target: IndexMap<StateId, Vec<Symbol>> = IndexMap::new();
        for transition in dfa.transitions(state) {
            by_target
                .entry(transition.target)
                .or_default()
                .push(transition.symbol);
        }
        for (target, symbols) in by_target {
            let pred = tag_pred(state).and(&symbols_pred(chargen, &symbols));
            rules.push(Policy::filter(pred) >> Policy::Modify(Field::PathTag, tag_value(target)));
        }
    }
    let alphabet = chargen.alphabet();
    rules.push(Policy::filter(!symbols_pred(chargen, &alphabet)));
    Policy::par_all(rules)
}

/// Capture rules for states entered through hooks, keyed by tag only.
fn hooks(dfa: &Dfa, registry: &PathCompiler) -> Result<Policy> {
    let mut grouped: IndexMap<(BucketId, Vec<Field>), Pred> = IndexMap::new();
    for (&atom, states) in dfa.hook_states() {
        let bucket = registry
            .hook_bucket(atom)
            .ok_or(CompileError::UnboundHook(atom))?;
        let fields = registry
            .leaf(atom)
            .map(|leaf| leaf.fields().to_vec())
            .unwrap_or_default();
        let slot = grouped.entry((bucket, fields)).or_insert(Pred::False);
        for &state in states {
            *slot = slot.or(&tag_pred(state));
        }
    }
    Ok(Policy::par_all(grouped.into_iter().map(
        |((bucket, fields), pred)| {
            let capture = if fields.is_empty() {
                Capture::new(bucket)
            } else {
                Capture::projected(bucket, fields)
            };
            Policy::filter(pred) >> Policy::Capture(capture)
        },
    )))
}
