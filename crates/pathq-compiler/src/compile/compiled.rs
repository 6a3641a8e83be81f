//! The published result of a compilation pass.

use pathq_core::{Classifier, Policy, Pred};

use super::emit::Fragments;
use crate::chargen::Symbol;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct CompileStats {
    pub queries: usize,
    pub symbols: usize,
    /// Automaton states, dead state included.
    pub states: usize,
    pub max_tag: u64,
}

/// Fragments of one pass and their composition with the forwarding policy.
///
/// The composed policy is
/// `(¬drop_guard >> tagging >> forwarding) + counting + end_path + dropping`.
/// Hooks stay separate and run on the re-tagged packet, see
/// [`CompiledPolicy::hook_policy`].
#[derive(Clone, Debug)]
pub struct CompiledPolicy {
    tagging: Policy,
    counting: Policy,
    end_path: Policy,
    dropping: Policy,
    hooks: Policy,
    drop_guard: Pred,
    forwarding: Policy,
    policy: Policy,
    symbols: Vec<(Symbol, Pred)>,
    queries: Vec<String>,
    stats: CompileStats,
}

impl CompiledPolicy {
    /// No queries: forwarding alone.
    pub fn passthrough(forwarding: Policy) -> Self {
        let stats = CompileStats {
            states: 1,
            ..CompileStats::default()
        };
        Self::compose(Fragments::empty(), forwarding, Vec::new(), Vec::new(), stats)
    }

    pub(crate) fn compose(
        fragments: Fragments,
        forwarding: Policy,
        symbols: Vec<(Symbol, Pred)>,
        queries: Vec<String>,
        stats: CompileStats,
    ) -> Self {
        let guard = Policy::filter(!fragments.drop_guard.clone());
        let policy = (guard >> fragments.tagging.clone() >> forwarding.clone())
            + fragments.counting.clone()
            + fragments.end_path.clone()
            + fragments.dropping.clone();
        Self {
            tagging: fragments.tagging,
            counting: fragments.counting,
            end_path: fragments.end_path,
            dropping: fragments.dropping,
            hooks: fragments.hooks,
            drop_guard: fragments.drop_guard,
            forwarding,
            policy,
            symbols,
            queries,
            stats,
        }
    }

    pub fn tagging(&self) -> &Policy {
        &self.tagging
    }

    pub fn counting(&self) -> &Policy {
        &self.counting
    }

    pub fn end_path(&self) -> &Policy {
        &self.end_path
    }

    pub fn dropping(&self) -> &Policy {
        &self.dropping
    }

    pub fn hooks(&self) -> &Policy {
        &self.hooks
    }

    pub fn drop_guard(&self) -> &Pred {
        &self.drop_guard
    }

    pub fn forwarding(&self) -> &Policy {
        &self.forwarding
    }

    /// The composed network policy.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Hook taps applied after re-tagging.
    pub fn hook_policy(&self) -> Policy {
        self.tagging.clone() >> self.hooks.clone()
    }

    /// The composed policy as a rule table.
    pub fn classifier(&self) -> Classifier {
        self.policy.compile()
    }

    /// Symbols of the alphabet the pass was compiled against.
    pub fn symbols(&self) -> &[(Symbol, Pred)] {
        &self.symbols
    }

    /// Rendered query expressions, in query order.
    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    pub fn stats(&self) -> CompileStats {
        self.stats
    }
}
