//! Thompson NFA over symbol sets.
//!
//! Each expression is compiled toward an exit label and returns its entry
//! label. Concatenation chains exits, alternation joins branches with a
//! `Split`, and closure emits a `Split` at a pre-allocated loop label that the
//! body exits into.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::chargen::{AtomId, CharGen, Symbol};
use crate::invariants;
use crate::path::{AtomKind, Node, Path};

/// Symbolic NFA node address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub u32);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Position of a query in the compiled query list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryId(pub u32);

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

/// The leaf a consuming node was built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeafRef {
    pub atom: AtomId,
    pub kind: AtomKind,
    pub query: QueryId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NfaNode {
    /// Epsilon branch to every successor.
    Split(Vec<Label>),
    /// Consume one symbol from the set and continue at `next`.
    Consume {
        leaf: LeafRef,
        symbols: BTreeSet<Symbol>,
        next: Label,
    },
    Accept(QueryId),
}

#[derive(Clone, Debug)]
pub struct Nfa {
    nodes: BTreeMap<Label, NfaNode>,
    start: Label,
    accepts: BTreeMap<QueryId, Label>,
    /// Landing node of each hook leaf; states holding it were entered
    /// through the hook.
    hook_landings: BTreeMap<Label, AtomId>,
}

impl Nfa {
    /// Build one NFA for all queries. The start node branches to every
    /// query's entry; each query ends in its own accept node.
    pub fn build<'a, I>(queries: I, chargen: &CharGen) -> Nfa
    where
        I: IntoIterator<Item = (QueryId, &'a Path)>,
    {
        let mut builder = NfaBuilder {
            chargen,
            nodes: BTreeMap::new(),
            next_label_id: 0,
            accepts: BTreeMap::new(),
            hook_landings: BTreeMap::new(),
        };

        let mut entries = Vec::new();
        for (query, path) in queries {
            let accept = builder.push(NfaNode::Accept(query));
            builder.accepts.insert(query, accept);
            entries.push(builder.compile(path, query, accept));
        }
        let start = builder.push(NfaNode::Split(entries));

        Nfa {
            nodes: builder.nodes,
            start,
            accepts: builder.accepts,
            hook_landings: builder.hook_landings,
        }
    }

    pub fn start(&self) -> Label {
        self.start
    }

    pub fn node(&self, label: Label) -> &NfaNode {
        invariants::ensure_label(self.nodes.get(&label), label)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn accept_of(&self, query: QueryId) -> Option<Label> {
        self.accepts.get(&query).copied()
    }

    pub fn hook_at(&self, label: Label) -> Option<AtomId> {
        self.hook_landings.get(&label).copied()
    }

    /// Every node reachable from `from` through `Split` edges, `from`
    /// included.
    pub fn closure<I>(&self, from: I) -> BTreeSet<Label>
    where
        I: IntoIterator<Item = Label>,
    {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<Label> = from.into_iter().collect();
        while let Some(label) = stack.pop() {
            if !seen.insert(label) {
                continue;
            }
            if let NfaNode::Split(succs) = self.node(label) {
                stack.extend(succs.iter().copied());
            }
        }
        seen
    }

    /// Whether `label` distinguishes automaton states: consuming nodes,
    /// accepts and hook landings.
    pub fn is_significant(&self, label: Label) -> bool {
        match self.node(label) {
            NfaNode::Split(_) => self.hook_landings.contains_key(&label),
            NfaNode::Consume { .. } | NfaNode::Accept(_) => true,
        }
    }
}

struct NfaBuilder<'a> {
    chargen: &'a CharGen,
    nodes: BTreeMap<Label, NfaNode>,
    next_label_id: u32,
    accepts: BTreeMap<QueryId, Label>,
    hook_landings: BTreeMap<Label, AtomId>,
}

impl NfaBuilder<'_> {
    fn fresh_label(&mut self) -> Label {
        let l = Label(self.next_label_id);
        self.next_label_id += 1;
        l
    }

    fn emit(&mut self, label: Label, node: NfaNode) {
        self.nodes.insert(label, node);
    }

    fn push(&mut self, node: NfaNode) -> Label {
        let label = self.fresh_label();
        self.emit(label, node);
        label
    }

    fn compile(&mut self, path: &Path, query: QueryId, exit: Label) -> Label {
        match path.node() {
            Node::Leaf(leaf) => {
                let next = if leaf.kind() == AtomKind::Hook {
                    let landing = self.push(NfaNode::Split(vec![exit]));
                    self.hook_landings.insert(landing, leaf.id());
                    landing
                } else {
                    exit
                };
                self.push(NfaNode::Consume {
                    leaf: LeafRef {
                        atom: leaf.id(),
                        kind: leaf.kind(),
                        query,
                    },
                    symbols: self.chargen.cover(leaf.class()).clone(),
                    next,
                })
            }
            Node::Concat(first, second) => {
                let second_entry = self.compile(second, query, exit);
                self.compile(first, query, second_entry)
            }
            Node::Alt(left, right) => {
                let left_entry = self.compile(left, query, exit);
                let right_entry = self.compile(right, query, exit);
                self.push(NfaNode::Split(vec![left_entry, right_entry]))
            }
            Node::Star(body) => {
                // loop_entry → [body, exit]; the body exits back into loop_entry
                let loop_entry = self.fresh_label();
                let body_entry = self.compile(body, query, loop_entry);
                self.emit(loop_entry, NfaNode::Split(vec![body_entry, exit]));
                loop_entry
            }
        }
    }
}
