//! Atoms and path expressions.
//!
//! An [`Atom`] is an unregistered single-hop match. Registering it through a
//! [`crate::Session`] yields a [`Path`] leaf bound to the session's character
//! generator. Paths combine with `^` (concatenation), `|` (alternation) and
//! [`Path::star`].
//!
//! Paths have no `PartialEq`. Two questions are kept apart:
//! [`Path::same_structure`] asks whether two paths denote the same sequence of
//! symbol sets, and [`Path::same_atoms`] asks whether they were built from the
//! same atom instances.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not, Sub};
use std::sync::Arc;

use pathq_core::{Field, Pred};

use crate::chargen::{AtomId, CharGen, ClassId, Symbol, Token};

/// What an atom does when a path reaches it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AtomKind {
    /// Pass-through hop; counts when it ends a query.
    Atom,
    /// Intermediate tap with a field projection.
    Hook,
    /// Terminal match; captures, forwarding continues.
    EndPath,
    /// Terminal match; captures and suppresses forwarding.
    Drop,
}

impl AtomKind {
    pub fn name(self) -> &'static str {
        match self {
            AtomKind::Atom => "atom",
            AtomKind::Hook => "hook",
            AtomKind::EndPath => "end_path",
            AtomKind::Drop => "drop_atom",
        }
    }
}

impl fmt::Display for AtomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single-hop match that has not been registered yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Atom {
    kind: AtomKind,
    pred: Pred,
    fields: Vec<Field>,
}

impl Atom {
    pub fn new(pred: Pred) -> Self {
        Self {
            kind: AtomKind::Atom,
            pred,
            fields: Vec::new(),
        }
    }

    pub fn hook(pred: Pred, fields: impl IntoIterator<Item = Field>) -> Self {
        Self {
            kind: AtomKind::Hook,
            pred,
            fields: fields.into_iter().collect(),
        }
    }

    pub fn end_path(pred: Pred) -> Self {
        Self {
            kind: AtomKind::EndPath,
            pred,
            fields: Vec::new(),
        }
    }

    pub fn drop(pred: Pred) -> Self {
        Self {
            kind: AtomKind::Drop,
            pred,
            fields: Vec::new(),
        }
    }

    pub fn kind(&self) -> AtomKind {
        self.kind
    }

    pub fn pred(&self) -> &Pred {
        &self.pred
    }

    /// Fields a hook exposes to its bucket.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    fn with_pred(self, pred: Pred) -> Self {
        Self { pred, ..self }
    }
}

impl BitAnd for Atom {
    type Output = Atom;

    fn bitand(self, rhs: Atom) -> Atom {
        let pred = self.pred.and(&rhs.pred);
        self.with_pred(pred)
    }
}

impl BitOr for Atom {
    type Output = Atom;

    fn bitor(self, rhs: Atom) -> Atom {
        let pred = self.pred.or(&rhs.pred);
        self.with_pred(pred)
    }
}

impl Sub for Atom {
    type Output = Atom;

    fn sub(self, rhs: Atom) -> Atom {
        let pred = self.pred.minus(&rhs.pred);
        self.with_pred(pred)
    }
}

impl Not for Atom {
    type Output = Atom;

    fn not(self) -> Atom {
        let pred = Pred::not(&self.pred);
        self.with_pred(pred)
    }
}

/// A registered atom instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Leaf {
    pub(crate) id: AtomId,
    pub(crate) kind: AtomKind,
    pub(crate) pred: Pred,
    pub(crate) fields: Vec<Field>,
    pub(crate) token: Token,
    pub(crate) class: ClassId,
    pub(crate) epoch: u64,
}

impl Leaf {
    pub fn id(&self) -> AtomId {
        self.id
    }

    pub fn kind(&self) -> AtomKind {
        self.kind
    }

    pub fn pred(&self) -> &Pred {
        &self.pred
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn token(&self) -> Token {
        self.token
    }

    pub fn class(&self) -> ClassId {
        self.class
    }

    /// Generator epoch the leaf was registered in.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

#[derive(Debug)]
pub enum Node {
    Leaf(Leaf),
    Concat(Path, Path),
    Alt(Path, Path),
    Star(Path),
}

/// An immutable, cheaply cloned path expression.
#[derive(Clone, Debug)]
pub struct Path(Arc<Node>);

impl Path {
    pub(crate) fn leaf(leaf: Leaf) -> Path {
        Path(Arc::new(Node::Leaf(leaf)))
    }

    pub fn node(&self) -> &Node {
        &self.0
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self.node() {
            Node::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub fn concat(&self, next: &Path) -> Path {
        Path(Arc::new(Node::Concat(self.clone(), next.clone())))
    }

    pub fn alt(&self, other: &Path) -> Path {
        Path(Arc::new(Node::Alt(self.clone(), other.clone())))
    }

    /// Kleene closure. Closing a closed path returns it unchanged.
    pub fn star(&self) -> Path {
        match self.node() {
            Node::Star(_) => self.clone(),
            _ => Path(Arc::new(Node::Star(self.clone()))),
        }
    }

    /// Leaves in left-to-right order.
    pub fn leaves(&self) -> Vec<&Leaf> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Leaf>) {
        match self.node() {
            Node::Leaf(leaf) => out.push(leaf),
            Node::Concat(l, r) | Node::Alt(l, r) => {
                l.collect_leaves(out);
                r.collect_leaves(out);
            }
            Node::Star(inner) => inner.collect_leaves(out),
        }
    }

    /// Same symbol-set sequence under the generator's current partition.
    ///
    /// Paths holding leaves from another generator or an earlier epoch are
    /// never the same structure.
    pub fn same_structure(&self, other: &Path, chargen: &CharGen) -> bool {
        let fresh = |path: &Path| {
            path.leaves()
                .iter()
                .all(|leaf| leaf.epoch() == chargen.epoch())
        };
        fresh(self) && fresh(other) && chargen.resolve(self) == chargen.resolve(other)
    }

    /// Same shape built from the same atom instances.
    pub fn same_atoms(&self, other: &Path) -> bool {
        match (self.node(), other.node()) {
            (Node::Leaf(a), Node::Leaf(b)) => a.id == b.id,
            (Node::Concat(a1, a2), Node::Concat(b1, b2)) | (Node::Alt(a1, a2), Node::Alt(b1, b2)) => {
                a1.same_atoms(b1) && a2.same_atoms(b2)
            }
            (Node::Star(a), Node::Star(b)) => a.same_atoms(b),
            _ => false,
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node() {
            Node::Leaf(leaf) => write!(f, "{}({})", leaf.kind, leaf.pred),
            Node::Concat(l, r) => write!(f, "({l}) ^ ({r})"),
            Node::Alt(l, r) => write!(f, "({l}) | ({r})"),
            Node::Star(inner) => write!(f, "({inner})*"),
        }
    }
}

impl BitXor for Path {
    type Output = Path;

    fn bitxor(self, rhs: Path) -> Path {
        self.concat(&rhs)
    }
}

impl BitXor for &Path {
    type Output = Path;

    fn bitxor(self, rhs: &Path) -> Path {
        self.concat(rhs)
    }
}

impl BitOr for Path {
    type Output = Path;

    fn bitor(self, rhs: Path) -> Path {
        self.alt(&rhs)
    }
}

impl BitOr for &Path {
    type Output = Path;

    fn bitor(self, rhs: &Path) -> Path {
        self.alt(rhs)
    }
}

/// A path resolved to symbol sets.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Regex {
    Class(BTreeSet<Symbol>),
    Concat(Box<Regex>, Box<Regex>),
    Alt(Box<Regex>, Box<Regex>),
    Star(Box<Regex>),
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regex::Class(symbols) => {
                f.write_str("[")?;
                for (i, sym) in symbols.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{sym}")?;
                }
                f.write_str("]")
            }
            Regex::Concat(l, r) => write!(f, "({l}) ^ ({r})"),
            Regex::Alt(l, r) => write!(f, "({l}) | ({r})"),
            Regex::Star(inner) => write!(f, "({inner})*"),
        }
    }
}
