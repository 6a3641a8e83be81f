//! Character generator: a disjoint alphabet over predicate space.
//!
//! Every registered predicate is expressed as a union of *symbols*, and
//! symbols never overlap. Registering a new predicate may split existing
//! symbols; the split is recorded by rewriting class covers by index, so
//! leaves built earlier stay valid and simply resolve to finer symbol sets.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use pathq_core::Pred;

use crate::invariants;
use crate::overlap::{Overlap, relation};
use crate::path::{AtomKind, Node, Path, Regex};
use crate::{CompileError, Result};

/// One cell of the partition.
///
/// Symbols are ordered by allocation, which is also the order of the
/// automaton alphabet.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    /// Raw index for dumps and debugging.
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Handle of a registered predicate.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct ClassId(u32);

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Purpose token handed out alongside a registration.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct Token(u32);

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Identity of one registered atom instance.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct AtomId(pub(crate) u32);

impl AtomId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for AtomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a{}", self.0)
    }
}

static NEXT_EPOCH: AtomicU64 = AtomicU64::new(0);

fn next_epoch() -> u64 {
    NEXT_EPOCH.fetch_add(1, Ordering::Relaxed)
}

#[derive(Clone, Debug)]
struct Region {
    pred: Pred,
    /// Atoms whose predicate covers this region, in registration order.
    atoms: Vec<AtomId>,
}

#[derive(Clone, Debug)]
struct Class {
    pred: Pred,
    cover: BTreeSet<Symbol>,
}

#[derive(Debug)]
pub struct CharGen {
    regions: Vec<Region>,
    classes: Vec<Class>,
    class_index: HashMap<Pred, ClassId>,
    shared_tokens: HashMap<(Pred, AtomKind), Token>,
    next_token: u32,
    epoch: u64,
}

impl Default for CharGen {
    fn default() -> Self {
        Self {
            regions: Vec::new(),
            classes: Vec::new(),
            class_index: HashMap::new(),
            shared_tokens: HashMap::new(),
            next_token: 0,
            epoch: next_epoch(),
        }
    }
}

impl CharGen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `pred` on behalf of `atom` and return its class.
    ///
    /// A predicate seen before (structurally) reuses its class. Otherwise the
    /// predicate is classified against every existing region, splitting
    /// regions it cuts, and whatever is left gets one fresh symbol.
    pub fn register(&mut self, pred: &Pred, atom: AtomId) -> Result<ClassId> {
        pred.validate()?;

        if let Some(&class) = self.class_index.get(pred) {
            let cover: Vec<Symbol> = self.cover(class).iter().copied().collect();
            for sym in cover {
                self.regions[sym.index()].atoms.push(atom);
            }
            tracing::trace!(%pred, %class, "predicate already registered");
            return Ok(class);
        }

        let mut cover = BTreeSet::new();
        let mut remaining = pred.clone();
        let existing = self.regions.len();

        for idx in 0..existing {
            let sym = Symbol(idx as u32);
            let region = self.regions[idx].pred.clone();
            match relation(&remaining, &region)? {
                Overlap::Disjoint => {}
                Overlap::Equal => {
                    cover.insert(sym);
                    remaining = Pred::False;
                    break;
                }
                Overlap::Superset => {
                    cover.insert(sym);
                    remaining = remaining.minus(&region).normalize();
                }
                Overlap::Subset => {
                    self.split(sym, &remaining);
                    cover.insert(sym);
                    remaining = Pred::False;
                    break;
                }
                Overlap::Partial => {
                    self.split(sym, &remaining);
                    cover.insert(sym);
                    remaining = remaining.minus(&region).normalize();
                }
            }
        }

        if remaining.is_satisfiable() {
            let sym = self.push_region(remaining, Vec::new());
            tracing::trace!(%sym, "fresh symbol for remainder");
            cover.insert(sym);
        }

        for &sym in &cover {
            self.regions[sym.index()].atoms.push(atom);
        }

        let class = ClassId(self.classes.len() as u32);
        self.classes.push(Class {
            pred: pred.clone(),
            cover,
        });
        self.class_index.insert(pred.clone(), class);
        tracing::trace!(%pred, %class, symbols = self.regions.len(), "registered predicate");
        Ok(class)
    }

    /// Narrow `sym` to `sym ∧ cut` and give `sym ∧ ¬cut` a fresh symbol.
    ///
    /// Every class covering `sym` also gets the fresh symbol, so its union is
    /// unchanged. Both halves are stored normalized so region predicates stay
    /// flat however often they are split.
    fn split(&mut self, sym: Symbol, cut: &Pred) {
        let old = self.regions[sym.index()].pred.clone();
        let atoms = self.regions[sym.index()].atoms.clone();
        self.regions[sym.index()].pred = old.and(cut).normalize();
        let rest = self.push_region(old.minus(cut).normalize(), atoms);
        for class in &mut self.classes {
            if class.cover.contains(&sym) {
                class.cover.insert(rest);
            }
        }
        tracing::trace!(%sym, %rest, "split symbol");
    }

    fn class(&self, class: ClassId) -> &Class {
        invariants::ensure_class(self.classes.get(class.0 as usize), class)
    }

    fn region(&self, sym: Symbol) -> &Region {
        invariants::ensure_symbol(self.regions.get(sym.index()), sym)
    }

    fn push_region(&mut self, pred: Pred, atoms: Vec<AtomId>) -> Symbol {
        let sym = Symbol(self.regions.len() as u32);
        self.regions.push(Region { pred, atoms });
        sym
    }

    /// Shared token: the same `(pred, kind)` always yields the same token.
    pub fn token(&mut self, pred: &Pred, kind: AtomKind) -> Token {
        if let Some(&token) = self.shared_tokens.get(&(pred.clone(), kind)) {
            return token;
        }
        let token = self.fresh_token(pred, kind);
        self.shared_tokens.insert((pred.clone(), kind), token);
        token
    }

    /// A token no other call has returned.
    pub fn fresh_token(&mut self, pred: &Pred, kind: AtomKind) -> Token {
        let token = Token(self.next_token);
        self.next_token += 1;
        tracing::trace!(%pred, %kind, %token, "allocated token");
        token
    }

    /// Symbols whose union is the class predicate.
    pub fn cover(&self, class: ClassId) -> &BTreeSet<Symbol> {
        &self.class(class).cover
    }

    pub fn class_pred(&self, class: ClassId) -> &Pred {
        &self.class(class).pred
    }

    pub fn class_of(&self, pred: &Pred) -> Option<ClassId> {
        self.class_index.get(pred).copied()
    }

    /// The symbol whose region is structurally `pred`, if any.
    pub fn symbol_for(&self, pred: &Pred) -> Option<Symbol> {
        self.regions
            .iter()
            .position(|region| &region.pred == pred)
            .map(|idx| Symbol(idx as u32))
    }

    pub fn region_pred(&self, sym: Symbol) -> &Pred {
        &self.region(sym).pred
    }

    /// Atoms covering `sym`, in registration order.
    pub fn atoms_in(&self, sym: Symbol) -> &[AtomId] {
        &self.region(sym).atoms
    }

    /// All symbols, in allocation order.
    pub fn alphabet(&self) -> Vec<Symbol> {
        (0..self.regions.len() as u32).map(Symbol).collect()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Generation counter; changes on every [`CharGen::clear`].
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Resolve a path into a regex over the current symbols.
    pub fn resolve(&self, path: &Path) -> Regex {
        match path.node() {
            Node::Leaf(leaf) => Regex::Class(self.cover(leaf.class()).clone()),
            Node::Concat(l, r) => Regex::Concat(Box::new(self.resolve(l)), Box::new(self.resolve(r))),
            Node::Alt(l, r) => Regex::Alt(Box::new(self.resolve(l)), Box::new(self.resolve(r))),
            Node::Star(inner) => Regex::Star(Box::new(self.resolve(inner))),
        }
    }

    /// Check that symbols are pairwise disjoint and every class equals the
    /// union of its cover.
    pub fn verify(&self) -> Result<()> {
        for (i, a) in self.regions.iter().enumerate() {
            for (j, b) in self.regions.iter().enumerate().skip(i + 1) {
                if a.pred.intersects(&b.pred) {
                    return Err(CompileError::PartitionInvariant(format!(
                        "symbols s{i} and s{j} overlap"
                    )));
                }
            }
        }
        for (idx, class) in self.classes.iter().enumerate() {
            let union = Pred::any(class.cover.iter().map(|&sym| &self.region(sym).pred));
            if !union.equivalent(&class.pred) {
                return Err(CompileError::PartitionInvariant(format!(
                    "class c{idx} ({}) is not the union of its cover",
                    class.pred
                )));
            }
        }
        Ok(())
    }

    /// Forget every symbol, class and token, and start a new epoch.
    pub fn clear(&mut self) {
        *self = Self::default();
        tracing::debug!(epoch = self.epoch, "character generator cleared");
    }
}
