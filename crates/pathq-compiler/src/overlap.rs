//! Set relation between two predicates.

use pathq_core::Pred;

use crate::Result;

/// How the packets matched by `a` relate to those matched by `b`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Overlap {
    Equal,
    /// `a` strictly contains `b`.
    Superset,
    /// `a` is strictly contained in `b`.
    Subset,
    /// Neither contains the other, but they intersect.
    Partial,
    Disjoint,
}

impl Overlap {
    /// The relation seen from the other side.
    pub fn flip(self) -> Overlap {
        match self {
            Overlap::Superset => Overlap::Subset,
            Overlap::Subset => Overlap::Superset,
            other => other,
        }
    }
}

/// Classify `a` against `b`.
///
/// Both predicates must be well typed; a test with no set semantics is an
/// [`crate::CompileError::InvalidOperand`].
pub fn relation(a: &Pred, b: &Pred) -> Result<Overlap> {
    a.validate()?;
    b.validate()?;
    if !a.intersects(b) {
        return Ok(Overlap::Disjoint);
    }
    let a_in_b = a.implies(b);
    let b_in_a = b.implies(a);
    Ok(match (a_in_b, b_in_a) {
        (true, true) => Overlap::Equal,
        (false, true) => Overlap::Superset,
        (true, false) => Overlap::Subset,
        (false, false) => Overlap::Partial,
    })
}

pub fn has_nonempty_intersection(a: &Pred, b: &Pred) -> Result<bool> {
    a.validate()?;
    b.validate()?;
    Ok(a.intersects(b))
}
