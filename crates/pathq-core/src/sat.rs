//! Satisfiability of predicates.
//!
//! Predicates are refined into a disjunction of *cubes*. A cube pins some
//! fields to one required value (narrowed by prefix containment) and excludes
//! single values elsewhere, so its emptiness is a per-field check. Negated
//! tests subtract cubes instead of branching: a cube disjoint from the
//! subtrahend passes through unchanged, and an overlapping one splits into
//! disjoint pieces, one per test of the subtrahend.
//!
//! Integer domains are treated as unbounded, so excluding finitely many
//! integers never empties them. IPv4 domains are finite, so exclusions are
//! checked for prefix coverage.

use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;

use crate::{Field, Ipv4Prefix, Pred, Tests, Value, ValueKind};

pub fn satisfiable(pred: &Pred) -> bool {
    !refine(vec![Cube::default()], pred, true).is_empty()
}

/// An equivalent predicate shaped as a flat disjunction of cubes.
///
/// Nesting depth no longer grows with the number of `and`/`minus` steps that
/// built the input, which keeps repeated refinement cheap.
pub fn normalize(pred: &Pred) -> Pred {
    let cubes = refine(vec![Cube::default()], pred, true);
    let preds: Vec<Pred> = cubes.iter().map(Cube::to_pred).collect();
    Pred::any(&preds)
}

/// Required values and excluded single-field values.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
struct Cube {
    required: Tests,
    excluded: BTreeSet<(Field, Value)>,
}

impl Cube {
    /// `self` narrowed by every test, or `None` when nothing is left.
    fn require(&self, tests: &Tests) -> Option<Cube> {
        let mut out = self.clone();
        for (&field, &value) in tests {
            let met = match out.required.get(&field) {
                Some(&existing) => existing.meet(value)?,
                None => value,
            };
            out.required.insert(field, met);
        }
        out.feasible().then_some(out)
    }

    fn exclude(&self, field: Field, value: Value) -> Option<Cube> {
        let mut out = self.clone();
        out.excluded.insert((field, value));
        out.feasible().then_some(out)
    }

    /// `self ∧ ¬tests` as disjoint pieces.
    fn minus(&self, tests: &Tests) -> Vec<Cube> {
        if self.require(tests).is_none() {
            return vec![self.clone()];
        }
        let mut pieces = Vec::new();
        let mut prefix = self.clone();
        for (&field, &value) in tests {
            pieces.extend(prefix.exclude(field, value));
            match prefix.require(&Tests::from([(field, value)])) {
                Some(next) => prefix = next,
                None => break,
            }
        }
        pieces
    }

    /// Every packet in `self` is also in `other`.
    fn within(&self, other: &Cube) -> bool {
        let required = other.required.iter().all(|(field, &value)| {
            self.required
                .get(field)
                .is_some_and(|&mine| mine.meet(value) == Some(mine))
        });
        let excluded = other.excluded.iter().all(|&(field, value)| {
            self.excluded.contains(&(field, value))
                || self
                    .required
                    .get(&field)
                    .is_some_and(|&mine| mine.meet(value).is_none())
        });
        required && excluded
    }

    fn feasible(&self) -> bool {
        let mut fields: BTreeMap<Field, FieldConstraint> = BTreeMap::new();
        for (&field, &value) in &self.required {
            fields.entry(field).or_default().required = Some(value);
        }
        for &(field, value) in &self.excluded {
            fields.entry(field).or_default().excluded.push(value);
        }
        fields
            .iter()
            .all(|(&field, constraint)| constraint.feasible(field))
    }

    fn to_pred(&self) -> Pred {
        let required = if self.required.is_empty() {
            Pred::True
        } else {
            Pred::Match(self.required.clone())
        };
        self.excluded.iter().fold(required, |acc, &(field, value)| {
            acc.and(&Pred::test(field, value).not())
        })
    }
}

/// Keep the cubes not contained in another one, in first-seen order.
fn absorb(cubes: Vec<Cube>) -> Vec<Cube> {
    let mut kept: Vec<Cube> = Vec::with_capacity(cubes.len());
    for cube in cubes {
        if kept.iter().any(|k| cube.within(k)) {
            continue;
        }
        kept.retain(|k| !k.within(&cube));
        kept.push(cube);
    }
    kept
}

/// Narrow every cube in `cubes` by `pred` (or by its negation).
fn refine(cubes: Vec<Cube>, pred: &Pred, positive: bool) -> Vec<Cube> {
    if cubes.is_empty() {
        return cubes;
    }
    match (pred, positive) {
        (Pred::True, true) | (Pred::False, false) => cubes,
        (Pred::True, false) | (Pred::False, true) => Vec::new(),
        (Pred::Not(inner), _) => refine(cubes, inner, !positive),
        (Pred::And(a, b), true) | (Pred::Or(a, b), false) => {
            let narrowed = refine(cubes, a, positive);
            refine(narrowed, b, positive)
        }
        (Pred::Or(a, b), true) => {
            let mut out = refine(cubes.clone(), a, true);
            out.extend(refine(cubes, b, true));
            absorb(out)
        }
        // ¬(c1 ∧ … ∧ cn) = ¬c1 ∨ (c1 ∧ ¬c2) ∨ …, kept disjoint.
        (Pred::And(..), false) => {
            let mut conjuncts = Vec::new();
            flatten_and(pred, &mut conjuncts);
            let mut out = Vec::new();
            let mut inside = cubes;
            for conjunct in conjuncts {
                out.extend(refine(inside.clone(), conjunct, false));
                inside = refine(inside, conjunct, true);
                if inside.is_empty() {
                    break;
                }
            }
            absorb(out)
        }
        (Pred::Match(tests), true) => cubes.iter().filter_map(|c| c.require(tests)).collect(),
        (Pred::Match(tests), false) => absorb(cubes.iter().flat_map(|c| c.minus(tests)).collect()),
    }
}

fn flatten_and<'a>(pred: &'a Pred, out: &mut Vec<&'a Pred>) {
    match pred {
        Pred::And(a, b) => {
            flatten_and(a, out);
            flatten_and(b, out);
        }
        other => out.push(other),
    }
}

#[derive(Clone, Debug, Default)]
struct FieldConstraint {
    required: Option<Value>,
    excluded: Vec<Value>,
}

impl FieldConstraint {
    fn feasible(&self, field: Field) -> bool {
        match self.required {
            Some(Value::Ip(prefix)) => !covered(prefix, &self.excluded),
            Some(value) => !self.excluded.iter().any(|ex| ex.admits(value)),
            None => {
                if !self.excluded.contains(&Value::Unset) {
                    return true;
                }
                match field.kind() {
                    ValueKind::Int => true,
                    ValueKind::Ip => {
                        !covered(Ipv4Prefix::new(Ipv4Addr::UNSPECIFIED, 0), &self.excluded)
                    }
                }
            }
        }
    }
}

/// Whether the excluded prefixes jointly cover every address in `prefix`.
fn covered(prefix: Ipv4Prefix, excluded: &[Value]) -> bool {
    let mut inside = false;
    for ex in excluded {
        let Value::Ip(ex) = *ex else { continue };
        if ex.contains(prefix) {
            return true;
        }
        inside |= prefix.contains(ex);
    }
    if !inside {
        return false;
    }
    match prefix.halves() {
        Some((low, high)) => covered(low, excluded) && covered(high, excluded),
        None => false,
    }
}
