//! Boolean predicates over header fields.
//!
//! Predicates are immutable values with structural equality and hashing, so
//! they can key maps. Semantic questions (is it empty, does it contain
//! another) go through [`crate::sat`].

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{BitAnd, BitOr, Not, Sub};

use crate::{Field, Packet, Value};

/// A conjunction of single-field tests.
pub type Tests = BTreeMap<Field, Value>;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pred {
    True,
    False,
    /// Every listed field equals (or, for prefixes, falls inside) its value.
    Match(Tests),
    And(Box<Pred>, Box<Pred>),
    Or(Box<Pred>, Box<Pred>),
    Not(Box<Pred>),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredError {
    #[error("field `{field}` cannot be tested against `{value}`")]
    IllTyped { field: Field, value: Value },
}

impl Pred {
    pub fn test(field: Field, value: impl Into<Value>) -> Pred {
        Pred::Match(BTreeMap::from([(field, value.into())]))
    }

    /// Conjunction of tests; the empty conjunction is [`Pred::True`].
    pub fn tests<I>(tests: I) -> Pred
    where
        I: IntoIterator<Item = (Field, Value)>,
    {
        tests
            .into_iter()
            .fold(Pred::True, |acc, (field, value)| {
                acc.and(&Pred::test(field, value))
            })
    }

    /// Disjunction of all predicates; the empty disjunction is [`Pred::False`].
    pub fn any<'a, I>(preds: I) -> Pred
    where
        I: IntoIterator<Item = &'a Pred>,
    {
        preds.into_iter().fold(Pred::False, |acc, p| acc.or(p))
    }

    /// Conjunction with light simplification.
    ///
    /// Two `Match` nodes merge field by field; conflicting values give `False`.
    pub fn and(&self, other: &Pred) -> Pred {
        match (self, other) {
            (Pred::False, _) | (_, Pred::False) => Pred::False,
            (Pred::True, p) | (p, Pred::True) => p.clone(),
            (Pred::Match(a), Pred::Match(b)) => merge_tests(a, b),
            (a, b) if a == b => a.clone(),
            (a, b) => Pred::And(Box::new(a.clone()), Box::new(b.clone())),
        }
    }

    pub fn or(&self, other: &Pred) -> Pred {
        match (self, other) {
            (Pred::True, _) | (_, Pred::True) => Pred::True,
            (Pred::False, p) | (p, Pred::False) => p.clone(),
            (a, b) if a == b => a.clone(),
            (a, b) => Pred::Or(Box::new(a.clone()), Box::new(b.clone())),
        }
    }

    pub fn not(&self) -> Pred {
        match self {
            Pred::True => Pred::False,
            Pred::False => Pred::True,
            Pred::Not(inner) => (**inner).clone(),
            p => Pred::Not(Box::new(p.clone())),
        }
    }

    /// `self ∧ ¬other`.
    pub fn minus(&self, other: &Pred) -> Pred {
        self.and(&other.not())
    }

    pub fn eval(&self, pkt: &Packet) -> bool {
        match self {
            Pred::True => true,
            Pred::False => false,
            Pred::Match(tests) => tests
                .iter()
                .all(|(&field, &value)| value.admits(pkt.get(field))),
            Pred::And(a, b) => a.eval(pkt) && b.eval(pkt),
            Pred::Or(a, b) => a.eval(pkt) || b.eval(pkt),
            Pred::Not(a) => !a.eval(pkt),
        }
    }

    /// Check that every test compares a field against a value of its kind.
    pub fn validate(&self) -> Result<(), PredError> {
        match self {
            Pred::True | Pred::False => Ok(()),
            Pred::Match(tests) => {
                for (&field, &value) in tests {
                    if value.kind().is_some_and(|kind| kind != field.kind()) {
                        return Err(PredError::IllTyped { field, value });
                    }
                }
                Ok(())
            }
            Pred::And(a, b) | Pred::Or(a, b) => {
                a.validate()?;
                b.validate()
            }
            Pred::Not(a) => a.validate(),
        }
    }

    pub fn mentions(&self, field: Field) -> bool {
        match self {
            Pred::True | Pred::False => false,
            Pred::Match(tests) => tests.contains_key(&field),
            Pred::And(a, b) | Pred::Or(a, b) => a.mentions(field) || b.mentions(field),
            Pred::Not(a) => a.mentions(field),
        }
    }

    /// Partially evaluate under known field values.
    ///
    /// Used to push a predicate back through a modification: the result holds
    /// on a packet exactly when `self` holds after the assignments.
    pub fn restrict(&self, known: &Tests) -> Pred {
        match self {
            Pred::True | Pred::False => self.clone(),
            Pred::Match(tests) => {
                let mut rest = Tests::new();
                for (&field, &value) in tests {
                    match known.get(&field) {
                        Some(&actual) if value.admits(actual) => {}
                        Some(_) => return Pred::False,
                        None => {
                            rest.insert(field, value);
                        }
                    }
                }
                if rest.is_empty() {
                    Pred::True
                } else {
                    Pred::Match(rest)
                }
            }
            Pred::And(a, b) => a.restrict(known).and(&b.restrict(known)),
            Pred::Or(a, b) => a.restrict(known).or(&b.restrict(known)),
            Pred::Not(a) => a.restrict(known).not(),
        }
    }

    pub fn is_satisfiable(&self) -> bool {
        crate::sat::satisfiable(self)
    }

    /// Same packets, as a flat disjunction of tests and single exclusions.
    pub fn normalize(&self) -> Pred {
        crate::sat::normalize(self)
    }

    /// Whether some packet satisfies both predicates.
    pub fn intersects(&self, other: &Pred) -> bool {
        self.and(other).is_satisfiable()
    }

    /// Whether every packet satisfying `self` satisfies `other`.
    pub fn implies(&self, other: &Pred) -> bool {
        !self.minus(other).is_satisfiable()
    }

    pub fn equivalent(&self, other: &Pred) -> bool {
        self.implies(other) && other.implies(self)
    }
}

fn merge_tests(a: &Tests, b: &Tests) -> Pred {
    let mut merged = a.clone();
    for (&field, &value) in b {
        match merged.get(&field) {
            Some(&existing) => match existing.meet(value) {
                Some(met) => {
                    merged.insert(field, met);
                }
                None => return Pred::False,
            },
            None => {
                merged.insert(field, value);
            }
        }
    }
    Pred::Match(merged)
}

impl fmt::Display for Pred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pred::True => f.write_str("identity"),
            Pred::False => f.write_str("drop"),
            Pred::Match(tests) => {
                f.write_str("match(")?;
                for (i, (field, value)) in tests.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{field}={value}")?;
                }
                f.write_str(")")
            }
            Pred::And(a, b) => write!(f, "({a} & {b})"),
            Pred::Or(a, b) => write!(f, "({a} | {b})"),
            Pred::Not(a) => write!(f, "~{a}"),
        }
    }
}

impl BitAnd for Pred {
    type Output = Pred;

    fn bitand(self, rhs: Pred) -> Pred {
        self.and(&rhs)
    }
}

impl BitAnd for &Pred {
    type Output = Pred;

    fn bitand(self, rhs: &Pred) -> Pred {
        self.and(rhs)
    }
}

impl BitOr for Pred {
    type Output = Pred;

    fn bitor(self, rhs: Pred) -> Pred {
        self.or(&rhs)
    }
}

impl BitOr for &Pred {
    type Output = Pred;

    fn bitor(self, rhs: &Pred) -> Pred {
        self.or(rhs)
    }
}

impl Sub for Pred {
    type Output = Pred;

    fn sub(self, rhs: Pred) -> Pred {
        self.minus(&rhs)
    }
}

impl Not for Pred {
    type Output = Pred;

    fn not(self) -> Pred {
        Pred::not(&self)
    }
}

impl Not for &Pred {
    type Output = Pred;

    fn not(self) -> Pred {
        Pred::not(self)
    }
}
