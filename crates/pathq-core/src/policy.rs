//! Forwarding policies.
//!
//! A policy maps one located packet to a set of output packets, and may also
//! hand copies to capture buckets. `>>` is sequential composition and `+` is
//! parallel composition.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::{Add, Shr};

use crate::{Field, Packet, Pred, Value};

/// Identity of a capture sink. Owned by the caller.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct BucketId(pub u32);

impl fmt::Display for BucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bucket#{}", self.0)
    }
}

/// Send the packet to a bucket, optionally keeping only some fields.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Capture {
    pub bucket: BucketId,
    pub fields: Option<Vec<Field>>,
}

impl Capture {
    pub fn new(bucket: BucketId) -> Self {
        Self {
            bucket,
            fields: None,
        }
    }

    pub fn projected(bucket: BucketId, fields: Vec<Field>) -> Self {
        Self {
            bucket,
            fields: Some(fields),
        }
    }

    /// The packet as the bucket receives it.
    pub fn apply(&self, pkt: &Packet) -> Packet {
        match &self.fields {
            Some(fields) => pkt.project(fields),
            None => pkt.clone(),
        }
    }
}

impl fmt::Display for Capture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.fields {
            None => write!(f, "capture({})", self.bucket),
            Some(fields) => {
                write!(f, "capture({}, [", self.bucket)?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{field}")?;
                }
                f.write_str("])")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Policy {
    Identity,
    Drop,
    Filter(Pred),
    Modify(Field, Value),
    /// Set the output port.
    Fwd(u64),
    Capture(Capture),
    Seq(Vec<Policy>),
    Par(Vec<Policy>),
}

/// Result of running a packet through a policy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    pub forwarded: BTreeSet<Packet>,
    pub captured: BTreeSet<(BucketId, Packet)>,
}

impl Outcome {
    fn forward(pkt: Packet) -> Self {
        Self {
            forwarded: BTreeSet::from([pkt]),
            captured: BTreeSet::new(),
        }
    }

    fn merge(&mut self, other: Outcome) {
        self.forwarded.extend(other.forwarded);
        self.captured.extend(other.captured);
    }
}

impl Policy {
    pub fn filter(pred: Pred) -> Policy {
        match pred {
            Pred::True => Policy::Identity,
            Pred::False => Policy::Drop,
            pred => Policy::Filter(pred),
        }
    }

    pub fn modify(field: Field, value: impl Into<Value>) -> Policy {
        Policy::Modify(field, value.into())
    }

    pub fn fwd(port: u64) -> Policy {
        Policy::Fwd(port)
    }

    pub fn capture(bucket: BucketId) -> Policy {
        Policy::Capture(Capture::new(bucket))
    }

    /// Parallel composition of all policies; nothing in parallel is `drop`.
    pub fn par_all<I>(policies: I) -> Policy
    where
        I: IntoIterator<Item = Policy>,
    {
        policies.into_iter().fold(Policy::Drop, |acc, p| acc + p)
    }

    pub fn eval(&self, pkt: &Packet) -> Outcome {
        match self {
            Policy::Identity => Outcome::forward(pkt.clone()),
            Policy::Drop => Outcome::default(),
            Policy::Filter(pred) => {
                if pred.eval(pkt) {
                    Outcome::forward(pkt.clone())
                } else {
                    Outcome::default()
                }
            }
            Policy::Modify(field, value) => Outcome::forward(pkt.clone().with(*field, *value)),
            Policy::Fwd(port) => Outcome::forward(pkt.clone().with(Field::OutPort, *port)),
            Policy::Capture(capture) => Outcome {
                forwarded: BTreeSet::new(),
                captured: BTreeSet::from([(capture.bucket, capture.apply(pkt))]),
            },
            Policy::Seq(stages) => {
                let mut outcome = Outcome::forward(pkt.clone());
                for stage in stages {
                    let inputs = std::mem::take(&mut outcome.forwarded);
                    for input in &inputs {
                        outcome.merge(stage.eval(input));
                    }
                }
                outcome
            }
            Policy::Par(branches) => {
                let mut outcome = Outcome::default();
                for branch in branches {
                    outcome.merge(branch.eval(pkt));
                }
                outcome
            }
        }
    }

    /// Whether the policy tests or writes `field` anywhere.
    pub fn mentions(&self, field: Field) -> bool {
        match self {
            Policy::Identity | Policy::Drop | Policy::Capture(_) => false,
            Policy::Filter(pred) => pred.mentions(field),
            Policy::Modify(target, _) => *target == field,
            Policy::Fwd(_) => field == Field::OutPort,
            Policy::Seq(ps) | Policy::Par(ps) => ps.iter().any(|p| p.mentions(field)),
        }
    }
}

impl Shr for Policy {
    type Output = Policy;

    fn shr(self, rhs: Policy) -> Policy {
        match (self, rhs) {
            (Policy::Drop, _) => Policy::Drop,
            (Policy::Identity, p) | (p, Policy::Identity) => p,
            (Policy::Seq(mut a), Policy::Seq(b)) => {
                a.extend(b);
                Policy::Seq(a)
            }
            (Policy::Seq(mut a), p) => {
                a.push(p);
                Policy::Seq(a)
            }
            (p, Policy::Seq(mut b)) => {
                b.insert(0, p);
                Policy::Seq(b)
            }
            (a, b) => Policy::Seq(vec![a, b]),
        }
    }
}

impl Add for Policy {
    type Output = Policy;

    fn add(self, rhs: Policy) -> Policy {
        match (self, rhs) {
            (Policy::Drop, p) | (p, Policy::Drop) => p,
            (Policy::Par(mut a), Policy::Par(b)) => {
                a.extend(b);
                Policy::Par(a)
            }
            (Policy::Par(mut a), p) => {
                a.push(p);
                Policy::Par(a)
            }
            (p, Policy::Par(mut b)) => {
                b.insert(0, p);
                Policy::Par(b)
            }
            (a, b) => Policy::Par(vec![a, b]),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Identity => f.write_str("identity"),
            Policy::Drop => f.write_str("drop"),
            Policy::Filter(pred) => write!(f, "{pred}"),
            Policy::Modify(field, value) => write!(f, "modify({field}={value})"),
            Policy::Fwd(port) => write!(f, "fwd({port})"),
            Policy::Capture(capture) => write!(f, "{capture}"),
            Policy::Seq(ps) => write_joined(f, ps, " >> "),
            Policy::Par(ps) => write_joined(f, ps, " + "),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, ps: &[Policy], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, p) in ps.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{p}")?;
    }
    f.write_str(")")
}
