#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Header fields, predicates, and forwarding policies.
//!
//! Two layers:
//! - **Predicates** (`Pred`): boolean tests over packet headers, with a
//!   satisfiability check that understands IPv4 prefixes
//! - **Policies** (`Policy`): packet transformers composed with `>>` and `+`,
//!   and their flattening into prioritized rule tables (`Classifier`)

mod classifier;
mod colors;
mod field;
mod packet;
mod policy;
mod pred;
pub mod sat;

#[cfg(test)]
mod policy_tests;

pub use classifier::{Action, Classifier, Rule};
pub use colors::Colors;
pub use field::{Field, Ipv4Prefix, ParseError, Value, ValueKind};
pub use packet::Packet;
pub use policy::{BucketId, Capture, Outcome, Policy};
pub use pred::{Pred, PredError, Tests};
