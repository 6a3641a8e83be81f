//! Predicates, packet grids and behavioral comparison for tests.

use std::net::Ipv4Addr;

use pathq_core::{Field, Packet, Policy, Pred, Value};

use crate::automaton::StateId;
use crate::chargen::{CharGen, Symbol};
use crate::compile::tag_pred;

pub fn ip(last: u8) -> Value {
    Value::from(Ipv4Addr::new(10, 0, 0, last))
}

pub fn srcip(last: u8) -> Pred {
    Pred::test(Field::SrcIp, ip(last))
}

pub fn dstip(last: u8) -> Pred {
    Pred::test(Field::DstIp, ip(last))
}

pub fn switch(n: u64) -> Pred {
    Pred::test(Field::Switch, n)
}

/// Packets in automaton state `n` (0 is untagged).
pub fn tag(n: u32) -> Pred {
    tag_pred(StateId(n))
}

/// Every combination of switch, addresses and tag the tests care about.
pub fn packets() -> Vec<Packet> {
    let mut out = Vec::new();
    for switch in 1..=2u64 {
        for src in [None, Some(1), Some(3)] {
            for dst in [None, Some(2), Some(3)] {
                for tag in [None, Some(1), Some(2), Some(3), Some(4)] {
                    let mut pkt = Packet::new().with(Field::Switch, switch);
                    if let Some(last) = src {
                        pkt.set(Field::SrcIp, ip(last));
                    }
                    if let Some(last) = dst {
                        pkt.set(Field::DstIp, ip(last));
                    }
                    if let Some(t) = tag {
                        pkt.set(Field::PathTag, Value::Int(t));
                    }
                    out.push(pkt);
                }
            }
        }
    }
    out
}

/// Assert both policies produce the same outcome on every grid packet.
pub fn assert_equivalent(actual: &Policy, expected: &Policy) {
    for pkt in packets() {
        assert_eq!(
            actual.eval(&pkt),
            expected.eval(&pkt),
            "policies disagree on {pkt}\nactual:   {actual}\nexpected: {expected}"
        );
    }
}

/// The symbol whose region is semantically `pred`.
pub fn symbol_equiv(chargen: &CharGen, pred: &Pred) -> Symbol {
    chargen
        .alphabet()
        .into_iter()
        .find(|&sym| chargen.region_pred(sym).equivalent(pred))
        .unwrap_or_else(|| panic!("no symbol equivalent to {pred}"))
}
