use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use crate::{BucketId, Capture, Field, Packet, Policy, Pred};

fn pkt(switch: u64, last: u8) -> Packet {
    Packet::new()
        .with(Field::Switch, switch)
        .with(Field::SrcIp, Ipv4Addr::new(10, 0, 0, last))
}

fn on_switch(n: u64) -> Policy {
    Policy::filter(Pred::test(Field::Switch, n))
}

#[test]
fn fwd_sets_outport() {
    let out = Policy::fwd(3).eval(&pkt(1, 1));
    assert_eq!(out.forwarded, BTreeSet::from([pkt(1, 1).with(Field::OutPort, 3u64)]));
    assert!(out.captured.is_empty());
}

#[test]
fn sequential_composition_filters_then_forwards() {
    let policy = on_switch(1) >> Policy::fwd(2);

    assert_eq!(policy.eval(&pkt(1, 1)).forwarded.len(), 1);
    assert!(policy.eval(&pkt(2, 1)).forwarded.is_empty());
}

#[test]
fn parallel_composition_unions_outputs() {
    let policy = Policy::fwd(1) + Policy::fwd(2);
    let out = policy.eval(&pkt(1, 1));

    assert_eq!(out.forwarded.len(), 2);
}

#[test]
fn capture_is_terminal() {
    let bucket = BucketId(7);
    let policy = Policy::capture(bucket) >> Policy::fwd(2);
    let out = policy.eval(&pkt(1, 1));

    assert!(out.forwarded.is_empty());
    assert_eq!(out.captured, BTreeSet::from([(bucket, pkt(1, 1))]));
}

#[test]
fn projected_capture_keeps_listed_fields() {
    let bucket = BucketId(1);
    let policy = Policy::Capture(Capture::projected(bucket, vec![Field::Switch]));
    let out = policy.eval(&pkt(4, 9));

    assert_eq!(
        out.captured,
        BTreeSet::from([(bucket, Packet::new().with(Field::Switch, 4u64))])
    );
}

#[test]
fn composition_operators_simplify() {
    let p = Policy::fwd(1);
    assert_eq!(Policy::Identity >> p.clone(), p);
    assert_eq!(p.clone() >> Policy::Identity, p);
    assert_eq!(Policy::Drop >> p.clone(), Policy::Drop);
    assert_eq!(Policy::Drop + p.clone(), p);
    assert_eq!(Policy::par_all(Vec::new()), Policy::Drop);
    assert_eq!(Policy::filter(Pred::True), Policy::Identity);
    assert_eq!(Policy::filter(Pred::False), Policy::Drop);
}

#[test]
fn composition_flattens() {
    let p = on_switch(1) >> Policy::modify(Field::VlanId, 3u64) >> Policy::fwd(2);
    let Policy::Seq(stages) = &p else {
        panic!("expected a sequence, got {p}");
    };
    assert_eq!(stages.len(), 3);

    let q = Policy::fwd(1) + Policy::fwd(2) + Policy::fwd(3);
    let Policy::Par(branches) = &q else {
        panic!("expected a parallel composition, got {q}");
    };
    assert_eq!(branches.len(), 3);
}

#[test]
fn display() {
    let p = (on_switch(1) >> Policy::fwd(2)) + Policy::capture(BucketId(3));
    assert_eq!(p.to_string(), "((match(switch=1) >> fwd(2)) + capture(bucket#3))");

    let q = Policy::Capture(Capture::projected(BucketId(1), vec![Field::Switch, Field::InPort]));
    assert_eq!(q.to_string(), "capture(bucket#1, [switch, inport])");
}

#[test]
fn mentions() {
    let p = on_switch(1) >> Policy::modify(Field::PathTag, 2u64);
    assert!(p.mentions(Field::Switch));
    assert!(p.mentions(Field::PathTag));
    assert!(Policy::fwd(1).mentions(Field::OutPort));
    assert!(!Policy::capture(BucketId(0)).mentions(Field::PathTag));
}
