use std::net::Ipv4Addr;

use pathq_core::{Field, Ipv4Prefix, Pred};

use crate::overlap::{Overlap, has_nonempty_intersection, relation};
use crate::test_utils::{dstip, srcip, switch};
use crate::CompileError;

fn subnet(a: u8, b: u8, len: u8) -> Pred {
    Pred::test(Field::SrcIp, Ipv4Prefix::new(Ipv4Addr::new(10, a, b, 0), len))
}

#[test]
fn identical_predicates_are_equal() {
    assert_eq!(relation(&srcip(1), &srcip(1)).unwrap(), Overlap::Equal);
}

#[test]
fn equality_is_semantic() {
    let a = srcip(1) | srcip(2);
    let b = srcip(2) | srcip(1);
    assert_eq!(relation(&a, &b).unwrap(), Overlap::Equal);
}

#[test]
fn extra_test_narrows() {
    let wide = srcip(1);
    let narrow = srcip(1) & switch(2);
    assert_eq!(relation(&wide, &narrow).unwrap(), Overlap::Superset);
    assert_eq!(relation(&narrow, &wide).unwrap(), Overlap::Subset);
}

#[test]
fn prefix_contains_longer_prefix() {
    let slash16 = subnet(1, 0, 16);
    let slash24 = subnet(1, 2, 24);
    assert_eq!(relation(&slash16, &slash24).unwrap(), Overlap::Superset);
    assert_eq!(relation(&slash24, &slash16).unwrap(), Overlap::Subset);
}

#[test]
fn different_fields_overlap_partially() {
    assert_eq!(relation(&srcip(1), &dstip(2)).unwrap(), Overlap::Partial);
}

#[test]
fn different_values_are_disjoint() {
    assert_eq!(relation(&srcip(1), &srcip(2)).unwrap(), Overlap::Disjoint);
    assert_eq!(relation(&switch(1), &!switch(1)).unwrap(), Overlap::Disjoint);
    assert_eq!(
        relation(&subnet(1, 0, 24), &subnet(2, 0, 24)).unwrap(),
        Overlap::Disjoint
    );
}

#[test]
fn identity_contains_everything() {
    assert_eq!(relation(&Pred::True, &srcip(1)).unwrap(), Overlap::Superset);
}

#[test]
fn flip_mirrors_containment() {
    for (a, b) in [
        (srcip(1), srcip(1) & switch(2)),
        (srcip(1), dstip(2)),
        (srcip(1), srcip(2)),
        (srcip(1), srcip(1)),
    ] {
        assert_eq!(relation(&a, &b).unwrap().flip(), relation(&b, &a).unwrap());
    }
}

#[test]
fn intersection_check() {
    assert!(has_nonempty_intersection(&srcip(1), &dstip(2)).unwrap());
    assert!(!has_nonempty_intersection(&srcip(1), &srcip(2)).unwrap());
}

#[test]
fn ill_typed_operand_is_an_error() {
    let bad = Pred::test(Field::Switch, Ipv4Addr::new(10, 0, 0, 1));
    assert!(matches!(
        relation(&srcip(1), &bad),
        Err(CompileError::InvalidOperand(_))
    ));
    assert!(has_nonempty_intersection(&bad, &srcip(1)).is_err());
}
