use pathq_core::{Field, Pred};

use crate::path::{Atom, AtomKind};
use crate::test_utils::{dstip, srcip, switch};
use crate::Session;

#[test]
fn atom_combinators_keep_left_kind() {
    let hook = Atom::hook(srcip(1), [Field::Switch]);
    let combined = hook & Atom::new(dstip(2));

    assert_eq!(combined.kind(), AtomKind::Hook);
    assert_eq!(combined.fields(), &[Field::Switch]);
    assert_eq!(combined.pred(), &(srcip(1) & dstip(2)));
}

#[test]
fn atom_difference_and_negation() {
    let narrowed = Atom::end_path(srcip(1)) - Atom::new(switch(2));
    assert_eq!(narrowed.kind(), AtomKind::EndPath);
    assert!(narrowed.pred().equivalent(&(srcip(1) & !switch(2))));

    let negated = !Atom::drop(srcip(1));
    assert_eq!(negated.kind(), AtomKind::Drop);
    assert_eq!(negated.pred(), &!srcip(1));
}

#[test]
fn atom_union() {
    let either = Atom::new(srcip(1)) | Atom::new(srcip(2));
    assert_eq!(either.kind(), AtomKind::Atom);
    assert_eq!(either.pred(), &(srcip(1) | srcip(2)));
}

#[test]
fn display_expression() {
    let mut session = Session::new();
    let a = session.atom(srcip(1)).unwrap();
    let b = session.end_path(dstip(2)).unwrap();
    let path = (&a ^ &b) | a.star();

    insta::assert_snapshot!(
        path,
        @"((atom(match(srcip=10.0.0.1))) ^ (end_path(match(dstip=10.0.0.2)))) | ((atom(match(srcip=10.0.0.1)))*)"
    );
}

#[test]
fn star_is_idempotent() {
    let mut session = Session::new();
    let a = session.atom(srcip(1)).unwrap();
    let once = a.star();
    let twice = once.star();

    assert!(once.same_atoms(&twice));
    assert_eq!(twice.to_string(), once.to_string());
}

#[test]
fn leaves_in_order() {
    let mut session = Session::new();
    let a = session.atom(srcip(1)).unwrap();
    let b = session.atom(dstip(2)).unwrap();
    let c = session.drop_atom(switch(1)).unwrap();
    let path = (a.clone() ^ b.star()) | c;

    let kinds: Vec<_> = path.leaves().iter().map(|leaf| leaf.kind()).collect();
    assert_eq!(kinds, [AtomKind::Atom, AtomKind::Atom, AtomKind::Drop]);
    assert_eq!(path.leaves()[0].id(), a.as_leaf().unwrap().id());
}

#[test]
fn structure_and_identity_are_separate() {
    let mut session = Session::new();
    let first = session.atom(srcip(1)).unwrap();
    let second = session.atom(srcip(1)).unwrap();

    assert!(first.same_structure(&second, session.chargen()));
    assert!(!first.same_atoms(&second));
    assert!(first.same_atoms(&first.clone()));
    assert_eq!(
        first.as_leaf().unwrap().token(),
        second.as_leaf().unwrap().token()
    );
}

#[test]
fn different_predicates_differ_structurally() {
    let mut session = Session::new();
    let a = session.atom(srcip(1)).unwrap();
    let b = session.atom(srcip(2)).unwrap();

    assert!(!a.same_structure(&b, session.chargen()));
    assert!(!(&a ^ &b).same_structure(&(&b ^ &a), session.chargen()));
}

#[test]
fn foreign_and_stale_paths_never_share_structure() {
    let mut other = Session::new();
    let foreign = other.atom(srcip(1)).unwrap();
    let foreign = &foreign ^ &other.atom(dstip(2)).unwrap();

    let mut session = Session::new();
    let stale = session.atom(srcip(1)).unwrap();
    session.reset();
    let fresh = session.atom(srcip(1)).unwrap();

    assert!(!fresh.same_structure(&foreign, session.chargen()));
    assert!(!foreign.same_structure(&fresh, session.chargen()));
    assert!(!fresh.same_structure(&stale, session.chargen()));
    assert!(!stale.same_structure(&stale, session.chargen()));
    assert!(fresh.same_structure(&fresh, session.chargen()));
}

#[test]
fn earlier_leaves_resolve_to_refined_symbols() {
    let mut session = Session::new();
    let wide = session.atom(srcip(1)).unwrap();
    insta::assert_snapshot!(session.chargen().resolve(&wide), @"[s0]");

    session.atom(srcip(1) & switch(2)).unwrap();
    insta::assert_snapshot!(session.chargen().resolve(&wide), @"[s0|s1]");
}

#[test]
fn hook_keeps_its_fields() {
    let mut session = Session::new();
    let hook = session
        .hook(Pred::True, [Field::Switch, Field::InPort])
        .unwrap();
    let leaf = hook.as_leaf().unwrap();

    assert_eq!(leaf.kind(), AtomKind::Hook);
    assert_eq!(leaf.fields(), &[Field::Switch, Field::InPort]);
    assert_eq!(leaf.epoch(), session.chargen().epoch());
}
