use std::collections::BTreeSet;

use pathq_core::{Field, Pred};

use crate::chargen::{AtomId, CharGen, Symbol};
use crate::path::AtomKind;
use crate::test_utils::{dstip, srcip, switch, symbol_equiv};
use crate::CompileError;

fn symbols(syms: &[Symbol]) -> BTreeSet<Symbol> {
    syms.iter().copied().collect()
}

#[test]
fn disjoint_predicates_get_one_symbol_each() {
    let mut chargen = CharGen::new();
    let c1 = chargen.register(&srcip(1), AtomId(0)).unwrap();
    let c2 = chargen.register(&srcip(2), AtomId(1)).unwrap();

    assert_eq!(chargen.len(), 2);
    assert_eq!(chargen.cover(c1), &symbols(&[Symbol::from_raw(0)]));
    assert_eq!(chargen.cover(c2), &symbols(&[Symbol::from_raw(1)]));
    assert!(chargen.verify().is_ok());
}

#[test]
fn narrower_predicate_splits_existing_symbol() {
    let m1 = srcip(1);
    let m2 = srcip(1) & switch(2);
    let (a1, a2) = (AtomId(0), AtomId(1));

    let mut chargen = CharGen::new();
    let c1 = chargen.register(&m1, a1).unwrap();
    let c2 = chargen.register(&m2, a2).unwrap();

    assert_eq!(chargen.len(), 2);
    let narrow = chargen.symbol_for(&m2).unwrap();
    let rest = symbol_equiv(&chargen, &m1.minus(&m2));

    assert_eq!(chargen.atoms_in(narrow), &[a1, a2]);
    assert_eq!(chargen.atoms_in(rest), &[a1]);
    assert_eq!(chargen.cover(c1), &symbols(&[narrow, rest]));
    assert_eq!(chargen.cover(c2), &symbols(&[narrow]));
    assert!(chargen.verify().is_ok());
}

#[test]
fn wider_predicate_absorbs_existing_symbol() {
    let m1 = srcip(1);
    let m2 = srcip(1) & switch(2);

    let mut chargen = CharGen::new();
    let c2 = chargen.register(&m2, AtomId(0)).unwrap();
    let c1 = chargen.register(&m1, AtomId(1)).unwrap();

    assert_eq!(chargen.len(), 2);
    let narrow = chargen.symbol_for(&m2).unwrap();
    let rest = symbol_equiv(&chargen, &m1.minus(&m2));
    assert_eq!(chargen.cover(c1), &symbols(&[narrow, rest]));
    assert_eq!(chargen.cover(c2), &symbols(&[narrow]));
    assert_eq!(chargen.atoms_in(rest), &[AtomId(1)]);
}

#[test]
fn partial_overlap_yields_three_symbols() {
    let m1 = srcip(1);
    let m2 = dstip(2);
    let (a1, a2) = (AtomId(0), AtomId(1));

    let mut chargen = CharGen::new();
    let c1 = chargen.register(&m1, a1).unwrap();
    let c2 = chargen.register(&m2, a2).unwrap();

    assert_eq!(chargen.len(), 3);
    let both = symbol_equiv(&chargen, &(m1.clone() & m2.clone()));
    let only1 = symbol_equiv(&chargen, &m1.minus(&m2));
    let only2 = symbol_equiv(&chargen, &m2.minus(&m1));

    assert_eq!(chargen.atoms_in(both), &[a1, a2]);
    assert_eq!(chargen.atoms_in(only1), &[a1]);
    assert_eq!(chargen.atoms_in(only2), &[a2]);
    assert_eq!(chargen.cover(c1), &symbols(&[both, only1]));
    assert_eq!(chargen.cover(c2), &symbols(&[both, only2]));
    assert!(chargen.verify().is_ok());
}

#[test]
fn union_of_registered_predicates_adds_no_symbol() {
    let mut chargen = CharGen::new();
    chargen.register(&srcip(1), AtomId(0)).unwrap();
    chargen.register(&srcip(2), AtomId(1)).unwrap();
    let union = chargen.register(&(srcip(1) | srcip(2)), AtomId(2)).unwrap();

    assert_eq!(chargen.len(), 2);
    assert_eq!(chargen.cover(union).len(), 2);
    assert!(chargen.verify().is_ok());
}

#[test]
fn repeated_predicate_reuses_class() {
    let mut chargen = CharGen::new();
    let first = chargen.register(&srcip(1), AtomId(0)).unwrap();
    let second = chargen.register(&srcip(1), AtomId(1)).unwrap();

    assert_eq!(first, second);
    assert_eq!(chargen.len(), 1);
    assert_eq!(chargen.atoms_in(Symbol::from_raw(0)), &[AtomId(0), AtomId(1)]);
    assert_eq!(chargen.class_of(&srcip(1)), Some(first));
}

#[test]
fn covers_stay_sound_after_many_refinements() {
    let preds = [
        srcip(1),
        srcip(1) & switch(2),
        dstip(2),
        switch(2),
        srcip(1) | dstip(3),
        !switch(1),
        dstip(2) & !srcip(1),
    ];
    let mut chargen = CharGen::new();
    let classes: Vec<_> = preds
        .iter()
        .enumerate()
        .map(|(i, p)| chargen.register(p, AtomId(i as u32)).unwrap())
        .collect();

    assert!(chargen.verify().is_ok());
    for (class, pred) in classes.into_iter().zip(&preds) {
        let union = Pred::any(chargen.cover(class).iter().map(|&s| chargen.region_pred(s)));
        assert!(union.equivalent(pred), "cover of {pred} drifted");
    }
}

#[test]
fn crossing_predicates_refine_into_every_combination() {
    let mut preds = Vec::new();
    for n in 1..=4u8 {
        preds.push(srcip(n));
    }
    for n in 1..=4u8 {
        preds.push(dstip(n));
    }
    for n in 1..=4u64 {
        preds.push(switch(n));
    }
    let mut chargen = CharGen::new();
    for (i, pred) in preds.iter().enumerate() {
        chargen.register(pred, AtomId(i as u32)).unwrap();
    }

    // Each field is one of four values or none of them, and at least one
    // field matches.
    assert_eq!(chargen.len(), 5 * 5 * 5 - 1);
    assert!(chargen.verify().is_ok());

    let corner = symbol_equiv(&chargen, &(srcip(1) & dstip(2) & switch(3)));
    assert_eq!(chargen.atoms_in(corner), &[AtomId(0), AtomId(5), AtomId(10)]);
}

#[test]
fn unsatisfiable_predicate_has_empty_cover() {
    let mut chargen = CharGen::new();
    let class = chargen.register(&(srcip(1) & srcip(2)), AtomId(0)).unwrap();
    assert!(chargen.cover(class).is_empty());
    assert!(chargen.is_empty());
}

#[test]
fn ill_typed_predicate_is_rejected() {
    let mut chargen = CharGen::new();
    let err = chargen
        .register(&Pred::test(Field::SrcIp, 5u64), AtomId(0))
        .unwrap_err();
    assert!(matches!(err, CompileError::InvalidOperand(_)));
}

#[test]
fn tokens_are_shared_per_predicate_and_kind() {
    let mut chargen = CharGen::new();
    let atom = chargen.token(&srcip(1), AtomKind::Atom);

    assert_eq!(chargen.token(&srcip(1), AtomKind::Atom), atom);
    assert_ne!(chargen.token(&srcip(1), AtomKind::EndPath), atom);
    assert_ne!(chargen.token(&srcip(2), AtomKind::Atom), atom);
}

#[test]
fn fresh_tokens_are_never_shared() {
    let mut chargen = CharGen::new();
    let a = chargen.fresh_token(&srcip(1), AtomKind::Atom);
    let b = chargen.fresh_token(&srcip(1), AtomKind::Atom);
    let shared = chargen.token(&srcip(1), AtomKind::Atom);

    assert_ne!(a, b);
    assert_ne!(shared, a);
    assert_ne!(shared, b);
}

#[test]
fn clear_starts_a_new_epoch() {
    let mut chargen = CharGen::new();
    chargen.register(&srcip(1), AtomId(0)).unwrap();
    let before = chargen.epoch();

    chargen.clear();

    assert!(chargen.is_empty());
    assert_ne!(chargen.epoch(), before);
    assert_eq!(chargen.class_of(&srcip(1)), None);
}
