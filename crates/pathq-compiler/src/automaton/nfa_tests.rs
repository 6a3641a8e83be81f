use std::collections::BTreeSet;

use super::nfa::{Label, Nfa, NfaNode, QueryId};
use crate::Session;
use crate::path::AtomKind;
use crate::test_utils::{dstip, srcip};

fn labels(raw: &[u32]) -> BTreeSet<Label> {
    raw.iter().map(|&n| Label(n)).collect()
}

#[test]
fn single_atom() {
    let mut session = Session::new();
    let a = session.atom(srcip(1)).unwrap();
    let nfa = Nfa::build([(QueryId(0), &a)], session.chargen());

    assert_eq!(nfa.len(), 3);
    assert_eq!(nfa.accept_of(QueryId(0)), Some(Label(0)));
    assert_eq!(nfa.start(), Label(2));
    assert_eq!(nfa.node(Label(2)), &NfaNode::Split(vec![Label(1)]));

    let NfaNode::Consume { leaf, next, .. } = nfa.node(Label(1)) else {
        panic!("expected a consuming node");
    };
    assert_eq!(*next, Label(0));
    assert_eq!(leaf.atom, a.as_leaf().unwrap().id());
    assert_eq!(leaf.kind, AtomKind::Atom);
}

#[test]
fn star_loops_through_entry_split() {
    let mut session = Session::new();
    let a = session.atom(srcip(1)).unwrap();
    let nfa = Nfa::build([(QueryId(0), &a.star())], session.chargen());

    // L0 accept, L1 loop entry, L2 body, L3 start
    assert_eq!(nfa.node(Label(1)), &NfaNode::Split(vec![Label(2), Label(0)]));
    assert!(matches!(
        nfa.node(Label(2)),
        NfaNode::Consume { next: Label(1), .. }
    ));
    assert_eq!(nfa.closure([nfa.start()]), labels(&[0, 1, 2, 3]));
    assert!(!nfa.is_significant(Label(1)));
    assert!(nfa.is_significant(Label(2)));
    assert!(nfa.is_significant(Label(0)));
}

#[test]
fn alternation_branches_from_split() {
    let mut session = Session::new();
    let a = session.atom(srcip(1)).unwrap();
    let b = session.atom(dstip(2)).unwrap();
    let nfa = Nfa::build([(QueryId(0), &(&a | &b))], session.chargen());

    // L0 accept, L1 and L2 branches, L3 join, L4 start
    assert_eq!(nfa.node(Label(3)), &NfaNode::Split(vec![Label(1), Label(2)]));
    assert_eq!(nfa.closure([Label(3)]), labels(&[1, 2, 3]));
}

#[test]
fn hook_gets_a_landing() {
    let mut session = Session::new();
    let hook = session.hook(srcip(1), std::iter::empty()).unwrap();
    let b = session.atom(dstip(2)).unwrap();
    let nfa = Nfa::build([(QueryId(0), &(&hook ^ &b))], session.chargen());

    // L0 accept, L1 second atom, L2 landing, L3 hook, L4 start
    let hook_id = hook.as_leaf().unwrap().id();
    assert_eq!(nfa.hook_at(Label(2)), Some(hook_id));
    assert_eq!(nfa.node(Label(2)), &NfaNode::Split(vec![Label(1)]));
    assert!(nfa.is_significant(Label(2)));
    assert!(matches!(
        nfa.node(Label(3)),
        NfaNode::Consume { next: Label(2), .. }
    ));
}

#[test]
fn each_query_has_its_own_accept() {
    let mut session = Session::new();
    let a = session.atom(srcip(1)).unwrap();
    let b = session.atom(dstip(2)).unwrap();
    let nfa = Nfa::build([(QueryId(0), &a), (QueryId(1), &b)], session.chargen());

    let first = nfa.accept_of(QueryId(0)).unwrap();
    let second = nfa.accept_of(QueryId(1)).unwrap();
    assert_ne!(first, second);
    assert_eq!(nfa.node(second), &NfaNode::Accept(QueryId(1)));

    let NfaNode::Split(entries) = nfa.node(nfa.start()) else {
        panic!("start is not a split");
    };
    assert_eq!(entries.len(), 2);
}

#[test]
fn no_queries() {
    let session = Session::new();
    let nfa = Nfa::build(std::iter::empty(), session.chargen());

    assert_eq!(nfa.len(), 1);
    assert_eq!(nfa.node(nfa.start()), &NfaNode::Split(Vec::new()));
    assert!(!nfa.is_significant(nfa.start()));
}
