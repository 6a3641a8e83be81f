use std::sync::Arc;

use pathq_core::{BucketId, Field, Policy};

use crate::compile::PathQuery;
use crate::test_utils::srcip;
use crate::{CompileError, PathQueryService, Session};

#[test]
fn starts_with_forwarding_alone() {
    let service = PathQueryService::new(Session::new(), Policy::fwd(1));
    let current = service.current();

    assert_eq!(current.policy(), &Policy::fwd(1));
    assert_eq!(current.stats().queries, 0);
}

#[test]
fn recompile_publishes() {
    let service = PathQueryService::new(Session::new(), Policy::fwd(1));
    let a = service.with_session(|s| s.atom(srcip(1))).unwrap();

    let compiled = service
        .recompile(&[PathQuery::new(a, BucketId(1))], &Policy::fwd(1))
        .unwrap();

    assert!(Arc::ptr_eq(&compiled, &service.current()));
    assert_eq!(service.current().stats().queries, 1);
}

#[test]
fn failed_recompile_keeps_previous_result() {
    let service = PathQueryService::new(Session::new(), Policy::fwd(1));
    let a = service.with_session(|s| s.atom(srcip(1))).unwrap();
    let good = service
        .recompile(&[PathQuery::new(a.clone(), BucketId(1))], &Policy::fwd(1))
        .unwrap();

    let err = service
        .recompile(
            &[PathQuery::new(a, BucketId(1))],
            &Policy::modify(Field::PathTag, 3u64),
        )
        .unwrap_err();

    assert_eq!(err, CompileError::ReservedField(Field::PathTag));
    assert!(Arc::ptr_eq(&good, &service.current()));
}

#[test]
fn reset_leaves_published_result() {
    let service = PathQueryService::new(Session::new(), Policy::fwd(1));
    let a = service.with_session(|s| s.atom(srcip(1))).unwrap();
    service
        .recompile(&[PathQuery::new(a.clone(), BucketId(1))], &Policy::fwd(1))
        .unwrap();

    service.reset();

    assert_eq!(service.current().stats().queries, 1);
    assert!(matches!(
        service.recompile(&[PathQuery::new(a, BucketId(1))], &Policy::fwd(1)),
        Err(CompileError::StaleAtom(_))
    ));
}

#[test]
fn readers_on_other_threads_see_published_results() {
    let service = Arc::new(PathQueryService::new(Session::new(), Policy::Identity));
    let a = service.with_session(|s| s.atom(srcip(1))).unwrap();
    service
        .recompile(&[PathQuery::new(a, BucketId(1))], &Policy::Identity)
        .unwrap();

    let reader = Arc::clone(&service);
    let queries = std::thread::spawn(move || reader.current().stats().queries)
        .join()
        .unwrap();
    assert_eq!(queries, 1);
}
