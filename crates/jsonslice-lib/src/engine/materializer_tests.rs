use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use jsonslice_core::{Colors, DocumentError, NodeId};

use super::{
    IdentityCache, Materializer, NoopTracer, OperationKind, Outcome, PrintTracer, State,
    StepSlice, Unbounded, Verbosity,
};
use crate::test_utils::{
    SAMPLE, corrupt, doc, drive, first_chain_depth, materializer, nested, to_json,
};
use crate::{DomHost, Error, Value};

const DEEP: usize = 100_000;

fn done(outcome: Outcome<Value>) -> Value {
    match outcome {
        Outcome::Done(value) => value,
        other => panic!("expected Done, got {other:?}"),
    }
}

#[test]
fn materializes_full_shape() {
    let value = materializer(&doc(SAMPLE)).run().unwrap();

    assert_eq!(to_json(&value), SAMPLE);
    let b = value.member("a").unwrap().at(2).unwrap().member("b").unwrap();
    assert_eq!(b, Value::Null);
}

#[test]
fn scalar_root() {
    let value = materializer(&doc(r#""hello""#)).run().unwrap();
    assert_eq!(value, Value::String("hello".to_owned()));
}

#[test]
fn suspends_after_every_node() {
    let doc = doc(SAMPLE);
    let mut m = materializer(&doc);

    let (outcome, suspensions) = drive(&mut m, || StepSlice::new(1), &mut NoopTracer);

    assert_eq!(to_json(&done(outcome)), SAMPLE);
    assert_eq!(suspensions, 6);
    assert_eq!(m.nodes(), 7);
    assert_eq!(m.state(), State::Done);
}

#[test]
fn sliced_matches_unsliced_for_any_slice_size() {
    let text = r#"{"xs":[[],{},[1,[2,[3]]],{"k":{"k":{"k":"v"}}}],"n":-1.5,"t":true}"#;
    let doc = doc(text);
    let expected = materializer(&doc).run().unwrap();

    for nodes in 1..=12 {
        let mut m = materializer(&doc);
        let (outcome, _) = drive(&mut m, || StepSlice::new(nodes), &mut NoopTracer);
        assert_eq!(done(outcome), expected, "slice of {nodes} nodes");
    }
}

#[test]
fn fresh_and_suspended_states_are_resumable() {
    let doc = doc(SAMPLE);
    let mut m = materializer(&doc);

    assert_eq!(m.state(), State::Running);
    assert!(matches!(
        m.resume(&mut StepSlice::new(2), &mut NoopTracer),
        Outcome::Suspended
    ));
    assert_eq!(m.state(), State::Suspended);
    assert_eq!(m.nodes(), 2);
    assert_eq!(m.depth(), 3);

    let value = done(m.resume(&mut Unbounded, &mut NoopTracer));
    assert_eq!(to_json(&value), SAMPLE);
}

#[test]
fn corrupt_node_fails_without_partial_result() {
    // [[1,2],[3,4]]: word 10 holds the `4`.
    let doc = corrupt("[[1,2],[3,4]]", 10);
    let cache = Rc::new(RefCell::new(IdentityCache::new(OperationKind::Materialize)));
    let mut m = Materializer::new(Arc::clone(&doc), NodeId::ROOT, DomHost, Rc::clone(&cache));

    let (outcome, suspensions) = drive(&mut m, || StepSlice::new(2), &mut NoopTracer);

    let Outcome::Failed(Error::Document(error)) = outcome else {
        panic!("expected a document error, got {outcome:?}");
    };
    assert_eq!(
        error,
        DocumentError::UnrecognizedNodeKind {
            tag: b'?',
            index: 10
        }
    );
    assert!(suspensions > 0);
    assert_eq!(m.state(), State::Failed);
    assert_eq!(m.depth(), 0);
    assert!(cache.borrow().is_empty());
}

#[test]
#[should_panic(expected = "after the traversal finished")]
fn resume_after_done_panics() {
    let doc = doc("[1]");
    let mut m = materializer(&doc);
    let _ = m.resume(&mut Unbounded, &mut NoopTracer);
    let _ = m.resume(&mut Unbounded, &mut NoopTracer);
}

#[test]
fn repeated_materialization_returns_live_instance() {
    let doc = doc(SAMPLE);
    let cache = Rc::new(RefCell::new(IdentityCache::new(OperationKind::Materialize)));
    let run = || Materializer::new(Arc::clone(&doc), NodeId::ROOT, DomHost, Rc::clone(&cache)).run();

    let first = run().unwrap();
    let second = run().unwrap();
    assert!(first.ptr_eq(&second));

    drop(first);
    drop(second);
    assert!(cache.borrow_mut().lookup(NodeId::ROOT).is_none());

    let third = run().unwrap();
    assert_eq!(to_json(&third), SAMPLE);
}

#[test]
fn cached_subtree_is_reused_without_descent() {
    let doc = doc(SAMPLE);
    let cache = Rc::new(RefCell::new(IdentityCache::new(OperationKind::Materialize)));
    let a_id = doc.resolve("/a").unwrap().id();

    let a = Materializer::new(Arc::clone(&doc), a_id, DomHost, Rc::clone(&cache))
        .run()
        .unwrap();

    let mut tracer = PrintTracer::new(Verbosity::Verbose, Colors::OFF);
    let mut m = Materializer::new(Arc::clone(&doc), NodeId::ROOT, DomHost, Rc::clone(&cache));
    let root = done(m.resume(&mut Unbounded, &mut tracer));

    assert!(root.member("a").unwrap().ptr_eq(&a));
    assert_eq!(m.nodes(), 3);
    insta::assert_snapshot!(tracer.lines().join("\n"), @r#"
    object #0
      "a": array #2 (cached)
      "c": string #13
    ~ done, 3 nodes
    "#);
}

#[test]
fn concurrent_completion_delivers_first_instance() {
    let doc = doc(SAMPLE);
    let cache = Rc::new(RefCell::new(IdentityCache::new(OperationKind::Materialize)));
    let mut first = Materializer::new(Arc::clone(&doc), NodeId::ROOT, DomHost, Rc::clone(&cache));
    let mut second = Materializer::new(Arc::clone(&doc), NodeId::ROOT, DomHost, Rc::clone(&cache));

    // Both start building before either finishes.
    assert!(matches!(
        first.resume(&mut StepSlice::new(2), &mut NoopTracer),
        Outcome::Suspended
    ));
    assert!(matches!(
        second.resume(&mut StepSlice::new(2), &mut NoopTracer),
        Outcome::Suspended
    ));

    let a = done(first.resume(&mut Unbounded, &mut NoopTracer));
    let b = done(second.resume(&mut Unbounded, &mut NoopTracer));
    assert!(a.ptr_eq(&b));
}

#[test]
fn trace_shows_slices() {
    let doc = doc(SAMPLE);
    let mut m = materializer(&doc);
    let mut tracer = PrintTracer::new(Verbosity::Verbose, Colors::OFF);

    drive(&mut m, || StepSlice::new(3), &mut tracer);

    insta::assert_snapshot!(tracer.lines().join("\n"), @r#"
    object #0
      "a": array #2
        [0] number #3
    ~ suspended at depth 2 after 3 nodes
    ~ resumed at depth 2
        [1] number #5
        [2] object #7
          "b": null #9
    ~ suspended at depth 1 after 6 nodes
    ~ resumed at depth 1
      "c": string #13
    ~ done, 7 nodes
    "#);
}

#[test]
fn very_verbose_trace_shows_scalars() {
    let doc = doc(r#"["x",1.5,null]"#);
    let mut m = materializer(&doc);
    let mut tracer = PrintTracer::new(Verbosity::VeryVerbose, Colors::OFF);

    drive(&mut m, || Unbounded, &mut tracer);

    insta::assert_snapshot!(tracer.lines().join("\n"), @r#"
    array #0
      [0] string #1 "x"
      [1] number #2 1.5
      [2] null #4 null
    ~ done, 4 nodes
    "#);
}

#[test]
fn interleaved_subtree_replaces_own_copy() {
    let doc = doc(SAMPLE);
    let cache = Rc::new(RefCell::new(IdentityCache::new(OperationKind::Materialize)));
    let a2 = doc.resolve("/a/2").unwrap().id();
    let run_a2 = || Materializer::new(Arc::clone(&doc), a2, DomHost, Rc::clone(&cache)).run();

    // The root traversal builds its own /a/2 and parks before finishing.
    let mut m = Materializer::new(Arc::clone(&doc), NodeId::ROOT, DomHost, Rc::clone(&cache));
    assert!(matches!(
        m.resume(&mut StepSlice::new(6), &mut NoopTracer),
        Outcome::Suspended
    ));
    let sub = run_a2().unwrap();
    let root = done(m.resume(&mut Unbounded, &mut NoopTracer));

    assert!(root.member("a").unwrap().at(2).unwrap().ptr_eq(&sub));
    assert!(run_a2().unwrap().ptr_eq(&sub));
    assert_eq!(to_json(&root), SAMPLE);
}

#[test]
fn interleaved_member_keeps_key_position() {
    let doc = doc(SAMPLE);
    let cache = Rc::new(RefCell::new(IdentityCache::new(OperationKind::Materialize)));
    let a = doc.resolve("/a").unwrap().id();
    let a2 = doc.resolve("/a/2").unwrap().id();

    let mut m = Materializer::new(Arc::clone(&doc), NodeId::ROOT, DomHost, Rc::clone(&cache));
    assert!(matches!(
        m.resume(&mut StepSlice::new(3), &mut NoopTracer),
        Outcome::Suspended
    ));
    let sub = Materializer::new(Arc::clone(&doc), a, DomHost, Rc::clone(&cache))
        .run()
        .unwrap();
    let root = done(m.resume(&mut Unbounded, &mut NoopTracer));

    assert!(root.member("a").unwrap().ptr_eq(&sub));
    assert_eq!(to_json(&root), SAMPLE);
    let cached = cache.borrow_mut().lookup(a2).unwrap();
    assert!(cached.ptr_eq(&sub.at(2).unwrap()));
    assert!(cache.borrow_mut().lookup(NodeId::ROOT).unwrap().ptr_eq(&root));
}

#[test]
fn deep_nesting_materializes_and_drops() {
    let doc = nested(DEEP, false);
    let value = materializer(&doc).run().unwrap();

    assert_eq!(first_chain_depth(&value), DEEP);
    drop(value);
}

#[test]
fn deep_nesting_one_node_per_slice() {
    let doc = nested(DEEP, false);
    let mut m = materializer(&doc);

    let (outcome, suspensions) = drive(&mut m, || StepSlice::new(1), &mut NoopTracer);

    assert_eq!(suspensions, DEEP);
    assert_eq!(first_chain_depth(&done(outcome)), DEEP);
}

fn expect_deep_leaf_failure(outcome: Outcome<Value>) {
    let Outcome::Failed(Error::Document(error)) = outcome else {
        panic!("expected a document error");
    };
    assert_eq!(
        error,
        DocumentError::UnrecognizedNodeKind {
            tag: b'?',
            index: DEEP as u32
        }
    );
}

#[test]
fn deep_corrupt_leaf_fails() {
    let doc = nested(DEEP, true);
    let mut m = materializer(&doc);

    expect_deep_leaf_failure(m.resume(&mut Unbounded, &mut NoopTracer));
    assert_eq!(m.state(), State::Failed);
    assert_eq!(m.depth(), 0);
}

#[test]
fn deep_corrupt_leaf_fails_one_node_per_slice() {
    let doc = nested(DEEP, true);
    let cache = Rc::new(RefCell::new(IdentityCache::new(OperationKind::Materialize)));
    let mut m = Materializer::new(Arc::clone(&doc), NodeId::ROOT, DomHost, Rc::clone(&cache));

    let (outcome, suspensions) = drive(&mut m, || StepSlice::new(1), &mut NoopTracer);

    expect_deep_leaf_failure(outcome);
    assert_eq!(suspensions, DEEP);
    assert!(cache.borrow().is_empty());
}
