use std::cell::RefCell;
use std::num::NonZeroUsize;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use jsonslice_core::DocumentError;

use super::{Budget, Drain, MemoryAccounting, Scheduler};
use crate::Error;
use crate::test_utils::{
    FrozenClock, RecordingLoop, SAMPLE, Signal, SteppingClock, corrupt, doc, first_chain_depth,
    materializer, nested, to_json,
};

fn nodes(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

#[test]
fn small_document_finishes_within_submit() {
    let signals = RecordingLoop::default();
    let mut scheduler = Scheduler::builder()
        .clock(FrozenClock::new())
        .event_loop(signals.clone())
        .build();

    let mut pending = scheduler.submit(materializer(&doc(SAMPLE)));

    let value = pending.try_take().unwrap().unwrap();
    assert_eq!(to_json(&value), SAMPLE);
    assert_eq!(scheduler.pending(), 0);
    assert!(signals.take().is_empty());
}

#[test]
fn one_node_per_slice() {
    let signals = RecordingLoop::default();
    let mut scheduler = Scheduler::builder()
        .clock(FrozenClock::new())
        .nodes_per_slice(nodes(1))
        .event_loop(signals.clone())
        .build();

    let mut pending = scheduler.submit(materializer(&doc(SAMPLE)));
    assert!(pending.try_take().is_none());
    assert_eq!(signals.take(), [Signal::Tick, Signal::KeepAlive(true)]);

    for _ in 0..5 {
        let drain = scheduler.drain();
        assert_eq!(
            drain,
            Drain {
                ran: 1,
                completed: 0,
                remaining: 1
            }
        );
        assert_eq!(signals.take(), [Signal::Tick, Signal::KeepAlive(true)]);
        assert!(pending.try_take().is_none());
    }

    let drain = scheduler.drain();
    assert_eq!(
        drain,
        Drain {
            ran: 1,
            completed: 1,
            remaining: 0
        }
    );
    assert!(drain.is_idle());
    assert_eq!(signals.take(), [Signal::KeepAlive(false)]);
    assert_eq!(to_json(&pending.try_take().unwrap().unwrap()), SAMPLE);
}

#[test]
fn run_queue_is_fifo() {
    let mut scheduler = Scheduler::builder()
        .clock(FrozenClock::new())
        .nodes_per_slice(nodes(1))
        .build();

    let mut long = scheduler.submit(materializer(&doc(SAMPLE)));
    let mut short = scheduler.submit(materializer(&doc("[1]")));
    assert_eq!(scheduler.pending(), 2);

    let drain = scheduler.drain();
    assert_eq!(
        drain,
        Drain {
            ran: 2,
            completed: 1,
            remaining: 1
        }
    );
    assert!(long.try_take().is_none());
    assert_eq!(to_json(&short.try_take().unwrap().unwrap()), "[1]");
}

#[test]
fn drain_stops_when_allowance_is_used() {
    let items = vec!["0"; 50].join(",");
    let text = format!("[{items}]");
    let mut scheduler = Scheduler::builder()
        .clock(SteppingClock::new(Duration::from_millis(1)))
        .budget(Budget::new(Duration::from_millis(2)).unwrap())
        .build();

    let _first = scheduler.submit(materializer(&doc(&text)));
    let _second = scheduler.submit(materializer(&doc(&text)));
    assert_eq!(scheduler.pending(), 2);

    let drain = scheduler.drain();
    assert_eq!(drain.ran, 1);
    assert_eq!(drain.remaining, 2);
}

#[test]
fn failure_does_not_affect_other_continuations() {
    let mut scheduler = Scheduler::builder()
        .clock(FrozenClock::new())
        .nodes_per_slice(nodes(2))
        .build();

    let mut bad = scheduler.submit(materializer(&corrupt("[[1,2],[3,4]]", 10)));
    let mut good = scheduler.submit(materializer(&doc(SAMPLE)));
    while !scheduler.drain().is_idle() {}

    let Some(Err(Error::Document(error))) = bad.try_take() else {
        panic!("expected the corrupt document to fail");
    };
    assert_eq!(
        error,
        DocumentError::UnrecognizedNodeKind {
            tag: b'?',
            index: 10
        }
    );
    assert_eq!(to_json(&good.try_take().unwrap().unwrap()), SAMPLE);
}

#[test]
fn dropped_receiver_still_completes() {
    let signals = RecordingLoop::default();
    let mut scheduler = Scheduler::builder()
        .clock(FrozenClock::new())
        .nodes_per_slice(nodes(1))
        .event_loop(signals.clone())
        .build();

    drop(scheduler.submit(materializer(&doc(SAMPLE))));
    let mut drains = 0;
    while !scheduler.drain().is_idle() {
        drains += 1;
    }

    assert_eq!(drains, 5);
    assert_eq!(signals.take().last(), Some(&Signal::KeepAlive(false)));
}

#[test]
fn dropped_scheduler_abandons_pending() {
    let mut scheduler = Scheduler::builder()
        .clock(FrozenClock::new())
        .nodes_per_slice(nodes(1))
        .build();

    let mut pending = scheduler.submit(materializer(&doc(SAMPLE)));
    drop(scheduler);

    assert!(matches!(pending.try_take(), Some(Err(Error::Abandoned))));
}

#[test]
fn accounting_is_flushed_once_per_drain() {
    let accounting = Arc::new(MemoryAccounting::new());
    let reports = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&reports);
    let mut scheduler = Scheduler::builder()
        .accounting(Arc::clone(&accounting), move |delta: i64| {
            sink.borrow_mut().push(delta)
        })
        .build();

    accounting.adjust(100);
    accounting.adjust(-30);
    scheduler.drain();
    assert_eq!(*reports.borrow(), [70]);

    scheduler.drain();
    assert_eq!(*reports.borrow(), [70]);
    assert_eq!(accounting.peek(), 0);
}

#[test]
fn latency_must_be_positive() {
    let mut scheduler = Scheduler::new();
    assert_eq!(scheduler.budget(), Budget::DEFAULT);
    assert_eq!(scheduler.budget().as_millis(), 5);

    let err = scheduler.set_latency_millis(0).unwrap_err();
    insta::assert_snapshot!(err, @"invalid budget: 0ms (must be a positive duration)");
    assert!(matches!(
        scheduler.set_latency_millis(-5),
        Err(Error::InvalidBudget(_))
    ));
    assert_eq!(scheduler.budget(), Budget::DEFAULT);

    scheduler.set_latency_millis(10).unwrap();
    assert_eq!(scheduler.budget().as_millis(), 10);
}

#[tokio::test]
async fn pending_can_be_awaited() {
    let mut scheduler = Scheduler::builder()
        .clock(FrozenClock::new())
        .nodes_per_slice(nodes(3))
        .build();

    let pending = scheduler.submit(materializer(&doc(SAMPLE)));
    while !scheduler.drain().is_idle() {}

    let value = pending.await.unwrap();
    assert_eq!(to_json(&value), SAMPLE);
}

#[test]
fn deep_documents_drain_to_completion() {
    let depth = 100_000;
    let mut scheduler = Scheduler::builder()
        .clock(FrozenClock::new())
        .nodes_per_slice(nodes(1_000))
        .build();

    let mut ok = scheduler.submit(materializer(&nested(depth, false)));
    let mut broken = scheduler.submit(materializer(&nested(depth, true)));
    while !scheduler.drain().is_idle() {}

    let value = ok.try_take().unwrap().unwrap();
    assert_eq!(first_chain_depth(&value), depth);
    assert!(matches!(
        broken.try_take().unwrap(),
        Err(Error::Document(DocumentError::UnrecognizedNodeKind { tag: b'?', .. }))
    ));
}
