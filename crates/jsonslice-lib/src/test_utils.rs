use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonslice_core::{Document, NodeId, TapeBuilder, tape};

use crate::engine::{Clock, EventLoop, Materializer, Outcome, Slice, Tracer};
use crate::{DomHost, Value};

pub const SAMPLE: &str = r#"{"a":[1,2,{"b":null}],"c":"x"}"#;

/// Clock that never moves, so time budgets never expire.
pub struct FrozenClock(Instant);

impl FrozenClock {
    pub fn new() -> Self {
        Self(Instant::now())
    }
}

impl Clock for FrozenClock {
    fn now(&self) -> Instant {
        self.0
    }
}

/// Clock that advances by `step` every time it is read.
pub struct SteppingClock {
    now: Cell<Instant>,
    step: Duration,
}

impl SteppingClock {
    pub fn new(step: Duration) -> Self {
        Self {
            now: Cell::new(Instant::now()),
            step,
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> Instant {
        let now = self.now.get();
        self.now.set(now + self.step);
        now
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    Tick,
    KeepAlive(bool),
}

/// Event loop recording every signal it receives.
#[derive(Clone, Default)]
pub struct RecordingLoop(Rc<RefCell<Vec<Signal>>>);

impl RecordingLoop {
    pub fn take(&self) -> Vec<Signal> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

impl EventLoop for RecordingLoop {
    fn request_tick(&mut self) {
        self.0.borrow_mut().push(Signal::Tick);
    }

    fn set_keep_alive(&mut self, alive: bool) {
        self.0.borrow_mut().push(Signal::KeepAlive(alive));
    }
}

pub fn doc(text: &str) -> Arc<Document> {
    Arc::new(Document::parse(text).unwrap())
}

/// Parse `text` and replace the word at `index` with an unknown tag.
pub fn corrupt(text: &str, index: usize) -> Arc<Document> {
    let parsed = Document::parse(text).unwrap();
    let mut words = parsed.tape().to_vec();
    words[index] = tape::word(b'?', 0);
    Arc::new(Document::from_raw_parts(words, parsed.strings().to_vec()))
}

/// `depth` nested arrays around a single `null`, which sits at tape index
/// `depth`. With `corrupt_leaf` the leaf carries an unknown tag.
pub fn nested(depth: usize, corrupt_leaf: bool) -> Arc<Document> {
    let mut b = TapeBuilder::new();
    for _ in 0..depth {
        b.begin_array();
    }
    b.null();
    for _ in 0..depth {
        b.end_array();
    }
    let built = b.finish().unwrap();
    if !corrupt_leaf {
        return Arc::new(built);
    }
    let mut words = built.tape().to_vec();
    words[depth] = tape::word(b'?', 0);
    Arc::new(Document::from_raw_parts(words, built.strings().to_vec()))
}

/// Nesting depth of the first-element chain below `value`.
pub fn first_chain_depth(value: &Value) -> usize {
    let mut depth = 0;
    let mut current = value.at(0);
    while let Some(next) = current {
        depth += 1;
        current = next.at(0);
    }
    depth
}

pub fn materializer(doc: &Arc<Document>) -> Materializer<DomHost> {
    Materializer::uncached(Arc::clone(doc), NodeId::ROOT, DomHost)
}

/// Resume with fresh slices from `slice` until the traversal ends.
/// Returns the outcome and the number of suspensions.
pub fn drive<S, T>(
    m: &mut Materializer<DomHost>,
    mut slice: impl FnMut() -> S,
    tracer: &mut T,
) -> (Outcome<Value>, usize)
where
    S: Slice,
    T: Tracer,
{
    let mut suspensions = 0;
    loop {
        match m.resume(&mut slice(), tracer) {
            Outcome::Suspended => suspensions += 1,
            outcome => return (outcome, suspensions),
        }
    }
}

pub fn to_json(value: &Value) -> String {
    serde_json::to_string(value).unwrap()
}
