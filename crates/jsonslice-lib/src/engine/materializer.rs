//! Resumable depth-first materialization of a document subtree.
//!
//! The traversal keeps its whole state in an explicit [`FrameStack`], so it
//! can stop after any completed node and continue later from exactly the
//! same place. Each step visits one node:
//!
//! 1. Build its value. Scalars are complete at once; containers are
//!    allocated at their final size and left open. A live cache entry for a
//!    container is reused as-is and not descended into.
//! 2. Attach the value to the parent container right away, or keep it as
//!    the provisional root.
//! 3. Descend into the first child of a fresh non-empty container, or pop
//!    and advance the nearest ancestor that still has children.
//!
//! Containers built by a traversal enter the `Materialize` cache only when
//! the traversal completes. If an interleaved traversal recorded one of the
//! same nodes first, its instance replaces ours in the parent container, so
//! one node never has two live outputs. A corrupt node abandons everything
//! built so far.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

use jsonslice_core::{ChildSlot, Document, DocumentError, Kind, NodeId};

use super::cache::{IdentityCache, OperationKind};
use super::frame::{Frame, FrameStack};
use super::host::{Host, Slot};
use super::invariants::{ensure_cursor, ensure_partial};
use super::slice::{Slice, Unbounded};
use super::trace::{NoopTracer, Tracer};
use crate::Error;

/// Traversal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Not parked at a checkpoint. Also the initial state.
    Running,
    /// Parked at a checkpoint, waiting for the next slice.
    Suspended,
    Done,
    Failed,
}

/// Result of one `resume` call.
#[derive(Debug)]
pub enum Outcome<V> {
    Suspended,
    Done(V),
    Failed(Error),
}

/// Shared per-document cache of materialized containers.
pub type SharedCache<V> = Rc<RefCell<IdentityCache<V>>>;

/// A container built by this traversal.
struct Built<V> {
    node: NodeId,
    value: V,
    /// Parent node, its container and the slot holding `value`.
    parent: Option<(NodeId, V, ChildSlot)>,
}

pub struct Materializer<H: Host> {
    doc: Arc<Document>,
    host: H,
    cache: SharedCache<H::Value>,
    root_id: NodeId,
    frames: FrameStack<H::Value>,
    root: Option<H::Value>,
    /// Containers built by this traversal, recorded on success.
    produced: Vec<Built<H::Value>>,
    state: State,
    nodes: usize,
}

impl<H: Host> Materializer<H> {
    pub fn new(doc: Arc<Document>, root: NodeId, host: H, cache: SharedCache<H::Value>) -> Self {
        let mut frames = FrameStack::new();
        frames.push(Frame::root(root));
        Self {
            doc,
            host,
            cache,
            root_id: root,
            frames,
            root: None,
            produced: Vec::new(),
            state: State::Running,
            nodes: 0,
        }
    }

    /// A materializer with a private cache.
    pub fn uncached(doc: Arc<Document>, root: NodeId, host: H) -> Self {
        let cache = Rc::new(RefCell::new(IdentityCache::new(OperationKind::Materialize)));
        Self::new(doc, root, host, cache)
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn root_id(&self) -> NodeId {
        self.root_id
    }

    /// Nodes completed so far.
    pub fn nodes(&self) -> usize {
        self.nodes
    }

    /// Frames currently on the stack.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Run until the slice expires or the traversal ends.
    ///
    /// The slice is checked after each completed node, never during one.
    /// Panics if the traversal already ended.
    pub fn resume<S, T>(&mut self, slice: &mut S, tracer: &mut T) -> Outcome<H::Value>
    where
        S: Slice + ?Sized,
        T: Tracer,
    {
        self.ensure_resumable();
        self.state = State::Running;
        if self.nodes > 0 {
            tracer.trace_resume(self.frames.depth());
        }

        loop {
            match self.step(tracer) {
                Ok(false) => {}
                Ok(true) => return self.complete(tracer),
                Err(error) => return self.fail(error, tracer),
            }
            if slice.expired() {
                self.state = State::Suspended;
                tracer.trace_suspend(self.frames.depth(), self.nodes);
                return Outcome::Suspended;
            }
        }
    }

    /// Run to completion on the current thread.
    pub fn run(mut self) -> Result<H::Value, Error> {
        match self.resume(&mut Unbounded, &mut NoopTracer) {
            Outcome::Done(value) => Ok(value),
            Outcome::Failed(error) => Err(error),
            Outcome::Suspended => unreachable!("an unbounded slice never expires"),
        }
    }

    /// Visit the node on top of the stack. Returns `true` once the stack is
    /// empty.
    fn step<T: Tracer>(&mut self, tracer: &mut T) -> Result<bool, DocumentError> {
        let doc = &*self.doc;
        let depth = self.frames.depth();
        let Some(frame) = self.frames.top() else {
            return Ok(true);
        };
        let (id, slot) = (frame.node, frame.slot);
        let node = doc.node(id);
        let kind = node.kind()?;

        let mut entered = None;
        let value = if kind.is_container() {
            let hit = self.cache.borrow_mut().lookup(id);
            match hit {
                Some(value) => {
                    tracer.trace_cache_hit(depth, slot, node);
                    value
                }
                None => {
                    let size = node.size()?;
                    let value = match kind {
                        Kind::Array => self.host.array(size),
                        _ => self.host.object(size),
                    };
                    entered = doc.cursor(id)?;
                    let parent = match (self.frames.parent(), slot) {
                        (Some(parent), Some(slot)) => {
                            Some((parent.node, ensure_partial(parent).clone(), slot))
                        }
                        _ => None,
                    };
                    self.produced.push(Built {
                        node: id,
                        value: value.clone(),
                        parent,
                    });
                    tracer.trace_node(depth, slot, node);
                    value
                }
            }
        } else {
            let value = self.host.scalar(node.scalar()?);
            tracer.trace_node(depth, slot, node);
            value
        };
        self.nodes += 1;

        match (self.frames.parent(), slot) {
            (Some(parent), Some(slot)) => {
                let slot = match slot {
                    ChildSlot::Index(i) => Slot::Index(i),
                    ChildSlot::Key(key) => Slot::Key(doc.key(key)?),
                };
                self.host.attach(ensure_partial(parent), slot, value.clone());
            }
            _ => self.root = Some(value.clone()),
        }

        if let Some(mut cursor) = entered
            && let Some((slot, child)) = doc.next_child(&mut cursor)?
        {
            if let Some(top) = self.frames.top_mut() {
                top.cursor = Some(cursor);
                top.partial = Some(value);
            }
            self.frames.push(Frame::child(child, slot));
            return Ok(false);
        }

        self.frames.pop();
        while let Some(top) = self.frames.top_mut() {
            match doc.next_child(ensure_cursor(top))? {
                Some((slot, child)) => {
                    self.frames.push(Frame::child(child, slot));
                    return Ok(false);
                }
                None => {
                    self.frames.pop();
                }
            }
        }
        Ok(true)
    }

    fn complete<T: Tracer>(&mut self, tracer: &mut T) -> Outcome<H::Value> {
        match self.commit() {
            Ok(root) => {
                self.state = State::Done;
                tracer.trace_done(self.nodes);
                Outcome::Done(root)
            }
            Err(error) => self.fail(error, tracer),
        }
    }

    /// Record the containers this traversal built, deferring to live
    /// instances another traversal recorded first.
    fn commit(&mut self) -> Result<H::Value, DocumentError> {
        let Some(mut root) = self.root.take() else {
            unreachable!("a finished traversal always has a root")
        };

        let mut cache = self.cache.borrow_mut();
        let mut superseded = HashSet::new();
        let mut fresh = Vec::with_capacity(self.produced.len());
        for built in self.produced.drain(..) {
            // Descendants of a replaced container are unreachable.
            if let Some((parent, _, _)) = &built.parent
                && superseded.contains(parent)
            {
                superseded.insert(built.node);
                continue;
            }
            let Some(existing) = cache.lookup(built.node) else {
                fresh.push((built.node, built.value));
                continue;
            };
            superseded.insert(built.node);
            match built.parent {
                Some((_, parent, slot)) => {
                    let slot = match slot {
                        ChildSlot::Index(i) => Slot::Index(i),
                        ChildSlot::Key(key) => Slot::Key(self.doc.key(key)?),
                    };
                    self.host.attach(&parent, slot, existing);
                }
                None => root = existing,
            }
        }

        for (node, value) in fresh {
            cache.record(node, &value);
        }
        Ok(root)
    }

    fn fail<T: Tracer>(&mut self, error: DocumentError, tracer: &mut T) -> Outcome<H::Value> {
        self.frames.clear();
        self.produced.clear();
        self.root = None;
        self.state = State::Failed;
        tracer.trace_failed(&error);
        Outcome::Failed(error.into())
    }
}
