//! Explicit traversal stack for the materializer.
//!
//! The frames on the stack are the whole continuation of a suspended
//! traversal: the node each frame visits, where its children iteration
//! stands, and the container being filled.

use jsonslice_core::{ChildCursor, ChildSlot, NodeId};

/// One node being visited.
#[derive(Debug)]
pub struct Frame<V> {
    pub node: NodeId,
    /// Slot in the parent container; `None` for the traversal root.
    pub slot: Option<ChildSlot>,
    /// Children iteration state, set once a container is entered.
    pub cursor: Option<ChildCursor>,
    /// The container being filled.
    pub partial: Option<V>,
}

impl<V> Frame<V> {
    pub fn root(node: NodeId) -> Self {
        Self {
            node,
            slot: None,
            cursor: None,
            partial: None,
        }
    }

    pub fn child(node: NodeId, slot: ChildSlot) -> Self {
        Self {
            node,
            slot: Some(slot),
            cursor: None,
            partial: None,
        }
    }
}

/// Heap-allocated LIFO of frames.
#[derive(Debug)]
pub struct FrameStack<V> {
    frames: Vec<Frame<V>>,
}

impl<V> FrameStack<V> {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    #[inline]
    pub fn push(&mut self, frame: Frame<V>) {
        self.frames.push(frame);
    }

    #[inline]
    pub fn pop(&mut self) -> Option<Frame<V>> {
        self.frames.pop()
    }

    #[inline]
    pub fn top(&self) -> Option<&Frame<V>> {
        self.frames.last()
    }

    #[inline]
    pub fn top_mut(&mut self) -> Option<&mut Frame<V>> {
        self.frames.last_mut()
    }

    /// The frame below the top, owner of the container the top attaches to.
    #[inline]
    pub fn parent(&self) -> Option<&Frame<V>> {
        let len = self.frames.len();
        if len < 2 {
            return None;
        }
        self.frames.get(len - 2)
    }

    /// Current depth; the root frame is depth 0.
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Drop every frame and the partial containers they hold.
    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

impl<V> Default for FrameStack<V> {
    fn default() -> Self {
        Self::new()
    }
}
