//! Invariant checks excluded from coverage reports.

#![cfg_attr(coverage_nightly, coverage(off))]

use jsonslice_core::NodeId;

use super::cache::IdentityCache;
use super::frame::Frame;
use super::host::{Host, Identity};
use super::materializer::{Materializer, State};

impl<V: Identity> IdentityCache<V> {
    pub(crate) fn ensure_vacant(&self, node: NodeId) {
        if self.is_live(node) {
            panic!(
                "IdentityCache({}): live entry for node {node} would be overwritten",
                self.kind()
            );
        }
    }
}

impl<H: Host> Materializer<H> {
    pub(crate) fn ensure_resumable(&self) {
        match self.state() {
            State::Running | State::Suspended => {}
            State::Done | State::Failed => {
                panic!("Materializer: resume after the traversal finished ({:?})", self.state())
            }
        }
    }
}

/// Container frames keep their value while children are attached.
pub(crate) fn ensure_partial<V>(frame: &Frame<V>) -> &V {
    frame.partial.as_ref().unwrap_or_else(|| {
        panic!(
            "Materializer: parent frame for node {} has no container",
            frame.node
        )
    })
}

pub(crate) fn ensure_cursor<V>(frame: &mut Frame<V>) -> &mut jsonslice_core::ChildCursor {
    let node = frame.node;
    frame
        .cursor
        .as_mut()
        .unwrap_or_else(|| panic!("Materializer: frame for node {node} was never entered"))
}
