//! Invariant checks excluded from coverage reports.

#![cfg_attr(coverage_nightly, coverage(off))]

use crate::tape::{OpenContainer, TapeBuilder};

impl TapeBuilder {
    pub(crate) fn ensure_key_allowed(&self) {
        match self.open.last() {
            Some(top) if top.object && !top.pending_key => {}
            Some(top) if top.object => {
                panic!("TapeBuilder: key written while the previous key still awaits its value")
            }
            _ => panic!("TapeBuilder: key written outside of an object"),
        }
    }

    pub(crate) fn ensure_member_key(pending_key: bool) {
        if !pending_key {
            panic!("TapeBuilder: object member value written without a key");
        }
    }

    pub(crate) fn ensure_single_root(roots: usize) {
        if roots != 0 {
            panic!("TapeBuilder: a document holds exactly one root value");
        }
    }

    pub(crate) fn ensure_open(&mut self, object: bool) -> OpenContainer {
        let expected = if object { "object" } else { "array" };
        let Some(top) = self.open.pop() else {
            panic!("TapeBuilder: end_{expected} without a matching begin_{expected}");
        };
        if top.object != object {
            panic!("TapeBuilder: end_{expected} closes a container of the other kind");
        }
        if top.pending_key {
            panic!("TapeBuilder: end_object after a key without a value");
        }
        top
    }

    pub(crate) fn ensure_closed(&self) {
        if !self.open.is_empty() {
            panic!(
                "TapeBuilder: finish with {} container(s) still open",
                self.open.len()
            );
        }
    }
}
