//! Weak identity cache keyed by node.

use std::collections::HashMap;
use std::fmt;

use jsonslice_core::NodeId;

use super::host::Identity;

/// Minimum number of records between sweeps of expired entries.
const SWEEP_FLOOR: usize = 64;

/// The operation a cache serves. Identity is never shared across kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Handle,
    Get,
    Expand,
    Materialize,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperationKind::Handle => "handle",
            OperationKind::Get => "get",
            OperationKind::Expand => "expand",
            OperationKind::Materialize => "materialize",
        })
    }
}

/// Map from node to a weak reference of the value produced for it.
///
/// Entries never keep values alive. An entry whose value was reclaimed is a
/// miss and is erased on lookup or by the periodic sweep in `record`.
pub struct IdentityCache<V: Identity> {
    kind: OperationKind,
    entries: HashMap<NodeId, V::Weak>,
    records_since_sweep: usize,
}

impl<V: Identity> IdentityCache<V> {
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
            records_since_sweep: 0,
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// The live value for `node`, if any.
    pub fn lookup(&mut self, node: NodeId) -> Option<V> {
        let weak = self.entries.get(&node)?;
        match V::upgrade(weak) {
            Some(value) => Some(value),
            None => {
                self.entries.remove(&node);
                None
            }
        }
    }

    /// Remember `value` as the output for `node`.
    ///
    /// Values without identity are ignored. Replacing a live entry panics.
    pub fn record(&mut self, node: NodeId, value: &V) {
        let Some(weak) = value.downgrade() else {
            return;
        };
        self.ensure_vacant(node);
        self.entries.insert(node, weak);

        self.records_since_sweep += 1;
        if self.records_since_sweep >= self.entries.len().max(SWEEP_FLOOR) {
            self.sweep();
        }
    }

    /// Drop every expired entry.
    pub fn sweep(&mut self) {
        self.entries.retain(|_, weak| V::upgrade(weak).is_some());
        self.records_since_sweep = 0;
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn is_live(&self, node: NodeId) -> bool {
        self.entries
            .get(&node)
            .is_some_and(|weak| V::upgrade(weak).is_some())
    }
}

impl<V: Identity> fmt::Debug for IdentityCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityCache")
            .field("kind", &self.kind)
            .field("entries", &self.entries.len())
            .finish()
    }
}
