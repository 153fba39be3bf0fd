//! One-level operations: `get` and `expand`.
//!
//! Both build a single container for a node and fill it without descending.
//! `get` wraps every child in a handle; `expand` builds scalar children and
//! wraps only container children. Scalars are returned as themselves.

use jsonslice_core::{Document, DocumentError, Kind, Node, NodeId};

use super::cache::IdentityCache;
use super::host::{HandleHost, Slot};

pub fn get<H: HandleHost>(
    doc: &Document,
    id: NodeId,
    host: &mut H,
    cache: &mut IdentityCache<H::Value>,
) -> Result<H::Value, DocumentError> {
    shallow(doc, id, host, cache, |host, child| Ok(host.handle(child.id())))
}

pub fn expand<H: HandleHost>(
    doc: &Document,
    id: NodeId,
    host: &mut H,
    cache: &mut IdentityCache<H::Value>,
) -> Result<H::Value, DocumentError> {
    shallow(doc, id, host, cache, |host, child| {
        if child.kind()?.is_container() {
            Ok(host.handle(child.id()))
        } else {
            Ok(host.scalar(child.scalar()?))
        }
    })
}

fn shallow<H, F>(
    doc: &Document,
    id: NodeId,
    host: &mut H,
    cache: &mut IdentityCache<H::Value>,
    mut child_value: F,
) -> Result<H::Value, DocumentError>
where
    H: HandleHost,
    F: FnMut(&mut H, Node<'_>) -> Result<H::Value, DocumentError>,
{
    let node = doc.node(id);
    let kind = node.kind()?;
    if !kind.is_container() {
        return Ok(host.scalar(node.scalar()?));
    }
    if let Some(hit) = cache.lookup(id) {
        return Ok(hit);
    }

    let size = node.size()?;
    let container = match kind {
        Kind::Array => host.array(size),
        _ => host.object(size),
    };
    for (i, child) in node.children().enumerate() {
        let child = child?;
        let value = child_value(host, child.node)?;
        let slot = match child.key {
            Some(key) => Slot::Key(key),
            None => Slot::Index(i),
        };
        host.attach(&container, slot, value);
    }

    cache.record(id, &container);
    Ok(container)
}
