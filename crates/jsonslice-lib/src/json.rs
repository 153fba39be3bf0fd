//! Handles: lazy, identity-cached references into a parsed document.
//!
//! Every handle of one parse shares a session holding the document and one
//! identity cache per operation kind. Handles themselves are cached too, so
//! reaching the same node through `get`, `expand` or `path` yields the same
//! handle instance while it is alive.

use std::cell::RefCell;
use std::fmt;
use std::rc::{self, Rc};
use std::sync::Arc;

use jsonslice_core::{Document, Kind, Node, NodeId, Scalar};
use serde::{Serialize, Serializer};
use tokio::sync::oneshot;

use crate::engine::{
    self, Clock, HandleHost, Host, IdentityCache, Identity, Materializer, MemoryAccounting,
    OperationKind, Pending, Retention, Scheduler, SharedCache, Slot,
};
use crate::value::{DomHost, Value};
use crate::{Error, Result};

struct Session {
    doc: Arc<Document>,
    handles: RefCell<IdentityCache<Json>>,
    gets: RefCell<IdentityCache<Value>>,
    expands: RefCell<IdentityCache<Value>>,
    materialized: SharedCache<Value>,
    _retention: Option<Retention>,
}

impl Session {
    fn handle(self: &Rc<Self>, node: NodeId) -> Json {
        let mut handles = self.handles.borrow_mut();
        if let Some(handle) = handles.lookup(node) {
            return handle;
        }
        let handle = Json(Rc::new(JsonInner {
            session: Rc::clone(self),
            node,
        }));
        handles.record(node, &handle);
        handle
    }
}

struct JsonInner {
    session: Rc<Session>,
    node: NodeId,
}

/// Handle to one node of a parsed document.
#[derive(Clone)]
pub struct Json(Rc<JsonInner>);

/// Weak counterpart of [`Json`].
#[derive(Clone, Debug)]
pub struct WeakJson(rc::Weak<JsonInner>);

impl Identity for Json {
    type Weak = WeakJson;

    fn downgrade(&self) -> Option<WeakJson> {
        Some(WeakJson(Rc::downgrade(&self.0)))
    }

    fn upgrade(weak: &WeakJson) -> Option<Json> {
        weak.0.upgrade().map(Json)
    }
}

impl Json {
    /// Parse on the current thread.
    pub fn parse(text: impl Into<Vec<u8>>) -> Result<Json> {
        let doc = Document::parse(text)?;
        Ok(Self::open(Arc::new(doc), None))
    }

    /// Parse and account the document's native memory until the last
    /// handle (or in-flight materialization) is dropped.
    pub fn parse_tracked(text: impl Into<Vec<u8>>, accounting: &Arc<MemoryAccounting>) -> Result<Json> {
        let doc = Document::parse(text)?;
        let retention = Retention::retain(accounting, doc.retained_bytes());
        Ok(Self::open(Arc::new(doc), Some(retention)))
    }

    /// Parse on a worker thread without blocking the caller.
    ///
    /// The worker reports the retained bytes through `accounting`; the
    /// handle releases them when dropped.
    pub async fn parse_async(
        text: impl Into<Vec<u8>>,
        accounting: Option<Arc<MemoryAccounting>>,
    ) -> Result<Json> {
        let input = text.into();
        let (tx, rx) = oneshot::channel();
        let worker_accounting = accounting.clone();

        std::thread::Builder::new()
            .name("jsonslice-parse".to_owned())
            .spawn(move || {
                let parsed = Document::parse(input);
                if let (Ok(doc), Some(accounting)) = (&parsed, &worker_accounting) {
                    accounting.adjust(bytes_of(doc));
                }
                // Nobody awaits the result any more: undo the report.
                if let Err(Ok(doc)) = tx.send(parsed)
                    && let Some(accounting) = &worker_accounting
                {
                    accounting.adjust(-bytes_of(&doc));
                }
            })
            .map_err(|_| Error::WorkerLost)?;

        let doc = rx.await.map_err(|_| Error::WorkerLost)??;
        let retention = accounting.map(|a| Retention::adopt(&a, doc.retained_bytes()));
        Ok(Self::open(Arc::new(doc), retention))
    }

    /// Wrap an existing document.
    pub fn from_document(doc: Arc<Document>) -> Json {
        Self::open(doc, None)
    }

    fn open(doc: Arc<Document>, retention: Option<Retention>) -> Json {
        let session = Rc::new(Session {
            doc,
            handles: RefCell::new(IdentityCache::new(OperationKind::Handle)),
            gets: RefCell::new(IdentityCache::new(OperationKind::Get)),
            expands: RefCell::new(IdentityCache::new(OperationKind::Expand)),
            materialized: Rc::new(RefCell::new(IdentityCache::new(OperationKind::Materialize))),
            _retention: retention,
        });
        session.handle(NodeId::ROOT)
    }

    pub fn node_id(&self) -> NodeId {
        self.0.node
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.0.session.doc
    }

    fn node(&self) -> Node<'_> {
        self.0.session.doc.node(self.0.node)
    }

    pub fn kind(&self) -> Result<Kind> {
        Ok(self.node().kind()?)
    }

    /// Same handle instance.
    pub fn ptr_eq(&self, other: &Json) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Same node of the same document, possibly through different handles.
    pub fn same_node(&self, other: &Json) -> bool {
        self.0.node == other.0.node && Arc::ptr_eq(self.document(), other.document())
    }

    /// Scalars as themselves; containers one level deep, every child a
    /// handle.
    pub fn get(&self) -> Result<Value> {
        let session = &self.0.session;
        let mut cache = session.gets.borrow_mut();
        let value = engine::get(&session.doc, self.0.node, &mut SessionHost(session), &mut cache)?;
        Ok(value)
    }

    /// Like `get`, but scalar children are built in place.
    pub fn expand(&self) -> Result<Value> {
        let session = &self.0.session;
        let mut cache = session.expands.borrow_mut();
        let value =
            engine::expand(&session.doc, self.0.node, &mut SessionHost(session), &mut cache)?;
        Ok(value)
    }

    /// Handle for the node at a JSON Pointer relative to this one.
    pub fn path(&self, path: &str) -> Result<Json> {
        let target = self.node().resolve(path)?.id();
        Ok(self.0.session.handle(target))
    }

    /// Build the whole subtree, blocking until done.
    pub fn to_object(&self) -> Result<Value> {
        self.materializer().run()
    }

    /// Build the whole subtree in slices driven by `scheduler`.
    pub fn to_object_async<C: Clock>(&self, scheduler: &mut Scheduler<C>) -> Pending<Value> {
        scheduler.submit(self.materializer())
    }

    /// A fresh traversal of this subtree sharing the session's cache.
    pub fn materializer(&self) -> Materializer<PinnedHost> {
        let session = &self.0.session;
        Materializer::new(
            Arc::clone(&session.doc),
            self.0.node,
            PinnedHost {
                _session: Rc::clone(session),
            },
            Rc::clone(&session.materialized),
        )
    }
}

impl fmt::Debug for Json {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Json({})", self.0.node)
    }
}

impl Serialize for Json {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.node().serialize(serializer)
    }
}

/// Builds [`Value`]s while keeping the session (and its accounted memory)
/// alive for the duration of a traversal.
pub struct PinnedHost {
    _session: Rc<Session>,
}

impl Host for PinnedHost {
    type Value = Value;

    fn scalar(&mut self, scalar: Scalar<'_>) -> Value {
        DomHost.scalar(scalar)
    }

    fn array(&mut self, len: usize) -> Value {
        DomHost.array(len)
    }

    fn object(&mut self, len: usize) -> Value {
        DomHost.object(len)
    }

    fn attach(&mut self, parent: &Value, slot: Slot<'_>, child: Value) {
        DomHost.attach(parent, slot, child)
    }
}

struct SessionHost<'s>(&'s Rc<Session>);

impl Host for SessionHost<'_> {
    type Value = Value;

    fn scalar(&mut self, scalar: Scalar<'_>) -> Value {
        DomHost.scalar(scalar)
    }

    fn array(&mut self, len: usize) -> Value {
        DomHost.array(len)
    }

    fn object(&mut self, len: usize) -> Value {
        DomHost.object(len)
    }

    fn attach(&mut self, parent: &Value, slot: Slot<'_>, child: Value) {
        DomHost.attach(parent, slot, child)
    }
}

impl HandleHost for SessionHost<'_> {
    fn handle(&mut self, node: NodeId) -> Value {
        Value::Handle(self.0.handle(node))
    }
}

fn bytes_of(doc: &Document) -> i64 {
    i64::try_from(doc.retained_bytes()).unwrap_or(i64::MAX)
}
