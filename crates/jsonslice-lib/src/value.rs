//! Default host values.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use jsonslice_core::{Colors, Scalar};
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::engine::{Host, Identity, Slot};
use crate::json::{Json, WeakJson};

pub type Array = Rc<RefCell<Vec<Value>>>;
pub type Object = Rc<RefCell<IndexMap<String, Value>>>;

/// Materialized JSON with shared, mutable containers.
///
/// Containers have identity: clones share storage, and [`Value::ptr_eq`]
/// tells two instances apart even when their contents are equal.
///
/// Dropping, comparing and formatting walk the tree with a heap worklist,
/// so any nesting depth is fine. `Serialize` and `Debug` recurse once per
/// level and need a native stack proportional to the depth.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Array),
    /// Members in document order. A repeated key keeps its first position
    /// and its last value.
    Object(Object),
    /// Lazy reference to a node not built yet.
    Handle(Json),
}

impl Value {
    /// Same instance. Scalars are never the same instance.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Handle(a), Value::Handle(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_handle(&self) -> Option<&Json> {
        match self {
            Value::Handle(h) => Some(h),
            _ => None,
        }
    }

    /// Array element by position.
    pub fn at(&self, index: usize) -> Option<Value> {
        self.as_array()?.borrow().get(index).cloned()
    }

    /// Object member by key.
    pub fn member(&self, key: &str) -> Option<Value> {
        self.as_object()?.borrow().get(key).cloned()
    }

    /// Format value as colored JSON.
    ///
    /// Keys are blue, strings green, `null` dim. Handles render as
    /// `<kind #id>` without reading their subtree.
    pub fn format(&self, pretty: bool, colors: Colors) -> String {
        let mut out = String::new();
        format_value(&mut out, self, &colors, pretty);
        out
    }
}

impl From<Scalar<'_>> for Value {
    fn from(scalar: Scalar<'_>) -> Self {
        match scalar {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(b),
            Scalar::Int(n) => Value::Number(n.into()),
            Scalar::UInt(n) => Value::Number(n.into()),
            // JSON has no NaN or infinities.
            Scalar::Float(n) => serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number),
            Scalar::Str(s) => Value::String(s.to_owned()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self.clone(), other.clone())];
        while let Some((a, b)) = pending.pop() {
            let same = match (&a, &b) {
                (Value::Null, Value::Null) => true,
                (Value::Bool(a), Value::Bool(b)) => a == b,
                (Value::Number(a), Value::Number(b)) => a == b,
                (Value::String(a), Value::String(b)) => a == b,
                (Value::Array(a), Value::Array(b)) => {
                    Rc::ptr_eq(a, b) || {
                        let (a, b) = (a.borrow(), b.borrow());
                        pending.extend(a.iter().cloned().zip(b.iter().cloned()));
                        a.len() == b.len()
                    }
                }
                (Value::Object(a), Value::Object(b)) => {
                    Rc::ptr_eq(a, b) || {
                        let (a, b) = (a.borrow(), b.borrow());
                        a.len() == b.len()
                            && a.iter().all(|(key, value)| match b.get(key) {
                                Some(other) => {
                                    pending.push((value.clone(), other.clone()));
                                    true
                                }
                                None => false,
                            })
                    }
                }
                (Value::Handle(a), Value::Handle(b)) => a.same_node(b),
                _ => false,
            };
            if !same {
                return false;
            }
        }
        true
    }
}

impl Drop for Value {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        take_children(self, &mut pending);
        while let Some(mut value) = pending.pop() {
            take_children(&mut value, &mut pending);
        }
    }
}

/// Move out the children of a container this value solely owns.
fn take_children(value: &mut Value, pending: &mut Vec<Value>) {
    match value {
        Value::Array(arr) if Rc::strong_count(arr) == 1 => {
            if let Ok(mut items) = arr.try_borrow_mut() {
                pending.append(&mut *items);
            }
        }
        Value::Object(obj) if Rc::strong_count(obj) == 1 => {
            if let Ok(mut members) = obj.try_borrow_mut() {
                pending.extend(members.drain(..).map(|(_, value)| value));
            }
        }
        _ => {}
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Array(a) => f.debug_list().entries(a.borrow().iter()).finish(),
            Value::Object(o) => f.debug_map().entries(o.borrow().iter()).finish(),
            Value::Handle(h) => fmt::Debug::fmt(h, f),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(arr) => {
                let arr = arr.try_borrow().map_err(S::Error::custom)?;
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for item in arr.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(obj) => {
                let obj = obj.try_borrow().map_err(S::Error::custom)?;
                let mut map = serializer.serialize_map(Some(obj.len()))?;
                for (key, value) in obj.iter() {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Value::Handle(h) => h.serialize(serializer),
        }
    }
}

/// Weak counterpart of a container value.
#[derive(Clone, Debug)]
pub enum WeakValue {
    Array(Weak<RefCell<Vec<Value>>>),
    Object(Weak<RefCell<IndexMap<String, Value>>>),
    Handle(WeakJson),
}

impl Identity for Value {
    type Weak = WeakValue;

    fn downgrade(&self) -> Option<WeakValue> {
        match self {
            Value::Array(a) => Some(WeakValue::Array(Rc::downgrade(a))),
            Value::Object(o) => Some(WeakValue::Object(Rc::downgrade(o))),
            Value::Handle(h) => Identity::downgrade(h).map(WeakValue::Handle),
            _ => None,
        }
    }

    fn upgrade(weak: &WeakValue) -> Option<Value> {
        match weak {
            WeakValue::Array(a) => a.upgrade().map(Value::Array),
            WeakValue::Object(o) => o.upgrade().map(Value::Object),
            WeakValue::Handle(h) => Json::upgrade(h).map(Value::Handle),
        }
    }
}

/// Builds plain [`Value`] trees.
#[derive(Clone, Copy, Debug, Default)]
pub struct DomHost;

impl Host for DomHost {
    type Value = Value;

    fn scalar(&mut self, scalar: Scalar<'_>) -> Value {
        scalar.into()
    }

    fn array(&mut self, len: usize) -> Value {
        Value::Array(Rc::new(RefCell::new(Vec::with_capacity(len))))
    }

    fn object(&mut self, len: usize) -> Value {
        Value::Object(Rc::new(RefCell::new(IndexMap::with_capacity(len))))
    }

    fn attach(&mut self, parent: &Value, slot: Slot<'_>, child: Value) {
        match (parent, slot) {
            (Value::Array(arr), Slot::Index(index)) => {
                let mut arr = arr.borrow_mut();
                match arr.get_mut(index) {
                    Some(slot) => *slot = child,
                    None => {
                        debug_assert_eq!(arr.len(), index, "array children attach in order");
                        arr.push(child);
                    }
                }
            }
            (Value::Object(obj), Slot::Key(key)) => {
                obj.borrow_mut().insert(key.to_owned(), child);
            }
            (parent, slot) => panic!("DomHost: cannot attach at {slot:?} of {parent:?}"),
        }
    }
}

/// Pending output of the formatter.
enum Emit {
    Value(Value, usize),
    /// Separator, indentation and key ahead of a container item.
    Item {
        first: bool,
        key: Option<String>,
        indent: usize,
    },
    Close(char, usize),
}

fn format_value(out: &mut String, root: &Value, c: &Colors, pretty: bool) {
    let mut stack = vec![Emit::Value(root.clone(), 0)];
    while let Some(emit) = stack.pop() {
        match emit {
            Emit::Value(value, indent) => format_one(out, &value, c, pretty, indent, &mut stack),
            Emit::Item { first, key, indent } => {
                if !first {
                    push_punct(out, ',', c);
                }
                if pretty {
                    out.push('\n');
                    out.push_str(&" ".repeat(indent));
                }
                if let Some(key) = key {
                    push_colored(out, c.key, &quote(&key), c);
                    push_punct(out, ':', c);
                    if pretty {
                        out.push(' ');
                    }
                }
            }
            Emit::Close(close, indent) => {
                if pretty {
                    out.push('\n');
                    out.push_str(&" ".repeat(indent));
                }
                push_punct(out, close, c);
            }
        }
    }
}

/// Write a scalar, or open a container and schedule its items.
fn format_one(
    out: &mut String,
    value: &Value,
    c: &Colors,
    pretty: bool,
    indent: usize,
    stack: &mut Vec<Emit>,
) {
    let inner = if pretty { indent + 2 } else { 0 };
    let (open, close, items): (char, char, Vec<(Option<String>, Value)>) = match value {
        Value::Null => return push_colored(out, c.literal, "null", c),
        Value::Bool(b) => return out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => return out.push_str(&n.to_string()),
        Value::String(s) => return push_colored(out, c.string, &quote(s), c),
        Value::Handle(h) => {
            let kind = h.kind().map_or("?", |k| k.as_str());
            return push_colored(out, c.literal, &format!("<{kind} {}>", h.node_id()), c);
        }
        Value::Array(arr) => {
            let items = arr.borrow().iter().map(|v| (None, v.clone())).collect();
            ('[', ']', items)
        }
        Value::Object(obj) => {
            let items = obj
                .borrow()
                .iter()
                .map(|(k, v)| (Some(k.clone()), v.clone()))
                .collect();
            ('{', '}', items)
        }
    };

    push_punct(out, open, c);
    if items.is_empty() {
        push_punct(out, close, c);
        return;
    }
    stack.push(Emit::Close(close, indent));
    for (i, (key, value)) in items.into_iter().enumerate().rev() {
        stack.push(Emit::Value(value, inner));
        stack.push(Emit::Item {
            first: i == 0,
            key,
            indent: inner,
        });
    }
}

fn push_colored(out: &mut String, color: &str, text: &str, c: &Colors) {
    out.push_str(color);
    out.push_str(text);
    out.push_str(c.reset);
}

fn push_punct(out: &mut String, ch: char, c: &Colors) {
    out.push_str(c.punct);
    out.push(ch);
    out.push_str(c.reset);
}

fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("{s:?}"))
}
