//! Read-only views over a tape-encoded document.

use std::fmt;

use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::error::DocumentError;
use crate::tape::{self, COUNT_SATURATED};

/// Stable identity of a node: the tape index of its value word.
///
/// The same logical node always yields the same id, so ids can key caches
/// for as long as the document lives.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct NodeId(u32);

impl NodeId {
    /// The document root always starts the tape.
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Create a NodeId from a raw tape index. Use only for deserialization.
    #[inline]
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node kind, readable in O(1) from the tape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl Kind {
    pub fn is_container(self) -> bool {
        matches!(self, Kind::Array | Kind::Object)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Array => "array",
            Kind::Object => "object",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed scalar read out of the tape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scalar<'d> {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(&'d str),
}

impl Scalar<'_> {
    pub fn kind(&self) -> Kind {
        match self {
            Scalar::Null => Kind::Null,
            Scalar::Bool(_) => Kind::Bool,
            Scalar::Int(_) | Scalar::UInt(_) | Scalar::Float(_) => Kind::Number,
            Scalar::Str(_) => Kind::String,
        }
    }
}

/// Tape index of an object member key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyRef(u32);

/// Where a child sits inside its parent container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChildSlot {
    Index(usize),
    Key(KeyRef),
}

/// Owned iteration state over a container's children.
///
/// Holds no borrow of the document, so it can be parked between calls and
/// advanced later with `Document::next_child`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChildCursor {
    next: u32,
    end: u32,
    index: usize,
    object: bool,
}

impl ChildCursor {
    /// Number of children already yielded.
    pub fn position(&self) -> usize {
        self.index
    }

    pub fn is_exhausted(&self) -> bool {
        self.next >= self.end
    }
}

/// Parsed document: the input buffer plus its tape and string buffer.
pub struct Document {
    input: Box<[u8]>,
    tape: Box<[u64]>,
    strings: Box<[u8]>,
}

impl Document {
    pub(crate) fn from_parts(input: Vec<u8>, tape: Vec<u64>, strings: Vec<u8>) -> Self {
        Self {
            input: input.into_boxed_slice(),
            tape: tape.into_boxed_slice(),
            strings: strings.into_boxed_slice(),
        }
    }

    /// Load a tape without validating it.
    ///
    /// Malformed words are reported as `DocumentError`s when the affected
    /// node is read, never as panics.
    pub fn from_raw_parts(tape: Vec<u64>, strings: Vec<u8>) -> Self {
        Self::from_parts(Vec::new(), tape, strings)
    }

    pub fn root(&self) -> Node<'_> {
        self.node(NodeId::ROOT)
    }

    pub fn node(&self, id: NodeId) -> Node<'_> {
        Node { doc: self, id }
    }

    /// The bytes the document was parsed from (empty for built tapes).
    pub fn input(&self) -> &[u8] {
        &self.input
    }

    pub fn tape(&self) -> &[u64] {
        &self.tape
    }

    pub fn strings(&self) -> &[u8] {
        &self.strings
    }

    /// Native bytes held by this document.
    pub fn retained_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.input.len()
            + self.tape.len() * std::mem::size_of::<u64>()
            + self.strings.len()
    }

    /// Cursor over the children of `id`, `None` for scalars.
    pub fn cursor(&self, id: NodeId) -> Result<Option<ChildCursor>, DocumentError> {
        let word = self.word(id.0)?;
        let object = match tape::tag(word) {
            tape::TAG_ARRAY_START => false,
            tape::TAG_OBJECT_START => true,
            _ => {
                self.kind_of(id.0, word)?;
                return Ok(None);
            }
        };
        let end = self.container_end(id.0, word)?;
        Ok(Some(ChildCursor {
            next: id.0 + 1,
            end,
            index: 0,
            object,
        }))
    }

    /// Advance `cursor` to the next child, returning its slot and id.
    pub fn next_child(
        &self,
        cursor: &mut ChildCursor,
    ) -> Result<Option<(ChildSlot, NodeId)>, DocumentError> {
        if cursor.is_exhausted() {
            return Ok(None);
        }

        let (slot, value) = if cursor.object {
            let key = cursor.next;
            let word = self.word(key)?;
            if tape::tag(word) != tape::TAG_STRING {
                return Err(DocumentError::UnrecognizedNodeKind {
                    tag: tape::tag(word),
                    index: key,
                });
            }
            (ChildSlot::Key(KeyRef(key)), key + 1)
        } else {
            (ChildSlot::Index(cursor.index), cursor.next)
        };

        if value >= cursor.end {
            return Err(DocumentError::OutOfBounds { index: value });
        }

        cursor.next = self.skip(value)?;
        cursor.index += 1;
        Ok(Some((slot, NodeId(value))))
    }

    /// Resolve an object member key.
    pub fn key(&self, key: KeyRef) -> Result<&str, DocumentError> {
        let word = self.word(key.0)?;
        self.str_at(tape::payload(word))
    }

    fn word(&self, index: u32) -> Result<u64, DocumentError> {
        self.tape
            .get(index as usize)
            .copied()
            .ok_or(DocumentError::OutOfBounds { index })
    }

    fn container_end(&self, index: u32, word: u64) -> Result<u32, DocumentError> {
        let end = tape::container_end(word);
        if end <= index || end as usize >= self.tape.len() {
            return Err(DocumentError::OutOfBounds { index: end });
        }
        Ok(end)
    }

    /// Index of the word following the value at `index`.
    fn skip(&self, index: u32) -> Result<u32, DocumentError> {
        let word = self.word(index)?;
        match tape::tag(word) {
            tape::TAG_NULL | tape::TAG_TRUE | tape::TAG_FALSE | tape::TAG_STRING => Ok(index + 1),
            tape::TAG_INT | tape::TAG_UINT | tape::TAG_FLOAT => Ok(index + 2),
            tape::TAG_ARRAY_START | tape::TAG_OBJECT_START => {
                Ok(self.container_end(index, word)? + 1)
            }
            tag => Err(DocumentError::UnrecognizedNodeKind { tag, index }),
        }
    }

    fn kind_of(&self, index: u32, word: u64) -> Result<Kind, DocumentError> {
        match tape::tag(word) {
            tape::TAG_NULL => Ok(Kind::Null),
            tape::TAG_TRUE | tape::TAG_FALSE => Ok(Kind::Bool),
            tape::TAG_INT | tape::TAG_UINT | tape::TAG_FLOAT => Ok(Kind::Number),
            tape::TAG_STRING => Ok(Kind::String),
            tape::TAG_ARRAY_START => Ok(Kind::Array),
            tape::TAG_OBJECT_START => Ok(Kind::Object),
            tag => Err(DocumentError::UnrecognizedNodeKind { tag, index }),
        }
    }

    fn str_at(&self, offset: u64) -> Result<&str, DocumentError> {
        let corrupt = DocumentError::CorruptString { offset };
        let start = usize::try_from(offset).map_err(|_| corrupt.clone())?;
        let len_bytes = self
            .strings
            .get(start..start.saturating_add(4))
            .ok_or_else(|| corrupt.clone())?;
        let len = u32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]);
        let body = start + 4;
        let bytes = self
            .strings
            .get(body..body.saturating_add(len as usize))
            .ok_or_else(|| corrupt.clone())?;
        std::str::from_utf8(bytes).map_err(|_| corrupt)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("input_len", &self.input.len())
            .field("tape_len", &self.tape.len())
            .field("strings_len", &self.strings.len())
            .finish()
    }
}

/// Typed view of one position in a document.
#[derive(Clone, Copy)]
pub struct Node<'d> {
    doc: &'d Document,
    id: NodeId,
}

impl<'d> Node<'d> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &'d Document {
        self.doc
    }

    pub fn kind(&self) -> Result<Kind, DocumentError> {
        let word = self.doc.word(self.id.0)?;
        self.doc.kind_of(self.id.0, word)
    }

    /// Child count for containers, 0 for scalars.
    pub fn size(&self) -> Result<usize, DocumentError> {
        let word = self.doc.word(self.id.0)?;
        if !self.doc.kind_of(self.id.0, word)?.is_container() {
            return Ok(0);
        }
        match tape::container_count(word) {
            Some(count) => Ok(count),
            None => {
                let mut count = 0usize;
                for child in self.children() {
                    child?;
                    count += 1;
                }
                debug_assert!(count as u64 >= COUNT_SATURATED);
                Ok(count)
            }
        }
    }

    /// Children in document order; empty for scalars.
    pub fn children(&self) -> Children<'d> {
        match self.doc.cursor(self.id) {
            Ok(cursor) => Children {
                doc: self.doc,
                cursor,
                error: None,
            },
            Err(e) => Children {
                doc: self.doc,
                cursor: None,
                error: Some(e),
            },
        }
    }

    pub fn scalar(&self) -> Result<Scalar<'d>, DocumentError> {
        let index = self.id.0;
        let word = self.doc.word(index)?;
        match tape::tag(word) {
            tape::TAG_NULL => Ok(Scalar::Null),
            tape::TAG_TRUE => Ok(Scalar::Bool(true)),
            tape::TAG_FALSE => Ok(Scalar::Bool(false)),
            tape::TAG_INT => Ok(Scalar::Int(self.doc.word(index + 1)? as i64)),
            tape::TAG_UINT => Ok(Scalar::UInt(self.doc.word(index + 1)?)),
            tape::TAG_FLOAT => Ok(Scalar::Float(f64::from_bits(self.doc.word(index + 1)?))),
            tape::TAG_STRING => Ok(Scalar::Str(self.doc.str_at(tape::payload(word))?)),
            _ => Err(DocumentError::NotScalar {
                index,
                found: self.doc.kind_of(index, word)?,
            }),
        }
    }

    /// Object member by key. Duplicate keys resolve to the last occurrence.
    pub fn get(&self, key: &str) -> Result<Option<Node<'d>>, DocumentError> {
        let mut found = None;
        for child in self.children() {
            let child = child?;
            if child.key == Some(key) {
                found = Some(child.node);
            }
        }
        Ok(found)
    }

    /// Array element by position.
    pub fn at(&self, index: usize) -> Result<Option<Node<'d>>, DocumentError> {
        for (i, child) in self.children().enumerate() {
            let child = child?;
            if i == index {
                return Ok(Some(child.node));
            }
        }
        Ok(None)
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Node");
        s.field("id", &self.id);
        match self.kind() {
            Ok(kind) => s.field("kind", &kind),
            Err(e) => s.field("error", &e),
        };
        s.finish()
    }
}

impl Serialize for Node<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.kind().map_err(S::Error::custom)? {
            Kind::Array => {
                let len = self.size().map_err(S::Error::custom)?;
                let mut seq = serializer.serialize_seq(Some(len))?;
                for child in self.children() {
                    let child = child.map_err(S::Error::custom)?;
                    seq.serialize_element(&child.node)?;
                }
                seq.end()
            }
            Kind::Object => {
                let len = self.size().map_err(S::Error::custom)?;
                let mut map = serializer.serialize_map(Some(len))?;
                for child in self.children() {
                    let child = child.map_err(S::Error::custom)?;
                    map.serialize_entry(child.key.unwrap_or_default(), &child.node)?;
                }
                map.end()
            }
            _ => match self.scalar().map_err(S::Error::custom)? {
                Scalar::Null => serializer.serialize_unit(),
                Scalar::Bool(b) => serializer.serialize_bool(b),
                Scalar::Int(n) => serializer.serialize_i64(n),
                Scalar::UInt(n) => serializer.serialize_u64(n),
                Scalar::Float(n) => serializer.serialize_f64(n),
                Scalar::Str(s) => serializer.serialize_str(s),
            },
        }
    }
}

/// One child of a container: its key (objects only) and node.
#[derive(Clone, Copy, Debug)]
pub struct Child<'d> {
    pub key: Option<&'d str>,
    pub node: Node<'d>,
}

/// Iterator over a container's children.
///
/// A corrupt tape yields one `Err` and then ends.
pub struct Children<'d> {
    doc: &'d Document,
    cursor: Option<ChildCursor>,
    error: Option<DocumentError>,
}

impl<'d> Iterator for Children<'d> {
    type Item = Result<Child<'d>, DocumentError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(e) = self.error.take() {
            self.cursor = None;
            return Some(Err(e));
        }
        let cursor = self.cursor.as_mut()?;
        let step = self.doc.next_child(cursor).and_then(|next| {
            let Some((slot, id)) = next else {
                return Ok(None);
            };
            let key = match slot {
                ChildSlot::Key(key) => Some(self.doc.key(key)?),
                ChildSlot::Index(_) => None,
            };
            Ok(Some(Child {
                key,
                node: self.doc.node(id),
            }))
        });
        match step {
            Ok(Some(child)) => Some(Ok(child)),
            Ok(None) => {
                self.cursor = None;
                None
            }
            Err(e) => {
                self.cursor = None;
                Some(Err(e))
            }
        }
    }
}
