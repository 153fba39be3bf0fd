//! Flat tape encoding for parsed documents.
//!
//! Every value occupies one or two 64-bit words. The top byte of a word is
//! its tag, the low 56 bits its payload:
//!
//! | tag           | payload                                        | width |
//! |---------------|------------------------------------------------|-------|
//! | `n` `t` `f`   | unused                                         | 1     |
//! | `l` `u` `d`   | unused, next word holds the i64/u64/f64 bits   | 2     |
//! | `"`           | offset into the string buffer                  | 1     |
//! | `[` `{`       | index of the matching end word, child count    | span  |
//! | `]` `}`       | index of the matching start word               | 1     |
//!
//! Object members are a `"` key word followed by the member value.
//! The string buffer stores each string as a little-endian `u32` length
//! followed by its UTF-8 bytes.

use crate::document::Document;
use crate::error::ParseError;

pub const TAG_NULL: u8 = b'n';
pub const TAG_TRUE: u8 = b't';
pub const TAG_FALSE: u8 = b'f';
pub const TAG_INT: u8 = b'l';
pub const TAG_UINT: u8 = b'u';
pub const TAG_FLOAT: u8 = b'd';
pub const TAG_STRING: u8 = b'"';
pub const TAG_ARRAY_START: u8 = b'[';
pub const TAG_ARRAY_END: u8 = b']';
pub const TAG_OBJECT_START: u8 = b'{';
pub const TAG_OBJECT_END: u8 = b'}';

const TAG_SHIFT: u32 = 56;
const PAYLOAD_MASK: u64 = (1 << TAG_SHIFT) - 1;
const COUNT_SHIFT: u32 = 32;

/// Child counts at or above this value are not stored; readers count instead.
pub const COUNT_SATURATED: u64 = 0xFF_FFFF;

#[inline]
pub fn tag(word: u64) -> u8 {
    (word >> TAG_SHIFT) as u8
}

#[inline]
pub fn payload(word: u64) -> u64 {
    word & PAYLOAD_MASK
}

#[inline]
pub fn word(tag: u8, payload: u64) -> u64 {
    ((tag as u64) << TAG_SHIFT) | (payload & PAYLOAD_MASK)
}

/// Start word for a container ending at `end` with `count` children.
#[inline]
pub fn container_word(tag: u8, end: u32, count: usize) -> u64 {
    let count = (count as u64).min(COUNT_SATURATED);
    word(tag, (count << COUNT_SHIFT) | end as u64)
}

/// Index of the end word referenced by a container start word.
#[inline]
pub fn container_end(word: u64) -> u32 {
    payload(word) as u32
}

/// Stored child count, `None` when the count saturated.
#[inline]
pub fn container_count(word: u64) -> Option<usize> {
    let count = payload(word) >> COUNT_SHIFT;
    (count < COUNT_SATURATED).then_some(count as usize)
}

/// Appends a length-prefixed string to a string buffer, returning its offset.
pub(crate) fn push_string(strings: &mut Vec<u8>, s: &str) -> Option<u64> {
    let len = u32::try_from(s.len()).ok()?;
    let offset = strings.len() as u64;
    strings.extend_from_slice(&len.to_le_bytes());
    strings.extend_from_slice(s.as_bytes());
    Some(offset)
}

#[derive(Debug)]
pub(crate) struct OpenContainer {
    pub(crate) start: usize,
    pub(crate) count: usize,
    pub(crate) object: bool,
    /// Object only: a key was written and its value is still due.
    pub(crate) pending_key: bool,
}

/// Push-style tape writer.
///
/// Values are written in document order. Containers are opened with
/// `begin_array`/`begin_object` and closed with the matching `end_*` call;
/// object members are written as `key` followed by one value.
///
/// Structural misuse (a value in an object without a key, unbalanced
/// containers, a second root value) is a programming error and panics.
#[derive(Debug, Default)]
pub struct TapeBuilder {
    words: Vec<u64>,
    strings: Vec<u8>,
    pub(crate) open: Vec<OpenContainer>,
    pub(crate) roots: usize,
    overflow: Option<&'static str>,
}

impl TapeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size buffers for an input of `input_len` bytes.
    pub fn with_input_hint(input_len: usize) -> Self {
        Self {
            words: Vec::with_capacity(input_len / 4),
            strings: Vec::with_capacity(input_len / 2),
            ..Self::default()
        }
    }

    pub fn null(&mut self) -> &mut Self {
        self.before_value();
        self.words.push(word(TAG_NULL, 0));
        self
    }

    pub fn bool(&mut self, value: bool) -> &mut Self {
        self.before_value();
        let tag = if value { TAG_TRUE } else { TAG_FALSE };
        self.words.push(word(tag, 0));
        self
    }

    pub fn i64(&mut self, value: i64) -> &mut Self {
        self.before_value();
        self.words.push(word(TAG_INT, 0));
        self.words.push(value as u64);
        self
    }

    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.before_value();
        self.words.push(word(TAG_UINT, 0));
        self.words.push(value);
        self
    }

    pub fn f64(&mut self, value: f64) -> &mut Self {
        self.before_value();
        self.words.push(word(TAG_FLOAT, 0));
        self.words.push(value.to_bits());
        self
    }

    pub fn string(&mut self, value: &str) -> &mut Self {
        self.before_value();
        self.push_string_word(value);
        self
    }

    /// Write an object member key. The next value written is its value.
    pub fn key(&mut self, key: &str) -> &mut Self {
        self.ensure_key_allowed();
        if let Some(top) = self.open.last_mut() {
            top.pending_key = true;
        }
        self.push_string_word(key);
        self
    }

    pub fn begin_array(&mut self) -> &mut Self {
        self.begin(false)
    }

    pub fn end_array(&mut self) -> &mut Self {
        self.end(false)
    }

    pub fn begin_object(&mut self) -> &mut Self {
        self.begin(true)
    }

    pub fn end_object(&mut self) -> &mut Self {
        self.end(true)
    }

    /// Finish the tape into a document without an input buffer.
    pub fn finish(self) -> Result<Document, ParseError> {
        self.finish_with_input(Vec::new())
    }

    pub(crate) fn finish_with_input(self, input: Vec<u8>) -> Result<Document, ParseError> {
        self.ensure_closed();
        if let Some(what) = self.overflow {
            return Err(ParseError::TooLarge(what));
        }
        if self.roots == 0 {
            return Err(ParseError::Empty);
        }
        Ok(Document::from_parts(input, self.words, self.strings))
    }

    fn begin(&mut self, object: bool) -> &mut Self {
        self.before_value();
        let start = self.words.len();
        // Patched by `end` once the extent is known.
        self.words.push(0);
        self.open.push(OpenContainer {
            start,
            count: 0,
            object,
            pending_key: false,
        });
        self
    }

    fn end(&mut self, object: bool) -> &mut Self {
        let container = self.ensure_open(object);
        let end = self.words.len();
        let Ok(end_index) = u32::try_from(end) else {
            self.overflow = Some("tape exceeds u32 word indices");
            self.words.push(0);
            return self;
        };
        let (start_tag, end_tag) = if object {
            (TAG_OBJECT_START, TAG_OBJECT_END)
        } else {
            (TAG_ARRAY_START, TAG_ARRAY_END)
        };
        self.words[container.start] = container_word(start_tag, end_index, container.count);
        self.words.push(word(end_tag, container.start as u64));
        self
    }

    fn before_value(&mut self) {
        match self.open.last_mut() {
            Some(top) => {
                if top.object {
                    Self::ensure_member_key(top.pending_key);
                    top.pending_key = false;
                }
                top.count += 1;
            }
            None => {
                Self::ensure_single_root(self.roots);
                self.roots += 1;
            }
        }
    }

    fn push_string_word(&mut self, value: &str) {
        match push_string(&mut self.strings, value) {
            Some(offset) => self.words.push(word(TAG_STRING, offset)),
            None => {
                self.overflow = Some("string longer than u32::MAX bytes");
                self.words.push(word(TAG_STRING, 0));
            }
        }
    }
}
