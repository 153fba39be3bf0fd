//! Errors produced while parsing and reading documents.

use crate::document::Kind;

/// The parser could not produce a document.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("document has no root value")]
    Empty,

    #[error("document too large: {0}")]
    TooLarge(&'static str),
}

/// A tape could not be read at some position.
///
/// Tapes produced by the parser never fail; these surface only for tapes
/// loaded through `Document::from_raw_parts`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("unrecognized node kind {tag:#04x} at tape index {index}")]
    UnrecognizedNodeKind { tag: u8, index: u32 },

    #[error("tape index {index} out of bounds")]
    OutOfBounds { index: u32 },

    #[error("corrupt string at offset {offset}")]
    CorruptString { offset: u64 },

    #[error("expected a scalar at tape index {index}, found {found}")]
    NotScalar { index: u32, found: Kind },
}

/// A path query could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("path `{path}`: `{segment}` not found")]
    NotFound { path: String, segment: String },

    #[error("path `{path}`: cannot address `{segment}` in {found}")]
    TypeMismatch {
        path: String,
        segment: String,
        found: Kind,
    },

    #[error("path `{path}` is malformed: {reason}")]
    Malformed { path: String, reason: &'static str },

    #[error(transparent)]
    Document(#[from] DocumentError),
}
