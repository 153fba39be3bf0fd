#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Immutable, tape-encoded JSON documents.
//!
//! A [`Document`] owns its input and a flat tape of 64-bit words. Every
//! value is addressed by a [`NodeId`] (its tape index), which stays stable
//! for the document's lifetime and can key identity caches. [`Node`] is a
//! borrowed, typed view offering O(1) kind inspection and ordered child
//! iteration.

mod colors;
mod document;
mod error;
mod invariants;
mod parse;
mod pointer;
pub mod tape;

#[cfg(test)]
mod document_tests;
#[cfg(test)]
mod pointer_tests;

pub use colors::Colors;
pub use document::{
    Child, ChildCursor, ChildSlot, Children, Document, KeyRef, Kind, Node, NodeId, Scalar,
};
pub use error::{DocumentError, ParseError, PathError};
pub use tape::TapeBuilder;
