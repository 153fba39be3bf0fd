//! JSON Pointer (RFC 6901) resolution.

use std::borrow::Cow;

use crate::document::{Document, Kind, Node};
use crate::error::PathError;

impl Document {
    /// Resolve a JSON Pointer against the document root.
    pub fn resolve(&self, path: &str) -> Result<Node<'_>, PathError> {
        self.root().resolve(path)
    }
}

impl<'d> Node<'d> {
    /// Resolve a JSON Pointer relative to this node.
    ///
    /// Only containers on the path are entered; sibling subtrees are skipped
    /// in O(1) through their end indices.
    pub fn resolve(&self, path: &str) -> Result<Node<'d>, PathError> {
        let mut node = *self;
        if path.is_empty() {
            return Ok(node);
        }
        let Some(rest) = path.strip_prefix('/') else {
            return Err(malformed(path, "must be empty or start with `/`"));
        };

        for raw in rest.split('/') {
            let segment = unescape(raw).ok_or_else(|| malformed(path, "invalid `~` escape"))?;
            node = step(path, node, &segment)?;
        }
        Ok(node)
    }
}

fn step<'d>(path: &str, node: Node<'d>, segment: &str) -> Result<Node<'d>, PathError> {
    let found = node.kind()?;
    let child = match found {
        Kind::Object => node.get(segment)?,
        Kind::Array => {
            let index = parse_index(segment).ok_or_else(|| PathError::TypeMismatch {
                path: path.to_owned(),
                segment: segment.to_owned(),
                found,
            })?;
            node.at(index)?
        }
        _ => {
            return Err(PathError::TypeMismatch {
                path: path.to_owned(),
                segment: segment.to_owned(),
                found,
            });
        }
    };
    child.ok_or_else(|| PathError::NotFound {
        path: path.to_owned(),
        segment: segment.to_owned(),
    })
}

/// Array index: ASCII digits without leading zeros.
fn parse_index(segment: &str) -> Option<usize> {
    let digits = segment.as_bytes();
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    if digits.len() > 1 && digits[0] == b'0' {
        return None;
    }
    // Too large to fit is also too large to exist.
    Some(segment.parse().unwrap_or(usize::MAX))
}

fn unescape(raw: &str) -> Option<Cow<'_, str>> {
    if !raw.contains('~') {
        return Some(Cow::Borrowed(raw));
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => return None,
        }
    }
    Some(Cow::Owned(out))
}

fn malformed(path: &str, reason: &'static str) -> PathError {
    PathError::Malformed {
        path: path.to_owned(),
        reason,
    }
}
