//! Node paths for addressing within the aggregation tree
//!
//! Provides [`NodePath`], the identity of a node as the sequence of key and
//! value segments leading to it from the root.
//!
//! # Text form
//!
//! Paths render as dot-joined segments headed by [`ROOT_TOKEN`]:
//!
//! - `ROOT` is the root itself
//! - `ROOT.wifi.ssid` addresses the `ssid` key under `wifi`
//! - `ROOT.wifi.ssid.=net1` addresses the value `net1` of that key
//!
//! Inside a segment `\` and `.` are escaped with a backslash, and a key that
//! starts with `=` is written `\=` so it cannot be mistaken for a value.
//! `ROOT.lan.ip.=192\.168\.0\.1` therefore parses back to exactly one node.

use std::fmt::{self, Display, Formatter, Write as _};
use std::str::FromStr;

/// Reserved id of the root node
pub const ROOT_TOKEN: &str = "ROOT";

const VALUE_MARKER: char = '=';
const ESCAPE: char = '\\';
const SEPARATOR: char = '.';

/// Content of a non-root node
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeContent {
    /// Configuration key name
    Key(String),
    /// Canonical text of an observed leaf value
    Value(String),
}

impl NodeContent {
    /// Key segment
    #[inline]
    #[must_use]
    pub fn key(name: impl Into<String>) -> Self {
        Self::Key(name.into())
    }

    /// Value segment
    #[inline]
    #[must_use]
    pub fn value(text: impl Into<String>) -> Self {
        Self::Value(text.into())
    }

    /// Raw text (key name or value), without escaping
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Key(s) | Self::Value(s) => s,
        }
    }

    /// Whether this is a key segment
    #[inline]
    #[must_use]
    pub fn is_key(&self) -> bool {
        matches!(self, Self::Key(_))
    }

    fn parse_raw(raw: &str) -> Result<Self, PathError> {
        match raw.strip_prefix(VALUE_MARKER) {
            Some(rest) => Ok(Self::Value(unescape(rest)?)),
            None => Ok(Self::Key(unescape(raw)?)),
        }
    }
}

impl Display for NodeContent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(name) => {
                if name.starts_with(VALUE_MARKER) {
                    f.write_char(ESCAPE)?;
                }
                write_escaped(f, name)
            }
            Self::Value(text) => {
                f.write_char(VALUE_MARKER)?;
                write_escaped(f, text)
            }
        }
    }
}

/// Path from the root to a node
///
/// The empty path is the root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NodePath(Vec<NodeContent>);

impl NodePath {
    /// Create path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<NodeContent>) -> Self {
        Self(segments)
    }

    /// Root path
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[NodeContent] {
        &self.0
    }

    /// Number of segments below the root
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is the root
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Check if path is empty (root)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get parent path (if not root)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Get last segment (if not root)
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&NodeContent> {
        self.0.last()
    }

    /// Append a segment, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, segment: NodeContent) -> Self {
        let mut new = self.clone();
        new.0.push(segment);
        new
    }

    /// Check if this path is a prefix of another
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        if self.0.len() > other.0.len() {
            return false;
        }
        self.0 == other.0[..self.0.len()]
    }

    /// Check if this path is an ancestor of another (strict prefix)
    #[inline]
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.0.len() < other.0.len() && self.is_prefix_of(other)
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &NodeContent> {
        self.0.iter()
    }
}

impl Display for NodePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(ROOT_TOKEN)?;
        for segment in &self.0 {
            write!(f, "{SEPARATOR}{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = split_escaped(s)?;
        let mut raw = raw.into_iter();

        match raw.next() {
            Some(head) if head == ROOT_TOKEN => {}
            _ => return Err(PathError::MissingRoot(s.to_string())),
        }

        let segments = raw
            .map(|seg| NodeContent::parse_raw(&seg))
            .collect::<Result<_, _>>()?;

        Ok(Self(segments))
    }
}

impl From<Vec<NodeContent>> for NodePath {
    fn from(segments: Vec<NodeContent>) -> Self {
        Self(segments)
    }
}

/// Errors related to node paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Path does not start with the root token
    #[error("path '{0}' does not start with ROOT")]
    MissingRoot(String),

    /// Backslash at the end of the input
    #[error("path '{0}' ends inside an escape sequence")]
    DanglingEscape(String),
}

fn write_escaped(f: &mut Formatter<'_>, text: &str) -> fmt::Result {
    for c in text.chars() {
        if c == ESCAPE || c == SEPARATOR {
            f.write_char(ESCAPE)?;
        }
        f.write_char(c)?;
    }
    Ok(())
}

/// Split on unescaped separators, keeping escapes in the pieces
fn split_escaped(s: &str) -> Result<Vec<String>, PathError> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        match c {
            ESCAPE => {
                let escaped = chars
                    .next()
                    .ok_or_else(|| PathError::DanglingEscape(s.to_string()))?;
                current.push(ESCAPE);
                current.push(escaped);
            }
            SEPARATOR => pieces.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    pieces.push(current);
    Ok(pieces)
}

fn unescape(raw: &str) -> Result<String, PathError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == ESCAPE {
            let escaped = chars
                .next()
                .ok_or_else(|| PathError::DanglingEscape(raw.to_string()))?;
            out.push(escaped);
        } else {
            out.push(c);
        }
    }
    Ok(out)
}
