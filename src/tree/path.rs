//! Structural locators into a property tree
//!
//! A [`NodePath`] is an ordered sequence of dictionary keys and sequence indices
//! from the document root. Paths are recomputed while walking the tree; nodes do
//! not hold back-references to their parents.

use crate::error::TreeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One step of a [`NodePath`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Ordered key/index locator from the document root
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(Vec<PathSegment>);

impl NodePath {
    /// The empty path, which locates the root itself
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from anything convertible into segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Return a new path extended by a dictionary key.
    pub fn key(&self, key: impl Into<String>) -> Self {
        self.child(PathSegment::Key(key.into()))
    }

    /// Return a new path extended by a sequence index.
    pub fn index(&self, index: usize) -> Self {
        self.child(PathSegment::Index(index))
    }

    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        Self(segments)
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Path without its last segment, or `None` at the root.
    pub fn parent(&self) -> Option<NodePath> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", key)?;
                }
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// Parse the display form back into a path: `Kernel.Add[3].BundlePath`.
///
/// The empty string and `<root>` both parse to the root path.
impl FromStr for NodePath {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "<root>" {
            return Ok(NodePath::root());
        }
        let invalid = || TreeError::InvalidPath(s.to_string());

        let mut path = NodePath::root();
        for part in s.split('.') {
            let (key, mut rest) = match part.find('[') {
                Some(open) => part.split_at(open),
                None => (part, ""),
            };
            if key.is_empty() {
                return Err(invalid());
            }
            path.push(PathSegment::Key(key.to_string()));
            while !rest.is_empty() {
                let close = rest.find(']').ok_or_else(invalid)?;
                let index = rest[1..close].parse::<usize>().map_err(|_| invalid())?;
                path.push(PathSegment::Index(index));
                rest = &rest[close + 1..];
                if !rest.is_empty() && !rest.starts_with('[') {
                    return Err(invalid());
                }
            }
        }
        Ok(path)
    }
}
