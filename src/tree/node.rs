//! Property node types: dictionaries, sequences, and scalars

use crate::error::TreeError;
use crate::tree::path::{NodePath, PathSegment};

/// Scalar leaf value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(String),
    Data(Vec<u8>),
}

impl Scalar {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Scalar::Boolean(_) => "Boolean",
            Scalar::Integer(_) => "Integer",
            Scalar::Real(_) => "Real",
            Scalar::String(_) => "String",
            Scalar::Data(_) => "Data",
        }
    }
}

/// Ordered mapping of unique string keys to child nodes.
///
/// Insertion order is preserved and is significant: it is the serialized order
/// and, for component lists, the load order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    entries: Vec<(String, PropertyNode)>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&PropertyNode> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, node)| node)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut PropertyNode> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, node)| node)
    }

    /// Insert a child. An existing key keeps its position and has its value
    /// replaced (the old value is returned); a new key is appended.
    pub fn insert(&mut self, key: impl Into<String>, node: PropertyNode) -> Option<PropertyNode> {
        let key = key.into();
        match self.position(&key) {
            Some(pos) => Some(std::mem::replace(&mut self.entries[pos].1, node)),
            None => {
                self.entries.push((key, node));
                None
            }
        }
    }

    /// Insert a new key at `position`, shifting later siblings down.
    pub fn insert_at(
        &mut self,
        position: usize,
        key: impl Into<String>,
        node: PropertyNode,
    ) -> Result<(), TreeError> {
        let key = key.into();
        if self.contains_key(&key) {
            return Err(TreeError::DuplicateKey(key));
        }
        if position > self.entries.len() {
            return Err(TreeError::IndexOutOfBounds {
                index: position,
                len: self.entries.len(),
            });
        }
        self.entries.insert(position, (key, node));
        Ok(())
    }

    /// Remove a key, preserving the relative order of the remaining keys.
    pub fn remove(&mut self, key: &str) -> Option<PropertyNode> {
        self.position(key).map(|pos| self.entries.remove(pos).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyNode)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut PropertyNode)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Borrow a string-valued child, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PropertyNode::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(PropertyNode::as_bool)
    }
}

impl<K: Into<String>> FromIterator<(K, PropertyNode)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (K, PropertyNode)>>(iter: I) -> Self {
        let mut dict = Dictionary::new();
        for (key, node) in iter {
            dict.insert(key, node);
        }
        dict
    }
}

impl IntoIterator for Dictionary {
    type Item = (String, PropertyNode);
    type IntoIter = std::vec::IntoIter<(String, PropertyNode)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A node in the configuration tree.
///
/// The variant of a node is fixed at creation. Mutation replaces scalar content
/// (of the same scalar kind) or the children of a container, never the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyNode {
    Dictionary(Dictionary),
    Sequence(Vec<PropertyNode>),
    Scalar(Scalar),
}

impl PropertyNode {
    pub fn empty_dictionary() -> Self {
        PropertyNode::Dictionary(Dictionary::new())
    }

    pub fn empty_sequence() -> Self {
        PropertyNode::Sequence(Vec::new())
    }

    /// Human-readable type name, matching plist editor conventions.
    pub fn kind_name(&self) -> &'static str {
        match self {
            PropertyNode::Dictionary(_) => "Dictionary",
            PropertyNode::Sequence(_) => "Array",
            PropertyNode::Scalar(s) => s.kind_name(),
        }
    }

    pub fn is_container(&self) -> bool {
        !matches!(self, PropertyNode::Scalar(_))
    }

    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            PropertyNode::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_dictionary_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            PropertyNode::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[PropertyNode]> {
        match self {
            PropertyNode::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_sequence_mut(&mut self) -> Option<&mut Vec<PropertyNode>> {
        match self {
            PropertyNode::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            PropertyNode::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyNode::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyNode::Scalar(Scalar::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyNode::Scalar(Scalar::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    /// Number of direct children (0 for scalars).
    pub fn child_count(&self) -> usize {
        match self {
            PropertyNode::Dictionary(d) => d.len(),
            PropertyNode::Sequence(items) => items.len(),
            PropertyNode::Scalar(_) => 0,
        }
    }

    /// Borrow a direct child by key (dictionaries) or index (sequences).
    pub fn get_child(&self, segment: &PathSegment) -> Result<&PropertyNode, TreeError> {
        match (self, segment) {
            (PropertyNode::Dictionary(d), PathSegment::Key(key)) => {
                d.get(key).ok_or_else(|| TreeError::NotFound {
                    path: NodePath::root().child(segment.clone()),
                })
            }
            (PropertyNode::Sequence(items), PathSegment::Index(index)) => {
                items.get(*index).ok_or_else(|| TreeError::NotFound {
                    path: NodePath::root().child(segment.clone()),
                })
            }
            _ => Err(self.selector_mismatch(segment)),
        }
    }

    pub fn get_child_mut(&mut self, segment: &PathSegment) -> Result<&mut PropertyNode, TreeError> {
        if !self.accepts(segment) {
            return Err(self.selector_mismatch(segment));
        }
        let not_found = || TreeError::NotFound {
            path: NodePath::root().child(segment.clone()),
        };
        match (self, segment) {
            (PropertyNode::Dictionary(d), PathSegment::Key(key)) => {
                d.get_mut(key).ok_or_else(not_found)
            }
            (PropertyNode::Sequence(items), PathSegment::Index(index)) => {
                items.get_mut(*index).ok_or_else(not_found)
            }
            _ => Err(not_found()),
        }
    }

    /// Replace the content of a scalar node.
    ///
    /// Fails with `TypeMismatch` when the node is a container or when `value`
    /// is a different scalar kind.
    pub fn set_scalar(&mut self, value: Scalar) -> Result<(), TreeError> {
        match self {
            PropertyNode::Scalar(current)
                if std::mem::discriminant(current) == std::mem::discriminant(&value) =>
            {
                *current = value;
                Ok(())
            }
            other => Err(TreeError::TypeMismatch {
                path: NodePath::root(),
                expected: value.kind_name(),
                found: other.kind_name(),
            }),
        }
    }

    /// Insert a child into a container.
    ///
    /// For dictionaries `segment` is the key: a new key is appended, an existing
    /// key has its value replaced in place and the previous value returned. For
    /// sequences `segment` is the position (`0..=len`) and later items shift down.
    pub fn insert_child(
        &mut self,
        segment: PathSegment,
        node: PropertyNode,
    ) -> Result<Option<PropertyNode>, TreeError> {
        if !self.accepts(&segment) {
            return Err(self.selector_mismatch(&segment));
        }
        match (self, segment) {
            (PropertyNode::Dictionary(d), PathSegment::Key(key)) => Ok(d.insert(key, node)),
            (PropertyNode::Sequence(items), PathSegment::Index(index)) => {
                if index > items.len() {
                    return Err(TreeError::IndexOutOfBounds {
                        index,
                        len: items.len(),
                    });
                }
                items.insert(index, node);
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    /// Remove and return a direct child. Remaining siblings keep their order.
    pub fn remove_child(&mut self, segment: &PathSegment) -> Result<PropertyNode, TreeError> {
        if !self.accepts(segment) {
            return Err(self.selector_mismatch(segment));
        }
        let not_found = || TreeError::NotFound {
            path: NodePath::root().child(segment.clone()),
        };
        match (self, segment) {
            (PropertyNode::Dictionary(d), PathSegment::Key(key)) => {
                d.remove(key).ok_or_else(not_found)
            }
            (PropertyNode::Sequence(items), PathSegment::Index(index)) => {
                if *index < items.len() {
                    Ok(items.remove(*index))
                } else {
                    Err(not_found())
                }
            }
            _ => Err(not_found()),
        }
    }

    /// Follow `path` from this node.
    pub fn locate(&self, path: &NodePath) -> Result<&PropertyNode, TreeError> {
        let mut current = self;
        let mut walked = NodePath::root();
        for segment in path.segments() {
            walked.push(segment.clone());
            current = current
                .get_child(segment)
                .map_err(|e| e.relocated(&walked))?;
        }
        Ok(current)
    }

    pub fn locate_mut(&mut self, path: &NodePath) -> Result<&mut PropertyNode, TreeError> {
        let mut current = self;
        let mut walked = NodePath::root();
        for segment in path.segments() {
            walked.push(segment.clone());
            current = current
                .get_child_mut(segment)
                .map_err(|e| e.relocated(&walked))?;
        }
        Ok(current)
    }

    fn accepts(&self, segment: &PathSegment) -> bool {
        matches!(
            (self, segment),
            (PropertyNode::Dictionary(_), PathSegment::Key(_))
                | (PropertyNode::Sequence(_), PathSegment::Index(_))
        )
    }

    fn selector_mismatch(&self, segment: &PathSegment) -> TreeError {
        TreeError::TypeMismatch {
            path: NodePath::root().child(segment.clone()),
            expected: match segment {
                PathSegment::Key(_) => "Dictionary",
                PathSegment::Index(_) => "Array",
            },
            found: self.kind_name(),
        }
    }
}

impl TreeError {
    /// Rewrite the path carried by a single-step error to the full walked path.
    fn relocated(self, walked: &NodePath) -> TreeError {
        match self {
            TreeError::NotFound { .. } => TreeError::NotFound {
                path: walked.clone(),
            },
            TreeError::TypeMismatch {
                expected, found, ..
            } => TreeError::TypeMismatch {
                path: walked.clone(),
                expected,
                found,
            },
            other => other,
        }
    }
}

impl From<Scalar> for PropertyNode {
    fn from(value: Scalar) -> Self {
        PropertyNode::Scalar(value)
    }
}

impl From<bool> for PropertyNode {
    fn from(value: bool) -> Self {
        PropertyNode::Scalar(Scalar::Boolean(value))
    }
}

impl From<i64> for PropertyNode {
    fn from(value: i64) -> Self {
        PropertyNode::Scalar(Scalar::Integer(value))
    }
}

impl From<f64> for PropertyNode {
    fn from(value: f64) -> Self {
        PropertyNode::Scalar(Scalar::Real(value))
    }
}

impl From<&str> for PropertyNode {
    fn from(value: &str) -> Self {
        PropertyNode::Scalar(Scalar::String(value.to_string()))
    }
}

impl From<String> for PropertyNode {
    fn from(value: String) -> Self {
        PropertyNode::Scalar(Scalar::String(value))
    }
}

impl From<Vec<u8>> for PropertyNode {
    fn from(value: Vec<u8>) -> Self {
        PropertyNode::Scalar(Scalar::Data(value))
    }
}

impl From<Dictionary> for PropertyNode {
    fn from(value: Dictionary) -> Self {
        PropertyNode::Dictionary(value)
    }
}

impl From<Vec<PropertyNode>> for PropertyNode {
    fn from(value: Vec<PropertyNode>) -> Self {
        PropertyNode::Sequence(value)
    }
}
