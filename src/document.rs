//! Configuration document
//!
//! [`ConfigDocument`] wraps the root dictionary of a bootloader config and names
//! the four component lists ([`TargetSequence`]) the snapshot engine maintains.

use crate::codec::DocumentCodec;
use crate::error::{ParseError, TreeError};
use crate::scan::Category;
use crate::tree::{Dictionary, NodePath, PathSegment, PropertyNode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level sections every well-formed document carries.
pub const REQUIRED_TOP_LEVEL_KEYS: [&str; 8] = [
    "ACPI",
    "Booter",
    "DeviceProperties",
    "Kernel",
    "Misc",
    "NVRAM",
    "PlatformInfo",
    "UEFI",
];

/// One of the four ordered component lists in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TargetSequence {
    AcpiAdd,
    KernelAdd,
    UefiDrivers,
    MiscTools,
}

impl TargetSequence {
    /// All targets, in category order.
    pub const ALL: [TargetSequence; 4] = [
        TargetSequence::AcpiAdd,
        TargetSequence::KernelAdd,
        TargetSequence::UefiDrivers,
        TargetSequence::MiscTools,
    ];

    pub fn for_category(category: Category) -> Self {
        match category {
            Category::Acpi => TargetSequence::AcpiAdd,
            Category::Kext => TargetSequence::KernelAdd,
            Category::Driver => TargetSequence::UefiDrivers,
            Category::Tool => TargetSequence::MiscTools,
        }
    }

    pub fn category(self) -> Category {
        match self {
            TargetSequence::AcpiAdd => Category::Acpi,
            TargetSequence::KernelAdd => Category::Kext,
            TargetSequence::UefiDrivers => Category::Driver,
            TargetSequence::MiscTools => Category::Tool,
        }
    }

    /// Top-level section holding the list.
    pub fn section(self) -> &'static str {
        match self {
            TargetSequence::AcpiAdd => "ACPI",
            TargetSequence::KernelAdd => "Kernel",
            TargetSequence::UefiDrivers => "UEFI",
            TargetSequence::MiscTools => "Misc",
        }
    }

    /// Key of the list inside its section.
    pub fn key(self) -> &'static str {
        match self {
            TargetSequence::AcpiAdd | TargetSequence::KernelAdd => "Add",
            TargetSequence::UefiDrivers => "Drivers",
            TargetSequence::MiscTools => "Tools",
        }
    }

    pub fn node_path(self) -> NodePath {
        NodePath::root().key(self.section()).key(self.key())
    }
}

impl fmt::Display for TargetSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key())
    }
}

/// Root of a configuration document. The root is always a dictionary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDocument {
    root: Dictionary,
}

impl ConfigDocument {
    pub fn new(root: Dictionary) -> Self {
        Self { root }
    }

    /// Wrap a parsed tree, rejecting non-dictionary roots.
    pub fn from_node(node: PropertyNode) -> Result<Self, ParseError> {
        match node {
            PropertyNode::Dictionary(root) => Ok(Self { root }),
            _ => Err(ParseError::RootNotDictionary),
        }
    }

    /// Parse a document. On failure no document is produced.
    pub fn from_bytes(
        codec: &dyn DocumentCodec,
        bytes: &[u8],
        source_name: &str,
    ) -> Result<Self, ParseError> {
        Self::from_node(codec.parse(bytes, source_name)?)
    }

    pub fn to_bytes(&self, codec: &dyn DocumentCodec) -> Result<Vec<u8>, ParseError> {
        codec.serialize(&PropertyNode::Dictionary(self.root.clone()))
    }

    pub fn root(&self) -> &Dictionary {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Dictionary {
        &mut self.root
    }

    pub fn into_node(self) -> PropertyNode {
        PropertyNode::Dictionary(self.root)
    }

    pub fn section(&self, key: &str) -> Option<&PropertyNode> {
        self.root.get(key)
    }

    /// Required top-level keys absent from this document, in canonical order.
    pub fn missing_top_level_keys(&self) -> Vec<&'static str> {
        REQUIRED_TOP_LEVEL_KEYS
            .iter()
            .copied()
            .filter(|key| !self.root.contains_key(key))
            .collect()
    }

    /// Borrow a target list if its section and list both exist with the right types.
    pub fn target(&self, target: TargetSequence) -> Option<&[PropertyNode]> {
        self.root
            .get(target.section())
            .and_then(PropertyNode::as_dictionary)
            .and_then(|section| section.get(target.key()))
            .and_then(PropertyNode::as_sequence)
    }

    /// Follow a structural path from the root.
    pub fn locate(&self, path: &NodePath) -> Result<&PropertyNode, TreeError> {
        let (first, rest) = split_first(path)?;
        let child = self.root.get(&first).ok_or_else(|| TreeError::NotFound {
            path: NodePath::root().key(first.clone()),
        })?;
        child.locate(&rest).map_err(|e| prefix_error(e, &first))
    }

    pub fn locate_mut(&mut self, path: &NodePath) -> Result<&mut PropertyNode, TreeError> {
        let (first, rest) = split_first(path)?;
        let child = self.root.get_mut(&first).ok_or_else(|| TreeError::NotFound {
            path: NodePath::root().key(first.clone()),
        })?;
        child.locate_mut(&rest).map_err(|e| prefix_error(e, &first))
    }
}

fn split_first(path: &NodePath) -> Result<(String, NodePath), TreeError> {
    match path.segments().split_first() {
        Some((PathSegment::Key(key), rest)) => {
            Ok((key.clone(), NodePath::from_segments(rest.iter().cloned())))
        }
        Some((PathSegment::Index(_), _)) => Err(TreeError::TypeMismatch {
            path: path.clone(),
            expected: "Array",
            found: "Dictionary",
        }),
        None => Err(TreeError::NotFound {
            path: NodePath::root(),
        }),
    }
}

fn prefix_error(err: TreeError, first: &str) -> TreeError {
    let prefixed = |path: NodePath| {
        let mut full = NodePath::root().key(first);
        for segment in path.segments() {
            full.push(segment.clone());
        }
        full
    };
    match err {
        TreeError::NotFound { path } => TreeError::NotFound {
            path: prefixed(path),
        },
        TreeError::TypeMismatch {
            path,
            expected,
            found,
        } => TreeError::TypeMismatch {
            path: prefixed(path),
            expected,
            found,
        },
        other => other,
    }
}
