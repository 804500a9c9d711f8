//! Property list codec
//!
//! Converts between serialized property lists and [`PropertyNode`] trees. The
//! engine only ever sees the `parse`/`serialize` pair through
//! [`DocumentCodec`]; [`PlistCodec`] is the production implementation.

use crate::error::ParseError;
use crate::tree::{Dictionary, PropertyNode, Scalar};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::{debug, instrument};

/// Parse/serialize boundary for documents and bundle descriptors.
///
/// Implementations must round-trip key order and scalar kinds exactly.
pub trait DocumentCodec: Send + Sync {
    /// Parse `bytes` into a tree. `source_name` is only used in error messages.
    fn parse(&self, bytes: &[u8], source_name: &str) -> Result<PropertyNode, ParseError>;

    /// Serialize a tree to bytes.
    fn serialize(&self, node: &PropertyNode) -> Result<Vec<u8>, ParseError>;
}

/// On-disk plist encoding used when serializing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlistFormat {
    #[default]
    Xml,
    Binary,
}

/// [`DocumentCodec`] backed by the `plist` crate. Parsing auto-detects XML and
/// binary input; serialization uses the configured [`PlistFormat`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PlistCodec {
    format: PlistFormat,
}

impl PlistCodec {
    pub fn new(format: PlistFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> PlistFormat {
        self.format
    }
}

impl DocumentCodec for PlistCodec {
    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    fn parse(&self, bytes: &[u8], source_name: &str) -> Result<PropertyNode, ParseError> {
        let value = plist::Value::from_reader(Cursor::new(bytes)).map_err(|e| {
            ParseError::Malformed {
                source_name: source_name.to_string(),
                message: e.to_string(),
            }
        })?;
        let node = from_plist(value)?;
        debug!(kind = node.kind_name(), "Parsed property list");
        Ok(node)
    }

    fn serialize(&self, node: &PropertyNode) -> Result<Vec<u8>, ParseError> {
        let value = to_plist(node);
        let mut out = Vec::new();
        let written = match self.format {
            PlistFormat::Xml => value.to_writer_xml(&mut out),
            PlistFormat::Binary => value.to_writer_binary(&mut out),
        };
        written.map_err(|e| ParseError::Serialize(e.to_string()))?;
        Ok(out)
    }
}

fn from_plist(value: plist::Value) -> Result<PropertyNode, ParseError> {
    let node = match value {
        plist::Value::Dictionary(dict) => {
            let mut out = Dictionary::new();
            for (key, child) in dict {
                out.insert(key, from_plist(child)?);
            }
            PropertyNode::Dictionary(out)
        }
        plist::Value::Array(items) => PropertyNode::Sequence(
            items
                .into_iter()
                .map(from_plist)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        plist::Value::Boolean(b) => Scalar::Boolean(b).into(),
        plist::Value::Integer(i) => match i.as_signed() {
            Some(signed) => Scalar::Integer(signed).into(),
            None => {
                return Err(ParseError::IntegerOutOfRange(
                    i.as_unsigned().unwrap_or(u64::MAX),
                ))
            }
        },
        plist::Value::Real(r) => Scalar::Real(r).into(),
        plist::Value::String(s) => Scalar::String(s).into(),
        plist::Value::Data(bytes) => Scalar::Data(bytes).into(),
        plist::Value::Date(_) => return Err(ParseError::UnsupportedValue { kind: "Date" }),
        plist::Value::Uid(_) => return Err(ParseError::UnsupportedValue { kind: "Uid" }),
        _ => return Err(ParseError::UnsupportedValue { kind: "unknown" }),
    };
    Ok(node)
}

fn to_plist(node: &PropertyNode) -> plist::Value {
    match node {
        PropertyNode::Dictionary(dict) => {
            let mut out = plist::Dictionary::new();
            for (key, child) in dict.iter() {
                out.insert(key.to_string(), to_plist(child));
            }
            plist::Value::Dictionary(out)
        }
        PropertyNode::Sequence(items) => plist::Value::Array(items.iter().map(to_plist).collect()),
        PropertyNode::Scalar(Scalar::Boolean(b)) => plist::Value::Boolean(*b),
        PropertyNode::Scalar(Scalar::Integer(i)) => plist::Value::Integer((*i).into()),
        PropertyNode::Scalar(Scalar::Real(r)) => plist::Value::Real(*r),
        PropertyNode::Scalar(Scalar::String(s)) => plist::Value::String(s.clone()),
        PropertyNode::Scalar(Scalar::Data(bytes)) => plist::Value::Data(bytes.clone()),
    }
}
