//! Show presentation: property tree outline and JSON rendering.
//!
//! `Data` is rendered as lowercase hex in both forms.

use super::shared::to_pretty_json;
use crate::error::ApiError;
use crate::tree::{NodePath, PropertyNode, Scalar};
use serde_json::{Map, Number, Value};

/// Indented outline, two spaces per level.
pub fn format_node_text(path: &NodePath, node: &PropertyNode) -> String {
    let mut lines = Vec::new();
    let label = if path.is_root() {
        String::new()
    } else {
        format!("{} ", path)
    };
    match node {
        PropertyNode::Scalar(scalar) => {
            lines.push(format!("{}= {}", label, scalar_text(scalar)));
        }
        _ => {
            lines.push(format!("{}<{}, {} items>", label, node.kind_name(), node.child_count()));
            outline(node, 1, &mut lines);
        }
    }
    lines.join("\n")
}

fn outline(node: &PropertyNode, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    let children: Vec<(String, &PropertyNode)> = match node {
        PropertyNode::Dictionary(dict) => dict.iter().map(|(k, v)| (k.to_string(), v)).collect(),
        PropertyNode::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (format!("[{}]", i), v))
            .collect(),
        PropertyNode::Scalar(_) => return,
    };
    for (label, child) in children {
        match child {
            PropertyNode::Scalar(scalar) => {
                lines.push(format!("{}{}: {}", indent, label, scalar_text(scalar)))
            }
            _ => {
                lines.push(format!("{}{}: <{}>", indent, label, child.kind_name()));
                outline(child, depth + 1, lines);
            }
        }
    }
}

fn scalar_text(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Boolean(b) => b.to_string(),
        Scalar::Integer(i) => i.to_string(),
        Scalar::Real(r) => r.to_string(),
        Scalar::String(s) => format!("{:?}", s),
        Scalar::Data(bytes) => format!("<{}>", hex::encode(bytes)),
    }
}

/// JSON value for a node. Non-finite reals become `null`.
pub fn node_to_json(node: &PropertyNode) -> Value {
    match node {
        PropertyNode::Dictionary(dict) => {
            let map: Map<String, Value> = dict
                .iter()
                .map(|(k, v)| (k.to_string(), node_to_json(v)))
                .collect();
            Value::Object(map)
        }
        PropertyNode::Sequence(items) => Value::Array(items.iter().map(node_to_json).collect()),
        PropertyNode::Scalar(Scalar::Boolean(b)) => Value::Bool(*b),
        PropertyNode::Scalar(Scalar::Integer(i)) => Value::Number((*i).into()),
        PropertyNode::Scalar(Scalar::Real(r)) => {
            Number::from_f64(*r).map(Value::Number).unwrap_or(Value::Null)
        }
        PropertyNode::Scalar(Scalar::String(s)) => Value::String(s.clone()),
        PropertyNode::Scalar(Scalar::Data(bytes)) => Value::String(hex::encode(bytes)),
    }
}

pub fn format_node_json(node: &PropertyNode) -> Result<String, ApiError> {
    to_pretty_json(&node_to_json(node))
}
