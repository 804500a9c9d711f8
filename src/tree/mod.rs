//! Property Tree
//!
//! Typed tree of dictionaries, sequences, and scalars that every other
//! component reads or mutates. Navigation is by [`NodePath`]; nodes carry no
//! parent links.

pub mod node;
pub mod path;

pub use node::{Dictionary, PropertyNode, Scalar};
pub use path::{NodePath, PathSegment};
