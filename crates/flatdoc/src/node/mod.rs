//! The two node models.
//!
//! [`flat::FlatNode`] is one persisted entry of the normalized graph;
//! [`nested::NestedNode`] is the transient pairing of a schema with a fully
//! inlined value, used only while saving and loading.

pub mod flat;
pub mod nested;

use crate::schema::Kind;
use thiserror::Error;

/// Structural mismatches between a node's schema and the operation or value
/// applied to it.
///
/// All of these indicate either corrupted document data or a programming
/// defect; none are recoverable per-node conditions.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("expected a {expected} node, found {found} ({schema:?})")]
    KindMismatch {
        expected: &'static str,
        found: Kind,
        schema: String,
    },
    #[error("schema {schema:?} expects {expected} nested value")]
    ValueShape {
        schema: String,
        expected: &'static str,
    },
    #[error("object schema {schema:?} has no property {property:?}")]
    UnknownProperty { schema: String, property: String },
    #[error("nested value for object schema {schema:?} is missing property {property:?}")]
    MissingProperty { schema: String, property: String },
    #[error("union schema {schema:?} selected option {index} out of {count}")]
    OptionOutOfRange {
        schema: String,
        index: usize,
        count: usize,
    },
}
