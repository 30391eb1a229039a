//! The flat (normalized) node model.
//!
//! A [`FlatNode`] is one persisted entry of the node graph. Its value never
//! inlines children — composite kinds store keys (directly, or inside an
//! engine container), and the accessors here dereference those keys through
//! the store one structural step at a time. This is the read surface the
//! rendering collaborator walks.

use super::NodeError;
use crate::schema::{Kind, Schema, SchemaKind, SchemaRef};
use crate::store::key::Key;
use crate::store::{EditorStore, StoreError};
use flatdoc_replica::{ListRef, MapRef, TextRef};
use serde_json::Value;

/// The flat representation of one node's immediate content.
#[derive(Debug, Clone, PartialEq)]
pub enum FlatValue {
    /// Scalar for boolean and literal schemas, stored verbatim.
    Primitive(Value),
    /// Handle to the rich-text container holding the content.
    RichText(TextRef),
    /// The single child of a wrapper or union node.
    Child(Key),
    /// Handle to the ordered list of child keys of an array node.
    Items(ListRef),
    /// Handle to the property-name → child-key map of an object node.
    Properties(MapRef),
}

/// One persisted entry of the normalized graph.
///
/// `schema` is resolved from the registry at read time; only the schema
/// name is persisted. `parent_key` is `None` only for the document root.
#[derive(Debug, Clone)]
pub struct FlatNode {
    pub schema: SchemaRef,
    pub key: Key,
    pub parent_key: Option<Key>,
    pub value: FlatValue,
}

impl FlatNode {
    pub fn tag(&self) -> Kind {
        self.schema.tag()
    }
}

impl Schema {
    /// Whether `value` is well-typed as this schema's flat value.
    ///
    /// Defensive validation for store boundaries; happy-path dispatch goes
    /// through exhaustive matches on [`SchemaKind`] instead.
    pub fn is_flat_value(&self, value: &FlatValue) -> bool {
        match (self.kind(), value) {
            (SchemaKind::Bool, FlatValue::Primitive(Value::Bool(_))) => true,
            (SchemaKind::Literal(expected), FlatValue::Primitive(actual)) => expected == actual,
            (SchemaKind::RichText { .. }, FlatValue::RichText(_)) => true,
            (SchemaKind::Wrapper { .. } | SchemaKind::Union { .. }, FlatValue::Child(_)) => true,
            (SchemaKind::Array { .. }, FlatValue::Items(_)) => true,
            (SchemaKind::Object { .. }, FlatValue::Properties(_)) => true,
            _ => false,
        }
    }
}

/// The single child of a wrapper or union node.
pub fn singleton_child(store: &EditorStore, node: &FlatNode) -> Result<FlatNode, StoreError> {
    match &node.value {
        FlatValue::Child(child_key) if node.tag().is_singleton() => store.get(child_key),
        _ => Err(kind_mismatch("wrapper or union", node)),
    }
}

/// The children of an array or object node, in visible order.
///
/// Arrays yield list order; objects yield the schema's `key_order` — never
/// the container's own iteration order — so rendering and diffing stay
/// deterministic.
pub fn visible_children(store: &EditorStore, node: &FlatNode) -> Result<Vec<FlatNode>, StoreError> {
    match (node.schema.kind(), &node.value) {
        (SchemaKind::Array { .. }, FlatValue::Items(list)) => {
            let keys = store.list_keys(*list, &node.key)?;
            keys.iter().map(|child_key| store.get(child_key)).collect()
        }
        (SchemaKind::Object { key_order, .. }, FlatValue::Properties(map)) => key_order
            .iter()
            .map(|name| {
                let child_key = store.property_key(*map, name, &node.key)?;
                store.get(&child_key)
            })
            .collect(),
        _ => Err(kind_mismatch("array or object", node)),
    }
}

/// One named property of an object node.
pub fn property(store: &EditorStore, node: &FlatNode, name: &str) -> Result<FlatNode, StoreError> {
    match (node.schema.kind(), &node.value) {
        (SchemaKind::Object { properties, .. }, FlatValue::Properties(map)) => {
            if !properties.contains_key(name) {
                return Err(StoreError::Node(NodeError::UnknownProperty {
                    schema: node.schema.name().to_string(),
                    property: name.to_string(),
                }));
            }
            let child_key = store.property_key(*map, name, &node.key)?;
            store.get(&child_key)
        }
        _ => Err(kind_mismatch("object", node)),
    }
}

fn kind_mismatch(expected: &'static str, node: &FlatNode) -> StoreError {
    StoreError::Node(NodeError::KindMismatch {
        expected,
        found: node.tag(),
        schema: node.schema.name().to_string(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────
