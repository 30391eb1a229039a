//! Denormalization: reconstruct a nested value from the node graph.

use crate::node::flat::{self, FlatNode, FlatValue};
use crate::schema::SchemaKind;
use crate::store::{EditorStore, StoreError};
use serde_json::Value;

/// Recursively rebuild the nested value rooted at `node`.
///
/// Structural inverse of save: primitives return the stored scalar
/// verbatim, rich text returns the container's current snapshot, wrappers
/// re-apply their codec, unions pass the child through untouched, arrays
/// follow stored order, and objects assemble their fields in the schema's
/// `key_order`.
pub fn load(store: &EditorStore, node: &FlatNode) -> Result<Value, StoreError> {
    match node.schema.kind() {
        SchemaKind::Bool | SchemaKind::Literal(_) => match &node.value {
            FlatValue::Primitive(scalar) => Ok(scalar.clone()),
            _ => Err(StoreError::ValueMismatch(node.schema.name().to_string())),
        },
        SchemaKind::RichText { .. } => store.rich_text_content(node),
        SchemaKind::Wrapper { codec, .. } => {
            let child = flat::singleton_child(store, node)?;
            Ok(codec.wrap(load(store, &child)?))
        }
        SchemaKind::Union { .. } => {
            // The child's own shape already encodes the discriminant.
            let child = flat::singleton_child(store, node)?;
            load(store, &child)
        }
        SchemaKind::Array { .. } => {
            let children = flat::visible_children(store, node)?;
            let mut items = Vec::with_capacity(children.len());
            for child in &children {
                items.push(load(store, child)?);
            }
            Ok(Value::Array(items))
        }
        SchemaKind::Object { key_order, .. } => {
            let mut fields = serde_json::Map::with_capacity(key_order.len());
            for name in key_order {
                let child = flat::property(store, node, name)?;
                fields.insert(name.clone(), load(store, &child)?);
            }
            Ok(Value::Object(fields))
        }
    }
}
