//! Normalization: flatten a nested value into the node graph.

use crate::node::flat::FlatValue;
use crate::node::nested::{self, NestedNode};
use crate::schema::SchemaKind;
use crate::store::key::Key;
use crate::store::{StoreError, Transaction};
use std::sync::Arc;

/// Save `node` as the document root at the caller-chosen well-known key.
///
/// The node itself lives at `root_key` with no parent; its children are
/// saved beneath it exactly as in [`save`].
pub fn save_root(
    tx: &mut Transaction<'_>,
    root_key: &Key,
    node: &NestedNode,
) -> Result<Key, StoreError> {
    let schema = Arc::clone(&node.schema);
    let value = flat_value(tx, root_key, node)?;
    tx.attach_root(&schema, root_key, value)
}

/// Recursively save `node` under `parent_key`, inserting one flat node per
/// recursion step, and return the key of the node just inserted.
pub fn save(
    tx: &mut Transaction<'_>,
    parent_key: &Key,
    node: &NestedNode,
) -> Result<Key, StoreError> {
    let schema = Arc::clone(&node.schema);
    tx.insert(&schema, parent_key, |tx, key| flat_value(tx, key, node))
}

/// Compute the flat value of `node`, whose own key is `own_key`. Children
/// are saved with `own_key` as their parent before the value is returned,
/// so child records always precede their parent record in the document.
fn flat_value(
    tx: &mut Transaction<'_>,
    own_key: &Key,
    node: &NestedNode,
) -> Result<FlatValue, StoreError> {
    match node.schema.kind() {
        SchemaKind::Bool | SchemaKind::Literal(_) => {
            Ok(FlatValue::Primitive(node.value.clone()))
        }
        SchemaKind::RichText { .. } => {
            let text = tx.create_text(node.value.clone())?;
            Ok(FlatValue::RichText(text))
        }
        SchemaKind::Wrapper { .. } => {
            let inner = nested::unwrap(node)?;
            Ok(FlatValue::Child(save(tx, own_key, &inner)?))
        }
        SchemaKind::Union { .. } => {
            let option = nested::select_option(node)?;
            Ok(FlatValue::Child(save(tx, own_key, &option)?))
        }
        SchemaKind::Array { .. } => {
            let list = tx.create_list();
            for item in nested::items(node)? {
                let child_key = save(tx, own_key, &item)?;
                tx.push_key(list, &child_key)?;
            }
            Ok(FlatValue::Items(list))
        }
        SchemaKind::Object { properties, .. } => {
            let map = tx.create_map();
            for name in properties.keys() {
                let prop = nested::property(node, name)?;
                let child_key = save(tx, own_key, &prop)?;
                tx.set_property_key(map, name, &child_key)?;
            }
            Ok(FlatValue::Properties(map))
        }
    }
}
