//! The transactional store of flat nodes.
//!
//! An [`EditorStore`] exclusively owns one replica document, the key
//! generator, and the schema registry it resolves node schemas from. All
//! mutation goes through [`EditorStore::update`], which opens the single
//! transaction, commits the replica document once on success, and advances
//! the persisted `updateCount` exactly once — nested
//! [`Transaction::update`] calls ride the open transaction without a
//! second increment.
//!
//! Persisted layout: a top-level `nodes` map of key → node record
//! (`schemaName`, `key`, `parentKey`, `value`) and a top-level `metadata`
//! map carrying `updateCount`. Only schema *names* cross this boundary;
//! the schemas themselves are resolved from the registry at read time.

pub mod key;

use crate::node::flat::{FlatNode, FlatValue};
use crate::node::NodeError;
use crate::schema::registry::SchemaRegistry;
use crate::schema::{SchemaKind, SchemaRef};
use flatdoc_replica::{ListRef, MapRef, PlainValue, ReplicaDoc, ReplicaError, TextRef};
use indexmap::IndexMap;
use key::{Key, KeyGenerator, PrefixKeyGenerator};
use serde_json::Value;
use thiserror::Error;

const NODES_MAP: &str = "nodes";
const METADATA_MAP: &str = "metadata";
const UPDATE_COUNT_FIELD: &str = "updateCount";
const SCHEMA_NAME_FIELD: &str = "schemaName";
const KEY_FIELD: &str = "key";
const PARENT_KEY_FIELD: &str = "parentKey";
const VALUE_FIELD: &str = "value";

// ── Errors ─────────────────────────────────────────────────────────────────

/// Data-integrity failures surfaced by store reads and writes.
///
/// None of these are transient: a missing node or schema means the
/// document and the registry have drifted apart, and a corrupt record
/// means the persisted data no longer decodes for its schema kind. They
/// abort the operation in progress; nothing is fabricated or retried.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("node with key {0} does not exist")]
    NodeNotFound(Key),
    #[error("schema {0:?} is not registered")]
    SchemaNotFound(String),
    #[error("node {key} is corrupt: {reason}")]
    CorruptNode { key: Key, reason: String },
    #[error("flat value does not conform to schema {0:?}")]
    ValueMismatch(String),
    #[error(transparent)]
    Node(#[from] NodeError),
    #[error(transparent)]
    Replica(#[from] ReplicaError),
}

// ── Store ──────────────────────────────────────────────────────────────────

/// Keyed, transactional store of flat nodes over a replica document.
pub struct EditorStore {
    doc: ReplicaDoc,
    registry: SchemaRegistry,
    key_generator: Box<dyn KeyGenerator>,
    nodes: MapRef,
    metadata: MapRef,
}

impl EditorStore {
    /// Wrap a replica document, resolving schemas through `registry` and
    /// generating keys with the default prefix generator.
    pub fn new(doc: ReplicaDoc, registry: SchemaRegistry) -> Self {
        Self::with_key_generator(doc, registry, Box::new(PrefixKeyGenerator::new("n")))
    }

    pub fn with_key_generator(
        mut doc: ReplicaDoc,
        registry: SchemaRegistry,
        key_generator: Box<dyn KeyGenerator>,
    ) -> Self {
        let nodes = doc.get_map(NODES_MAP);
        let metadata = doc.get_map(METADATA_MAP);
        Self {
            doc,
            registry,
            key_generator,
            nodes,
            metadata,
        }
    }

    /// Hand the replica document back, e.g. for export by the engine.
    pub fn into_doc(self) -> ReplicaDoc {
        self.doc
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    // ── Reads ──────────────────────────────────────────────────────────────

    /// Resolve one flat node.
    ///
    /// Fails if the key is absent, if the recorded schema name is not in
    /// the registry, or if the stored value does not decode for the
    /// schema's kind.
    pub fn get(&self, key: &Key) -> Result<FlatNode, StoreError> {
        let record = self
            .doc
            .map_get(self.nodes, key.as_str())?
            .ok_or_else(|| StoreError::NodeNotFound(key.clone()))?;
        self.decode_node(key, record)
    }

    pub fn has(&self, key: &Key) -> bool {
        self.doc
            .map_contains(self.nodes, key.as_str())
            .unwrap_or(false)
    }

    /// Every stored node. Order carries no meaning; diagnostic use only.
    pub fn get_entries(&self) -> Result<Vec<(Key, FlatNode)>, StoreError> {
        let keys: Vec<Key> = self
            .doc
            .map_entries(self.nodes)?
            .map(|(name, _)| Key::from(name))
            .collect();
        keys.into_iter()
            .map(|key| {
                let node = self.get(&key)?;
                Ok((key, node))
            })
            .collect()
    }

    /// Number of committed transactions over the store's lifetime.
    /// Monotonically non-decreasing; observers compare it to detect
    /// commits.
    pub fn update_count(&self) -> u64 {
        match self.doc.map_get(self.metadata, UPDATE_COUNT_FIELD) {
            Ok(Some(PlainValue::Json(value))) => value.as_u64().unwrap_or(0),
            _ => 0,
        }
    }

    /// Current content snapshot of a rich-text node's container.
    pub fn rich_text_content(&self, node: &FlatNode) -> Result<Value, StoreError> {
        match &node.value {
            FlatValue::RichText(text) => Ok(self.doc.text_content(*text)?.clone()),
            _ => Err(StoreError::Node(NodeError::KindMismatch {
                expected: "rich-text",
                found: node.tag(),
                schema: node.schema.name().to_string(),
            })),
        }
    }

    // ── Transactions ───────────────────────────────────────────────────────

    /// Run `f` inside the store's transaction.
    ///
    /// On success the replica document is committed once (one unit of
    /// visibility for other replicas) and `updateCount` advances by
    /// exactly one. On failure the counter stays untouched and no commit
    /// notification fires; already-inserted nodes are left for external
    /// garbage collection of unreferenced keys.
    pub fn update<R>(
        &mut self,
        f: impl FnOnce(&mut Transaction<'_>) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let result = {
            let mut tx = Transaction { store: &mut *self };
            f(&mut tx)
        };
        match result {
            Ok(value) => {
                self.bump_update_count()?;
                self.doc.commit();
                Ok(value)
            }
            Err(error) => Err(error),
        }
    }

    fn bump_update_count(&mut self) -> Result<(), StoreError> {
        let next = self.update_count() + 1;
        self.doc
            .map_set(self.metadata, UPDATE_COUNT_FIELD, PlainValue::Json(next.into()))?;
        Ok(())
    }

    // ── Container dereferencing ────────────────────────────────────────────

    pub(crate) fn list_keys(&self, list: ListRef, owner: &Key) -> Result<Vec<Key>, StoreError> {
        self.doc
            .list_slots(list)?
            .iter()
            .map(|slot| {
                key_from_plain(slot)
                    .ok_or_else(|| corrupt(owner, "array slot does not hold a key"))
            })
            .collect()
    }

    pub(crate) fn property_key(
        &self,
        map: MapRef,
        name: &str,
        owner: &Key,
    ) -> Result<Key, StoreError> {
        match self.doc.map_get(map, name)? {
            Some(slot) => key_from_plain(slot)
                .ok_or_else(|| corrupt(owner, "property slot does not hold a key")),
            None => Err(corrupt(owner, &format!("no key stored for property {name:?}"))),
        }
    }

    // ── Record decoding ────────────────────────────────────────────────────

    fn decode_node(&self, key: &Key, record: &PlainValue) -> Result<FlatNode, StoreError> {
        let PlainValue::Record(fields) = record else {
            return Err(corrupt(key, "entry is not a node record"));
        };

        let schema_name = match fields.get(SCHEMA_NAME_FIELD) {
            Some(PlainValue::Json(Value::String(name))) => name,
            _ => return Err(corrupt(key, "missing schema name")),
        };
        let schema = self
            .registry
            .get(schema_name)
            .cloned()
            .ok_or_else(|| StoreError::SchemaNotFound(schema_name.clone()))?;

        let parent_key = match fields.get(PARENT_KEY_FIELD) {
            Some(PlainValue::Json(Value::Null)) => None,
            Some(PlainValue::Json(Value::String(parent))) => Some(Key::from(parent.as_str())),
            _ => return Err(corrupt(key, "missing parent key")),
        };

        let raw = fields
            .get(VALUE_FIELD)
            .ok_or_else(|| corrupt(key, "missing value"))?;
        let value = decode_flat(&schema, raw)
            .ok_or_else(|| corrupt(key, "value does not decode for the schema kind"))?;

        Ok(FlatNode {
            schema,
            key: key.clone(),
            parent_key,
            value,
        })
    }
}

// ── Transaction handle ─────────────────────────────────────────────────────

/// The store's single open transaction.
pub struct Transaction<'s> {
    store: &'s mut EditorStore,
}

impl<'s> Transaction<'s> {
    /// Re-entrant update: runs `f` against the already-open transaction.
    /// No state transition, no extra `updateCount` increment — nested
    /// calls are transparent passengers on the outer transaction.
    pub fn update<R>(
        &mut self,
        f: impl FnOnce(&mut Transaction<'_>) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        f(self)
    }

    /// Insert one node under `parent_key` and return its freshly generated
    /// key.
    ///
    /// The key is allocated *before* the value: `create_value` receives it
    /// so the value can reference the node's own identity (children saved
    /// under it, containers tied to it). The produced value is validated
    /// against the schema's flat-value guard before anything is written.
    pub fn insert<F>(
        &mut self,
        schema: &SchemaRef,
        parent_key: &Key,
        create_value: F,
    ) -> Result<Key, StoreError>
    where
        F: FnOnce(&mut Transaction<'_>, &Key) -> Result<FlatValue, StoreError>,
    {
        let key = self.store.key_generator.next_key();
        let value = create_value(&mut *self, &key)?;
        self.write_node(schema, key.clone(), Some(parent_key.clone()), value)?;
        Ok(key)
    }

    /// Variant of [`Transaction::insert`] for the document root: reuses
    /// the caller-supplied well-known key and records no parent.
    pub fn attach_root(
        &mut self,
        schema: &SchemaRef,
        root_key: &Key,
        value: FlatValue,
    ) -> Result<Key, StoreError> {
        self.write_node(schema, root_key.clone(), None, value)?;
        Ok(root_key.clone())
    }

    fn write_node(
        &mut self,
        schema: &SchemaRef,
        key: Key,
        parent_key: Option<Key>,
        value: FlatValue,
    ) -> Result<(), StoreError> {
        if !schema.is_flat_value(&value) {
            return Err(StoreError::ValueMismatch(schema.name().to_string()));
        }

        let mut fields: IndexMap<String, PlainValue> = IndexMap::with_capacity(4);
        fields.insert(
            SCHEMA_NAME_FIELD.to_string(),
            PlainValue::Json(Value::String(schema.name().to_string())),
        );
        fields.insert(KEY_FIELD.to_string(), plain_key(&key));
        fields.insert(
            PARENT_KEY_FIELD.to_string(),
            match &parent_key {
                Some(parent) => plain_key(parent),
                None => PlainValue::Json(Value::Null),
            },
        );
        fields.insert(VALUE_FIELD.to_string(), encode_flat(&value));

        let nodes = self.store.nodes;
        self.store
            .doc
            .map_set(nodes, key.as_str(), PlainValue::Record(fields))?;
        Ok(())
    }

    // ── Container creation for flat values ─────────────────────────────────

    pub(crate) fn create_list(&mut self) -> ListRef {
        self.store.doc.create_list()
    }

    pub(crate) fn create_map(&mut self) -> MapRef {
        self.store.doc.create_map()
    }

    /// Create a rich-text container pre-populated with `content`. The
    /// container identity exists before the content is attached.
    pub(crate) fn create_text(&mut self, content: Value) -> Result<TextRef, StoreError> {
        let text = self.store.doc.create_text();
        self.store.doc.text_set_content(text, content)?;
        Ok(text)
    }

    pub(crate) fn push_key(&mut self, list: ListRef, key: &Key) -> Result<(), StoreError> {
        self.store.doc.list_push(list, plain_key(key))?;
        Ok(())
    }

    pub(crate) fn set_property_key(
        &mut self,
        map: MapRef,
        name: &str,
        key: &Key,
    ) -> Result<(), StoreError> {
        self.store.doc.map_set(map, name, plain_key(key))?;
        Ok(())
    }
}

// ── Flat-value codec ───────────────────────────────────────────────────────

fn encode_flat(value: &FlatValue) -> PlainValue {
    match value {
        FlatValue::Primitive(scalar) => PlainValue::Json(scalar.clone()),
        FlatValue::RichText(text) => PlainValue::Text(*text),
        FlatValue::Child(child) => plain_key(child),
        FlatValue::Items(list) => PlainValue::List(*list),
        FlatValue::Properties(map) => PlainValue::Map(*map),
    }
}

/// Decode a stored slot as the flat value of `schema`, rejecting any shape
/// the schema's value guard does not accept.
fn decode_flat(schema: &SchemaRef, raw: &PlainValue) -> Option<FlatValue> {
    let value = match (schema.kind(), raw) {
        (SchemaKind::Bool | SchemaKind::Literal(_), PlainValue::Json(scalar)) => {
            FlatValue::Primitive(scalar.clone())
        }
        (SchemaKind::RichText { .. }, PlainValue::Text(text)) => FlatValue::RichText(*text),
        (
            SchemaKind::Wrapper { .. } | SchemaKind::Union { .. },
            PlainValue::Json(Value::String(child)),
        ) => FlatValue::Child(Key::from(child.as_str())),
        (SchemaKind::Array { .. }, PlainValue::List(list)) => FlatValue::Items(*list),
        (SchemaKind::Object { .. }, PlainValue::Map(map)) => FlatValue::Properties(*map),
        _ => return None,
    };
    schema.is_flat_value(&value).then_some(value)
}

fn plain_key(key: &Key) -> PlainValue {
    PlainValue::Json(Value::String(key.as_str().to_string()))
}

fn key_from_plain(slot: &PlainValue) -> Option<Key> {
    match slot {
        PlainValue::Json(Value::String(key)) => Some(Key::from(key.as_str())),
        _ => None,
    }
}

fn corrupt(key: &Key, reason: &str) -> StoreError {
    StoreError::CorruptNode {
        key: key.clone(),
        reason: reason.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use serde_json::json;

    fn bool_store() -> (EditorStore, SchemaRef) {
        let schema = Schema::bool("Flag");
        let registry = SchemaRegistry::build(&schema).unwrap();
        (EditorStore::new(ReplicaDoc::new(), registry), schema)
    }

    #[test]
    fn attach_root_then_get_round_trips_the_record() {
        let (mut store, schema) = bool_store();
        let root = Key::from("root");

        store
            .update(|tx| tx.attach_root(&schema, &root, FlatValue::Primitive(json!(true))))
            .unwrap();

        assert!(store.has(&root));
        let node = store.get(&root).unwrap();
        assert_eq!(node.key, root);
        assert_eq!(node.parent_key, None);
        assert_eq!(node.schema.name(), "Flag");
        assert_eq!(node.value, FlatValue::Primitive(json!(true)));
    }

    #[test]
    fn get_fails_on_absent_keys() {
        let (store, _) = bool_store();
        assert!(matches!(
            store.get(&Key::from("nope")),
            Err(StoreError::NodeNotFound(key)) if key == Key::from("nope")
        ));
        assert!(!store.has(&Key::from("nope")));
    }

    #[test]
    fn insert_rejects_a_value_the_guard_refuses() {
        let (mut store, schema) = bool_store();
        let root = Key::from("root");

        let result = store.update(|tx| {
            tx.attach_root(&schema, &root, FlatValue::Primitive(json!("not a bool")))
        });
        assert!(matches!(result, Err(StoreError::ValueMismatch(name)) if name == "Flag"));
        // The failed transaction must not advance the counter.
        assert_eq!(store.update_count(), 0);
    }

    #[test]
    fn update_count_advances_once_per_outer_update() {
        let (mut store, schema) = bool_store();
        let root = Key::from("root");

        assert_eq!(store.update_count(), 0);
        store
            .update(|tx| {
                tx.update(|tx| tx.attach_root(&schema, &root, FlatValue::Primitive(json!(true))))?;
                tx.insert(&schema, &root, |_, _| Ok(FlatValue::Primitive(json!(false))))
            })
            .unwrap();
        assert_eq!(store.update_count(), 1);
    }

    #[test]
    fn insert_passes_the_fresh_key_to_the_value_builder() {
        let (mut store, schema) = bool_store();
        let root = Key::from("root");

        let (inserted, seen) = store
            .update(|tx| {
                tx.attach_root(&schema, &root, FlatValue::Primitive(json!(true)))?;
                let mut seen = None;
                let inserted = tx.insert(&schema, &root, |_, key| {
                    seen = Some(key.clone());
                    Ok(FlatValue::Primitive(json!(false)))
                })?;
                Ok((inserted, seen))
            })
            .unwrap();

        assert_eq!(seen, Some(inserted.clone()));
        let node = store.get(&inserted).unwrap();
        assert_eq!(node.parent_key, Some(root));
    }
}
