//! In-memory replicated-document containers.
//!
//! A [`ReplicaDoc`] owns every container of one document: named top-level
//! maps, plus anonymous list, map, and rich-text containers created on
//! demand and addressed by small copyable handles. It is the synchronous
//! stand-in for a multi-writer replication engine — the normalization core
//! built on top of it only ever sees this interface, so the physical engine
//! can be swapped without touching the core.
//!
//! Merging concurrent edits is out of scope here; a committed transaction
//! maps onto one [`ReplicaDoc::commit`], which advances the mutation tick
//! and notifies update listeners as a unit.

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

// ── Handles ────────────────────────────────────────────────────────────────

/// Handle to an ordered-list container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListRef(u32);

/// Handle to a key-value container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapRef(u32);

/// Handle to a rich-text container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextRef(u32);

// ── Values ─────────────────────────────────────────────────────────────────

/// One slot of a container.
///
/// Plain JSON data lives inline; nested containers are referenced by handle.
/// `Record` is a plain (non-replicated) field map that may hold handles —
/// the shape a stored node entry uses for its metadata-plus-value record.
#[derive(Debug, Clone, PartialEq)]
pub enum PlainValue {
    Json(Value),
    Record(IndexMap<String, PlainValue>),
    List(ListRef),
    Map(MapRef),
    Text(TextRef),
}

// ── Errors ─────────────────────────────────────────────────────────────────

/// A handle that does not resolve to a live container.
///
/// Dangling handles are data-integrity defects: they are never fabricated
/// into defaults, always surfaced to the caller.
#[derive(Debug, Error)]
pub enum ReplicaError {
    #[error("list container #{0} does not exist")]
    DanglingList(u32),
    #[error("map container #{0} does not exist")]
    DanglingMap(u32),
    #[error("text container #{0} does not exist")]
    DanglingText(u32),
}

/// Callback invoked with the new tick after every committed mutation.
pub type UpdateListener = Box<dyn FnMut(u64)>;

// ── Document ───────────────────────────────────────────────────────────────

/// One replicated document: named root maps plus anonymous containers.
///
/// Containers are arena-allocated; a handle is an index into its arena.
/// Allocating a container first and filling it afterwards is deliberate —
/// it lets a value reference its own container identity before any content
/// is attached.
#[derive(Default)]
pub struct ReplicaDoc {
    named: IndexMap<String, MapRef>,
    maps: Vec<IndexMap<String, PlainValue>>,
    lists: Vec<Vec<PlainValue>>,
    texts: Vec<Value>,
    tick: u64,
    listeners: Vec<UpdateListener>,
}

impl fmt::Debug for ReplicaDoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicaDoc")
            .field("named", &self.named)
            .field("maps", &self.maps.len())
            .field("lists", &self.lists.len())
            .field("texts", &self.texts.len())
            .field("tick", &self.tick)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ReplicaDoc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the named top-level map, creating it on first use.
    pub fn get_map(&mut self, name: &str) -> MapRef {
        if let Some(handle) = self.named.get(name) {
            return *handle;
        }
        let handle = self.create_map();
        self.named.insert(name.to_string(), handle);
        handle
    }

    // ── Container creation ─────────────────────────────────────────────────

    pub fn create_list(&mut self) -> ListRef {
        self.lists.push(Vec::new());
        ListRef(self.lists.len() as u32 - 1)
    }

    pub fn create_map(&mut self) -> MapRef {
        self.maps.push(IndexMap::new());
        MapRef(self.maps.len() as u32 - 1)
    }

    /// Create an empty rich-text container. The handle exists before any
    /// content does; attach content with [`ReplicaDoc::text_set_content`].
    pub fn create_text(&mut self) -> TextRef {
        self.texts.push(Value::Null);
        TextRef(self.texts.len() as u32 - 1)
    }

    // ── List operations ────────────────────────────────────────────────────

    pub fn list_push(&mut self, list: ListRef, value: PlainValue) -> Result<(), ReplicaError> {
        self.list_mut(list)?.push(value);
        Ok(())
    }

    pub fn list_len(&self, list: ListRef) -> Result<usize, ReplicaError> {
        Ok(self.list(list)?.len())
    }

    pub fn list_get(&self, list: ListRef, index: usize) -> Result<Option<&PlainValue>, ReplicaError> {
        Ok(self.list(list)?.get(index))
    }

    /// Slots of `list` in insertion order.
    pub fn list_slots(&self, list: ListRef) -> Result<&[PlainValue], ReplicaError> {
        Ok(self.list(list)?.as_slice())
    }

    // ── Map operations ─────────────────────────────────────────────────────

    pub fn map_set(&mut self, map: MapRef, key: &str, value: PlainValue) -> Result<(), ReplicaError> {
        self.map_mut(map)?.insert(key.to_string(), value);
        Ok(())
    }

    pub fn map_get(&self, map: MapRef, key: &str) -> Result<Option<&PlainValue>, ReplicaError> {
        Ok(self.map(map)?.get(key))
    }

    pub fn map_contains(&self, map: MapRef, key: &str) -> Result<bool, ReplicaError> {
        Ok(self.map(map)?.contains_key(key))
    }

    pub fn map_len(&self, map: MapRef) -> Result<usize, ReplicaError> {
        Ok(self.map(map)?.len())
    }

    /// Entries of `map` in insertion order.
    pub fn map_entries(
        &self,
        map: MapRef,
    ) -> Result<impl Iterator<Item = (&str, &PlainValue)> + '_, ReplicaError> {
        Ok(self.map(map)?.iter().map(|(k, v)| (k.as_str(), v)))
    }

    // ── Text operations ────────────────────────────────────────────────────

    pub fn text_set_content(&mut self, text: TextRef, content: Value) -> Result<(), ReplicaError> {
        *self.text_mut(text)? = content;
        Ok(())
    }

    /// Current content snapshot of a rich-text container.
    pub fn text_content(&self, text: TextRef) -> Result<&Value, ReplicaError> {
        self.text(text)
    }

    // ── Commit & observation ───────────────────────────────────────────────

    /// Mutation counter. Advances once per [`ReplicaDoc::commit`].
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Commit all mutations since the previous commit as one unit: advance
    /// the tick and notify every update listener.
    pub fn commit(&mut self) {
        self.tick += 1;
        let tick = self.tick;
        for listener in &mut self.listeners {
            listener(tick);
        }
    }

    /// Register a callback invoked after every committed mutation.
    pub fn add_update_listener(&mut self, listener: UpdateListener) {
        self.listeners.push(listener);
    }

    // ── Arena access ───────────────────────────────────────────────────────

    fn list(&self, handle: ListRef) -> Result<&Vec<PlainValue>, ReplicaError> {
        self.lists
            .get(handle.0 as usize)
            .ok_or(ReplicaError::DanglingList(handle.0))
    }

    fn list_mut(&mut self, handle: ListRef) -> Result<&mut Vec<PlainValue>, ReplicaError> {
        self.lists
            .get_mut(handle.0 as usize)
            .ok_or(ReplicaError::DanglingList(handle.0))
    }

    fn map(&self, handle: MapRef) -> Result<&IndexMap<String, PlainValue>, ReplicaError> {
        self.maps
            .get(handle.0 as usize)
            .ok_or(ReplicaError::DanglingMap(handle.0))
    }

    fn map_mut(&mut self, handle: MapRef) -> Result<&mut IndexMap<String, PlainValue>, ReplicaError> {
        self.maps
            .get_mut(handle.0 as usize)
            .ok_or(ReplicaError::DanglingMap(handle.0))
    }

    fn text(&self, handle: TextRef) -> Result<&Value, ReplicaError> {
        self.texts
            .get(handle.0 as usize)
            .ok_or(ReplicaError::DanglingText(handle.0))
    }

    fn text_mut(&mut self, handle: TextRef) -> Result<&mut Value, ReplicaError> {
        self.texts
            .get_mut(handle.0 as usize)
            .ok_or(ReplicaError::DanglingText(handle.0))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn named_map_is_created_once() {
        let mut doc = ReplicaDoc::new();
        let a = doc.get_map("nodes");
        let b = doc.get_map("nodes");
        assert_eq!(a, b);
        assert_ne!(doc.get_map("metadata"), a);
    }

    #[test]
    fn list_preserves_insertion_order() {
        let mut doc = ReplicaDoc::new();
        let list = doc.create_list();
        doc.list_push(list, PlainValue::Json(json!("a"))).unwrap();
        doc.list_push(list, PlainValue::Json(json!("b"))).unwrap();
        assert_eq!(doc.list_len(list).unwrap(), 2);
        assert_eq!(
            doc.list_slots(list).unwrap(),
            &[PlainValue::Json(json!("a")), PlainValue::Json(json!("b"))]
        );
    }

    #[test]
    fn map_entries_preserve_insertion_order() {
        let mut doc = ReplicaDoc::new();
        let map = doc.create_map();
        doc.map_set(map, "z", PlainValue::Json(json!(1))).unwrap();
        doc.map_set(map, "a", PlainValue::Json(json!(2))).unwrap();
        let keys: Vec<&str> = doc.map_entries(map).unwrap().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn text_identity_exists_before_content() {
        let mut doc = ReplicaDoc::new();
        let text = doc.create_text();
        assert_eq!(doc.text_content(text).unwrap(), &Value::Null);
        doc.text_set_content(text, json!({ "type": "doc" })).unwrap();
        assert_eq!(doc.text_content(text).unwrap(), &json!({ "type": "doc" }));
    }

    #[test]
    fn dangling_handles_are_errors() {
        let doc = ReplicaDoc::new();
        assert!(matches!(
            doc.list_len(ListRef(7)),
            Err(ReplicaError::DanglingList(7))
        ));
        assert!(matches!(
            doc.map_get(MapRef(7), "x"),
            Err(ReplicaError::DanglingMap(7))
        ));
        assert!(matches!(
            doc.text_content(TextRef(7)),
            Err(ReplicaError::DanglingText(7))
        ));
    }

    #[test]
    fn commit_advances_tick_and_notifies_listeners() {
        let mut doc = ReplicaDoc::new();
        let seen: Rc<RefCell<Vec<u64>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        doc.add_update_listener(Box::new(move |tick| sink.borrow_mut().push(tick)));

        assert_eq!(doc.tick(), 0);
        doc.commit();
        doc.commit();
        assert_eq!(doc.tick(), 2);
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }
}
