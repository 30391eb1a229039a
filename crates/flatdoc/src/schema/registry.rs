//! Name-indexed schema lookup.
//!
//! Persisted nodes reference their schema by name only, so reads need a
//! table mapping every name reachable from the document's root schema back
//! to the schema itself. The registry is built once per document type and
//! passed into the store explicitly — it is a value, not a global.

use super::{SchemaError, SchemaKind, SchemaRef};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Immutable name → schema table for one root schema's graph.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    by_name: HashMap<String, SchemaRef>,
}

impl SchemaRegistry {
    /// Collect every schema reachable from `root` through wrapper, union,
    /// array, and object edges.
    ///
    /// Traversal is an iterative worklist with pointer-identity
    /// deduplication, so shared sub-schemas are visited once and diamond
    /// shapes terminate. Two *distinct* schemas with the same name violate
    /// the uniqueness invariant and fail the build.
    pub fn build(root: &SchemaRef) -> Result<Self, SchemaError> {
        let mut by_name: HashMap<String, SchemaRef> = HashMap::new();
        let mut visited: HashSet<usize> = HashSet::new();
        let mut worklist: Vec<SchemaRef> = vec![Arc::clone(root)];

        while let Some(current) = worklist.pop() {
            if !visited.insert(Arc::as_ptr(&current) as usize) {
                continue;
            }

            match by_name.get(current.name()) {
                Some(existing) if !Arc::ptr_eq(existing, &current) => {
                    return Err(SchemaError::DuplicateName(current.name().to_string()));
                }
                Some(_) => {}
                None => {
                    by_name.insert(current.name().to_string(), Arc::clone(&current));
                }
            }

            match current.kind() {
                SchemaKind::Bool | SchemaKind::Literal(_) | SchemaKind::RichText { .. } => {}
                SchemaKind::Wrapper { wrapped, .. } => worklist.push(Arc::clone(wrapped)),
                SchemaKind::Union { options, .. } => {
                    worklist.extend(options.iter().map(Arc::clone));
                }
                SchemaKind::Array { item } => worklist.push(Arc::clone(item)),
                SchemaKind::Object { properties, .. } => {
                    worklist.extend(properties.values().map(Arc::clone));
                }
            }
        }

        Ok(Self { by_name })
    }

    pub fn get(&self, name: &str) -> Option<&SchemaRef> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Registered schema names, in no meaningful order. Diagnostic use.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
