//! flatdoc — schema-typed documents as a normalized graph of flat nodes.
//!
//! A document value (educational content: text blocks, fill-in-the-blank
//! and multiple-choice exercises) is described by an immutable [`Schema`]
//! and stored as many small, independently addressable nodes so that
//! sub-values can be replicated, referenced, and updated without
//! re-serializing the whole document.
//!
//! The crate provides:
//! - the schema algebra ([`schema`]) and the name-indexed
//!   [`SchemaRegistry`] built from a root schema,
//! - the flat and nested node models ([`node`]),
//! - the transactional [`EditorStore`] owning the flat node graph
//!   ([`store`]),
//! - the two core recursive algorithms: [`ops::save`] (normalize) and
//!   [`ops::load`] (denormalize),
//! - the concrete educational-content document type ([`content`]).

pub mod content;
pub mod node;
pub mod ops;
pub mod rich_text;
pub mod schema;
pub mod store;

pub use node::flat::{FlatNode, FlatValue};
pub use node::nested::NestedNode;
pub use node::NodeError;
pub use ops::{load, save, save_root};
pub use rich_text::RichTextFeature;
pub use schema::registry::SchemaRegistry;
pub use schema::{Discriminant, Kind, Schema, SchemaError, SchemaKind, SchemaRef, WrapCodec};
pub use store::key::{Key, KeyGenerator, PrefixKeyGenerator};
pub use store::{EditorStore, StoreError, Transaction};

/// Returns the crate version at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
