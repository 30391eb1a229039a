//! The schema algebra.
//!
//! A [`Schema`] is an immutable description of one node's shape: a globally
//! unique name plus a [`SchemaKind`] carrying the kind-specific data. The
//! kind set is closed — every recursive algorithm over schemas dispatches
//! with an exhaustive `match`, so a new kind is a compile error at every
//! dispatch site rather than a silent fall-through.
//!
//! Wrapper and union schemas carry behavior as capability objects
//! ([`WrapCodec`], [`Discriminant`]) implemented per document type, not as
//! closures embedded in data.

pub mod registry;

use crate::rich_text::RichTextFeature;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Shared handle to an immutable schema.
///
/// Schema graphs are DAGs built bottom-up; sharing is by reference count
/// and identity comparisons use pointer equality.
pub type SchemaRef = Arc<Schema>;

// ── Capability traits ──────────────────────────────────────────────────────

/// Conversion between a wrapped schema's nested value and the wrapper's own
/// nested value. Both directions are total.
pub trait WrapCodec: fmt::Debug {
    /// Convert the wrapped (inner) nested value into the wrapper's value.
    fn wrap(&self, inner: Value) -> Value;
    /// Convert the wrapper's nested value back into the wrapped value.
    fn unwrap(&self, outer: Value) -> Value;
}

/// The discriminator of a union schema: inspects a nested value and
/// deterministically selects exactly one option by index.
pub trait Discriminant: fmt::Debug {
    fn select(&self, value: &Value) -> usize;
}

// ── Errors ─────────────────────────────────────────────────────────────────

/// Schema-construction and registry-build failures.
///
/// These fire at schema-definition time, before any document exists, so
/// they always indicate a programming defect rather than bad document data.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("literal schema {schema:?} requires a scalar value")]
    NonScalarLiteral { schema: String },
    #[error("union schema {schema:?} must declare at least one option")]
    EmptyUnion { schema: String },
    #[error("object schema {schema:?} must declare at least one property")]
    EmptyObject { schema: String },
    #[error("object schema {schema:?} declares property {property:?} twice")]
    DuplicateProperty { schema: String, property: String },
    #[error("object schema {schema:?} does not list property {property:?} in its key order")]
    KeyOrderMissing { schema: String, property: String },
    #[error("object schema {schema:?} lists unknown property {property:?} in its key order")]
    KeyOrderUnknown { schema: String, property: String },
    #[error("object schema {schema:?} lists property {property:?} twice in its key order")]
    KeyOrderDuplicate { schema: String, property: String },
    #[error("schema name {0:?} is used by two different schemas")]
    DuplicateName(String),
}

// ── Kinds ──────────────────────────────────────────────────────────────────

/// Kind-specific schema data. One variant per kind; the set is closed.
#[derive(Debug)]
pub enum SchemaKind {
    /// Primitive boolean.
    Bool,
    /// A fixed scalar constant (string, number, or boolean).
    Literal(Value),
    /// Rich-text block; `features` lists what the editing surface enables.
    RichText { features: Vec<RichTextFeature> },
    /// Wraps one inner schema, converting values through `codec`.
    Wrapper {
        wrapped: SchemaRef,
        codec: Box<dyn WrapCodec>,
    },
    /// Ordered, non-empty option list with a discriminator.
    Union {
        options: Vec<SchemaRef>,
        discriminant: Box<dyn Discriminant>,
    },
    /// Uniform item schema applied to every element.
    Array { item: SchemaRef },
    /// Named properties with an explicit iteration order.
    Object {
        properties: IndexMap<String, SchemaRef>,
        key_order: Vec<String>,
    },
}

/// The bare kind tag of a schema, used for guard predicates and error
/// reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Literal,
    RichText,
    Wrapper,
    Union,
    Array,
    Object,
}

impl Kind {
    /// Literal or boolean.
    pub fn is_primitive(self) -> bool {
        matches!(self, Kind::Bool | Kind::Literal)
    }

    /// Primitive or rich text — a node with no child keys.
    pub fn is_leaf(self) -> bool {
        self.is_primitive() || self == Kind::RichText
    }

    /// Wrapper or union — a node referencing exactly one child.
    pub fn is_singleton(self) -> bool {
        matches!(self, Kind::Wrapper | Kind::Union)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Bool => "boolean",
            Kind::Literal => "literal",
            Kind::RichText => "rich-text",
            Kind::Wrapper => "wrapper",
            Kind::Union => "union",
            Kind::Array => "array",
            Kind::Object => "object",
        };
        f.write_str(name)
    }
}

// ── Schema ─────────────────────────────────────────────────────────────────

/// An immutable description of one node's shape.
#[derive(Debug)]
pub struct Schema {
    name: String,
    kind: SchemaKind,
}

impl Schema {
    /// Globally unique identifier; the only part of a schema that crosses
    /// the persistence boundary.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    pub fn tag(&self) -> Kind {
        match self.kind {
            SchemaKind::Bool => Kind::Bool,
            SchemaKind::Literal(_) => Kind::Literal,
            SchemaKind::RichText { .. } => Kind::RichText,
            SchemaKind::Wrapper { .. } => Kind::Wrapper,
            SchemaKind::Union { .. } => Kind::Union,
            SchemaKind::Array { .. } => Kind::Array,
            SchemaKind::Object { .. } => Kind::Object,
        }
    }

    // ── Constructors ───────────────────────────────────────────────────────

    pub fn bool(name: impl Into<String>) -> SchemaRef {
        Arc::new(Schema {
            name: name.into(),
            kind: SchemaKind::Bool,
        })
    }

    /// A literal schema holds one scalar constant; non-scalar values are
    /// rejected eagerly.
    pub fn literal(name: impl Into<String>, value: impl Into<Value>) -> Result<SchemaRef, SchemaError> {
        let name = name.into();
        let value = value.into();
        if !matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_)) {
            return Err(SchemaError::NonScalarLiteral { schema: name });
        }
        Ok(Arc::new(Schema {
            name,
            kind: SchemaKind::Literal(value),
        }))
    }

    pub fn rich_text(name: impl Into<String>, features: Vec<RichTextFeature>) -> SchemaRef {
        Arc::new(Schema {
            name: name.into(),
            kind: SchemaKind::RichText { features },
        })
    }

    pub fn wrapper(
        name: impl Into<String>,
        wrapped: SchemaRef,
        codec: impl WrapCodec + 'static,
    ) -> SchemaRef {
        Arc::new(Schema {
            name: name.into(),
            kind: SchemaKind::Wrapper {
                wrapped,
                codec: Box::new(codec),
            },
        })
    }

    pub fn union(
        name: impl Into<String>,
        options: Vec<SchemaRef>,
        discriminant: impl Discriminant + 'static,
    ) -> Result<SchemaRef, SchemaError> {
        let name = name.into();
        if options.is_empty() {
            return Err(SchemaError::EmptyUnion { schema: name });
        }
        Ok(Arc::new(Schema {
            name,
            kind: SchemaKind::Union {
                options,
                discriminant: Box::new(discriminant),
            },
        }))
    }

    pub fn array(name: impl Into<String>, item: SchemaRef) -> SchemaRef {
        Arc::new(Schema {
            name: name.into(),
            kind: SchemaKind::Array { item },
        })
    }

    /// An object schema requires at least one property, unique property
    /// names, and a `key_order` covering exactly the property names.
    pub fn object(
        name: impl Into<String>,
        properties: Vec<(String, SchemaRef)>,
        key_order: Vec<String>,
    ) -> Result<SchemaRef, SchemaError> {
        let name = name.into();
        if properties.is_empty() {
            return Err(SchemaError::EmptyObject { schema: name });
        }

        let mut map: IndexMap<String, SchemaRef> = IndexMap::with_capacity(properties.len());
        for (property, schema) in properties {
            if map.insert(property.clone(), schema).is_some() {
                return Err(SchemaError::DuplicateProperty {
                    schema: name,
                    property,
                });
            }
        }

        let mut seen: Vec<&str> = Vec::with_capacity(key_order.len());
        for property in &key_order {
            if !map.contains_key(property) {
                return Err(SchemaError::KeyOrderUnknown {
                    schema: name,
                    property: property.clone(),
                });
            }
            if seen.contains(&property.as_str()) {
                return Err(SchemaError::KeyOrderDuplicate {
                    schema: name,
                    property: property.clone(),
                });
            }
            seen.push(property);
        }
        for property in map.keys() {
            if !seen.contains(&property.as_str()) {
                return Err(SchemaError::KeyOrderMissing {
                    schema: name,
                    property: property.clone(),
                });
            }
        }

        Ok(Arc::new(Schema {
            name,
            kind: SchemaKind::Object {
                properties: map,
                key_order,
            },
        }))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf() -> SchemaRef {
        Schema::bool("Leaf")
    }

    #[test]
    fn literal_rejects_non_scalar_values() {
        assert!(Schema::literal("L", "tag").is_ok());
        assert!(Schema::literal("L", 7).is_ok());
        assert!(Schema::literal("L", true).is_ok());
        assert!(matches!(
            Schema::literal("L", json!({ "a": 1 })),
            Err(SchemaError::NonScalarLiteral { .. })
        ));
        assert!(matches!(
            Schema::literal("L", json!([1])),
            Err(SchemaError::NonScalarLiteral { .. })
        ));
    }

    #[test]
    fn union_rejects_empty_option_list() {
        #[derive(Debug)]
        struct First;
        impl Discriminant for First {
            fn select(&self, _value: &Value) -> usize {
                0
            }
        }
        assert!(matches!(
            Schema::union("U", Vec::new(), First),
            Err(SchemaError::EmptyUnion { .. })
        ));
    }

    #[test]
    fn object_rejects_empty_properties() {
        assert!(matches!(
            Schema::object("O", Vec::new(), Vec::new()),
            Err(SchemaError::EmptyObject { .. })
        ));
    }

    #[test]
    fn object_rejects_duplicate_property() {
        let result = Schema::object(
            "O",
            vec![("a".to_string(), leaf()), ("a".to_string(), leaf())],
            vec!["a".to_string()],
        );
        assert!(matches!(
            result,
            Err(SchemaError::DuplicateProperty { property, .. }) if property == "a"
        ));
    }

    #[test]
    fn object_key_order_must_cover_every_property() {
        let result = Schema::object(
            "O",
            vec![("a".to_string(), leaf()), ("b".to_string(), leaf())],
            vec!["a".to_string()],
        );
        assert!(matches!(
            result,
            Err(SchemaError::KeyOrderMissing { property, .. }) if property == "b"
        ));
    }

    #[test]
    fn object_key_order_rejects_unknown_and_duplicate_names() {
        let unknown = Schema::object(
            "O",
            vec![("a".to_string(), leaf())],
            vec!["a".to_string(), "b".to_string()],
        );
        assert!(matches!(
            unknown,
            Err(SchemaError::KeyOrderUnknown { property, .. }) if property == "b"
        ));

        let duplicate = Schema::object(
            "O",
            vec![("a".to_string(), leaf())],
            vec!["a".to_string(), "a".to_string()],
        );
        assert!(matches!(
            duplicate,
            Err(SchemaError::KeyOrderDuplicate { property, .. }) if property == "a"
        ));
    }

    #[test]
    fn kind_categories_are_mutually_exhaustive() {
        let all = [
            Kind::Bool,
            Kind::Literal,
            Kind::RichText,
            Kind::Wrapper,
            Kind::Union,
            Kind::Array,
            Kind::Object,
        ];
        for kind in all {
            let buckets = [
                kind.is_leaf(),
                kind.is_singleton(),
                matches!(kind, Kind::Array | Kind::Object),
            ];
            assert_eq!(
                buckets.iter().filter(|hit| **hit).count(),
                1,
                "{kind} must land in exactly one dispatch bucket"
            );
        }
        assert!(Kind::Literal.is_primitive());
        assert!(Kind::Bool.is_primitive());
        assert!(!Kind::RichText.is_primitive());
        assert!(Kind::RichText.is_leaf());
    }
}
