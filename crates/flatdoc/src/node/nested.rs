//! The nested (denormalized) node model.
//!
//! A [`NestedNode`] pairs a schema with a fully inlined JSON value. It is
//! never persisted: save consumes one supplied by the caller, load
//! reconstructs one from the flat graph. The accessors here perform one
//! step of recursive descent each and are the only way save walks into a
//! value.

use super::NodeError;
use crate::schema::{SchemaKind, SchemaRef};
use serde_json::Value;
use std::sync::Arc;

/// Transient pairing of a schema with a plain nested value.
#[derive(Debug, Clone)]
pub struct NestedNode {
    pub schema: SchemaRef,
    pub value: Value,
}

impl NestedNode {
    pub fn new(schema: SchemaRef, value: Value) -> Self {
        Self { schema, value }
    }
}

/// Descend into a wrapper: the wrapped schema paired with the codec's
/// unwrapped value.
pub fn unwrap(node: &NestedNode) -> Result<NestedNode, NodeError> {
    match node.schema.kind() {
        SchemaKind::Wrapper { wrapped, codec } => Ok(NestedNode {
            schema: Arc::clone(wrapped),
            value: codec.unwrap(node.value.clone()),
        }),
        _ => Err(kind_mismatch("wrapper", node)),
    }
}

/// Narrow a union to the option its discriminator selects.
///
/// The value is not transformed — only the schema narrows. Every option
/// schema must accept the exact nested-value shape the discriminator
/// inspected; that is a contract of the algebra, not an accident.
pub fn select_option(node: &NestedNode) -> Result<NestedNode, NodeError> {
    match node.schema.kind() {
        SchemaKind::Union {
            options,
            discriminant,
        } => {
            let index = discriminant.select(&node.value);
            let option = options.get(index).ok_or_else(|| NodeError::OptionOutOfRange {
                schema: node.schema.name().to_string(),
                index,
                count: options.len(),
            })?;
            Ok(NestedNode {
                schema: Arc::clone(option),
                value: node.value.clone(),
            })
        }
        _ => Err(kind_mismatch("union", node)),
    }
}

/// The elements of an array node, each paired with the item schema, in
/// input order.
pub fn items(node: &NestedNode) -> Result<Vec<NestedNode>, NodeError> {
    match node.schema.kind() {
        SchemaKind::Array { item } => match &node.value {
            Value::Array(elements) => Ok(elements
                .iter()
                .map(|element| NestedNode {
                    schema: Arc::clone(item),
                    value: element.clone(),
                })
                .collect()),
            _ => Err(NodeError::ValueShape {
                schema: node.schema.name().to_string(),
                expected: "an array",
            }),
        },
        _ => Err(kind_mismatch("array", node)),
    }
}

/// One named property of an object node.
pub fn property(node: &NestedNode, name: &str) -> Result<NestedNode, NodeError> {
    match node.schema.kind() {
        SchemaKind::Object { properties, .. } => {
            let schema = properties.get(name).ok_or_else(|| NodeError::UnknownProperty {
                schema: node.schema.name().to_string(),
                property: name.to_string(),
            })?;
            let value = match &node.value {
                Value::Object(fields) => fields.get(name).cloned(),
                _ => {
                    return Err(NodeError::ValueShape {
                        schema: node.schema.name().to_string(),
                        expected: "an object",
                    })
                }
            };
            let value = value.ok_or_else(|| NodeError::MissingProperty {
                schema: node.schema.name().to_string(),
                property: name.to_string(),
            })?;
            Ok(NestedNode {
                schema: Arc::clone(schema),
                value,
            })
        }
        _ => Err(kind_mismatch("object", node)),
    }
}

fn kind_mismatch(expected: &'static str, node: &NestedNode) -> NodeError {
    NodeError::KindMismatch {
        expected,
        found: node.schema.tag(),
        schema: node.schema.name().to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Discriminant, Schema, WrapCodec};
    use serde_json::json;

    #[derive(Debug)]
    struct Tagged;

    impl WrapCodec for Tagged {
        fn wrap(&self, inner: Value) -> Value {
            json!({ "tag": "t", "content": inner })
        }
        fn unwrap(&self, outer: Value) -> Value {
            match outer {
                Value::Object(mut fields) => fields.remove("content").unwrap_or(Value::Null),
                _ => Value::Null,
            }
        }
    }

    #[derive(Debug)]
    struct ByFlag;

    impl Discriminant for ByFlag {
        fn select(&self, value: &Value) -> usize {
            usize::from(value.as_bool() != Some(true))
        }
    }

    #[derive(Debug)]
    struct Beyond;

    impl Discriminant for Beyond {
        fn select(&self, _value: &Value) -> usize {
            9
        }
    }

    #[test]
    fn unwrap_applies_the_codec_and_narrows_the_schema() {
        let inner = Schema::bool("Inner");
        let wrapper = Schema::wrapper("Wrap", inner, Tagged);
        let node = NestedNode::new(wrapper, json!({ "tag": "t", "content": true }));

        let unwrapped = unwrap(&node).unwrap();
        assert_eq!(unwrapped.schema.name(), "Inner");
        assert_eq!(unwrapped.value, json!(true));
    }

    #[test]
    fn unwrap_rejects_non_wrapper_nodes() {
        let node = NestedNode::new(Schema::bool("B"), json!(true));
        assert!(matches!(
            unwrap(&node),
            Err(NodeError::KindMismatch { expected: "wrapper", .. })
        ));
    }

    #[test]
    fn select_option_narrows_without_transforming_the_value() {
        let yes = Schema::bool("Yes");
        let no = Schema::bool("No");
        let union = Schema::union("Flag", vec![yes, no], ByFlag).unwrap();

        let node = NestedNode::new(union, json!(true));
        let selected = select_option(&node).unwrap();
        assert_eq!(selected.schema.name(), "Yes");
        assert_eq!(selected.value, node.value);
    }

    #[test]
    fn select_option_surfaces_out_of_range_indices() {
        let union = Schema::union("Broken", vec![Schema::bool("Only")], Beyond).unwrap();
        let node = NestedNode::new(union, json!(false));
        assert!(matches!(
            select_option(&node),
            Err(NodeError::OptionOutOfRange { index: 9, count: 1, .. })
        ));
    }

    #[test]
    fn items_pairs_every_element_with_the_item_schema() {
        let array = Schema::array("Flags", Schema::bool("Flag"));
        let node = NestedNode::new(array, json!([true, false]));

        let elements = items(&node).unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].value, json!(true));
        assert_eq!(elements[1].value, json!(false));
        assert!(elements.iter().all(|el| el.schema.name() == "Flag"));
    }

    #[test]
    fn items_rejects_a_non_array_value() {
        let array = Schema::array("Flags", Schema::bool("Flag"));
        let node = NestedNode::new(array, json!({ "not": "an array" }));
        assert!(matches!(items(&node), Err(NodeError::ValueShape { .. })));
    }

    #[test]
    fn property_resolves_schema_and_value() {
        let object = Schema::object(
            "Pair",
            vec![("flag".to_string(), Schema::bool("Flag"))],
            vec!["flag".to_string()],
        )
        .unwrap();
        let node = NestedNode::new(object, json!({ "flag": true }));

        let flag = property(&node, "flag").unwrap();
        assert_eq!(flag.schema.name(), "Flag");
        assert_eq!(flag.value, json!(true));

        assert!(matches!(
            property(&node, "missing"),
            Err(NodeError::UnknownProperty { .. })
        ));
    }

    #[test]
    fn property_requires_the_value_to_carry_the_field() {
        let object = Schema::object(
            "Pair",
            vec![("flag".to_string(), Schema::bool("Flag"))],
            vec!["flag".to_string()],
        )
        .unwrap();
        let node = NestedNode::new(object, json!({}));
        assert!(matches!(
            property(&node, "flag"),
            Err(NodeError::MissingProperty { .. })
        ));
    }
}
