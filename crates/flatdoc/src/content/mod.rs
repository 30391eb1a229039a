//! The educational-content document type.
//!
//! Builds the concrete schema graph for documents composed of text blocks,
//! fill-in-the-blank exercises, and multiple-choice exercises, and carries
//! the reference implementations of the wrapper codec and union
//! discriminator capabilities.

use crate::rich_text::RichTextFeature;
use crate::schema::{Discriminant, Schema, SchemaError, SchemaRef, WrapCodec};
use serde_json::{json, Value};

/// Well-known key of the document root node, established once per
/// document.
pub const ROOT_KEY: &str = "root";

/// The discriminant tag of one content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Text,
    FillInTheBlank,
    MultipleChoice,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::FillInTheBlank => "fill-in-the-blank",
            ContentType::MultipleChoice => "multiple-choice",
        }
    }
}

/// Wraps a rich-text payload as `{"type": <tag>, "content": <inner>}`.
#[derive(Debug)]
struct TaggedContent {
    tag: ContentType,
}

impl WrapCodec for TaggedContent {
    fn wrap(&self, inner: Value) -> Value {
        json!({ "type": self.tag.as_str(), "content": inner })
    }

    fn unwrap(&self, outer: Value) -> Value {
        match outer {
            Value::Object(mut fields) => fields.remove("content").unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }
}

/// Identity codec for the root wrapper.
#[derive(Debug)]
struct IdentityWrap;

impl WrapCodec for IdentityWrap {
    fn wrap(&self, inner: Value) -> Value {
        inner
    }

    fn unwrap(&self, outer: Value) -> Value {
        outer
    }
}

/// Routes a content item by its `type` tag.
///
/// Anything that is not recognizably text or fill-in-the-blank routes to
/// multiple choice, whose own `type` literal property rejects a mistagged
/// value at the store boundary.
#[derive(Debug)]
struct ByContentType;

impl Discriminant for ByContentType {
    fn select(&self, value: &Value) -> usize {
        match value.get("type").and_then(Value::as_str) {
            Some("text") => 0,
            Some("fill-in-the-blank") => 1,
            _ => 2,
        }
    }
}

/// Build the root schema of the educational-content document type.
pub fn root_schema() -> Result<SchemaRef, SchemaError> {
    use RichTextFeature::*;

    let truth_value = Schema::bool("TruthValue");
    let inline_rich_text = Schema::rich_text("InlineRichText", vec![Bold, Italic]);
    let content_rich_text = Schema::rich_text(
        "ContentRichText",
        vec![Bold, Italic, Paragraph, Heading, List],
    );
    let blank_rich_text = Schema::rich_text(
        "FillInTheBlankRichText",
        vec![Bold, Italic, Paragraph, Blank],
    );

    let text_content = Schema::wrapper(
        "TextContent",
        content_rich_text,
        TaggedContent {
            tag: ContentType::Text,
        },
    );
    let fill_in_the_blank = Schema::wrapper(
        "FillInTheBlankExercise",
        blank_rich_text,
        TaggedContent {
            tag: ContentType::FillInTheBlank,
        },
    );

    let option = Schema::object(
        "MultipleChoiceOption",
        vec![
            ("isCorrect".to_string(), truth_value),
            ("text".to_string(), inline_rich_text.clone()),
        ],
        vec!["isCorrect".to_string(), "text".to_string()],
    )?;
    let multiple_choice = Schema::object(
        "MultipleChoiceExercise",
        vec![
            (
                "type".to_string(),
                Schema::literal("MultipleChoiceType", ContentType::MultipleChoice.as_str())?,
            ),
            ("question".to_string(), inline_rich_text),
            (
                "options".to_string(),
                Schema::array("MultipleChoiceOptions", option),
            ),
        ],
        vec![
            "type".to_string(),
            "question".to_string(),
            "options".to_string(),
        ],
    )?;

    let item = Schema::union(
        "EducationalContentItem",
        vec![text_content, fill_in_the_blank, multiple_choice],
        ByContentType,
    )?;
    let educational_content = Schema::array("EducationalContent", item);

    Ok(Schema::wrapper("Root", educational_content, IdentityWrap))
}

/// A small realistic document: one text block, one fill-in-the-blank
/// exercise, one multiple-choice exercise.
pub fn initial_content() -> Value {
    json!([
        {
            "type": "text",
            "content": {
                "type": "doc",
                "content": [
                    {
                        "type": "paragraph",
                        "content": [
                            {
                                "type": "text",
                                "text": "This is an example of educational content with various types of items."
                            }
                        ]
                    }
                ]
            }
        },
        {
            "type": "fill-in-the-blank",
            "content": {
                "type": "doc",
                "content": [
                    {
                        "type": "paragraph",
                        "content": [
                            { "type": "text", "text": "The capital of France is _____." }
                        ]
                    }
                ]
            }
        },
        {
            "type": "multiple-choice",
            "question": {
                "type": "doc",
                "content": [
                    {
                        "type": "paragraph",
                        "content": [{ "type": "text", "text": "What is 2 + 2?" }]
                    }
                ]
            },
            "options": [
                {
                    "isCorrect": false,
                    "text": {
                        "type": "doc",
                        "content": [
                            { "type": "paragraph", "content": [{ "type": "text", "text": "3" }] }
                        ]
                    }
                },
                {
                    "isCorrect": true,
                    "text": {
                        "type": "doc",
                        "content": [
                            { "type": "paragraph", "content": [{ "type": "text", "text": "4" }] }
                        ]
                    }
                },
                {
                    "isCorrect": false,
                    "text": {
                        "type": "doc",
                        "content": [
                            { "type": "paragraph", "content": [{ "type": "text", "text": "5" }] }
                        ]
                    }
                }
            ]
        }
    ])
}

// ── Tests ─────────────────────────────────────────────────────────────────
