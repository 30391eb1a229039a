//! Rich-text feature sets.
//!
//! A rich-text schema names the features its editing surface enables; the
//! editing surface itself lives outside this crate. The only classification
//! the core needs is inline vs. block, which drives how a rich-text node
//! may be embedded (an inline text may not contain paragraphs or headings).

/// One capability of a rich-text schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RichTextFeature {
    Bold,
    Italic,
    Blank,
    Paragraph,
    Heading,
    List,
}

impl RichTextFeature {
    /// Block-level features introduce their own layout boxes.
    pub fn is_block(self) -> bool {
        matches!(
            self,
            RichTextFeature::Paragraph | RichTextFeature::Heading | RichTextFeature::List
        )
    }
}

/// A feature set is inline when it enables no block-level feature.
pub fn is_inline(features: &[RichTextFeature]) -> bool {
    !features.iter().any(|feature| feature.is_block())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_classification() {
        assert!(is_inline(&[RichTextFeature::Bold, RichTextFeature::Italic]));
        assert!(is_inline(&[]));
        assert!(!is_inline(&[
            RichTextFeature::Bold,
            RichTextFeature::Paragraph
        ]));
        assert!(!is_inline(&[RichTextFeature::Heading]));
        assert!(!is_inline(&[RichTextFeature::List]));
        assert!(is_inline(&[RichTextFeature::Blank]));
    }
}
