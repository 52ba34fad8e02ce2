//! Boundary events.
//!
//! The tokenizer communicates with the tree assembler through a flat stream
//! of enter/exit events over named token types. Each event carries a byte
//! range into the source; `Enter` marks where a construct starts and `Exit`
//! spans its full extent, so consumers can slice the covered text on exit
//! without buffering.

use crate::range::Range;

/// Whether a boundary opens or closes its token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Enter,
    Exit,
}

/// Token types appearing in the event stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenName {
    /// A paragraph of inline content.
    Paragraph,
    /// Plain text between constructs.
    Data,
    /// A line ending inside a paragraph.
    LineEnding,
    /// A JSX tag occupying its own line(s) (flow position).
    FlowTag,
    /// A JSX tag inside paragraph content (text position).
    TextTag,
    /// The `/` right after `<` in a closing tag.
    TagClosingMarker,
    /// The `/` right before `>` in a self-closing tag.
    TagSelfClosingMarker,
    /// First segment of a tag name (`a` in `a.b` or `a:b`).
    TagNamePrimary,
    /// A `.`-joined member segment of a tag name.
    TagNameMember,
    /// A `:`-joined local segment of a tag name.
    TagNameLocal,
    /// A named attribute (`x`, `x="y"`, `x={y}`).
    TagAttribute,
    /// A brace-wrapped expression attribute (`{...x}`).
    TagExpressionAttribute,
    /// The inner source of an expression attribute.
    TagExpressionAttributeValue,
    /// Primary part of an attribute name.
    TagAttributeNamePrimary,
    /// Local (`:`-suffixed) part of an attribute name.
    TagAttributeNameLocal,
    /// A quoted literal attribute value, including quotes.
    TagAttributeValueLiteral,
    /// The text between the quotes of a literal value.
    TagAttributeValueLiteralValue,
    /// A brace-wrapped expression attribute value.
    TagAttributeValueExpression,
    /// The inner source of an expression value.
    TagAttributeValueExpressionValue,
}

/// One boundary in the stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Event {
    pub edge: Edge,
    pub name: TokenName,
    pub span: Range,
}

impl Event {
    #[inline]
    pub fn enter(name: TokenName, at: u32) -> Self {
        Self {
            edge: Edge::Enter,
            name,
            span: Range::empty_at(at),
        }
    }

    #[inline]
    pub fn exit(name: TokenName, span: Range) -> Self {
        Self {
            edge: Edge::Exit,
            name,
            span,
        }
    }
}
