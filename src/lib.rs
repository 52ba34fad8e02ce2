//! MDX JSX element parsing and serialization for Markdown ASTs.
//!
//! Parses JSX elements embedded in markdown (`<Component prop="value" />`)
//! into a typed tree and serializes such trees back to markdown. Elements
//! come in two positions: *flow* (a tag on lines of its own, children
//! indented between the tags) and *text* (inline in a paragraph). Tags may
//! carry named attributes with literal or `{expression}` values and
//! `{...spread}` expression attributes; tag names support member
//! (`a.b.c`) and namespace (`svg:rect`) forms.
//!
//! Parsing is split the way a host markdown engine would drive it: a
//! [`tokenizer`] emits flat boundary events and the [`assemble`] step folds
//! them into a tree, checking that every opening tag is matched within its
//! paragraph or the document. Serialization is the inverse and reaches a
//! fixed point after one round trip.
//!
//! ```
//! let root = mdjsx::parse("<a x=\"1\" />")?;
//! assert_eq!(mdjsx::serialize(&root)?, "<a x=\"1\" />\n");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod assemble;
pub mod ast;
pub mod error;
pub mod escape;
pub mod event;
pub mod range;
pub mod serialize;
pub mod tokenizer;

pub use ast::{
    Attribute, AttributeValue, BlockNode, Emphasis, ExpressionAttribute, ExpressionData,
    FlowElement, InlineCode, InlineNode, NamedAttribute, Paragraph, Root, Strong, Text,
    TextElement, ValueExpression,
};
pub use error::{ParseError, Scope, SerializeError};
pub use event::{Edge, Event, TokenName};
pub use range::{Point, Position, Range};
pub use serialize::SerializeOptions;
pub use tokenizer::tokenize;

/// Where an expression appears in a tag, passed to [`ExpressionParser`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpressionKind {
    /// A spread-style expression attribute, `{...x}`.
    Spread,
    /// An attribute value, `name={x}`.
    AttributeValue,
}

/// Pluggable parser for the JavaScript expressions inside braces.
///
/// Without one, expressions are stored as raw source only. With one, its
/// output lands in [`ExpressionData::estree`] and a rejection aborts the
/// parse with [`ParseError::ExpressionParseFailure`].
pub trait ExpressionParser {
    fn parse(&self, source: &str, kind: ExpressionKind) -> Result<serde_json::Value, String>;
}

/// Options for [`parse_with_options`].
#[derive(Default, Clone, Copy)]
pub struct ParseOptions<'a> {
    pub expression_parser: Option<&'a dyn ExpressionParser>,
}

/// Parse a document with default options.
pub fn parse(input: &str) -> Result<Root, ParseError> {
    parse_with_options(input, &ParseOptions::default())
}

/// Parse a document.
pub fn parse_with_options(input: &str, options: &ParseOptions<'_>) -> Result<Root, ParseError> {
    let events = tokenizer::tokenize(input);
    assemble::assemble(input, &events, options)
}

/// Serialize a tree to markdown with default options.
pub fn serialize(root: &Root) -> Result<String, SerializeError> {
    serialize::to_markdown(root, &SerializeOptions::default())
}

/// Serialize a tree to markdown.
pub fn serialize_with_options(
    root: &Root,
    options: &SerializeOptions,
) -> Result<String, SerializeError> {
    serialize::to_markdown(root, options)
}
