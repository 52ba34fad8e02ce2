//! AST node types.
//!
//! The node shapes follow the mdast MDX JSX schema: two element kinds
//! (block-level "flow" and inline-level "text"), two attribute kinds (named
//! and expression/spread), and a small set of surrounding content nodes so
//! elements can be embedded in a document tree. All nodes serialize to the
//! JSON wire format with `type` discriminators (`mdxJsxFlowElement`,
//! `mdxJsxTextElement`, `mdxJsxAttribute`, `mdxJsxExpressionAttribute`,
//! `mdxJsxAttributeValueExpression`).

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::range::Position;

/// Document root. Children are block-level nodes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Root {
    pub children: Vec<BlockNode>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub position: Option<Position>,
}

/// Block-level content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BlockNode {
    #[serde(rename = "paragraph")]
    Paragraph(Paragraph),
    #[serde(rename = "mdxJsxFlowElement")]
    FlowElement(FlowElement),
}

/// Inline (phrasing) content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InlineNode {
    #[serde(rename = "text")]
    Text(Text),
    #[serde(rename = "strong")]
    Strong(Strong),
    #[serde(rename = "emphasis")]
    Emphasis(Emphasis),
    #[serde(rename = "inlineCode")]
    InlineCode(InlineCode),
    #[serde(rename = "mdxJsxTextElement")]
    TextElement(TextElement),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Paragraph {
    pub children: Vec<InlineNode>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Text {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Strong {
    pub children: Vec<InlineNode>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Emphasis {
    pub children: Vec<InlineNode>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InlineCode {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub position: Option<Position>,
}

/// Block-level JSX element, e.g. `<Card>` on its own lines.
///
/// `name: None` is a fragment (`<>…</>`). A fragment must not carry
/// attributes; the serializer rejects that combination.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowElement {
    pub name: Option<String>,
    pub attributes: Vec<Attribute>,
    pub children: Vec<BlockNode>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub position: Option<Position>,
}

/// Inline JSX element, e.g. `a <b>c</b> d` inside a paragraph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextElement {
    pub name: Option<String>,
    pub attributes: Vec<Attribute>,
    pub children: Vec<InlineNode>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub position: Option<Position>,
}

/// One attribute of an element, in source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Attribute {
    /// `name`, `name="value"`, or `name={expr}`.
    #[serde(rename = "mdxJsxAttribute")]
    Named(NamedAttribute),
    /// Spread-like `{...expr}` with no name.
    #[serde(rename = "mdxJsxExpressionAttribute")]
    Expression(ExpressionAttribute),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NamedAttribute {
    pub name: String,
    /// `None` is a boolean attribute (present without a value).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<AttributeValue>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExpressionAttribute {
    /// Raw expression source, without the surrounding braces.
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<ExpressionData>,
}

/// Value of a named attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Literal string value, character references already decoded.
    Literal(String),
    /// `{expr}` value, raw source preserved.
    Expression(ValueExpression),
}

/// An expression used as an attribute value (`name={expr}`).
///
/// Serializes with a `type: "mdxJsxAttributeValueExpression"` discriminator.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ValueExpression {
    pub value: String,
    #[serde(default)]
    pub data: Option<ExpressionData>,
}

impl Serialize for ValueExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = if self.data.is_some() { 3 } else { 2 };
        let mut s = serializer.serialize_struct("ValueExpression", fields)?;
        s.serialize_field("type", "mdxJsxAttributeValueExpression")?;
        s.serialize_field("value", &self.value)?;
        if let Some(data) = &self.data {
            s.serialize_field("data", data)?;
        }
        s.end()
    }
}

/// Auxiliary data produced by the pluggable expression parser.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExpressionData {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub estree: Option<serde_json::Value>,
}

impl Root {
    /// Drop position metadata from the whole tree.
    ///
    /// Useful for structural comparisons in tests, like
    /// `unist-util-remove-position` in the unified ecosystem.
    pub fn strip_positions(&mut self) {
        self.position = None;
        for child in &mut self.children {
            strip_block(child);
        }
    }
}

fn strip_block(node: &mut BlockNode) {
    match node {
        BlockNode::Paragraph(p) => {
            p.position = None;
            p.children.iter_mut().for_each(strip_inline);
        }
        BlockNode::FlowElement(e) => {
            e.position = None;
            e.children.iter_mut().for_each(strip_block);
        }
    }
}

fn strip_inline(node: &mut InlineNode) {
    match node {
        InlineNode::Text(t) => t.position = None,
        InlineNode::InlineCode(c) => c.position = None,
        InlineNode::Strong(s) => {
            s.position = None;
            s.children.iter_mut().for_each(strip_inline);
        }
        InlineNode::Emphasis(e) => {
            e.position = None;
            e.children.iter_mut().for_each(strip_inline);
        }
        InlineNode::TextElement(e) => {
            e.position = None;
            e.children.iter_mut().for_each(strip_inline);
        }
    }
}
