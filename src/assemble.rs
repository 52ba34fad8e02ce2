//! Tree assembly from boundary events.
//!
//! The assembler walks the event stream once, keeping two explicit stacks:
//! open tags awaiting their closing counterpart, and container nodes whose
//! children are still being collected. Both stacks are fields of one
//! assembler value created per parse; nothing is shared between documents.
//!
//! Structural errors surface here with source positions: a closing tag with
//! nothing open, markers or attributes on closing tags, name mismatches,
//! and tags left open when their paragraph or the document ends.

use smallvec::SmallVec;

use crate::ast::{
    Attribute, AttributeValue, BlockNode, ExpressionAttribute, ExpressionData, FlowElement,
    InlineNode, NamedAttribute, Paragraph, Root, Text, TextElement, ValueExpression,
};
use crate::error::{ParseError, Scope};
use crate::escape::{decode_attribute_value, decode_backslash_escapes};
use crate::event::{Edge, Event, TokenName};
use crate::range::{LineIndex, Point, Position, Range};
use crate::{ExpressionKind, ParseOptions};

/// Assemble a token stream into a tree.
///
/// `events` must come from [`crate::tokenizer::tokenize`] (or an equivalent
/// producer) over the same `input`.
pub fn assemble(
    input: &str,
    events: &[Event],
    options: &ParseOptions<'_>,
) -> Result<Root, ParseError> {
    let mut assembler = Assembler {
        input,
        lines: LineIndex::new(input),
        options,
        tag_stack: SmallVec::new(),
        containers: vec![Container::Root { children: Vec::new() }],
        current: None,
        paragraph_base: 0,
        in_paragraph: false,
    };
    for event in events {
        assembler.handle(event)?;
    }
    assembler.finish(input)
}

/// An open tag waiting for its closing counterpart.
struct OpenTag {
    name: Option<String>,
    /// Position of the opening tag itself, cited in error messages.
    position: Position,
}

/// A node whose children are still being collected.
enum Container {
    Root {
        children: Vec<BlockNode>,
    },
    Paragraph {
        children: Vec<InlineNode>,
    },
    Flow {
        name: Option<String>,
        attributes: Vec<Attribute>,
        children: Vec<BlockNode>,
        start: Point,
    },
    Text {
        name: Option<String>,
        attributes: Vec<Attribute>,
        children: Vec<InlineNode>,
        start: Point,
    },
}

/// A tag under construction between its enter and exit events.
#[derive(Default)]
struct TagBuilder {
    flow: bool,
    closing: bool,
    self_closing: bool,
    name: Option<String>,
    attributes: Vec<Attribute>,
    pending: Option<NamedAttribute>,
}

struct Assembler<'a, 'o> {
    input: &'a str,
    lines: LineIndex,
    options: &'o ParseOptions<'o>,
    tag_stack: SmallVec<[OpenTag; 8]>,
    containers: Vec<Container>,
    current: Option<TagBuilder>,
    /// Tag-stack depth when the current paragraph was entered. Tags opened
    /// outside the paragraph cannot be closed inside it.
    paragraph_base: usize,
    in_paragraph: bool,
}

impl Assembler<'_, '_> {
    fn handle(&mut self, event: &Event) -> Result<(), ParseError> {
        match (event.edge, event.name) {
            (Edge::Enter, TokenName::Paragraph) => {
                self.paragraph_base = self.tag_stack.len();
                self.in_paragraph = true;
                self.containers.push(Container::Paragraph { children: Vec::new() });
            }
            (Edge::Exit, TokenName::Paragraph) => self.exit_paragraph(event.span)?,

            (Edge::Exit, TokenName::Data) => {
                let text = decode_backslash_escapes(event.span.slice(self.input));
                self.append_text(&text, event.span);
            }
            (Edge::Exit, TokenName::LineEnding) => self.append_text("\n", event.span),

            (Edge::Enter, TokenName::FlowTag) => {
                self.current = Some(TagBuilder {
                    flow: true,
                    ..TagBuilder::default()
                });
            }
            (Edge::Enter, TokenName::TextTag) => self.current = Some(TagBuilder::default()),
            (Edge::Exit, TokenName::FlowTag | TokenName::TextTag) => self.exit_tag(event.span)?,

            (Edge::Enter, TokenName::TagClosingMarker) => {
                let base = if self.in_paragraph { self.paragraph_base } else { 0 };
                if self.tag_stack.len() == base {
                    return Err(ParseError::UnexpectedClosingSlash {
                        place: self.lines.position(event.span),
                    });
                }
                if let Some(tag) = &mut self.current {
                    tag.closing = true;
                }
            }
            (Edge::Enter, TokenName::TagSelfClosingMarker) => {
                if let Some(tag) = &self.current {
                    if tag.closing {
                        return Err(ParseError::UnexpectedSelfClosingOnClosingTag {
                            place: self.lines.position(event.span),
                        });
                    }
                }
                if let Some(tag) = &mut self.current {
                    tag.self_closing = true;
                }
            }

            (Edge::Exit, TokenName::TagNamePrimary) => {
                if let Some(tag) = &mut self.current {
                    tag.name = Some(event.span.slice(self.input).to_string());
                }
            }
            (Edge::Exit, TokenName::TagNameMember) => self.extend_name('.', event.span),
            (Edge::Exit, TokenName::TagNameLocal) => self.extend_name(':', event.span),

            (Edge::Enter, TokenName::TagAttribute | TokenName::TagExpressionAttribute) => {
                if let Some(tag) = &self.current {
                    if tag.closing {
                        return Err(ParseError::UnexpectedAttributeOnClosingTag {
                            place: self.lines.position(event.span),
                        });
                    }
                }
                if event.name == TokenName::TagAttribute {
                    if let Some(tag) = &mut self.current {
                        tag.pending = Some(NamedAttribute::default());
                    }
                }
            }
            (Edge::Exit, TokenName::TagAttributeNamePrimary) => {
                let name = event.span.slice(self.input).to_string();
                if let Some(attr) = self.pending_mut() {
                    attr.name = name;
                }
            }
            (Edge::Exit, TokenName::TagAttributeNameLocal) => {
                let local = event.span.slice(self.input);
                if let Some(attr) = self.pending_mut() {
                    attr.name.push(':');
                    attr.name.push_str(local);
                }
            }
            (Edge::Exit, TokenName::TagAttributeValueLiteralValue) => {
                let value = decode_attribute_value(event.span.slice(self.input)).into_owned();
                if let Some(attr) = self.pending_mut() {
                    attr.value = Some(AttributeValue::Literal(value));
                }
            }
            (Edge::Exit, TokenName::TagAttributeValueExpressionValue) => {
                let source = event.span.slice(self.input).to_string();
                let data = self.parse_expression(&source, ExpressionKind::AttributeValue, event.span)?;
                if let Some(attr) = self.pending_mut() {
                    attr.value = Some(AttributeValue::Expression(ValueExpression {
                        value: source,
                        data,
                    }));
                }
            }
            (Edge::Exit, TokenName::TagAttribute) => {
                if let Some(tag) = &mut self.current {
                    if let Some(attr) = tag.pending.take() {
                        tag.attributes.push(Attribute::Named(attr));
                    }
                }
            }
            (Edge::Exit, TokenName::TagExpressionAttributeValue) => {
                let source = event.span.slice(self.input).to_string();
                let data = self.parse_expression(&source, ExpressionKind::Spread, event.span)?;
                if let Some(tag) = &mut self.current {
                    tag.attributes.push(Attribute::Expression(ExpressionAttribute {
                        value: source,
                        data,
                    }));
                }
            }

            // Wrapper boundaries with no state of their own.
            _ => {}
        }
        Ok(())
    }

    fn finish(mut self, input: &str) -> Result<Root, ParseError> {
        if let Some(open) = self.tag_stack.last() {
            return Err(ParseError::UnclosedTag {
                tag: format_tag(&open.name, false),
                open: open.position,
                scope: Scope::Document,
            });
        }
        match self.containers.pop() {
            Some(Container::Root { children }) if self.containers.is_empty() => {
                let position = (!input.is_empty()).then(|| {
                    self.lines.position(Range::from_usize(0, input.len()))
                });
                Ok(Root { children, position })
            }
            _ => {
                debug_assert!(false, "container stack should reduce to the root");
                Ok(Root::default())
            }
        }
    }

    fn exit_paragraph(&mut self, span: Range) -> Result<(), ParseError> {
        if self.tag_stack.len() > self.paragraph_base {
            let open = &self.tag_stack[self.tag_stack.len() - 1];
            return Err(ParseError::UnclosedTag {
                tag: format_tag(&open.name, false),
                open: open.position,
                scope: Scope::Paragraph,
            });
        }
        self.in_paragraph = false;
        let Some(Container::Paragraph { children }) = self.containers.pop() else {
            debug_assert!(false, "paragraph exit without a paragraph container");
            return Ok(());
        };
        let position = Some(self.lines.position(span));
        self.push_block(BlockNode::Paragraph(Paragraph { children, position }));
        Ok(())
    }

    /// Commit the tag built since its enter event. Opening tags become
    /// elements (pushed as containers unless self-closing); closing tags
    /// must match the innermost open tag.
    fn exit_tag(&mut self, span: Range) -> Result<(), ParseError> {
        let Some(tag) = self.current.take() else {
            debug_assert!(false, "tag exit without a tag enter");
            return Ok(());
        };
        let position = self.lines.position(span);

        if tag.closing {
            // Marker and attribute misuse were rejected at their own
            // events; only the name can still disagree.
            let open = match self.tag_stack.last() {
                Some(open) => open,
                None => {
                    return Err(ParseError::UnexpectedClosingSlash { place: position });
                }
            };
            if open.name != tag.name {
                return Err(ParseError::UnexpectedClosingTag {
                    found: format_tag(&tag.name, true),
                    expected: format_tag(&open.name, false),
                    open: open.position,
                    place: position,
                });
            }
            self.tag_stack.pop();
            self.close_container(position.end);
            return Ok(());
        }

        if tag.self_closing {
            let element_position = Some(position);
            if tag.flow {
                self.push_block(BlockNode::FlowElement(FlowElement {
                    name: tag.name,
                    attributes: tag.attributes,
                    children: Vec::new(),
                    position: element_position,
                }));
            } else {
                self.push_inline(InlineNode::TextElement(TextElement {
                    name: tag.name,
                    attributes: tag.attributes,
                    children: Vec::new(),
                    position: element_position,
                }));
            }
            return Ok(());
        }

        self.tag_stack.push(OpenTag {
            name: tag.name.clone(),
            position,
        });
        let container = if tag.flow {
            Container::Flow {
                name: tag.name,
                attributes: tag.attributes,
                children: Vec::new(),
                start: position.start,
            }
        } else {
            Container::Text {
                name: tag.name,
                attributes: tag.attributes,
                children: Vec::new(),
                start: position.start,
            }
        };
        self.containers.push(container);
        Ok(())
    }

    /// Pop the innermost element container and attach it to its parent,
    /// its position ending at `end` (the end of the closing tag).
    fn close_container(&mut self, end: Point) {
        match self.containers.pop() {
            Some(Container::Flow {
                name,
                attributes,
                children,
                start,
            }) => {
                self.push_block(BlockNode::FlowElement(FlowElement {
                    name,
                    attributes,
                    children,
                    position: Some(Position { start, end }),
                }));
            }
            Some(Container::Text {
                name,
                attributes,
                children,
                start,
            }) => {
                self.push_inline(InlineNode::TextElement(TextElement {
                    name,
                    attributes,
                    children,
                    position: Some(Position { start, end }),
                }));
            }
            other => {
                debug_assert!(false, "closing tag without an element container");
                if let Some(container) = other {
                    self.containers.push(container);
                }
            }
        }
    }

    fn push_block(&mut self, node: BlockNode) {
        match self.containers.last_mut() {
            Some(Container::Root { children }) => children.push(node),
            Some(Container::Flow { children, .. }) => children.push(node),
            _ => debug_assert!(false, "block node outside a block container"),
        }
    }

    fn push_inline(&mut self, node: InlineNode) {
        match self.containers.last_mut() {
            Some(Container::Paragraph { children }) => children.push(node),
            Some(Container::Text { children, .. }) => children.push(node),
            _ => debug_assert!(false, "inline node outside an inline container"),
        }
    }

    /// Append text, merging into a preceding text node.
    fn append_text(&mut self, value: &str, span: Range) {
        let position = self.lines.position(span);
        let children = match self.containers.last_mut() {
            Some(Container::Paragraph { children }) => children,
            Some(Container::Text { children, .. }) => children,
            _ => {
                debug_assert!(false, "text outside an inline container");
                return;
            }
        };
        if let Some(InlineNode::Text(text)) = children.last_mut() {
            text.value.push_str(value);
            if let Some(existing) = &mut text.position {
                existing.end = position.end;
            }
        } else {
            children.push(InlineNode::Text(Text {
                value: value.to_string(),
                position: Some(position),
            }));
        }
    }

    fn extend_name(&mut self, separator: char, span: Range) {
        if let Some(TagBuilder {
            name: Some(name), ..
        }) = &mut self.current
        {
            name.push(separator);
            name.push_str(span.slice(self.input));
        }
    }

    fn pending_mut(&mut self) -> Option<&mut NamedAttribute> {
        self.current.as_mut().and_then(|tag| tag.pending.as_mut())
    }

    /// Run the configured expression parser, if any.
    fn parse_expression(
        &self,
        source: &str,
        kind: ExpressionKind,
        span: Range,
    ) -> Result<Option<ExpressionData>, ParseError> {
        let Some(parser) = self.options.expression_parser else {
            return Ok(None);
        };
        match parser.parse(source, kind) {
            Ok(estree) => Ok(Some(ExpressionData {
                estree: Some(estree),
            })),
            Err(reason) => Err(ParseError::ExpressionParseFailure {
                reason,
                place: self.lines.position(span),
            }),
        }
    }
}

/// Format a tag name for an error message: `<a>`/`</a>`, `<>`/`</>` for
/// fragments.
fn format_tag(name: &Option<String>, closing: bool) -> String {
    let slash = if closing { "/" } else { "" };
    match name {
        Some(name) => format!("<{slash}{name}>"),
        None => format!("<{slash}>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn parse(input: &str) -> Result<Root, ParseError> {
        assemble(input, &tokenize(input), &ParseOptions::default())
    }

    fn parse_error(input: &str) -> String {
        parse(input).unwrap_err().to_string()
    }

    #[test]
    fn test_self_closing_flow_element() {
        let root = parse("<a />").unwrap();
        let BlockNode::FlowElement(element) = &root.children[0] else {
            panic!("expected a flow element");
        };
        assert_eq!(element.name.as_deref(), Some("a"));
        assert!(element.attributes.is_empty());
        assert!(element.children.is_empty());
        let position = element.position.unwrap();
        assert_eq!((position.start.offset, position.end.offset), (0, 5));
    }

    #[test]
    fn test_name_segments_join() {
        let root = parse("<abc . def.ghi />").unwrap();
        let BlockNode::FlowElement(element) = &root.children[0] else {
            panic!("expected a flow element");
        };
        assert_eq!(element.name.as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_closing_tag_name_whitespace() {
        let root = parse("a <svg: rect>b</  svg :rect> c").unwrap();
        let BlockNode::Paragraph(paragraph) = &root.children[0] else {
            panic!("expected a paragraph");
        };
        let InlineNode::TextElement(element) = &paragraph.children[1] else {
            panic!("expected a text element");
        };
        assert_eq!(element.name.as_deref(), Some("svg:rect"));
    }

    #[test]
    fn test_attribute_entity_decoding() {
        let root = parse("<a y=\"&quot;&#x7B;\" />").unwrap();
        let BlockNode::FlowElement(element) = &root.children[0] else {
            panic!("expected a flow element");
        };
        let Attribute::Named(attr) = &element.attributes[0] else {
            panic!("expected a named attribute");
        };
        assert_eq!(attr.value, Some(AttributeValue::Literal("\"{".into())));
    }

    #[test]
    fn test_attribute_names_join_local_part() {
        let root = parse("<a xml:lang=\"de-CH\" foo:bar />").unwrap();
        let BlockNode::FlowElement(element) = &root.children[0] else {
            panic!("expected a flow element");
        };
        let Attribute::Named(lang) = &element.attributes[0] else {
            panic!("expected a named attribute");
        };
        assert_eq!(lang.name, "xml:lang");
        assert_eq!(lang.value, Some(AttributeValue::Literal("de-CH".into())));
        let Attribute::Named(bar) = &element.attributes[1] else {
            panic!("expected a named attribute");
        };
        assert_eq!(bar.name, "foo:bar");
        assert_eq!(bar.value, None);
    }

    #[test]
    fn test_closing_slash_without_open_tag() {
        assert_eq!(
            parse_error("a </b> c."),
            "Unexpected closing slash `/` in tag, expected an open tag first"
        );
    }

    #[test]
    fn test_self_closing_marker_on_closing_tag() {
        assert_eq!(
            parse_error("a <b></b/> c."),
            "Unexpected self-closing slash `/` in closing tag, expected the end of the tag"
        );
    }

    #[test]
    fn test_attribute_on_closing_tag() {
        assert_eq!(
            parse_error("a <b></b c> d."),
            "Unexpected attribute in closing tag, expected the end of the tag"
        );
    }

    #[test]
    fn test_mismatched_closing_tag() {
        assert_eq!(
            parse_error("a <a> b </b> c"),
            "Unexpected closing tag `</b>`, expected corresponding closing tag for `<a>` (1:3-1:6)"
        );
    }

    #[test]
    fn test_unclosed_tag_at_paragraph_end() {
        assert_eq!(
            parse_error("a <b> c"),
            "Expected a closing tag for `<b>` (1:3-1:6) before the end of `paragraph`"
        );
    }

    #[test]
    fn test_unclosed_flow_tag_at_document_end() {
        assert_eq!(
            parse_error("<a>"),
            "Expected a closing tag for `<a>` (1:1-1:4) before the end of `document`"
        );
    }

    #[test]
    fn test_fragment_mismatch() {
        assert_eq!(
            parse_error("a <></b> c"),
            "Unexpected closing tag `</b>`, expected corresponding closing tag for `<>` (1:3-1:5)"
        );
        assert_eq!(
            parse_error("a <b></> c"),
            "Unexpected closing tag `</>`, expected corresponding closing tag for `<b>` (1:3-1:6)"
        );
    }

    #[test]
    fn test_expression_parser_failure() {
        struct Failing;
        impl crate::ExpressionParser for Failing {
            fn parse(
                &self,
                _source: &str,
                _kind: ExpressionKind,
            ) -> Result<serde_json::Value, String> {
                Err("Unexpected content after expression".into())
            }
        }
        let options = ParseOptions {
            expression_parser: Some(&Failing),
        };
        let events = tokenize("<a b={1 + 1} />");
        let error = assemble("<a b={1 + 1} />", &events, &options).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Could not parse expression: Unexpected content after expression"
        );
    }
}
