//! Markdown serialization.
//!
//! Turns a tree back into markdown text. Flow elements place their children
//! on indented lines separated by blank lines; attributes move onto lines of
//! their own when one contains a line ending or the one-line form would
//! exceed `print_width`. Output parses back to an equivalent tree, so
//! serialization is a fixed point after one round trip.

use crate::ast::{
    Attribute, AttributeValue, BlockNode, FlowElement, InlineNode, Root, TextElement,
};
use crate::error::SerializeError;
use crate::escape::{choose_quote, escape_attribute_value, escape_text};

/// Options controlling the generated markdown.
#[derive(Debug, Clone, PartialEq)]
pub struct SerializeOptions {
    /// Preferred quote around literal attribute values, `"` or `'`.
    pub quote: char,
    /// Switch to the other quote when the value contains more preferred
    /// quotes than alternate ones.
    pub quote_smart: bool,
    /// Write `<x/>` instead of `<x />`.
    pub tight_self_closing: bool,
    /// Line width above which attributes move onto separate lines.
    /// `None` keeps attributes on one line regardless of length.
    pub print_width: Option<usize>,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            quote: '"',
            quote_smart: false,
            tight_self_closing: false,
            print_width: None,
        }
    }
}

/// Serialize a tree to markdown.
pub fn to_markdown(root: &Root, options: &SerializeOptions) -> Result<String, SerializeError> {
    if options.quote != '"' && options.quote != '\'' {
        return Err(SerializeError::InvalidQuote(options.quote));
    }
    let mut serializer = Serializer {
        writer: Writer::default(),
        options,
    };
    for (index, block) in root.children.iter().enumerate() {
        if index > 0 {
            serializer.writer.newline();
            serializer.writer.newline();
        }
        serializer.block(block)?;
    }
    if !root.children.is_empty() {
        serializer.writer.newline();
    }
    Ok(serializer.writer.out)
}

/// Indentation-tracking output buffer.
///
/// The prefix is applied lazily at the start of each non-empty line, so
/// blank lines between blocks carry no trailing spaces and raw content
/// (attribute values spanning lines) stays at column zero.
#[derive(Default)]
struct Writer {
    out: String,
    prefix: String,
    at_line_start: bool,
}

impl Writer {
    fn push_indent(&mut self) {
        self.prefix.push_str("  ");
    }

    fn pop_indent(&mut self) {
        let len = self.prefix.len().saturating_sub(2);
        self.prefix.truncate(len);
    }

    fn newline(&mut self) {
        self.out.push('\n');
        self.at_line_start = true;
    }

    /// Write content verbatim. The prefix is written if a line is pending,
    /// but embedded line endings do not restart it.
    fn raw(&mut self, content: &str) {
        if content.is_empty() {
            return;
        }
        if self.at_line_start {
            self.out.push_str(&self.prefix);
            self.at_line_start = false;
        }
        self.out.push_str(content);
        if content.ends_with('\n') {
            self.at_line_start = true;
        }
    }

    /// Write prose, re-applying the prefix after each embedded line ending
    /// so paragraph continuation lines stay aligned.
    fn text(&mut self, content: &str) {
        let mut first = true;
        for line in content.split('\n') {
            if !first {
                self.newline();
            }
            first = false;
            if line.is_empty() {
                continue;
            }
            if self.at_line_start {
                self.out.push_str(&self.prefix);
                self.at_line_start = false;
            }
            self.out.push_str(line);
        }
    }
}

struct Serializer<'o> {
    writer: Writer,
    options: &'o SerializeOptions,
}

impl Serializer<'_> {
    fn block(&mut self, node: &BlockNode) -> Result<(), SerializeError> {
        match node {
            BlockNode::Paragraph(paragraph) => self.inlines(&paragraph.children),
            BlockNode::FlowElement(element) => self.flow_element(element),
        }
    }

    fn inlines(&mut self, children: &[InlineNode]) -> Result<(), SerializeError> {
        for child in children {
            match child {
                InlineNode::Text(text) => self.writer.text(&escape_text(&text.value)),
                InlineNode::Strong(strong) => {
                    self.writer.raw("**");
                    self.inlines(&strong.children)?;
                    self.writer.raw("**");
                }
                InlineNode::Emphasis(emphasis) => {
                    self.writer.raw("*");
                    self.inlines(&emphasis.children)?;
                    self.writer.raw("*");
                }
                InlineNode::InlineCode(code) => {
                    let fenced = fence_inline_code(&code.value);
                    self.writer.text(&fenced);
                }
                InlineNode::TextElement(element) => self.text_element(element)?,
            }
        }
        Ok(())
    }

    fn flow_element(&mut self, element: &FlowElement) -> Result<(), SerializeError> {
        let name = element_name(element.name.as_deref(), &element.attributes)?;
        let attributes = self.render_attributes(&element.attributes)?;
        let self_closing = element.name.is_some() && element.children.is_empty();

        if self.split_attributes(name, &attributes, self_closing) {
            self.writer.raw(&format!("<{name}"));
            self.writer.newline();
            self.writer.push_indent();
            for attribute in &attributes {
                self.writer.raw(attribute);
                self.writer.newline();
            }
            self.writer.pop_indent();
            self.writer
                .raw(if self_closing { "/>" } else { ">" });
        } else {
            self.writer
                .raw(&self.one_line_open(name, &attributes, self_closing));
        }
        if self_closing {
            return Ok(());
        }

        if !element.children.is_empty() {
            self.writer.newline();
            self.writer.push_indent();
            for (index, child) in element.children.iter().enumerate() {
                if index > 0 {
                    self.writer.newline();
                    self.writer.newline();
                }
                self.block(child)?;
            }
            self.writer.pop_indent();
            self.writer.newline();
        }
        self.writer.raw(&format!("</{name}>"));
        Ok(())
    }

    /// Text elements always stay inline; embedded line endings in their
    /// attribute values are written as-is.
    fn text_element(&mut self, element: &TextElement) -> Result<(), SerializeError> {
        let name = element_name(element.name.as_deref(), &element.attributes)?;
        let attributes = self.render_attributes(&element.attributes)?;
        let self_closing = element.name.is_some() && element.children.is_empty();
        self.writer
            .raw(&self.one_line_open(name, &attributes, self_closing));
        if self_closing {
            return Ok(());
        }
        self.inlines(&element.children)?;
        self.writer.raw(&format!("</{name}>"));
        Ok(())
    }

    fn one_line_open(&self, name: &str, attributes: &[String], self_closing: bool) -> String {
        let mut open = format!("<{name}");
        if !attributes.is_empty() {
            open.push(' ');
            open.push_str(&attributes.join(" "));
        }
        open.push_str(self.closer(self_closing));
        open
    }

    fn closer(&self, self_closing: bool) -> &'static str {
        if self_closing {
            if self.options.tight_self_closing {
                "/>"
            } else {
                " />"
            }
        } else {
            ">"
        }
    }

    /// Whether attributes go one per line: only in flow position, when one
    /// of them spans lines or the one-line form would be too wide.
    fn split_attributes(&self, name: &str, attributes: &[String], self_closing: bool) -> bool {
        if attributes.is_empty() {
            return false;
        }
        if attributes.iter().any(|a| a.contains('\n')) {
            return true;
        }
        let Some(print_width) = self.options.print_width else {
            return false;
        };
        let joined: usize =
            attributes.iter().map(String::len).sum::<usize>() + attributes.len() - 1;
        let width =
            self.writer.prefix.len() + 1 + name.len() + 1 + joined + self.closer(self_closing).len();
        width > print_width
    }

    fn render_attributes(&self, attributes: &[Attribute]) -> Result<Vec<String>, SerializeError> {
        attributes
            .iter()
            .map(|attribute| self.render_attribute(attribute))
            .collect()
    }

    fn render_attribute(&self, attribute: &Attribute) -> Result<String, SerializeError> {
        match attribute {
            Attribute::Expression(expression) => Ok(format!("{{{}}}", expression.value)),
            Attribute::Named(named) => {
                if named.name.is_empty() {
                    return Err(SerializeError::AttributeWithoutName);
                }
                match &named.value {
                    None => Ok(named.name.clone()),
                    Some(AttributeValue::Expression(expression)) => {
                        Ok(format!("{}={{{}}}", named.name, expression.value))
                    }
                    Some(AttributeValue::Literal(value)) => {
                        let quote =
                            choose_quote(value, self.options.quote, self.options.quote_smart);
                        let escaped = escape_attribute_value(value, quote);
                        Ok(format!("{}={quote}{escaped}{quote}", named.name))
                    }
                }
            }
        }
    }
}

/// Fragment names render as nothing; a fragment with attributes has no
/// valid syntax.
fn element_name<'a>(
    name: Option<&'a str>,
    attributes: &[Attribute],
) -> Result<&'a str, SerializeError> {
    match name {
        Some(name) => Ok(name),
        None if attributes.is_empty() => Ok(""),
        None => Err(SerializeError::FragmentWithAttributes),
    }
}

/// Wrap inline code in a backtick fence longer than any run inside it.
fn fence_inline_code(value: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in value.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    let fence = "`".repeat(longest + 1);
    if value.starts_with('`') || value.ends_with('`') {
        format!("{fence} {value} {fence}")
    } else {
        format!("{fence}{value}{fence}")
    }
}
