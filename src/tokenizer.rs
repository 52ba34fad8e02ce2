//! Boundary-event tokenizer.
//!
//! Scans a document for JSX tags in flow position (a line of their own) and
//! text position (inside paragraph content) and emits the enter/exit event
//! stream consumed by [`crate::assemble`]. Scanning is byte-based with
//! `memchr` fast paths; identifier characters are decoded as UTF-8 only
//! where names can appear.
//!
//! Tag syntax errors (`< 5`, `<123>`, an unterminated tag) make the
//! candidate fall back to literal text. Structural errors (mismatched or
//! unclosed tags, attributes on closing tags) scan fine here and are
//! rejected by the assembler, which has the positions to report them.

use memchr::memchr;

use crate::event::{Edge, Event, TokenName};
use crate::range::Range;

/// Tokenize a document into a boundary-event stream.
pub fn tokenize(input: &str) -> Vec<Event> {
    let mut tokenizer = Tokenizer {
        input,
        bytes: input.as_bytes(),
        events: Vec::new(),
    };
    tokenizer.run();
    tokenizer.events
}

struct Tokenizer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    events: Vec<Event>,
}

impl Tokenizer<'_> {
    fn run(&mut self) {
        let len = self.bytes.len();
        let mut pos = 0;
        while pos < len {
            let line_end = self.line_end(pos);
            if self.is_blank(pos, line_end) {
                pos = line_end + 1;
                continue;
            }
            match self.scan_flow_line(pos) {
                Some(next) => pos = next,
                None => pos = self.paragraph(pos),
            }
        }
    }

    /// Offset of the `\n` ending the line containing `pos` (or EOF).
    fn line_end(&self, pos: usize) -> usize {
        memchr(b'\n', &self.bytes[pos..]).map_or(self.bytes.len(), |n| pos + n)
    }

    fn is_blank(&self, start: usize, end: usize) -> bool {
        self.bytes[start..end]
            .iter()
            .all(|&b| b == b' ' || b == b'\t' || b == b'\r')
    }

    fn skip_line_space(&self, mut pos: usize) -> usize {
        while pos < self.bytes.len() && matches!(self.bytes[pos], b' ' | b'\t') {
            pos += 1;
        }
        pos
    }

    /// Skip whitespace inside a tag, where line endings also count.
    fn skip_tag_space(&self, mut pos: usize) -> usize {
        while pos < self.bytes.len() && matches!(self.bytes[pos], b' ' | b'\t' | b'\r' | b'\n') {
            pos += 1;
        }
        pos
    }

    fn push(&mut self, edge: Edge, name: TokenName, span: Range) {
        self.events.push(Event { edge, name, span });
    }

    /// Try to consume an entire flow line: indentation, then one or more
    /// tags separated by whitespace, then nothing else until the line ends.
    /// A tag may run over several lines; the check applies to the line its
    /// `>` lands on. Returns the offset after that line, or `None` (with no
    /// events emitted) when the line is not pure flow tags.
    fn scan_flow_line(&mut self, line_start: usize) -> Option<usize> {
        let checkpoint = self.events.len();
        let mut pos = self.skip_line_space(line_start);
        loop {
            if pos >= self.bytes.len() || self.bytes[pos] != b'<' {
                self.events.truncate(checkpoint);
                return None;
            }
            match self.scan_tag(pos, TokenName::FlowTag) {
                Some(end) => pos = self.skip_line_space(end),
                None => {
                    self.events.truncate(checkpoint);
                    return None;
                }
            }
            if pos >= self.bytes.len() {
                return Some(pos);
            }
            if self.bytes[pos] == b'\n' {
                return Some(pos + 1);
            }
            if self.bytes[pos] == b'\r' && self.skip_line_space(pos + 1) >= self.line_end(pos) {
                return Some(self.line_end(pos) + 1);
            }
        }
    }

    /// Whether the line at `line_start` would tokenize as flow tags.
    /// Used to decide paragraph interruption; emits nothing.
    fn is_flow_line(&mut self, line_start: usize) -> bool {
        let checkpoint = self.events.len();
        let found = self.scan_flow_line(line_start).is_some();
        self.events.truncate(checkpoint);
        found
    }

    /// Consume a paragraph starting at `start`. Emits paragraph, data,
    /// line-ending, and text-tag events; returns the offset after the
    /// paragraph.
    fn paragraph(&mut self, start: usize) -> usize {
        let len = self.bytes.len();
        let mut pos = self.skip_line_space(start);
        let para_start = pos;
        self.push(
            Edge::Enter,
            TokenName::Paragraph,
            Range::empty_at(para_start as u32),
        );

        let mut data_start = pos;
        let mut content_end = pos;
        loop {
            let mut line_end = self.line_end(pos);

            // Scan the line for tag candidates.
            while let Some(rel) = memchr(b'<', &self.bytes[pos..line_end]) {
                let lt = pos + rel;
                if self.is_escaped(lt) {
                    pos = lt + 1;
                    continue;
                }
                let before = self.events.len();
                match self.scan_tag(lt, TokenName::TextTag) {
                    Some(end) => {
                        // Any pending data goes before the tag events just
                        // appended.
                        if lt > data_start {
                            self.events.insert(
                                before,
                                Event::exit(TokenName::Data, Range::from_usize(data_start, lt)),
                            );
                            self.events.insert(
                                before,
                                Event::enter(TokenName::Data, data_start as u32),
                            );
                        }
                        pos = end;
                        data_start = end;
                        content_end = end;
                        if end > line_end {
                            line_end = self.line_end(end);
                        }
                    }
                    None => pos = lt + 1,
                }
            }

            // Flush the rest of the line, without trailing whitespace.
            let mut trimmed = line_end;
            while trimmed > data_start && matches!(self.bytes[trimmed - 1], b' ' | b'\t' | b'\r') {
                trimmed -= 1;
            }
            if trimmed > data_start {
                self.push(
                    Edge::Enter,
                    TokenName::Data,
                    Range::empty_at(data_start as u32),
                );
                self.push(
                    Edge::Exit,
                    TokenName::Data,
                    Range::from_usize(data_start, trimmed),
                );
                content_end = trimmed;
            }

            if line_end >= len {
                pos = len;
                break;
            }
            let next_line = line_end + 1;
            if next_line >= len
                || self.is_blank(next_line, self.line_end(next_line))
                || self.is_flow_line(next_line)
            {
                pos = next_line;
                break;
            }
            self.push(
                Edge::Enter,
                TokenName::LineEnding,
                Range::empty_at(line_end as u32),
            );
            self.push(
                Edge::Exit,
                TokenName::LineEnding,
                Range::from_usize(line_end, line_end + 1),
            );
            pos = self.skip_line_space(next_line);
            data_start = pos;
        }

        self.push(
            Edge::Exit,
            TokenName::Paragraph,
            Range::from_usize(para_start, content_end),
        );
        pos
    }

    /// Whether the byte at `pos` is preceded by an odd run of backslashes.
    fn is_escaped(&self, pos: usize) -> bool {
        let mut backslashes = 0;
        while backslashes < pos && self.bytes[pos - backslashes - 1] == b'\\' {
            backslashes += 1;
        }
        backslashes % 2 == 1
    }

    /// Scan one tag starting at the `<` at `start`. Emits the tag's event
    /// subtree wrapped in `kind` and returns the offset after `>`, or emits
    /// nothing and returns `None` when the syntax is not a tag.
    fn scan_tag(&mut self, start: usize, kind: TokenName) -> Option<usize> {
        let checkpoint = self.events.len();
        match self.scan_tag_inner(start, kind) {
            Some(end) => Some(end),
            None => {
                self.events.truncate(checkpoint);
                None
            }
        }
    }

    fn scan_tag_inner(&mut self, start: usize, kind: TokenName) -> Option<usize> {
        let len = self.bytes.len();
        debug_assert!(self.bytes[start] == b'<');
        self.push(Edge::Enter, kind, Range::empty_at(start as u32));
        let mut pos = start + 1;
        if pos >= len {
            return None;
        }

        // Closing marker. Whitespace is allowed after `</` but not
        // directly after `<`.
        if self.bytes[pos] == b'/' {
            self.push(
                Edge::Enter,
                TokenName::TagClosingMarker,
                Range::empty_at(pos as u32),
            );
            self.push(
                Edge::Exit,
                TokenName::TagClosingMarker,
                Range::from_usize(pos, pos + 1),
            );
            pos = self.skip_tag_space(pos + 1);
        }
        if pos >= len {
            return None;
        }

        // Name, unless this is a fragment.
        if self.bytes[pos] != b'>' {
            pos = self.scan_name(pos)?;
            pos = self.skip_tag_space(pos);
        }

        // Attributes.
        loop {
            if pos >= len {
                return None;
            }
            match self.bytes[pos] {
                b'>' | b'/' => break,
                b'{' => {
                    let end = expression_end(self.bytes, pos)?;
                    self.push(
                        Edge::Enter,
                        TokenName::TagExpressionAttribute,
                        Range::empty_at(pos as u32),
                    );
                    self.push(
                        Edge::Enter,
                        TokenName::TagExpressionAttributeValue,
                        Range::empty_at(pos as u32 + 1),
                    );
                    self.push(
                        Edge::Exit,
                        TokenName::TagExpressionAttributeValue,
                        Range::from_usize(pos + 1, end - 1),
                    );
                    self.push(
                        Edge::Exit,
                        TokenName::TagExpressionAttribute,
                        Range::from_usize(pos, end),
                    );
                    pos = end;
                }
                _ => pos = self.scan_named_attribute(pos)?,
            }
            pos = self.skip_tag_space(pos);
        }

        // Self-closing marker, with optional whitespace before `>`.
        if self.bytes[pos] == b'/' {
            self.push(
                Edge::Enter,
                TokenName::TagSelfClosingMarker,
                Range::empty_at(pos as u32),
            );
            self.push(
                Edge::Exit,
                TokenName::TagSelfClosingMarker,
                Range::from_usize(pos, pos + 1),
            );
            pos = self.skip_tag_space(pos + 1);
        }
        if pos >= len || self.bytes[pos] != b'>' {
            return None;
        }
        self.push(Edge::Exit, kind, Range::from_usize(start, pos + 1));
        Some(pos + 1)
    }

    /// Scan a tag name: a primary identifier optionally followed by
    /// `.member` and `:local` segments, whitespace allowed around the
    /// separators.
    fn scan_name(&mut self, start: usize) -> Option<usize> {
        let mut pos = self.scan_identifier(start)?;
        self.push(
            Edge::Enter,
            TokenName::TagNamePrimary,
            Range::empty_at(start as u32),
        );
        self.push(
            Edge::Exit,
            TokenName::TagNamePrimary,
            Range::from_usize(start, pos),
        );
        loop {
            let after_space = self.skip_tag_space(pos);
            let segment = match self.bytes.get(after_space) {
                Some(b'.') => TokenName::TagNameMember,
                Some(b':') => TokenName::TagNameLocal,
                _ => return Some(pos),
            };
            let seg_start = self.skip_tag_space(after_space + 1);
            let seg_end = self.scan_identifier(seg_start)?;
            self.push(Edge::Enter, segment, Range::empty_at(seg_start as u32));
            self.push(Edge::Exit, segment, Range::from_usize(seg_start, seg_end));
            pos = seg_end;
        }
    }

    /// Scan one attribute: `name`, `name = "value"`, `name = {expr}`, with
    /// an optional `:local` name part.
    fn scan_named_attribute(&mut self, start: usize) -> Option<usize> {
        self.push(
            Edge::Enter,
            TokenName::TagAttribute,
            Range::empty_at(start as u32),
        );
        let mut pos = self.scan_identifier(start)?;
        self.push(
            Edge::Enter,
            TokenName::TagAttributeNamePrimary,
            Range::empty_at(start as u32),
        );
        self.push(
            Edge::Exit,
            TokenName::TagAttributeNamePrimary,
            Range::from_usize(start, pos),
        );

        let mut probe = self.skip_tag_space(pos);
        if self.bytes.get(probe) == Some(&b':') {
            let local_start = self.skip_tag_space(probe + 1);
            let local_end = self.scan_identifier(local_start)?;
            self.push(
                Edge::Enter,
                TokenName::TagAttributeNameLocal,
                Range::empty_at(local_start as u32),
            );
            self.push(
                Edge::Exit,
                TokenName::TagAttributeNameLocal,
                Range::from_usize(local_start, local_end),
            );
            pos = local_end;
            probe = self.skip_tag_space(pos);
        }

        if self.bytes.get(probe) == Some(&b'=') {
            let value_start = self.skip_tag_space(probe + 1);
            match self.bytes.get(value_start)? {
                quote @ (b'"' | b'\'') => {
                    let inner = value_start + 1;
                    let close =
                        inner + memchr(*quote, &self.bytes[inner..])?;
                    self.push(
                        Edge::Enter,
                        TokenName::TagAttributeValueLiteral,
                        Range::empty_at(value_start as u32),
                    );
                    self.push(
                        Edge::Enter,
                        TokenName::TagAttributeValueLiteralValue,
                        Range::empty_at(inner as u32),
                    );
                    self.push(
                        Edge::Exit,
                        TokenName::TagAttributeValueLiteralValue,
                        Range::from_usize(inner, close),
                    );
                    self.push(
                        Edge::Exit,
                        TokenName::TagAttributeValueLiteral,
                        Range::from_usize(value_start, close + 1),
                    );
                    pos = close + 1;
                }
                b'{' => {
                    let end = expression_end(self.bytes, value_start)?;
                    self.push(
                        Edge::Enter,
                        TokenName::TagAttributeValueExpression,
                        Range::empty_at(value_start as u32),
                    );
                    self.push(
                        Edge::Enter,
                        TokenName::TagAttributeValueExpressionValue,
                        Range::empty_at(value_start as u32 + 1),
                    );
                    self.push(
                        Edge::Exit,
                        TokenName::TagAttributeValueExpressionValue,
                        Range::from_usize(value_start + 1, end - 1),
                    );
                    self.push(
                        Edge::Exit,
                        TokenName::TagAttributeValueExpression,
                        Range::from_usize(value_start, end),
                    );
                    pos = end;
                }
                _ => return None,
            }
        }
        self.push(
            Edge::Exit,
            TokenName::TagAttribute,
            Range::from_usize(start, pos),
        );
        Some(pos)
    }

    /// Scan one identifier at `start`. Identifiers start with an alphabetic
    /// character, `_`, or `$`; continuation characters add digits, `-`, and
    /// the zero-width joiners U+200C/U+200D.
    fn scan_identifier(&self, start: usize) -> Option<usize> {
        let mut chars = self.input[start..].char_indices();
        let (_, first) = chars.next()?;
        if !is_identifier_start(first) {
            return None;
        }
        let mut end = start + first.len_utf8();
        for (offset, c) in chars {
            if !is_identifier_continue(c) {
                return Some(start + offset);
            }
            end = start + offset + c.len_utf8();
        }
        Some(end)
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_continue(c: char) -> bool {
    is_identifier_start(c) || c.is_numeric() || c == '-' || c == '\u{200C}' || c == '\u{200D}'
}

/// Find the end of a brace-wrapped expression starting at `start`.
///
/// Returns the offset **after** the closing `}`, or `None` when the
/// expression is unterminated. Tracks nested braces, single- and
/// double-quoted strings, template literals with `${}` nesting, and line
/// and block comments, so a `}` inside any of those does not end the
/// expression.
pub fn expression_end(bytes: &[u8], start: usize) -> Option<usize> {
    debug_assert!(bytes.get(start) == Some(&b'{'));
    let len = bytes.len();
    let mut pos = start + 1;
    let mut depth: u32 = 1;
    while pos < len {
        match bytes[pos] {
            b'{' => {
                depth += 1;
                pos += 1;
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(pos + 1);
                }
                pos += 1;
            }
            quote @ (b'"' | b'\'') => pos = skip_quoted(bytes, pos, quote)?,
            b'`' => pos = skip_template(bytes, pos)?,
            b'/' if pos + 1 < len => match bytes[pos + 1] {
                b'/' => {
                    pos = memchr(b'\n', &bytes[pos + 2..]).map_or(len, |n| pos + 2 + n + 1);
                }
                b'*' => {
                    let mut scan = pos + 2;
                    loop {
                        let star = scan + memchr(b'*', &bytes[scan..])?;
                        if bytes.get(star + 1) == Some(&b'/') {
                            pos = star + 2;
                            break;
                        }
                        scan = star + 1;
                    }
                }
                _ => pos += 1,
            },
            _ => pos += 1,
        }
    }
    None
}

/// Skip a quoted string. `start` points at the opening quote; returns the
/// offset after the closing quote.
fn skip_quoted(bytes: &[u8], start: usize, quote: u8) -> Option<usize> {
    let mut pos = start + 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b if b == quote => return Some(pos + 1),
            _ => pos += 1,
        }
    }
    None
}

/// Skip a template literal, including nested `${...}` expressions.
fn skip_template(bytes: &[u8], start: usize) -> Option<usize> {
    let mut pos = start + 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b'`' => return Some(pos + 1),
            b'$' if bytes.get(pos + 1) == Some(&b'{') => {
                pos = expression_end(bytes, pos + 1)?;
            }
            _ => pos += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(input: &str) -> Vec<(Edge, TokenName)> {
        tokenize(input)
            .into_iter()
            .map(|e| (e.edge, e.name))
            .collect()
    }

    fn exits<'a>(input: &'a str, name: TokenName) -> Vec<&'a str> {
        tokenize(input)
            .into_iter()
            .filter(|e| e.edge == Edge::Exit && e.name == name)
            .map(|e| e.span.slice(input))
            .collect()
    }

    #[test]
    fn test_flow_self_closing() {
        assert_eq!(
            names("<a />"),
            vec![
                (Edge::Enter, TokenName::FlowTag),
                (Edge::Enter, TokenName::TagNamePrimary),
                (Edge::Exit, TokenName::TagNamePrimary),
                (Edge::Enter, TokenName::TagSelfClosingMarker),
                (Edge::Exit, TokenName::TagSelfClosingMarker),
                (Edge::Exit, TokenName::FlowTag),
            ]
        );
    }

    #[test]
    fn test_text_tag_inside_paragraph() {
        let events = names("a <b/> c.");
        assert_eq!(events[0], (Edge::Enter, TokenName::Paragraph));
        assert!(events.contains(&(Edge::Enter, TokenName::TextTag)));
        assert_eq!(exits("a <b/> c.", TokenName::Data), vec!["a ", " c."]);
    }

    #[test]
    fn test_member_and_local_names() {
        assert_eq!(
            exits("<abc . def.ghi />", TokenName::TagNameMember),
            vec!["def", "ghi"]
        );
        assert_eq!(
            exits("<svg: rect>b</  svg :rect>", TokenName::TagNameLocal),
            vec!["rect", "rect"]
        );
    }

    #[test]
    fn test_unicode_name() {
        assert_eq!(exits("<π />", TokenName::TagNamePrimary), vec!["π"]);
        assert_eq!(
            exits("<a\u{200C}b />", TokenName::TagNamePrimary),
            vec!["a\u{200C}b"]
        );
    }

    #[test]
    fn test_attribute_values() {
        let input = "a <b c     d=\"d\"\t\tefg='h'>i</b>.";
        assert_eq!(
            exits(input, TokenName::TagAttributeNamePrimary),
            vec!["c", "d", "efg"]
        );
        assert_eq!(
            exits(input, TokenName::TagAttributeValueLiteralValue),
            vec!["d", "h"]
        );
    }

    #[test]
    fn test_attribute_local_name() {
        let input = "<a xml :\tlang\n= \"de-CH\" foo:bar/>";
        assert_eq!(
            exits(input, TokenName::TagAttributeNamePrimary),
            vec!["xml", "foo"]
        );
        assert_eq!(
            exits(input, TokenName::TagAttributeNameLocal),
            vec!["lang", "bar"]
        );
    }

    #[test]
    fn test_expression_attribute_and_value() {
        let input = "<a {...b} c={1 + 1} />";
        assert_eq!(
            exits(input, TokenName::TagExpressionAttributeValue),
            vec!["...b"]
        );
        assert_eq!(
            exits(input, TokenName::TagAttributeValueExpressionValue),
            vec!["1 + 1"]
        );
    }

    #[test]
    fn test_invalid_tag_is_data() {
        assert_eq!(exits("a < 5 b", TokenName::Data), vec!["a < 5 b"]);
        assert!(!names("a <123> b").contains(&(Edge::Enter, TokenName::TextTag)));
    }

    #[test]
    fn test_escaped_angle_bracket_is_data() {
        assert_eq!(exits("a \\<b /> c", TokenName::Data), vec!["a \\<b /> c"]);
    }

    #[test]
    fn test_closing_tag_oddities_still_scan() {
        // The assembler rejects these; the tokenizer must not.
        assert!(names("</a/> x").contains(&(Edge::Enter, TokenName::TagSelfClosingMarker)));
        assert!(names("</a b> x").contains(&(Edge::Enter, TokenName::TagAttribute)));
    }

    #[test]
    fn test_multi_line_tag_in_paragraph() {
        let input = "a <b c=\"d\ne\" /> f";
        assert_eq!(
            exits(input, TokenName::TagAttributeValueLiteralValue),
            vec!["d\ne"]
        );
        assert_eq!(exits(input, TokenName::Data), vec!["a ", " f"]);
    }

    #[test]
    fn test_flow_line_interrupts_paragraph() {
        let events = tokenize("a\n<b />\nc");
        let paragraphs = events
            .iter()
            .filter(|e| e.edge == Edge::Enter && e.name == TokenName::Paragraph)
            .count();
        assert_eq!(paragraphs, 2);
        assert!(events.iter().any(|e| e.name == TokenName::FlowTag));
    }

    #[test]
    fn test_paragraph_line_endings() {
        let events = names("a\nb\nc");
        let endings = events
            .iter()
            .filter(|(edge, name)| *edge == Edge::Exit && *name == TokenName::LineEnding)
            .count();
        assert_eq!(endings, 2);
    }

    #[test]
    fn test_fragment() {
        let events = names("<>\n</>");
        assert_eq!(
            events,
            vec![
                (Edge::Enter, TokenName::FlowTag),
                (Edge::Exit, TokenName::FlowTag),
                (Edge::Enter, TokenName::FlowTag),
                (Edge::Enter, TokenName::TagClosingMarker),
                (Edge::Exit, TokenName::TagClosingMarker),
                (Edge::Exit, TokenName::FlowTag),
            ]
        );
    }

    #[test]
    fn test_expression_end_tracks_nesting() {
        assert_eq!(expression_end(b"{a{b}c}", 0), Some(7));
        assert_eq!(expression_end(b"{'}'}", 0), Some(5));
        assert_eq!(expression_end(b"{`${a}`}", 0), Some(8));
        assert_eq!(expression_end(b"{/* } */}", 0), Some(9));
        assert_eq!(expression_end(b"{a > b}", 0), Some(7));
        assert_eq!(expression_end(b"{abc", 0), None);
    }
}
