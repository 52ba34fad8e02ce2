//! Text escaping and decoding.
//!
//! Three concerns live here: decoding character references in attribute
//! values, decoding backslash escapes in plain text, and producing the
//! escaped forms the serializer writes back out. The decode/escape pairs
//! are inverses so that parse → serialize is the identity on well-formed
//! input.

use std::borrow::Cow;

use memchr::{memchr, memchr2};

/// Decode character references in a literal attribute value.
///
/// Lenient: malformed or unknown references pass through verbatim.
///
/// # Example
/// ```
/// use mdjsx::escape::decode_attribute_value;
///
/// assert_eq!(decode_attribute_value("&quot;&#x7B;"), "\"{");
/// assert_eq!(decode_attribute_value("&notareference"), "&notareference");
/// ```
pub fn decode_attribute_value(value: &str) -> Cow<'_, str> {
    if memchr(b'&', value.as_bytes()).is_none() {
        return Cow::Borrowed(value);
    }
    html_escape::decode_html_entities(value)
}

/// Decode backslash escapes of ASCII punctuation in plain text.
///
/// `\<` becomes `<`, `\\` becomes `\`; a backslash before anything else
/// stays as-is, matching CommonMark escape rules.
pub fn decode_backslash_escapes(text: &str) -> Cow<'_, str> {
    let bytes = text.as_bytes();
    let Some(first) = memchr(b'\\', bytes) else {
        return Cow::Borrowed(text);
    };
    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..first]);
    let mut i = first;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 1 < bytes.len() && bytes[i + 1].is_ascii_punctuation() {
            out.push(bytes[i + 1] as char);
            i += 2;
        } else {
            let next = memchr(b'\\', &bytes[i + 1..]).map_or(bytes.len(), |n| i + 1 + n);
            out.push_str(&text[i..next]);
            i = next;
        }
    }
    Cow::Owned(out)
}

/// Escape plain text for serialization.
///
/// `<` would start a tag and `\` would start an escape, so both are
/// backslash-escaped. Everything else round-trips untouched.
pub fn escape_text(text: &str) -> Cow<'_, str> {
    let bytes = text.as_bytes();
    let Some(first) = memchr2(b'<', b'\\', bytes) else {
        return Cow::Borrowed(text);
    };
    let mut out = String::with_capacity(text.len() + 4);
    out.push_str(&text[..first]);
    let mut i = first;
    while i < bytes.len() {
        match bytes[i] {
            b'<' => out.push_str("\\<"),
            b'\\' => out.push_str("\\\\"),
            _ => {
                let next = memchr2(b'<', b'\\', &bytes[i + 1..]).map_or(bytes.len(), |n| i + 1 + n);
                out.push_str(&text[i..next]);
                i = next;
                continue;
            }
        }
        i += 1;
    }
    Cow::Owned(out)
}

/// Pick the quote for a literal attribute value.
///
/// With `smart` set, the alternate quote is used when the value contains
/// strictly more of the preferred quote than of the alternate. Ties keep
/// the preferred quote.
pub fn choose_quote(value: &str, preferred: char, smart: bool) -> char {
    if !smart {
        return preferred;
    }
    let alternate = if preferred == '"' { '\'' } else { '"' };
    let bytes = value.as_bytes();
    let preferred_count = bytes.iter().filter(|&&b| b == preferred as u8).count();
    let alternate_count = bytes.iter().filter(|&&b| b == alternate as u8).count();
    if preferred_count > alternate_count {
        alternate
    } else {
        preferred
    }
}

/// Escape a literal attribute value for the given surrounding quote.
///
/// Only the quote character itself needs escaping; it becomes a numeric
/// character reference so the decoder restores it exactly.
pub fn escape_attribute_value(value: &str, quote: char) -> Cow<'_, str> {
    let reference = if quote == '"' { "&#x22;" } else { "&#x27;" };
    if memchr(quote as u8, value.as_bytes()).is_none() {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + reference.len());
    for c in value.chars() {
        if c == quote {
            out.push_str(reference);
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_attribute_value("&quot;"), "\"");
        assert_eq!(decode_attribute_value("&#x7B;"), "{");
        assert_eq!(decode_attribute_value("&copy;"), "\u{a9}");
        assert_eq!(decode_attribute_value("&#8800;"), "\u{2260}");
    }

    #[test]
    fn test_decode_entities_lenient() {
        assert_eq!(decode_attribute_value("&#xa&b0;c&#xg;"), "&#xa&b0;c&#xg;");
        assert_eq!(decode_attribute_value("plain"), "plain");
    }

    #[test]
    fn test_decode_backslash_escapes() {
        assert_eq!(decode_backslash_escapes("a \\< b"), "a < b");
        assert_eq!(decode_backslash_escapes("a \\\\ b"), "a \\ b");
        // Not punctuation: backslash stays.
        assert_eq!(decode_backslash_escapes("a \\n b"), "a \\n b");
        assert_eq!(decode_backslash_escapes("trailing \\"), "trailing \\");
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a < b"), "a \\< b");
        assert_eq!(escape_text("a \\ b"), "a \\\\ b");
        assert_eq!(escape_text("plain"), "plain");
    }

    #[test]
    fn test_escape_roundtrip() {
        let original = "x \\< y < z \\ w";
        assert_eq!(decode_backslash_escapes(&escape_text(original)), original);
    }

    #[test]
    fn test_choose_quote_smart() {
        assert_eq!(choose_quote("a'b", '"', true), '"');
        assert_eq!(choose_quote("a\"b", '"', true), '\'');
        // Tie keeps the preferred quote.
        assert_eq!(choose_quote("'\"", '"', true), '"');
        assert_eq!(choose_quote("a\"b", '"', false), '"');
        assert_eq!(choose_quote("a'b'c", '\'', true), '"');
    }

    #[test]
    fn test_escape_attribute_value() {
        assert_eq!(escape_attribute_value("a\"b", '"'), "a&#x22;b");
        assert_eq!(escape_attribute_value("a'b", '\''), "a&#x27;b");
        assert_eq!(escape_attribute_value("a'b", '"'), "a'b");
    }
}
