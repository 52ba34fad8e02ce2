//! Error types for parsing and serialization.

use thiserror::Error;

use crate::range::Position;

/// Where an unclosed tag was detected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    Paragraph,
    Document,
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Scope::Paragraph => "paragraph",
            Scope::Document => "document",
        })
    }
}

/// Structural errors raised while assembling tags into a tree.
///
/// Every variant carries the position of the offending syntax (`place`);
/// mismatch variants additionally carry the open tag they conflict with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// A closing tag with no open tag on the stack.
    #[error("Unexpected closing slash `/` in tag, expected an open tag first")]
    UnexpectedClosingSlash { place: Position },

    /// `</a/>` — a self-closing marker on a closing tag.
    #[error("Unexpected self-closing slash `/` in closing tag, expected the end of the tag")]
    UnexpectedSelfClosingOnClosingTag { place: Position },

    /// `</a b>` — an attribute on a closing tag.
    #[error("Unexpected attribute in closing tag, expected the end of the tag")]
    UnexpectedAttributeOnClosingTag { place: Position },

    /// A closing tag that does not match the innermost open tag.
    #[error("Unexpected closing tag `{found}`, expected corresponding closing tag for `{expected}` ({open})")]
    UnexpectedClosingTag {
        /// Rendered as `</b>` (or `</>` for a fragment).
        found: String,
        /// Rendered as `<a>` (or `<>` for a fragment).
        expected: String,
        open: Position,
        place: Position,
    },

    /// An open tag left on the stack when its scope ends.
    #[error("Expected a closing tag for `{tag}` ({open}) before the end of `{scope}`")]
    UnclosedTag {
        tag: String,
        open: Position,
        scope: Scope,
    },

    /// The configured expression parser rejected an expression.
    #[error("Could not parse expression: {reason}")]
    ExpressionParseFailure { reason: String, place: Position },
}

impl ParseError {
    /// Position of the offending syntax.
    pub fn place(&self) -> Position {
        match self {
            ParseError::UnexpectedClosingSlash { place }
            | ParseError::UnexpectedSelfClosingOnClosingTag { place }
            | ParseError::UnexpectedAttributeOnClosingTag { place }
            | ParseError::UnexpectedClosingTag { place, .. }
            | ParseError::ExpressionParseFailure { place, .. } => *place,
            ParseError::UnclosedTag { open, .. } => *open,
        }
    }
}

/// Errors raised while turning a tree back into markdown.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SerializeError {
    /// A fragment node (no name) carrying attributes.
    #[error("Cannot serialize fragment w/ attributes")]
    FragmentWithAttributes,

    /// A named attribute whose name is empty.
    #[error("Cannot serialize attribute w/o name")]
    AttributeWithoutName,

    /// A `quote` option that is not `"` or `'`.
    #[error("Cannot serialize attribute values with `{0}` for `options.quote`, expected `\"`, or `'`")]
    InvalidQuote(char),
}
