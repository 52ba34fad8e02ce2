//! Source spans and positions.
//!
//! Tokens reference the input through compact byte ranges (`u32` offsets,
//! documents up to 4GB). Human-facing positions (`line:column`) are derived
//! lazily through a [`LineIndex`], so the tokenizer never tracks lines.

use memchr::memchr_iter;
use serde::{Deserialize, Serialize};

/// Compact byte range into the input buffer.
///
/// # Example
/// ```
/// use mdjsx::Range;
///
/// let input = "Hello, World!";
/// let range = Range::new(7, 12);
/// assert_eq!(range.slice(input), "World");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Range {
    pub start: u32,
    pub end: u32,
}

impl Range {
    /// Create a new range.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Create a range from usize values.
    ///
    /// # Panics
    /// Panics in debug mode if values exceed `u32::MAX`.
    #[inline]
    pub fn from_usize(start: usize, end: usize) -> Self {
        debug_assert!(start <= u32::MAX as usize);
        debug_assert!(end <= u32::MAX as usize);
        Self {
            start: start as u32,
            end: end as u32,
        }
    }

    /// Create an empty range at a position.
    #[inline]
    pub const fn empty_at(pos: u32) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Get the text this range refers to.
    ///
    /// Ranges are only ever constructed on character boundaries, so plain
    /// `str` indexing is safe here.
    #[inline]
    pub fn slice<'a>(&self, input: &'a str) -> &'a str {
        &input[self.start as usize..self.end as usize]
    }

    /// Length of the range in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Check if the range is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl From<std::ops::Range<usize>> for Range {
    #[inline]
    fn from(r: std::ops::Range<usize>) -> Self {
        Self::from_usize(r.start, r.end)
    }
}

/// A point in the source: 1-based line and column plus 0-based byte offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

/// A closed span between two points.
///
/// Displayed as `line:column-line:column`, the form used in error messages
/// (e.g. `1:3-1:6`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub start: Point,
    pub end: Point,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start.line, self.start.column, self.end.line, self.end.column
        )
    }
}

/// Index of line-start offsets, for offset → point conversion.
#[derive(Debug)]
pub struct LineIndex {
    starts: Vec<u32>,
}

impl LineIndex {
    /// Build the index for one document.
    pub fn new(input: &str) -> Self {
        let mut starts = Vec::with_capacity(input.len() / 32 + 1);
        starts.push(0);
        for nl in memchr_iter(b'\n', input.as_bytes()) {
            starts.push(nl as u32 + 1);
        }
        Self { starts }
    }

    /// Convert a byte offset into a point.
    ///
    /// Columns are byte-based and 1-based, matching the offsets produced by
    /// the tokenizer.
    pub fn point(&self, offset: u32) -> Point {
        let line = match self.starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        Point {
            line: line as u32 + 1,
            column: offset - self.starts[line] + 1,
            offset,
        }
    }

    /// Convert a byte range into a position.
    pub fn position(&self, range: Range) -> Position {
        Position {
            start: self.point(range.start),
            end: self.point(range.end),
        }
    }
}
