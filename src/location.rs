//! Positions, ranges, and offset to line/column translation
//!
//! Offsets handed out by prover drivers are flat indices into one buffer. This module
//! converts them to human-facing positions and back.
//!
//! ## Offset units
//!
//! A buffer is addressed either by characters or by UTF-8 bytes (see [`Addressing`]).
//! Within one document all offsets must use the same unit; mixing them is a caller error.
//!
//! ## Line index
//!
//! [`LineIndex`] pre-computes the offset at which every line begins:
//!
//! ```text
//! "ab\ncd\nef"
//!  line_starts = [0, 3, 6]
//!
//! offset_to_line_col(4):
//!   - largest line start <= 4 is 3 (index 1)  → line 2
//!   - column: 4 - 3 = 1
//! ```
//!
//! Lines are 1-based and columns 0-based. A buffer that does not begin at the start of a
//! line (a snippet cut out of a larger file) can declare a column offset for its first
//! line; both directions of the translation honour it, so they stay exact inverses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unit in which offsets into a buffer are counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Addressing {
    /// Offsets count Unicode scalar values
    #[default]
    Chars,
    /// Offsets count UTF-8 bytes
    Bytes,
}

impl Addressing {
    /// Length of `text` in this unit
    pub fn measure(self, text: &str) -> usize {
        match self {
            Addressing::Chars => text.chars().count(),
            Addressing::Bytes => text.len(),
        }
    }

    /// Byte index of the unit offset `offset` inside `text`.
    ///
    /// Returns `None` when the offset lies past the end of `text`, or (for byte
    /// addressing) when it falls inside a multi-byte character.
    pub fn byte_index(self, text: &str, offset: usize) -> Option<usize> {
        match self {
            Addressing::Bytes => text.is_char_boundary(offset).then_some(offset),
            Addressing::Chars => text
                .char_indices()
                .map(|(idx, _)| idx)
                .chain(std::iter::once(text.len()))
                .nth(offset),
        }
    }

    fn char_width(self, ch: char) -> usize {
        match self {
            Addressing::Chars => 1,
            Addressing::Bytes => ch.len_utf8(),
        }
    }
}

/// A position in a source file (1-based line, column)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub source: Option<String>,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self {
            source: None,
            line,
            column,
        }
    }

    pub fn in_source(source: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            source: Some(source.into()),
            line,
            column,
        }
    }

    /// A range covering just this point
    pub fn as_range(&self) -> Range {
        Range::point(self.clone())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A span between two positions; `end: None` denotes a single point
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub begin: Position,
    pub end: Option<Position>,
}

impl Range {
    pub fn new(begin: Position, end: Position) -> Self {
        Self {
            begin,
            end: Some(end),
        }
    }

    pub fn point(begin: Position) -> Self {
        Self { begin, end: None }
    }

    /// Render the `file:line:col:` style header used to prefix diagnostics
    pub fn as_header(&self) -> String {
        let source = self.begin.source.as_deref().unwrap_or("<unknown>");
        match &self.end {
            Some(end) => format!("{}:({})-({}):", source, self.begin, end),
            None => format!("{}:{}:", source, self.begin),
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.end {
            Some(end) => write!(f, "{}..{}", self.begin, end),
            None => write!(f, "{}", self.begin),
        }
    }
}

/// Fast conversion between flat offsets and (line, column) pairs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Offsets where each line starts
    line_starts: Vec<usize>,
    len: usize,
    first_column: usize,
}

impl LineIndex {
    /// Index a character-addressed buffer
    pub fn new(text: &str) -> Self {
        Self::with_addressing(text, Addressing::Chars)
    }

    pub fn with_addressing(text: &str, addressing: Addressing) -> Self {
        let mut line_starts = vec![0];
        let mut offset = 0;

        for ch in text.chars() {
            offset += addressing.char_width(ch);
            if ch == '\n' {
                line_starts.push(offset);
            }
        }

        Self {
            line_starts,
            len: offset,
            first_column: 0,
        }
    }

    /// Declare the column at which the buffer's first line starts
    pub fn with_first_column(mut self, column: usize) -> Self {
        self.first_column = column;
        self
    }

    /// Convert an offset to a 1-based line and 0-based column
    pub fn offset_to_line_col(&self, offset: usize) -> Option<(usize, usize)> {
        if offset > self.len {
            return None;
        }

        let index = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let mut column = offset - self.line_starts[index];
        if index == 0 {
            column += self.first_column;
        }

        Some((index + 1, column))
    }

    /// Convert a 1-based line and 0-based column back to an offset
    pub fn line_col_to_offset(&self, line: usize, column: usize) -> Option<usize> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        let column = if line == 1 {
            column.checked_sub(self.first_column)?
        } else {
            column
        };

        let line_end = self
            .line_starts
            .get(line)
            .map(|next| next - 1)
            .unwrap_or(self.len);
        let offset = start + column;
        (offset <= line_end).then_some(offset)
    }

    /// Get the total number of lines in the buffer
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Get the offset for the start of a 1-based line
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line.checked_sub(1)?).copied()
    }

    /// Length of the indexed buffer
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// A snippet of text that was cut out of a larger source at a known position.
///
/// Continuation lines of the snippet are assumed to be indented by `column_offset`
/// relative to the enclosing source (as in a literate block).
#[derive(Debug, Clone)]
pub struct PositionedText {
    text: String,
    start: Position,
    column_offset: usize,
    index: LineIndex,
}

impl PositionedText {
    pub fn new(text: impl Into<String>, start: Position, column_offset: usize) -> Self {
        let text = text.into();
        let index = LineIndex::new(&text);
        Self {
            text,
            start,
            column_offset,
            index,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Translate a character offset into the snippet to a position in the source.
    /// Offsets past the end are clamped to the end.
    pub fn translate_offset(&self, offset: usize) -> Position {
        let offset = offset.min(self.index.len());
        let (line, column) = self.index.offset_to_line_col(offset).unwrap_or((1, 0));

        let (line, column) = if line == 1 {
            (self.start.line, self.start.column + offset)
        } else {
            (
                self.start.line + line - 1,
                1 + self.column_offset + column,
            )
        };

        Position {
            source: self.start.source.clone(),
            line,
            column,
        }
    }

    pub fn translate_span(&self, begin: usize, end: usize) -> Range {
        Range::new(self.translate_offset(begin), self.translate_offset(end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_display() {
        let pos = Position::new(5, 10);
        assert_eq!(format!("{}", pos), "5:10");
    }

    #[test]
    fn test_position_comparison() {
        assert!(Position::new(1, 5) < Position::new(2, 3));
        assert_eq!(Position::new(1, 5), Position::new(1, 5));
    }

    #[test]
    fn test_range_display() {
        let range = Range::new(Position::new(1, 0), Position::new(2, 5));
        assert_eq!(format!("{}", range), "1:0..2:5");
        assert_eq!(format!("{}", Position::new(3, 1).as_range()), "3:1");
    }

    #[test]
    fn test_header_of_point_and_span() {
        let point = Position::in_source("a.v", 3, 2).as_range();
        insta::assert_snapshot!(point.as_header(), @"a.v:3:2:");

        let span = Range::new(Position::in_source("a.v", 3, 2), Position::new(5, 8));
        insta::assert_snapshot!(span.as_header(), @"a.v:(3:2)-(5:8):");

        assert_eq!(Position::new(1, 1).as_range().as_header(), "<unknown>:1:1:");
    }

    #[test]
    fn test_offset_to_line_col_single_line() {
        let index = LineIndex::new("Hello");
        assert_eq!(index.offset_to_line_col(0), Some((1, 0)));
        assert_eq!(index.offset_to_line_col(4), Some((1, 4)));
        assert_eq!(index.offset_to_line_col(5), Some((1, 5)));
        assert_eq!(index.offset_to_line_col(6), None);
    }

    #[test]
    fn test_offset_to_line_col_multiline() {
        let index = LineIndex::new("Hello\nworld\ntest");

        assert_eq!(index.offset_to_line_col(0), Some((1, 0)));
        assert_eq!(index.offset_to_line_col(5), Some((1, 5)));
        assert_eq!(index.offset_to_line_col(6), Some((2, 0)));
        assert_eq!(index.offset_to_line_col(10), Some((2, 4)));
        assert_eq!(index.offset_to_line_col(12), Some((3, 0)));
        assert_eq!(index.offset_to_line_col(15), Some((3, 3)));
    }

    #[test]
    fn test_unicode_chars_vs_bytes() {
        let chars = LineIndex::new("wö\nrld");
        assert_eq!(chars.offset_to_line_col(3), Some((2, 0)));

        let bytes = LineIndex::with_addressing("wö\nrld", Addressing::Bytes);
        assert_eq!(bytes.offset_to_line_col(3), Some((1, 3)));
        assert_eq!(bytes.offset_to_line_col(4), Some((2, 0)));
    }

    #[test]
    fn test_line_col_to_offset_inverts() {
        let index = LineIndex::new("ab\ncd\n\nef");
        for offset in 0..=index.len() {
            let (line, column) = index.offset_to_line_col(offset).unwrap();
            assert_eq!(index.line_col_to_offset(line, column), Some(offset));
        }
        assert_eq!(index.line_col_to_offset(1, 3), None);
        assert_eq!(index.line_col_to_offset(0, 0), None);
        assert_eq!(index.line_col_to_offset(9, 0), None);
    }

    #[test]
    fn test_first_column_offset() {
        let index = LineIndex::new("ab\ncd").with_first_column(4);
        assert_eq!(index.offset_to_line_col(1), Some((1, 5)));
        assert_eq!(index.offset_to_line_col(4), Some((2, 1)));
        assert_eq!(index.line_col_to_offset(1, 5), Some(1));
        assert_eq!(index.line_col_to_offset(1, 3), None);
    }

    #[test]
    fn test_line_count_and_starts() {
        let index = LineIndex::new("Hello\nWorld\nTest");
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.line_start(1), Some(0));
        assert_eq!(index.line_start(2), Some(6));
        assert_eq!(index.line_start(3), Some(12));
        assert_eq!(index.line_start(4), None);
    }

    #[test]
    fn test_translate_offset() {
        let text = PositionedText::new("abc\ndef\nghi", Position::in_source("f", 3, 2), 5);
        assert_eq!(text.translate_offset(0), Position::in_source("f", 3, 2));
        assert_eq!(text.translate_offset(10), Position::in_source("f", 5, 8));

        let span = text.translate_span(1, 5);
        assert_eq!(span.begin, Position::in_source("f", 3, 3));
        assert_eq!(span.end, Some(Position::in_source("f", 4, 7)));
    }

    #[test]
    fn test_byte_index() {
        assert_eq!(Addressing::Chars.byte_index("wörld", 2), Some(3));
        assert_eq!(Addressing::Chars.byte_index("wörld", 5), Some(6));
        assert_eq!(Addressing::Chars.byte_index("wörld", 6), None);
        assert_eq!(Addressing::Bytes.byte_index("wörld", 2), None);
        assert_eq!(Addressing::Bytes.byte_index("wörld", 3), Some(3));
    }
}
