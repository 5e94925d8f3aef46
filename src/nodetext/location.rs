//! Line and column positions for node reports
//!
//! Node ranges are byte offsets into the buffer text. The CLI reports where a
//! node sits as `line:column`, with the column counted in characters.

use serde::Serialize;
use std::fmt;
use std::iter;

/// 0-based line and character column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// Line starts of one buffer's text
pub struct LineIndex<'a> {
    text: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let starts = iter::once(0)
            .chain(text.match_indices('\n').map(|(at, _)| at + 1))
            .collect();
        LineIndex { text, starts }
    }

    /// Position of byte `offset`; offsets past the text clamp to its end.
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let line = self.starts.partition_point(|&start| start <= offset) - 1;
        let start = self.starts[line];
        let column = self
            .text
            .get(start..offset)
            .map_or(offset - start, |before| before.chars().count());
        Position { line, column }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_and_columns() {
        let index = LineIndex::new("{ a\n{ b }\n}");
        assert_eq!(index.position(0), Position { line: 0, column: 0 });
        assert_eq!(index.position(6), Position { line: 1, column: 2 });
        assert_eq!(index.position(10), Position { line: 2, column: 0 });
    }

    #[test]
    fn test_column_counts_chars() {
        let index = LineIndex::new("Root\n{ Café { x } }");
        let offset = "Root\n{ Café { ".len();
        assert_eq!(index.position(offset).to_string(), "2:10");
    }

    #[test]
    fn test_offset_past_end() {
        let index = LineIndex::new("ab\n");
        assert_eq!(index.position(3), Position { line: 1, column: 0 });
        assert_eq!(index.position(99), Position { line: 1, column: 0 });
    }
}
