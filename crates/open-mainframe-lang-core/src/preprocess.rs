//! Source preprocessing shared by all language front ends.
//!
//! Raw source must pass through [`PreprocessedSource::new()`] before
//! scanning. This guarantees:
//! - Line endings are normalized to `\n` (handles `\r\n`, `\r`, and `\n`)
//! - Byte offsets in [`LineIndex`] are accurate regardless of the original
//!   line terminator style
//!
//! Natural sources exported from a mainframe library often arrive with
//! `\r\n` endings while locally edited copy codes use `\n`. Offsets of an
//! included token must stay comparable with offsets of the includer, so both
//! sides are normalized the same way.

use crate::span::{FileId, Position, Span};

/// Result of preprocessing a source string.
#[derive(Debug, Clone)]
pub struct PreprocessedSource {
    /// Source text with all line endings converted to `\n`.
    pub text: String,
    /// Precomputed line offset index built from the normalized text.
    pub line_index: LineIndex,
}

impl PreprocessedSource {
    /// Normalize line endings and build the line index.
    pub fn new(raw: &str) -> Self {
        let text = normalize_line_endings(raw);
        let line_index = LineIndex::new(&text);
        Self { text, line_index }
    }

    /// Position of the byte range `start..end` in `file`.
    pub fn position(&self, file: FileId, start: u32, end: u32) -> Position {
        self.line_index.position(file, start, end)
    }
}

/// Precomputed byte-offset index for each line in a source string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// `offsets[i]` is the byte offset where line `i` (0-indexed) begins.
    offsets: Vec<u32>,
}

impl LineIndex {
    /// Build a line index from (already-normalized) source text.
    pub fn new(text: &str) -> Self {
        let mut offsets = vec![0];
        for (i, byte) in text.as_bytes().iter().enumerate() {
            if *byte == b'\n' {
                offsets.push((i + 1) as u32);
            }
        }
        Self { offsets }
    }

    /// Number of lines in the source.
    pub fn line_count(&self) -> usize {
        self.offsets.len()
    }

    /// Byte offset where the given line (0-indexed) starts.
    pub fn line_start(&self, line: usize) -> Option<u32> {
        self.offsets.get(line).copied()
    }

    /// Convert a byte offset to a 0-indexed `(line, column)` pair.
    ///
    /// The column is measured in bytes from the start of the line.
    pub fn offset_to_line_col_0(&self, offset: u32) -> (u32, u32) {
        let line = match self.offsets.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert_point) => insert_point.saturating_sub(1),
        };
        let col = offset - self.offsets[line];
        (line as u32, col)
    }

    /// Position of the byte range `start..end` in `file`.
    pub fn position(&self, file: FileId, start: u32, end: u32) -> Position {
        let (line, column) = self.offset_to_line_col_0(start);
        Position::new(Span::new(file, start, end), line, column)
    }
}

/// Normalize line endings to Unix style (`\n`).
///
/// Converts `\r\n` (Windows) and bare `\r` (old Mac) to `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    if !text.as_bytes().contains(&b'\r') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\r' {
            out.push('\n');
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_windows_crlf() {
        assert_eq!(normalize_line_endings("a\r\nb\r\nc"), "a\nb\nc");
    }

    #[test]
    fn normalize_mixed() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\nd"), "a\nb\nc\nd");
    }

    #[test]
    fn normalize_keeps_non_ascii() {
        assert_eq!(normalize_line_endings("WRITE 'Grüße'\r\nEND"), "WRITE 'Grüße'\nEND");
    }

    #[test]
    fn line_index_three_lines() {
        let idx = LineIndex::new("line1\nline2\nline3");
        assert_eq!(idx.line_count(), 3);
        assert_eq!(idx.line_start(1), Some(6));
        assert_eq!(idx.line_start(2), Some(12));
        assert_eq!(idx.line_start(3), None);
    }

    #[test]
    fn offset_to_line_col_boundaries() {
        let idx = LineIndex::new("abc\ndef\nghi");
        assert_eq!(idx.offset_to_line_col_0(0), (0, 0));
        assert_eq!(idx.offset_to_line_col_0(3), (0, 3));
        assert_eq!(idx.offset_to_line_col_0(4), (1, 0));
        assert_eq!(idx.offset_to_line_col_0(9), (2, 1));
    }

    #[test]
    fn preprocessed_natural_source_positions() {
        let raw = "DEFINE DATA LOCAL\r\n1 #X (A10)\r\nEND-DEFINE\r\n";
        let pp = PreprocessedSource::new(raw);
        assert!(!pp.text.contains('\r'));

        let start = pp.text.find("#X").map(|o| o as u32).unwrap_or_default();
        let pos = pp.position(FileId::MAIN, start, start + 2);
        assert_eq!((pos.line, pos.column), (1, 2));
        assert_eq!(pos.length(), 2);
    }
}
