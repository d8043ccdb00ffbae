// SPDX-License-Identifier: Apache-2.0
//! Character cursor over normalized source text.

use open_mainframe_lang_core::{FileId, LineIndex, Position, PreprocessedSource, Span};

/// Byte-oriented cursor with lookahead and position bookkeeping.
///
/// The scanner works on characters but reports byte offsets, so multi-byte
/// characters inside string literals and comments keep correct spans.
#[derive(Debug)]
pub struct SourceScanner<'a> {
    source: &'a str,
    file: FileId,
    offset: usize,
    lexeme_start: usize,
    line_index: LineIndex,
}

impl<'a> SourceScanner<'a> {
    /// Create a scanner over already-normalized text.
    pub fn new(source: &'a str, file: FileId) -> Self {
        Self {
            source,
            file,
            offset: 0,
            lexeme_start: 0,
            line_index: LineIndex::new(source),
        }
    }

    /// Create a scanner reusing the line index of a preprocessed source.
    pub fn preprocessed(source: &'a PreprocessedSource, file: FileId) -> Self {
        Self {
            source: &source.text,
            file,
            offset: 0,
            lexeme_start: 0,
            line_index: source.line_index.clone(),
        }
    }

    /// File being scanned.
    pub fn file(&self) -> FileId {
        self.file
    }

    /// Current byte offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Whether all input was consumed.
    pub fn is_at_end(&self) -> bool {
        self.offset >= self.source.len()
    }

    /// Character at the cursor.
    pub fn peek(&self) -> Option<char> {
        self.source[self.offset..].chars().next()
    }

    /// Character `n` characters past the cursor.
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.source[self.offset..].chars().nth(n)
    }

    /// Character before the cursor.
    pub fn previous(&self) -> Option<char> {
        self.source[..self.offset].chars().next_back()
    }

    /// Consume one character.
    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        Some(c)
    }

    /// Consume the next character if it equals `expected`.
    pub fn advance_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.offset += expected.len_utf8();
            true
        } else {
            false
        }
    }

    /// Consume characters while `pred` holds.
    pub fn advance_while(&mut self, mut pred: impl FnMut(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.offset += c.len_utf8();
        }
    }

    /// Whether the remaining input starts with `text`.
    pub fn starts_with(&self, text: &str) -> bool {
        self.source[self.offset..].starts_with(text)
    }

    /// Mark the start of the next lexeme.
    pub fn start_lexeme(&mut self) {
        self.lexeme_start = self.offset;
    }

    /// Text consumed since [`SourceScanner::start_lexeme`].
    pub fn lexeme(&self) -> &'a str {
        &self.source[self.lexeme_start..self.offset]
    }

    /// Source text between two byte offsets.
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.source[start..end]
    }

    /// Position of the current lexeme.
    pub fn lexeme_position(&self) -> Position {
        self.position(self.lexeme_start, self.offset)
    }

    /// Position of a byte range.
    pub fn position(&self, start: usize, end: usize) -> Position {
        let (line, column) = self.line_index.offset_to_line_col_0(start as u32);
        Position::new(Span::new(self.file, start as u32, end as u32), line, column)
    }

    /// Column (0-based, bytes) of the cursor.
    pub fn column(&self) -> u32 {
        self.line_index.offset_to_line_col_0(self.offset as u32).1
    }

    /// Remaining text on the current line, without consuming it.
    pub fn rest_of_line(&self) -> &'a str {
        let rest = &self.source[self.offset..];
        match rest.find('\n') {
            Some(idx) => &rest[..idx],
            None => rest,
        }
    }

    /// Next non-blank character, looking across line breaks.
    pub fn next_significant(&self) -> Option<char> {
        self.source[self.offset..]
            .chars()
            .find(|c| !c.is_whitespace())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_and_advance() {
        let mut s = SourceScanner::new("ab\ncd", FileId::MAIN);
        assert_eq!(s.peek(), Some('a'));
        assert_eq!(s.peek_nth(1), Some('b'));
        assert_eq!(s.advance(), Some('a'));
        assert_eq!(s.previous(), Some('a'));
        assert!(s.advance_if('b'));
        assert!(!s.advance_if('x'));
        assert_eq!(s.peek(), Some('\n'));
    }

    #[test]
    fn test_lexeme_positions_track_lines() {
        let mut s = SourceScanner::new("WRITE\n  #NAME", FileId::MAIN);
        s.advance_while(|c| c != '#');
        s.start_lexeme();
        s.advance_while(|c| !c.is_whitespace());
        assert_eq!(s.lexeme(), "#NAME");
        let pos = s.lexeme_position();
        assert_eq!((pos.line, pos.column), (1, 2));
        assert_eq!(pos.offset(), 8);
        assert!(s.is_at_end());
    }

    #[test]
    fn test_multibyte_offsets() {
        let mut s = SourceScanner::new("'ä' X", FileId::MAIN);
        s.start_lexeme();
        s.advance_while(|c| c != ' ');
        assert_eq!(s.lexeme(), "'ä'");
        assert_eq!(s.lexeme_position().length(), 4);
    }

    #[test]
    fn test_rest_of_line_and_next_significant() {
        let s = SourceScanner::new("  - \n  'B'", FileId::MAIN);
        assert_eq!(s.rest_of_line(), "  - ");
        assert_eq!(s.next_significant(), Some('-'));
    }
}
