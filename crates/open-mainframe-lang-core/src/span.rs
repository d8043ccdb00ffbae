//! Source location tracking for error reporting.
//!
//! Every token and syntax node carries a [`Position`] that tracks where it
//! came from. A position is a byte [`Span`] inside one file plus the
//! 0-based line and column of its first byte, which is what editor
//! tooling needs to place a diagnostic.
//!
//! Files are referred to by [`FileId`]; a [`FileTable`] maps ids back to
//! paths. Tokens spliced in from included sources keep their own file id,
//! which is how the Natural include resolver tells "already remapped" from
//! "still points into the copy code".

use std::ops::Range;
use std::path::{Path, PathBuf};

/// Unique identifier for a source file.
///
/// Used to distinguish tokens from different files (main source vs copy codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FileId(pub u32);

impl FileId {
    /// The file ID of the module being parsed.
    pub const MAIN: FileId = FileId(0);
}

/// A contiguous range of bytes in one source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// The source file this span belongs to.
    pub file: FileId,
    /// Byte offset of the start of this span (0-indexed).
    pub start: u32,
    /// Byte offset of the end of this span (exclusive).
    pub end: u32,
}

impl Span {
    /// Create a new span.
    pub fn new(file: FileId, start: u32, end: u32) -> Self {
        Self { file, start, end }
    }

    /// Create a span in the main source file.
    pub fn main(start: u32, end: u32) -> Self {
        Self::new(FileId::MAIN, start, end)
    }

    /// Create an empty span at a position.
    pub fn point(file: FileId, pos: u32) -> Self {
        Self::new(file, pos, pos)
    }

    /// Get the length of this span in bytes.
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    /// Check if this span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `other` lies completely inside this span (same file).
    pub fn contains(&self, other: Span) -> bool {
        self.file == other.file && self.start <= other.start && self.end >= other.end
    }

    /// Extend this span to include another span.
    pub fn extend(self, other: Span) -> Self {
        debug_assert_eq!(self.file, other.file, "Cannot extend span across files");
        Self {
            file: self.file,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Convert to a byte range.
    pub fn to_range(&self) -> Range<usize> {
        (self.start as usize)..(self.end as usize)
    }
}

/// A span together with the line and column of its first byte.
///
/// Lines and columns are 0-based; add one for user-facing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    /// Byte range in the file.
    pub span: Span,
    /// Line of `span.start` (0-indexed).
    pub line: u32,
    /// Column of `span.start` in bytes (0-indexed).
    pub column: u32,
}

impl Position {
    /// Create a new position.
    pub fn new(span: Span, line: u32, column: u32) -> Self {
        Self { span, line, column }
    }

    /// File the position points into.
    pub fn file(&self) -> FileId {
        self.span.file
    }

    /// Byte offset of the first byte.
    pub fn offset(&self) -> u32 {
        self.span.start
    }

    /// Byte offset one past the last byte.
    pub fn end(&self) -> u32 {
        self.span.end
    }

    /// Length in bytes.
    pub fn length(&self) -> u32 {
        self.span.end - self.span.start
    }

    /// Smallest position covering both `self` and `other`.
    ///
    /// Line and column follow whichever position starts first. Positions in
    /// different files do not combine; `self` is returned unchanged.
    pub fn union(self, other: Position) -> Position {
        if self.file() != other.file() {
            return self;
        }
        let first = if other.span.start < self.span.start {
            other
        } else {
            self
        };
        Position {
            span: self.span.extend(other.span),
            line: first.line,
            column: first.column,
        }
    }

    /// Same position moved into another file.
    pub fn in_file(self, file: FileId) -> Position {
        Position {
            span: Span::new(file, self.span.start, self.span.end),
            ..self
        }
    }
}

/// Maps [`FileId`]s to paths for one parse session.
///
/// The module being parsed is always [`FileId::MAIN`]; included sources and
/// imported data areas are interned on first use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTable {
    paths: Vec<PathBuf>,
}

impl FileTable {
    /// Create a table whose [`FileId::MAIN`] is `main`.
    pub fn new(main: impl Into<PathBuf>) -> Self {
        Self {
            paths: vec![main.into()],
        }
    }

    /// Return the id of `path`, registering it if it is new.
    pub fn intern(&mut self, path: &Path) -> FileId {
        if let Some(index) = self.paths.iter().position(|p| p == path) {
            return FileId(index as u32);
        }
        self.paths.push(path.to_path_buf());
        FileId((self.paths.len() - 1) as u32)
    }

    /// Path registered for `id`.
    pub fn path(&self, id: FileId) -> Option<&Path> {
        self.paths.get(id.0 as usize).map(PathBuf::as_path)
    }

    /// Number of registered files.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether no file has been registered.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Resolved location information for display purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed).
    pub column: u32,
    /// The file name or path.
    pub file_name: String,
}

impl Location {
    /// Create a new location.
    pub fn new(file_name: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file_name: file_name.into(),
            line,
            column,
        }
    }

    /// Build a display location for `position` using the paths in `files`.
    pub fn of(position: &Position, files: &FileTable) -> Self {
        let file_name = files
            .path(position.file())
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<source>".to_string());
        Self::new(file_name, position.line + 1, position.column + 1)
    }
}

/// Compute line and column from a byte offset in source text.
///
/// Returns `(line, column)` where both are 1-indexed.
pub fn offset_to_line_col(source: &str, offset: usize) -> (u32, u32) {
    let mut line = 1;
    let mut col = 1;

    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_creation() {
        let span = Span::new(FileId(1), 10, 20);
        assert_eq!(span.file, FileId(1));
        assert_eq!(span.len(), 10);
        assert!(!span.is_empty());
    }

    #[test]
    fn test_span_extend_and_contains() {
        let extended = Span::main(10, 20).extend(Span::main(15, 30));
        assert_eq!(extended, Span::main(10, 30));
        assert!(extended.contains(Span::main(12, 30)));
        assert!(!extended.contains(Span::new(FileId(2), 12, 13)));
    }

    #[test]
    fn test_position_union_takes_first_line() {
        let a = Position::new(Span::main(20, 25), 2, 4);
        let b = Position::new(Span::main(3, 8), 0, 3);
        let u = a.union(b);
        assert_eq!(u.span, Span::main(3, 25));
        assert_eq!((u.line, u.column), (0, 3));
        assert_eq!(u.length(), 22);
    }

    #[test]
    fn test_file_table_interning() {
        let mut files = FileTable::new("LIB/PROG.NSP");
        let cc = files.intern(Path::new("LIB/CC.NSC"));
        assert_eq!(cc, FileId(1));
        assert_eq!(files.intern(Path::new("LIB/CC.NSC")), FileId(1));
        assert_eq!(files.intern(Path::new("LIB/PROG.NSP")), FileId::MAIN);
        assert_eq!(files.path(cc), Some(Path::new("LIB/CC.NSC")));
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_location_of_position() {
        let files = FileTable::new("PROG.NSP");
        let loc = Location::of(&Position::new(Span::main(7, 9), 1, 2), &files);
        assert_eq!(loc, Location::new("PROG.NSP", 2, 3));
    }

    #[test]
    fn test_offset_to_line_col() {
        let source = "line 1\nline 2\nline 3";
        assert_eq!(offset_to_line_col(source, 0), (1, 1));
        assert_eq!(offset_to_line_col(source, 5), (1, 6));
        assert_eq!(offset_to_line_col(source, 7), (2, 1));
        assert_eq!(offset_to_line_col(source, 14), (3, 1));
    }
}
