// SPDX-License-Identifier: Apache-2.0
//! Navigable token stream handed to the parser.
//!
//! Besides the primary tokens a [`TokenList`] keeps three side channels:
//! comments, hidden tokens (include directives that were replaced by their
//! copy code) and lex-time diagnostics. The include resolver also records an
//! [`IncludeSite`] for every expanded directive so the parser can rebuild the
//! `INCLUDE` statement around the spliced tokens.

use open_mainframe_lang_core::{Diagnostic, FileId, Position};

use crate::include::IncludeSite;
use crate::lexer::{Keyword, SyntaxToken, TokenKind};

/// An indexed token sequence with a cursor.
#[derive(Debug, Clone, Default)]
pub struct TokenList {
    file: FileId,
    tokens: Vec<SyntaxToken>,
    hidden: Vec<SyntaxToken>,
    comments: Vec<SyntaxToken>,
    diagnostics: Vec<Diagnostic>,
    include_sites: Vec<IncludeSite>,
    cursor: usize,
}

impl TokenList {
    /// Create a list positioned at the first token.
    pub fn new(
        file: FileId,
        tokens: Vec<SyntaxToken>,
        comments: Vec<SyntaxToken>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        Self {
            file,
            tokens,
            hidden: Vec::new(),
            comments,
            diagnostics,
            include_sites: Vec::new(),
            cursor: 0,
        }
    }

    /// Create a list from include-resolved parts.
    pub(crate) fn resolved(
        file: FileId,
        tokens: Vec<SyntaxToken>,
        hidden: Vec<SyntaxToken>,
        comments: Vec<SyntaxToken>,
        diagnostics: Vec<Diagnostic>,
        mut include_sites: Vec<IncludeSite>,
    ) -> Self {
        include_sites.sort_by(|a, b| {
            a.body
                .start
                .cmp(&b.body.start)
                .then(b.body.end.cmp(&a.body.end))
        });
        Self {
            file,
            tokens,
            hidden,
            comments,
            diagnostics,
            include_sites,
            cursor: 0,
        }
    }

    /// File the list was lexed from.
    pub fn file(&self) -> FileId {
        self.file
    }

    /// Number of primary tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether there are no primary tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// All primary tokens.
    pub fn tokens(&self) -> &[SyntaxToken] {
        &self.tokens
    }

    /// Token at `index`.
    pub fn get(&self, index: usize) -> Option<&SyntaxToken> {
        self.tokens.get(index)
    }

    /// Tokens in `start..end`.
    pub fn subrange(&self, start: usize, end: usize) -> &[SyntaxToken] {
        let end = end.min(self.tokens.len());
        &self.tokens[start.min(end)..end]
    }

    /// Comments, in source order of their file.
    pub fn comments(&self) -> &[SyntaxToken] {
        &self.comments
    }

    /// Tokens removed from the primary stream.
    pub fn hidden(&self) -> &[SyntaxToken] {
        &self.hidden
    }

    /// Lex-time and include diagnostics.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Expanded include directives, ordered by body start (outer first).
    pub fn include_sites(&self) -> &[IncludeSite] {
        &self.include_sites
    }

    /// Move the diagnostics out.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Move the comments out.
    pub fn take_comments(&mut self) -> Vec<SyntaxToken> {
        std::mem::take(&mut self.comments)
    }

    /// Move the primary tokens out.
    pub fn take_tokens(&mut self) -> Vec<SyntaxToken> {
        self.cursor = 0;
        std::mem::take(&mut self.tokens)
    }

    /// Consume the list into its primary tokens.
    pub fn into_tokens(self) -> Vec<SyntaxToken> {
        self.tokens
    }

    // -----------------------------------------------------------------------
    // Cursor
    // -----------------------------------------------------------------------

    /// Index of the current token.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor.
    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.tokens.len());
    }

    /// Whether the cursor is past the last token.
    pub fn is_at_end(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    /// Current token.
    pub fn peek(&self) -> Option<&SyntaxToken> {
        self.tokens.get(self.cursor)
    }

    /// Token `n` positions after the cursor.
    pub fn peek_nth(&self, n: usize) -> Option<&SyntaxToken> {
        self.tokens.get(self.cursor + n)
    }

    /// Kind of the current token.
    pub fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(SyntaxToken::kind)
    }

    /// Kind of the token `n` positions after the cursor.
    pub fn peek_kind_nth(&self, n: usize) -> Option<TokenKind> {
        self.peek_nth(n).map(SyntaxToken::kind)
    }

    /// Token before the cursor.
    pub fn previous(&self) -> Option<&SyntaxToken> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
    }

    /// Consume and return the current token.
    pub fn advance(&mut self) -> Option<SyntaxToken> {
        let token = self.tokens.get(self.cursor).cloned()?;
        self.cursor += 1;
        Some(token)
    }

    /// Whether the current token has `kind`.
    pub fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    /// Whether the current token is the keyword `kw`.
    pub fn at_keyword(&self, kw: Keyword) -> bool {
        self.at(TokenKind::Keyword(kw))
    }

    /// Whether the token `n` after the cursor is the keyword `kw`.
    pub fn at_keyword_nth(&self, n: usize, kw: Keyword) -> bool {
        self.peek_kind_nth(n) == Some(TokenKind::Keyword(kw))
    }

    /// Whether the current and following tokens are the given keywords.
    pub fn at_keywords(&self, kws: &[Keyword]) -> bool {
        kws.iter()
            .enumerate()
            .all(|(i, kw)| self.at_keyword_nth(i, *kw))
    }

    /// Whether the current token is the first on its source line.
    pub fn at_line_start(&self) -> bool {
        match (self.previous(), self.peek()) {
            (Some(prev), Some(cur)) => {
                prev.file() != cur.file() || prev.position().line != cur.position().line
            }
            _ => true,
        }
    }

    /// Position of the current token, or of the last token at end of input.
    pub fn current_position(&self) -> Position {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(SyntaxToken::diagnostic_position)
            .unwrap_or_default()
    }

    /// Split a comma number (`1,2`) at the cursor into `1`, `,`, `2`.
    ///
    /// Include site ranges after the cursor are shifted accordingly.
    pub fn split_current_at_comma(&mut self) -> bool {
        let Some((left, right)) = self.peek().and_then(SyntaxToken::split_at_comma) else {
            return false;
        };
        let comma_pos = {
            let l = left.position();
            Position::new(
                open_mainframe_lang_core::Span::new(l.file(), l.end(), l.end() + 1),
                l.line,
                l.column + l.length(),
            )
        };
        let mut comma = SyntaxToken::new(TokenKind::Comma, ",", comma_pos);
        if left.has_remapped_position() {
            comma = comma.with_diagnostic_position(left.diagnostic_position());
        }
        let at = self.cursor;
        self.tokens.splice(at..=at, [left, comma, right]);
        for site in &mut self.include_sites {
            if site.body.start > at {
                site.body.start += 2;
            }
            if site.body.end > at {
                site.body.end += 2;
            }
        }
        true
    }

    /// Append a diagnostic.
    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::NaturalLexer;

    fn list(source: &str) -> TokenList {
        NaturalLexer::new(FileId::MAIN).lex(source)
    }

    #[test]
    fn test_cursor_navigation() {
        let mut tokens = list("WRITE #A #B");
        assert!(tokens.at_keyword(Keyword::Write));
        assert_eq!(tokens.peek_nth(1).map(|t| t.text()), Some("#A"));
        assert_eq!(tokens.advance().map(|t| t.upper()), Some("WRITE".into()));
        assert_eq!(tokens.previous().map(|t| t.text()), Some("WRITE"));
        tokens.advance();
        tokens.advance();
        assert!(tokens.is_at_end());
        assert!(tokens.advance().is_none());
    }

    #[test]
    fn test_at_keywords() {
        let tokens = list("DEFINE DATA LOCAL");
        assert!(tokens.at_keywords(&[Keyword::Define, Keyword::Data]));
        assert!(!tokens.at_keywords(&[Keyword::Define, Keyword::Subroutine]));
    }

    #[test]
    fn test_line_start() {
        let mut tokens = list("WRITE #A\n#B := 1");
        assert!(tokens.at_line_start());
        tokens.advance();
        assert!(!tokens.at_line_start());
        tokens.advance();
        assert!(tokens.at_line_start());
    }

    #[test]
    fn test_split_current_at_comma() {
        let mut tokens = list("(1,2)");
        tokens.advance();
        assert!(tokens.split_current_at_comma());
        let texts: Vec<_> = tokens.tokens().iter().map(|t| t.text()).collect();
        assert_eq!(texts, vec!["(", "1", ",", "2", ")"]);
        assert_eq!(tokens.get(2).map(|t| t.position().offset()), Some(2));
        assert!(!tokens.split_current_at_comma());
    }

    #[test]
    fn test_subrange_is_clamped() {
        let tokens = list("A B C");
        assert_eq!(tokens.subrange(1, 10).len(), 2);
        assert!(tokens.subrange(5, 10).is_empty());
    }
}
