// SPDX-License-Identifier: Apache-2.0
//! Natural lexer.
//!
//! Converts source text into a [`TokenList`]. The lexer never fails: unknown
//! characters, unterminated strings and malformed names produce a diagnostic
//! plus a recovery token, and scanning continues to the end of the input.
//!
//! Context-sensitive rules handled here:
//!
//! - `GROUP.FIELD` is one identifier when the dot is followed by a name;
//!   `R1.` followed by a blank is a label.
//! - Inside parentheses, `AD=ODL'_'` style attributes are whole tokens. A
//!   type specification directly after `(` (`A10`, `N7,2`) is one token
//!   inside `DEFINE DATA` and after `IS`; elsewhere `(` opens an index list.
//! - `C*`, `T*` and `P*` prefixes belong to the following name.
//! - A `-` between two string literals (possibly across lines) is a
//!   [`TokenKind::StringConcat`].
//! - Copy code placeholders `&1&` are replaced by the tokens of the include
//!   parameters, reported at the parameter's position in the includer.
//! - `*` in column 0 and `/*` start comments, which go to a side channel.

mod scanner;
mod token;

pub use scanner::SourceScanner;
pub use token::{AttributeKind, Keyword, SyntaxToken, TokenKind};

use open_mainframe_lang_core::{Diagnostic, FileId, Position, PreprocessedSource};

use crate::diagnostics::DiagnosticCode;
use crate::token_list::TokenList;
use crate::types::{is_system_function, DataFormat};

/// Longest valid variable name.
pub const MAX_IDENTIFIER_LENGTH: usize = 32;

/// The Natural lexer.
///
/// # Example
///
/// ```
/// use open_mainframe_lang_core::FileId;
/// use open_mainframe_natparse::{Keyword, NaturalLexer, TokenKind};
///
/// let tokens = NaturalLexer::new(FileId::MAIN).lex("IF #A = 1 WRITE 'ONE' END-IF");
/// assert_eq!(tokens.len(), 7);
/// assert_eq!(tokens.get(0).map(|t| t.kind()), Some(TokenKind::Keyword(Keyword::If)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct NaturalLexer {
    file: FileId,
    parameters: Option<Vec<SyntaxToken>>,
}

impl NaturalLexer {
    /// Lexer for a standalone source file.
    pub fn new(file: FileId) -> Self {
        Self {
            file,
            parameters: None,
        }
    }

    /// Lexer for a copy code included with `parameters` (the string literal
    /// tokens following the copy code name in the includer).
    pub fn with_parameters(file: FileId, parameters: Vec<SyntaxToken>) -> Self {
        Self {
            file,
            parameters: Some(parameters),
        }
    }

    /// Tokenize `source`.
    pub fn lex(&self, source: &str) -> TokenList {
        let source = PreprocessedSource::new(source);
        let mut state = LexState::new(&source, self.file, self.parameters.as_deref());
        state.run();
        TokenList::new(self.file, state.tokens, state.comments, state.diagnostics)
    }
}

impl open_mainframe_lang_core::Lexer for NaturalLexer {
    type Token = SyntaxToken;
    type Error = Diagnostic;

    fn tokenize(&mut self, source: &str) -> (Vec<SyntaxToken>, Vec<Diagnostic>) {
        let mut list = self.lex(source);
        let diagnostics = list.take_diagnostics();
        (list.into_tokens(), diagnostics)
    }
}

// ---------------------------------------------------------------------------
// Lexer state
// ---------------------------------------------------------------------------

struct LexState<'a> {
    scanner: SourceScanner<'a>,
    parameters: Option<&'a [SyntaxToken]>,
    tokens: Vec<SyntaxToken>,
    comments: Vec<SyntaxToken>,
    diagnostics: Vec<Diagnostic>,
    paren_depth: usize,
    /// Between `DEFINE DATA` and `END-DEFINE`.
    in_define_data: bool,
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, '#' | '&' | '@' | '$' | '_')
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '#' | '&' | '-' | '_' | '$' | '/' | '@')
}

impl<'a> LexState<'a> {
    fn new(
        source: &'a PreprocessedSource,
        file: FileId,
        parameters: Option<&'a [SyntaxToken]>,
    ) -> Self {
        Self {
            scanner: SourceScanner::preprocessed(source, file),
            parameters,
            tokens: Vec::new(),
            comments: Vec::new(),
            diagnostics: Vec::new(),
            paren_depth: 0,
            in_define_data: false,
        }
    }

    fn run(&mut self) {
        loop {
            self.scanner.advance_while(char::is_whitespace);
            let Some(c) = self.scanner.peek() else {
                break;
            };
            self.scanner.start_lexeme();

            if self.at_comment_start(c) {
                self.lex_comment();
                continue;
            }

            match c {
                '\'' | '"' => self.lex_string(TokenKind::StringLiteral),
                '(' => {
                    self.scanner.advance();
                    self.paren_depth += 1;
                    self.push(TokenKind::LParen);
                }
                ')' => {
                    self.scanner.advance();
                    self.paren_depth = self.paren_depth.saturating_sub(1);
                    self.push(TokenKind::RParen);
                }
                ',' => self.single(TokenKind::Comma),
                ':' => {
                    self.scanner.advance();
                    if self.scanner.advance_if('=') {
                        self.push(TokenKind::ColonEquals);
                    } else {
                        self.push(TokenKind::Colon);
                    }
                }
                '=' => self.single(TokenKind::Equals),
                '<' => {
                    self.scanner.advance();
                    if self.scanner.advance_if('=') {
                        self.push(TokenKind::LessEquals);
                    } else if self.scanner.advance_if('>') {
                        self.push(TokenKind::NotEquals);
                    } else {
                        self.push(TokenKind::Less);
                    }
                }
                '>' => {
                    self.scanner.advance();
                    if self.scanner.advance_if('=') {
                        self.push(TokenKind::GreaterEquals);
                    } else {
                        self.push(TokenKind::Greater);
                    }
                }
                '^' if self.scanner.peek_nth(1) == Some('=') => {
                    self.scanner.advance();
                    self.scanner.advance();
                    self.push(TokenKind::CaretEquals);
                }
                '+' => {
                    if self
                        .scanner
                        .peek_nth(1)
                        .is_some_and(|n| n.is_ascii_alphabetic() || n == '#')
                    {
                        self.scanner.advance();
                        self.lex_identifier();
                    } else {
                        self.single(TokenKind::Plus);
                    }
                }
                '-' => self.lex_minus(),
                '*' => self.lex_asterisk(),
                '/' => self.single(TokenKind::Slash),
                '.' => self.single(TokenKind::Dot),
                c if c.is_ascii_digit() => self.lex_number(),
                c if self.at_prefixed_literal(c) => self.lex_prefixed_literal(c),
                c if is_identifier_start(c) => self.lex_identifier(),
                _ => {
                    self.scanner.advance();
                    let pos = self.scanner.lexeme_position();
                    self.diagnostics.push(
                        DiagnosticCode::UnknownCharacter
                            .at(pos, format!("Unknown character '{}'", self.scanner.lexeme())),
                    );
                    self.push(TokenKind::Unknown);
                }
            }
        }
    }

    // -- helpers -----------------------------------------------------------

    fn push(&mut self, kind: TokenKind) {
        match kind {
            TokenKind::Keyword(Keyword::Data)
                if self.last_kind() == Some(TokenKind::Keyword(Keyword::Define)) =>
            {
                self.in_define_data = true;
            }
            TokenKind::Keyword(Keyword::EndDefine) => self.in_define_data = false,
            _ => {}
        }
        let token = SyntaxToken::new(
            kind,
            self.scanner.lexeme(),
            self.scanner.lexeme_position(),
        );
        self.tokens.push(token);
    }

    fn single(&mut self, kind: TokenKind) {
        self.scanner.advance();
        self.push(kind);
    }

    fn last_kind(&self) -> Option<TokenKind> {
        self.tokens.last().map(|t| t.kind())
    }

    // -- comments ----------------------------------------------------------

    fn at_comment_start(&self, c: char) -> bool {
        let next = self.scanner.peek_nth(1);
        if c == '*' && self.scanner.column() == 0 {
            return matches!(next, None | Some(' ' | '\t' | '*' | '\n' | '/'));
        }
        c == '/'
            && next == Some('*')
            && (self.scanner.column() == 0
                || self.scanner.previous().is_some_and(char::is_whitespace))
    }

    fn lex_comment(&mut self) {
        self.scanner.advance_while(|c| c != '\n');
        let token = SyntaxToken::new(
            TokenKind::Comment,
            self.scanner.lexeme().trim_end(),
            self.scanner.lexeme_position(),
        );
        self.comments.push(token);
    }

    // -- literals ----------------------------------------------------------

    fn at_prefixed_literal(&self, c: char) -> bool {
        matches!(c.to_ascii_uppercase(), 'H' | 'D' | 'T' | 'E' | 'U')
            && matches!(self.scanner.peek_nth(1), Some('\'' | '"'))
    }

    fn lex_prefixed_literal(&mut self, prefix: char) {
        self.scanner.advance();
        let kind = match prefix.to_ascii_uppercase() {
            'H' => TokenKind::HexLiteral,
            'D' => TokenKind::DateLiteral,
            'T' | 'E' => TokenKind::TimeLiteral,
            _ => TokenKind::StringLiteral,
        };
        self.lex_string(kind);
        if kind == TokenKind::HexLiteral {
            self.validate_hex();
        }
    }

    /// Lex a quoted literal; the cursor is on the opening quote.
    fn lex_string(&mut self, kind: TokenKind) {
        let Some(quote) = self.scanner.advance() else {
            return;
        };
        loop {
            match self.scanner.peek() {
                None | Some('\n') => {
                    let pos = self.scanner.lexeme_position();
                    self.diagnostics.push(
                        DiagnosticCode::UnterminatedString
                            .at(pos, "Unterminated string literal"),
                    );
                    break;
                }
                Some(c) if c == quote => {
                    self.scanner.advance();
                    if !self.scanner.advance_if(quote) {
                        break;
                    }
                }
                Some(_) => {
                    self.scanner.advance();
                }
            }
        }
        self.push(kind);
    }

    fn validate_hex(&mut self) {
        let Some(token) = self.tokens.last() else {
            return;
        };
        let text = token.text();
        let inner = text
            .get(2..text.len().saturating_sub(1))
            .unwrap_or_default();
        if inner.is_empty()
            || inner.len() % 2 != 0
            || !inner.chars().all(|c| c.is_ascii_hexdigit())
        {
            let pos = token.position();
            self.diagnostics.push(
                DiagnosticCode::InvalidHexLiteral
                    .at(pos, format!("Invalid hex literal {text}")),
            );
        }
    }

    fn lex_number(&mut self) {
        self.scanner.advance_while(|c| c.is_ascii_digit());
        let mut has_fraction = false;
        if matches!(self.scanner.peek(), Some('.' | ','))
            && self.scanner.peek_nth(1).is_some_and(|c| c.is_ascii_digit())
        {
            has_fraction = true;
            self.scanner.advance();
            self.scanner.advance_while(|c| c.is_ascii_digit());
        }
        if matches!(self.scanner.peek(), Some('E' | 'e')) {
            let exp_digit = match self.scanner.peek_nth(1) {
                Some('+' | '-') => self.scanner.peek_nth(2),
                other => other,
            };
            if exp_digit.is_some_and(|c| c.is_ascii_digit()) {
                self.scanner.advance();
                if matches!(self.scanner.peek(), Some('+' | '-')) {
                    self.scanner.advance();
                }
                self.scanner.advance_while(|c| c.is_ascii_digit());
                self.push(TokenKind::NumberLiteral);
                return;
            }
        }
        if !has_fraction {
            let suffix = self.scanner.peek().map(|c| c.to_ascii_uppercase());
            let after = self.scanner.peek_nth(1);
            if matches!(suffix, Some('X' | 'T')) && !after.is_some_and(is_identifier_char) {
                self.scanner.advance();
                let kind = if suffix == Some('X') {
                    TokenKind::OperandSkip
                } else {
                    TokenKind::Tab
                };
                self.push(kind);
                return;
            }
        }
        self.push(TokenKind::NumberLiteral);
    }

    // -- operators ---------------------------------------------------------

    fn lex_minus(&mut self) {
        self.scanner.advance();
        let after_string = matches!(
            self.last_kind(),
            Some(TokenKind::StringLiteral | TokenKind::HexLiteral)
        );
        let before_string = matches!(self.scanner.next_significant(), Some('\'' | '"'))
            || self.next_is_prefixed_string();
        if after_string && before_string {
            self.push(TokenKind::StringConcat);
        } else {
            self.push(TokenKind::Minus);
        }
    }

    fn next_is_prefixed_string(&self) -> bool {
        let rest = self.scanner.rest_of_line().trim_start();
        let mut chars = rest.chars();
        matches!(
            (chars.next().map(|c| c.to_ascii_uppercase()), chars.next()),
            (Some('H' | 'U'), Some('\''))
        )
    }

    fn lex_asterisk(&mut self) {
        self.scanner.advance();
        if self.scanner.advance_if('*') {
            self.push(TokenKind::Power);
            return;
        }
        if self.scanner.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.scanner
                .advance_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'));
            let kind = if is_system_function(self.scanner.lexeme()) {
                TokenKind::SystemFunction
            } else {
                TokenKind::SystemVariable
            };
            self.push(kind);
            return;
        }
        self.push(TokenKind::Asterisk);
    }

    // -- identifiers -------------------------------------------------------

    fn lex_identifier(&mut self) {
        // `+` of an AIV name was consumed by the caller
        let aiv = self.scanner.lexeme() == "+";
        if !aiv && self.paren_depth > 0 && self.try_attribute() {
            return;
        }
        if !aiv && self.type_spec_allowed() && self.try_type_spec() {
            return;
        }

        // C*#ARR, T*#VAR, P*#VAR
        let first = self.scanner.peek().map(|c| c.to_ascii_uppercase());
        if matches!(first, Some('C' | 'T' | 'P'))
            && self.scanner.peek_nth(1) == Some('*')
            && self.scanner.peek_nth(2).is_some_and(is_identifier_start)
        {
            self.scanner.advance();
            self.scanner.advance();
        }

        let mut text = self.scanner.lexeme().to_string();
        let mut substituted: Option<Position> = None;
        loop {
            match self.scanner.peek() {
                Some('&') if self.at_placeholder() => {
                    let start = self.scanner.offset();
                    let index = self.consume_placeholder();
                    let raw = self.scanner.slice(start, self.scanner.offset());
                    match self.parameter(index) {
                        ParameterLookup::Found(param) => {
                            text.push_str(&param.string_value());
                            substituted = Some(param.diagnostic_position());
                        }
                        ParameterLookup::Missing => {
                            let pos = self.scanner.position(start, self.scanner.offset());
                            self.diagnostics.push(DiagnosticCode::CopycodeParameterMissing.at(
                                pos,
                                format!("Copy code parameter {raw} not provided"),
                            ));
                            text.push_str(raw);
                        }
                        ParameterLookup::NotACopycode => text.push_str(raw),
                    }
                }
                // `/` and `.` belong to the name only when a name follows
                Some(c @ ('/' | '.')) => {
                    if self
                        .scanner
                        .peek_nth(1)
                        .is_some_and(|n| is_identifier_start(n) && !(c == '/' && n == '&'))
                    {
                        self.scanner.advance();
                        text.push(c);
                    } else {
                        break;
                    }
                }
                Some(c) if is_identifier_char(c) => {
                    self.scanner.advance();
                    text.push(c);
                }
                _ => break,
            }
        }

        let lexeme = self.scanner.lexeme();
        let position = self.scanner.lexeme_position();

        if substituted.is_some() && is_whole_placeholder(lexeme) {
            self.splice_parameter(lexeme, position);
            return;
        }

        let keyword = match substituted {
            Some(_) => None,
            None => Keyword::lookup(&text.to_ascii_uppercase()),
        };

        // R1. -> label
        if self.scanner.peek() == Some('.') && keyword.map_or(true, Keyword::is_soft) {
            self.scanner.advance();
            let label = SyntaxToken::new(
                TokenKind::LabelIdentifier,
                format!("{text}."),
                self.scanner.lexeme_position(),
            );
            self.tokens.push(label);
            return;
        }

        let kind = match keyword {
            Some(kw) => TokenKind::Keyword(kw),
            None => {
                self.validate_identifier(&text, position);
                TokenKind::Identifier
            }
        };
        let mut token = SyntaxToken::new(kind, text, position);
        if let Some(diag) = substituted {
            token = token.with_diagnostic_position(diag);
        }
        self.tokens.push(token);
    }

    fn validate_identifier(&mut self, text: &str, position: Position) {
        let bare = text.trim_start_matches('+');
        let invalid_prefix = matches!(bare, "#" | "&" | "@" | "$" | "");
        let too_long = bare
            .split('.')
            .any(|segment| segment.chars().count() > MAX_IDENTIFIER_LENGTH);
        if invalid_prefix {
            self.diagnostics.push(
                DiagnosticCode::InvalidIdentifier
                    .at(position, format!("Invalid identifier '{text}'")),
            );
        } else if too_long {
            self.diagnostics.push(DiagnosticCode::InvalidIdentifier.at(
                position,
                format!("Identifier '{text}' is longer than {MAX_IDENTIFIER_LENGTH} characters"),
            ));
        }
    }

    /// `AD=...` inside parentheses.
    fn try_attribute(&mut self) -> bool {
        let (Some(a), Some(b), Some('=')) = (
            self.scanner.peek(),
            self.scanner.peek_nth(1),
            self.scanner.peek_nth(2),
        ) else {
            return false;
        };
        let name: String = [a, b].iter().collect();
        let Some(kind) = AttributeKind::from_name(&name) else {
            return false;
        };
        self.scanner.advance();
        self.scanner.advance();
        self.scanner.advance();
        loop {
            match self.scanner.peek() {
                Some(q @ ('\'' | '"')) => {
                    self.scanner.advance();
                    loop {
                        match self.scanner.peek() {
                            None | Some('\n') => break,
                            Some(c) if c == q => {
                                self.scanner.advance();
                                if !self.scanner.advance_if(q) {
                                    break;
                                }
                            }
                            Some(_) => {
                                self.scanner.advance();
                            }
                        }
                    }
                }
                None | Some(')') => break,
                Some(c) if c.is_whitespace() => break,
                Some(_) => {
                    self.scanner.advance();
                }
            }
        }
        self.push(TokenKind::Attribute(kind));
        true
    }

    /// Format specs follow `(` in declarations and in `IS (..)`. Anywhere
    /// else the parenthesis opens an index list such as `#ARR(N1,2)`.
    fn type_spec_allowed(&self) -> bool {
        let [.., before, last] = self.tokens.as_slice() else {
            return false;
        };
        last.kind() == TokenKind::LParen && (self.in_define_data || before.is_keyword(Keyword::Is))
    }

    /// `A10`, `N7,2`, `P7.2`, `L` directly after `(`.
    fn try_type_spec(&mut self) -> bool {
        let Some(first) = self.scanner.peek() else {
            return false;
        };
        if DataFormat::from_char(first).is_none() {
            return false;
        }
        let mut len = first.len_utf8();
        let rest = &self.scanner.rest_of_line()[len..];
        let digits = rest.chars().take_while(char::is_ascii_digit).count();
        len += digits;
        let after_digits = &rest[digits..];
        let mut chars = after_digits.chars();
        if digits > 0 {
            if let (Some('.' | ','), Some(d)) = (chars.next(), chars.next()) {
                if d.is_ascii_digit() {
                    let fraction = after_digits[1..]
                        .chars()
                        .take_while(char::is_ascii_digit)
                        .count();
                    len += 1 + fraction;
                }
            }
        }
        let next = self.scanner.rest_of_line()[len..].chars().next();
        if next.is_some_and(|c| is_identifier_char(c) && c != '/') || matches!(next, Some('.' | '*')) {
            return false;
        }
        for _ in 0..len {
            self.scanner.advance();
        }
        self.push(TokenKind::Identifier);
        true
    }

    // -- copy code parameters ----------------------------------------------

    fn at_placeholder(&self) -> bool {
        let rest = &self.scanner.rest_of_line();
        let mut chars = rest.chars();
        if chars.next() != Some('&') {
            return false;
        }
        let digits: String = chars.clone().take_while(char::is_ascii_digit).collect();
        !digits.is_empty() && chars.nth(digits.len()) == Some('&')
    }

    /// Consume `&n&` and return the 1-based `n`.
    fn consume_placeholder(&mut self) -> usize {
        self.scanner.advance();
        let start = self.scanner.offset();
        self.scanner.advance_while(|c| c.is_ascii_digit());
        let index = self.scanner.slice(start, self.scanner.offset()).parse();
        self.scanner.advance();
        index.unwrap_or(0)
    }

    fn parameter(&self, index: usize) -> ParameterLookup<'a> {
        match self.parameters {
            None => ParameterLookup::NotACopycode,
            Some(params) => match index.checked_sub(1).and_then(|i| params.get(i)) {
                Some(param) => ParameterLookup::Found(param),
                None => ParameterLookup::Missing,
            },
        }
    }

    /// Replace a standalone `&n&` by the tokens of the parameter value.
    fn splice_parameter(&mut self, lexeme: &str, position: Position) {
        let index: usize = lexeme.trim_matches('&').parse().unwrap_or(0);
        let ParameterLookup::Found(param) = self.parameter(index) else {
            return;
        };
        let diagnostic_position = param.diagnostic_position();
        let mut value = NaturalLexer::new(position.file()).lex(&param.string_value());
        for token in value.take_tokens() {
            let spliced = SyntaxToken::new(token.kind(), token.text(), position)
                .with_diagnostic_position(diagnostic_position);
            self.tokens.push(spliced);
        }
        for diagnostic in value.take_diagnostics() {
            self.diagnostics.push(Diagnostic {
                position: diagnostic_position,
                ..diagnostic
            });
        }
    }
}

fn is_whole_placeholder(lexeme: &str) -> bool {
    let inner = lexeme.strip_prefix('&').and_then(|l| l.strip_suffix('&'));
    inner.is_some_and(|d| !d.is_empty() && d.chars().all(|c| c.is_ascii_digit()))
}

enum ParameterLookup<'a> {
    Found(&'a SyntaxToken),
    Missing,
    NotACopycode,
}

#[cfg(test)]
mod tests {
    use super::*;
    use open_mainframe_lang_core::Span;

    fn lex(source: &str) -> TokenList {
        NaturalLexer::new(FileId::MAIN).lex(source)
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).tokens().iter().map(|t| t.kind()).collect()
    }

    fn texts(source: &str) -> Vec<String> {
        lex(source).tokens().iter().map(|t| t.text().to_string()).collect()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("DEFINE DATA LOCAL #X NAME"),
            vec![
                TokenKind::Keyword(Keyword::Define),
                TokenKind::Keyword(Keyword::Data),
                TokenKind::Keyword(Keyword::Local),
                TokenKind::Identifier,
                TokenKind::Keyword(Keyword::Name),
            ]
        );
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(kinds("end-if"), vec![TokenKind::Keyword(Keyword::EndIf)]);
    }

    #[test]
    fn test_qualified_name_and_label() {
        assert_eq!(texts("#GRP.#FIELD R1. READ"), vec!["#GRP.#FIELD", "R1.", "READ"]);
        assert_eq!(
            kinds("#GRP.#FIELD R1. READ"),
            vec![
                TokenKind::Identifier,
                TokenKind::LabelIdentifier,
                TokenKind::Keyword(Keyword::Read),
            ]
        );
        assert_eq!(kinds("(R1.)")[1], TokenKind::LabelIdentifier);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(texts("1.5 2,5 1.5E+5 10"), vec!["1.5", "2,5", "1.5E+5", "10"]);
        assert_eq!(kinds("-5"), vec![TokenKind::Minus, TokenKind::NumberLiteral]);
        assert_eq!(kinds("5X 10T"), vec![TokenKind::OperandSkip, TokenKind::Tab]);
    }

    #[test]
    fn test_strings_and_literals() {
        assert_eq!(
            kinds("'ABC' \"X\" H'0A' D'2024-01-01' T'12:00' U'ü'"),
            vec![
                TokenKind::StringLiteral,
                TokenKind::StringLiteral,
                TokenKind::HexLiteral,
                TokenKind::DateLiteral,
                TokenKind::TimeLiteral,
                TokenKind::StringLiteral,
            ]
        );
        assert_eq!(texts("'IT''S'"), vec!["'IT''S'"]);
    }

    #[test]
    fn test_string_concatenation_across_lines() {
        assert_eq!(
            kinds("'ABC' -\n  'DEF' #A - 1"),
            vec![
                TokenKind::StringLiteral,
                TokenKind::StringConcat,
                TokenKind::StringLiteral,
                TokenKind::Identifier,
                TokenKind::Minus,
                TokenKind::NumberLiteral,
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let list = lex("WRITE 'ABC\nEND");
        assert_eq!(list.diagnostics().len(), 1);
        assert_eq!(list.diagnostics()[0].code, "NPL002");
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_invalid_hex() {
        let list = lex("H'0G'");
        assert_eq!(list.diagnostics()[0].code, "NPL005");
    }

    #[test]
    fn test_unknown_character_recovers() {
        let list = lex("#A ? #B");
        assert_eq!(list.diagnostics()[0].code, "NPL001");
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_attributes_are_whole_tokens() {
        assert_eq!(
            kinds("#A (AD=ODL'_' CD=RE)"),
            vec![
                TokenKind::Identifier,
                TokenKind::LParen,
                TokenKind::Attribute(AttributeKind::Ad),
                TokenKind::Attribute(AttributeKind::Cd),
                TokenKind::RParen,
            ]
        );
        assert_eq!(texts("(AD=ODL'_')")[1], "AD=ODL'_'");
        assert_eq!(texts("(EM=YYYY-MM-DD)")[1], "EM=YYYY-MM-DD");
    }

    #[test]
    fn test_type_specs() {
        assert_eq!(
            texts("DEFINE DATA LOCAL 1 #A (A10/1:10) 1 #N (N12,7) 1 #L (L) END-DEFINE")[3..],
            vec![
                "1", "#A", "(", "A10", "/", "1", ":", "10", ")", "1", "#N", "(", "N12,7", ")",
                "1", "#L", "(", "L", ")", "END-DEFINE"
            ]
        );
        assert_eq!(texts("IF #A IS (N5)")[4], "N5");
    }

    #[test]
    fn test_format_like_names_in_index_lists() {
        let source = "DEFINE DATA LOCAL\n1 N1 (I4)\nEND-DEFINE\n#X := #ARR(N1,2) #ARR(A1)\n";
        let texts = texts(source);
        let start = texts.iter().position(|t| t == "#ARR").unwrap();
        assert_eq!(
            &texts[start..],
            &["#ARR", "(", "N1", ",", "2", ")", "#ARR", "(", "A1", ")"]
        );
        assert!(texts.contains(&"I4".to_string()));
    }

    #[test]
    fn test_system_variables_and_functions() {
        assert_eq!(
            kinds("*DATX *OCC(#A) #A * 2 ** 2"),
            vec![
                TokenKind::SystemVariable,
                TokenKind::SystemFunction,
                TokenKind::LParen,
                TokenKind::Identifier,
                TokenKind::RParen,
                TokenKind::Identifier,
                TokenKind::Asterisk,
                TokenKind::NumberLiteral,
                TokenKind::Power,
                TokenKind::NumberLiteral,
            ]
        );
    }

    #[test]
    fn test_prefixed_names() {
        assert_eq!(texts("C*#ARR P*#VAR +AIV"), vec!["C*#ARR", "P*#VAR", "+AIV"]);
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds(":= = <> ^= < <= > >= + /"),
            vec![
                TokenKind::ColonEquals,
                TokenKind::Equals,
                TokenKind::NotEquals,
                TokenKind::CaretEquals,
                TokenKind::Less,
                TokenKind::LessEquals,
                TokenKind::Greater,
                TokenKind::GreaterEquals,
                TokenKind::Plus,
                TokenKind::Slash,
            ]
        );
    }

    #[test]
    fn test_comments_on_side_channel() {
        let list = lex("* header\n** box\nWRITE #A /* trailing\nEND");
        assert_eq!(list.len(), 3);
        assert_eq!(list.comments().len(), 3);
        assert_eq!(list.comments()[2].text(), "/* trailing");
    }

    #[test]
    fn test_invalid_identifiers() {
        let list = lex("# #ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789");
        let codes: Vec<_> = list.diagnostics().iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, vec!["NPL003", "NPL003"]);
    }

    #[test]
    fn test_placeholder_substitution() {
        let param = SyntaxToken::new(
            TokenKind::StringLiteral,
            "'#INNER'",
            Position::new(Span::main(20, 28), 2, 14),
        );
        let list = NaturalLexer::with_parameters(FileId(1), vec![param.clone()])
            .lex("WRITE &1& #NOPARM");
        assert_eq!(texts_of(&list), vec!["WRITE", "#INNER", "#NOPARM"]);
        let inner = &list.tokens()[1];
        assert_eq!(inner.diagnostic_position(), param.position());
        assert_eq!(inner.position().file(), FileId(1));
        assert!(list.diagnostics().is_empty());
    }

    #[test]
    fn test_placeholder_inside_identifier() {
        let param = SyntaxToken::new(
            TokenKind::StringLiteral,
            "'SUFFIX'",
            Position::new(Span::main(5, 13), 0, 5),
        );
        let list =
            NaturalLexer::with_parameters(FileId(1), vec![param]).lex("#VAR-&1& := 1");
        assert_eq!(list.tokens()[0].text(), "#VAR-SUFFIX");
        assert_eq!(list.tokens()[0].diagnostic_position().offset(), 5);
    }

    #[test]
    fn test_missing_placeholder() {
        let list = NaturalLexer::with_parameters(FileId(1), vec![]).lex("WRITE &2&");
        assert_eq!(list.diagnostics()[0].code, "NPL004");
        assert_eq!(list.tokens()[1].text(), "&2&");
        assert_eq!(list.tokens()[1].kind(), TokenKind::Identifier);
    }

    #[test]
    fn test_placeholder_without_parameters_is_plain() {
        let list = lex("WRITE &1&");
        assert!(list.diagnostics().is_empty());
        assert_eq!(list.tokens()[1].text(), "&1&");
    }

    #[test]
    fn test_lexing_is_idempotent() {
        let source = "DEFINE DATA LOCAL\n1 #A (A10)\nEND-DEFINE\nWRITE #A 5X 'X' (AD=O)\nEND\n";
        assert_eq!(lex(source).tokens(), lex(source).tokens());
    }

    #[test]
    fn test_crlf_positions() {
        let list = lex("WRITE\r\n#A");
        let a = &list.tokens()[1];
        assert_eq!((a.position().line, a.position().column), (1, 0));
    }

    fn texts_of(list: &TokenList) -> Vec<&str> {
        list.tokens().iter().map(|t| t.text()).collect()
    }
}
