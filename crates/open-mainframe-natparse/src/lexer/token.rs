// SPDX-License-Identifier: Apache-2.0
//! Token kinds, keywords and the [`SyntaxToken`] value.

use std::fmt;

use open_mainframe_lang_core::{FileId, Position, Span};

// ---------------------------------------------------------------------------
// Keywords
// ---------------------------------------------------------------------------

macro_rules! gen_keyword_enum {
    (
        @hard { $($hard:ident => $hard_str:literal),* $(,)? }
        @soft { $($soft:ident => $soft_str:literal),* $(,)? }
    ) => {
        /// A Natural keyword.
        ///
        /// Generated from the master table in `macros.rs`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Keyword {
            $(
                #[doc = concat!("`", $hard_str, "`")]
                $hard,
            )*
            $(
                #[doc = concat!("`", $soft_str, "` (soft)")]
                $soft,
            )*
        }

        impl Keyword {
            /// Canonical spelling.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Keyword::$hard => $hard_str,)*
                    $(Keyword::$soft => $soft_str,)*
                }
            }

            /// Soft keywords may also name a variable.
            pub fn is_soft(self) -> bool {
                match self {
                    $(Keyword::$hard => false,)*
                    $(Keyword::$soft => true,)*
                }
            }

            /// Look up an upper-case word.
            pub fn lookup(upper: &str) -> Option<Keyword> {
                match upper {
                    $($hard_str => Some(Keyword::$hard),)*
                    $($soft_str => Some(Keyword::$soft),)*
                    _ => None,
                }
            }
        }
    };
}
for_all_keywords!(gen_keyword_enum);

impl Keyword {
    /// Keywords that close a block (`END-IF`, `END-FOR`, ...).
    pub fn is_block_closer(self) -> bool {
        self.as_str().starts_with("END-")
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// Kind of an attribute token such as `AD=ODL` or `EM=YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Attribute definition.
    Ad,
    /// Alphanumeric length.
    Al,
    /// Color definition.
    Cd,
    /// Control variable.
    Cv,
    /// Date format.
    Df,
    /// Dynamic attributes.
    Dy,
    /// Edit mask.
    Em,
    /// Empty line suppression.
    Es,
    /// Floating point mantissa length.
    Fl,
    /// Header centering.
    Hc,
    /// Header definition.
    Hd,
    /// Insertion character.
    Ic,
    /// Input prompting.
    Ip,
    /// Identical suppress.
    Is,
    /// Leading characters.
    Lc,
    /// Line size.
    Ls,
    /// Multiple-value count.
    Mc,
    /// Numeric length.
    Nl,
    /// Print mode.
    Pm,
    /// Page size.
    Ps,
    /// Sign position.
    Sg,
    /// Trailing characters.
    Tc,
    /// Zero printing.
    Zp,
}

impl AttributeKind {
    /// Parse the two-letter attribute name.
    pub fn from_name(name: &str) -> Option<AttributeKind> {
        Some(match name.to_ascii_uppercase().as_str() {
            "AD" => AttributeKind::Ad,
            "AL" => AttributeKind::Al,
            "CD" => AttributeKind::Cd,
            "CV" => AttributeKind::Cv,
            "DF" => AttributeKind::Df,
            "DY" => AttributeKind::Dy,
            "EM" => AttributeKind::Em,
            "ES" => AttributeKind::Es,
            "FL" => AttributeKind::Fl,
            "HC" => AttributeKind::Hc,
            "HD" => AttributeKind::Hd,
            "IC" => AttributeKind::Ic,
            "IP" => AttributeKind::Ip,
            "IS" => AttributeKind::Is,
            "LC" => AttributeKind::Lc,
            "LS" => AttributeKind::Ls,
            "MC" => AttributeKind::Mc,
            "NL" => AttributeKind::Nl,
            "PM" => AttributeKind::Pm,
            "PS" => AttributeKind::Ps,
            "SG" => AttributeKind::Sg,
            "TC" => AttributeKind::Tc,
            "ZP" => AttributeKind::Zp,
            _ => return None,
        })
    }
}

// ---------------------------------------------------------------------------
// Token kinds
// ---------------------------------------------------------------------------

/// Syntax category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Variable, module or field name (`#NAME`, `GROUP.FIELD`, `C*#ARR`).
    Identifier,
    /// Statement label (`R1.`).
    LabelIdentifier,
    /// Keyword; see [`Keyword::is_soft`].
    Keyword(Keyword),
    /// `'text'`, `"text"` or `U'text'`.
    StringLiteral,
    /// `H'0A0B'`.
    HexLiteral,
    /// `123`, `1.5`, `1,5`, `1.5E+3`.
    NumberLiteral,
    /// `D'2024-01-31'`.
    DateLiteral,
    /// `T'12:00:00'` or `E'...'`.
    TimeLiteral,
    /// `*DATX`, `*USER`.
    SystemVariable,
    /// `*OCC`, `*TRIM`.
    SystemFunction,
    /// Whole attribute such as `AD=ODL'_'`.
    Attribute(AttributeKind),
    /// `nX` output column skip or parameter placeholder.
    OperandSkip,
    /// `nT` output tab position.
    Tab,
    /// `:=`
    ColonEquals,
    /// `=`
    Equals,
    /// `<>`
    NotEquals,
    /// `^=`
    CaretEquals,
    /// `<`
    Less,
    /// `<=`
    LessEquals,
    /// `>`
    Greater,
    /// `>=`
    GreaterEquals,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Asterisk,
    /// `/`
    Slash,
    /// `**`
    Power,
    /// `-` joining two string literals.
    StringConcat,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `.` not part of a name or label.
    Dot,
    /// Comment text (side channel only).
    Comment,
    /// Character the lexer could not classify.
    Unknown,
}

impl TokenKind {
    /// Any literal kind.
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::StringLiteral
                | TokenKind::HexLiteral
                | TokenKind::NumberLiteral
                | TokenKind::DateLiteral
                | TokenKind::TimeLiteral
                | TokenKind::Keyword(Keyword::True)
                | TokenKind::Keyword(Keyword::False)
        )
    }

    /// Relational operator symbols.
    pub fn is_comparison_symbol(self) -> bool {
        matches!(
            self,
            TokenKind::Equals
                | TokenKind::NotEquals
                | TokenKind::CaretEquals
                | TokenKind::Less
                | TokenKind::LessEquals
                | TokenKind::Greater
                | TokenKind::GreaterEquals
        )
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// An immutable lexed token.
///
/// `position` is where the text sits in its own file. Tokens spliced in from
/// a copy code additionally carry a `diagnostic_position` in the including
/// file; diagnostics and rename edits use [`SyntaxToken::diagnostic_position`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxToken {
    kind: TokenKind,
    text: String,
    position: Position,
    diagnostic_position: Option<Position>,
}

impl SyntaxToken {
    /// Create a token.
    pub fn new(kind: TokenKind, text: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
            diagnostic_position: None,
        }
    }

    /// Token kind.
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Source text as written.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Upper-case source text.
    pub fn upper(&self) -> String {
        self.text.to_ascii_uppercase()
    }

    /// Position in the token's own file.
    pub fn position(&self) -> Position {
        self.position
    }

    /// File the token was lexed from.
    pub fn file(&self) -> FileId {
        self.position.file()
    }

    /// Position to report diagnostics at.
    pub fn diagnostic_position(&self) -> Position {
        self.diagnostic_position.unwrap_or(self.position)
    }

    /// Whether a diagnostic position was assigned explicitly.
    pub fn has_remapped_position(&self) -> bool {
        self.diagnostic_position.is_some()
    }

    /// Same token reported at `position`.
    pub fn with_diagnostic_position(&self, position: Position) -> SyntaxToken {
        SyntaxToken {
            diagnostic_position: Some(position),
            ..self.clone()
        }
    }

    /// Whether this is the keyword `kw`.
    pub fn is_keyword(&self, kw: Keyword) -> bool {
        self.kind == TokenKind::Keyword(kw)
    }

    /// Keyword, if any.
    pub fn keyword(&self) -> Option<Keyword> {
        match self.kind {
            TokenKind::Keyword(kw) => Some(kw),
            _ => None,
        }
    }

    /// Identifier or soft keyword, i.e. something that can name a variable.
    pub fn is_identifier_like(&self) -> bool {
        match self.kind {
            TokenKind::Identifier => true,
            TokenKind::Keyword(kw) => kw.is_soft(),
            _ => false,
        }
    }

    /// Text of a string literal without quotes, with doubled quotes
    /// collapsed. Other tokens return their text unchanged.
    pub fn string_value(&self) -> String {
        if self.kind != TokenKind::StringLiteral {
            return self.text.clone();
        }
        let text = self.text.strip_prefix(['U', 'u']).unwrap_or(&self.text);
        let mut chars = text.chars();
        let quote = match chars.next() {
            Some(q @ ('\'' | '"')) => q,
            _ => return text.to_string(),
        };
        let inner = chars.as_str();
        let inner = inner.strip_suffix(quote).unwrap_or(inner);
        let doubled: String = [quote, quote].iter().collect();
        inner.replace(&doubled, &quote.to_string())
    }

    /// Number of repeat count in front of `X`/`T` for `nX` and `nT`.
    pub fn skip_count(&self) -> Option<u32> {
        match self.kind {
            TokenKind::OperandSkip | TokenKind::Tab => {
                self.text[..self.text.len().saturating_sub(1)].parse().ok()
            }
            _ => None,
        }
    }

    /// Split a number literal written with a comma (`1,2`) into the two
    /// numbers it also reads as inside index and bound lists.
    pub fn split_at_comma(&self) -> Option<(SyntaxToken, SyntaxToken)> {
        if self.kind != TokenKind::NumberLiteral {
            return None;
        }
        let idx = self.text.find(',')?;
        let pos = self.position;
        let left_end = pos.offset() + idx as u32;
        let left = Position::new(
            Span::new(pos.file(), pos.offset(), left_end),
            pos.line,
            pos.column,
        );
        let right = Position::new(
            Span::new(pos.file(), left_end + 1, pos.end()),
            pos.line,
            pos.column + idx as u32 + 1,
        );
        let mut first = SyntaxToken::new(TokenKind::NumberLiteral, &self.text[..idx], left);
        let mut second =
            SyntaxToken::new(TokenKind::NumberLiteral, &self.text[idx + 1..], right);
        first.diagnostic_position = self.diagnostic_position;
        second.diagnostic_position = self.diagnostic_position;
        Some((first, second))
    }
}

impl fmt::Display for SyntaxToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(kind: TokenKind, text: &str) -> SyntaxToken {
        let len = text.len() as u32;
        SyntaxToken::new(kind, text, Position::new(Span::main(0, len), 0, 0))
    }

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(Keyword::lookup("END-DEFINE"), Some(Keyword::EndDefine));
        assert_eq!(Keyword::lookup("NAME"), Some(Keyword::Name));
        assert_eq!(Keyword::lookup("#NAME"), None);
        assert!(Keyword::Name.is_soft());
        assert!(!Keyword::If.is_soft());
        assert!(Keyword::EndIf.is_block_closer());
        assert_eq!(Keyword::Callnat.as_str(), "CALLNAT");
    }

    #[test]
    fn test_string_value() {
        assert_eq!(tok(TokenKind::StringLiteral, "'#INNER'").string_value(), "#INNER");
        assert_eq!(tok(TokenKind::StringLiteral, "'IT''S'").string_value(), "IT'S");
        assert_eq!(tok(TokenKind::StringLiteral, "U'abc'").string_value(), "abc");
        assert_eq!(tok(TokenKind::StringLiteral, "\"x\"").string_value(), "x");
    }

    #[test]
    fn test_diagnostic_position_defaults_to_position() {
        let t = tok(TokenKind::Identifier, "#A");
        assert_eq!(t.diagnostic_position(), t.position());
        let moved = Position::new(Span::new(FileId(2), 5, 7), 3, 1);
        let r = t.with_diagnostic_position(moved);
        assert_eq!(r.diagnostic_position(), moved);
        assert_eq!(r.position(), t.position());
        assert!(!t.has_remapped_position());
    }

    #[test]
    fn test_split_at_comma() {
        let t = tok(TokenKind::NumberLiteral, "10,5");
        let (a, b) = t.split_at_comma().unwrap();
        assert_eq!(a.text(), "10");
        assert_eq!(b.text(), "5");
        assert_eq!(b.position().offset(), 3);
        assert_eq!(b.position().column, 3);
        assert!(tok(TokenKind::NumberLiteral, "10").split_at_comma().is_none());
    }

    #[test]
    fn test_skip_count() {
        assert_eq!(tok(TokenKind::OperandSkip, "5X").skip_count(), Some(5));
        assert_eq!(tok(TokenKind::Tab, "12T").skip_count(), Some(12));
        assert_eq!(tok(TokenKind::Identifier, "5X").skip_count(), None);
    }
}
