//! Shared traits for language pipelines.
//!
//! These traits define the common interface that language crates implement,
//! so that generic tooling (assessment, editor integration) can drive
//! different front ends without knowing their details.

use crate::span::Position;

/// Trait for syntax nodes that carry source location information.
///
/// # Example
///
/// ```
/// use open_mainframe_lang_core::{AstNode, Position};
///
/// struct Module {
///     position: Position,
/// }
///
/// impl AstNode for Module {
///     fn position(&self) -> Option<Position> {
///         Some(self.position)
///     }
/// }
/// ```
pub trait AstNode {
    /// Source position covering the node, `None` when it covers no source
    /// (an empty block, an empty file).
    fn position(&self) -> Option<Position>;
}

/// Common interface for language-specific lexers.
///
/// Lexers never fail: problems are returned next to the tokens and
/// scanning continues to the end of the input.
pub trait Lexer {
    /// The token type produced by this lexer.
    type Token;
    /// The error type produced by this lexer.
    type Error;

    /// Tokenize the given source text.
    fn tokenize(&mut self, source: &str) -> (Vec<Self::Token>, Vec<Self::Error>);
}

/// Common interface for language-specific parsers.
///
/// Returns `(Option<Ast>, Vec<Error>)`. The AST is `None` only if nothing
/// usable could be built; otherwise a partial AST is returned alongside
/// the accumulated errors.
pub trait Parse {
    /// The AST root type produced by this parser.
    type Ast: AstNode;
    /// The error type produced by this parser.
    type Error;

    /// Parse the input held by the parser.
    fn parse(&mut self) -> (Option<Self::Ast>, Vec<Self::Error>);
}
