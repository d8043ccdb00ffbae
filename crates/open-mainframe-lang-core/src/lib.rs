//! Shared types and traits for OpenMainframe language front ends.
//!
//! This crate provides the building blocks every language crate in the
//! workspace shares:
//!
//! - **Source location tracking**: [`FileId`], [`Span`], [`Position`],
//!   [`FileTable`], [`Location`]
//! - **Diagnostics**: [`Diagnostic`], [`Severity`], [`RelatedInformation`]
//! - **Preprocessing**: line-ending normalization and [`LineIndex`]
//! - **Pipeline traits**: [`AstNode`], [`Lexer`], [`Parse`]
//!
//! The crate has no external dependencies. Language crates add
//! `miette`/`thiserror` on top for their own error enums.

mod diagnostic;
pub mod preprocess;
mod span;
mod traits;

pub use diagnostic::{Diagnostic, RelatedInformation, Severity};
pub use preprocess::{normalize_line_endings, LineIndex, PreprocessedSource};
pub use span::{offset_to_line_col, FileId, FileTable, Location, Position, Span};
pub use traits::{AstNode, Lexer, Parse};
