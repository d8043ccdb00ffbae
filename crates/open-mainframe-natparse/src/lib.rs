// SPDX-License-Identifier: Apache-2.0
#![forbid(unsafe_code)]
//! Software AG Natural source front end: lexing, copy code expansion,
//! parsing, reference resolution and static type checks.
//!
//! This crate provides:
//!
//! - **Lexer**: scanner and tokenizer with hard/soft keywords, attribute
//!   tokens, qualified names and copy code parameter substitution
//! - **Include resolver**: splices `INCLUDE`d copy codes into the token
//!   stream and maps their diagnostics back to the include site
//! - **Parser**: error-tolerant recursive descent over `DEFINE DATA` and
//!   the structured-mode statement catalogue, building an arena syntax tree
//! - **Resolver**: binds variable, subroutine and module references and
//!   reports unresolved or ambiguous names
//! - **Checker**: type inference for operands, modifiability, format and
//!   truncation checks
//! - **Module assembly**: [`NaturalModule`], the unit handed to linters and
//!   editor tooling, plus the [`ModuleProvider`] seam and a caching provider
//!
//! # Example
//!
//! ```
//! use open_mainframe_natparse::{parse_module, EmptyProvider, FileType, ParserOptions, SourceFile};
//!
//! let source = SourceFile::new(
//!     "HELLO",
//!     FileType::Program,
//!     "DEFINE DATA LOCAL\n1 #X (A10)\nEND-DEFINE\n#X := 'HELLO'\nEND\n",
//! );
//! let module = parse_module(&source, &EmptyProvider, &ParserOptions::default());
//! assert!(module.diagnostics().is_empty());
//! ```

#[macro_use]
mod macros;

pub mod check;
pub mod config;
pub mod ddm;
pub mod diagnostics;
pub mod error;
pub mod header;
pub mod include;
pub mod lexer;
pub mod module;
pub mod parser;
pub mod pipeline;
pub mod provider;
pub mod resolve;
pub mod syntax;
pub mod token_list;
pub mod types;

pub use check::{infer_type, TypeChecker};
pub use config::ParserOptions;
pub use ddm::{DataDefinitionModule, DdmField, DescriptorKind};
pub use diagnostics::DiagnosticCode;
pub use error::{ParseError, ProviderError};
pub use header::{ProgrammingMode, SourceHeader};
pub use lexer::{Keyword, NaturalLexer, SyntaxToken, TokenKind};
pub use module::{FileType, NaturalFile, NaturalModule, SourceFile};
pub use pipeline::{lex_source, parse_module, ModuleParser};
pub use provider::{
    CachingModuleProvider, EmptyProvider, InMemoryLibrary, ModuleCache, ModuleProvider,
    SourceLibrary,
};
pub use resolve::{ReferenceResolver, Resolution};
pub use syntax::{
    Binding, Condition, DefineData, NodeId, NodeKind, Operand, Statement, SyntaxTree, Variable,
    VariableId, VariableKind, VariableScope,
};
pub use token_list::TokenList;
pub use types::{DataFormat, DataType};
