// SPDX-License-Identifier: Apache-2.0
//! Module pipeline: lex, expand includes, parse, resolve, check, assemble.
//!
//! Every stage reports into one diagnostic list; none of them aborts the
//! pipeline. [`parse_module`] always returns a module.

use open_mainframe_lang_core::{Diagnostic, FileId, FileTable, Parse};

use crate::check::check_module;
use crate::config::ParserOptions;
use crate::header::SourceHeader;
use crate::include::resolve_includes;
use crate::lexer::NaturalLexer;
use crate::module::{NaturalFile, NaturalModule, SourceFile};
use crate::parser::{ParsedModule, Parser};
use crate::provider::ModuleProvider;
use crate::resolve::ReferenceResolver;
use crate::token_list::TokenList;

/// Lex `source` and, when enabled, expand its `INCLUDE` directives.
///
/// Returns the token stream and the table of files the tokens come from
/// (the source itself is [`FileId::MAIN`]).
pub fn lex_source(
    source: &SourceFile,
    provider: &dyn ModuleProvider,
    options: &ParserOptions,
) -> (TokenList, FileTable) {
    let mut files = FileTable::new(source.path.clone());
    let tokens = NaturalLexer::new(FileId::MAIN).lex(&source.text);
    let tokens = if options.resolve_includes {
        resolve_includes(tokens, provider, &mut files, options)
    } else {
        tokens
    };
    (tokens, files)
}

/// Parse one module through every stage enabled in `options`.
pub fn parse_module(
    source: &SourceFile,
    provider: &dyn ModuleProvider,
    options: &ParserOptions,
) -> NaturalModule {
    let span = tracing::debug_span!("parse_module", module = %source.name);
    let _guard = span.enter();

    let (tokens, files) = lex_source(source, provider, options);
    let header = SourceHeader::from_comments(tokens.comments());
    let file = NaturalFile::for_source(source, tokens.tokens());

    let ParsedModule {
        mut tree,
        define_data,
        body,
        mut diagnostics,
        comments,
        mut callees,
    } = Parser::new(tokens, &file, provider, options).parse();

    if options.resolve_references {
        let resolution = ReferenceResolver::new(&mut tree, &file, provider, options)
            .resolve(define_data.as_ref(), body);
        diagnostics.extend(resolution.diagnostics);
        for callee in &resolution.callees {
            callees.add(callee);
        }
    }

    if options.check_types {
        diagnostics.extend(check_module(&tree, define_data.as_ref(), body));
    }

    tracing::debug!(
        module = %file.referable_name,
        errors = diagnostics.iter().filter(|d| d.is_error()).count(),
        warnings = diagnostics.iter().filter(|d| d.is_warning()).count(),
        "module ready"
    );

    NaturalModule::builder(file)
        .with_header(header)
        .with_define_data(define_data)
        .with_body(body)
        .with_tree(tree)
        .with_diagnostics(diagnostics)
        .with_comments(comments)
        .with_files(files)
        .with_callees(callees.into_vec())
        .build()
}

/// [`Parse`] adapter over [`parse_module`].
pub struct ModuleParser<'a> {
    source: &'a SourceFile,
    provider: &'a dyn ModuleProvider,
    options: ParserOptions,
}

impl<'a> ModuleParser<'a> {
    /// Parser for `source` with default options.
    pub fn new(source: &'a SourceFile, provider: &'a dyn ModuleProvider) -> Self {
        Self {
            source,
            provider,
            options: ParserOptions::default(),
        }
    }

    /// Builder: options.
    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }
}

impl Parse for ModuleParser<'_> {
    type Ast = NaturalModule;
    type Error = Diagnostic;

    fn parse(&mut self) -> (Option<NaturalModule>, Vec<Diagnostic>) {
        let module = parse_module(self.source, self.provider, &self.options);
        let diagnostics = module.diagnostics().to_vec();
        (Some(module), diagnostics)
    }
}
