// SPDX-License-Identifier: Apache-2.0
//! Natural recursive descent parser.
//!
//! The parser consumes an include-resolved [`TokenList`] and builds a
//! [`SyntaxTree`]: first the `DEFINE DATA` block, then the statement body.
//!
//! Parsing never stops at the first problem. Sub-parsers return
//! [`ParseError`] through [`Result`]; the statement-list loop turns an error
//! into one `NPP003` diagnostic, drops the half-built nodes and resumes at
//! the next line or statement. Missing and stray block closers are
//! reported without unwinding at all.
//!
//! Copy code bodies spliced in by the include resolver become `INCLUDE`
//! statements owning the statements parsed from the spliced tokens.

mod conditions;
mod database;
mod define_data;
mod io;
mod manipulation;
mod modules;
mod operands;
mod statements;

use open_mainframe_lang_core::{Diagnostic, Position};

use crate::config::ParserOptions;
use crate::diagnostics::DiagnosticCode;
use crate::error::ParseError;
use crate::include::IncludeSite;
use crate::lexer::{Keyword, SyntaxToken, TokenKind};
use crate::module::{CalleeSet, NaturalFile};
use crate::provider::ModuleProvider;
use crate::syntax::{Binding, DefineData, NodeId, NodeKind, Statement, SymbolKind, SyntaxTree};
use crate::token_list::TokenList;

pub(crate) use modules::check_call_parameters;

/// Result type for parser operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Everything the parser produced for one module.
#[derive(Debug)]
pub struct ParsedModule {
    /// Node and declaration arenas.
    pub tree: SyntaxTree,
    /// The DEFINE DATA block, `None` when absent or unusable.
    pub define_data: Option<DefineData>,
    /// Top-level statement list, `None` when the body was not parsed.
    pub body: Option<NodeId>,
    /// Lexer, include and parser diagnostics in order.
    pub diagnostics: Vec<Diagnostic>,
    /// Comments of the module's own file.
    pub comments: Vec<SyntaxToken>,
    pub(crate) callees: CalleeSet,
}

/// The Natural parser.
pub struct Parser<'a> {
    /// Token stream with include sites.
    tokens: TokenList,
    /// Tree under construction.
    tree: SyntaxTree,
    /// Accumulated diagnostics.
    diagnostics: Vec<Diagnostic>,
    provider: &'a dyn ModuleProvider,
    options: &'a ParserOptions,
    file: &'a NaturalFile,
    /// Modules bound by CALLNAT, FETCH and USING.
    callees: CalleeSet,
    /// Next include site not yet turned into a statement.
    next_site: usize,
    /// End indices of the include bodies being parsed.
    limits: Vec<usize>,
    /// Diagnostic anchors of the include bodies being parsed.
    anchors: Vec<Position>,
    /// Closers of the enclosing blocks, innermost last.
    terminators: Vec<&'static [Keyword]>,
    /// Set once the `END` statement was parsed.
    ended: bool,
}

impl<'a> Parser<'a> {
    /// Create a parser for the module `file`.
    pub fn new(
        mut tokens: TokenList,
        file: &'a NaturalFile,
        provider: &'a dyn ModuleProvider,
        options: &'a ParserOptions,
    ) -> Self {
        let diagnostics = tokens.take_diagnostics();
        Self {
            tokens,
            tree: SyntaxTree::new(),
            diagnostics,
            provider,
            options,
            file,
            callees: CalleeSet::new(&file.referable_name),
            next_site: 0,
            limits: Vec::new(),
            anchors: Vec::new(),
            terminators: Vec::new(),
            ended: false,
        }
    }

    /// Parse the module.
    pub fn parse(mut self) -> ParsedModule {
        let file_type = self.file.file_type;
        let mut define_data = None;
        if file_type.can_have_define_data() {
            if self.at_define_data() {
                define_data = self.parse_define_data();
            } else if file_type.is_data_area() {
                let position = self.tokens.current_position();
                self.report(
                    DiagnosticCode::NoDefineDataFound,
                    position,
                    "No DEFINE DATA found",
                );
            }
        }

        let body = if self.options.parse_body && file_type.can_have_body() {
            Some(self.parse_body())
        } else {
            None
        };

        tracing::debug!(
            module = %self.file.referable_name,
            nodes = self.tree.len(),
            variables = self.tree.variable_count(),
            diagnostics = self.diagnostics.len(),
            "parsed module"
        );

        let comments = self.tokens.take_comments();
        ParsedModule {
            tree: self.tree,
            define_data,
            body,
            diagnostics: self.diagnostics,
            comments,
            callees: self.callees,
        }
    }

    fn parse_body(&mut self) -> NodeId {
        let body = self.parse_statement_list(&[]);
        if self.ended && !self.tokens.is_at_end() {
            let position = self.tokens.current_position();
            self.report(
                DiagnosticCode::CodeAfterEnd,
                position,
                "Code after END is never executed",
            );
        }
        body
    }

    fn at_define_data(&self) -> bool {
        self.check_keyword(Keyword::Define) && self.peek_keyword(1, Keyword::Data)
    }
}

// ---------------------------------------------------------------------------
// Statement lists
// ---------------------------------------------------------------------------

impl Parser<'_> {
    /// Parse statements until one of `closers` or a closer of an enclosing
    /// block. The closer itself is left for the caller.
    pub(super) fn parse_statement_list(&mut self, closers: &'static [Keyword]) -> NodeId {
        self.terminators.push(closers);
        let mut children = Vec::new();
        loop {
            if let Some(site) = self.take_include_site() {
                let include = self.parse_include_site(site);
                children.push(include);
                continue;
            }
            if self.ended || self.tokens.is_at_end() || self.at_limit() || self.at_terminator() {
                break;
            }
            if self.at_stray_closer() {
                if let Some(token) = self.tokens.advance() {
                    self.report(
                        DiagnosticCode::UnmatchedCloser,
                        token.diagnostic_position(),
                        format!("{} does not close an open block", token.upper()),
                    );
                }
                continue;
            }

            let start = self.tokens.cursor();
            let checkpoint = self.tree.checkpoint();
            match self.parse_labeled_statement() {
                Ok(statement) => children.push(statement),
                Err(err) => {
                    self.diagnostics.push(err.to_diagnostic());
                    self.tree.truncate(checkpoint);
                    self.recover(start);
                }
            }
        }
        self.terminators.pop();
        self.tree.finish(NodeKind::StatementList, children)
    }

    fn parse_labeled_statement(&mut self) -> Result<NodeId> {
        if self.check(TokenKind::LabelIdentifier) {
            let mut label = Vec::new();
            self.bump(&mut label)?;
            let statement = self.parse_statement()?;
            for id in label {
                self.tree.prepend(statement, id);
            }
            return Ok(statement);
        }
        self.parse_statement()
    }

    fn parse_statement(&mut self) -> Result<NodeId> {
        if self.is_assignment_start() {
            return self.parse_assignment();
        }
        if self.check(TokenKind::Dot) {
            return self.parse_end_statement();
        }
        self.parse_keyword_statement()
    }

    /// Skip what is left of a broken statement.
    fn recover(&mut self, start: usize) {
        if self.tokens.cursor() == start && !self.at_terminator() {
            self.tokens.advance();
        }
        while !self.tokens.is_at_end()
            && !self.at_limit()
            && !self.tokens.at_line_start()
            && !self.at_terminator()
            && !self.is_statement_start()
            && !self.at_site_start()
        {
            self.tokens.advance();
        }
        tracing::trace!(
            from = start,
            to = self.tokens.cursor(),
            "skipped tokens after parse error"
        );
    }

    fn at_terminator(&self) -> bool {
        let Some(kw) = self.tokens.peek().and_then(SyntaxToken::keyword) else {
            return false;
        };
        self.terminators.iter().any(|frame| frame.contains(&kw))
            && (!kw.is_soft() || !self.is_assignment_start())
    }

    fn at_stray_closer(&self) -> bool {
        self.tokens
            .peek()
            .and_then(SyntaxToken::keyword)
            .is_some_and(|kw| kw.is_block_closer() && kw != Keyword::EndDefine)
    }

    /// Parse a nested statement list ending at one of `closers`.
    pub(super) fn parse_block(&mut self, closers: &'static [Keyword]) -> NodeId {
        self.parse_statement_list(closers)
    }

    /// Consume `closer`, or report the block opened by `opener` as not
    /// closed.
    pub(super) fn close_block(
        &mut self,
        closer: Keyword,
        opener: &SyntaxToken,
        children: &mut Vec<NodeId>,
    ) {
        if self.accept_keyword(closer, children) {
            return;
        }
        self.report(
            DiagnosticCode::BlockNotClosed,
            opener.diagnostic_position(),
            format!("{} is not closed, expected {closer}", opener.upper()),
        );
    }
}

// ---------------------------------------------------------------------------
// Include sites
// ---------------------------------------------------------------------------

impl Parser<'_> {
    fn limit(&self) -> usize {
        self.limits.last().copied().unwrap_or(self.tokens.len())
    }

    fn at_limit(&self) -> bool {
        self.tokens.cursor() >= self.limit()
    }

    fn at_site_start(&self) -> bool {
        self.tokens
            .include_sites()
            .get(self.next_site)
            .is_some_and(|site| site.body.start == self.tokens.cursor())
    }

    fn take_include_site(&mut self) -> Option<IncludeSite> {
        let cursor = self.tokens.cursor();
        let limit = self.limit();
        loop {
            let (start, end) = {
                let site = self.tokens.include_sites().get(self.next_site)?;
                (site.body.start, site.body.end)
            };
            if start < cursor {
                // swallowed by a statement that ran across the site
                self.next_site += 1;
                continue;
            }
            if start != cursor || end > limit {
                return None;
            }
            let site = self.tokens.include_sites().get(self.next_site).cloned();
            self.next_site += 1;
            return site;
        }
    }

    fn parse_include_site(&mut self, site: IncludeSite) -> NodeId {
        let own_file = self.tokens.file();
        let anchor = match site.name_token() {
            Some(name) if name.diagnostic_position().file() == own_file => {
                name.diagnostic_position()
            }
            _ => self
                .anchors
                .last()
                .copied()
                .unwrap_or_else(|| self.tokens.current_position()),
        };

        let mut children = Vec::new();
        let mut name = None;
        let mut parameters = Vec::new();
        for (i, token) in site.directive.iter().enumerate() {
            let token = if token.diagnostic_position().file() == own_file {
                token.clone()
            } else {
                token.with_diagnostic_position(anchor)
            };
            let id = if i == 1 {
                let symbol = self.tree.symbol(token, SymbolKind::Copycode);
                if site.file.is_some() {
                    self.tree.bind(symbol, Binding::Module(site.copycode.clone()));
                }
                name = Some(symbol);
                symbol
            } else {
                self.tree.token(token)
            };
            if i >= 2 {
                parameters.push(id);
            }
            children.push(id);
        }

        let body = if site.file.is_some() {
            self.limits.push(site.body.end);
            self.anchors.push(anchor);
            let body = self.parse_statement_list(&[]);
            self.anchors.pop();
            self.limits.pop();
            children.push(body);
            Some(body)
        } else {
            None
        };

        let name = match name {
            Some(name) => name,
            None => {
                let id = self.tree.token(SyntaxToken::new(
                    TokenKind::Identifier,
                    site.copycode.clone(),
                    anchor,
                ));
                children.push(id);
                id
            }
        };
        self.finish_statement(
            Statement::Include {
                name,
                parameters,
                body,
            },
            children,
        )
    }

    /// Split a comma number at the cursor, keeping include limits in step.
    pub(super) fn split_comma_number(&mut self) {
        let at = self.tokens.cursor();
        if self.tokens.split_current_at_comma() {
            for limit in &mut self.limits {
                if *limit > at {
                    *limit += 2;
                }
            }
        }
    }
}

// ── Macro-generated dispatch ───────────────────────────────────────────────
// Statement dispatch is generated from `for_parse_dispatch!` in `macros.rs`.
// To add a new statement, add one line there and write the
// `parse_xxx_statement()` method in the matching file.

macro_rules! gen_parse_dispatch {
    ( $($kw:ident => $parse_fn:ident),* $(,)? ) => {
        impl Parser<'_> {
            fn parse_keyword_statement(&mut self) -> Result<NodeId> {
                $(
                    if self.check_keyword(Keyword::$kw) {
                        return self.$parse_fn();
                    }
                )*
                Err(self.unexpected("statement"))
            }

            /// Whether the current token starts a keyword statement.
            pub(super) fn is_statement_start(&self) -> bool {
                $(self.check_keyword(Keyword::$kw))||*
            }
        }
    };
}
for_parse_dispatch!(gen_parse_dispatch);

// ========================================================================
// UTILITY FUNCTIONS
// ========================================================================

impl Parser<'_> {
    pub(super) fn check(&self, kind: TokenKind) -> bool {
        self.tokens.at(kind)
    }

    pub(super) fn check_keyword(&self, kw: Keyword) -> bool {
        self.tokens.at_keyword(kw)
    }

    pub(super) fn peek_keyword(&self, n: usize, kw: Keyword) -> bool {
        self.tokens.at_keyword_nth(n, kw)
    }

    pub(super) fn peek_kind(&self, n: usize) -> Option<TokenKind> {
        self.tokens.peek_kind_nth(n)
    }

    /// Whether the current token is on the same line as the previous one.
    pub(super) fn same_line(&self) -> bool {
        !self.tokens.at_line_start()
    }

    /// Error for the current token.
    pub(super) fn unexpected(&self, expected: &str) -> ParseError {
        match self.tokens.peek() {
            Some(token) => ParseError::UnexpectedToken {
                found: token.text().to_string(),
                expected: expected.to_string(),
                position: token.diagnostic_position(),
            },
            None => ParseError::UnexpectedEndOfInput {
                expected: expected.to_string(),
                position: self.tokens.current_position(),
            },
        }
    }

    /// Consume the current token as a leaf of `children`.
    pub(super) fn bump(&mut self, children: &mut Vec<NodeId>) -> Result<SyntaxToken> {
        let token = self
            .tokens
            .advance()
            .ok_or_else(|| self.unexpected("more input"))?;
        children.push(self.tree.token(token.clone()));
        Ok(token)
    }

    pub(super) fn expect(
        &mut self,
        kind: TokenKind,
        expected: &str,
        children: &mut Vec<NodeId>,
    ) -> Result<SyntaxToken> {
        if self.check(kind) {
            self.bump(children)
        } else {
            Err(self.unexpected(expected))
        }
    }

    pub(super) fn expect_keyword(
        &mut self,
        kw: Keyword,
        children: &mut Vec<NodeId>,
    ) -> Result<SyntaxToken> {
        if self.check_keyword(kw) {
            self.bump(children)
        } else {
            Err(self.unexpected(kw.as_str()))
        }
    }

    pub(super) fn accept(&mut self, kind: TokenKind, children: &mut Vec<NodeId>) -> bool {
        self.check(kind) && self.bump(children).is_ok()
    }

    pub(super) fn accept_keyword(&mut self, kw: Keyword, children: &mut Vec<NodeId>) -> bool {
        self.check_keyword(kw) && self.bump(children).is_ok()
    }

    /// Consume the remaining tokens of the current line as leaves, stopping
    /// at hard keywords.
    pub(super) fn consume_rest_of_line(&mut self, children: &mut Vec<NodeId>) {
        while self.same_line() && !self.at_limit() && !self.at_site_start() {
            match self.tokens.peek() {
                Some(token) if token.keyword().is_some_and(|kw| !kw.is_soft()) => break,
                Some(_) => {
                    if self.bump(children).is_err() {
                        break;
                    }
                }
                None => break,
            }
        }
    }

    pub(super) fn finish_statement(&mut self, statement: Statement, children: Vec<NodeId>) -> NodeId {
        self.tree.finish(NodeKind::Statement(statement), children)
    }

    pub(super) fn report(
        &mut self,
        code: DiagnosticCode,
        position: Position,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(code.at(position, message));
    }
}
