// SPDX-License-Identifier: Apache-2.0
//! Module and subroutine references: CALLNAT, FETCH, PERFORM, CALL, RUN,
//! INCLUDE and DEFINE SUBROUTINE.
//!
//! CALLNAT and FETCH with a literal target are resolved while parsing: the
//! provider parses the callee's DEFINE DATA, the symbol is bound to it and
//! the passed operands are checked against its parameters.

use open_mainframe_lang_core::{Diagnostic, Position};

use super::Result;
use crate::diagnostics::DiagnosticCode;
use crate::lexer::{Keyword, TokenKind};
use crate::module::NaturalModule;
use crate::syntax::{Binding, NodeId, Operand, Statement, SymbolKind, SyntaxTree};

impl super::Parser<'_> {
    // ========================================================================
    // CALLNAT / FETCH
    // ========================================================================

    /// `CALLNAT name [operands]`.
    pub(super) fn parse_callnat_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect_keyword(Keyword::Callnat, &mut children)?;
        let module = self.parse_module_name(&mut children)?;
        let parameters = self.parse_operand_list(&[], &mut children)?;
        self.bind_module(module, &parameters);
        Ok(self.finish_statement(Statement::Callnat { module, parameters }, children))
    }

    /// `FETCH [RETURN|REPEAT] name [operands]`.
    pub(super) fn parse_fetch_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect_keyword(Keyword::Fetch, &mut children)?;
        let returns = self.accept_keyword(Keyword::Return, &mut children);
        if !returns {
            self.accept_keyword(Keyword::Repeat, &mut children);
        }
        let module = self.parse_module_name(&mut children)?;
        let parameters = self.parse_operand_list(&[], &mut children)?;
        self.bind_module(module, &parameters);
        Ok(self.finish_statement(
            Statement::Fetch {
                module,
                parameters,
                returns,
            },
            children,
        ))
    }

    /// A literal module name becomes a module symbol; anything else is an
    /// operand holding the name at run time.
    fn parse_module_name(&mut self, children: &mut Vec<NodeId>) -> Result<NodeId> {
        let module = if self.check(TokenKind::StringLiteral) {
            let Some(token) = self.tokens.advance() else {
                return Err(self.unexpected("module name"));
            };
            self.tree.symbol(token, SymbolKind::Module)
        } else {
            self.parse_operand()?
        };
        children.push(module);
        Ok(module)
    }

    /// Look up the module named by `symbol` and bind it.
    fn bind_module(&mut self, symbol: NodeId, parameters: &[NodeId]) {
        let Some(reference) = self.tree.symbol_ref(symbol) else {
            return;
        };
        let name = reference.name();
        let position = reference.token.diagnostic_position();
        match self.provider.find_module(&name) {
            Some(callee) => {
                tracing::trace!(module = %name, "bound module reference");
                self.tree
                    .bind(symbol, Binding::Module(callee.referable_name().to_string()));
                if callee.define_data().is_some() {
                    let diagnostics =
                        check_call_parameters(&callee, &self.tree, parameters, position);
                    self.diagnostics.extend(diagnostics);
                }
                self.callees.add(&callee);
            }
            None => {
                self.report(
                    DiagnosticCode::UnresolvedModule,
                    position,
                    format!("Module {name} not found"),
                );
            }
        }
    }

    // ========================================================================
    // PERFORM / CALL / RUN
    // ========================================================================

    /// `PERFORM name [operands]`.
    pub(super) fn parse_perform_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect_keyword(Keyword::Perform, &mut children)?;
        let name = match self.tokens.peek() {
            Some(token) if token.is_identifier_like() => token.clone(),
            _ => return Err(self.unexpected("subroutine name")),
        };
        self.tokens.advance();
        let subroutine = self.tree.symbol(name, SymbolKind::Subroutine);
        children.push(subroutine);
        let parameters = self.parse_operand_list(&[], &mut children)?;
        Ok(self.finish_statement(
            Statement::Perform {
                subroutine,
                parameters,
            },
            children,
        ))
    }

    /// `CALL program [operands]`.
    pub(super) fn parse_call_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect_keyword(Keyword::Call, &mut children)?;
        let program = self.parse_operand()?;
        children.push(program);
        let parameters = self.parse_operand_list(&[], &mut children)?;
        Ok(self.finish_statement(
            Statement::Call {
                program,
                parameters,
            },
            children,
        ))
    }

    /// `RUN [REPEAT] program`.
    pub(super) fn parse_run_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect_keyword(Keyword::Run, &mut children)?;
        self.accept_keyword(Keyword::Repeat, &mut children);
        let program = self.parse_operand()?;
        children.push(program);
        Ok(self.finish_statement(Statement::Run { program }, children))
    }

    // ========================================================================
    // INCLUDE / DEFINE SUBROUTINE
    // ========================================================================

    /// An `INCLUDE` the include resolver left in the stream: its copy code
    /// was not found.
    pub(super) fn parse_include_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect_keyword(Keyword::Include, &mut children)?;
        let name_token = match self.tokens.peek() {
            Some(token) if token.is_identifier_like() => token.clone(),
            _ => return Err(self.unexpected("copy code name")),
        };
        self.tokens.advance();
        let name = self.tree.symbol(name_token.clone(), SymbolKind::Copycode);
        children.push(name);
        let mut parameters = Vec::new();
        while self.check(TokenKind::StringLiteral) {
            self.bump(&mut children)?;
            parameters.extend(children.last().copied());
        }
        if self.options.resolve_includes {
            self.report(
                DiagnosticCode::UnresolvedCopycode,
                name_token.diagnostic_position(),
                format!("Copy code {} not found", name_token.upper()),
            );
        }
        Ok(self.finish_statement(
            Statement::Include {
                name,
                parameters,
                body: None,
            },
            children,
        ))
    }

    /// `DEFINE [SUBROUTINE] name ... END-SUBROUTINE`.
    pub(super) fn parse_subroutine_definition(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        let opener = self.expect_keyword(Keyword::Define, &mut children)?;
        self.accept_keyword(Keyword::Subroutine, &mut children);
        if !self.tokens.peek().is_some_and(|t| t.is_identifier_like()) {
            return Err(self.unexpected("subroutine name"));
        }
        self.bump(&mut children)?;
        let name = children[children.len() - 1];
        let body = self.parse_block(&[Keyword::EndSubroutine]);
        children.push(body);
        self.close_block(Keyword::EndSubroutine, &opener, &mut children);
        Ok(self.finish_statement(Statement::Subroutine { name, body }, children))
    }
}

// ---------------------------------------------------------------------------
// Parameter checks
// ---------------------------------------------------------------------------

/// Check the operands passed to `callee` against its level-1 parameters.
///
/// An `nX` operand skips `n` parameters; only `OPTIONAL` parameters may be
/// skipped or left out at the end.
pub(crate) fn check_call_parameters(
    callee: &NaturalModule,
    tree: &SyntaxTree,
    operands: &[NodeId],
    position: Position,
) -> Vec<Diagnostic> {
    let parameters = callee.parameters();
    let name = callee.referable_name();
    let mut diagnostics = Vec::new();

    let mut passed = 0usize;
    for operand in operands {
        let skipped = match tree.operand(*operand) {
            Some(Operand::Skip { token }) => tree
                .leaf_token(*token)
                .and_then(|t| t.skip_count())
                .map(|n| n as usize),
            _ => None,
        };
        let slots = skipped.unwrap_or(1);
        if skipped.is_some() {
            for parameter in parameters.iter().skip(passed).take(slots) {
                if !parameter.optional {
                    diagnostics.push(DiagnosticCode::PlaceholderForMandatory.at(
                        position,
                        format!(
                            "Parameter {} of {name} is not OPTIONAL and cannot be skipped",
                            parameter.name
                        ),
                    ));
                }
            }
        }
        passed += slots;
    }

    if passed > parameters.len() {
        diagnostics.push(DiagnosticCode::ParameterCountMismatch.at(
            position,
            format!(
                "{name} expects {} parameters but {passed} were passed",
                parameters.len()
            ),
        ));
    }
    for parameter in parameters.iter().skip(passed) {
        if !parameter.optional {
            diagnostics.push(DiagnosticCode::MissingMandatoryParameter.at(
                position,
                format!("Missing parameter {} of {name}", parameter.name),
            ));
        }
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use crate::config::ParserOptions;
    use crate::lexer::NaturalLexer;
    use crate::module::{FileType, NaturalFile, NaturalModule, SourceFile};
    use crate::parser::{ParsedModule, Parser};
    use crate::pipeline::parse_module;
    use crate::provider::{EmptyProvider, ModuleProvider};
    use crate::syntax::{Binding, NodeId, Statement};
    use open_mainframe_lang_core::FileId;

    struct Modules(HashMap<String, Arc<NaturalModule>>);

    impl Modules {
        fn with(sources: &[(&str, &str)]) -> Self {
            let options = ParserOptions::default().for_callee();
            let modules = sources
                .iter()
                .map(|(name, text)| {
                    let source = SourceFile::new(*name, FileType::Subprogram, *text);
                    let module = parse_module(&source, &EmptyProvider, &options);
                    (name.to_string(), Arc::new(module))
                })
                .collect();
            Modules(modules)
        }
    }

    impl ModuleProvider for Modules {
        fn find_module(&self, name: &str) -> Option<Arc<NaturalModule>> {
            self.0.get(name).cloned()
        }
    }

    const SUBPROGRAM: &str = "DEFINE DATA PARAMETER\n1 #P1 (A10)\n1 #P2 (N5) OPTIONAL\n1 #P3 (L)\nEND-DEFINE\nEND\n";

    fn parse(source: &str, provider: &dyn ModuleProvider) -> ParsedModule {
        let file = SourceFile::new("CALLER", FileType::Program, source);
        let tokens = NaturalLexer::new(FileId::MAIN).lex(&file.text);
        let natural = NaturalFile::for_source(&file, tokens.tokens());
        let options = ParserOptions::default();
        Parser::new(tokens, &natural, provider, &options).parse()
    }

    fn codes(parsed: &ParsedModule) -> Vec<String> {
        parsed.diagnostics.iter().map(|d| d.code.clone()).collect()
    }

    #[test]
    fn test_callnat_binds_callee() {
        let modules = Modules::with(&[("SUB", SUBPROGRAM)]);
        let parsed = parse("CALLNAT 'SUB' #A #B #C\nEND\n", &modules);
        assert!(codes(&parsed).is_empty(), "{:?}", codes(&parsed));
        let tree = &parsed.tree;
        let module = (0..tree.len() as u32).find_map(|id| match tree.statement(NodeId(id)) {
            Some(Statement::Callnat { module, parameters }) => {
                assert_eq!(parameters.len(), 3);
                Some(*module)
            }
            _ => None,
        });
        let binding = module.and_then(|m| tree.binding(m));
        assert_eq!(binding, Some(&Binding::Module("SUB".to_string())));
        assert_eq!(parsed.callees.into_vec().len(), 1);
    }

    #[test]
    fn test_parameter_checks() {
        let modules = Modules::with(&[("SUB", SUBPROGRAM)]);

        let parsed = parse("CALLNAT 'SUB' #A 1X #C\nEND\n", &modules);
        assert!(codes(&parsed).is_empty(), "{:?}", codes(&parsed));

        let parsed = parse("CALLNAT 'SUB' #A\nEND\n", &modules);
        assert_eq!(codes(&parsed), vec!["NPP020"]);

        let parsed = parse("CALLNAT 'SUB' #A #B #C #D\nEND\n", &modules);
        assert_eq!(codes(&parsed), vec!["NPP019"]);

        let parsed = parse("CALLNAT 'SUB' 2X #C\nEND\n", &modules);
        assert_eq!(codes(&parsed), vec!["NPP021"]);
    }

    #[test]
    fn test_unknown_module_is_a_warning() {
        let parsed = parse("CALLNAT 'DOES-NOT-EXIST' #A\nFETCH RETURN 'NOPE'\nEND\n", &EmptyProvider);
        assert_eq!(codes(&parsed), vec!["NPP017", "NPP017"]);
        assert!(parsed.diagnostics.iter().all(|d| d.is_warning()));
    }

    #[test]
    fn test_perform_and_subroutine() {
        let parsed = parse(
            "PERFORM CALC #A\nDEFINE SUBROUTINE CALC\n  ADD 1 TO #A\nEND-SUBROUTINE\nCALL 'EXTPROG' #A\nRUN 'OTHER'\nEND\n",
            &EmptyProvider,
        );
        assert!(codes(&parsed).is_empty(), "{:?}", codes(&parsed));
        let tree = &parsed.tree;
        let all: Vec<_> = (0..tree.len() as u32)
            .filter_map(|id| tree.statement(NodeId(id)).cloned())
            .collect();
        assert!(all.iter().any(|s| matches!(s, Statement::Perform { parameters, .. } if parameters.len() == 1)));
        assert!(all.iter().any(|s| matches!(s, Statement::Subroutine { .. })));
        assert!(all.iter().any(|s| matches!(s, Statement::Call { .. })));
        assert!(all.iter().any(|s| matches!(s, Statement::Run { .. })));
    }

    #[test]
    fn test_unresolved_include() {
        let parsed = parse("INCLUDE MISSING 'A'\nEND\n", &EmptyProvider);
        assert_eq!(codes(&parsed), vec!["NPP016"]);
    }
}
