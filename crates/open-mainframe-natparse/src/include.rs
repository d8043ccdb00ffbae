// SPDX-License-Identifier: Apache-2.0
//! Copy code expansion.
//!
//! Every `INCLUDE name ['param' ...]` directive whose copy code the provider
//! can supply is replaced in place by the lexed, recursively expanded tokens
//! of that copy code. The directive tokens move to the hidden channel and an
//! [`IncludeSite`] records where the body landed.
//!
//! Spliced tokens keep their own position inside the copy code. Their
//! diagnostic position is rewritten to the directive's name token, except
//! for tokens substituted from a parameter, which already point at the
//! parameter literal in the including file.
//!
//! Unknown copy codes leave the directive in the primary stream; the parser
//! reports them when it reaches the `INCLUDE` statement.

use std::ops::Range;

use open_mainframe_lang_core::{FileId, FileTable};

use crate::config::ParserOptions;
use crate::diagnostics::DiagnosticCode;
use crate::lexer::{Keyword, NaturalLexer, SyntaxToken, TokenKind};
use crate::provider::ModuleProvider;
use crate::token_list::TokenList;

/// An expanded `INCLUDE` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeSite {
    /// Upper-case copy code name.
    pub copycode: String,
    /// `INCLUDE`, the name token and the parameter literals.
    pub directive: Vec<SyntaxToken>,
    /// Indices of the spliced tokens in the primary stream.
    pub body: Range<usize>,
    /// File the copy code was lexed as; `None` when expansion was refused.
    pub file: Option<FileId>,
}

impl IncludeSite {
    /// The copy code name token.
    pub fn name_token(&self) -> Option<&SyntaxToken> {
        self.directive.get(1)
    }
}

/// Expand all includes of `list`.
pub fn resolve_includes(
    list: TokenList,
    provider: &dyn ModuleProvider,
    files: &mut FileTable,
    options: &ParserOptions,
) -> TokenList {
    let mut resolver = IncludeResolver {
        provider,
        files,
        max_depth: options.max_include_depth,
        stack: Vec::new(),
    };
    resolver.expand(list, 0)
}

struct IncludeResolver<'a> {
    provider: &'a dyn ModuleProvider,
    files: &'a mut FileTable,
    max_depth: usize,
    stack: Vec<String>,
}

fn is_copycode_name(token: &SyntaxToken) -> bool {
    matches!(token.kind(), TokenKind::Identifier | TokenKind::Keyword(_))
}

impl IncludeResolver<'_> {
    fn expand(&mut self, mut list: TokenList, depth: usize) -> TokenList {
        let file = list.file();
        let mut hidden = list.hidden().to_vec();
        let comments = list.take_comments();
        let mut diagnostics = list.take_diagnostics();
        let tokens = list.take_tokens();

        let mut out = Vec::with_capacity(tokens.len());
        let mut sites = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let token = &tokens[i];
            let is_directive = token.is_keyword(Keyword::Include)
                && tokens.get(i + 1).is_some_and(is_copycode_name);
            if !is_directive {
                out.push(token.clone());
                i += 1;
                continue;
            }

            let mut end = i + 2;
            while tokens
                .get(end)
                .is_some_and(|t| t.kind() == TokenKind::StringLiteral)
            {
                end += 1;
            }
            let directive = tokens[i..end].to_vec();
            let name_token = tokens[i + 1].clone();
            let name = name_token.upper();
            let anchor = name_token.diagnostic_position();

            if self.stack.contains(&name) || depth >= self.max_depth {
                let message = if self.stack.contains(&name) {
                    format!("Copy code {name} includes itself")
                } else {
                    format!("Copy code nesting deeper than {} levels", self.max_depth)
                };
                diagnostics.push(DiagnosticCode::IncludeTooDeep.at(anchor, message));
                sites.push(IncludeSite {
                    copycode: name,
                    directive: directive.clone(),
                    body: out.len()..out.len(),
                    file: None,
                });
                hidden.extend(directive);
                i = end;
                continue;
            }

            let Some(source) = self.provider.find_copycode_source(&name) else {
                tracing::debug!(copycode = %name, "copy code not found");
                out.extend(directive);
                i = end;
                continue;
            };

            tracing::debug!(copycode = %name, depth, "expanding include");
            let copy_file = self.files.intern(&source.path);
            let parameters = tokens[i + 2..end].to_vec();
            let lexed = NaturalLexer::with_parameters(copy_file, parameters).lex(&source.text);
            self.stack.push(name.clone());
            let mut expanded = self.expand(lexed, depth + 1);
            self.stack.pop();

            let start = out.len();
            for site in expanded.include_sites() {
                let mut site = site.clone();
                site.body = site.body.start + start..site.body.end + start;
                sites.push(site);
            }
            for diagnostic in expanded.take_diagnostics() {
                if diagnostic.position.file() == file {
                    diagnostics.push(diagnostic);
                } else {
                    let original = diagnostic.position;
                    let mut remapped = diagnostic.with_related(original, format!("in copy code {name}"));
                    remapped.position = anchor;
                    diagnostics.push(remapped);
                }
            }
            hidden.extend(expanded.hidden().iter().cloned());
            for spliced in expanded.take_tokens() {
                if spliced.diagnostic_position().file() == file {
                    out.push(spliced);
                } else {
                    out.push(spliced.with_diagnostic_position(anchor));
                }
            }
            sites.push(IncludeSite {
                copycode: name,
                directive: directive.clone(),
                body: start..out.len(),
                file: Some(copy_file),
            });
            hidden.extend(directive);
            i = end;
        }

        TokenList::resolved(file, out, hidden, comments, diagnostics, sites)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{FileType, SourceFile};

    struct Copycodes(Vec<SourceFile>);

    impl ModuleProvider for Copycodes {
        fn find_copycode_source(&self, name: &str) -> Option<SourceFile> {
            self.0.iter().find(|s| s.name.eq_ignore_ascii_case(name)).cloned()
        }
    }

    fn provider(sources: &[(&str, &str)]) -> Copycodes {
        Copycodes(
            sources
                .iter()
                .map(|(name, text)| SourceFile::new(*name, FileType::Copycode, *text))
                .collect(),
        )
    }

    fn expand(source: &str, copycodes: &Copycodes) -> (TokenList, FileTable) {
        let mut files = FileTable::new("MAIN.NSP");
        let list = NaturalLexer::new(FileId::MAIN).lex(source);
        let list = resolve_includes(list, copycodes, &mut files, &ParserOptions::default());
        (list, files)
    }

    fn texts(list: &TokenList) -> Vec<&str> {
        list.tokens().iter().map(|t| t.text()).collect()
    }

    #[test]
    fn test_parameter_substitution() {
        let copycodes = provider(&[("MYCC", "WRITE &1& #NOPARM")]);
        let (list, files) = expand("INCLUDE MYCC '#INNER'\nEND", &copycodes);
        assert_eq!(texts(&list), vec!["WRITE", "#INNER", "#NOPARM", "END"]);

        let param_pos = NaturalLexer::new(FileId::MAIN).lex("INCLUDE MYCC '#INNER'").tokens()[2].position();
        let name_pos = NaturalLexer::new(FileId::MAIN).lex("INCLUDE MYCC").tokens()[1].position();
        assert_eq!(list.tokens()[1].diagnostic_position(), param_pos);
        assert_eq!(list.tokens()[0].diagnostic_position(), name_pos);
        assert_eq!(list.tokens()[2].diagnostic_position(), name_pos);
        assert_eq!(list.tokens()[0].position().file(), FileId(1));
        assert_eq!(files.len(), 2);

        assert_eq!(list.hidden().len(), 3);
        let site = &list.include_sites()[0];
        assert_eq!(site.copycode, "MYCC");
        assert_eq!(site.body, 0..3);
    }

    #[test]
    fn test_unknown_copycode_stays_in_stream() {
        let (list, _) = expand("INCLUDE NOPE\nEND", &provider(&[]));
        assert_eq!(texts(&list), vec!["INCLUDE", "NOPE", "END"]);
        assert!(list.include_sites().is_empty());
        assert!(list.diagnostics().is_empty());
    }

    #[test]
    fn test_nested_includes_point_at_outer_site() {
        let copycodes = provider(&[("OUTER", "INCLUDE INNER\n#A := 1"), ("INNER", "#B := 2")]);
        let (list, _) = expand("INCLUDE OUTER\nEND", &copycodes);
        assert_eq!(texts(&list), vec!["#B", ":=", "2", "#A", ":=", "1", "END"]);
        let outer_name = list.include_sites()[0].name_token().map(|t| t.position());
        for token in &list.tokens()[..6] {
            assert_eq!(Some(token.diagnostic_position()), outer_name);
        }
        let ranges: Vec<_> = list.include_sites().iter().map(|s| s.body.clone()).collect();
        assert_eq!(ranges, vec![0..6, 0..3]);
    }

    #[test]
    fn test_recursive_include_is_refused() {
        let copycodes = provider(&[("LOOP", "INCLUDE LOOP\n#A := 1")]);
        let (list, _) = expand("INCLUDE LOOP", &copycodes);
        assert_eq!(texts(&list), vec!["#A", ":=", "1"]);
        let codes: Vec<_> = list.diagnostics().iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, vec!["NPP022"]);
        assert_eq!(list.diagnostics()[0].position.file(), FileId::MAIN);
    }

    #[test]
    fn test_copycode_lex_errors_are_remapped() {
        let copycodes = provider(&[("BAD", "WRITE 'OPEN")]);
        let (list, _) = expand("INCLUDE BAD", &copycodes);
        let diagnostic = &list.diagnostics()[0];
        assert_eq!(diagnostic.code, "NPL002");
        assert_eq!(diagnostic.position.file(), FileId::MAIN);
        assert_eq!(diagnostic.related.len(), 1);
    }

    #[test]
    fn test_expansion_is_deterministic() {
        let copycodes = provider(&[("MYCC", "WRITE &1& #NOPARM")]);
        let (a, _) = expand("INCLUDE MYCC '#X'\nINCLUDE MYCC '#Y'", &copycodes);
        let (b, _) = expand("INCLUDE MYCC '#X'\nINCLUDE MYCC '#Y'", &copycodes);
        assert_eq!(a.tokens(), b.tokens());
        assert_eq!(a.include_sites(), b.include_sites());
    }
}
