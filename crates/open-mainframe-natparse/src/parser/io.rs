// SPDX-License-Identifier: Apache-2.0
//! Report, terminal, work file, printer and document parsing statements.

use super::Result;
use crate::lexer::{Keyword, TokenKind};
use crate::syntax::{
    NodeId, OutputKind, ParseKind, PrinterKind, Statement, WorkFileKind,
};

/// Clause keywords of `PARSE ... INTO`.
const PARSE_TARGETS: &[Keyword] = &[
    Keyword::Path,
    Keyword::Name,
    Keyword::Value,
    Keyword::Giving,
    Keyword::Subcode,
];

impl super::Parser<'_> {
    // ========================================================================
    // REPORT OUTPUT
    // ========================================================================

    /// `WRITE|DISPLAY|PRINT [(rep)] [NOTITLE] [NOHDR] [TITLE|TRAILER ...] operands`,
    /// or `WRITE WORK FILE`.
    pub(super) fn parse_output_statement(&mut self) -> Result<NodeId> {
        if self.check_keyword(Keyword::Write) && self.peek_keyword(1, Keyword::Work) {
            return self.parse_write_work_file();
        }
        let kind = match self.tokens.peek_kind() {
            Some(TokenKind::Keyword(Keyword::Display)) => OutputKind::Display,
            Some(TokenKind::Keyword(Keyword::Print)) => OutputKind::Print,
            _ => OutputKind::Write,
        };
        let mut children = Vec::new();
        self.bump(&mut children)?;

        let mut report = None;
        if self.check(TokenKind::LParen) && self.same_line() && !self.peek_attribute(1) {
            self.bump(&mut children)?;
            self.bump(&mut children)?;
            report = children.last().copied();
            self.expect(TokenKind::RParen, ")", &mut children)?;
        }
        loop {
            if self.accept_keyword(Keyword::Notitle, &mut children)
                || self.accept_keyword(Keyword::Nohdr, &mut children)
            {
                continue;
            }
            let heading = Self::is_word(self.tokens.peek(), "TITLE")
                || Self::is_word(self.tokens.peek(), "TRAILER");
            if heading && self.same_line() {
                self.bump(&mut children)?;
                while Self::is_word(self.tokens.peek(), "UNDERLINED")
                    || self.check_keyword(Keyword::Left)
                    || self.check_keyword(Keyword::Justified)
                {
                    self.bump(&mut children)?;
                }
                continue;
            }
            break;
        }
        let operands = self.parse_output_operand_list(&[], &mut children)?;
        Ok(self.finish_statement(
            Statement::Output {
                kind,
                report,
                operands,
            },
            children,
        ))
    }

    // ========================================================================
    // TERMINAL INPUT
    // ========================================================================

    /// `INPUT [(attributes)] [NO ERASE] [MARK ...] [USING MAP name] operands`.
    pub(super) fn parse_input_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect_keyword(Keyword::Input, &mut children)?;
        if self.check_keyword(Keyword::No) && self.peek_keyword(1, Keyword::Erase) {
            self.bump(&mut children)?;
            self.bump(&mut children)?;
        }
        self.parse_mark_clause(&mut children)?;
        if self.check_keyword(Keyword::Using) && self.peek_keyword(1, Keyword::Map) {
            self.bump(&mut children)?;
            self.bump(&mut children)?;
            let map = self.parse_operand()?;
            children.push(map);
        }
        let operands = self.parse_output_operand_list(&[], &mut children)?;
        Ok(self.finish_statement(Statement::Input { operands }, children))
    }

    /// `REINPUT [FULL] operands [MARK field] [ALARM]`.
    pub(super) fn parse_reinput_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect_keyword(Keyword::Reinput, &mut children)?;
        self.accept_keyword(Keyword::Full, &mut children);
        let operands = self.parse_output_operand_list(&[Keyword::Mark], &mut children)?;
        self.parse_mark_clause(&mut children)?;
        if Self::is_word(self.tokens.peek(), "ALARM") && self.same_line() {
            self.bump(&mut children)?;
        }
        Ok(self.finish_statement(Statement::Reinput { operands }, children))
    }

    /// `MARK [POSITION n [IN]] [*]field`.
    fn parse_mark_clause(&mut self, children: &mut Vec<NodeId>) -> Result<()> {
        if !self.accept_keyword(Keyword::Mark, children) {
            return Ok(());
        }
        if self.accept_keyword(Keyword::Position, children) {
            let position = self.parse_operand()?;
            children.push(position);
            self.accept_keyword(Keyword::In, children);
        }
        self.accept(TokenKind::Asterisk, children);
        let field = self.parse_operand()?;
        children.push(field);
        Ok(())
    }

    // ========================================================================
    // WORK FILES AND PRINTERS
    // ========================================================================

    /// `READ WORK [FILE] n [ONCE] [RECORD] operands ... END-WORK`.
    pub(super) fn parse_read_work_file(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        let opener = self.expect_keyword(Keyword::Read, &mut children)?;
        let number = self.parse_work_file_number(&mut children)?;
        let once = self.accept_keyword(Keyword::Once, &mut children);
        self.accept_keyword(Keyword::Record, &mut children);
        let operands = self.parse_operand_list(&[], &mut children)?;
        let body = if once {
            None
        } else {
            let body = self.parse_block(&[Keyword::EndWork]);
            children.push(body);
            self.close_block(Keyword::EndWork, &opener, &mut children);
            Some(body)
        };
        Ok(self.finish_statement(
            Statement::WorkFile {
                kind: WorkFileKind::Read,
                number: Some(number),
                operands,
                body,
            },
            children,
        ))
    }

    /// `WRITE WORK [FILE] n [VARIABLE] operands`.
    fn parse_write_work_file(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect_keyword(Keyword::Write, &mut children)?;
        let number = self.parse_work_file_number(&mut children)?;
        self.accept_keyword(Keyword::Variable, &mut children);
        let operands = self.parse_operand_list(&[], &mut children)?;
        Ok(self.finish_statement(
            Statement::WorkFile {
                kind: WorkFileKind::Write,
                number: Some(number),
                operands,
                body: None,
            },
            children,
        ))
    }

    /// `DEFINE WORK FILE n [path] [TYPE type] ...`.
    pub(super) fn parse_define_work_file(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect_keyword(Keyword::Define, &mut children)?;
        let number = self.parse_work_file_number(&mut children)?;
        let mut operands = Vec::new();
        if self.same_line() && self.can_start_operand() && !self.check_keyword(Keyword::Type) {
            let path = self.parse_operand()?;
            children.push(path);
            operands.push(path);
        }
        self.consume_rest_of_line(&mut children);
        Ok(self.finish_statement(
            Statement::WorkFile {
                kind: WorkFileKind::Define,
                number: Some(number),
                operands,
                body: None,
            },
            children,
        ))
    }

    /// `WORK [FILE] n`.
    fn parse_work_file_number(&mut self, children: &mut Vec<NodeId>) -> Result<NodeId> {
        self.expect_keyword(Keyword::Work, children)?;
        self.accept_keyword(Keyword::File, children);
        let number = self.parse_operand()?;
        children.push(number);
        Ok(number)
    }

    /// `DEFINE PRINTER ([name=]n) [OUTPUT operand] ...`.
    pub(super) fn parse_define_printer(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect_keyword(Keyword::Define, &mut children)?;
        self.expect_keyword(Keyword::Printer, &mut children)?;
        let mut name = None;
        self.expect(TokenKind::LParen, "(", &mut children)?;
        if self.peek_kind(1) == Some(TokenKind::Equals) {
            self.bump(&mut children)?;
            name = children.last().copied();
            self.bump(&mut children)?;
        }
        self.expect(TokenKind::NumberLiteral, "printer number", &mut children)?;
        self.expect(TokenKind::RParen, ")", &mut children)?;
        if self.accept_keyword(Keyword::Output, &mut children) {
            let output = self.parse_operand()?;
            children.push(output);
        }
        self.consume_rest_of_line(&mut children);
        Ok(self.finish_statement(
            Statement::Printer {
                kind: PrinterKind::Define,
                name,
            },
            children,
        ))
    }

    /// `CLOSE WORK [FILE] n` or `CLOSE PRINTER (name|n)`.
    pub(super) fn parse_close_statement(&mut self) -> Result<NodeId> {
        if self.peek_keyword(1, Keyword::Work) {
            let mut children = Vec::new();
            self.expect_keyword(Keyword::Close, &mut children)?;
            let number = self.parse_work_file_number(&mut children)?;
            return Ok(self.finish_statement(
                Statement::WorkFile {
                    kind: WorkFileKind::Close,
                    number: Some(number),
                    operands: Vec::new(),
                    body: None,
                },
                children,
            ));
        }
        let mut children = Vec::new();
        self.expect_keyword(Keyword::Close, &mut children)?;
        self.expect_keyword(Keyword::Printer, &mut children)?;
        let parenthesized = self.accept(TokenKind::LParen, &mut children);
        self.bump(&mut children)?;
        let name = children.last().copied();
        if parenthesized {
            self.expect(TokenKind::RParen, ")", &mut children)?;
        }
        Ok(self.finish_statement(
            Statement::Printer {
                kind: PrinterKind::Close,
                name,
            },
            children,
        ))
    }

    // ========================================================================
    // PARSE JSON / XML
    // ========================================================================

    /// `PARSE JSON|XML source INTO [PATH p] [NAME n] [VALUE v]
    /// [GIVING e [SUBCODE s]] ... END-PARSE`.
    pub(super) fn parse_parse_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        let opener = self.expect_keyword(Keyword::Parse, &mut children)?;
        let kind = if self.accept_keyword(Keyword::Json, &mut children) {
            ParseKind::Json
        } else {
            self.expect_keyword(Keyword::Xml, &mut children)?;
            ParseKind::Xml
        };
        let source = self.parse_operand()?;
        children.push(source);
        self.expect_keyword(Keyword::Into, &mut children)?;

        let mut targets = Vec::new();
        while self
            .tokens
            .peek()
            .and_then(|t| t.keyword())
            .is_some_and(|kw| PARSE_TARGETS.contains(&kw))
            && !self.is_assignment_start()
        {
            self.bump(&mut children)?;
            let target = self.parse_reference()?;
            children.push(target);
            targets.push(target);
        }

        let body = self.parse_block(&[Keyword::EndParse]);
        children.push(body);
        self.close_block(Keyword::EndParse, &opener, &mut children);
        Ok(self.finish_statement(
            Statement::Parse {
                kind,
                source,
                targets,
                body,
            },
            children,
        ))
    }

    // ========================================================================
    // STACK
    // ========================================================================

    /// `STACK [TOP] [DATA [FORMATTED]|COMMAND] operands`.
    pub(super) fn parse_stack_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect_keyword(Keyword::Stack, &mut children)?;
        self.accept_keyword(Keyword::Top, &mut children);
        if self.accept_keyword(Keyword::Data, &mut children) {
            self.accept_keyword(Keyword::Formatted, &mut children);
        } else {
            self.accept_keyword(Keyword::Command, &mut children);
        }
        let operands = self.parse_operand_list(&[], &mut children)?;
        Ok(self.finish_statement(Statement::Stack { operands }, children))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ParserOptions;
    use crate::lexer::NaturalLexer;
    use crate::module::{FileType, NaturalFile, SourceFile};
    use crate::parser::{ParsedModule, Parser};
    use crate::provider::EmptyProvider;
    use crate::syntax::{NodeId, OutputKind, ParseKind, PrinterKind, Statement, WorkFileKind};
    use open_mainframe_lang_core::FileId;

    fn parse(source: &str) -> ParsedModule {
        let file = SourceFile::new("TEST", FileType::Program, source);
        let tokens = NaturalLexer::new(FileId::MAIN).lex(&file.text);
        let natural = NaturalFile::for_source(&file, tokens.tokens());
        let options = ParserOptions::default();
        Parser::new(tokens, &natural, &EmptyProvider, &options).parse()
    }

    fn codes(parsed: &ParsedModule) -> Vec<String> {
        parsed.diagnostics.iter().map(|d| d.code.clone()).collect()
    }

    fn statements(parsed: &ParsedModule) -> Vec<Statement> {
        (0..parsed.tree.len() as u32)
            .filter_map(|id| parsed.tree.statement(NodeId(id)).cloned())
            .collect()
    }

    #[test]
    fn test_output_report_and_operands() {
        let parsed = parse("DISPLAY (2) NOTITLE 'NAME' #NAME 5X #CITY\nWRITE 'A'\n  #B\nEND\n");
        assert!(codes(&parsed).is_empty(), "{:?}", codes(&parsed));
        let outputs: Vec<_> = statements(&parsed)
            .into_iter()
            .filter_map(|s| match s {
                Statement::Output {
                    kind,
                    report,
                    operands,
                } => Some((kind, report.is_some(), operands.len())),
                _ => None,
            })
            .collect();
        assert_eq!(outputs, vec![(OutputKind::Display, true, 4), (OutputKind::Write, false, 2)]);
    }

    #[test]
    fn test_input_and_reinput() {
        let parsed = parse(
            "INPUT USING MAP 'MAP1'\nINPUT 'NAME:' #NAME (AD=M)\nREINPUT 'INVALID' MARK *#NAME\nEND\n",
        );
        assert!(codes(&parsed).is_empty(), "{:?}", codes(&parsed));
        let all = statements(&parsed);
        assert_eq!(all.iter().filter(|s| matches!(s, Statement::Input { .. })).count(), 2);
        assert!(all.iter().any(|s| matches!(s, Statement::Reinput { operands } if operands.len() == 1)));
    }

    #[test]
    fn test_work_files() {
        let parsed = parse(
            "DEFINE WORK FILE 1 '/tmp/out.txt' TYPE 'ASCII'\nREAD WORK FILE 1 #REC\n  WRITE WORK FILE 2 #REC\nEND-WORK\nREAD WORK FILE 3 ONCE #A\nCLOSE WORK FILE 1\nEND\n",
        );
        assert!(codes(&parsed).is_empty(), "{:?}", codes(&parsed));
        let kinds: Vec<_> = statements(&parsed)
            .into_iter()
            .filter_map(|s| match s {
                Statement::WorkFile { kind, body, .. } => Some((kind, body.is_some())),
                _ => None,
            })
            .collect();
        assert!(kinds.contains(&(WorkFileKind::Define, false)));
        assert!(kinds.contains(&(WorkFileKind::Read, true)));
        assert!(kinds.contains(&(WorkFileKind::Read, false)));
        assert!(kinds.contains(&(WorkFileKind::Write, false)));
        assert!(kinds.contains(&(WorkFileKind::Close, false)));
    }

    #[test]
    fn test_printers() {
        let parsed = parse("DEFINE PRINTER (PRT1=1) OUTPUT 'LPT1'\nCLOSE PRINTER (PRT1)\nEND\n");
        assert!(codes(&parsed).is_empty(), "{:?}", codes(&parsed));
        let kinds: Vec<_> = statements(&parsed)
            .into_iter()
            .filter_map(|s| match s {
                Statement::Printer { kind, name } => Some((kind, name.is_some())),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, vec![(PrinterKind::Define, true), (PrinterKind::Close, true)]);
    }

    #[test]
    fn test_parse_json() {
        let parsed = parse(
            "PARSE JSON #DOC INTO PATH #PATH NAME #NAME VALUE #VALUE\n  WRITE #PATH\nEND-PARSE\nEND\n",
        );
        assert!(codes(&parsed).is_empty(), "{:?}", codes(&parsed));
        let found = statements(&parsed).into_iter().any(|s| {
            matches!(s, Statement::Parse { kind: ParseKind::Json, ref targets, .. } if targets.len() == 3)
        });
        assert!(found);
    }

    #[test]
    fn test_stack() {
        let parsed = parse("STACK TOP DATA #A #B\nEND\n");
        assert!(codes(&parsed).is_empty(), "{:?}", codes(&parsed));
        assert!(statements(&parsed)
            .iter()
            .any(|s| matches!(s, Statement::Stack { operands } if operands.len() == 2)));
    }
}
