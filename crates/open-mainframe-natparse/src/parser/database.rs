// SPDX-License-Identifier: Apache-2.0
//! Database access statements.
//!
//! Descriptors in `BY`, `WITH` and search criteria are kept as token leaves:
//! they name DDM fields, which need not be part of the view.

use super::Result;
use crate::lexer::{Keyword, TokenKind};
use crate::syntax::{Condition, DatabaseLoopKind, GetKind, NodeId, SimpleKind, Statement};

/// Words that end a READ/HISTOGRAM descriptor position.
const RANGE_CLAUSES: &[Keyword] = &[
    Keyword::Starting,
    Keyword::From,
    Keyword::Ending,
    Keyword::To,
    Keyword::Where,
    Keyword::In,
];

impl super::Parser<'_> {
    // ========================================================================
    // READ / HISTOGRAM
    // ========================================================================

    /// `READ [(limit)] view [BY|WITH descriptor ...] [WHERE cond] ... END-READ`
    /// or `READ WORK FILE`.
    pub(super) fn parse_read_statement(&mut self) -> Result<NodeId> {
        if self.peek_keyword(1, Keyword::Work) {
            return self.parse_read_work_file();
        }
        let mut children = Vec::new();
        let opener = self.expect_keyword(Keyword::Read, &mut children)?;
        self.parse_record_limit(&mut children)?;
        self.accept_keyword(Keyword::In, &mut children);
        let view = self.parse_reference()?;
        children.push(view);
        let (descriptor, condition) = self.parse_access_clauses(&mut children)?;

        let body = self.parse_block(&[Keyword::EndRead]);
        children.push(body);
        self.close_block(Keyword::EndRead, &opener, &mut children);
        Ok(self.finish_statement(
            Statement::DatabaseLoop {
                kind: DatabaseLoopKind::Read,
                view: Some(view),
                descriptor,
                condition,
                body: Some(body),
            },
            children,
        ))
    }

    /// `HISTOGRAM [(limit)] view [FOR] descriptor [STARTING FROM ...] ... END-HISTOGRAM`.
    pub(super) fn parse_histogram_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        let opener = self.expect_keyword(Keyword::Histogram, &mut children)?;
        self.parse_record_limit(&mut children)?;
        self.accept_keyword(Keyword::In, &mut children);
        let view = self.parse_reference()?;
        children.push(view);
        self.accept_keyword(Keyword::For, &mut children);

        let mut descriptor = None;
        let bare_descriptor = self.tokens.peek().is_some_and(|t| {
            t.is_identifier_like() && !t.keyword().is_some_and(|kw| RANGE_CLAUSES.contains(&kw))
        });
        if bare_descriptor {
            self.bump(&mut children)?;
            descriptor = children.last().copied();
        }
        let (by_descriptor, condition) = self.parse_access_clauses(&mut children)?;

        let body = self.parse_block(&[Keyword::EndHistogram]);
        children.push(body);
        self.close_block(Keyword::EndHistogram, &opener, &mut children);
        Ok(self.finish_statement(
            Statement::DatabaseLoop {
                kind: DatabaseLoopKind::Histogram,
                view: Some(view),
                descriptor: descriptor.or(by_descriptor),
                condition,
                body: Some(body),
            },
            children,
        ))
    }

    /// `(limit)` after READ, FIND or HISTOGRAM.
    fn parse_record_limit(&mut self, children: &mut Vec<NodeId>) -> Result<()> {
        if !self.check(TokenKind::LParen) {
            return Ok(());
        }
        self.bump(children)?;
        let limit = self.parse_operand()?;
        children.push(limit);
        self.expect(TokenKind::RParen, ")", children)?;
        Ok(())
    }

    /// Sequence, descriptor, value range and WHERE clauses of READ and
    /// HISTOGRAM. Returns the descriptor leaf and the WHERE condition.
    fn parse_access_clauses(
        &mut self,
        children: &mut Vec<NodeId>,
    ) -> Result<(Option<NodeId>, Option<NodeId>)> {
        let mut descriptor = None;
        let mut condition = None;
        loop {
            let Some(kw) = self.tokens.peek().and_then(|t| t.keyword()) else {
                break;
            };
            match kw {
                Keyword::In
                | Keyword::Physical
                | Keyword::Logical
                | Keyword::Ascending
                | Keyword::Descending
                | Keyword::Variable
                | Keyword::Sequence => {
                    self.bump(children)?;
                }
                Keyword::By | Keyword::With => {
                    self.bump(children)?;
                    if self.accept_keyword(Keyword::Isn, children) {
                        continue;
                    }
                    if !self.tokens.peek().is_some_and(|t| t.is_identifier_like()) {
                        return Err(self.unexpected("descriptor"));
                    }
                    self.bump(children)?;
                    descriptor = children.last().copied();
                    if self.tokens.peek().is_some_and(|t| t.kind().is_comparison_symbol())
                        || self.check_keyword(Keyword::Eq)
                        || self.check_keyword(Keyword::Equal)
                    {
                        self.bump(children)?;
                        self.accept_keyword(Keyword::To, children);
                        let value = self.parse_operand()?;
                        children.push(value);
                    }
                }
                Keyword::Starting | Keyword::From => {
                    self.bump(children)?;
                    self.accept_keyword(Keyword::From, children);
                    self.accept_keyword(Keyword::With, children);
                    let value = self.parse_operand()?;
                    children.push(value);
                }
                Keyword::Ending | Keyword::Thru | Keyword::To => {
                    if self.accept_keyword(Keyword::Ending, children) {
                        self.expect_keyword(Keyword::At, children)?;
                    } else {
                        self.bump(children)?;
                    }
                    let value = self.parse_operand()?;
                    children.push(value);
                }
                Keyword::Where => {
                    self.bump(children)?;
                    let cond = self.parse_condition()?;
                    children.push(cond);
                    condition = Some(cond);
                }
                _ => break,
            }
        }
        Ok((descriptor, condition))
    }

    // ========================================================================
    // FIND
    // ========================================================================

    /// `FIND [ALL|FIRST|UNIQUE|NUMBER] [(limit)] [RECORDS] [IN] [FILE] view
    /// WITH search [SORTED BY ...] [WHERE cond]`. Only the looping form owns
    /// a body.
    pub(super) fn parse_find_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        let opener = self.expect_keyword(Keyword::Find, &mut children)?;
        let number = self.accept_keyword(Keyword::Number, &mut children);
        let looping = if number {
            false
        } else if self.check_keyword(Keyword::First) || self.check_keyword(Keyword::Unique) {
            self.bump(&mut children)?;
            false
        } else {
            self.accept_keyword(Keyword::All, &mut children);
            true
        };
        self.parse_record_limit(&mut children)?;
        self.accept_keyword(Keyword::Records, &mut children);
        self.accept_keyword(Keyword::In, &mut children);
        self.accept_keyword(Keyword::File, &mut children);
        let view = self.parse_reference()?;
        children.push(view);

        let mut criteria = None;
        if self.accept_keyword(Keyword::With, &mut children) {
            if Self::is_word(self.tokens.peek(), "LIMIT") {
                self.bump(&mut children)?;
                self.parse_record_limit(&mut children)?;
            }
            let search = self.parse_search_criteria()?;
            children.push(search);
            criteria = Some(search);
        }
        if self.accept_keyword(Keyword::Sorted, &mut children) {
            self.accept_keyword(Keyword::By, &mut children);
            while self.same_line() && self.tokens.peek().is_some_and(|t| t.is_identifier_like()) {
                if self.check_keyword(Keyword::Where) {
                    break;
                }
                self.bump(&mut children)?;
            }
        }
        if self.accept_keyword(Keyword::Where, &mut children) {
            let condition = self.parse_condition()?;
            children.push(condition);
        }

        if number {
            return Ok(self.finish_statement(
                Statement::FindNumber {
                    view: Some(view),
                    condition: criteria,
                },
                children,
            ));
        }
        let body = if looping {
            let body = self.parse_block(&[Keyword::EndFind]);
            children.push(body);
            self.close_block(Keyword::EndFind, &opener, &mut children);
            Some(body)
        } else {
            None
        };
        Ok(self.finish_statement(
            Statement::DatabaseLoop {
                kind: DatabaseLoopKind::Find,
                view: Some(view),
                descriptor: None,
                condition: criteria,
                body,
            },
            children,
        ))
    }

    /// `descriptor op value [THRU value] {AND|OR|BUT NOT} ...`.
    fn parse_search_criteria(&mut self) -> Result<NodeId> {
        let mut left = self.parse_search_and()?;
        while self.check_keyword(Keyword::Or) {
            let mut children = vec![left];
            self.bump(&mut children)?;
            let right = self.parse_search_and()?;
            children.push(right);
            left = self.finish_condition(Condition::Or { left, right }, children);
        }
        Ok(left)
    }

    fn parse_search_and(&mut self) -> Result<NodeId> {
        let mut left = self.parse_search_term()?;
        loop {
            let mut children = vec![left];
            if self.accept_keyword(Keyword::And, &mut children) {
                let right = self.parse_search_term()?;
                children.push(right);
                left = self.finish_condition(Condition::And { left, right }, children);
            } else if self.check_keyword(Keyword::But) && self.peek_keyword(1, Keyword::Not) {
                self.bump(&mut children)?;
                self.bump(&mut children)?;
                let excluded = self.parse_search_term()?;
                let negated =
                    self.finish_condition(Condition::Not { inner: excluded }, vec![excluded]);
                children.push(negated);
                left = self.finish_condition(Condition::And { left, right: negated }, children);
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_search_term(&mut self) -> Result<NodeId> {
        if self.check_keyword(Keyword::Not) {
            let mut children = Vec::new();
            self.bump(&mut children)?;
            let inner = self.parse_search_term()?;
            children.push(inner);
            return Ok(self.finish_condition(Condition::Not { inner }, children));
        }
        if self.check(TokenKind::LParen) {
            let mut children = Vec::new();
            self.bump(&mut children)?;
            let inner = self.parse_search_criteria()?;
            children.push(inner);
            self.expect(TokenKind::RParen, ")", &mut children)?;
            return Ok(self.finish_condition(Condition::Group { inner }, children));
        }
        if !self.tokens.peek().is_some_and(|t| t.is_identifier_like()) {
            return Err(self.unexpected("descriptor"));
        }
        let mut children = Vec::new();
        self.bump(&mut children)?;
        let descriptor = children[0];
        self.parse_comparison_rest(descriptor, children)
    }

    // ========================================================================
    // SINGLE RECORD ACCESS
    // ========================================================================

    /// `GET [IN] [FILE] view [RECORD] isn`, `GET SAME [(label)]` or
    /// `GET TRANSACTION [DATA] operands`.
    pub(super) fn parse_get_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect_keyword(Keyword::Get, &mut children)?;
        if self.accept_keyword(Keyword::Same, &mut children) {
            self.parse_optional_label(&mut children)?;
            return Ok(self.finish_statement(
                Statement::Get {
                    kind: GetKind::Same,
                    view: None,
                    operands: Vec::new(),
                },
                children,
            ));
        }
        if self.accept_keyword(Keyword::Transaction, &mut children) {
            self.accept_keyword(Keyword::Data, &mut children);
            let operands = self.parse_operand_list(&[], &mut children)?;
            return Ok(self.finish_statement(
                Statement::Get {
                    kind: GetKind::Transaction,
                    view: None,
                    operands,
                },
                children,
            ));
        }
        self.accept_keyword(Keyword::In, &mut children);
        self.accept_keyword(Keyword::File, &mut children);
        let view = self.parse_reference()?;
        children.push(view);
        self.accept_keyword(Keyword::Record, &mut children);
        let isn = self.parse_operand()?;
        children.push(isn);
        Ok(self.finish_statement(
            Statement::Get {
                kind: GetKind::Record,
                view: Some(view),
                operands: vec![isn],
            },
            children,
        ))
    }

    /// `STORE [RECORD] [IN] [FILE] view`.
    pub(super) fn parse_store_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect_keyword(Keyword::Store, &mut children)?;
        self.accept_keyword(Keyword::Record, &mut children);
        self.accept_keyword(Keyword::In, &mut children);
        self.accept_keyword(Keyword::File, &mut children);
        let view = self.parse_reference()?;
        children.push(view);
        Ok(self.finish_statement(Statement::Store { view: Some(view) }, children))
    }

    /// `UPDATE [RECORD] [(label)]`.
    pub(super) fn parse_update_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect_keyword(Keyword::Update, &mut children)?;
        self.accept_keyword(Keyword::Record, &mut children);
        let label = self.parse_optional_label(&mut children)?;
        Ok(self.finish_statement(Statement::Update { label }, children))
    }

    /// `DELETE [RECORD] [(label)]`.
    pub(super) fn parse_delete_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect_keyword(Keyword::Delete, &mut children)?;
        self.accept_keyword(Keyword::Record, &mut children);
        let label = self.parse_optional_label(&mut children)?;
        Ok(self.finish_statement(Statement::Delete { label }, children))
    }

    /// `(R1.)` or a source line reference such as `(0150)`.
    fn parse_optional_label(&mut self, children: &mut Vec<NodeId>) -> Result<Option<NodeId>> {
        if !self.check(TokenKind::LParen) || !self.same_line() {
            return Ok(None);
        }
        self.bump(children)?;
        let label = if self.check(TokenKind::LabelIdentifier) {
            self.parse_label()?
        } else {
            let mut leaf = Vec::new();
            self.bump(&mut leaf)?;
            leaf[0]
        };
        children.push(label);
        self.expect(TokenKind::RParen, ")", children)?;
        Ok(Some(label))
    }

    // ========================================================================
    // TRANSACTIONS
    // ========================================================================

    /// `END TRANSACTION [operands]`.
    pub(super) fn parse_end_transaction(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect_keyword(Keyword::End, &mut children)?;
        self.expect_keyword(Keyword::Transaction, &mut children)?;
        self.parse_operand_list(&[], &mut children)?;
        Ok(self.finish_statement(
            Statement::Simple {
                kind: SimpleKind::EndTransaction,
            },
            children,
        ))
    }

    /// `BACKOUT [TRANSACTION]`.
    pub(super) fn parse_backout_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect_keyword(Keyword::Backout, &mut children)?;
        self.accept_keyword(Keyword::Transaction, &mut children);
        Ok(self.finish_statement(
            Statement::Simple {
                kind: SimpleKind::Backout,
            },
            children,
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ParserOptions;
    use crate::lexer::NaturalLexer;
    use crate::module::{FileType, NaturalFile, SourceFile};
    use crate::parser::{ParsedModule, Parser};
    use crate::provider::EmptyProvider;
    use crate::syntax::{Condition, DatabaseLoopKind, GetKind, NodeId, NodeKind, Statement};
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
    fn test_read_by_descriptor() {
        let parsed = parse(
            "R1. READ (10) EMPLOYEES BY NAME STARTING FROM 'A'\n  WHERE SALARY > 100\n  WRITE NAME\nEND-READ\nEND\n",
        );
        assert!(codes(&parsed).is_empty(), "{:?}", codes(&parsed));
        let tree = &parsed.tree;
        let read = statements(&parsed).into_iter().find_map(|s| match s {
            Statement::DatabaseLoop {
                kind: DatabaseLoopKind::Read,
                descriptor,
                condition,
                body,
                ..
            } => Some((descriptor, condition, body)),
            _ => None,
        });
        let (descriptor, condition, body) = read.expect("READ");
        let descriptor = descriptor.and_then(|d| tree.leaf_token(d)).map(|t| t.upper());
        assert_eq!(descriptor.as_deref(), Some("NAME"));
        assert!(condition.is_some());
        assert!(body.is_some());
    }

    #[test]
    fn test_find_forms() {
        let parsed = parse(
            "FIND EMPLOYEES WITH NAME = 'SMITH' AND CITY = 'PARIS'\n  IGNORE\nEND-FIND\nFIND NUMBER EMPLOYEES WITH NAME = 'X'\nFIND FIRST EMPLOYEES WITH CITY = 'ROME'\nEND\n",
        );
        assert!(codes(&parsed).is_empty(), "{:?}", codes(&parsed));
        let tree = &parsed.tree;
        let all = statements(&parsed);
        let looping = all.iter().find_map(|s| match s {
            Statement::DatabaseLoop {
                kind: DatabaseLoopKind::Find,
                condition,
                body: Some(_),
                ..
            } => *condition,
            _ => None,
        });
        let criteria = looping.and_then(|c| tree.condition(c));
        assert!(matches!(criteria, Some(Condition::And { .. })));
        assert!(all.iter().any(|s| matches!(s, Statement::FindNumber { condition: Some(_), .. })));
        assert!(all.iter().any(|s| matches!(
            s,
            Statement::DatabaseLoop {
                kind: DatabaseLoopKind::Find,
                body: None,
                ..
            }
        )));
    }

    #[test]
    fn test_search_descriptor_is_not_a_symbol() {
        let parsed = parse("FIND FIRST EMPLOYEES WITH NAME = #NAME\nEND\n");
        let tree = &parsed.tree;
        let symbols: Vec<String> = (0..tree.len() as u32)
            .filter_map(|id| tree.symbol_ref(NodeId(id)))
            .map(|s| s.name())
            .collect();
        assert_eq!(symbols, vec!["EMPLOYEES", "#NAME"]);
    }

    #[test]
    fn test_single_record_access() {
        let parsed = parse(
            "GET EMPLOYEES #ISN\nGET SAME\nGET TRANSACTION DATA #A #B\nSTORE EMPLOYEES\nUPDATE (R1.)\nDELETE\nEND TRANSACTION\nBACKOUT TRANSACTION\nEND\n",
        );
        assert!(codes(&parsed).is_empty(), "{:?}", codes(&parsed));
        let all = statements(&parsed);
        assert!(all.iter().any(|s| matches!(s, Statement::Get { kind: GetKind::Record, .. })));
        assert!(all.iter().any(|s| matches!(s, Statement::Get { kind: GetKind::Same, .. })));
        assert!(all.iter().any(
            |s| matches!(s, Statement::Get { kind: GetKind::Transaction, operands, .. } if operands.len() == 2)
        ));
        assert!(all.iter().any(|s| matches!(s, Statement::Store { view: Some(_) })));
        assert!(all.iter().any(|s| matches!(s, Statement::Update { label: Some(_) })));
        assert!(all.iter().any(|s| matches!(s, Statement::Delete { label: None })));
        assert!(matches!(
            parsed.tree.kind(parsed.body.unwrap_or(NodeId(0))),
            Some(NodeKind::StatementList)
        ));
    }
}
