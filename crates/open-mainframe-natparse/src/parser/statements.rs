// SPDX-License-Identifier: Apache-2.0
//! Control flow statements: IF, DECIDE, FOR, REPEAT, ESCAPE, END, event
//! handlers and the option-only statements.

use super::Result;
use crate::lexer::{Keyword, SyntaxToken, TokenKind};
use crate::syntax::{
    DecideBranch, DecideMode, EscapeKind, HandlerKind, NodeId, Operand, SimpleKind, Statement,
};

impl super::Parser<'_> {
    // ========================================================================
    // IF
    // ========================================================================

    /// `IF condition [THEN] ... [ELSE ...] END-IF`.
    pub(super) fn parse_if_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        let opener = self.expect_keyword(Keyword::If, &mut children)?;
        if self.check_keyword(Keyword::No) {
            return self.parse_no_records_found(opener, children);
        }
        let condition = self.parse_condition()?;
        children.push(condition);
        self.accept_keyword(Keyword::Then, &mut children);

        let body = self.parse_block(&[Keyword::Else, Keyword::EndIf]);
        children.push(body);
        let mut else_body = None;
        if self.accept_keyword(Keyword::Else, &mut children) {
            let body = self.parse_block(&[Keyword::EndIf]);
            children.push(body);
            else_body = Some(body);
        }
        self.close_block(Keyword::EndIf, &opener, &mut children);
        Ok(self.finish_statement(
            Statement::If {
                condition,
                body,
                else_body,
            },
            children,
        ))
    }

    /// `IF NO [RECORDS] [FOUND] ... END-NOREC`.
    fn parse_no_records_found(
        &mut self,
        opener: SyntaxToken,
        mut children: Vec<NodeId>,
    ) -> Result<NodeId> {
        self.expect_keyword(Keyword::No, &mut children)?;
        self.accept_keyword(Keyword::Records, &mut children);
        self.accept_keyword(Keyword::Found, &mut children);
        let body = self.parse_block(&[Keyword::EndNorec]);
        children.push(body);
        self.close_block(Keyword::EndNorec, &opener, &mut children);
        Ok(self.finish_statement(Statement::NoRecordsFound { body }, children))
    }

    // ========================================================================
    // DECIDE
    // ========================================================================

    pub(super) fn parse_decide_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        let opener = self.expect_keyword(Keyword::Decide, &mut children)?;
        if self.accept_keyword(Keyword::For, &mut children) {
            let mode = self.parse_decide_mode(&mut children)?;
            self.expect_keyword(Keyword::Condition, &mut children)?;
            return self.parse_decide_for(opener, mode, children);
        }
        self.expect_keyword(Keyword::On, &mut children)?;
        let mode = self.parse_decide_mode(&mut children)?;
        if self.check_keyword(Keyword::Value) || self.check_keyword(Keyword::Values) {
            self.bump(&mut children)?;
            self.accept_keyword(Keyword::Of, &mut children);
        }
        let operand = self.parse_operand()?;
        children.push(operand);
        self.parse_decide_on(opener, mode, operand, children)
    }

    fn parse_decide_mode(&mut self, children: &mut Vec<NodeId>) -> Result<DecideMode> {
        if self.accept_keyword(Keyword::First, children) {
            return Ok(DecideMode::First);
        }
        self.expect_keyword(Keyword::Every, children)?;
        Ok(DecideMode::Every)
    }

    fn parse_decide_on(
        &mut self,
        opener: SyntaxToken,
        mode: DecideMode,
        operand: NodeId,
        mut children: Vec<NodeId>,
    ) -> Result<NodeId> {
        const BRANCH_END: &[Keyword] = &[
            Keyword::Value,
            Keyword::Values,
            Keyword::Any,
            Keyword::All,
            Keyword::None,
            Keyword::EndDecide,
        ];
        let mut branches = Vec::new();
        let (mut any_body, mut all_body, mut none_body) = (None, None, None);
        loop {
            if self.check_keyword(Keyword::Value) || self.check_keyword(Keyword::Values) {
                self.bump(&mut children)?;
                let mut values = Vec::new();
                loop {
                    if self.check(TokenKind::NumberLiteral) {
                        self.split_comma_number();
                    }
                    let value = self.parse_decide_value()?;
                    children.push(value);
                    values.push(value);
                    if !self.accept(TokenKind::Comma, &mut children) {
                        break;
                    }
                }
                let body = self.parse_block(BRANCH_END);
                children.push(body);
                branches.push(DecideBranch {
                    values,
                    condition: None,
                    body,
                });
                continue;
            }
            let slot = if self.check_keyword(Keyword::Any) {
                &mut any_body
            } else if self.check_keyword(Keyword::All) {
                &mut all_body
            } else if self.check_keyword(Keyword::None) {
                &mut none_body
            } else {
                break;
            };
            self.bump(&mut children)?;
            if self.check_keyword(Keyword::Value) || self.check_keyword(Keyword::Values) {
                self.bump(&mut children)?;
            }
            let body = self.parse_block(BRANCH_END);
            children.push(body);
            *slot = Some(body);
        }
        self.close_block(Keyword::EndDecide, &opener, &mut children);
        Ok(self.finish_statement(
            Statement::DecideOn {
                mode,
                operand,
                branches,
                any_body,
                all_body,
                none_body,
            },
            children,
        ))
    }

    /// A DECIDE ON value or `lower:upper` range.
    fn parse_decide_value(&mut self) -> Result<NodeId> {
        let lower = self.parse_operand()?;
        if !self.check(TokenKind::Colon) {
            return Ok(lower);
        }
        let mut children = vec![lower];
        self.bump(&mut children)?;
        let upper = self.parse_operand()?;
        children.push(upper);
        Ok(self.finish_operand(Operand::Range { lower, upper }, children))
    }

    fn parse_decide_for(
        &mut self,
        opener: SyntaxToken,
        mode: DecideMode,
        mut children: Vec<NodeId>,
    ) -> Result<NodeId> {
        const BRANCH_END: &[Keyword] = &[Keyword::When, Keyword::EndDecide];
        let mut branches = Vec::new();
        let (mut any_body, mut all_body, mut none_body) = (None, None, None);
        while self.accept_keyword(Keyword::When, &mut children) {
            let slot = if self.check_keyword(Keyword::Any) {
                Some(&mut any_body)
            } else if self.check_keyword(Keyword::All) {
                Some(&mut all_body)
            } else if self.check_keyword(Keyword::None) {
                Some(&mut none_body)
            } else {
                None
            };
            match slot {
                Some(slot) => {
                    self.bump(&mut children)?;
                    let body = self.parse_block(BRANCH_END);
                    children.push(body);
                    *slot = Some(body);
                }
                None => {
                    let condition = self.parse_condition()?;
                    children.push(condition);
                    let body = self.parse_block(BRANCH_END);
                    children.push(body);
                    branches.push(DecideBranch {
                        values: Vec::new(),
                        condition: Some(condition),
                        body,
                    });
                }
            }
        }
        self.close_block(Keyword::EndDecide, &opener, &mut children);
        Ok(self.finish_statement(
            Statement::DecideFor {
                mode,
                branches,
                any_body,
                all_body,
                none_body,
            },
            children,
        ))
    }

    // ========================================================================
    // LOOPS
    // ========================================================================

    /// `FOR counter [:=|=|FROM] start [TO] end [STEP step] ... END-FOR`.
    pub(super) fn parse_for_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        let opener = self.expect_keyword(Keyword::For, &mut children)?;
        let counter = self.parse_reference()?;
        children.push(counter);
        if !self.accept(TokenKind::ColonEquals, &mut children)
            && !self.accept(TokenKind::Equals, &mut children)
        {
            self.accept_keyword(Keyword::From, &mut children);
        }
        let from = self.parse_operand()?;
        children.push(from);
        self.accept_keyword(Keyword::To, &mut children);
        let to = self.parse_operand()?;
        children.push(to);
        let step = if self.accept_keyword(Keyword::Step, &mut children) {
            let step = self.parse_operand()?;
            children.push(step);
            Some(step)
        } else {
            None
        };
        let body = self.parse_block(&[Keyword::EndFor]);
        children.push(body);
        self.close_block(Keyword::EndFor, &opener, &mut children);
        Ok(self.finish_statement(
            Statement::For {
                counter,
                from,
                to,
                step,
                body,
            },
            children,
        ))
    }

    /// `REPEAT [UNTIL|WHILE cond] ... [UNTIL|WHILE cond] END-REPEAT`.
    pub(super) fn parse_repeat_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        let opener = self.expect_keyword(Keyword::Repeat, &mut children)?;
        let mut condition = None;
        if self.check_keyword(Keyword::Until) || self.check_keyword(Keyword::While) {
            self.bump(&mut children)?;
            let cond = self.parse_condition()?;
            children.push(cond);
            condition = Some(cond);
        }
        let body = self.parse_block(&[Keyword::Until, Keyword::While, Keyword::EndRepeat]);
        children.push(body);
        if condition.is_none() && (self.check_keyword(Keyword::Until) || self.check_keyword(Keyword::While)) {
            self.bump(&mut children)?;
            let cond = self.parse_condition()?;
            children.push(cond);
            condition = Some(cond);
        }
        self.close_block(Keyword::EndRepeat, &opener, &mut children);
        Ok(self.finish_statement(Statement::Repeat { condition, body }, children))
    }

    /// `ESCAPE TOP|BOTTOM|ROUTINE|MODULE [(label)] [REPOSITION|IMMEDIATE]`.
    pub(super) fn parse_escape_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect_keyword(Keyword::Escape, &mut children)?;
        let kind = match self.tokens.peek_kind() {
            Some(TokenKind::Keyword(Keyword::Top)) => EscapeKind::Top,
            Some(TokenKind::Keyword(Keyword::Bottom)) => EscapeKind::Bottom,
            Some(TokenKind::Keyword(Keyword::Routine)) => EscapeKind::Routine,
            Some(TokenKind::Keyword(Keyword::Module)) => EscapeKind::Module,
            _ => return Err(self.unexpected("TOP, BOTTOM, ROUTINE or MODULE")),
        };
        self.bump(&mut children)?;
        if self.check(TokenKind::LParen) && self.peek_kind(1) == Some(TokenKind::LabelIdentifier) {
            self.bump(&mut children)?;
            let label = self.parse_label()?;
            children.push(label);
            self.expect(TokenKind::RParen, ")", &mut children)?;
        }
        self.accept_keyword(Keyword::Reposition, &mut children);
        self.accept_keyword(Keyword::Immediate, &mut children);
        Ok(self.finish_statement(Statement::Escape { kind }, children))
    }

    // ========================================================================
    // END AND SIMPLE STATEMENTS
    // ========================================================================

    /// `END`, `.` or `END TRANSACTION`.
    pub(super) fn parse_end_statement(&mut self) -> Result<NodeId> {
        if self.check_keyword(Keyword::End) && self.peek_keyword(1, Keyword::Transaction) {
            return self.parse_end_transaction();
        }
        let mut children = Vec::new();
        if !self.accept(TokenKind::Dot, &mut children) {
            self.expect_keyword(Keyword::End, &mut children)?;
        }
        self.ended = true;
        Ok(self.finish_statement(Statement::End, children))
    }

    /// Statements whose options are kept as plain tokens.
    pub(super) fn parse_simple_statement(&mut self) -> Result<NodeId> {
        let kind = match self.tokens.peek_kind() {
            Some(TokenKind::Keyword(Keyword::Stop)) => SimpleKind::Stop,
            Some(TokenKind::Keyword(Keyword::Terminate)) => SimpleKind::Terminate,
            Some(TokenKind::Keyword(Keyword::Ignore)) => SimpleKind::Ignore,
            Some(TokenKind::Keyword(Keyword::Retry)) => SimpleKind::Retry,
            Some(TokenKind::Keyword(Keyword::Eject)) => SimpleKind::Eject,
            _ => return Err(self.unexpected("statement")),
        };
        let mut children = Vec::new();
        self.bump(&mut children)?;
        if kind == SimpleKind::Terminate && self.same_line() && self.can_start_operand() {
            let code = self.parse_operand()?;
            children.push(code);
        } else if kind == SimpleKind::Eject {
            self.consume_rest_of_line(&mut children);
        }
        Ok(self.finish_statement(Statement::Simple { kind }, children))
    }

    /// `NEWPAGE [(rep)] [EVEN] [IF LESS THAN n LINES LEFT] [WITH TITLE ...]`.
    pub(super) fn parse_newpage_statement(&mut self) -> Result<NodeId> {
        self.parse_option_statement(Keyword::Newpage, SimpleKind::Newpage)
    }

    /// `SKIP [(rep)] n [LINES]`.
    pub(super) fn parse_skip_statement(&mut self) -> Result<NodeId> {
        self.parse_option_statement(Keyword::Skip, SimpleKind::Skip)
    }

    /// `FORMAT [(rep)] parameters`.
    pub(super) fn parse_format_statement(&mut self) -> Result<NodeId> {
        self.parse_option_statement(Keyword::Format, SimpleKind::Format)
    }

    /// `SET KEY ...`, `SET CONTROL ...` and other `SET` variants.
    pub(super) fn parse_set_statement(&mut self) -> Result<NodeId> {
        let kind = if self.peek_keyword(1, Keyword::Key) {
            SimpleKind::SetKey
        } else {
            SimpleKind::SetControl
        };
        self.parse_option_statement(Keyword::Set, kind)
    }

    fn parse_option_statement(&mut self, keyword: Keyword, kind: SimpleKind) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect_keyword(keyword, &mut children)?;
        // `IF LESS THAN` belongs to NEWPAGE
        loop {
            self.consume_rest_of_line(&mut children);
            let continues = kind == SimpleKind::Newpage
                && self.same_line()
                && self.check_keyword(Keyword::If);
            if !continues {
                break;
            }
            self.bump(&mut children)?;
        }
        Ok(self.finish_statement(Statement::Simple { kind }, children))
    }

    // ========================================================================
    // EVENT HANDLERS
    // ========================================================================

    /// `ON ERROR ... END-ERROR`.
    pub(super) fn parse_on_error_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        let opener = self.expect_keyword(Keyword::On, &mut children)?;
        self.expect_keyword(Keyword::Error, &mut children)?;
        self.parse_handler_body(HandlerKind::OnError, None, &opener, children)
    }

    /// `AT END OF DATA`, `AT START OF DATA`, `AT BREAK`, `AT TOP OF PAGE`,
    /// `AT END OF PAGE`, `AT END OF FILE`.
    pub(super) fn parse_at_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        let opener = self.expect_keyword(Keyword::At, &mut children)?;
        if self.accept_keyword(Keyword::Break, &mut children) {
            let operand = self.parse_break_operand(&mut children)?;
            return self.parse_handler_body(HandlerKind::AtBreak, operand, &opener, children);
        }
        let kind = if self.accept_keyword(Keyword::Start, &mut children) {
            self.accept_keyword(Keyword::Of, &mut children);
            self.expect_keyword(Keyword::Data, &mut children)?;
            HandlerKind::AtStartOfData
        } else if self.accept_keyword(Keyword::Top, &mut children) {
            self.accept_keyword(Keyword::Of, &mut children);
            self.expect_keyword(Keyword::Page, &mut children)?;
            HandlerKind::AtTopOfPage
        } else {
            self.expect_keyword(Keyword::End, &mut children)?;
            self.accept_keyword(Keyword::Of, &mut children);
            if self.accept_keyword(Keyword::Data, &mut children) {
                HandlerKind::AtEndOfData
            } else if self.accept_keyword(Keyword::Page, &mut children) {
                HandlerKind::AtEndOfPage
            } else {
                self.expect_keyword(Keyword::File, &mut children)?;
                HandlerKind::AtEndOfFile
            }
        };
        // (label) or (report)
        if self.check(TokenKind::LParen) && self.same_line() {
            self.bump(&mut children)?;
            while !self.check(TokenKind::RParen) {
                self.bump(&mut children)?;
            }
            self.bump(&mut children)?;
        }
        self.parse_handler_body(kind, None, &opener, children)
    }

    /// `BEFORE BREAK [PROCESSING] ... END-BEFORE`.
    pub(super) fn parse_before_break_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        let opener = self.expect_keyword(Keyword::Before, &mut children)?;
        self.expect_keyword(Keyword::Break, &mut children)?;
        self.accept_keyword(Keyword::Processing, &mut children);
        self.parse_handler_body(HandlerKind::BeforeBreak, None, &opener, children)
    }

    /// `[(label)] [OF] operand [/n/]` after `AT BREAK`.
    fn parse_break_operand(&mut self, children: &mut Vec<NodeId>) -> Result<Option<NodeId>> {
        if self.check(TokenKind::LParen) && self.peek_kind(1) == Some(TokenKind::LabelIdentifier) {
            self.bump(children)?;
            let label = self.parse_label()?;
            children.push(label);
            self.expect(TokenKind::RParen, ")", children)?;
        }
        self.accept_keyword(Keyword::Of, children);
        if !self.same_line() || !self.can_start_operand() {
            return Ok(None);
        }
        let operand = self.parse_atom()?;
        children.push(operand);
        if self.check(TokenKind::Slash) && self.peek_kind(2) == Some(TokenKind::Slash) {
            self.bump(children)?;
            self.bump(children)?;
            self.bump(children)?;
        }
        Ok(Some(operand))
    }

    fn parse_handler_body(
        &mut self,
        kind: HandlerKind,
        operand: Option<NodeId>,
        opener: &SyntaxToken,
        mut children: Vec<NodeId>,
    ) -> Result<NodeId> {
        let closer = match kind {
            HandlerKind::OnError => Keyword::EndError,
            HandlerKind::AtEndOfData => Keyword::EndEnddata,
            HandlerKind::AtEndOfFile => Keyword::EndEndfile,
            HandlerKind::AtStartOfData => Keyword::EndStart,
            HandlerKind::AtBreak => Keyword::EndBreak,
            HandlerKind::BeforeBreak => Keyword::EndBefore,
            HandlerKind::AtTopOfPage => Keyword::EndToppage,
            HandlerKind::AtEndOfPage => Keyword::EndEndpage,
        };
        let body = self.parse_block(handler_closer(closer));
        children.push(body);
        self.close_block(closer, opener, &mut children);
        Ok(self.finish_statement(
            Statement::Handler {
                kind,
                operand,
                body,
            },
            children,
        ))
    }

    // ========================================================================
    // DEFINE
    // ========================================================================

    /// `DEFINE SUBROUTINE`, `DEFINE WORK FILE`, `DEFINE PRINTER`.
    pub(super) fn parse_define_statement(&mut self) -> Result<NodeId> {
        if self.peek_keyword(1, Keyword::Work) {
            return self.parse_define_work_file();
        }
        if self.peek_keyword(1, Keyword::Printer) {
            return self.parse_define_printer();
        }
        if self.peek_keyword(1, Keyword::Data) {
            // DEFINE DATA is only valid at the top of the module
            self.tokens.advance();
            return Err(self.unexpected("statement"));
        }
        self.parse_subroutine_definition()
    }
}

/// Closer lists need a `'static` lifetime for the terminator stack.
fn handler_closer(closer: Keyword) -> &'static [Keyword] {
    match closer {
        Keyword::EndError => &[Keyword::EndError],
        Keyword::EndEnddata => &[Keyword::EndEnddata],
        Keyword::EndEndfile => &[Keyword::EndEndfile],
        Keyword::EndStart => &[Keyword::EndStart],
        Keyword::EndBreak => &[Keyword::EndBreak],
        Keyword::EndBefore => &[Keyword::EndBefore],
        Keyword::EndToppage => &[Keyword::EndToppage],
        _ => &[Keyword::EndEndpage],
    }
}
