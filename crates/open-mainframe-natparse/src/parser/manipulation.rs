// SPDX-License-Identifier: Apache-2.0
//! Data manipulation statements: assignment, arithmetic, MOVE, COMPRESS,
//! EXAMINE, SEPARATE, RESET and array resizing.

use super::Result;
use crate::lexer::{Keyword, TokenKind};
use crate::syntax::{ArithmeticStatementKind, MoveKind, NodeId, Operand, ResizeKind, Statement};

impl super::Parser<'_> {
    // ========================================================================
    // ASSIGNMENT
    // ========================================================================

    /// `target := value`.
    pub(super) fn parse_assignment(&mut self) -> Result<NodeId> {
        let target = self.parse_atom()?;
        let mut children = vec![target];
        self.expect(TokenKind::ColonEquals, ":=", &mut children)?;
        let value = self.parse_operand()?;
        children.push(value);
        Ok(self.finish_statement(
            Statement::Assign {
                target,
                value,
                rounded: false,
            },
            children,
        ))
    }

    /// `COMPUTE|ASSIGN [ROUNDED] target :=|= value`.
    pub(super) fn parse_compute_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.bump(&mut children)?;
        let rounded = self.accept_keyword(Keyword::Rounded, &mut children);
        let target = self.parse_atom()?;
        children.push(target);
        if !self.accept(TokenKind::ColonEquals, &mut children) {
            self.expect(TokenKind::Equals, ":=", &mut children)?;
        }
        let value = self.parse_operand()?;
        children.push(value);
        Ok(self.finish_statement(
            Statement::Assign {
                target,
                value,
                rounded,
            },
            children,
        ))
    }

    // ========================================================================
    // ARITHMETIC
    // ========================================================================

    /// `ADD ... TO`, `SUBTRACT ... FROM`, `MULTIPLY ... BY`, `DIVIDE ... INTO`,
    /// each with optional `ROUNDED` and `GIVING`; DIVIDE also `REMAINDER`.
    pub(super) fn parse_arithmetic_statement(&mut self) -> Result<NodeId> {
        let kind = match self.tokens.peek_kind() {
            Some(TokenKind::Keyword(Keyword::Subtract)) => ArithmeticStatementKind::Subtract,
            Some(TokenKind::Keyword(Keyword::Multiply)) => ArithmeticStatementKind::Multiply,
            Some(TokenKind::Keyword(Keyword::Divide)) => ArithmeticStatementKind::Divide,
            _ => ArithmeticStatementKind::Add,
        };
        let mut children = Vec::new();
        self.bump(&mut children)?;
        let rounded = self.accept_keyword(Keyword::Rounded, &mut children);

        let (operands, target) = match kind {
            ArithmeticStatementKind::Add | ArithmeticStatementKind::Subtract => {
                let preposition = if kind == ArithmeticStatementKind::Add {
                    Keyword::To
                } else {
                    Keyword::From
                };
                let operands =
                    self.parse_operand_list(&[preposition, Keyword::Giving], &mut children)?;
                let target = if self.accept_keyword(preposition, &mut children) {
                    let target = self.parse_operand()?;
                    children.push(target);
                    Some(target)
                } else {
                    None
                };
                (operands, target)
            }
            ArithmeticStatementKind::Multiply => {
                let target = self.parse_operand()?;
                children.push(target);
                self.expect_keyword(Keyword::By, &mut children)?;
                let operands = self.parse_operand_list(&[Keyword::Giving], &mut children)?;
                (operands, Some(target))
            }
            ArithmeticStatementKind::Divide => {
                let divisor = self.parse_operand()?;
                children.push(divisor);
                self.expect_keyword(Keyword::Into, &mut children)?;
                let target = self.parse_operand()?;
                children.push(target);
                (vec![divisor], Some(target))
            }
        };

        let giving = if self.accept_keyword(Keyword::Giving, &mut children) {
            let giving = self.parse_operand()?;
            children.push(giving);
            Some(giving)
        } else {
            None
        };
        let remainder = if kind == ArithmeticStatementKind::Divide
            && self.accept_keyword(Keyword::Remainder, &mut children)
        {
            let remainder = self.parse_operand()?;
            children.push(remainder);
            Some(remainder)
        } else {
            None
        };
        Ok(self.finish_statement(
            Statement::Arithmetic {
                kind,
                rounded,
                operands,
                target,
                giving,
                remainder,
            },
            children,
        ))
    }

    // ========================================================================
    // MOVE
    // ========================================================================

    /// `MOVE [ROUNDED|ALL|BY NAME|BY POSITION|EDITED|LEFT|RIGHT [JUSTIFIED]]
    /// source TO targets`.
    pub(super) fn parse_move_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect_keyword(Keyword::Move, &mut children)?;
        let mut rounded = false;
        let kind = if self.accept_keyword(Keyword::Rounded, &mut children) {
            rounded = true;
            MoveKind::Plain
        } else if self.accept_keyword(Keyword::All, &mut children) {
            MoveKind::All
        } else if self.accept_keyword(Keyword::By, &mut children) {
            if self.accept_keyword(Keyword::Position, &mut children) {
                MoveKind::ByPosition
            } else {
                self.accept_keyword(Keyword::Name, &mut children);
                MoveKind::ByName
            }
        } else if self.accept_keyword(Keyword::Edited, &mut children) {
            MoveKind::Edited
        } else if self.accept_keyword(Keyword::Left, &mut children) {
            self.accept_keyword(Keyword::Justified, &mut children);
            MoveKind::LeftJustified
        } else if self.accept_keyword(Keyword::Right, &mut children) {
            self.accept_keyword(Keyword::Justified, &mut children);
            MoveKind::RightJustified
        } else {
            MoveKind::Plain
        };

        let source = self.parse_operand()?;
        children.push(source);
        self.expect_keyword(Keyword::To, &mut children)?;
        let targets = if kind == MoveKind::Plain {
            self.parse_operand_list(&[], &mut children)?
        } else {
            let target = self.parse_operand()?;
            children.push(target);
            vec![target]
        };
        if kind == MoveKind::All && self.accept_keyword(Keyword::Until, &mut children) {
            let until = self.parse_operand()?;
            children.push(until);
        }
        if targets.is_empty() {
            return Err(self.unexpected("MOVE target"));
        }
        Ok(self.finish_statement(
            Statement::Move {
                kind,
                source,
                targets,
                rounded,
            },
            children,
        ))
    }

    // ========================================================================
    // STRING HANDLING
    // ========================================================================

    /// `COMPRESS [NUMERIC] [FULL] operands INTO target
    /// [LEAVING [NO] [SPACE] | WITH [ALL] DELIMITER[S] [d]]`.
    pub(super) fn parse_compress_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect_keyword(Keyword::Compress, &mut children)?;
        let numeric = self.accept_keyword(Keyword::Numeric, &mut children);
        self.accept_keyword(Keyword::Full, &mut children);
        let operands = self.parse_operand_list(&[Keyword::Into], &mut children)?;
        self.expect_keyword(Keyword::Into, &mut children)?;
        let target = self.parse_operand()?;
        children.push(target);

        let mut leaving_no_space = false;
        if self.accept_keyword(Keyword::Leaving, &mut children) {
            leaving_no_space = self.accept_keyword(Keyword::No, &mut children);
            self.accept_keyword(Keyword::Space, &mut children);
        } else if self.check_keyword(Keyword::With) && !self.is_assignment_start() {
            self.bump(&mut children)?;
            self.accept_keyword(Keyword::All, &mut children);
            if self.check_keyword(Keyword::Delimiter) || self.check_keyword(Keyword::Delimiters) {
                self.bump(&mut children)?;
            }
            if self.same_line() && self.can_start_operand() {
                let delimiter = self.parse_operand()?;
                children.push(delimiter);
            }
        }
        Ok(self.finish_statement(
            Statement::Compress {
                operands,
                target,
                numeric,
                leaving_no_space,
            },
            children,
        ))
    }

    /// `EXAMINE [FULL] operand FOR [FULL] [PATTERN] pattern [WITH DELIMITERS d]
    /// [DELETE|REPLACE [FIRST] [WITH] [FULL] r] [GIVING NUMBER|POSITION|LENGTH|INDEX v]...`
    /// or `EXAMINE operand TRANSLATE ...`.
    pub(super) fn parse_examine_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect_keyword(Keyword::Examine, &mut children)?;
        self.accept_keyword(Keyword::Full, &mut children);
        if self.accept_keyword(Keyword::Direction, &mut children) {
            self.bump(&mut children)?;
        }
        let operand = self.parse_operand()?;
        children.push(operand);

        if Self::is_word(self.tokens.peek(), "TRANSLATE") {
            self.consume_rest_of_line(&mut children);
            return Ok(self.finish_statement(
                Statement::Examine {
                    operand,
                    pattern: None,
                    replacement: None,
                    giving: Vec::new(),
                },
                children,
            ));
        }

        self.expect_keyword(Keyword::For, &mut children)?;
        self.accept_keyword(Keyword::Full, &mut children);
        self.accept_keyword(Keyword::Pattern, &mut children);
        let pattern = self.parse_operand()?;
        children.push(pattern);
        if self.check_keyword(Keyword::With)
            && (self.peek_keyword(1, Keyword::Delimiters)
                || self.peek_keyword(1, Keyword::Delimiter))
        {
            self.bump(&mut children)?;
            self.bump(&mut children)?;
            if self.same_line() && self.can_start_operand() && !self.at_examine_clause() {
                let delimiter = self.parse_operand()?;
                children.push(delimiter);
            }
        }
        self.accept_keyword(Keyword::And, &mut children);

        let mut replacement = None;
        if self.accept_keyword(Keyword::Delete, &mut children) {
            self.accept_keyword(Keyword::First, &mut children);
        } else if self.accept_keyword(Keyword::Replace, &mut children) {
            self.accept_keyword(Keyword::First, &mut children);
            self.accept_keyword(Keyword::With, &mut children);
            self.accept_keyword(Keyword::Full, &mut children);
            let value = self.parse_operand()?;
            children.push(value);
            replacement = Some(value);
        }

        let mut giving = Vec::new();
        while self.accept_keyword(Keyword::Giving, &mut children) {
            for kw in [Keyword::Number, Keyword::Position, Keyword::Length, Keyword::Index] {
                if self.accept_keyword(kw, &mut children) {
                    break;
                }
            }
            self.accept_keyword(Keyword::In, &mut children);
            let target = self.parse_operand()?;
            children.push(target);
            giving.push(target);
        }
        Ok(self.finish_statement(
            Statement::Examine {
                operand,
                pattern: Some(pattern),
                replacement,
                giving,
            },
            children,
        ))
    }

    fn at_examine_clause(&self) -> bool {
        [Keyword::And, Keyword::Delete, Keyword::Replace, Keyword::Giving]
            .iter()
            .any(|kw| self.check_keyword(*kw))
    }

    /// `SEPARATE source [LEFT [JUSTIFIED]] INTO targets [IGNORE]
    /// [WITH [RETAINED] [ANY|INPUT] DELIMITERS [d]] [GIVING NUMBER [IN] n]`.
    pub(super) fn parse_separate_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect_keyword(Keyword::Separate, &mut children)?;
        let source = self.parse_operand()?;
        children.push(source);
        if self.accept_keyword(Keyword::Left, &mut children) {
            self.accept_keyword(Keyword::Justified, &mut children);
        }
        self.expect_keyword(Keyword::Into, &mut children)?;
        let targets =
            self.parse_operand_list(&[Keyword::With, Keyword::Giving], &mut children)?;
        if self.same_line() {
            self.accept_keyword(Keyword::Ignore, &mut children);
        }
        if self.check_keyword(Keyword::With) && !self.is_assignment_start() {
            self.bump(&mut children)?;
            self.accept_keyword(Keyword::Retained, &mut children);
            if !self.accept_keyword(Keyword::Any, &mut children) {
                self.accept_keyword(Keyword::Input, &mut children);
            }
            if self.check_keyword(Keyword::Delimiter) || self.check_keyword(Keyword::Delimiters) {
                self.bump(&mut children)?;
            }
            if self.same_line() && self.can_start_operand() && !self.check_keyword(Keyword::Giving)
            {
                let delimiter = self.parse_operand()?;
                children.push(delimiter);
            }
        }
        let mut giving_number = None;
        if self.accept_keyword(Keyword::Giving, &mut children) {
            self.accept_keyword(Keyword::Number, &mut children);
            self.accept_keyword(Keyword::In, &mut children);
            let number = self.parse_operand()?;
            children.push(number);
            giving_number = Some(number);
        }
        Ok(self.finish_statement(
            Statement::Separate {
                source,
                targets,
                giving_number,
            },
            children,
        ))
    }

    /// `RESET [INITIAL] targets`.
    pub(super) fn parse_reset_statement(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect_keyword(Keyword::Reset, &mut children)?;
        let initial = self.accept_keyword(Keyword::Initial, &mut children);
        let targets = self.parse_operand_list(&[], &mut children)?;
        if targets.is_empty() {
            return Err(self.unexpected("RESET target"));
        }
        Ok(self.finish_statement(Statement::Reset { initial, targets }, children))
    }

    // ========================================================================
    // ARRAYS AND DYNAMIC VARIABLES
    // ========================================================================

    /// `EXPAND|RESIZE|REDUCE [AND RESET] [SIZE OF] [DYNAMIC] [VARIABLE|ARRAY]
    /// operand TO bounds [GIVING err]`.
    pub(super) fn parse_array_resize_statement(&mut self) -> Result<NodeId> {
        let kind = match self.tokens.peek_kind() {
            Some(TokenKind::Keyword(Keyword::Resize)) => ResizeKind::Resize,
            Some(TokenKind::Keyword(Keyword::Reduce)) => ResizeKind::Reduce,
            _ => ResizeKind::Expand,
        };
        let mut children = Vec::new();
        self.bump(&mut children)?;
        if self.check_keyword(Keyword::And) && self.peek_keyword(1, Keyword::Reset) {
            self.bump(&mut children)?;
            self.bump(&mut children)?;
        }
        for kw in [
            Keyword::Size,
            Keyword::Occurrences,
            Keyword::Of,
            Keyword::Dynamic,
            Keyword::Variable,
            Keyword::Array,
        ] {
            self.accept_keyword(kw, &mut children);
        }
        let operand = self.parse_reference()?;
        children.push(operand);
        self.expect_keyword(Keyword::To, &mut children)?;

        let mut bounds = Vec::new();
        if self.accept(TokenKind::LParen, &mut children) {
            loop {
                let bound = self.parse_resize_bound()?;
                children.push(bound);
                bounds.push(bound);
                if !self.accept(TokenKind::Comma, &mut children) {
                    break;
                }
            }
            self.expect(TokenKind::RParen, ")", &mut children)?;
        } else {
            let bound = self.parse_operand()?;
            children.push(bound);
            bounds.push(bound);
        }

        let giving = if self.accept_keyword(Keyword::Giving, &mut children) {
            let giving = self.parse_operand()?;
            children.push(giving);
            Some(giving)
        } else {
            None
        };
        Ok(self.finish_statement(
            Statement::ArrayResize {
                kind,
                operand,
                bounds,
                giving,
            },
            children,
        ))
    }

    /// `n`, `*`, `lower:upper` with either side possibly `*`.
    fn parse_resize_bound(&mut self) -> Result<NodeId> {
        let lower = self.parse_resize_bound_value()?;
        if !self.check(TokenKind::Colon) {
            return Ok(lower);
        }
        let mut children = vec![lower];
        self.bump(&mut children)?;
        let upper = self.parse_resize_bound_value()?;
        children.push(upper);
        Ok(self.finish_operand(Operand::Range { lower, upper }, children))
    }

    fn parse_resize_bound_value(&mut self) -> Result<NodeId> {
        if self.check(TokenKind::Asterisk) {
            let mut children = Vec::new();
            self.bump(&mut children)?;
            return Ok(self.finish_operand(Operand::Star, children));
        }
        if self.check(TokenKind::NumberLiteral) {
            self.split_comma_number();
        }
        self.parse_operand()
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ParserOptions;
    use crate::lexer::NaturalLexer;
    use crate::module::{FileType, NaturalFile, SourceFile};
    use crate::parser::{ParsedModule, Parser};
    use crate::provider::EmptyProvider;
    use crate::syntax::{ArithmeticStatementKind, MoveKind, NodeId, Statement};
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
    fn test_compute_and_assign() {
        let parsed = parse("COMPUTE ROUNDED #A = #B / 3\nASSIGN #C := 1\n#D(1) := 2\nEND\n");
        assert!(codes(&parsed).is_empty(), "{:?}", codes(&parsed));
        let rounded: Vec<bool> = statements(&parsed)
            .into_iter()
            .filter_map(|s| match s {
                Statement::Assign { rounded, .. } => Some(rounded),
                _ => None,
            })
            .collect();
        assert_eq!(rounded, vec![true, false, false]);
    }

    #[test]
    fn test_arithmetic_statements() {
        let parsed = parse(
            "ADD 1 2 TO #SUM\nSUBTRACT #A FROM #B GIVING #C\nMULTIPLY ROUNDED #A BY 2\nDIVIDE 3 INTO #A GIVING #Q REMAINDER #R\nEND\n",
        );
        assert!(codes(&parsed).is_empty(), "{:?}", codes(&parsed));
        let all: Vec<_> = statements(&parsed)
            .into_iter()
            .filter_map(|s| match s {
                Statement::Arithmetic {
                    kind,
                    rounded,
                    operands,
                    giving,
                    remainder,
                    ..
                } => Some((kind, rounded, operands.len(), giving.is_some(), remainder.is_some())),
                _ => None,
            })
            .collect();
        assert_eq!(
            all,
            vec![
                (ArithmeticStatementKind::Add, false, 2, false, false),
                (ArithmeticStatementKind::Subtract, false, 1, true, false),
                (ArithmeticStatementKind::Multiply, true, 1, false, false),
                (ArithmeticStatementKind::Divide, false, 1, true, true),
            ]
        );
    }

    #[test]
    fn test_move_variants() {
        let parsed = parse(
            "MOVE 'X' TO #A #B\nMOVE ALL '*' TO #LINE UNTIL 10\nMOVE BY NAME #G1 TO #G2\nMOVE EDITED #D (EM=YYYY-MM-DD) TO #S\nMOVE LEFT JUSTIFIED #A TO #B\nEND\n",
        );
        assert!(codes(&parsed).is_empty(), "{:?}", codes(&parsed));
        let kinds: Vec<_> = statements(&parsed)
            .into_iter()
            .filter_map(|s| match s {
                Statement::Move { kind, targets, .. } => Some((kind, targets.len())),
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                (MoveKind::Plain, 2),
                (MoveKind::All, 1),
                (MoveKind::ByName, 1),
                (MoveKind::Edited, 1),
                (MoveKind::LeftJustified, 1),
            ]
        );
    }

    #[test]
    fn test_string_statements() {
        let parsed = parse(
            "COMPRESS #A 'B' INTO #C LEAVING NO SPACE\nEXAMINE #A FOR 'X' REPLACE WITH 'Y' GIVING NUMBER #N\nSEPARATE #A INTO #B #C WITH DELIMITERS ',' GIVING NUMBER #N\nRESET INITIAL #A #B\nEND\n",
        );
        assert!(codes(&parsed).is_empty(), "{:?}", codes(&parsed));
        let all = statements(&parsed);
        assert!(all.iter().any(|s| matches!(
            s,
            Statement::Compress { operands, leaving_no_space: true, .. } if operands.len() == 2
        )));
        assert!(all.iter().any(|s| matches!(
            s,
            Statement::Examine { replacement: Some(_), giving, .. } if giving.len() == 1
        )));
        assert!(all.iter().any(|s| matches!(
            s,
            Statement::Separate { targets, giving_number: Some(_), .. } if targets.len() == 2
        )));
        assert!(all.iter().any(|s| matches!(
            s,
            Statement::Reset { initial: true, targets } if targets.len() == 2
        )));
    }

    #[test]
    fn test_array_resize() {
        let parsed = parse("EXPAND ARRAY #ARR TO (1:10,*:*)\nREDUCE DYNAMIC VARIABLE #TXT TO 0\nEND\n");
        assert!(codes(&parsed).is_empty(), "{:?}", codes(&parsed));
        let bounds: Vec<usize> = statements(&parsed)
            .into_iter()
            .filter_map(|s| match s {
                Statement::ArrayResize { bounds, .. } => Some(bounds.len()),
                _ => None,
            })
            .collect();
        assert_eq!(bounds, vec![2, 1]);
    }
}
