// SPDX-License-Identifier: Apache-2.0
//! Logical condition parsing: `OR` binds loosest, then `AND`, then `NOT`.

use super::Result;
use crate::lexer::{Keyword, TokenKind};
use crate::syntax::{ComparisonOperator, Condition, NodeId, NodeKind};
use crate::types::DataType;

impl super::Parser<'_> {
    /// Parse a logical condition.
    pub(super) fn parse_condition(&mut self) -> Result<NodeId> {
        self.parse_or_condition()
    }

    fn parse_or_condition(&mut self) -> Result<NodeId> {
        let mut left = self.parse_and_condition()?;
        while self.check_keyword(Keyword::Or) {
            let mut children = vec![left];
            self.bump(&mut children)?;
            let right = self.parse_and_condition()?;
            children.push(right);
            left = self.finish_condition(Condition::Or { left, right }, children);
        }
        Ok(left)
    }

    fn parse_and_condition(&mut self) -> Result<NodeId> {
        let mut left = self.parse_not_condition()?;
        while self.check_keyword(Keyword::And) {
            let mut children = vec![left];
            self.bump(&mut children)?;
            let right = self.parse_not_condition()?;
            children.push(right);
            left = self.finish_condition(Condition::And { left, right }, children);
        }
        Ok(left)
    }

    fn parse_not_condition(&mut self) -> Result<NodeId> {
        if !self.check_keyword(Keyword::Not) {
            return self.parse_primary_condition();
        }
        let mut children = Vec::new();
        self.bump(&mut children)?;
        let inner = self.parse_not_condition()?;
        children.push(inner);
        Ok(self.finish_condition(Condition::Not { inner }, children))
    }

    fn parse_primary_condition(&mut self) -> Result<NodeId> {
        if self.check(TokenKind::LParen) && !self.peek_attribute(1) {
            // `(` opens either a nested condition or an arithmetic operand
            let cursor = self.tokens.cursor();
            let checkpoint = self.tree.checkpoint();
            let diagnostics = self.diagnostics.len();
            if let Ok(group) = self.parse_condition_group() {
                if !self.continues_operand() {
                    return Ok(group);
                }
            }
            self.tokens.set_cursor(cursor);
            self.tree.truncate(checkpoint);
            self.diagnostics.truncate(diagnostics);
        }
        self.parse_relational_condition()
    }

    fn parse_condition_group(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.bump(&mut children)?;
        let inner = self.parse_condition()?;
        children.push(inner);
        self.expect(TokenKind::RParen, ")", &mut children)?;
        Ok(self.finish_condition(Condition::Group { inner }, children))
    }

    /// Whether the token after a closing parenthesis still belongs to an
    /// operand or comparison.
    fn continues_operand(&self) -> bool {
        let Some(token) = self.tokens.peek() else {
            return false;
        };
        token.kind().is_comparison_symbol()
            || matches!(
                token.kind(),
                TokenKind::Plus
                    | TokenKind::Minus
                    | TokenKind::Asterisk
                    | TokenKind::Slash
                    | TokenKind::Power
            )
            || token.keyword().is_some_and(is_comparison_word)
    }

    fn parse_relational_condition(&mut self) -> Result<NodeId> {
        let left = self.parse_operand()?;
        let mut children = vec![left];

        let negated = self.check_keyword(Keyword::Not)
            && (self.peek_keyword(1, Keyword::Modified)
                || self.peek_keyword(1, Keyword::Specified)
                || self.peek_keyword(1, Keyword::Mask)
                || self.peek_keyword(1, Keyword::Scan));
        if negated {
            self.bump(&mut children)?;
        }

        if self.accept_keyword(Keyword::Modified, &mut children) {
            return Ok(self.finish_condition(
                Condition::Modified {
                    operand: left,
                    negated,
                },
                children,
            ));
        }
        if self.accept_keyword(Keyword::Specified, &mut children) {
            return Ok(self.finish_condition(
                Condition::Specified {
                    operand: left,
                    negated,
                },
                children,
            ));
        }
        if self.check_keyword(Keyword::Is) {
            return self.parse_is_format(left, children);
        }
        if negated && (self.check_keyword(Keyword::Mask) || self.check_keyword(Keyword::Scan)) {
            return self.parse_mask_or_scan(left, negated, children);
        }

        self.parse_comparison_rest(left, children)
    }

    /// Operator and right-hand side of a comparison whose left side is
    /// already parsed. Without an operator the left side stands alone.
    pub(super) fn parse_comparison_rest(
        &mut self,
        left: NodeId,
        mut children: Vec<NodeId>,
    ) -> Result<NodeId> {
        let Some(operator) = self.parse_comparison_operator(&mut children)? else {
            return Ok(self.finish_condition(Condition::Logical { operand: left }, children));
        };

        let not_before_pattern = self.check_keyword(Keyword::Not)
            && (self.peek_keyword(1, Keyword::Mask) || self.peek_keyword(1, Keyword::Scan));
        if not_before_pattern {
            self.bump(&mut children)?;
        }
        if self.check_keyword(Keyword::Mask) || self.check_keyword(Keyword::Scan) {
            let negated = not_before_pattern || operator == ComparisonOperator::NotEqual;
            return self.parse_mask_or_scan(left, negated, children);
        }

        let right = self.parse_operand()?;
        children.push(right);

        if self.accept_keyword(Keyword::Thru, &mut children) {
            let upper = self.parse_operand()?;
            children.push(upper);
            let mut excluded = None;
            if self.accept_keyword(Keyword::But, &mut children) {
                self.accept_keyword(Keyword::Not, &mut children);
                let value = self.parse_operand()?;
                children.push(value);
                excluded = Some(value);
            }
            return Ok(self.finish_condition(
                Condition::Range {
                    left,
                    operator,
                    lower: right,
                    upper,
                    excluded,
                },
                children,
            ));
        }

        let mut rights = vec![right];
        while self.check_keyword(Keyword::Or) && self.at_comparison_after(1) {
            self.bump(&mut children)?;
            self.parse_comparison_operator(&mut children)?;
            let value = self.parse_operand()?;
            children.push(value);
            rights.push(value);
        }
        if rights.len() > 1 {
            return Ok(self.finish_condition(
                Condition::Extended {
                    left,
                    operator,
                    rights,
                },
                children,
            ));
        }
        Ok(self.finish_condition(
            Condition::Relational {
                left,
                operator,
                right,
            },
            children,
        ))
    }

    fn at_comparison_after(&self, n: usize) -> bool {
        match self.peek_kind(n) {
            Some(kind) if kind.is_comparison_symbol() => true,
            Some(TokenKind::Keyword(kw)) => is_comparison_word(kw),
            _ => false,
        }
    }

    /// Relational operator in symbol or word form. Returns `None` when the
    /// current token is not one.
    fn parse_comparison_operator(
        &mut self,
        children: &mut Vec<NodeId>,
    ) -> Result<Option<ComparisonOperator>> {
        let Some(kind) = self.tokens.peek_kind() else {
            return Ok(None);
        };
        let operator = match kind {
            TokenKind::Equals => ComparisonOperator::Equal,
            TokenKind::NotEquals | TokenKind::CaretEquals => ComparisonOperator::NotEqual,
            TokenKind::Less => ComparisonOperator::Less,
            TokenKind::LessEquals => ComparisonOperator::LessEqual,
            TokenKind::Greater => ComparisonOperator::Greater,
            TokenKind::GreaterEquals => ComparisonOperator::GreaterEqual,
            TokenKind::Keyword(Keyword::Eq) => ComparisonOperator::Equal,
            TokenKind::Keyword(Keyword::Ne) => ComparisonOperator::NotEqual,
            TokenKind::Keyword(Keyword::Lt) => ComparisonOperator::Less,
            TokenKind::Keyword(Keyword::Le) => ComparisonOperator::LessEqual,
            TokenKind::Keyword(Keyword::Gt) => ComparisonOperator::Greater,
            TokenKind::Keyword(Keyword::Ge) => ComparisonOperator::GreaterEqual,
            TokenKind::Keyword(Keyword::Equal) => {
                self.bump(children)?;
                self.accept_keyword(Keyword::To, children);
                return Ok(Some(ComparisonOperator::Equal));
            }
            TokenKind::Keyword(Keyword::Not)
                if self.peek_keyword(1, Keyword::Equal)
                    || self.peek_kind(1) == Some(TokenKind::Equals) =>
            {
                self.bump(children)?;
                self.bump(children)?;
                self.accept_keyword(Keyword::To, children);
                return Ok(Some(ComparisonOperator::NotEqual));
            }
            TokenKind::Keyword(Keyword::Less) => {
                return self.parse_worded_comparison(
                    children,
                    ComparisonOperator::Less,
                    ComparisonOperator::LessEqual,
                )
            }
            TokenKind::Keyword(Keyword::Greater) => {
                return self.parse_worded_comparison(
                    children,
                    ComparisonOperator::Greater,
                    ComparisonOperator::GreaterEqual,
                )
            }
            _ => return Ok(None),
        };
        self.bump(children)?;
        Ok(Some(operator))
    }

    /// `LESS [THAN] [OR EQUAL [TO]]` and the `GREATER` forms.
    fn parse_worded_comparison(
        &mut self,
        children: &mut Vec<NodeId>,
        strict: ComparisonOperator,
        or_equal: ComparisonOperator,
    ) -> Result<Option<ComparisonOperator>> {
        self.bump(children)?;
        self.accept_keyword(Keyword::Than, children);
        if self.check_keyword(Keyword::Or) && self.peek_keyword(1, Keyword::Equal) {
            self.bump(children)?;
            self.bump(children)?;
            self.accept_keyword(Keyword::To, children);
            return Ok(Some(or_equal));
        }
        Ok(Some(strict))
    }

    /// `IS (format)`.
    fn parse_is_format(&mut self, operand: NodeId, mut children: Vec<NodeId>) -> Result<NodeId> {
        self.expect_keyword(Keyword::Is, &mut children)?;
        self.expect(TokenKind::LParen, "(", &mut children)?;
        let spec = self.bump(&mut children)?;
        self.expect(TokenKind::RParen, ")", &mut children)?;
        let data_type = DataType::parse_spec(spec.text());
        Ok(self.finish_condition(Condition::IsFormat { operand, data_type }, children))
    }

    /// `MASK (...)` or `SCAN operand`.
    fn parse_mask_or_scan(
        &mut self,
        operand: NodeId,
        negated: bool,
        mut children: Vec<NodeId>,
    ) -> Result<NodeId> {
        if self.accept_keyword(Keyword::Mask, &mut children) {
            self.expect(TokenKind::LParen, "(", &mut children)?;
            let mut depth = 1usize;
            while depth > 0 {
                let token = self.bump(&mut children)?;
                match token.kind() {
                    TokenKind::LParen => depth += 1,
                    TokenKind::RParen => depth -= 1,
                    _ => {}
                }
            }
            // an optional operand compared under the mask
            if self.can_start_operand() && self.same_line() && !self.at_condition_connective() {
                let value = self.parse_operand()?;
                children.push(value);
            }
            return Ok(self.finish_condition(Condition::Mask { operand, negated }, children));
        }
        self.expect_keyword(Keyword::Scan, &mut children)?;
        let value = self.parse_operand()?;
        children.push(value);
        Ok(self.finish_condition(
            Condition::Scan {
                operand,
                value,
                negated,
            },
            children,
        ))
    }

    fn at_condition_connective(&self) -> bool {
        self.check_keyword(Keyword::And) || self.check_keyword(Keyword::Or)
    }

    pub(super) fn finish_condition(&mut self, condition: Condition, children: Vec<NodeId>) -> NodeId {
        self.tree.finish(NodeKind::Condition(condition), children)
    }
}

fn is_comparison_word(kw: Keyword) -> bool {
    matches!(
        kw,
        Keyword::Eq
            | Keyword::Ne
            | Keyword::Lt
            | Keyword::Le
            | Keyword::Gt
            | Keyword::Ge
            | Keyword::Equal
            | Keyword::Less
            | Keyword::Greater
    )
}

#[cfg(test)]
mod tests {
    use crate::config::ParserOptions;
    use crate::lexer::NaturalLexer;
    use crate::module::{FileType, NaturalFile, SourceFile};
    use crate::parser::Parser;
    use crate::provider::EmptyProvider;
    use crate::syntax::{ComparisonOperator, Condition, NodeId, Statement, SyntaxTree};
    use open_mainframe_lang_core::FileId;

    fn if_condition(source: &str) -> (SyntaxTree, Option<Condition>, Vec<String>) {
        let file = SourceFile::new("TEST", FileType::Program, source);
        let tokens = NaturalLexer::new(FileId::MAIN).lex(&file.text);
        let natural = NaturalFile::for_source(&file, tokens.tokens());
        let options = ParserOptions::default();
        let parsed = Parser::new(tokens, &natural, &EmptyProvider, &options).parse();
        let codes = parsed.diagnostics.iter().map(|d| d.code.clone()).collect();
        let tree = parsed.tree;
        let condition = (0..tree.len() as u32).map(NodeId).find_map(|id| match tree.statement(id) {
            Some(Statement::If { condition, .. }) => tree.condition(*condition).cloned(),
            _ => None,
        });
        (tree, condition, codes)
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let (tree, condition, codes) =
            if_condition("IF #A = 1 OR #B = 2 AND #C = 3\nIGNORE\nEND-IF\nEND");
        assert!(codes.is_empty(), "{codes:?}");
        match condition {
            Some(Condition::Or { right, .. }) => {
                assert!(matches!(tree.condition(right), Some(Condition::And { .. })));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_word_operators() {
        let (_, condition, codes) =
            if_condition("IF #A LESS THAN OR EQUAL TO 5\nIGNORE\nEND-IF\nEND");
        assert!(codes.is_empty(), "{codes:?}");
        assert!(matches!(
            condition,
            Some(Condition::Relational {
                operator: ComparisonOperator::LessEqual,
                ..
            })
        ));
    }

    #[test]
    fn test_extended_relation() {
        let (_, condition, _) = if_condition("IF #A = 1 OR = 2 OR = 3\nIGNORE\nEND-IF\nEND");
        match condition {
            Some(Condition::Extended { rights, .. }) => assert_eq!(rights.len(), 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_range_with_but() {
        let (_, condition, _) = if_condition("IF #A = 1 THRU 10 BUT 5\nIGNORE\nEND-IF\nEND");
        assert!(matches!(condition, Some(Condition::Range { excluded: Some(_), .. })));
    }

    #[test]
    fn test_parenthesized_arithmetic_is_not_a_group() {
        let (_, condition, codes) = if_condition("IF (#A + 1) > 2\nIGNORE\nEND-IF\nEND");
        assert!(codes.is_empty(), "{codes:?}");
        assert!(matches!(condition, Some(Condition::Relational { .. })));

        let (_, condition, codes) = if_condition("IF NOT (#A = 1)\nIGNORE\nEND-IF\nEND");
        assert!(codes.is_empty(), "{codes:?}");
        assert!(matches!(condition, Some(Condition::Not { .. })));
    }

    #[test]
    fn test_modified_specified_mask() {
        let (_, condition, _) = if_condition("IF #A NOT MODIFIED\nIGNORE\nEND-IF\nEND");
        assert!(matches!(condition, Some(Condition::Modified { negated: true, .. })));
        let (_, condition, _) = if_condition("IF #P SPECIFIED\nIGNORE\nEND-IF\nEND");
        assert!(matches!(condition, Some(Condition::Specified { negated: false, .. })));
        let (_, condition, codes) = if_condition("IF #A = MASK (NN)\nIGNORE\nEND-IF\nEND");
        assert!(codes.is_empty(), "{codes:?}");
        assert!(matches!(condition, Some(Condition::Mask { negated: false, .. })));
    }

    #[test]
    fn test_is_format() {
        let (_, condition, _) = if_condition("IF #A IS (N5)\nIGNORE\nEND-IF\nEND");
        assert!(matches!(condition, Some(Condition::IsFormat { data_type: Some(_), .. })));
    }
}
