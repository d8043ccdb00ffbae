// SPDX-License-Identifier: Apache-2.0
//! Operand parsing.
//!
//! Arithmetic expressions use the usual precedence: `+`/`-` below `*`/`/`,
//! `**` binding tightest and associating to the right. Output statements
//! use [`Parser::parse_output_operand`], which never reads `/` or `-` as an
//! operator.

use super::Result;
use crate::lexer::{Keyword, SyntaxToken, TokenKind};
use crate::syntax::{ArithmeticOperator, NodeId, NodeKind, Operand, SymbolKind, UnaryOperator};

/// Bare words accepted as system function arguments.
const FUNCTION_OPTIONS: &[&str] = &["LEADING", "TRAILING", "UPPER", "LOWER", "ALL"];

/// Keyword functions that take a parenthesized argument list.
const KEYWORD_FUNCTIONS: &[Keyword] = &[
    Keyword::Val,
    Keyword::Abs,
    Keyword::Int,
    Keyword::Frac,
    Keyword::Sgn,
    Keyword::Sqrt,
    Keyword::Ret,
    Keyword::Pos,
];

impl super::Parser<'_> {
    // ========================================================================
    // LOOKAHEAD
    // ========================================================================

    /// Whether the current tokens start `target := value`.
    pub(super) fn is_assignment_start(&self) -> bool {
        let Some(first) = self.tokens.peek() else {
            return false;
        };
        if !first.is_identifier_like() && first.kind() != TokenKind::SystemVariable {
            return false;
        }
        match self.peek_kind(1) {
            Some(TokenKind::ColonEquals) => true,
            Some(TokenKind::LParen) => {
                let mut depth = 0usize;
                let mut n = 1;
                while let Some(kind) = self.peek_kind(n) {
                    match kind {
                        TokenKind::LParen => depth += 1,
                        TokenKind::RParen => {
                            depth = depth.saturating_sub(1);
                            if depth == 0 {
                                return self.peek_kind(n + 1) == Some(TokenKind::ColonEquals);
                            }
                        }
                        TokenKind::Keyword(kw) if !kw.is_soft() => return false,
                        _ => {}
                    }
                    n += 1;
                }
                false
            }
            _ => false,
        }
    }

    /// Whether the current token can begin an operand.
    pub(super) fn can_start_operand(&self) -> bool {
        let Some(token) = self.tokens.peek() else {
            return false;
        };
        token.kind().is_literal()
            || token.is_identifier_like()
            || matches!(
                token.kind(),
                TokenKind::SystemVariable
                    | TokenKind::SystemFunction
                    | TokenKind::LParen
                    | TokenKind::Minus
                    | TokenKind::Plus
                    | TokenKind::OperandSkip
                    | TokenKind::Tab
            )
    }

    /// Whether an operand list ends before the current token.
    pub(super) fn at_operand_list_end(&self, stops: &[Keyword]) -> bool {
        let Some(token) = self.tokens.peek() else {
            return true;
        };
        if self.at_limit() || self.at_site_start() || self.at_terminator() {
            return true;
        }
        if token.kind() == TokenKind::LabelIdentifier {
            return true;
        }
        if let Some(kw) = token.keyword() {
            if !kw.is_soft() || stops.contains(&kw) {
                return true;
            }
        }
        self.is_assignment_start() || !self.can_start_operand()
    }

    // ========================================================================
    // OPERAND LISTS
    // ========================================================================

    /// Parse operands until one of `stops`, a hard keyword or the start of
    /// another statement. Separating commas become leaves of `children`.
    pub(super) fn parse_operand_list(
        &mut self,
        stops: &[Keyword],
        children: &mut Vec<NodeId>,
    ) -> Result<Vec<NodeId>> {
        let mut operands = Vec::new();
        loop {
            if self.check(TokenKind::Comma) && !operands.is_empty() {
                self.bump(children)?;
                continue;
            }
            if self.at_operand_list_end(stops) {
                break;
            }
            let operand = self.parse_operand()?;
            children.push(operand);
            operands.push(operand);
        }
        Ok(operands)
    }

    /// Like [`Parser::parse_operand_list`] for output statements.
    pub(super) fn parse_output_operand_list(
        &mut self,
        stops: &[Keyword],
        children: &mut Vec<NodeId>,
    ) -> Result<Vec<NodeId>> {
        let mut operands = Vec::new();
        loop {
            if self.check(TokenKind::Comma) {
                self.bump(children)?;
                continue;
            }
            if self.check(TokenKind::LParen) && self.peek_attribute(1) {
                // statement-wide attributes such as `WRITE (AD=I) ...`
                let attributes = self.parse_attribute_list()?;
                children.push(attributes);
                continue;
            }
            if !self.check(TokenKind::Slash) && self.at_operand_list_end(stops) {
                break;
            }
            if self.tokens.peek().is_none() {
                break;
            }
            let operand = self.parse_output_operand()?;
            children.push(operand);
            operands.push(operand);
        }
        Ok(operands)
    }

    // ========================================================================
    // EXPRESSIONS
    // ========================================================================

    /// Parse an arithmetic operand.
    pub(super) fn parse_operand(&mut self) -> Result<NodeId> {
        self.parse_additive()
    }

    fn parse_additive(&mut self) -> Result<NodeId> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let operator = match self.tokens.peek_kind() {
                Some(TokenKind::Plus) => ArithmeticOperator::Add,
                Some(TokenKind::Minus) => ArithmeticOperator::Subtract,
                _ => break,
            };
            let mut children = vec![left];
            self.bump(&mut children)?;
            let right = self.parse_multiplicative()?;
            children.push(right);
            left = self.finish_operand(
                Operand::Arithmetic {
                    operator,
                    left,
                    right,
                },
                children,
            );
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<NodeId> {
        let mut left = self.parse_unary()?;
        loop {
            let operator = match self.tokens.peek_kind() {
                Some(TokenKind::Asterisk) => ArithmeticOperator::Multiply,
                Some(TokenKind::Slash) => ArithmeticOperator::Divide,
                _ => break,
            };
            let mut children = vec![left];
            self.bump(&mut children)?;
            let right = self.parse_unary()?;
            children.push(right);
            left = self.finish_operand(
                Operand::Arithmetic {
                    operator,
                    left,
                    right,
                },
                children,
            );
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<NodeId> {
        let operator = match self.tokens.peek_kind() {
            Some(TokenKind::Minus) => UnaryOperator::Minus,
            Some(TokenKind::Plus) => UnaryOperator::Plus,
            _ => return self.parse_power(),
        };
        let mut children = Vec::new();
        self.bump(&mut children)?;
        let operand = self.parse_unary()?;
        children.push(operand);
        Ok(self.finish_operand(Operand::Unary { operator, operand }, children))
    }

    fn parse_power(&mut self) -> Result<NodeId> {
        let base = self.parse_primary()?;
        if !self.check(TokenKind::Power) {
            return Ok(base);
        }
        let mut children = vec![base];
        self.bump(&mut children)?;
        let exponent = self.parse_unary()?;
        children.push(exponent);
        Ok(self.finish_operand(
            Operand::Arithmetic {
                operator: ArithmeticOperator::Power,
                left: base,
                right: exponent,
            },
            children,
        ))
    }

    fn parse_primary(&mut self) -> Result<NodeId> {
        if self.check(TokenKind::LParen) && !self.peek_attribute(1) {
            let mut children = Vec::new();
            self.bump(&mut children)?;
            let inner = self.parse_operand()?;
            children.push(inner);
            self.expect(TokenKind::RParen, ")", &mut children)?;
            return Ok(self.finish_operand(Operand::Parenthesized { inner }, children));
        }
        let atom = self.parse_atom()?;
        self.parse_attributes_after(atom)
    }

    /// One operand without arithmetic, as written in output statements.
    pub(super) fn parse_output_operand(&mut self) -> Result<NodeId> {
        if self.check(TokenKind::Slash) {
            let mut children = Vec::new();
            self.bump(&mut children)?;
            return Ok(self.finish_operand(Operand::LineAdvance, children));
        }
        if self.check(TokenKind::Minus) || self.check(TokenKind::Plus) {
            return self.parse_unary();
        }
        let atom = self.parse_atom()?;
        self.parse_attributes_after(atom)
    }

    // ========================================================================
    // ATOMS
    // ========================================================================

    /// A single operand: literal, system variable or function, label,
    /// column skip or variable reference.
    pub(super) fn parse_atom(&mut self) -> Result<NodeId> {
        let Some(token) = self.tokens.peek().cloned() else {
            return Err(self.unexpected("operand"));
        };
        let mut children = Vec::new();
        match token.kind() {
            kind if kind.is_literal() => self.parse_literal(),
            TokenKind::SystemVariable => {
                let token = self.bump(&mut children)?;
                let token_id = children[0];
                let label = if self.check(TokenKind::LParen)
                    && self.peek_kind(1) == Some(TokenKind::LabelIdentifier)
                    && self.peek_kind(2) == Some(TokenKind::RParen)
                {
                    self.bump(&mut children)?;
                    let label = self.parse_label()?;
                    children.push(label);
                    self.bump(&mut children)?;
                    Some(label)
                } else {
                    None
                };
                tracing::trace!(name = %token.upper(), "system variable");
                Ok(self.finish_operand(
                    Operand::SystemVariable {
                        token: token_id,
                        label,
                    },
                    children,
                ))
            }
            TokenKind::SystemFunction => self.parse_system_function(),
            TokenKind::OperandSkip => {
                self.bump(&mut children)?;
                let token = children[0];
                Ok(self.finish_operand(Operand::Skip { token }, children))
            }
            TokenKind::Tab => {
                self.bump(&mut children)?;
                let token = children[0];
                Ok(self.finish_operand(Operand::Tab { token }, children))
            }
            TokenKind::LabelIdentifier => self.parse_label(),
            TokenKind::Keyword(Keyword::Substr | Keyword::Substring)
                if self.peek_kind(1) == Some(TokenKind::LParen) =>
            {
                self.parse_substring()
            }
            TokenKind::Keyword(kw)
                if KEYWORD_FUNCTIONS.contains(&kw)
                    && self.peek_kind(1) == Some(TokenKind::LParen) =>
            {
                self.parse_keyword_function()
            }
            _ if token.is_identifier_like() => self.parse_reference(),
            _ => Err(self.unexpected("operand")),
        }
    }

    fn parse_literal(&mut self) -> Result<NodeId> {
        let first = self.parse_literal_part()?;
        if !self.check(TokenKind::StringConcat) {
            return Ok(first);
        }
        let mut children = vec![first];
        let mut parts = vec![first];
        while self.check(TokenKind::StringConcat) {
            self.bump(&mut children)?;
            if !self.tokens.peek().is_some_and(|t| t.kind().is_literal()) {
                return Err(self.unexpected("string literal"));
            }
            let part = self.parse_literal_part()?;
            children.push(part);
            parts.push(part);
        }
        Ok(self.finish_operand(Operand::StringConcat { parts }, children))
    }

    fn parse_literal_part(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.bump(&mut children)?;
        let token = children[0];
        Ok(self.finish_operand(Operand::Literal { token }, children))
    }

    pub(super) fn parse_label(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect(TokenKind::LabelIdentifier, "label", &mut children)?;
        let token = children[0];
        Ok(self.finish_operand(Operand::Label { token }, children))
    }

    /// Variable reference with an optional index list.
    pub(super) fn parse_reference(&mut self) -> Result<NodeId> {
        let Some(token) = self.tokens.advance() else {
            return Err(self.unexpected("variable"));
        };
        let symbol = self.tree.symbol(token, SymbolKind::Variable);
        let mut children = vec![symbol];
        let mut indices = Vec::new();
        if self.check(TokenKind::LParen) && !self.peek_attribute(1) {
            self.bump(&mut children)?;
            loop {
                if self.check(TokenKind::NumberLiteral) {
                    self.split_comma_number();
                }
                let index = self.parse_index()?;
                children.push(index);
                indices.push(index);
                if !self.accept(TokenKind::Comma, &mut children) {
                    break;
                }
            }
            self.expect(TokenKind::RParen, ")", &mut children)?;
        }
        Ok(self.finish_operand(Operand::Reference { symbol, indices }, children))
    }

    /// `*`, a label, an expression or `lower:upper`.
    fn parse_index(&mut self) -> Result<NodeId> {
        if self.check(TokenKind::Asterisk) {
            let mut children = Vec::new();
            self.bump(&mut children)?;
            return Ok(self.finish_operand(Operand::Star, children));
        }
        if self.check(TokenKind::LabelIdentifier) {
            return self.parse_label();
        }
        let lower = self.parse_operand()?;
        if !self.check(TokenKind::Colon) {
            return Ok(lower);
        }
        let mut children = vec![lower];
        self.bump(&mut children)?;
        let upper = if self.check(TokenKind::Asterisk) {
            let mut star = Vec::new();
            self.bump(&mut star)?;
            self.finish_operand(Operand::Star, star)
        } else {
            self.parse_operand()?
        };
        children.push(upper);
        Ok(self.finish_operand(Operand::Range { lower, upper }, children))
    }

    fn parse_system_function(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.bump(&mut children)?;
        let token = children[0];
        let mut arguments = Vec::new();
        if self.check(TokenKind::LParen) && !self.peek_attribute(1) {
            self.bump(&mut children)?;
            while !self.check(TokenKind::RParen) {
                if self.accept(TokenKind::Comma, &mut children) {
                    continue;
                }
                let is_option = self
                    .tokens
                    .peek()
                    .is_some_and(|t| FUNCTION_OPTIONS.contains(&t.upper().as_str()));
                if is_option {
                    self.bump(&mut children)?;
                    continue;
                }
                let argument = if self.check(TokenKind::LabelIdentifier) {
                    self.parse_label()?
                } else {
                    self.parse_operand()?
                };
                children.push(argument);
                arguments.push(argument);
            }
            self.expect(TokenKind::RParen, ")", &mut children)?;
        }
        Ok(self.finish_operand(Operand::SystemFunction { token, arguments }, children))
    }

    fn parse_substring(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.bump(&mut children)?;
        self.expect(TokenKind::LParen, "(", &mut children)?;
        let base = self.parse_operand()?;
        children.push(base);
        let mut start = None;
        let mut length = None;
        if self.accept(TokenKind::Comma, &mut children) {
            let value = self.parse_operand()?;
            children.push(value);
            start = Some(value);
            if self.accept(TokenKind::Comma, &mut children) {
                let value = self.parse_operand()?;
                children.push(value);
                length = Some(value);
            }
        }
        self.expect(TokenKind::RParen, ")", &mut children)?;
        Ok(self.finish_operand(
            Operand::Substring {
                base,
                start,
                length,
            },
            children,
        ))
    }

    fn parse_keyword_function(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.bump(&mut children)?;
        let name = children[0];
        self.expect(TokenKind::LParen, "(", &mut children)?;
        let mut arguments = Vec::new();
        while !self.check(TokenKind::RParen) {
            if self.accept(TokenKind::Comma, &mut children) {
                continue;
            }
            let argument = self.parse_operand()?;
            children.push(argument);
            arguments.push(argument);
        }
        self.expect(TokenKind::RParen, ")", &mut children)?;
        Ok(self.finish_operand(Operand::Function { name, arguments }, children))
    }

    // ========================================================================
    // ATTRIBUTES
    // ========================================================================

    pub(super) fn peek_attribute(&self, n: usize) -> bool {
        matches!(self.peek_kind(n), Some(TokenKind::Attribute(_)))
    }

    /// `(AD=... EM=...)`.
    pub(super) fn parse_attribute_list(&mut self) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect(TokenKind::LParen, "(", &mut children)?;
        while self.peek_attribute(0) {
            self.bump(&mut children)?;
        }
        self.expect(TokenKind::RParen, ")", &mut children)?;
        Ok(self.tree.finish(NodeKind::AttributeList, children))
    }

    fn parse_attributes_after(&mut self, operand: NodeId) -> Result<NodeId> {
        if !(self.check(TokenKind::LParen) && self.peek_attribute(1)) {
            return Ok(operand);
        }
        let attributes = self.parse_attribute_list()?;
        Ok(self.finish_operand(
            Operand::Attributed {
                operand,
                attributes,
            },
            vec![operand, attributes],
        ))
    }

    pub(super) fn finish_operand(&mut self, operand: Operand, children: Vec<NodeId>) -> NodeId {
        self.tree.finish(NodeKind::Operand(operand), children)
    }

    /// Whether `token` is a bare word with the given upper-case text.
    pub(super) fn is_word(token: Option<&SyntaxToken>, word: &str) -> bool {
        token.is_some_and(|t| t.kind() == TokenKind::Identifier && t.upper() == word)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ParserOptions;
    use crate::lexer::NaturalLexer;
    use crate::module::{FileType, NaturalFile, SourceFile};
    use crate::parser::Parser;
    use crate::provider::EmptyProvider;
    use crate::syntax::{ArithmeticOperator, NodeKind, Operand, Statement, SyntaxTree};
    use open_mainframe_lang_core::FileId;

    fn parse_body(source: &str) -> (SyntaxTree, Vec<String>) {
        let file = SourceFile::new("TEST", FileType::Program, source);
        let tokens = NaturalLexer::new(FileId::MAIN).lex(&file.text);
        let natural = NaturalFile::for_source(&file, tokens.tokens());
        let options = ParserOptions::default();
        let parsed = Parser::new(tokens, &natural, &EmptyProvider, &options).parse();
        let codes = parsed.diagnostics.iter().map(|d| d.code.clone()).collect();
        (parsed.tree, codes)
    }

    fn assignment_value(tree: &SyntaxTree) -> Option<Operand> {
        (0..tree.len() as u32)
            .map(crate::syntax::NodeId)
            .find_map(|id| match tree.statement(id) {
                Some(Statement::Assign { value, .. }) => tree.operand(*value).cloned(),
                _ => None,
            })
    }

    #[test]
    fn test_precedence() {
        let (tree, codes) = parse_body("#X := 1 + 2 * 3\nEND");
        assert!(codes.is_empty(), "{codes:?}");
        match assignment_value(&tree) {
            Some(Operand::Arithmetic { operator, right, .. }) => {
                assert_eq!(operator, ArithmeticOperator::Add);
                assert!(matches!(
                    tree.operand(right),
                    Some(Operand::Arithmetic {
                        operator: ArithmeticOperator::Multiply,
                        ..
                    })
                ));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_power_is_right_associative() {
        let (tree, _) = parse_body("#X := 2 ** 3 ** 2\nEND");
        match assignment_value(&tree) {
            Some(Operand::Arithmetic { operator, right, .. }) => {
                assert_eq!(operator, ArithmeticOperator::Power);
                assert!(matches!(
                    tree.operand(right),
                    Some(Operand::Arithmetic {
                        operator: ArithmeticOperator::Power,
                        ..
                    })
                ));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_index_list_splits_comma_numbers() {
        let (tree, codes) = parse_body("#X := #ARR(1,2)\nEND");
        assert!(codes.is_empty(), "{codes:?}");
        match assignment_value(&tree) {
            Some(Operand::Reference { indices, .. }) => assert_eq!(indices.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_index_range_and_star() {
        let (tree, _) = parse_body("#X := #ARR(1:5)\n#Y := #ARR(*)\nEND");
        let kinds: Vec<_> = (0..tree.len() as u32)
            .filter_map(|id| tree.operand(crate::syntax::NodeId(id)))
            .filter(|op| matches!(op, Operand::Range { .. } | Operand::Star))
            .collect();
        assert_eq!(kinds.len(), 2);
    }

    #[test]
    fn test_string_concat_and_functions() {
        let (tree, codes) = parse_body("#X := 'A' - 'B'\n#N := *OCC(#ARR)\n#S := SUBSTR(#A, 1, 2)\nEND");
        assert!(codes.is_empty(), "{codes:?}");
        let has = |pred: fn(&Operand) -> bool| {
            (0..tree.len() as u32).any(|id| tree.operand(crate::syntax::NodeId(id)).is_some_and(pred))
        };
        assert!(has(|op| matches!(op, Operand::StringConcat { parts } if parts.len() == 2)));
        assert!(has(|op| matches!(op, Operand::SystemFunction { arguments, .. } if arguments.len() == 1)));
        assert!(has(|op| matches!(op, Operand::Substring { length: Some(_), .. })));
    }

    #[test]
    fn test_trim_options_are_not_references() {
        let (tree, _) = parse_body("#X := *TRIM(#A, LEADING)\nEND");
        let symbols: Vec<_> = (0..tree.len() as u32)
            .filter(|id| matches!(tree.kind(crate::syntax::NodeId(*id)), Some(NodeKind::Symbol(_))))
            .collect();
        assert_eq!(symbols.len(), 2);
    }

    #[test]
    fn test_attributed_operand() {
        let (tree, codes) = parse_body("WRITE #A (AD=I) / 'X' 5X #B\nEND");
        assert!(codes.is_empty(), "{codes:?}");
        let has = |pred: fn(&Operand) -> bool| {
            (0..tree.len() as u32).any(|id| tree.operand(crate::syntax::NodeId(id)).is_some_and(pred))
        };
        assert!(has(|op| matches!(op, Operand::Attributed { .. })));
        assert!(has(|op| matches!(op, Operand::LineAdvance)));
        assert!(has(|op| matches!(op, Operand::Skip { .. })));
    }
}
