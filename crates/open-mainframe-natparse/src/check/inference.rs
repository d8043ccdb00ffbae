// SPDX-License-Identifier: Apache-2.0
//! Type inference for operands.
//!
//! `None` means no rule applies; callers skip their check in that case.

use crate::lexer::{Keyword, SyntaxToken, TokenKind};
use crate::syntax::{Binding, NodeId, Operand, SyntaxTree};
use crate::types::{self, DataFormat, DataType};

/// Infer the type of `operand`.
///
/// Literals are typed against `target` when given, so the same literal can
/// come out as `I1`, `B1` or `P3` depending on where it is stored.
pub fn infer_type(
    tree: &SyntaxTree,
    operand: NodeId,
    target: Option<&DataType>,
) -> Option<DataType> {
    match tree.operand(operand)? {
        Operand::Reference { symbol, .. } => match tree.binding(*symbol)? {
            Binding::Variable(id) => tree.variable(*id)?.data_type,
            _ => None,
        },
        Operand::Literal { token } => {
            literal_type(tree.leaf_token(*token)?, target.map(|t| t.format))
        }
        Operand::StringConcat { parts } => {
            let length = parts
                .iter()
                .filter_map(|p| match tree.operand(*p) {
                    Some(Operand::Literal { token }) => tree.leaf_token(*token),
                    _ => None,
                })
                .map(|t| t.string_value().chars().count() as u32)
                .sum();
            Some(DataType::alphanumeric(length))
        }
        Operand::SystemVariable { token, .. } => {
            let name = tree.leaf_token(*token)?.upper();
            types::system_variable(&name).map(|info| info.data_type)
        }
        Operand::SystemFunction { token, .. } => {
            types::system_function_type(&tree.leaf_token(*token)?.upper())
        }
        Operand::Substring { base, .. } => infer_type(tree, *base, None),
        Operand::Parenthesized { inner: operand }
        | Operand::Attributed { operand, .. }
        | Operand::Unary { operand, .. } => infer_type(tree, *operand, target),
        _ => None,
    }
}

/// Type of a literal token, chosen for a value stored into `target`.
pub fn literal_type(token: &SyntaxToken, target: Option<DataFormat>) -> Option<DataType> {
    match token.kind() {
        TokenKind::StringLiteral => {
            let length = token.string_value().chars().count().max(1) as u32;
            let format = match target {
                Some(DataFormat::Unicode) => DataFormat::Unicode,
                _ => DataFormat::Alphanumeric,
            };
            Some(DataType::new(format, length))
        }
        TokenKind::HexLiteral => {
            let text = token.text();
            let digits = match (text.find(['\'', '"']), text.rfind(['\'', '"'])) {
                (Some(open), Some(close)) if close > open => close - open - 1,
                _ => 0,
            };
            let bytes = (digits as u32).div_ceil(2).max(1);
            let format = match target {
                Some(f) if f.is_alphanumeric_family() => f,
                _ => DataFormat::Binary,
            };
            Some(DataType::new(format, bytes))
        }
        TokenKind::NumberLiteral => Some(number_type(token.text(), target)),
        TokenKind::DateLiteral => Some(DataType::new(DataFormat::Date, 0)),
        TokenKind::TimeLiteral => Some(DataType::new(DataFormat::Time, 0)),
        TokenKind::Keyword(Keyword::True | Keyword::False) => Some(DataType::logical()),
        _ => None,
    }
}

/// Type of a numeric literal such as `42`, `-1.5`, `3,25` or `1.5E3`.
fn number_type(text: &str, target: Option<DataFormat>) -> DataType {
    let unsigned = text.trim_start_matches(['+', '-']);
    let (mantissa, exponent) = match unsigned.find(['E', 'e']) {
        Some(idx) => (&unsigned[..idx], Some(&unsigned[idx + 1..])),
        None => (unsigned, None),
    };
    let (whole, fraction) = match mantissa.find(['.', ',']) {
        Some(idx) => (&mantissa[..idx], &mantissa[idx + 1..]),
        None => (mantissa, ""),
    };

    if target == Some(DataFormat::Float) {
        return DataType::new(DataFormat::Float, float_width(text, whole, fraction));
    }
    if exponent.is_some() {
        return DataType::new(DataFormat::Float, 8);
    }

    let before = whole.trim_start_matches('0').len().max(1) as u32;
    let after = fraction.len() as u32;
    let value: Option<i128> = if after == 0 {
        text.parse().ok()
    } else {
        None
    };

    match (target, value) {
        (Some(DataFormat::Integer), Some(value)) => {
            DataType::new(DataFormat::Integer, integer_width(value))
        }
        (Some(DataFormat::Binary), Some(value)) => {
            DataType::new(DataFormat::Binary, binary_width(value))
        }
        (Some(DataFormat::Packed), _) => {
            DataType::with_decimals(DataFormat::Packed, before + after, after)
        }
        _ => DataType::with_decimals(DataFormat::Numeric, before + after, after),
    }
}

/// Significant digits an `F4` holds exactly.
const F4_DIGITS: usize = 7;

/// `4` when the literal fits single precision, `8` otherwise.
fn float_width(text: &str, whole: &str, fraction: &str) -> u32 {
    let significant = format!("{whole}{fraction}");
    let significant = significant.trim_start_matches('0').trim_end_matches('0');
    let Ok(value) = text.replace(',', ".").parse::<f64>() else {
        return 8;
    };
    let magnitude = value.abs();
    let in_range = magnitude == 0.0
        || (magnitude >= f64::from(f32::MIN_POSITIVE) && magnitude <= f64::from(f32::MAX));
    if significant.len() <= F4_DIGITS && in_range {
        4
    } else {
        8
    }
}

fn integer_width(value: i128) -> u32 {
    if i8::try_from(value).is_ok() {
        1
    } else if i16::try_from(value).is_ok() {
        2
    } else if i32::try_from(value).is_ok() {
        4
    } else {
        8
    }
}

fn binary_width(value: i128) -> u32 {
    let magnitude = value.unsigned_abs();
    let bits = 128 - magnitude.leading_zeros();
    bits.div_ceil(8).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use open_mainframe_lang_core::Position;

    fn tok(kind: TokenKind, text: &str) -> SyntaxToken {
        SyntaxToken::new(kind, text, Position::default())
    }

    #[test]
    fn test_integer_literal_width_follows_target() {
        let five = tok(TokenKind::NumberLiteral, "5");
        assert_eq!(
            literal_type(&five, Some(DataFormat::Integer)),
            Some(DataType::new(DataFormat::Integer, 1))
        );
        assert_eq!(
            literal_type(&five, Some(DataFormat::Binary)),
            Some(DataType::new(DataFormat::Binary, 1))
        );
        assert_eq!(
            literal_type(&five, Some(DataFormat::Packed)),
            Some(DataType::new(DataFormat::Packed, 1))
        );
        assert_eq!(
            literal_type(&five, None),
            Some(DataType::new(DataFormat::Numeric, 1))
        );
        let big = tok(TokenKind::NumberLiteral, "300");
        assert_eq!(
            literal_type(&big, Some(DataFormat::Integer)),
            Some(DataType::new(DataFormat::Integer, 2))
        );
        assert_eq!(
            literal_type(&big, Some(DataFormat::Binary)),
            Some(DataType::new(DataFormat::Binary, 2))
        );
    }

    #[test]
    fn test_float_literal_width() {
        let f4 = DataType::new(DataFormat::Float, 4);
        let f8 = DataType::new(DataFormat::Float, 8);
        let cases = [
            ("1.5E3", Some(DataFormat::Float), &f4),
            ("2E1", Some(DataFormat::Float), &f4),
            ("-2,5E-3", Some(DataFormat::Float), &f4),
            ("0.5", Some(DataFormat::Float), &f4),
            ("1234567", Some(DataFormat::Float), &f4),
            ("12345678", Some(DataFormat::Float), &f8),
            ("1.23456789E2", Some(DataFormat::Float), &f8),
            ("1E100", Some(DataFormat::Float), &f8),
            ("1E-50", Some(DataFormat::Float), &f8),
            ("1.5E3", None, &f8),
            ("1.5E3", Some(DataFormat::Numeric), &f8),
        ];
        for (text, target, expected) in cases {
            let token = tok(TokenKind::NumberLiteral, text);
            assert_eq!(literal_type(&token, target).as_ref(), Some(expected), "{text}");
        }
    }

    #[test]
    fn test_decimal_literal() {
        let value = tok(TokenKind::NumberLiteral, "123,45");
        assert_eq!(
            literal_type(&value, None),
            Some(DataType::with_decimals(DataFormat::Numeric, 5, 2))
        );
        let leading = tok(TokenKind::NumberLiteral, "0.5");
        assert_eq!(
            literal_type(&leading, Some(DataFormat::Packed)),
            Some(DataType::with_decimals(DataFormat::Packed, 2, 1))
        );
    }

    #[test]
    fn test_other_literals() {
        assert_eq!(
            literal_type(&tok(TokenKind::StringLiteral, "'HELLO'"), None),
            Some(DataType::alphanumeric(5))
        );
        assert_eq!(
            literal_type(&tok(TokenKind::StringLiteral, "'HELLO'"), Some(DataFormat::Unicode)),
            Some(DataType::new(DataFormat::Unicode, 5))
        );
        assert_eq!(
            literal_type(&tok(TokenKind::HexLiteral, "H'0A0B'"), None),
            Some(DataType::new(DataFormat::Binary, 2))
        );
        assert_eq!(
            literal_type(&tok(TokenKind::Keyword(Keyword::True), "TRUE"), None),
            Some(DataType::logical())
        );
        assert_eq!(literal_type(&tok(TokenKind::Identifier, "#A"), None), None);
    }
}
