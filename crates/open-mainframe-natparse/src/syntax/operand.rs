// SPDX-License-Identifier: Apache-2.0
//! Operands and conditions.

use super::NodeId;
use crate::types::DataType;

/// Binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

/// Unary sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Minus,
}

/// An operand node.
///
/// Field values are child node ids of the operand node.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Variable reference with optional index or range list.
    Reference { symbol: NodeId, indices: Vec<NodeId> },
    /// String, number, hex, date, time or logical literal.
    Literal { token: NodeId },
    /// `'A' - 'B'`.
    StringConcat { parts: Vec<NodeId> },
    /// `*DATX`, `*COUNTER (R1.)`.
    SystemVariable { token: NodeId, label: Option<NodeId> },
    /// `*OCC(#ARR)`, `*TRIM(#A)`.
    SystemFunction { token: NodeId, arguments: Vec<NodeId> },
    /// Built-in functions written as keywords (`VAL`, `ABS`, ...).
    Function { name: NodeId, arguments: Vec<NodeId> },
    /// `left op right`.
    Arithmetic {
        operator: ArithmeticOperator,
        left: NodeId,
        right: NodeId,
    },
    /// `-#A`.
    Unary { operator: UnaryOperator, operand: NodeId },
    /// `( ... )`.
    Parenthesized { inner: NodeId },
    /// `SUBSTR(#A, 1, 5)` and `SUBSTRING(...)`.
    Substring {
        base: NodeId,
        start: Option<NodeId>,
        length: Option<NodeId>,
    },
    /// `1:5` inside an index list.
    Range { lower: NodeId, upper: NodeId },
    /// `*` inside an index list.
    Star,
    /// `(R1.)`.
    Label { token: NodeId },
    /// `nX` column skip or omitted parameter.
    Skip { token: NodeId },
    /// `nT` tab position.
    Tab { token: NodeId },
    /// `/` line advance in output statements.
    LineAdvance,
    /// Operand followed by an attribute list `(AD=... EM=...)`.
    Attributed { operand: NodeId, attributes: NodeId },
}

impl Operand {
    /// Whether the operand names a variable that could be written to.
    pub fn is_reference(&self) -> bool {
        matches!(self, Operand::Reference { .. })
    }
}

/// Relational operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

/// A logical condition node.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `left op right`.
    Relational {
        left: NodeId,
        operator: ComparisonOperator,
        right: NodeId,
    },
    /// `#A = 1 OR = 2 OR = 3`.
    Extended {
        left: NodeId,
        operator: ComparisonOperator,
        rights: Vec<NodeId>,
    },
    /// `#A = 1 THRU 5 [BUT 3]`.
    Range {
        left: NodeId,
        operator: ComparisonOperator,
        lower: NodeId,
        upper: NodeId,
        excluded: Option<NodeId>,
    },
    /// `#A IS (N5)`.
    IsFormat { operand: NodeId, data_type: Option<DataType> },
    /// `#A = MASK (NN)`.
    Mask { operand: NodeId, negated: bool },
    /// `#A = SCAN 'X'`.
    Scan {
        operand: NodeId,
        value: NodeId,
        negated: bool,
    },
    /// `#A MODIFIED`.
    Modified { operand: NodeId, negated: bool },
    /// `#P SPECIFIED`.
    Specified { operand: NodeId, negated: bool },
    /// Logical variable or literal used as a condition.
    Logical { operand: NodeId },
    /// `NOT cond`.
    Not { inner: NodeId },
    /// `a AND b`.
    And { left: NodeId, right: NodeId },
    /// `a OR b`.
    Or { left: NodeId, right: NodeId },
    /// `( cond )`.
    Group { inner: NodeId },
}
