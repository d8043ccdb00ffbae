// SPDX-License-Identifier: Apache-2.0
//! DEFINE DATA declarations.

use std::fmt;

use open_mainframe_lang_core::Position;

use super::{NodeId, VariableId};
use crate::types::DataType;

/// Scope keyword a declaration appeared under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum VariableScope {
    /// `LOCAL`
    Local,
    /// `PARAMETER`
    Parameter,
    /// `GLOBAL`
    Global,
    /// `INDEPENDENT` (AIVs, `+NAME`)
    Independent,
}

impl fmt::Display for VariableScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VariableScope::Local => "LOCAL",
            VariableScope::Parameter => "PARAMETER",
            VariableScope::Global => "GLOBAL",
            VariableScope::Independent => "INDEPENDENT",
        })
    }
}

/// Structural kind of a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableKind {
    /// Typed field.
    Scalar,
    /// Group of nested declarations.
    Group,
    /// `REDEFINE target`; `target` is `None` when it could not be found.
    Redefine { target: Option<VariableId> },
    /// `VIEW OF ddm`.
    View { ddm: String },
    /// `FILLER nX` inside a redefine.
    Filler { bytes: u32 },
}

/// One bound of an array dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayBound {
    /// Literal bound.
    Literal(i64),
    /// `*` (extensible).
    Unbounded,
    /// A constant declared earlier, with its value when it is numeric.
    Constant {
        variable: VariableId,
        value: Option<i64>,
    },
}

impl ArrayBound {
    /// Numeric value of the bound, if known.
    pub fn value(&self) -> Option<i64> {
        match self {
            ArrayBound::Literal(v) => Some(*v),
            ArrayBound::Unbounded => None,
            ArrayBound::Constant { value, .. } => *value,
        }
    }
}

/// `lower:upper` of one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayDimension {
    /// Lower bound.
    pub lower: ArrayBound,
    /// Upper bound.
    pub upper: ArrayBound,
}

impl ArrayDimension {
    /// Number of occurrences, when both bounds are known.
    pub fn occurrences(&self) -> Option<i64> {
        Some(self.upper.value()? - self.lower.value()? + 1)
    }
}

/// Where a declaration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableOrigin {
    /// Declared inline in this module.
    Declared,
    /// Copied from a data area through `USING`.
    Imported { data_area: String },
}

/// A declared variable, group, redefine or view.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Declared name (upper-case).
    pub name: String,
    /// Name prefixed with the level-1 group or view (`#GRP.#NAME`).
    pub qualified_name: String,
    /// Level number.
    pub level: u32,
    /// Scope keyword.
    pub scope: VariableScope,
    /// Structural kind.
    pub kind: VariableKind,
    /// Declared or DDM-derived type; `None` for groups and unresolved view
    /// fields.
    pub data_type: Option<DataType>,
    /// Array dimensions, outermost first.
    pub dimensions: Vec<ArrayDimension>,
    /// `CONST` value or `CONSTANT` declaration.
    pub constant: bool,
    /// `INIT`/`CONST` value operands.
    pub initial_values: Vec<NodeId>,
    /// `BY VALUE`.
    pub by_value: bool,
    /// `OPTIONAL` parameter.
    pub optional: bool,
    /// Owning group, redefine or view.
    pub parent: Option<VariableId>,
    /// Nested declarations.
    pub children: Vec<VariableId>,
    /// Declaration node in the tree (`None` for imported declarations).
    pub node: Option<NodeId>,
    /// Position of the name in the declaring module.
    pub position: Position,
    /// Where the declaration came from.
    pub origin: VariableOrigin,
    /// Whether the declaration is nested inside a view.
    pub in_view: bool,
    /// Symbol nodes bound to this declaration.
    pub references: Vec<NodeId>,
}

impl Variable {
    /// A fresh declaration with no type, dimensions or references.
    pub fn new(name: impl Into<String>, level: u32, scope: VariableScope, position: Position) -> Self {
        let name = name.into().to_ascii_uppercase();
        Self {
            qualified_name: name.clone(),
            name,
            level,
            scope,
            kind: VariableKind::Scalar,
            data_type: None,
            dimensions: Vec::new(),
            constant: false,
            initial_values: Vec::new(),
            by_value: false,
            optional: false,
            parent: None,
            children: Vec::new(),
            node: None,
            position,
            origin: VariableOrigin::Declared,
            in_view: false,
            references: Vec::new(),
        }
    }

    /// Whether the declaration owns nested declarations.
    pub fn is_group(&self) -> bool {
        !matches!(self.kind, VariableKind::Scalar | VariableKind::Filler { .. })
    }

    /// Whether this is an array.
    pub fn is_array(&self) -> bool {
        !self.dimensions.is_empty()
    }

    /// Whether the declaration was imported through `USING`.
    pub fn is_imported(&self) -> bool {
        matches!(self.origin, VariableOrigin::Imported { .. })
    }

    /// Whether `name` refers to this declaration, by plain or qualified name.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.qualified_name.eq_ignore_ascii_case(name)
    }
}

/// A `USING` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsingDeclaration {
    /// Scope keyword before `USING`.
    pub scope: VariableScope,
    /// Data area name (upper-case).
    pub data_area: String,
    /// Whether the data area was found.
    pub resolved: bool,
    /// `USING` node in the tree.
    pub node: NodeId,
}

/// The parsed DEFINE DATA block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefineData {
    /// `DEFINE DATA` node; `None` for an empty block.
    pub node: Option<NodeId>,
    /// `USING` imports in declaration order.
    pub usings: Vec<UsingDeclaration>,
    /// Every declared and imported variable, in declaration order.
    pub variables: Vec<VariableId>,
}
