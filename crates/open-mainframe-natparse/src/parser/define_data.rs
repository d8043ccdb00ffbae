// SPDX-License-Identifier: Apache-2.0
//! `DEFINE DATA` parsing.
//!
//! Declarations are stored as [`Variable`]s in the tree's declaration arena;
//! the node tree keeps one flat `Variable` node per declaration line under
//! its scope node. Level numbers build the `parent`/`children` hierarchy.
//!
//! ```text
//! DEFINE DATA
//! LOCAL USING MYLDA
//! LOCAL
//! 1 #GRP
//!   2 #NAME (A20)
//!   2 #COUNT (N3) INIT <0>
//! 1 EMP VIEW OF EMPLOYEES
//!   2 FIRST-NAME
//! END-DEFINE
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use open_mainframe_lang_core::Position;

use super::Result;
use crate::ddm::DataDefinitionModule;
use crate::diagnostics::DiagnosticCode;
use crate::lexer::{Keyword, SyntaxToken, TokenKind};
use crate::syntax::{
    ArrayBound, ArrayDimension, Binding, DefineData, NodeId, NodeKind, Operand, SymbolKind,
    UsingDeclaration, Variable, VariableId, VariableKind, VariableOrigin, VariableScope,
};
use crate::types::DataType;

/// Per-scope state while reading declaration lines.
#[derive(Default)]
struct DeclarationContext {
    /// Open declarations, outermost first.
    stack: Vec<VariableId>,
    /// DDMs of the views declared so far.
    views: HashMap<VariableId, Arc<DataDefinitionModule>>,
}

/// What the declaration line declares, before it is stored.
struct Declaration {
    name: SyntaxToken,
    kind: VariableKind,
    data_type: Option<DataType>,
    dimensions: Vec<ArrayDimension>,
    constant: bool,
    initial_values: Vec<NodeId>,
    by_value: bool,
    optional: bool,
    /// DDM of a `VIEW OF`, when the provider knows it.
    ddm: Option<Arc<DataDefinitionModule>>,
}

impl Declaration {
    fn new(name: SyntaxToken, kind: VariableKind) -> Self {
        Self {
            name,
            kind,
            data_type: None,
            dimensions: Vec::new(),
            constant: false,
            initial_values: Vec::new(),
            by_value: false,
            optional: false,
            ddm: None,
        }
    }
}

impl super::Parser<'_> {
    /// Parse `DEFINE DATA ... END-DEFINE`.
    ///
    /// Returns `None` when `END-DEFINE` is missing; the block is dropped
    /// from the tree and body parsing resumes where the scan stopped.
    pub(super) fn parse_define_data(&mut self) -> Option<DefineData> {
        let checkpoint = self.tree.checkpoint();
        let mut children = Vec::new();
        let opener = self.bump(&mut children).ok()?;
        self.bump(&mut children).ok()?;

        let mut define_data = DefineData::default();
        let mut closed = false;
        while !self.tokens.is_at_end() {
            if self.accept_keyword(Keyword::EndDefine, &mut children) {
                closed = true;
                break;
            }
            if self.at_define_data_end() {
                break;
            }
            match self.current_scope() {
                Some(scope) => {
                    let node = self.parse_scope(scope, &mut define_data);
                    children.push(node);
                }
                None => {
                    let err = self.unexpected("LOCAL, PARAMETER, GLOBAL or INDEPENDENT");
                    self.diagnostics.push(err.to_diagnostic());
                    self.skip_line();
                }
            }
        }

        if !closed {
            self.report(
                DiagnosticCode::MissingEndDefine,
                opener.diagnostic_position(),
                "DEFINE DATA is not closed by END-DEFINE",
            );
            self.tree.truncate(checkpoint);
            return None;
        }

        self.check_declarations(&define_data);
        let node = self.tree.finish(NodeKind::DefineData, children);
        define_data.node = Some(node);
        tracing::debug!(
            variables = define_data.variables.len(),
            usings = define_data.usings.len(),
            "parsed DEFINE DATA"
        );
        Some(define_data)
    }

    /// A hard keyword at the start of a line ends the declarations.
    fn at_define_data_end(&self) -> bool {
        self.tokens.at_line_start()
            && self
                .tokens
                .peek()
                .and_then(SyntaxToken::keyword)
                .is_some_and(|kw| !kw.is_soft() && kw != Keyword::EndDefine)
    }

    fn current_scope(&self) -> Option<VariableScope> {
        match self.tokens.peek_kind()? {
            TokenKind::Keyword(Keyword::Local) => Some(VariableScope::Local),
            TokenKind::Keyword(Keyword::Parameter) => Some(VariableScope::Parameter),
            TokenKind::Keyword(Keyword::Global) => Some(VariableScope::Global),
            TokenKind::Keyword(Keyword::Independent) => Some(VariableScope::Independent),
            _ => None,
        }
    }

    fn skip_line(&mut self) {
        self.tokens.advance();
        while !self.tokens.is_at_end() && !self.tokens.at_line_start() {
            self.tokens.advance();
        }
    }

    // ========================================================================
    // SCOPES
    // ========================================================================

    fn parse_scope(&mut self, scope: VariableScope, define_data: &mut DefineData) -> NodeId {
        let mut children = Vec::new();
        if self.bump(&mut children).is_err() {
            return self.tree.finish(NodeKind::Scope(scope), children);
        }
        let mut context = DeclarationContext::default();
        loop {
            if self.tokens.is_at_end()
                || self.check_keyword(Keyword::EndDefine)
                || self.at_define_data_end()
                || self.current_scope().is_some()
            {
                break;
            }
            if self.check_keyword(Keyword::Using) {
                match self.parse_using(scope, define_data) {
                    Ok(node) => children.push(node),
                    Err(err) => {
                        self.diagnostics.push(err.to_diagnostic());
                        self.skip_line();
                    }
                }
                continue;
            }
            if !self.check(TokenKind::NumberLiteral) {
                let err = self.unexpected("level number");
                self.diagnostics.push(err.to_diagnostic());
                self.skip_line();
                continue;
            }
            let checkpoint = self.tree.checkpoint();
            match self.parse_declaration(scope, &mut context, define_data) {
                Ok(node) => children.push(node),
                Err(err) => {
                    self.diagnostics.push(err.to_diagnostic());
                    self.tree.truncate(checkpoint);
                    self.skip_line();
                }
            }
        }
        self.tree.finish(NodeKind::Scope(scope), children)
    }

    /// `USING data-area [WITH BLOCK name]`.
    fn parse_using(&mut self, scope: VariableScope, define_data: &mut DefineData) -> Result<NodeId> {
        let mut children = Vec::new();
        self.expect_keyword(Keyword::Using, &mut children)?;
        let Some(name_token) = self.tokens.peek().cloned() else {
            return Err(self.unexpected("data area name"));
        };
        if !name_token.is_identifier_like() {
            return Err(self.unexpected("data area name"));
        }
        self.tokens.advance();
        let data_area = name_token.upper();
        let symbol = self.tree.symbol(name_token.clone(), SymbolKind::Module);
        children.push(symbol);
        if self.same_line() && self.accept_keyword(Keyword::With, &mut children) {
            // BLOCK name
            while self.same_line() && self.tokens.peek().is_some_and(SyntaxToken::is_identifier_like) {
                self.bump(&mut children)?;
            }
        }

        let resolved = match self.provider.find_module(&data_area) {
            Some(module) => {
                self.tree.bind(symbol, Binding::Module(data_area.clone()));
                self.import_variables(&module, scope, &data_area, define_data);
                self.callees.add(&module);
                true
            }
            None => {
                self.report(
                    DiagnosticCode::UnresolvedUsing,
                    name_token.diagnostic_position(),
                    format!("Data area {data_area} could not be found"),
                );
                false
            }
        };

        let node = self.tree.finish(NodeKind::Using, children);
        define_data.usings.push(UsingDeclaration {
            scope,
            data_area,
            resolved,
            node,
        });
        Ok(node)
    }

    /// Copy the declarations of a data area into this module.
    fn import_variables(
        &mut self,
        module: &crate::module::NaturalModule,
        scope: VariableScope,
        data_area: &str,
        define_data: &mut DefineData,
    ) {
        let mut remap = HashMap::new();
        let mut imported = Vec::new();
        for (old_id, variable) in module.variables() {
            let mut copy = variable.clone();
            copy.node = None;
            copy.initial_values.clear();
            copy.references.clear();
            copy.scope = scope;
            copy.origin = VariableOrigin::Imported {
                data_area: data_area.to_string(),
            };
            let new_id = self.tree.add_variable(copy);
            remap.insert(old_id, new_id);
            imported.push(new_id);
        }
        for id in &imported {
            let Some(variable) = self.tree.variable_mut(*id) else {
                continue;
            };
            variable.parent = variable.parent.and_then(|p| remap.get(&p).copied());
            variable.children = variable
                .children
                .iter()
                .filter_map(|c| remap.get(c).copied())
                .collect();
            if let VariableKind::Redefine { target } = &mut variable.kind {
                *target = target.and_then(|t| remap.get(&t).copied());
            }
            for dimension in &mut variable.dimensions {
                for bound in [&mut dimension.lower, &mut dimension.upper] {
                    if let ArrayBound::Constant { variable: v, value } = *bound {
                        *bound = match remap.get(&v) {
                            Some(new) => ArrayBound::Constant {
                                variable: *new,
                                value,
                            },
                            None => value.map_or(ArrayBound::Unbounded, ArrayBound::Literal),
                        };
                    }
                }
            }
        }
        tracing::debug!(data_area, count = imported.len(), "imported declarations");
        define_data.variables.extend(imported);
    }

    // ========================================================================
    // DECLARATION LINES
    // ========================================================================

    fn parse_declaration(
        &mut self,
        scope: VariableScope,
        context: &mut DeclarationContext,
        define_data: &mut DefineData,
    ) -> Result<NodeId> {
        let mut children = Vec::new();
        let level_token = self.bump(&mut children)?;
        let level: u32 = match level_token.text().parse() {
            Ok(level) => level,
            Err(_) => {
                return Err(crate::error::ParseError::UnexpectedToken {
                    found: level_token.text().to_string(),
                    expected: "level number".to_string(),
                    position: level_token.diagnostic_position(),
                })
            }
        };

        let declaration = if self.check_keyword(Keyword::Redefine) {
            self.parse_redefine(&mut children, define_data)?
        } else if self.check_keyword(Keyword::Filler) {
            self.parse_filler(&mut children)?
        } else {
            self.parse_field(scope, &mut children, define_data)?
        };

        let parent = self.place_in_hierarchy(level, &level_token, context);
        let mut variable = Variable::new(
            declaration.name.text(),
            level,
            scope,
            declaration.name.diagnostic_position(),
        );
        variable.kind = declaration.kind;
        variable.data_type = declaration.data_type;
        variable.dimensions = declaration.dimensions;
        variable.constant = declaration.constant;
        variable.initial_values = declaration.initial_values;
        variable.by_value = declaration.by_value;
        variable.optional = declaration.optional;
        variable.parent = parent;
        if let Some(parent) = parent.and_then(|p| self.tree.variable(p)) {
            variable.in_view = parent.in_view || matches!(parent.kind, VariableKind::View { .. });
            variable.qualified_name = format!("{}.{}", self.level_one_name(parent), variable.name);
        }

        if variable.in_view {
            // untyped view fields are DDM fields until a nested level shows up
            if variable.kind == VariableKind::Group {
                variable.kind = VariableKind::Scalar;
            }
            self.type_view_field(&mut variable, context);
        }

        let id = self.tree.add_variable(variable);
        let node = self.tree.finish(NodeKind::Variable(id), children);
        if let Some(variable) = self.tree.variable_mut(id) {
            variable.node = Some(node);
        }
        if let Some(parent) = parent.and_then(|p| self.tree.variable_mut(p)) {
            parent.children.push(id);
            if parent.kind == VariableKind::Scalar && parent.data_type.is_none() {
                parent.kind = VariableKind::Group;
            }
        }
        if let Some(ddm) = declaration.ddm {
            context.views.insert(id, ddm);
        }
        context.stack.push(id);
        define_data.variables.push(id);
        Ok(node)
    }

    /// Pop the declarations that cannot own `level` and return the parent.
    fn place_in_hierarchy(
        &mut self,
        level: u32,
        level_token: &SyntaxToken,
        context: &mut DeclarationContext,
    ) -> Option<VariableId> {
        while let Some(top) = context.stack.last() {
            match self.tree.variable(*top) {
                Some(v) if v.level >= level => {
                    context.stack.pop();
                }
                _ => break,
            }
        }
        let parent = context.stack.last().copied();
        let expected = parent
            .and_then(|p| self.tree.variable(p))
            .map_or(1, |p| p.level + 1);
        if level > expected {
            let message = if parent.is_none() {
                format!("First declaration must be level 1, found level {level}")
            } else {
                format!("Level {level} follows level {}", expected - 1)
            };
            self.report(
                DiagnosticCode::LevelSkipped,
                level_token.diagnostic_position(),
                message,
            );
        }
        parent
    }

    fn level_one_name(&self, variable: &Variable) -> String {
        let mut current = variable;
        while let Some(parent) = current.parent.and_then(|p| self.tree.variable(p)) {
            current = parent;
        }
        current.name.clone()
    }

    /// `REDEFINE target`.
    fn parse_redefine(
        &mut self,
        children: &mut Vec<NodeId>,
        define_data: &DefineData,
    ) -> Result<Declaration> {
        self.expect_keyword(Keyword::Redefine, children)?;
        let Some(target_token) = self.tokens.peek().cloned() else {
            return Err(self.unexpected("variable to redefine"));
        };
        if !target_token.is_identifier_like() {
            return Err(self.unexpected("variable to redefine"));
        }
        self.tokens.advance();
        let symbol = self.tree.symbol(target_token.clone(), SymbolKind::Variable);
        children.push(symbol);

        let target = define_data.variables.iter().rev().copied().find(|id| {
            self.tree.variable(*id).is_some_and(|v| {
                !v.is_imported()
                    && !matches!(v.kind, VariableKind::Redefine { .. } | VariableKind::Filler { .. })
                    && v.matches_name(target_token.text())
            })
        });
        match target {
            Some(id) => self.tree.bind(symbol, Binding::Variable(id)),
            None => self.report(
                DiagnosticCode::UnresolvedRedefineTarget,
                target_token.diagnostic_position(),
                format!("Variable {} to redefine was not declared", target_token.upper()),
            ),
        }
        Ok(Declaration::new(target_token, VariableKind::Redefine { target }))
    }

    /// `FILLER nX`.
    fn parse_filler(&mut self, children: &mut Vec<NodeId>) -> Result<Declaration> {
        let filler = self.expect_keyword(Keyword::Filler, children)?;
        let size = self.expect(TokenKind::OperandSkip, "filler size such as 5X", children)?;
        let bytes = size.skip_count().unwrap_or(0);
        Ok(Declaration::new(filler, VariableKind::Filler { bytes }))
    }

    /// A named field, group or view.
    fn parse_field(
        &mut self,
        scope: VariableScope,
        children: &mut Vec<NodeId>,
        define_data: &DefineData,
    ) -> Result<Declaration> {
        let Some(name) = self.tokens.peek().cloned() else {
            return Err(self.unexpected("variable name"));
        };
        if !name.is_identifier_like() {
            return Err(self.unexpected("variable name"));
        }
        self.bump(children)?;

        if self.accept_keyword(Keyword::View, children) {
            self.accept_keyword(Keyword::Of, children);
            let ddm = self.bump(children)?;
            if !ddm.is_identifier_like() {
                return Err(crate::error::ParseError::UnexpectedToken {
                    found: ddm.text().to_string(),
                    expected: "DDM name".to_string(),
                    position: ddm.diagnostic_position(),
                });
            }
            let ddm_name = ddm.upper();
            let found = self.provider.find_ddm(&ddm_name);
            if found.is_none() {
                self.report(
                    DiagnosticCode::UnresolvedDdm,
                    ddm.diagnostic_position(),
                    format!("DDM {ddm_name} could not be found"),
                );
            }
            let mut declaration = Declaration::new(name, VariableKind::View { ddm: ddm_name });
            declaration.ddm = found;
            return Ok(declaration);
        }

        let mut declaration = Declaration::new(name, VariableKind::Group);
        if self.check(TokenKind::LParen) && !self.peek_attribute(1) {
            let open = self.tokens.peek().cloned();
            let (data_type, dimensions) = self.parse_type_and_dimensions(scope, children, define_data)?;
            declaration.data_type = data_type;
            declaration.dimensions = dimensions;
            if data_type.is_some() {
                declaration.kind = VariableKind::Scalar;
            }
            let dynamic = self.accept_keyword(Keyword::Dynamic, children);
            if let Some(mut data_type) = declaration.data_type {
                let position = open.map_or_else(
                    || declaration.name.diagnostic_position(),
                    |t| t.diagnostic_position(),
                );
                if dynamic {
                    data_type.dynamic = true;
                    data_type.length = 0;
                    declaration.data_type = Some(data_type);
                }
                self.validate_type(&data_type, dynamic, position);
            }
        }

        loop {
            if self.check(TokenKind::LParen) && self.peek_attribute(1) {
                let attributes = self.parse_attribute_list()?;
                children.push(attributes);
            } else if self.check_keyword(Keyword::Init) {
                self.bump(children)?;
                let values = self.parse_initial_values(&declaration, children)?;
                declaration.initial_values.extend(values);
            } else if self.check_keyword(Keyword::Const) || self.check_keyword(Keyword::Constant) {
                self.bump(children)?;
                declaration.constant = true;
                let values = self.parse_initial_values(&declaration, children)?;
                declaration.initial_values.extend(values);
            } else if self.check_keyword(Keyword::By) && self.peek_keyword(1, Keyword::Value) {
                self.bump(children)?;
                self.bump(children)?;
                self.accept_keyword(Keyword::Result, children);
                declaration.by_value = true;
            } else if self.accept_keyword(Keyword::Optional, children) {
                declaration.optional = true;
            } else {
                break;
            }
        }
        Ok(declaration)
    }

    fn validate_type(&mut self, data_type: &DataType, dynamic: bool, position: Position) {
        if dynamic && !data_type.format.can_be_dynamic() {
            self.report(
                DiagnosticCode::DynamicNotAllowed,
                position,
                format!("Format {} cannot be DYNAMIC", data_type.format),
            );
            return;
        }
        if let Err(message) = data_type.validate_length() {
            self.report(DiagnosticCode::InvalidLength, position, message);
        }
    }

    /// `(A10/1:10)`, `(N7,2)`, `(1:5)`.
    fn parse_type_and_dimensions(
        &mut self,
        scope: VariableScope,
        children: &mut Vec<NodeId>,
        define_data: &DefineData,
    ) -> Result<(Option<DataType>, Vec<ArrayDimension>)> {
        self.expect(TokenKind::LParen, "(", children)?;
        let spec = self
            .tokens
            .peek()
            .filter(|t| t.kind() == TokenKind::Identifier)
            .and_then(|t| DataType::parse_spec(t.text()));
        if let Some(data_type) = spec {
            self.bump(children)?;
            if !self.accept(TokenKind::Slash, children) {
                self.expect(TokenKind::RParen, ")", children)?;
                return Ok((Some(data_type), Vec::new()));
            }
        }
        let mut dimensions = Vec::new();
        loop {
            dimensions.push(self.parse_dimension(scope, children, define_data)?);
            if !self.accept(TokenKind::Comma, children) {
                break;
            }
        }
        self.expect(TokenKind::RParen, ")", children)?;
        Ok((spec, dimensions))
    }

    fn parse_dimension(
        &mut self,
        scope: VariableScope,
        children: &mut Vec<NodeId>,
        define_data: &DefineData,
    ) -> Result<ArrayDimension> {
        let first = self.parse_bound(scope, children, define_data)?;
        if self.accept(TokenKind::Colon, children) {
            let upper = self.parse_bound(scope, children, define_data)?;
            return Ok(ArrayDimension {
                lower: first,
                upper,
            });
        }
        Ok(ArrayDimension {
            lower: ArrayBound::Literal(1),
            upper: first,
        })
    }

    fn parse_bound(
        &mut self,
        scope: VariableScope,
        children: &mut Vec<NodeId>,
        define_data: &DefineData,
    ) -> Result<ArrayBound> {
        if self.check(TokenKind::NumberLiteral) {
            self.split_comma_number();
        }
        let Some(token) = self.tokens.peek().cloned() else {
            return Err(self.unexpected("array bound"));
        };
        match token.kind() {
            TokenKind::Asterisk => {
                self.bump(children)?;
                Ok(ArrayBound::Unbounded)
            }
            TokenKind::NumberLiteral => {
                self.bump(children)?;
                Ok(parse_number(token.text()).map_or(ArrayBound::Unbounded, ArrayBound::Literal))
            }
            TokenKind::Minus if self.peek_kind(1) == Some(TokenKind::NumberLiteral) => {
                self.bump(children)?;
                let number = self.bump(children)?;
                Ok(parse_number(number.text()).map_or(ArrayBound::Unbounded, |n| ArrayBound::Literal(-n)))
            }
            _ if token.is_identifier_like() => {
                self.tokens.advance();
                if scope == VariableScope::Parameter && token.upper() == "V" {
                    children.push(self.tree.token(token));
                    return Ok(ArrayBound::Unbounded);
                }
                let constant = define_data.variables.iter().rev().copied().find(|id| {
                    self.tree
                        .variable(*id)
                        .is_some_and(|v| v.constant && v.matches_name(token.text()))
                });
                match constant {
                    Some(variable) => {
                        let symbol = self.tree.symbol(token, SymbolKind::Variable);
                        self.tree.bind(symbol, Binding::Variable(variable));
                        children.push(symbol);
                        Ok(ArrayBound::Constant {
                            variable,
                            value: self.constant_value(variable),
                        })
                    }
                    None => {
                        self.report(
                            DiagnosticCode::ArrayBoundNotConstant,
                            token.diagnostic_position(),
                            format!("Array bound {} is not a constant", token.upper()),
                        );
                        children.push(self.tree.token(token));
                        Ok(ArrayBound::Unbounded)
                    }
                }
            }
            _ => Err(self.unexpected("array bound")),
        }
    }

    fn constant_value(&self, variable: VariableId) -> Option<i64> {
        let value = *self.tree.variable(variable)?.initial_values.first()?;
        match self.tree.operand(value)? {
            Operand::Literal { token } => parse_number(self.tree.leaf_token(*token)?.text()),
            _ => None,
        }
    }

    /// Values after `INIT`/`CONST`: `<...>` lists with optional `ALL`,
    /// `FULL LENGTH` and `(n)` / `(n:m)` index prefixes.
    fn parse_initial_values(
        &mut self,
        declaration: &Declaration,
        children: &mut Vec<NodeId>,
    ) -> Result<Vec<NodeId>> {
        let split = !declaration.dimensions.is_empty()
            && declaration.data_type.map_or(true, |t| t.decimals == 0);
        let mut values = Vec::new();
        loop {
            if self.accept_keyword(Keyword::All, children) {
                continue;
            }
            if self.check_keyword(Keyword::Full) {
                self.bump(children)?;
                self.accept_keyword(Keyword::Length, children);
                continue;
            }
            if self.check_keyword(Keyword::Length) {
                self.bump(children)?;
                self.accept(TokenKind::NumberLiteral, children);
                continue;
            }
            if self.check(TokenKind::LParen) && !self.peek_attribute(1) {
                self.bump(children)?;
                while !self.check(TokenKind::RParen) {
                    self.bump(children)?;
                }
                self.bump(children)?;
                continue;
            }
            if self.check(TokenKind::Less) {
                self.bump(children)?;
                loop {
                    if self.check(TokenKind::Greater) {
                        break;
                    }
                    if split && self.check(TokenKind::NumberLiteral) {
                        self.split_comma_number();
                    }
                    if self.accept(TokenKind::Comma, children) {
                        continue;
                    }
                    let value = self.parse_operand()?;
                    children.push(value);
                    values.push(value);
                }
                self.expect(TokenKind::Greater, ">", children)?;
                continue;
            }
            break;
        }
        Ok(values)
    }

    /// Take the type of a view field from its DDM.
    fn type_view_field(&mut self, variable: &mut Variable, context: &DeclarationContext) {
        let mut view = variable.parent;
        while let Some(id) = view {
            if context.views.contains_key(&id) {
                break;
            }
            view = self.tree.variable(id).and_then(|v| v.parent);
        }
        let Some(ddm) = view.and_then(|id| context.views.get(&id)) else {
            return;
        };
        if matches!(variable.kind, VariableKind::Redefine { .. } | VariableKind::Filler { .. }) {
            return;
        }
        let Some(field) = ddm.find_field(&variable.name) else {
            self.report(
                DiagnosticCode::DdmFieldNotFound,
                variable.position,
                format!("Field {} is not part of DDM {}", variable.name, ddm.name),
            );
            return;
        };
        let field_type = field.data_type();
        match (variable.data_type, field_type) {
            (None, Some(field_type)) => variable.data_type = Some(field_type),
            (Some(declared), Some(field_type)) if declared.format != field_type.format => {
                self.report(
                    DiagnosticCode::DdmFormatMismatch,
                    variable.position,
                    format!(
                        "{} is declared as {declared} but DDM {} defines {field_type}",
                        variable.name, ddm.name
                    ),
                );
            }
            _ => {}
        }
    }

    // ========================================================================
    // STRUCTURE CHECKS
    // ========================================================================

    fn check_declarations(&mut self, define_data: &DefineData) {
        for id in &define_data.variables {
            let Some(variable) = self.tree.variable(*id) else {
                continue;
            };
            if variable.is_imported() {
                continue;
            }
            let position = variable.position;
            let name = variable.name.clone();
            let empty = variable.children.is_empty();
            match variable.kind.clone() {
                VariableKind::Group | VariableKind::Redefine { .. } if empty => {
                    self.report(
                        DiagnosticCode::EmptyGroup,
                        position,
                        format!("{name} does not contain any field"),
                    );
                }
                VariableKind::Redefine { target: Some(target) } => {
                    let redefined = self.members_size(*id);
                    let available = self.declared_size(target);
                    if let (Some(redefined), Some(available)) = (redefined, available) {
                        if redefined > available {
                            self.report(
                                DiagnosticCode::RedefineTooLong,
                                position,
                                format!(
                                    "REDEFINE of {name} needs {redefined} bytes but {name} has {available}"
                                ),
                            );
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// Bytes taken by a declaration including its occurrences; `None` when
    /// unknown or dynamic.
    fn declared_size(&self, id: VariableId) -> Option<u64> {
        let variable = self.tree.variable(id)?;
        let single = match &variable.kind {
            VariableKind::Filler { bytes } => u64::from(*bytes),
            VariableKind::Scalar => {
                let data_type = variable.data_type?;
                if data_type.dynamic {
                    return None;
                }
                u64::from(data_type.byte_size())
            }
            VariableKind::Group | VariableKind::View { .. } => self.members_size(id)?,
            VariableKind::Redefine { .. } => return Some(0),
        };
        let mut occurrences: u64 = 1;
        for dimension in &variable.dimensions {
            occurrences = occurrences.checked_mul(u64::try_from(dimension.occurrences()?).ok()?)?;
        }
        single.checked_mul(occurrences)
    }

    /// Bytes of the direct members of a group or redefine.
    fn members_size(&self, id: VariableId) -> Option<u64> {
        let variable = self.tree.variable(id)?;
        variable
            .children
            .iter()
            .map(|child| self.declared_size(*child))
            .sum()
    }
}

fn parse_number(text: &str) -> Option<i64> {
    text.parse().ok()
}
