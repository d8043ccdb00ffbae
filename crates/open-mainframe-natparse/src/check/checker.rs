// SPDX-License-Identifier: Apache-2.0
//! Modifiability and format checks over the statement body.

use open_mainframe_lang_core::{Diagnostic, Position};

use super::inference::infer_type;
use crate::diagnostics::DiagnosticCode;
use crate::syntax::{
    Binding, Condition, DecideBranch, MoveKind, NodeId, NodeKind, Operand, Statement, SyntaxTree,
};
use crate::types::{self, DataType};

/// Walks a statement body and reports `NPT001`, `NPT003`, `NPT005` and
/// `NPT006`.
pub struct TypeChecker<'a> {
    tree: &'a SyntaxTree,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> TypeChecker<'a> {
    /// Create a checker over `tree`.
    pub fn new(tree: &'a SyntaxTree) -> Self {
        Self {
            tree,
            diagnostics: Vec::new(),
        }
    }

    /// Check every statement and condition under `root`.
    pub fn check(mut self, root: NodeId) -> Vec<Diagnostic> {
        let tree = self.tree;
        for node in tree.descendants(root) {
            match tree.kind(node) {
                Some(NodeKind::Statement(statement)) => self.check_statement(statement),
                Some(NodeKind::Condition(condition)) => self.check_condition(condition),
                _ => {}
            }
        }
        self.diagnostics
    }

    fn report(&mut self, code: DiagnosticCode, node: NodeId, message: String) {
        let position = self.position(node);
        self.diagnostics.push(code.at(position, message));
    }

    fn position(&self, node: NodeId) -> Position {
        self.tree.span(node).unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------------

    fn check_statement(&mut self, statement: &Statement) {
        for target in statement.mutated_operands() {
            self.check_modifiable(target);
        }
        match statement {
            Statement::Assign { target, value, .. } => self.check_assignment(*value, *target),
            Statement::Move {
                kind: MoveKind::Plain | MoveKind::LeftJustified | MoveKind::RightJustified,
                source,
                targets,
                ..
            } => {
                for target in targets {
                    self.check_assignment(*source, *target);
                }
            }
            Statement::DecideOn {
                operand, branches, ..
            } => self.check_decide_values(*operand, branches),
            _ => {}
        }
    }

    /// `NPT003` when `operand` names a constant or a read-only system
    /// variable.
    fn check_modifiable(&mut self, operand: NodeId) {
        match self.tree.operand(operand) {
            Some(Operand::Reference { symbol, .. }) => {
                let Some(Binding::Variable(id)) = self.tree.binding(*symbol) else {
                    return;
                };
                let Some(variable) = self.tree.variable(*id) else {
                    return;
                };
                if variable.constant {
                    let message = format!("{} is a constant and cannot be modified", variable.name);
                    self.report(DiagnosticCode::NotModifiable, operand, message);
                }
            }
            Some(Operand::SystemVariable { token, .. }) => {
                let Some(name) = self.tree.leaf_token(*token).map(|t| t.upper()) else {
                    return;
                };
                if types::system_variable(&name).is_some_and(|info| !info.modifiable) {
                    let message = format!("{name} is read-only");
                    self.report(DiagnosticCode::NotModifiable, operand, message);
                }
            }
            Some(Operand::Attributed { operand: inner, .. }) => self.check_modifiable(*inner),
            _ => {}
        }
    }

    /// `NPT001` when a literal cannot be stored into the target's format.
    fn check_assignment(&mut self, value: NodeId, target: NodeId) {
        if !self.is_literal(value) {
            return;
        }
        let Some(target_type) = infer_type(self.tree, target, None) else {
            return;
        };
        let Some(value_type) = infer_type(self.tree, value, Some(&target_type)) else {
            return;
        };
        if !value_type.format.is_compatible_with(target_type.format) {
            let message = format!(
                "A value of format {} cannot be assigned to {} {target_type}",
                value_type.format,
                self.tree.text(target)
            );
            self.report(DiagnosticCode::TypeMismatch, value, message);
        }
    }

    /// `NPT006` for DECIDE ON values that can never equal the operand.
    fn check_decide_values(&mut self, operand: NodeId, branches: &[DecideBranch]) {
        let Some(operand_type) = infer_type(self.tree, operand, None) else {
            return;
        };
        for value in branches.iter().flat_map(|b| b.values.iter()) {
            let values = match self.tree.operand(*value) {
                Some(Operand::Range { lower, upper }) => vec![*lower, *upper],
                _ => vec![*value],
            };
            for value in values {
                self.check_decide_value(value, &operand_type);
            }
        }
    }

    fn check_decide_value(&mut self, value: NodeId, operand_type: &DataType) {
        if !self.is_literal(value) {
            return;
        }
        let Some(value_type) = infer_type(self.tree, value, Some(operand_type)) else {
            return;
        };
        let message = if !value_type.format.is_compatible_with(operand_type.format) {
            format!(
                "Value {} can never match an operand of type {operand_type}",
                self.tree.text(value)
            )
        } else if value_type.format.same_family(operand_type.format)
            && !operand_type.dynamic
            && value_type.byte_size() > operand_type.byte_size()
        {
            format!(
                "Value {} is longer than the operand type {operand_type}",
                self.tree.text(value)
            )
        } else {
            return;
        };
        self.report(DiagnosticCode::DecideValueNeverMatches, value, message);
    }

    // -----------------------------------------------------------------------
    // Conditions
    // -----------------------------------------------------------------------

    fn check_condition(&mut self, condition: &Condition) {
        match condition {
            Condition::Relational { left, right, .. } => self.check_comparison(*left, *right),
            Condition::Extended { left, rights, .. } => {
                for right in rights {
                    self.check_comparison(*left, *right);
                }
            }
            Condition::Range {
                left, lower, upper, ..
            } => {
                self.check_comparison(*left, *lower);
                self.check_comparison(*left, *upper);
            }
            _ => {}
        }
    }

    /// `NPT005` when a typed operand is compared with a literal of a format
    /// it can never hold.
    fn check_comparison(&mut self, left: NodeId, right: NodeId) {
        let (operand, literal) = match (self.is_literal(left), self.is_literal(right)) {
            (false, true) => (left, right),
            (true, false) => (right, left),
            _ => return,
        };
        let Some(operand_type) = infer_type(self.tree, operand, None) else {
            return;
        };
        let Some(literal_type) = infer_type(self.tree, literal, Some(&operand_type)) else {
            return;
        };
        if !literal_type.format.is_compatible_with(operand_type.format) {
            let message = format!(
                "Condition can never be true: {} {operand_type} compared with {}",
                self.tree.text(operand),
                self.tree.text(literal)
            );
            self.report(DiagnosticCode::ConditionNeverTrue, literal, message);
        }
    }

    fn is_literal(&self, operand: NodeId) -> bool {
        match self.tree.operand(operand) {
            Some(Operand::Literal { .. } | Operand::StringConcat { .. }) => true,
            Some(Operand::Unary { operand, .. } | Operand::Parenthesized { inner: operand }) => {
                self.is_literal(*operand)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::module::{FileType, NaturalModule, SourceFile};
    use crate::pipeline::parse_module;
    use crate::provider::EmptyProvider;
    use crate::ParserOptions;

    fn check(body: &str) -> Vec<String> {
        let text = format!(
            "DEFINE DATA LOCAL\n1 #A (A5)\n1 #N (N3)\n1 #L (L)\n1 #C (A3) CONST <'ABC'>\nEND-DEFINE\n{body}\nEND\n"
        );
        let source = SourceFile::new("PGM", FileType::Program, text);
        let module: NaturalModule = parse_module(&source, &EmptyProvider, &ParserOptions::default());
        module.diagnostics().iter().map(|d| d.code.clone()).collect()
    }

    #[test]
    fn test_constant_is_not_modifiable() {
        assert_eq!(check("#C := 'XYZ'"), vec!["NPT003"]);
        assert_eq!(check("RESET #C"), vec!["NPT003"]);
        assert_eq!(check("MOVE 'X' TO #C"), vec!["NPT003"]);
        assert!(check("MOVE #C TO #A").is_empty());
    }

    #[test]
    fn test_read_only_system_variable() {
        assert_eq!(check("*DATX := *DATX"), vec!["NPT003"]);
    }

    #[test]
    fn test_literal_format_mismatch() {
        assert_eq!(check("#N := 'ABC'"), vec!["NPT001"]);
        assert_eq!(check("#L := 5"), vec!["NPT001"]);
        assert!(check("#A := 5").is_empty());
        assert!(check("#L := TRUE").is_empty());
    }

    #[test]
    fn test_condition_never_true() {
        assert_eq!(check("IF #N = 'X'\nIGNORE\nEND-IF"), vec!["NPT005"]);
        assert_eq!(check("IF #L = 1\nIGNORE\nEND-IF"), vec!["NPT005"]);
        assert!(check("IF #N = 5\nIGNORE\nEND-IF").is_empty());
        assert!(check("IF #A = 'X' OR = 'Y'\nIGNORE\nEND-IF").is_empty());
    }

    #[test]
    fn test_decide_value_never_matches() {
        let decide = |value: &str| {
            check(&format!(
                "DECIDE ON FIRST VALUE OF #N\nVALUE {value}\nIGNORE\nNONE\nIGNORE\nEND-DECIDE"
            ))
        };
        assert!(decide("1").is_empty());
        assert_eq!(decide("1234"), vec!["NPT006"]);
        assert_eq!(decide("'A'"), vec!["NPT006"]);
    }
}
