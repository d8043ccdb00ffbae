// SPDX-License-Identifier: Apache-2.0
//! Literal truncation analysis.
//!
//! A literal assigned to a variable or used as its initial value is typed
//! against the variable's format and compared by byte size (see
//! [`DataType::byte_size`]). Only literals whose format shares the target's
//! storage family are measured.

use open_mainframe_lang_core::Diagnostic;

use super::inference::infer_type;
use crate::diagnostics::DiagnosticCode;
use crate::syntax::{DefineData, MoveKind, NodeId, Operand, Statement, SyntaxTree};
use crate::types::DataType;

/// Reports `NPT002` for literals that do not fit their target.
pub struct TruncationAnalyzer<'a> {
    tree: &'a SyntaxTree,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> TruncationAnalyzer<'a> {
    /// Create an analyzer over `tree`.
    pub fn new(tree: &'a SyntaxTree) -> Self {
        Self {
            tree,
            diagnostics: Vec::new(),
        }
    }

    /// Check the initial values of inline declarations.
    pub fn check_declarations(mut self, define_data: &DefineData) -> Self {
        let tree = self.tree;
        for id in &define_data.variables {
            let Some(variable) = tree.variable(*id) else {
                continue;
            };
            if variable.is_imported() {
                continue;
            }
            let Some(target_type) = variable.data_type else {
                continue;
            };
            for value in &variable.initial_values {
                self.check_value(*value, &variable.name, &target_type);
            }
        }
        self
    }

    /// Check assignments and moves under `root`.
    pub fn check_body(mut self, root: NodeId) -> Self {
        let tree = self.tree;
        for node in tree.descendants(root) {
            match tree.statement(node) {
                Some(Statement::Assign { target, value, .. }) => {
                    self.check_assignment(*value, *target);
                }
                Some(Statement::Move {
                    kind: MoveKind::Plain | MoveKind::LeftJustified | MoveKind::RightJustified,
                    source,
                    targets,
                    ..
                }) => {
                    for target in targets {
                        self.check_assignment(*source, *target);
                    }
                }
                _ => {}
            }
        }
        self
    }

    /// Diagnostics found so far.
    pub fn finish(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn check_assignment(&mut self, value: NodeId, target: NodeId) {
        let Some(target_type) = infer_type(self.tree, target, None) else {
            return;
        };
        let name = self.tree.text(target);
        self.check_value(value, &name, &target_type);
    }

    fn check_value(&mut self, value: NodeId, target: &str, target_type: &DataType) {
        if !matches!(self.tree.operand(value), Some(Operand::Literal { .. })) {
            return;
        }
        let Some(value_type) = infer_type(self.tree, value, Some(target_type)) else {
            return;
        };
        if !is_truncated(&value_type, target_type) {
            return;
        }
        tracing::trace!(target = %target, "literal truncated");
        let position = self.tree.span(value).unwrap_or_default();
        self.diagnostics.push(DiagnosticCode::ValueTruncated.at(
            position,
            format!(
                "Value {} is truncated when stored into {target} {target_type}",
                self.tree.text(value)
            ),
        ));
    }
}

/// Whether storing a value of `source` into `target` loses bytes.
pub fn is_truncated(source: &DataType, target: &DataType) -> bool {
    source.format.is_compatible_with(target.format)
        && source.format.same_family(target.format)
        && !target.dynamic
        && source.byte_size() > target.byte_size()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{FileType, SourceFile};
    use crate::pipeline::parse_module;
    use crate::provider::EmptyProvider;
    use crate::types::DataFormat;
    use crate::ParserOptions;

    fn codes(text: &str) -> Vec<String> {
        let source = SourceFile::new("PGM", FileType::Program, text);
        let module = parse_module(&source, &EmptyProvider, &ParserOptions::default());
        module.diagnostics().iter().map(|d| d.code.clone()).collect()
    }

    #[test]
    fn test_byte_size_table() {
        let cases = [
            (DataType::with_decimals(DataFormat::Numeric, 12, 7), 12),
            (DataType::with_decimals(DataFormat::Packed, 8, 5), 4),
            (DataType::with_decimals(DataFormat::Packed, 3, 0), 2),
            (DataType::dynamic(DataFormat::Alphanumeric), crate::types::DYNAMIC_BYTE_SIZE),
            (DataType::alphanumeric(10), 10),
            (DataType::new(DataFormat::Binary, 4), 4),
            (DataType::new(DataFormat::Date, 0), 4),
            (DataType::new(DataFormat::Time, 0), 7),
            (DataType::logical(), 1),
            (DataType::new(DataFormat::Control, 0), 2),
            (DataType::new(DataFormat::Integer, 2), 2),
        ];
        for (data_type, size) in cases {
            assert_eq!(data_type.byte_size(), size, "{data_type}");
        }
    }

    #[test]
    fn test_is_truncated() {
        let a3 = DataType::alphanumeric(3);
        assert!(is_truncated(&DataType::alphanumeric(5), &a3));
        assert!(!is_truncated(&DataType::alphanumeric(3), &a3));
        assert!(!is_truncated(
            &DataType::alphanumeric(5),
            &DataType::dynamic(DataFormat::Alphanumeric)
        ));
        assert!(!is_truncated(&DataType::new(DataFormat::Numeric, 5), &a3));
        assert!(is_truncated(
            &DataType::new(DataFormat::Integer, 2),
            &DataType::new(DataFormat::Integer, 1)
        ));
    }

    #[test]
    fn test_assignment_truncation() {
        assert_eq!(
            codes("DEFINE DATA LOCAL\n1 #A (A3)\nEND-DEFINE\n#A := 'TOO LONG'\nEND\n"),
            vec!["NPT002"]
        );
        assert!(codes("DEFINE DATA LOCAL\n1 #A (A3)\nEND-DEFINE\n#A := 'ABC'\nEND\n").is_empty());
        assert_eq!(
            codes("DEFINE DATA LOCAL\n1 #I (I1)\nEND-DEFINE\n#I := 300\nEND\n"),
            vec!["NPT002"]
        );
        assert_eq!(
            codes("DEFINE DATA LOCAL\n1 #A (A2)\nEND-DEFINE\nMOVE 'ABC' TO #A\nEND\n"),
            vec!["NPT002"]
        );
    }

    #[test]
    fn test_initial_value_truncation() {
        assert_eq!(
            codes("DEFINE DATA LOCAL\n1 #A (A2) INIT <'ABC'>\nEND-DEFINE\nEND\n"),
            vec!["NPT002"]
        );
        assert!(codes("DEFINE DATA LOCAL\n1 #A (A) DYNAMIC INIT <'ABC'>\nEND-DEFINE\nEND\n").is_empty());
    }

    #[test]
    fn test_float_literals_fit_single_precision() {
        assert!(codes("DEFINE DATA LOCAL\n1 #F (F4)\nEND-DEFINE\n#F := 1.5E3\nEND\n").is_empty());
        assert!(codes("DEFINE DATA LOCAL\n1 #F (F4) INIT <2E1>\nEND-DEFINE\nEND\n").is_empty());
        assert!(codes("DEFINE DATA LOCAL\n1 #F (F8)\nEND-DEFINE\n#F := 1.23456789E2\nEND\n").is_empty());
        assert_eq!(
            codes("DEFINE DATA LOCAL\n1 #F (F4)\nEND-DEFINE\n#F := 1E100\nEND\n"),
            vec!["NPT002"]
        );
    }
}
