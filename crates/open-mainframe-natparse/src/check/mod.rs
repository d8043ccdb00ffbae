// SPDX-License-Identifier: Apache-2.0
//! Static type checks on a resolved module.
//!
//! - [`infer_type`] types operands and literals
//! - [`TypeChecker`] reports writes to constants and read-only system
//!   variables, literal format mismatches, impossible conditions and DECIDE
//!   values that can never match
//! - [`TruncationAnalyzer`] reports literals that do not fit their target
//!
//! All checks run after reference resolution. Operands whose type cannot be
//! inferred are skipped.

mod checker;
mod inference;
mod truncation;

pub use checker::TypeChecker;
pub use inference::{infer_type, literal_type};
pub use truncation::{is_truncated, TruncationAnalyzer};

use open_mainframe_lang_core::Diagnostic;

use crate::syntax::{DefineData, NodeId, SyntaxTree};

/// Run every check over a module's declarations and body.
pub fn check_module(
    tree: &SyntaxTree,
    define_data: Option<&DefineData>,
    body: Option<NodeId>,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    if let Some(body) = body {
        diagnostics.extend(TypeChecker::new(tree).check(body));
    }
    let mut truncation = TruncationAnalyzer::new(tree);
    if let Some(define_data) = define_data {
        truncation = truncation.check_declarations(define_data);
    }
    if let Some(body) = body {
        truncation = truncation.check_body(body);
    }
    diagnostics.extend(truncation.finish());
    diagnostics
}
