// SPDX-License-Identifier: Apache-2.0
//! Stable diagnostic codes reported by the lexer, parser, resolver and
//! checkers.
//!
//! Every problem found in a module ends up as an
//! [`open_mainframe_lang_core::Diagnostic`] carrying one of these codes. The
//! `NPL` prefix is used by the lexer, `NPP` by the parser, `NPR` by the
//! resolver and `NPT` by the type checks.

use open_mainframe_lang_core::{Diagnostic, Position, Severity};

macro_rules! gen_diagnostic_codes {
    ( $($variant:ident => $code:literal, $severity:ident),* $(,)? ) => {
        /// A stable diagnostic code.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum DiagnosticCode {
            $(
                #[doc = concat!("`", $code, "`")]
                $variant,
            )*
        }

        impl DiagnosticCode {
            /// The published code string (e.g. `"NPP003"`).
            pub fn id(self) -> &'static str {
                match self {
                    $(DiagnosticCode::$variant => $code,)*
                }
            }

            /// Default severity for the code.
            pub fn severity(self) -> Severity {
                match self {
                    $(DiagnosticCode::$variant => Severity::$severity,)*
                }
            }

            /// Look a code up by its published string.
            pub fn from_id(id: &str) -> Option<DiagnosticCode> {
                match id {
                    $($code => Some(DiagnosticCode::$variant),)*
                    _ => None,
                }
            }
        }
    };
}
for_all_diagnostic_codes!(gen_diagnostic_codes);

impl DiagnosticCode {
    /// Build a diagnostic with this code at `position`.
    pub fn at(self, position: Position, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(self.severity(), self.id(), message, position)
    }
}

/// Whether `diagnostic` carries `code`.
pub fn has_code(diagnostic: &Diagnostic, code: DiagnosticCode) -> bool {
    diagnostic.code == code.id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use open_mainframe_lang_core::Span;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(DiagnosticCode::UnknownCharacter.id(), "NPL001");
        assert_eq!(DiagnosticCode::UnexpectedToken.id(), "NPP003");
        assert_eq!(DiagnosticCode::AmbiguousReference.id(), "NPR002");
        assert_eq!(DiagnosticCode::ValueTruncated.id(), "NPT002");
    }

    #[test]
    fn test_severity_table() {
        assert_eq!(DiagnosticCode::UnresolvedDdm.severity(), Severity::Warning);
        assert_eq!(DiagnosticCode::UnresolvedModule.severity(), Severity::Warning);
        assert_eq!(DiagnosticCode::UnresolvedReference.severity(), Severity::Error);
    }

    #[test]
    fn test_from_id_round_trip() {
        assert_eq!(
            DiagnosticCode::from_id("NPP016"),
            Some(DiagnosticCode::UnresolvedCopycode)
        );
        assert_eq!(DiagnosticCode::from_id("XYZ999"), None);
    }

    #[test]
    fn test_at_builds_diagnostic() {
        let pos = Position::new(Span::main(4, 9), 0, 4);
        let d = DiagnosticCode::CodeAfterEnd.at(pos, "Code after END");
        assert!(d.is_warning());
        assert!(has_code(&d, DiagnosticCode::CodeAfterEnd));
        assert_eq!(d.offset(), 4);
    }
}
