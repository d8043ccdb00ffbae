// SPDX-License-Identifier: Apache-2.0
//! Error types.
//!
//! [`ParseError`] is the parser's internal recovery signal: sub-parsers
//! return it through `Result`, and the statement loop turns it into an
//! `NPP003` diagnostic before resuming at the next line. It never leaves
//! the crate's public parse entry points.
//!
//! [`ProviderError`] covers loading sources and DDM descriptions.

use std::path::PathBuf;

use miette::Diagnostic;
use open_mainframe_lang_core::Position;
use thiserror::Error;

use crate::diagnostics::DiagnosticCode;

/// Recoverable parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ParseError {
    /// A token that does not fit the grammar at this point.
    #[error("Unexpected token '{found}', expected {expected}")]
    #[diagnostic(code(natparse::unexpected_token))]
    UnexpectedToken {
        found: String,
        expected: String,
        position: Position,
    },

    /// The token stream ended inside a construct.
    #[error("Unexpected end of input, expected {expected}")]
    #[diagnostic(code(natparse::unexpected_end_of_input))]
    UnexpectedEndOfInput { expected: String, position: Position },
}

impl ParseError {
    /// Where the failure was detected.
    pub fn position(&self) -> Position {
        match self {
            ParseError::UnexpectedToken { position, .. } => *position,
            ParseError::UnexpectedEndOfInput { position, .. } => *position,
        }
    }

    /// Convert into the `NPP003` diagnostic reported on the module.
    pub fn to_diagnostic(&self) -> open_mainframe_lang_core::Diagnostic {
        DiagnosticCode::UnexpectedToken.at(self.position(), self.to_string())
    }
}

/// Failure to load a source file.
#[derive(Debug, Error, Diagnostic)]
pub enum ProviderError {
    /// The file could not be read.
    #[error("cannot read '{path}'")]
    #[diagnostic(code(natparse::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The extension does not name a Natural object type.
    #[error("'{path}' has no Natural file extension")]
    #[diagnostic(code(natparse::unknown_extension))]
    UnknownExtension { path: PathBuf },

    #[error("'{path}' is not a valid DDM description")]
    #[diagnostic(code(natparse::invalid_ddm))]
    InvalidDdm {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use open_mainframe_lang_core::Span;

    #[test]
    fn test_parse_error_to_diagnostic() {
        let pos = Position::new(Span::main(10, 16), 1, 0);
        let err = ParseError::UnexpectedToken {
            found: "END-IF".into(),
            expected: "operand".into(),
            position: pos,
        };
        let d = err.to_diagnostic();
        assert_eq!(d.code, "NPP003");
        assert_eq!(d.position, pos);
        assert!(d.message.contains("END-IF"));
    }

    #[test]
    fn test_unknown_extension_message() {
        let err = ProviderError::UnknownExtension {
            path: PathBuf::from("SRC/README.TXT"),
        };
        assert!(err.to_string().contains("README.TXT"));
    }
}
