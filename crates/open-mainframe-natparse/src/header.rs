// SPDX-License-Identifier: Apache-2.0
//! `* >Natural Source Header` comment block.
//!
//! ```text
//! * >Natural Source Header 000000
//! * :Mode S
//! * :CP
//! * :LineIncrement 10
//! * <Natural Source Header
//! ```

use crate::lexer::SyntaxToken;

/// Structured or reporting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum ProgrammingMode {
    Structured,
    Reporting,
    #[default]
    Unknown,
}

/// Metadata from the source header.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct SourceHeader {
    /// `:Mode`.
    pub programming_mode: ProgrammingMode,
    /// `:LineIncrement`, 0 when absent.
    pub line_increment: u32,
    /// `:CP`, when set.
    pub code_page: Option<String>,
}

impl SourceHeader {
    /// Read the header from the leading comments of a module.
    ///
    /// Returns `None` when the comments do not start a header block.
    pub fn from_comments(comments: &[SyntaxToken]) -> Option<SourceHeader> {
        let mut lines = comments.iter().map(|c| c.text().trim_start_matches('*').trim());
        if !lines.next()?.starts_with(">Natural Source Header") {
            return None;
        }
        let mut header = SourceHeader::default();
        for line in lines {
            if line.starts_with("<Natural Source Header") {
                break;
            }
            let Some(entry) = line.strip_prefix(':') else {
                continue;
            };
            let (key, value) = entry.split_once(' ').unwrap_or((entry, ""));
            let value = value.trim();
            match key {
                "Mode" => {
                    header.programming_mode = match value {
                        "S" => ProgrammingMode::Structured,
                        "R" => ProgrammingMode::Reporting,
                        _ => ProgrammingMode::Unknown,
                    }
                }
                "LineIncrement" => header.line_increment = value.parse().unwrap_or(0),
                "CP" if !value.is_empty() => header.code_page = Some(value.to_string()),
                _ => {}
            }
        }
        Some(header)
    }
}
