// SPDX-License-Identifier: Apache-2.0
//! Parser configuration.
//!
//! Options are plain data so that embedding tools can load them from their
//! own configuration files (`serde` with defaults for missing keys).

/// Switches for the individual pipeline stages.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Parse the statement body. Providers parse callees with `false`, which
    /// stops after `DEFINE DATA` and breaks call cycles.
    pub parse_body: bool,
    /// Expand `INCLUDE` directives before parsing.
    pub resolve_includes: bool,
    /// Bind variable and subroutine references after parsing.
    pub resolve_references: bool,
    /// Run the type checker and truncation analyzer.
    pub check_types: bool,
    /// Maximum copy code nesting depth.
    pub max_include_depth: usize,
    /// Name prefix of unit-test subprograms.
    pub test_module_prefix: String,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            parse_body: true,
            resolve_includes: true,
            resolve_references: true,
            check_types: true,
            max_include_depth: 16,
            test_module_prefix: "TC".to_string(),
        }
    }
}

impl ParserOptions {
    /// Options used when a provider parses a callee: declarations only.
    pub fn for_callee(&self) -> Self {
        Self {
            parse_body: false,
            check_types: false,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = ParserOptions::default();
        assert!(opts.parse_body);
        assert!(opts.resolve_includes);
        assert_eq!(opts.max_include_depth, 16);
        assert_eq!(opts.test_module_prefix, "TC");
    }

    #[test]
    fn test_callee_options_skip_body() {
        let opts = ParserOptions::default().for_callee();
        assert!(!opts.parse_body);
        assert!(!opts.check_types);
        assert!(opts.resolve_references);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let opts: ParserOptions =
            serde_json::from_str(r#"{ "max_include_depth": 4, "check_types": false }"#)
                .unwrap();
        assert_eq!(opts.max_include_depth, 4);
        assert!(!opts.check_types);
        assert!(opts.parse_body);
        assert_eq!(opts.test_module_prefix, "TC");
    }
}
