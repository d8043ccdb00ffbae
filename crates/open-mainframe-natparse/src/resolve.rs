// SPDX-License-Identifier: Apache-2.0
//! Reference resolution.
//!
//! After parsing, every unbound variable and subroutine symbol of a module
//! is matched against the module's declarations, its inline subroutines and
//! the modules the provider knows about. Failures become `NPR` diagnostics;
//! the tree stays usable either way.

use std::collections::HashMap;
use std::sync::Arc;

use open_mainframe_lang_core::{Diagnostic, Position};

use crate::config::ParserOptions;
use crate::diagnostics::DiagnosticCode;
use crate::module::{FileType, NaturalFile, NaturalModule};
use crate::parser::check_call_parameters;
use crate::provider::ModuleProvider;
use crate::syntax::{
    Binding, DefineData, NodeId, Statement, SymbolKind, SyntaxTree, VariableId, VariableKind,
};

/// Prefixes of implicit names derived from a declared field: `C*` counts a
/// periodic group, `T*` and `P*` are attribute and position variables.
const DERIVED_PREFIXES: &[&str] = &["C*", "T*", "P*"];

/// Optional lifecycle hooks of unit-test subprograms.
const TEST_HOOKS: &[&str] = &["SETUP", "TEARDOWN"];

/// What the resolver produced besides the bindings in the tree.
#[derive(Debug, Default)]
pub struct Resolution {
    /// `NPR` and parameter diagnostics in source order.
    pub diagnostics: Vec<Diagnostic>,
    /// External subroutines bound by `PERFORM`.
    pub callees: Vec<Arc<NaturalModule>>,
}

/// Binds the symbols of one module.
pub struct ReferenceResolver<'a> {
    tree: &'a mut SyntaxTree,
    provider: &'a dyn ModuleProvider,
    options: &'a ParserOptions,
    file: &'a NaturalFile,
    /// Upper-case name to declarations visible in the module.
    variables: HashMap<String, Vec<VariableId>>,
    /// Upper-case name to `DEFINE SUBROUTINE` node.
    subroutines: HashMap<String, NodeId>,
    diagnostics: Vec<Diagnostic>,
    callees: Vec<Arc<NaturalModule>>,
}

impl<'a> ReferenceResolver<'a> {
    /// Create a resolver for the tree of `file`.
    pub fn new(
        tree: &'a mut SyntaxTree,
        file: &'a NaturalFile,
        provider: &'a dyn ModuleProvider,
        options: &'a ParserOptions,
    ) -> Self {
        Self {
            tree,
            provider,
            options,
            file,
            variables: HashMap::new(),
            subroutines: HashMap::new(),
            diagnostics: Vec::new(),
            callees: Vec::new(),
        }
    }

    /// Resolve every unbound symbol under the DEFINE DATA block and `body`.
    pub fn resolve(
        mut self,
        define_data: Option<&DefineData>,
        body: Option<NodeId>,
    ) -> Resolution {
        self.index_variables(define_data);
        if let Some(body) = body {
            self.index_subroutines(body);
        }

        let roots = define_data
            .and_then(|dd| dd.node)
            .into_iter()
            .chain(body);
        let mut symbols = Vec::new();
        for root in roots {
            symbols.extend(self.tree.symbols(root));
        }

        for symbol in symbols {
            let kind = match self.tree.symbol_ref(symbol) {
                Some(reference) if reference.binding.is_none() => reference.kind,
                _ => continue,
            };
            match kind {
                SymbolKind::Variable => self.resolve_variable(symbol),
                SymbolKind::Subroutine => self.resolve_subroutine(symbol),
                SymbolKind::Module | SymbolKind::Copycode => {}
            }
        }

        tracing::debug!(
            module = %self.file.referable_name,
            diagnostics = self.diagnostics.len(),
            "resolved references"
        );
        Resolution {
            diagnostics: self.diagnostics,
            callees: self.callees,
        }
    }

    fn index_variables(&mut self, define_data: Option<&DefineData>) {
        let Some(define_data) = define_data else {
            return;
        };
        for id in &define_data.variables {
            let Some(variable) = self.tree.variable(*id) else {
                continue;
            };
            // a REDEFINE carries the name of the field it overlays
            if matches!(
                variable.kind,
                VariableKind::Redefine { .. } | VariableKind::Filler { .. }
            ) {
                continue;
            }
            self.variables
                .entry(variable.name.clone())
                .or_default()
                .push(*id);
            if variable.qualified_name != variable.name {
                self.variables
                    .entry(variable.qualified_name.clone())
                    .or_default()
                    .push(*id);
            }
        }
    }

    fn index_subroutines(&mut self, body: NodeId) {
        for node in self.tree.descendants(body) {
            if let Some(Statement::Subroutine { name, .. }) = self.tree.statement(node) {
                if let Some(token) = self.tree.leaf_token(*name) {
                    self.subroutines.entry(token.upper()).or_insert(node);
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Variables
    // -----------------------------------------------------------------------

    fn resolve_variable(&mut self, symbol: NodeId) {
        let Some(reference) = self.tree.symbol_ref(symbol) else {
            return;
        };
        let name = reference.name();
        let position = reference.token.diagnostic_position();
        if name.starts_with('&') {
            return;
        }

        let mut candidates = self.candidates(&name);
        if candidates.is_empty() {
            if let Some(stripped) = strip_derived_prefix(&name) {
                candidates = self.candidates(stripped);
            }
        }

        match candidates.as_slice() {
            [] => {
                tracing::trace!(name = %name, "unresolved reference");
                self.diagnostics.push(
                    DiagnosticCode::UnresolvedReference
                        .at(position, format!("Unresolved reference: {name}")),
                );
            }
            [single] => self.tree.bind(symbol, Binding::Variable(*single)),
            several => match self.view_field(several) {
                Some(field) => self.tree.bind(symbol, Binding::Variable(field)),
                None => self.report_ambiguous(&name, several, position),
            },
        }
    }

    /// Declarations matching `name`. Inline declarations hide imported ones.
    fn candidates(&self, name: &str) -> Vec<VariableId> {
        let Some(ids) = self.variables.get(name) else {
            return Vec::new();
        };
        let declared: Vec<VariableId> = ids
            .iter()
            .copied()
            .filter(|id| self.tree.variable(*id).is_some_and(|v| !v.is_imported()))
            .collect();
        if declared.is_empty() {
            ids.clone()
        } else {
            declared
        }
    }

    /// The only candidate declared inside a view, if there is exactly one.
    fn view_field(&self, candidates: &[VariableId]) -> Option<VariableId> {
        let mut in_view = candidates
            .iter()
            .copied()
            .filter(|id| self.tree.variable(*id).is_some_and(|v| v.in_view));
        let first = in_view.next()?;
        in_view.next().is_none().then_some(first)
    }

    fn report_ambiguous(&mut self, name: &str, candidates: &[VariableId], position: Position) {
        let qualified: Vec<&str> = candidates
            .iter()
            .filter_map(|id| self.tree.variable(*id))
            .map(|v| v.qualified_name.as_str())
            .collect();
        let diagnostic = DiagnosticCode::AmbiguousReference
            .at(position, format!("Ambiguous reference: {name}"))
            .with_suggestion(format!("Qualify the reference: {}", qualified.join(", ")));
        self.diagnostics.push(diagnostic);
    }

    // -----------------------------------------------------------------------
    // Subroutines
    // -----------------------------------------------------------------------

    fn resolve_subroutine(&mut self, symbol: NodeId) {
        let Some(reference) = self.tree.symbol_ref(symbol) else {
            return;
        };
        let name = reference.name();
        let position = reference.token.diagnostic_position();

        if let Some(definition) = self.subroutines.get(&name).copied() {
            self.tree.bind(symbol, Binding::Subroutine(definition));
            return;
        }

        if let Some(callee) = self.provider.find_module(&name) {
            tracing::debug!(subroutine = %name, "bound external subroutine");
            self.tree
                .bind(symbol, Binding::Module(callee.referable_name().to_string()));
            if callee.define_data().is_some() {
                let parameters = self.perform_parameters(symbol);
                let problems = check_call_parameters(&callee, self.tree, &parameters, position);
                self.diagnostics.extend(problems);
            }
            if !self
                .callees
                .iter()
                .any(|c| c.referable_name() == callee.referable_name())
            {
                self.callees.push(callee);
            }
            return;
        }

        if self.is_test_hook(&name) {
            return;
        }
        self.diagnostics.push(
            DiagnosticCode::UnresolvedSubroutine
                .at(position, format!("Subroutine {name} not found")),
        );
    }

    fn perform_parameters(&self, symbol: NodeId) -> Vec<NodeId> {
        match self.tree.parent(symbol).and_then(|p| self.tree.statement(p)) {
            Some(Statement::Perform { parameters, .. }) => parameters.clone(),
            _ => Vec::new(),
        }
    }

    fn is_test_hook(&self, name: &str) -> bool {
        let prefix = self.options.test_module_prefix.to_ascii_uppercase();
        self.file.file_type == FileType::Subprogram
            && !prefix.is_empty()
            && self.file.referable_name.to_ascii_uppercase().starts_with(&prefix)
            && TEST_HOOKS.contains(&name)
    }
}

/// `NAME` for `+NAME`, `C*NAME`, `T*NAME` and `P*NAME`.
fn strip_derived_prefix(name: &str) -> Option<&str> {
    if let Some(rest) = name.strip_prefix('+') {
        return Some(rest);
    }
    DERIVED_PREFIXES
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::SourceFile;
    use crate::pipeline::parse_module;
    use crate::provider::{CachingModuleProvider, EmptyProvider, InMemoryLibrary, ModuleCache};
    use crate::syntax::NodeKind;

    fn parse(name: &str, file_type: FileType, text: &str) -> NaturalModule {
        let source = SourceFile::new(name, file_type, text);
        parse_module(&source, &EmptyProvider, &ParserOptions::default())
    }

    fn codes(module: &NaturalModule) -> Vec<&str> {
        module.diagnostics().iter().map(|d| d.code.as_str()).collect()
    }

    #[test]
    fn test_strip_derived_prefix() {
        assert_eq!(strip_derived_prefix("C*FIELD"), Some("FIELD"));
        assert_eq!(strip_derived_prefix("+AIV"), Some("AIV"));
        assert_eq!(strip_derived_prefix("#X"), None);
        assert_eq!(strip_derived_prefix("C*"), None);
    }

    #[test]
    fn test_binds_declared_variable() {
        let module = parse(
            "PGM",
            FileType::Program,
            "DEFINE DATA LOCAL\n1 #X (A10)\nEND-DEFINE\n#X := 'HELLO'\nWRITE #X\nEND\n",
        );
        assert!(codes(&module).is_empty());
        let (_, variable) = module.find_variable("#X").unwrap();
        assert_eq!(variable.references.len(), 2);
    }

    #[test]
    fn test_unresolved_reference() {
        let module = parse("PGM", FileType::Program, "WRITE #MISSING\nEND\n");
        assert_eq!(codes(&module), vec!["NPR001"]);
        assert!(module.diagnostics()[0].message.contains("#MISSING"));
    }

    #[test]
    fn test_ambiguous_reference_lists_qualified_names() {
        let module = parse(
            "PGM",
            FileType::Program,
            "DEFINE DATA LOCAL\n1 #GRP1\n2 #THEVAR (A5)\n1 #GRP2\n2 #THEVAR (A5)\nEND-DEFINE\nWRITE #THEVAR\nWRITE #GRP1.#THEVAR\nEND\n",
        );
        assert_eq!(codes(&module), vec!["NPR002"]);
        let suggestion = module.diagnostics()[0].suggestion.clone().unwrap();
        assert!(suggestion.contains("#GRP1.#THEVAR"));
        assert!(suggestion.contains("#GRP2.#THEVAR"));
    }

    #[test]
    fn test_view_field_wins_tie() {
        let module = parse(
            "PGM",
            FileType::Program,
            "DEFINE DATA LOCAL\n1 EMP VIEW OF EMPLOYEES\n2 NAME\n1 #GRP\n2 NAME (A20)\nEND-DEFINE\nWRITE NAME\nEND\n",
        );
        assert!(!codes(&module).contains(&"NPR002"));
        let bound = module
            .variables()
            .find(|(_, v)| v.name == "NAME" && v.in_view)
            .map(|(_, v)| v.references.len());
        assert_eq!(bound, Some(1));
    }

    #[test]
    fn test_redefined_field_is_not_ambiguous() {
        let module = parse(
            "PGM",
            FileType::Program,
            "DEFINE DATA LOCAL\n1 #A (A4)\n1 REDEFINE #A\n2 #A1 (A2)\n2 #A2 (A2)\nEND-DEFINE\nWRITE #A #A1 #A.#A2\nEND\n",
        );
        assert!(codes(&module).is_empty(), "{:?}", codes(&module));
    }

    #[test]
    fn test_format_like_name_as_index() {
        let module = parse(
            "PGM",
            FileType::Program,
            "DEFINE DATA LOCAL\n1 N1 (I4)\n1 A1 (I4)\n1 #ARR (A1/1:5,1:5)\n1 #X (A1)\nEND-DEFINE\n#X := #ARR(N1,2)\n#X := #ARR(A1,N1)\nEND\n",
        );
        assert!(codes(&module).is_empty(), "{:?}", codes(&module));
        let (_, n1) = module.find_variable("N1").unwrap();
        assert_eq!(n1.references.len(), 2);
    }

    #[test]
    fn test_derived_prefix_resolves_to_field() {
        let module = parse(
            "PGM",
            FileType::Program,
            "DEFINE DATA LOCAL\n1 #ARR (A5/1:10)\nEND-DEFINE\nWRITE C*#ARR\nEND\n",
        );
        assert!(codes(&module).is_empty());
    }

    #[test]
    fn test_internal_subroutine_binding() {
        let module = parse(
            "PGM",
            FileType::Program,
            "PERFORM MY-SUB\nDEFINE SUBROUTINE MY-SUB\nIGNORE\nEND-SUBROUTINE\nEND\n",
        );
        assert!(codes(&module).is_empty());
        let tree = module.tree();
        let definition = module
            .body()
            .map(|b| tree.descendants(b))
            .unwrap_or_default()
            .into_iter()
            .find(|n| {
                matches!(
                    tree.kind(*n),
                    Some(NodeKind::Statement(Statement::Subroutine { .. }))
                )
            })
            .unwrap();
        assert_eq!(tree.referencers(definition).len(), 1);
    }

    #[test]
    fn test_unresolved_subroutine_and_test_hooks() {
        let module = parse("PGM", FileType::Program, "PERFORM NOWHERE\nEND\n");
        assert_eq!(codes(&module), vec!["NPR003"]);

        let test_module = parse(
            "TCMYTEST",
            FileType::Subprogram,
            "PERFORM SETUP\nPERFORM TEARDOWN\nEND\n",
        );
        assert!(codes(&test_module).is_empty());

        let plain = parse("MYSUBP", FileType::Subprogram, "PERFORM SETUP\nEND\n");
        assert_eq!(codes(&plain), vec!["NPR003"]);
    }

    #[test]
    fn test_external_subroutine_is_a_callee() {
        let library = Arc::new(InMemoryLibrary::new().with_source(SourceFile::new(
            "EXTSUB",
            FileType::Subroutine,
            "DEFINE DATA PARAMETER\n1 #P (A10)\nEND-DEFINE\nDEFINE SUBROUTINE EXT-SUB\nIGNORE\nEND-SUBROUTINE\nEND\n",
        )));
        let provider = CachingModuleProvider::new(library, ModuleCache::new());
        let source = SourceFile::new(
            "CALLER",
            FileType::Program,
            "DEFINE DATA LOCAL\n1 #A (A10)\nEND-DEFINE\nPERFORM EXT-SUB #A\nPERFORM EXT-SUB\nEND\n",
        );
        let module = parse_module(&source, &provider, &ParserOptions::default());
        assert_eq!(codes(&module), vec!["NPP020"]);
        assert_eq!(module.callees().len(), 1);
        assert_eq!(module.callees()[0].callers(), vec!["CALLER".to_string()]);
    }
}
