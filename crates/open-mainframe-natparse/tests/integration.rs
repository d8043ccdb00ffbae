//! Integration tests covering the full module pipeline.

use std::sync::Arc;

use open_mainframe_lang_core::FileId;
use open_mainframe_natparse::{
    lex_source, parse_module, CachingModuleProvider, EmptyProvider, FileType, InMemoryLibrary,
    ModuleCache, ModuleProvider, NaturalLexer, NaturalModule, NodeKind, ParserOptions,
    SourceFile, SyntaxTree, VariableKind,
};
use open_mainframe_natparse::syntax::{Binding, NodeId, Statement};

fn program(text: &str) -> SourceFile {
    SourceFile::new("PGM", FileType::Program, text)
}

fn parse(text: &str) -> NaturalModule {
    parse_module(&program(text), &EmptyProvider, &ParserOptions::default())
}

fn codes(module: &NaturalModule) -> Vec<&str> {
    module.diagnostics().iter().map(|d| d.code.as_str()).collect()
}

fn library() -> Arc<InMemoryLibrary> {
    Arc::new(
        InMemoryLibrary::new()
            .with_source(SourceFile::new("MYCC", FileType::Copycode, "WRITE &1& #NOPARM"))
            .with_source(SourceFile::new(
                "SUBPROG",
                FileType::Subprogram,
                "DEFINE DATA PARAMETER\n1 #IN (A10)\n1 #OUT (N5) OPTIONAL\nEND-DEFINE\n#OUT := 1\nEND\n",
            )),
    )
}

const SAMPLE: &str = "\
DEFINE DATA LOCAL
1 #CUSTOMER
2 #NAME (A20)
2 #ID (N8)
1 #COUNT (I4)
1 #LIST (A10/1:5)
END-DEFINE
#COUNT := 0
FOR #COUNT := 1 TO 5
  IF #LIST(#COUNT) = ' '
    ESCAPE BOTTOM
  END-IF
  COMPRESS 'ID' #ID INTO #NAME
END-FOR
DECIDE ON FIRST VALUE OF #COUNT
  VALUE 1, 2
    WRITE 'LOW'
  NONE
    IGNORE
END-DECIDE
END
";

/// Test: the smallest complete program parses cleanly and binds its one
/// reference.
#[test]
fn simple_module_has_no_diagnostics() {
    let module = parse("DEFINE DATA LOCAL 1 #X (A10) END-DEFINE #X := 'HELLO' END");
    assert!(module.diagnostics().is_empty(), "{:?}", module.diagnostics());
    let (_, x) = module.find_variable("#X").unwrap();
    assert_eq!(x.references.len(), 1);
}

/// Test: an unqualified name declared in two groups is reported once, with
/// both qualified names as remediation.
#[test]
fn ambiguous_reference_lists_both_qualifications() {
    let module = parse(
        "DEFINE DATA LOCAL\n1 #GRP1\n2 #THEVAR (A5)\n1 #GRP2\n2 #THEVAR (A5)\nEND-DEFINE\nWRITE #THEVAR\nEND\n",
    );
    assert_eq!(codes(&module), vec!["NPR002"]);
    let suggestion = module.diagnostics()[0].suggestion.as_deref().unwrap_or_default();
    assert!(suggestion.contains("#GRP1.#THEVAR"));
    assert!(suggestion.contains("#GRP2.#THEVAR"));
}

/// Test: copy code parameters are substituted in order and reported at the
/// literal in the including source.
#[test]
fn include_parameter_substitution() {
    let provider = CachingModuleProvider::new(library(), ModuleCache::new());
    let text = "DEFINE DATA LOCAL\n1 #INNER (A5)\n1 #NOPARM (A5)\nEND-DEFINE\nINCLUDE MYCC '#INNER'\nEND\n";
    let source = program(text);

    let (tokens, _) = lex_source(&source, &provider, &ParserOptions::default());
    let texts: Vec<&str> = tokens.tokens().iter().map(|t| t.text()).collect();
    let write = texts.iter().position(|t| *t == "WRITE").unwrap();
    assert_eq!(&texts[write..write + 3], &["WRITE", "#INNER", "#NOPARM"]);

    let raw = NaturalLexer::new(FileId::MAIN).lex(text);
    let literal = raw.tokens().iter().find(|t| t.text() == "'#INNER'").unwrap();
    assert_eq!(tokens.tokens()[write + 1].diagnostic_position(), literal.position());

    let module = parse_module(&source, &provider, &ParserOptions::default());
    assert!(module.diagnostics().is_empty(), "{:?}", module.diagnostics());
    let (_, inner) = module.find_variable("#INNER").unwrap();
    assert_eq!(inner.references.len(), 1);
    assert_eq!(module.files().len(), 2);
}

/// Test: calling a module nobody provides is a warning, not a failure.
#[test]
fn unresolved_module_is_tolerated() {
    let module = parse("CALLNAT 'DOES-NOT-EXIST'\nEND\n");
    assert_eq!(codes(&module), vec!["NPP017"]);
    assert!(module.diagnostics().iter().all(|d| !d.is_error()));

    let tree = module.tree();
    let callnat = module
        .body()
        .map(|b| tree.children(b).to_vec())
        .unwrap_or_default()
        .into_iter()
        .find_map(|n| match tree.statement(n) {
            Some(Statement::Callnat { module, .. }) => Some(*module),
            _ => None,
        })
        .unwrap();
    let symbol = tree.symbols(callnat)[0];
    assert!(tree.binding(symbol).is_none());
    assert!(module.callees().is_empty());
}

/// Test: a resolved CALLNAT registers the caller with the callee until the
/// caller is dropped.
#[test]
fn callee_registry_follows_caller() {
    let provider = CachingModuleProvider::new(library(), ModuleCache::new());
    let source = SourceFile::new(
        "MAIN",
        FileType::Program,
        "DEFINE DATA LOCAL\n1 #A (A10)\nEND-DEFINE\nCALLNAT 'SUBPROG' #A\nEND\n",
    );
    let module = parse_module(&source, &provider, &ParserOptions::default());
    assert!(module.diagnostics().is_empty(), "{:?}", module.diagnostics());
    let callee = provider.find_module("SUBPROG").unwrap();
    assert_eq!(callee.callers(), vec!["MAIN".to_string()]);
    assert!(callee.body().is_none());

    drop(module);
    assert!(callee.callers().is_empty());
}

/// Test: relexing the same source against the same provider state yields
/// the same tokens.
#[test]
fn lexing_is_idempotent() {
    let provider = CachingModuleProvider::new(library(), ModuleCache::new());
    let source = program("INCLUDE MYCC '#A'\nINCLUDE MYCC '#B'\nEND\n");
    let options = ParserOptions::default();
    let (first, _) = lex_source(&source, &provider, &options);
    let (second, _) = lex_source(&source, &provider, &options);
    assert_eq!(first.tokens(), second.tokens());
    assert_eq!(first.include_sites(), second.include_sites());
}

/// Test: every composite node spans exactly the union of its children.
#[test]
fn node_spans_cover_children() {
    let module = parse(SAMPLE);
    assert!(module.diagnostics().is_empty(), "{:?}", module.diagnostics());
    let tree = module.tree();
    let body = module.body().unwrap();
    let mut checked = 0;
    for node in tree.descendants(body) {
        let children = tree.children(node);
        if children.is_empty() {
            continue;
        }
        let Some(span) = tree.span(node) else {
            continue;
        };
        let union = children
            .iter()
            .filter_map(|c| tree.span(*c))
            .reduce(|a, b| a.union(b));
        assert_eq!(Some(span), union);
        for child in children.iter().filter_map(|c| tree.span(*c)) {
            assert!(span.offset() <= child.offset());
            assert!(span.end() >= child.end());
        }
        checked += 1;
    }
    assert!(checked > 10);
}

/// Test: group members are always deeper than their group.
#[test]
fn groups_own_deeper_levels() {
    let module = parse(
        "DEFINE DATA LOCAL\n1 #A\n2 #B\n3 #C (A1)\n2 #D (N2)\n1 #E (A1)\n1 #F (A4)\n1 REDEFINE #F\n2 #F1 (A2)\n2 #F2 (A2)\nEND-DEFINE\nEND\n",
    );
    assert!(module.diagnostics().is_empty(), "{:?}", module.diagnostics());
    let tree = module.tree();
    let mut groups = 0;
    for (_, variable) in module.variables() {
        if !variable.is_group() {
            continue;
        }
        groups += 1;
        assert!(!variable.children.is_empty());
        for child in &variable.children {
            let child = tree.variable(*child).unwrap();
            assert!(child.level > variable.level);
        }
    }
    assert_eq!(groups, 3);
    let (_, redefine) = module.variables().find(|(_, v)| matches!(v.kind, VariableKind::Redefine { .. })).unwrap();
    assert_eq!(redefine.children.len(), 2);
}

/// Test: references and declarations point at each other, and removing a
/// statement drops its references.
#[test]
fn references_are_bidirectional() {
    let module = parse(SAMPLE);
    let mut tree: SyntaxTree = module.tree().clone();
    let (count_id, count) = module.find_variable("#COUNT").unwrap();
    assert!(count.references.len() >= 3);
    for symbol in &count.references {
        assert_eq!(tree.binding(*symbol), Some(&Binding::Variable(count_id)));
    }

    let body = module.body().unwrap();
    let for_loop: NodeId = tree
        .children(body)
        .iter()
        .copied()
        .find(|n| matches!(tree.kind(*n), Some(NodeKind::Statement(Statement::For { .. }))))
        .unwrap();
    let inside: Vec<NodeId> = tree.symbols(for_loop);
    tree.remove(for_loop);
    let remaining = &tree.variable(count_id).unwrap().references;
    assert!(inside.iter().all(|s| !remaining.contains(s)));
    assert_eq!(remaining.len(), count.references.len() - inside.iter().filter(|s| count.references.contains(s)).count());
}

/// Test: type checks and truncation run as part of the pipeline.
#[test]
fn type_checks_are_reported() {
    let module = parse(
        "DEFINE DATA LOCAL\n1 #A (A3)\n1 #N (N3)\n1 #K (A1) CONST <'K'>\nEND-DEFINE\n#A := 'TOO LONG'\n#N := 'X'\n#K := 'Y'\nIF #N = 'Z'\nIGNORE\nEND-IF\nEND\n",
    );
    assert_eq!(codes(&module), vec!["NPT001", "NPT003", "NPT005", "NPT002"]);
}

/// Test: a data area has declarations but no body.
#[test]
fn data_area_has_no_body() {
    let source = SourceFile::new("MYLDA", FileType::LocalDataArea, "DEFINE DATA LOCAL\n1 #A (A1)\nEND-DEFINE\n");
    let module = parse_module(&source, &EmptyProvider, &ParserOptions::default());
    assert!(module.body().is_none());
    assert_eq!(module.variables().count(), 1);

    let missing = SourceFile::new("EMPTY", FileType::LocalDataArea, "");
    let module = parse_module(&missing, &EmptyProvider, &ParserOptions::default());
    assert_eq!(codes(&module), vec!["NPP001"]);
}

/// Test: float literals stored into single-precision fields and array
/// indices named like formats produce no diagnostics.
#[test]
fn float_fields_and_format_like_indices() {
    let module = parse(
        "DEFINE DATA LOCAL\n1 #F (F4) INIT <2E1>\n1 N1 (I4) INIT <1>\n1 #ARR (A1/1:5,1:5)\n1 #X (A1)\nEND-DEFINE\n#F := 1.5E3\n#X := #ARR(N1,2)\nEND\n",
    );
    assert!(module.diagnostics().is_empty(), "{:?}", module.diagnostics());
    let (_, n1) = module.find_variable("N1").unwrap();
    assert_eq!(n1.references.len(), 1);
}
