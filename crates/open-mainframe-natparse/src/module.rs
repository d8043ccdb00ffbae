// SPDX-License-Identifier: Apache-2.0
//! Natural modules: file identity, parse results and cross-module links.
//!
//! A [`NaturalModule`] is assembled once by [`NaturalModuleBuilder`] and is
//! read-only afterwards. The only shared mutable state is the caller
//! registry: a module that eagerly binds a callee registers itself with it,
//! and dropping the module deregisters it again.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use open_mainframe_lang_core::{AstNode, Diagnostic, FileTable, Position};

use crate::error::ProviderError;
use crate::header::SourceHeader;
use crate::lexer::{Keyword, SyntaxToken, TokenKind};
use crate::syntax::{DefineData, NodeId, SyntaxTree, Variable, VariableId, VariableScope};

// ---------------------------------------------------------------------------
// File types
// ---------------------------------------------------------------------------

/// Natural object type, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FileType {
    /// `.NSP`
    Program,
    /// `.NSN`
    Subprogram,
    /// `.NSS`
    Subroutine,
    /// `.NSH`
    Helproutine,
    /// `.NSC`
    Copycode,
    /// `.NS7`
    Function,
    /// `.NSM`
    Map,
    /// `.NSL`
    LocalDataArea,
    /// `.NSA`
    ParameterDataArea,
    /// `.NSG`
    GlobalDataArea,
    /// `.NSD`
    Ddm,
}

impl FileType {
    /// Type for a file extension, case-insensitive.
    pub fn from_extension(extension: &str) -> Option<FileType> {
        Some(match extension.to_ascii_uppercase().as_str() {
            "NSP" => FileType::Program,
            "NSN" => FileType::Subprogram,
            "NSS" => FileType::Subroutine,
            "NSH" => FileType::Helproutine,
            "NSC" => FileType::Copycode,
            "NS7" => FileType::Function,
            "NSM" => FileType::Map,
            "NSL" => FileType::LocalDataArea,
            "NSA" => FileType::ParameterDataArea,
            "NSG" => FileType::GlobalDataArea,
            "NSD" => FileType::Ddm,
            _ => return None,
        })
    }

    /// Type of `path`, from its extension.
    pub fn from_path(path: &Path) -> Option<FileType> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(FileType::from_extension)
    }

    /// Canonical extension.
    pub fn extension(self) -> &'static str {
        match self {
            FileType::Program => "NSP",
            FileType::Subprogram => "NSN",
            FileType::Subroutine => "NSS",
            FileType::Helproutine => "NSH",
            FileType::Copycode => "NSC",
            FileType::Function => "NS7",
            FileType::Map => "NSM",
            FileType::LocalDataArea => "NSL",
            FileType::ParameterDataArea => "NSA",
            FileType::GlobalDataArea => "NSG",
            FileType::Ddm => "NSD",
        }
    }

    /// Whether sources of this type contain a DEFINE DATA block.
    pub fn can_have_define_data(self) -> bool {
        !matches!(self, FileType::Copycode | FileType::Ddm)
    }

    /// Whether sources of this type contain statements.
    pub fn can_have_body(self) -> bool {
        !self.is_data_area() && self != FileType::Ddm
    }

    /// LDA, PDA and GDA.
    pub fn is_data_area(self) -> bool {
        matches!(
            self,
            FileType::LocalDataArea | FileType::ParameterDataArea | FileType::GlobalDataArea
        )
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Raw source of one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Object name (file stem, upper-case).
    pub name: String,
    /// Path the source was loaded from.
    pub path: PathBuf,
    /// Object type.
    pub file_type: FileType,
    /// Source text.
    pub text: String,
}

impl SourceFile {
    /// Source held in memory; the path is `NAME.EXT`.
    pub fn new(name: impl Into<String>, file_type: FileType, text: impl Into<String>) -> Self {
        let name = name.into().to_ascii_uppercase();
        let path = PathBuf::from(format!("{name}.{}", file_type.extension()));
        Self {
            name,
            path,
            file_type,
            text: text.into(),
        }
    }

    /// Load a source from disk; the type comes from the extension.
    pub fn read(path: impl AsRef<Path>) -> Result<SourceFile, ProviderError> {
        let path = path.as_ref();
        let file_type = FileType::from_path(path).ok_or_else(|| ProviderError::UnknownExtension {
            path: path.to_path_buf(),
        })?;
        let text = std::fs::read_to_string(path).map_err(|source| ProviderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_ascii_uppercase())
            .unwrap_or_default();
        Ok(SourceFile {
            name,
            path: path.to_path_buf(),
            file_type,
            text,
        })
    }
}

/// Identity of a parsed module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaturalFile {
    /// Name other modules use to refer to this one.
    pub referable_name: String,
    /// Source path.
    pub path: PathBuf,
    /// Object type.
    pub file_type: FileType,
}

impl NaturalFile {
    /// Identity of `source`. External subroutines are referable by the
    /// name in their `DEFINE SUBROUTINE`, every other module by its name.
    pub fn for_source(source: &SourceFile, tokens: &[SyntaxToken]) -> NaturalFile {
        let referable_name = match source.file_type {
            FileType::Subroutine => {
                subroutine_name(tokens).unwrap_or_else(|| source.name.clone())
            }
            _ => source.name.clone(),
        };
        NaturalFile {
            referable_name,
            path: source.path.clone(),
            file_type: source.file_type,
        }
    }
}

fn subroutine_name(tokens: &[SyntaxToken]) -> Option<String> {
    tokens.windows(3).find_map(|w| {
        let other_define = [Keyword::Data, Keyword::Work, Keyword::Printer]
            .iter()
            .any(|kw| w[1].is_keyword(*kw));
        if !w[0].is_keyword(Keyword::Define) || other_define {
            return None;
        }
        let name = if w[1].is_keyword(Keyword::Subroutine) {
            &w[2]
        } else {
            &w[1]
        };
        match name.kind() {
            TokenKind::Identifier | TokenKind::Keyword(_) => Some(name.upper()),
            _ => None,
        }
    })
}

// ---------------------------------------------------------------------------
// Module
// ---------------------------------------------------------------------------

/// A parsed Natural module.
#[derive(Debug)]
pub struct NaturalModule {
    file: NaturalFile,
    header: Option<SourceHeader>,
    define_data: Option<DefineData>,
    body: Option<NodeId>,
    tree: SyntaxTree,
    diagnostics: Vec<Diagnostic>,
    comments: Vec<SyntaxToken>,
    files: FileTable,
    callees: Vec<Arc<NaturalModule>>,
    callers: Mutex<BTreeMap<String, usize>>,
}

impl NaturalModule {
    /// Start building a module for `file`.
    pub fn builder(file: NaturalFile) -> NaturalModuleBuilder {
        NaturalModuleBuilder::new(file)
    }

    /// File identity.
    pub fn file(&self) -> &NaturalFile {
        &self.file
    }

    /// Name other modules use to refer to this one.
    pub fn referable_name(&self) -> &str {
        &self.file.referable_name
    }

    /// Object type.
    pub fn file_type(&self) -> FileType {
        self.file.file_type
    }

    /// Source header metadata.
    pub fn header(&self) -> Option<&SourceHeader> {
        self.header.as_ref()
    }

    /// DEFINE DATA block, when the module has a usable one.
    pub fn define_data(&self) -> Option<&DefineData> {
        self.define_data.as_ref()
    }

    /// Top-level statement list.
    pub fn body(&self) -> Option<NodeId> {
        self.body
    }

    /// Node and declaration arenas.
    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    /// Diagnostics in the order they were found.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Comments of the module's own file.
    pub fn comments(&self) -> &[SyntaxToken] {
        &self.comments
    }

    /// Paths of the module and its copy codes.
    pub fn files(&self) -> &FileTable {
        &self.files
    }

    /// Modules this module calls.
    pub fn callees(&self) -> &[Arc<NaturalModule>] {
        &self.callees
    }

    /// Referable names of the modules currently calling this one.
    pub fn callers(&self) -> Vec<String> {
        self.lock_callers().keys().cloned().collect()
    }

    /// Record that `caller` references this module.
    pub fn register_caller(&self, caller: &str) {
        *self.lock_callers().entry(caller.to_ascii_uppercase()).or_insert(0) += 1;
    }

    /// Undo one [`NaturalModule::register_caller`].
    pub fn deregister_caller(&self, caller: &str) {
        let mut callers = self.lock_callers();
        let key = caller.to_ascii_uppercase();
        if let Some(count) = callers.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                callers.remove(&key);
            }
        }
    }

    fn lock_callers(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, usize>> {
        self.callers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All declarations visible in the module.
    pub fn variables(&self) -> impl Iterator<Item = (VariableId, &Variable)> {
        self.define_data
            .iter()
            .flat_map(|dd| dd.variables.iter())
            .filter_map(|id| self.tree.variable(*id).map(|v| (*id, v)))
    }

    /// Declaration by plain or qualified name.
    pub fn find_variable(&self, name: &str) -> Option<(VariableId, &Variable)> {
        self.variables().find(|(_, v)| v.matches_name(name))
    }

    /// Level-1 `PARAMETER` declarations in order; these are what callers
    /// pass operands for.
    pub fn parameters(&self) -> Vec<&Variable> {
        self.variables()
            .map(|(_, v)| v)
            .filter(|v| v.scope == VariableScope::Parameter && v.level == 1)
            .collect()
    }
}

impl Drop for NaturalModule {
    fn drop(&mut self) {
        for callee in &self.callees {
            callee.deregister_caller(&self.file.referable_name);
        }
    }
}

impl AstNode for NaturalModule {
    fn position(&self) -> Option<Position> {
        let define_data = self.define_data.as_ref().and_then(|dd| dd.node);
        let first = define_data.or(self.body)?;
        let start = self.tree.span(first)?;
        match self.body.and_then(|b| self.tree.span(b)) {
            Some(end) => Some(start.union(end)),
            None => Some(start),
        }
    }
}

/// Callees bound while one module is parsed.
///
/// Adding a callee registers the caller with it; callees that never make it
/// into a built module are deregistered on drop.
#[derive(Debug, Default)]
pub(crate) struct CalleeSet {
    caller: String,
    modules: Vec<Arc<NaturalModule>>,
}

impl CalleeSet {
    pub(crate) fn new(caller: &str) -> Self {
        Self {
            caller: caller.to_ascii_uppercase(),
            modules: Vec::new(),
        }
    }

    /// Record `callee` once per referable name.
    pub(crate) fn add(&mut self, callee: &Arc<NaturalModule>) {
        let name = callee.referable_name();
        if self
            .modules
            .iter()
            .any(|m| m.referable_name().eq_ignore_ascii_case(name))
        {
            return;
        }
        callee.register_caller(&self.caller);
        self.modules.push(Arc::clone(callee));
    }

    pub(crate) fn into_vec(mut self) -> Vec<Arc<NaturalModule>> {
        std::mem::take(&mut self.modules)
    }
}

impl Drop for CalleeSet {
    fn drop(&mut self) {
        for callee in &self.modules {
            callee.deregister_caller(&self.caller);
        }
    }
}

/// Assembles a [`NaturalModule`].
#[derive(Debug)]
pub struct NaturalModuleBuilder {
    module: NaturalModule,
}

impl NaturalModuleBuilder {
    fn new(file: NaturalFile) -> Self {
        let files = FileTable::new(file.path.clone());
        Self {
            module: NaturalModule {
                file,
                header: None,
                define_data: None,
                body: None,
                tree: SyntaxTree::new(),
                diagnostics: Vec::new(),
                comments: Vec::new(),
                files,
                callees: Vec::new(),
                callers: Mutex::new(BTreeMap::new()),
            },
        }
    }

    /// Builder: source header.
    pub fn with_header(mut self, header: Option<SourceHeader>) -> Self {
        self.module.header = header;
        self
    }

    /// Builder: DEFINE DATA result.
    pub fn with_define_data(mut self, define_data: Option<DefineData>) -> Self {
        self.module.define_data = define_data;
        self
    }

    /// Builder: statement body.
    pub fn with_body(mut self, body: Option<NodeId>) -> Self {
        self.module.body = body;
        self
    }

    /// Builder: node arenas.
    pub fn with_tree(mut self, tree: SyntaxTree) -> Self {
        self.module.tree = tree;
        self
    }

    /// Builder: diagnostics.
    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.module.diagnostics = diagnostics;
        self
    }

    /// Builder: comments.
    pub fn with_comments(mut self, comments: Vec<SyntaxToken>) -> Self {
        self.module.comments = comments;
        self
    }

    /// Builder: file table.
    pub fn with_files(mut self, files: FileTable) -> Self {
        self.module.files = files;
        self
    }

    /// Builder: callees. Each must already have this module registered as
    /// a caller.
    pub fn with_callees(mut self, callees: Vec<Arc<NaturalModule>>) -> Self {
        self.module.callees = callees;
        self
    }

    /// Finish the module.
    pub fn build(self) -> NaturalModule {
        self.module
    }
}
