// SPDX-License-Identifier: Apache-2.0
//! Module provider seam.
//!
//! The parser never touches the file system. Called modules, DDMs and copy
//! codes come from a [`ModuleProvider`]. [`CachingModuleProvider`] is the
//! standard implementation: it reads sources from a [`SourceLibrary`],
//! parses callees with their body skipped and memoises them in a
//! caller-supplied [`ModuleCache`].

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use open_mainframe_lang_core::FileId;

use crate::config::ParserOptions;
use crate::ddm::DataDefinitionModule;
use crate::error::ProviderError;
use crate::lexer::NaturalLexer;
use crate::module::{FileType, NaturalFile, NaturalModule, SourceFile};
use crate::pipeline::parse_module;

/// Resolves names to modules, DDMs and copy code sources.
///
/// Answers must be stable for the duration of one parse.
pub trait ModuleProvider {
    /// Parsed module with the given referable name.
    fn find_module(&self, _name: &str) -> Option<Arc<NaturalModule>> {
        None
    }

    /// DDM with the given name.
    fn find_ddm(&self, _name: &str) -> Option<Arc<DataDefinitionModule>> {
        None
    }

    /// Raw source of a copy code.
    fn find_copycode_source(&self, _name: &str) -> Option<SourceFile> {
        None
    }
}

/// Provider that knows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyProvider;

impl ModuleProvider for EmptyProvider {}

// ---------------------------------------------------------------------------
// Source libraries
// ---------------------------------------------------------------------------

/// Where sources come from.
pub trait SourceLibrary: Send + Sync {
    /// Source whose referable name is `name` and whose type is accepted.
    fn find_source(&self, name: &str, accept: fn(FileType) -> bool) -> Option<SourceFile>;

    /// DDM by name.
    fn find_ddm(&self, name: &str) -> Option<Arc<DataDefinitionModule>>;
}

/// A library held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLibrary {
    sources: Vec<(String, SourceFile)>,
    ddms: BTreeMap<String, Arc<DataDefinitionModule>>,
}

impl InMemoryLibrary {
    /// Create an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a source.
    pub fn with_source(mut self, source: SourceFile) -> Self {
        self.add_source(source);
        self
    }

    /// Builder: add a DDM.
    pub fn with_ddm(mut self, ddm: DataDefinitionModule) -> Self {
        self.add_ddm(ddm);
        self
    }

    /// Add a source, replacing one with the same referable name and type.
    pub fn add_source(&mut self, source: SourceFile) {
        let tokens = if source.file_type == FileType::Subroutine {
            NaturalLexer::new(FileId::MAIN).lex(&source.text).into_tokens()
        } else {
            Vec::new()
        };
        let name = NaturalFile::for_source(&source, &tokens).referable_name;
        self.sources
            .retain(|(n, s)| !(n == &name && s.file_type == source.file_type));
        self.sources.push((name, source));
    }

    /// Add a DDM.
    pub fn add_ddm(&mut self, ddm: DataDefinitionModule) {
        self.ddms.insert(ddm.name.clone(), Arc::new(ddm));
    }

    /// Load a file from disk. `.NSD` files hold a JSON DDM description.
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> Result<(), ProviderError> {
        let path = path.as_ref();
        if FileType::from_path(path) == Some(FileType::Ddm) {
            let text = std::fs::read_to_string(path).map_err(|source| ProviderError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let ddm: DataDefinitionModule =
                serde_json::from_str(&text).map_err(|source| ProviderError::InvalidDdm {
                    path: path.to_path_buf(),
                    source,
                })?;
            self.add_ddm(ddm);
            return Ok(());
        }
        self.add_source(SourceFile::read(path)?);
        Ok(())
    }

    /// Number of sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the library holds no sources.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl SourceLibrary for InMemoryLibrary {
    fn find_source(&self, name: &str, accept: fn(FileType) -> bool) -> Option<SourceFile> {
        self.sources
            .iter()
            .find(|(n, s)| n.eq_ignore_ascii_case(name) && accept(s.file_type))
            .map(|(_, s)| s.clone())
    }

    fn find_ddm(&self, name: &str) -> Option<Arc<DataDefinitionModule>> {
        self.ddms.get(&name.to_ascii_uppercase()).cloned()
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Parsed callees shared by every provider of one session.
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct ModuleCache {
    modules: Arc<RwLock<HashMap<String, Arc<NaturalModule>>>>,
}

impl ModuleCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached module by referable name.
    pub fn get(&self, name: &str) -> Option<Arc<NaturalModule>> {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&name.to_ascii_uppercase())
            .cloned()
    }

    /// Store a module under its referable name.
    pub fn insert(&self, module: Arc<NaturalModule>) {
        let name = module.referable_name().to_ascii_uppercase();
        self.modules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, module);
    }

    /// Drop one module, e.g. after its source changed.
    pub fn invalidate(&self, name: &str) -> Option<Arc<NaturalModule>> {
        self.modules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&name.to_ascii_uppercase())
    }

    /// Drop everything.
    pub fn clear(&self) {
        self.modules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of cached modules.
    pub fn len(&self) -> usize {
        self.modules.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Caching provider
// ---------------------------------------------------------------------------

fn is_callable(file_type: FileType) -> bool {
    !matches!(file_type, FileType::Copycode | FileType::Ddm)
}

fn is_copycode(file_type: FileType) -> bool {
    file_type == FileType::Copycode
}

/// Provider that parses callees from a library on demand.
///
/// Callees are parsed with [`ParserOptions::for_callee`], so only their
/// DEFINE DATA is read and call cycles between bodies cannot occur. A
/// module that is still being parsed further up the stack is reported as
/// not found.
pub struct CachingModuleProvider {
    library: Arc<dyn SourceLibrary>,
    cache: ModuleCache,
    options: ParserOptions,
    in_progress: Mutex<BTreeSet<String>>,
}

impl std::fmt::Debug for CachingModuleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingModuleProvider")
            .field("cache", &self.cache)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl CachingModuleProvider {
    /// Provider over `library` that stores callees in `cache`.
    pub fn new(library: Arc<dyn SourceLibrary>, cache: ModuleCache) -> Self {
        Self::with_options(library, cache, &ParserOptions::default())
    }

    /// Like [`CachingModuleProvider::new`], deriving callee options from
    /// `options`.
    pub fn with_options(
        library: Arc<dyn SourceLibrary>,
        cache: ModuleCache,
        options: &ParserOptions,
    ) -> Self {
        Self {
            library,
            cache,
            options: options.for_callee(),
            in_progress: Mutex::new(BTreeSet::new()),
        }
    }

    /// The shared cache.
    pub fn cache(&self) -> &ModuleCache {
        &self.cache
    }

    fn enter(&self, name: &str) -> bool {
        self.in_progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string())
    }

    fn leave(&self, name: &str) {
        self.in_progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
    }
}

impl ModuleProvider for CachingModuleProvider {
    fn find_module(&self, name: &str) -> Option<Arc<NaturalModule>> {
        let key = name.to_ascii_uppercase();
        if let Some(module) = self.cache.get(&key) {
            return Some(module);
        }
        let source = self.library.find_source(&key, is_callable)?;
        if !self.enter(&key) {
            tracing::debug!(module = %key, "module is already being parsed");
            return None;
        }
        tracing::debug!(module = %key, "parsing callee");
        let module = Arc::new(parse_module(&source, self, &self.options));
        self.leave(&key);
        self.cache.insert(Arc::clone(&module));
        Some(module)
    }

    fn find_ddm(&self, name: &str) -> Option<Arc<DataDefinitionModule>> {
        self.library.find_ddm(name)
    }

    fn find_copycode_source(&self, name: &str) -> Option<SourceFile> {
        self.library.find_source(name, is_copycode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;

    fn library() -> Arc<InMemoryLibrary> {
        Arc::new(
            InMemoryLibrary::new()
                .with_source(SourceFile::new(
                    "SUBPROG",
                    FileType::Subprogram,
                    "DEFINE DATA PARAMETER\n1 #P (A10)\nEND-DEFINE\nWRITE #P\nEND",
                ))
                .with_source(SourceFile::new("CC", FileType::Copycode, "WRITE 'X'"))
                .with_source(SourceFile::new(
                    "SUBFILE",
                    FileType::Subroutine,
                    "DEFINE SUBROUTINE EXT-SUB\nIGNORE\nEND-SUBROUTINE\nEND",
                ))
                .with_ddm(DataDefinitionModule::new("EMPLOYEES").with_field("NAME", DataType::alphanumeric(20))),
        )
    }

    #[test]
    fn test_empty_provider_finds_nothing() {
        assert!(EmptyProvider.find_module("X").is_none());
        assert!(EmptyProvider.find_ddm("X").is_none());
        assert!(EmptyProvider.find_copycode_source("X").is_none());
    }

    #[test]
    fn test_library_lookup_by_type() {
        let lib = library();
        assert!(lib.find_source("cc", is_copycode).is_some());
        assert!(lib.find_source("CC", is_callable).is_none());
        assert!(lib.find_source("EXT-SUB", is_callable).is_some());
        assert!(lib.find_ddm("employees").is_some());
        assert_eq!(lib.len(), 3);
    }

    #[test]
    fn test_callee_is_cached_without_body() {
        let cache = ModuleCache::new();
        let provider = CachingModuleProvider::new(library(), cache.clone());
        let first = provider.find_module("subprog");
        assert!(first.as_ref().is_some_and(|m| m.body().is_none()));
        assert_eq!(first.as_ref().map(|m| m.parameters().len()), Some(1));
        let second = provider.find_module("SUBPROG");
        assert!(matches!((&first, &second), (Some(a), Some(b)) if Arc::ptr_eq(a, b)));
        assert_eq!(cache.len(), 1);
        assert!(cache.invalidate("SUBPROG").is_some());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_copycode_and_ddm_pass_through() {
        let provider = CachingModuleProvider::new(library(), ModuleCache::new());
        assert!(provider.find_copycode_source("CC").is_some());
        assert!(provider.find_module("CC").is_none());
        assert!(provider.find_ddm("EMPLOYEES").is_some());
    }

    #[test]
    fn test_add_file_rejects_unknown_extension() {
        let mut lib = InMemoryLibrary::new();
        assert!(matches!(
            lib.add_file("notes.txt"),
            Err(ProviderError::UnknownExtension { .. })
        ));
    }
}
