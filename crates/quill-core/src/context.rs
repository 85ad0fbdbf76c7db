//! Compilation context
//!
//! One [`Context`] holds everything a compilation accumulates: document
//! metadata, registered functions, variables, link definitions, the
//! loaded bibliographies, localization tables, stored media and diagnostics. It is
//! created once and passed by reference through every stage. A REPL keeps
//! reusing the same value, so state carries over between inputs.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use quill_ast::Node;
use tracing::{debug, warn};

use crate::bibliography::Bibliography;
use crate::config::{MediaStorageOptions, PipelineOptions};
use crate::diagnostics::{Diagnostic, Severity};
use crate::document::DocumentInfo;
use crate::error::{QuillError, Result};
use crate::function::{Function, Injection, Library};
use crate::loader::{MemoryLoader, ResourceLoader};
use crate::localization::{LocalizationTables, DEFAULT_LOCALE, STD_TABLE};
use crate::media::MediaStorage;
use crate::parser;
use crate::resolution::LinkTarget;
use crate::value::Value;

/// What the context knows about the pipeline driving it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineInfo {
    /// Name of the render target
    pub target: String,
    /// Which media are stored, after user overrides
    pub media: MediaStorageOptions,
}

/// Mutable state of a compilation
pub struct Context {
    pub document: DocumentInfo,
    pub localization: LocalizationTables,
    pub media: MediaStorage,
    options: PipelineOptions,
    pipeline: Option<PipelineInfo>,
    loader: Box<dyn ResourceLoader>,
    registry: HashMap<String, Vec<Rc<Function>>>,
    loaded: Vec<String>,
    loadable: BTreeMap<String, Library>,
    scopes: Vec<HashMap<String, Value>>,
    link_definitions: BTreeMap<String, LinkTarget>,
    bibliographies: Vec<(String, Bibliography)>,
    diagnostics: Vec<Diagnostic>,
    depth: usize,
}

impl Default for Context {
    fn default() -> Self {
        Self::new(MemoryLoader::new())
    }
}

impl Context {
    /// A fresh context reading resources through `loader`
    pub fn new(loader: impl ResourceLoader + 'static) -> Self {
        Self {
            document: DocumentInfo::default(),
            localization: LocalizationTables::new(),
            media: MediaStorage::new(),
            options: PipelineOptions::default(),
            pipeline: None,
            loader: Box::new(loader),
            registry: HashMap::new(),
            loaded: Vec::new(),
            loadable: BTreeMap::new(),
            scopes: vec![HashMap::new()],
            link_definitions: BTreeMap::new(),
            bibliographies: Vec::new(),
            diagnostics: Vec::new(),
            depth: 0,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Bind the context to a pipeline
    pub(crate) fn attach(&mut self, info: PipelineInfo, options: PipelineOptions) {
        debug!(target_name = %info.target, "context attached to pipeline");
        if self.document.name.is_none() {
            self.document.name = options.document_name.clone();
        }
        self.pipeline = Some(info);
        self.options = options;
    }

    /// The attached pipeline, or [`QuillError::UnattachedPipeline`]
    pub fn attached_pipeline(&self) -> Result<&PipelineInfo> {
        self.pipeline.as_ref().ok_or(QuillError::UnattachedPipeline)
    }

    pub fn loader(&self) -> &dyn ResourceLoader {
        self.loader.as_ref()
    }

    // Libraries and functions

    /// Register a library's functions and run its load hook.
    ///
    /// Loading the same library twice is a no-op.
    pub fn load_library(&mut self, library: &Library) -> Result<()> {
        if self.is_loaded(&library.name) {
            debug!(library = %library.name, "library already loaded");
            return Ok(());
        }
        for function in library.functions() {
            function.validate_descriptor()?;
        }
        for function in library.functions() {
            self.registry
                .entry(function.name.clone())
                .or_default()
                .push(Rc::new(function.clone()));
        }
        self.loaded.push(library.name.clone());
        if let Some(hook) = library.load_hook() {
            hook(self)?;
        }
        debug!(
            library = %library.name,
            functions = library.functions().len(),
            "library loaded"
        );
        Ok(())
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.iter().any(|loaded| loaded == name)
    }

    /// Make a library available to `.include` without loading it
    pub fn add_loadable(&mut self, library: Library) {
        self.loadable.insert(library.name.clone(), library);
    }

    /// Load a library previously made available with [`Context::add_loadable`]
    pub fn include(&mut self, name: &str) -> Result<()> {
        let library = self
            .loadable
            .get(name)
            .cloned()
            .ok_or_else(|| QuillError::runtime(format!("no library named '{name}'")))?;
        self.load_library(&library)
    }

    /// Overloads registered under a name, in registration order
    pub fn functions(&self, name: &str) -> Vec<Rc<Function>> {
        self.registry.get(name).cloned().unwrap_or_default()
    }

    /// Register a user-defined function, replacing any function of the
    /// same name
    pub fn define_function(&mut self, function: Function) -> Result<()> {
        function.validate_descriptor()?;
        debug!(function = %function.name, "user function defined");
        self.registry
            .insert(function.name.clone(), vec![Rc::new(function)]);
        Ok(())
    }

    // Variables

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Drop the innermost scope; the global scope is never dropped
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Look a variable up from the innermost scope outwards
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Define a variable in the innermost scope
    pub fn define_variable(&mut self, name: &str, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), value);
        }
    }

    /// Update the nearest definition of a variable, or define it globally
    pub fn set_variable(&mut self, name: &str, value: Value) {
        match self
            .scopes
            .iter_mut()
            .rev()
            .find(|scope| scope.contains_key(name))
        {
            Some(scope) => {
                scope.insert(name.to_string(), value);
            }
            None => {
                self.scopes[0].insert(name.to_string(), value);
            }
        }
    }

    // Links

    pub fn link_definitions(&self) -> &BTreeMap<String, LinkTarget> {
        &self.link_definitions
    }

    /// Remember a link definition; labels match ignoring case
    pub fn register_link_definition(&mut self, label: &str, target: LinkTarget) {
        self.link_definitions.insert(label.to_lowercase(), target);
    }

    // Bibliographies

    /// Register a parsed bibliography read from `path` and return its index.
    ///
    /// A path registered before keeps its index and its first content.
    pub fn add_bibliography(&mut self, path: &str, bibliography: Bibliography) -> usize {
        if let Some(index) = self.bibliography_index(path) {
            return index;
        }
        self.bibliographies.push((path.to_string(), bibliography));
        self.bibliographies.len() - 1
    }

    /// Read, parse and register the bibliography at `path`
    pub fn load_bibliography(&mut self, path: &str) -> Result<usize> {
        if let Some(index) = self.bibliography_index(path) {
            debug!(path, "bibliography already loaded");
            return Ok(index);
        }
        let source = self.loader.load_text(path)?;
        let bibliography = Bibliography::parse(&source)?;
        Ok(self.add_bibliography(path, bibliography))
    }

    fn bibliography_index(&self, path: &str) -> Option<usize> {
        self.bibliographies.iter().position(|(loaded, _)| loaded == path)
    }

    pub fn bibliography(&self, index: usize) -> Option<&Bibliography> {
        self.bibliographies.get(index).map(|(_, bibliography)| bibliography)
    }

    /// Every loaded bibliography, in load order
    pub fn bibliographies(&self) -> impl Iterator<Item = &Bibliography> {
        self.bibliographies.iter().map(|(_, bibliography)| bibliography)
    }

    /// Whether any loaded bibliography has an entry for `key`
    pub fn knows_citation(&self, key: &str) -> bool {
        self.bibliographies().any(|bibliography| bibliography.get(key).is_some())
    }

    // Diagnostics

    /// Record a diagnostic
    pub fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error | Severity::Warning => warn!("{diagnostic}"),
            Severity::Info => debug!("{diagnostic}"),
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Remove and return the diagnostics recorded so far
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    // Localization

    /// Locale in force: the document's, the configured default, or English
    pub fn locale(&self) -> &str {
        self.document
            .locale
            .as_deref()
            .or(self.options.default_locale.as_deref())
            .unwrap_or(DEFAULT_LOCALE)
    }

    /// Look a key up in the standard table for the current locale,
    /// falling back to English
    pub fn localize(&self, key: &str) -> Option<&str> {
        self.localization
            .get(STD_TABLE, self.locale(), key)
            .or_else(|| self.localization.get(STD_TABLE, DEFAULT_LOCALE, key))
    }

    // Evaluation support

    /// Value of an injected parameter
    pub fn inject(&self, injection: Injection, source: &str) -> Value {
        match injection {
            Injection::DocumentType => Value::Enum(self.document.doc_type.name().to_string()),
            Injection::DocumentLocale => match &self.document.locale {
                Some(locale) => Value::String(locale.clone()),
                None => Value::None,
            },
            Injection::CallSite => Value::String(source.to_string()),
        }
    }

    /// Track entering a call; fails past the configured depth
    pub(crate) fn enter_call(&mut self, name: &str) -> Result<()> {
        if self.depth >= self.options.max_call_depth {
            return Err(QuillError::runtime(format!(
                "call depth limit of {} exceeded in .{name}",
                self.options.max_call_depth
            )));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn exit_call(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Parse block-level markup, expanding the calls it contains
    pub fn parse_blocks(&mut self, source: &str) -> Result<Vec<Node>> {
        parser::parse_blocks(self, source)
    }

    /// Parse inline markup, expanding the calls it contains
    pub fn parse_inlines(&mut self, text: &str) -> Result<Vec<Node>> {
        parser::parse_inlines(self, text)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("document", &self.document)
            .field("pipeline", &self.pipeline)
            .field("loaded", &self.loaded)
            .field("scopes", &self.scopes.len())
            .field("diagnostics", &self.diagnostics.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ParamType;

    fn library() -> Library {
        Library::new("test")
            .with(Function::new("answer", |_| Ok(Value::Number(42.0))))
            .on_load(|ctx| {
                ctx.define_variable("loaded", Value::Boolean(true));
                Ok(())
            })
    }

    #[test]
    fn test_unattached_pipeline() {
        let ctx = Context::default();
        assert!(matches!(
            ctx.attached_pipeline(),
            Err(QuillError::UnattachedPipeline)
        ));
    }

    #[test]
    fn test_bibliographies_accumulate() {
        let loader = MemoryLoader::new()
            .with("a.bib", "@book{knuth, title = {TAOCP}}")
            .with("b.bib", "@book{wirth, title = {AD}}");
        let mut ctx = Context::new(loader);
        assert_eq!(ctx.load_bibliography("a.bib").unwrap(), 0);
        assert_eq!(ctx.load_bibliography("b.bib").unwrap(), 1);
        assert_eq!(ctx.load_bibliography("a.bib").unwrap(), 0);
        assert!(ctx.knows_citation("knuth"));
        assert!(ctx.knows_citation("wirth"));
        assert!(!ctx.knows_citation("dijkstra"));
        assert_eq!(ctx.bibliography(1).map(|b| b.len()), Some(1));
    }

    #[test]
    fn test_library_loads_once() {
        let mut ctx = Context::default();
        ctx.load_library(&library()).unwrap();
        ctx.load_library(&library()).unwrap();
        assert_eq!(ctx.functions("answer").len(), 1);
        assert_eq!(ctx.variable("loaded"), Some(&Value::Boolean(true)));
    }

    #[test]
    fn test_invalid_descriptor_rejected_at_load() {
        let mut ctx = Context::default();
        let bad = Library::new("bad").with(
            Function::new("f", |_| Ok(Value::Void))
                .param("a", ParamType::Number)
                .param("a", ParamType::Number),
        );
        assert!(matches!(
            ctx.load_library(&bad),
            Err(QuillError::InvalidDescriptor { .. })
        ));
        assert!(!ctx.is_loaded("bad"));
    }

    #[test]
    fn test_include_loadable_library() {
        let mut ctx = Context::default();
        ctx.add_loadable(library());
        assert!(ctx.functions("answer").is_empty());
        ctx.include("test").unwrap();
        assert_eq!(ctx.functions("answer").len(), 1);
        assert!(ctx.include("missing").is_err());
    }

    #[test]
    fn test_scopes() {
        let mut ctx = Context::default();
        ctx.define_variable("x", Value::Number(1.0));
        ctx.push_scope();
        ctx.define_variable("x", Value::Number(2.0));
        ctx.set_variable("y", Value::Number(3.0));
        assert_eq!(ctx.variable("x"), Some(&Value::Number(2.0)));
        ctx.pop_scope();
        assert_eq!(ctx.variable("x"), Some(&Value::Number(1.0)));
        assert_eq!(ctx.variable("y"), Some(&Value::Number(3.0)));
        ctx.pop_scope();
        assert!(ctx.variable("x").is_some());
    }

    #[test]
    fn test_localize_falls_back_to_english() {
        let mut ctx = Context::default();
        ctx.localization
            .register(STD_TABLE, "en", [("figure", "Figure"), ("table", "Table")]);
        ctx.localization.register(STD_TABLE, "it", [("figure", "Figura")]);
        ctx.document.locale = Some("it".to_string());
        assert_eq!(ctx.localize("figure"), Some("Figura"));
        assert_eq!(ctx.localize("table"), Some("Table"));
    }

    #[test]
    fn test_call_depth_limit() {
        let mut ctx = Context::default();
        for _ in 0..ctx.options().max_call_depth {
            ctx.enter_call("f").unwrap();
        }
        assert!(ctx.enter_call("f").is_err());
        ctx.exit_call();
        assert!(ctx.enter_call("f").is_ok());
    }

    #[test]
    fn test_injection() {
        let mut ctx = Context::default();
        assert_eq!(ctx.inject(Injection::DocumentLocale, ""), Value::None);
        ctx.document.locale = Some("de".to_string());
        assert_eq!(
            ctx.inject(Injection::DocumentLocale, ""),
            Value::String("de".to_string())
        );
        assert_eq!(
            ctx.inject(Injection::DocumentType, ""),
            Value::Enum("plain".to_string())
        );
    }
}
