//! Compilation pipeline
//!
//! A [`Pipeline`] ties options, a render target and the libraries to load
//! into one sequential run: parse and expand calls, assemble the tree,
//! build the symbol table, resolve references, render, post-render.
//!
//! The [`Context`] is owned by the caller. Reusing it across
//! [`Pipeline::execute`] calls keeps variables, user functions, link
//! definitions and the bibliography, which is how the REPL works.

use quill_ast::Tree;
use tracing::{debug, info};

use crate::config::PipelineOptions;
use crate::context::{Context, PipelineInfo};
use crate::diagnostics::Diagnostic;
use crate::error::Result;
use crate::function::Library;
use crate::render::{CompiledDocument, OutputResource, Target};
use crate::resolution;

/// Everything one compilation produced
#[derive(Debug)]
pub struct CompilationOutput {
    /// Rendered document body
    pub rendered: String,
    /// Files to write, including the wrapped document
    pub resources: Vec<OutputResource>,
    /// Diagnostics reported during this compilation
    pub diagnostics: Vec<Diagnostic>,
    pub document: CompiledDocument,
}

impl CompilationOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Sequential compilation for one target
pub struct Pipeline {
    options: PipelineOptions,
    target: Box<dyn Target>,
    libraries: Vec<Library>,
}

impl Pipeline {
    pub fn new(options: PipelineOptions, target: impl Target + 'static) -> Self {
        Self {
            options,
            target: Box::new(target),
            libraries: Vec::new(),
        }
    }

    /// Load `library` into every context this pipeline attaches to
    pub fn with_library(mut self, library: Library) -> Self {
        self.libraries.push(library);
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn target(&self) -> &dyn Target {
        self.target.as_ref()
    }

    /// Bind a context to this pipeline and load the libraries into it.
    ///
    /// Libraries already loaded are skipped, so attaching twice is harmless.
    pub fn attach(&self, ctx: &mut Context) -> Result<()> {
        let media = self
            .target
            .media_preference()
            .merged(&self.options.media);
        ctx.attach(
            PipelineInfo {
                target: self.target.name().to_string(),
                media,
            },
            self.options.clone(),
        );
        for library in &self.libraries {
            ctx.load_library(library)?;
        }
        Ok(())
    }

    /// Compile `source` with an attached context
    pub fn execute(&self, ctx: &mut Context, source: &str) -> Result<CompilationOutput> {
        ctx.attached_pipeline()?;
        info!(target_name = self.target.name(), bytes = source.len(), "compiling");
        ctx.media.clear();

        let nodes = ctx.parse_blocks(source)?;
        let tree = Tree::assemble(nodes);
        debug!(nodes = tree.len(), "tree assembled");

        let symbols = resolution::collect(&tree, ctx, self.target.identifiers())?;
        for (label, target) in symbols.links() {
            ctx.register_link_definition(label, target.clone());
        }

        let (resolutions, warnings) = resolution::resolve(&tree, &symbols, ctx);
        for warning in warnings {
            ctx.report(warning);
        }

        let document = CompiledDocument {
            tree,
            symbols,
            resolutions,
        };
        let rendered = self.target.render(&document, ctx)?;
        let resources = self.target.post_render(&rendered, &document, ctx)?;
        let diagnostics = ctx.take_diagnostics();
        info!(
            resources = resources.len(),
            diagnostics = diagnostics.len(),
            "compilation finished"
        );

        Ok(CompilationOutput {
            rendered,
            resources,
            diagnostics,
            document,
        })
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("options", &self.options)
            .field("target", &self.target.name())
            .field("libraries", &self.libraries.len())
            .finish()
    }
}
