//! quill-html - HTML output for quill documents
//!
//! [`HtmlTarget`] renders a compiled document to HTML. With output wrapping
//! enabled (the default) the body is embedded in a complete page whose
//! layout follows the document type: a centered column for plain and docs
//! documents, print geometry for paged ones and a reveal.js deck for
//! slides.
//!
//! # Example
//!
//! ```
//! use quill_core::{Context, Pipeline, PipelineOptions};
//! use quill_html::HtmlTarget;
//!
//! let pipeline = Pipeline::new(PipelineOptions::default(), HtmlTarget)
//!     .with_library(quill_stdlib::library());
//! let mut ctx = Context::default();
//! pipeline.attach(&mut ctx).unwrap();
//!
//! let output = pipeline.execute(&mut ctx, "# Hello\n\n.center {world}\n").unwrap();
//! assert!(output.rendered.starts_with("<h1 id=\"hello\">Hello</h1>"));
//! assert_eq!(output.resources[0].name, "index.html");
//! ```

mod identifiers;
mod page;
mod renderer;

use quill_core::config::MediaStorageOptions;
use quill_core::render::{export_media, IdentifierGenerator};
use quill_core::{CompiledDocument, Context, OutputResource, Result, Target};
use tracing::debug;

pub use identifiers::{slugify, HtmlIdentifiers};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the main output file
pub const INDEX_FILE: &str = "index.html";

/// The HTML render target
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTarget;

impl Target for HtmlTarget {
    fn name(&self) -> &str {
        "html"
    }

    fn identifiers(&self) -> &dyn IdentifierGenerator {
        &HtmlIdentifiers
    }

    /// Local files are copied next to the page; remote ones stay linked
    fn media_preference(&self) -> MediaStorageOptions {
        MediaStorageOptions {
            local: true,
            remote: false,
        }
    }

    fn render(&self, document: &CompiledDocument, ctx: &Context) -> Result<String> {
        renderer::render(document, ctx)
    }

    fn post_render(
        &self,
        rendered: &str,
        _document: &CompiledDocument,
        ctx: &mut Context,
    ) -> Result<Vec<OutputResource>> {
        let index = if ctx.options().wrap_output {
            page::wrap(rendered, ctx)?
        } else {
            rendered.to_string()
        };
        let mut resources = vec![OutputResource::text(INDEX_FILE, index)];
        resources.extend(export_media(ctx));
        debug!(resources = resources.len(), "html resources ready");
        Ok(resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "1.0.0");
    }
}
