//! quill-plaintext - Plain-text output for quill documents
//!
//! Renders the readable text of a document: markup is dropped, numbers and
//! captions are kept, references are replaced by their resolved text and
//! links show their target. Plain text has no anchors, so no identifiers
//! are generated and no media is exported.
//!
//! ```
//! use quill_core::{Context, Pipeline, PipelineOptions};
//! use quill_plaintext::PlainTextTarget;
//!
//! let options = PipelineOptions {
//!     wrap_output: false,
//!     ..PipelineOptions::default()
//! };
//! let pipeline = Pipeline::new(options, PlainTextTarget).with_library(quill_stdlib::library());
//! let mut ctx = Context::default();
//! pipeline.attach(&mut ctx).unwrap();
//!
//! let output = pipeline.execute(&mut ctx, "Hello .uppercase {world}\n").unwrap();
//! assert_eq!(output.rendered, "Hello WORLD\n");
//! ```

mod writer;

use quill_core::config::MediaStorageOptions;
use quill_core::render::{IdentifierGenerator, NoIdentifiers};
use quill_core::{CompiledDocument, Context, OutputResource, Result, Target};
use tracing::debug;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output file stem used when the document has no name
pub const DEFAULT_STEM: &str = "document";

/// The plain-text render target
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextTarget;

impl Target for PlainTextTarget {
    fn name(&self) -> &str {
        "text"
    }

    fn identifiers(&self) -> &dyn IdentifierGenerator {
        &NoIdentifiers
    }

    fn media_preference(&self) -> MediaStorageOptions {
        MediaStorageOptions::default()
    }

    fn render(&self, document: &CompiledDocument, ctx: &Context) -> Result<String> {
        Ok(writer::render(document, ctx))
    }

    fn post_render(
        &self,
        rendered: &str,
        _document: &CompiledDocument,
        ctx: &mut Context,
    ) -> Result<Vec<OutputResource>> {
        let name = ctx.document.name.as_deref();
        let content = match name {
            Some(title) if ctx.options().wrap_output => header(title, &ctx.document.authors) + rendered,
            _ => rendered.to_string(),
        };
        let file = format!("{}.txt", file_stem(name.unwrap_or(DEFAULT_STEM)));
        debug!(file = %file, "text resource ready");
        Ok(vec![OutputResource::text(file, content)])
    }
}

/// Title underlined, then the authors, then a blank line
fn header(title: &str, authors: &[String]) -> String {
    let mut header = format!("{title}\n{}\n", "=".repeat(title.chars().count()));
    if !authors.is_empty() {
        header.push_str(&authors.join(", "));
        header.push('\n');
    }
    header.push('\n');
    header
}

/// A file name derived from a document name
fn file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    if stem.is_empty() {
        DEFAULT_STEM.to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header() {
        assert_eq!(header("Notes", &[]), "Notes\n=====\n\n");
        assert_eq!(
            header("Notes", &["Ada".to_string(), "Grace".to_string()]),
            "Notes\n=====\nAda, Grace\n\n"
        );
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("Annual report"), "Annual report");
        assert_eq!(file_stem("a/b"), "a_b");
        assert_eq!(file_stem("  "), "document");
    }
}
