//! Render targets
//!
//! A [`Target`] turns a [`CompiledDocument`] into its textual form by
//! matching every [`quill_ast::NodeKind`] exhaustively, then produces the
//! [`OutputResource`]s to write out in a post-render step. Identifier
//! generation is target-specific too: see [`IdentifierGenerator`].

use quill_ast::{ListItemVariant, NodeId, TableOfContents, TrackableKind, Tree};
use tracing::debug;

use crate::config::MediaStorageOptions;
use crate::context::Context;
use crate::diagnostics::{codes, Diagnostic};
use crate::error::Result;
use crate::resolution::{Resolutions, SymbolTable};

/// Shown in place of a reference that could not be resolved
pub const UNRESOLVED_PLACEHOLDER: &str = "[???]";

/// What an identifier is requested for
#[derive(Debug, Clone, Copy)]
pub struct IdentifierRequest<'a> {
    pub kind: TrackableKind,
    pub label: Option<&'a str>,
    pub number: Option<&'a str>,
    /// Heading text or caption, possibly empty
    pub title: &'a str,
    /// 1-based position among elements of the same kind
    pub ordinal: usize,
}

/// Produces target-specific identifiers for tracked elements.
///
/// Returning `None` means the target does not use identifiers. Uniqueness
/// is enforced by the caller.
pub trait IdentifierGenerator {
    fn identifier(&self, request: &IdentifierRequest<'_>) -> Option<String>;

    /// Anchor of a listed bibliography entry
    fn bibliography_anchor(&self, _key: &str) -> Option<String> {
        None
    }
}

/// For targets without identifiers
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIdentifiers;

impl IdentifierGenerator for NoIdentifiers {
    fn identifier(&self, _request: &IdentifierRequest<'_>) -> Option<String> {
        None
    }
}

/// Content of an output resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceContent {
    Text(String),
    Binary(Vec<u8>),
}

/// A named artifact to be written by the caller, unchanged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputResource {
    /// Relative path, `/`-separated
    pub name: String,
    pub content: ResourceContent,
}

impl OutputResource {
    pub fn text(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: ResourceContent::Text(content.into()),
        }
    }

    pub fn binary(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content: ResourceContent::Binary(content),
        }
    }

    /// Content as text, if textual
    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            ResourceContent::Text(text) => Some(text),
            ResourceContent::Binary(_) => None,
        }
    }
}

/// A tree together with everything resolution learned about it
#[derive(Debug, Clone)]
pub struct CompiledDocument {
    pub tree: Tree,
    pub symbols: SymbolTable,
    pub resolutions: Resolutions,
}

/// An output format
pub trait Target {
    /// Short name, e.g. `html`
    fn name(&self) -> &str;

    fn identifiers(&self) -> &dyn IdentifierGenerator;

    /// Which media this target stores by default
    fn media_preference(&self) -> MediaStorageOptions;

    /// Render the document body
    fn render(&self, document: &CompiledDocument, ctx: &Context) -> Result<String>;

    /// Build the output resources from the rendered body
    fn post_render(
        &self,
        rendered: &str,
        document: &CompiledDocument,
        ctx: &mut Context,
    ) -> Result<Vec<OutputResource>>;
}

/// One resource per stored media file, read through the context's loader.
///
/// Files that cannot be read are skipped with a warning.
pub fn export_media(ctx: &mut Context) -> Vec<OutputResource> {
    let mut resources = Vec::new();
    let mut warnings = Vec::new();
    for media in ctx.media.unique() {
        match ctx.loader().load_bytes(&media.path) {
            Ok(bytes) => {
                debug!(path = %media.path, name = %media.name, "exporting media");
                resources.push(OutputResource::binary(media.output_path(), bytes));
            }
            Err(err) => warnings.push(
                Diagnostic::warning(format!("media '{}' could not be exported: {err}", media.path))
                    .with_code(codes::MEDIA_UNAVAILABLE),
            ),
        }
    }
    for warning in warnings {
        ctx.report(warning);
    }
    resources
}

/// An entry of a generated table of contents
#[derive(Debug, Clone, PartialEq)]
pub struct TocItem {
    pub target: NodeId,
    pub text: String,
    pub number: Option<String>,
    pub anchor: Option<String>,
    /// Always carries a `LocationTarget`; `Focus` when the table has one
    pub variants: Vec<ListItemVariant>,
    pub children: Vec<TocItem>,
}

/// Nested entries for a table of contents.
///
/// `focus` matches a heading by label or by title.
pub fn table_of_contents(symbols: &SymbolTable, toc: &TableOfContents) -> Vec<TocItem> {
    let mut roots = Vec::new();
    let mut stack: Vec<(u8, TocItem)> = Vec::new();

    for heading in symbols.headings().filter(|h| h.depth <= toc.max_depth) {
        let mut variants = vec![ListItemVariant::LocationTarget { target: heading.id }];
        if let Some(focus) = &toc.focus {
            let focused = heading.label.as_deref() == Some(focus.as_str()) || heading.title == *focus;
            variants.push(ListItemVariant::Focus { focused });
        }
        let item = TocItem {
            target: heading.id,
            text: heading.title.clone(),
            number: heading.number.clone(),
            anchor: heading.identifier.clone(),
            variants,
            children: Vec::new(),
        };
        while stack.last().is_some_and(|(depth, _)| *depth >= heading.depth) {
            if let Some((_, done)) = stack.pop() {
                attach(&mut stack, &mut roots, done);
            }
        }
        stack.push((heading.depth, item));
    }
    while let Some((_, done)) = stack.pop() {
        attach(&mut stack, &mut roots, done);
    }
    roots
}

fn attach(stack: &mut [(u8, TocItem)], roots: &mut Vec<TocItem>, item: TocItem) {
    match stack.last_mut() {
        Some((_, parent)) => parent.children.push(item),
        None => roots.push(item),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentType;
    use crate::loader::MemoryLoader;
    use crate::resolution::collect;
    use quill_ast::{Heading, Node, NodeKind};

    fn heading(depth: u8, text: &str) -> Node {
        Node::with_children(NodeKind::Heading(Heading::new(depth)), vec![Node::text(text)])
    }

    #[test]
    fn test_table_of_contents_nesting() {
        let mut ctx = Context::default();
        ctx.document.doc_type = DocumentType::Docs;
        let tree = Tree::assemble(vec![
            heading(1, "A"),
            heading(2, "A.A"),
            heading(3, "Hidden"),
            heading(1, "B"),
        ]);
        let symbols = collect(&tree, &mut ctx, &NoIdentifiers).unwrap();
        let toc = TableOfContents {
            title: None,
            max_depth: 2,
            focus: Some("B".to_string()),
        };
        let items = table_of_contents(&symbols, &toc);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].text, "A");
        assert_eq!(items[0].children.len(), 1);
        assert!(items[0].children[0].children.is_empty());
        assert_eq!(items[1].number.as_deref(), Some("2"));
        assert!(items[1]
            .variants
            .contains(&ListItemVariant::Focus { focused: true }));
        assert!(items[0]
            .variants
            .contains(&ListItemVariant::Focus { focused: false }));
    }

    #[test]
    fn test_export_media_reports_missing_files() {
        let loader = MemoryLoader::new().with("cat.png", vec![1, 2, 3]);
        let mut ctx = Context::new(loader);
        let options = MediaStorageOptions {
            local: true,
            remote: false,
        };
        ctx.media.register("cat.png", options);
        ctx.media.register("dog.png", options);

        let resources = export_media(&mut ctx);
        assert_eq!(resources.len(), 1);
        assert!(resources[0].name.starts_with("media/cat@"));
        assert_eq!(resources[0].content, ResourceContent::Binary(vec![1, 2, 3]));
        assert_eq!(ctx.diagnostics()[0].code, Some(codes::MEDIA_UNAVAILABLE));
    }
}
