//! Node-to-HTML rendering
//!
//! The renderer walks the assembled tree from the root and writes markup
//! into a single buffer. Every node kind has an arm in [`HtmlRenderer::node`];
//! references are rendered from the resolutions computed before rendering.

use std::borrow::Cow;
use std::fmt::{self, Write};

use quick_xml::escape::escape;
use quill_ast::{
    Alignment, ListItemVariant, NodeId, NodeKind, StackOrientation, TableOfContents, Tree,
};
use quill_core::document::DocumentType;
use quill_core::render::{table_of_contents, TocItem, UNRESOLVED_PLACEHOLDER};
use quill_core::resolution::Resolution;
use quill_core::{CompiledDocument, Context, QuillError, Result};

/// Render the body of a compiled document
pub(crate) fn render(document: &CompiledDocument, ctx: &Context) -> Result<String> {
    let mut renderer = HtmlRenderer {
        document,
        ctx,
        out: String::new(),
    };
    renderer
        .root()
        .map_err(|_| QuillError::runtime("failed to write HTML output"))?;
    Ok(renderer.out)
}

struct HtmlRenderer<'a> {
    document: &'a CompiledDocument,
    ctx: &'a Context,
    out: String,
}

impl HtmlRenderer<'_> {
    fn root(&mut self) -> fmt::Result {
        let document = self.document;
        let tree = &document.tree;
        let children = tree.children(tree.root()).to_vec();
        if self.ctx.document.doc_type != DocumentType::Slides {
            return self.nodes(&children);
        }

        // Slides: a new section at every top-level heading of depth 1 or 2
        // and at every page break
        let mut open = false;
        for id in slide_blocks(tree, &children) {
            let breaks = match tree.kind(id) {
                NodeKind::Heading(heading) => heading.depth <= 2,
                NodeKind::PageBreak => true,
                _ => false,
            };
            if breaks && open {
                self.out.push_str("</section>\n");
                open = false;
            }
            if !open {
                self.out.push_str("<section>\n");
                open = true;
            }
            if !matches!(tree.kind(id), NodeKind::PageBreak) {
                self.node(id)?;
            }
        }
        if open {
            self.out.push_str("</section>\n");
        }
        Ok(())
    }

    fn nodes(&mut self, ids: &[NodeId]) -> fmt::Result {
        for &id in ids {
            self.node(id)?;
        }
        Ok(())
    }

    fn children(&mut self, id: NodeId) -> fmt::Result {
        let children = self.document.tree.children(id).to_vec();
        self.nodes(&children)
    }

    /// Children of a paragraph rendered without the paragraph itself
    fn unwrapped(&mut self, id: NodeId) -> fmt::Result {
        if matches!(self.document.tree.kind(id), NodeKind::Paragraph) {
            self.children(id)
        } else {
            self.node(id)
        }
    }

    /// ` id="..."` for tracked elements that have one
    fn id_attribute(&self, id: NodeId) -> String {
        match self.document.symbols.identifier(id) {
            Some(identifier) => format!(" id=\"{}\"", escape(identifier)),
            None => String::new(),
        }
    }

    fn number(&self, id: NodeId) -> Option<&str> {
        self.document
            .symbols
            .element(id)
            .and_then(|element| element.number.as_deref())
    }

    fn node(&mut self, id: NodeId) -> fmt::Result {
        let document = self.document;
        let ctx = self.ctx;
        let tree = &document.tree;
        match tree.kind(id) {
            NodeKind::Root => self.children(id)?,

            NodeKind::Paragraph => {
                self.out.push_str("<p>");
                self.children(id)?;
                self.out.push_str("</p>\n");
            }
            NodeKind::Heading(heading) => {
                let mut attributes = match document.symbols.identifier(id) {
                    Some(identifier) => format!(" id=\"{}\"", escape(identifier)),
                    None => String::new(),
                };
                if let Some(number) = self.number(id) {
                    write!(attributes, " data-location=\"{}\"", escape(number))?;
                }
                if heading.decorative {
                    attributes.push_str(" class=\"decorative\"");
                }
                write!(self.out, "<h{}{attributes}>", heading.depth)?;
                self.children(id)?;
                writeln!(self.out, "</h{}>", heading.depth)?;
            }
            NodeKind::BlockQuote => {
                self.out.push_str("<blockquote>\n");
                self.children(id)?;
                self.out.push_str("</blockquote>\n");
            }
            NodeKind::List(list) => {
                if list.ordered {
                    if list.start == 1 {
                        self.out.push_str("<ol>\n");
                    } else {
                        writeln!(self.out, "<ol start=\"{}\">", list.start)?;
                    }
                } else {
                    self.out.push_str("<ul>\n");
                }
                for item in tree.children(id).to_vec() {
                    self.list_item(item, list.tight)?;
                }
                self.out
                    .push_str(if list.ordered { "</ol>\n" } else { "</ul>\n" });
            }
            NodeKind::ListItem(_) => self.list_item(id, false)?,
            NodeKind::CodeBlock(code) => {
                let class = match &code.language {
                    Some(language) => format!(" class=\"language-{}\"", escape(language.as_str())),
                    None => String::new(),
                };
                let block = format!("<pre><code{class}>{}</code></pre>", escape(code.content.as_str()));
                self.captioned(id, "code-listing", &block, code.caption.as_deref())?;
            }
            NodeKind::MathBlock(math) => {
                let mut attributes = self.id_attribute(id);
                if let Some(number) = self.number(id) {
                    write!(attributes, " data-location=\"{}\"", escape(number))?;
                }
                writeln!(
                    self.out,
                    "<div class=\"math\"{attributes}>\\[{}\\]</div>",
                    escape(math.expression.as_str())
                )?;
            }
            NodeKind::Table(table) => {
                let mut attributes = self.id_attribute(id);
                if let Some(number) = self.number(id) {
                    write!(attributes, " data-location=\"{}\"", escape(number))?;
                }
                writeln!(self.out, "<table{attributes}>")?;
                if let Some(caption) = &table.caption {
                    writeln!(self.out, "<caption>{}</caption>", escape(caption.as_str()))?;
                }
                for row in tree.children(id).to_vec() {
                    let header = matches!(tree.kind(row), NodeKind::TableRow { header: true });
                    if header {
                        self.out.push_str("<thead>\n");
                    }
                    self.out.push_str("<tr>");
                    for (column, cell) in tree.children(row).to_vec().into_iter().enumerate() {
                        let tag = if header { "th" } else { "td" };
                        match table.alignments.get(column).copied().flatten() {
                            Some(alignment) => write!(
                                self.out,
                                "<{tag} style=\"text-align: {}\">",
                                alignment.as_str()
                            )?,
                            None => write!(self.out, "<{tag}>")?,
                        }
                        self.children(cell)?;
                        write!(self.out, "</{tag}>")?;
                    }
                    self.out.push_str("</tr>\n");
                    if header {
                        self.out.push_str("</thead>\n");
                    }
                }
                self.out.push_str("</table>\n");
            }
            NodeKind::TableRow { .. } => {
                self.out.push_str("<tr>");
                self.children(id)?;
                self.out.push_str("</tr>\n");
            }
            NodeKind::TableCell => {
                self.out.push_str("<td>");
                self.children(id)?;
                self.out.push_str("</td>");
            }
            NodeKind::HorizontalRule => self.out.push_str("<hr>\n"),
            NodeKind::PageBreak => self.out.push_str("<div class=\"page-break\"></div>\n"),
            NodeKind::LinkDefinition(_) => {}
            NodeKind::Figure(figure) => {
                let mut body = String::new();
                std::mem::swap(&mut body, &mut self.out);
                let result = self.children(id);
                std::mem::swap(&mut body, &mut self.out);
                result?;
                self.captioned(id, "figure", &body, figure.caption.as_deref())?;
            }
            NodeKind::Container(container) => {
                let mut classes = vec!["container".to_string()];
                if container.full_width {
                    classes.push("fullwidth".to_string());
                }
                if let Some(class_name) = &container.class_name {
                    classes.push(escape(class_name.as_str()).into_owned());
                }
                let style = match container.alignment {
                    Some(alignment) => format!(" style=\"text-align: {}\"", alignment.as_str()),
                    None => String::new(),
                };
                writeln!(self.out, "<div class=\"{}\"{style}>", classes.join(" "))?;
                self.children(id)?;
                self.out.push_str("</div>\n");
            }
            NodeKind::Stacked(stacked) => {
                let orientation = match stacked.orientation {
                    StackOrientation::Row => "row",
                    StackOrientation::Column => "column",
                };
                let mut styles = Vec::new();
                if let Some(alignment) = stacked.alignment {
                    styles.push(format!("justify-content: {}", flex_alignment(alignment)));
                }
                if let Some(gap) = &stacked.gap {
                    styles.push(format!("gap: {}", escape(gap.as_str())));
                }
                let style = if styles.is_empty() {
                    String::new()
                } else {
                    format!(" style=\"{}\"", styles.join("; "))
                };
                writeln!(self.out, "<div class=\"stack stack-{orientation}\"{style}>")?;
                self.children(id)?;
                self.out.push_str("</div>\n");
            }
            NodeKind::Box(node) => {
                writeln!(self.out, "<div class=\"box {}\">", node.kind.as_str())?;
                if let Some(title) = &node.title {
                    writeln!(self.out, "<header><h4>{}</h4></header>", escape(title.as_str()))?;
                }
                self.out.push_str("<div class=\"box-content\">\n");
                self.children(id)?;
                self.out.push_str("</div>\n</div>\n");
            }
            NodeKind::TableOfContents(toc) => self.table_of_contents(toc)?,
            NodeKind::BibliographyView(view) => {
                let title = view
                    .title
                    .as_deref()
                    .or_else(|| ctx.localize("bibliography"))
                    .unwrap_or("Bibliography");
                self.out.push_str("<div class=\"bibliography\">\n");
                writeln!(self.out, "<h1 class=\"bibliography-title\">{}</h1>", escape(title))?;
                let bibliography = ctx.bibliography(view.source);
                for item in document.symbols.bibliography_items(id) {
                    let Some(entry) = bibliography.and_then(|b| b.get(&item.key)) else {
                        continue;
                    };
                    let anchor = match &item.anchor {
                        Some(anchor) => format!(" id=\"{}\"", escape(anchor.as_str())),
                        None => String::new(),
                    };
                    writeln!(
                        self.out,
                        "<div class=\"bibliography-entry\"{anchor}><span class=\"bibliography-entry-label\">[{}]</span> <span class=\"bibliography-entry-content\">{}</span></div>",
                        item.number,
                        escape(entry.describe())
                    )?;
                }
                self.out.push_str("</div>\n");
            }
            NodeKind::SlideFragment(fragment) => {
                writeln!(self.out, "<div class=\"{}\">", fragment_class(&fragment.behavior))?;
                self.children(id)?;
                self.out.push_str("</div>\n");
            }
            NodeKind::SpeakerNote => {
                self.out.push_str("<aside class=\"notes\">\n");
                self.children(id)?;
                self.out.push_str("</aside>\n");
            }

            NodeKind::Text(text) => self.out.push_str(&escape(text.as_str())),
            NodeKind::Emphasis => self.wrapped(id, "em")?,
            NodeKind::Strong => self.wrapped(id, "strong")?,
            NodeKind::Strikethrough => self.wrapped(id, "del")?,
            NodeKind::CodeSpan(code) => write!(self.out, "<code>{}</code>", escape(code.as_str()))?,
            NodeKind::MathSpan(math) => write!(
                self.out,
                "<span class=\"math\">\\({}\\)</span>",
                escape(math.as_str())
            )?,
            NodeKind::Link(link) => {
                self.anchor_open(&link.url, link.title.as_deref())?;
                self.children(id)?;
                self.out.push_str("</a>");
            }
            NodeKind::ReferenceLink(link) => match document.resolutions.get(id) {
                Some(Resolution::Link { url, title }) => {
                    self.anchor_open(url, title.as_deref())?;
                    self.children(id)?;
                    self.out.push_str("</a>");
                }
                _ => self.out.push_str(&escape(link.fallback.as_str())),
            },
            NodeKind::Image(image) => {
                let source = ctx
                    .media
                    .resolve(&image.url)
                    .unwrap_or_else(|| image.url.clone());
                write!(
                    self.out,
                    "<img src=\"{}\" alt=\"{}\"",
                    escape(source),
                    escape(image.alt.as_str())
                )?;
                if let Some(title) = &image.title {
                    write!(self.out, " title=\"{}\"", escape(title.as_str()))?;
                }
                self.out.push('>');
            }
            NodeKind::LineBreak => self.out.push_str("<br>\n"),
            NodeKind::CrossReference(_) => match document.resolutions.get(id) {
                Some(Resolution::CrossReference {
                    anchor: Some(anchor),
                    text,
                    ..
                }) => write!(
                    self.out,
                    "<a class=\"cross-reference\" href=\"#{}\">{}</a>",
                    escape(anchor.as_str()),
                    escape(text.as_str())
                )?,
                Some(Resolution::CrossReference { text, .. }) => write!(
                    self.out,
                    "<span class=\"cross-reference\">{}</span>",
                    escape(text.as_str())
                )?,
                _ => self.unresolved("cross-reference"),
            },
            NodeKind::Citation(citation) => match document.resolutions.get(id) {
                Some(Resolution::Citation { numbers }) => {
                    let numbers: Vec<String> = numbers.iter().map(usize::to_string).collect();
                    let anchor = citation
                        .keys
                        .first()
                        .and_then(|key| document.symbols.citation_anchor(key));
                    match anchor {
                        Some(anchor) => write!(
                            self.out,
                            "<a class=\"citation\" href=\"#{}\">[{}]</a>",
                            escape(anchor),
                            numbers.join(", ")
                        )?,
                        None => write!(
                            self.out,
                            "<span class=\"citation\">[{}]</span>",
                            numbers.join(", ")
                        )?,
                    }
                }
                _ => self.unresolved("citation"),
            },

            NodeKind::FunctionCallOutput { .. } => self.children(id)?,
            NodeKind::CallError { message, block } => {
                if *block {
                    writeln!(
                        self.out,
                        "<div class=\"box error\">\n<header><h4>Error</h4></header>\n<div class=\"box-content\"><p>{}</p></div>\n</div>",
                        escape(message.as_str())
                    )?;
                } else {
                    write!(
                        self.out,
                        "<span class=\"call-error\">{}</span>",
                        escape(message.as_str())
                    )?;
                }
            }
        }
        Ok(())
    }

    fn wrapped(&mut self, id: NodeId, tag: &str) -> fmt::Result {
        write!(self.out, "<{tag}>")?;
        self.children(id)?;
        write!(self.out, "</{tag}>")
    }

    fn anchor_open(&mut self, url: &str, title: Option<&str>) -> fmt::Result {
        write!(self.out, "<a href=\"{}\"", escape(url))?;
        if let Some(title) = title {
            write!(self.out, " title=\"{}\"", escape(title))?;
        }
        self.out.push('>');
        Ok(())
    }

    fn unresolved(&mut self, class: &str) {
        self.out.push_str(&format!(
            "<span class=\"{class} unresolved\">{UNRESOLVED_PLACEHOLDER}</span>"
        ));
    }

    /// `body` inside a `<figure>` when the element is numbered, identified
    /// or captioned; bare otherwise
    fn captioned(&mut self, id: NodeId, class: &str, body: &str, caption: Option<&str>) -> fmt::Result {
        let tracked = self.document.symbols.element(id).is_some();
        if !tracked && caption.is_none() {
            self.out.push_str(body);
            self.out.push('\n');
            return Ok(());
        }
        let id_attribute = self.id_attribute(id);
        writeln!(self.out, "<figure class=\"{class}\"{id_attribute}>")?;
        self.out.push_str(body);
        self.out.push('\n');
        if caption.is_some() || self.number(id).is_some() {
            let label = match self.number(id) {
                Some(number) => format!(" data-element-label=\"{}\"", escape(number)),
                None => String::new(),
            };
            writeln!(
                self.out,
                "<figcaption class=\"caption-bottom\"{label}>{}</figcaption>",
                escape(caption.unwrap_or_default())
            )?;
        }
        self.out.push_str("</figure>\n");
        Ok(())
    }

    fn list_item(&mut self, id: NodeId, tight: bool) -> fmt::Result {
        let document = self.document;
        let variants: &[ListItemVariant] = match document.tree.kind(id) {
            NodeKind::ListItem(item) => &item.variants,
            _ => &[],
        };
        let mut classes = Vec::new();
        let mut prefix = String::new();
        let mut target = None;
        for variant in variants {
            match variant {
                ListItemVariant::Task { checked } => {
                    classes.push("task-list-item");
                    let checked = if *checked { " checked" } else { "" };
                    prefix = format!("<input type=\"checkbox\" disabled{checked}> ");
                }
                ListItemVariant::Focus { focused: true } => classes.push("focused"),
                ListItemVariant::Focus { focused: false } => {}
                ListItemVariant::LocationTarget { target: location } => {
                    target = document.symbols.identifier(*location);
                }
            }
        }
        self.out.push_str("<li");
        if !classes.is_empty() {
            write!(self.out, " class=\"{}\"", classes.join(" "))?;
        }
        if let Some(target) = target {
            write!(self.out, " data-target=\"#{}\"", escape(target))?;
        }
        self.out.push('>');
        self.out.push_str(&prefix);
        for &child in document.tree.children(id) {
            if tight {
                self.unwrapped(child)?;
            } else {
                self.node(child)?;
            }
        }
        self.out.push_str("</li>\n");
        Ok(())
    }

    fn table_of_contents(&mut self, toc: &TableOfContents) -> fmt::Result {
        let ctx = self.ctx;
        let document = self.document;
        let title = toc
            .title
            .as_deref()
            .or_else(|| ctx.localize("tableofcontents"))
            .unwrap_or("Table of Contents");
        self.out.push_str("<nav class=\"table-of-contents\">\n");
        writeln!(self.out, "<h1 class=\"toc-title\">{}</h1>", escape(title))?;
        let items = table_of_contents(&document.symbols, toc);
        self.toc_items(&items)?;
        self.out.push_str("</nav>\n");
        Ok(())
    }

    fn toc_items(&mut self, items: &[TocItem]) -> fmt::Result {
        if items.is_empty() {
            return Ok(());
        }
        self.out.push_str("<ol>\n");
        for item in items {
            let focused = item
                .variants
                .iter()
                .any(|variant| matches!(variant, ListItemVariant::Focus { focused: true }));
            self.out
                .push_str(if focused { "<li class=\"focused\">" } else { "<li>" });
            let href: Cow<'_, str> = match &item.anchor {
                Some(anchor) => Cow::Owned(format!("#{}", escape(anchor.as_str()))),
                None => Cow::Borrowed("#"),
            };
            match &item.number {
                Some(number) => write!(
                    self.out,
                    "<a href=\"{href}\" data-location=\"{}\">{}</a>",
                    escape(number.as_str()),
                    escape(item.text.as_str())
                )?,
                None => write!(self.out, "<a href=\"{href}\">{}</a>", escape(item.text.as_str()))?,
            }
            self.out.push('\n');
            self.toc_items(&item.children)?;
            self.out.push_str("</li>\n");
        }
        self.out.push_str("</ol>\n");
        Ok(())
    }
}

/// Top-level blocks with block call outputs flattened, so that headings
/// and page breaks produced by calls still split slides
fn slide_blocks(tree: &Tree, ids: &[NodeId]) -> Vec<NodeId> {
    let mut blocks = Vec::with_capacity(ids.len());
    for &id in ids {
        match tree.kind(id) {
            NodeKind::FunctionCallOutput { block: true, .. } => {
                blocks.extend(slide_blocks(tree, tree.children(id)));
            }
            _ => blocks.push(id),
        }
    }
    blocks
}

fn flex_alignment(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Start => "flex-start",
        Alignment::Center => "center",
        Alignment::End => "flex-end",
    }
}

/// reveal.js fragment classes for a reveal behavior
fn fragment_class(behavior: &str) -> &'static str {
    match behavior {
        "hide" => "fragment fade-out",
        "semihide" => "fragment semi-fade-out",
        "showhide" => "fragment fade-in-then-out",
        _ => "fragment",
    }
}
