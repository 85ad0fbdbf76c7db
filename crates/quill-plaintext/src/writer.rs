//! Node-to-text rendering
//!
//! Blocks are rendered to strings and joined with blank lines; nesting is
//! expressed by prefixing every line of the nested text.

use quill_ast::{ListItemVariant, NodeId, NodeKind, TableOfContents, TrackableKind};
use quill_core::render::{table_of_contents, TocItem, UNRESOLVED_PLACEHOLDER};
use quill_core::resolution::Resolution;
use quill_core::{CompiledDocument, Context};

/// Separates pages in text output
const PAGE_BREAK: &str = "\u{c}";

pub(crate) fn render(document: &CompiledDocument, ctx: &Context) -> String {
    let writer = TextWriter { document, ctx };
    let tree = &document.tree;
    let mut text = writer.blocks(tree.children(tree.root())).join("\n\n");
    if !text.is_empty() {
        text.push('\n');
    }
    text
}

struct TextWriter<'a> {
    document: &'a CompiledDocument,
    ctx: &'a Context,
}

impl TextWriter<'_> {
    fn blocks(&self, ids: &[NodeId]) -> Vec<String> {
        ids.iter().flat_map(|&id| self.block(id)).collect()
    }

    /// Rendered blocks of a node; transparent wrappers yield several
    fn block(&self, id: NodeId) -> Vec<String> {
        let tree = &self.document.tree;
        let children = tree.children(id);
        let single = |text: String| vec![text];
        match tree.kind(id) {
            NodeKind::Root
            | NodeKind::Container(_)
            | NodeKind::Stacked(_)
            | NodeKind::SlideFragment(_)
            | NodeKind::FunctionCallOutput { block: true, .. } => self.blocks(children),

            NodeKind::Paragraph | NodeKind::TableCell => single(self.inlines(children)),
            NodeKind::Heading(heading) => {
                let title = self.inlines(children);
                match self.number(id) {
                    Some(number) if !heading.decorative => single(format!("{number} {title}")),
                    _ => single(title),
                }
            }
            NodeKind::BlockQuote => {
                single(prefix_lines(&self.blocks(children).join("\n\n"), "> ", "> "))
            }
            NodeKind::List(list) => {
                let separator = if list.tight { "\n" } else { "\n\n" };
                let items: Vec<String> = children
                    .iter()
                    .enumerate()
                    .map(|(index, &item)| {
                        let marker = if list.ordered {
                            format!("{}. ", list.start as usize + index)
                        } else {
                            "- ".to_string()
                        };
                        self.list_item(item, &marker, separator)
                    })
                    .collect();
                single(items.join(separator))
            }
            NodeKind::ListItem(_) => single(self.list_item(id, "- ", "\n")),
            NodeKind::CodeBlock(code) => {
                let body = prefix_lines(&code.content, "    ", "    ");
                single(self.with_caption(id, TrackableKind::CodeListing, body, code.caption.as_deref()))
            }
            NodeKind::MathBlock(math) => {
                let mut body = prefix_lines(&math.expression, "    ", "    ");
                if let Some(number) = self.number(id) {
                    body.push_str("    ");
                    body.push_str(number);
                }
                single(body)
            }
            NodeKind::Table(table) => {
                let body = self.table(children);
                single(self.with_caption(id, TrackableKind::Table, body, table.caption.as_deref()))
            }
            NodeKind::TableRow { .. } => {
                let cells: Vec<String> = children.iter().map(|&cell| self.inlines(tree.children(cell))).collect();
                single(cells.join(" | "))
            }
            NodeKind::HorizontalRule => single("-".repeat(40)),
            NodeKind::PageBreak => single(PAGE_BREAK.to_string()),
            NodeKind::LinkDefinition(_) | NodeKind::SpeakerNote => Vec::new(),
            NodeKind::Figure(figure) => {
                let body = self.blocks(children).join("\n\n");
                single(self.with_caption(id, TrackableKind::Figure, body, figure.caption.as_deref()))
            }
            NodeKind::Box(node) => {
                let title = node
                    .title
                    .clone()
                    .unwrap_or_else(|| capitalize(node.kind.as_str()));
                let body = self.blocks(children).join("\n\n");
                single(format!("{title}\n{}", prefix_lines(&body, "| ", "| ")))
            }
            NodeKind::TableOfContents(toc) => single(self.table_of_contents(toc)),
            NodeKind::BibliographyView(view) => {
                let title = view
                    .title
                    .as_deref()
                    .or_else(|| self.ctx.localize("bibliography"))
                    .unwrap_or("Bibliography");
                let mut lines = vec![title.to_string()];
                let bibliography = self.ctx.bibliography(view.source);
                for item in self.document.symbols.bibliography_items(id) {
                    if let Some(entry) = bibliography.and_then(|b| b.get(&item.key)) {
                        lines.push(format!("[{}] {}", item.number, entry.describe()));
                    }
                }
                single(lines.join("\n"))
            }
            NodeKind::CallError { message, .. } => single(format!("[error: {message}]")),
            _ => single(self.inline(id)),
        }
    }

    fn list_item(&self, id: NodeId, marker: &str, separator: &str) -> String {
        let tree = &self.document.tree;
        let mut marker = marker.to_string();
        if let NodeKind::ListItem(item) = tree.kind(id) {
            for variant in &item.variants {
                if let ListItemVariant::Task { checked } = variant {
                    marker.push_str(if *checked { "[x] " } else { "[ ] " });
                }
            }
        }
        let content = self.blocks(tree.children(id)).join(separator);
        let rest = " ".repeat(marker.chars().count());
        prefix_lines(&content, &marker, &rest)
    }

    /// Rows padded to aligned columns, with a rule under the header
    fn table(&self, rows: &[NodeId]) -> String {
        let tree = &self.document.tree;
        let cells: Vec<(bool, Vec<String>)> = rows
            .iter()
            .map(|&row| {
                let header = matches!(tree.kind(row), NodeKind::TableRow { header: true });
                let texts = tree
                    .children(row)
                    .iter()
                    .map(|&cell| self.inlines(tree.children(cell)))
                    .collect();
                (header, texts)
            })
            .collect();
        let columns = cells.iter().map(|(_, row)| row.len()).max().unwrap_or(0);
        let widths: Vec<usize> = (0..columns)
            .map(|column| {
                cells
                    .iter()
                    .filter_map(|(_, row)| row.get(column))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut lines = Vec::new();
        for (header, row) in &cells {
            let padded: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(column, &width)| {
                    let cell = row.get(column).map(String::as_str).unwrap_or_default();
                    format!("{cell:<width$}")
                })
                .collect();
            lines.push(padded.join(" | ").trim_end().to_string());
            if *header {
                let rule: Vec<String> = widths.iter().map(|&width| "-".repeat(width.max(1))).collect();
                lines.push(rule.join("-+-"));
            }
        }
        lines.join("\n")
    }

    fn table_of_contents(&self, toc: &TableOfContents) -> String {
        let title = toc
            .title
            .as_deref()
            .or_else(|| self.ctx.localize("tableofcontents"))
            .unwrap_or("Table of Contents");
        let mut lines = vec![title.to_string()];
        let items = table_of_contents(&self.document.symbols, toc);
        toc_lines(&items, 1, &mut lines);
        lines.join("\n")
    }

    /// `body` followed by a `Figure 1.2: caption` line when numbered or captioned
    fn with_caption(&self, id: NodeId, kind: TrackableKind, body: String, caption: Option<&str>) -> String {
        let label = self.number(id).map(|number| {
            let name = self
                .ctx
                .localize(kind.localization_key())
                .map(str::to_string)
                .unwrap_or_else(|| capitalize(kind.localization_key()));
            format!("{name} {number}")
        });
        let line = match (label, caption) {
            (Some(label), Some(caption)) => format!("{label}: {caption}"),
            (Some(label), None) => label,
            (None, Some(caption)) => caption.to_string(),
            (None, None) => return body,
        };
        format!("{body}\n{line}")
    }

    fn number(&self, id: NodeId) -> Option<&str> {
        self.document
            .symbols
            .element(id)
            .and_then(|element| element.number.as_deref())
    }

    fn inlines(&self, ids: &[NodeId]) -> String {
        ids.iter().map(|&id| self.inline(id)).collect()
    }

    fn inline(&self, id: NodeId) -> String {
        let document = self.document;
        let children = document.tree.children(id);
        match document.tree.kind(id) {
            NodeKind::Text(text) | NodeKind::CodeSpan(text) | NodeKind::MathSpan(text) => {
                text.clone()
            }
            NodeKind::LineBreak => "\n".to_string(),
            NodeKind::Image(image) => image.alt.clone(),
            NodeKind::Link(link) => with_url(self.inlines(children), &link.url),
            NodeKind::ReferenceLink(link) => match document.resolutions.get(id) {
                Some(Resolution::Link { url, .. }) => with_url(self.inlines(children), url),
                _ => link.fallback.clone(),
            },
            NodeKind::CrossReference(_) => match document.resolutions.get(id) {
                Some(Resolution::CrossReference { text, .. }) => text.clone(),
                _ => UNRESOLVED_PLACEHOLDER.to_string(),
            },
            NodeKind::Citation(_) => match document.resolutions.get(id) {
                Some(Resolution::Citation { numbers }) => {
                    let numbers: Vec<String> = numbers.iter().map(usize::to_string).collect();
                    format!("[{}]", numbers.join(", "))
                }
                _ => UNRESOLVED_PLACEHOLDER.to_string(),
            },
            NodeKind::CallError { message, .. } => format!("[error: {message}]"),
            kind if kind.is_block() && !matches!(kind, NodeKind::FunctionCallOutput { .. }) => {
                self.block(id).join("\n\n")
            }
            _ => self.inlines(children),
        }
    }
}

fn toc_lines(items: &[TocItem], depth: usize, lines: &mut Vec<String>) {
    for item in items {
        let indent = "  ".repeat(depth);
        match &item.number {
            Some(number) => lines.push(format!("{indent}{number} {}", item.text)),
            None => lines.push(format!("{indent}{}", item.text)),
        }
        toc_lines(&item.children, depth + 1, lines);
    }
}

/// Link label, followed by the target when it adds information
fn with_url(label: String, url: &str) -> String {
    if label.is_empty() || label == url {
        url.to_string()
    } else {
        format!("{label} <{url}>")
    }
}

fn prefix_lines(text: &str, first: &str, rest: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (index, line) in text.lines().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let prefix = if index == 0 { first } else { rest };
        if line.is_empty() {
            out.push_str(prefix.trim_end());
        } else {
            out.push_str(prefix);
            out.push_str(line);
        }
    }
    if out.is_empty() {
        out.push_str(first.trim_end());
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_lines() {
        assert_eq!(prefix_lines("a\n\nb", "> ", "> "), "> a\n>\n> b");
        assert_eq!(prefix_lines("one\ntwo", "1. ", "   "), "1. one\n   two");
        assert_eq!(prefix_lines("", "- ", "  "), "-");
    }

    #[test]
    fn test_with_url() {
        assert_eq!(with_url("docs".to_string(), "https://docs.rs"), "docs <https://docs.rs>");
        assert_eq!(with_url(String::new(), "https://docs.rs"), "https://docs.rs");
    }
}
