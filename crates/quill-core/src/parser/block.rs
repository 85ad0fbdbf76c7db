use once_cell::sync::Lazy;
use quill_ast::{
    Alignment, CodeBlock, Figure, Heading, LinkDefinition, List, ListItem, ListItemVariant,
    MathBlock, Node, NodeKind, Table,
};
use regex::Regex;

use crate::context::Context;
use crate::engine;
use crate::error::Result;
use crate::lexer::{tokenize, Token, TokenKind, LINK_DEFINITION, LIST_MARKER, TABLE_CAPTION};
use crate::text::leading_whitespace;
use crate::walker::CallMode;

use super::inline;

static HEADING_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ {0,3}(#{1,6})(!?)(?:[ \t]+(.*?))?[ \t]*$").unwrap());
static CLOSING_HASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+#+$").unwrap());
static TRAILING_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)[ \t]*\{#([^}\s]+)\}$").unwrap());
static LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{#([^}\s]+)\}").unwrap());
static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]*)""#).unwrap());
static FIGURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(!\[[^\n]*\]\([^\n]*\))[ \t]*(?:\{#([^}\s]+)\})?$").unwrap());
static TASK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[([ xX])\](?:[ \t]+|$)").unwrap());

/// Block-level parser over the tokens of one source text
pub(super) struct BlockParser<'a> {
    ctx: &'a mut Context,
    source: &'a str,
}

impl<'a> BlockParser<'a> {
    pub(super) fn new(ctx: &'a mut Context, source: &'a str) -> Self {
        Self { ctx, source }
    }

    pub(super) fn parse(mut self) -> Result<Vec<Node>> {
        let tokens = tokenize(self.source)?;
        let mut nodes = Vec::new();
        for token in &tokens {
            nodes.extend(self.block(token)?);
        }
        Ok(nodes)
    }

    fn block(&mut self, token: &Token) -> Result<Vec<Node>> {
        let text = token.text(self.source);
        let node = match token.kind {
            TokenKind::BlankLines => return Ok(Vec::new()),
            TokenKind::FunctionCall(mode) => return self.call(token, mode),
            TokenKind::Paragraph => return self.paragraph(text),
            TokenKind::Heading => self.heading(text)?,
            TokenKind::FencedCode => code_block(text),
            TokenKind::MathBlock => math_block(text),
            TokenKind::BlockQuote => self.block_quote(text)?,
            TokenKind::List => self.list(text)?,
            TokenKind::Table => self.table(text)?,
            TokenKind::HorizontalRule => Node::new(NodeKind::HorizontalRule),
            TokenKind::PageBreak => Node::new(NodeKind::PageBreak),
            TokenKind::LinkDefinition => match link_definition(text) {
                Some(node) => node,
                None => return self.paragraph(text),
            },
        };
        Ok(vec![node])
    }

    fn call(&mut self, token: &Token, mode: CallMode) -> Result<Vec<Node>> {
        let raw = token.text(self.source);
        let indent = leading_whitespace(raw);
        let call = raw[indent..].trim_end();
        engine::expand(self.ctx, call, mode, self.source, token.span.start + indent)
    }

    fn heading(&mut self, text: &str) -> Result<Node> {
        let line = text.trim_end_matches(['\n', '\r']);
        let Some(caps) = HEADING_LINE.captures(line) else {
            return Ok(Node::with_children(
                NodeKind::Paragraph,
                inline::parse(self.ctx, line.trim())?,
            ));
        };
        let mut heading = Heading::new(caps[1].len() as u8);
        heading.decorative = !caps[2].is_empty();

        let content = caps.get(3).map_or("", |m| m.as_str());
        let content = CLOSING_HASHES.replace(content, "");
        let content = match TRAILING_ID.captures(&content) {
            Some(id) => {
                heading.custom_id = Some(id[2].to_string());
                id[1].to_string()
            }
            None => content.to_string(),
        };
        let children = inline::parse(self.ctx, content.trim())?;
        Ok(Node::with_children(NodeKind::Heading(heading), children))
    }

    fn paragraph(&mut self, text: &str) -> Result<Vec<Node>> {
        let text = text
            .lines()
            .map(str::trim_start)
            .collect::<Vec<_>>()
            .join("\n");
        let text = text.trim_end();

        if let Some(figure) = self.figure(text)? {
            return Ok(vec![figure]);
        }
        let children = inline::parse(self.ctx, text)?;
        if children.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Node::with_children(NodeKind::Paragraph, children)])
    }

    /// An image alone in its paragraph becomes a figure
    fn figure(&mut self, text: &str) -> Result<Option<Node>> {
        let Some(caps) = FIGURE.captures(text) else {
            return Ok(None);
        };
        let mut nodes = inline::parse(self.ctx, &caps[1])?;
        if nodes.len() != 1 {
            return Ok(None);
        }
        let image = nodes.remove(0);
        let NodeKind::Image(payload) = &image.kind else {
            return Ok(None);
        };
        let figure = Figure {
            caption: payload.title.clone(),
            label: caps.get(2).map(|m| m.as_str().to_string()),
        };
        Ok(Some(Node::with_children(NodeKind::Figure(figure), vec![image])))
    }

    fn block_quote(&mut self, text: &str) -> Result<Node> {
        let inner = text
            .lines()
            .map(|line| {
                let line = line.trim_start();
                let line = line.strip_prefix('>').unwrap_or(line);
                line.strip_prefix(' ').unwrap_or(line)
            })
            .collect::<Vec<_>>()
            .join("\n");
        let children = super::parse_blocks(self.ctx, &inner)?;
        Ok(Node::with_children(NodeKind::BlockQuote, children))
    }

    fn list(&mut self, text: &str) -> Result<Node> {
        let base_indent = leading_whitespace(text);
        let mut items: Vec<Vec<&str>> = Vec::new();
        let mut content_indent = 0;
        let mut ordered = false;
        let mut start = 1;
        let mut tight = true;
        let mut saw_blank = false;

        for line in text.lines() {
            let marker = LIST_MARKER
                .captures(line)
                .filter(|_| leading_whitespace(line) <= base_indent + 1);
            if let Some(caps) = marker {
                let symbol = &caps[2];
                if items.is_empty() {
                    ordered = symbol.ends_with(['.', ')']);
                    start = symbol[..symbol.len() - 1].parse().unwrap_or(1);
                } else if saw_blank {
                    tight = false;
                }
                saw_blank = false;
                let marker_end = caps.get(0).map_or(0, |m| m.end());
                content_indent = caps[1].len() + symbol.len() + 1;
                items.push(vec![&line[marker_end..]]);
                continue;
            }
            let Some(item) = items.last_mut() else {
                continue;
            };
            if line.trim().is_empty() {
                saw_blank = true;
                item.push("");
                continue;
            }
            if saw_blank {
                tight = false;
            }
            saw_blank = false;
            let strip = leading_whitespace(line).min(content_indent);
            item.push(&line[strip..]);
        }

        let mut children = Vec::with_capacity(items.len());
        for lines in items {
            let mut content = lines.join("\n");
            let mut variants = Vec::new();
            if let Some(task) = TASK.captures(&content) {
                variants.push(ListItemVariant::Task {
                    checked: !task[1].trim().is_empty(),
                });
                let prefix = task.get(0).map_or(0, |m| m.end());
                content = content[prefix..].to_string();
            }
            let blocks = super::parse_blocks(self.ctx, &content)?;
            children.push(Node::with_children(
                NodeKind::ListItem(ListItem { variants }),
                blocks,
            ));
        }
        Ok(Node::with_children(
            NodeKind::List(List {
                ordered,
                start,
                tight,
            }),
            children,
        ))
    }

    fn table(&mut self, text: &str) -> Result<Node> {
        let mut lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        let mut table = Table {
            alignments: Vec::new(),
            caption: None,
            label: None,
        };
        if let Some(caps) = lines.last().and_then(|line| TABLE_CAPTION.captures(line)) {
            table.caption = Some(caps[1].to_string());
            table.label = caps.get(2).map(|m| m.as_str().to_string());
            lines.pop();
        }

        let header = split_row(lines.first().copied().unwrap_or_default());
        table.alignments = split_row(lines.get(1).copied().unwrap_or_default())
            .iter()
            .map(|cell| alignment(cell))
            .collect();
        let columns = header.len();

        let mut rows = vec![self.row(&header, columns, true)?];
        for line in lines.iter().skip(2) {
            rows.push(self.row(&split_row(line), columns, false)?);
        }
        Ok(Node::with_children(NodeKind::Table(table), rows))
    }

    fn row(&mut self, cells: &[&str], columns: usize, header: bool) -> Result<Node> {
        let mut children = Vec::with_capacity(columns);
        for index in 0..columns {
            let cell = cells.get(index).copied().unwrap_or_default();
            children.push(Node::with_children(
                NodeKind::TableCell,
                inline::parse(self.ctx, cell)?,
            ));
        }
        Ok(Node::with_children(NodeKind::TableRow { header }, children))
    }
}

fn code_block(text: &str) -> Node {
    let mut lines: Vec<&str> = text.lines().collect();
    let first = if lines.is_empty() { "" } else { lines.remove(0) };
    let indent = leading_whitespace(first);
    let opener = first.trim_start();
    let marker = opener.chars().next().unwrap_or('`');
    let width = opener.chars().take_while(|c| *c == marker).count();
    let info = opener[width..].trim();

    let closed = lines.last().is_some_and(|line| {
        let line = line.trim();
        line.len() >= width && line.chars().all(|c| c == marker)
    });
    if closed {
        lines.pop();
    }
    let content = lines
        .iter()
        .map(|line| &line[leading_whitespace(line).min(indent)..])
        .collect::<Vec<_>>()
        .join("\n");

    let label = LABEL.captures(info).map(|caps| caps[1].to_string());
    let caption = QUOTED.captures(info).map(|caps| caps[1].to_string());
    let rest = QUOTED.replace(info, "");
    let rest = LABEL.replace(&rest, "");
    let language = rest.split_whitespace().next().map(str::to_string);

    Node::new(NodeKind::CodeBlock(CodeBlock {
        language,
        content,
        caption,
        label,
    }))
}

fn math_block(text: &str) -> Node {
    let trimmed = text.trim();
    let inner = trimmed.strip_prefix("$$").unwrap_or(trimmed);
    let (expression, after) = match inner.rfind("$$") {
        Some(close) => (&inner[..close], &inner[close + 2..]),
        None => (inner, ""),
    };
    Node::new(NodeKind::MathBlock(MathBlock {
        expression: expression.trim().to_string(),
        label: LABEL.captures(after).map(|caps| caps[1].to_string()),
    }))
}

fn link_definition(text: &str) -> Option<Node> {
    let caps = LINK_DEFINITION.captures(text.trim_end())?;
    let url = &caps[2];
    let url = url
        .strip_prefix('<')
        .and_then(|u| u.strip_suffix('>'))
        .unwrap_or(url);
    Some(Node::new(NodeKind::LinkDefinition(LinkDefinition {
        label: caps[1].to_string(),
        url: url.to_string(),
        title: caps.get(3).map(|m| m.as_str().to_string()),
    })))
}

/// Cells of a pipe table row; `\|` does not separate cells
fn split_row(line: &str) -> Vec<&str> {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = match line.strip_suffix('|') {
        Some(stripped) if !stripped.ends_with('\\') => stripped,
        _ => line,
    };
    let mut cells = Vec::new();
    let mut start = 0;
    let bytes = line.as_bytes();
    for (index, byte) in bytes.iter().enumerate() {
        if *byte == b'|' && (index == 0 || bytes[index - 1] != b'\\') {
            cells.push(line[start..index].trim());
            start = index + 1;
        }
    }
    cells.push(line[start..].trim());
    cells
}

fn alignment(delimiter: &str) -> Option<Alignment> {
    match (delimiter.starts_with(':'), delimiter.ends_with(':')) {
        (true, true) => Some(Alignment::Center),
        (true, false) => Some(Alignment::Start),
        (false, true) => Some(Alignment::End),
        (false, false) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_blocks;

    fn parse(source: &str) -> Vec<Node> {
        let mut ctx = Context::default();
        parse_blocks(&mut ctx, source).unwrap()
    }

    #[test]
    fn test_heading_with_id() {
        let nodes = parse("## Setup {#setup} ##\n");
        match &nodes[0].kind {
            NodeKind::Heading(heading) => {
                assert_eq!(heading.depth, 2);
                assert_eq!(heading.custom_id.as_deref(), Some("setup"));
                assert!(!heading.decorative);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(nodes[0].plain_text(), "Setup");
    }

    #[test]
    fn test_decorative_heading() {
        let nodes = parse("#! Preface");
        match &nodes[0].kind {
            NodeKind::Heading(heading) => assert!(heading.decorative),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_code_block_info() {
        let nodes = parse("```rust \"Main loop\" {#main}\nfn main() {}\n```\n");
        match &nodes[0].kind {
            NodeKind::CodeBlock(code) => {
                assert_eq!(code.language.as_deref(), Some("rust"));
                assert_eq!(code.caption.as_deref(), Some("Main loop"));
                assert_eq!(code.label.as_deref(), Some("main"));
                assert_eq!(code.content, "fn main() {}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_math_block_label() {
        let nodes = parse("$$\nE = mc^2\n$$ {#energy}\n");
        assert_eq!(
            nodes[0].kind,
            NodeKind::MathBlock(MathBlock {
                expression: "E = mc^2".to_string(),
                label: Some("energy".to_string()),
            })
        );
    }

    #[test]
    fn test_figure() {
        let nodes = parse("![A cat](cat.png \"The cat\") {#cat}\n");
        match &nodes[0].kind {
            NodeKind::Figure(figure) => {
                assert_eq!(figure.caption.as_deref(), Some("The cat"));
                assert_eq!(figure.label.as_deref(), Some("cat"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(nodes[0].children[0].kind, NodeKind::Image(_)));
    }

    #[test]
    fn test_task_list() {
        let nodes = parse("- [x] done\n- [ ] todo\n  - nested\n");
        let NodeKind::List(list) = &nodes[0].kind else {
            panic!("expected a list");
        };
        assert!(list.tight);
        assert!(!list.ordered);
        let items = &nodes[0].children;
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[0].kind,
            NodeKind::ListItem(ListItem {
                variants: vec![ListItemVariant::Task { checked: true }]
            })
        );
        assert!(matches!(
            items[1].children.last().map(|n| &n.kind),
            Some(NodeKind::List(_))
        ));
    }

    #[test]
    fn test_loose_ordered_list() {
        let nodes = parse("3. one\n\n4. two\n");
        let NodeKind::List(list) = &nodes[0].kind else {
            panic!("expected a list");
        };
        assert!(list.ordered);
        assert_eq!(list.start, 3);
        assert!(!list.tight);
    }

    #[test]
    fn test_table() {
        let nodes = parse("| a | b |\n|:--|--:|\n| 1 | 2 \\| 3 |\n\"Values\" {#values}\n");
        let NodeKind::Table(table) = &nodes[0].kind else {
            panic!("expected a table");
        };
        assert_eq!(
            table.alignments,
            vec![Some(Alignment::Start), Some(Alignment::End)]
        );
        assert_eq!(table.caption.as_deref(), Some("Values"));
        assert_eq!(table.label.as_deref(), Some("values"));
        assert_eq!(nodes[0].children.len(), 2);
        assert_eq!(nodes[0].children[1].children[1].plain_text(), "2 | 3");
    }

    #[test]
    fn test_block_quote_is_recursive() {
        let nodes = parse("> # Title\n> text\n");
        assert_eq!(nodes[0].kind, NodeKind::BlockQuote);
        assert!(matches!(nodes[0].children[0].kind, NodeKind::Heading(_)));
        assert_eq!(nodes[0].children[1].kind, NodeKind::Paragraph);
    }

    #[test]
    fn test_link_definition() {
        let nodes = parse("[docs]: <https://docs.rs> \"Docs\"\n");
        assert_eq!(
            nodes[0].kind,
            NodeKind::LinkDefinition(LinkDefinition {
                label: "docs".to_string(),
                url: "https://docs.rs".to_string(),
                title: Some("Docs".to_string()),
            })
        );
    }

    #[test]
    fn test_rules_and_breaks() {
        let nodes = parse("a\n\n---\n\n<<<\n");
        assert_eq!(nodes[1].kind, NodeKind::HorizontalRule);
        assert_eq!(nodes[2].kind, NodeKind::PageBreak);
    }

    #[test]
    fn test_split_row() {
        assert_eq!(split_row("| a | b |"), vec!["a", "b"]);
        assert_eq!(split_row("a | b"), vec!["a", "b"]);
        assert_eq!(split_row(r"| a \| b |"), vec![r"a \| b"]);
    }
}
