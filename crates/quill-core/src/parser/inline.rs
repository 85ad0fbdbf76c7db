use quill_ast::{Image, Link, Node, NodeKind, ReferenceLink};

use crate::context::Context;
use crate::engine;
use crate::error::Result;
use crate::lexer::{tokenize_inline, InlineTokenKind};
use crate::value::unwrap_paragraph;

pub(super) fn parse(ctx: &mut Context, text: &str) -> Result<Vec<Node>> {
    let tokens = tokenize_inline(text)?;
    let mut nodes = Vec::with_capacity(tokens.len());

    for token in tokens {
        let raw = &text[token.span.clone()];
        match token.kind {
            InlineTokenKind::Text => push_text(&mut nodes, raw),
            InlineTokenKind::Escape => push_text(&mut nodes, &raw[1..]),
            InlineTokenKind::LineBreak => nodes.push(Node::new(NodeKind::LineBreak)),
            InlineTokenKind::CodeSpan { content } => {
                nodes.push(Node::new(NodeKind::CodeSpan(code_content(&text[content]))))
            }
            InlineTokenKind::Math { content } => {
                nodes.push(Node::new(NodeKind::MathSpan(text[content].to_string())))
            }
            InlineTokenKind::Strong { content } => {
                nodes.push(Node::with_children(NodeKind::Strong, parse(ctx, &text[content])?))
            }
            InlineTokenKind::Emphasis { content } => {
                nodes.push(Node::with_children(NodeKind::Emphasis, parse(ctx, &text[content])?))
            }
            InlineTokenKind::Strikethrough { content } => nodes.push(Node::with_children(
                NodeKind::Strikethrough,
                parse(ctx, &text[content])?,
            )),
            InlineTokenKind::Link { label, destination } => {
                let (url, title) = split_destination(&text[destination]);
                nodes.push(Node::with_children(
                    NodeKind::Link(Link { url, title }),
                    parse(ctx, &text[label])?,
                ));
            }
            InlineTokenKind::Image { alt, destination } => {
                let (url, title) = split_destination(&text[destination]);
                nodes.push(Node::new(NodeKind::Image(Image {
                    url,
                    title,
                    alt: text[alt].to_string(),
                })));
            }
            InlineTokenKind::ReferenceLink {
                text: label_text,
                reference,
            } => {
                let label = if reference.is_empty() {
                    &text[label_text.clone()]
                } else {
                    &text[reference]
                };
                let link = ReferenceLink {
                    label: label.trim().to_string(),
                    fallback: raw.to_string(),
                };
                nodes.push(Node::with_children(
                    NodeKind::ReferenceLink(link),
                    parse(ctx, &text[label_text])?,
                ));
            }
            InlineTokenKind::FunctionCall(mode) => {
                let expanded = engine::expand(ctx, raw, mode, text, token.span.start)?;
                nodes.extend(expanded.into_iter().map(inline_fragment));
            }
        }
    }
    Ok(nodes)
}

fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if let Some(Node {
        kind: NodeKind::Text(last),
        ..
    }) = nodes.last_mut()
    {
        last.push_str(text);
        return;
    }
    nodes.push(Node::text(text));
}

/// A block-mode call found inside running text still sits in a line
fn inline_fragment(node: Node) -> Node {
    match node.kind {
        NodeKind::FunctionCallOutput { name, block: true } => Node::with_children(
            NodeKind::FunctionCallOutput { name, block: false },
            unwrap_paragraph(node.children),
        ),
        NodeKind::CallError {
            message,
            block: true,
        } => Node::new(NodeKind::CallError {
            message,
            block: false,
        }),
        kind => Node::with_children(kind, node.children),
    }
}

/// One leading and trailing space is stripped when both are present
fn code_content(content: &str) -> String {
    let content = content.replace('\n', " ");
    match content.strip_prefix(' ').and_then(|c| c.strip_suffix(' ')) {
        Some(inner) if !inner.trim().is_empty() => inner.to_string(),
        _ => content,
    }
}

/// Split `url "title"` into its parts
fn split_destination(destination: &str) -> (String, Option<String>) {
    let destination = destination.trim();
    if let Some(open) = destination.find([' ', '\t']) {
        let title = destination[open..].trim();
        if let Some(title) = title
            .strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
        {
            return (
                unbracket(&destination[..open]).to_string(),
                Some(title.to_string()),
            );
        }
    }
    (unbracket(destination).to_string(), None)
}

fn unbracket(url: &str) -> &str {
    url.strip_prefix('<')
        .and_then(|u| u.strip_suffix('>'))
        .unwrap_or(url)
}
